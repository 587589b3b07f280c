//! Train command implementation.

use anyhow::{Context, Result};
use tracing::info;
use trading_config::AppConfig;
use trading_data::CsvBarStore;
use trading_model::{train_on_bars, LogisticRegressionParams, ModelArtifact};

use crate::cli::TrainArgs;

pub async fn run(args: TrainArgs, config: &AppConfig) -> Result<()> {
    let target = args.target.resolve(config)?;
    let csv_path = target
        .paths
        .require_training_data(target.source, &target.symbol)?;

    let bars = CsvBarStore::new(&csv_path)
        .load()
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;
    info!(bars = bars.len(), path = %csv_path.display(), "Loaded training data");

    let report = train_on_bars(&bars, &LogisticRegressionParams::default())
        .with_context(|| format!("Failed to train on {}", csv_path.display()))?;

    let model_path = target.paths.model(target.source, &target.symbol);
    let artifact = ModelArtifact::new(
        target.source,
        target.symbol.clone(),
        report.samples,
        report.accuracy,
        report.model,
    );
    artifact
        .save(&model_path)
        .with_context(|| format!("Failed to save {}", model_path.display()))?;

    println!(
        "Trained on {} rows ({} up): in-sample accuracy {:.2}%",
        report.samples,
        report.positives,
        report.accuracy * 100.0
    );
    println!("Model saved to {}", model_path.display());
    Ok(())
}
