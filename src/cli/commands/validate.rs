//! Validate configuration command.

use anyhow::Result;
use trading_config::AppConfig;

pub async fn run(config: &AppConfig) -> Result<()> {
    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Source: {}", config.trading.source);
    println!("Symbol: {}", config.symbol()?);
    println!("Poll interval: {}s", config.trading.poll_interval_secs);
    println!("Starting capital: {}", config.trading.starting_capital);
    println!("Data dir: {}", config.paths.data_dir.display());

    match config.alpaca_credentials() {
        Ok(credentials) => println!(
            "Alpaca credentials: found ({})",
            if credentials.is_paper() { "paper" } else { "live endpoint" }
        ),
        Err(e) if config.trading.source.requires_credentials() => {
            println!("Alpaca credentials: missing ({})", e)
        }
        Err(_) => println!("Alpaca credentials: missing (needed for `trade`)"),
    }

    println!();
    println!("{}", config.to_toml()?);
    Ok(())
}
