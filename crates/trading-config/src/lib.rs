//! Configuration management.

mod paths;
mod settings;

pub use paths::ArtifactPaths;
pub use settings::{
    AlpacaConfig, AppConfig, AppSettings, FetchSettings, LoggingConfig, PathSettings,
    TradingSettings,
};

use config::{Config, ConfigError, Environment, File, FileFormat};
use std::path::Path;

/// Config file used when no path is given. Optional.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Load configuration from file and environment.
///
/// An explicit `path` must exist. Without one, `config/default.toml` is read
/// if present. `TRADING__SECTION__KEY` variables override either.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_with_env(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix("TRADING")
        .separator("__")
        .try_parsing(true)
}

fn load_with_env(path: Option<&Path>, env: Environment) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).format(FileFormat::Toml).required(true),
        None => File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?
        .try_deserialize()
}
