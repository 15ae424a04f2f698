use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Resolve a service's `config/` directory whether the process runs from the
/// workspace root or from the service crate itself.
pub fn configuration_directory(service_dir: &str) -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    let directory = if base_path.ends_with(service_dir) {
        base_path.join("config")
    } else {
        base_path.join(service_dir).join("config")
    };

    Ok(directory)
}

/// Load `base.yaml` from `directory`, then overlay `APP_`-prefixed environment
/// variables (`APP_SERVER__PORT=9000` overrides `server.port`).
pub fn load_settings<T: DeserializeOwned>(directory: &Path) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::from(directory.join("base.yaml")).required(true))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
