use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::warn;

use super::consts::env_var::DATA_DIR;

const DATA_DIR_NAME: &str = "campus-chat";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no local data directory could be found for this platform")]
    MissingDataLocalDir,
}

type Result<T, E = DirectoryError> = std::result::Result<T, E>;

fn resolve_data_dir(env_override: Option<OsString>) -> Result<PathBuf> {
    match env_override.filter(|p| !p.is_empty()) {
        Some(p) => {
            warn!(?p, "Using override env var for data directory");
            Ok(PathBuf::from(p))
        },
        None => Ok(dirs::data_local_dir()
            .ok_or(DirectoryError::MissingDataLocalDir)?
            .join(DATA_DIR_NAME)),
    }
}

/// Path to the local data directory.
pub fn data_dir() -> Result<PathBuf> {
    static DATA_DIR_PATH: OnceLock<PathBuf> = OnceLock::new();

    if let Some(p) = DATA_DIR_PATH.get() {
        return Ok(p.clone());
    }

    let p = resolve_data_dir(env::var_os(DATA_DIR))?;
    Ok(DATA_DIR_PATH.get_or_init(|| p).clone())
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("settings.json"))
}

pub fn logs_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("logs"))
}
