use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typerank";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Fallback used when no home directory can be resolved.
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(format!("{APP_NAME}_config.json"))
    }
}
