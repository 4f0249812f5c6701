use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typist";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// `$HOME/.local/state/typist`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            Self::project().map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn results_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("typing_data.csv"))
            .unwrap_or_else(|| PathBuf::from("typing_data.csv"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("typist.log"))
            .unwrap_or_else(|| PathBuf::from("typist.log"))
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("typist_config.json"))
    }
}
