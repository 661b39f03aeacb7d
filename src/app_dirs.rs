use directories::ProjectDirs;
use std::path::PathBuf;

pub const HOME_ENV: &str = "STROOPKIT_HOME";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn home_override() -> Option<PathBuf> {
        std::env::var_os(HOME_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn data_dir() -> PathBuf {
        if let Some(home) = Self::home_override() {
            return home;
        }
        ProjectDirs::from("", "", "stroopkit")
            .map(|pd| pd.data_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".stroopkit"))
    }

    pub fn config_path() -> PathBuf {
        if let Some(home) = Self::home_override() {
            return home.join("config.json");
        }
        ProjectDirs::from("", "", "stroopkit")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("stroopkit_config.json"))
    }

    pub fn profile_path() -> PathBuf {
        Self::data_dir().join("profile.json")
    }

    pub fn outbox_dir() -> PathBuf {
        Self::data_dir().join("outbox")
    }
}
