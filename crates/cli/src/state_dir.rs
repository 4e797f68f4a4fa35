//! Platform-specific state directory management

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::warn;

/// Where the console keeps its config file, session and logs
pub struct StateDir {
    project_dirs: Option<ProjectDirs>,
    /// Override directory for testing or custom installations
    override_dir: Option<PathBuf>,
}

impl StateDir {
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("com", "ChurnConsole", "churn");
        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }
        Self {
            project_dirs,
            override_dir: None,
        }
    }

    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.clone();
        }

        self.project_dirs.as_ref().map_or_else(
            || PathBuf::from("./.churn"),
            |dirs| dirs.config_dir().to_path_buf(),
        )
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.clone();
        }

        self.project_dirs.as_ref().map_or_else(
            || PathBuf::from("./.churn"),
            |dirs| dirs.data_dir().to_path_buf(),
        )
    }

    /// Config file picked up when `--config` is not given, if it exists
    pub fn default_config_file(&self) -> Option<PathBuf> {
        let path = self.config_dir().join("churn.toml");
        path.is_file().then_some(path)
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir().join("session.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }
}

impl Default for StateDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_override_paths() {
        let temp_dir = TempDir::new().unwrap();
        let state = StateDir::with_override(temp_dir.path());

        assert_eq!(state.session_file(), temp_dir.path().join("session.json"));
        assert_eq!(state.log_dir(), temp_dir.path().join("logs"));
        assert!(state.default_config_file().is_none());

        std::fs::write(temp_dir.path().join("churn.toml"), "").unwrap();
        assert_eq!(
            state.default_config_file(),
            Some(temp_dir.path().join("churn.toml"))
        );
    }
}
