//! Console configuration
//!
//! Layered from built-in defaults, an optional config file and `CHURN__*`
//! environment variables, e.g. `CHURN__API__BASE_URL`.

use anyhow::{Context, Result, bail};
use churn_http::AuthEndpoints;
use churn_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const ENV_PREFIX: &str = "CHURN";
const ENV_SEPARATOR: &str = "__";

/// Upper bound for `session.refresh_skew_secs`
const MAX_REFRESH_SKEW_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub session: SessionSettings,
}

/// Where the console API lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Authentication endpoint paths, relative to `api.base_url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_path: String,
    pub profile_path: String,
    pub refresh_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let endpoints = AuthEndpoints::default();
        Self {
            token_path: endpoints.token,
            profile_path: endpoints.profile,
            refresh_path: endpoints.refresh,
        }
    }
}

impl AuthConfig {
    pub fn endpoints(&self) -> AuthEndpoints {
        AuthEndpoints {
            token: self.token_path.clone(),
            profile: self.profile_path.clone(),
            refresh: self.refresh_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Session file; defaults to `session.json` in the state directory
    pub store_path: Option<PathBuf>,
    pub refresh_skew_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            store_path: None,
            refresh_skew_secs: 30,
        }
    }
}

impl SessionSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            refresh_skew: Duration::from_secs(self.refresh_skew_secs),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from defaults, `path` and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`ConsoleConfig::load`], reading variables from `env` instead of
    /// the process environment when given
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            // Set default values
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("auth.token_path", defaults.auth.token_path)?
            .set_default("auth.profile_path", defaults.auth.profile_path)?
            .set_default("auth.refresh_path", defaults.auth.refresh_path)?
            .set_default("session.refresh_skew_secs", defaults.session.refresh_skew_secs)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to read configuration")?;

        let config: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api.base_url must use http or https, got {}", url.scheme());
        }
        if self.session.refresh_skew_secs > MAX_REFRESH_SKEW_SECS {
            bail!(
                "session.refresh_skew_secs must be at most {MAX_REFRESH_SKEW_SECS}, got {}",
                self.session.refresh_skew_secs
            );
        }
        for (name, value) in [
            ("auth.token_path", &self.auth.token_path),
            ("auth.profile_path", &self.auth.profile_path),
            ("auth.refresh_path", &self.auth.refresh_path),
        ] {
            if !value.starts_with('/') {
                bail!("{name} must start with '/', got {value:?}");
            }
        }
        Ok(())
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::load_with_env(None, env(&[])).unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.auth.endpoints(), AuthEndpoints::default());
        assert_eq!(
            config.session.session_config().refresh_skew,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("churn.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://console.example.com/api"

[auth]
token_path = "/auth/jwt/create/"
profile_path = "/auth/users/me/"
refresh_path = "/auth/jwt/refresh/"
"#,
        )
        .unwrap();

        let config = ConsoleConfig::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(config.api.base_url, "https://console.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.auth.endpoints().profile, "/auth/users/me/");
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("churn.toml");
        std::fs::write(&path, "[api]\ntimeout_secs = 5\n").unwrap();

        let config = ConsoleConfig::load_with_env(
            Some(&path),
            env(&[
                ("CHURN__API__TIMEOUT_SECS", "12"),
                ("CHURN__SESSION__REFRESH_SKEW_SECS", "0"),
            ]),
        )
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(12));
        assert_eq!(config.session.refresh_skew_secs, 0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        assert!(ConsoleConfig::load_with_env(Some(&path), env(&[])).is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = ConsoleConfig::load_with_env(
            None,
            env(&[("CHURN__API__BASE_URL", "ftp://example.com")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_oversized_refresh_skew_rejected() {
        let err = ConsoleConfig::load_with_env(
            None,
            env(&[("CHURN__SESSION__REFRESH_SKEW_SECS", "10000000000000")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("refresh_skew_secs"));

        let config = ConsoleConfig::load_with_env(
            None,
            env(&[("CHURN__SESSION__REFRESH_SKEW_SECS", "86400")]),
        )
        .unwrap();
        assert_eq!(config.session.refresh_skew_secs, MAX_REFRESH_SKEW_SECS);
    }

    #[test]
    fn test_relative_endpoint_rejected() {
        let result = ConsoleConfig::load_with_env(
            None,
            env(&[("CHURN__AUTH__TOKEN_PATH", "auth/token")]),
        );
        assert!(result.is_err());
    }
}
