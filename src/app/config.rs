use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    APP_NAME, DEFAULT_API_BASE_URL, DEFAULT_STORAGE_SCOPE, ENV_PREFIX, HTTP_REQUEST_TIMEOUT_SECS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote analysis API
    #[serde(default)]
    pub api: ApiConfig,

    /// Credential storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session behaviour
    #[serde(default)]
    pub session: SessionConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the auth endpoints hang off
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Credential storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory; the platform data directory when unset
    pub data_dir: Option<PathBuf>,
    /// Namespace under the root, so several accounts or environments can
    /// keep separate credentials
    pub scope: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            scope: DEFAULT_STORAGE_SCOPE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolved storage root
    pub fn root(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_data_dir(),
        }
    }
}

/// Session behaviour configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sign out when start-up verification cannot reach the server
    pub clear_on_network_failure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clear_on_network_failure: true,
        }
    }
}

/// Load configuration from multiple sources
///
/// Later sources win: defaults, the global config file, `explicit` (from
/// `--config`), then `RAPPORT_` environment variables.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    build_figment(Some(&global_config), explicit)
        .extract()
        .context("Failed to load configuration")
}

fn build_figment(global: Option<&Path>, explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(global) = global.filter(|p| p.exists()) {
        figment = figment.merge(Toml::file(global));
    }

    if let Some(explicit) = explicit {
        figment = figment.merge(Toml::file(explicit));
    }

    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

fn home_fallback() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join(APP_NAME))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match project_dirs() {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => home_fallback()?,
    };
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Get the data directory credentials live under
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = match project_dirs() {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => home_fallback()?.join("data"),
    };
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p,
        None => get_config_dir()?.join("config.toml"),
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(path)
}

/// Create a default configuration file if it doesn't exist
///
/// Returns the path and whether it was newly written.
pub fn init_config() -> Result<(PathBuf, bool)> {
    let config_file = get_config_dir()?.join("config.toml");
    if config_file.exists() {
        return Ok((config_file, false));
    }

    let path = save_config(&Config::default(), Some(config_file))?;
    Ok((path, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    // Every test runs in a Jail so environment overrides never leak between them

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config: Config = build_figment(None, None).extract()?;
            assert_eq!(config, Config::default());
            assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
            assert_eq!(config.storage.scope, "session");
            assert!(config.session.clear_on_network_failure);
            assert_eq!(config.api.timeout(), Duration::from_secs(30));
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "global.toml",
                r#"
                [api]
                base_url = "https://global.example.com"
                timeout_secs = 5
                "#,
            )?;
            jail.create_file(
                "explicit.toml",
                r#"
                [api]
                base_url = "https://explicit.example.com"

                [storage]
                scope = "staging"
                "#,
            )?;
            jail.set_env("RAPPORT_SESSION__CLEAR_ON_NETWORK_FAILURE", "false");

            let config: Config = build_figment(
                Some(Path::new("global.toml")),
                Some(Path::new("explicit.toml")),
            )
            .extract()?;

            assert_eq!(config.api.base_url, "https://explicit.example.com");
            assert_eq!(config.api.timeout_secs, 5);
            assert_eq!(config.storage.scope, "staging");
            assert!(!config.session.clear_on_network_failure);
            Ok(())
        });
    }

    #[test]
    fn test_missing_global_file_is_skipped() {
        Jail::expect_with(|_jail| {
            let config: Config =
                build_figment(Some(Path::new("missing.toml")), None).extract()?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_save_roundtrip() {
        Jail::expect_with(|jail| {
            let mut config = Config::default();
            config.storage.data_dir = Some(jail.directory().join("data"));
            config.api.base_url = "https://api.example.com".to_string();

            let path = save_config(&config, Some(jail.directory().join("config.toml")))
                .map_err(|e| e.to_string())?;
            let loaded: Config = build_figment(None, Some(&path)).extract()?;

            assert_eq!(loaded, config);
            assert_eq!(
                loaded.storage.root().map_err(|e| e.to_string())?,
                jail.directory().join("data")
            );
            Ok(())
        });
    }
}
