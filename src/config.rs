//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.nekokai/config.toml` (user)
//! 3. `/etc/nekokai/config.toml` (system)
//!
//! With no file at all, every setting takes its default.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.nekokai/secrets.toml` (user, must be 0600)
//! 2. `/etc/nekokai/secrets.toml` (system, must be 0600)
//!
//! and fall back to the `KITSU_ID` / `KITSU_TOKEN` environment variables.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::{NekokaiError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub upstream: UpstreamSection,
}

/// Which entry store backs the caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process sharded store (default).
    #[default]
    Memory,
    /// Shared Redis server (requires the `redis` feature).
    Redis,
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Connection URL when `backend = "redis"`.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Search list and result entry lifetime in seconds (default: 3600).
    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,
    /// Selection lifetime in seconds (default: 60).
    #[serde(default = "default_selection_ttl")]
    pub selection_ttl_secs: u64,
    /// In-process sweep period in seconds (default: 30).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// In-process shard count (default: 16).
    #[serde(default = "default_shards")]
    pub shards: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: None,
            search_ttl_secs: default_search_ttl(),
            selection_ttl_secs: default_selection_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            shards: default_shards(),
        }
    }
}

impl CacheSection {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .search_ttl(Duration::from_secs(self.search_ttl_secs))
            .selection_ttl(Duration::from_secs(self.selection_ttl_secs))
            .sweep_interval(Duration::from_secs(self.sweep_interval_secs))
            .shards(self.shards)
    }
}

fn default_search_ttl() -> u64 {
    3600
}

fn default_selection_ttl() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_shards() -> usize {
    16
}

/// `[upstream]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSection {
    /// Per-call timeout in milliseconds (default: 2000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Entries requested per call (default: 25).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Override of the AniList GraphQL endpoint.
    #[serde(default)]
    pub anilist_url: Option<String>,
    /// Override of the Kitsu Algolia endpoint.
    #[serde(default)]
    pub kitsu_search_url: Option<String>,
    /// Override of the Kitsu JSON:API edge.
    #[serde(default)]
    pub kitsu_edge_url: Option<String>,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
            anilist_url: None,
            kitsu_search_url: None,
            kitsu_edge_url: None,
        }
    }
}

impl UpstreamSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_page_size() -> usize {
    25
}

/// Secrets (Kitsu's Algolia credentials).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub kitsu: Option<KitsuSecret>,
}

/// Algolia application id and search key used for Kitsu searches.
#[derive(Debug, Clone, Deserialize)]
pub struct KitsuSecret {
    pub app_id: String,
    pub api_key: String,
}

const KITSU_ID_ENV: &str = "KITSU_ID";
const KITSU_TOKEN_ENV: &str = "KITSU_TOKEN";

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist; otherwise a missing file yields the
    /// default configuration.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NekokaiError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            NekokaiError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(NekokaiError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".nekokai").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/nekokai/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (credentials may come from
    /// env vars).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".nekokai").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/nekokai/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a specific secrets file, enforcing its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            NekokaiError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            NekokaiError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            NekokaiError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(NekokaiError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Kitsu `(app_id, api_key)`, from the secrets file or the environment.
    pub fn kitsu_credentials(&self) -> Option<(String, String)> {
        if let Some(secret) = &self.kitsu {
            return Some((secret.app_id.clone(), secret.api_key.clone()));
        }
        let app_id = std::env::var(KITSU_ID_ENV).ok()?;
        let api_key = std::env::var(KITSU_TOKEN_ENV).ok()?;
        Some((app_id, api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.search_ttl_secs, 3600);
        assert_eq!(config.cache.selection_ttl_secs, 60);
        assert_eq!(config.upstream.timeout(), Duration::from_millis(2000));
        assert_eq!(config.upstream.page_size, 25);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [cache]
            backend = "redis"
            redis_url = "redis://127.0.0.1:6379/2"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://127.0.0.1:6379/2")
        );
        // Defaults preserved
        assert_eq!(config.cache.shards, 16);
        assert_eq!(config.upstream.timeout_ms, 2000);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [cache]
            backend = "memory"
            search_ttl_secs = 1800
            selection_ttl_secs = 30
            sweep_interval_secs = 5
            shards = 4

            [upstream]
            timeout_ms = 1500
            page_size = 10
            anilist_url = "http://localhost:8080"
            kitsu_edge_url = "http://localhost:8081/api/edge"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let cache = config.cache.cache_config();
        assert_eq!(cache.search_ttl, Duration::from_secs(1800));
        assert_eq!(cache.selection_ttl, Duration::from_secs(30));
        assert_eq!(cache.sweep_interval, Duration::from_secs(5));
        assert_eq!(cache.shards, 4);
        assert_eq!(config.upstream.timeout(), Duration::from_millis(1500));
        assert_eq!(config.upstream.page_size, 10);
        assert!(config.upstream.kitsu_search_url.is_none());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let toml = r#"
            [cache]
            backend = "memcached"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn parse_secrets() {
        let toml = r#"
            [kitsu]
            app_id = "AWQO5J657S"
            api_key = "search-only-key"
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(
            secrets.kitsu_credentials(),
            Some(("AWQO5J657S".to_string(), "search-only-key".to_string()))
        );
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }
}
