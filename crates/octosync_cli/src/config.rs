//! Configuration file support for octosync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `OCTOSYNC_`, e.g., `OCTOSYNC_DATABASE_URL`)
//! 3. Config file (~/.config/octosync/config.toml or ./octosync.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/octosync/octosync.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/octosync/octosync.db"  # optional, this is the default
//!
//! [source]
//! token = "ghp_..."  # or use OCTOSYNC_SOURCE_TOKEN env var
//!
//! [backend]
//! cron = "0 0 * * * *"  # seconds granularity
//! retry = 2             # fetch attempts per repository and cycle
//! concurrency = 4
//!
//! [[groups]]
//! name = "core"
//! organizations = ["acme"]
//! repositories = ["solo/thing"]
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use octosync::sync::{GroupSpec, SyncSettings, DEFAULT_CONCURRENCY, DEFAULT_SCHEDULE};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Upstream source configuration.
    pub source: SourceConfig,
    /// Sync backend configuration.
    pub backend: BackendConfig,
    /// Tracked groups.
    pub groups: Vec<GroupConfig>,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Defaults to `sqlite://~/.local/state/octosync/octosync.db` if not specified.
    pub url: Option<String>,
}

/// Upstream source configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// API token.
    /// Can also be set via OCTOSYNC_SOURCE_TOKEN environment variable.
    pub token: Option<String>,
}

/// Sync backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Cron expression (seconds granularity) driving cycle starts.
    pub cron: String,
    /// Total fetch attempts allowed per repository and cycle.
    pub retry: u32,
    /// Number of repositories synced concurrently.
    pub concurrency: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            cron: DEFAULT_SCHEDULE.to_string(),
            retry: octosync::retry::DEFAULT_RETRY_BUDGET,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// One tracked group: a named bundle of organizations and repositories.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Group name, used as its stored identity.
    pub name: String,
    /// Organization logins whose repositories are all tracked.
    pub organizations: Vec<String>,
    /// Repository labels (`owner/name`) tracked directly.
    pub repositories: Vec<String>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/octosync/config.toml)
    /// 3. Local config file (./octosync.toml)
    /// 4. Environment variables with OCTOSYNC_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "octosync") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Local config file takes priority over the XDG one
        let local_config = PathBuf::from("octosync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./octosync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., OCTOSYNC_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("OCTOSYNC")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the file
    /// if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("octosync.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the source API token.
    pub fn source_token(&self) -> Option<String> {
        self.source.token.clone()
    }

    /// Build the sync settings: the backend tuning plus the union of every
    /// group's organizations and repositories.
    pub fn sync_settings(&self) -> SyncSettings {
        let mut repositories = Vec::new();
        let mut organizations = Vec::new();
        for group in &self.groups {
            for repo in &group.repositories {
                if !repositories.contains(repo) {
                    repositories.push(repo.clone());
                }
            }
            for org in &group.organizations {
                if !organizations.contains(org) {
                    organizations.push(org.clone());
                }
            }
        }

        let groups = self
            .groups
            .iter()
            .map(|g| GroupSpec {
                name: g.name.clone(),
                repositories: g.repositories.clone(),
                organizations: g.organizations.clone(),
            })
            .collect();

        SyncSettings {
            schedule: self.backend.cron.clone(),
            retry_budget: self.backend.retry,
            concurrency: self.backend.concurrency,
            repositories,
            organizations,
            groups,
        }
    }

    /// Get the default config file path.
    #[allow(dead_code)]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "octosync").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/octosync` or `~/.local/state/octosync`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "octosync").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.source.token.is_none());
        assert_eq!(config.backend.cron, DEFAULT_SCHEDULE);
        assert_eq!(config.backend.retry, 2);
        assert_eq!(config.backend.concurrency, DEFAULT_CONCURRENCY);
        assert!(config.groups.is_empty());
    }

    #[test]
    fn test_full_config_parsing() {
        let toml_content = r#"
            [database]
            url = "sqlite:///tmp/test.db"

            [source]
            token = "ghp_test123"

            [backend]
            cron = "0 */5 * * * *"
            retry = 4
            concurrency = 8

            [[groups]]
            name = "core"
            organizations = ["acme"]
            repositories = ["solo/thing"]

            [[groups]]
            name = "extras"
            repositories = ["solo/thing", "other/widget"]
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(
            config.database.url,
            Some("sqlite:///tmp/test.db".to_string())
        );
        assert_eq!(config.source.token, Some("ghp_test123".to_string()));
        assert_eq!(config.backend.retry, 4);
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[0].name, "core");
    }

    #[test]
    fn test_sync_settings_union_deduplicates() {
        let toml_content = r#"
            [[groups]]
            name = "core"
            organizations = ["acme"]
            repositories = ["solo/thing"]

            [[groups]]
            name = "extras"
            organizations = ["acme"]
            repositories = ["solo/thing", "other/widget"]
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        let sync = config.sync_settings();

        assert_eq!(sync.repositories, vec!["solo/thing", "other/widget"]);
        assert_eq!(sync.organizations, vec!["acme"]);
        assert_eq!(sync.groups.len(), 2);
        assert_eq!(sync.schedule, DEFAULT_SCHEDULE);
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let config = Config::default();
        let url = config.database_url().unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("octosync.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_database_url_respects_configured_value() {
        let toml_content = r#"
            [database]
            url = "postgres://localhost/octosync"
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(
            config.database_url(),
            Some("postgres://localhost/octosync".to_string())
        );
    }

    #[test]
    fn test_partial_backend_override() {
        let toml_content = r#"
            [backend]
            retry = 5
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.backend.retry, 5);
        assert_eq!(config.backend.cron, DEFAULT_SCHEDULE);
        assert_eq!(config.backend.concurrency, DEFAULT_CONCURRENCY);
    }
}
