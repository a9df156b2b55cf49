//! Configuration for storage, the HTTP server, and the catalog dataset.
//!
//! Load order: `sekela.toml` → environment variables → defaults.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "sekela.toml";

/// Top-level Sekela configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SekelaConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite://<path>`, `sqlite:<path>`, a bare file path, or `:memory:`.
    pub url: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Origins allowed by CORS (the web frontend).
    pub cors_origins: Vec<String>,
}

/// Catalog dataset and listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Dataset file replacing the built-in catalog. Relative paths resolve against the root.
    pub dataset: Option<PathBuf>,
    /// Run a seed pass when the server starts.
    pub seed_on_startup: bool,
    /// Page size used by `GET /universities/` when no limit is given.
    pub default_limit: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://universities_db.sqlite".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "https://sekelafinder.netlify.app".to_string(),
            ],
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            seed_on_startup: false,
            default_limit: 100,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl SekelaConfig {
    /// Load config from `sekela.toml` in `root`, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        // DATABASE_URL is the conventional name; the prefixed one wins when both are set.
        env_override("DATABASE_URL", &mut config.database.url);
        env_override("SEKELA_DATABASE_URL", &mut config.database.url);
        env_override("SEKELA_BIND", &mut config.server.bind);
        env_override("SEKELA_SEED_ON_STARTUP", &mut config.catalog.seed_on_startup);
        env_override("SEKELA_DEFAULT_LIMIT", &mut config.catalog.default_limit);
        if let Ok(path) = std::env::var("SEKELA_DATASET") {
            config.catalog.dataset = Some(PathBuf::from(path));
        }

        if let Some(dataset) = &config.catalog.dataset
            && dataset.is_relative()
        {
            config.catalog.dataset = Some(root.join(dataset));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CatalogError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.default_limit == 0 {
            return Err(CatalogError::Config(
                "catalog.default_limit must be greater than 0".to_string(),
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|e| {
            CatalogError::Config(format!("invalid server.bind '{}': {e}", self.server.bind))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SekelaConfig::default();
        assert_eq!(config.database.url, "sqlite://universities_db.sqlite");
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.server.cors_origins.len(), 3);
        assert_eq!(config.catalog.default_limit, 100);
        assert!(!config.catalog.seed_on_startup);
        assert!(config.catalog.dataset.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[database]
url = "sqlite:///var/lib/sekela/catalog.sqlite"

[catalog]
seed_on_startup = true
"#;
        let config = SekelaConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.database.url, "sqlite:///var/lib/sekela/catalog.sqlite");
        assert!(config.catalog.seed_on_startup);
        // Defaults for unspecified fields
        assert_eq!(config.catalog.default_limit, 100);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_invalid_bind_rejected() {
        let mut config = SekelaConfig::default();
        config.server.bind = "not-an-address".to_string();
        assert!(matches!(config.validate(), Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = SekelaConfig::from_toml("[catalog]\ndefault_limit = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_resolves_relative_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            "[catalog]\ndataset = \"data/catalog.json\"\n",
        )
        .unwrap();

        let config = SekelaConfig::load(tmp.path()).unwrap();
        assert_eq!(
            config.catalog.dataset,
            Some(tmp.path().join("data/catalog.json"))
        );
    }
}
