use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for inventory-admin
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InventoryAdminConfig {
    /// Backend API connection settings
    pub api: ApiConfig,
    /// List and search behaviour
    pub ui: UiConfig,
    /// Logging and metrics
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the inventory backend, e.g. http://localhost:3000/api
    pub base_url: String,
    /// Bearer token (can be set via env var)
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Client-side rate limiting
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Rows per page for every list view
    pub page_size: u32,
    /// Quiescence period before a search term is queried
    pub search_debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON structured logs instead of human-readable lines
    pub json_logs: bool,
    /// Log API request counters on exit
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            token: None, // Read from INVENTORY_ADMIN_API__TOKEN or INVENTORY_API_TOKEN
            timeout_seconds: 30,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_capacity: 20,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            search_debounce_ms: 500,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
            metrics_enabled: false,
        }
    }
}

impl InventoryAdminConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (inventory-admin.toml)
    /// 3. Environment variables (prefixed with INVENTORY_ADMIN_, `__` between sections)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("inventory-admin.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("INVENTORY_ADMIN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut admin_config: InventoryAdminConfig = config.try_deserialize()?;

        if admin_config.api.token.is_none() {
            if let Ok(token) = std::env::var("INVENTORY_API_TOKEN") {
                admin_config.api.token = Some(token);
            }
        }

        Ok(admin_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_list_behaviour() {
        let config = InventoryAdminConfig::default();
        assert_eq!(config.ui.page_size, 10);
        assert_eq!(config.ui.search_debounce_ms, 500);
        assert!(config.api.token.is_none());
    }

    #[test]
    fn test_file_overrides_defaults_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory-admin.toml");

        let mut config = InventoryAdminConfig::default();
        config.api.base_url = "https://inventory.example.com/api".to_string();
        config.ui.page_size = 25;
        config.save_to_file(&path).unwrap();

        let loaded = InventoryAdminConfig::load_from(&path).unwrap();
        assert_eq!(loaded.api.base_url, "https://inventory.example.com/api");
        assert_eq!(loaded.ui.page_size, 25);
        assert_eq!(loaded.ui.search_debounce_ms, 500);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[ui]\npage_size = 50\n").unwrap();

        let loaded = InventoryAdminConfig::load_from(&path).unwrap();
        assert_eq!(loaded.ui.page_size, 50);
        assert_eq!(loaded.api.timeout_seconds, 30);
    }
}
