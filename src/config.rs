//! Store configuration, custom prices and data paths
//!
//! Configuration lives in a JSON file under the platform data directory.
//! Unknown or missing keys fall back to defaults, so a hand-edited partial
//! file keeps working.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enrich::EnrichOptions;
use crate::error::Result;
use crate::models::Collection;

/// Application data directory (config, prices, logs)
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("poke_catalog")
}

/// Directory for per-run not-found logs
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Default location of the store configuration file
pub fn default_config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Default location of the custom price overrides file
pub fn default_prices_path() -> PathBuf {
    data_dir().join("prices.json")
}

/// A social network shown on the catalog title page
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SocialNetwork {
    pub platform: String,
    pub handle: String,
    pub url: String,
}

/// Store branding and runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub store_name: String,
    pub catalog_title: String,
    pub logo_path: Option<PathBuf>,
    pub welcome_message: String,
    pub contact_message: String,
    pub social_networks: Vec<SocialNetwork>,
    pub max_concurrent_requests: usize,
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_name: "Poke Catalog".to_string(),
            catalog_title: "Poke Catalog - Card Catalog".to_string(),
            logo_path: None,
            welcome_message: "Welcome to our Pokemon TCG card catalog.".to_string(),
            contact_message: "Contact us for prices and availability.".to_string(),
            social_networks: Vec::new(),
            max_concurrent_requests: 20,
            request_timeout_secs: 30,
        }
    }
}

/// Keys editable through the `config` subcommand
pub const CONFIG_KEYS: &[&str] = &[
    "store_name",
    "catalog_title",
    "logo_path",
    "welcome_message",
    "contact_message",
    "max_concurrent_requests",
    "request_timeout_secs",
];

impl StoreConfig {
    /// Load from the default location
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Load from a path. A missing file is created empty so the user has
    /// something to edit; unparseable content falls back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = std::fs::write(path, "{}\n") {
                log::warn!("Could not create config file {:?}: {}", path, e);
            }
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse config file, using defaults: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save to a path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read a setting by key name
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "store_name" => Some(self.store_name.clone()),
            "catalog_title" => Some(self.catalog_title.clone()),
            "logo_path" => Some(
                self.logo_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            "welcome_message" => Some(self.welcome_message.clone()),
            "contact_message" => Some(self.contact_message.clone()),
            "max_concurrent_requests" => Some(self.max_concurrent_requests.to_string()),
            "request_timeout_secs" => Some(self.request_timeout_secs.to_string()),
            _ => None,
        }
    }

    /// Update a setting by key name. Returns false for unknown keys or
    /// unparseable numeric values.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        match key {
            "store_name" => self.store_name = value.to_string(),
            "catalog_title" => self.catalog_title = value.to_string(),
            "logo_path" => {
                self.logo_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            "welcome_message" => self.welcome_message = value.to_string(),
            "contact_message" => self.contact_message = value.to_string(),
            "max_concurrent_requests" => match value.parse() {
                Ok(n) => self.max_concurrent_requests = n,
                Err(_) => return false,
            },
            "request_timeout_secs" => match value.parse() {
                Ok(n) => self.request_timeout_secs = n,
                Err(_) => return false,
            },
            _ => return false,
        }
        true
    }

    /// Enrichment settings derived from this configuration
    pub fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            max_concurrent: self.max_concurrent_requests,
            timeout_secs: self.request_timeout_secs,
        }
    }
}

/// Load custom price overrides (entry id -> dollars). Missing file means no
/// overrides; a broken file is logged and ignored.
pub fn load_prices(path: &Path) -> HashMap<String, f64> {
    if !path.exists() {
        return HashMap::new();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(prices) => prices,
            Err(e) => {
                log::warn!("Failed to parse prices file, ignoring: {}", e);
                HashMap::new()
            }
        },
        Err(e) => {
            log::warn!("Failed to read prices file, ignoring: {}", e);
            HashMap::new()
        }
    }
}

/// Record a custom price for an entry id
pub fn save_price(path: &Path, entry_id: &str, price: f64) -> Result<()> {
    let mut prices = load_prices(path);
    prices.insert(entry_id.to_string(), price);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&prices)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Apply price overrides to a parsed collection
pub fn apply_prices(collection: &mut Collection, prices: &HashMap<String, f64>) {
    for entry in &mut collection.entries {
        if let Some(price) = prices.get(&entry.id) {
            entry.custom_price = Some(*price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectionEntry;

    #[test]
    fn test_missing_config_creates_file_and_uses_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let config = StoreConfig::load_from(&path);
        assert_eq!(config.store_name, "Poke Catalog");
        assert_eq!(config.max_concurrent_requests, 20);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_partial_config_merges_with_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "store_name": "My Store" }"#).unwrap();

        let config = StoreConfig::load_from(&path);
        assert_eq!(config.store_name, "My Store");
        // untouched keys keep their defaults
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "not json at all").unwrap();

        let config = StoreConfig::load_from(&path);
        assert_eq!(config.store_name, "Poke Catalog");
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut config = StoreConfig::default();
        assert!(config.set("store_name", "Cards R Us"));
        assert_eq!(config.get("store_name").as_deref(), Some("Cards R Us"));

        assert!(config.set("max_concurrent_requests", "5"));
        assert_eq!(config.max_concurrent_requests, 5);

        assert!(!config.set("max_concurrent_requests", "lots"));
        assert!(!config.set("unknown_key", "x"));
        assert!(config.get("unknown_key").is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = StoreConfig::default();
        config.set("catalog_title", "Summer Catalog");
        config.save_to(&path).unwrap();

        let reloaded = StoreConfig::load_from(&path);
        assert_eq!(reloaded.catalog_title, "Summer Catalog");
    }

    #[test]
    fn test_prices_roundtrip_and_apply() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("prices.json");

        assert!(load_prices(&path).is_empty());
        save_price(&path, "123", 9.5).unwrap();
        save_price(&path, "456", 1.25).unwrap();

        let prices = load_prices(&path);
        assert_eq!(prices.len(), 2);

        let mut collection = Collection::new(vec![CollectionEntry {
            id: "123".to_string(),
            product_name: "Pikachu".to_string(),
            console_name: "sv01".to_string(),
            price_in_pennies: 100,
            quantity: 1,
            condition: String::new(),
            date_entered: String::new(),
            sku: None,
            notes: None,
            custom_price: None,
        }]);
        apply_prices(&mut collection, &prices);
        assert!((collection.entries[0].price_dollars() - 9.5).abs() < f64::EPSILON);
    }
}
