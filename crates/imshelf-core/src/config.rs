//! Configuration for the imshelf data store.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the items file lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfConfig {
    /// Path to the items JSON file.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
        }
    }
}

/// `imshelf/items.json` under the platform data directory, falling back to
/// the working directory.
fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("imshelf").join("items.json"))
        .unwrap_or_else(|| PathBuf::from("items.json"))
}

impl ShelfConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_names_the_items_file() {
        let config = ShelfConfig::default();
        assert!(config.data_path.ends_with("items.json"));
    }

    #[test]
    fn toml_round_trip() {
        let config = ShelfConfig {
            data_path: PathBuf::from("/tmp/shelf/items.json"),
        };
        let toml_str = config.to_toml().unwrap();
        let parsed = ShelfConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.data_path, config.data_path);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let parsed = ShelfConfig::from_toml("").unwrap();
        assert_eq!(parsed.data_path, ShelfConfig::default().data_path);
    }
}
