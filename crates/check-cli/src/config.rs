//! `checkfill.toml` loading

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use check_client::ClientConfig;
use check_template::LayoutConfig;
use serde::Deserialize;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "checkfill.toml";

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the bank templates
    pub store_path: PathBuf,
    pub layout: LayoutConfig,
    pub client: ClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("banks.json"),
            layout: LayoutConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration
    ///
    /// A missing file yields the defaults. A relative `store_path` is taken
    /// relative to the directory of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))?;

        if config.store_path.is_relative() {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                config.store_path = dir.join(&config.store_path);
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkfill.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
store_path = "data/banks.json"

[layout]
second_line_offset = 30

[client]
api_base_url = "http://checks.local:8080"
"#
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.store_path, dir.path().join("data/banks.json"));
        assert_eq!(config.layout.second_line_offset, 30);
        assert_eq!(config.layout.glyph_ratio, 0.75);
        assert_eq!(config.client.api_base_url, "http://checks.local:8080");
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkfill.toml");
        std::fs::write(&path, "store_path = [").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }
}
