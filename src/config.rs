//! Configuration loading for the partitioning core's one tunable: the
//! safety factor applied when dilating a rank's local bounding box.
//!
//! Mirrors `control::config::ControlConfig::load` in the upstream
//! simulator: read the file to a string, map the I/O error to a plain
//! `String`, then hand off to `toml`.

use serde::Deserialize;
use std::path::Path;

/// Construction-time configuration for a `ReceivedBoundingBox`: one option,
/// a non-negative `safety_factor`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionConfig {
    #[serde(default)]
    pub safety_factor: f64,
}

impl PartitionConfig {
    /// Load from a TOML file, rejecting a negative `safety_factor` at load
    /// time rather than waiting for `ReceivedBoundingBox::new` to assert.
    pub fn load(config_path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(config_path).map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: PartitionConfig = toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))?;

        if config.safety_factor < 0.0 {
            return Err(format!("safety_factor must be non-negative, got {}", config.safety_factor));
        }

        Ok(config)
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        PartitionConfig { safety_factor: 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_safety_factor_from_toml() {
        let config: PartitionConfig = toml::from_str("safety-factor = 0.1").unwrap();
        assert_eq!(config.safety_factor, 0.1);
    }

    #[test]
    fn defaults_to_zero_when_absent() {
        let config: PartitionConfig = toml::from_str("").unwrap();
        assert_eq!(config.safety_factor, 0.0);
    }

    #[test]
    fn rejects_negative_safety_factor_at_load() {
        let dir = std::env::temp_dir().join(format!("received-bbox-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "safety-factor = -0.5").unwrap();

        assert!(PartitionConfig::load(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
