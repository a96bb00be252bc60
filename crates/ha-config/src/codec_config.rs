//! Codec settings
//!
//! Settings are read from a small YAML file and may be overridden from the
//! environment:
//!
//! ```yaml
//! max_condition_depth: 16
//! ```

use crate::error::{ConfigError, ConfigResult};
use ha_automation::Decoder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable overriding [`CodecConfig::max_condition_depth`]
pub const ENV_MAX_CONDITION_DEPTH: &str = "HA_CODEC_MAX_CONDITION_DEPTH";

/// Settings for the automation codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// How deep `and`/`or`/`not` lists may nest; `0` allows no nesting
    pub max_condition_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_condition_depth: Decoder::DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    /// Parse settings from YAML; an empty document gives the defaults
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, Path::new("<string>"))
    }

    /// Load settings from a file, falling back to defaults if it does not exist
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No codec settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        debug!("Loading codec settings: {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    ///
    /// A value that is not a non-negative integer is ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let Some(raw) = lookup(ENV_MAX_CONDITION_DEPTH) else {
            return;
        };
        match raw.trim().parse::<usize>() {
            Ok(depth) => {
                debug!("{} overrides max_condition_depth to {}", ENV_MAX_CONDITION_DEPTH, depth);
                self.max_condition_depth = depth;
            }
            Err(e) => warn!("Ignoring {}={:?}: {}", ENV_MAX_CONDITION_DEPTH, raw, e),
        }
    }

    /// Build a decoder with these settings
    pub fn decoder(&self) -> Decoder {
        Decoder::with_max_depth(self.max_condition_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.max_condition_depth, 32);
        assert_eq!(config.decoder(), Decoder::new());
        assert_eq!(CodecConfig::from_yaml_str("").unwrap(), config);
    }

    #[test]
    fn test_from_yaml() {
        let config = CodecConfig::from_yaml_str("max_condition_depth: 4\n").unwrap();
        assert_eq!(config.max_condition_depth, 4);
        assert_eq!(config.decoder().max_depth(), 4);
    }

    #[test]
    fn test_unknown_keys_keep_defaults() {
        let config = CodecConfig::from_yaml_str("something_else: true\n").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = CodecConfig::from_yaml_str("max_condition_depth: deep\n");
        assert!(matches!(result, Err(ConfigError::ParseYaml { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = CodecConfig::load(dir.path().join("codec.yaml")).unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codec.yaml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"max_condition_depth: 0\n").unwrap();

        let config = CodecConfig::load(&path).unwrap();
        assert_eq!(config.max_condition_depth, 0);
    }

    #[test]
    fn test_override() {
        let mut config = CodecConfig::default();
        config.apply_overrides(|key| (key == ENV_MAX_CONDITION_DEPTH).then(|| "8".to_string()));
        assert_eq!(config.max_condition_depth, 8);
    }

    #[test]
    fn test_invalid_override_ignored() {
        let mut config = CodecConfig::default();
        config.apply_overrides(|_| Some("-1".to_string()));
        assert_eq!(config.max_condition_depth, 32);

        config.apply_overrides(|_| None);
        assert_eq!(config.max_condition_depth, 32);
    }
}
