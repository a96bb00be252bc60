//! Automation file loader
//!
//! Reads `automations.yaml`-style documents: either a single automation
//! mapping or a list of them. Files ending in `.json` are read as JSON,
//! anything else as YAML. Each entry is decoded with the automation codec.

use crate::error::{ConfigError, ConfigResult};
use ha_automation::scalar::json_type_name;
use ha_automation::{Automation, Decoder};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Document format of an automation file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Load every automation from a file
pub fn load_automations(
    path: impl AsRef<Path>,
    decoder: &Decoder,
) -> ConfigResult<Vec<Automation>> {
    let path = path.as_ref();
    debug!("Loading automations: {:?}", path);

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    decode_document(&content, Format::from_path(path), path, decoder)
}

/// Load every automation from a string
pub fn load_automations_str(
    content: &str,
    format: Format,
    decoder: &Decoder,
) -> ConfigResult<Vec<Automation>> {
    decode_document(content, format, Path::new("<string>"), decoder)
}

/// Write automations to a file, as JSON or YAML by extension
pub fn save_automations(path: impl AsRef<Path>, automations: &[Automation]) -> ConfigResult<()> {
    let path = path.as_ref();
    let content = match Format::from_path(path) {
        Format::Json => serde_json::to_string_pretty(automations).map_err(|e| {
            ConfigError::Serialize {
                reason: e.to_string(),
            }
        })?,
        Format::Yaml => to_yaml_string(automations)?,
    };

    debug!("Saving {} automations to {:?}", automations.len(), path);
    fs::write(path, content).map_err(|e| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Render automations as a YAML list
pub fn to_yaml_string(automations: &[Automation]) -> ConfigResult<String> {
    serde_yaml::to_string(automations).map_err(|e| ConfigError::Serialize {
        reason: e.to_string(),
    })
}

fn decode_document(
    content: &str,
    format: Format,
    path: &Path,
    decoder: &Decoder,
) -> ConfigResult<Vec<Automation>> {
    let document = parse(content, format, path)?;
    let entries = match document {
        Value::Null => Vec::new(),
        Value::Array(entries) => entries,
        Value::Object(_) => vec![document],
        other => {
            return Err(ConfigError::InvalidDocument {
                path: path.to_path_buf(),
                reason: format!(
                    "expected an object or an array, found {}",
                    json_type_name(&other)
                ),
            })
        }
    };

    let automations = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Automation::from_value(entry, decoder).map_err(|source| ConfigError::Automation {
                path: path.to_path_buf(),
                index,
                source,
            })
        })
        .collect::<ConfigResult<Vec<_>>>()?;

    debug!("Loaded {} automations from {:?}", automations.len(), path);
    Ok(automations)
}

fn parse(content: &str, format: Format, path: &Path) -> ConfigResult<Value> {
    let owned = || PathBuf::from(path);
    match format {
        Format::Json => serde_json::from_str(content).map_err(|e| ConfigError::ParseJson {
            path: owned(),
            source: e,
        }),
        Format::Yaml if content.trim().is_empty() => Ok(Value::Null),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: owned(),
            source: e,
        }),
    }
}
