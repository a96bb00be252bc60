//! Configuration loading for the automation codec
//!
//! This crate provides the file-facing side of the codec:
//!
//! - [`CodecConfig`] - codec settings from YAML, with environment overrides
//! - [`load_automations`] - read `automations.yaml` (or `.json`) into
//!   decoded [`Automation`](ha_automation::Automation)s
//! - [`save_automations`] - write them back out
//!
//! # Example
//!
//! ```ignore
//! use ha_config::{load_automations, CodecConfig};
//!
//! let mut settings = CodecConfig::load("/config/codec.yaml")?;
//! settings.apply_env_overrides();
//!
//! let automations = load_automations("/config/automations.yaml", &settings.decoder())?;
//! ```

mod codec_config;
mod error;
mod loader;

pub use codec_config::{CodecConfig, ENV_MAX_CONDITION_DEPTH};
pub use error::{ConfigError, ConfigResult};
pub use loader::{
    load_automations, load_automations_str, save_automations, to_yaml_string, Format,
};
