//! Automation Codec
//!
//! This crate decodes and encodes the bodies of Home Assistant automations.
//! Triggers, conditions and actions are heterogeneous JSON objects whose
//! shape is selected by a value embedded in the object itself.
//!
//! # Architecture
//!
//! ```text
//! JSON object ─► discriminator ─► registry lookup ─► typed variant
//!                                                        │
//! JSON object ◄─ schema-ordered fields ◄─────────────────┘
//! ```
//!
//! - **Triggers** are selected by `platform`
//! - **Conditions** are selected by `condition`; `and`/`or`/`not` nest
//!   further conditions
//! - **Actions** are selected by the first recognized key
//!
//! # Key Types
//!
//! - [`Decoder`] - Decodes wire objects, with a nesting limit
//! - [`Trigger`], [`Condition`], [`Action`] - The three unions
//! - [`StringOrNumber`], [`FlexDuration`], [`Timestamp`] - Flexible scalars
//! - [`Automation`] - Complete automation definition
//! - [`CodecError`] - Decode failures

pub mod action;
pub mod automation;
pub mod condition;
pub mod decode;
pub mod encode;
pub mod error;
pub mod registry;
pub mod scalar;
pub mod trigger;

pub use action::{Action, ActionKind};
pub use automation::{Automation, AutomationError, AutomationListEntry, AutomationResult};
pub use condition::{Condition, ConditionKind};
pub use decode::{Decoded, Decoder};
pub use encode::{encode_action, encode_condition, encode_conditions, encode_trigger};
pub use error::{CodecError, CodecResult, ErrorKind};
pub use registry::{FieldSpec, FieldType, UnionKind, Variant, VariantDescriptor};
pub use scalar::{FlexDuration, StringOrNumber, Timestamp};
pub use trigger::{Trigger, TriggerKind};
