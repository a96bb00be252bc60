//! Variant registry
//!
//! Each union kind has a closed, ordered set of variants. A variant is
//! described by its discriminator and its field schema: the ordered list of
//! wire keys with their semantic types. The tables are compile-time data;
//! adding a variant means adding a struct, a [`Variant`] impl and an entry in
//! the kind enum.

use serde_json::Value;
use std::fmt;

use crate::action::ActionKind;
use crate::condition::ConditionKind;
use crate::decode::FieldReader;
use crate::encode::FieldWriter;
use crate::error::CodecResult;
use crate::trigger::TriggerKind;

/// The three polymorphic unions of an automation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnionKind {
    Trigger,
    Condition,
    Action,
}

impl UnionKind {
    /// Key holding the discriminator value; actions have none
    pub fn discriminator_key(self) -> Option<&'static str> {
        match self {
            UnionKind::Trigger => Some("platform"),
            UnionKind::Condition => Some("condition"),
            UnionKind::Action => None,
        }
    }

    /// Descriptors of every variant of this union, in registry order
    pub fn descriptors(self) -> Vec<&'static VariantDescriptor> {
        match self {
            UnionKind::Trigger => TriggerKind::ALL.iter().map(|k| k.descriptor()).collect(),
            UnionKind::Condition => ConditionKind::ALL.iter().map(|k| k.descriptor()).collect(),
            UnionKind::Action => ActionKind::ALL.iter().map(|k| k.descriptor()).collect(),
        }
    }
}

impl fmt::Display for UnionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnionKind::Trigger => "trigger",
            UnionKind::Condition => "condition",
            UnionKind::Action => "action",
        })
    }
}

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// String or number, kept in the form received
    Flex,
    Duration,
    Timestamp,
    /// Array of condition objects, decoded recursively
    Conditions,
    /// Any JSON value, carried opaquely
    Json,
    /// Any JSON object, carried opaquely
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Flex => "string or number",
            FieldType::Duration => "duration",
            FieldType::Timestamp => "RFC 3339 timestamp",
            FieldType::Conditions => "list of conditions",
            FieldType::Json => "JSON value",
            FieldType::Object => "object",
        })
    }
}

/// One entry of a field schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire key, exact and case-sensitive
    pub key: &'static str,
    pub ty: FieldType,
    /// Omitted from encoded output when unset
    pub omit_empty: bool,
}

impl FieldSpec {
    /// A field that is always encoded
    pub const fn new(key: &'static str, ty: FieldType) -> Self {
        Self {
            key,
            ty,
            omit_empty: false,
        }
    }

    /// A field that is encoded only when set
    pub const fn omit_empty(key: &'static str, ty: FieldType) -> Self {
        Self {
            key,
            ty,
            omit_empty: true,
        }
    }
}

/// Static description of one variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDescriptor {
    pub union: UnionKind,
    /// `platform`/`condition` value, or for actions the key whose presence selects it
    pub discriminator: &'static str,
    /// Field schema in encode order
    pub fields: &'static [FieldSpec],
}

impl VariantDescriptor {
    /// Look up a field by wire key
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Whether a wire object selects this variant
    pub fn matches(&self, object: &serde_json::Map<String, Value>) -> bool {
        match self.union.discriminator_key() {
            Some(key) => object.get(key).and_then(Value::as_str) == Some(self.discriminator),
            None => object.contains_key(self.discriminator),
        }
    }
}

/// A concrete variant type with its schema and codec
pub trait Variant: Sized {
    const DESCRIPTOR: &'static VariantDescriptor;

    /// Build the variant from the fields of a wire object
    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self>;

    /// Write every schema field, in schema order
    fn encode(&self, fields: &mut FieldWriter);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    const ALL_UNIONS: [UnionKind; 3] = [UnionKind::Trigger, UnionKind::Condition, UnionKind::Action];

    #[test]
    fn test_registry_sizes() {
        assert_eq!(UnionKind::Trigger.descriptors().len(), 13);
        assert_eq!(UnionKind::Condition.descriptors().len(), 9);
        assert_eq!(UnionKind::Action.descriptors().len(), 6);
    }

    #[test]
    fn test_discriminators_are_unique() {
        for union in ALL_UNIONS {
            let mut seen = HashSet::new();
            for descriptor in union.descriptors() {
                assert_eq!(descriptor.union, union);
                assert!(
                    seen.insert(descriptor.discriminator),
                    "duplicate {} discriminator {}",
                    union,
                    descriptor.discriminator
                );
            }
        }
    }

    #[test]
    fn test_field_keys_are_unique() {
        for union in ALL_UNIONS {
            for descriptor in union.descriptors() {
                let mut seen = HashSet::new();
                for field in descriptor.fields {
                    assert!(
                        seen.insert(field.key),
                        "{} {} lists {} twice",
                        union,
                        descriptor.discriminator,
                        field.key
                    );
                    if let Some(key) = union.discriminator_key() {
                        assert_ne!(field.key, key);
                    }
                }
            }
        }
    }

    #[test]
    fn test_action_key_is_a_field() {
        for descriptor in UnionKind::Action.descriptors() {
            assert!(descriptor.field(descriptor.discriminator).is_some());
        }
    }

    #[test]
    fn test_action_registry_order() {
        let keys: Vec<_> = UnionKind::Action
            .descriptors()
            .iter()
            .map(|d| d.discriminator)
            .collect();
        assert_eq!(
            keys,
            vec!["event", "service", "device_id", "delay", "scene", "wait_template"]
        );
    }

    #[test]
    fn test_only_logical_conditions_nest() {
        for descriptor in UnionKind::Condition.descriptors() {
            let nests = descriptor
                .fields
                .iter()
                .any(|f| f.ty == FieldType::Conditions);
            assert_eq!(
                nests,
                matches!(descriptor.discriminator, "and" | "or" | "not"),
                "{}",
                descriptor.discriminator
            );
        }
    }

    #[test]
    fn test_descriptor_matches() {
        let state = ConditionKind::State.descriptor();
        let obj = json!({"condition": "state"});
        assert!(state.matches(obj.as_object().unwrap()));
        let obj = json!({"platform": "state"});
        assert!(!state.matches(obj.as_object().unwrap()));

        let service = ActionKind::Service.descriptor();
        let obj = json!({"service": "light.turn_on"});
        assert!(service.matches(obj.as_object().unwrap()));
    }
}
