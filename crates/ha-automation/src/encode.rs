//! Variant encoder
//!
//! The inverse of [`crate::decode`]: the discriminator first (triggers and
//! conditions only), then every schema field in schema order. Fields without
//! an omit-empty annotation are written even at their zero value.

use serde_json::{Map, Value};

use crate::action::Action;
use crate::condition::Condition;
use crate::registry::{FieldSpec, FieldType, Variant, VariantDescriptor};
use crate::scalar::ToWire;
use crate::trigger::Trigger;

/// Builds the wire object of one variant
///
/// Handed to [`Variant::encode`].
pub struct FieldWriter {
    object: Map<String, Value>,
}

impl FieldWriter {
    fn new(descriptor: &VariantDescriptor) -> Self {
        let mut object = Map::new();
        if let Some(key) = descriptor.union.discriminator_key() {
            object.insert(
                key.to_string(),
                Value::String(descriptor.discriminator.to_string()),
            );
        }
        Self { object }
    }

    /// Write a field that is always present
    pub fn field<T: ToWire + ?Sized>(&mut self, spec: &FieldSpec, value: &T) {
        debug_assert!(!spec.omit_empty, "{} is omit-empty", spec.key);
        self.object.insert(spec.key.to_string(), value.to_wire());
    }

    /// Write a field only when it is set
    pub fn optional<T: ToWire>(&mut self, spec: &FieldSpec, value: Option<&T>) {
        debug_assert!(spec.omit_empty, "{} is not omit-empty", spec.key);
        if let Some(value) = value {
            self.object.insert(spec.key.to_string(), value.to_wire());
        }
    }

    /// Write a nested condition list
    pub fn conditions(&mut self, spec: &FieldSpec, conditions: &[Condition]) {
        debug_assert_eq!(spec.ty, FieldType::Conditions);
        self.object
            .insert(spec.key.to_string(), Value::Array(encode_conditions(conditions)));
    }

    fn finish(self) -> Map<String, Value> {
        self.object
    }
}

fn encode_variant<V: Variant>(variant: &V) -> Map<String, Value> {
    let mut fields = FieldWriter::new(V::DESCRIPTOR);
    variant.encode(&mut fields);
    fields.finish()
}

/// Encode a trigger to its wire object
pub fn encode_trigger(trigger: &Trigger) -> Map<String, Value> {
    match trigger {
        Trigger::State(t) => encode_variant(t),
        Trigger::Mqtt(t) => encode_variant(t),
        Trigger::GeoLocation(t) => encode_variant(t),
        Trigger::Homeassistant(t) => encode_variant(t),
        Trigger::NumericState(t) => encode_variant(t),
        Trigger::Sun(t) => encode_variant(t),
        Trigger::TimePattern(t) => encode_variant(t),
        Trigger::Webhook(t) => encode_variant(t),
        Trigger::Zone(t) => encode_variant(t),
        Trigger::Time(t) => encode_variant(t),
        Trigger::Template(t) => encode_variant(t),
        Trigger::Event(t) => encode_variant(t),
        Trigger::Device(t) => encode_variant(t),
    }
}

/// Encode a condition to its wire object, recursing into nested lists
pub fn encode_condition(condition: &Condition) -> Map<String, Value> {
    match condition {
        Condition::And(c) => encode_variant(c),
        Condition::Or(c) => encode_variant(c),
        Condition::Not(c) => encode_variant(c),
        Condition::State(c) => encode_variant(c),
        Condition::NumericState(c) => encode_variant(c),
        Condition::Sun(c) => encode_variant(c),
        Condition::Zone(c) => encode_variant(c),
        Condition::Time(c) => encode_variant(c),
        Condition::Template(c) => encode_variant(c),
    }
}

/// Encode a list of conditions
pub fn encode_conditions(conditions: &[Condition]) -> Vec<Value> {
    conditions
        .iter()
        .map(|c| Value::Object(encode_condition(c)))
        .collect()
}

/// Encode an action; "no action" is the empty object
pub fn encode_action(action: Option<&Action>) -> Map<String, Value> {
    match action {
        None => Map::new(),
        Some(Action::Event(a)) => encode_variant(a),
        Some(Action::Service(a)) => encode_variant(a),
        Some(Action::Device(a)) => encode_variant(a),
        Some(Action::Delay(a)) => encode_variant(a),
        Some(Action::Scene(a)) => encode_variant(a),
        Some(Action::Wait(a)) => encode_variant(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{AndCondition, StateCondition};
    use crate::scalar::StringOrNumber;
    use crate::trigger::MqttTrigger;
    use serde_json::json;

    #[test]
    fn test_discriminator_comes_first() {
        let trigger = Trigger::Mqtt(MqttTrigger {
            topic: "home/door".to_string(),
            payload: None,
        });
        let map = encode_trigger(&trigger);
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["platform", "topic"]);
        assert_eq!(Value::Object(map), json!({"platform": "mqtt", "topic": "home/door"}));
    }

    #[test]
    fn test_zero_values_are_written() {
        let condition = Condition::State(StateCondition::default());
        assert_eq!(
            Value::Object(encode_condition(&condition)),
            json!({"condition": "state", "entity_id": "", "state": ""})
        );
    }

    #[test]
    fn test_nested_conditions_encode_recursively() {
        let condition = Condition::And(AndCondition {
            conditions: vec![Condition::State(StateCondition {
                entity_id: "sensor.a".to_string(),
                state: StringOrNumber::from(3i64),
                ..Default::default()
            })],
        });
        assert_eq!(
            Value::Object(encode_condition(&condition)),
            json!({
                "condition": "and",
                "conditions": [{"condition": "state", "entity_id": "sensor.a", "state": 3}]
            })
        );
    }

    #[test]
    fn test_no_action_is_empty_object() {
        assert!(encode_action(None).is_empty());
    }
}
