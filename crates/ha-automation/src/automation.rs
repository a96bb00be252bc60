//! Automation assembly
//!
//! An automation ties together triggers, conditions, and an action. Each
//! element is (de)serialized by delegating to the variant codec; this module
//! only handles the envelope keys around them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::action::Action;
use crate::condition::Condition;
use crate::decode::{object_of, Decoder};
use crate::encode::{encode_action, encode_conditions};
use crate::error::CodecError;
use crate::registry::UnionKind;
use crate::scalar::{json_type_name, FromWire, Timestamp, ToWire};
use crate::trigger::Trigger;

/// Automation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutomationError {
    #[error("automation must be an object, but input had {actual}")]
    NotAnObject { actual: String },

    #[error("automation field {key} must be {expected}, but input had {actual}")]
    InvalidField {
        key: String,
        expected: &'static str,
        actual: String,
    },

    #[error("trigger {index}: {source}")]
    Trigger {
        index: usize,
        #[source]
        source: CodecError,
    },

    #[error("condition {index}: {source}")]
    Condition {
        index: usize,
        #[source]
        source: CodecError,
    },

    #[error("action: {source}")]
    Action {
        #[source]
        source: CodecError,
    },
}

/// Result type for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;

/// A complete automation definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Automation {
    /// Opaque identifier
    pub id: String,

    /// Human-readable name
    pub alias: String,

    pub description: Option<String>,

    /// Triggers that start the automation
    pub trigger: Vec<Trigger>,

    /// Conditions that must be met
    pub condition: Vec<Condition>,

    /// Action to execute; `None` encodes as `{}`
    pub action: Option<Action>,

    /// Execution mode (`single`, `restart`, `queued`, `parallel`)
    pub mode: Option<String>,
}

impl Automation {
    /// Decode an automation from a JSON value
    pub fn from_value(value: &Value, decoder: &Decoder) -> AutomationResult<Self> {
        let object = value.as_object().ok_or_else(|| AutomationError::NotAnObject {
            actual: json_type_name(value).to_string(),
        })?;
        Self::from_map(object, decoder)
    }

    /// Decode an automation from a JSON object
    pub fn from_map(object: &Map<String, Value>, decoder: &Decoder) -> AutomationResult<Self> {
        let trigger = list(object, "trigger", "triggers")?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                object_of(UnionKind::Trigger, item)
                    .and_then(|o| decoder.decode_trigger(o))
                    .map_err(|source| AutomationError::Trigger { index, source })
            })
            .collect::<AutomationResult<Vec<_>>>()?;

        let condition = list(object, "condition", "conditions")?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                object_of(UnionKind::Condition, item)
                    .and_then(|o| decoder.decode_condition(o))
                    .map_err(|source| AutomationError::Condition { index, source })
            })
            .collect::<AutomationResult<Vec<_>>>()?;

        let action = match lookup(object, "action", "actions") {
            None | Some(Value::Null) => None,
            Some(value) => object_of(UnionKind::Action, value)
                .and_then(|o| decoder.decode_action(o))
                .map_err(|source| AutomationError::Action { source })?,
        };

        let automation = Self {
            id: string(object, "id")?.unwrap_or_default(),
            alias: string(object, "alias")?.unwrap_or_default(),
            description: string(object, "description")?,
            trigger,
            condition,
            action,
            mode: string(object, "mode")?,
        };
        debug!(
            "Decoded automation {:?} with {} triggers, {} conditions",
            automation.id,
            automation.trigger.len(),
            automation.condition.len()
        );
        Ok(automation)
    }

    /// Encode to a JSON object
    pub fn to_map(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert("alias".to_string(), Value::String(self.alias.clone()));
        if let Some(description) = &self.description {
            object.insert("description".to_string(), Value::String(description.clone()));
        }
        object.insert(
            "trigger".to_string(),
            Value::Array(self.trigger.iter().map(Trigger::to_value).collect()),
        );
        if !self.condition.is_empty() {
            object.insert(
                "condition".to_string(),
                Value::Array(encode_conditions(&self.condition)),
            );
        }
        object.insert(
            "action".to_string(),
            Value::Object(encode_action(self.action.as_ref())),
        );
        if let Some(mode) = &self.mode {
            object.insert("mode".to_string(), Value::String(mode.clone()));
        }
        object
    }

    /// Encode to a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl Serialize for Automation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Automation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Automation::from_value(&value, &Decoder::new()).map_err(serde::de::Error::custom)
    }
}

/// Singular key first, then its plural alias
fn lookup<'a>(object: &'a Map<String, Value>, key: &str, alias: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| object.get(alias))
}

fn list<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    alias: &str,
) -> AutomationResult<&'a [Value]> {
    match lookup(object, key, alias) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(AutomationError::InvalidField {
            key: key.to_string(),
            expected: "an array",
            actual: json_type_name(other).to_string(),
        }),
    }
}

fn string(object: &Map<String, Value>, key: &str) -> AutomationResult<Option<String>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AutomationError::InvalidField {
            key: key.to_string(),
            expected: "a string",
            actual: json_type_name(other).to_string(),
        }),
    }
}

/// An automation as discovered from the entity state list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationListEntry {
    /// Automation id, taken from the state's context
    pub id: String,

    pub friendly_name: String,

    /// `None` when the automation has never fired
    pub last_triggered: Option<Timestamp>,
}

impl AutomationListEntry {
    /// Build an entry from one entity state object
    ///
    /// Returns `Ok(None)` for entities outside the `automation` domain.
    pub fn from_state(state: &Value) -> AutomationResult<Option<Self>> {
        let is_automation = state
            .get("entity_id")
            .and_then(Value::as_str)
            .is_some_and(|id| id.starts_with("automation."));
        if !is_automation {
            return Ok(None);
        }

        let id = state
            .pointer("/context/id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let friendly_name = state
            .pointer("/attributes/friendly_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let last_triggered = match state.pointer("/attributes/last_triggered") {
            None | Some(Value::Null) => None,
            Some(value) => Some(Timestamp::from_wire(value).map_err(|actual| {
                AutomationError::InvalidField {
                    key: "last_triggered".to_string(),
                    expected: "an RFC 3339 timestamp",
                    actual,
                }
            })?),
        };

        Ok(Some(Self {
            id,
            friendly_name,
            last_triggered,
        }))
    }

    /// Collect the automations out of a full state list
    pub fn from_states(states: &[Value]) -> AutomationResult<Vec<Self>> {
        states
            .iter()
            .filter_map(|state| Self::from_state(state).transpose())
            .collect()
    }
}

impl Serialize for AutomationListEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut object = Map::new();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert(
            "friendly_name".to_string(),
            Value::String(self.friendly_name.clone()),
        );
        object.insert(
            "last_triggered".to_string(),
            self.last_triggered
                .as_ref()
                .map_or(Value::Null, Timestamp::to_wire),
        );
        object.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "1700000000000",
            "alias": "Porch light at dusk",
            "trigger": [
                {"platform": "sun", "event": "sunset", "offset": "-00:30:00"}
            ],
            "condition": [
                {"condition": "state", "entity_id": "input_boolean.away", "state": "off"}
            ],
            "action": {
                "service": "light.turn_on",
                "entity_id": "light.porch"
            }
        })
    }

    #[test]
    fn test_automation_from_value() {
        let automation = Automation::from_value(&sample(), &Decoder::new()).unwrap();
        assert_eq!(automation.id, "1700000000000");
        assert_eq!(automation.alias, "Porch light at dusk");
        assert_eq!(automation.trigger.len(), 1);
        assert_eq!(automation.condition.len(), 1);
        assert!(matches!(automation.action, Some(Action::Service(_))));
        assert_eq!(automation.mode, None);
    }

    #[test]
    fn test_automation_round_trip() {
        let automation = Automation::from_value(&sample(), &Decoder::new()).unwrap();
        assert_eq!(automation.to_value(), sample());
    }

    #[test]
    fn test_key_order() {
        let automation = Automation {
            id: "a".to_string(),
            description: Some("d".to_string()),
            mode: Some("single".to_string()),
            ..Default::default()
        };
        let map = automation.to_map();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["id", "alias", "description", "trigger", "action", "mode"]
        );
        assert_eq!(map["action"], json!({}));
    }

    #[test]
    fn test_plural_aliases() {
        let automation = Automation::from_value(
            &json!({
                "alias": "plural",
                "triggers": [{"platform": "homeassistant", "event": "start"}],
                "conditions": [],
                "actions": {"scene": "scene.morning"}
            }),
            &Decoder::new(),
        )
        .unwrap();
        assert_eq!(automation.trigger.len(), 1);
        assert!(matches!(automation.action, Some(Action::Scene(_))));

        // Encoding always uses the singular keys
        let value = automation.to_value();
        assert!(value.get("trigger").is_some());
        assert!(value.get("triggers").is_none());
    }

    #[test]
    fn test_trigger_error_carries_index() {
        let err = Automation::from_value(
            &json!({
                "trigger": [
                    {"platform": "state", "entity_id": "a.b"},
                    {"platform": "nope"}
                ]
            }),
            &Decoder::new(),
        )
        .unwrap_err();
        match err {
            AutomationError::Trigger { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source.kind(), crate::error::ErrorKind::UnrecognizedVariant);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_condition_must_be_list() {
        let err = Automation::from_value(
            &json!({"condition": {"condition": "state"}}),
            &Decoder::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AutomationError::InvalidField {
                key: "condition".to_string(),
                expected: "an array",
                actual: "object".to_string(),
            }
        );
    }

    #[test]
    fn test_not_an_object() {
        let err = Automation::from_value(&json!("automation"), &Decoder::new()).unwrap_err();
        assert!(matches!(err, AutomationError::NotAnObject { .. }));
    }

    #[test]
    fn test_serde_delegates() {
        let automation: Automation = serde_json::from_value(sample()).unwrap();
        assert_eq!(serde_json::to_value(&automation).unwrap(), sample());
    }

    #[test]
    fn test_list_entries_from_states() {
        let states = vec![
            json!({
                "entity_id": "automation.porch",
                "state": "on",
                "attributes": {
                    "friendly_name": "Porch light at dusk",
                    "last_triggered": "2024-03-01T18:04:05.123456+00:00"
                },
                "context": {"id": "01HQ2X"}
            }),
            json!({
                "entity_id": "light.porch",
                "state": "off",
                "attributes": {},
                "context": {"id": "01HQ2Y"}
            }),
            json!({
                "entity_id": "automation.never",
                "state": "on",
                "attributes": {"friendly_name": "Never", "last_triggered": null},
                "context": {"id": "01HQ2Z"}
            }),
        ];

        let entries = AutomationListEntry::from_states(&states).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "01HQ2X");
        assert_eq!(entries[0].friendly_name, "Porch light at dusk");
        assert!(entries[0].last_triggered.is_some());
        assert_eq!(entries[1].last_triggered, None);
    }

    #[test]
    fn test_list_entry_bad_timestamp() {
        let err = AutomationListEntry::from_state(&json!({
            "entity_id": "automation.bad",
            "attributes": {"last_triggered": "yesterday"}
        }))
        .unwrap_err();
        assert!(matches!(err, AutomationError::InvalidField { ref key, .. } if key == "last_triggered"));
    }
}
