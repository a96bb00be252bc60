//! Action types
//!
//! An action carries no explicit type tag. The first key of
//! `event`, `service`, `device_id`, `delay`, `scene`, `wait_template`
//! present in the object (checked in that order) selects the variant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::decode::{object_of, Decoder, FieldReader};
use crate::encode::{encode_action, FieldWriter};
use crate::error::{CodecError, CodecResult};
use crate::registry::{FieldSpec, FieldType, UnionKind, Variant, VariantDescriptor};
use crate::scalar::FlexDuration;

/// Automation action
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fire an event
    Event(EventAction),

    /// Call a service
    Service(ServiceAction),

    /// Run a device action (integration-specific)
    Device(DeviceAction),

    /// Wait for a fixed time
    Delay(DelayAction),

    /// Activate a scene
    Scene(SceneAction),

    /// Wait for a template to become true
    Wait(WaitAction),
}

/// Action variant tag, in match order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Event,
    Service,
    Device,
    Delay,
    Scene,
    Wait,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Event,
        ActionKind::Service,
        ActionKind::Device,
        ActionKind::Delay,
        ActionKind::Scene,
        ActionKind::Wait,
    ];

    /// Schema of this variant
    pub fn descriptor(self) -> &'static VariantDescriptor {
        match self {
            ActionKind::Event => EventAction::DESCRIPTOR,
            ActionKind::Service => ServiceAction::DESCRIPTOR,
            ActionKind::Device => DeviceAction::DESCRIPTOR,
            ActionKind::Delay => DelayAction::DESCRIPTOR,
            ActionKind::Scene => SceneAction::DESCRIPTOR,
            ActionKind::Wait => WaitAction::DESCRIPTOR,
        }
    }

    /// The key whose presence selects this variant
    pub fn key(self) -> &'static str {
        self.descriptor().discriminator
    }

    /// Look up a variant by its selecting key
    pub fn from_discriminator(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.key() == key)
    }
}

impl Action {
    /// Get the variant tag
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Event(_) => ActionKind::Event,
            Action::Service(_) => ActionKind::Service,
            Action::Device(_) => ActionKind::Device,
            Action::Delay(_) => ActionKind::Delay,
            Action::Scene(_) => ActionKind::Scene,
            Action::Wait(_) => ActionKind::Wait,
        }
    }

    /// Decode from a wire object with the default decoder
    ///
    /// `Ok(None)` for the empty object.
    pub fn from_map(object: &Map<String, Value>) -> CodecResult<Option<Self>> {
        Decoder::new().decode_action(object)
    }

    /// Decode from a JSON value with the default decoder
    pub fn from_value(value: &Value) -> CodecResult<Option<Self>> {
        Self::from_map(object_of(UnionKind::Action, value)?)
    }

    /// Encode to a wire object
    pub fn to_map(&self) -> Map<String, Value> {
        encode_action(Some(self))
    }

    /// Encode to a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Rejects the empty object; use `Option<Action>` where "no action" is allowed.
impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Action::from_value(&value)
            .and_then(|action| {
                action.ok_or_else(|| CodecError::UnrecognizedVariant {
                    union: UnionKind::Action,
                    value: value.to_string(),
                })
            })
            .map_err(serde::de::Error::custom)
    }
}

/// Event action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventAction {
    /// Event type to fire
    pub event: String,

    pub event_data: Option<Map<String, Value>>,

    /// Event data rendered as templates
    pub event_data_template: Option<Map<String, Value>>,
}

impl EventAction {
    const EVENT: FieldSpec = FieldSpec::new("event", FieldType::String);
    const EVENT_DATA: FieldSpec = FieldSpec::omit_empty("event_data", FieldType::Object);
    const EVENT_DATA_TEMPLATE: FieldSpec =
        FieldSpec::omit_empty("event_data_template", FieldType::Object);
}

impl Variant for EventAction {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Action,
        discriminator: "event",
        fields: &[Self::EVENT, Self::EVENT_DATA, Self::EVENT_DATA_TEMPLATE],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            event: fields.field(&Self::EVENT)?,
            event_data: fields.optional(&Self::EVENT_DATA)?,
            event_data_template: fields.optional(&Self::EVENT_DATA_TEMPLATE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::EVENT, &self.event);
        fields.optional(&Self::EVENT_DATA, self.event_data.as_ref());
        fields.optional(&Self::EVENT_DATA_TEMPLATE, self.event_data_template.as_ref());
    }
}

/// Service call action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceAction {
    /// Service to call (e.g., "light.turn_on")
    pub service: String,

    pub entity_id: Option<String>,

    /// Service data
    pub data: Option<Map<String, Value>>,

    /// Target entities/devices/areas
    pub target: Option<Map<String, Value>>,
}

impl ServiceAction {
    const SERVICE: FieldSpec = FieldSpec::new("service", FieldType::String);
    const ENTITY_ID: FieldSpec = FieldSpec::omit_empty("entity_id", FieldType::String);
    const DATA: FieldSpec = FieldSpec::omit_empty("data", FieldType::Object);
    const TARGET: FieldSpec = FieldSpec::omit_empty("target", FieldType::Object);
}

impl Variant for ServiceAction {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Action,
        discriminator: "service",
        fields: &[Self::SERVICE, Self::ENTITY_ID, Self::DATA, Self::TARGET],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            service: fields.field(&Self::SERVICE)?,
            entity_id: fields.optional(&Self::ENTITY_ID)?,
            data: fields.optional(&Self::DATA)?,
            target: fields.optional(&Self::TARGET)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::SERVICE, &self.service);
        fields.optional(&Self::ENTITY_ID, self.entity_id.as_ref());
        fields.optional(&Self::DATA, self.data.as_ref());
        fields.optional(&Self::TARGET, self.target.as_ref());
    }
}

/// Device action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceAction {
    pub device_id: String,

    /// Integration domain
    pub domain: String,

    pub entity_id: String,

    /// Action type (integration-specific)
    pub r#type: Option<String>,
}

impl DeviceAction {
    const DEVICE_ID: FieldSpec = FieldSpec::new("device_id", FieldType::String);
    const DOMAIN: FieldSpec = FieldSpec::new("domain", FieldType::String);
    const ENTITY_ID: FieldSpec = FieldSpec::new("entity_id", FieldType::String);
    const TYPE: FieldSpec = FieldSpec::omit_empty("type", FieldType::String);
}

impl Variant for DeviceAction {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Action,
        discriminator: "device_id",
        fields: &[Self::DEVICE_ID, Self::DOMAIN, Self::ENTITY_ID, Self::TYPE],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            device_id: fields.field(&Self::DEVICE_ID)?,
            domain: fields.field(&Self::DOMAIN)?,
            entity_id: fields.field(&Self::ENTITY_ID)?,
            r#type: fields.optional(&Self::TYPE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::DEVICE_ID, &self.device_id);
        fields.field(&Self::DOMAIN, &self.domain);
        fields.field(&Self::ENTITY_ID, &self.entity_id);
        fields.optional(&Self::TYPE, self.r#type.as_ref());
    }
}

/// Delay action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelayAction {
    /// Delay duration, as seconds, `HH:MM:SS` or `5m`
    pub delay: FlexDuration,
}

impl DelayAction {
    const DELAY: FieldSpec = FieldSpec::new("delay", FieldType::Duration);
}

impl Variant for DelayAction {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Action,
        discriminator: "delay",
        fields: &[Self::DELAY],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            delay: fields.field(&Self::DELAY)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::DELAY, &self.delay);
    }
}

/// Scene action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneAction {
    /// Scene entity ID
    pub scene: String,
}

impl SceneAction {
    const SCENE: FieldSpec = FieldSpec::new("scene", FieldType::String);
}

impl Variant for SceneAction {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Action,
        discriminator: "scene",
        fields: &[Self::SCENE],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            scene: fields.field(&Self::SCENE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::SCENE, &self.scene);
    }
}

/// Wait for template action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitAction {
    /// Template that must become true
    pub wait_template: String,

    pub timeout: Option<FlexDuration>,

    /// Continue if timeout occurs
    pub continue_on_timeout: Option<bool>,
}

impl WaitAction {
    const WAIT_TEMPLATE: FieldSpec = FieldSpec::new("wait_template", FieldType::String);
    const TIMEOUT: FieldSpec = FieldSpec::omit_empty("timeout", FieldType::Duration);
    const CONTINUE_ON_TIMEOUT: FieldSpec =
        FieldSpec::omit_empty("continue_on_timeout", FieldType::Boolean);
}

impl Variant for WaitAction {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Action,
        discriminator: "wait_template",
        fields: &[Self::WAIT_TEMPLATE, Self::TIMEOUT, Self::CONTINUE_ON_TIMEOUT],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            wait_template: fields.field(&Self::WAIT_TEMPLATE)?,
            timeout: fields.optional(&Self::TIMEOUT)?,
            continue_on_timeout: fields.optional(&Self::CONTINUE_ON_TIMEOUT)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::WAIT_TEMPLATE, &self.wait_template);
        fields.optional(&Self::TIMEOUT, self.timeout.as_ref());
        fields.optional(&Self::CONTINUE_ON_TIMEOUT, self.continue_on_timeout.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_service_action_parse() {
        let json = r#"{
            "service": "light.turn_on",
            "target": {"entity_id": "light.living_room"},
            "data": {"brightness": 255}
        }"#;

        let action: Action = serde_json::from_str(json).unwrap();
        if let Action::Service(svc) = action {
            assert_eq!(svc.service, "light.turn_on");
            assert_eq!(svc.entity_id, None);
            assert_eq!(
                svc.data.and_then(|d| d.get("brightness").cloned()),
                Some(json!(255))
            );
        } else {
            panic!("Expected Service action");
        }
    }

    #[test]
    fn test_delay_action_parse() {
        let action = Action::from_value(&json!({"delay": "00:00:05"}))
            .unwrap()
            .unwrap();
        if let Action::Delay(delay) = &action {
            assert_eq!(delay.delay.duration(), Duration::from_secs(5));
        } else {
            panic!("Expected Delay action");
        }
        assert_eq!(action.to_value(), json!({"delay": "00:00:05"}));
    }

    #[test]
    fn test_first_key_wins() {
        // Both `event` and `service` are present; `event` comes first in match order.
        let action = Action::from_value(&json!({"service": "x.y", "event": "fired"}))
            .unwrap()
            .unwrap();
        assert_eq!(action.kind(), ActionKind::Event);
        assert_eq!(action.to_value(), json!({"event": "fired"}));
    }

    #[test]
    fn test_wait_action_optional_fields() {
        let value = json!({
            "wait_template": "{{ is_state('binary_sensor.door', 'off') }}",
            "timeout": 30,
            "continue_on_timeout": false
        });
        let action = Action::from_value(&value).unwrap().unwrap();
        if let Action::Wait(wait) = &action {
            assert_eq!(wait.continue_on_timeout, Some(false));
            assert_eq!(
                wait.timeout.as_ref().map(FlexDuration::duration),
                Some(Duration::from_secs(30))
            );
        } else {
            panic!("Expected Wait action");
        }
        assert_eq!(action.to_value(), value);
    }

    #[test]
    fn test_empty_object_is_no_action() {
        assert_eq!(Action::from_value(&json!({})).unwrap(), None);
        assert!(serde_json::from_str::<Action>("{}").is_err());
        assert_eq!(serde_json::from_str::<Option<Action>>("null").unwrap(), None);
    }

    #[test]
    fn test_device_action_selected_by_device_id() {
        let action = Action::from_value(&json!({
            "device_id": "abc123",
            "domain": "light",
            "entity_id": "light.desk",
            "type": "turn_on"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(action.kind(), ActionKind::Device);
        assert_eq!(ActionKind::from_discriminator("device_id"), Some(ActionKind::Device));
    }
}
