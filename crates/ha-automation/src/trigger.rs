//! Trigger types
//!
//! Triggers are event detectors that initiate automations. On the wire a
//! trigger is an object whose `platform` key selects the variant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::decode::{object_of, Decoder, FieldReader};
use crate::encode::{encode_trigger, FieldWriter};
use crate::error::CodecResult;
use crate::registry::{FieldSpec, FieldType, UnionKind, Variant, VariantDescriptor};
use crate::scalar::{FlexDuration, StringOrNumber};

/// Trigger definition
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Fires when an entity's state changes
    State(StateTrigger),

    /// Fires when a message arrives on an MQTT topic
    Mqtt(MqttTrigger),

    /// Fires when a geolocation source enters/leaves a zone
    GeoLocation(GeoLocationTrigger),

    /// Fires on Home Assistant start/shutdown
    Homeassistant(HomeassistantTrigger),

    /// Fires when a numeric value crosses a threshold
    NumericState(NumericStateTrigger),

    /// Fires at sunrise/sunset
    Sun(SunTrigger),

    /// Fires on a time pattern (e.g., every 5 minutes)
    TimePattern(TimePatternTrigger),

    /// Fires on webhook request
    Webhook(WebhookTrigger),

    /// Fires when an entity enters/leaves a zone
    Zone(ZoneTrigger),

    /// Fires at a specific time
    Time(TimeTrigger),

    /// Fires when a template evaluates to true
    Template(TemplateTrigger),

    /// Fires on any event with optional data matching
    Event(EventTrigger),

    /// Fires on a device-specific event
    Device(DeviceTrigger),
}

/// Trigger variant tag, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    State,
    Mqtt,
    GeoLocation,
    Homeassistant,
    NumericState,
    Sun,
    TimePattern,
    Webhook,
    Zone,
    Time,
    Template,
    Event,
    Device,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 13] = [
        TriggerKind::State,
        TriggerKind::Mqtt,
        TriggerKind::GeoLocation,
        TriggerKind::Homeassistant,
        TriggerKind::NumericState,
        TriggerKind::Sun,
        TriggerKind::TimePattern,
        TriggerKind::Webhook,
        TriggerKind::Zone,
        TriggerKind::Time,
        TriggerKind::Template,
        TriggerKind::Event,
        TriggerKind::Device,
    ];

    /// Schema of this variant
    pub fn descriptor(self) -> &'static VariantDescriptor {
        match self {
            TriggerKind::State => StateTrigger::DESCRIPTOR,
            TriggerKind::Mqtt => MqttTrigger::DESCRIPTOR,
            TriggerKind::GeoLocation => GeoLocationTrigger::DESCRIPTOR,
            TriggerKind::Homeassistant => HomeassistantTrigger::DESCRIPTOR,
            TriggerKind::NumericState => NumericStateTrigger::DESCRIPTOR,
            TriggerKind::Sun => SunTrigger::DESCRIPTOR,
            TriggerKind::TimePattern => TimePatternTrigger::DESCRIPTOR,
            TriggerKind::Webhook => WebhookTrigger::DESCRIPTOR,
            TriggerKind::Zone => ZoneTrigger::DESCRIPTOR,
            TriggerKind::Time => TimeTrigger::DESCRIPTOR,
            TriggerKind::Template => TemplateTrigger::DESCRIPTOR,
            TriggerKind::Event => EventTrigger::DESCRIPTOR,
            TriggerKind::Device => DeviceTrigger::DESCRIPTOR,
        }
    }

    /// The `platform` value
    pub fn platform(self) -> &'static str {
        self.descriptor().discriminator
    }

    /// Look up a variant by its `platform` value
    pub fn from_discriminator(platform: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.platform() == platform)
    }
}

impl Trigger {
    /// Get the variant tag
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::State(_) => TriggerKind::State,
            Trigger::Mqtt(_) => TriggerKind::Mqtt,
            Trigger::GeoLocation(_) => TriggerKind::GeoLocation,
            Trigger::Homeassistant(_) => TriggerKind::Homeassistant,
            Trigger::NumericState(_) => TriggerKind::NumericState,
            Trigger::Sun(_) => TriggerKind::Sun,
            Trigger::TimePattern(_) => TriggerKind::TimePattern,
            Trigger::Webhook(_) => TriggerKind::Webhook,
            Trigger::Zone(_) => TriggerKind::Zone,
            Trigger::Time(_) => TriggerKind::Time,
            Trigger::Template(_) => TriggerKind::Template,
            Trigger::Event(_) => TriggerKind::Event,
            Trigger::Device(_) => TriggerKind::Device,
        }
    }

    /// Get the trigger platform name
    pub fn platform(&self) -> &'static str {
        self.kind().platform()
    }

    /// Decode from a wire object with the default decoder
    pub fn from_map(object: &Map<String, Value>) -> CodecResult<Self> {
        Decoder::new().decode_trigger(object)
    }

    /// Decode from a JSON value with the default decoder
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        Self::from_map(object_of(UnionKind::Trigger, value)?)
    }

    /// Encode to a wire object
    pub fn to_map(&self) -> Map<String, Value> {
        encode_trigger(self)
    }

    /// Encode to a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Trigger::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// State change trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateTrigger {
    /// Entity to monitor; all entities when unset
    pub entity_id: Option<String>,

    /// Previous state to match
    pub from: StringOrNumber,

    /// New state to match
    pub to: StringOrNumber,

    /// Duration the state must be held before triggering
    pub r#for: FlexDuration,

    /// Attribute to monitor instead of state
    pub attribute: Option<String>,
}

impl StateTrigger {
    const ENTITY_ID: FieldSpec = FieldSpec::omit_empty("entity_id", FieldType::String);
    const FROM: FieldSpec = FieldSpec::new("from", FieldType::Flex);
    const TO: FieldSpec = FieldSpec::new("to", FieldType::Flex);
    const FOR: FieldSpec = FieldSpec::new("for", FieldType::Duration);
    const ATTRIBUTE: FieldSpec = FieldSpec::omit_empty("attribute", FieldType::String);
}

impl Variant for StateTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "state",
        fields: &[
            Self::ENTITY_ID,
            Self::FROM,
            Self::TO,
            Self::FOR,
            Self::ATTRIBUTE,
        ],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            entity_id: fields.optional(&Self::ENTITY_ID)?,
            from: fields.field(&Self::FROM)?,
            to: fields.field(&Self::TO)?,
            r#for: fields.field(&Self::FOR)?,
            attribute: fields.optional(&Self::ATTRIBUTE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.optional(&Self::ENTITY_ID, self.entity_id.as_ref());
        fields.field(&Self::FROM, &self.from);
        fields.field(&Self::TO, &self.to);
        fields.field(&Self::FOR, &self.r#for);
        fields.optional(&Self::ATTRIBUTE, self.attribute.as_ref());
    }
}

/// MQTT trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MqttTrigger {
    pub topic: String,

    /// Payload to match; any payload when unset
    pub payload: Option<String>,
}

impl MqttTrigger {
    const TOPIC: FieldSpec = FieldSpec::new("topic", FieldType::String);
    const PAYLOAD: FieldSpec = FieldSpec::omit_empty("payload", FieldType::String);
}

impl Variant for MqttTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "mqtt",
        fields: &[Self::TOPIC, Self::PAYLOAD],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            topic: fields.field(&Self::TOPIC)?,
            payload: fields.optional(&Self::PAYLOAD)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::TOPIC, &self.topic);
        fields.optional(&Self::PAYLOAD, self.payload.as_ref());
    }
}

/// Geolocation trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoLocationTrigger {
    /// Geolocation platform feeding the events
    pub source: String,

    /// Zone entity
    pub zone: String,

    /// `enter` or `leave`
    pub event: String,
}

impl GeoLocationTrigger {
    const SOURCE: FieldSpec = FieldSpec::new("source", FieldType::String);
    const ZONE: FieldSpec = FieldSpec::new("zone", FieldType::String);
    const EVENT: FieldSpec = FieldSpec::new("event", FieldType::String);
}

impl Variant for GeoLocationTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "geo_location",
        fields: &[Self::SOURCE, Self::ZONE, Self::EVENT],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            source: fields.field(&Self::SOURCE)?,
            zone: fields.field(&Self::ZONE)?,
            event: fields.field(&Self::EVENT)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::SOURCE, &self.source);
        fields.field(&Self::ZONE, &self.zone);
        fields.field(&Self::EVENT, &self.event);
    }
}

/// Home Assistant trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeassistantTrigger {
    /// `start` or `shutdown`
    pub event: String,
}

impl HomeassistantTrigger {
    const EVENT: FieldSpec = FieldSpec::new("event", FieldType::String);
}

impl Variant for HomeassistantTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "homeassistant",
        fields: &[Self::EVENT],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            event: fields.field(&Self::EVENT)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::EVENT, &self.event);
    }
}

/// Numeric state trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericStateTrigger {
    pub entity_id: String,

    /// Trigger when value goes above this
    pub above: f64,

    /// Trigger when value goes below this
    pub below: f64,

    /// Template to extract value
    pub value_template: String,

    /// Duration the value must be held
    pub r#for: FlexDuration,

    /// Attribute to monitor (uses state if not set)
    pub attribute: Option<String>,
}

impl NumericStateTrigger {
    const ENTITY_ID: FieldSpec = FieldSpec::new("entity_id", FieldType::String);
    const ABOVE: FieldSpec = FieldSpec::new("above", FieldType::Number);
    const BELOW: FieldSpec = FieldSpec::new("below", FieldType::Number);
    const VALUE_TEMPLATE: FieldSpec = FieldSpec::new("value_template", FieldType::String);
    const FOR: FieldSpec = FieldSpec::new("for", FieldType::Duration);
    const ATTRIBUTE: FieldSpec = FieldSpec::omit_empty("attribute", FieldType::String);
}

impl Variant for NumericStateTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "numeric_state",
        fields: &[
            Self::ENTITY_ID,
            Self::ABOVE,
            Self::BELOW,
            Self::VALUE_TEMPLATE,
            Self::FOR,
            Self::ATTRIBUTE,
        ],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            entity_id: fields.field(&Self::ENTITY_ID)?,
            above: fields.field(&Self::ABOVE)?,
            below: fields.field(&Self::BELOW)?,
            value_template: fields.field(&Self::VALUE_TEMPLATE)?,
            r#for: fields.field(&Self::FOR)?,
            attribute: fields.optional(&Self::ATTRIBUTE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::ENTITY_ID, &self.entity_id);
        fields.field(&Self::ABOVE, &self.above);
        fields.field(&Self::BELOW, &self.below);
        fields.field(&Self::VALUE_TEMPLATE, &self.value_template);
        fields.field(&Self::FOR, &self.r#for);
        fields.optional(&Self::ATTRIBUTE, self.attribute.as_ref());
    }
}

/// Sun trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SunTrigger {
    /// Offset from the event, in seconds or as `"-00:30:00"`
    pub offset: StringOrNumber,

    /// `sunrise` or `sunset`
    pub event: String,
}

impl SunTrigger {
    const OFFSET: FieldSpec = FieldSpec::new("offset", FieldType::Flex);
    const EVENT: FieldSpec = FieldSpec::new("event", FieldType::String);
}

impl Variant for SunTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "sun",
        fields: &[Self::OFFSET, Self::EVENT],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            offset: fields.field(&Self::OFFSET)?,
            event: fields.field(&Self::EVENT)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::OFFSET, &self.offset);
        fields.field(&Self::EVENT, &self.event);
    }
}

/// Time pattern trigger (cron-like)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimePatternTrigger {
    /// Hours pattern (0-23 or /N)
    pub hours: StringOrNumber,

    /// Minutes pattern (0-59 or /N)
    pub minutes: StringOrNumber,

    /// Seconds pattern (0-59 or /N)
    pub seconds: StringOrNumber,
}

impl TimePatternTrigger {
    const HOURS: FieldSpec = FieldSpec::new("hours", FieldType::Flex);
    const MINUTES: FieldSpec = FieldSpec::new("minutes", FieldType::Flex);
    const SECONDS: FieldSpec = FieldSpec::new("seconds", FieldType::Flex);
}

impl Variant for TimePatternTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "time_pattern",
        fields: &[Self::HOURS, Self::MINUTES, Self::SECONDS],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            hours: fields.field(&Self::HOURS)?,
            minutes: fields.field(&Self::MINUTES)?,
            seconds: fields.field(&Self::SECONDS)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::HOURS, &self.hours);
        fields.field(&Self::MINUTES, &self.minutes);
        fields.field(&Self::SECONDS, &self.seconds);
    }
}

/// Webhook trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookTrigger {
    pub webhook_id: String,

    /// Only accept requests from the local network
    pub local_only: Option<bool>,
}

impl WebhookTrigger {
    const WEBHOOK_ID: FieldSpec = FieldSpec::new("webhook_id", FieldType::String);
    const LOCAL_ONLY: FieldSpec = FieldSpec::omit_empty("local_only", FieldType::Boolean);
}

impl Variant for WebhookTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "webhook",
        fields: &[Self::WEBHOOK_ID, Self::LOCAL_ONLY],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            webhook_id: fields.field(&Self::WEBHOOK_ID)?,
            local_only: fields.optional(&Self::LOCAL_ONLY)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::WEBHOOK_ID, &self.webhook_id);
        fields.optional(&Self::LOCAL_ONLY, self.local_only.as_ref());
    }
}

/// Zone trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTrigger {
    /// Person/device tracker entity
    pub entity_id: String,

    /// Zone entity
    pub zone: String,

    /// `enter` or `leave`
    pub event: String,
}

impl ZoneTrigger {
    const ENTITY_ID: FieldSpec = FieldSpec::new("entity_id", FieldType::String);
    const ZONE: FieldSpec = FieldSpec::new("zone", FieldType::String);
    const EVENT: FieldSpec = FieldSpec::new("event", FieldType::String);
}

impl Variant for ZoneTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "zone",
        fields: &[Self::ENTITY_ID, Self::ZONE, Self::EVENT],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            entity_id: fields.field(&Self::ENTITY_ID)?,
            zone: fields.field(&Self::ZONE)?,
            event: fields.field(&Self::EVENT)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::ENTITY_ID, &self.entity_id);
        fields.field(&Self::ZONE, &self.zone);
        fields.field(&Self::EVENT, &self.event);
    }
}

/// Time trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeTrigger {
    /// A time like HH:MM:SS, 24-hour time, or an input_datetime entity
    pub at: String,
}

impl TimeTrigger {
    const AT: FieldSpec = FieldSpec::new("at", FieldType::String);
}

impl Variant for TimeTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "time",
        fields: &[Self::AT],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            at: fields.field(&Self::AT)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::AT, &self.at);
    }
}

/// Template trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateTrigger {
    /// Template that evaluates to true/false
    pub value_template: String,

    /// Duration the template must be true
    pub r#for: Option<FlexDuration>,
}

impl TemplateTrigger {
    const VALUE_TEMPLATE: FieldSpec = FieldSpec::new("value_template", FieldType::String);
    const FOR: FieldSpec = FieldSpec::omit_empty("for", FieldType::Duration);
}

impl Variant for TemplateTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "template",
        fields: &[Self::VALUE_TEMPLATE, Self::FOR],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            value_template: fields.field(&Self::VALUE_TEMPLATE)?,
            r#for: fields.optional(&Self::FOR)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::VALUE_TEMPLATE, &self.value_template);
        fields.optional(&Self::FOR, self.r#for.as_ref());
    }
}

/// Event trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTrigger {
    /// Event type to match
    pub event_type: String,

    /// Event data to match, carried as-is
    pub event_data: Value,
}

impl EventTrigger {
    const EVENT_TYPE: FieldSpec = FieldSpec::new("event_type", FieldType::String);
    const EVENT_DATA: FieldSpec = FieldSpec::new("event_data", FieldType::Json);
}

impl Variant for EventTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "event",
        fields: &[Self::EVENT_TYPE, Self::EVENT_DATA],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            event_type: fields.field(&Self::EVENT_TYPE)?,
            event_data: fields.field(&Self::EVENT_DATA)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::EVENT_TYPE, &self.event_type);
        fields.field(&Self::EVENT_DATA, &self.event_data);
    }
}

/// Device trigger (integration-specific)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceTrigger {
    pub device_id: String,

    /// Integration domain
    pub domain: String,

    pub entity_id: String,

    /// Trigger type (integration-specific)
    pub r#type: Option<String>,

    pub subtype: Option<String>,

    pub event: Option<String>,
}

impl DeviceTrigger {
    const DEVICE_ID: FieldSpec = FieldSpec::new("device_id", FieldType::String);
    const DOMAIN: FieldSpec = FieldSpec::new("domain", FieldType::String);
    const ENTITY_ID: FieldSpec = FieldSpec::new("entity_id", FieldType::String);
    const TYPE: FieldSpec = FieldSpec::omit_empty("type", FieldType::String);
    const SUBTYPE: FieldSpec = FieldSpec::omit_empty("subtype", FieldType::String);
    const EVENT: FieldSpec = FieldSpec::omit_empty("event", FieldType::String);
}

impl Variant for DeviceTrigger {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Trigger,
        discriminator: "device",
        fields: &[
            Self::DEVICE_ID,
            Self::DOMAIN,
            Self::ENTITY_ID,
            Self::TYPE,
            Self::SUBTYPE,
            Self::EVENT,
        ],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            device_id: fields.field(&Self::DEVICE_ID)?,
            domain: fields.field(&Self::DOMAIN)?,
            entity_id: fields.field(&Self::ENTITY_ID)?,
            r#type: fields.optional(&Self::TYPE)?,
            subtype: fields.optional(&Self::SUBTYPE)?,
            event: fields.optional(&Self::EVENT)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::DEVICE_ID, &self.device_id);
        fields.field(&Self::DOMAIN, &self.domain);
        fields.field(&Self::ENTITY_ID, &self.entity_id);
        fields.optional(&Self::TYPE, self.r#type.as_ref());
        fields.optional(&Self::SUBTYPE, self.subtype.as_ref());
        fields.optional(&Self::EVENT, self.event.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_state_trigger_deserialize() {
        let json = r#"{
            "platform": "state",
            "entity_id": "light.living_room",
            "to": "on"
        }"#;

        let trigger: Trigger = serde_json::from_str(json).unwrap();
        assert!(matches!(trigger, Trigger::State(_)));
        assert_eq!(trigger.platform(), "state");
    }

    #[test]
    fn test_state_trigger_for_duration() {
        let trigger = Trigger::from_value(&json!({
            "platform": "state",
            "entity_id": "binary_sensor.door",
            "to": "on",
            "for": "00:05:00"
        }))
        .unwrap();
        if let Trigger::State(t) = trigger {
            assert_eq!(t.r#for.duration(), Duration::from_secs(300));
            assert_eq!(t.entity_id.as_deref(), Some("binary_sensor.door"));
            assert_eq!(t.from, StringOrNumber::default());
        } else {
            panic!("Expected State trigger");
        }
    }

    #[test]
    fn test_event_trigger_deserialize() {
        let json = r#"{
            "platform": "event",
            "event_type": "mobile_app_notification_action",
            "event_data": {"action": "confirm"}
        }"#;

        let trigger: Trigger = serde_json::from_str(json).unwrap();
        if let Trigger::Event(t) = trigger {
            assert_eq!(t.event_data, json!({"action": "confirm"}));
        } else {
            panic!("Expected Event trigger");
        }
    }

    #[test]
    fn test_time_pattern_trigger() {
        let trigger = Trigger::from_value(&json!({
            "platform": "time_pattern",
            "minutes": "/5",
            "seconds": 0
        }))
        .unwrap();
        if let Trigger::TimePattern(t) = trigger {
            assert_eq!(t.minutes.as_str(), Some("/5"));
            assert_eq!(t.seconds.as_f64(), Some(0.0));
            assert_eq!(t.hours, StringOrNumber::default());
        } else {
            panic!("Expected TimePattern trigger");
        }
    }

    #[test]
    fn test_numeric_state_rejects_string_threshold() {
        let err = Trigger::from_value(&json!({
            "platform": "numeric_state",
            "entity_id": "sensor.temperature",
            "above": "20"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("above"));
    }

    #[test]
    fn test_trigger_from_non_object() {
        let err = Trigger::from_value(&json!(["state"])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FieldTypeMismatch);
    }

    #[test]
    fn test_kind_lookup() {
        for kind in TriggerKind::ALL {
            assert_eq!(TriggerKind::from_discriminator(kind.platform()), Some(kind));
        }
        assert_eq!(TriggerKind::from_discriminator("State"), None);
        assert_eq!(TriggerKind::Homeassistant.platform(), "homeassistant");
    }

    #[test]
    fn test_serialize_matches_to_value() {
        let trigger = Trigger::Webhook(WebhookTrigger {
            webhook_id: "hook".to_string(),
            local_only: Some(true),
        });
        assert_eq!(
            serde_json::to_value(&trigger).unwrap(),
            json!({"platform": "webhook", "webhook_id": "hook", "local_only": true})
        );
        assert_eq!(serde_json::to_value(&trigger).unwrap(), trigger.to_value());
    }
}
