//! Variant decoder
//!
//! Decoding a wire object is: find the discriminator, resolve the variant,
//! then coerce each schema field that is present. Absent fields take their
//! zero value; keys outside the schema are ignored. Nested condition lists
//! recurse through [`Decoder::decode_condition`] with a depth bound.

use serde_json::{Map, Value};
use tracing::{trace, Level};

use crate::action::{
    Action, ActionKind, DelayAction, DeviceAction, EventAction, SceneAction, ServiceAction,
    WaitAction,
};
use crate::condition::{
    AndCondition, Condition, ConditionKind, NotCondition, NumericStateCondition, OrCondition,
    StateCondition, SunCondition, TemplateCondition, TimeCondition, ZoneCondition,
};
use crate::error::{CodecError, CodecResult};
use crate::registry::{FieldSpec, FieldType, UnionKind, Variant, VariantDescriptor};
use crate::scalar::{json_type_name, FromWire};
use crate::trigger::{
    DeviceTrigger, EventTrigger, GeoLocationTrigger, HomeassistantTrigger, MqttTrigger,
    NumericStateTrigger, StateTrigger, SunTrigger, TemplateTrigger, TimePatternTrigger,
    TimeTrigger, Trigger, TriggerKind, WebhookTrigger, ZoneTrigger,
};

/// Result of decoding by union kind
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Trigger(Trigger),
    Condition(Condition),
    /// `None` for an empty action object
    Action(Option<Action>),
}

/// Decodes wire objects into typed variants
///
/// Holds only the nesting limit, so one decoder can be shared freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    max_depth: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Nesting limit used unless configured otherwise
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    /// Create a decoder with the default nesting limit
    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a decoder allowing conditions nested `max_depth` levels deep
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Maximum nesting depth of condition lists
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decode an object as the given union kind
    pub fn decode(&self, union: UnionKind, object: &Map<String, Value>) -> CodecResult<Decoded> {
        match union {
            UnionKind::Trigger => self.decode_trigger(object).map(Decoded::Trigger),
            UnionKind::Condition => self.decode_condition(object).map(Decoded::Condition),
            UnionKind::Action => self.decode_action(object).map(Decoded::Action),
        }
    }

    /// Decode a trigger object, dispatching on `platform`
    pub fn decode_trigger(&self, object: &Map<String, Value>) -> CodecResult<Trigger> {
        let value = discriminator(UnionKind::Trigger, object)?;
        let kind = value
            .as_str()
            .and_then(TriggerKind::from_discriminator)
            .ok_or_else(|| unrecognized(UnionKind::Trigger, value))?;

        let descriptor = kind.descriptor();
        trace!("Decoding {} trigger", descriptor.discriminator);
        decode_trigger_variant(kind, &self.reader(descriptor, object, 0))
    }

    /// Decode a condition object, dispatching on `condition`
    pub fn decode_condition(&self, object: &Map<String, Value>) -> CodecResult<Condition> {
        self.decode_condition_at(object, 0)
    }

    /// Decode a top-level list of condition objects
    ///
    /// A failing element is reported wrapped with its index.
    pub fn decode_conditions(&self, value: &Value) -> CodecResult<Vec<Condition>> {
        let items = value
            .as_array()
            .ok_or_else(|| top_level_mismatch(UnionKind::Condition, FieldType::Conditions, value))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                object_of(UnionKind::Condition, item)
                    .and_then(|object| self.decode_condition(object))
                    .map_err(|e| CodecError::InCondition {
                        field: "$".to_string(),
                        index,
                        source: Box::new(e),
                    })
            })
            .collect()
    }

    /// Decode an action object, dispatching on the first recognized key
    ///
    /// An empty object is "no action" and decodes to `None`.
    pub fn decode_action(&self, object: &Map<String, Value>) -> CodecResult<Option<Action>> {
        if object.is_empty() {
            return Ok(None);
        }

        let kind = ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.descriptor().matches(object))
            .ok_or_else(|| unrecognized(UnionKind::Action, &Value::Object(object.clone())))?;

        let descriptor = kind.descriptor();
        trace!("Decoding {} action", descriptor.discriminator);
        decode_action_variant(kind, &self.reader(descriptor, object, 0)).map(Some)
    }

    fn decode_condition_at(
        &self,
        object: &Map<String, Value>,
        depth: usize,
    ) -> CodecResult<Condition> {
        if depth > self.max_depth {
            return Err(CodecError::NestingTooDeep {
                max_depth: self.max_depth,
            });
        }

        let value = discriminator(UnionKind::Condition, object)?;
        let kind = value
            .as_str()
            .and_then(ConditionKind::from_discriminator)
            .ok_or_else(|| unrecognized(UnionKind::Condition, value))?;

        let descriptor = kind.descriptor();
        trace!(depth, "Decoding {} condition", descriptor.discriminator);
        decode_condition_variant(kind, &self.reader(descriptor, object, depth))
    }

    fn decode_condition_list(
        &self,
        value: &Value,
        discriminator: &str,
        field: &str,
        depth: usize,
    ) -> CodecResult<Vec<Condition>> {
        let malformed = |index, actual: &Value| CodecError::MalformedNestedList {
            discriminator: discriminator.to_string(),
            field: field.to_string(),
            index,
            actual: json_type_name(actual).to_string(),
        };

        let items = value.as_array().ok_or_else(|| malformed(None, value))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let object = item.as_object().ok_or_else(|| malformed(Some(index), item))?;
                self.decode_condition_at(object, depth)
                    .map_err(|e| CodecError::InCondition {
                        field: field.to_string(),
                        index,
                        source: Box::new(e),
                    })
            })
            .collect()
    }

    fn reader<'a>(
        &'a self,
        descriptor: &'static VariantDescriptor,
        object: &'a Map<String, Value>,
        depth: usize,
    ) -> FieldReader<'a> {
        log_ignored_keys(descriptor, object);
        FieldReader {
            descriptor,
            object,
            decoder: self,
            depth,
        }
    }
}

fn decode_trigger_variant(kind: TriggerKind, fields: &FieldReader<'_>) -> CodecResult<Trigger> {
    Ok(match kind {
        TriggerKind::State => Trigger::State(StateTrigger::decode(fields)?),
        TriggerKind::Mqtt => Trigger::Mqtt(MqttTrigger::decode(fields)?),
        TriggerKind::GeoLocation => Trigger::GeoLocation(GeoLocationTrigger::decode(fields)?),
        TriggerKind::Homeassistant => Trigger::Homeassistant(HomeassistantTrigger::decode(fields)?),
        TriggerKind::NumericState => Trigger::NumericState(NumericStateTrigger::decode(fields)?),
        TriggerKind::Sun => Trigger::Sun(SunTrigger::decode(fields)?),
        TriggerKind::TimePattern => Trigger::TimePattern(TimePatternTrigger::decode(fields)?),
        TriggerKind::Webhook => Trigger::Webhook(WebhookTrigger::decode(fields)?),
        TriggerKind::Zone => Trigger::Zone(ZoneTrigger::decode(fields)?),
        TriggerKind::Time => Trigger::Time(TimeTrigger::decode(fields)?),
        TriggerKind::Template => Trigger::Template(TemplateTrigger::decode(fields)?),
        TriggerKind::Event => Trigger::Event(EventTrigger::decode(fields)?),
        TriggerKind::Device => Trigger::Device(DeviceTrigger::decode(fields)?),
    })
}

fn decode_condition_variant(
    kind: ConditionKind,
    fields: &FieldReader<'_>,
) -> CodecResult<Condition> {
    Ok(match kind {
        ConditionKind::And => Condition::And(AndCondition::decode(fields)?),
        ConditionKind::Or => Condition::Or(OrCondition::decode(fields)?),
        ConditionKind::Not => Condition::Not(NotCondition::decode(fields)?),
        ConditionKind::State => Condition::State(StateCondition::decode(fields)?),
        ConditionKind::NumericState => {
            Condition::NumericState(NumericStateCondition::decode(fields)?)
        }
        ConditionKind::Sun => Condition::Sun(SunCondition::decode(fields)?),
        ConditionKind::Zone => Condition::Zone(ZoneCondition::decode(fields)?),
        ConditionKind::Time => Condition::Time(TimeCondition::decode(fields)?),
        ConditionKind::Template => Condition::Template(TemplateCondition::decode(fields)?),
    })
}

fn decode_action_variant(kind: ActionKind, fields: &FieldReader<'_>) -> CodecResult<Action> {
    Ok(match kind {
        ActionKind::Event => Action::Event(EventAction::decode(fields)?),
        ActionKind::Service => Action::Service(ServiceAction::decode(fields)?),
        ActionKind::Device => Action::Device(DeviceAction::decode(fields)?),
        ActionKind::Delay => Action::Delay(DelayAction::decode(fields)?),
        ActionKind::Scene => Action::Scene(SceneAction::decode(fields)?),
        ActionKind::Wait => Action::Wait(WaitAction::decode(fields)?),
    })
}

fn discriminator<'a>(union: UnionKind, object: &'a Map<String, Value>) -> CodecResult<&'a Value> {
    let key = union.discriminator_key().unwrap_or_default();
    object
        .get(key)
        .ok_or(CodecError::MissingDiscriminator { union, key })
}

/// View a value as a wire object; anything else is a mismatch on `$`
pub(crate) fn object_of(union: UnionKind, value: &Value) -> CodecResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| top_level_mismatch(union, FieldType::Object, value))
}

fn top_level_mismatch(union: UnionKind, expected: FieldType, value: &Value) -> CodecError {
    CodecError::FieldTypeMismatch {
        discriminator: union.to_string(),
        field: "$".to_string(),
        expected,
        actual: json_type_name(value).to_string(),
    }
}

fn unrecognized(union: UnionKind, value: &Value) -> CodecError {
    CodecError::UnrecognizedVariant {
        union,
        value: value.to_string(),
    }
}

fn log_ignored_keys(descriptor: &VariantDescriptor, object: &Map<String, Value>) {
    if !tracing::enabled!(Level::TRACE) {
        return;
    }
    let discriminator_key = descriptor.union.discriminator_key();
    let ignored: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|key| Some(*key) != discriminator_key && descriptor.field(key).is_none())
        .collect();
    if !ignored.is_empty() {
        trace!(
            "Ignoring keys {:?} not in the {} {} schema",
            ignored,
            descriptor.discriminator,
            descriptor.union
        );
    }
}

/// Typed access to the fields of one wire object
///
/// Handed to [`Variant::decode`](crate::registry::Variant::decode); every
/// accessor takes the field's [`FieldSpec`] so failures name the field and
/// its declared type.
pub struct FieldReader<'a> {
    descriptor: &'static VariantDescriptor,
    object: &'a Map<String, Value>,
    decoder: &'a Decoder,
    depth: usize,
}

impl FieldReader<'_> {
    /// Decode a field, using the zero value when it is absent
    pub fn field<T: FromWire + Default>(&self, spec: &FieldSpec) -> CodecResult<T> {
        Ok(self.optional(spec)?.unwrap_or_default())
    }

    /// Decode a field, `None` when it is absent
    pub fn optional<T: FromWire>(&self, spec: &FieldSpec) -> CodecResult<Option<T>> {
        debug_assert_eq!(spec.ty, T::FIELD_TYPE, "field {} read as wrong type", spec.key);
        match self.object.get(spec.key) {
            None => Ok(None),
            Some(value) => T::from_wire(value)
                .map(Some)
                .map_err(|actual| CodecError::FieldTypeMismatch {
                    discriminator: self.descriptor.discriminator.to_string(),
                    field: spec.key.to_string(),
                    expected: spec.ty,
                    actual,
                }),
        }
    }

    /// Decode a nested condition list, empty when absent
    pub fn conditions(&self, spec: &FieldSpec) -> CodecResult<Vec<Condition>> {
        debug_assert_eq!(spec.ty, FieldType::Conditions);
        match self.object.get(spec.key) {
            None => Ok(Vec::new()),
            Some(value) => self.decoder.decode_condition_list(
                value,
                self.descriptor.discriminator,
                spec.key,
                self.depth + 1,
            ),
        }
    }
}
