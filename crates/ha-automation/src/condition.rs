//! Condition types
//!
//! Conditions are state-based tests evaluated at trigger time. On the wire a
//! condition is an object whose `condition` key selects the variant; the
//! logical variants hold a nested `conditions` list.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::decode::{object_of, Decoder, FieldReader};
use crate::encode::{encode_condition, FieldWriter};
use crate::error::CodecResult;
use crate::registry::{FieldSpec, FieldType, UnionKind, Variant, VariantDescriptor};
use crate::scalar::{FlexDuration, StringOrNumber};

/// Condition definition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// All conditions must be true (AND)
    And(AndCondition),

    /// Any condition must be true (OR)
    Or(OrCondition),

    /// None of the conditions may be true (NOT)
    Not(NotCondition),

    /// Check entity state
    State(StateCondition),

    /// Check numeric value thresholds
    NumericState(NumericStateCondition),

    /// Check sun position
    Sun(SunCondition),

    /// Check zone membership
    Zone(ZoneCondition),

    /// Check current time
    Time(TimeCondition),

    /// Evaluate a template
    Template(TemplateCondition),
}

/// Condition variant tag, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    And,
    Or,
    Not,
    State,
    NumericState,
    Sun,
    Zone,
    Time,
    Template,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 9] = [
        ConditionKind::And,
        ConditionKind::Or,
        ConditionKind::Not,
        ConditionKind::State,
        ConditionKind::NumericState,
        ConditionKind::Sun,
        ConditionKind::Zone,
        ConditionKind::Time,
        ConditionKind::Template,
    ];

    /// Schema of this variant
    pub fn descriptor(self) -> &'static VariantDescriptor {
        match self {
            ConditionKind::And => AndCondition::DESCRIPTOR,
            ConditionKind::Or => OrCondition::DESCRIPTOR,
            ConditionKind::Not => NotCondition::DESCRIPTOR,
            ConditionKind::State => StateCondition::DESCRIPTOR,
            ConditionKind::NumericState => NumericStateCondition::DESCRIPTOR,
            ConditionKind::Sun => SunCondition::DESCRIPTOR,
            ConditionKind::Zone => ZoneCondition::DESCRIPTOR,
            ConditionKind::Time => TimeCondition::DESCRIPTOR,
            ConditionKind::Template => TemplateCondition::DESCRIPTOR,
        }
    }

    /// The `condition` value
    pub fn name(self) -> &'static str {
        self.descriptor().discriminator
    }

    /// Look up a variant by its `condition` value
    pub fn from_discriminator(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl Condition {
    /// Create an AND condition
    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And(AndCondition { conditions })
    }

    /// Create an OR condition
    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or(OrCondition { conditions })
    }

    /// Create a NOT condition
    pub fn not(conditions: Vec<Condition>) -> Self {
        Condition::Not(NotCondition { conditions })
    }

    /// Get the variant tag
    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::And(_) => ConditionKind::And,
            Condition::Or(_) => ConditionKind::Or,
            Condition::Not(_) => ConditionKind::Not,
            Condition::State(_) => ConditionKind::State,
            Condition::NumericState(_) => ConditionKind::NumericState,
            Condition::Sun(_) => ConditionKind::Sun,
            Condition::Zone(_) => ConditionKind::Zone,
            Condition::Time(_) => ConditionKind::Time,
            Condition::Template(_) => ConditionKind::Template,
        }
    }

    /// Get the condition type name
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Nested conditions of a logical condition
    pub fn children(&self) -> &[Condition] {
        match self {
            Condition::And(c) => &c.conditions,
            Condition::Or(c) => &c.conditions,
            Condition::Not(c) => &c.conditions,
            _ => &[],
        }
    }

    /// Decode from a wire object with the default decoder
    pub fn from_map(object: &Map<String, Value>) -> CodecResult<Self> {
        Decoder::new().decode_condition(object)
    }

    /// Decode from a JSON value with the default decoder
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        Self::from_map(object_of(UnionKind::Condition, value)?)
    }

    /// Encode to a wire object
    pub fn to_map(&self) -> Map<String, Value> {
        encode_condition(self)
    }

    /// Encode to a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Condition::from_value(&value).map_err(serde::de::Error::custom)
    }
}

const CONDITIONS: FieldSpec = FieldSpec::new("conditions", FieldType::Conditions);

/// AND condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndCondition {
    pub conditions: Vec<Condition>,
}

impl Variant for AndCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "and",
        fields: &[CONDITIONS],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            conditions: fields.conditions(&CONDITIONS)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.conditions(&CONDITIONS, &self.conditions);
    }
}

/// OR condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrCondition {
    pub conditions: Vec<Condition>,
}

impl Variant for OrCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "or",
        fields: &[CONDITIONS],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            conditions: fields.conditions(&CONDITIONS)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.conditions(&CONDITIONS, &self.conditions);
    }
}

/// NOT condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotCondition {
    pub conditions: Vec<Condition>,
}

impl Variant for NotCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "not",
        fields: &[CONDITIONS],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            conditions: fields.conditions(&CONDITIONS)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.conditions(&CONDITIONS, &self.conditions);
    }
}

/// State condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateCondition {
    pub entity_id: String,

    /// Expected state, textual or numeric
    pub state: StringOrNumber,

    /// Attribute to check instead of state
    pub attribute: Option<String>,

    /// Duration the state must have been held
    pub r#for: Option<FlexDuration>,
}

impl StateCondition {
    const ENTITY_ID: FieldSpec = FieldSpec::new("entity_id", FieldType::String);
    const STATE: FieldSpec = FieldSpec::new("state", FieldType::Flex);
    const ATTRIBUTE: FieldSpec = FieldSpec::omit_empty("attribute", FieldType::String);
    const FOR: FieldSpec = FieldSpec::omit_empty("for", FieldType::Duration);
}

impl Variant for StateCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "state",
        fields: &[Self::ENTITY_ID, Self::STATE, Self::ATTRIBUTE, Self::FOR],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            entity_id: fields.field(&Self::ENTITY_ID)?,
            state: fields.field(&Self::STATE)?,
            attribute: fields.optional(&Self::ATTRIBUTE)?,
            r#for: fields.optional(&Self::FOR)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::ENTITY_ID, &self.entity_id);
        fields.field(&Self::STATE, &self.state);
        fields.optional(&Self::ATTRIBUTE, self.attribute.as_ref());
        fields.optional(&Self::FOR, self.r#for.as_ref());
    }
}

/// Numeric state condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericStateCondition {
    pub entity_id: String,

    /// Value must be above this
    pub above: f64,

    /// Value must be below this
    pub below: Option<f64>,

    /// Attribute to check instead of state
    pub attribute: Option<String>,

    /// Template to extract value
    pub value_template: Option<String>,
}

impl NumericStateCondition {
    const ENTITY_ID: FieldSpec = FieldSpec::new("entity_id", FieldType::String);
    const ABOVE: FieldSpec = FieldSpec::new("above", FieldType::Number);
    const BELOW: FieldSpec = FieldSpec::omit_empty("below", FieldType::Number);
    const ATTRIBUTE: FieldSpec = FieldSpec::omit_empty("attribute", FieldType::String);
    const VALUE_TEMPLATE: FieldSpec = FieldSpec::omit_empty("value_template", FieldType::String);
}

impl Variant for NumericStateCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "numeric_state",
        fields: &[
            Self::ENTITY_ID,
            Self::ABOVE,
            Self::BELOW,
            Self::ATTRIBUTE,
            Self::VALUE_TEMPLATE,
        ],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            entity_id: fields.field(&Self::ENTITY_ID)?,
            above: fields.field(&Self::ABOVE)?,
            below: fields.optional(&Self::BELOW)?,
            attribute: fields.optional(&Self::ATTRIBUTE)?,
            value_template: fields.optional(&Self::VALUE_TEMPLATE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::ENTITY_ID, &self.entity_id);
        fields.field(&Self::ABOVE, &self.above);
        fields.optional(&Self::BELOW, self.below.as_ref());
        fields.optional(&Self::ATTRIBUTE, self.attribute.as_ref());
        fields.optional(&Self::VALUE_TEMPLATE, self.value_template.as_ref());
    }
}

/// Sun condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SunCondition {
    /// Offset after the `after` event, in seconds
    pub after_offset: f64,

    /// Offset before the `before` event, in seconds
    pub before_offset: f64,

    /// `sunrise` or `sunset`
    pub after: String,

    /// `sunrise` or `sunset`
    pub before: String,
}

impl SunCondition {
    const AFTER_OFFSET: FieldSpec = FieldSpec::new("after_offset", FieldType::Number);
    const BEFORE_OFFSET: FieldSpec = FieldSpec::new("before_offset", FieldType::Number);
    const AFTER: FieldSpec = FieldSpec::new("after", FieldType::String);
    const BEFORE: FieldSpec = FieldSpec::new("before", FieldType::String);
}

impl Variant for SunCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "sun",
        fields: &[
            Self::AFTER_OFFSET,
            Self::BEFORE_OFFSET,
            Self::AFTER,
            Self::BEFORE,
        ],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            after_offset: fields.field(&Self::AFTER_OFFSET)?,
            before_offset: fields.field(&Self::BEFORE_OFFSET)?,
            after: fields.field(&Self::AFTER)?,
            before: fields.field(&Self::BEFORE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::AFTER_OFFSET, &self.after_offset);
        fields.field(&Self::BEFORE_OFFSET, &self.before_offset);
        fields.field(&Self::AFTER, &self.after);
        fields.field(&Self::BEFORE, &self.before);
    }
}

/// Zone condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneCondition {
    /// Person/device tracker entity
    pub entity_id: String,

    /// Zone entity
    pub zone: String,
}

impl ZoneCondition {
    const ENTITY_ID: FieldSpec = FieldSpec::new("entity_id", FieldType::String);
    const ZONE: FieldSpec = FieldSpec::new("zone", FieldType::String);
}

impl Variant for ZoneCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "zone",
        fields: &[Self::ENTITY_ID, Self::ZONE],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            entity_id: fields.field(&Self::ENTITY_ID)?,
            zone: fields.field(&Self::ZONE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::ENTITY_ID, &self.entity_id);
        fields.field(&Self::ZONE, &self.zone);
    }
}

/// Time condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeCondition {
    /// After this time (HH:MM:SS)
    pub after: String,

    /// Before this time (HH:MM:SS)
    pub before: String,

    /// A single weekday or a list of them, carried as-is
    pub weekday: Option<Value>,
}

impl TimeCondition {
    const AFTER: FieldSpec = FieldSpec::new("after", FieldType::String);
    const BEFORE: FieldSpec = FieldSpec::new("before", FieldType::String);
    const WEEKDAY: FieldSpec = FieldSpec::omit_empty("weekday", FieldType::Json);
}

impl Variant for TimeCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "time",
        fields: &[Self::AFTER, Self::BEFORE, Self::WEEKDAY],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            after: fields.field(&Self::AFTER)?,
            before: fields.field(&Self::BEFORE)?,
            weekday: fields.optional(&Self::WEEKDAY)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::AFTER, &self.after);
        fields.field(&Self::BEFORE, &self.before);
        fields.optional(&Self::WEEKDAY, self.weekday.as_ref());
    }
}

/// Template condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateCondition {
    pub value_template: String,
}

impl TemplateCondition {
    const VALUE_TEMPLATE: FieldSpec = FieldSpec::new("value_template", FieldType::String);
}

impl Variant for TemplateCondition {
    const DESCRIPTOR: &'static VariantDescriptor = &VariantDescriptor {
        union: UnionKind::Condition,
        discriminator: "template",
        fields: &[Self::VALUE_TEMPLATE],
    };

    fn decode(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            value_template: fields.field(&Self::VALUE_TEMPLATE)?,
        })
    }

    fn encode(&self, fields: &mut FieldWriter) {
        fields.field(&Self::VALUE_TEMPLATE, &self.value_template);
    }
}
