//! Scalar coercion
//!
//! Wire values are loosely typed: a state may be `"on"` or `1`, a `for` may be
//! `"5s"`, `"00:00:05"` or `5`. The types here accept every legal wire form,
//! remember which form was received, and re-emit it unchanged.
//!
//! [`FromWire`] and [`ToWire`] are the two directions of the coercion. A
//! failed coercion reports a description of the value actually found; the
//! decoder attaches discriminator, field and expected type to it.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use crate::registry::FieldType;

/// Outcome of a coercion; the error describes the value actually found
pub type Coercion<T> = Result<T, String>;

/// Name of a JSON value's type, as used in mismatch messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Encode a number in normalized form
///
/// Integral values within the exactly-representable range become JSON
/// integers, so `70` decodes to `70.0` and encodes back to `70`.
pub fn number_value(n: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Decode a value from its wire form
pub trait FromWire: Sized {
    /// Field type this coercion implements
    const FIELD_TYPE: FieldType;

    fn from_wire(value: &Value) -> Coercion<Self>;
}

/// Encode a value to its wire form
pub trait ToWire {
    fn to_wire(&self) -> Value;
}

impl FromWire for String {
    const FIELD_TYPE: FieldType = FieldType::String;

    fn from_wire(value: &Value) -> Coercion<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(json_type_name(other).to_string()),
        }
    }
}

impl ToWire for String {
    fn to_wire(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromWire for f64 {
    const FIELD_TYPE: FieldType = FieldType::Number;

    fn from_wire(value: &Value) -> Coercion<Self> {
        match value {
            Value::Number(n) => n.as_f64().ok_or_else(|| format!("number {n}")),
            other => Err(json_type_name(other).to_string()),
        }
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> Value {
        number_value(*self)
    }
}

impl FromWire for bool {
    const FIELD_TYPE: FieldType = FieldType::Boolean;

    fn from_wire(value: &Value) -> Coercion<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(json_type_name(other).to_string()),
        }
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromWire for Value {
    const FIELD_TYPE: FieldType = FieldType::Json;

    fn from_wire(value: &Value) -> Coercion<Self> {
        Ok(value.clone())
    }
}

impl ToWire for Value {
    fn to_wire(&self) -> Value {
        self.clone()
    }
}

impl FromWire for Map<String, Value> {
    const FIELD_TYPE: FieldType = FieldType::Object;

    fn from_wire(value: &Value) -> Coercion<Self> {
        match value {
            Value::Object(map) => Ok(map.clone()),
            other => Err(json_type_name(other).to_string()),
        }
    }
}

impl ToWire for Map<String, Value> {
    fn to_wire(&self) -> Value {
        Value::Object(self.clone())
    }
}

// --- Flexible scalar ---

/// A value that is a JSON string or a JSON number on the wire
///
/// Exactly one form is held. A number keeps the exact [`Number`] it was read
/// from, so `1.0` and integers past 2^53 re-encode unchanged. The default is
/// the empty string, which is also what an unset value encodes as.
#[derive(Debug, Clone, PartialEq)]
pub enum StringOrNumber {
    String(String),
    Number(Number),
}

impl StringOrNumber {
    /// The string form, if that is what was received
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StringOrNumber::String(s) => Some(s),
            StringOrNumber::Number(_) => None,
        }
    }

    /// The number as received, if that is the form held
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            StringOrNumber::String(_) => None,
            StringOrNumber::Number(n) => Some(n),
        }
    }

    /// The numeric form as a float, if that is what was received
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(Number::as_f64)
    }

    /// Numeric value of either form, parsing the string form if needed
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            StringOrNumber::String(s) => s.trim().parse().ok(),
            StringOrNumber::Number(n) => n.as_f64(),
        }
    }
}

impl Default for StringOrNumber {
    fn default() -> Self {
        StringOrNumber::String(String::new())
    }
}

impl fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrNumber::String(s) => f.write_str(s),
            StringOrNumber::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for StringOrNumber {
    fn from(s: &str) -> Self {
        StringOrNumber::String(s.to_string())
    }
}

impl From<String> for StringOrNumber {
    fn from(s: String) -> Self {
        StringOrNumber::String(s)
    }
}

impl From<Number> for StringOrNumber {
    fn from(n: Number) -> Self {
        StringOrNumber::Number(n)
    }
}

impl From<i64> for StringOrNumber {
    fn from(n: i64) -> Self {
        StringOrNumber::Number(Number::from(n))
    }
}

impl From<f64> for StringOrNumber {
    /// Integral values become integers; a non-finite value has no JSON
    /// number and is held as its string form.
    fn from(n: f64) -> Self {
        match number_value(n) {
            Value::Number(number) => StringOrNumber::Number(number),
            _ => StringOrNumber::String(n.to_string()),
        }
    }
}

impl FromWire for StringOrNumber {
    const FIELD_TYPE: FieldType = FieldType::Flex;

    fn from_wire(value: &Value) -> Coercion<Self> {
        match value {
            Value::String(s) => Ok(StringOrNumber::String(s.clone())),
            Value::Number(n) => Ok(StringOrNumber::Number(n.clone())),
            other => Err(json_type_name(other).to_string()),
        }
    }
}

impl ToWire for StringOrNumber {
    fn to_wire(&self) -> Value {
        match self {
            StringOrNumber::String(s) => Value::String(s.clone()),
            StringOrNumber::Number(n) => Value::Number(n.clone()),
        }
    }
}

// --- Duration ---

/// Wire form a duration was decoded from
#[derive(Debug, Clone)]
enum DurationRepr {
    /// Bare JSON number of seconds
    Seconds(Number),
    /// Unit expression or clock string
    Text(String),
    /// Built in code
    Native,
}

/// A duration that is a seconds count or a duration string on the wire
///
/// Equality compares the duration only, not the wire form.
#[derive(Debug, Clone)]
pub struct FlexDuration {
    duration: Duration,
    repr: DurationRepr,
}

impl FlexDuration {
    /// The duration value
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Parse a duration string
    ///
    /// Accepts unit expressions (`5s`, `1h30m`, `1.5s`, `250ms`), clock
    /// strings (`HH:MM`, `HH:MM:SS`, `HH:MM:SS.fff`) and bare seconds (`30`).
    pub fn parse(text: &str) -> Option<Self> {
        let duration = parse_expression(text)
            .or_else(|| parse_clock(text))
            .or_else(|| parse_seconds(text))?;
        Some(Self {
            duration,
            repr: DurationRepr::Text(text.to_string()),
        })
    }
}

impl Default for FlexDuration {
    fn default() -> Self {
        Self::from(Duration::ZERO)
    }
}

impl PartialEq for FlexDuration {
    fn eq(&self, other: &Self) -> bool {
        self.duration == other.duration
    }
}

impl From<Duration> for FlexDuration {
    fn from(duration: Duration) -> Self {
        Self {
            duration,
            repr: DurationRepr::Native,
        }
    }
}

impl fmt::Display for FlexDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.duration))
    }
}

impl FromWire for FlexDuration {
    const FIELD_TYPE: FieldType = FieldType::Duration;

    fn from_wire(value: &Value) -> Coercion<Self> {
        match value {
            Value::String(s) => {
                FlexDuration::parse(s).ok_or_else(|| format!("unparseable duration {s:?}"))
            }
            Value::Number(n) => {
                let duration = match n.as_u64() {
                    Some(secs) => Some(Duration::from_secs(secs)),
                    None => n
                        .as_f64()
                        .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
                };
                duration
                    .map(|duration| FlexDuration {
                        duration,
                        repr: DurationRepr::Seconds(n.clone()),
                    })
                    .ok_or_else(|| format!("negative or out of range number {n}"))
            }
            other => Err(json_type_name(other).to_string()),
        }
    }
}

impl ToWire for FlexDuration {
    fn to_wire(&self) -> Value {
        match &self.repr {
            DurationRepr::Seconds(n) => Value::Number(n.clone()),
            DurationRepr::Text(s) => Value::String(s.clone()),
            DurationRepr::Native => Value::String(format_duration(self.duration)),
        }
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Scale `int.frac` by `unit` nanoseconds without going through floats
fn scaled_nanos(int: &str, frac: &str, unit: u128) -> Option<u128> {
    let whole: u128 = if int.is_empty() { 0 } else { int.parse().ok()? };
    let mut nanos = whole.checked_mul(unit)?;
    if !frac.is_empty() {
        // Digits past nanosecond precision cannot contribute
        let frac = &frac[..frac.len().min(18)];
        let numerator: u128 = frac.parse().ok()?;
        let denominator = 10u128.checked_pow(frac.len() as u32)?;
        nanos = nanos.checked_add(numerator.checked_mul(unit)? / denominator)?;
    }
    Some(nanos)
}

fn nanos_to_duration(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

fn expression_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:ns|us|µs|μs|ms|h|m|s))+$")
            .unwrap_or_else(|e| panic!("invalid duration expression regex: {e}"))
    })
}

fn term_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([0-9]*)(?:\.([0-9]*))?(ns|us|µs|μs|ms|h|m|s)")
            .unwrap_or_else(|e| panic!("invalid duration term regex: {e}"))
    })
}

fn clock_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]+):([0-5]?[0-9])(?::([0-5]?[0-9])(?:\.([0-9]+))?)?$")
            .unwrap_or_else(|e| panic!("invalid clock regex: {e}"))
    })
}

/// `5s`, `1h30m`, `1.5s`; a lone `0` is also accepted
fn parse_expression(text: &str) -> Option<Duration> {
    if text == "0" {
        return Some(Duration::ZERO);
    }
    if !expression_regex().is_match(text) {
        return None;
    }
    let mut total: u128 = 0;
    for caps in term_regex().captures_iter(text) {
        let int = caps.get(1).map_or("", |m| m.as_str());
        let frac = caps.get(2).map_or("", |m| m.as_str());
        let unit = unit_nanos(caps.get(3)?.as_str())?;
        total = total.checked_add(scaled_nanos(int, frac, unit)?)?;
    }
    nanos_to_duration(total)
}

/// `HH:MM`, `HH:MM:SS`, `HH:MM:SS.fff`
fn parse_clock(text: &str) -> Option<Duration> {
    let caps = clock_regex().captures(text)?;
    let hours = scaled_nanos(caps.get(1)?.as_str(), "", 3_600 * NANOS_PER_SEC)?;
    let minutes = scaled_nanos(caps.get(2)?.as_str(), "", 60 * NANOS_PER_SEC)?;
    let seconds = match caps.get(3) {
        Some(secs) => scaled_nanos(
            secs.as_str(),
            caps.get(4).map_or("", |m| m.as_str()),
            NANOS_PER_SEC,
        )?,
        None => 0,
    };
    nanos_to_duration(hours.checked_add(minutes)?.checked_add(seconds)?)
}

/// `30`, `2.5`
fn parse_seconds(text: &str) -> Option<Duration> {
    let (int, frac) = text.split_once('.').unwrap_or((text, ""));
    if int.is_empty() || !int.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    nanos_to_duration(scaled_nanos(int, frac, NANOS_PER_SEC)?)
}

/// `int.frac` with trailing zeros (and a bare dot) removed
fn decimal(whole: u128, frac: u128, width: usize) -> String {
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Format as a unit expression, largest units first (`1h2m3.5s`, `250ms`)
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos / 1_000, nanos % 1_000, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos / 1_000_000, nanos % 1_000_000, 6));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&decimal(
        u128::from(seconds),
        u128::from(duration.subsec_nanos()),
        9,
    ));
    out.push('s');
    out
}

// --- Timestamp ---

/// An RFC 3339 timestamp that re-encodes to the exact text it was read from
///
/// Equality compares the instant only.
#[derive(Debug, Clone)]
pub struct Timestamp {
    value: DateTime<FixedOffset>,
    wire: Option<String>,
}

impl Timestamp {
    /// Parse an RFC 3339 string
    pub fn parse(text: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(text).ok().map(|value| Self {
            value,
            wire: Some(text.to_string()),
        })
    }

    /// The parsed instant with its original offset
    pub fn value(&self) -> DateTime<FixedOffset> {
        self.value
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        Self {
            value: value.fixed_offset(),
            wire: None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.wire {
            Some(text) => f.write_str(text),
            None => f.write_str(&self.value.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl FromWire for Timestamp {
    const FIELD_TYPE: FieldType = FieldType::Timestamp;

    fn from_wire(value: &Value) -> Coercion<Self> {
        match value {
            Value::String(s) => {
                Timestamp::parse(s).ok_or_else(|| format!("unparseable timestamp {s:?}"))
            }
            other => Err(json_type_name(other).to_string()),
        }
    }
}

impl ToWire for Timestamp {
    fn to_wire(&self) -> Value {
        Value::String(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn duration(value: Value) -> FlexDuration {
        FlexDuration::from_wire(&value).unwrap()
    }

    #[test]
    fn test_string_or_number_forms() {
        let s = StringOrNumber::from_wire(&json!("foo")).unwrap();
        assert_eq!(s, StringOrNumber::String("foo".to_string()));
        assert_eq!(s.as_str(), Some("foo"));
        assert_eq!(s.as_f64(), None);

        let n = StringOrNumber::from_wire(&json!(1)).unwrap();
        assert_eq!(n, StringOrNumber::from(1i64));
        assert_eq!(n.as_f64(), Some(1.0));
        assert_eq!(n.to_wire(), json!(1));

        let float = StringOrNumber::from_wire(&json!(1.0)).unwrap();
        assert_ne!(float, n);
        assert_eq!(float.to_wire(), json!(1.0));

        assert_eq!(StringOrNumber::from_wire(&json!(null)), Err("null".to_string()));
        assert_eq!(StringOrNumber::from_wire(&json!([1])), Err("array".to_string()));
    }

    #[test]
    fn test_string_or_number_display() {
        assert_eq!(StringOrNumber::default().to_string(), "");
        assert_eq!(StringOrNumber::default().to_wire(), json!(""));
        assert_eq!(StringOrNumber::from(99.0f64).to_string(), "99");
        assert_eq!(StringOrNumber::from(2.5f64).to_string(), "2.5");
        assert_eq!(StringOrNumber::from(f64::NAN), StringOrNumber::from("NaN"));
        assert_eq!(StringOrNumber::from("21.5").to_f64(), Some(21.5));
    }

    #[test]
    fn test_number_normalization() {
        assert_eq!(number_value(70.0), json!(70));
        assert_eq!(number_value(-5.0), json!(-5));
        assert_eq!(number_value(1.5), json!(1.5));
        assert_eq!(number_value(f64::NAN), Value::Null);
    }

    #[test]
    fn test_strict_types() {
        assert_eq!(String::from_wire(&json!(99999)), Err("number".to_string()));
        assert_eq!(f64::from_wire(&json!("1")), Err("string".to_string()));
        assert_eq!(bool::from_wire(&json!(true)), Ok(true));
        assert_eq!(bool::from_wire(&json!(0)), Err("number".to_string()));
        assert_eq!(Value::from_wire(&json!(null)), Ok(Value::Null));
        assert!(Map::<String, Value>::from_wire(&json!({"a": 1})).is_ok());
        assert_eq!(
            Map::<String, Value>::from_wire(&json!([])),
            Err("array".to_string())
        );
    }

    #[test]
    fn test_duration_expressions() {
        assert_eq!(duration(json!("5s")).duration(), Duration::from_secs(5));
        assert_eq!(duration(json!("1h30m")).duration(), Duration::from_secs(5_400));
        assert_eq!(duration(json!("1.5s")).duration(), Duration::from_millis(1_500));
        assert_eq!(duration(json!("250ms")).duration(), Duration::from_millis(250));
        assert_eq!(duration(json!("10µs")).duration(), Duration::from_micros(10));
        assert_eq!(duration(json!("0")).duration(), Duration::ZERO);
    }

    #[test]
    fn test_duration_clock_and_seconds() {
        assert_eq!(duration(json!("00:05:00")).duration(), Duration::from_secs(300));
        assert_eq!(duration(json!("01:30")).duration(), Duration::from_secs(5_400));
        assert_eq!(
            duration(json!("00:00:01.5")).duration(),
            Duration::from_millis(1_500)
        );
        assert_eq!(duration(json!("30")).duration(), Duration::from_secs(30));
        assert_eq!(duration(json!(5)).duration(), Duration::from_secs(5));
        assert_eq!(duration(json!(0.5)).duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_duration_rejects() {
        assert!(FlexDuration::from_wire(&json!("soon")).is_err());
        assert!(FlexDuration::from_wire(&json!("5x")).is_err());
        // Signed unit expressions have no unsigned duration form
        assert!(FlexDuration::from_wire(&json!("-5s")).is_err());
        assert!(FlexDuration::from_wire(&json!("+5s")).is_err());
        assert!(FlexDuration::from_wire(&json!(-1)).is_err());
        assert_eq!(FlexDuration::from_wire(&json!(true)), Err("boolean".to_string()));
        assert_eq!(FlexDuration::from_wire(&json!(null)), Err("null".to_string()));
    }

    #[test]
    fn test_duration_keeps_wire_form() {
        assert_eq!(duration(json!("90s")).to_wire(), json!("90s"));
        assert_eq!(duration(json!("00:01:30")).to_wire(), json!("00:01:30"));
        assert_eq!(duration(json!(90)).to_wire(), json!(90));
        assert_eq!(duration(json!(1.25)).to_wire(), json!(1.25));
        assert_eq!(duration(json!("90s")), duration(json!(90)));
    }

    #[test]
    fn test_native_duration_format() {
        assert_eq!(FlexDuration::default().to_wire(), json!("0s"));
        assert_eq!(format_duration(Duration::from_secs(3_723)), "1h2m3s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m0s");
        assert_eq!(format_duration(Duration::from_millis(1_500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_micros(1_500)), "1.5ms");
        assert_eq!(format_duration(Duration::from_nanos(42)), "42ns");

        // Formatted output parses back to the same duration
        for secs in [1, 59, 61, 3_600, 86_399] {
            let d = Duration::from_secs(secs);
            assert_eq!(FlexDuration::parse(&format_duration(d)).unwrap().duration(), d);
        }
    }

    #[test]
    fn test_timestamp() {
        let ts = Timestamp::from_wire(&json!("2024-03-01T12:30:00+01:00")).unwrap();
        assert_eq!(ts.value().timestamp(), 1_709_292_600);
        assert_eq!(ts.to_wire(), json!("2024-03-01T12:30:00+01:00"));

        let utc = Timestamp::from_wire(&json!("2024-03-01T11:30:00Z")).unwrap();
        assert_eq!(ts, utc);

        assert!(Timestamp::from_wire(&json!("yesterday")).is_err());
        assert_eq!(Timestamp::from_wire(&json!(12)), Err("number".to_string()));
    }

    #[test]
    fn test_native_timestamp() {
        let now = Utc::now();
        let ts = Timestamp::from(now);
        let Value::String(text) = ts.to_wire() else {
            panic!("timestamp should encode as a string");
        };
        assert!(text.ends_with('Z'));
        assert_eq!(Timestamp::parse(&text).unwrap(), ts);
    }
}
