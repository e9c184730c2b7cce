//! Loading of YAML headers into JSON metadata.
//!
//! Headers are read from the parser's event stream so scalar style is known:
//! only plain scalars are typed (YAML 1.1 rules, as a safe load resolves them),
//! while quoted and block scalars always stay strings.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
};
use regex::Regex;
use serde_json::{Map, Number, Value};
use yaml_rust2::parser::{Event, EventReceiver, Parser, Tag};
use yaml_rust2::scanner::TScalarStyle;

use super::HeaderError;

static YAML_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>[0-9]{4})-(?P<month>[0-9]{1,2})-(?P<day>[0-9]{1,2})(?:(?:[Tt]|[ \t]+)(?P<hour>[0-9]{1,2}):(?P<minute>[0-9]{2}):(?P<second>[0-9]{2})(?:\.(?P<fraction>[0-9]*))?(?:[ \t]*(?P<tz>Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?)?$",
    )
    .expect("timestamp pattern is valid")
});

static YAML_INT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[-+]?(?:0b[01_]+|0x[0-9a-fA-F_]+|0[0-7_]+|[1-9][0-9_]*(?::[0-5]?[0-9])+|[1-9][0-9_]*|0)$",
    )
    .expect("int pattern is valid")
});

// The exponent form needs a dot and a signed exponent, so `1e10` is a string.
static YAML_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+][0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*)$",
    )
    .expect("float pattern is valid")
});

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

#[derive(Default)]
struct EventLog(Vec<Event>);

impl EventReceiver for EventLog {
    fn on_event(&mut self, event: Event) {
        self.0.push(event);
    }
}

/// Load the first YAML document of `text` as a metadata mapping.
///
/// Returns `Ok(None)` when the document is empty or not a mapping. Custom
/// tags, null keys and keys that are not scalars are rejected.
pub(crate) fn load_mapping(text: &str) -> Result<Option<Map<String, Value>>, HeaderError> {
    let mut log = EventLog::default();
    Parser::new_from_str(text).load(&mut log, false)?;

    let mut composer = Composer {
        events: log.0.into_iter(),
        anchors: HashMap::new(),
    };
    let Some(root) = composer.root()? else {
        return Ok(None);
    };
    match composer.node(root, 0)? {
        Value::Object(fields) => Ok(Some(fields)),
        _ => Ok(None),
    }
}

struct Composer {
    events: std::vec::IntoIter<Event>,
    anchors: HashMap<usize, Value>,
}

impl Composer {
    fn next_event(&mut self) -> Result<Event, HeaderError> {
        self.events
            .next()
            .ok_or_else(|| structure("yaml event stream ended early"))
    }

    fn root(&mut self) -> Result<Option<Event>, HeaderError> {
        loop {
            match self.next_event()? {
                Event::StreamEnd => return Ok(None),
                event @ (Event::Scalar(..)
                | Event::Alias(..)
                | Event::SequenceStart(..)
                | Event::MappingStart(..)) => return Ok(Some(event)),
                _ => {}
            }
        }
    }

    /// Build the value starting at `event`. Depth 1 holds the values of the
    /// root mapping, the only place timestamps are normalized.
    fn node(&mut self, event: Event, depth: usize) -> Result<Value, HeaderError> {
        let (anchor, value) = match event {
            Event::Alias(id) => {
                return self
                    .anchors
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| structure("alias refers to an unknown anchor"));
            }
            Event::Scalar(text, style, anchor, tag) => {
                (anchor, scalar(text, style, tag.as_ref(), depth == 1)?)
            }
            Event::SequenceStart(anchor, tag) => {
                collection_tag(tag.as_ref(), "seq")?;
                (anchor, self.sequence(depth + 1)?)
            }
            Event::MappingStart(anchor, tag) => {
                collection_tag(tag.as_ref(), "map")?;
                (anchor, Value::Object(self.mapping(depth + 1)?))
            }
            other => return Err(structure(format!("unexpected yaml event {other:?}"))),
        };
        if anchor > 0 {
            self.anchors.insert(anchor, value.clone());
        }
        Ok(value)
    }

    fn sequence(&mut self, depth: usize) -> Result<Value, HeaderError> {
        let mut items = Vec::new();
        loop {
            match self.next_event()? {
                Event::SequenceEnd => return Ok(Value::Array(items)),
                event => items.push(self.node(event, depth)?),
            }
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Map<String, Value>, HeaderError> {
        let mut fields = Map::new();
        loop {
            let key = match self.next_event()? {
                Event::MappingEnd => return Ok(fields),
                event => scalar_key(self.node(event, 0)?)?,
            };
            let event = self.next_event()?;
            let value = self.node(event, depth)?;
            fields.insert(key, value);
        }
    }
}

fn structure(message: impl Into<String>) -> HeaderError {
    HeaderError::Structure(message.into())
}

fn scalar_key(key: Value) -> Result<String, HeaderError> {
    match key {
        Value::String(text) => Ok(text),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Err(structure("mapping key is null")),
        _ => Err(structure("mapping key is not a scalar")),
    }
}

fn scalar(
    text: String,
    style: TScalarStyle,
    tag: Option<&Tag>,
    top_level: bool,
) -> Result<Value, HeaderError> {
    if let Some(tag) = tag {
        return tagged_scalar(text, tag);
    }
    if !matches!(style, TScalarStyle::Plain) {
        return Ok(Value::String(text));
    }
    if top_level {
        if let Some(stamp) = normalize_timestamp(&text) {
            return Ok(Value::String(stamp));
        }
    }
    Ok(resolve_plain(text))
}

fn core_suffix(tag: &Tag) -> Option<&str> {
    (tag.handle == "!!" || tag.handle == CORE_TAG_PREFIX).then_some(tag.suffix.as_str())
}

fn tag_error(tag: &Tag) -> HeaderError {
    structure(format!(
        "tagged value `{}{}` is not allowed",
        tag.handle, tag.suffix
    ))
}

fn collection_tag(tag: Option<&Tag>, expected: &str) -> Result<(), HeaderError> {
    match tag {
        None => Ok(()),
        Some(tag) if core_suffix(tag) == Some(expected) => Ok(()),
        Some(tag) => Err(tag_error(tag)),
    }
}

fn tagged_scalar(text: String, tag: &Tag) -> Result<Value, HeaderError> {
    let value = match core_suffix(tag) {
        Some("str") => Some(Value::String(text)),
        Some("null") => is_null(&text).then_some(Value::Null),
        Some("bool") => bool_value(&text).map(Value::Bool),
        Some("int") => int_value(&text),
        Some("float") => text
            .replace('_', "")
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => return Err(tag_error(tag)),
    };
    value.ok_or_else(|| tag_error(tag))
}

fn resolve_plain(text: String) -> Value {
    if is_null(&text) {
        return Value::Null;
    }
    if let Some(flag) = bool_value(&text) {
        return Value::Bool(flag);
    }
    int_value(&text)
        .or_else(|| float_value(&text))
        .unwrap_or(Value::String(text))
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

fn bool_value(text: &str) -> Option<bool> {
    match text {
        "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON" => Some(true),
        "no" | "No" | "NO" | "false" | "False" | "FALSE" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    }
}

fn int_value(text: &str) -> Option<Value> {
    if !YAML_INT.is_match(text) {
        return None;
    }
    let cleaned = text.replace('_', "");
    let (negative, digits) = split_sign(&cleaned);

    let magnitude = if let Some(binary) = digits.strip_prefix("0b") {
        i128::from_str_radix(binary, 2).ok()?
    } else if let Some(hex) = digits.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()?
    } else if digits.contains(':') {
        digits
            .split(':')
            .try_fold(0i128, |acc, part| Some(acc * 60 + part.parse::<i128>().ok()?))?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i128::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i128>().ok()?
    };

    let value = if negative { -magnitude } else { magnitude };
    if let Ok(int) = i64::try_from(value) {
        Some(Value::from(int))
    } else if let Ok(uint) = u64::try_from(value) {
        Some(Value::from(uint))
    } else {
        Number::from_f64(value as f64).map(Value::Number)
    }
}

fn float_value(text: &str) -> Option<Value> {
    if !YAML_FLOAT.is_match(text) {
        return None;
    }
    let cleaned = text.replace('_', "");
    let (negative, digits) = split_sign(&cleaned);
    let magnitude = digits
        .split(':')
        .try_fold(0f64, |acc, part| Some(acc * 60.0 + part.parse::<f64>().ok()?))?;
    let value = if negative { -magnitude } else { magnitude };
    Number::from_f64(value).map(Value::Number)
}

/// Render a YAML timestamp scalar as ISO-8601.
///
/// Dates stay date-only; datetimes are expressed in the local offset, with
/// naive values interpreted as local time.
pub(crate) fn normalize_timestamp(text: &str) -> Option<String> {
    let caps = YAML_TIMESTAMP.captures(text)?;
    let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.name("year")?.as_str().parse::<i32>().ok()?;
    let month = number("month")?;
    let day = number("day")?;

    let Some(hour) = number("hour") else {
        // Date-only scalars need two-digit month and day.
        if caps.name("month")?.as_str().len() != 2 || caps.name("day")?.as_str().len() != 2 {
            return None;
        }
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return Some(date.format("%Y-%m-%d").to_string());
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let micros = caps
        .name("fraction")
        .map(|m| fraction_to_micros(m.as_str()))
        .unwrap_or(0);
    let time = NaiveTime::from_hms_micro_opt(hour, number("minute")?, number("second")?, micros)?;
    let naive = NaiveDateTime::new(date, time);

    let local: DateTime<Local> = match caps.name("tz") {
        Some(tz) => {
            let offset = parse_offset(tz.as_str())?;
            offset
                .from_local_datetime(&naive)
                .single()?
                .with_timezone(&Local)
        }
        None => Local.from_local_datetime(&naive).earliest()?,
    };

    let format = if micros == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    Some(local.to_rfc3339_opts(format, false))
}

fn fraction_to_micros(fraction: &str) -> u32 {
    let digits: String = fraction.chars().take(6).collect();
    if digits.is_empty() {
        return 0;
    }
    let scale = 10u32.pow(6 - digits.len() as u32);
    digits.parse::<u32>().map(|value| value * scale).unwrap_or(0)
}

fn parse_offset(tz: &str) -> Option<FixedOffset> {
    if tz == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = tz.split_at(1);
    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours.parse::<i32>().ok()?, minutes.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    let seconds = hours * 3600 + minutes * 60;
    if sign == "-" {
        FixedOffset::west_opt(seconds)
    } else {
        FixedOffset::east_opt(seconds)
    }
}
