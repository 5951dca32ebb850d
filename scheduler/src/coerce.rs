//! Conversion of extracted values into nGQL literals.
//!
//! [`coerce`] returns `None` when the value has no representation in the
//! requested type. Callers treat that as NULL: the property is omitted, or the
//! row is skipped when the value was an id.

use bigdecimal::ToPrimitive;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use db::dtos::PropertyType;

use crate::value::Value;

/// Offset-aware layouts, tried in order.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Layouts without an offset; these are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn coerce(value: &Value, target: Option<PropertyType>) -> Option<String> {
    if value.is_null() {
        return None;
    }

    let Some(target) = target else {
        return untyped(value);
    };

    match target {
        PropertyType::Other => untyped(value),
        PropertyType::String => Some(quote(&value.to_string())),
        PropertyType::Int
        | PropertyType::Int8
        | PropertyType::Int16
        | PropertyType::Int32
        | PropertyType::Int64
        | PropertyType::Timestamp => to_int(value).map(|int| int.to_string()),
        PropertyType::Float | PropertyType::Double => to_float(value).map(render_float),
        PropertyType::Bool => to_bool(value).map(|b| b.to_string()),
        PropertyType::Date => to_date(value).map(|date| format!("date(\"{date}\")")),
        PropertyType::Datetime => to_datetime(value).map(|datetime| {
            format!(
                "datetime(\"{}\")",
                datetime.format("%Y-%m-%dT%H:%M:%S%.6f+00:00")
            )
        }),
    }
}

/// Double-quoted string literal with `\` and `"` escaped.
pub fn quote(raw: &str) -> String {
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn untyped(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(int) => Some(int.to_string()),
        Value::Float(float) => float.is_finite().then(|| render_float(*float)),
        Value::Text(text) => Some(quote(text)),
        // Exact decimals keep every digit as text.
        other => Some(quote(&other.to_string())),
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(int) => Some(*int),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Float(float) => {
            let truncated = float.trunc();
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            (truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64)
                .then_some(truncated as i64)
        }
        Value::Decimal(decimal) => decimal.with_scale(0).to_i64(),
        Value::Text(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    let float = match value {
        Value::Float(float) => *float,
        Value::Int(int) => *int as f64,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Decimal(decimal) => decimal.to_f64()?,
        Value::Text(text) => text.trim().parse().ok()?,
        _ => return None,
    };

    float.is_finite().then_some(float)
}

fn render_float(float: f64) -> String {
    format!("{float:?}")
}

fn to_bool(value: &Value) -> Option<bool> {
    if let Value::Bool(b) = value {
        return Some(*b);
    }

    match value.to_string().to_lowercase().as_str() {
        "true" | "1" | "yes" | "t" => Some(true),
        "false" | "0" | "no" | "f" => Some(false),
        _ => None,
    }
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(date) => Some(*date),
        Value::DateTime(datetime) => Some(datetime.date()),
        Value::DateTimeTz(datetime) => Some(datetime.date_naive()),
        other => {
            let raw = other.to_string();
            let token = raw.split_whitespace().next()?;
            NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
        }
    }
}

fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::DateTime(datetime) => Some(datetime.and_utc()),
        Value::DateTimeTz(datetime) => Some(datetime.with_timezone(&Utc)),
        Value::Date(date) => Some(date.and_time(chrono::NaiveTime::MIN).and_utc()),
        other => parse_datetime(&other.to_string()),
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix(['Z', 'z']) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => raw.to_string(),
    };

    if let Some(datetime) = ZONED_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
    {
        return Some(datetime.with_timezone(&Utc));
    }

    if let Some(datetime) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
    {
        return Some(datetime.and_utc());
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
}
