use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::domain::entities::request::{ParameterKind, TypedParameter};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn integer(value: &JsonValue) -> Result<i64> {
    match value {
        JsonValue::Number(number) => number
            .as_i64()
            .ok_or_else(|| anyhow!("expected an integer, got {number}")),
        JsonValue::String(text) => text
            .trim()
            .parse::<i64>()
            .with_context(|| format!("invalid integer text '{text}'")),
        other => bail!("expected an integer, got {other}"),
    }
}

fn text<'a>(value: &'a JsonValue, kind: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| anyhow!("{kind} parameter must be text, got {value}"))
}

/// Maps one declared parameter to the value SQLite binds.
///
/// Dates are bound as normalized text, the representation SQLite's date
/// functions and text comparisons expect.
pub fn bind_value(param: &TypedParameter) -> Result<Value> {
    let value = &param.value;
    let bound = match &param.kind {
        ParameterKind::Int => {
            let number = integer(value)?;
            i32::try_from(number).with_context(|| format!("{number} does not fit an int"))?;
            Value::Integer(number)
        }
        ParameterKind::Long => Value::Integer(integer(value)?),
        ParameterKind::Decimal => match value {
            JsonValue::Null => Value::Null,
            JsonValue::Number(number) => Value::Real(
                number
                    .as_f64()
                    .ok_or_else(|| anyhow!("invalid decimal {number}"))?,
            ),
            JsonValue::String(text) => Value::Real(
                text.trim()
                    .parse::<f64>()
                    .with_context(|| format!("invalid decimal text '{text}'"))?,
            ),
            other => bail!("expected a decimal, got {other}"),
        },
        ParameterKind::Date => {
            let raw = text(value, "date")?;
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .with_context(|| format!("invalid date '{raw}', expected yyyy-MM-dd"))?;
            Value::Text(date.format(DATE_FORMAT).to_string())
        }
        ParameterKind::DateTime => {
            let raw = text(value, "datetime")?;
            let datetime = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).with_context(
                || format!("invalid datetime '{raw}', expected yyyy-MM-dd HH:mm:ss"),
            )?;
            Value::Text(datetime.format(DATETIME_FORMAT).to_string())
        }
        ParameterKind::String => match value {
            JsonValue::Null => Value::Null,
            JsonValue::String(text) => Value::Text(text.clone()),
            other => Value::Text(other.to_string()),
        },
        ParameterKind::Other(_) => opaque(value),
    };

    Ok(bound)
}

fn opaque(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(integer) => Value::Integer(integer),
            None => number.as_f64().map_or(Value::Null, Value::Real),
        },
        JsonValue::String(text) => Value::Text(text.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Binds every parameter in order; the first failure names its position.
pub fn bind_all(params: &[TypedParameter]) -> Result<Vec<Value>> {
    params
        .iter()
        .enumerate()
        .map(|(idx, param)| {
            bind_value(param).with_context(|| {
                format!("failed to bind parameter {} ({})", idx + 1, param.kind.name())
            })
        })
        .collect()
}
