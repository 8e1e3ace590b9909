//! Column classification and row shaping for SQLite result sets.
//!
//! SQLite reports a declared type per column instead of a type code. The
//! declared text decides the [`SemanticType`]; expression columns without one
//! fall back to the storage class of their first non-null value. The same
//! semantic type then drives both the column descriptor and value shaping.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use serde_json::Number;

use crate::domain::entities::table::{CellValue, ColumnDescriptor, ResultEnvelope, Row, SemanticType};

pub const TEMPORAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_INPUTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Column name and declared type as reported by the prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredColumn {
    pub label: String,
    pub decl_type: Option<String>,
}

impl DeclaredColumn {
    pub fn new(label: impl Into<String>, decl_type: Option<&str>) -> Self {
        Self {
            label: label.into(),
            decl_type: decl_type
                .map(str::trim)
                .filter(|decl| !decl.is_empty())
                .map(str::to_string),
        }
    }
}

pub fn classify_declared(decl: &str) -> SemanticType {
    let upper = decl.to_ascii_uppercase();
    let base = upper.split('(').next().unwrap_or_default().trim();

    match base {
        _ if base.contains("INT") => SemanticType::Integer,
        "CLOB" | "NCLOB" | "LONGTEXT" | "MEDIUMTEXT" | "LONGVARCHAR" => SemanticType::Longvarchar,
        "CHAR" | "CHARACTER" | "NCHAR" | "NATIVE CHARACTER" => SemanticType::Char,
        _ if base.contains("CHAR") || base == "TEXT" => SemanticType::Varchar,
        "BLOB" | "LONGBLOB" | "LONGVARBINARY" => SemanticType::Longvarbinary,
        "BINARY" | "VARBINARY" => SemanticType::Varbinary,
        "DATETIME" | "TIMESTAMP" => SemanticType::Timestamp,
        "DATE" => SemanticType::Date,
        "DECIMAL" | "NUMERIC" => SemanticType::Decimal,
        "DOUBLE" | "DOUBLE PRECISION" => SemanticType::Double,
        "FLOAT" | "REAL" => SemanticType::Float,
        _ => SemanticType::Unknown,
    }
}

pub fn classify_value(value: &Value) -> SemanticType {
    match value {
        Value::Integer(_) => SemanticType::Integer,
        Value::Real(_) => SemanticType::Double,
        Value::Text(_) => SemanticType::Varchar,
        Value::Blob(_) => SemanticType::Longvarbinary,
        Value::Null => SemanticType::Unknown,
    }
}

/// Parenthesised arguments of a declared type, e.g. `DECIMAL(5,2)`.
fn type_arguments(decl: &str) -> (Option<i64>, Option<i64>) {
    let Some((_, rest)) = decl.split_once('(') else {
        return (None, None);
    };
    let inner = rest.split(')').next().unwrap_or_default();
    let mut args = inner.split(',').map(|arg| arg.trim().parse::<i64>().ok());

    (args.next().flatten(), args.next().flatten())
}

pub fn describe(position: usize, column: &DeclaredColumn, sample: Option<&Value>) -> ColumnDescriptor {
    let semantic_type = match &column.decl_type {
        Some(decl) => classify_declared(decl),
        None => sample.map_or(SemanticType::Unknown, classify_value),
    };
    if semantic_type == SemanticType::Unknown {
        tracing::warn!(
            column = %column.label,
            decl_type = ?column.decl_type,
            "UNKNOWN column type, values omitted"
        );
    }

    let (first, second) = column
        .decl_type
        .as_deref()
        .map_or((None, None), type_arguments);

    ColumnDescriptor {
        position,
        label: column.label.clone(),
        name: column.label.clone(),
        semantic_type,
        size: first.filter(|_| semantic_type.carries_size()),
        precision: first.filter(|_| semantic_type.carries_precision()),
        scale: second.filter(|_| semantic_type.carries_precision()),
    }
}

/// Escapes backslash, double quote, tab, CR and LF once each so the row can
/// be embedded in another serialized document.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(integer) => integer.to_string(),
        Value::Real(real) => real.to_string(),
        Value::Text(text) => text.clone(),
        Value::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn parse_temporal(text: &str) -> Option<NaiveDateTime> {
    DATETIME_INPUTS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Text stored values are parsed and re-formatted, integers are epoch
/// milliseconds. Anything unparsable is passed through as stored; NULL is
/// the empty string.
pub fn format_temporal(value: &Value) -> String {
    let parsed = match value {
        Value::Null => return String::new(),
        Value::Text(text) => parse_temporal(text),
        Value::Integer(millis) => DateTime::from_timestamp_millis(*millis).map(|dt| dt.naive_utc()),
        Value::Real(_) | Value::Blob(_) => None,
    };

    parsed.map_or_else(|| raw_text(value), |dt| dt.format(TEMPORAL_FORMAT).to_string())
}

fn decimal(value: Value) -> CellValue {
    match value {
        Value::Integer(integer) => CellValue::Decimal(Number::from(integer)),
        Value::Real(real) => Number::from_f64(real).map_or(CellValue::Null, CellValue::Decimal),
        Value::Text(text) => {
            let trimmed = text.trim();
            if let Ok(integer) = trimmed.parse::<i64>() {
                CellValue::Decimal(Number::from(integer))
            } else if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
                CellValue::Decimal(number)
            } else {
                CellValue::Text(text)
            }
        }
        Value::Null | Value::Blob(_) => CellValue::Null,
    }
}

fn floating(value: Value) -> CellValue {
    match value {
        Value::Real(real) => CellValue::Float(real),
        Value::Integer(integer) => CellValue::Float(integer as f64),
        Value::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_or(CellValue::Null, CellValue::Float),
        Value::Null | Value::Blob(_) => CellValue::Null,
    }
}

fn integer(value: Value) -> CellValue {
    match value {
        Value::Integer(integer) => CellValue::Integer(integer),
        Value::Real(real) => CellValue::Integer(real as i64),
        Value::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_or(CellValue::Null, CellValue::Integer),
        Value::Null | Value::Blob(_) => CellValue::Null,
    }
}

/// Shapes one stored value for its column. `None` means the column's values
/// are omitted from the row.
pub fn shape(semantic_type: SemanticType, value: Value) -> Option<CellValue> {
    let cell = match (semantic_type, value) {
        (SemanticType::Unknown, _) => return None,
        (_, Value::Null)
            if !matches!(semantic_type, SemanticType::Timestamp | SemanticType::Date) =>
        {
            CellValue::Null
        }
        (SemanticType::Char | SemanticType::Varchar, value) => {
            CellValue::Text(escape_text(&raw_text(&value)))
        }
        (SemanticType::Longvarchar, value) => CellValue::Text(raw_text(&value)),
        (SemanticType::Varbinary | SemanticType::Longvarbinary, Value::Blob(bytes)) => {
            CellValue::Text(STANDARD.encode(bytes))
        }
        (SemanticType::Varbinary | SemanticType::Longvarbinary, value) => {
            CellValue::Text(STANDARD.encode(raw_text(&value)))
        }
        (SemanticType::Timestamp | SemanticType::Date, value) => {
            CellValue::Text(format_temporal(&value))
        }
        (SemanticType::Decimal, value) => decimal(value),
        (SemanticType::Double | SemanticType::Float, value) => floating(value),
        (SemanticType::Integer, value) => integer(value),
    };

    Some(cell)
}

/// Builds the envelope for one executed statement.
pub fn shape_result(columns: &[DeclaredColumn], rows: Vec<Vec<Value>>) -> ResultEnvelope {
    let descriptors: Vec<ColumnDescriptor> = columns
        .iter()
        .enumerate()
        .map(|(position, column)| {
            let sample = rows
                .iter()
                .filter_map(|row| row.get(position))
                .find(|value| !matches!(value, Value::Null));
            describe(position, column, sample)
        })
        .collect();

    let rows = rows
        .into_iter()
        .map(|values| {
            let mut row = Row::new();
            for (descriptor, value) in descriptors.iter().zip(values) {
                if let Some(cell) = shape(descriptor.semantic_type, value) {
                    row.insert(descriptor.label.clone(), cell);
                }
            }
            row
        })
        .collect();

    ResultEnvelope {
        columns: descriptors,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types_map_to_semantic_types() {
        let cases = [
            ("INTEGER", SemanticType::Integer),
            ("smallint", SemanticType::Integer),
            ("TINYINT(1)", SemanticType::Integer),
            ("CHAR(5)", SemanticType::Char),
            ("VARCHAR(255)", SemanticType::Varchar),
            ("TEXT", SemanticType::Varchar),
            ("CLOB", SemanticType::Longvarchar),
            ("BLOB", SemanticType::Longvarbinary),
            ("VARBINARY(16)", SemanticType::Varbinary),
            ("TIMESTAMP", SemanticType::Timestamp),
            ("DATETIME", SemanticType::Timestamp),
            ("DATE", SemanticType::Date),
            ("DECIMAL(4,2)", SemanticType::Decimal),
            ("NUMERIC", SemanticType::Decimal),
            ("DOUBLE", SemanticType::Double),
            ("REAL", SemanticType::Float),
            ("BOOLEAN", SemanticType::Unknown),
        ];

        for (decl, expected) in cases {
            assert_eq!(classify_declared(decl), expected, "{decl}");
        }
    }

    #[test]
    fn size_and_precision_follow_the_type() {
        let title = describe(1, &DeclaredColumn::new("title", Some("VARCHAR(255)")), None);
        assert_eq!(title.size, Some(255));
        assert_eq!(title.precision, None);

        let rate = describe(2, &DeclaredColumn::new("rate", Some("DECIMAL(4,2)")), None);
        assert_eq!(rate.size, None);
        assert_eq!((rate.precision, rate.scale), (Some(4), Some(2)));

        let id = describe(0, &DeclaredColumn::new("id", Some("INTEGER")), None);
        assert_eq!((id.size, id.precision, id.scale), (None, None, None));
    }

    #[test]
    fn expression_columns_use_the_stored_value() {
        let column = DeclaredColumn::new("dataSize", None);

        let described = describe(0, &column, Some(&Value::Integer(1000)));

        assert_eq!(described.semantic_type, SemanticType::Integer);
        assert_eq!(describe(0, &column, None).semantic_type, SemanticType::Unknown);
    }

    #[test]
    fn escape_handles_control_characters_once() {
        assert_eq!(
            escape_text("a\\b \"q\"\tx\r\ny"),
            "a\\\\b \\\"q\\\"\\tx\\r\\ny"
        );
        assert_eq!(escape_text("plain"), "plain");
    }

    #[test]
    fn temporal_values_are_reformatted() {
        assert_eq!(
            format_temporal(&Value::Text("2006-02-15 05:03:42.000".to_string())),
            "2006-02-15 05:03:42"
        );
        assert_eq!(
            format_temporal(&Value::Text("2006-02-15".to_string())),
            "2006-02-15 00:00:00"
        );
        assert_eq!(
            format_temporal(&Value::Integer(1_139_979_822_000)),
            "2006-02-15 05:03:42"
        );
        assert_eq!(format_temporal(&Value::Text("soon".to_string())), "soon");
        assert_eq!(format_temporal(&Value::Null), "");
    }

    #[test]
    fn shape_dispatches_on_semantic_type() {
        assert_eq!(
            shape(SemanticType::Longvarbinary, Value::Blob(b"hi".to_vec())),
            Some(CellValue::Text("aGk=".to_string()))
        );
        assert_eq!(
            shape(SemanticType::Varbinary, Value::Null),
            Some(CellValue::Null)
        );
        assert_eq!(
            shape(SemanticType::Decimal, Value::Real(2.99)),
            Some(CellValue::Decimal(Number::from_f64(2.99).unwrap()))
        );
        assert_eq!(
            shape(SemanticType::Integer, Value::Integer(7)),
            Some(CellValue::Integer(7))
        );
        assert_eq!(
            shape(SemanticType::Float, Value::Integer(2)),
            Some(CellValue::Float(2.0))
        );
        assert_eq!(
            shape(SemanticType::Longvarchar, Value::Text("a\tb".to_string())),
            Some(CellValue::Text("a\tb".to_string()))
        );
        assert_eq!(
            shape(SemanticType::Timestamp, Value::Null),
            Some(CellValue::Text(String::new()))
        );
        assert_eq!(shape(SemanticType::Unknown, Value::Integer(1)), None);
    }

    #[test]
    fn unknown_columns_are_left_out_of_rows() {
        let columns = [
            DeclaredColumn::new("id", Some("INTEGER")),
            DeclaredColumn::new("flag", Some("BOOLEAN")),
        ];

        let envelope = shape_result(
            &columns,
            vec![vec![Value::Integer(1), Value::Integer(0)]],
        );

        assert_eq!(envelope.columns[1].semantic_type, SemanticType::Unknown);
        assert_eq!(envelope.rows[0].len(), 1);
        assert_eq!(envelope.rows[0].get("id"), Some(&CellValue::Integer(1)));
    }
}
