use std::collections::BTreeMap;

use serde::Serialize;

/// Backend-agnostic classification of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SemanticType {
    Char,
    Varchar,
    Longvarchar,
    Varbinary,
    Longvarbinary,
    Timestamp,
    Date,
    Decimal,
    Double,
    Float,
    Integer,
    Unknown,
}

impl SemanticType {
    pub fn as_str(self) -> &'static str {
        match self {
            SemanticType::Char => "CHAR",
            SemanticType::Varchar => "VARCHAR",
            SemanticType::Longvarchar => "LONGVARCHAR",
            SemanticType::Varbinary => "VARBINARY",
            SemanticType::Longvarbinary => "LONGVARBINARY",
            SemanticType::Timestamp => "TIMESTAMP",
            SemanticType::Date => "DATE",
            SemanticType::Decimal => "DECIMAL",
            SemanticType::Double => "DOUBLE",
            SemanticType::Float => "FLOAT",
            SemanticType::Integer => "INTEGER",
            SemanticType::Unknown => "UNKNOWN",
        }
    }

    /// Character and binary columns report a `size`.
    pub fn carries_size(self) -> bool {
        matches!(
            self,
            SemanticType::Char
                | SemanticType::Varchar
                | SemanticType::Longvarchar
                | SemanticType::Varbinary
                | SemanticType::Longvarbinary
        )
    }

    /// Numeric columns with a fractional part report `precision` and `scale`.
    pub fn carries_precision(self) -> bool {
        matches!(
            self,
            SemanticType::Decimal | SemanticType::Double | SemanticType::Float
        )
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub position: usize,
    pub label: String,
    pub name: String,
    pub semantic_type: SemanticType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<i64>,
}

/// A shaped scalar placed in a result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Decimal(serde_json::Number),
}

impl CellValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Plain-text rendering used by tabular output; `Null` is empty.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(value) => value.clone(),
            CellValue::Integer(value) => value.to_string(),
            CellValue::Float(value) => value.to_string(),
            CellValue::Decimal(value) => value.to_string(),
        }
    }
}

pub type Row = BTreeMap<String, CellValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
}

impl ResultEnvelope {
    pub fn first_value(&self, label: &str) -> Option<&CellValue> {
        self.rows.first().and_then(|row| row.get(label))
    }
}

/// One entry of the pagination control. `page == None` is an ellipsis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageScrollEntry {
    pub label: String,
    pub page: Option<i64>,
}

impl PageScrollEntry {
    pub const ELLIPSIS_LABEL: &'static str = "...";

    pub fn page(page: i64) -> Self {
        Self {
            label: page.to_string(),
            page: Some(page),
        }
    }

    pub fn ellipsis() -> Self {
        Self {
            label: Self::ELLIPSIS_LABEL.to_string(),
            page: None,
        }
    }

    pub fn is_ellipsis(&self) -> bool {
        self.page.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult {
    pub total_rows: i64,
    pub table: ResultEnvelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_scroller: Option<Vec<PageScrollEntry>>,
}
