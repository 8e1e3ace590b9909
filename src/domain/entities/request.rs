use serde_json::Value as JsonValue;

use crate::domain::error::ValidationError;

/// How the clauses produced by the filter list are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    /// Only the exact token `OR` selects disjunction; anything else is AND.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("OR") => Combinator::Or,
            _ => Combinator::And,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Int,
}

impl LiteralKind {
    pub fn parse(type_name: &str) -> Result<Self, ValidationError> {
        if type_name.eq_ignore_ascii_case("string") {
            Ok(LiteralKind::String)
        } else if type_name.eq_ignore_ascii_case("int") {
            Ok(LiteralKind::Int)
        } else {
            Err(ValidationError::UnsupportedFilterValueType {
                value_type: type_name.to_string(),
            })
        }
    }
}

/// A filter value carried as text and rendered according to its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedLiteral {
    pub kind: LiteralKind,
    pub value: String,
}

impl TypedLiteral {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: LiteralKind::String,
            value: value.into(),
        }
    }

    pub fn int(value: impl ToString) -> Self {
        Self {
            kind: LiteralKind::Int,
            value: value.to_string(),
        }
    }

    /// Checks run in a fixed order: `type` shape, `value` shape, then the
    /// `type` whitelist.
    pub fn from_json(literal: &JsonValue) -> Result<Self, ValidationError> {
        let type_name = literal
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or(ValidationError::InvalidFilterValueType)?;
        let value = literal
            .get("value")
            .and_then(JsonValue::as_str)
            .ok_or(ValidationError::InvalidFilterValue)?;
        let kind = LiteralKind::parse(type_name)?;

        Ok(Self {
            kind,
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDescriptor {
    pub field: String,
    pub operator: String,
    pub values: Vec<TypedLiteral>,
}

impl FilterDescriptor {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        values: Vec<TypedLiteral>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            values,
        }
    }

    /// Whether the descriptor contributes a clause at all.
    pub fn is_included(&self) -> bool {
        !self.field.is_empty() && !self.operator.is_empty() && !self.values.is_empty()
    }

    /// Returns `Ok(None)` for descriptors that are dropped without error:
    /// non-string `field`/`operator`, or an absent or empty `values` list.
    pub fn from_json(filter: &JsonValue) -> Result<Option<Self>, ValidationError> {
        let field = filter.get("field").and_then(JsonValue::as_str);
        let operator = filter.get("operator").and_then(JsonValue::as_str);
        let values = filter.get("values").and_then(JsonValue::as_array);

        let (Some(field), Some(operator), Some(values)) = (field, operator, values) else {
            tracing::trace!(%filter, "skipping filter without field, operator or values");
            return Ok(None);
        };
        if values.is_empty() {
            tracing::trace!(field, "skipping filter with empty values");
            return Ok(None);
        }

        let values = values
            .iter()
            .map(TypedLiteral::from_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Self::new(field, operator, values)))
    }
}

/// `ORDER BY <field_index> <direction>`; the direction token is passed through
/// as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub field_index: i64,
    pub direction: String,
}

impl OrderSpec {
    pub fn new(field_index: i64, direction: impl Into<String>) -> Self {
        Self {
            field_index,
            direction: direction.into(),
        }
    }

    pub fn clause(&self) -> String {
        format!("ORDER BY {} {}", self.field_index, self.direction)
    }
}

/// 1-based page position plus the display budget for the page scroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: i64,
    pub page_size: i64,
    pub max_scroll_window: i64,
}

impl PageWindow {
    pub fn new(current_page: i64, page_size: i64, max_scroll_window: i64) -> Self {
        Self {
            current_page,
            page_size,
            max_scroll_window,
        }
    }

    /// Zero-based row offset of the first row on the current page, or `None`
    /// when it does not fit in an `i64`.
    pub fn offset(&self) -> Option<i64> {
        self.current_page
            .checked_sub(1)?
            .checked_mul(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    Int,
    Long,
    Decimal,
    Date,
    DateTime,
    String,
    /// Any unrecognised declared type; the value is bound as-is.
    Other(String),
}

impl ParameterKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "int" => ParameterKind::Int,
            "long" => ParameterKind::Long,
            "decimal" => ParameterKind::Decimal,
            "date" => ParameterKind::Date,
            "datetime" => ParameterKind::DateTime,
            "string" => ParameterKind::String,
            other => ParameterKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterKind::Int => "int",
            ParameterKind::Long => "long",
            ParameterKind::Decimal => "decimal",
            ParameterKind::Date => "date",
            ParameterKind::DateTime => "datetime",
            ParameterKind::String => "string",
            ParameterKind::Other(name) => name,
        }
    }
}

/// Positional bind parameter. The value stays untyped until it is bound.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedParameter {
    pub kind: ParameterKind,
    pub value: JsonValue,
}

impl TypedParameter {
    pub fn new(kind: ParameterKind, value: impl Into<JsonValue>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn int(value: i64) -> Self {
        Self::new(ParameterKind::Int, value)
    }

    pub fn long(value: i64) -> Self {
        Self::new(ParameterKind::Long, value)
    }

    pub fn decimal(value: f64) -> Self {
        Self::new(ParameterKind::Decimal, value)
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self::new(ParameterKind::Date, value.into())
    }

    pub fn datetime(value: impl Into<String>) -> Self {
        Self::new(ParameterKind::DateTime, value.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ParameterKind::String, value.into())
    }

    pub fn from_json(parameter: &JsonValue) -> Result<Self, ValidationError> {
        let kind = match parameter.get("type") {
            None | Some(JsonValue::Null) => {
                return Err(ValidationError::Missing {
                    element: "parameters.type",
                })
            }
            Some(JsonValue::String(name)) => ParameterKind::from_name(name),
            Some(_) => {
                return Err(ValidationError::InvalidType {
                    element: "parameters.type",
                })
            }
        };
        let value = parameter.get("value").cloned().unwrap_or(JsonValue::Null);

        Ok(Self { kind, value })
    }

    /// Parses a JSON array of `{type, value}` objects.
    pub fn list_from_json(parameters: &JsonValue) -> Result<Vec<Self>, ValidationError> {
        let items = parameters.as_array().ok_or(ValidationError::InvalidType {
            element: "parameters",
        })?;
        items.iter().map(Self::from_json).collect()
    }
}

/// A fully validated paged-query request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub base_query: String,
    pub filters: Vec<FilterDescriptor>,
    pub combinator: Combinator,
    pub order: OrderSpec,
    /// `Some` iff the request is paged.
    pub paging: Option<PageWindow>,
    pub count_query: Option<String>,
    pub parameters: Vec<TypedParameter>,
}

impl QueryRequest {
    pub fn new(base_query: impl Into<String>, order: OrderSpec) -> Self {
        Self {
            base_query: base_query.into(),
            filters: Vec::new(),
            combinator: Combinator::And,
            order,
            paging: None,
            count_query: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_paging(mut self, paging: PageWindow) -> Self {
        self.paging = Some(paging);
        self
    }

    pub fn with_filter(mut self, filter: FilterDescriptor) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn with_count_query(mut self, count_query: impl Into<String>) -> Self {
        self.count_query = Some(count_query.into());
        self
    }

    pub fn with_parameter(mut self, parameter: TypedParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn is_paged(&self) -> bool {
        self.paging.is_some()
    }

    /// Validates a JSON request document.
    ///
    /// `base_query` takes precedence over the document's `baseQuery` key. The
    /// legacy key names (`fieldOrder`, `typeOrder`, `typeFilter`,
    /// `maxPageScrollElements`, `queryCount`) are accepted as aliases.
    pub fn from_json(
        document: &JsonValue,
        base_query: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let base_query = match base_query {
            Some(query) => query.to_string(),
            None => required_str(document, "baseQuery", None)?,
        };

        let field_index = required_int(document, "orderFieldIndex", Some("fieldOrder"))?;
        let direction = required_str(document, "orderDirection", Some("typeOrder"))?;

        let filters = match lookup(document, "filters", None) {
            None => Vec::new(),
            Some(JsonValue::Array(items)) => {
                let mut filters = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(filter) = FilterDescriptor::from_json(item)? {
                        filters.push(filter);
                    }
                }
                filters
            }
            Some(_) => return Err(ValidationError::InvalidType { element: "filters" }),
        };

        let combinator = Combinator::from_token(
            lookup(document, "combinator", Some("typeFilter")).and_then(JsonValue::as_str),
        );

        let paged = match lookup(document, "paged", None) {
            None => true,
            Some(JsonValue::Bool(flag)) => *flag,
            Some(_) => return Err(ValidationError::InvalidType { element: "paged" }),
        };

        let paging = if paged {
            let current_page = required_int(document, "currentPage", None)?;
            let page_size = required_int(document, "pageSize", None)?;
            let max_scroll_window =
                required_int(document, "maxScrollWindow", Some("maxPageScrollElements"))?;
            Some(PageWindow::new(current_page, page_size, max_scroll_window))
        } else {
            None
        };

        let count_query = lookup(document, "explicitCountQuery", Some("queryCount"))
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        let parameters = match lookup(document, "parameters", None) {
            None => Vec::new(),
            Some(parameters) => TypedParameter::list_from_json(parameters)?,
        };

        Ok(Self {
            base_query,
            filters,
            combinator,
            order: OrderSpec::new(field_index, direction),
            paging,
            count_query,
            parameters,
        })
    }
}

/// JSON `null` counts as absent.
fn lookup<'a>(
    document: &'a JsonValue,
    key: &str,
    alias: Option<&str>,
) -> Option<&'a JsonValue> {
    let found = document
        .get(key)
        .or_else(|| alias.and_then(|alias| document.get(alias)));
    found.filter(|value| !value.is_null())
}

fn required_int(
    document: &JsonValue,
    element: &'static str,
    alias: Option<&str>,
) -> Result<i64, ValidationError> {
    lookup(document, element, alias)
        .ok_or(ValidationError::Missing { element })?
        .as_i64()
        .ok_or(ValidationError::InvalidType { element })
}

fn required_str(
    document: &JsonValue,
    element: &'static str,
    alias: Option<&str>,
) -> Result<String, ValidationError> {
    lookup(document, element, alias)
        .ok_or(ValidationError::Missing { element })?
        .as_str()
        .map(str::to_string)
        .ok_or(ValidationError::InvalidType { element })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn paged_document() -> JsonValue {
        json!({
            "paged": true,
            "orderFieldIndex": 1,
            "orderDirection": "DESC",
            "combinator": "AND",
            "currentPage": 1,
            "pageSize": 5,
            "maxScrollWindow": 11
        })
    }

    #[test]
    fn parses_paged_request_with_current_names() {
        let request = QueryRequest::from_json(&paged_document(), Some("SELECT 1"))
            .expect("request should parse");

        assert_eq!(request.base_query, "SELECT 1");
        assert_eq!(request.order, OrderSpec::new(1, "DESC"));
        assert_eq!(request.paging, Some(PageWindow::new(1, 5, 11)));
        assert!(request.filters.is_empty());
        assert!(request.parameters.is_empty());
    }

    #[test]
    fn accepts_legacy_aliases() {
        let document = json!({
            "baseQuery": "SELECT * FROM film",
            "paged": true,
            "fieldOrder": 2,
            "typeOrder": "ASC",
            "typeFilter": "OR",
            "currentPage": 3,
            "pageSize": 10,
            "maxPageScrollElements": 7,
            "queryCount": "SELECT COUNT(1) AS dataSize FROM film"
        });

        let request = QueryRequest::from_json(&document, None).expect("request should parse");

        assert_eq!(request.base_query, "SELECT * FROM film");
        assert_eq!(request.combinator, Combinator::Or);
        assert_eq!(request.paging, Some(PageWindow::new(3, 10, 7)));
        assert_eq!(
            request.count_query.as_deref(),
            Some("SELECT COUNT(1) AS dataSize FROM film")
        );
    }

    #[test]
    fn missing_current_page_is_reported_by_name() {
        let mut document = paged_document();
        document
            .as_object_mut()
            .expect("document is an object")
            .remove("currentPage");

        let err = QueryRequest::from_json(&document, Some("SELECT 1")).unwrap_err();

        assert_eq!(err.to_string(), "Element currentPage cannot be null");
    }

    #[test]
    fn order_field_index_checked_before_paging() {
        let document = json!({ "paged": true, "orderFieldIndex": "!", "orderDirection": "DESC" });

        let err = QueryRequest::from_json(&document, Some("SELECT 1")).unwrap_err();

        assert_eq!(err.to_string(), "Invalid data type for element orderFieldIndex");
    }

    #[test]
    fn unpaged_request_does_not_require_window_fields() {
        let document = json!({ "paged": false, "orderFieldIndex": 1, "orderDirection": "ASC" });

        let request =
            QueryRequest::from_json(&document, Some("SELECT 1")).expect("request should parse");

        assert!(!request.is_paged());
    }

    #[test]
    fn non_integer_page_size_is_invalid_type() {
        let mut document = paged_document();
        document["pageSize"] = json!(5.5);

        let err = QueryRequest::from_json(&document, Some("SELECT 1")).unwrap_err();

        assert_eq!(err, ValidationError::InvalidType { element: "pageSize" });
    }

    #[test]
    fn skips_filters_without_field_or_values() {
        let mut document = paged_document();
        document["filters"] = json!([
            { "field": 7, "operator": "=", "values": [{ "type": "int", "value": "1" }] },
            { "field": "length", "operator": "=", "values": [] },
            { "field": "length", "operator": "=", "values": [{ "type": "INT", "value": "90" }] }
        ]);

        let request =
            QueryRequest::from_json(&document, Some("SELECT 1")).expect("request should parse");

        assert_eq!(
            request.filters,
            vec![FilterDescriptor::new("length", "=", vec![TypedLiteral::int(90)])]
        );
    }

    #[test]
    fn literal_checks_report_distinct_errors() {
        let bad_type = json!({ "type": false, "value": 180.0 });
        let bad_value = json!({ "type": "string", "value": 180.0 });
        let unsupported = json!({ "type": "strings", "value": "x" });

        assert_eq!(
            TypedLiteral::from_json(&bad_type).unwrap_err().to_string(),
            "Invalid value type in filter"
        );
        assert_eq!(
            TypedLiteral::from_json(&bad_value).unwrap_err().to_string(),
            "Invalid value in filter"
        );
        assert_eq!(
            TypedLiteral::from_json(&unsupported).unwrap_err(),
            ValidationError::UnsupportedFilterValueType {
                value_type: "strings".to_string()
            }
        );
    }

    #[test]
    fn parameters_keep_declared_kind() {
        let mut document = paged_document();
        document["parameters"] = json!([
            { "type": "long", "value": 0 },
            { "type": "datetime", "value": "2006-02-14 04:45:00" },
            { "type": "blob", "value": "opaque" }
        ]);

        let request =
            QueryRequest::from_json(&document, Some("SELECT 1")).expect("request should parse");

        let kinds: Vec<_> = request.parameters.iter().map(|p| p.kind.name()).collect();
        assert_eq!(kinds, vec!["long", "datetime", "blob"]);
    }
}
