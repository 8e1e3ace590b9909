use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::domain::entities::request::{QueryRequest, TypedParameter};
use crate::domain::entities::table::{CellValue, PagedResult, ResultEnvelope};
use crate::domain::error::ValidationError;
use crate::domain::filter::{self, BASE_PREDICATE};
use crate::domain::scroller;
use crate::usecase::ports::executor::{DatabaseError, EngineError, SqlExecutor};

/// Column the count statement must expose.
pub const DATA_SIZE_LABEL: &str = "dataSize";

/// The two statements derived from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub count_sql: String,
    pub data_sql: String,
}

impl QueryPlan {
    /// Wraps the base query in a count statement and a windowed data
    /// statement sharing one predicate.
    ///
    /// The caller's `count_query` replaces the generated count only while no
    /// filter contributes to the predicate; it is trusted to be equivalent.
    pub fn build(request: &QueryRequest) -> Result<Self, ValidationError> {
        if let Some(paging) = &request.paging {
            if paging.page_size <= 0 {
                return Err(ValidationError::NotPositive {
                    element: "pageSize",
                });
            }
        }

        let order_clause = request.order.clause();
        let predicate = filter::compile(&request.filters, request.combinator);
        let base = &request.base_query;

        let count_sql = match &request.count_query {
            Some(count_query) if predicate == BASE_PREDICATE => count_query.clone(),
            _ => format!("SELECT count(1) AS {DATA_SIZE_LABEL} FROM ({base}) AS T {predicate}"),
        };

        let data_sql = match &request.paging {
            None => format!("SELECT * FROM ({base}) AS T {predicate} {order_clause}"),
            Some(paging) => {
                let offset = paging.offset().ok_or(ValidationError::OutOfRange {
                    element: "currentPage",
                })?;
                format!(
                    "SELECT * FROM ({base}) AS T {predicate} {order_clause} LIMIT {offset},{}",
                    paging.page_size
                )
            }
        };

        Ok(Self {
            count_sql,
            data_sql,
        })
    }
}

fn data_size(count: &ResultEnvelope) -> Result<i64, ValidationError> {
    match count.first_value(DATA_SIZE_LABEL) {
        None | Some(CellValue::Null) => Err(ValidationError::Missing {
            element: DATA_SIZE_LABEL,
        }),
        Some(value) => value.as_i64().ok_or(ValidationError::InvalidType {
            element: DATA_SIZE_LABEL,
        }),
    }
}

pub struct PagedQueryService {
    executor: Arc<dyn SqlExecutor>,
}

impl PagedQueryService {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }

    /// Runs the count statement, then the data statement, with the same
    /// parameters. Either both succeed or the whole call fails.
    pub fn run_paged(&self, request: &QueryRequest) -> Result<PagedResult, EngineError> {
        let plan = QueryPlan::build(request)?;
        tracing::debug!(count_sql = %plan.count_sql, data_sql = %plan.data_sql, "running paged query");

        let count = self.executor.execute(&plan.count_sql, &request.parameters)?;
        let table = self.executor.execute(&plan.data_sql, &request.parameters)?;
        let total_rows = data_size(&count)?;

        let mut result = PagedResult {
            total_rows,
            table,
            current_page: None,
            page_size: None,
            page_scroller: None,
        };

        if let Some(paging) = &request.paging {
            result.current_page = Some(paging.current_page);
            result.page_size = Some(paging.page_size);
            result.page_scroller = Some(scroller::scroll(
                paging.max_scroll_window,
                total_rows,
                paging.page_size,
                paging.current_page,
            ));
        }

        tracing::trace!(
            total_rows,
            returned = result.table.rows.len(),
            "paged query finished"
        );
        Ok(result)
    }

    /// Validates a JSON request document and runs it.
    pub fn run_paged_json(
        &self,
        document: &JsonValue,
        base_query: Option<&str>,
    ) -> Result<PagedResult, EngineError> {
        let request = QueryRequest::from_json(document, base_query)?;
        self.run_paged(&request)
    }

    pub fn execute(
        &self,
        sql: &str,
        params: &[TypedParameter],
    ) -> Result<ResultEnvelope, DatabaseError> {
        self.executor.execute(sql, params)
    }

    pub fn execute_update(
        &self,
        sql: &str,
        params: &[TypedParameter],
    ) -> Result<usize, DatabaseError> {
        self.executor.execute_update(sql, params)
    }

    pub fn execute_count(&self, sql: &str) -> Result<i64, EngineError> {
        self.executor.execute_count(sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::entities::request::{
        Combinator, FilterDescriptor, OrderSpec, PageWindow, TypedLiteral,
    };

    use super::*;

    fn film_request() -> QueryRequest {
        QueryRequest::new("SELECT * FROM film", OrderSpec::new(1, "DESC"))
    }

    #[test]
    fn unpaged_plan_has_no_limit() {
        let plan = QueryPlan::build(&film_request()).expect("plan should build");

        assert_eq!(
            plan.count_sql,
            "SELECT count(1) AS dataSize FROM (SELECT * FROM film) AS T WHERE 1"
        );
        assert_eq!(
            plan.data_sql,
            "SELECT * FROM (SELECT * FROM film) AS T WHERE 1 ORDER BY 1 DESC"
        );
    }

    #[test]
    fn paged_plan_uses_zero_based_offset() {
        let request = film_request().with_paging(PageWindow::new(3, 20, 11));

        let plan = QueryPlan::build(&request).expect("plan should build");

        assert!(plan.data_sql.ends_with("ORDER BY 1 DESC LIMIT 40,20"));
    }

    #[test]
    fn explicit_count_used_only_without_predicate() {
        let request = film_request().with_count_query("SELECT COUNT(1) AS dataSize FROM film");
        let plan = QueryPlan::build(&request).expect("plan should build");
        assert_eq!(plan.count_sql, "SELECT COUNT(1) AS dataSize FROM film");

        let filtered = request
            .with_combinator(Combinator::Or)
            .with_filter(FilterDescriptor::new(
                "length",
                "IN",
                vec![TypedLiteral::int(180), TypedLiteral::int(185)],
            ));
        let plan = QueryPlan::build(&filtered).expect("plan should build");
        assert_eq!(
            plan.count_sql,
            "SELECT count(1) AS dataSize FROM (SELECT * FROM film) AS T WHERE 1 AND ( length IN(180,185) ) "
        );
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let request = film_request().with_paging(PageWindow::new(1, 0, 11));

        let err = QueryPlan::build(&request).unwrap_err();

        assert_eq!(
            err,
            ValidationError::NotPositive {
                element: "pageSize"
            }
        );
    }

    #[test]
    fn overflowing_offset_is_rejected() {
        for current_page in [i64::MAX, i64::MIN] {
            let request = film_request().with_paging(PageWindow::new(current_page, 2, 11));

            let err = QueryPlan::build(&request).unwrap_err();

            assert_eq!(
                err,
                ValidationError::OutOfRange {
                    element: "currentPage"
                },
                "page {current_page}"
            );
        }
    }

    #[test]
    fn page_before_first_keeps_negative_offset() {
        let request = film_request().with_paging(PageWindow::new(0, 10, 11));

        let plan = QueryPlan::build(&request).expect("plan should build");

        assert!(plan.data_sql.ends_with("LIMIT -10,10"));
    }
}
