//! Compiles filter descriptors into the `WHERE` fragment applied to the
//! wrapped base query.
//!
//! String literals are single-quoted verbatim and integer literals are emitted
//! unquoted. Embedded quotes are not escaped: the literal whitelist checks
//! shape only, it does not sanitize.

use crate::domain::entities::request::{Combinator, FilterDescriptor, LiteralKind, TypedLiteral};

/// Predicate produced when no filter contributes a clause.
pub const BASE_PREDICATE: &str = "WHERE 1";

/// Operator-specific rendering of a literal list.
struct Bracketing {
    open: &'static str,
    separator: &'static str,
    close: &'static str,
}

fn bracketing(operator: &str) -> Bracketing {
    match operator.to_ascii_uppercase().as_str() {
        "BETWEEN" => Bracketing {
            open: " ",
            separator: " AND ",
            close: "",
        },
        "IN" | "NOT IN" => Bracketing {
            open: "(",
            separator: ",",
            close: ")",
        },
        _ => Bracketing {
            open: " ",
            separator: "",
            close: "",
        },
    }
}

fn render_literal(literal: &TypedLiteral, out: &mut String) {
    match literal.kind {
        LiteralKind::String => {
            out.push('\'');
            out.push_str(&literal.value);
            out.push('\'');
        }
        LiteralKind::Int => out.push_str(&literal.value),
    }
}

fn render_clause(filter: &FilterDescriptor, out: &mut String) {
    let bracketing = bracketing(&filter.operator);

    out.push_str(&filter.field);
    out.push(' ');
    out.push_str(&filter.operator);
    out.push_str(bracketing.open);
    for (idx, literal) in filter.values.iter().enumerate() {
        if idx > 0 {
            out.push_str(bracketing.separator);
        }
        render_literal(literal, out);
    }
    out.push_str(bracketing.close);
}

/// Builds the predicate for `filters`.
///
/// The first included clause is always introduced by `AND`. With
/// [`Combinator::Or`] it also opens a single `( … )` group that holds every
/// included clause joined by `OR`. Descriptors that are not
/// [included](FilterDescriptor::is_included) are skipped.
pub fn compile(filters: &[FilterDescriptor], combinator: Combinator) -> String {
    let is_or = combinator == Combinator::Or;
    let mut predicate = String::from(BASE_PREDICATE);
    let mut included = 0_usize;

    for filter in filters {
        if !filter.is_included() {
            tracing::trace!(?filter, "skipping filter without field, operator or values");
            continue;
        }

        if included == 0 {
            predicate.push_str(" AND ");
            if is_or {
                predicate.push_str("( ");
            }
        } else if is_or {
            predicate.push_str(" OR ");
        } else {
            predicate.push_str(" AND ");
        }

        render_clause(filter, &mut predicate);
        included += 1;
    }

    if is_or && included > 0 {
        predicate.push_str(" ) ");
    }

    predicate
}
