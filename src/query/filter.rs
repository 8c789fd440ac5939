//! WHERE clause fragment for a [`MetricsViewFilter`].
//!
//! Include conditions produce ` AND (<c1> OR <c2> ...)`. Exclude conditions
//! produce ` AND (<c1> AND <c2> ...)` with every comparison negated. Inside
//! a condition the IN list, the IS NULL check, and each ILIKE pattern are
//! joined the same way, and bracketed when there is more than one.

use super::builder::{Arg, SqlBuilder};
use super::{CompileError, CompileResult, Condition, FilterValue, MetricsViewFilter};

/// Build the filter fragment. Returns an empty builder when no condition
/// contributes a clause.
pub fn build_filter_clause(filter: &MetricsViewFilter) -> CompileResult<SqlBuilder> {
    let mut clause = SqlBuilder::new();
    clause.append(conditions_clause(&filter.include, false)?);
    clause.append(conditions_clause(&filter.exclude, true)?);
    Ok(clause)
}

fn conditions_clause(conds: &[Condition], exclude: bool) -> CompileResult<SqlBuilder> {
    let joiner = if exclude { " AND " } else { " OR " };

    let mut parts = Vec::with_capacity(conds.len());
    for cond in conds {
        if let Some(part) = condition_clause(cond, exclude)? {
            parts.push(part);
        }
    }

    let mut clause = SqlBuilder::new();
    if !parts.is_empty() {
        clause
            .push(" AND ")
            .append(SqlBuilder::join_parenthesized(parts, joiner));
    }
    Ok(clause)
}

fn condition_clause(cond: &Condition, exclude: bool) -> CompileResult<Option<SqlBuilder>> {
    let (prefix, joiner) = if exclude { ("NOT", " AND ") } else { ("", " OR ") };
    let mut parts = Vec::new();

    if !cond.in_values.is_empty() {
        let mut args = Vec::with_capacity(cond.in_values.len());
        let mut null_count = 0;
        for value in &cond.in_values {
            match value_to_arg(value) {
                Some(arg) => args.push(arg),
                None => null_count += 1,
            }
        }

        if !args.is_empty() {
            // <dimension> [NOT] IN (?,?,...)
            let mut part = SqlBuilder::new();
            part.push(&format!("{} {} IN (", cond.name, prefix))
                .push_bind_list(args)
                .push(")");
            parts.push(part);
        }

        if null_count > 0 {
            let mut part = SqlBuilder::new();
            if exclude {
                part.push(&format!("{} IS NOT NULL", cond.name));
            } else {
                part.push(&format!("{} IS NULL", cond.name));
            }
            parts.push(part);
        }
    }

    for pattern in &cond.like {
        let arg = value_to_arg(pattern).ok_or_else(|| CompileError::UnsupportedFilterValue {
            dimension: cond.name.clone(),
            reason: "null is not a valid like pattern".to_string(),
        })?;

        // <dimension> [NOT] ILIKE ?
        let mut part = SqlBuilder::new();
        part.push(&format!("{} {} ILIKE ", cond.name, prefix))
            .push_bind(arg);
        parts.push(part);
    }

    Ok(match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(SqlBuilder::join_parenthesized(parts, joiner)),
    })
}

/// Convert a filter value to a bound argument. `None` for the null marker.
fn value_to_arg(value: &FilterValue) -> Option<Arg> {
    match value {
        FilterValue::String(s) => Some(Arg::String(s.clone())),
        FilterValue::Bool(b) => Some(Arg::Bool(*b)),
        FilterValue::Number(n) => Some(Arg::Float(*n)),
        FilterValue::Null => None,
    }
}
