//! Query-shape builders: toplist, time series, and totals.

use chrono::DateTime;

use super::builder::{Arg, CompiledQuery, SqlBuilder};
use super::filter::build_filter_clause;
use super::{
    CompileError, CompileResult, MetricsViewFilter, SortSpec, TimeSeriesRequest, ToplistRequest,
    TotalsRequest,
};
use crate::config::QuerySettings;

/// Options for compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Toplist limit used when the request leaves it at zero.
    pub default_limit: u64,

    /// Row cap for time series queries.
    pub timeseries_limit: u64,

    /// Time field for time series and totals.
    pub time_column: String,

    /// Time column for toplist bounds. `None` disables toplist time bounds.
    pub toplist_time_column: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_limit: 100,
            timeseries_limit: 1000,
            time_column: "timestamp".to_string(),
            toplist_time_column: None,
        }
    }
}

impl CompileOptions {
    /// Set the time field for time series and totals.
    pub fn with_time_column(mut self, column: &str) -> Self {
        self.time_column = column.to_string();
        self
    }

    /// Enable toplist time bounds on `column`.
    pub fn with_toplist_time_column(mut self, column: &str) -> Self {
        self.toplist_time_column = Some(column.to_string());
        self
    }
}

impl From<&QuerySettings> for CompileOptions {
    fn from(settings: &QuerySettings) -> Self {
        Self {
            default_limit: settings.default_limit,
            timeseries_limit: settings.timeseries_limit,
            time_column: settings.time_column.clone(),
            toplist_time_column: Some(settings.toplist_time_column.clone())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// `SELECT <dimension>, <measures> FROM <view> WHERE 1=1 ... [ORDER BY ...] LIMIT n`.
pub fn compile_toplist(
    req: &ToplistRequest,
    options: &CompileOptions,
) -> CompileResult<CompiledQuery> {
    if req.dimension_name.is_empty() {
        return Err(CompileError::MissingDimension);
    }
    check_measures(&req.measure_names)?;

    let mut select_cols = Vec::with_capacity(req.measure_names.len() + 1);
    select_cols.push(req.dimension_name.as_str());
    select_cols.extend(req.measure_names.iter().map(String::as_str));

    let mut where_clause = SqlBuilder::new();
    where_clause.push("WHERE 1=1");
    if let Some(time_col) = options.toplist_time_column.as_deref() {
        if req.time_start != 0 {
            where_clause
                .push(&format!(" AND {} >= ", time_col))
                .push_bind(timestamp_arg(req.time_start)?);
        }
        if req.time_end != 0 {
            where_clause
                .push(&format!(" AND {} < ", time_col))
                .push_bind(timestamp_arg(req.time_end)?);
        }
    }

    let filter_clause = filter_clause(req.filter.as_ref())?;
    if !filter_clause.is_empty() {
        where_clause.push(" ").append(filter_clause);
    }

    let limit = if req.limit == 0 {
        options.default_limit
    } else {
        req.limit
    };

    let mut sql = SqlBuilder::new();
    sql.push(&format!(
        "SELECT {} FROM {} ",
        select_cols.join(", "),
        req.metrics_view_name
    ))
    .append(where_clause)
    .push(&format!(" {} LIMIT {}", order_by_clause(&req.sort), limit));

    let compiled = sql.build();
    tracing::debug!(sql = %compiled.sql, args = compiled.args.len(), "compiled toplist query");
    Ok(compiled)
}

/// `SELECT DATE_TRUNC(...) AS <time>, <measures> ... GROUP BY <time> LIMIT n`.
pub fn compile_timeseries(
    req: &TimeSeriesRequest,
    options: &CompileOptions,
) -> CompileResult<CompiledQuery> {
    check_measures(&req.measure_names)?;

    let time_field = options.time_column.as_str();
    let time_col = format!(
        "DATE_TRUNC('{}', {}) AS {}",
        req.time_granularity.as_str(),
        time_field,
        time_field
    );

    let mut select_cols = Vec::with_capacity(req.measure_names.len() + 1);
    select_cols.push(time_col.as_str());
    select_cols.extend(req.measure_names.iter().map(String::as_str));

    let where_clause = time_range_clause(
        time_field,
        req.time_start,
        req.time_end,
        req.filter.as_ref(),
    )?;

    let mut sql = SqlBuilder::new();
    sql.push(&format!(
        "SELECT {} FROM {} WHERE ",
        select_cols.join(", "),
        req.metrics_view_name
    ))
    .append(where_clause)
    .push(&format!(
        " GROUP BY {} LIMIT {}",
        time_field, options.timeseries_limit
    ));

    let compiled = sql.build();
    tracing::debug!(sql = %compiled.sql, args = compiled.args.len(), "compiled time series query");
    Ok(compiled)
}

/// `SELECT <measures> FROM <view> WHERE <time range> [filter]`, one row expected.
pub fn compile_totals(
    req: &TotalsRequest,
    options: &CompileOptions,
) -> CompileResult<CompiledQuery> {
    check_measures(&req.measure_names)?;

    let where_clause = time_range_clause(
        &options.time_column,
        req.time_start,
        req.time_end,
        req.filter.as_ref(),
    )?;

    let mut sql = SqlBuilder::new();
    sql.push(&format!(
        "SELECT {} FROM {} WHERE ",
        req.measure_names.join(", "),
        req.metrics_view_name
    ))
    .append(where_clause);

    let compiled = sql.build();
    tracing::debug!(sql = %compiled.sql, args = compiled.args.len(), "compiled totals query");
    Ok(compiled)
}

fn check_measures(measures: &[String]) -> CompileResult<()> {
    if measures.is_empty() {
        return Err(CompileError::EmptyMeasures);
    }
    Ok(())
}

/// `<t> >= epoch(?) AND <t> < epoch(?) [filter]`, start and end always bound.
fn time_range_clause(
    time_field: &str,
    start: i64,
    end: i64,
    filter: Option<&MetricsViewFilter>,
) -> CompileResult<SqlBuilder> {
    let mut clause = SqlBuilder::new();
    clause
        .push(&format!("{} >= epoch(", time_field))
        .push_bind(Arg::Int(start))
        .push(&format!(") AND {} < epoch(", time_field))
        .push_bind(Arg::Int(end))
        .push(") ")
        .append(filter_clause(filter)?);
    Ok(clause)
}

fn filter_clause(filter: Option<&MetricsViewFilter>) -> CompileResult<SqlBuilder> {
    match filter {
        Some(f) => build_filter_clause(f),
        None => Ok(SqlBuilder::new()),
    }
}

fn order_by_clause(sort: &[SortSpec]) -> String {
    if sort.is_empty() {
        return String::new();
    }
    let items: Vec<String> = sort
        .iter()
        .map(|s| {
            if s.ascending {
                s.name.clone()
            } else {
                format!("{} DESC", s.name)
            }
        })
        .collect();
    format!("ORDER BY {}", items.join(", "))
}

fn timestamp_arg(millis: i64) -> CompileResult<Arg> {
    DateTime::from_timestamp_millis(millis)
        .map(Arg::Timestamp)
        .ok_or(CompileError::InvalidTimeBound(millis))
}
