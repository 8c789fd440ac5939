//! Metrics view query compilation.
//!
//! Turns a structured request (toplist, time series, totals) into a SQL
//! string and a positional argument list:
//!
//! ```text
//! ToplistRequest / TimeSeriesRequest / TotalsRequest
//!                          │
//!                          ▼ [compile_*]
//! ┌─────────────────────────────────────────────────────────┐
//! │  SELECT list  +  WHERE (time bounds, filter clause)      │
//! │  + GROUP BY / ORDER BY / LIMIT        (SqlBuilder)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//!                 CompiledQuery { sql, args }
//! ```
//!
//! All user-supplied values are bound through `?` placeholders. Object,
//! dimension, and measure names are written into the SQL text as-is and
//! must be validated against the catalog before compilation.

mod builder;
mod compile;
mod filter;


pub use builder::{placeholders, Arg, CompiledQuery, SqlBuilder};
pub use compile::{compile_timeseries, compile_toplist, compile_totals, CompileOptions};
pub use filter::build_filter_clause;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while compiling a request. Nothing has been executed when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("filter error: value not supported for '{dimension}': {reason}")]
    UnsupportedFilterValue { dimension: String, reason: String },

    #[error("at least one measure is required")]
    EmptyMeasures,

    #[error("toplist requires a dimension")]
    MissingDimension,

    #[error("time bound out of range: {0}")]
    InvalidTimeBound(i64),
}

pub type CompileResult<T> = Result<T, CompileError>;

/// A filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Number(n)
    }
}

/// One condition on a dimension: equality set and/or ILIKE patterns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(rename = "in", default)]
    pub in_values: Vec<FilterValue>,
    #[serde(default)]
    pub like: Vec<FilterValue>,
}

impl Condition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_in(mut self, values: Vec<FilterValue>) -> Self {
        self.in_values = values;
        self
    }

    pub fn with_like(mut self, patterns: Vec<FilterValue>) -> Self {
        self.like = patterns;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.in_values.is_empty() && self.like.is_empty()
    }
}

/// Include conditions are OR-ed; exclude conditions are negated and AND-ed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsViewFilter {
    #[serde(default)]
    pub include: Vec<Condition>,
    #[serde(default)]
    pub exclude: Vec<Condition>,
}

impl MetricsViewFilter {
    pub fn include(mut self, cond: Condition) -> Self {
        self.include.push(cond);
        self
    }

    pub fn exclude(mut self, cond: Condition) -> Self {
        self.exclude.push(cond);
        self
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub name: String,
    #[serde(default)]
    pub ascending: bool,
}

impl SortSpec {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ascending: true,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ascending: false,
        }
    }
}

/// Truncation unit for time series buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGrain {
    Millisecond,
    Second,
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGrain {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGrain::Millisecond => "millisecond",
            TimeGrain::Second => "second",
            TimeGrain::Minute => "minute",
            TimeGrain::Hour => "hour",
            TimeGrain::Day => "day",
            TimeGrain::Week => "week",
            TimeGrain::Month => "month",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Year => "year",
        }
    }
}

impl std::str::FromStr for TimeGrain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "millisecond" => Ok(TimeGrain::Millisecond),
            "second" => Ok(TimeGrain::Second),
            "minute" => Ok(TimeGrain::Minute),
            "hour" => Ok(TimeGrain::Hour),
            "day" => Ok(TimeGrain::Day),
            "week" => Ok(TimeGrain::Week),
            "month" => Ok(TimeGrain::Month),
            "quarter" => Ok(TimeGrain::Quarter),
            "year" => Ok(TimeGrain::Year),
            _ => Err(format!("Unknown time grain: {}", s)),
        }
    }
}

/// Top values of one dimension.
///
/// Time bounds are epoch milliseconds; zero means unbounded. A zero limit
/// means the default limit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToplistRequest {
    pub metrics_view_name: String,
    pub dimension_name: String,
    pub measure_names: Vec<String>,
    pub time_start: i64,
    pub time_end: i64,
    pub limit: u64,
    pub sort: Vec<SortSpec>,
    pub filter: Option<MetricsViewFilter>,
}

/// Measures aggregated per time bucket over `[time_start, time_end)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesRequest {
    pub metrics_view_name: String,
    pub measure_names: Vec<String>,
    pub time_start: i64,
    pub time_end: i64,
    pub time_granularity: TimeGrain,
    pub filter: Option<MetricsViewFilter>,
}

/// Measures aggregated over `[time_start, time_end)` into a single row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsRequest {
    pub metrics_view_name: String,
    pub measure_names: Vec<String>,
    pub time_start: i64,
    pub time_end: i64,
    pub filter: Option<MetricsViewFilter>,
}
