//! SQL text builder that keeps placeholders and bound arguments in lockstep.
//!
//! Every `?` placeholder is pushed together with its argument, so the
//! argument list always matches placeholder order no matter how clause
//! fragments are assembled.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A value bound to a positional `?` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    String(String),
    Bool(bool),
    Float(f64),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::String(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::String(s)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Arg::Int(i)
    }
}

/// Generated SQL with its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub args: Vec<Arg>,
}

/// Accumulates SQL fragments and arguments.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SqlBuilder {
    sql: String,
    args: Vec<Arg>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal SQL text. Must not contain placeholders.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Append a single `?` bound to `arg`.
    pub fn push_bind(&mut self, arg: impl Into<Arg>) -> &mut Self {
        self.sql.push('?');
        self.args.push(arg.into());
        self
    }

    /// Append a comma-separated placeholder list, one per argument.
    pub fn push_bind_list(&mut self, args: Vec<Arg>) -> &mut Self {
        self.sql.push_str(&placeholders(args.len()));
        self.args.extend(args);
        self
    }

    /// Append another builder's text and arguments.
    pub fn append(&mut self, other: SqlBuilder) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.args.extend(other.args);
        self
    }

    /// Join builders with `sep`, wrapping the result in parentheses.
    pub fn join_parenthesized(parts: Vec<SqlBuilder>, sep: &str) -> SqlBuilder {
        let mut out = SqlBuilder::new();
        out.push("(");
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push(sep);
            }
            out.append(part);
        }
        out.push(")");
        out
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn build(self) -> CompiledQuery {
        CompiledQuery {
            sql: self.sql,
            args: self.args,
        }
    }
}

/// `?,?,...,?` with `n` placeholders.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}
