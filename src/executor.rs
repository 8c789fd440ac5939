//! Query execution capability.
//!
//! The relational engine that runs compiled SQL lives outside this crate.
//! It is plugged in through [`QueryExecutor`].

use async_trait::async_trait;

use crate::error::RuntimeResult;
use crate::query::{Arg, CompiledQuery};
use crate::result::QueryRows;

/// A statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub query: String,
    pub args: Vec<Arg>,
    /// Scheduling priority; higher runs sooner.
    pub priority: i32,
}

impl Statement {
    pub fn new(compiled: CompiledQuery, priority: i32) -> Self {
        Self {
            query: compiled.sql,
            args: compiled.args,
            priority,
        }
    }
}

/// Runs a statement for a tenant and returns the materialized rows.
///
/// Implementations must read the cursor to the end (or release it) before
/// returning, on success and on error alike.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, tenant_id: &str, statement: &Statement) -> RuntimeResult<QueryRows>;
}
