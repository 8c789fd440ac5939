//! # Metrics Runtime
//!
//! Catalog storage and metrics view query compilation for a multi-tenant
//! analytical runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Catalog (per-tenant objects)                │
//! │  (tables, views, metrics views + encoded schemas)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [service: resolve + type check]
//! ┌─────────────────────────────────────────────────────────┐
//! │      ToplistRequest / TimeSeriesRequest / TotalsRequest   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query: compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │            CompiledQuery { sql, args }                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor]
//! ┌─────────────────────────────────────────────────────────┐
//! │         Rows → { column → value } maps + metadata        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod query;
pub mod result;
pub mod schema;
pub mod service;

pub use catalog::{CatalogObject, CatalogStore, ObjectType, SqliteCatalog};
pub use error::{RuntimeError, RuntimeResult};
pub use executor::{QueryExecutor, Statement};
pub use query::{CompileError, CompileOptions, CompiledQuery};
pub use service::MetricsViewService;
