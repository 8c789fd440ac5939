//! Catalog of named data objects per tenant.
//!
//! Objects (tables, views, metrics views) are keyed by `(tenant_id, name)`.
//! Names keep their original case in storage but are looked up
//! case-insensitively.
//!
//! # Example
//!
//! ```ignore
//! use metrics_runtime::catalog::{CatalogObject, CatalogStore, ObjectType, SqliteCatalog};
//!
//! let catalog = SqliteCatalog::open_in_memory()?;
//! let created = catalog.create_object("default", CatalogObject::new("ad_bids", ObjectType::MetricsView))?;
//! let found = catalog.find_object("default", "AD_BIDS")?;
//! assert_eq!(found.map(|o| o.name), Some(created.name));
//! ```

mod sqlite;

pub use sqlite::SqliteCatalog;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::RuntimeResult;
use crate::schema::StructType;

/// Kind of catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    #[default]
    Unspecified,
    Table,
    View,
    MetricsView,
}

impl ObjectType {
    /// Integer code used in the `type` column.
    pub fn code(&self) -> i64 {
        match self {
            ObjectType::Unspecified => 0,
            ObjectType::Table => 1,
            ObjectType::View => 2,
            ObjectType::MetricsView => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ObjectType::Unspecified),
            1 => Some(ObjectType::Table),
            2 => Some(ObjectType::View),
            3 => Some(ObjectType::MetricsView),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectType::Unspecified => write!(f, "unspecified"),
            ObjectType::Table => write!(f, "table"),
            ObjectType::View => write!(f, "view"),
            ObjectType::MetricsView => write!(f, "metrics_view"),
        }
    }
}

impl std::str::FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unspecified" => Ok(ObjectType::Unspecified),
            "table" => Ok(ObjectType::Table),
            "view" => Ok(ObjectType::View),
            "metrics_view" | "metricsview" => Ok(ObjectType::MetricsView),
            _ => Err(format!("Unknown object type: {}", s)),
        }
    }
}

impl ToSql for ObjectType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for ObjectType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = i64::column_result(value)?;
        ObjectType::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}

/// A named, typed definition in a tenant's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    /// Defining query, if any.
    pub sql: Option<String>,
    pub schema: Option<StructType>,
    /// Whether the system (rather than the user) owns the lifecycle.
    pub managed: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub refreshed_on: DateTime<Utc>,
}

impl CatalogObject {
    /// New unsaved object. Timestamps are set by the store on write.
    pub fn new(name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            name: name.into(),
            object_type,
            sql: None,
            schema: None,
            managed: false,
            created_on: DateTime::<Utc>::default(),
            updated_on: DateTime::<Utc>::default(),
            refreshed_on: DateTime::<Utc>::default(),
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn with_schema(mut self, schema: StructType) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn managed(mut self, managed: bool) -> Self {
        self.managed = managed;
        self
    }

    pub fn is_metrics_view(&self) -> bool {
        self.object_type == ObjectType::MetricsView
    }
}

/// Persistent store of catalog objects.
///
/// Every method issues a single statement against the backing store.
/// There is no optimistic concurrency check: concurrent writers to the
/// same key race and the last write wins.
pub trait CatalogStore: Send + Sync {
    /// All objects of a tenant, optionally of one type, ordered by
    /// case-folded name.
    fn find_objects(
        &self,
        tenant_id: &str,
        object_type: Option<ObjectType>,
    ) -> RuntimeResult<Vec<CatalogObject>>;

    /// Case-insensitive lookup. If several names fold to the same value the
    /// first in case-folded order wins.
    fn find_object(&self, tenant_id: &str, name: &str) -> RuntimeResult<Option<CatalogObject>>;

    /// Insert a new object, stamping all three timestamps with the current
    /// time. Returns the persisted object.
    fn create_object(&self, tenant_id: &str, obj: CatalogObject) -> RuntimeResult<CatalogObject>;

    /// Overwrite the mutable columns of an existing object keyed by exact
    /// name. Stamps `updated_on`; `refreshed_on` is taken from `obj`;
    /// `created_on` is left alone. Fails with `NotFound` if no row matches.
    fn update_object(&self, tenant_id: &str, obj: CatalogObject) -> RuntimeResult<CatalogObject>;

    /// Delete by exact name. Deleting an absent object is not an error.
    fn delete_object(&self, tenant_id: &str, name: &str) -> RuntimeResult<()>;
}
