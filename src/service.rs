//! Metrics view request handling.
//!
//! [`MetricsViewService`] ties the pieces together for one request:
//!
//! ```text
//! tenant id ──► TenantRegistry ──► CatalogStore.find_object (type check)
//!                                        │
//!                                        ▼
//!                          compile_* (fails fast, nothing executed)
//!                                        │
//!                                        ▼
//!                   QueryExecutor.execute ──► rows_to_data ──► response
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{CatalogObject, CatalogStore, ObjectType};
use crate::config::QuerySettings;
use crate::error::{RuntimeError, RuntimeResult};
use crate::executor::{QueryExecutor, Statement};
use crate::query::{
    compile_timeseries, compile_toplist, compile_totals, CompileOptions, CompiledQuery,
    TimeSeriesRequest, ToplistRequest, TotalsRequest,
};
use crate::result::{columns_from_schema, rows_to_data, ColumnMeta, DataRow};

/// A tenant known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub id: String,
    pub created_on: DateTime<Utc>,
}

impl Tenant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_on: Utc::now(),
        }
    }
}

/// Resolves tenant ids.
pub trait TenantRegistry: Send + Sync {
    fn find_tenant(&self, tenant_id: &str) -> RuntimeResult<Option<Tenant>>;
}

/// Tenant registry held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    tenants: RwLock<HashMap<String, Tenant>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant, replacing any previous one with the same id.
    pub fn register(&self, tenant: Tenant) -> RuntimeResult<()> {
        self.tenants
            .write()
            .map_err(|_| poisoned())?
            .insert(tenant.id.clone(), tenant);
        Ok(())
    }
}

impl TenantRegistry for InMemoryRegistry {
    fn find_tenant(&self, tenant_id: &str) -> RuntimeResult<Option<Tenant>> {
        let tenants = self.tenants.read().map_err(|_| poisoned())?;
        Ok(tenants.get(tenant_id).cloned())
    }
}

fn poisoned() -> RuntimeError {
    RuntimeError::StorageUnavailable("tenant registry lock poisoned".into())
}

/// Description of a metrics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsViewMeta {
    pub name: String,
    pub sql: Option<String>,
    pub columns: Vec<ColumnMeta>,
}

/// Rows returned by a toplist or time series query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsViewResponse {
    pub meta: Vec<ColumnMeta>,
    pub data: Vec<DataRow>,
}

/// Single row returned by a totals query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsResponse {
    pub meta: Vec<ColumnMeta>,
    pub data: DataRow,
}

/// Serves metrics view requests.
pub struct MetricsViewService {
    registry: Arc<dyn TenantRegistry>,
    catalog: Arc<dyn CatalogStore>,
    executor: Arc<dyn QueryExecutor>,
    options: CompileOptions,
    priority: i32,
}

impl MetricsViewService {
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        catalog: Arc<dyn CatalogStore>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self::with_settings(registry, catalog, executor, &QuerySettings::default())
    }

    pub fn with_settings(
        registry: Arc<dyn TenantRegistry>,
        catalog: Arc<dyn CatalogStore>,
        executor: Arc<dyn QueryExecutor>,
        settings: &QuerySettings,
    ) -> Self {
        Self {
            registry,
            catalog,
            executor,
            options: CompileOptions::from(settings),
            priority: settings.priority,
        }
    }

    /// Name, defining SQL, and columns of a metrics view. Catalog only; the
    /// executor is not involved.
    pub fn meta(&self, tenant_id: &str, view_name: &str) -> RuntimeResult<MetricsViewMeta> {
        let obj = self.resolve_metrics_view(tenant_id, view_name)?;
        Ok(MetricsViewMeta {
            columns: obj.schema.as_ref().map(columns_from_schema).unwrap_or_default(),
            name: obj.name,
            sql: obj.sql,
        })
    }

    pub async fn toplist(
        &self,
        tenant_id: &str,
        req: &ToplistRequest,
    ) -> RuntimeResult<MetricsViewResponse> {
        self.resolve_metrics_view(tenant_id, &req.metrics_view_name)?;
        let compiled = compile_toplist(req, &self.options)?;
        self.run(tenant_id, compiled).await
    }

    pub async fn timeseries(
        &self,
        tenant_id: &str,
        req: &TimeSeriesRequest,
    ) -> RuntimeResult<MetricsViewResponse> {
        self.resolve_metrics_view(tenant_id, &req.metrics_view_name)?;
        let compiled = compile_timeseries(req, &self.options)?;
        self.run(tenant_id, compiled).await
    }

    pub async fn totals(
        &self,
        tenant_id: &str,
        req: &TotalsRequest,
    ) -> RuntimeResult<TotalsResponse> {
        self.resolve_metrics_view(tenant_id, &req.metrics_view_name)?;
        let compiled = compile_totals(req, &self.options)?;
        let MetricsViewResponse { meta, data } = self.run(tenant_id, compiled).await?;

        match data.into_iter().next() {
            Some(row) => Ok(TotalsResponse { meta, data: row }),
            None => {
                tracing::warn!(
                    tenant_id,
                    metrics_view = %req.metrics_view_name,
                    "totals query returned no rows"
                );
                Err(RuntimeError::DegenerateResult(
                    "no rows received from totals query".to_string(),
                ))
            }
        }
    }

    fn resolve_metrics_view(
        &self,
        tenant_id: &str,
        view_name: &str,
    ) -> RuntimeResult<CatalogObject> {
        self.registry
            .find_tenant(tenant_id)?
            .ok_or_else(|| RuntimeError::not_found("tenant", tenant_id))?;

        let obj = self
            .catalog
            .find_object(tenant_id, view_name)?
            .ok_or_else(|| RuntimeError::not_found("metrics view", view_name))?;

        if !obj.is_metrics_view() {
            return Err(RuntimeError::WrongObjectType {
                name: obj.name,
                expected: ObjectType::MetricsView,
                actual: obj.object_type,
            });
        }
        Ok(obj)
    }

    async fn run(
        &self,
        tenant_id: &str,
        compiled: CompiledQuery,
    ) -> RuntimeResult<MetricsViewResponse> {
        let statement = Statement::new(compiled, self.priority);
        tracing::debug!(tenant_id, sql = %statement.query, "executing metrics query");

        let rows = self.executor.execute(tenant_id, &statement).await?;
        let meta = columns_from_schema(&rows.schema);
        let data = rows_to_data(rows)?;
        Ok(MetricsViewResponse { meta, data })
    }
}
