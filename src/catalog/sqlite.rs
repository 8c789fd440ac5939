//! SQLite-backed catalog store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, ToSql};

use super::{CatalogObject, CatalogStore, ObjectType};
use crate::error::{RuntimeError, RuntimeResult};
use crate::schema::{JsonSchemaCodec, SchemaCodec};

/// SQL function registered on every connection. Folds names with Unicode
/// lowercasing; SQLite's built-in `lower()` only folds ASCII.
const CASEFOLD_FN: &str = "casefold";

const SELECT_COLUMNS: &str =
    "SELECT name, type, sql, schema, managed, created_on, updated_on, refreshed_on FROM catalog";

/// Row as read from SQLite, before the schema blob is decoded.
struct RawObject {
    name: String,
    object_type: ObjectType,
    sql: Option<String>,
    schema: Option<Vec<u8>>,
    managed: bool,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
    refreshed_on: DateTime<Utc>,
}

/// Catalog store persisted in a SQLite database.
///
/// The connection is shared behind a mutex so the store can be used from
/// several request handlers at once; each operation is one statement.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
    codec: Box<dyn SchemaCodec>,
}

impl SqliteCatalog {
    /// Open or create a catalog database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> RuntimeResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RuntimeError::StorageUnavailable(format!(
                        "failed to create catalog directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened catalog database");
        Self::from_connection(conn)
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> RuntimeResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> RuntimeResult<Self> {
        conn.create_scalar_function(
            CASEFOLD_FN,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
        )?;

        let catalog = Self {
            conn: Mutex::new(conn),
            codec: Box::new(JsonSchemaCodec),
        };
        catalog.init()?;
        Ok(catalog)
    }

    /// Replace the schema codec.
    pub fn with_codec(mut self, codec: impl SchemaCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Create the catalog table if it doesn't exist.
    fn init(&self) -> RuntimeResult<()> {
        self.lock()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS catalog (
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                type INTEGER NOT NULL,
                sql TEXT,
                schema BLOB,
                managed BOOLEAN NOT NULL,
                created_on TIMESTAMP NOT NULL,
                updated_on TIMESTAMP NOT NULL,
                refreshed_on TIMESTAMP NOT NULL,
                PRIMARY KEY (tenant_id, name)
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> RuntimeResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RuntimeError::StorageUnavailable("catalog connection lock poisoned".into()))
    }

    fn query_objects(
        &self,
        where_clause: &str,
        args: &[&dyn ToSql],
    ) -> RuntimeResult<Vec<CatalogObject>> {
        let sql = format!(
            "{} {} ORDER BY {f}(name), name",
            SELECT_COLUMNS,
            where_clause,
            f = CASEFOLD_FN
        );
        tracing::debug!(%sql, "querying catalog");

        let raw = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(args, |row| {
                    Ok(RawObject {
                        name: row.get(0)?,
                        object_type: row.get(1)?,
                        sql: row.get(2)?,
                        schema: row.get(3)?,
                        managed: row.get(4)?,
                        created_on: row.get(5)?,
                        updated_on: row.get(6)?,
                        refreshed_on: row.get(7)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        raw.into_iter().map(|r| self.decode_object(r)).collect()
    }

    fn decode_object(&self, raw: RawObject) -> RuntimeResult<CatalogObject> {
        let schema = self.codec.decode(raw.schema.as_deref())?;
        Ok(CatalogObject {
            name: raw.name,
            object_type: raw.object_type,
            sql: raw.sql,
            schema,
            managed: raw.managed,
            created_on: raw.created_on,
            updated_on: raw.updated_on,
            refreshed_on: raw.refreshed_on,
        })
    }
}

impl CatalogStore for SqliteCatalog {
    fn find_objects(
        &self,
        tenant_id: &str,
        object_type: Option<ObjectType>,
    ) -> RuntimeResult<Vec<CatalogObject>> {
        match object_type {
            None | Some(ObjectType::Unspecified) => {
                self.query_objects("WHERE tenant_id = ?", &[&tenant_id as &dyn ToSql])
            }
            Some(t) => self.query_objects(
                "WHERE tenant_id = ? AND type = ?",
                &[&tenant_id as &dyn ToSql, &t],
            ),
        }
    }

    fn find_object(&self, tenant_id: &str, name: &str) -> RuntimeResult<Option<CatalogObject>> {
        let where_clause = format!(
            "WHERE tenant_id = ? AND {f}(name) = {f}(?)",
            f = CASEFOLD_FN
        );
        let objects = self.query_objects(&where_clause, &[&tenant_id as &dyn ToSql, &name])?;
        Ok(objects.into_iter().next())
    }

    fn create_object(&self, tenant_id: &str, obj: CatalogObject) -> RuntimeResult<CatalogObject> {
        let schema = self.codec.encode(obj.schema.as_ref())?;
        let now = Utc::now();

        self.lock()?.execute(
            "INSERT INTO catalog (tenant_id, name, type, sql, schema, managed, created_on, updated_on, refreshed_on)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                tenant_id,
                obj.name,
                obj.object_type,
                obj.sql,
                schema,
                obj.managed,
                now,
                now,
                now
            ],
        )?;

        tracing::info!(
            tenant_id,
            name = %obj.name,
            object_type = %obj.object_type,
            "created catalog object"
        );

        Ok(CatalogObject {
            created_on: now,
            updated_on: now,
            refreshed_on: now,
            ..obj
        })
    }

    fn update_object(&self, tenant_id: &str, obj: CatalogObject) -> RuntimeResult<CatalogObject> {
        let schema = self.codec.encode(obj.schema.as_ref())?;
        let now = Utc::now();

        let rows = self.lock()?.execute(
            "UPDATE catalog SET type = ?, sql = ?, schema = ?, managed = ?, updated_on = ?, refreshed_on = ?
             WHERE tenant_id = ? AND name = ?",
            params![
                obj.object_type,
                obj.sql,
                schema,
                obj.managed,
                now,
                obj.refreshed_on,
                tenant_id,
                obj.name
            ],
        )?;

        if rows == 0 {
            tracing::warn!(tenant_id, name = %obj.name, "update matched no catalog object");
            return Err(RuntimeError::not_found("object", obj.name));
        }

        tracing::info!(tenant_id, name = %obj.name, "updated catalog object");
        Ok(CatalogObject {
            updated_on: now,
            ..obj
        })
    }

    fn delete_object(&self, tenant_id: &str, name: &str) -> RuntimeResult<()> {
        let rows = self.lock()?.execute(
            "DELETE FROM catalog WHERE tenant_id = ? AND name = ?",
            params![tenant_id, name],
        )?;
        tracing::info!(tenant_id, name, rows, "deleted catalog object");
        Ok(())
    }
}
