//! Integration tests for the SQLite catalog store.
//!
//! Covers create/find/update/delete, case-insensitive lookup, ordering,
//! type filtering, and tenant isolation.

use metrics_runtime::catalog::{CatalogObject, CatalogStore, ObjectType, SqliteCatalog};
use metrics_runtime::schema::{FieldType, StructType, TypeCode};
use metrics_runtime::RuntimeError;

fn catalog() -> SqliteCatalog {
    SqliteCatalog::open_in_memory().unwrap()
}

fn ad_bids_schema() -> StructType {
    StructType::default()
        .with_field("publisher", FieldType::nullable(TypeCode::String))
        .with_field("bid_price", FieldType::new(TypeCode::Float64))
        .with_field("timestamp", FieldType::new(TypeCode::Timestamp))
}

fn names(objects: &[CatalogObject]) -> Vec<&str> {
    objects.iter().map(|o| o.name.as_str()).collect()
}

// ============================================================================
// Create and Find
// ============================================================================

#[test]
fn test_create_then_find() {
    let catalog = catalog();
    let created = catalog
        .create_object(
            "default",
            CatalogObject::new("ad_bids", ObjectType::MetricsView)
                .with_sql("SELECT * FROM bids")
                .with_schema(ad_bids_schema()),
        )
        .unwrap();

    assert_eq!(created.created_on, created.updated_on);
    assert_eq!(created.created_on, created.refreshed_on);

    let found = catalog.find_object("default", "ad_bids").unwrap().unwrap();
    assert_eq!(found.name, "ad_bids");
    assert_eq!(found.object_type, ObjectType::MetricsView);
    assert_eq!(found.sql.as_deref(), Some("SELECT * FROM bids"));
    assert_eq!(found.schema, Some(ad_bids_schema()));
    assert!(!found.managed);
    assert_eq!(
        found.created_on.timestamp_millis(),
        created.created_on.timestamp_millis()
    );
}

#[test]
fn test_find_is_case_insensitive() {
    let catalog = catalog();
    catalog
        .create_object("default", CatalogObject::new("AdBids", ObjectType::Table))
        .unwrap();

    for lookup in ["AdBids", "adbids", "ADBIDS"] {
        let found = catalog.find_object("default", lookup).unwrap();
        assert_eq!(found.map(|o| o.name), Some("AdBids".to_string()));
    }
}

#[test]
fn test_find_folds_non_ascii_names() {
    let catalog = catalog();
    catalog
        .create_object("default", CatalogObject::new("Äpfel", ObjectType::Table))
        .unwrap();
    catalog
        .create_object("default", CatalogObject::new("ÖL", ObjectType::View))
        .unwrap();

    for lookup in ["äpfel", "ÄPFEL", "Äpfel"] {
        let found = catalog.find_object("default", lookup).unwrap();
        assert_eq!(found.map(|o| o.name), Some("Äpfel".to_string()));
    }
    let found = catalog.find_object("default", "öl").unwrap();
    assert_eq!(found.map(|o| o.object_type), Some(ObjectType::View));
}

#[test]
fn test_case_duplicates_resolve_deterministically() {
    let catalog = catalog();
    catalog
        .create_object("default", CatalogObject::new("sales", ObjectType::Table))
        .unwrap();
    catalog
        .create_object("default", CatalogObject::new("Sales", ObjectType::View))
        .unwrap();

    let found = catalog.find_object("default", "SALES").unwrap().unwrap();
    assert_eq!(found.name, "Sales");
}

#[test]
fn test_find_missing_returns_none() {
    let catalog = catalog();
    assert!(catalog.find_object("default", "nope").unwrap().is_none());
}

#[test]
fn test_duplicate_create_is_storage_error() {
    let catalog = catalog();
    catalog
        .create_object("default", CatalogObject::new("t", ObjectType::Table))
        .unwrap();

    let err = catalog
        .create_object("default", CatalogObject::new("t", ObjectType::Table))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Storage(_)));
    assert_eq!(err.status_code(), "INTERNAL");
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_is_ordered_by_lowercase_name() {
    let catalog = catalog();
    for name in ["charlie", "Bravo", "alpha"] {
        catalog
            .create_object("default", CatalogObject::new(name, ObjectType::Table))
            .unwrap();
    }

    let objects = catalog.find_objects("default", None).unwrap();
    assert_eq!(names(&objects), vec!["alpha", "Bravo", "charlie"]);
}

#[test]
fn test_list_filters_by_type() {
    let catalog = catalog();
    catalog
        .create_object("default", CatalogObject::new("raw", ObjectType::Table))
        .unwrap();
    catalog
        .create_object("default", CatalogObject::new("clean", ObjectType::View))
        .unwrap();
    catalog
        .create_object("default", CatalogObject::new("kpis", ObjectType::MetricsView))
        .unwrap();

    let views = catalog
        .find_objects("default", Some(ObjectType::MetricsView))
        .unwrap();
    assert_eq!(names(&views), vec!["kpis"]);

    let all = catalog
        .find_objects("default", Some(ObjectType::Unspecified))
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn test_tenants_are_isolated() {
    let catalog = catalog();
    catalog
        .create_object("acme", CatalogObject::new("sales", ObjectType::Table))
        .unwrap();
    catalog
        .create_object("globex", CatalogObject::new("sales", ObjectType::View))
        .unwrap();

    assert_eq!(catalog.find_objects("acme", None).unwrap().len(), 1);
    assert_eq!(
        catalog
            .find_object("globex", "sales")
            .unwrap()
            .unwrap()
            .object_type,
        ObjectType::View
    );
    assert!(catalog.find_objects("initech", None).unwrap().is_empty());
}

// ============================================================================
// Update and Delete
// ============================================================================

#[test]
fn test_update_rewrites_fields() {
    let catalog = catalog();
    let created = catalog
        .create_object(
            "default",
            CatalogObject::new("kpis", ObjectType::View).with_sql("SELECT 1"),
        )
        .unwrap();

    let updated = catalog
        .update_object(
            "default",
            CatalogObject {
                object_type: ObjectType::MetricsView,
                sql: Some("SELECT 2".to_string()),
                schema: Some(ad_bids_schema()),
                managed: true,
                ..created.clone()
            },
        )
        .unwrap();
    assert!(updated.updated_on >= created.updated_on);
    assert_eq!(updated.created_on, created.created_on);

    let found = catalog.find_object("default", "kpis").unwrap().unwrap();
    assert_eq!(found.object_type, ObjectType::MetricsView);
    assert_eq!(found.sql.as_deref(), Some("SELECT 2"));
    assert_eq!(found.schema, Some(ad_bids_schema()));
    assert!(found.managed);
}

#[test]
fn test_update_missing_is_not_found() {
    let catalog = catalog();
    let err = catalog
        .update_object("default", CatalogObject::new("ghost", ObjectType::Table))
        .unwrap_err();

    assert!(matches!(err, RuntimeError::NotFound { .. }));
    assert!(catalog.find_object("default", "ghost").unwrap().is_none());
}

#[test]
fn test_delete_is_idempotent() {
    let catalog = catalog();
    catalog
        .create_object("default", CatalogObject::new("tmp", ObjectType::Table))
        .unwrap();

    catalog.delete_object("default", "tmp").unwrap();
    assert!(catalog.find_object("default", "tmp").unwrap().is_none());

    catalog.delete_object("default", "tmp").unwrap();
    catalog.delete_object("default", "never_existed").unwrap();
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_reopen_from_file() {
    let dir = std::env::temp_dir().join(format!("metrics-runtime-test-{}", std::process::id()));
    let path = dir.join("nested").join("catalog.db");
    let _ = std::fs::remove_file(&path);

    {
        let catalog = SqliteCatalog::open(&path).unwrap();
        catalog
            .create_object(
                "default",
                CatalogObject::new("ad_bids", ObjectType::MetricsView).with_schema(ad_bids_schema()),
            )
            .unwrap();
    }

    let catalog = SqliteCatalog::open(&path).unwrap();
    let found = catalog.find_object("default", "AD_BIDS").unwrap().unwrap();
    assert_eq!(found.schema, Some(ad_bids_schema()));

    let _ = std::fs::remove_dir_all(&dir);
}
