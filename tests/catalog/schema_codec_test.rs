//! Tests for schema blob encoding, standalone and through the catalog.

use metrics_runtime::catalog::{CatalogObject, CatalogStore, ObjectType, SqliteCatalog};
use metrics_runtime::schema::{
    FieldType, JsonSchemaCodec, SchemaCodec, SchemaCodecError, StructType, TypeCode,
};
use metrics_runtime::RuntimeError;

fn schema() -> StructType {
    StructType::default()
        .with_field("region", FieldType::nullable(TypeCode::String))
        .with_field("revenue", FieldType::new(TypeCode::Decimal))
}

/// Codec that refuses to decode anything.
struct BrokenCodec;

impl SchemaCodec for BrokenCodec {
    fn encode(&self, schema: Option<&StructType>) -> Result<Option<Vec<u8>>, SchemaCodecError> {
        JsonSchemaCodec.encode(schema)
    }

    fn decode(&self, blob: Option<&[u8]>) -> Result<Option<StructType>, SchemaCodecError> {
        match blob {
            None => Ok(None),
            Some(_) => Err(SchemaCodecError::Decode("unsupported".to_string())),
        }
    }
}

#[test]
fn test_json_codec_preserves_field_order() {
    let codec = JsonSchemaCodec;
    let blob = codec.encode(Some(&schema())).unwrap().unwrap();
    let decoded = codec.decode(Some(&blob)).unwrap().unwrap();

    let names: Vec<&str> = decoded.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["region", "revenue"]);
    assert!(decoded.field("region").unwrap().field_type.nullable);
    assert_eq!(
        decoded.field("revenue").unwrap().field_type.code,
        TypeCode::Decimal
    );
}

#[test]
fn test_json_codec_absent_schema() {
    let codec = JsonSchemaCodec;
    assert!(codec.encode(None).unwrap().is_none());
    assert!(codec.decode(None).unwrap().is_none());
    assert!(codec.decode(Some(b"")).unwrap().is_none());
}

#[test]
fn test_json_codec_rejects_garbage() {
    let err = JsonSchemaCodec.decode(Some(b"{not json")).unwrap_err();
    assert!(matches!(err, SchemaCodecError::Decode(_)));
}

#[test]
fn test_catalog_uses_custom_codec() {
    let catalog = SqliteCatalog::open_in_memory()
        .unwrap()
        .with_codec(BrokenCodec);

    catalog
        .create_object("default", CatalogObject::new("plain", ObjectType::Table))
        .unwrap();
    catalog
        .create_object(
            "default",
            CatalogObject::new("typed", ObjectType::Table).with_schema(schema()),
        )
        .unwrap();

    assert!(catalog.find_object("default", "plain").unwrap().is_some());

    let err = catalog.find_object("default", "typed").unwrap_err();
    assert!(matches!(err, RuntimeError::SchemaEncoding(_)));
    assert!(!err.is_client_error());
}
