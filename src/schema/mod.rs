//! Column schema types for catalog objects.
//!
//! A [`StructType`] is the ordered list of output columns of a table, view,
//! or metrics view. It is stored as an opaque blob in the catalog; the
//! [`SchemaCodec`] capability turns it into bytes and back.

mod codec;

pub use codec::{JsonSchemaCodec, SchemaCodec, SchemaCodecError};

use serde::{Deserialize, Serialize};

/// Type code of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeCode {
    #[default]
    Unspecified,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Float32,
    Float64,
    Timestamp,
    Date,
    Time,
    String,
    Bytes,
    Array,
    Struct,
    Map,
    Decimal,
    Json,
    Uuid,
}

impl TypeCode {
    /// Canonical name, as reported to the response layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCode::Unspecified => "CODE_UNSPECIFIED",
            TypeCode::Bool => "CODE_BOOL",
            TypeCode::Int8 => "CODE_INT8",
            TypeCode::Int16 => "CODE_INT16",
            TypeCode::Int32 => "CODE_INT32",
            TypeCode::Int64 => "CODE_INT64",
            TypeCode::Int128 => "CODE_INT128",
            TypeCode::Uint8 => "CODE_UINT8",
            TypeCode::Uint16 => "CODE_UINT16",
            TypeCode::Uint32 => "CODE_UINT32",
            TypeCode::Uint64 => "CODE_UINT64",
            TypeCode::Uint128 => "CODE_UINT128",
            TypeCode::Float32 => "CODE_FLOAT32",
            TypeCode::Float64 => "CODE_FLOAT64",
            TypeCode::Timestamp => "CODE_TIMESTAMP",
            TypeCode::Date => "CODE_DATE",
            TypeCode::Time => "CODE_TIME",
            TypeCode::String => "CODE_STRING",
            TypeCode::Bytes => "CODE_BYTES",
            TypeCode::Array => "CODE_ARRAY",
            TypeCode::Struct => "CODE_STRUCT",
            TypeCode::Map => "CODE_MAP",
            TypeCode::Decimal => "CODE_DECIMAL",
            TypeCode::Json => "CODE_JSON",
            TypeCode::Uuid => "CODE_UUID",
        }
    }

    /// Whether values of this type are integers.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeCode::Int8
                | TypeCode::Int16
                | TypeCode::Int32
                | TypeCode::Int64
                | TypeCode::Int128
                | TypeCode::Uint8
                | TypeCode::Uint16
                | TypeCode::Uint32
                | TypeCode::Uint64
                | TypeCode::Uint128
        )
    }

    /// Whether values of this type are floating point or decimal.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            TypeCode::Float32 | TypeCode::Float64 | TypeCode::Decimal
        )
    }
}

impl std::fmt::Display for TypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldType {
    pub code: TypeCode,
    pub nullable: bool,
}

impl FieldType {
    pub fn new(code: TypeCode) -> Self {
        Self {
            code,
            nullable: false,
        }
    }

    pub fn nullable(code: TypeCode) -> Self {
        Self {
            code,
            nullable: true,
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl StructField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructType {
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn new(fields: Vec<StructField>) -> Self {
        Self { fields }
    }

    /// Builder-style append of a column.
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(StructField::new(name, field_type));
        self
    }

    /// Look up a column by exact name.
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
