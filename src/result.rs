//! Result shaping.
//!
//! Raw rows from the executor are turned into ordered `{column → value}`
//! maps, one per row, in SELECT-list order. Values are converted according
//! to the declared column type and nullability.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{RuntimeError, RuntimeResult};
use crate::schema::{StructField, StructType, TypeCode};

/// Largest magnitude an `f64` holds without losing integer precision (2^53).
const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;

/// Column metadata reported alongside result data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Type code name, e.g. `CODE_STRING`.
    #[serde(rename = "type")]
    pub type_code: String,
    pub nullable: bool,
}

/// A raw value produced by the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

/// Fully materialized result of one statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRows {
    pub schema: StructType,
    pub rows: Vec<Vec<ScalarValue>>,
}

impl QueryRows {
    pub fn new(schema: StructType, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self { schema, rows }
    }
}

/// One result row as an ordered map.
pub type DataRow = Map<String, Value>;

/// Column metadata for a schema.
pub fn columns_from_schema(schema: &StructType) -> Vec<ColumnMeta> {
    schema
        .fields
        .iter()
        .map(|f| ColumnMeta {
            name: f.name.clone(),
            type_code: f.field_type.code.as_str().to_string(),
            nullable: f.field_type.nullable,
        })
        .collect()
}

/// Convert every row to an ordered map, consuming the result.
pub fn rows_to_data(result: QueryRows) -> RuntimeResult<Vec<DataRow>> {
    let QueryRows { schema, rows } = result;
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| row_to_data(&schema, i, row))
        .collect()
}

fn row_to_data(
    schema: &StructType,
    index: usize,
    row: Vec<ScalarValue>,
) -> RuntimeResult<DataRow> {
    if row.len() != schema.fields.len() {
        return Err(RuntimeError::ResultConversion(format!(
            "row {} has {} values but the result has {} columns",
            index,
            row.len(),
            schema.fields.len()
        )));
    }

    let mut data = Map::with_capacity(row.len());
    for (field, value) in schema.fields.iter().zip(row) {
        data.insert(field.name.clone(), convert_value(field, value)?);
    }
    Ok(data)
}

fn convert_value(field: &StructField, value: ScalarValue) -> RuntimeResult<Value> {
    let code = field.field_type.code;
    let mismatch = |v: &ScalarValue| {
        RuntimeError::ResultConversion(format!(
            "column '{}' of type {} cannot hold {:?}",
            field.name, code, v
        ))
    };

    let converted = match value {
        ScalarValue::Null => {
            if !field.field_type.nullable {
                return Err(RuntimeError::ResultConversion(format!(
                    "null in non-nullable column '{}'",
                    field.name
                )));
            }
            Value::Null
        }
        ScalarValue::Bool(b) => match code {
            TypeCode::Bool | TypeCode::Unspecified => Value::Bool(b),
            _ => return Err(mismatch(&ScalarValue::Bool(b))),
        },
        ScalarValue::Int(i) => match code {
            TypeCode::Bool => Value::Bool(i != 0),
            c if c.is_float() => {
                if i.unsigned_abs() > MAX_EXACT_FLOAT_INT {
                    return Err(RuntimeError::ResultConversion(format!(
                        "integer {} in column '{}' of type {} cannot be represented exactly",
                        i, field.name, code
                    )));
                }
                float_value(i as f64)
            }
            c if c.is_integer() || c == TypeCode::Unspecified => Value::Number(i.into()),
            _ => return Err(mismatch(&ScalarValue::Int(i))),
        },
        ScalarValue::Float(f) => match code {
            c if c.is_float() || c == TypeCode::Unspecified => float_value(f),
            _ => return Err(mismatch(&ScalarValue::Float(f))),
        },
        ScalarValue::String(s) => match code {
            TypeCode::Bool
            | TypeCode::Bytes
            | TypeCode::Array
            | TypeCode::Struct
            | TypeCode::Map => return Err(mismatch(&ScalarValue::String(s))),
            c if c.is_integer() || matches!(c, TypeCode::Float32 | TypeCode::Float64) => {
                return Err(mismatch(&ScalarValue::String(s)))
            }
            _ => Value::String(s),
        },
        ScalarValue::Timestamp(ts) => match code {
            TypeCode::Timestamp | TypeCode::Date | TypeCode::Time | TypeCode::Unspecified => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            _ => return Err(mismatch(&ScalarValue::Timestamp(ts))),
        },
        ScalarValue::Bytes(bytes) => match code {
            TypeCode::Bytes | TypeCode::Unspecified => Value::String(hex(&bytes)),
            _ => return Err(mismatch(&ScalarValue::Bytes(bytes))),
        },
    };
    Ok(converted)
}

/// NaN and infinities have no JSON representation and become null.
fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
