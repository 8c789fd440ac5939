//! Schema blob encoding.

use super::StructType;

/// Errors from encoding or decoding a schema blob.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaCodecError {
    #[error("failed to encode schema: {0}")]
    Encode(String),

    #[error("failed to decode schema: {0}")]
    Decode(String),
}

/// Turns a [`StructType`] into bytes for storage and back.
///
/// An absent schema encodes to `None` and never fails. An absent or empty
/// blob decodes to `None`.
pub trait SchemaCodec: Send + Sync {
    fn encode(&self, schema: Option<&StructType>) -> Result<Option<Vec<u8>>, SchemaCodecError>;

    fn decode(&self, blob: Option<&[u8]>) -> Result<Option<StructType>, SchemaCodecError>;
}

/// JSON schema codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaCodec;

impl SchemaCodec for JsonSchemaCodec {
    fn encode(&self, schema: Option<&StructType>) -> Result<Option<Vec<u8>>, SchemaCodecError> {
        let Some(schema) = schema else {
            return Ok(None);
        };
        serde_json::to_vec(schema)
            .map(Some)
            .map_err(|e| SchemaCodecError::Encode(e.to_string()))
    }

    fn decode(&self, blob: Option<&[u8]>) -> Result<Option<StructType>, SchemaCodecError> {
        match blob {
            None => Ok(None),
            Some(bytes) if bytes.is_empty() => Ok(None),
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| SchemaCodecError::Decode(e.to_string())),
        }
    }
}
