/*!
 * Database entity models.
 *
 * These structures map directly to the `documents` table and to the
 * arguments of document-store queries.
 */

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::StoreError;

/// Sort direction for ordered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// A stored JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Collection the document belongs to
    pub collection: String,
    /// Identifier, unique within the collection
    pub id: String,
    /// Document body
    pub data: Map<String, Value>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last write timestamp (RFC 3339)
    pub updated_at: String,
}

impl Document {
    /// Deserialize the body into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

/// One write of a batch: create or replace `collection/id` with `data`
#[derive(Debug, Clone)]
pub struct DocumentWrite {
    pub collection: String,
    pub id: String,
    pub data: Map<String, Value>,
}

impl DocumentWrite {
    pub fn new(collection: impl Into<String>, id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            data,
        }
    }
}

/// Convert a serializable record into a document body
pub fn to_document_data<T: Serialize>(record: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
