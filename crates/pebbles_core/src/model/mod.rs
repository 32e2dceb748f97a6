//! Domain records stored in the `pebbles` and `folders` collections.
//!
//! # Responsibility
//! - Define typed views over stored JSON documents.
//! - Keep wire field names (`folderId`, `isDeleted`, `parentId`) in one place.
//!
//! # Invariants
//! - `owner_id` is always assigned server-side from the caller identity.
//! - Unknown top-level fields are carried through untouched.

pub mod folder;
pub mod identity;
pub mod pebble;

use crate::store::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Record identifier field shared by both collections.
pub const ID_FIELD: &str = "id";
/// Owner field shared by both collections.
pub const OWNER_FIELD: &str = "owner_id";

/// Fields a partial update may never touch.
pub const RESERVED_FIELDS: &[&str] = &[ID_FIELD, OWNER_FIELD];

/// Generates a server-side record id.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn record_to_document<T: Serialize>(record: &T) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(record)? {
        Value::Object(document) => Ok(document),
        other => Err(serde::ser::Error::custom(format!(
            "record serialized to non-object `{other}`"
        ))),
    }
}

pub(crate) fn record_from_document<T: DeserializeOwned>(
    document: Document,
) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(document))
}

pub(crate) fn expect_nullable_string(field: &str, value: &Value) -> Result<(), String> {
    match value {
        Value::Null | Value::String(_) => Ok(()),
        other => Err(format!("`{field}` must be a string or null, got {other}")),
    }
}

pub(crate) fn expect_bool(field: &str, value: &Value) -> Result<(), String> {
    match value {
        Value::Bool(_) => Ok(()),
        other => Err(format!("`{field}` must be a boolean, got {other}")),
    }
}
