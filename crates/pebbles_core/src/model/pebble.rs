//! Pebble record.
//!
//! # Invariants
//! - `is_deleted` is the tombstone flag; pebbles are never physically removed.
//! - `folder_id` is an unchecked reference; it may name a missing folder.

use super::{
    expect_bool, expect_nullable_string, new_record_id, record_from_document, record_to_document,
};
use crate::store::{Document, Patch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the folder reference.
pub const FOLDER_FIELD: &str = "folderId";
/// Wire name of the soft-delete flag.
pub const DELETED_FIELD: &str = "isDeleted";

/// User-owned content record, optionally placed in a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pebble {
    /// Caller-supplied or server-generated id.
    #[serde(default)]
    pub id: String,
    /// Owner username; overwritten on create.
    #[serde(default)]
    pub owner_id: String,
    #[serde(rename = "folderId", default)]
    pub folder_id: Option<String>,
    #[serde(rename = "isDeleted", default)]
    pub is_deleted: bool,
    /// Free-form user content (`topic`, `content`, `isVerified`, ...).
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Pebble {
    /// Creates an empty root-level pebble with a generated id.
    pub fn new() -> Self {
        Self::with_id(new_record_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: String::new(),
            folder_id: None,
            is_deleted: false,
            content: Map::new(),
        }
    }

    /// Places this pebble inside `folder_id`.
    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    /// Sets one user content field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content.insert(key.into(), value.into());
        self
    }

    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        record_to_document(self)
    }

    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        record_from_document(document)
    }

    /// Type-checks the known fields a partial update may carry.
    pub fn validate_patch(patch: &Patch) -> Result<(), String> {
        for (field, value) in patch {
            match field.as_str() {
                FOLDER_FIELD => expect_nullable_string(field, value)?,
                DELETED_FIELD => expect_bool(field, value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Patch that flips the tombstone flag.
    pub fn soft_delete_patch() -> Patch {
        let mut patch = Patch::new();
        patch.insert(DELETED_FIELD.to_string(), Value::Bool(true));
        patch
    }
}

impl Default for Pebble {
    fn default() -> Self {
        Self::new()
    }
}
