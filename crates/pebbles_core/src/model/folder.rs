//! Folder record.
//!
//! # Invariants
//! - `parent_id = None` marks a root folder.
//! - Parent links are unchecked; acyclicity is a caller obligation.
//! - Folders have no tombstone; ungroup removes them physically.

use super::{expect_nullable_string, new_record_id, record_from_document, record_to_document};
use crate::store::{Document, Patch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the parent folder reference.
pub const PARENT_FIELD: &str = "parentId";
/// Wire name of the display label.
pub const NAME_FIELD: &str = "name";

/// User-owned hierarchical container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extra display fields (`createdAt`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Folder {
    /// Creates a root folder with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(new_record_id(), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: String::new(),
            parent_id: None,
            name: Some(name.into()),
            extra: Map::new(),
        }
    }

    /// Nests this folder under `parent_id`.
    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        record_to_document(self)
    }

    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        record_from_document(document)
    }

    /// Rejects blank display names.
    pub fn validate(&self) -> Result<(), String> {
        match self.name.as_deref() {
            Some(name) if name.trim().is_empty() => {
                Err("folder name must not be blank".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Type-checks the known fields a partial update may carry.
    pub fn validate_patch(patch: &Patch) -> Result<(), String> {
        for (field, value) in patch {
            match field.as_str() {
                PARENT_FIELD => expect_nullable_string(field, value)?,
                NAME_FIELD => match value {
                    Value::String(name) if !name.trim().is_empty() => {}
                    Value::String(_) => return Err("folder name must not be blank".to_string()),
                    other => return Err(format!("`name` must be a string, got {other}")),
                },
                _ => {}
            }
        }
        Ok(())
    }
}
