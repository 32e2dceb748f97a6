//! Document store adapter contracts.
//!
//! # Responsibility
//! - Name the two logical collections (`pebbles`, `folders`).
//! - Define the find/insert/update/delete surface repositories depend on.
//! - Keep engine details (SQL, JSON encoding) behind `DocumentStore`.
//!
//! # Invariants
//! - Filters are conjunctions of top-level field equality tests.
//! - Patches set only the keys they carry; absent keys are untouched.
//! - Any non-empty top-level key is addressable except keys containing `"`,
//!   `\` or control characters, which quoted JSON path labels cannot carry.

use crate::db::DbError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteDocumentStore;

static PLAIN_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid plain field regex"));
static UNQUOTABLE_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["\\\p{Cc}]"#).expect("valid unquotable field regex"));

/// One stored record: a JSON object.
pub type Document = Map<String, Value>;

/// Partial field assignment applied by `update_one` / `update_many`.
pub type Patch = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by document store implementations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Field name cannot be addressed safely.
    InvalidFieldName(String),
    /// Filters only compare scalars and null.
    UnsupportedFilterValue { field: String },
    /// The same owner already has a document with this id in the collection.
    DuplicateId { collection: Collection, id: String },
    /// Persisted body is not a JSON object.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidFieldName(field) => write!(f, "invalid document field name `{field}`"),
            Self::UnsupportedFilterValue { field } => {
                write!(f, "filter on `{field}` must compare a scalar or null")
            }
            Self::DuplicateId { collection, id } => {
                write!(f, "{} with id `{id}` already exists", collection.record_name())
            }
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document store requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Logical collection addressed by a store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Pebbles,
    Folders,
}

impl Collection {
    /// Stable collection name used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pebbles => "pebbles",
            Self::Folders => "folders",
        }
    }

    /// Singular record name used in messages.
    pub fn record_name(self) -> &'static str {
        match self {
            Self::Pebbles => "pebble",
            Self::Folders => "folder",
        }
    }
}

/// Equality filter over top-level document fields.
///
/// A `null` comparison matches documents where the field is null or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field == value` to the conjunction.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }
}

/// Storage operations over the `pebbles` and `folders` collections.
///
/// Every single-call operation is atomic on its own. `atomically` groups
/// several calls; implementations without transactions run them in order.
pub trait DocumentStore {
    /// Returns up to `limit` documents matching `filter`.
    fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> StoreResult<Vec<Document>>;

    /// Returns the first document matching `filter`.
    fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Document>> {
        Ok(self.find(collection, filter, 1)?.into_iter().next())
    }

    /// Counts documents matching `filter` without decoding them.
    fn count(&self, collection: Collection, filter: &Filter) -> StoreResult<usize>;

    /// Persists one new document.
    fn insert_one(&self, collection: Collection, document: &Document) -> StoreResult<()>;

    /// Applies `patch` to the first matching document; returns matched count (0 or 1).
    fn update_one(&self, collection: Collection, filter: &Filter, patch: &Patch)
        -> StoreResult<usize>;

    /// Applies `patch` to every matching document; returns matched count.
    fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> StoreResult<usize>;

    /// Removes the first matching document; returns deleted count (0 or 1).
    fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<usize>;

    /// Runs `op` so that all of its store calls commit together or not at all.
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>;
}

pub(crate) fn ensure_field_name(field: &str) -> StoreResult<()> {
    if field.is_empty() || UNQUOTABLE_FIELD_RE.is_match(field) {
        return Err(StoreError::InvalidFieldName(field.to_string()));
    }
    Ok(())
}

/// `true` when `field` can appear unquoted in a JSON path (`$.field`).
pub(crate) fn is_plain_field(field: &str) -> bool {
    PLAIN_FIELD_RE.is_match(field)
}
