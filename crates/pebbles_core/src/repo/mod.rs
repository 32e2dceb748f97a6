//! Ownership-scoped repositories for pebbles and folders.
//!
//! # Responsibility
//! - Express the pebble/folder use-cases as scoped store calls.
//! - Translate store failures into semantic errors (`NotFound`,
//!   `Validation`, `DuplicateId`).
//!
//! # Invariants
//! - Every repository is built from an `OwnerScope`; none holds a raw store.
//! - Listing is capped at `DEFAULT_LIST_LIMIT` unless configured lower/higher.
//! - Wrong id and wrong owner are indistinguishable to callers.

use crate::store::{Collection, StoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod folder_repo;
pub mod pebble_repo;

/// Upper bound on records returned by one list call.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors returned by pebble/folder repositories.
#[derive(Debug)]
pub enum RepoError {
    /// No document with this id is owned by the caller.
    NotFound { collection: Collection, id: String },
    /// Input failed type or content checks.
    Validation(String),
    /// Create used an id the caller already has in the collection.
    DuplicateId { collection: Collection, id: String },
    /// Stored document cannot be read as a typed record.
    InvalidData(String),
    /// Store-level failure.
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "{} not found: {id}", collection.record_name())
            }
            Self::Validation(message) => write!(f, "{message}"),
            Self::DuplicateId { collection, id } => {
                write!(f, "{} already exists: {id}", collection.record_name())
            }
            Self::InvalidData(message) => write!(f, "invalid stored record: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateId { collection, id } => Self::DuplicateId { collection, id },
            StoreError::InvalidFieldName(field) => {
                Self::Validation(format!("invalid field name `{field}`"))
            }
            other => Self::Store(other),
        }
    }
}

pub(crate) fn invalid_data(collection: Collection) -> impl Fn(serde_json::Error) -> RepoError {
    move |err| RepoError::InvalidData(format!("{}: {err}", collection.record_name()))
}
