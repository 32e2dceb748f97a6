//! Core domain logic for Pebbles.
//! Ownership-scoped pebble/folder storage and the folder ungroup splice.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scope;
pub mod store;

pub use api::{ApiResponse, PebblesApi};
pub use auth::{AuthError, IdentityProvider, StaticTokenIdentityProvider};
pub use config::{ConfigError, PebblesConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::folder::Folder;
pub use model::identity::UserIdentity;
pub use model::pebble::Pebble;
pub use repo::folder_repo::{FolderRepository, UngroupOutcome};
pub use repo::pebble_repo::PebbleRepository;
pub use repo::{RepoError, RepoResult, DEFAULT_LIST_LIMIT};
pub use scope::OwnerScope;
pub use store::{
    Collection, Document, DocumentStore, Filter, Patch, SqliteDocumentStore, StoreError,
    StoreResult,
};

/// Minimal health-check API for host integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
