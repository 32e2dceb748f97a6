//! Endpoint handlers for the pebbles request/response contract.
//!
//! # Responsibility
//! - Authenticate each call through an `IdentityProvider`.
//! - Run the matching repository use-case inside an `OwnerScope`.
//! - Map every outcome to a status code and JSON body.
//!
//! # Invariants
//! - Handlers never panic; all failures become an `ApiResponse`.
//! - Error bodies have the shape `{"detail": "<message>"}`.
//! - Method/path routing belongs to the host; each handler is one route.

use crate::auth::{AuthError, IdentityProvider};
use crate::model::folder::Folder;
use crate::model::pebble::Pebble;
use crate::repo::folder_repo::FolderRepository;
use crate::repo::pebble_repo::PebbleRepository;
use crate::repo::{RepoError, DEFAULT_LIST_LIMIT};
use crate::scope::OwnerScope;
use crate::store::{DocumentStore, Patch};
use log::{error, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

const INTERNAL_ERROR_DETAIL: &str = "internal error";

/// Status code plus JSON body, ready for any transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: STATUS_OK,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handler-level failure, one variant per status family.
#[derive(Debug)]
enum ApiError {
    Unauthorized(AuthError),
    Invalid(String),
    Repo(RepoError),
    Encode(serde_json::Error),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(err) => write!(f, "{err}"),
            Self::Invalid(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "cannot encode response: {err}"),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl ApiError {
    fn status(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => STATUS_UNAUTHORIZED,
            Self::Invalid(_) => STATUS_UNPROCESSABLE,
            Self::Repo(RepoError::NotFound { .. }) => STATUS_NOT_FOUND,
            Self::Repo(RepoError::Validation(_)) => STATUS_UNPROCESSABLE,
            Self::Repo(RepoError::DuplicateId { .. }) => STATUS_CONFLICT,
            Self::Repo(_) | Self::Encode(_) => STATUS_INTERNAL_ERROR,
        }
    }

    /// Internal failures are logged in full but answered with a generic detail.
    fn into_response(self, operation: &'static str) -> ApiResponse {
        let status = self.status();
        let detail = if status >= STATUS_INTERNAL_ERROR {
            error!("event=api_request module=api op={operation} status={status} error={self}");
            INTERNAL_ERROR_DETAIL.to_string()
        } else {
            warn!("event=api_request module=api op={operation} status={status}");
            self.to_string()
        };
        ApiResponse {
            status,
            body: json!({ "detail": detail }),
        }
    }
}

/// The pebbles endpoint set over one store and identity provider.
pub struct PebblesApi<'a, S: DocumentStore, P: IdentityProvider> {
    store: &'a S,
    identity: &'a P,
    list_limit: usize,
}

impl<'a, S: DocumentStore, P: IdentityProvider> PebblesApi<'a, S, P> {
    pub fn new(store: &'a S, identity: &'a P) -> Self {
        Self {
            store,
            identity,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Overrides the cap applied by both list endpoints.
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// `GET /pebbles`
    pub fn list_pebbles(&self, credential: Option<&str>) -> ApiResponse {
        respond("list_pebbles", || {
            let pebbles = self.pebbles(credential)?.list()?;
            encode(&pebbles)
        })
    }

    /// `POST /pebbles`
    pub fn create_pebble(&self, credential: Option<&str>, body: &Value) -> ApiResponse {
        respond("create_pebble", || {
            let repo = self.pebbles(credential)?;
            let pebble: Pebble = decode(body)?;
            encode(&repo.create(pebble)?)
        })
    }

    /// `PUT /pebbles/{id}`
    pub fn update_pebble(&self, credential: Option<&str>, id: &str, body: &Value) -> ApiResponse {
        respond("update_pebble", || {
            let repo = self.pebbles(credential)?;
            repo.update(id, as_patch(body)?)?;
            Ok(json!({ "status": "success" }))
        })
    }

    /// `DELETE /pebbles/{id}`
    pub fn delete_pebble(&self, credential: Option<&str>, id: &str) -> ApiResponse {
        respond("delete_pebble", || {
            self.pebbles(credential)?.soft_delete(id)?;
            Ok(json!({ "status": "deleted" }))
        })
    }

    /// `GET /folders`
    pub fn list_folders(&self, credential: Option<&str>) -> ApiResponse {
        respond("list_folders", || {
            let folders = self.folders(credential)?.list()?;
            encode(&folders)
        })
    }

    /// `POST /folders`
    pub fn create_folder(&self, credential: Option<&str>, body: &Value) -> ApiResponse {
        respond("create_folder", || {
            let repo = self.folders(credential)?;
            let folder: Folder = decode(body)?;
            encode(&repo.create(folder)?)
        })
    }

    /// `PUT /folders/{id}`
    pub fn update_folder(&self, credential: Option<&str>, id: &str, body: &Value) -> ApiResponse {
        respond("update_folder", || {
            let repo = self.folders(credential)?;
            repo.update(id, as_patch(body)?)?;
            Ok(json!({ "status": "success", "id": id }))
        })
    }

    /// `POST /folders/{id}/ungroup`
    pub fn ungroup_folder(&self, credential: Option<&str>, id: &str) -> ApiResponse {
        respond("ungroup_folder", || {
            let outcome = self.folders(credential)?.ungroup(id)?;
            Ok(json!({ "status": "ungrouped", "moved_to": outcome.moved_to }))
        })
    }

    fn scope(&self, credential: Option<&str>) -> Result<OwnerScope<'a, S>, ApiError> {
        let identity = self.identity.authenticate(credential)?;
        Ok(OwnerScope::new(self.store, identity))
    }

    fn pebbles(&self, credential: Option<&str>) -> Result<PebbleRepository<'a, S>, ApiError> {
        Ok(PebbleRepository::new(self.scope(credential)?).with_list_limit(self.list_limit))
    }

    fn folders(&self, credential: Option<&str>) -> Result<FolderRepository<'a, S>, ApiError> {
        Ok(FolderRepository::new(self.scope(credential)?).with_list_limit(self.list_limit))
    }
}

fn respond<F>(operation: &'static str, handler: F) -> ApiResponse
where
    F: FnOnce() -> Result<Value, ApiError>,
{
    match handler() {
        Ok(body) => ApiResponse::ok(body),
        Err(err) => err.into_response(operation),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(ApiError::Encode)
}

fn decode<T: serde::de::DeserializeOwned>(body: &Value) -> Result<T, ApiError> {
    if !body.is_object() {
        return Err(ApiError::Invalid(
            "request body must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(body.clone()).map_err(|err| ApiError::Invalid(err.to_string()))
}

fn as_patch(body: &Value) -> Result<&Patch, ApiError> {
    body.as_object()
        .ok_or_else(|| ApiError::Invalid("request body must be a JSON object".to_string()))
}
