//! Pebble repository.
//!
//! # Invariants
//! - `list` hides tombstoned pebbles; id-based mutations still reach them.
//! - `update` reports `NotFound` on zero matches; `soft_delete` never does.
//! - `create` returns the record as constructed, without a read-back.

use super::{invalid_data, RepoError, RepoResult, DEFAULT_LIST_LIMIT};
use crate::model::pebble::{Pebble, DELETED_FIELD};
use crate::model::{new_record_id, ID_FIELD};
use crate::scope::OwnerScope;
use crate::store::{Collection, DocumentStore, Filter, Patch};
use log::{info, warn};

const COLLECTION: Collection = Collection::Pebbles;

/// Pebble CRUD bound to one owner.
pub struct PebbleRepository<'s, S: DocumentStore> {
    scope: OwnerScope<'s, S>,
    list_limit: usize,
}

impl<'s, S: DocumentStore> PebbleRepository<'s, S> {
    pub fn new(scope: OwnerScope<'s, S>) -> Self {
        Self {
            scope,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Overrides the list cap.
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// Lists the owner's non-deleted pebbles, at most `list_limit` of them.
    pub fn list(&self) -> RepoResult<Vec<Pebble>> {
        let documents = self.scope.find(
            COLLECTION,
            Filter::new().eq(DELETED_FIELD, false),
            self.list_limit,
        )?;
        documents
            .into_iter()
            .map(|document| Pebble::from_document(document).map_err(invalid_data(COLLECTION)))
            .collect()
    }

    /// Stores `pebble` under the scope owner.
    ///
    /// Any client-supplied `owner_id` is replaced; a blank id is replaced by a
    /// generated one.
    pub fn create(&self, mut pebble: Pebble) -> RepoResult<Pebble> {
        if pebble.id.trim().is_empty() {
            pebble.id = new_record_id();
        }
        pebble.owner_id = self.scope.owner().username().to_string();

        let document = pebble.to_document().map_err(invalid_data(COLLECTION))?;
        self.scope.insert_one(COLLECTION, document)?;
        info!("event=pebble_create module=repo status=ok");
        Ok(pebble)
    }

    /// Sets the fields present in `patch` on pebble `id`.
    ///
    /// # Errors
    /// - `Validation` when a known field has the wrong type.
    /// - `NotFound` when the caller owns no pebble with this id.
    pub fn update(&self, id: &str, patch: &Patch) -> RepoResult<()> {
        Pebble::validate_patch(patch).map_err(RepoError::Validation)?;

        let matched = self
            .scope
            .update_one(COLLECTION, Filter::new().eq(ID_FIELD, id), patch)?;
        if matched == 0 {
            warn!(
                "event=pebble_update module=repo status=error error_code=not_found fields={}",
                patch.len()
            );
            return Err(RepoError::NotFound {
                collection: COLLECTION,
                id: id.to_string(),
            });
        }

        info!(
            "event=pebble_update module=repo status=ok fields={}",
            patch.len()
        );
        Ok(())
    }

    /// Marks pebble `id` deleted. Succeeds whether or not it matched.
    pub fn soft_delete(&self, id: &str) -> RepoResult<()> {
        let matched = self.scope.update_one(
            COLLECTION,
            Filter::new().eq(ID_FIELD, id),
            &Pebble::soft_delete_patch(),
        )?;
        info!("event=pebble_soft_delete module=repo status=ok matched={matched}");
        Ok(())
    }
}
