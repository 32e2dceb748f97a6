//! Folder repository and the ungroup tree splice.
//!
//! # Responsibility
//! - Provide owner-scoped list/create/update for folders.
//! - Remove one folder node while reattaching its direct children.
//!
//! # Invariants
//! - `update` reports success even when nothing matched.
//! - `ungroup` moves direct children only; deeper descendants keep pointing
//!   at their own (reattached) parents.
//! - `ungroup` runs inside `OwnerScope::atomically`; on a transactional
//!   store a failed step leaves no partial re-parenting behind.

use super::{invalid_data, RepoError, RepoResult, DEFAULT_LIST_LIMIT};
use crate::model::folder::{Folder, PARENT_FIELD};
use crate::model::pebble::FOLDER_FIELD;
use crate::model::{new_record_id, ID_FIELD};
use crate::scope::OwnerScope;
use crate::store::{Collection, DocumentStore, Filter, Patch};
use log::{info, warn};
use serde_json::Value;

const COLLECTION: Collection = Collection::Folders;

/// Result of a successful ungroup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UngroupOutcome {
    /// Former parent of the removed folder; `None` means children became roots.
    pub moved_to: Option<String>,
    /// Pebbles re-pointed from the removed folder.
    pub moved_pebbles: usize,
    /// Subfolders re-parented from the removed folder.
    pub moved_folders: usize,
}

/// Folder CRUD bound to one owner.
pub struct FolderRepository<'s, S: DocumentStore> {
    scope: OwnerScope<'s, S>,
    list_limit: usize,
}

impl<'s, S: DocumentStore> FolderRepository<'s, S> {
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

    /// Lists every folder of the owner, at most `list_limit` of them.
    pub fn list(&self) -> RepoResult<Vec<Folder>> {
        self.scope
            .find(COLLECTION, Filter::new(), self.list_limit)?
            .into_iter()
            .map(|document| Folder::from_document(document).map_err(invalid_data(COLLECTION)))
            .collect()
    }

    /// Stores `folder` under the scope owner; same owner/id rules as pebbles.
    pub fn create(&self, mut folder: Folder) -> RepoResult<Folder> {
        folder.validate().map_err(RepoError::Validation)?;
        if folder.id.trim().is_empty() {
            folder.id = new_record_id();
        }
        folder.owner_id = self.scope.owner().username().to_string();

        let document = folder.to_document().map_err(invalid_data(COLLECTION))?;
        self.scope.insert_one(COLLECTION, document)?;
        info!(
            "event=folder_create module=repo status=ok root={}",
            folder.parent_id.is_none()
        );
        Ok(folder)
    }

    /// Sets the fields present in `patch` on folder `id`.
    ///
    /// Zero matches is not an error here.
    pub fn update(&self, id: &str, patch: &Patch) -> RepoResult<()> {
        Folder::validate_patch(patch).map_err(RepoError::Validation)?;

        let matched = self
            .scope
            .update_one(COLLECTION, Filter::new().eq(ID_FIELD, id), patch)?;
        info!(
            "event=folder_update module=repo status=ok matched={matched} fields={}",
            patch.len()
        );
        Ok(())
    }

    /// Deletes folder `folder_id` after moving its direct pebbles and
    /// subfolders to the folder's own parent.
    ///
    /// # Errors
    /// - `NotFound` when the caller owns no folder with this id; nothing is
    ///   changed in that case.
    pub fn ungroup(&self, folder_id: &str) -> RepoResult<UngroupOutcome> {
        let outcome = self.scope.atomically(|| self.splice_out(folder_id));
        match &outcome {
            Ok(outcome) => info!(
                "event=folder_ungroup module=repo status=ok to_root={} moved_pebbles={} moved_folders={}",
                outcome.moved_to.is_none(),
                outcome.moved_pebbles,
                outcome.moved_folders
            ),
            Err(err) => warn!("event=folder_ungroup module=repo status=error error={err}"),
        }
        outcome
    }

    fn splice_out(&self, folder_id: &str) -> RepoResult<UngroupOutcome> {
        let document = self
            .scope
            .find_one(COLLECTION, Filter::new().eq(ID_FIELD, folder_id))?
            .ok_or_else(|| RepoError::NotFound {
                collection: COLLECTION,
                id: folder_id.to_string(),
            })?;
        let folder = Folder::from_document(document).map_err(invalid_data(COLLECTION))?;
        let target = Value::from(folder.parent_id.clone());

        let moved_pebbles = self.scope.update_many(
            Collection::Pebbles,
            Filter::new().eq(FOLDER_FIELD, folder_id),
            &single_field_patch(FOLDER_FIELD, target.clone()),
        )?;
        let moved_folders = self.scope.update_many(
            COLLECTION,
            Filter::new().eq(PARENT_FIELD, folder_id),
            &single_field_patch(PARENT_FIELD, target),
        )?;
        self.scope
            .delete_one(COLLECTION, Filter::new().eq(ID_FIELD, folder_id))?;

        Ok(UngroupOutcome {
            moved_to: folder.parent_id,
            moved_pebbles,
            moved_folders,
        })
    }
}

fn single_field_patch(field: &str, value: Value) -> Patch {
    let mut patch = Patch::new();
    patch.insert(field.to_string(), value);
    patch
}
