//! Ownership-scoped access to a document store.
//!
//! # Responsibility
//! - Bind one authenticated identity to a store handle.
//! - Add the `owner_id = <identity>` predicate to every read and write.
//! - Stamp `owner_id` on inserts and strip reserved keys from patches.
//!
//! # Invariants
//! - Repositories reach the store only through `OwnerScope`, so no call path
//!   can omit the owner predicate.
//! - A caller filter can only narrow the owner predicate, never widen it.

use crate::model::identity::UserIdentity;
use crate::model::{OWNER_FIELD, RESERVED_FIELDS};
use crate::store::{Collection, Document, DocumentStore, Filter, Patch, StoreError, StoreResult};
use serde_json::Value;

/// Capability object: store access limited to one owner's documents.
pub struct OwnerScope<'s, S: DocumentStore> {
    store: &'s S,
    owner: UserIdentity,
}

impl<'s, S: DocumentStore> OwnerScope<'s, S> {
    pub fn new(store: &'s S, owner: UserIdentity) -> Self {
        Self { store, owner }
    }

    pub fn owner(&self) -> &UserIdentity {
        &self.owner
    }

    pub fn find(
        &self,
        collection: Collection,
        filter: Filter,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        self.store.find(collection, &self.owned(filter), limit)
    }

    pub fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> StoreResult<Option<Document>> {
        self.store.find_one(collection, &self.owned(filter))
    }

    /// Inserts `document` with `owner_id` overwritten by the scope owner.
    ///
    /// Returns the document exactly as written.
    pub fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> StoreResult<Document> {
        document.insert(
            OWNER_FIELD.to_string(),
            Value::String(self.owner.username().to_string()),
        );
        self.store.insert_one(collection, &document)?;
        Ok(document)
    }

    pub fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        patch: &Patch,
    ) -> StoreResult<usize> {
        self.store
            .update_one(collection, &self.owned(filter), &without_reserved(patch))
    }

    pub fn update_many(
        &self,
        collection: Collection,
        filter: Filter,
        patch: &Patch,
    ) -> StoreResult<usize> {
        self.store
            .update_many(collection, &self.owned(filter), &without_reserved(patch))
    }

    pub fn delete_one(&self, collection: Collection, filter: Filter) -> StoreResult<usize> {
        self.store.delete_one(collection, &self.owned(filter))
    }

    /// Groups several scoped calls into one store-level unit.
    pub fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        self.store.atomically(op)
    }

    fn owned(&self, filter: Filter) -> Filter {
        filter.eq(OWNER_FIELD, self.owner.username())
    }
}

fn without_reserved(patch: &Patch) -> Patch {
    patch
        .iter()
        .filter(|(field, _)| !RESERVED_FIELDS.contains(&field.as_str()))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}
