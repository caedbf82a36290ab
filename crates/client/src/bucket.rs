//! BucketHandle: name-scoped facade over a session
//!
//! ## Design: STATELESS FACADE
//!
//! BucketHandle holds ONLY an `Arc<Session>` and the bucket name. No caches,
//! no maps, no locks. Every operation forwards to the session with the name
//! prepended; the only local logic is the insert-or-update branch in [`save`]
//! and the id-annotation loop in [`batch_insert`].
//!
//! ## Thread safety
//!
//! The handle is `Send + Sync` and `Clone` whenever the session is shareable.
//! Multiple handles over the same session are safe; the handle introduces no
//! shared mutable state of its own.
//!
//! [`save`]: BucketHandle::save
//! [`batch_insert`]: BucketHandle::batch_insert

use std::sync::Arc;

use serde_json::Value;

use bucketeer_core::{
    attach_id, meta_id_expr, take_id, Columns, Condition, CountOptions, DeleteOptions, Document,
    Error, IndexOptions, IndexParams, Result, UpdateOptions,
};

use crate::session::Session;

/// A named reference to one bucket, bound to a shared session
///
/// All operations are scoped to exactly this name for the handle's lifetime.
/// The name must match a bucket known to the session; the handle does not
/// check this itself.
#[derive(Debug)]
pub struct BucketHandle<S: Session + ?Sized> {
    session: Arc<S>,
    name: String,
}

impl<S: Session + ?Sized> Clone for BucketHandle<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            name: self.name.clone(),
        }
    }
}

impl<S: Session + ?Sized> BucketHandle<S> {
    /// Create a handle for `name` over `session`.
    ///
    /// The name is immutable after construction. An empty name is rejected
    /// with [`Error::InvalidBucketName`].
    pub fn new(session: Arc<S>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidBucketName(name));
        }
        Ok(Self { session, name })
    }

    /// The bucket name this handle is scoped to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying session reference
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    // ========== Document operations ==========

    /// Delete the bucket and everything in it
    pub fn drop_bucket(&self) -> Result<()> {
        self.session.drop_bucket(&self.name)
    }

    /// Insert one document, returning the generated identifier
    pub fn insert(&self, doc: Document) -> Result<String> {
        self.session.insert(&self.name, doc)
    }

    /// Insert a sequence of documents and return them with identifiers.
    ///
    /// Each returned document is the corresponding input document with `_id`
    /// set to the identifier the session returned for that position. A
    /// session returning a different number of identifiers than documents is
    /// reported as [`Error::Operation`].
    pub fn batch_insert(&self, docs: Vec<Document>) -> Result<Vec<Document>> {
        let ids = self.session.batch_insert(&self.name, docs.clone())?;
        if ids.len() != docs.len() {
            return Err(Error::Operation(format!(
                "batch insert returned {} ids for {} documents",
                ids.len(),
                docs.len()
            )));
        }
        Ok(docs
            .into_iter()
            .zip(ids)
            .map(|(mut doc, id)| {
                attach_id(&mut doc, &id);
                doc
            })
            .collect())
    }

    /// Update documents matching `condition`, returning the number updated
    pub fn update(
        &self,
        columns: Columns,
        condition: Condition,
        options: UpdateOptions,
    ) -> Result<u64> {
        self.session.update(&self.name, columns, condition, options)
    }

    /// Insert or replace the document at `id`
    pub fn upsert(&self, id: &str, doc: Document) -> Result<()> {
        self.session.upsert(&self.name, id, doc)
    }

    /// Insert the document, or update it in place when it carries an `_id`.
    ///
    /// Without an `_id` field this is exactly [`insert`]. With one, the id is
    /// stripped from the payload and an update is issued whose condition
    /// targets the store's meta-identifier for this bucket; the extracted id
    /// is returned. Session errors propagate, but a zero-row update is not
    /// treated as failure: the id comes back whether or not anything matched.
    ///
    /// [`insert`]: BucketHandle::insert
    pub fn save(&self, mut doc: Document) -> Result<String> {
        match take_id(&mut doc) {
            None => self.insert(doc),
            Some(id) => {
                let quoted = self.session.quote_bucket_name(&self.name);
                let mut condition = Condition::new();
                condition.insert(meta_id_expr(&quoted), Value::String(id.clone()));
                self.session
                    .update(&self.name, doc, condition, UpdateOptions::default())?;
                Ok(id)
            }
        }
    }

    /// Remove documents matching `condition`, returning the number removed
    pub fn delete(&self, condition: Condition, options: DeleteOptions) -> Result<u64> {
        self.session.delete(&self.name, condition, options)
    }

    /// Count documents matching `condition`
    pub fn count(&self, condition: Condition, options: CountOptions) -> Result<u64> {
        self.session.count(&self.name, condition, options)
    }

    // ========== Index operations ==========

    /// Build previously deferred indexes by name
    pub fn build_index(&self, index_names: Vec<String>) -> Result<()> {
        self.session.build_index(&self.name, index_names)
    }

    /// Create the bucket's primary index
    pub fn create_primary_index(
        &self,
        index_name: Option<String>,
        options: IndexOptions,
    ) -> Result<()> {
        self.session
            .create_primary_index(&self.name, index_name, options)
    }

    /// Drop the bucket's primary index
    pub fn drop_primary_index(&self) -> Result<()> {
        self.session.drop_primary_index(&self.name)
    }

    /// Create a secondary index over `columns`
    pub fn create_index(
        &self,
        index_name: &str,
        columns: Vec<String>,
        condition: Option<Condition>,
        params: IndexParams,
        options: IndexOptions,
    ) -> Result<()> {
        self.session
            .create_index(&self.name, index_name, columns, condition, params, options)
    }

    /// Drop a secondary index by name
    pub fn drop_index(&self, index_name: &str) -> Result<()> {
        self.session.drop_index(&self.name, index_name)
    }
}
