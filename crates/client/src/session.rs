//! Session trait - the connection collaborator behind the facade
//!
//! A session owns everything the facade does not: connection handling, query
//! building, document encoding, network I/O, retries. The facade only scopes
//! calls by bucket name and forwards them here.
//!
//! Implementations must be safe to share across handles; the facade holds an
//! `Arc<S>` and performs no locking of its own.

use bucketeer_core::{
    Columns, Condition, CountOptions, DeleteOptions, Document, IndexOptions, IndexParams, Result,
    UpdateOptions,
};

/// Bucket-level document and index operations, addressed by bucket name
///
/// Every method takes the bucket name as its first argument; handles prepend
/// their own name when forwarding. Errors carry the taxonomy from
/// `bucketeer_core::Error` and are propagated to callers unchanged.
pub trait Session: Send + Sync {
    /// Delete the named bucket and everything in it
    fn drop_bucket(&self, bucket: &str) -> Result<()>;

    /// Insert one document, returning its identifier.
    ///
    /// A string `_id` field in the document is used as the identifier and
    /// collides with [`bucketeer_core::Error::DuplicateKey`]; otherwise the
    /// session generates one.
    fn insert(&self, bucket: &str, doc: Document) -> Result<String>;

    /// Insert a sequence of documents, returning one identifier per document
    /// in the same order
    fn batch_insert(&self, bucket: &str, docs: Vec<Document>) -> Result<Vec<String>>;

    /// Update documents matching `condition`, returning the number updated.
    ///
    /// When `options.strategy` is unset the session applies
    /// [`bucketeer_core::UpdateStrategy::Set`].
    fn update(
        &self,
        bucket: &str,
        columns: Columns,
        condition: Condition,
        options: UpdateOptions,
    ) -> Result<u64>;

    /// Insert or replace the document at `id`
    fn upsert(&self, bucket: &str, id: &str, doc: Document) -> Result<()>;

    /// Remove documents matching `condition`, returning the number removed
    fn delete(&self, bucket: &str, condition: Condition, options: DeleteOptions) -> Result<u64>;

    /// Count documents matching `condition`
    fn count(&self, bucket: &str, condition: Condition, options: CountOptions) -> Result<u64>;

    /// Build previously deferred indexes by name
    fn build_index(&self, bucket: &str, index_names: Vec<String>) -> Result<()>;

    /// Create the bucket's primary index; `index_name` of `None` uses the
    /// backend's default name
    fn create_primary_index(
        &self,
        bucket: &str,
        index_name: Option<String>,
        options: IndexOptions,
    ) -> Result<()>;

    /// Drop the bucket's primary index
    fn drop_primary_index(&self, bucket: &str) -> Result<()>;

    /// Create a secondary index over `columns`, optionally filtered by
    /// `condition`
    fn create_index(
        &self,
        bucket: &str,
        index_name: &str,
        columns: Vec<String>,
        condition: Option<Condition>,
        params: IndexParams,
        options: IndexOptions,
    ) -> Result<()>;

    /// Drop a secondary index by name
    fn drop_index(&self, bucket: &str, index_name: &str) -> Result<()>;

    /// Quote a bucket name for use inside a meta-identifier expression.
    ///
    /// Backtick-quotes the name, doubling any embedded backticks.
    fn quote_bucket_name(&self, bucket: &str) -> String {
        format!("`{}`", bucket.replace('`', "``"))
    }
}
