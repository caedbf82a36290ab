//! MemorySession: in-process session implementation
//!
//! A complete [`Session`] over `RwLock`-guarded in-memory state, used by the
//! integration tests and embeddable anywhere a real connection is overkill.
//! It is not a query engine: conditions are field-equality matches, indexes
//! are registry entries that only track their build state, and nothing is
//! persisted.
//!
//! ## Semantics
//!
//! - Buckets are created lazily on first write; reads against an unknown
//!   bucket see zero documents.
//! - The document identifier is a meta attribute, stored next to the
//!   document rather than inside it. A string `_id` in an inserted payload
//!   becomes that attribute.
//! - A condition key of the form ``META(`bucket`).id`` matches against the
//!   stored identifier instead of a document field.
//! - Honored options: update strategy, delete/count limits,
//!   `ignore_if_exists`, and `defer_build`. `num_replicas` and the index
//!   `using` kind are recorded or ignored as backend-only concerns; they
//!   change nothing in-process.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use bucketeer_core::{
    meta_id_expr, take_id, Columns, Condition, CountOptions, DeleteOptions, Document, Error,
    IndexKind, IndexOptions, IndexParams, Result, UpdateOptions, UpdateStrategy, ID_FIELD,
};

use crate::session::Session;

/// Registered secondary index
#[derive(Debug, Clone)]
struct IndexSpec {
    columns: Vec<String>,
    condition: Option<Condition>,
    kind: IndexKind,
    built: bool,
}

/// Registered primary index
#[derive(Debug, Clone)]
struct PrimaryIndex {
    name: String,
    built: bool,
}

/// Default primary index name when the caller supplies none
const DEFAULT_PRIMARY_NAME: &str = "#primary";

/// Snapshot of a registered index, as returned by
/// [`MemorySession::list_indexes`]
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    /// Index name
    pub name: String,
    /// Indexed columns; empty for a primary index
    pub columns: Vec<String>,
    /// Filter condition, when the index is partial
    pub condition: Option<Condition>,
    /// Backing implementation
    pub kind: IndexKind,
    /// Whether the index has been built (false while deferred)
    pub built: bool,
    /// Whether this is the bucket's primary index
    pub primary: bool,
}

#[derive(Debug, Default)]
struct BucketState {
    docs: BTreeMap<String, Document>,
    primary: Option<PrimaryIndex>,
    indexes: BTreeMap<String, IndexSpec>,
}

impl BucketState {
    /// Whether `doc` (stored under `id`) matches every entry of `condition`.
    ///
    /// `meta_key` is the meta-identifier expression for the owning bucket; a
    /// condition entry under that key compares against `id` rather than a
    /// document field. An empty condition matches everything.
    fn matches(id: &str, doc: &Document, condition: &Condition, meta_key: &str) -> bool {
        condition.iter().all(|(key, expected)| {
            if key == meta_key {
                matches!(expected, Value::String(s) if s == id)
            } else {
                doc.get(key) == Some(expected)
            }
        })
    }
}

/// In-memory document store implementing [`Session`]
///
/// Internally synchronized; one instance can back any number of handles
/// across threads.
#[derive(Debug, Default)]
pub struct MemorySession {
    buckets: RwLock<BTreeMap<String, BucketState>>,
}

impl MemorySession {
    /// Create an empty session with no buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `bucket`
    pub fn len(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .get(bucket)
            .map_or(0, |b| b.docs.len())
    }

    /// Whether `bucket` holds no documents (or does not exist)
    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    /// Fetch a stored document by identifier
    pub fn get(&self, bucket: &str, id: &str) -> Option<Document> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|b| b.docs.get(id).cloned())
    }

    /// Indexes registered on `bucket`, primary first, secondaries in name
    /// order. Empty when the bucket does not exist.
    pub fn list_indexes(&self, bucket: &str) -> Vec<IndexInfo> {
        let buckets = self.buckets.read();
        let Some(state) = buckets.get(bucket) else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(state.indexes.len() + 1);
        if let Some(primary) = &state.primary {
            out.push(IndexInfo {
                name: primary.name.clone(),
                columns: Vec::new(),
                condition: None,
                kind: IndexKind::Gsi,
                built: primary.built,
                primary: true,
            });
        }
        for (name, spec) in &state.indexes {
            out.push(IndexInfo {
                name: name.clone(),
                columns: spec.columns.clone(),
                condition: spec.condition.clone(),
                kind: spec.kind,
                built: spec.built,
                primary: false,
            });
        }
        out
    }

    fn meta_key(&self, bucket: &str) -> String {
        meta_id_expr(&self.quote_bucket_name(bucket))
    }

    /// Insert one document into an already-locked bucket map
    fn insert_locked(
        buckets: &mut BTreeMap<String, BucketState>,
        bucket: &str,
        mut doc: Document,
    ) -> Result<String> {
        let state = buckets.entry(bucket.to_string()).or_insert_with(|| {
            debug!(bucket, "creating bucket on first write");
            BucketState::default()
        });
        let id = match take_id(&mut doc) {
            Some(id) => {
                if state.docs.contains_key(&id) {
                    return Err(Error::DuplicateKey(id));
                }
                id
            }
            None => Uuid::new_v4().to_string(),
        };
        state.docs.insert(id.clone(), doc);
        Ok(id)
    }
}

impl Session for MemorySession {
    fn drop_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        if buckets.remove(bucket).is_none() {
            return Err(Error::Operation(format!("unknown bucket {bucket:?}")));
        }
        info!(bucket, "dropped bucket");
        Ok(())
    }

    fn insert(&self, bucket: &str, doc: Document) -> Result<String> {
        let mut buckets = self.buckets.write();
        Self::insert_locked(&mut buckets, bucket, doc)
    }

    fn batch_insert(&self, bucket: &str, docs: Vec<Document>) -> Result<Vec<String>> {
        let mut buckets = self.buckets.write();
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            ids.push(Self::insert_locked(&mut buckets, bucket, doc)?);
        }
        Ok(ids)
    }

    fn update(
        &self,
        bucket: &str,
        columns: Columns,
        condition: Condition,
        options: UpdateOptions,
    ) -> Result<u64> {
        let meta_key = self.meta_key(bucket);
        let strategy = options.strategy.unwrap_or(UpdateStrategy::Set);
        let mut buckets = self.buckets.write();
        let Some(state) = buckets.get_mut(bucket) else {
            return Ok(0);
        };

        let mut updated = 0u64;
        for (id, doc) in state.docs.iter_mut() {
            if !BucketState::matches(id, doc, &condition, &meta_key) {
                continue;
            }
            match strategy {
                UpdateStrategy::Set => {
                    for (key, value) in &columns {
                        doc.insert(key.clone(), value.clone());
                    }
                }
                UpdateStrategy::Unset => {
                    for key in columns.keys() {
                        doc.remove(key);
                    }
                }
            }
            updated += 1;
        }
        Ok(updated)
    }

    fn upsert(&self, bucket: &str, id: &str, mut doc: Document) -> Result<()> {
        // The identifier is meta, never document content
        doc.remove(ID_FIELD);
        let mut buckets = self.buckets.write();
        let state = buckets.entry(bucket.to_string()).or_insert_with(|| {
            debug!(bucket, "creating bucket on first write");
            BucketState::default()
        });
        state.docs.insert(id.to_string(), doc);
        Ok(())
    }

    fn delete(&self, bucket: &str, condition: Condition, options: DeleteOptions) -> Result<u64> {
        let meta_key = self.meta_key(bucket);
        let mut buckets = self.buckets.write();
        let Some(state) = buckets.get_mut(bucket) else {
            return Ok(0);
        };

        let mut doomed: Vec<String> = state
            .docs
            .iter()
            .filter(|(id, doc)| BucketState::matches(id, doc, &condition, &meta_key))
            .map(|(id, _)| id.clone())
            .collect();
        if let Some(limit) = options.limit {
            doomed.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        for id in &doomed {
            state.docs.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    fn count(&self, bucket: &str, condition: Condition, options: CountOptions) -> Result<u64> {
        let meta_key = self.meta_key(bucket);
        let buckets = self.buckets.read();
        let Some(state) = buckets.get(bucket) else {
            return Ok(0);
        };

        let matched = state
            .docs
            .iter()
            .filter(|(id, doc)| BucketState::matches(id, doc, &condition, &meta_key))
            .count() as u64;
        Ok(match options.limit {
            Some(limit) => matched.min(limit),
            None => matched,
        })
    }

    fn build_index(&self, bucket: &str, index_names: Vec<String>) -> Result<()> {
        let mut buckets = self.buckets.write();
        let Some(state) = buckets.get_mut(bucket) else {
            return Err(Error::Operation(format!("unknown bucket {bucket:?}")));
        };

        // Validate the whole list before touching any build state, so an
        // unknown name cannot leave a partial batch built
        for name in &index_names {
            let known = state.indexes.contains_key(name)
                || matches!(&state.primary, Some(p) if p.name == *name);
            if !known {
                return Err(Error::Operation(format!(
                    "unknown index {name:?} on bucket {bucket:?}"
                )));
            }
        }

        for name in index_names {
            if let Some(index) = state.indexes.get_mut(&name) {
                index.built = true;
            } else if let Some(primary) = state.primary.as_mut() {
                primary.built = true;
            }
            info!(bucket, index = %name, "built index");
        }
        Ok(())
    }

    fn create_primary_index(
        &self,
        bucket: &str,
        index_name: Option<String>,
        options: IndexOptions,
    ) -> Result<()> {
        let name = index_name.unwrap_or_else(|| DEFAULT_PRIMARY_NAME.to_string());
        let mut buckets = self.buckets.write();
        let state = buckets.entry(bucket.to_string()).or_default();

        if state.primary.is_some() {
            if options.ignore_if_exists {
                return Ok(());
            }
            return Err(Error::Operation(format!(
                "primary index already exists on bucket {bucket:?}"
            )));
        }
        state.primary = Some(PrimaryIndex {
            name: name.clone(),
            built: !options.defer_build,
        });
        info!(bucket, index = %name, deferred = options.defer_build, "created primary index");
        Ok(())
    }

    fn drop_primary_index(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        let Some(state) = buckets.get_mut(bucket) else {
            return Err(Error::Operation(format!("unknown bucket {bucket:?}")));
        };
        if state.primary.take().is_none() {
            return Err(Error::Operation(format!(
                "no primary index on bucket {bucket:?}"
            )));
        }
        info!(bucket, "dropped primary index");
        Ok(())
    }

    fn create_index(
        &self,
        bucket: &str,
        index_name: &str,
        columns: Vec<String>,
        condition: Option<Condition>,
        params: IndexParams,
        options: IndexOptions,
    ) -> Result<()> {
        let mut buckets = self.buckets.write();
        let state = buckets.entry(bucket.to_string()).or_default();

        if state.indexes.contains_key(index_name) {
            if options.ignore_if_exists {
                return Ok(());
            }
            return Err(Error::Operation(format!(
                "index {index_name:?} already exists on bucket {bucket:?}"
            )));
        }
        state.indexes.insert(
            index_name.to_string(),
            IndexSpec {
                columns,
                condition,
                kind: params.using,
                built: !options.defer_build,
            },
        );
        info!(bucket, index = index_name, deferred = options.defer_build, "created index");
        Ok(())
    }

    fn drop_index(&self, bucket: &str, index_name: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        let Some(state) = buckets.get_mut(bucket) else {
            return Err(Error::Operation(format!("unknown bucket {bucket:?}")));
        };
        if state.indexes.remove(index_name).is_none() {
            return Err(Error::Operation(format!(
                "unknown index {index_name:?} on bucket {bucket:?}"
            )));
        }
        info!(bucket, index = index_name, "dropped index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemorySession>();
    }

    #[test]
    fn test_insert_generates_distinct_ids() {
        let s = MemorySession::new();
        let a = s.insert("b", doc(json!({"x": 1}))).unwrap();
        let b = s.insert("b", doc(json!({"x": 2}))).unwrap();
        assert_ne!(a, b);
        assert_eq!(s.len("b"), 2);
    }

    #[test]
    fn test_insert_honors_supplied_id() {
        let s = MemorySession::new();
        let id = s.insert("b", doc(json!({"_id": "k1", "x": 1}))).unwrap();
        assert_eq!(id, "k1");
        // The id is meta, not content
        assert_eq!(s.get("b", "k1"), Some(doc(json!({"x": 1}))));
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let s = MemorySession::new();
        s.insert("b", doc(json!({"_id": "k1"}))).unwrap();
        let err = s.insert("b", doc(json!({"_id": "k1"}))).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(id) if id == "k1"));
    }

    #[test]
    fn test_batch_insert_returns_ids_in_order() {
        let s = MemorySession::new();
        let ids = s
            .batch_insert(
                "b",
                vec![
                    doc(json!({"_id": "a"})),
                    doc(json!({"_id": "b"})),
                    doc(json!({"_id": "c"})),
                ],
            )
            .unwrap();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_upsert_inserts_then_replaces() {
        let s = MemorySession::new();
        s.upsert("b", "k1", doc(json!({"x": 1}))).unwrap();
        assert_eq!(s.get("b", "k1"), Some(doc(json!({"x": 1}))));

        s.upsert("b", "k1", doc(json!({"y": 2}))).unwrap();
        assert_eq!(s.get("b", "k1"), Some(doc(json!({"y": 2}))));
        assert_eq!(s.len("b"), 1);
    }

    #[test]
    fn test_update_defaults_to_set_strategy() {
        let s = MemorySession::new();
        s.upsert("b", "k1", doc(json!({"kind": "book", "price": 10})))
            .unwrap();
        s.upsert("b", "k2", doc(json!({"kind": "toy", "price": 5})))
            .unwrap();

        let n = s
            .update(
                "b",
                doc(json!({"price": 12})),
                doc(json!({"kind": "book"})),
                UpdateOptions::default(),
            )
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(s.get("b", "k1"), Some(doc(json!({"kind": "book", "price": 12}))));
        assert_eq!(s.get("b", "k2"), Some(doc(json!({"kind": "toy", "price": 5}))));
    }

    #[test]
    fn test_update_unset_removes_fields() {
        let s = MemorySession::new();
        s.upsert("b", "k1", doc(json!({"keep": 1, "drop": 2}))).unwrap();

        let n = s
            .update(
                "b",
                doc(json!({"drop": null})),
                Condition::new(),
                UpdateOptions {
                    strategy: Some(UpdateStrategy::Unset),
                },
            )
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(s.get("b", "k1"), Some(doc(json!({"keep": 1}))));
    }

    #[test]
    fn test_update_by_meta_id_condition() {
        let s = MemorySession::new();
        s.upsert("b", "k1", doc(json!({"x": 1}))).unwrap();
        s.upsert("b", "k2", doc(json!({"x": 1}))).unwrap();

        let n = s
            .update(
                "b",
                doc(json!({"x": 9})),
                doc(json!({"META(`b`).id": "k2"})),
                UpdateOptions::default(),
            )
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(s.get("b", "k1"), Some(doc(json!({"x": 1}))));
        assert_eq!(s.get("b", "k2"), Some(doc(json!({"x": 9}))));
    }

    #[test]
    fn test_update_unknown_bucket_matches_nothing() {
        let s = MemorySession::new();
        let n = s
            .update(
                "nope",
                doc(json!({"x": 1})),
                Condition::new(),
                UpdateOptions::default(),
            )
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_delete_with_condition_and_limit() {
        let s = MemorySession::new();
        for i in 0..4 {
            s.upsert("b", &format!("k{i}"), doc(json!({"kind": "x"})))
                .unwrap();
        }
        s.upsert("b", "other", doc(json!({"kind": "y"}))).unwrap();

        let n = s
            .delete(
                "b",
                doc(json!({"kind": "x"})),
                DeleteOptions { limit: Some(3) },
            )
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(s.len("b"), 2);

        // Empty condition sweeps the rest
        let n = s.delete("b", Condition::new(), DeleteOptions::default()).unwrap();
        assert_eq!(n, 2);
        assert!(s.is_empty("b"));
    }

    #[test]
    fn test_count_with_condition_and_limit() {
        let s = MemorySession::new();
        for i in 0..5 {
            s.upsert("b", &format!("k{i}"), doc(json!({"kind": "x"})))
                .unwrap();
        }

        assert_eq!(
            s.count("b", doc(json!({"kind": "x"})), CountOptions::default())
                .unwrap(),
            5
        );
        assert_eq!(
            s.count("b", Condition::new(), CountOptions { limit: Some(2) })
                .unwrap(),
            2
        );
        assert_eq!(
            s.count("b", doc(json!({"kind": "zzz"})), CountOptions::default())
                .unwrap(),
            0
        );
        assert_eq!(
            s.count("unknown", Condition::new(), CountOptions::default())
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_drop_bucket_removes_everything() {
        let s = MemorySession::new();
        s.upsert("b", "k1", doc(json!({"x": 1}))).unwrap();
        s.drop_bucket("b").unwrap();
        assert!(s.is_empty("b"));

        let err = s.drop_bucket("b").unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
    }

    #[test]
    fn test_primary_index_lifecycle() {
        let s = MemorySession::new();
        s.create_primary_index("b", None, IndexOptions::default())
            .unwrap();

        // Second create fails unless ignored
        assert!(s
            .create_primary_index("b", None, IndexOptions::default())
            .is_err());
        s.create_primary_index(
            "b",
            None,
            IndexOptions {
                ignore_if_exists: true,
                ..Default::default()
            },
        )
        .unwrap();

        s.drop_primary_index("b").unwrap();
        assert!(s.drop_primary_index("b").is_err());
    }

    #[test]
    fn test_secondary_index_lifecycle_with_deferred_build() {
        let s = MemorySession::new();
        s.create_index(
            "b",
            "ix_name",
            vec!["name".to_string()],
            None,
            IndexParams::default(),
            IndexOptions {
                defer_build: true,
                ..Default::default()
            },
        )
        .unwrap();

        // Duplicate creation honors ignore_if_exists
        assert!(s
            .create_index(
                "b",
                "ix_name",
                vec!["name".to_string()],
                None,
                IndexParams::default(),
                IndexOptions::default(),
            )
            .is_err());
        s.create_index(
            "b",
            "ix_name",
            vec!["name".to_string()],
            None,
            IndexParams::default(),
            IndexOptions {
                ignore_if_exists: true,
                ..Default::default()
            },
        )
        .unwrap();

        let info = &s.list_indexes("b")[0];
        assert_eq!(info.name, "ix_name");
        assert_eq!(info.columns, ["name"]);
        assert_eq!(info.kind, IndexKind::Gsi);
        assert!(!info.built);
        assert!(!info.primary);

        s.build_index("b", vec!["ix_name".to_string()]).unwrap();
        assert!(s.list_indexes("b")[0].built);
        assert!(s.build_index("b", vec!["missing".to_string()]).is_err());

        s.drop_index("b", "ix_name").unwrap();
        assert!(s.drop_index("b", "ix_name").is_err());
    }

    #[test]
    fn test_build_index_unknown_name_leaves_batch_unbuilt() {
        let s = MemorySession::new();
        s.create_index(
            "b",
            "ix_a",
            vec!["a".to_string()],
            None,
            IndexParams::default(),
            IndexOptions {
                defer_build: true,
                ..Default::default()
            },
        )
        .unwrap();

        let err = s
            .build_index("b", vec!["ix_a".to_string(), "missing".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::Operation(_)));

        // ix_a came first in the list but must not have been built
        assert!(!s.list_indexes("b")[0].built);
    }

    #[test]
    fn test_delete_limit_beyond_usize_means_unbounded() {
        let s = MemorySession::new();
        for i in 0..3 {
            s.upsert("b", &format!("k{i}"), doc(json!({"x": 1}))).unwrap();
        }

        let n = s
            .delete(
                "b",
                Condition::new(),
                DeleteOptions {
                    limit: Some(u64::MAX),
                },
            )
            .unwrap();
        assert_eq!(n, 3);
        assert!(s.is_empty("b"));
    }

    #[test]
    fn test_build_index_builds_deferred_primary() {
        let s = MemorySession::new();
        s.create_primary_index(
            "b",
            Some("primary".to_string()),
            IndexOptions {
                defer_build: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!s.list_indexes("b")[0].built);

        s.build_index("b", vec!["primary".to_string()]).unwrap();
        let info = &s.list_indexes("b")[0];
        assert!(info.built);
        assert!(info.primary);
    }

    #[test]
    fn test_list_indexes_unknown_bucket_is_empty() {
        let s = MemorySession::new();
        assert!(s.list_indexes("nope").is_empty());
    }

    #[test]
    fn test_quote_bucket_name_for_meta_key() {
        let s = MemorySession::new();
        assert_eq!(s.quote_bucket_name("orders"), "`orders`");
        assert_eq!(s.meta_key("orders"), "META(`orders`).id");
    }
}
