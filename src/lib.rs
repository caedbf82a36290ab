//! Bucketeer - bucket-scoped facade over a document-store session
//!
//! A [`BucketHandle`] is a named reference to one bucket, bound to a shared
//! [`Session`]. Every operation forwards to the session, scoped by the
//! bucket's name; connection handling, query building, and document encoding
//! all live behind the session trait.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use bucketeer::{BucketHandle, Document, MemorySession};
//! use serde_json::json;
//!
//! # fn main() -> bucketeer::Result<()> {
//! let session = Arc::new(MemorySession::new());
//! let orders = BucketHandle::new(session, "orders")?;
//!
//! let mut doc = Document::new();
//! doc.insert("status".into(), json!("open"));
//! let id = orders.save(doc)?;
//!
//! assert_eq!(orders.count(Default::default(), Default::default())?, 1);
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

pub use bucketeer_client::{BucketHandle, IndexInfo, MemorySession, Session};
pub use bucketeer_core::{
    attach_id, meta_id_expr, take_id, Columns, Condition, CountOptions, DeleteOptions, Document,
    Error, IndexKind, IndexOptions, IndexParams, Result, UpdateOptions, UpdateStrategy, ID_FIELD,
};
