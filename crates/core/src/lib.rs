//! Core types for the bucketeer document-store facade
//!
//! This crate defines:
//! - The document model: insertion-ordered JSON maps ([`Document`],
//!   [`Columns`], [`Condition`]) and the `_id` helpers
//! - The error taxonomy ([`Error`], [`Result`])
//! - Per-operation option structs with documented defaults

pub mod document;
pub mod error;
pub mod options;

pub use document::{attach_id, meta_id_expr, take_id, Columns, Condition, Document, ID_FIELD};
pub use error::{Error, Result};
pub use options::{
    CountOptions, DeleteOptions, IndexKind, IndexOptions, IndexParams, UpdateOptions,
    UpdateStrategy,
};
