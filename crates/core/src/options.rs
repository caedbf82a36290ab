//! Per-operation option structs
//!
//! Every optional parameter of the bucket surface is an explicit struct with
//! named fields and documented defaults. All of them derive `Default`, so
//! call sites that want stock behavior pass `..Default::default()` or the
//! bare default.

use serde::{Deserialize, Serialize};

/// How an update applies its columns to matching documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStrategy {
    /// Replace the named fields with the supplied values
    Set,
    /// Remove the named fields; supplied values are ignored
    Unset,
}

/// Options for `update`
///
/// `strategy` defaults to `None`, which the session interprets as
/// [`UpdateStrategy::Set`]. That default lives in the session contract, not
/// in the facade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Update strategy; sessions default unset to `Set`
    pub strategy: Option<UpdateStrategy>,
}

/// Options for `delete`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Maximum number of documents to remove; default unbounded
    pub limit: Option<u64>,
}

/// Options for `count`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountOptions {
    /// Cap on the reported count; default unbounded
    pub limit: Option<u64>,
}

/// Backing index implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Global secondary index (the default)
    #[default]
    Gsi,
    /// Map-reduce view index
    View,
}

/// Placement parameters for `create_index`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Index implementation to build on; defaults to [`IndexKind::Gsi`]
    pub using: IndexKind,
}

/// Options for index DDL operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Succeed silently when the index already exists; default `false`
    pub ignore_if_exists: bool,
    /// Register the index without building it; built later by `build_index`.
    /// Default `false`
    pub defer_build: bool,
    /// Number of index replicas; default backend-chosen
    pub num_replicas: Option<u32>,
}
