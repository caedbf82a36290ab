//! Bucket facade and session seam
//!
//! This crate provides:
//! - [`Session`]: the trait a connection collaborator implements (network
//!   transport, query compilation, and document encoding all live behind it)
//! - [`BucketHandle`]: a name-scoped, stateless facade that forwards every
//!   operation to a shared session
//! - [`MemorySession`]: an in-process session for embedded use and tests

pub mod bucket;
pub mod memory;
pub mod session;

pub use bucket::BucketHandle;
pub use memory::{IndexInfo, MemorySession};
pub use session::Session;
