//! Error types for bucketeer
//!
//! All errors surface through one enum. The facade performs no error
//! translation: whatever a session returns propagates unchanged to the
//! caller. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.

use thiserror::Error;

/// Result type alias for bucketeer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bucket operations
#[derive(Debug, Error)]
pub enum Error {
    /// Session is missing configuration required for the operation
    #[error("session not configured: {0}")]
    Configuration(String),

    /// Backend rejected the operation
    #[error("operation failed: {0}")]
    Operation(String),

    /// Insert collided with an existing document identifier
    #[error("duplicate document id: {0}")]
    DuplicateKey(String),

    /// Bucket name failed validation at handle construction
    #[error("invalid bucket name: {0:?}")]
    InvalidBucketName(String),
}
