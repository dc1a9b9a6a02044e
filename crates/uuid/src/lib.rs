//! Record identifier utilities.
//!
//! Carelink patient records are owned by the storage collaborator and referenced by the core
//! only through a [`RecordId`]. The identifier doubles as the logical id of the wire resource,
//! so it uses a *canonical* representation: **32 lowercase hexadecimal characters** (no
//! hyphens).
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected by
//! [`RecordId::parse`]. A resource whose id is not canonical therefore never matches a
//! stored record.

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
