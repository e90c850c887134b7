//! Identifier types and identifier sources.
//!
//! Job ids are produced by an injected [`IdSource`]: one instance per
//! process in production ([`UuidIdSource`]) and a deterministic
//! [`SequentialIdSource`] in tests.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Stable identifier of a toolpath job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a job id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a design item in the external item store
///
/// Jobs hold item ids as foreign references; they never own the item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Source of fresh job identifiers
pub trait IdSource: Send + Sync {
    /// Produce a new, never before returned, job id
    fn next_job_id(&self) -> JobId;
}

/// Random v4 UUID identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdSource;

impl UuidIdSource {
    pub fn new() -> Self {
        Self
    }
}

impl IdSource for UuidIdSource {
    fn next_job_id(&self) -> JobId {
        JobId(Uuid::new_v4().to_string())
    }
}

/// Deterministic `<prefix>-<n>` identifiers, starting at 1
#[derive(Debug)]
pub struct SequentialIdSource {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdSource {
    /// Create a sequential source with the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdSource {
    fn default() -> Self {
        Self::new("toolpath")
    }
}

impl IdSource for SequentialIdSource {
    fn next_job_id(&self) -> JobId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        JobId(format!("{}-{}", self.prefix, n))
    }
}
