//! Error handling for ToolpathKit
//!
//! Provides the error types for the toolpath job subsystem:
//! - Job errors (fatal to a job as a whole, detected while fingerprinting)
//! - Item errors (local to one item: backend, fetch, or parse failures)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::ids::{ItemId, JobId};

/// Job-level error type
///
/// Raised while fingerprinting a job. These indicate caller-side misuse
/// and are never retried automatically; the job status becomes `Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job has no items that can be described
    #[error("The items of tool path {job_id} are empty")]
    EmptyItemSet {
        /// The job that has no items.
        job_id: JobId,
    },

    /// The items of the job are not all of the job's own kind
    #[error("Inconsistent item kinds for tool path {job_id}: expected {expected}, found [{}]", .found.join(", "))]
    InconsistentDiscriminator {
        /// The job whose items disagree.
        job_id: JobId,
        /// The kind the job was created for.
        expected: String,
        /// The distinct kinds found among the job's items.
        found: Vec<String>,
    },
}

/// Per-item error type
///
/// Local to a single item entry: sibling entries are left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// The computation backend reported a failure, or refused the task
    #[error("Backend failed to generate tool path for item {item_id}: {reason}")]
    BackendFailure {
        /// The item the task was for.
        item_id: ItemId,
        /// The reason reported by the backend.
        reason: String,
    },

    /// The generated result file could not be fetched
    #[error("Failed to fetch tool path file {file}: {reason}")]
    ArtifactFetchFailure {
        /// The result-file reference.
        file: String,
        /// The reason the fetch failed.
        reason: String,
    },

    /// The generated result file could not be parsed
    #[error("Failed to parse tool path file {file}: {reason}")]
    ArtifactParseFailure {
        /// The result-file reference.
        file: String,
        /// The reason the parse failed.
        reason: String,
    },
}

/// Main error type for ToolpathKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Job-level error
    #[error(transparent)]
    Job(#[from] JobError),

    /// Per-item error
    #[error(transparent)]
    Item(#[from] ItemError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error is fatal to a whole job
    pub fn is_job_error(&self) -> bool {
        matches!(self, Error::Job(_))
    }

    /// Check if this error is local to one item
    pub fn is_item_error(&self) -> bool {
        matches!(self, Error::Item(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
