//! Type aliases for commonly used complex types.
//!
//! Jobs are shared between the application thread and the tasks that
//! settle backend results, so the shared wrappers here are all thread-safe
//! and built on `parking_lot` locks.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolpathkit_core::types::*;
//!
//! // Instead of: Arc<parking_lot::Mutex<ToolPathJob>>
//! let job: ThreadSafe<ToolPathJob> = thread_safe(job);
//! job.lock().submit();
//! ```

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex`; guards must not be held across `.await`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe reader-writer lock wrapper for read-heavy workloads.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create a new `ThreadSafeRw<T>` from a value.
#[inline]
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}
