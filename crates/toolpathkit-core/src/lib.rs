//! # ToolpathKit Core
//!
//! Core types, traits, and utilities for ToolpathKit.
//! Provides the identifier types, the error taxonomy shared by the
//! toolpath job subsystem, and the event bus used to notify observers
//! of job state changes.

pub mod error;
pub mod event_bus;
pub mod ids;
pub mod status;
pub mod types;

pub use error::{Error, ItemError, JobError, Result};

pub use ids::{IdSource, ItemId, JobId, SequentialIdSource, UuidIdSource};

pub use status::ToolPathStatus;

// Re-export event bus for convenience
pub use event_bus::{
    AppEvent, EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter, JobEvent,
    SceneEvent, SubscriptionId, TaskEvent,
};

// Re-export type aliases for convenience
pub use types::{thread_safe, thread_safe_rw, ThreadSafe, ThreadSafeRw};
