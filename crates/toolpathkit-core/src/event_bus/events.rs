//! Event type definitions for the event bus.
//!
//! Events are organized by category: job lifecycle, backend tasks, and
//! scene attachment. They are cloneable and serializable for logging/replay.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, JobId};
use crate::status::ToolPathStatus;

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Job lifecycle and status
    Job(JobEvent),
    /// Backend task dispatch and settlement
    Task(TaskEvent),
    /// Artifact attachment in a job's scene
    Scene(SceneEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Job(_) => EventCategory::Job,
            AppEvent::Task(_) => EventCategory::Task,
            AppEvent::Scene(_) => EventCategory::Scene,
        }
    }

    /// The job this event concerns
    pub fn job_id(&self) -> &JobId {
        match self {
            AppEvent::Job(e) => e.job_id(),
            AppEvent::Task(e) => e.job_id(),
            AppEvent::Scene(e) => e.job_id(),
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Job(e) => e.description(),
            AppEvent::Task(e) => e.description(),
            AppEvent::Scene(e) => e.description(),
        }
    }
}

impl From<JobEvent> for AppEvent {
    fn from(event: JobEvent) -> Self {
        AppEvent::Job(event)
    }
}

impl From<TaskEvent> for AppEvent {
    fn from(event: TaskEvent) -> Self {
        AppEvent::Task(event)
    }
}

impl From<SceneEvent> for AppEvent {
    fn from(event: SceneEvent) -> Self {
        AppEvent::Scene(event)
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Job lifecycle events.
    Job,
    /// Backend task events.
    Task,
    /// Scene attachment events.
    Scene,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Job => write!(f, "Job"),
            EventCategory::Task => write!(f, "Task"),
            EventCategory::Scene => write!(f, "Scene"),
        }
    }
}

/// Job lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobEvent {
    /// A job was created.
    Created {
        /// The new job.
        job_id: JobId,
        /// Number of items grouped into the job.
        item_count: usize,
    },
    /// The job-level status changed.
    StatusChanged {
        /// The job whose status changed.
        job_id: JobId,
        /// Previous status.
        from: ToolPathStatus,
        /// New status.
        to: ToolPathStatus,
    },
    /// The job's fingerprint changed; previous results are stale.
    BecameStale {
        /// The stale job.
        job_id: JobId,
    },
    /// The job was disposed and its artifacts detached.
    Disposed {
        /// The disposed job.
        job_id: JobId,
    },
}

impl JobEvent {
    fn job_id(&self) -> &JobId {
        match self {
            JobEvent::Created { job_id, .. }
            | JobEvent::StatusChanged { job_id, .. }
            | JobEvent::BecameStale { job_id }
            | JobEvent::Disposed { job_id } => job_id,
        }
    }

    fn description(&self) -> String {
        match self {
            JobEvent::Created { job_id, item_count } => {
                format!("Tool path {} created with {} item(s)", job_id, item_count)
            }
            JobEvent::StatusChanged { job_id, from, to } => {
                format!("Tool path {} status: {} -> {}", job_id, from, to)
            }
            JobEvent::BecameStale { job_id } => format!("Tool path {} is stale", job_id),
            JobEvent::Disposed { job_id } => format!("Tool path {} disposed", job_id),
        }
    }
}

/// Backend task events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskEvent {
    /// A generation task was handed to the backend.
    Dispatched {
        /// Owning job.
        job_id: JobId,
        /// Item the task generates.
        item_id: ItemId,
    },
    /// The backend reported success and the artifact was attached.
    Succeeded {
        /// Owning job.
        job_id: JobId,
        /// Item that was generated.
        item_id: ItemId,
        /// Result-file reference.
        file: String,
    },
    /// The task failed at the backend, during fetch, or during parse.
    Failed {
        /// Owning job.
        job_id: JobId,
        /// Item that failed.
        item_id: ItemId,
        /// Error message.
        error: String,
    },
}

impl TaskEvent {
    fn job_id(&self) -> &JobId {
        match self {
            TaskEvent::Dispatched { job_id, .. }
            | TaskEvent::Succeeded { job_id, .. }
            | TaskEvent::Failed { job_id, .. } => job_id,
        }
    }

    fn description(&self) -> String {
        match self {
            TaskEvent::Dispatched { job_id, item_id } => {
                format!("Task {}/{} dispatched", job_id, item_id)
            }
            TaskEvent::Succeeded {
                job_id,
                item_id,
                file,
            } => format!("Task {}/{} succeeded: {}", job_id, item_id, file),
            TaskEvent::Failed {
                job_id,
                item_id,
                error,
            } => format!("Task {}/{} failed: {}", job_id, item_id, error),
        }
    }
}

/// Scene attachment events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// An artifact was attached to the job's scene container.
    Attached {
        /// Owning job.
        job_id: JobId,
        /// Item the artifact belongs to.
        item_id: ItemId,
        /// Raw value of the artifact handle.
        handle: u64,
    },
    /// An artifact was detached from the job's scene container.
    Detached {
        /// Owning job.
        job_id: JobId,
        /// Raw value of the artifact handle.
        handle: u64,
    },
    /// The scene container visibility was toggled.
    VisibilityChanged {
        /// Owning job.
        job_id: JobId,
        /// New visibility.
        visible: bool,
    },
}

impl SceneEvent {
    fn job_id(&self) -> &JobId {
        match self {
            SceneEvent::Attached { job_id, .. }
            | SceneEvent::Detached { job_id, .. }
            | SceneEvent::VisibilityChanged { job_id, .. } => job_id,
        }
    }

    fn description(&self) -> String {
        match self {
            SceneEvent::Attached {
                job_id,
                item_id,
                handle,
            } => format!("Artifact #{} attached to {} for {}", handle, job_id, item_id),
            SceneEvent::Detached { job_id, handle } => {
                format!("Artifact #{} detached from {}", handle, job_id)
            }
            SceneEvent::VisibilityChanged { job_id, visible } => format!(
                "Tool path {} {}",
                job_id,
                if *visible { "shown" } else { "hidden" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_job_id() {
        let event = AppEvent::Task(TaskEvent::Dispatched {
            job_id: JobId::from("tp-1"),
            item_id: ItemId::from("a"),
        });
        assert_eq!(event.category(), EventCategory::Task);
        assert_eq!(event.job_id().as_str(), "tp-1");
        assert_eq!(event.description(), "Task tp-1/a dispatched");
    }

    #[test]
    fn test_status_change_description() {
        let event = AppEvent::Job(JobEvent::StatusChanged {
            job_id: JobId::from("tp-1"),
            from: ToolPathStatus::Running,
            to: ToolPathStatus::Failed,
        });
        assert_eq!(event.description(), "Tool path tp-1 status: running -> failed");
    }
}
