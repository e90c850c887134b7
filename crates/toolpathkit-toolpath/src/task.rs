//! Backend task requests and replies.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use toolpathkit_core::{ItemError, ItemId, JobId};

use crate::fingerprint::TaskDescriptor;
use crate::item::{HeadType, ToolPathKind};

/// One generation task, for one item of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(rename = "taskId")]
    pub job_id: JobId,
    #[serde(rename = "modelID")]
    pub item_id: ItemId,
    pub head_type: HeadType,
    #[serde(rename = "type")]
    pub kind: ToolPathKind,
    /// Item descriptor merged with the job's configuration
    pub data: TaskDescriptor,
}

/// External computation service
///
/// Dispatch is fire-and-forget: the reply arrives later as a [`TaskResult`].
/// An `Err` means the backend refused the task outright and no reply will
/// follow.
pub trait ComputationBackend: Send + Sync {
    fn submit_task(&self, request: TaskRequest) -> Result<(), ItemError>;
}

/// Backend adapter that forwards requests over a tokio channel
///
/// The receiving half belongs to whatever drives the real computation
/// service.
#[derive(Debug, Clone)]
pub struct ChannelBackend {
    sender: mpsc::UnboundedSender<TaskRequest>,
}

impl ChannelBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TaskRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ComputationBackend for ChannelBackend {
    fn submit_task(&self, request: TaskRequest) -> Result<(), ItemError> {
        let item_id = request.item_id.clone();
        self.sender
            .send(request)
            .map_err(|_| ItemError::BackendFailure {
                item_id,
                reason: "backend channel closed".to_string(),
            })
    }
}

/// Outcome reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskOutcome {
    Success {
        /// Result-file reference
        file: String,
    },
    Failed {
        #[serde(default)]
        reason: String,
    },
}

/// A backend reply, correlated to its request by job id and item id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    #[serde(rename = "taskId")]
    pub job_id: JobId,
    #[serde(rename = "modelID")]
    pub item_id: ItemId,
    pub outcome: TaskOutcome,
}

impl TaskResult {
    pub fn success(
        job_id: impl Into<JobId>,
        item_id: impl Into<ItemId>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            item_id: item_id.into(),
            outcome: TaskOutcome::Success { file: file.into() },
        }
    }

    pub fn failed(
        job_id: impl Into<JobId>,
        item_id: impl Into<ItemId>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            item_id: item_id.into(),
            outcome: TaskOutcome::Failed {
                reason: reason.into(),
            },
        }
    }
}
