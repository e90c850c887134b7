//! Shared, lockable job handle.
//!
//! The handle is what the rest of the application holds. Result settlement
//! is asynchronous; the job lock is released while the artifact loads, so
//! status reads never wait on file I/O.

use parking_lot::MutexGuard;
use std::sync::Arc;
use toolpathkit_core::{thread_safe, ItemError, JobId, Result, ThreadSafe};
use tracing::{debug, warn};

use crate::config::JobUpdate;
use crate::job::{JobState, Settlement, ToolPathJob};
use crate::loader::ArtifactLoader;
use crate::status::ToolPathStatus;
use crate::task::TaskResult;

#[derive(Clone)]
pub struct JobHandle {
    id: JobId,
    loader: ArtifactLoader,
    job: ThreadSafe<ToolPathJob>,
}

impl JobHandle {
    pub fn new(job: ToolPathJob) -> Self {
        Self {
            id: job.id().clone(),
            loader: job.loader().clone(),
            job: thread_safe(job),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Lock the job for direct access
    ///
    /// Do not hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, ToolPathJob> {
        self.job.lock()
    }

    pub fn status(&self) -> ToolPathStatus {
        self.job.lock().status()
    }

    pub fn state(&self) -> JobState {
        self.job.lock().state()
    }

    pub fn update(&self, update: JobUpdate) -> Result<()> {
        self.job.lock().update(update)
    }

    pub fn submit(&self) -> bool {
        self.job.lock().submit()
    }

    pub fn remove_artifacts(&self) {
        self.job.lock().remove_artifacts();
    }

    pub fn clear_artifacts(&self) {
        self.job.lock().clear_artifacts();
    }

    /// Settle a backend reply
    ///
    /// Completes once the entry is settled, including artifact attachment.
    /// Item failures come back as `Err` after the entry is marked `Failed`;
    /// replies for other jobs or for removed items resolve `Ok` and change
    /// nothing.
    pub async fn on_result(&self, result: TaskResult) -> std::result::Result<(), ItemError> {
        if result.job_id != self.id {
            warn!(job_id = %self.id, reply_job = %result.job_id, "Reply for another tool path ignored");
            return Ok(());
        }

        let settlement = self.job.lock().begin_result(&result.item_id, result.outcome);
        let (file, attempt) = match settlement {
            Settlement::Ignored => return Ok(()),
            Settlement::Failed(error) => return Err(error),
            Settlement::Load { file, attempt } => (file, attempt),
        };

        let loaded = self.loader.load(&file).await;
        self.job.lock().finish_load(&result.item_id, attempt, loaded)
    }

    /// Dispose the job, detaching all of its artifacts
    ///
    /// If other clones of the handle are still alive the job cannot be
    /// dropped; its artifacts are cleared and `false` is returned.
    pub fn dispose(self) -> bool {
        match Arc::try_unwrap(self.job) {
            Ok(job) => {
                job.into_inner().dispose();
                true
            }
            Err(shared) => {
                debug!(job_id = %self.id, "Tool path still shared; clearing artifacts only");
                shared.lock().clear_artifacts();
                false
            }
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle").field("id", &self.id).finish()
    }
}
