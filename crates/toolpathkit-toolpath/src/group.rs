//! Ordered registry of the jobs of one machine head.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use toolpathkit_core::{ItemError, JobId};
use tracing::{debug, info, warn};

use crate::handle::JobHandle;
use crate::job::{JobOptions, JobServices, ToolPathJob};
use crate::task::TaskResult;

pub struct ToolPathGroup {
    services: JobServices,
    jobs: RwLock<Vec<JobHandle>>,
}

impl ToolPathGroup {
    pub fn new(services: JobServices) -> Self {
        Self {
            services,
            jobs: RwLock::new(Vec::new()),
        }
    }

    pub fn services(&self) -> &JobServices {
        &self.services
    }

    /// Create a job with the group's services and append it
    pub fn create(&self, options: JobOptions) -> JobHandle {
        let handle = JobHandle::new(ToolPathJob::new(options, self.services.clone()));
        self.jobs.write().push(handle.clone());
        handle
    }

    pub fn get(&self, id: &JobId) -> Option<JobHandle> {
        self.jobs.read().iter().find(|job| job.id() == id).cloned()
    }

    /// Jobs in creation order
    pub fn jobs(&self) -> Vec<JobHandle> {
        self.jobs.read().clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Remove and dispose a job; returns false if it was not registered
    pub fn remove(&self, id: &JobId) -> bool {
        let removed = {
            let mut jobs = self.jobs.write();
            jobs.iter()
                .position(|job| job.id() == id)
                .map(|pos| jobs.remove(pos))
        };
        match removed {
            Some(handle) => {
                handle.dispose();
                true
            }
            None => false,
        }
    }

    /// Submit every job included in batch; returns how many dispatched work
    pub fn submit_all(&self) -> usize {
        let submitted = self
            .jobs()
            .iter()
            .filter(|job| job.lock().check())
            .filter(|job| job.submit())
            .count();
        info!(submitted, "Batch submission finished");
        submitted
    }

    /// Deliver a backend reply to the job it belongs to
    ///
    /// Replies for unknown jobs are ignored.
    pub async fn route_result(&self, result: TaskResult) -> Result<(), ItemError> {
        match self.get(&result.job_id) {
            Some(job) => job.on_result(result).await,
            None => {
                debug!(job_id = %result.job_id, item_id = %result.item_id, "Reply for unknown tool path ignored");
                Ok(())
            }
        }
    }

    /// Jobs none of whose items are left in the item store
    pub fn empty_tool_paths(&self) -> Vec<JobId> {
        self.jobs
            .read()
            .iter()
            .filter(|job| !job.lock().has_items_in_store())
            .map(|job| job.id().clone())
            .collect()
    }

    /// Remove and dispose every job in [`ToolPathGroup::empty_tool_paths`]
    pub fn remove_empty_tool_paths(&self) -> usize {
        let empty = self.empty_tool_paths();
        for id in &empty {
            self.remove(id);
        }
        if !empty.is_empty() {
            info!(removed = empty.len(), "Empty tool paths removed");
        }
        empty.len()
    }

    /// Drain a reply channel, settling each reply on its own task
    ///
    /// The returned task ends when every sender is dropped.
    pub fn run_results(
        self: Arc<Self>,
        mut receiver: mpsc::UnboundedReceiver<TaskResult>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(result) = receiver.recv().await {
                let group = Arc::clone(&self);
                tokio::spawn(async move {
                    let job_id = result.job_id.clone();
                    let item_id = result.item_id.clone();
                    if let Err(e) = group.route_result(result).await {
                        warn!(job_id = %job_id, item_id = %item_id, error = %e, "Tool path item settled with error");
                    }
                });
            }
            debug!("Result channel closed");
        })
    }
}

impl std::fmt::Debug for ToolPathGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolPathGroup")
            .field("jobs", &self.len())
            .finish()
    }
}
