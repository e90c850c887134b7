//! In-flight task table.
//!
//! Every dispatched task is recorded under `(job id, item id)` until its
//! reply arrives. An item with a record is in flight and is never
//! dispatched again. Each record carries an attempt number that also tags
//! the artifact load started by its reply, so a load that outlives its
//! attempt can be recognised and dropped.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use toolpathkit_core::{ItemId, JobId};

use crate::fingerprint::Fingerprint;

/// A dispatched task awaiting its reply
#[derive(Debug, Clone, PartialEq)]
pub struct InFlightTask {
    pub attempt: u64,
    pub dispatched_at: DateTime<Utc>,
    /// Job fingerprint at dispatch time
    pub fingerprint: Option<Fingerprint>,
}

impl InFlightTask {
    /// Milliseconds since dispatch
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.dispatched_at).num_milliseconds()
    }
}

#[derive(Debug, Default)]
pub struct InFlightTable {
    tasks: HashMap<(JobId, ItemId), InFlightTask>,
    last_attempt: u64,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dispatch and return its attempt number
    pub fn dispatch(
        &mut self,
        job_id: &JobId,
        item_id: &ItemId,
        fingerprint: Option<Fingerprint>,
    ) -> u64 {
        self.last_attempt += 1;
        self.tasks.insert(
            (job_id.clone(), item_id.clone()),
            InFlightTask {
                attempt: self.last_attempt,
                dispatched_at: Utc::now(),
                fingerprint,
            },
        );
        self.last_attempt
    }

    pub fn contains(&self, job_id: &JobId, item_id: &ItemId) -> bool {
        self.tasks.contains_key(&(job_id.clone(), item_id.clone()))
    }

    pub fn get(&self, job_id: &JobId, item_id: &ItemId) -> Option<&InFlightTask> {
        self.tasks.get(&(job_id.clone(), item_id.clone()))
    }

    /// Remove and return the record for a settled task
    pub fn complete(&mut self, job_id: &JobId, item_id: &ItemId) -> Option<InFlightTask> {
        self.tasks.remove(&(job_id.clone(), item_id.clone()))
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
