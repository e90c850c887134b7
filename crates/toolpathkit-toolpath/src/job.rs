//! The toolpath job aggregate.
//!
//! A [`ToolPathJob`] groups design items under one generation
//! configuration. It owns one [`ItemEntry`] per item, the in-flight table of
//! dispatched tasks and the scene container holding loaded artifacts.
//!
//! All methods are synchronous. Result settlement is split in two steps,
//! [`ToolPathJob::begin_result`] and [`ToolPathJob::finish_load`], so the
//! artifact load between them can run without the job locked; see
//! [`crate::JobHandle`].

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use toolpathkit_core::{
    AppEvent, EventBus, IdSource, ItemError, ItemId, JobError, JobEvent, JobId, Result,
    SceneEvent, TaskEvent,
};
use tracing::{debug, error, info, warn};

use crate::artifact::Artifact;
use crate::config::{GenerationConfig, JobUpdate};
use crate::correlation::InFlightTable;
use crate::fingerprint::{self, Fingerprint, TaskDescriptor};
use crate::item::{HeadType, ItemStore, ToolPathKind};
use crate::loader::ArtifactLoader;
use crate::scene::{ArtifactHandle, SceneContainer};
use crate::status::{aggregate, marks_stale, needs_generation, ToolPathStatus};
use crate::task::{ComputationBackend, TaskOutcome, TaskRequest};

/// Collaborators shared by every job of a process
#[derive(Clone)]
pub struct JobServices {
    pub items: Arc<dyn ItemStore>,
    pub backend: Arc<dyn ComputationBackend>,
    pub loader: ArtifactLoader,
    pub ids: Arc<dyn IdSource>,
    pub events: Option<Arc<EventBus>>,
}

impl JobServices {
    pub fn new(
        items: Arc<dyn ItemStore>,
        backend: Arc<dyn ComputationBackend>,
        loader: ArtifactLoader,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        Self {
            items,
            backend,
            loader,
            ids,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }
}

impl std::fmt::Debug for JobServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobServices")
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

/// Construction parameters of a job
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Generated from the id source when `None`
    pub id: Option<JobId>,
    pub name: String,
    pub base_name: String,
    pub head_type: HeadType,
    pub kind: ToolPathKind,
    pub item_ids: Vec<ItemId>,
    pub config: GenerationConfig,
}

impl JobOptions {
    pub fn new<I, T>(head_type: HeadType, kind: ToolPathKind, item_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self {
            id: None,
            name: String::new(),
            base_name: String::new(),
            head_type,
            kind,
            item_ids: item_ids.into_iter().map(Into::into).collect(),
            config: GenerationConfig::default(),
        }
    }

    pub fn id(mut self, id: impl Into<JobId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }
}

/// Generation state of one item within a job
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntry {
    item_id: ItemId,
    status: ToolPathStatus,
    file: Option<String>,
    artifact: Option<ArtifactHandle>,
    /// Attempt of the latest dispatch, 0 when none is pending
    attempt: u64,
}

impl ItemEntry {
    fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            status: ToolPathStatus::Idle,
            file: None,
            artifact: None,
            attempt: 0,
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn status(&self) -> ToolPathStatus {
        self.status
    }

    /// Result-file reference of the latest successful reply
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Handle of the attached artifact, owned by the job's scene
    pub fn artifact(&self) -> Option<ArtifactHandle> {
        self.artifact
    }
}

/// Serializable snapshot of a job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    pub id: JobId,
    pub head_type: HeadType,
    pub name: String,
    pub base_name: String,
    #[serde(rename = "type")]
    pub kind: ToolPathKind,
    pub status: ToolPathStatus,
    pub check: bool,
    pub visible: bool,
    #[serde(rename = "modelIDs")]
    pub item_ids: Vec<ItemId>,
    /// Per-item status, in item order
    pub item_statuses: Vec<ToolPathStatus>,
    /// Per-item result-file reference, in item order
    pub tool_path_files: Vec<Option<String>>,
    #[serde(flatten)]
    pub config: GenerationConfig,
}

/// Next step after a backend reply was applied to a job
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Reply for an unknown item or a task no longer in flight
    Ignored,
    /// The item failed; the entry is already `Failed`
    Failed(ItemError),
    /// The item succeeded; load `file` and pass `attempt` to `finish_load`
    Load { file: String, attempt: u64 },
}

/// A toolpath generation job
pub struct ToolPathJob {
    id: JobId,
    name: String,
    base_name: String,
    head_type: HeadType,
    kind: ToolPathKind,
    status: ToolPathStatus,
    check: bool,
    item_ids: Vec<ItemId>,
    entries: HashMap<ItemId, ItemEntry>,
    config: GenerationConfig,
    fingerprint: Option<Fingerprint>,
    in_flight: InFlightTable,
    scene: SceneContainer,
    services: JobServices,
}

impl ToolPathJob {
    /// Create a job and compute its first fingerprint
    ///
    /// A job whose items cannot be described is still created, in `Failed`.
    pub fn new(options: JobOptions, services: JobServices) -> Self {
        let id = options.id.unwrap_or_else(|| services.ids.next_job_id());

        let mut item_ids: Vec<ItemId> = Vec::with_capacity(options.item_ids.len());
        for item_id in options.item_ids {
            if !item_ids.contains(&item_id) {
                item_ids.push(item_id);
            }
        }
        let entries = item_ids
            .iter()
            .map(|id| (id.clone(), ItemEntry::new(id.clone())))
            .collect();

        let mut job = Self {
            id,
            name: options.name,
            base_name: options.base_name,
            head_type: options.head_type,
            kind: options.kind,
            status: ToolPathStatus::Idle,
            check: true,
            item_ids,
            entries,
            config: options.config,
            fingerprint: None,
            in_flight: InFlightTable::new(),
            scene: SceneContainer::new(),
            services,
        };

        info!(
            job_id = %job.id,
            kind = %job.kind,
            items = job.item_ids.len(),
            "Tool path created"
        );
        job.publish(JobEvent::Created {
            job_id: job.id.clone(),
            item_count: job.item_ids.len(),
        });
        // A failure is already recorded on the job status
        let _ = job.refresh();
        job
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn head_type(&self) -> HeadType {
        self.head_type
    }

    pub fn kind(&self) -> ToolPathKind {
        self.kind
    }

    pub fn status(&self) -> ToolPathStatus {
        self.status
    }

    /// Included in batch generation
    pub fn check(&self) -> bool {
        self.check
    }

    pub fn visible(&self) -> bool {
        self.scene.is_visible()
    }

    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    pub fn entry(&self, item_id: &ItemId) -> Option<&ItemEntry> {
        self.entries.get(item_id)
    }

    /// Entries in item order
    pub fn entries(&self) -> impl Iterator<Item = &ItemEntry> {
        self.item_ids.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn scene(&self) -> &SceneContainer {
        &self.scene
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn loader(&self) -> &ArtifactLoader {
        &self.services.loader
    }

    /// Whether any of the job's items still exists in the item store
    pub fn has_items_in_store(&self) -> bool {
        !self.services.items.selected_items(&self.item_ids).is_empty()
    }

    pub fn state(&self) -> JobState {
        let entries: Vec<&ItemEntry> = self.entries().collect();
        JobState {
            id: self.id.clone(),
            head_type: self.head_type,
            name: self.name.clone(),
            base_name: self.base_name.clone(),
            kind: self.kind,
            status: self.status,
            check: self.check,
            visible: self.visible(),
            item_ids: self.item_ids.clone(),
            item_statuses: entries.iter().map(|e| e.status).collect(),
            tool_path_files: entries.iter().map(|e| e.file.clone()).collect(),
            config: self.config.clone(),
        }
    }

    /// Apply a partial update, then re-check staleness
    ///
    /// Returns the fingerprinting error if the job became `Failed`.
    pub fn update(&mut self, update: JobUpdate) -> Result<()> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(check) = update.check {
            self.check = check;
        }
        if let Some(visible) = update.visible {
            if visible != self.scene.is_visible() {
                self.scene.set_visible(visible);
                self.publish(SceneEvent::VisibilityChanged {
                    job_id: self.id.clone(),
                    visible,
                });
            }
        }
        if let Some(block) = update.gcode_config {
            self.config.gcode_config = block;
        }
        if let Some(block) = update.tool_params {
            self.config.tool_params = block;
        }
        if let Some(block) = update.materials {
            self.config.materials = block;
        }
        self.refresh().map(|_| ())
    }

    /// Add items; ids already in the job are skipped
    pub fn add_items<I>(&mut self, item_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = ItemId>,
    {
        for item_id in item_ids {
            if self.entries.contains_key(&item_id) {
                continue;
            }
            debug!(job_id = %self.id, item_id = %item_id, "Item added");
            self.entries
                .insert(item_id.clone(), ItemEntry::new(item_id.clone()));
            self.item_ids.push(item_id);
        }
        self.refresh().map(|_| ())
    }

    /// Remove an item, detaching its artifact
    ///
    /// Returns `Ok(false)` if the item was not part of the job. A reply
    /// still in flight for the item is ignored when it arrives. An `Err`
    /// means the item was removed but the job is now `Failed`.
    pub fn remove_item(&mut self, item_id: &ItemId) -> Result<bool> {
        let Some(entry) = self.entries.remove(item_id) else {
            return Ok(false);
        };
        self.item_ids.retain(|id| id != item_id);
        self.in_flight.complete(&self.id, item_id);
        if let Some(handle) = entry.artifact {
            self.detach(handle);
        }
        debug!(job_id = %self.id, item_id = %item_id, "Item removed");
        self.refresh().map(|_| true)
    }

    /// Dispatch generation tasks for every item that needs one
    ///
    /// Returns whether any task was dispatched. A `Failed` job discards its
    /// artifacts, is reset to `Idle` and returns `false`; the next call
    /// fingerprints it from scratch.
    pub fn submit(&mut self) -> bool {
        if self.status == ToolPathStatus::Failed {
            self.clear_artifacts();
            self.reset();
            info!(job_id = %self.id, "Failed tool path reset");
            return false;
        }

        let descriptors = match self.refresh() {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!(job_id = %self.id, error = %e, "Tool path not submitted");
                return false;
            }
        };
        if self.status == ToolPathStatus::Success {
            debug!(job_id = %self.id, "Tool path up to date");
            return false;
        }

        let mut dispatched = 0usize;
        for descriptor in descriptors {
            let item_id = descriptor.item_id().clone();
            let eligible = self
                .entries
                .get(&item_id)
                .is_some_and(|entry| needs_generation(entry.status));
            if !eligible || self.in_flight.contains(&self.id, &item_id) {
                continue;
            }

            match self.dispatch(descriptor) {
                Ok(()) => {
                    dispatched += 1;
                    self.publish(TaskEvent::Dispatched {
                        job_id: self.id.clone(),
                        item_id,
                    });
                }
                Err(e) => {
                    warn!(job_id = %self.id, item_id = %item_id, error = %e, "Backend refused task");
                    if let Some(entry) = self.entries.get_mut(&item_id) {
                        entry.status = ToolPathStatus::Failed;
                    }
                    self.publish(TaskEvent::Failed {
                        job_id: self.id.clone(),
                        item_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.recompute();
        if dispatched > 0 {
            info!(job_id = %self.id, tasks = dispatched, "Tool path tasks dispatched");
        }
        dispatched > 0
    }

    fn dispatch(&mut self, data: TaskDescriptor) -> std::result::Result<(), ItemError> {
        let item_id = data.item_id().clone();
        let request = TaskRequest {
            job_id: self.id.clone(),
            item_id: item_id.clone(),
            head_type: self.head_type,
            kind: self.kind,
            data,
        };
        self.services.backend.submit_task(request)?;

        let attempt = self
            .in_flight
            .dispatch(&self.id, &item_id, self.fingerprint.clone());
        if let Some(entry) = self.entries.get_mut(&item_id) {
            entry.status = ToolPathStatus::Running;
            entry.attempt = attempt;
        }
        debug!(job_id = %self.id, item_id = %item_id, attempt, "Task dispatched");
        Ok(())
    }

    /// Apply a backend reply
    ///
    /// Failures settle here. Successes mark the entry and return the file
    /// to load; the load result goes to [`ToolPathJob::finish_load`].
    pub fn begin_result(&mut self, item_id: &ItemId, outcome: TaskOutcome) -> Settlement {
        if !self.entries.contains_key(item_id) {
            debug!(job_id = %self.id, item_id = %item_id, "Reply for removed item ignored");
            return Settlement::Ignored;
        }
        let Some(task) = self.in_flight.complete(&self.id, item_id) else {
            debug!(job_id = %self.id, item_id = %item_id, "Reply without task in flight ignored");
            return Settlement::Ignored;
        };
        debug!(
            job_id = %self.id,
            item_id = %item_id,
            attempt = task.attempt,
            elapsed_ms = task.elapsed_ms(),
            "Task reply received"
        );

        match outcome {
            TaskOutcome::Failed { reason } => {
                let error = ItemError::BackendFailure {
                    item_id: item_id.clone(),
                    reason,
                };
                self.settle_failure(item_id, &error);
                Settlement::Failed(error)
            }
            TaskOutcome::Success { file } => {
                let stale = task.fingerprint != self.fingerprint;
                if let Some(entry) = self.entries.get_mut(item_id) {
                    entry.status = if stale {
                        ToolPathStatus::Warning
                    } else {
                        ToolPathStatus::Success
                    };
                    entry.file = Some(file.clone());
                }
                if stale {
                    debug!(job_id = %self.id, item_id = %item_id, "Reply is for an outdated configuration");
                }
                Settlement::Load {
                    file,
                    attempt: task.attempt,
                }
            }
        }
    }

    /// Attach a loaded artifact, or fail the entry if the load failed
    ///
    /// A load whose attempt is no longer the entry's latest (the item was
    /// removed, re-dispatched, or the job was reset) is discarded.
    pub fn finish_load(
        &mut self,
        item_id: &ItemId,
        attempt: u64,
        loaded: std::result::Result<Artifact, ItemError>,
    ) -> std::result::Result<(), ItemError> {
        let current = self
            .entries
            .get(item_id)
            .is_some_and(|entry| entry.attempt == attempt);
        if !current {
            debug!(job_id = %self.id, item_id = %item_id, attempt, "Outdated artifact load discarded");
            return Ok(());
        }

        let artifact = match loaded {
            Ok(artifact) => artifact,
            Err(error) => {
                self.settle_failure(item_id, &error);
                return Err(error);
            }
        };

        let file = artifact.file.clone();
        let previous = self.entries.get_mut(item_id).and_then(|e| e.artifact.take());
        if let Some(handle) = previous {
            self.detach(handle);
        }
        let handle = self.scene.attach(artifact);
        if let Some(entry) = self.entries.get_mut(item_id) {
            entry.artifact = Some(handle);
            entry.attempt = 0;
        }
        debug!(job_id = %self.id, item_id = %item_id, handle = %handle, "Artifact attached");

        self.publish(SceneEvent::Attached {
            job_id: self.id.clone(),
            item_id: item_id.clone(),
            handle: handle.raw(),
        });
        self.publish(TaskEvent::Succeeded {
            job_id: self.id.clone(),
            item_id: item_id.clone(),
            file,
        });
        self.recompute();
        Ok(())
    }

    fn settle_failure(&mut self, item_id: &ItemId, error: &ItemError) {
        if let Some(entry) = self.entries.get_mut(item_id) {
            entry.status = ToolPathStatus::Failed;
            entry.attempt = 0;
        }
        warn!(job_id = %self.id, item_id = %item_id, error = %error, "Tool path item failed");
        self.publish(TaskEvent::Failed {
            job_id: self.id.clone(),
            item_id: item_id.clone(),
            error: error.to_string(),
        });
        self.recompute();
    }

    /// Detach every artifact and mark the whole job stale
    ///
    /// Entries with a task in flight keep running.
    pub fn remove_artifacts(&mut self) {
        self.clear_artifacts();
        for entry in self.entries.values_mut() {
            if marks_stale(entry.status) {
                entry.status = ToolPathStatus::Warning;
            }
        }
        self.set_status(ToolPathStatus::Warning);
    }

    /// Detach every artifact, leaving statuses as they are
    pub fn clear_artifacts(&mut self) {
        let handles: Vec<ArtifactHandle> = self
            .entries
            .values_mut()
            .filter_map(|entry| entry.artifact.take())
            .collect();
        for handle in handles {
            self.detach(handle);
        }
    }

    /// Detach all artifacts and drop the job
    pub fn dispose(mut self) {
        self.clear_artifacts();
        info!(job_id = %self.id, "Tool path disposed");
        self.publish(JobEvent::Disposed {
            job_id: self.id.clone(),
        });
    }

    fn detach(&mut self, handle: ArtifactHandle) {
        if self.scene.detach(handle).is_some() {
            self.publish(SceneEvent::Detached {
                job_id: self.id.clone(),
                handle: handle.raw(),
            });
        }
    }

    /// Recompute the fingerprint and mark the job stale if it changed
    fn refresh(&mut self) -> Result<Vec<TaskDescriptor>> {
        let items = self.services.items.selected_items(&self.item_ids);
        let descriptors =
            match fingerprint::describe(&self.id, self.kind, &self.item_ids, items, &self.config) {
                Ok(descriptors) => descriptors,
                Err(e) => {
                    self.fail(&e);
                    return Err(e.into());
                }
            };

        let fingerprint = Fingerprint::compute(&descriptors)?;
        if self.fingerprint.as_ref() != Some(&fingerprint) {
            self.fingerprint = Some(fingerprint);
            for entry in self.entries.values_mut() {
                if marks_stale(entry.status) {
                    entry.status = ToolPathStatus::Warning;
                }
            }
            debug!(job_id = %self.id, "Tool path configuration changed");
            self.set_status(ToolPathStatus::Warning);
            self.publish(JobEvent::BecameStale {
                job_id: self.id.clone(),
            });
        }
        Ok(descriptors)
    }

    fn fail(&mut self, e: &JobError) {
        error!(job_id = %self.id, error = %e, "Tool path is invalid");
        self.clear_artifacts();
        self.abandon_tasks();
        self.set_status(ToolPathStatus::Failed);
    }

    /// Forget every dispatched task; late replies and loads are ignored
    fn abandon_tasks(&mut self) {
        self.in_flight.clear();
        for entry in self.entries.values_mut() {
            entry.attempt = 0;
            if entry.status == ToolPathStatus::Running {
                entry.status = ToolPathStatus::Idle;
            }
        }
    }

    fn reset(&mut self) {
        self.abandon_tasks();
        for entry in self.entries.values_mut() {
            entry.status = ToolPathStatus::Idle;
            entry.file = None;
        }
        self.fingerprint = None;
        self.set_status(ToolPathStatus::Idle);
    }

    /// Re-derive the job status from its entries
    ///
    /// An entry whose artifact is still loading counts as `Running`, so the
    /// job is only `Success` once every artifact is in the scene.
    fn recompute(&mut self) {
        let statuses = self.entries.values().map(|e| {
            if e.attempt != 0 {
                ToolPathStatus::Running
            } else {
                e.status
            }
        });
        let next = aggregate(self.status, statuses);
        self.set_status(next);
    }

    fn set_status(&mut self, to: ToolPathStatus) {
        let from = self.status;
        if from == to {
            return;
        }
        self.status = to;
        debug!(job_id = %self.id, %from, %to, "Tool path status changed");
        self.publish(JobEvent::StatusChanged {
            job_id: self.id.clone(),
            from,
            to,
        });
    }

    fn publish(&self, event: impl Into<AppEvent>) {
        if let Some(bus) = &self.services.events {
            // Publishing with nobody listening is not an error here
            let _ = bus.publish(event.into());
        }
    }
}

impl std::fmt::Debug for ToolPathJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolPathJob")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("items", &self.item_ids.len())
            .field("in_flight", &self.in_flight.len())
            .field("artifacts", &self.scene.len())
            .finish()
    }
}
