//! Shared test doubles for the job integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Notify;
use toolpathkit_core::{EventBus, EventBusConfig, ItemError, ItemId, SequentialIdSource};
use toolpathkit_toolpath::{
    ArtifactFetcher, ArtifactLoader, ComputationBackend, HeadType, InMemoryItemStore,
    ItemDescriptor, JobHandle, JobOptions, JobServices, JsonToolpathParser, ProcessMode,
    SourceType, TaskRequest, ToolPathGroup, ToolPathKind,
};

/// Backend that records every request it accepts
#[derive(Default)]
pub struct RecordingBackend {
    requests: Mutex<Vec<TaskRequest>>,
    refused: Mutex<HashSet<ItemId>>,
}

impl RecordingBackend {
    pub fn requests(&self) -> Vec<TaskRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn dispatched_items(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.item_id.to_string())
            .collect()
    }

    /// Refuse future tasks for `item`
    pub fn refuse(&self, item: &str) {
        self.refused.lock().insert(ItemId::from(item));
    }
}

impl ComputationBackend for RecordingBackend {
    fn submit_task(&self, request: TaskRequest) -> Result<(), ItemError> {
        if self.refused.lock().contains(&request.item_id) {
            return Err(ItemError::BackendFailure {
                item_id: request.item_id,
                reason: "queue full".to_string(),
            });
        }
        self.requests.lock().push(request);
        Ok(())
    }
}

/// Result files kept in memory; fetches of files listed in `gated` wait
/// for `release`
#[derive(Default)]
pub struct MemoryFetcher {
    files: Mutex<HashMap<String, Vec<u8>>>,
    gated: Mutex<HashSet<String>>,
    pub release: Notify,
}

impl MemoryFetcher {
    pub fn insert(&self, file: &str, contents: impl Into<Vec<u8>>) {
        self.files.lock().insert(file.to_string(), contents.into());
    }

    pub fn gate(&self, file: &str) {
        self.gated.lock().insert(file.to_string());
    }
}

#[async_trait]
impl ArtifactFetcher for MemoryFetcher {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, ItemError> {
        let gated = self.gated.lock().contains(file);
        if gated {
            self.release.notified().await;
        }
        self.files
            .lock()
            .get(file)
            .cloned()
            .ok_or_else(|| ItemError::ArtifactFetchFailure {
                file: file.to_string(),
                reason: "not found".to_string(),
            })
    }
}

/// A small valid toolpath document starting at `x`
pub fn toolpath_json(x: f64) -> String {
    format!(
        r#"{{"headType":"laser","mode":"vector","data":[{{"G":0,"X":{x},"Y":0}},{{"G":1,"X":{},"Y":5,"F":1200,"S":255}}]}}"#,
        x + 5.0
    )
}

pub fn vector_item(id: &str) -> ItemDescriptor {
    ItemDescriptor::new(id, HeadType::Laser, SourceType::Svg, ProcessMode::Vector)
}

pub fn raster_item(id: &str) -> ItemDescriptor {
    ItemDescriptor::new(id, HeadType::Laser, SourceType::Raster, ProcessMode::Greyscale)
}

pub struct Fixture {
    pub store: Arc<InMemoryItemStore>,
    pub backend: Arc<RecordingBackend>,
    pub fetcher: Arc<MemoryFetcher>,
    pub events: Arc<EventBus>,
    pub services: JobServices,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryItemStore::new());
        let backend = Arc::new(RecordingBackend::default());
        let fetcher = Arc::new(MemoryFetcher::default());
        let events = Arc::new(EventBus::with_config(EventBusConfig {
            enable_history: true,
            ..EventBusConfig::default()
        }));
        let loader = ArtifactLoader::new(fetcher.clone(), Arc::new(JsonToolpathParser));
        let services = JobServices::new(
            store.clone(),
            backend.clone(),
            loader,
            Arc::new(SequentialIdSource::new("job")),
        )
        .with_events(events.clone());

        Self {
            store,
            backend,
            fetcher,
            events,
            services,
        }
    }

    /// Register vector items and a result file `<id>.json` for each
    pub fn with_vector_items(self, ids: &[&str]) -> Self {
        for (i, id) in ids.iter().enumerate() {
            self.store.upsert(vector_item(id));
            self.fetcher
                .insert(&format!("{id}.json"), toolpath_json(i as f64 * 10.0));
        }
        self
    }

    pub fn options(&self, ids: &[&str]) -> JobOptions {
        JobOptions::new(HeadType::Laser, ToolPathKind::Vector, ids.iter().copied()).name("Engrave")
    }

    pub fn job(&self, ids: &[&str]) -> JobHandle {
        JobHandle::new(toolpathkit_toolpath::ToolPathJob::new(
            self.options(ids),
            self.services.clone(),
        ))
    }

    pub fn group(&self) -> Arc<ToolPathGroup> {
        Arc::new(ToolPathGroup::new(self.services.clone()))
    }
}
