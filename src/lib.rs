//! # ToolpathKit
//!
//! Toolpath generation jobs for CAM applications.
//!
//! A job groups design items under one generation configuration, dispatches
//! one task per item to an external computation backend, tracks each item's
//! status as replies arrive, detects when its configuration has drifted from
//! the last generated result, and attaches loaded toolpaths to a scene.
//!
//! ## Architecture
//!
//! ToolpathKit is organized as a workspace with multiple crates:
//!
//! 1. **toolpathkit-core** - Errors, identifiers, id sources, event bus
//! 2. **toolpathkit-settings** - Configuration files and validation
//! 3. **toolpathkit-toolpath** - Jobs, task submission, result correlation, artifact loading
//! 4. **toolpathkit** - This facade: logging setup and service wiring

use std::sync::Arc;

pub use toolpathkit_core::{
    AppEvent, Error, EventBus, EventFilter, IdSource, ItemError, ItemId, JobError, JobEvent,
    JobId, Result, SceneEvent, SequentialIdSource, TaskEvent, ToolPathStatus, UuidIdSource,
};

pub use toolpathkit_settings::{Config, GenerationSettings, LoggingSettings, PathSettings};

pub use toolpathkit_toolpath::{
    Artifact, ArtifactFetcher, ArtifactHandle, ArtifactLoader, ArtifactParser, ChannelBackend,
    ComputationBackend, ConfigBlock, FsArtifactFetcher, GenerationConfig, HeadType,
    InMemoryItemStore, ItemDescriptor, ItemStore, JobHandle, JobOptions, JobServices, JobState,
    JobUpdate, JsonToolpathParser, SceneContainer, TaskOutcome, TaskRequest, TaskResult,
    ToolPathGroup, ToolPathJob, ToolPathKind, ToolpathGeometry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the logging settings
///
/// Sets up structured logging with:
/// - Console output, pretty or JSON
/// - RUST_LOG environment variable support, falling back to the configured level
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    if settings.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    Ok(())
}

/// Wire the job services from a configuration
///
/// Result files are read from `config.paths.data_dir`, job ids are random
/// UUIDs and events go to a new bus configured from `config.generation`.
pub fn build_services(
    config: &Config,
    items: Arc<dyn ItemStore>,
    backend: Arc<dyn ComputationBackend>,
) -> JobServices {
    let events = Arc::new(EventBus::with_config(
        config.generation.event_bus_config(),
    ));
    JobServices::new(
        items,
        backend,
        ArtifactLoader::from_data_dir(config.paths.data_dir.clone()),
        Arc::new(UuidIdSource::new()),
    )
    .with_events(events)
}
