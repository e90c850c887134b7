//! # ToolpathKit Toolpath
//!
//! Toolpath generation jobs.
//!
//! A job groups design items under one generation configuration, sends one
//! task per item to an external computation backend and tracks every item's
//! status as replies arrive. Successful results are loaded from their
//! result files and attached to the job's scene container.
//!
//! ## Components
//!
//! - **Status**: per-item statuses and job-level aggregation
//! - **Fingerprint**: staleness detection over the job's task descriptors
//! - **Task**: backend requests, replies, and the backend seam
//! - **Correlation**: the in-flight table that matches replies to tasks
//! - **Loader**: result-file fetch and parse into toolpath geometry
//! - **Scene**: per-job artifact arena
//! - **Job**: the aggregate, its shared handle, and the job group

pub mod artifact;
pub mod config;
pub mod correlation;
pub mod fingerprint;
pub mod group;
pub mod handle;
pub mod item;
pub mod job;
pub mod loader;
pub mod scene;
pub mod status;
pub mod task;

pub use artifact::{
    Artifact, Bounds, GeometryError, PathCommand, Point3D, RotaryInfo, Segment, ToolpathFile,
    ToolpathGeometry,
};
pub use config::{ConfigBlock, GenerationConfig, JobUpdate};
pub use correlation::{InFlightTable, InFlightTask};
pub use fingerprint::{Fingerprint, TaskDescriptor};
pub use group::ToolPathGroup;
pub use handle::JobHandle;
pub use item::{
    GeometryRefs, HeadType, InMemoryItemStore, ItemDescriptor, ItemStore, ProcessMode,
    SourceType, ToolPathKind, Transformation,
};
pub use job::{ItemEntry, JobOptions, JobServices, JobState, Settlement, ToolPathJob};
pub use loader::{
    ArtifactFetcher, ArtifactLoader, ArtifactParser, FsArtifactFetcher, JsonToolpathParser,
};
pub use scene::{ArtifactHandle, SceneContainer};
pub use status::{aggregate, ToolPathStatus};
pub use task::{ChannelBackend, ComputationBackend, TaskOutcome, TaskRequest, TaskResult};
