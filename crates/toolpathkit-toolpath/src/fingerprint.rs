//! Task descriptors and configuration fingerprints.
//!
//! A job's fingerprint is the serialized list of its task descriptors, in
//! item order. Config blocks serialize with sorted keys and descriptors with
//! a fixed field order, so two jobs with equal state always produce equal
//! fingerprints.

use serde::{Deserialize, Serialize};
use toolpathkit_core::{ItemId, JobError, JobId};
use tracing::warn;

use crate::config::{ConfigBlock, GenerationConfig};
use crate::item::{ItemDescriptor, ToolPathKind};

/// An item descriptor merged with the job's three configuration blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    #[serde(flatten)]
    pub item: ItemDescriptor,
    pub gcode_config: ConfigBlock,
    pub tool_params: ConfigBlock,
    pub materials: ConfigBlock,
}

impl TaskDescriptor {
    /// Merge copies of the job's blocks into an item descriptor
    pub fn merge(item: ItemDescriptor, config: &GenerationConfig) -> Self {
        Self {
            item,
            gcode_config: config.gcode_config.clone(),
            tool_params: config.tool_params.clone(),
            materials: config.materials.clone(),
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item.item_id
    }
}

/// Build the ordered descriptor list for a job
///
/// `order` is the job's item order; descriptors come back in that order.
/// Items the store no longer knows are left out. Fails when nothing is left
/// or when any item's kind differs from `kind`.
pub fn describe(
    job_id: &JobId,
    kind: ToolPathKind,
    order: &[ItemId],
    mut items: Vec<ItemDescriptor>,
    config: &GenerationConfig,
) -> Result<Vec<TaskDescriptor>, JobError> {
    let mut descriptors = Vec::with_capacity(order.len());
    for id in order {
        match items.iter().position(|item| &item.item_id == id) {
            Some(pos) => {
                let item = items.swap_remove(pos);
                descriptors.push(TaskDescriptor::merge(item, config));
            }
            None => warn!(job_id = %job_id, item_id = %id, "Item missing from store"),
        }
    }

    if descriptors.is_empty() {
        return Err(JobError::EmptyItemSet {
            job_id: job_id.clone(),
        });
    }

    if descriptors.iter().any(|d| d.item.kind != kind) {
        let mut found: Vec<ToolPathKind> = descriptors.iter().map(|d| d.item.kind).collect();
        found.sort();
        found.dedup();
        return Err(JobError::InconsistentDiscriminator {
            job_id: job_id.clone(),
            expected: kind.to_string(),
            found: found.iter().map(ToString::to_string).collect(),
        });
    }

    Ok(descriptors)
}

/// Deterministic serialization of a descriptor list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(descriptors: &[TaskDescriptor]) -> Result<Self, serde_json::Error> {
        serde_json::to_string(descriptors).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
