//! Per-job scene container.
//!
//! The container owns every artifact attached to it and hands out opaque
//! [`ArtifactHandle`]s. Job entries keep only the handle.

use std::collections::BTreeMap;

use crate::artifact::Artifact;

/// Opaque reference to an artifact owned by a [`SceneContainer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactHandle(u64);

impl ArtifactHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena of the artifacts a job currently displays
#[derive(Debug)]
pub struct SceneContainer {
    visible: bool,
    next_handle: u64,
    artifacts: BTreeMap<ArtifactHandle, Artifact>,
}

impl Default for SceneContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneContainer {
    pub fn new() -> Self {
        Self {
            visible: true,
            next_handle: 1,
            artifacts: BTreeMap::new(),
        }
    }

    /// Take ownership of an artifact and return its handle
    pub fn attach(&mut self, artifact: Artifact) -> ArtifactHandle {
        let handle = ArtifactHandle(self.next_handle);
        self.next_handle += 1;
        self.artifacts.insert(handle, artifact);
        handle
    }

    /// Remove an artifact, returning it if the handle was attached
    pub fn detach(&mut self, handle: ArtifactHandle) -> Option<Artifact> {
        self.artifacts.remove(&handle)
    }

    pub fn get(&self, handle: ArtifactHandle) -> Option<&Artifact> {
        self.artifacts.get(&handle)
    }

    pub fn contains(&self, handle: ArtifactHandle) -> bool {
        self.artifacts.contains_key(&handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = ArtifactHandle> + '_ {
        self.artifacts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactHandle, &Artifact)> {
        self.artifacts.iter().map(|(h, a)| (*h, a))
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
