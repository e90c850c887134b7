//! Generation status shared by item entries and jobs.

use serde::{Deserialize, Serialize};

/// Generation status of an item entry or of a whole job
///
/// The same five values are used at both levels; what triggers a
/// transition differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolPathStatus {
    /// Nothing generated yet
    #[default]
    Idle,
    /// A task is in flight
    Running,
    /// Generated and up to date
    Success,
    /// Configuration changed since the last successful generation
    Warning,
    /// Generation failed
    Failed,
}

impl ToolPathStatus {
    /// Lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ToolPathStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
