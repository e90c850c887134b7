//! Generation configuration blocks.
//!
//! A job carries three independent blocks: generation parameters
//! (speed, power, passes), tool parameters, and material parameters.
//! Each block is an opaque key/value structure owned by value, so a job's
//! copy can never be changed through a caller's instance.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Opaque key/value configuration block
///
/// Keys are kept sorted so serialization is deterministic regardless of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigBlock(BTreeMap<String, Value>);

impl ConfigBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a value, returning the previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigBlock {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The three configuration blocks of a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Generation parameters (speed, power, pass settings)
    pub gcode_config: ConfigBlock,
    /// Tool-specific parameters
    pub tool_params: ConfigBlock,
    /// Material parameters
    pub materials: ConfigBlock,
}

/// Partial update of a job's mutable state
///
/// Every field left `None` keeps the job's current value. Blocks that are
/// present replace the job's block wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub name: Option<String>,
    /// Included in batch
    pub check: Option<bool>,
    /// Visible in scene
    pub visible: Option<bool>,
    pub gcode_config: Option<ConfigBlock>,
    pub tool_params: Option<ConfigBlock>,
    pub materials: Option<ConfigBlock>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn check(mut self, check: bool) -> Self {
        self.check = Some(check);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn gcode_config(mut self, block: ConfigBlock) -> Self {
        self.gcode_config = Some(block);
        self
    }

    pub fn tool_params(mut self, block: ConfigBlock) -> Self {
        self.tool_params = Some(block);
        self
    }

    pub fn materials(mut self, block: ConfigBlock) -> Self {
        self.materials = Some(block);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_serialization_is_key_ordered() {
        let a = ConfigBlock::new().with("speed", 1200).with("power", 80);
        let b = ConfigBlock::new().with("power", 80).with("speed", 1200);
        let ja = serde_json::to_string(&a).expect("serialize");
        let jb = serde_json::to_string(&b).expect("serialize");
        assert_eq!(ja, jb);
        assert_eq!(ja, r#"{"power":80,"speed":1200}"#);
    }

    #[test]
    fn test_block_is_copied_not_aliased() {
        let mut original = ConfigBlock::new().with("passes", 2);
        let copy = original.clone();
        original.set("passes", 5);
        assert_eq!(copy.get("passes"), Some(&json!(2)));
    }

    #[test]
    fn test_block_from_iter() {
        let block: ConfigBlock = [("a", json!(1)), ("b", json!("x"))].into_iter().collect();
        assert_eq!(block.len(), 2);
        assert_eq!(block.get("b"), Some(&json!("x")));
    }

    #[test]
    fn test_job_update_builder() {
        let update = JobUpdate::new().name("Engrave").visible(false);
        assert_eq!(update.name.as_deref(), Some("Engrave"));
        assert_eq!(update.visible, Some(false));
        assert!(update.check.is_none());
        assert!(update.gcode_config.is_none());
    }
}
