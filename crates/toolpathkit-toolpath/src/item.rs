//! Design items as seen by a toolpath job.
//!
//! Items live in an external store; a job only holds their ids and asks the
//! store for a fresh [`ItemDescriptor`] whenever it fingerprints or submits.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use toolpathkit_core::ItemId;

use crate::config::ConfigBlock;

/// Machine head a job targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadType {
    Laser,
    Cnc,
    Printing,
}

impl std::fmt::Display for HeadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Laser => write!(f, "laser"),
            Self::Cnc => write!(f, "cnc"),
            Self::Printing => write!(f, "printing"),
        }
    }
}

/// Kind of source data a job operates on (the job discriminator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolPathKind {
    /// Raster image processed line by line
    Image,
    /// Vector outlines
    Vector,
    /// Relief from a 3D model or height map
    Image3d,
}

impl ToolPathKind {
    /// Kind implied by an item's source type and processing mode
    pub fn infer(source_type: SourceType, mode: ProcessMode) -> Self {
        match (source_type, mode) {
            (SourceType::Image3d, _) => Self::Image3d,
            (_, ProcessMode::Vector) => Self::Vector,
            (SourceType::Svg | SourceType::Dxf | SourceType::Text, _) => Self::Vector,
            (SourceType::Raster, _) => Self::Image,
        }
    }
}

impl std::fmt::Display for ToolPathKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Vector => write!(f, "vector"),
            Self::Image3d => write!(f, "image3d"),
        }
    }
}

/// Original format of an item's source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Raster,
    Svg,
    Dxf,
    Text,
    Image3d,
}

/// How the source is processed before path generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    Bw,
    Greyscale,
    Halftone,
    Vector,
    Trace,
}

/// Placement of an item on the work area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    /// Rotation about Z, in radians
    pub rotation_z: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// 0 none, 1 vertical, 2 horizontal, 3 both
    pub flip: u8,
    pub width: f64,
    pub height: f64,
}

impl Default for Transformation {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            position_z: 0.0,
            rotation_z: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            flip: 0,
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Files backing an item's geometry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryRefs {
    /// File name as imported by the user
    pub original_name: String,
    /// Name of the uploaded copy
    pub upload_name: String,
    /// Name of the processed image, for raster sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_image_name: Option<String>,
}

/// Everything the backend needs to know about one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescriptor {
    #[serde(rename = "modelID")]
    pub item_id: ItemId,
    pub head_type: HeadType,
    /// Discriminator; must equal the owning job's kind
    #[serde(rename = "type")]
    pub kind: ToolPathKind,
    pub source_type: SourceType,
    pub mode: ProcessMode,
    pub source_width: f64,
    pub source_height: f64,
    #[serde(flatten)]
    pub geometry: GeometryRefs,
    pub transformation: Transformation,
    /// Item-level generation config
    pub config: ConfigBlock,
}

impl ItemDescriptor {
    /// Create a descriptor whose kind is inferred from source type and mode
    pub fn new(
        item_id: impl Into<ItemId>,
        head_type: HeadType,
        source_type: SourceType,
        mode: ProcessMode,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            head_type,
            kind: ToolPathKind::infer(source_type, mode),
            source_type,
            mode,
            source_width: 0.0,
            source_height: 0.0,
            geometry: GeometryRefs::default(),
            transformation: Transformation::default(),
            config: ConfigBlock::default(),
        }
    }

    pub fn with_geometry(mut self, geometry: GeometryRefs) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_source_size(mut self, width: f64, height: f64) -> Self {
        self.source_width = width;
        self.source_height = height;
        self
    }

    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = transformation;
        self
    }

    pub fn with_config(mut self, config: ConfigBlock) -> Self {
        self.config = config;
        self
    }
}

/// Read-only view of the design-item store
///
/// Jobs never mutate the store.
pub trait ItemStore: Send + Sync {
    /// Descriptors of the items among `ids` that still exist
    ///
    /// Ids unknown to the store are left out. The order of the returned
    /// descriptors is not significant; jobs reorder by their own item order.
    fn selected_items(&self, ids: &[ItemId]) -> Vec<ItemDescriptor>;
}

/// Item store held in memory
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<ItemDescriptor>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, replacing any item with the same id
    pub fn upsert(&self, item: ItemDescriptor) {
        let mut items = self.items.write();
        match items.iter_mut().find(|i| i.item_id == item.item_id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }

    /// Remove an item, returning it if it existed
    pub fn remove(&self, id: &ItemId) -> Option<ItemDescriptor> {
        let mut items = self.items.write();
        let pos = items.iter().position(|i| &i.item_id == id)?;
        Some(items.remove(pos))
    }

    /// Apply `f` to the item with id `id`; returns false if absent
    pub fn update<F>(&self, id: &ItemId, f: F) -> bool
    where
        F: FnOnce(&mut ItemDescriptor),
    {
        let mut items = self.items.write();
        match items.iter_mut().find(|i| &i.item_id == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl FromIterator<ItemDescriptor> for InMemoryItemStore {
    fn from_iter<T: IntoIterator<Item = ItemDescriptor>>(iter: T) -> Self {
        let store = Self::new();
        for item in iter {
            store.upsert(item);
        }
        store
    }
}

impl ItemStore for InMemoryItemStore {
    fn selected_items(&self, ids: &[ItemId]) -> Vec<ItemDescriptor> {
        self.items
            .read()
            .iter()
            .filter(|item| ids.contains(&item.item_id))
            .cloned()
            .collect()
    }
}
