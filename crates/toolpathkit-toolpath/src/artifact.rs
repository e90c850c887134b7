//! Generated toolpath files and the geometry parsed from them.
//!
//! The backend writes one JSON document per generated item:
//!
//! ```json
//! {
//!   "headType": "laser",
//!   "mode": "greyscale",
//!   "data": [{ "G": 0, "X": 0, "Y": 0 }, { "G": 1, "X": 10, "F": 800, "S": 255 }],
//!   "estimatedTime": 12.5,
//!   "positionX": 20.0,
//!   "positionY": -15.0
//! }
//! ```
//!
//! Parsing is all-or-nothing: an unsupported motion code or a coordinate
//! that is not finite as `f32` rejects the whole file.

use serde::{Deserialize, Serialize};

use crate::item::HeadType;

/// One command of a toolpath file; absent words keep their modal value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PathCommand {
    #[serde(rename = "G", default, skip_serializing_if = "Option::is_none")]
    pub g: Option<u8>,
    #[serde(rename = "X", default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(rename = "Y", default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(rename = "Z", default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Feed rate, mm/min
    #[serde(rename = "F", default, skip_serializing_if = "Option::is_none")]
    pub f: Option<f64>,
    /// Spindle speed or laser power
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    /// Rotary axis angle
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
}

/// Toolpath result file as written by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolpathFile {
    pub head_type: HeadType,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_mode: Option<String>,
    pub data: Vec<PathCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default)]
    pub position_z: f64,
    #[serde(default)]
    pub rotation_b: f64,
    #[serde(default)]
    pub is_rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter: Option<f64>,
}

/// 3D point in work coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3D) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A straight move between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point3D,
    pub to: Point3D,
    pub rapid: bool,
    /// Power or spindle speed in effect
    pub intensity: Option<f32>,
}

/// Axis-aligned extent of a toolpath
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3D,
    pub max: Point3D,
}

impl Bounds {
    fn at(p: Point3D) -> Self {
        Self { min: p, max: p }
    }

    fn update(&mut self, p: Point3D) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Scene-attachable geometry of one generated toolpath
#[derive(Debug, Clone, PartialEq)]
pub struct ToolpathGeometry {
    pub head_type: HeadType,
    pub mode: String,
    pub segments: Vec<Segment>,
    /// `None` when the path never moves
    pub bounds: Option<Bounds>,
    /// Seconds
    pub estimated_time: f64,
    pub rotary: Option<RotaryInfo>,
}

/// Rotary-axis parameters of a four-axis toolpath
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotaryInfo {
    pub diameter: f64,
    pub rotation_b: f64,
}

impl ToolpathGeometry {
    pub fn feed_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| !s.rapid)
    }

    /// Total length of the cutting moves
    pub fn feed_length(&self) -> f32 {
        self.feed_segments().map(|s| s.from.distance(&s.to)).sum()
    }
}

/// Why a toolpath file was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("unsupported motion code G{code} at command {index}")]
    UnsupportedMotion { index: usize, code: u8 },
    #[error("non-finite {axis} value at command {index}")]
    NonFinite { index: usize, axis: char },
    #[error("non-finite {field}")]
    InvalidHeader { field: &'static str },
}

/// Finite and still finite once narrowed to `f32`
fn fits_f32(v: f64) -> bool {
    v.is_finite() && v.abs() <= f64::from(f32::MAX)
}

fn finite(value: Option<f64>, index: usize, axis: char) -> Result<Option<f64>, GeometryError> {
    match value {
        Some(v) if !fits_f32(v) => Err(GeometryError::NonFinite { index, axis }),
        other => Ok(other),
    }
}

impl ToolpathFile {
    /// Interpret the command list as straight moves
    pub fn to_geometry(&self) -> Result<ToolpathGeometry, GeometryError> {
        for (field, value) in [
            ("positionX", self.position_x),
            ("positionY", self.position_y),
            ("positionZ", self.position_z),
            ("rotationB", self.rotation_b),
        ] {
            if !fits_f32(value) {
                return Err(GeometryError::InvalidHeader { field });
            }
        }

        let offset = (self.position_x, self.position_y, self.position_z);
        let mut motion = 0u8;
        let mut feed: Option<f64> = None;
        let mut intensity: Option<f32> = None;
        let mut pos = (0.0f64, 0.0f64, 0.0f64);
        let mut segments = Vec::new();
        let mut bounds: Option<Bounds> = None;
        let mut computed_time = 0.0f64;

        for (index, cmd) in self.data.iter().enumerate() {
            if let Some(code) = cmd.g {
                if code > 1 {
                    return Err(GeometryError::UnsupportedMotion { index, code });
                }
                motion = code;
            }
            let x = finite(cmd.x, index, 'X')?;
            let y = finite(cmd.y, index, 'Y')?;
            let z = finite(cmd.z, index, 'Z')?;
            finite(cmd.b, index, 'B')?;
            if let Some(f) = finite(cmd.f, index, 'F')? {
                feed = Some(f);
            }
            if let Some(s) = finite(cmd.s, index, 'S')? {
                intensity = Some(s as f32);
            }

            if x.is_none() && y.is_none() && z.is_none() {
                continue;
            }

            let next = (x.unwrap_or(pos.0), y.unwrap_or(pos.1), z.unwrap_or(pos.2));
            let from = Point3D::new(
                (pos.0 + offset.0) as f32,
                (pos.1 + offset.1) as f32,
                (pos.2 + offset.2) as f32,
            );
            let to = Point3D::new(
                (next.0 + offset.0) as f32,
                (next.1 + offset.1) as f32,
                (next.2 + offset.2) as f32,
            );
            // The offset can still push a coordinate out of range
            for (axis, v) in [('X', to.x), ('Y', to.y), ('Z', to.z)] {
                if !v.is_finite() {
                    return Err(GeometryError::NonFinite { index, axis });
                }
            }

            match bounds.as_mut() {
                Some(b) => b.update(to),
                None => {
                    let mut b = Bounds::at(from);
                    b.update(to);
                    bounds = Some(b);
                }
            }

            let rapid = motion == 0;
            if !rapid {
                if let Some(f) = feed.filter(|f| *f > 0.0) {
                    computed_time += f64::from(from.distance(&to)) / f * 60.0;
                }
            }

            segments.push(Segment {
                from,
                to,
                rapid,
                intensity: if rapid { None } else { intensity },
            });
            pos = next;
        }

        let estimated_time = match self.estimated_time {
            Some(t) if t.is_finite() && t >= 0.0 => t,
            _ => computed_time,
        };

        let rotary = match (self.is_rotate, self.diameter) {
            (true, Some(diameter)) if diameter.is_finite() => Some(RotaryInfo {
                diameter,
                rotation_b: self.rotation_b,
            }),
            (true, _) => return Err(GeometryError::InvalidHeader { field: "diameter" }),
            (false, _) => None,
        };

        Ok(ToolpathGeometry {
            head_type: self.head_type,
            mode: self.mode.clone(),
            segments,
            bounds,
            estimated_time,
            rotary,
        })
    }
}

/// A loaded, fully parsed result ready for the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Result-file reference the artifact was loaded from
    pub file: String,
    pub geometry: ToolpathGeometry,
}
