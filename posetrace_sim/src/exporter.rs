//! JSON exporter for reconstructed poses.
//!
//! Exports the global joint positions of every replayed frame so they can be
//! inspected or plotted outside the replay tool.

use nalgebra::Vector3;
use posetrace_core::{CoordinateMapper, FrameRange, FrameReport, Rig, SkeletonInstance};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Global position of one joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointPosition {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Same position in the trajectory file's axes and units
    pub source: [f64; 3],
}

impl JointPosition {
    pub fn new(name: &str, pos: Vector3<f64>, mapper: &CoordinateMapper) -> Self {
        let raw = mapper.unmap(pos);
        Self {
            name: name.to_string(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            source: [raw.x, raw.y, raw.z],
        }
    }
}

/// A single reconstructed frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseFrame {
    pub frame: i64,

    /// Global yaw applied to the body, in degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaw_degrees: Option<f64>,

    /// Global joint positions in rig declaration order
    pub joints: Vec<JointPosition>,

    /// Steps skipped while assembling this frame
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl PoseFrame {
    /// Snapshots `rig` after `report`'s frame has been applied.
    pub fn capture(report: &FrameReport, rig: &Rig, mapper: &CoordinateMapper) -> Self {
        let joints = rig
            .handles()
            .map(|(handle, name)| JointPosition::new(name, rig.global_position(handle), mapper))
            .collect();

        Self {
            frame: report.frame,
            yaw_degrees: report.yaw_degrees,
            joints,
            issues: report.issues.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Complete pose export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseExport {
    /// Trajectory file or dataset label
    pub source: String,

    /// Frames covered by the export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_range: Option<FrameRange>,

    /// All frames
    pub frames: Vec<PoseFrame>,
}

impl PoseExport {
    /// Creates a new export container.
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            frame_range: None,
            frames: Vec::new(),
        }
    }

    /// Adds a frame, widening the covered range.
    pub fn add_frame(&mut self, frame: PoseFrame) {
        self.frame_range = Some(match self.frame_range {
            Some(range) => FrameRange::new(range.start.min(frame.frame), range.end.max(frame.frame)),
            None => FrameRange::new(frame.frame, frame.frame),
        });
        self.frames.push(frame);
    }

    /// Number of frames with at least one skipped step.
    pub fn degraded_frames(&self) -> usize {
        self.frames.iter().filter(|f| !f.issues.is_empty()).count()
    }

    /// Writes to a JSON file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
