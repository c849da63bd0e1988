//! Replay configuration and the dataset catalog.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options recognised by the replay core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Source units per target unit (1000 = millimetres to metres)
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Playback speed in frames per second
    #[serde(default = "default_framerate")]
    pub animation_framerate: f64,

    /// Joint rows expected per frame, used for the playback range
    #[serde(default = "default_joints_per_frame")]
    pub joints_per_frame: usize,

    /// Per-frame diagnostics
    #[serde(default = "default_debug_logging")]
    pub debug_logging: bool,

    /// Delay before the deferred hand-rotation pass
    #[serde(default = "default_hand_delay_ms")]
    pub hand_delay_ms: u64,

    /// Translate joints that did not move by the hips' motion
    #[serde(default)]
    pub fix_static_joints: bool,

    /// Known trajectory files by label
    #[serde(default)]
    pub datasets: DatasetCatalog,
}

fn default_scale() -> f64 { 1000.0 }
fn default_framerate() -> f64 { 2.0 }
fn default_joints_per_frame() -> usize { 18 }
fn default_debug_logging() -> bool { true }
fn default_hand_delay_ms() -> u64 { 10 }

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            animation_framerate: default_framerate(),
            joints_per_frame: default_joints_per_frame(),
            debug_logging: default_debug_logging(),
            hand_delay_ms: default_hand_delay_ms(),
            fix_static_joints: false,
            datasets: DatasetCatalog::default(),
        }
    }
}

impl ReplayConfig {
    /// Loads and validates a JSON config file. Missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ReplayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scale must be finite and non-zero, got {}",
                self.scale
            )));
        }
        if !self.animation_framerate.is_finite() || self.animation_framerate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "animation_framerate must be positive, got {}",
                self.animation_framerate
            )));
        }
        if self.joints_per_frame == 0 {
            return Err(ConfigError::Invalid("joints_per_frame must be at least 1".into()));
        }
        Ok(())
    }

    /// Wait between two frames of playback.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.animation_framerate)
    }

    pub fn hand_delay(&self) -> Duration {
        Duration::from_millis(self.hand_delay_ms)
    }
}

// ============================================================================
// DATASET CATALOG
// ============================================================================

/// One selectable trajectory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Human-readable label
    pub label: String,

    /// File name relative to the data directory
    pub file: String,

    /// Source video index reported to the presentation layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<u32>,
}

impl DatasetEntry {
    fn new(label: &str, file: &str, video: Option<u32>) -> Self {
        Self {
            label: label.to_string(),
            file: file.to_string(),
            video,
        }
    }
}

/// Ordered label -> file mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetCatalog {
    entries: Vec<DatasetEntry>,
}

impl Default for DatasetCatalog {
    fn default() -> Self {
        Self {
            entries: vec![
                DatasetEntry::new("Annotations video 1", "csv_traj_ann_1.csv", Some(1)),
                DatasetEntry::new("Annotations video 2", "csv_traj_ann_2.csv", Some(2)),
                DatasetEntry::new("Annotations video 3", "csv_traj_ann_3.csv", Some(3)),
                DatasetEntry::new("YOLO full videos", "csv_traj_YOLO_full.csv", None),
                DatasetEntry::new("YOLO finetuned full videos", "csv_traj_YOLO_ft_full.csv", None),
            ],
        }
    }
}

impl DatasetCatalog {
    pub fn new(entries: Vec<DatasetEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&DatasetEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Path of the file behind `label` inside `data_dir`.
    pub fn resolve(&self, label: &str, data_dir: &Path) -> Result<PathBuf, ConfigError> {
        self.get(label)
            .map(|entry| data_dir.join(&entry.file))
            .ok_or_else(|| ConfigError::UnknownDataset(label.to_string()))
    }
}
