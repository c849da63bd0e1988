//! Error types for table loading, configuration, pose assembly and playback.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors while opening a trajectory table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The source could not be read at all
    #[error("Failed to read trajectory table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source was readable but contained no usable sample rows
    #[error("Trajectory table contains no valid samples ({rejected} rows rejected)")]
    NoSamples { rejected: usize },
}

/// Recoverable error for a single malformed row.
///
/// Rows failing with one of these are skipped; the load continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    /// Fewer than the five mandatory fields
    #[error("expected at least 5 fields, found {0}")]
    MissingField(usize),

    /// Frame field is not an integer
    #[error("invalid frame number {0:?}")]
    InvalidFrame(String),

    /// Joint name field is empty
    #[error("empty joint name")]
    EmptyJointName,

    /// A coordinate field is not a number
    #[error("invalid {axis} coordinate {value:?}")]
    InvalidCoordinate { axis: char, value: String },

    /// The row could not be split into fields
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors while loading or validating a replay configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `ReplayConfig`
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Dataset label not present in the catalog
    #[error("Unknown dataset {0:?}")]
    UnknownDataset(String),
}

/// Recoverable errors raised by a single pose-assembly step.
///
/// The assembler never propagates these; they are logged and collected in
/// the frame report while the rest of the frame proceeds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoseError {
    /// Expected joint name missing from the skeleton instance
    #[error("joint {0:?} not found in skeleton")]
    JointNotFound(String),

    /// Zero-length direction where a direction is required
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl PoseError {
    /// Creates a joint lookup error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::JointNotFound(name.into())
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(what: impl Into<String>) -> Self {
        Self::DegenerateGeometry(what.into())
    }
}

/// Errors that prevent a playback run from starting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// A playback is already active on this sequencer
    #[error("playback already running")]
    AlreadyRunning,

    /// The requested frame range contains no frames
    #[error("empty frame range {start}..={end}")]
    EmptyRange { start: i64, end: i64 },

    /// Framerate must be strictly positive and finite
    #[error("invalid framerate {0}")]
    InvalidFramerate(f64),
}
