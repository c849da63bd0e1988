//! PoseTrace Core - Skeletal Pose Replay from Per-Joint Trajectory Logs
//!
//! This library turns tabular 3D joint samples into skeleton poses:
//! 1. **Sample Table**: tolerant parsing of `frame;joint;x;y;z[;visibility]` rows
//! 2. **Pose Assembly**: rest-pose reset, hip/head/neck reconciliation, spine
//!    re-placement and a global yaw derived from the hip line
//! 3. **Playback**: cooperative, interruptible frame sequencing over an
//!    injected clock, with a deferred hand pass per frame

pub mod assembler;
pub mod config;
pub mod coords;
pub mod error;
pub mod presentation;
pub mod rest_pose;
pub mod rig;
pub mod sample_table;
pub mod sequencer;
pub mod session;
pub mod skeleton;

// Re-export key types for convenience
pub use assembler::{FrameReport, PendingPose, PoseAssembler};
pub use config::{DatasetCatalog, DatasetEntry, ReplayConfig};
pub use coords::CoordinateMapper;
pub use error::{ConfigError, PlaybackError, PoseError, RowError, TableError};
pub use presentation::{PresentationAdapter, SessionInfo};
pub use rig::{Rig, RigDefinition};
pub use sample_table::{FrameRange, RawSample, SampleTable};
pub use sequencer::{PlaybackOutcome, PlaybackReport, PlaybackSequencer, PlaybackState, StopHandle};
pub use session::ReplaySession;
pub use skeleton::{joints, JointHandle, SkeletonInstance};
