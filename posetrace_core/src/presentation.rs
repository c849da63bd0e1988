//! Presentation Adapter - the outward-facing side of playback.
//!
//! Implemented by whatever shows the skeleton (a UI, a console, a test
//! recorder). The core only issues notifications; it never reads back.

use crate::sample_table::FrameRange;
use serde::{Deserialize, Serialize};

/// Metadata about an opened trajectory, sent once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Where the samples came from (file path or dataset label)
    pub source: String,

    /// Source video index, when the dataset maps to one
    pub video: Option<u32>,

    /// First and last frame present in the table
    pub frame_range: Option<FrameRange>,

    /// Frames that playback steps through
    pub playback_range: Option<FrameRange>,

    /// Number of parsed samples
    pub sample_count: usize,
}

/// Receiver of playback progress.
pub trait PresentationAdapter {
    /// A session was opened. Default: ignored.
    fn on_session_loaded(&mut self, _info: &SessionInfo) {}

    /// `frame` has been fully applied to the skeleton.
    fn on_frame_advanced(&mut self, frame: i64);

    /// Playback ran through its last frame. Not sent when stopped early.
    fn on_playback_finished(&mut self);
}
