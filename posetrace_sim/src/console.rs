//! Console presentation: playback progress as log lines.

use posetrace_core::{PresentationAdapter, SessionInfo};
use tracing::info;

/// Logs `Frame: N` for every applied frame, tagged with the source video.
#[derive(Debug, Default)]
pub struct ConsoleAdapter {
    video: Option<u32>,
    frames_shown: usize,
    finished: bool,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame notifications received so far.
    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl PresentationAdapter for ConsoleAdapter {
    fn on_session_loaded(&mut self, info: &SessionInfo) {
        self.video = info.video;
        self.frames_shown = 0;
        self.finished = false;

        info!("Trajectory: {} ({} samples)", info.source, info.sample_count);
        match info.video {
            Some(video) => info!("Video: {}", video),
            None => info!("Video: -"),
        }
        if let Some(range) = info.playback_range {
            info!("Frames: {}..={}", range.start, range.end);
        }
    }

    fn on_frame_advanced(&mut self, frame: i64) {
        self.frames_shown += 1;
        match self.video {
            Some(video) => info!("Frame: {} (video {})", frame, video),
            None => info!("Frame: {}", frame),
        }
    }

    fn on_playback_finished(&mut self) {
        self.finished = true;
        info!("Playback finished");
    }
}
