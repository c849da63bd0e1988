//! Playback Sequencer - cooperative, interruptible frame-by-frame playback.
//!
//! # State machine
//!
//! ```text
//!          play()                   last frame done
//!   Idle ─────────► Running ─────────────────────────► Idle  (on_playback_finished)
//!                      │
//!                      │ stop requested, seen at a frame boundary
//!                      └─────────────────────────────► Idle  (no finished notification)
//! ```
//!
//! Each frame: assemble steps 1-8, yield for the hand delay, run the hand
//! pass, notify the adapter, yield for the rest of the frame interval, then
//! check the stop flag. Frame N is complete before frame N+1 starts.

use crate::assembler::{FrameReport, PoseAssembler};
use crate::config::ReplayConfig;
use crate::error::PlaybackError;
use crate::presentation::PresentationAdapter;
use crate::sample_table::{FrameRange, SampleTable};
use crate::skeleton::SkeletonInstance;
use posetrace_env::ReplayContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Observable state of a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
}

/// How a playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every frame of the range was shown
    Completed,

    /// A stop request was honoured after `at_frame`
    Stopped { at_frame: i64 },
}

/// Summary of one playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    pub outcome: PlaybackOutcome,

    /// Frames applied and announced
    pub frames_played: usize,

    /// Frames on which at least one step was skipped
    pub degraded_frames: usize,
}

/// Cloneable stop switch, settable from any thread or task.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Asks the running playback to end at its next frame boundary.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Reads and clears the flag.
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Returns the sequencer to `Idle` even if the playback future is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives a [`PoseAssembler`] over a frame range at a fixed rate.
pub struct PlaybackSequencer<Ctx: ReplayContext> {
    context: Arc<Ctx>,
    assembler: PoseAssembler,
    frame_interval: Duration,
    hand_delay: Duration,
    running: AtomicBool,
    stop: StopHandle,
    debug_logging: bool,
}

impl<Ctx: ReplayContext> PlaybackSequencer<Ctx> {
    /// Creates a sequencer from a validated configuration.
    pub fn new(context: Arc<Ctx>, config: &ReplayConfig) -> Self {
        Self {
            context,
            assembler: PoseAssembler::new(config),
            frame_interval: config.frame_interval(),
            hand_delay: config.hand_delay(),
            running: AtomicBool::new(false),
            stop: StopHandle::default(),
            debug_logging: config.debug_logging,
        }
    }

    /// Changes the playback rate for subsequent runs.
    pub fn set_framerate(&mut self, framerate: f64) -> Result<(), PlaybackError> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(PlaybackError::InvalidFramerate(framerate));
        }
        self.frame_interval = Duration::from_secs_f64(1.0 / framerate);
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn state(&self) -> PlaybackState {
        if self.running.load(Ordering::SeqCst) {
            PlaybackState::Running
        } else {
            PlaybackState::Idle
        }
    }

    /// Handle for stopping playback from another context.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    pub fn assembler(&self) -> &PoseAssembler {
        &self.assembler
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.context
    }

    /// Applies one frame, including the deferred hand pass.
    pub async fn show_frame<S>(&self, frame: i64, table: &SampleTable, skeleton: &mut S) -> FrameReport
    where
        S: SkeletonInstance + ?Sized,
    {
        let pending = self.assembler.assemble(frame, table, skeleton);
        // hands read forearm global rotations, which must reflect steps 1-8
        self.context.sleep(self.hand_delay).await;
        pending.finish(skeleton)
    }

    /// Plays `range` (inclusive) and returns how it ended.
    ///
    /// Fails without touching the skeleton if a playback is already running
    /// or the range is empty.
    pub async fn play<S, A>(
        &self,
        table: &SampleTable,
        range: FrameRange,
        skeleton: &mut S,
        adapter: &mut A,
    ) -> Result<PlaybackReport, PlaybackError>
    where
        S: SkeletonInstance + ?Sized,
        A: PresentationAdapter + ?Sized,
    {
        if range.is_empty() {
            return Err(PlaybackError::EmptyRange {
                start: range.start,
                end: range.end,
            });
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PlaybackError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);
        self.stop.clear();

        info!(
            "Starting playback of frames {}..={} ({} frames, {:?} per frame)",
            range.start,
            range.end,
            range.len(),
            self.frame_interval
        );
        let started = self.context.now();

        let mut frames_played = 0;
        let mut degraded_frames = 0;

        for frame in range.frames() {
            let report = self.show_frame(frame, table, skeleton).await;
            if !report.is_clean() {
                degraded_frames += 1;
            }
            adapter.on_frame_advanced(frame);
            frames_played += 1;

            self.context
                .sleep(self.frame_interval.saturating_sub(self.hand_delay))
                .await;

            if self.stop.take() {
                info!("Animation stopped at frame {}", frame);
                return Ok(PlaybackReport {
                    outcome: PlaybackOutcome::Stopped { at_frame: frame },
                    frames_played,
                    degraded_frames,
                });
            }
        }

        if self.debug_logging {
            debug!("Playback took {:?}", self.context.now().saturating_sub(started));
        }
        info!("Playback finished after {} frames", frames_played);
        self.stop.clear();
        adapter.on_playback_finished();

        Ok(PlaybackReport {
            outcome: PlaybackOutcome::Completed,
            frames_played,
            degraded_frames,
        })
    }
}
