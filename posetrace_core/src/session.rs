//! Replay session - one opened trajectory bound to one skeleton instance.

use crate::assembler::FrameReport;
use crate::config::ReplayConfig;
use crate::error::{ConfigError, PlaybackError};
use crate::presentation::{PresentationAdapter, SessionInfo};
use crate::sample_table::{FrameRange, SampleTable};
use crate::sequencer::{PlaybackReport, PlaybackSequencer, StopHandle};
use crate::skeleton::SkeletonInstance;
use posetrace_env::ReplayContext;
use std::sync::Arc;
use tracing::info;

/// Owns the sample table, the skeleton and the sequencer for one trajectory.
///
/// Opening a new trajectory means building a new session; nothing is shared
/// between sessions except the context.
pub struct ReplaySession<Ctx: ReplayContext, S: SkeletonInstance> {
    config: ReplayConfig,
    table: SampleTable,
    skeleton: S,
    sequencer: PlaybackSequencer<Ctx>,
    info: SessionInfo,
}

impl<Ctx: ReplayContext, S: SkeletonInstance> ReplaySession<Ctx, S> {
    /// Binds a loaded table to a skeleton. The configuration is validated.
    pub fn new(
        context: Arc<Ctx>,
        config: ReplayConfig,
        table: SampleTable,
        skeleton: S,
        source: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let info = SessionInfo {
            source: source.into(),
            video: None,
            frame_range: table.frame_range(),
            playback_range: table.playback_range(config.joints_per_frame),
            sample_count: table.len(),
        };
        info!(
            "Opened {} ({} samples, {} rows rejected)",
            info.source,
            info.sample_count,
            table.rejected().len()
        );

        let sequencer = PlaybackSequencer::new(context, &config);
        Ok(Self {
            config,
            table,
            skeleton,
            sequencer,
            info,
        })
    }

    /// Tags the session with the video its dataset was taken from.
    pub fn with_video(mut self, video: Option<u32>) -> Self {
        self.info.video = video;
        self
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn table(&self) -> &SampleTable {
        &self.table
    }

    pub fn skeleton(&self) -> &S {
        &self.skeleton
    }

    pub fn sequencer(&self) -> &PlaybackSequencer<Ctx> {
        &self.sequencer
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.sequencer.stop_handle()
    }

    /// Announces the session and shows its first playback frame.
    pub async fn present<A>(&mut self, adapter: &mut A) -> Option<FrameReport>
    where
        A: PresentationAdapter + ?Sized,
    {
        adapter.on_session_loaded(&self.info);
        let first = self.info.playback_range?.start;
        let report = self.show_frame(first).await;
        adapter.on_frame_advanced(first);
        Some(report)
    }

    /// Poses the skeleton at a single frame.
    pub async fn show_frame(&mut self, frame: i64) -> FrameReport {
        self.sequencer
            .show_frame(frame, &self.table, &mut self.skeleton)
            .await
    }

    /// Plays the session's playback range.
    pub async fn play<A>(&mut self, adapter: &mut A) -> Result<PlaybackReport, PlaybackError>
    where
        A: PresentationAdapter + ?Sized,
    {
        let range = self
            .info
            .playback_range
            .unwrap_or_else(|| FrameRange::new(1, 0));
        self.play_range(range, adapter).await
    }

    /// Plays an explicit inclusive range.
    pub async fn play_range<A>(
        &mut self,
        range: FrameRange,
        adapter: &mut A,
    ) -> Result<PlaybackReport, PlaybackError>
    where
        A: PresentationAdapter + ?Sized,
    {
        self.sequencer
            .play(&self.table, range, &mut self.skeleton, adapter)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::Rig;
    use crate::sample_table::RawSample;
    use crate::sequencer::PlaybackOutcome;
    use crate::skeleton::joints;
    use nalgebra::Vector3;
    use posetrace_env::TokioContext;

    #[derive(Default)]
    struct Events(Vec<String>);

    impl PresentationAdapter for Events {
        fn on_session_loaded(&mut self, info: &SessionInfo) {
            self.0.push(format!("loaded {}", info.source));
        }

        fn on_frame_advanced(&mut self, frame: i64) {
            self.0.push(format!("frame {frame}"));
        }

        fn on_playback_finished(&mut self) {
            self.0.push("finished".into());
        }
    }

    /// Frames 2..=5 with two joints each, so 2 joints per frame.
    fn session() -> ReplaySession<TokioContext, Rig> {
        let table = SampleTable::from_samples((2..=5).flat_map(|f| {
            [
                RawSample::new(f, joints::RHIP, Vector3::new(90.0, f as f64, 950.0)),
                RawSample::new(f, joints::LHIP, Vector3::new(-90.0, f as f64, 950.0)),
            ]
        }));
        let config = ReplayConfig {
            joints_per_frame: 2,
            debug_logging: false,
            ..ReplayConfig::default()
        };
        ReplaySession::new(TokioContext::shared(), config, table, Rig::humanoid(), "walk.csv").unwrap()
    }

    #[test]
    fn test_session_info() {
        let session = session().with_video(Some(2));
        let info = session.info();
        assert_eq!(info.source, "walk.csv");
        assert_eq!(info.video, Some(2));
        assert_eq!(info.frame_range, Some(FrameRange::new(2, 5)));
        assert_eq!(info.playback_range, Some(FrameRange::new(2, 5)));
        assert_eq!(info.sample_count, 8);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ReplayConfig {
            animation_framerate: 0.0,
            ..ReplayConfig::default()
        };
        let result = ReplaySession::new(
            TokioContext::shared(),
            config,
            SampleTable::default(),
            Rig::humanoid(),
            "x",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_present_shows_first_frame() {
        let mut session = session();
        let mut events = Events::default();

        let report = session.present(&mut events).await.unwrap();

        assert_eq!(report.frame, 2);
        assert_eq!(events.0, vec!["loaded walk.csv", "frame 2"]);
        let rhip = session.skeleton().joint(joints::RHIP).unwrap();
        // raw (x, y, z) maps to (x, z, y) / scale
        assert_eq!(
            session.skeleton().local_position(rhip),
            Vector3::new(0.09, 0.95, 0.002)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_whole_session() {
        let mut session = session();
        let mut events = Events::default();

        let report = session.play(&mut events).await.unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Completed);
        assert_eq!(
            events.0,
            vec!["frame 2", "frame 3", "frame 4", "frame 5", "finished"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_empty_session_fails() {
        let table = SampleTable::from_samples([RawSample::new(1, joints::HEAD, Vector3::x())]);
        let mut session = ReplaySession::new(
            TokioContext::shared(),
            ReplayConfig::default(),
            table,
            Rig::humanoid(),
            "tiny.csv",
        )
        .unwrap();
        let mut events = Events::default();

        assert!(session.info().playback_range.is_none());
        assert!(matches!(
            session.play(&mut events).await,
            Err(PlaybackError::EmptyRange { .. })
        ));
    }
}
