//! Replay driver shared by the CLI: input resolution, export and playback.

use crate::console::ConsoleAdapter;
use crate::exporter::{PoseExport, PoseFrame};
use posetrace_core::{
    ConfigError, FrameRange, PlaybackError, PlaybackReport, ReplayConfig, ReplaySession, Rig,
    SampleTable, TableError,
};
use posetrace_env::ReplayContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that end a replay run.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Failed to write export {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither a file nor a dataset label was given
    #[error("no trajectory given (use --csv or --dataset)")]
    NoInput,

    /// Fewer samples than one frame's worth of joints
    #[error("table holds less than one frame of samples")]
    NoPlayableFrames,

    /// Requested frame lies outside the table
    #[error("frame {frame} outside table range {start}..={end}")]
    FrameOutOfRange { frame: i64, start: i64, end: i64 },
}

/// Which trajectory to open.
#[derive(Debug, Clone, PartialEq)]
pub enum TrajectorySource {
    /// A file on disk
    File(PathBuf),

    /// A catalog label, resolved inside a data directory
    Dataset { label: String, data_dir: PathBuf },
}

impl TrajectorySource {
    /// Resolves to a path, a display name and the source video.
    pub fn resolve(&self, config: &ReplayConfig) -> Result<(PathBuf, String, Option<u32>), ReplayError> {
        match self {
            Self::File(path) => Ok((path.clone(), path.display().to_string(), None)),
            Self::Dataset { label, data_dir } => {
                let path = config.datasets.resolve(label, data_dir)?;
                let video = config.datasets.get(label).and_then(|e| e.video);
                Ok((path, label.clone(), video))
            }
        }
    }
}

/// Loads the table behind `source` and binds it to a fresh humanoid rig.
pub fn open_session<Ctx: ReplayContext>(
    context: Arc<Ctx>,
    config: ReplayConfig,
    source: &TrajectorySource,
) -> Result<ReplaySession<Ctx, Rig>, ReplayError> {
    let (path, name, video) = source.resolve(&config)?;
    let table = SampleTable::load(&path)?;
    if !table.rejected().is_empty() {
        warn!("{} rows of {} were rejected", table.rejected().len(), name);
    }
    let session = ReplaySession::new(context, config, table, Rig::humanoid(), name)?;
    Ok(session.with_video(video))
}

/// Reconstructs every frame of `range` and collects the global joint positions.
///
/// Runs at assembly speed; the frame interval is not observed.
pub async fn export_range<Ctx: ReplayContext>(
    session: &mut ReplaySession<Ctx, Rig>,
    range: FrameRange,
) -> PoseExport {
    let mut export = PoseExport::new(&session.info().source);
    for frame in range.frames() {
        let report = session.show_frame(frame).await;
        let mapper = session.sequencer().assembler().mapper();
        export.add_frame(PoseFrame::capture(&report, session.skeleton(), mapper));
    }
    export
}

/// Writes `export` to `path`.
pub fn write_export(export: &PoseExport, path: &Path) -> Result<(), ReplayError> {
    export
        .write_to_file(path)
        .map_err(|source| ReplayError::Export {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Exported {} frames to {}", export.frames.len(), path.display());
    Ok(())
}

/// Poses a single frame, rejecting frames the table does not cover.
pub async fn show_single_frame<Ctx: ReplayContext>(
    session: &mut ReplaySession<Ctx, Rig>,
    frame: i64,
) -> Result<PoseFrame, ReplayError> {
    if let Some(range) = session.info().frame_range {
        if !range.contains(frame) {
            return Err(ReplayError::FrameOutOfRange {
                frame,
                start: range.start,
                end: range.end,
            });
        }
    }
    let report = session.show_frame(frame).await;
    let mapper = session.sequencer().assembler().mapper();
    Ok(PoseFrame::capture(&report, session.skeleton(), mapper))
}

/// Announces the session, shows its first frame and plays it through.
///
/// A `ctrl_c` watcher is spawned on the context and stops playback at the
/// next frame boundary.
pub async fn play_interactive<Ctx: ReplayContext>(
    session: &mut ReplaySession<Ctx, Rig>,
    console: &mut ConsoleAdapter,
) -> Result<PlaybackReport, ReplayError> {
    let stop = session.stop_handle();
    session.sequencer().context().spawn("ctrl_c", async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested");
            stop.request_stop();
        }
    });

    session.present(console).await;
    Ok(session.play(console).await?)
}
