//! PoseTrace Replay CLI
//!
//! Reconstruct and play back skeleton poses from a per-joint trajectory log.

use clap::Parser;
use posetrace_core::{PlaybackOutcome, ReplayConfig, ReplaySession, Rig};
use posetrace_env::{ReplayContext, TokioContext};
use posetrace_sim::{
    export_range, open_session, play_interactive, show_single_frame, write_export, ConsoleAdapter,
    ReplayError, SimContext, TrajectorySource,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// PoseTrace trajectory replay CLI
#[derive(Parser, Debug)]
#[command(name = "posetrace")]
#[command(about = "Replay skeletal poses from per-joint trajectory logs", long_about = None)]
struct Args {
    /// Trajectory file (frame;joint;x;y;z[;visibility])
    #[arg(short, long, conflicts_with = "dataset")]
    csv: Option<PathBuf>,

    /// Dataset label from the catalog (see --list-datasets)
    #[arg(short = 'D', long)]
    dataset: Option<String>,

    /// Directory holding the catalog's trajectory files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// JSON config file (missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override: source units per metre
    #[arg(long)]
    scale: Option<f64>,

    /// Override: playback frames per second
    #[arg(short, long)]
    framerate: Option<f64>,

    /// Override: joint rows per frame
    #[arg(short, long)]
    joints_per_frame: Option<usize>,

    /// Run on a virtual clock (no real waiting)
    #[arg(long)]
    virtual_clock: bool,

    /// Show a single frame instead of playing
    #[arg(long)]
    frame: Option<i64>,

    /// Export reconstructed joint positions of every frame to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// List catalog datasets and exit
    #[arg(long)]
    list_datasets: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,
}

impl Args {
    fn load_config(&self) -> Result<ReplayConfig, ReplayError> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::load(path)?,
            None => ReplayConfig::default(),
        };
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(framerate) = self.framerate {
            config.animation_framerate = framerate;
        }
        if let Some(joints_per_frame) = self.joints_per_frame {
            config.joints_per_frame = joints_per_frame;
        }
        config.debug_logging = config.debug_logging && self.verbose;
        config.validate()?;
        Ok(config)
    }

    fn source(&self) -> Result<TrajectorySource, ReplayError> {
        match (&self.csv, &self.dataset) {
            (Some(path), _) => Ok(TrajectorySource::File(path.clone())),
            (None, Some(label)) => Ok(TrajectorySource::Dataset {
                label: label.clone(),
                data_dir: self.data_dir.clone(),
            }),
            (None, None) => Err(ReplayError::NoInput),
        }
    }
}

/// Runs the selected mode against one context.
async fn run<Ctx: ReplayContext>(
    args: &Args,
    context: Arc<Ctx>,
    config: ReplayConfig,
) -> Result<(), ReplayError> {
    let source = args.source()?;
    let mut session: ReplaySession<Ctx, Rig> = open_session(context, config, &source)?;

    if let Some(frame) = args.frame {
        let pose = show_single_frame(&mut session, frame).await?;
        if args.json {
            println!("{}", serde_json::json!(pose));
        } else {
            info!("Frame: {}", pose.frame);
            for joint in &pose.joints {
                info!("  {:<10} ({:>8.4}, {:>8.4}, {:>8.4})", joint.name, joint.x, joint.y, joint.z);
            }
        }
        return Ok(());
    }

    if let Some(path) = &args.export {
        let range = session.info().playback_range.ok_or(ReplayError::NoPlayableFrames)?;
        let export = export_range(&mut session, range).await;
        write_export(&export, path)?;
        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "source": export.source,
                    "frames": export.frames.len(),
                    "degraded_frames": export.degraded_frames(),
                    "path": path.display().to_string(),
                })
            );
        }
        return Ok(());
    }

    let mut console = ConsoleAdapter::new();
    let report = play_interactive(&mut session, &mut console).await?;

    if args.json {
        let (outcome, at_frame) = match report.outcome {
            PlaybackOutcome::Completed => ("completed", None),
            PlaybackOutcome::Stopped { at_frame } => ("stopped", Some(at_frame)),
        };
        println!(
            "{}",
            serde_json::json!({
                "source": session.info().source,
                "outcome": outcome,
                "stopped_at": at_frame,
                "frames_played": report.frames_played,
                "degraded_frames": report.degraded_frames,
            })
        );
    } else {
        match report.outcome {
            PlaybackOutcome::Completed => info!("✓ {} frames played", report.frames_played),
            PlaybackOutcome::Stopped { at_frame } => {
                info!("■ Stopped at frame {} after {} frames", at_frame, report.frames_played)
            }
        }
        if report.degraded_frames > 0 {
            info!("{} frames had skipped steps (see warnings)", report.degraded_frames);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if args.list_datasets {
        for entry in config.datasets.entries() {
            match entry.video {
                Some(video) => println!("{:<28} {} (video {})", entry.label, entry.file, video),
                None => println!("{:<28} {}", entry.label, entry.file),
            }
        }
        return;
    }

    if !args.json {
        info!("PoseTrace Replay v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let result = if args.virtual_clock {
        run(&args, SimContext::shared(), config).await
    } else {
        run(&args, TokioContext::shared(), config).await
    };

    if let Err(e) = result {
        error!("✗ {}", e);
        std::process::exit(1);
    }
}
