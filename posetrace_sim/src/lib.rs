//! PoseTrace Replay Harness
//!
//! This crate drives the replay core from the command line:
//! - **Time**: a virtual clock (`SimContext`) for instant, reproducible
//!   replays, or the real Tokio clock for paced playback
//! - **Presentation**: a console adapter that logs frame progress
//! - **Export**: reconstructed global joint positions as JSON
//!
//! # Usage
//!
//! ```ignore
//! use posetrace_sim::{open_session, ConsoleAdapter, SimContext, TrajectorySource};
//!
//! let source = TrajectorySource::File("csv_traj_ann_1.csv".into());
//! let mut session = open_session(SimContext::shared(), ReplayConfig::default(), &source)?;
//! let mut console = ConsoleAdapter::new();
//! session.present(&mut console).await;
//! session.play(&mut console).await?;
//! ```

mod console;
mod context;
mod exporter;
mod replay;

pub use console::ConsoleAdapter;
pub use context::SimContext;
pub use exporter::{JointPosition, PoseExport, PoseFrame};
pub use replay::{
    export_range, open_session, play_interactive, show_single_frame, write_export, ReplayError,
    TrajectorySource,
};
