//! posetrace Environment Abstraction Layer
//!
//! This crate provides the clock abstraction that lets the playback
//! sequencer run against **Production** (tokio) time or a **Simulation**
//! (virtual) clock.
//!
//! # Core Concept
//!
//! Playback is cooperative: the only places where a run suspends are the
//! calls to `ReplayContext::sleep`. Swapping the context swaps real waiting
//! for instant virtual-time advancement without touching playback logic.
//!
//! # Example
//!
//! ```ignore
//! use posetrace_env::{ReplayContext, TokioContext};
//!
//! async fn tick_loop<Ctx: ReplayContext>(ctx: &Ctx) {
//!     loop {
//!         advance_frame();
//!         ctx.sleep(Duration::from_millis(500)).await;
//!     }
//! }
//! ```

mod context;
mod tokio_impl;

pub use context::ReplayContext;
pub use tokio_impl::TokioContext;
