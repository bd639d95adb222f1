//! Async screen control on tokio.
//!
//! The async driver shares one motion model with the blocking
//! [`Screen`](crate::Screen) and adds what a runtime makes possible:
//! cancellable sends and automatic stops that fire on their own.
//!
//! # Shared State Pattern
//!
//! [`AsyncScreen`] keeps its transport and [`MotionCore`](crate::motion::MotionCore)
//! in a [`SharedScreenState`] behind an `Arc`. The automatic stop task holds
//! a second `Arc` to the same state:
//!
//! ```text
//! AsyncScreen ──┬── Arc<SharedScreenState> ── Mutex<transport + core>
//!               └── AutoStopHandle ── task ── Arc<SharedScreenState>
//! ```

pub mod auto_stop;
pub mod screen;
pub mod shared;

pub use auto_stop::*;
pub use screen::*;
pub use shared::*;
