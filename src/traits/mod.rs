//! Trait definitions for transports and time sources.
//!
//! These are the seams that let the screen logic run against real serial
//! ports and sockets in production and against mocks in tests.
//!
//! # Submodules
//!
//! - `transport`: sending command frames, blocking and async
//! - `hardware`: clocks and blocking delays
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Transport`] | Deliver one frame, blocking |
//! | [`AsyncTransport`] | Deliver one frame from async code |
//! | [`Clock`] | Monotonic milliseconds |
//! | [`Delay`] | Blocking sleep used by the wait-for-arrival calls |

pub mod hardware;
pub mod transport;

pub use hardware::*;
pub use transport::*;
