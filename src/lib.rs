//! # xyscreens
//!
//! A driver for XY Screens projector screens and projector lifts, over a
//! local serial port or a serial-over-IP bridge.
//!
//! ## Features
//!
//! - **Position tracking without feedback**: the screen reports nothing, so
//!   the position is estimated from elapsed time and the travel durations
//! - **Automatic stops**: every movement is paired with exactly one Stop, at
//!   full travel or at the requested position
//! - **Blocking and async drivers**: one motion model behind both, with
//!   cancellation on the async side
//! - **Serial and TCP**: per-call connections with bounded timeouts
//!
//! ## Architecture
//!
//! - `commands` - Frame encoding for the receiver command set
//! - `tracker` - Time-based position model
//! - `motion` - Planning and automatic stop bookkeeping, no I/O
//! - `screen` - Blocking controller
//! - `services` - Async controller on tokio
//! - `traits` - Transport and clock abstractions
//! - `hal` - Concrete transports, clocks, and mocks
//!
//! ## Example
//!
//! ```rust
//! use xyscreens::hal::{MockClock, MockTransport};
//! use xyscreens::{CommandSet, PositionTracker, Screen, TravelProfile};
//!
//! let transport = MockTransport::new();
//! let clock = MockClock::new();
//! let tracker = PositionTracker::new(TravelProfile::symmetric(30.0).unwrap(), 0.0).unwrap();
//! let mut screen = Screen::new(transport.clone(), clock.clone(), CommandSet::default(), tracker);
//!
//! // Half way down
//! screen.set_position_and_wait(50.0).unwrap();
//! assert_eq!(clock.now_ms(), 15_000);
//! assert_eq!(screen.position(), 50.0);
//! ```
//!
//! Against real hardware, build from a [`ScreenConfig`](config::ScreenConfig):
//!
//! ```rust,no_run
//! use xyscreens::{config::ScreenConfig, Address, Screen};
//!
//! # fn main() -> xyscreens::Result<()> {
//! let config = ScreenConfig::tcp("192.168.1.100", 9997)
//!     .with_address(Address::from(0x01))
//!     .with_durations(30.0, Some(25.0));
//! let mut screen = Screen::from_config(&config)?;
//! screen.down_and_wait()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Frame encoding for the receiver command set.
pub mod commands;
/// Device string parsing.
pub mod endpoint;
/// Error types.
pub mod error;
/// Transports, clocks, and mocks.
pub mod hal;
/// Motion planning shared by both drivers.
pub mod motion;
/// Blocking screen controller.
pub mod screen;
/// Async screen controller.
pub mod services;
/// Time-based position model.
pub mod tracker;
/// Transport and clock traits.
pub mod traits;

/// Driver configuration.
pub mod config;

// Re-exports for convenience
pub use commands::{Address, Channel, CommandSet, Frame, Operation};
pub use config::{ScreenConfig, TimeoutConfig};
pub use endpoint::Endpoint;
pub use error::{Error, Result, ValidationError};
pub use motion::{AutoStop, MotionCore, Plan};
pub use screen::Screen;
pub use services::{Arrival, AsyncScreen};
pub use tracker::{
    Direction, MotionState, PositionTracker, ScreenState, TravelProfile, POSITION_DOWN,
    POSITION_EPSILON, POSITION_UP,
};
pub use traits::{AsyncTransport, Clock, Delay, Transport};
