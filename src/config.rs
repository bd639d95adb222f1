//! Screen configuration.
//!
//! Everything needed to construct a driver: where the screen is, which
//! address it answers to, how long it takes to travel, and where it starts.
//!
//! # Example
//!
//! ```rust
//! use xyscreens::config::{ScreenConfig, TimeoutConfig};
//! use xyscreens::{Address, Endpoint};
//!
//! let config = ScreenConfig::tcp("192.168.1.100", 9997)
//!     .with_address(Address::from(0x01))
//!     .with_durations(30.0, Some(25.0))
//!     .with_initial_position(50.0)
//!     .with_timeouts(TimeoutConfig::default().with_connect_ms(1500));
//!
//! config.validate().unwrap();
//! assert_eq!(config.endpoint().unwrap(), Endpoint::tcp("192.168.1.100", 9997));
//! assert_eq!(config.profile().unwrap().up_secs(), 25.0);
//! ```

use core::time::Duration;

use crate::commands::{Address, CommandSet};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::tracker::{validate_position, PositionTracker, TravelProfile, POSITION_UP};

/// Default full-travel time, seconds.
pub const DEFAULT_DURATION_SECS: f32 = 30.0;

/// Default TCP connect and write timeout, milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Timeouts
// ============================================================================

/// Transport timeouts.
///
/// `connect_ms` is one deadline for reaching the device: resolving and trying
/// each address over TCP, opening the port for async serial. `write_ms`
/// bounds the write, and is the port timeout of the blocking serial
/// transport. A whole send takes at most [`TimeoutConfig::total`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimeoutConfig {
    /// Connect timeout in milliseconds
    pub connect_ms: u64,
    /// Write timeout in milliseconds
    pub write_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: DEFAULT_TIMEOUT_MS,
            write_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl TimeoutConfig {
    /// Set the connect timeout
    pub fn with_connect_ms(mut self, ms: u64) -> Self {
        self.connect_ms = ms;
        self
    }

    /// Set the write timeout
    pub fn with_write_ms(mut self, ms: u64) -> Self {
        self.write_ms = ms;
        self
    }

    /// Connect timeout, never zero.
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms.max(1))
    }

    /// Write timeout, never zero.
    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_ms.max(1))
    }

    /// Upper bound for one whole send.
    pub fn total(&self) -> Duration {
        self.connect() + self.write()
    }
}

// ============================================================================
// Screen Config
// ============================================================================

/// Complete driver configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScreenConfig {
    /// Device string: serial path or `host:port`
    pub device: String,
    /// Receiver address
    pub address: Address,
    /// Seconds for full travel down
    pub down_duration_secs: f32,
    /// Seconds for full travel up; defaults to the down duration
    pub up_duration_secs: Option<f32>,
    /// Position assumed at startup
    pub initial_position: f32,
    /// Transport timeouts
    pub timeouts: TimeoutConfig,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".into(),
            address: Address::default(),
            down_duration_secs: DEFAULT_DURATION_SECS,
            up_duration_secs: None,
            initial_position: POSITION_UP,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl ScreenConfig {
    /// Configuration for any device string.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    /// Configuration for a serial port.
    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(path)
    }

    /// Configuration for a serial-over-IP bridge.
    pub fn tcp(host: &str, port: u16) -> Self {
        Self::new(Endpoint::tcp(host, port).to_string())
    }

    /// Set the device string
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set the receiver address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Set both travel durations
    pub fn with_durations(mut self, down_secs: f32, up_secs: Option<f32>) -> Self {
        self.down_duration_secs = down_secs;
        self.up_duration_secs = up_secs;
        self
    }

    /// Set the starting position
    pub fn with_initial_position(mut self, position: f32) -> Self {
        self.initial_position = position;
        self
    }

    /// Set transport timeouts
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Check every field without touching the device.
    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;
        self.tracker()?;
        Ok(())
    }

    /// Parsed device string.
    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::parse(&self.device)
    }

    /// Validated travel profile.
    pub fn profile(&self) -> Result<TravelProfile> {
        let up = self.up_duration_secs.unwrap_or(self.down_duration_secs);
        Ok(TravelProfile::new(self.down_duration_secs, up)?)
    }

    /// Tracker at the configured starting position.
    pub fn tracker(&self) -> Result<PositionTracker> {
        let initial = validate_position(self.initial_position)?;
        Ok(PositionTracker::new(self.profile()?, initial)?)
    }

    /// Command table for the configured address.
    pub fn commands(&self) -> CommandSet {
        CommandSet::new(self.address.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValidationError};

    #[test]
    fn defaults() {
        let config = ScreenConfig::default();
        assert_eq!(config.initial_position, 0.0);
        assert_eq!(config.address, Address::default());
        assert_eq!(config.timeouts.connect(), Duration::from_millis(3000));
        config.validate().unwrap();
    }

    #[test]
    fn up_duration_defaults_to_down() {
        let config = ScreenConfig::serial("COM1").with_durations(20.0, None);
        let profile = config.profile().unwrap();
        assert_eq!(profile.down_secs(), 20.0);
        assert_eq!(profile.up_secs(), 20.0);
    }

    #[test]
    fn tcp_constructor_round_trips() {
        let config = ScreenConfig::tcp("::1", 9997);
        assert_eq!(config.device, "[::1]:9997");
        assert_eq!(config.endpoint().unwrap(), Endpoint::tcp("::1", 9997));
    }

    #[test]
    fn invalid_fields_fail_validation() {
        let bad_duration = ScreenConfig::default().with_durations(0.0, None);
        assert!(matches!(
            bad_duration.validate(),
            Err(Error::Validation(ValidationError::Duration(_)))
        ));

        let bad_position = ScreenConfig::default().with_initial_position(101.0);
        assert!(matches!(
            bad_position.validate(),
            Err(Error::Validation(ValidationError::Position(_)))
        ));

        let bad_device = ScreenConfig::new("host:notaport");
        assert!(matches!(bad_device.validate(), Err(Error::Parse { .. })));
    }

    #[test]
    fn zero_timeouts_are_clamped() {
        let timeouts = TimeoutConfig::default().with_connect_ms(0).with_write_ms(0);
        assert_eq!(timeouts.connect(), Duration::from_millis(1));
        assert_eq!(timeouts.total(), Duration::from_millis(2));
    }
}
