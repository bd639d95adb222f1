//! Error types for the screen driver.
//!
//! Every fallible operation returns [`Result`]. The taxonomy is small:
//!
//! - [`Error::Parse`]: a device string could not be parsed. Raised before any I/O.
//! - [`Error::Connection`]: the transport failed (refused, timeout, DNS, write).
//! - [`Error::Validation`]: a parameter was rejected before state or I/O was touched.
//! - [`Error::Cancelled`]: an async operation was aborted through its token.
//!
//! Nothing in the crate retries. A failed send leaves the motion state as it was.

use core::result;
use std::io;

use thiserror::Error;

use crate::endpoint::Endpoint;

/// Result alias used throughout the crate.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur while driving a screen.
#[derive(Error, Debug)]
pub enum Error {
    /// The device string is not a valid endpoint.
    #[error("invalid endpoint {input:?}: {reason}")]
    Parse {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The transport could not deliver a frame.
    #[error("Error while connecting to {} endpoint {endpoint}: {source}", .endpoint.kind())]
    Connection {
        /// The endpoint that failed.
        endpoint: Endpoint,
        /// Underlying I/O cause.
        #[source]
        source: io::Error,
    },

    /// A parameter was out of range.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Builds a [`Error::Connection`] for `endpoint`.
    pub fn connection(endpoint: &Endpoint, source: io::Error) -> Self {
        Error::Connection {
            endpoint: endpoint.clone(),
            source,
        }
    }

    /// Returns true if this is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns true for transport failures.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}

/// Rejected parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Travel durations must be finite and greater than zero.
    #[error("travel duration must be a positive number of seconds, got {0}")]
    Duration(f32),

    /// Positions live in `0.0..=100.0`.
    #[error("position must be between 0 and 100, got {0}")]
    Position(f32),

    /// Channel numbers live in `1..=16`.
    #[error("channel must be between 1 and 16, got {0}")]
    Channel(u8),

    /// Addresses are one to three bytes long.
    #[error("address must be 1 to 3 bytes long, got {0}")]
    AddressLength(usize),

    /// A movement needs a direction.
    #[error("cannot begin a movement without a direction")]
    NoDirection,

    /// The target cannot be reached by continuing the current movement.
    #[error("position {target} is not reachable while moving {direction}")]
    Unreachable {
        /// Requested target.
        target: f32,
        /// Current direction of travel.
        direction: &'static str,
    },

    /// The endpoint needs a transport this build does not include.
    #[error("{0} endpoints are not supported by this build")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_names_endpoint() {
        let endpoint = Endpoint::tcp("192.168.1.100", 9997);
        let err = Error::connection(
            &endpoint,
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        let msg = err.to_string();
        assert!(msg.contains("Error while connecting to TCP endpoint"));
        assert!(msg.contains("192.168.1.100:9997"));
        assert!(err.is_connection());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn validation_converts_into_error() {
        let err: Error = ValidationError::Channel(17).into();
        assert!(matches!(err, Error::Validation(ValidationError::Channel(17))));
        assert_eq!(err.to_string(), "channel must be between 1 and 16, got 17");
    }

    #[test]
    fn cancelled_is_distinguishable() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Cancelled.is_connection());
    }
}
