//! Device strings: a serial port path or a `host:port` socket address.
//!
//! Parsing is pure and total. A string that looks like `host:port` is either
//! a valid TCP endpoint or a parse error; it never falls back to serial.
//!
//! # Example
//!
//! ```rust
//! use xyscreens::Endpoint;
//!
//! let tcp: Endpoint = "192.168.1.100:9997".parse().unwrap();
//! assert_eq!(tcp, Endpoint::tcp("192.168.1.100", 9997));
//!
//! let serial: Endpoint = "/dev/ttyUSB0".parse().unwrap();
//! assert!(!serial.is_tcp());
//!
//! assert!("host:99999".parse::<Endpoint>().is_err());
//! ```

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// How to reach a screen.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase", tag = "kind"))]
pub enum Endpoint {
    /// A serial port path or device name (`/dev/ttyUSB0`, `COM1`).
    Serial {
        /// Path or name handed to the serial driver.
        path: String,
    },
    /// A serial-over-IP bridge reachable at `host:port`.
    Tcp {
        /// Hostname or IP address.
        host: String,
        /// TCP port.
        port: u16,
    },
}

impl Endpoint {
    /// A TCP endpoint.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Endpoint::Tcp {
            host: host.into(),
            port,
        }
    }

    /// A serial endpoint.
    pub fn serial(path: impl Into<String>) -> Self {
        Endpoint::Serial { path: path.into() }
    }

    /// Parse a device string.
    ///
    /// - A leading `/` always means a serial path, colons or not.
    /// - No colon at all means a serial device name.
    /// - `[v6addr]:port` and `host:port` (exactly one colon) mean TCP.
    /// - Anything else containing a colon is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let err = |reason| Error::Parse {
            input: input.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(err("empty device string"));
        }
        if input.starts_with('/') || !input.contains(':') {
            return Ok(Endpoint::serial(input));
        }

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| err("unterminated IPv6 bracket"))?;
            let port = tail
                .strip_prefix(':')
                .ok_or_else(|| err("missing port after IPv6 address"))?;
            (host, port)
        } else {
            let (host, port) = input.split_once(':').ok_or_else(|| err("missing port"))?;
            if port.contains(':') {
                return Err(err("expected exactly one ':' between host and port"));
            }
            (host, port)
        };

        if host.is_empty() {
            return Err(err("missing host"));
        }
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err("port is not a decimal number"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| err("port is out of range 0-65535"))?;

        Ok(Endpoint::tcp(host, port))
    }

    /// Returns true for socket endpoints.
    pub fn is_tcp(&self) -> bool {
        matches!(self, Endpoint::Tcp { .. })
    }

    /// Short transport name used in messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Endpoint::Serial { .. } => "serial",
            Endpoint::Tcp { .. } => "TCP",
        }
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Serial { path } => f.write_str(path),
            Endpoint::Tcp { host, port } if host.contains(':') => write!(f, "[{}]:{}", host, port),
            Endpoint::Tcp { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}
