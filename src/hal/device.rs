//! Transport chosen from an [`Endpoint`] at runtime.

use core::future::Future;

use crate::config::TimeoutConfig;
use crate::endpoint::Endpoint;
use crate::error::Result;
#[cfg(not(feature = "serial"))]
use crate::error::ValidationError;
use crate::traits::{AsyncTransport, Transport};

use super::tcp::{AsyncTcpTransport, TcpTransport};

#[cfg(feature = "serial")]
use super::serial::{AsyncSerialTransport, SerialTransport};

/// Blocking transport for whichever endpoint was configured.
#[derive(Clone, Debug)]
pub enum DeviceTransport {
    /// Serial-over-IP bridge.
    Tcp(TcpTransport),
    /// Local serial port.
    #[cfg(feature = "serial")]
    Serial(SerialTransport),
}

impl DeviceTransport {
    /// Pick the transport for `endpoint`.
    pub fn new(endpoint: &Endpoint, timeouts: TimeoutConfig) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp { host, port } => Ok(Self::Tcp(TcpTransport::new(host, *port, timeouts))),
            #[cfg(feature = "serial")]
            Endpoint::Serial { path } => Ok(Self::Serial(SerialTransport::new(path, timeouts))),
            #[cfg(not(feature = "serial"))]
            Endpoint::Serial { .. } => Err(ValidationError::Unsupported("serial").into()),
        }
    }
}

impl Transport for DeviceTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(t) => t.send(frame),
            #[cfg(feature = "serial")]
            Self::Serial(t) => t.send(frame),
        }
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Self::Tcp(t) => Transport::endpoint(t),
            #[cfg(feature = "serial")]
            Self::Serial(t) => Transport::endpoint(t),
        }
    }
}

/// Async transport for whichever endpoint was configured.
#[derive(Clone, Debug)]
pub enum AsyncDeviceTransport {
    /// Serial-over-IP bridge.
    Tcp(AsyncTcpTransport),
    /// Local serial port.
    #[cfg(feature = "serial")]
    Serial(AsyncSerialTransport),
}

impl AsyncDeviceTransport {
    /// Pick the transport for `endpoint`.
    pub fn new(endpoint: &Endpoint, timeouts: TimeoutConfig) -> Result<Self> {
        match endpoint {
            Endpoint::Tcp { host, port } => {
                Ok(Self::Tcp(AsyncTcpTransport::new(host, *port, timeouts)))
            }
            #[cfg(feature = "serial")]
            Endpoint::Serial { path } => {
                Ok(Self::Serial(AsyncSerialTransport::new(path, timeouts)))
            }
            #[cfg(not(feature = "serial"))]
            Endpoint::Serial { .. } => Err(ValidationError::Unsupported("serial").into()),
        }
    }
}

impl AsyncTransport for AsyncDeviceTransport {
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = Result<()>> + Send {
        async move {
            match self {
                Self::Tcp(t) => t.send(frame).await,
                #[cfg(feature = "serial")]
                Self::Serial(t) => t.send(frame).await,
            }
        }
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Self::Tcp(t) => AsyncTransport::endpoint(t),
            #[cfg(feature = "serial")]
            Self::Serial(t) => AsyncTransport::endpoint(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_endpoint_picks_tcp() {
        let endpoint = Endpoint::tcp("127.0.0.1", 9997);
        let transport = DeviceTransport::new(&endpoint, TimeoutConfig::default()).unwrap();
        assert!(matches!(transport, DeviceTransport::Tcp(_)));
        assert_eq!(Transport::endpoint(&transport), Some(&endpoint));
    }

    #[cfg(feature = "serial")]
    #[test]
    fn serial_endpoint_picks_serial() {
        let endpoint = Endpoint::serial("/dev/ttyUSB0");
        let transport = AsyncDeviceTransport::new(&endpoint, TimeoutConfig::default()).unwrap();
        assert!(matches!(transport, AsyncDeviceTransport::Serial(_)));
        assert_eq!(AsyncTransport::endpoint(&transport), Some(&endpoint));
    }
}
