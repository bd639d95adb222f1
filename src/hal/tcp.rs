//! TCP transports for serial-over-IP bridges.
//!
//! Each send resolves the host, connects, writes the whole frame, and shuts
//! the socket down. The connect timeout is one deadline for resolving and for
//! trying every resolved address; the write has its own. The blocking
//! resolver cannot be interrupted, so time it spends is charged against the
//! deadline afterwards. Any failure becomes [`Error::Connection`] naming the
//! endpoint.

use core::future::Future;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{timed_out, within};
use crate::config::TimeoutConfig;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::traits::{AsyncTransport, Transport};

fn split(endpoint: &Endpoint) -> Result<(String, u16)> {
    match endpoint {
        Endpoint::Tcp { host, port } => Ok((host.clone(), *port)),
        Endpoint::Serial { path } => Err(Error::Parse {
            input: path.clone(),
            reason: "not a host:port endpoint",
        }),
    }
}

// ============================================================================
// Blocking
// ============================================================================

/// Blocking TCP transport.
#[derive(Clone, Debug)]
pub struct TcpTransport {
    endpoint: Endpoint,
    host: String,
    port: u16,
    timeouts: TimeoutConfig,
}

impl TcpTransport {
    /// Transport for `host:port`.
    pub fn new(host: &str, port: u16, timeouts: TimeoutConfig) -> Self {
        Self {
            endpoint: Endpoint::tcp(host, port),
            host: host.to_string(),
            port,
            timeouts,
        }
    }

    /// Transport for a TCP endpoint. Serial endpoints are rejected.
    pub fn from_endpoint(endpoint: &Endpoint, timeouts: TimeoutConfig) -> Result<Self> {
        let (host, port) = split(endpoint)?;
        Ok(Self::new(&host, port, timeouts))
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let deadline = Instant::now() + self.timeouts.connect();
        let addrs = (self.host.as_str(), self.port).to_socket_addrs()?;
        connect_before(addrs, deadline)
    }

    fn write_frame(&self, frame: &[u8]) -> io::Result<()> {
        let mut stream = self.connect()?;
        stream.set_write_timeout(Some(self.timeouts.write()))?;
        stream.write_all(frame)?;
        stream.flush()?;
        let _ = stream.shutdown(Shutdown::Write);
        Ok(())
    }
}

/// Try each address in turn with whatever is left until `deadline`.
fn connect_before<I>(addrs: I, deadline: Instant) -> io::Result<TcpStream>
where
    I: IntoIterator<Item = SocketAddr>,
{
    let mut last_err = None;
    for addr in addrs {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(timed_out("connect"));
        }
        match TcpStream::connect_timeout(&addr, left) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    }))
}

impl Transport for TcpTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        debug!(endpoint = %self.endpoint, ?frame, "tcp send");
        self.write_frame(frame)
            .map_err(|e| Error::connection(&self.endpoint, e))
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        Some(&self.endpoint)
    }
}

// ============================================================================
// Async
// ============================================================================

/// Async TCP transport on tokio.
///
/// Dropping a send future closes its socket.
#[derive(Clone, Debug)]
pub struct AsyncTcpTransport {
    endpoint: Endpoint,
    host: String,
    port: u16,
    timeouts: TimeoutConfig,
}

impl AsyncTcpTransport {
    /// Transport for `host:port`.
    pub fn new(host: &str, port: u16, timeouts: TimeoutConfig) -> Self {
        Self {
            endpoint: Endpoint::tcp(host, port),
            host: host.to_string(),
            port,
            timeouts,
        }
    }

    /// Transport for a TCP endpoint. Serial endpoints are rejected.
    pub fn from_endpoint(endpoint: &Endpoint, timeouts: TimeoutConfig) -> Result<Self> {
        let (host, port) = split(endpoint)?;
        Ok(Self::new(&host, port, timeouts))
    }

    async fn write_frame(&self, frame: &[u8]) -> io::Result<()> {
        // Resolution and every address attempt run inside the one timeout
        let connect = tokio::net::TcpStream::connect((self.host.as_str(), self.port));
        let mut stream = within(self.timeouts.connect(), "connect", connect).await?;

        within(self.timeouts.write(), "write", stream.write_all(frame)).await?;

        let _ = stream.shutdown().await;
        Ok(())
    }
}

impl AsyncTransport for AsyncTcpTransport {
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = Result<()>> + Send {
        async move {
            debug!(endpoint = %self.endpoint, ?frame, "tcp send");
            self.write_frame(frame)
                .await
                .map_err(|e| Error::connection(&self.endpoint, e))
        }
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        Some(&self.endpoint)
    }
}
