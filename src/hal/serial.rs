//! Serial transports.
//!
//! The line settings are fixed by the screen receivers: 2400 baud, 8 data
//! bits, no parity, one stop bit, no flow control. The port is opened per
//! send and closed when the handle drops. The blocking transport uses
//! `serialport` directly; the async one uses `tokio-serial` on top of it.

use core::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::debug;

use super::within;
use crate::config::TimeoutConfig;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::traits::{AsyncTransport, Transport};

/// Line speed of every XY Screens receiver.
pub const BAUD_RATE: u32 = 2400;

/// Blocking serial transport.
#[derive(Clone, Debug)]
pub struct SerialTransport {
    endpoint: Endpoint,
    path: String,
    timeouts: TimeoutConfig,
}

impl SerialTransport {
    /// Transport for the port at `path`.
    pub fn new(path: &str, timeouts: TimeoutConfig) -> Self {
        Self {
            endpoint: Endpoint::serial(path),
            path: path.to_string(),
            timeouts,
        }
    }

    fn open(&self) -> io::Result<Box<dyn SerialPort>> {
        let port = serialport::new(self.path.as_str(), BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeouts.write())
            .open()?;
        Ok(port)
    }

    fn write_frame(&self, frame: &[u8]) -> io::Result<()> {
        let mut port = self.open()?;
        port.write_all(frame)?;
        port.flush()
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        debug!(endpoint = %self.endpoint, ?frame, "serial send");
        self.write_frame(frame)
            .map_err(|e| Error::connection(&self.endpoint, e))
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        Some(&self.endpoint)
    }
}

/// Async serial transport.
///
/// Each send opens the port on tokio's blocking pool, bounded by the connect
/// timeout, then writes through an async [`SerialStream`] bounded by the
/// write timeout. Dropping the send future drops the stream and closes the
/// port, so nothing more reaches the line once the caller has given up.
#[derive(Clone, Debug)]
pub struct AsyncSerialTransport {
    endpoint: Endpoint,
    path: String,
    timeouts: TimeoutConfig,
}

impl AsyncSerialTransport {
    /// Transport for the port at `path`.
    pub fn new(path: &str, timeouts: TimeoutConfig) -> Self {
        Self {
            endpoint: Endpoint::serial(path),
            path: path.to_string(),
            timeouts,
        }
    }

    fn open(path: &str) -> io::Result<SerialStream> {
        let port = tokio_serial::new(path, BAUD_RATE)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()?;
        Ok(port)
    }

    async fn write_frame(&self, frame: &[u8]) -> io::Result<()> {
        let path = self.path.clone();
        // An open that outlives the timeout is dropped, and closed, on the pool
        let opening = tokio::task::spawn_blocking(move || Self::open(&path));
        let port = within(self.timeouts.connect(), "serial open", async {
            opening
                .await
                .unwrap_or_else(|join| Err(io::Error::new(io::ErrorKind::Other, join)))
        })
        .await?;

        deliver(port, frame, self.timeouts.write()).await
    }
}

/// Write and flush `frame`, then close `port` by dropping it.
async fn deliver<W>(mut port: W, frame: &[u8], limit: Duration) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    within(limit, "serial write", async {
        port.write_all(frame).await?;
        port.flush().await
    })
    .await
}

impl AsyncTransport for AsyncSerialTransport {
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = Result<()>> + Send {
        async move {
            debug!(endpoint = %self.endpoint, ?frame, "serial send");
            self.write_frame(frame)
                .await
                .map_err(|e| Error::connection(&self.endpoint, e))
        }
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        Some(&self.endpoint)
    }
}
