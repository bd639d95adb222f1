//! Frame transport abstraction.
//!
//! A transport delivers a complete frame to the screen or fails. Each call
//! owns its connection for the duration of the call: open, write, close.
//! Nothing is kept open between calls, since many serial-over-IP bridges
//! drop idle sockets.
//!
//! # Example Implementation
//!
//! ```rust
//! use xyscreens::traits::Transport;
//! use xyscreens::Result;
//!
//! struct Loopback(Vec<Vec<u8>>);
//!
//! impl Transport for Loopback {
//!     fn send(&mut self, frame: &[u8]) -> Result<()> {
//!         self.0.push(frame.to_vec());
//!         Ok(())
//!     }
//! }
//! ```

use core::future::Future;

use crate::endpoint::Endpoint;
use crate::error::Result;

/// Blocking frame transport.
pub trait Transport {
    /// Deliver `frame` completely or fail with [`Error::Connection`].
    ///
    /// [`Error::Connection`]: crate::Error::Connection
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Where frames go, if the transport has a real endpoint.
    fn endpoint(&self) -> Option<&Endpoint> {
        None
    }
}

/// Async frame transport.
///
/// Dropping the returned future abandons the call and closes its connection;
/// an abandoned frame counts as not delivered.
pub trait AsyncTransport {
    /// Deliver `frame` completely or fail with [`Error::Connection`].
    ///
    /// [`Error::Connection`]: crate::Error::Connection
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Where frames go, if the transport has a real endpoint.
    fn endpoint(&self) -> Option<&Endpoint> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        (**self).endpoint()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        (**self).endpoint()
    }
}
