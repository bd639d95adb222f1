//! Transport and clock implementations.
//!
//! Concrete implementations of the traits defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `tcp`: serial-over-IP bridges, blocking and async
//! - `serial`: local serial ports (requires the `serial` feature)
//! - `device`: picks one of the above from an [`Endpoint`](crate::Endpoint)
//! - `clock`: system and tokio time sources
//! - `mock`: test doubles

use core::future::Future;
use std::io;
use std::time::Duration;

pub mod clock;
pub mod device;
pub mod mock;
pub mod tcp;

#[cfg(feature = "serial")]
pub mod serial;

pub use clock::*;
pub use device::*;
pub use mock::*;
pub use tcp::*;

#[cfg(feature = "serial")]
pub use serial::*;

pub(crate) fn timed_out(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{} timed out", what))
}

/// Run one I/O step under `limit`, mapping expiry to [`io::ErrorKind::TimedOut`].
pub(crate) async fn within<T, F>(limit: Duration, what: &str, step: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    tokio::time::timeout(limit, step)
        .await
        .unwrap_or_else(|_| Err(timed_out(what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn step_that_never_completes_times_out() {
        let started = tokio::time::Instant::now();
        let err = within(Duration::from_millis(200), "connect", core::future::pending::<io::Result<()>>())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(err.to_string(), "connect timed out");
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn step_errors_pass_through() {
        let refused = async { Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionRefused)) };
        let err = within(Duration::from_secs(1), "connect", refused).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }
}
