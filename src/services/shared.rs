//! State shared between an [`AsyncScreen`](super::AsyncScreen) and its
//! automatic stop task.
//!
//! `SharedScreenState` owns the transport and the [`MotionCore`] behind one
//! async mutex. The lock is held across the send *and* the commit of every
//! operation, so a timer task can never slip a Stop in between a caller's
//! send and its state update.

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::hal::TokioClock;
use crate::motion::MotionCore;
use crate::tracker::MotionState;
use crate::traits::{AsyncTransport, Clock};

/// Transport and motion state, locked together.
#[derive(Debug)]
pub struct ScreenInner<T> {
    /// Where frames go.
    pub transport: T,
    /// Tracker, command table, and schedules.
    pub core: MotionCore,
}

/// Shared screen state with a single time base.
///
/// # Thread Safety
///
/// - One `tokio::sync::Mutex` guards transport and core, because a send and
///   its commit must not interleave with another send.
/// - All timestamps come from the same [`TokioClock`].
#[derive(Debug)]
pub struct SharedScreenState<T> {
    inner: Mutex<ScreenInner<T>>,
    clock: TokioClock,
}

impl<T: AsyncTransport> SharedScreenState<T> {
    /// Wrap a transport and core.
    ///
    /// Must be called inside a tokio runtime; the clock starts now.
    pub fn new(transport: T, core: MotionCore) -> Self {
        Self {
            inner: Mutex::new(ScreenInner { transport, core }),
            clock: TokioClock::new(),
        }
    }

    /// Milliseconds since creation.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Lock transport and core.
    pub async fn lock(&self) -> MutexGuard<'_, ScreenInner<T>> {
        self.inner.lock().await
    }

    /// Read-only snapshot.
    pub async fn state(&self) -> MotionState {
        let inner = self.inner.lock().await;
        inner.core.state(self.now_ms())
    }

    /// Send the automatic stop for `generation`, if it is still current.
    ///
    /// Returns `Ok(false)` when the schedule was superseded.
    pub async fn fire_auto_stop(&self, generation: u64) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some(schedule) = inner.core.take_auto_stop(generation) else {
            debug!(generation, "automatic stop superseded");
            return Ok(false);
        };

        let frame = inner.core.stop_frame();
        if let Err(e) = inner.transport.send(&frame).await {
            warn!(position = schedule.target, error = %e, "automatic stop failed");
            return Err(e);
        }
        let position = inner.core.commit_stop(self.now_ms());
        info!(position, "screen arrived");
        Ok(true)
    }
}

/// Send `frame`, giving up as soon as `cancel` fires.
///
/// Cancellation drops the in-flight send, which closes its connection.
pub async fn send_cancellable<T: AsyncTransport>(
    transport: &mut T,
    frame: &[u8],
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    debug!(?frame, "sending frame");
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = transport.send(frame) => result,
    }
}
