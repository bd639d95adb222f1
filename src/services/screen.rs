//! Async screen controller with cancellation.
//!
//! [`AsyncScreen`] mirrors the blocking [`Screen`](crate::Screen) on tokio.
//! Every operation takes a [`CancellationToken`]:
//!
//! - cancelling a send drops it, returns [`Error::Cancelled`], and leaves the
//!   motion state untouched;
//! - cancelling [`wait_for_arrival`](AsyncScreen::wait_for_arrival) returns
//!   [`Arrival::Cancelled`] and leaves the screen moving with its automatic
//!   stop still scheduled. Call [`stop`](AsyncScreen::stop) to halt it.
//!
//! # Example
//!
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use xyscreens::hal::MockTransport;
//! use xyscreens::services::{Arrival, AsyncScreen};
//! use xyscreens::{CommandSet, PositionTracker, TravelProfile};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let transport = MockTransport::new();
//! let tracker = PositionTracker::new(TravelProfile::new(30.0, 25.0).unwrap(), 50.0).unwrap();
//! let mut screen = AsyncScreen::new(transport.clone(), CommandSet::default(), tracker);
//!
//! let cancel = CancellationToken::new();
//! let arrival = screen.up_and_wait(&cancel).await.unwrap();
//!
//! assert_eq!(arrival, Arrival::Arrived);
//! assert_eq!(screen.position().await, 0.0);
//! assert_eq!(transport.frames().len(), 2);
//! # }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::auto_stop::AutoStopHandle;
use super::shared::{send_cancellable, SharedScreenState};
use crate::commands::{Channel, CommandSet};
use crate::config::ScreenConfig;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result, ValidationError};
use crate::hal::AsyncDeviceTransport;
use crate::motion::{AutoStop, MotionCore, Plan};
use crate::tracker::{Direction, MotionState, PositionTracker, ScreenState};
use crate::traits::AsyncTransport;

/// How a wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrival {
    /// The automatic stop was sent, or nothing was pending.
    Arrived,
    /// The caller stopped waiting. The screen may still be moving.
    Cancelled,
}

/// Async screen controller.
///
/// Owns at most one [`AutoStopHandle`]. Starting another movement or
/// stopping cancels it; dropping the screen cancels it too.
pub struct AsyncScreen<T: AsyncTransport + Send + 'static> {
    shared: Arc<SharedScreenState<T>>,
    auto_stop: Option<AutoStopHandle>,
    endpoint: Option<Endpoint>,
}

impl AsyncScreen<AsyncDeviceTransport> {
    /// Build a screen on the configured serial port or TCP bridge.
    pub fn from_config(config: &ScreenConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let tracker = config.tracker()?;
        let transport = AsyncDeviceTransport::new(&endpoint, config.timeouts)?;
        Ok(Self::new(transport, config.commands(), tracker))
    }
}

impl<T: AsyncTransport + Send + 'static> AsyncScreen<T> {
    /// Create a controller. Must be called inside a tokio runtime.
    pub fn new(transport: T, commands: CommandSet, tracker: PositionTracker) -> Self {
        let endpoint = transport.endpoint().cloned();
        Self {
            shared: Arc::new(SharedScreenState::new(
                transport,
                MotionCore::new(tracker, commands),
            )),
            auto_stop: None,
            endpoint,
        }
    }

    /// Plan under the lock, send, and commit only after a successful send.
    async fn run<F>(&mut self, cancel: &CancellationToken, plan: F) -> Result<Option<AutoStop>>
    where
        F: FnOnce(&MotionCore, u64) -> Result<Plan>,
    {
        let shared = Arc::clone(&self.shared);
        let mut inner = shared.lock().await;

        match plan(&inner.core, shared.now_ms())? {
            Plan::Idle => Ok(None),
            Plan::Stop => {
                let frame = inner.core.stop_frame();
                send_cancellable(&mut inner.transport, &frame, cancel).await?;
                let position = inner.core.commit_stop(shared.now_ms());
                drop(inner);
                self.clear_auto_stop();
                info!(position, "screen stopped");
                Ok(None)
            }
            Plan::Move {
                direction,
                target,
                frame,
            } => {
                send_cancellable(&mut inner.transport, &frame, cancel).await?;
                let schedule = inner.core.commit_move(direction, target, shared.now_ms())?;
                drop(inner);
                self.clear_auto_stop();
                self.auto_stop = Some(AutoStopHandle::spawn(Arc::clone(&shared), schedule));
                info!(
                    direction = direction.as_str(),
                    to = target,
                    deadline_ms = schedule.deadline_ms,
                    "screen moving"
                );
                Ok(Some(schedule))
            }
        }
    }

    fn clear_auto_stop(&mut self) {
        if let Some(handle) = self.auto_stop.take() {
            handle.cancel();
        }
    }

    async fn send_only(&mut self, frame: &[u8], cancel: &CancellationToken) -> Result<()> {
        let mut inner = self.shared.lock().await;
        send_cancellable(&mut inner.transport, frame, cancel).await
    }

    // ------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------

    /// Full travel in `direction`. Returns once the frame is sent.
    pub async fn travel(&mut self, direction: Direction, cancel: &CancellationToken) -> Result<AutoStop> {
        self.run(cancel, |core, _| core.plan_travel(direction))
            .await?
            .ok_or(Error::Validation(ValidationError::NoDirection))
    }

    /// Retract fully.
    pub async fn up(&mut self, cancel: &CancellationToken) -> Result<AutoStop> {
        self.travel(Direction::Up, cancel).await
    }

    /// Extend fully.
    pub async fn down(&mut self, cancel: &CancellationToken) -> Result<AutoStop> {
        self.travel(Direction::Down, cancel).await
    }

    /// Send Stop and freeze the position. Returns the resting position.
    ///
    /// Always sends, even when already stopped.
    pub async fn stop(&mut self, cancel: &CancellationToken) -> Result<f32> {
        self.run(cancel, |_, _| Ok(Plan::Stop)).await?;
        Ok(self.position().await)
    }

    /// Move to `target` percent and schedule a stop there.
    pub async fn set_position(&mut self, target: f32, cancel: &CancellationToken) -> Result<Option<AutoStop>> {
        self.run(cancel, |core, now| core.plan_set_position(target, now))
            .await
    }

    /// Stop if moving, otherwise head for the other end.
    pub async fn toggle(&mut self, cancel: &CancellationToken) -> Result<Option<AutoStop>> {
        self.run(cancel, |core, now| Ok(core.plan_toggle(now))).await
    }

    /// Put the receiver in pairing mode.
    pub async fn program(&mut self, cancel: &CancellationToken) -> Result<()> {
        let frame = self.shared.lock().await.core.commands().program();
        self.send_only(&frame, cancel).await
    }

    /// Switch the receiver channel. Rejects anything outside `1..=16`.
    pub async fn set_channel(&mut self, channel: u8, cancel: &CancellationToken) -> Result<()> {
        let channel = Channel::new(channel)?;
        let frame = self.shared.lock().await.core.commands().set_channel(channel);
        self.send_only(&frame, cancel).await
    }

    // ------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------

    /// Wait until the pending automatic stop has been sent.
    ///
    /// Cancellation only stops the waiting. Returns the error of a failed
    /// automatic stop.
    pub async fn wait_for_arrival(&mut self, cancel: &CancellationToken) -> Result<Arrival> {
        let Some(handle) = self.auto_stop.as_mut() else {
            return Ok(Arrival::Arrived);
        };

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = handle.join() => Some(result),
        };

        match joined {
            None => Ok(Arrival::Cancelled),
            Some(result) => {
                self.auto_stop = None;
                result.map(|_| Arrival::Arrived)
            }
        }
    }

    /// [`up`](Self::up), then wait.
    pub async fn up_and_wait(&mut self, cancel: &CancellationToken) -> Result<Arrival> {
        self.up(cancel).await?;
        self.wait_for_arrival(cancel).await
    }

    /// [`down`](Self::down), then wait.
    pub async fn down_and_wait(&mut self, cancel: &CancellationToken) -> Result<Arrival> {
        self.down(cancel).await?;
        self.wait_for_arrival(cancel).await
    }

    /// [`set_position`](Self::set_position), then wait.
    pub async fn set_position_and_wait(&mut self, target: f32, cancel: &CancellationToken) -> Result<Arrival> {
        self.set_position(target, cancel).await?;
        self.wait_for_arrival(cancel).await
    }

    /// [`toggle`](Self::toggle), then wait.
    pub async fn toggle_and_wait(&mut self, cancel: &CancellationToken) -> Result<Arrival> {
        self.toggle(cancel).await?;
        self.wait_for_arrival(cancel).await
    }

    /// The schedule the current handle will fire, if it has not yet.
    pub fn pending_auto_stop(&self) -> Option<AutoStop> {
        self.auto_stop
            .as_ref()
            .filter(|handle| !handle.is_finished())
            .map(AutoStopHandle::schedule)
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Estimated position now.
    pub async fn position(&self) -> f32 {
        self.shared.state().await.position
    }

    /// Current direction.
    pub async fn direction(&self) -> Direction {
        self.shared.state().await.direction
    }

    /// True while a movement is tracked.
    pub async fn is_moving(&self) -> bool {
        self.direction().await != Direction::Stopped
    }

    /// Snapshot now.
    pub async fn state(&self) -> MotionState {
        self.shared.state().await
    }

    /// Coarse state.
    pub async fn screen_state(&self) -> ScreenState {
        self.shared.lock().await.core.screen_state()
    }

    /// Overwrite the position without sending anything.
    pub async fn restore(&mut self, position: f32) -> Result<()> {
        self.shared.lock().await.core.restore(position)?;
        self.clear_auto_stop();
        Ok(())
    }

    /// Where frames go.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }
}
