//! Blocking screen controller.
//!
//! [`Screen`] ties a [`Transport`], a clock, and the [`MotionCore`] together.
//! Movement calls return as soon as the frame is sent. The automatic stop is
//! sent by [`Screen::update`] once its deadline has passed, or by the
//! `*_and_wait` calls, which block until then.
//!
//! # Example
//!
//! ```rust
//! use xyscreens::hal::{MockClock, MockTransport};
//! use xyscreens::{Address, CommandSet, PositionTracker, Screen, ScreenState, TravelProfile};
//!
//! let transport = MockTransport::new();
//! let clock = MockClock::new();
//! let profile = TravelProfile::new(30.0, 25.0).unwrap();
//! let tracker = PositionTracker::new(profile, 50.0).unwrap();
//! let mut screen = Screen::new(
//!     transport.clone(),
//!     clock.clone(),
//!     CommandSet::new(Address::from(0x01)),
//!     tracker,
//! );
//!
//! screen.up_and_wait().unwrap();
//!
//! assert_eq!(clock.now_ms(), 12_500);
//! assert_eq!(screen.position(), 0.0);
//! assert_eq!(screen.screen_state(), ScreenState::Up);
//! assert_eq!(
//!     transport.frames(),
//!     vec![vec![0xFF, 0x01, 0xDD], vec![0xFF, 0x01, 0xCC]]
//! );
//! ```
//!
//! # Polling
//!
//! Without the waiting calls, drive automatic stops from a loop:
//!
//! ```rust,no_run
//! # use xyscreens::{Screen, config::ScreenConfig};
//! # fn main() -> xyscreens::Result<()> {
//! let mut screen = Screen::from_config(&ScreenConfig::new("/dev/ttyUSB0"))?;
//! screen.down()?;
//! while screen.is_moving() {
//!     screen.update()?;
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info, warn};

use crate::commands::{Channel, CommandSet, Frame};
use crate::config::ScreenConfig;
use crate::endpoint::Endpoint;
use crate::error::{Result, ValidationError};
use crate::hal::{DeviceTransport, SystemClock};
use crate::motion::{AutoStop, MotionCore, Plan};
use crate::tracker::{Direction, MotionState, PositionTracker, ScreenState};
use crate::traits::{Clock, Delay, Transport};

/// Blocking screen controller.
///
/// # Type Parameters
///
/// - `T`: the [`Transport`] frames go through
/// - `C`: time source and blocking delay
///
/// # Thread Safety
///
/// Not thread-safe and not re-entrant. Every call takes `&mut self`, so only
/// one motion-affecting call can run at a time.
pub struct Screen<T: Transport, C: Clock + Delay = SystemClock> {
    transport: T,
    clock: C,
    core: MotionCore,
}

impl Screen<DeviceTransport, SystemClock> {
    /// Build a screen on the configured serial port or TCP bridge.
    ///
    /// Validates the whole configuration first. Nothing is sent.
    pub fn from_config(config: &ScreenConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let tracker = config.tracker()?;
        let transport = DeviceTransport::new(&endpoint, config.timeouts)?;
        Ok(Self::new(
            transport,
            SystemClock::new(),
            config.commands(),
            tracker,
        ))
    }
}

impl<T: Transport, C: Clock + Delay> Screen<T, C> {
    /// Create a controller.
    pub fn new(transport: T, clock: C, commands: CommandSet, tracker: PositionTracker) -> Self {
        Self {
            transport,
            clock,
            core: MotionCore::new(tracker, commands),
        }
    }

    fn send(&mut self, frame: &Frame) -> Result<()> {
        debug!(?frame, "sending frame");
        self.transport.send(frame)
    }

    fn execute(&mut self, plan: Plan) -> Result<Option<AutoStop>> {
        match plan {
            Plan::Idle => Ok(None),
            Plan::Stop => {
                self.stop()?;
                Ok(None)
            }
            Plan::Move {
                direction,
                target,
                frame,
            } => self.start(direction, target, &frame).map(Some),
        }
    }

    fn start(&mut self, direction: Direction, target: f32, frame: &Frame) -> Result<AutoStop> {
        self.send(frame)?;
        let now = self.clock.now_ms();
        let schedule = self.core.commit_move(direction, target, now)?;
        info!(
            direction = direction.as_str(),
            to = target,
            deadline_ms = schedule.deadline_ms,
            "screen moving"
        );
        Ok(schedule)
    }

    // ------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------

    /// Full travel in `direction`. Returns once the frame is sent.
    pub fn travel(&mut self, direction: Direction) -> Result<AutoStop> {
        match self.core.plan_travel(direction)? {
            Plan::Move {
                direction,
                target,
                frame,
            } => self.start(direction, target, &frame),
            _ => Err(ValidationError::NoDirection.into()),
        }
    }

    /// Retract fully.
    pub fn up(&mut self) -> Result<AutoStop> {
        self.travel(Direction::Up)
    }

    /// Extend fully.
    pub fn down(&mut self) -> Result<AutoStop> {
        self.travel(Direction::Down)
    }

    /// Send Stop and freeze the position. Returns the resting position.
    ///
    /// Always sends, even when already stopped.
    pub fn stop(&mut self) -> Result<f32> {
        let frame = self.core.stop_frame();
        self.send(&frame)?;
        let position = self.core.commit_stop(self.clock.now_ms());
        info!(position, "screen stopped");
        Ok(position)
    }

    /// Move to `target` percent and schedule a stop there.
    ///
    /// Returns `None` when no movement was needed.
    pub fn set_position(&mut self, target: f32) -> Result<Option<AutoStop>> {
        let plan = self.core.plan_set_position(target, self.clock.now_ms())?;
        self.execute(plan)
    }

    /// Stop if moving, otherwise head for the other end.
    pub fn toggle(&mut self) -> Result<Option<AutoStop>> {
        let plan = self.core.plan_toggle(self.clock.now_ms());
        self.execute(plan)
    }

    /// Put the receiver in pairing mode. Does not affect the position.
    pub fn program(&mut self) -> Result<()> {
        let frame = self.core.commands().program();
        self.send(&frame)
    }

    /// Switch the receiver channel. Rejects anything outside `1..=16`.
    pub fn set_channel(&mut self, channel: u8) -> Result<()> {
        let channel = Channel::new(channel)?;
        let frame = self.core.commands().set_channel(channel);
        self.send(&frame)
    }

    // ------------------------------------------------------------------
    // Automatic stops
    // ------------------------------------------------------------------

    /// Send the automatic stop if it is due. Returns true if one was sent.
    ///
    /// A schedule is handed out once. If its Stop fails to send, the error
    /// is returned and the schedule is gone; call [`stop`](Self::stop) to
    /// try again.
    pub fn update(&mut self) -> Result<bool> {
        let now = self.clock.now_ms();
        let Some(schedule) = self.core.take_due_auto_stop(now) else {
            return Ok(false);
        };
        let frame = self.core.stop_frame();
        if let Err(e) = self.send(&frame) {
            warn!(position = schedule.target, error = %e, "automatic stop failed");
            return Err(e);
        }
        let position = self.core.commit_stop(self.clock.now_ms());
        info!(position, "screen arrived");
        Ok(true)
    }

    /// Block until the pending automatic stop has been sent.
    ///
    /// Returns at once when nothing is scheduled.
    pub fn wait_for_arrival(&mut self) -> Result<()> {
        while let Some(schedule) = self.core.pending_auto_stop() {
            let now = self.clock.now_ms();
            if schedule.deadline_ms > now {
                self.clock.delay_ms(schedule.deadline_ms - now);
            }
            self.update()?;
        }
        Ok(())
    }

    /// [`up`](Self::up), then [`wait_for_arrival`](Self::wait_for_arrival).
    pub fn up_and_wait(&mut self) -> Result<()> {
        self.up()?;
        self.wait_for_arrival()
    }

    /// [`down`](Self::down), then [`wait_for_arrival`](Self::wait_for_arrival).
    pub fn down_and_wait(&mut self) -> Result<()> {
        self.down()?;
        self.wait_for_arrival()
    }

    /// [`set_position`](Self::set_position), then wait.
    pub fn set_position_and_wait(&mut self, target: f32) -> Result<()> {
        self.set_position(target)?;
        self.wait_for_arrival()
    }

    /// [`toggle`](Self::toggle), then wait.
    pub fn toggle_and_wait(&mut self) -> Result<()> {
        self.toggle()?;
        self.wait_for_arrival()
    }

    /// The schedule [`update`](Self::update) will act on.
    pub fn pending_auto_stop(&self) -> Option<AutoStop> {
        self.core.pending_auto_stop()
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Estimated position now.
    pub fn position(&self) -> f32 {
        self.core.position(self.clock.now_ms())
    }

    /// Current direction.
    pub fn direction(&self) -> Direction {
        self.core.direction()
    }

    /// True while a movement is tracked.
    pub fn is_moving(&self) -> bool {
        self.core.tracker().is_moving()
    }

    /// Snapshot now.
    pub fn state(&self) -> MotionState {
        self.core.state(self.clock.now_ms())
    }

    /// Coarse state.
    pub fn screen_state(&self) -> ScreenState {
        self.core.screen_state()
    }

    /// Overwrite the position without sending anything.
    ///
    /// For resynchronising after the screen was moved by other means.
    pub fn restore(&mut self, position: f32) -> Result<()> {
        self.core.restore(position)
    }

    /// Where frames go.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.transport.endpoint()
    }

    /// The command table.
    pub fn commands(&self) -> &CommandSet {
        self.core.commands()
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Address;
    use crate::hal::{MockClock, MockTransport};
    use crate::tracker::TravelProfile;

    fn screen(initial: f32) -> (Screen<MockTransport, MockClock>, MockTransport, MockClock) {
        let transport = MockTransport::new();
        let clock = MockClock::new();
        let profile = TravelProfile::new(30.0, 25.0).unwrap();
        let screen = Screen::new(
            transport.clone(),
            clock.clone(),
            CommandSet::new(Address::from(0x01)),
            PositionTracker::new(profile, initial).unwrap(),
        );
        (screen, transport, clock)
    }

    #[test]
    fn down_sends_and_schedules() {
        let (mut screen, transport, _) = screen(0.0);
        let schedule = screen.down().unwrap();
        assert_eq!(schedule.deadline_ms, 30_000);
        assert_eq!(transport.frames(), vec![vec![0xFF, 0x01, 0xEE]]);
        assert_eq!(screen.screen_state(), ScreenState::MovingDown);
    }

    #[test]
    fn update_before_deadline_does_nothing() {
        let (mut screen, transport, clock) = screen(0.0);
        screen.down().unwrap();
        clock.set(29_999);
        assert!(!screen.update().unwrap());
        assert_eq!(transport.frames().len(), 1);
    }

    #[test]
    fn failed_send_leaves_state() {
        let (mut screen, transport, _) = screen(20.0);
        transport.fail_next(1);
        assert!(screen.down().unwrap_err().is_connection());
        assert_eq!(screen.direction(), Direction::Stopped);
        assert!(screen.pending_auto_stop().is_none());
        assert_eq!(screen.position(), 20.0);
    }

    #[test]
    fn program_and_channel_leave_position() {
        let (mut screen, transport, _) = screen(40.0);
        screen.program().unwrap();
        screen.set_channel(3).unwrap();
        assert!(screen.set_channel(0).is_err());
        assert_eq!(
            transport.frames(),
            vec![vec![0xFF, 0x01, 0xAA], vec![0xFF, 0x01, 0xB2]]
        );
        assert_eq!(screen.position(), 40.0);
    }
}
