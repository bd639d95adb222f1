//! Motion planning shared by the blocking and async drivers.
//!
//! [`MotionCore`] does no I/O. A driver asks it for a [`Plan`], sends the
//! frame through its own transport, and only then commits the result. A
//! failed or cancelled send therefore never touches the tracked position.
//!
//! # Automatic Stops
//!
//! Every committed move schedules an [`AutoStop`]: a deadline at which the
//! driver must send a Stop frame. Schedules carry a generation number. Any
//! later commit (another move, an explicit stop, a restore) bumps the
//! generation, so a superseded schedule can never fire. Taking a schedule
//! clears it, so each schedule fires at most once.
//!
//! ```rust
//! use xyscreens::motion::{MotionCore, Plan};
//! use xyscreens::{CommandSet, Direction, PositionTracker, TravelProfile};
//!
//! let tracker = PositionTracker::new(TravelProfile::symmetric(30.0).unwrap(), 0.0).unwrap();
//! let mut core = MotionCore::new(tracker, CommandSet::default());
//!
//! let Plan::Move { direction, target, .. } = core.plan_travel(Direction::Down).unwrap() else {
//!     unreachable!()
//! };
//! // ... send the frame, then:
//! let schedule = core.commit_move(direction, target, 0).unwrap();
//! assert_eq!(schedule.deadline_ms, 30_000);
//!
//! assert!(core.take_due_auto_stop(29_999).is_none());
//! assert!(core.take_due_auto_stop(30_000).is_some());
//! assert!(core.take_due_auto_stop(30_001).is_none());
//! ```

use crate::commands::{CommandSet, Frame};
use crate::error::{Result, ValidationError};
use crate::tracker::{
    validate_position, Direction, MotionState, PositionTracker, ScreenState, POSITION_DOWN,
    POSITION_EPSILON, POSITION_UP,
};

/// A pending automatic stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoStop {
    /// When the Stop frame is due.
    pub deadline_ms: u64,
    /// Position the screen should be at when it fires.
    pub target: f32,
    /// Generation of the move that scheduled it.
    pub generation: u64,
}

/// What a driver has to send next.
#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    /// Nothing to do.
    Idle,
    /// Send `frame`, then commit a move towards `target`.
    Move {
        /// Direction of travel.
        direction: Direction,
        /// Where the automatic stop should leave the screen.
        target: f32,
        /// Up or Down frame.
        frame: Frame,
    },
    /// Send a Stop frame, then commit the stop.
    Stop,
}

/// Tracker, command table, and automatic stop bookkeeping.
#[derive(Clone, Debug)]
pub struct MotionCore {
    tracker: PositionTracker,
    commands: CommandSet,
    last_direction: Direction,
    auto_stop: Option<AutoStop>,
    generation: u64,
}

impl MotionCore {
    /// Wrap a tracker and command table.
    pub fn new(tracker: PositionTracker, commands: CommandSet) -> Self {
        Self {
            tracker,
            commands,
            last_direction: Direction::Stopped,
            auto_stop: None,
            generation: 0,
        }
    }

    /// The tracker.
    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// The command table.
    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    // ------------------------------------------------------------------
    // Planning
    // ------------------------------------------------------------------

    /// Full travel in `direction`.
    pub fn plan_travel(&self, direction: Direction) -> Result<Plan> {
        let target = direction
            .end_position()
            .ok_or(ValidationError::NoDirection)?;
        Ok(self.move_plan(direction, target))
    }

    /// Travel to `target`.
    ///
    /// Already there: nothing to do when resting, a stop when moving.
    pub fn plan_set_position(&self, target: f32, now_ms: u64) -> Result<Plan> {
        let target = validate_position(target)?;
        let current = self.tracker.position_at(now_ms);
        Ok(match Direction::towards(current, target) {
            Direction::Stopped if self.tracker.is_moving() => Plan::Stop,
            Direction::Stopped => Plan::Idle,
            direction => self.move_plan(direction, target),
        })
    }

    /// Stop when moving, otherwise head for the other end.
    ///
    /// A screen resting between the ends reverses its last direction, or
    /// goes down if it has not moved yet.
    pub fn plan_toggle(&self, now_ms: u64) -> Plan {
        if self.tracker.is_moving() {
            return Plan::Stop;
        }
        let position = self.tracker.position_at(now_ms);
        let direction = if position <= POSITION_UP + POSITION_EPSILON {
            Direction::Down
        } else if position >= POSITION_DOWN - POSITION_EPSILON {
            Direction::Up
        } else {
            match self.last_direction {
                Direction::Stopped => Direction::Down,
                last => last.opposite(),
            }
        };
        let target = direction.end_position().unwrap_or(POSITION_DOWN);
        self.move_plan(direction, target)
    }

    /// The Stop frame.
    pub fn stop_frame(&self) -> Frame {
        self.commands.stop()
    }

    fn move_plan(&self, direction: Direction, target: f32) -> Plan {
        let frame = match direction {
            Direction::Up => self.commands.up(),
            _ => self.commands.down(),
        };
        Plan::Move {
            direction,
            target,
            frame,
        }
    }

    // ------------------------------------------------------------------
    // Commits (call only after a successful send)
    // ------------------------------------------------------------------

    /// Start the tracker and schedule the automatic stop.
    ///
    /// Supersedes any earlier schedule. If the target slipped behind the
    /// screen while the frame was in flight, the stop is due immediately.
    pub fn commit_move(&mut self, direction: Direction, target: f32, now_ms: u64) -> Result<AutoStop> {
        self.tracker.begin(direction, now_ms)?;
        let delay = self.tracker.time_to_target(target, now_ms).unwrap_or(0);

        self.generation += 1;
        self.last_direction = direction;
        let schedule = AutoStop {
            deadline_ms: now_ms.saturating_add(delay),
            target,
            generation: self.generation,
        };
        self.auto_stop = Some(schedule);
        Ok(schedule)
    }

    /// Freeze the tracker and drop any schedule. Returns the resting position.
    pub fn commit_stop(&mut self, now_ms: u64) -> f32 {
        self.generation += 1;
        self.auto_stop = None;
        self.tracker.stop(now_ms)
    }

    /// Overwrite the position, dropping any movement and schedule.
    pub fn restore(&mut self, position: f32) -> Result<()> {
        self.tracker.restore(position)?;
        self.generation += 1;
        self.auto_stop = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Schedules
    // ------------------------------------------------------------------

    /// The pending schedule, if any.
    pub fn pending_auto_stop(&self) -> Option<AutoStop> {
        self.auto_stop
    }

    /// Take the schedule if its deadline has passed.
    pub fn take_due_auto_stop(&mut self, now_ms: u64) -> Option<AutoStop> {
        match self.auto_stop {
            Some(schedule) if schedule.deadline_ms <= now_ms => self.auto_stop.take(),
            _ => None,
        }
    }

    /// Take the schedule only if it still belongs to `generation`.
    pub fn take_auto_stop(&mut self, generation: u64) -> Option<AutoStop> {
        match self.auto_stop {
            Some(schedule) if schedule.generation == generation => self.auto_stop.take(),
            _ => None,
        }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Position at `now_ms`.
    pub fn position(&self, now_ms: u64) -> f32 {
        self.tracker.position_at(now_ms)
    }

    /// Current direction.
    pub fn direction(&self) -> Direction {
        self.tracker.direction()
    }

    /// Direction of the most recent move.
    pub fn last_direction(&self) -> Direction {
        self.last_direction
    }

    /// Snapshot at `now_ms`.
    pub fn state(&self, now_ms: u64) -> MotionState {
        self.tracker.state(now_ms)
    }

    /// Coarse state.
    pub fn screen_state(&self) -> ScreenState {
        self.tracker.screen_state()
    }
}
