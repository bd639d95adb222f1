//! Position tracking without feedback.
//!
//! Screens report nothing back, so the driver infers the position from the
//! time a movement started, where it started, and how long a full travel
//! takes in that direction. This module holds that model.
//!
//! # Position Convention
//!
//! `0.0` is fully up (retracted), `100.0` is fully down (extended). Moving
//! [`Direction::Up`] decreases the position, [`Direction::Down`] increases it.
//!
//! # Timing
//!
//! Every transition takes `now_ms`, a monotonic millisecond timestamp from a
//! [`Clock`](crate::traits::Clock). While moving, the position is computed on
//! demand and only frozen into the stored state when the movement stops.
//!
//! # Example
//!
//! ```rust
//! use xyscreens::{Direction, PositionTracker, TravelProfile};
//!
//! let profile = TravelProfile::new(30.0, 25.0).unwrap();
//! let mut tracker = PositionTracker::new(profile, 0.0).unwrap();
//!
//! tracker.begin(Direction::Down, 0).unwrap();
//! assert_eq!(tracker.position_at(15_000), 50.0);
//!
//! tracker.stop(15_000);
//! assert_eq!(tracker.position_at(60_000), 50.0);
//! ```

use crate::error::ValidationError;

/// Fully retracted.
pub const POSITION_UP: f32 = 0.0;

/// Fully extended.
pub const POSITION_DOWN: f32 = 100.0;

/// Tolerance used when comparing positions.
pub const POSITION_EPSILON: f32 = 0.01;

/// Direction of screen travel.
///
/// Defaults to [`Stopped`](Self::Stopped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Retracting, position decreasing towards 0.
    Up,
    /// Extending, position increasing towards 100.
    Down,
    /// Not moving.
    #[default]
    Stopped,
}

impl Direction {
    /// Lowercase name.
    ///
    /// ```
    /// use xyscreens::Direction;
    ///
    /// assert_eq!(Direction::Up.as_str(), "up");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Stopped => "stopped",
        }
    }

    /// Parse a direction from text, trimmed and case-insensitive.
    ///
    /// ```
    /// use xyscreens::Direction;
    ///
    /// assert_eq!(Direction::from_text(" UP "), Some(Direction::Up));
    /// assert_eq!(Direction::from_text("close"), Some(Direction::Down));
    /// assert_eq!(Direction::from_text("stop"), Some(Direction::Stopped));
    /// assert_eq!(Direction::from_text("sideways"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "open" | "retract" => Some(Direction::Up),
            "down" | "close" | "extend" => Some(Direction::Down),
            "stopped" | "stop" => Some(Direction::Stopped),
            _ => None,
        }
    }

    /// The reverse direction. `Stopped` stays `Stopped`.
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Stopped => Direction::Stopped,
        }
    }

    /// End position reached by travelling this way.
    pub const fn end_position(self) -> Option<f32> {
        match self {
            Direction::Up => Some(POSITION_UP),
            Direction::Down => Some(POSITION_DOWN),
            Direction::Stopped => None,
        }
    }

    /// Direction needed to get from `from` to `to`.
    pub fn towards(from: f32, to: f32) -> Self {
        if (to - from).abs() <= POSITION_EPSILON {
            Direction::Stopped
        } else if to < from {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    fn sign(self) -> f64 {
        match self {
            Direction::Up => -1.0,
            Direction::Down => 1.0,
            Direction::Stopped => 0.0,
        }
    }
}

/// Overall screen state as reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScreenState {
    /// At rest, fully retracted.
    Up,
    /// At rest, fully extended.
    Down,
    /// Retracting.
    MovingUp,
    /// Extending.
    MovingDown,
    /// At rest somewhere in between.
    Stopped,
}

/// Full travel durations, fixed at construction.
///
/// Deserializing goes through [`TravelProfile::new`], so a bad duration is
/// rejected there too.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTravelProfile"))]
pub struct TravelProfile {
    down_secs: f32,
    up_secs: f32,
}

/// Unchecked wire form of [`TravelProfile`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawTravelProfile {
    down_secs: f32,
    up_secs: f32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTravelProfile> for TravelProfile {
    type Error = ValidationError;

    fn try_from(raw: RawTravelProfile) -> Result<Self, Self::Error> {
        TravelProfile::new(raw.down_secs, raw.up_secs)
    }
}

impl TravelProfile {
    /// Build a profile. Both durations must be finite and positive.
    pub fn new(down_secs: f32, up_secs: f32) -> Result<Self, ValidationError> {
        for secs in [down_secs, up_secs] {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ValidationError::Duration(secs));
            }
        }
        Ok(Self { down_secs, up_secs })
    }

    /// Same duration both ways.
    pub fn symmetric(secs: f32) -> Result<Self, ValidationError> {
        Self::new(secs, secs)
    }

    /// Seconds to travel the full range going down.
    pub fn down_secs(&self) -> f32 {
        self.down_secs
    }

    /// Seconds to travel the full range going up.
    pub fn up_secs(&self) -> f32 {
        self.up_secs
    }

    /// Full travel time for `direction`; `None` when stopped.
    pub fn duration_secs(&self, direction: Direction) -> Option<f32> {
        match direction {
            Direction::Up => Some(self.up_secs),
            Direction::Down => Some(self.down_secs),
            Direction::Stopped => None,
        }
    }
}

/// Snapshot of the tracker.
///
/// `direction == Stopped` exactly when `movement_started_ms` is `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionState {
    /// Current position (computed if moving).
    pub position: f32,
    /// Direction of travel.
    pub direction: Direction,
    /// When the current movement began.
    pub movement_started_ms: Option<u64>,
    /// Where the current movement began (equals `position` when stopped).
    pub start_position: f32,
}

/// An in-progress movement.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Leg {
    direction: Direction,
    started_ms: u64,
    start_position: f32,
}

/// Time-based position estimator.
#[derive(Clone, Debug)]
pub struct PositionTracker {
    profile: TravelProfile,
    position: f32,
    leg: Option<Leg>,
}

impl PositionTracker {
    /// Create a tracker resting at `initial_position`.
    pub fn new(profile: TravelProfile, initial_position: f32) -> Result<Self, ValidationError> {
        Ok(Self {
            profile,
            position: validate_position(initial_position)?,
            leg: None,
        })
    }

    /// The travel profile.
    pub fn profile(&self) -> &TravelProfile {
        &self.profile
    }

    /// Start moving in `direction` at `now_ms`.
    ///
    /// The start position is the computed position just before the call.
    /// Calling this while already moving the same way restarts the leg from
    /// the current computed position, which leaves the position continuous.
    pub fn begin(&mut self, direction: Direction, now_ms: u64) -> Result<(), ValidationError> {
        if direction == Direction::Stopped {
            return Err(ValidationError::NoDirection);
        }
        let start_position = self.position_at(now_ms);
        self.position = start_position;
        self.leg = Some(Leg {
            direction,
            started_ms: now_ms,
            start_position,
        });
        Ok(())
    }

    /// Position at `now_ms`, clamped to `0.0..=100.0`.
    ///
    /// Timestamps earlier than the movement start count as no elapsed time.
    pub fn position_at(&self, now_ms: u64) -> f32 {
        let Some(leg) = self.leg else {
            return self.position;
        };
        let Some(duration) = self.profile.duration_secs(leg.direction) else {
            return self.position;
        };
        let elapsed_secs = now_ms.saturating_sub(leg.started_ms) as f64 / 1000.0;
        let delta = elapsed_secs / f64::from(duration) * 100.0;
        let raw = f64::from(leg.start_position) + leg.direction.sign() * delta;
        (raw as f32).clamp(POSITION_UP, POSITION_DOWN)
    }

    /// Milliseconds still needed to reach `target` if the movement continues.
    ///
    /// Rounded to the nearest millisecond.
    /// Fails when stopped, or when `target` lies behind the direction of travel.
    pub fn time_to_target(&self, target: f32, now_ms: u64) -> Result<u64, ValidationError> {
        let target = validate_position(target)?;
        let direction = self.direction();
        let Some(duration) = self.profile.duration_secs(direction) else {
            return Err(ValidationError::Unreachable {
                target,
                direction: direction.as_str(),
            });
        };

        let current = self.position_at(now_ms);
        let remaining = f64::from(target - current) * direction.sign();
        if remaining < -f64::from(POSITION_EPSILON) {
            return Err(ValidationError::Unreachable {
                target,
                direction: direction.as_str(),
            });
        }

        let secs = remaining.max(0.0) / 100.0 * f64::from(duration);
        Ok((secs * 1000.0).round() as u64)
    }

    /// Freeze the position at `now_ms` and stop. Returns the frozen position.
    ///
    /// Stopping while already stopped changes nothing.
    pub fn stop(&mut self, now_ms: u64) -> f32 {
        self.position = self.position_at(now_ms);
        self.leg = None;
        self.position
    }

    /// Overwrite the stored position and drop any movement.
    ///
    /// Used to resynchronise after a restart or manual operation.
    pub fn restore(&mut self, position: f32) -> Result<(), ValidationError> {
        self.position = validate_position(position)?;
        self.leg = None;
        Ok(())
    }

    /// Direction of the current movement.
    pub fn direction(&self) -> Direction {
        self.leg.map_or(Direction::Stopped, |leg| leg.direction)
    }

    /// True while a movement is in progress.
    pub fn is_moving(&self) -> bool {
        self.leg.is_some()
    }

    /// True once a movement has run into its end position.
    pub fn has_arrived(&self, now_ms: u64) -> bool {
        match self.direction().end_position() {
            Some(end) => (self.position_at(now_ms) - end).abs() <= POSITION_EPSILON,
            None => false,
        }
    }

    /// Snapshot at `now_ms`.
    pub fn state(&self, now_ms: u64) -> MotionState {
        match self.leg {
            Some(leg) => MotionState {
                position: self.position_at(now_ms),
                direction: leg.direction,
                movement_started_ms: Some(leg.started_ms),
                start_position: leg.start_position,
            },
            None => MotionState {
                position: self.position,
                direction: Direction::Stopped,
                movement_started_ms: None,
                start_position: self.position,
            },
        }
    }

    /// Coarse state.
    pub fn screen_state(&self) -> ScreenState {
        match self.direction() {
            Direction::Up => ScreenState::MovingUp,
            Direction::Down => ScreenState::MovingDown,
            Direction::Stopped if self.position <= POSITION_UP + POSITION_EPSILON => {
                ScreenState::Up
            }
            Direction::Stopped if self.position >= POSITION_DOWN - POSITION_EPSILON => {
                ScreenState::Down
            }
            Direction::Stopped => ScreenState::Stopped,
        }
    }
}

/// Reject positions outside `0.0..=100.0` (and NaN).
pub fn validate_position(position: f32) -> Result<f32, ValidationError> {
    if (POSITION_UP..=POSITION_DOWN).contains(&position) {
        Ok(position)
    } else {
        Err(ValidationError::Position(position))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(initial: f32) -> PositionTracker {
        PositionTracker::new(TravelProfile::new(30.0, 25.0).unwrap(), initial).unwrap()
    }

    // === Profile ===
    #[test]
    fn profile_rejects_bad_durations() {
        assert_eq!(TravelProfile::new(0.0, 10.0), Err(ValidationError::Duration(0.0)));
        assert_eq!(TravelProfile::new(10.0, -1.0), Err(ValidationError::Duration(-1.0)));
        assert!(TravelProfile::new(f32::NAN, 10.0).is_err());
        assert!(TravelProfile::new(f32::INFINITY, 10.0).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_profile_is_validated() {
        let good: TravelProfile = toml::from_str("down_secs = 30.0\nup_secs = 25.0").unwrap();
        assert_eq!(good, TravelProfile::new(30.0, 25.0).unwrap());

        for bad in [
            "down_secs = 0.0\nup_secs = -5.0",
            "down_secs = 30.0\nup_secs = 0.0",
            "down_secs = nan\nup_secs = 25.0",
        ] {
            let err = toml::from_str::<TravelProfile>(bad).unwrap_err();
            assert!(err.to_string().contains("duration"), "{}", err);
        }
    }

    #[test]
    fn symmetric_profile() {
        let profile = TravelProfile::symmetric(20.0).unwrap();
        assert_eq!(profile.duration_secs(Direction::Up), Some(20.0));
        assert_eq!(profile.duration_secs(Direction::Down), Some(20.0));
        assert_eq!(profile.duration_secs(Direction::Stopped), None);
    }

    #[test]
    fn initial_position_is_validated() {
        let profile = TravelProfile::symmetric(10.0).unwrap();
        assert!(PositionTracker::new(profile, 100.5).is_err());
        assert!(PositionTracker::new(profile, -0.5).is_err());
        assert!(PositionTracker::new(profile, f32::NAN).is_err());
    }

    // === Computed position ===
    #[test]
    fn stopped_position_is_stored_value() {
        let t = tracker(42.0);
        assert_eq!(t.position_at(0), 42.0);
        assert_eq!(t.position_at(1_000_000), 42.0);
    }

    #[test]
    fn down_interpolates_with_down_duration() {
        let mut t = tracker(0.0);
        t.begin(Direction::Down, 1_000).unwrap();
        assert_eq!(t.position_at(1_000), 0.0);
        assert_eq!(t.position_at(16_000), 50.0);
        assert_eq!(t.position_at(31_000), 100.0);
    }

    #[test]
    fn up_interpolates_with_up_duration() {
        let mut t = tracker(100.0);
        t.begin(Direction::Up, 0).unwrap();
        assert_eq!(t.position_at(12_500), 50.0);
        assert_eq!(t.position_at(25_000), 0.0);
    }

    #[test]
    fn position_is_clamped_far_past_duration() {
        let mut t = tracker(50.0);
        t.begin(Direction::Down, 0).unwrap();
        assert_eq!(t.position_at(u64::MAX), 100.0);

        t.begin(Direction::Up, 0).unwrap();
        assert_eq!(t.position_at(10_000_000), 0.0);
    }

    #[test]
    fn time_before_start_counts_as_zero() {
        let mut t = tracker(20.0);
        t.begin(Direction::Down, 5_000).unwrap();
        assert_eq!(t.position_at(1_000), 20.0);
    }

    // === Begin ===
    #[test]
    fn begin_requires_direction() {
        let mut t = tracker(0.0);
        assert_eq!(t.begin(Direction::Stopped, 0), Err(ValidationError::NoDirection));
        assert!(!t.is_moving());
    }

    #[test]
    fn begin_captures_computed_position() {
        let mut t = tracker(0.0);
        t.begin(Direction::Down, 0).unwrap();
        t.begin(Direction::Up, 15_000).unwrap();

        let state = t.state(15_000);
        assert_eq!(state.start_position, 50.0);
        assert_eq!(state.movement_started_ms, Some(15_000));
        assert_eq!(state.direction, Direction::Up);
        // 25s up duration: 12.5 points after 3.125s
        assert_eq!(t.position_at(18_125), 37.5);
    }

    #[test]
    fn begin_same_direction_restarts_leg() {
        let mut t = tracker(0.0);
        t.begin(Direction::Down, 0).unwrap();
        t.begin(Direction::Down, 6_000).unwrap();

        let state = t.state(6_000);
        assert_eq!(state.movement_started_ms, Some(6_000));
        assert_eq!(state.start_position, 20.0);
        // The restart does not change where the screen is
        assert_eq!(t.position_at(12_000), 40.0);
        assert_eq!(t.position_at(30_000), 100.0);
    }

    // === Stop ===
    #[test]
    fn stop_freezes_computed_value() {
        let mut t = tracker(0.0);
        t.begin(Direction::Down, 0).unwrap();
        for elapsed in [0, 1, 7_777, 15_000, 29_999, 30_000] {
            let mut copy = t.clone();
            let computed = copy.position_at(elapsed);
            assert_eq!(copy.stop(elapsed), computed);
            assert_eq!(copy.position_at(elapsed + 50_000), computed);
        }
    }

    #[test]
    fn stop_freezes_computed_value_going_up() {
        let mut t = tracker(100.0);
        t.begin(Direction::Up, 0).unwrap();
        for elapsed in [0, 1, 3_333, 12_500, 24_999, 25_000] {
            let mut copy = t.clone();
            let computed = copy.position_at(elapsed);
            assert_eq!(copy.stop(elapsed), computed);
            assert_eq!(copy.position_at(elapsed + 50_000), computed);
        }
    }

    #[test]
    fn stop_twice_is_idempotent() {
        let mut t = tracker(0.0);
        t.begin(Direction::Down, 0).unwrap();
        let first = t.stop(9_000);
        let second = t.stop(20_000);
        assert!((first - 30.0).abs() < 0.001);
        assert_eq!(first, second);
        assert!(!t.is_moving());
    }

    #[test]
    fn stopped_state_invariant() {
        let mut t = tracker(10.0);
        let state = t.state(0);
        assert_eq!(state.direction, Direction::Stopped);
        assert!(state.movement_started_ms.is_none());

        t.begin(Direction::Down, 0).unwrap();
        let state = t.state(100);
        assert_ne!(state.direction, Direction::Stopped);
        assert!(state.movement_started_ms.is_some());
    }

    // === Time to target ===
    #[test]
    fn time_to_full_travel() {
        let mut t = tracker(0.0);
        t.begin(Direction::Down, 0).unwrap();
        assert_eq!(t.time_to_target(100.0, 0), Ok(30_000));
        assert_eq!(t.time_to_target(100.0, 10_000), Ok(20_000));
    }

    #[test]
    fn time_to_partial_target() {
        let mut t = tracker(50.0);
        t.begin(Direction::Up, 0).unwrap();
        assert_eq!(t.time_to_target(0.0, 0), Ok(12_500));
        assert_eq!(t.time_to_target(40.0, 0), Ok(2_500));
    }

    #[test]
    fn time_to_target_behind_direction_is_error() {
        let mut t = tracker(50.0);
        t.begin(Direction::Up, 0).unwrap();
        assert!(matches!(
            t.time_to_target(80.0, 0),
            Err(ValidationError::Unreachable { .. })
        ));
    }

    #[test]
    fn time_to_target_while_stopped_is_error() {
        let t = tracker(50.0);
        assert!(t.time_to_target(0.0, 0).is_err());
    }

    #[test]
    fn time_to_target_already_there_is_zero() {
        let mut t = tracker(100.0);
        t.begin(Direction::Down, 0).unwrap();
        assert_eq!(t.time_to_target(100.0, 5_000), Ok(0));
    }

    // === States ===
    #[test]
    fn screen_states() {
        let mut t = tracker(0.0);
        assert_eq!(t.screen_state(), ScreenState::Up);

        t.begin(Direction::Down, 0).unwrap();
        assert_eq!(t.screen_state(), ScreenState::MovingDown);
        assert!(!t.has_arrived(100));
        assert!(t.has_arrived(30_000));

        t.stop(30_000);
        assert_eq!(t.screen_state(), ScreenState::Down);

        t.begin(Direction::Up, 30_000).unwrap();
        assert_eq!(t.screen_state(), ScreenState::MovingUp);
        t.stop(35_000);
        assert_eq!(t.screen_state(), ScreenState::Stopped);
    }

    #[test]
    fn restore_overwrites_position() {
        let mut t = tracker(0.0);
        t.begin(Direction::Down, 0).unwrap();
        t.restore(75.0).unwrap();
        assert!(!t.is_moving());
        assert_eq!(t.position_at(99_999), 75.0);
        assert!(t.restore(101.0).is_err());
    }

    // === Direction ===
    #[test]
    fn direction_helpers() {
        assert_eq!(Direction::default(), Direction::Stopped);
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Stopped.opposite(), Direction::Stopped);
        assert_eq!(Direction::towards(50.0, 20.0), Direction::Up);
        assert_eq!(Direction::towards(50.0, 80.0), Direction::Down);
        assert_eq!(Direction::towards(50.0, 50.005), Direction::Stopped);
        assert_eq!(Direction::Down.end_position(), Some(100.0));
    }
}
