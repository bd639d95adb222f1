//! Time sources.
//!
//! The tracker never reads the time itself; the drivers pass `now_ms` from a
//! [`Clock`]. Blocking waits go through [`Delay`] so tests can advance a mock
//! clock instead of sleeping.
//!
//! # Example
//!
//! ```rust
//! use xyscreens::traits::{Clock, Delay};
//! use xyscreens::hal::MockClock;
//!
//! let clock = MockClock::new();
//! assert_eq!(clock.now_ms(), 0);
//!
//! clock.delay_ms(250);
//! assert_eq!(clock.now_ms(), 250);
//! ```

/// Monotonic time source.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch.
    ///
    /// Must never go backwards.
    fn now_ms(&self) -> u64;
}

/// Blocking delay.
pub trait Delay {
    /// Suspend the calling thread for `ms` milliseconds.
    fn delay_ms(&self, ms: u64);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<D: Delay + ?Sized> Delay for &D {
    fn delay_ms(&self, ms: u64) {
        (**self).delay_ms(ms)
    }
}
