//! Mock implementations for testing without a screen.
//!
//! Both mocks are cheap handles over shared state, so a test can keep one
//! clone for inspection while the driver owns another.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockTransport`] | [`Transport`], [`AsyncTransport`] | Records frames, injects failures |
//! | [`MockClock`] | [`Clock`], [`Delay`] | Controllable time source |
//!
//! # Example
//!
//! ```rust
//! use xyscreens::hal::{MockClock, MockTransport};
//! use xyscreens::{CommandSet, PositionTracker, Screen, TravelProfile};
//!
//! let transport = MockTransport::new();
//! let clock = MockClock::new();
//! let tracker = PositionTracker::new(TravelProfile::symmetric(30.0).unwrap(), 0.0).unwrap();
//! let mut screen = Screen::new(transport.clone(), clock.clone(), CommandSet::default(), tracker);
//!
//! screen.down_and_wait().unwrap();
//!
//! assert_eq!(clock.now_ms(), 30_000);
//! assert_eq!(transport.frames().len(), 2);
//! assert_eq!(screen.position(), 100.0);
//! ```
//!
//! [`Transport`]: crate::traits::Transport
//! [`AsyncTransport`]: crate::traits::AsyncTransport
//! [`Clock`]: crate::traits::Clock
//! [`Delay`]: crate::traits::Delay

use core::future::Future;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::traits::{AsyncTransport, Clock, Delay, Transport};

// ============================================================================
// Transport Mock
// ============================================================================

#[derive(Debug, Default)]
struct MockLog {
    frames: Vec<Vec<u8>>,
    attempts: usize,
    fail_next: usize,
    offline: bool,
    stalled: bool,
}

/// Mock transport for testing.
///
/// Every successful send is appended to a shared frame log. Failed sends are
/// counted in [`attempts`](Self::attempts) but never logged as frames.
///
/// # Example
///
/// ```rust
/// use xyscreens::hal::MockTransport;
/// use xyscreens::traits::Transport;
///
/// let mut transport = MockTransport::new();
/// transport.send(&[0xFF, 0x01, 0xCC]).unwrap();
///
/// transport.fail_next(1);
/// assert!(transport.send(&[0xFF, 0x01, 0xDD]).is_err());
///
/// assert_eq!(transport.frames(), vec![vec![0xFF, 0x01, 0xCC]]);
/// assert_eq!(transport.attempts(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct MockTransport {
    endpoint: Endpoint,
    log: Arc<Mutex<MockLog>>,
}

impl MockTransport {
    /// Creates a mock that accepts every frame.
    pub fn new() -> Self {
        Self {
            endpoint: Endpoint::serial("mock"),
            log: Arc::default(),
        }
    }

    /// Report `endpoint` in errors instead of the default `mock`.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn log(&self) -> MutexGuard<'_, MockLog> {
        // A panicking test thread must not hide the log from the others.
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every frame delivered so far, in order.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.log().frames.clone()
    }

    /// How many times `frame` was delivered.
    pub fn count(&self, frame: &[u8]) -> usize {
        self.log().frames.iter().filter(|f| f.as_slice() == frame).count()
    }

    /// Number of send calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.log().attempts
    }

    /// Fail the next `n` sends.
    pub fn fail_next(&self, n: usize) {
        self.log().fail_next = n;
    }

    /// Fail every send until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.log().offline = offline;
    }

    /// Make async sends hang until dropped. Blocking sends are unaffected.
    pub fn set_stalled(&self, stalled: bool) {
        self.log().stalled = stalled;
    }

    /// Forget recorded frames and attempts.
    pub fn clear(&self) {
        let mut log = self.log();
        log.frames.clear();
        log.attempts = 0;
    }

    fn record(&self, frame: &[u8]) -> Result<()> {
        let mut log = self.log();
        log.attempts += 1;
        if log.offline || log.fail_next > 0 {
            log.fail_next = log.fail_next.saturating_sub(1);
            return Err(Error::connection(
                &self.endpoint,
                io::Error::new(io::ErrorKind::NotConnected, "mock transport offline"),
            ));
        }
        log.frames.push(frame.to_vec());
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.record(frame)
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        Some(&self.endpoint)
    }
}

impl AsyncTransport for MockTransport {
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = Result<()>> + Send {
        let stalled = self.log().stalled;
        let result = if stalled { None } else { Some(self.record(frame)) };
        async move {
            match result {
                Some(result) => result,
                None => core::future::pending().await,
            }
        }
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        Some(&self.endpoint)
    }
}

// ============================================================================
// Clock Mock
// ============================================================================

/// Mock clock for testing.
///
/// Provides a controllable time source. [`Delay::delay_ms`] advances it
/// instead of sleeping, so blocking waits finish instantly.
///
/// # Example
///
/// ```rust
/// use xyscreens::hal::MockClock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockClock {
    current_ms: Arc<AtomicU64>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Current time. Same as [`Clock::now_ms`], without importing the trait.
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        MockClock::now_ms(self)
    }
}

impl Delay for MockClock {
    fn delay_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

// ============================================================================
// Tests
// ============================================================================
