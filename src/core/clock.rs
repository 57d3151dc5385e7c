//=========================================================================
// Tick Source
//=========================================================================
//
// Monotonic millisecond clock shared by the whole core.
//
// The scheduler reads real time from a `TickSource` to feed its
// fixed-timestep accumulator. Everything else (controller debounce,
// layer sleeps, animations) is measured against the simulation time
// the scheduler derives from it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

//=== TickSource ==========================================================

/// Monotonic millisecond tick counter.
///
/// Implementations must never go backwards.
pub trait TickSource {
    /// Milliseconds elapsed since an arbitrary fixed origin.
    fn ticks_ms(&self) -> u64;
}

//=== SystemClock =========================================================

/// Wall-clock tick source backed by [`Instant`].
///
/// The origin is the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SystemClock {
    fn ticks_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

//=== ManualClock =========================================================

/// Hand-driven tick source.
///
/// Clones share the same counter, so a test can keep one handle and give
/// the other to the engine:
///
/// ```
/// use plume_engine::core::clock::{ManualClock, TickSource};
///
/// let clock = ManualClock::new();
/// let engine_side = clock.clone();
/// clock.advance(25);
/// assert_eq!(engine_side.ticks_ms(), 25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Jumps to an absolute tick value. Values in the past are ignored.
    pub fn set(&self, ms: u64) {
        if ms >= self.now.get() {
            self.now.set(ms);
        }
    }
}

impl TickSource for ManualClock {
    fn ticks_ms(&self) -> u64 {
        self.now.get()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        assert_eq!(ManualClock::new().ticks_ms(), 0);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(10);
        b.advance(5);
        assert_eq!(a.ticks_ms(), 15);
        assert_eq!(b.ticks_ms(), 15);
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new();
        clock.set(100);
        clock.set(40);
        assert_eq!(clock.ticks_ms(), 100);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.ticks_ms();
        let second = clock.ticks_ms();
        assert!(second >= first);
    }
}
