//=========================================================================
// Cooperative Sleep
//=========================================================================
//
// Non-blocking per-task delay tracking.
//
// A task never blocks a thread. It records a wake deadline and, on every
// later tick, asks whether the deadline has elapsed. Layers and entity
// animations own one `SleepSlot` each.
//
// Guarded block protocol (see `SleepSlot::gate`):
//
//   check() == Clear     → run body, arm deadline for `duration`
//   check() == JustWoke  → run body, deadline stays cleared
//   check() == Sleeping  → skip body
//
//=========================================================================

//=== SleepState ==========================================================

/// Result of polling a [`SleepSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    /// A deadline is recorded and has not elapsed yet.
    Sleeping,

    /// No deadline is recorded.
    Clear,

    /// The deadline elapsed; the record was cleared by this call.
    JustWoke,
}

impl SleepState {
    /// `true` unless the owner is still waiting.
    pub fn is_awake(self) -> bool {
        !matches!(self, Self::Sleeping)
    }
}

//=== SleepSlot ===========================================================

/// Wake deadline for one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepSlot {
    wake_at: Option<u64>,
}

impl SleepSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `now + duration_ms` as the wake deadline.
    pub fn sleep_for(&mut self, now: u64, duration_ms: u64) {
        self.wake_at = Some(now.saturating_add(duration_ms));
    }

    /// Polls the deadline against `now`.
    ///
    /// Returns [`SleepState::JustWoke`] exactly once per elapsed deadline.
    pub fn check(&mut self, now: u64) -> SleepState {
        match self.wake_at {
            None => SleepState::Clear,
            Some(deadline) if now >= deadline => {
                self.wake_at = None;
                SleepState::JustWoke
            }
            Some(_) => SleepState::Sleeping,
        }
    }

    /// Drops any pending deadline.
    ///
    /// With `suppress_next_arm == false` the next check reports
    /// [`SleepState::Clear`], so a guarded block runs and re-arms at once.
    /// With `suppress_next_arm == true` the next check reports
    /// [`SleepState::JustWoke`]: the block runs once without re-arming.
    pub fn unsleep(&mut self, suppress_next_arm: bool) {
        self.wake_at = if suppress_next_arm { Some(0) } else { None };
    }

    /// Guarded block helper. Returns `true` when the block should run.
    pub fn gate(&mut self, now: u64, duration_ms: u64) -> bool {
        match self.check(now) {
            SleepState::Sleeping => false,
            SleepState::Clear => {
                self.sleep_for(now, duration_ms);
                true
            }
            SleepState::JustWoke => true,
        }
    }

    /// Recorded deadline, if any.
    pub fn wake_at(&self) -> Option<u64> {
        self.wake_at
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
