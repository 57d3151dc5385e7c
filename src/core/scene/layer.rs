//=========================================================================
// Layers
//=========================================================================
//
// Prioritised per-tick tasks.
//
//   Recurring(p)                  runs every update tick
//   RunNTimes { p, remaining }    runs `remaining` more times, then retires
//   Retired                       skipped, dropped at the end of the pass
//
// Layers execute in ascending priority order; ties keep insertion order.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::runtime::Runtime;
use crate::core::scene::SceneKey;
use crate::core::timer::SleepSlot;

//=== LayerPriority =======================================================

/// Ordering key and lifetime of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPriority {
    /// Runs on every update tick.
    Recurring(i32),

    /// Runs on `remaining` more update ticks, then retires.
    RunNTimes { priority: i32, remaining: u32 },

    /// Removed from the scene at the end of the current pass.
    Retired,
}

impl LayerPriority {
    /// Signed shorthand: positive is recurring, `-n` runs `n` times
    /// (ordered by `-n`), zero retires.
    ///
    /// ```
    /// use plume_engine::core::scene::LayerPriority;
    ///
    /// assert_eq!(LayerPriority::from_raw(4), LayerPriority::Recurring(4));
    /// assert_eq!(
    ///     LayerPriority::from_raw(-3),
    ///     LayerPriority::RunNTimes { priority: -3, remaining: 3 }
    /// );
    /// assert_eq!(LayerPriority::from_raw(0), LayerPriority::Retired);
    /// ```
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Retired,
            p if p > 0 => Self::Recurring(p),
            p => Self::RunNTimes { priority: p, remaining: p.unsigned_abs() },
        }
    }

    /// Runs once, ahead of every recurring layer.
    pub fn once() -> Self {
        Self::from_raw(-1)
    }

    /// Ascending execution order key.
    pub fn sort_key(&self) -> i32 {
        match self {
            Self::Recurring(p) => *p,
            Self::RunNTimes { priority, .. } => *priority,
            Self::Retired => 0,
        }
    }

    pub fn is_retired(&self) -> bool {
        matches!(self, Self::Retired)
    }

    /// Counts one execution down.
    fn after_run(&mut self) {
        if let Self::RunNTimes { remaining, .. } = self {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                *self = Self::Retired;
            }
        }
    }
}

impl From<i32> for LayerPriority {
    fn from(raw: i32) -> Self {
        Self::from_raw(raw)
    }
}

//=== Layer ===============================================================

/// Closure run by a layer on each update tick.
pub type LayerFn<S> = Box<dyn FnMut(&mut Runtime<S>)>;

/// A named task inside a scene.
pub struct Layer<S: SceneKey> {
    name: String,
    priority: LayerPriority,
    pub(crate) sleep: SleepSlot,
    run: Option<LayerFn<S>>,
}

impl<S: SceneKey> Layer<S> {
    pub(crate) fn new(name: impl Into<String>, priority: LayerPriority, run: LayerFn<S>) -> Self {
        let priority = match priority {
            LayerPriority::RunNTimes { remaining: 0, .. } => LayerPriority::Retired,
            other => other,
        };
        Self {
            name: name.into(),
            priority,
            sleep: SleepSlot::new(),
            run: Some(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> LayerPriority {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: LayerPriority) {
        self.priority = priority;
    }

    /// Hands out the closure unless the layer is retired or already running.
    ///
    /// The run is counted here, so a priority the closure sets on its own
    /// layer is kept as written.
    pub(crate) fn begin_run(&mut self) -> Option<LayerFn<S>> {
        if self.priority.is_retired() {
            return None;
        }
        let run = self.run.take()?;
        self.priority.after_run();
        Some(run)
    }

    pub(crate) fn end_run(&mut self, run: LayerFn<S>) {
        self.run = Some(run);
    }
}

impl<S: SceneKey> fmt::Debug for Layer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("sleep", &self.sleep)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
