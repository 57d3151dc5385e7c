//=========================================================================
// Platform Bridge
//=========================================================================
//
// Contract between whatever produces raw events (winit, tests, a
// replay file) and the scheduler's input phase.
//
// Components:
// - `interface`: the event type sent over the channel
// - `event_collector`: scheduler-side draining with a per-frame bound
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub mod interface;

//=== Public API ==========================================================

pub use interface::PlatformEvent;

//=== Internal API ========================================================

pub(crate) use event_collector::{EventCollector, TickControl};
