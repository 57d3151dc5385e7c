//=========================================================================
// Input
//=========================================================================
//
// Raw event types shared by the platform layer and the controller
// dispatcher, plus the held-state tracker layers poll.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod event;
pub mod state_tracker;

//=== Public API ==========================================================

pub use event::{EventCategory, InputEvent, KeyCode, Modifiers, MouseButton};
pub use state_tracker::StateTracker;
