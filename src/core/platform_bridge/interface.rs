//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Messages a platform sends to the engine over the crossbeam channel.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::input::InputEvent;

//=== PlatformEvent =======================================================

/// Events sent from a platform to the engine.
///
/// Obtain a sender with [`Engine::event_sender`](crate::Engine::event_sender).
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// Input gathered since the previous flush.
    ///
    /// `discrete` events keep their order; `continuous` ones (motion,
    /// wheel, resize) are already coalesced and are dispatched after them.
    Inputs {
        discrete: Vec<InputEvent>,
        continuous: Vec<InputEvent>,
    },

    /// Window close requested.
    WindowClosed,
}

impl PlatformEvent {
    /// Wraps events that need no coalescing.
    pub fn inputs(events: impl Into<Vec<InputEvent>>) -> Self {
        Self::Inputs {
            discrete: events.into(),
            continuous: Vec::new(),
        }
    }
}
