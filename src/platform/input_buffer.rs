//=========================================================================
// Input Buffer
//=========================================================================
//
// Per-frame store between the winit callbacks and the engine channel.
//
//   discrete     keys, buttons: kept in order, consecutive duplicates
//                dropped
//   continuous   pointer, wheel, resize: one entry per kind; motion and
//                resize keep the latest value, wheel deltas add up
//
// Drained once per frame into a single PlatformEvent::Inputs.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::input::InputEvent;

//=== InputBuffer =========================================================

pub(crate) struct InputBuffer {
    discrete: Vec<InputEvent>,
    continuous: Vec<InputEvent>,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        const DISCRETE_BASE: usize = 64;
        const CONTINUOUS_BASE: usize = 4;

        Self {
            discrete: Vec::with_capacity(DISCRETE_BASE),
            continuous: Vec::with_capacity(CONTINUOUS_BASE),
        }
    }

    //--- Buffering --------------------------------------------------------

    pub(crate) fn push_discrete(&mut self, event: InputEvent) {
        if self.discrete.last() != Some(&event) {
            self.discrete.push(event);
        }
    }

    pub(crate) fn push_continuous(&mut self, event: InputEvent) {
        let category = event.category();
        let Some(slot) = self.continuous.iter_mut().find(|e| e.category() == category) else {
            self.continuous.push(event);
            return;
        };

        match (slot, event) {
            (InputEvent::MouseWheel { dx, dy }, InputEvent::MouseWheel { dx: ndx, dy: ndy }) => {
                *dx += ndx;
                *dy += ndy;
            }
            (slot, latest) => *slot = latest,
        }
    }

    //--- Drain ------------------------------------------------------------

    /// Takes both buffers, or `None` if nothing was buffered.
    pub(crate) fn drain(&mut self) -> Option<(Vec<InputEvent>, Vec<InputEvent>)> {
        if self.is_empty() {
            return None;
        }
        Some((self.discrete.drain(..).collect(), self.continuous.drain(..).collect()))
    }

    pub(crate) fn len(&self) -> usize {
        self.discrete.len() + self.continuous.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.continuous.is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
