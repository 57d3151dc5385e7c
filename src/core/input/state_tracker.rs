//=========================================================================
// State Tracker
//=========================================================================
//
// Persistent input state rebuilt from the raw event stream.
//
// Architecture:
//   InputEvent → process_event() → HashSet (keys/buttons held) → query
//
// Layers that poll ("is the left arrow held?") read this instead of
// registering a controller.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use glam::Vec2;

//=== Internal Dependencies ===============================================

use super::event::{InputEvent, KeyCode, Modifiers, MouseButton};

//=== StateTracker ========================================================

/// Tracks keys and buttons held, pointer position and modifiers.
#[derive(Debug, Default)]
pub struct StateTracker {
    keys_down: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    pointer: Vec2,
    wheel: Vec2,
    modifiers: Modifiers,
}

impl StateTracker {
    /// Creates a new state tracker with empty state.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Event Processing -------------------------------------------------

    pub(crate) fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { key, modifiers, .. } => {
                self.modifiers = *modifiers;
                self.keys_down.insert(*key);
            }

            InputEvent::KeyUp { key, modifiers } => {
                self.modifiers = *modifiers;
                self.keys_down.remove(key);
            }

            InputEvent::MouseButtonDown { button, modifiers } => {
                self.modifiers = *modifiers;
                self.mouse_buttons_down.insert(*button);
            }

            InputEvent::MouseButtonUp { button, modifiers } => {
                self.modifiers = *modifiers;
                self.mouse_buttons_down.remove(button);
            }

            InputEvent::MouseMoved { x, y } => {
                self.pointer = Vec2::new(*x, *y);
            }

            InputEvent::MouseWheel { dx, dy } => {
                self.wheel = Vec2::new(*dx, *dy);
            }

            InputEvent::WindowResized { .. } | InputEvent::User { .. } => {}
        }
    }

    //=====================================================================
    // Query API
    //=====================================================================

    /// Returns `true` while `key` is held.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Like [`is_key_down`](Self::is_key_down) but for mouse buttons.
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Pointer position in window pixels, top-left origin.
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    /// Most recent wheel delta.
    pub fn wheel_delta(&self) -> Vec2 {
        self.wheel
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Returns an iterator over all keys currently held.
    pub fn keys_down(&self) -> impl Iterator<Item = &KeyCode> {
        self.keys_down.iter()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
