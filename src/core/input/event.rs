//=========================================================================
// Raw Event Types
//=========================================================================
//
// Portable representation of the events the platform layer polls.
//
// Every event belongs to exactly one `EventCategory`. Controllers are
// registered against a category and capture the most recent event of
// that category (see `core::controller`).
//
// Event Flow:
// ```text
// Platform Layer (winit)
//         ↓
//    InputEvent (this module)
//         ├─→ StateTracker  (held keys / buttons / pointer)
//         └─→ Controllers   (category match → invoke)
// ```
//
//=========================================================================

//=== MouseButton =========================================================

/// Physical mouse button identifier.
///
/// The `Other` variant covers side buttons, macro buttons, and any
/// non-standard inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (typically left).
    Left,

    /// Secondary button (typically right).
    Right,

    /// Middle button (wheel click).
    Middle,

    /// Any other button (side buttons, thumb buttons, macro keys).
    Other,
}

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Represents the physical key location, not the character produced.
/// `KeyA` is always the same physical key regardless of keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Numeric Keys -----------------------------------------------------

    /// Number row: 0-9
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    //--- Alphabetic Keys --------------------------------------------------

    /// Letter keys: A-Z (physical location, not character)
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Arrow Keys -------------------------------------------------------

    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Special Keys -----------------------------------------------------

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,

    /// Fallback for keys the platform layer does not map.
    Unidentified,
}

//=== EventCategory =======================================================

/// Filter a controller is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    KeyDown,
    KeyUp,
    MouseButtonDown,
    MouseButtonUp,
    MouseMotion,
    MouseWheel,

    /// Window geometry changes.
    Window,

    /// Application-defined events. Physics bodies register here so that
    /// only their own self-re-arming keeps them running.
    User,
}

//=== InputEvent ==========================================================

/// Raw event delivered by the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Key pressed. `repeat` is set for OS auto-repeat.
    KeyDown {
        key: KeyCode,
        modifiers: Modifiers,
        repeat: bool,
    },

    /// Key released.
    KeyUp {
        key: KeyCode,
        modifiers: Modifiers,
    },

    MouseButtonDown {
        button: MouseButton,
        modifiers: Modifiers,
    },

    MouseButtonUp {
        button: MouseButton,
        modifiers: Modifiers,
    },

    /// Cursor moved. Screen space, pixels, top-left origin.
    MouseMoved { x: f32, y: f32 },

    /// Wheel scrolled, in lines.
    MouseWheel { dx: f32, dy: f32 },

    /// Window inner size changed, in pixels.
    WindowResized { width: u32, height: u32 },

    /// Application-defined event.
    User { code: u32 },
}

impl InputEvent {
    /// Category used for controller matching.
    pub fn category(&self) -> EventCategory {
        match self {
            Self::KeyDown { .. } => EventCategory::KeyDown,
            Self::KeyUp { .. } => EventCategory::KeyUp,
            Self::MouseButtonDown { .. } => EventCategory::MouseButtonDown,
            Self::MouseButtonUp { .. } => EventCategory::MouseButtonUp,
            Self::MouseMoved { .. } => EventCategory::MouseMotion,
            Self::MouseWheel { .. } => EventCategory::MouseWheel,
            Self::WindowResized { .. } => EventCategory::Window,
            Self::User { .. } => EventCategory::User,
        }
    }

    /// Key carried by a keyboard event.
    pub fn key(&self) -> Option<KeyCode> {
        match self {
            Self::KeyDown { key, .. } | Self::KeyUp { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Button carried by a mouse button event.
    pub fn button(&self) -> Option<MouseButton> {
        match self {
            Self::MouseButtonDown { button, .. } | Self::MouseButtonUp { button, .. } => {
                Some(*button)
            }
            _ => None,
        }
    }

    /// `true` for OS auto-repeat key presses.
    pub fn is_repeat(&self) -> bool {
        matches!(self, Self::KeyDown { repeat: true, .. })
    }

    /// Whether the platform may coalesce this event (last one wins).
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::MouseMoved { .. } | Self::MouseWheel { .. } | Self::WindowResized { .. }
        )
    }
}

//=== Modifiers ===========================================================

/// Modifier key state (Shift, Ctrl, Alt).
///
/// Left and right variants are not distinguished. Ctrl covers Command on
/// macOS, Alt covers Option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

//--- Modifier Constants --------------------------------------------------

impl Modifiers {
    pub const NONE: Self = Self { shift: false, ctrl: false, alt: false };
    pub const SHIFT: Self = Self { shift: true, ctrl: false, alt: false };
    pub const CTRL: Self = Self { shift: false, ctrl: true, alt: false };
    pub const ALT: Self = Self { shift: false, ctrl: false, alt: true };
}

impl Default for Modifiers {
    /// Defaults to no modifiers held.
    fn default() -> Self {
        Self::NONE
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
