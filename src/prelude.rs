//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use plume_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine
pub use crate::engine::{Engine, EngineBuilder, EngineState};
pub use crate::error::EngineError;

// Scheduling
pub use crate::core::controller::{Activation, ControllerId, HitRegion, KeyboardController, MouseController};
pub use crate::core::runtime::Runtime;
pub use crate::core::scene::{LayerPriority, Scene, SceneKey};
pub use crate::core::timer::SleepState;

// Input
pub use crate::core::input::{EventCategory, InputEvent, KeyCode, Modifiers, MouseButton};

// Entities & physics
pub use crate::core::entity::{Entity, EntityId, Visual};
pub use crate::core::physics::{Aabb, BodyType, Force, GravityDirection};

// Math
pub use glam::Vec2;
