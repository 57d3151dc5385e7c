//=========================================================================
// Core
//=========================================================================
//
// Platform-independent engine systems.
//
// Layout:
//   clock, timer        monotonic ticks and cooperative sleep
//   input               raw events, categories, held state
//   controller          event-reactive tasks (+ keyboard/mouse helpers)
//   physics             bodies, forces, AABB collider registry
//   entity, render      drawables and the render collaborator
//   scene               layers, scenes, scene manager
//   runtime             the handle user code receives
//   platform_bridge     platform → engine channel contract
//
// Everything here runs on one logical thread.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod clock;
pub mod controller;
pub mod entity;
pub mod input;
pub mod physics;
pub mod platform_bridge;
pub mod render;
pub mod runtime;
pub mod scene;
pub mod timer;

//=== Public API ==========================================================

pub use runtime::Runtime;
pub use scene::{Scene, SceneKey};
