//=========================================================================
// Plume Engine: Library Root
//
// A small real-time 2D engine core.
//
// Responsibilities:
// - Expose the engine facade (`EngineBuilder`, `Engine`)
// - Expose the core systems user code works with through `Runtime`
// - Provide an optional winit-backed window driver (`platform`)
//
// Typical usage:
// ```no_run
// use plume_engine::prelude::*;
//
// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
// enum Scenes { Game }
// impl SceneKey for Scenes {}
//
// let mut engine = EngineBuilder::new().build::<Scenes>();
// engine.register_scene(Scenes::Game, Scene::new());
// engine.set_initial_scene(Scenes::Game);
// engine.run().unwrap();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the scheduler's building blocks (scenes, controllers,
// physics, timers). `platform` drives an engine from a winit window.
//
pub mod core;
pub mod error;
pub mod platform;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------

mod engine;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder, EngineState};
pub use error::EngineError;
