//=========================================================================
// Plume Demo
//
// A flappy-style game on top of the engine core.
//
// Scenes:
//   Game      bird (dynamic body) vs pipes (dynamic bodies drifting left)
//   GameOver  entered on the first collision; Escape quits
//
// Controls: Space flaps, Escape quits.
//
// Run with `--headless` to drive the scheduler without a window; the game
// then flaps on a timer and quits after a few seconds.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use plume_engine::platform;
use plume_engine::prelude::*;

//=== Scenes ==============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Scenes {
    Game,
    GameOver,
}

impl SceneKey for Scenes {}

//=== Tuning ==============================================================

const WINDOW: (u32, u32) = (400, 600);
const BIRD_SIZE: u32 = 24;
const PIPE_WIDTH: u32 = 52;
const PIPE_GAP: u32 = 160;
const PIPE_INTERVAL_MS: u64 = 1500;
const PIPE_SPEED: f32 = 2.0;
const GRAVITY: f32 = 3.0;
const FLAP_SPEED: f32 = 7.0;
const FLAP_TICKS: u32 = 8;
const HEADLESS_RUN_MS: u64 = 5_000;

/// Top edge of the gap for pipe pair `n`, cycling through a few heights.
fn gap_top(n: u32, height: u32) -> u32 {
    80 + n.wrapping_mul(97) % height.saturating_sub(PIPE_GAP + 160).max(1)
}

//=== Game State ==========================================================

/// State shared by the Game scene's layers and controllers.
#[derive(Default)]
struct Game {
    bird: Cell<Option<ControllerId>>,
    pipes: RefCell<Vec<(EntityId, ControllerId)>>,
    spawned: Cell<u32>,
}

impl Game {
    fn flap(&self, runtime: &mut Runtime<Scenes>) {
        if let Some(bird) = self.bird.get() {
            runtime.apply_force(bird, Force::repeated(Vec2::NEG_Y, FLAP_SPEED, FLAP_TICKS));
        }
    }

    /// Spawns a top and bottom pipe at the right edge.
    fn spawn_pipes(&self, runtime: &mut Runtime<Scenes>) {
        let (width, height) = runtime.window_size();
        let n = self.spawned.get();
        self.spawned.set(n + 1);

        let gap_top = gap_top(n, height);
        let x = width as f32;

        let top = Entity::new(Visual::Color([40, 160, 60, 255]))
            .at(x, 0.0)
            .with_size(PIPE_WIDTH, gap_top)
            .with_z(1);
        let bottom = Entity::new(Visual::Color([40, 160, 60, 255]))
            .at(x, (gap_top + PIPE_GAP) as f32)
            .with_size(PIPE_WIDTH, height.saturating_sub(gap_top + PIPE_GAP))
            .with_z(1);

        for pipe in [top, bottom] {
            let entity = runtime.spawn(pipe);
            match runtime.init_physics_body(entity, BodyType::Dynamic, 0) {
                Ok(body) => {
                    runtime.apply_force(body, Force::forever(Vec2::NEG_X, PIPE_SPEED));
                    self.pipes.borrow_mut().push((entity, body));
                }
                Err(err) => error!("Pipe body failed: {}", err),
            }
        }
        debug!("Spawned pipe pair {}", n);
    }

    /// Drops pipes that left the screen.
    fn cull_pipes(&self, runtime: &mut Runtime<Scenes>) {
        self.pipes.borrow_mut().retain(|&(entity, body)| {
            let visible = runtime
                .entity(entity)
                .map_or(false, |pipe| pipe.bounds().right() > 0.0);
            if !visible {
                runtime.remove_controller(body);
                runtime.despawn(entity);
            }
            visible
        });
    }
}

//=== Scene Construction ==================================================

fn game_scene(game: Rc<Game>, headless: bool) -> Scene<Scenes> {
    let setup = game.clone();
    let spawner = game.clone();
    let culler = game.clone();
    let referee = game.clone();

    let mut scene = Scene::new()
        .with_layer("setup", LayerPriority::once(), move |runtime| {
            let sky = runtime.spawn(Entity::new(Visual::Color([110, 190, 230, 255])).with_size(1, 1).with_z(-10));
            runtime.fit_fullscreen(sky);

            let (width, height) = runtime.window_size();
            let bird = runtime.spawn(
                Entity::new(Visual::Color([240, 200, 40, 255]))
                    .at(width as f32 / 4.0, height as f32 / 2.0)
                    .with_size(BIRD_SIZE, BIRD_SIZE)
                    .with_z(5),
            );
            match runtime.init_physics_body(bird, BodyType::Dynamic, 0) {
                Ok(body) => {
                    runtime.apply_force(body, Force::forever(Vec2::Y, GRAVITY));
                    setup.bird.set(Some(body));
                }
                Err(err) => error!("Bird body failed: {}", err),
            }

            if let Some(keyboard) = KeyboardController::new(runtime) {
                let flapper = setup.clone();
                keyboard.on_press(runtime, KeyCode::Space, move |runtime, _| flapper.flap(runtime));
                keyboard.on_press(runtime, KeyCode::Escape, |runtime, _| runtime.request_quit());
            }
            info!("Game ready, Space to flap");
        })
        .with_layer("spawner", 10, move |runtime| {
            if runtime.sleep_gate(PIPE_INTERVAL_MS) {
                spawner.spawn_pipes(runtime);
            }
        })
        .with_layer("cull", 5, move |runtime| culler.cull_pipes(runtime))
        .with_layer("referee", 1, move |runtime| {
            let Some(bird) = referee.bird.get() else {
                return;
            };
            let out_of_bounds = runtime
                .physics_body(bird)
                .and_then(|body| runtime.entity(body.entity()))
                .map_or(false, |entity| {
                    let bounds = entity.bounds();
                    bounds.top() > runtime.window_size().1 as f32 || bounds.bottom() < 0.0
                });

            if runtime.is_currently_colliding(bird) || out_of_bounds {
                info!("Bird down after {} pipe pair(s)", referee.spawned.get());
                runtime.set_window_title("Plume: game over");
                runtime.swap_scene(Scenes::GameOver);
            }
        });

    if headless {
        scene.add_layer("autopilot", 20, move |runtime| {
            if runtime.sleep_gate(400) {
                game.flap(runtime);
            }
        });
    }
    scene
}

fn game_over_scene(headless: bool) -> Scene<Scenes> {
    Scene::new()
        .with_controller(EventCategory::KeyDown, |runtime, activation| {
            if activation.event().and_then(InputEvent::key) == Some(KeyCode::Escape) {
                runtime.request_quit();
            }
        })
        .with_layer("setup", LayerPriority::once(), move |runtime| {
            let banner = runtime.spawn(Entity::new(Visual::Color([20, 20, 20, 200])).with_size(1, 1).with_z(10));
            runtime.fit_fullscreen(banner);

            if headless {
                runtime.request_quit();
                return;
            }
            info!("Game over, Escape to quit");
        })
}

//=== Main ================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let headless = std::env::args().any(|arg| arg == "--headless");

    let mut engine = EngineBuilder::new()
        .with_window_title("Plume")
        .with_window_size(WINDOW.0, WINDOW.1)
        .build::<Scenes>();

    engine
        .register_scene(Scenes::Game, game_scene(Rc::new(Game::default()), headless))
        .register_scene(Scenes::GameOver, game_over_scene(headless))
        .set_initial_scene(Scenes::Game);

    let result = if headless {
        engine.init(|runtime| {
            runtime.add_layer("timeout", LayerPriority::Recurring(100), |runtime| {
                if runtime.now() >= HEADLESS_RUN_MS {
                    runtime.request_quit();
                }
            });
        });
        engine.run()
    } else {
        platform::run_windowed(&mut engine)
    };

    match result {
        Ok(()) => info!("Finished after {} tick(s)", engine.tick_count()),
        Err(err) => {
            error!("Engine error: {}", err);
            std::process::exit(1);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
