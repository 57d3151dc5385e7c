//=========================================================================
// Plume Engine
//
// Main entry point and scheduler state machine.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──start()──>  RUNNING
//         │                          │                     │
//         ├─ with_update_quantum()   ├─ register_scene()   └─ frame()*
//         ├─ with_fps()              ├─ set_initial_scene()     1. input
//         ├─ with_clock()            └─ init()                  2. update ×⌊acc/Q⌋
//         └─ with_backend()                                     3. render
//                                                               4. pace
// ```
//
// States: INIT → RUNNING → TERMINATED. A quit request or a closed window
// ends RUNNING after the current frame; termination releases every scene.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use log::{debug, info, trace};

//=== Internal Dependencies ===============================================

use crate::core::clock::{SystemClock, TickSource};
use crate::core::platform_bridge::{EventCollector, PlatformEvent, TickControl};
use crate::core::render::{HeadlessBackend, RenderBackend};
use crate::core::runtime::Runtime;
use crate::core::scene::{Scene, SceneKey};
use crate::error::EngineError;

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Update quantum**: 10 ms
/// - **FPS**: 60 (frame limiting on)
/// - **Channel capacity**: 128 events
/// - **Window**: "Plume Engine", 640×480
/// - **Clock**: [`SystemClock`]
/// - **Backend**: [`HeadlessBackend`]
///
/// # Examples
///
/// ```
/// use plume_engine::EngineBuilder;
/// use plume_engine::core::clock::ManualClock;
/// use plume_engine::core::scene::SceneKey;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum GameScene { Main }
/// impl SceneKey for GameScene {}
///
/// let engine = EngineBuilder::new()
///     .with_update_quantum(5)
///     .with_fps(120)
///     .with_window_title("Flappy")
///     .with_clock(ManualClock::new())
///     .build::<GameScene>();
///
/// assert_eq!(engine.update_quantum(), 5);
/// ```
pub struct EngineBuilder {
    update_quantum: u64,
    fps: u32,
    frame_limit: bool,
    channel_capacity: usize,
    window_title: String,
    window_size: (u32, u32),
    clock: Option<Box<dyn TickSource>>,
    backend: Option<Box<dyn RenderBackend>>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            update_quantum: 10,
            fps: 60,
            frame_limit: true,
            channel_capacity: 128,
            window_title: "Plume Engine".to_owned(),
            window_size: (640, 480),
            clock: None,
            backend: None,
        }
    }

    /// Sets the fixed update quantum in milliseconds.
    ///
    /// Every frame runs as many whole quanta as real time allows; the
    /// remainder carries over to the next frame.
    ///
    /// # Panics
    ///
    /// Panics if `ms == 0`.
    pub fn with_update_quantum(mut self, ms: u64) -> Self {
        assert!(ms > 0, "Update quantum must be positive");
        self.update_quantum = ms;
        self
    }

    /// Sets the target refresh rate used by frame limiting.
    ///
    /// # Panics
    ///
    /// Panics if `fps == 0`.
    pub fn with_fps(mut self, fps: u32) -> Self {
        assert!(fps > 0, "FPS must be positive");
        self.fps = fps;
        self
    }

    /// Idle for the rest of each frame's budget (default: on).
    pub fn with_frame_limit(mut self, enabled: bool) -> Self {
        self.frame_limit = enabled;
        self
    }

    /// Sets the channel capacity for platform → engine events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    pub fn with_window_title(mut self, title: &str) -> Self {
        self.window_title = title.to_owned();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Replaces the monotonic tick source.
    pub fn with_clock(mut self, clock: impl TickSource + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Replaces the render collaborator.
    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Builds the engine in the INIT state.
    pub fn build<S: SceneKey>(self) -> Engine<S> {
        info!(
            target: "engine",
            "Building engine (quantum: {} ms, fps: {}, channel: {})",
            self.update_quantum,
            self.fps,
            self.channel_capacity
        );

        let (sender, receiver) = bounded(self.channel_capacity);
        let backend = self.backend.unwrap_or_else(|| Box::new(HeadlessBackend::new()));

        Engine {
            runtime: Runtime::new(self.window_size, self.window_title, backend),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock::new())),
            collector: EventCollector::new(receiver),
            sender,
            state: EngineState::Init,
            initial_scene: None,
            update_quantum: self.update_quantum,
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(self.fps)),
            frame_limit: self.frame_limit,
            accumulator: 0,
            last_frame: 0,
            sim_time: 0,
            tick_count: 0,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== EngineState =========================================================

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    Running,
    Terminated,
}

//=== Engine ==============================================================

/// Plume Engine scheduler.
///
/// Create via [`EngineBuilder`]. Drive it headless with [`Engine::run`]
/// or [`Engine::frame`], or from a window with
/// [`platform::run_windowed`](crate::platform::run_windowed).
pub struct Engine<S: SceneKey> {
    runtime: Runtime<S>,
    clock: Box<dyn TickSource>,
    collector: EventCollector,
    sender: Sender<PlatformEvent>,
    state: EngineState,
    initial_scene: Option<S>,
    update_quantum: u64,
    frame_budget: Duration,
    frame_limit: bool,
    accumulator: u64,
    last_frame: u64,
    sim_time: u64,
    tick_count: u64,
}

impl<S: SceneKey> Engine<S> {
    //--- Setup ------------------------------------------------------------

    pub fn register_scene(&mut self, key: S, scene: Scene<S>) -> &mut Self {
        self.runtime.register_scene(key, scene);
        self
    }

    /// Chooses the scene active at start.
    ///
    /// If it is already registered it becomes active immediately, so
    /// [`init`](Self::init) closures populate it.
    pub fn set_initial_scene(&mut self, key: S) -> &mut Self {
        self.initial_scene = Some(key);
        if self.runtime.scenes.contains(key) {
            self.runtime.scenes.activate(key);
        }
        self
    }

    /// Runs `init_fn` against the runtime before the loop starts.
    ///
    /// Controllers, entities and physics bodies created here belong to the
    /// active scene.
    pub fn init<F>(&mut self, init_fn: F) -> &mut Self
    where
        F: FnOnce(&mut Runtime<S>),
    {
        info!(target: "engine", "Initializing engine systems");
        init_fn(&mut self.runtime);
        self
    }

    /// Sender for platform events. Clones feed the same channel.
    pub fn event_sender(&self) -> Sender<PlatformEvent> {
        self.sender.clone()
    }

    //--- Lifecycle --------------------------------------------------------

    /// INIT → RUNNING.
    ///
    /// Fails if no initial scene was chosen or it was never registered.
    /// Calling it while already running is a no-op.
    pub fn start(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Running => return Ok(()),
            EngineState::Terminated => return Err(EngineError::NotRunning),
            EngineState::Init => {}
        }

        let key = self.initial_scene.ok_or(EngineError::NoScene)?;
        if !self.runtime.scenes.activate(key) {
            return Err(EngineError::UnregisteredScene(format!("{:?}", key)));
        }

        self.last_frame = self.clock.ticks_ms();
        self.state = EngineState::Running;
        info!(target: "engine", "Engine running, initial scene {:?}", key);
        Ok(())
    }

    /// Runs one frame: input, whole update quanta, render.
    ///
    /// Returns the number of update ticks run. After a quit request or a
    /// closed window the engine is TERMINATED when this returns.
    pub fn frame(&mut self) -> Result<u32, EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotRunning);
        }

        let now = self.clock.ticks_ms();
        self.accumulator += now.saturating_sub(self.last_frame);
        self.last_frame = now;

        //--- 1. Input -------------------------------------------------
        if self.collector.collect_frame() == TickControl::Exit {
            info!(target: "engine", "Window closed");
            self.shutdown();
            return Ok(0);
        }
        for batch in self.collector.take_batches() {
            for event in &batch {
                self.runtime.dispatch(event);
            }
        }

        //--- 2. Update ------------------------------------------------
        let mut ticks = 0;
        while self.accumulator >= self.update_quantum && !self.runtime.quit_requested() {
            self.runtime.update_tick(self.sim_time);
            self.sim_time += self.update_quantum;
            self.accumulator -= self.update_quantum;
            self.tick_count += 1;
            ticks += 1;
        }
        if ticks > 0 {
            trace!(target: "engine", "Frame ran {} tick(s), {} ms carried", ticks, self.accumulator);
        }

        //--- 3. Render ------------------------------------------------
        self.runtime.render();

        if self.runtime.quit_requested() {
            self.shutdown();
        }
        Ok(ticks)
    }

    /// Starts the engine and runs frames until it terminates.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.start()?;

        while self.state == EngineState::Running {
            let frame_start = Instant::now();
            self.frame()?;

            //--- 4. Pace ----------------------------------------------
            if let Some(budget) = self.frame_budget() {
                let elapsed = frame_start.elapsed();
                if elapsed < budget {
                    thread::sleep(budget - elapsed);
                }
            }
        }

        Ok(())
    }

    /// RUNNING → TERMINATED. Releases every scene. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == EngineState::Terminated {
            return;
        }
        self.runtime.release();
        self.state = EngineState::Terminated;
        info!(target: "engine", "Engine shutdown complete after {} tick(s)", self.tick_count);
    }

    //--- Accessors --------------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Update ticks run since start.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn update_quantum(&self) -> u64 {
        self.update_quantum
    }

    /// Frame duration to pace to, when frame limiting is on.
    pub fn frame_budget(&self) -> Option<Duration> {
        self.frame_limit.then_some(self.frame_budget)
    }

    pub fn runtime(&self) -> &Runtime<S> {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime<S> {
        &mut self.runtime
    }
}

impl<S: SceneKey> Drop for Engine<S> {
    fn drop(&mut self) {
        if self.state == EngineState::Running {
            debug!(target: "engine", "Engine dropped while running");
            self.shutdown();
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::input::{EventCategory, InputEvent, KeyCode, Modifiers};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestScene {
        Main,
        Missing,
    }

    impl SceneKey for TestScene {}

    fn engine(clock: &ManualClock) -> Engine<TestScene> {
        let mut engine = EngineBuilder::new()
            .with_clock(clock.clone())
            .with_frame_limit(false)
            .build::<TestScene>();
        engine.register_scene(TestScene::Main, Scene::new());
        engine.set_initial_scene(TestScene::Main);
        engine
    }

    //=====================================================================
    // EngineBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = EngineBuilder::new();
        assert_eq!(builder.update_quantum, 10);
        assert_eq!(builder.fps, 60);
        assert!(builder.frame_limit);
        assert_eq!(builder.channel_capacity, 128);
        assert_eq!(builder.window_size, (640, 480));
    }

    #[test]
    #[should_panic(expected = "Update quantum must be positive")]
    fn builder_with_update_quantum_panics_on_zero() {
        EngineBuilder::new().with_update_quantum(0);
    }

    #[test]
    #[should_panic(expected = "FPS must be positive")]
    fn builder_with_fps_panics_on_zero() {
        EngineBuilder::new().with_fps(0);
    }

    #[test]
    #[should_panic(expected = "Channel capacity must be positive")]
    fn builder_with_channel_capacity_panics_on_zero() {
        EngineBuilder::new().with_channel_capacity(0);
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let engine = EngineBuilder::new()
            .with_update_quantum(16)
            .with_fps(30)
            .with_window_size(800, 600)
            .with_window_title("Chained")
            .build::<TestScene>();

        assert_eq!(engine.update_quantum(), 16);
        assert_eq!(engine.frame_budget(), Some(Duration::from_secs_f64(1.0 / 30.0)));
        assert_eq!(engine.runtime().window_size(), (800, 600));
        assert_eq!(engine.runtime().title(), "Chained");
        assert_eq!(engine.state(), EngineState::Init);
    }

    //=====================================================================
    // Lifecycle Tests
    //=====================================================================

    #[test]
    fn start_without_scene_is_fatal() {
        let mut engine = EngineBuilder::new().build::<TestScene>();
        let err = engine.start().unwrap_err();
        assert!(matches!(err, EngineError::NoScene));
        assert!(err.is_fatal());
    }

    #[test]
    fn start_with_unregistered_scene_is_fatal() {
        let mut engine = EngineBuilder::new().build::<TestScene>();
        engine.set_initial_scene(TestScene::Missing);
        assert!(matches!(engine.start(), Err(EngineError::UnregisteredScene(name)) if name == "Missing"));
        assert_eq!(engine.state(), EngineState::Init);
    }

    #[test]
    fn frame_requires_running() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        assert!(matches!(engine.frame(), Err(EngineError::NotRunning)));
    }

    #[test]
    fn accumulator_runs_whole_quanta() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        engine.start().unwrap();

        clock.advance(35);
        assert_eq!(engine.frame().unwrap(), 3);

        clock.advance(4);
        assert_eq!(engine.frame().unwrap(), 0);

        clock.advance(1);
        assert_eq!(engine.frame().unwrap(), 1);
        assert_eq!(engine.tick_count(), 4);
    }

    #[test]
    fn simulation_time_advances_by_quantum() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        engine.init(|rt| {
            rt.add_layer("clock", 1, move |rt| s.borrow_mut().push(rt.now()));
        });
        engine.start().unwrap();

        clock.advance(30);
        engine.frame().unwrap();

        assert_eq!(*seen.borrow(), vec![0, 10, 20]);
    }

    #[test]
    fn quit_request_terminates_and_releases() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        engine.init(|rt| {
            rt.add_layer("quit", 1, |rt| rt.request_quit());
        });
        engine.start().unwrap();

        clock.advance(50);
        assert_eq!(engine.frame().unwrap(), 1);

        assert_eq!(engine.state(), EngineState::Terminated);
        assert!(engine.runtime().scene().is_none());
        assert!(matches!(engine.frame(), Err(EngineError::NotRunning)));
    }

    #[test]
    fn window_closed_terminates() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        engine.start().unwrap();

        engine.event_sender().send(PlatformEvent::WindowClosed).unwrap();
        engine.frame().unwrap();

        assert_eq!(engine.state(), EngineState::Terminated);
    }

    #[test]
    fn sent_events_reach_controllers() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let keys = Rc::new(RefCell::new(Vec::new()));
        let k = keys.clone();
        engine.init(|rt| {
            rt.register_controller(EventCategory::KeyDown, move |_, activation| {
                k.borrow_mut().push(activation.event().and_then(InputEvent::key));
            });
        });
        engine.start().unwrap();

        let down = InputEvent::KeyDown { key: KeyCode::Space, modifiers: Modifiers::NONE, repeat: false };
        engine.event_sender().send(PlatformEvent::inputs(vec![down])).unwrap();
        clock.advance(10);
        engine.frame().unwrap();

        assert_eq!(*keys.borrow(), vec![Some(KeyCode::Space)]);
        assert!(engine.runtime().is_key_down(KeyCode::Space));
    }

    #[test]
    fn render_runs_every_frame() {
        let clock = ManualClock::new();
        let backend = HeadlessBackend::new();
        let mut engine = EngineBuilder::new()
            .with_clock(clock.clone())
            .with_backend(backend.clone())
            .build::<TestScene>();
        engine.register_scene(TestScene::Main, Scene::new());
        engine.set_initial_scene(TestScene::Main);
        engine.start().unwrap();

        engine.frame().unwrap();
        engine.frame().unwrap();

        assert_eq!(backend.log().frames, 2);
    }
}
