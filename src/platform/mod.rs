//=========================================================================
// Platform Subsystem
//
// Drives an Engine from a native winit window.
//
// Architecture:
// ```text
//  Event Loop Thread:
//  ┌─────────────────────────────────────────────┐
//  │  winit WindowEvent                          │
//  │   ↓                                         │
//  │  InputProcessor   converts, tracks modifiers│
//  │   ↓                                         │
//  │  InputBuffer      discrete / coalesced      │
//  │   ↓ (about_to_wait: flush)                  │
//  │  Channel ─────→ Engine::frame()             │
//  │                  input → ticks → render     │
//  │   ↓                                         │
//  │  ControlFlow::WaitUntil(next frame)         │
//  └─────────────────────────────────────────────┘
// ```
//
// Frame boundary: `about_to_wait`. Everything winit delivered since the
// previous frame is sent as one `PlatformEvent::Inputs`, then exactly
// one scheduler frame runs. A close request is forwarded through the
// same channel so the engine terminates on its own path.
//
// winit requires the event loop on the main thread on macOS/iOS, so
// `run_windowed` must be called from the thread that owns `main`.
//
//=========================================================================

//=== Submodules ==========================================================

mod input_buffer;
mod input_processor;

//=== External Dependencies ===============================================

use crossbeam_channel::Sender;
use log::*;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

//=== Internal Dependencies ===============================================

use crate::core::platform_bridge::PlatformEvent;
use crate::core::SceneKey;
use crate::engine::{Engine, EngineState};
use crate::error::EngineError;
use input_buffer::InputBuffer;
use input_processor::InputProcessor;

//=== Entry Point =========================================================

/// Opens a window and runs `engine` on the winit event loop until it
/// terminates.
///
/// The engine must be configured (scenes registered, initial scene set)
/// but not yet started. Returns the first fatal error the engine or the
/// windowing system reported.
pub fn run_windowed<S: SceneKey>(engine: &mut Engine<S>) -> Result<(), EngineError> {
    let event_loop = EventLoop::new().map_err(EngineError::EventLoopCreation)?;
    let mut app = WindowedApp::new(engine);

    info!(target: "platform", "Starting event loop");
    event_loop
        .run_app(&mut app)
        .map_err(EngineError::EventLoopExecution)?;

    let failure = app.failure.take();
    drop(app);
    engine.shutdown();
    info!(target: "platform", "Event loop exited");

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

//=== WindowedApp =========================================================

/// winit application handler owning the window for one engine run.
struct WindowedApp<'a, S: SceneKey> {
    engine: &'a mut Engine<S>,
    window: Option<Window>,
    sender: Sender<PlatformEvent>,
    input_buffer: InputBuffer,
    input_processor: InputProcessor,
    applied_title: String,
    failure: Option<EngineError>,
}

impl<'a, S: SceneKey> WindowedApp<'a, S> {
    fn new(engine: &'a mut Engine<S>) -> Self {
        let sender = engine.event_sender();
        let applied_title = engine.runtime().title().to_owned();

        Self {
            engine,
            window: None,
            sender,
            input_buffer: InputBuffer::new(),
            input_processor: InputProcessor::new(),
            applied_title,
            failure: None,
        }
    }

    //--- Frame Boundary ---------------------------------------------------

    /// Sends buffered input as one batch. Empty buffers are not sent.
    fn flush_input_buffer(&mut self) {
        let Some((discrete, continuous)) = self.input_buffer.drain() else {
            return;
        };

        trace!(
            target: "platform::input",
            "Flushing {} discrete, {} continuous event(s)",
            discrete.len(),
            continuous.len()
        );

        if self
            .sender
            .send(PlatformEvent::Inputs { discrete, continuous })
            .is_err()
        {
            warn!(target: "platform", "Engine channel disconnected, input dropped");
        }
    }

    /// Runs one scheduler frame and mirrors its window state.
    fn step(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.state() != EngineState::Running {
            event_loop.exit();
            return;
        }

        if let Err(err) = self.engine.frame() {
            error!(target: "platform", "Engine frame failed: {}", err);
            self.fail(event_loop, err);
            return;
        }

        if self.engine.state() == EngineState::Terminated {
            event_loop.exit();
            return;
        }

        self.sync_window();
    }

    fn sync_window(&mut self) {
        let Some(window) = &self.window else {
            return;
        };

        let title = self.engine.runtime().title();
        if title != self.applied_title {
            window.set_title(title);
            self.applied_title = title.to_owned();
        }
        window.request_redraw();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: EngineError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        event_loop.exit();
    }
}

//=== ApplicationHandler ==================================================

impl<S: SceneKey> ApplicationHandler for WindowedApp<'_, S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.engine.runtime().window_size();
        let attributes = Window::default_attributes()
            .with_title(self.engine.runtime().title())
            .with_inner_size(LogicalSize::new(width, height));

        match event_loop.create_window(attributes) {
            Ok(window) => {
                info!(target: "platform", "Window created ({}x{})", width, height);
                self.window = Some(window);
            }
            Err(err) => {
                error!(target: "platform", "Failed to create window: {}", err);
                self.fail(event_loop, EngineError::WindowCreation(err));
                return;
            }
        }

        if let Err(err) = self.engine.start() {
            error!(target: "platform", "Engine failed to start: {}", err);
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.flush_input_buffer();
                if self.sender.send(PlatformEvent::WindowClosed).is_err() {
                    event_loop.exit();
                    return;
                }
                self.step(event_loop);
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.input_processor.update_modifiers(modifiers.state());
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(input) = self.input_processor.process_key_event(&event) {
                    self.input_buffer.push_discrete(input);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let input = self.input_processor.process_mouse_button(button, state);
                self.input_buffer.push_discrete(input);
            }

            WindowEvent::CursorMoved { position, .. } => {
                let input = self
                    .input_processor
                    .process_mouse_move(position.x as f32, position.y as f32);
                self.input_buffer.push_continuous(input);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let input = self.input_processor.process_wheel(delta);
                self.input_buffer.push_continuous(input);
            }

            WindowEvent::Resized(size) => {
                let input = self.input_processor.process_resize(size);
                self.input_buffer.push_continuous(input);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.flush_input_buffer();
        self.step(event_loop);

        match self.engine.frame_budget() {
            Some(budget) => event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + budget)),
            None => event_loop.set_control_flow(ControlFlow::Poll),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::controller::Activation;
    use crate::core::input::{EventCategory, InputEvent, KeyCode, Modifiers};
    use crate::core::render::HeadlessBackend;
    use crate::core::Scene;
    use crate::engine::EngineBuilder;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        Main,
    }
    impl SceneKey for Key {}

    fn engine(clock: &ManualClock) -> Engine<Key> {
        let mut engine = EngineBuilder::new()
            .with_clock(clock.clone())
            .with_backend(HeadlessBackend::new())
            .build::<Key>();
        engine.register_scene(Key::Main, Scene::new()).set_initial_scene(Key::Main);
        engine
    }

    #[test]
    fn flushed_input_reaches_controllers() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let presses = Rc::new(RefCell::new(0));
        let seen = presses.clone();
        engine.init(move |rt| {
            rt.register_controller(EventCategory::KeyDown, move |_, _: &mut Activation| {
                *seen.borrow_mut() += 1;
            });
        });
        engine.start().unwrap();

        let mut app = WindowedApp::new(&mut engine);
        app.input_buffer.push_discrete(InputEvent::KeyDown {
            key: KeyCode::Space,
            modifiers: Modifiers::NONE,
            repeat: false,
        });
        app.flush_input_buffer();
        assert!(app.input_buffer.is_empty());
        drop(app);

        clock.advance(10);
        engine.frame().unwrap();
        assert_eq!(*presses.borrow(), 1);
    }

    #[test]
    fn empty_buffer_sends_nothing() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        engine.start().unwrap();

        let mut app = WindowedApp::new(&mut engine);
        app.flush_input_buffer();
        drop(app);

        clock.advance(10);
        assert_eq!(engine.frame().unwrap(), 1);
        assert_eq!(engine.state(), EngineState::Running);
    }

    #[test]
    fn applied_title_starts_from_runtime() {
        let clock = ManualClock::new();
        let mut engine = EngineBuilder::new()
            .with_clock(clock)
            .with_window_title("Plume Test")
            .with_backend(HeadlessBackend::new())
            .build::<Key>();

        let app = WindowedApp::new(&mut engine);
        assert_eq!(app.applied_title, "Plume Test");
        assert!(app.window.is_none());
    }
}
