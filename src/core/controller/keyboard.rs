//=========================================================================
// Keyboard Controller
//=========================================================================
//
// Per-key handlers layered on two raw controllers (press and release).
//
//   KeyDown ─→ press controller   ─→ KeyBindings::fire ─→ handler(key)*
//   KeyUp   ─→ release controller ─→ KeyBindings::fire ─→ handler(key)*
//
// OS auto-repeat presses never match.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::error;

//=== Internal Dependencies ===============================================

use super::{Activation, ControllerId, Handler};
use crate::core::input::{EventCategory, KeyCode};
use crate::core::runtime::Runtime;
use crate::core::scene::SceneKey;

//=== KeyHandler ==========================================================

/// Closure run for a bound key.
pub type KeyHandler<S> = Box<dyn FnMut(&mut Runtime<S>, KeyCode)>;

//=== KeyBindings =========================================================

/// (key, handler) pairs attached to one raw controller.
pub(crate) struct KeyBindings<S: SceneKey> {
    bindings: Vec<(KeyCode, KeyHandler<S>)>,
}

impl<S: SceneKey> KeyBindings<S> {
    pub(crate) fn new() -> Self {
        Self { bindings: Vec::new() }
    }

    pub(crate) fn push(&mut self, key: KeyCode, handler: KeyHandler<S>) {
        self.bindings.push((key, handler));
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Runs every handler bound to the captured key, in binding order.
    pub(crate) fn fire(&mut self, runtime: &mut Runtime<S>, activation: &Activation) {
        let Some(event) = activation.event() else {
            return;
        };
        if event.is_repeat() {
            return;
        }
        let Some(key) = event.key() else {
            return;
        };

        for (bound, handler) in self.bindings.iter_mut() {
            if *bound == key {
                handler(runtime, key);
            }
        }
    }
}

//=== KeyboardController ==================================================

/// Handle to a keyboard convenience controller.
///
/// # Examples
///
/// ```
/// use plume_engine::prelude::*;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Scenes { Game }
/// impl SceneKey for Scenes {}
///
/// let mut engine = EngineBuilder::new().build::<Scenes>();
/// engine.register_scene(Scenes::Game, Scene::new());
/// engine.set_initial_scene(Scenes::Game);
///
/// engine.init(|runtime| {
///     if let Some(keyboard) = KeyboardController::new(runtime) {
///         keyboard.on_press(runtime, KeyCode::Escape, |runtime, _| runtime.request_quit());
///     }
/// });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardController {
    press: ControllerId,
    release: ControllerId,
}

impl KeyboardController {
    //--- Construction -----------------------------------------------------

    /// Registers the press and release controllers on the active scene.
    ///
    /// Returns `None` when no scene is active.
    pub fn new<S: SceneKey>(runtime: &mut Runtime<S>) -> Option<Self> {
        let press = runtime.register_handler(EventCategory::KeyDown, Handler::Keyboard(KeyBindings::new()))?;
        let release = runtime.register_handler(EventCategory::KeyUp, Handler::Keyboard(KeyBindings::new()))?;
        Some(Self { press, release })
    }

    //--- Bindings ---------------------------------------------------------

    /// Runs `handler` whenever `key` goes down.
    ///
    /// Returns `false` if the controller is gone or is currently running
    /// (a key handler cannot bind keys on its own controller).
    pub fn on_press<S, F>(&self, runtime: &mut Runtime<S>, key: KeyCode, handler: F) -> bool
    where
        S: SceneKey,
        F: FnMut(&mut Runtime<S>, KeyCode) + 'static,
    {
        Self::bind(runtime, self.press, key, Box::new(handler))
    }

    /// Runs `handler` whenever `key` goes up.
    pub fn on_release<S, F>(&self, runtime: &mut Runtime<S>, key: KeyCode, handler: F) -> bool
    where
        S: SceneKey,
        F: FnMut(&mut Runtime<S>, KeyCode) + 'static,
    {
        Self::bind(runtime, self.release, key, Box::new(handler))
    }

    fn bind<S: SceneKey>(runtime: &mut Runtime<S>, id: ControllerId, key: KeyCode, handler: KeyHandler<S>) -> bool {
        match runtime.handler_mut(id) {
            Some(Handler::Keyboard(bindings)) => {
                bindings.push(key, handler);
                true
            }
            _ => {
                error!(target: "controller", "Keyboard controller {:?} unavailable, {:?} not bound", id, key);
                false
            }
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn press_id(&self) -> ControllerId {
        self.press
    }

    pub fn release_id(&self) -> ControllerId {
        self.release
    }

    /// Number of keys bound on press and on release.
    pub fn binding_counts<S: SceneKey>(&self, runtime: &mut Runtime<S>) -> (usize, usize) {
        let mut count = |id| match runtime.handler_mut(id) {
            Some(Handler::Keyboard(bindings)) => bindings.len(),
            _ => 0,
        };
        (count(self.press), count(self.release))
    }

    /// Removes both raw controllers.
    pub fn remove<S: SceneKey>(&self, runtime: &mut Runtime<S>) {
        runtime.remove_controller(self.press);
        runtime.remove_controller(self.release);
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
    use crate::core::input::{InputEvent, Modifiers};
    use crate::core::runtime::tests::runtime;

    fn down(key: KeyCode, repeat: bool) -> InputEvent {
        InputEvent::KeyDown { key, modifiers: Modifiers::NONE, repeat }
    }

    fn up(key: KeyCode) -> InputEvent {
        InputEvent::KeyUp { key, modifiers: Modifiers::NONE }
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (log.clone(), log)
    }

    #[test]
    fn press_and_release_handlers_fire_for_their_key() {
        let mut rt = runtime();
        let (log, seen) = recorder();
        let keyboard = KeyboardController::new(&mut rt).unwrap();

        let l = log.clone();
        keyboard.on_press(&mut rt, KeyCode::Space, move |_, key| l.borrow_mut().push(format!("down {:?}", key)));
        let l = log.clone();
        keyboard.on_release(&mut rt, KeyCode::Space, move |_, key| l.borrow_mut().push(format!("up {:?}", key)));
        let l = log;
        keyboard.on_press(&mut rt, KeyCode::KeyA, move |_, _| l.borrow_mut().push("A".into()));

        rt.dispatch(&down(KeyCode::Space, false));
        rt.update_tick(10);
        rt.dispatch(&up(KeyCode::Space));
        rt.update_tick(20);

        assert_eq!(*seen.borrow(), vec!["down Space".to_string(), "up Space".to_string()]);
    }

    #[test]
    fn auto_repeat_is_ignored() {
        let mut rt = runtime();
        let (log, seen) = recorder();
        let keyboard = KeyboardController::new(&mut rt).unwrap();
        keyboard.on_press(&mut rt, KeyCode::KeyW, move |_, _| log.borrow_mut().push("w".into()));

        rt.dispatch(&down(KeyCode::KeyW, true));
        rt.update_tick(10);

        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn every_matching_binding_runs() {
        let mut rt = runtime();
        let (log, seen) = recorder();
        let keyboard = KeyboardController::new(&mut rt).unwrap();

        for tag in ["first", "second"] {
            let l = log.clone();
            keyboard.on_press(&mut rt, KeyCode::Enter, move |_, _| l.borrow_mut().push(tag.into()));
        }

        rt.dispatch(&down(KeyCode::Enter, false));
        rt.update_tick(10);

        assert_eq!(*seen.borrow(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(keyboard.binding_counts(&mut rt), (2, 0));
    }

    #[test]
    fn removed_keyboard_stops_binding() {
        let mut rt = runtime();
        let keyboard = KeyboardController::new(&mut rt).unwrap();
        keyboard.remove(&mut rt);

        assert!(!keyboard.on_press(&mut rt, KeyCode::KeyQ, |_, _| {}));
    }

    #[test]
    fn ids_are_distinct() {
        let mut rt = runtime();
        let keyboard = KeyboardController::new(&mut rt).unwrap();
        assert_ne!(keyboard.press_id(), keyboard.release_id());
        assert_eq!(rt.controller_count(), 2);
    }
}
