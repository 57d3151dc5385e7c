//=========================================================================
// Controllers
//=========================================================================
//
// Event-reactive tasks bound to one raw event category.
//
// Architecture:
//   ControllerRegistry
//     └─ controllers: Vec<Controller>    (registration order)
//          ├─ category / delay / invoke / last_called
//          ├─ event: Option<InputEvent>  (latest captured)
//          └─ handler: Option<Handler>   (taken out while it runs)
//
// Input phase:   dispatch(event) → every idle controller whose category
//                matches sets invoke and captures the event.
// Update phase:  fires each due controller in registration order
//                (see Runtime::fire_controllers).
//
// Removal only marks a controller; storage is compacted by `purge()` at
// the start of the next update pass so indices stay stable mid-tick.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod keyboard;
pub mod mouse;

//=== Public API ==========================================================

pub use keyboard::KeyboardController;
pub use mouse::{HitRegion, MouseController};

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::input::{EventCategory, InputEvent};
use crate::core::physics::PhysicsBody;
use crate::core::runtime::Runtime;
use crate::core::scene::SceneKey;
use keyboard::KeyBindings;
use mouse::MouseBindings;

//=== ControllerId ========================================================

/// Engine-unique controller identifier. Ids start at 1 and never repeat
/// within one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u32);

impl ControllerId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

//=== Activation ==========================================================

/// What a handler sees when its controller fires.
#[derive(Debug, Clone)]
pub struct Activation {
    id: ControllerId,
    event: Option<InputEvent>,
    rearm: bool,
}

impl Activation {
    pub(crate) fn new(id: ControllerId, event: Option<InputEvent>) -> Self {
        Self { id, event, rearm: false }
    }

    /// Id of the firing controller.
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Latest matching event captured before this firing.
    pub fn event(&self) -> Option<&InputEvent> {
        self.event.as_ref()
    }

    /// Keeps the controller pending: it fires again on the next eligible
    /// tick without a new matching event.
    pub fn rearm(&mut self) {
        self.rearm = true;
    }

    pub fn is_rearmed(&self) -> bool {
        self.rearm
    }
}

//=== Handler =============================================================

/// Closure run when a plain controller fires.
pub type Callback<S> = Box<dyn FnMut(&mut Runtime<S>, &mut Activation)>;

/// Behaviour attached to a controller.
pub(crate) enum Handler<S: SceneKey> {
    Callback(Callback<S>),
    Keyboard(KeyBindings<S>),
    Mouse(MouseBindings<S>),
    Physics(PhysicsBody),
}

impl<S: SceneKey> Handler<S> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Callback(_) => "callback",
            Self::Keyboard(_) => "keyboard",
            Self::Mouse(_) => "mouse",
            Self::Physics(_) => "physics",
        }
    }
}

//=== Controller ==========================================================

/// A registered controller.
pub struct Controller<S: SceneKey> {
    id: ControllerId,
    category: EventCategory,
    delay: u64,
    invoke: bool,
    last_called: Option<u64>,
    event: Option<InputEvent>,
    removed: bool,
    pub(crate) handler: Option<Handler<S>>,
}

impl<S: SceneKey> Controller<S> {
    fn new(id: ControllerId, category: EventCategory, handler: Handler<S>) -> Self {
        Self {
            id,
            category,
            delay: 0,
            invoke: false,
            last_called: None,
            event: None,
            removed: false,
            handler: Some(handler),
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// Minimum milliseconds between two firings.
    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.invoke
    }

    pub fn last_called(&self) -> Option<u64> {
        self.last_called
    }

    pub fn captured_event(&self) -> Option<&InputEvent> {
        self.event.as_ref()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub(crate) fn set_delay(&mut self, delay: u64) {
        self.delay = delay;
    }

    pub(crate) fn set_pending(&mut self, invoke: bool) {
        self.invoke = invoke;
    }

    /// Pending and past its debounce window.
    pub(crate) fn is_due(&self, now: u64) -> bool {
        !self.removed
            && self.invoke
            && self.last_called.map_or(true, |last| now >= last.saturating_add(self.delay))
    }

    /// Clears `invoke` and hands out what the handler needs.
    ///
    /// Returns `None` if the handler is already running.
    pub(crate) fn begin_fire(&mut self) -> Option<(Handler<S>, Activation)> {
        let handler = self.handler.take()?;
        self.invoke = false;
        Some((handler, Activation::new(self.id, self.event.clone())))
    }

    /// Puts the handler back and stamps the firing time.
    pub(crate) fn end_fire(&mut self, handler: Handler<S>, activation: &Activation, now: u64) {
        self.handler = Some(handler);
        self.last_called = Some(now);
        if activation.rearm {
            self.invoke = true;
        }
    }

    pub(crate) fn physics(&self) -> Option<&PhysicsBody> {
        match &self.handler {
            Some(Handler::Physics(body)) => Some(body),
            _ => None,
        }
    }

    pub(crate) fn physics_mut(&mut self) -> Option<&mut PhysicsBody> {
        match &mut self.handler {
            Some(Handler::Physics(body)) => Some(body),
            _ => None,
        }
    }
}

//=== ControllerRegistry ==================================================

/// Controllers of one scene, in registration order.
pub struct ControllerRegistry<S: SceneKey> {
    controllers: Vec<Controller<S>>,
}

impl<S: SceneKey> ControllerRegistry<S> {
    pub fn new() -> Self {
        Self { controllers: Vec::new() }
    }

    //--- Registration -----------------------------------------------------

    pub(crate) fn register(&mut self, id: ControllerId, category: EventCategory, handler: Handler<S>) {
        debug!(
            target: "controller",
            "Registered {} controller {:?} on {:?}",
            handler.kind(),
            id,
            category
        );
        self.controllers.push(Controller::new(id, category, handler));
    }

    /// Marks `id` for removal. Idempotent: unknown or already removed
    /// ids are ignored. Returns `true` if a live controller was marked.
    pub(crate) fn remove(&mut self, id: ControllerId) -> bool {
        match self.controllers.iter_mut().find(|c| c.id == id && !c.removed) {
            Some(controller) => {
                controller.removed = true;
                controller.invoke = false;
                debug!(target: "controller", "Controller {:?} marked for removal", id);
                true
            }
            None => {
                debug!(target: "controller", "Controller {:?} not present, removal ignored", id);
                false
            }
        }
    }

    /// Drops removed controllers and returns their ids.
    pub(crate) fn purge(&mut self) -> Vec<ControllerId> {
        let mut purged = Vec::new();
        self.controllers.retain(|c| {
            if c.removed {
                purged.push(c.id);
            }
            !c.removed
        });
        purged
    }

    pub(crate) fn clear(&mut self) {
        self.controllers.clear();
    }

    //--- Dispatch ---------------------------------------------------------

    /// Stamps `event` onto every idle controller of its category.
    ///
    /// Controllers already pending are left alone, so several matching
    /// events before an update coalesce into one firing. Returns the
    /// number of controllers armed.
    pub(crate) fn dispatch(&mut self, event: &InputEvent) -> usize {
        let category = event.category();
        let mut armed = 0;

        for controller in self.controllers.iter_mut() {
            if controller.removed || controller.invoke || controller.category != category {
                continue;
            }
            controller.invoke = true;
            controller.event = Some(event.clone());
            armed += 1;
        }

        armed
    }

    //--- Lookup -----------------------------------------------------------

    pub fn get(&self, id: ControllerId) -> Option<&Controller<S>> {
        self.controllers.iter().find(|c| c.id == id && !c.removed)
    }

    pub(crate) fn get_mut(&mut self, id: ControllerId) -> Option<&mut Controller<S>> {
        self.controllers.iter_mut().find(|c| c.id == id && !c.removed)
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut Controller<S>> {
        self.controllers.get_mut(index)
    }

    /// Live controllers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Controller<S>> {
        self.controllers.iter().filter(|c| !c.removed)
    }

    /// Storage length, removed controllers included.
    pub(crate) fn slots(&self) -> usize {
        self.controllers.len()
    }

    /// Live controller count.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: SceneKey> Default for ControllerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
