//=========================================================================
// Mouse Controller
//=========================================================================
//
// Region-filtered handlers layered on four raw controllers.
//
//   MouseButtonDown ─→ press   ┐
//   MouseButtonUp   ─→ release ├─→ MouseBindings::fire
//   MouseMotion     ─→ motion  │     button filter (None = any)
//   MouseWheel      ─→ wheel   ┘     region filter (None = anywhere)
//
// Region tests use the pointer position at the moment the controller
// fires.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::error;

//=== Internal Dependencies ===============================================

use super::{Activation, ControllerId, Handler};
use crate::core::entity::EntityId;
use crate::core::input::{EventCategory, InputEvent, MouseButton};
use crate::core::physics::Aabb;
use crate::core::runtime::Runtime;
use crate::core::scene::SceneKey;

//=== HitRegion ===========================================================

/// Area the pointer must be inside for a binding to match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitRegion {
    /// Current bounds of an entity in the active scene.
    Entity(EntityId),

    /// Fixed window-space rectangle.
    Area(Aabb),
}

impl HitRegion {
    fn contains<S: SceneKey>(&self, runtime: &Runtime<S>) -> bool {
        let pointer = runtime.pointer_position();
        match self {
            Self::Area(area) => area.contains(pointer),
            Self::Entity(id) => runtime
                .entity(*id)
                .map_or(false, |entity| entity.bounds().contains(pointer)),
        }
    }
}

//=== MouseBindings =======================================================

/// Closure run for a matching mouse event.
pub type MouseHandler<S> = Box<dyn FnMut(&mut Runtime<S>, &InputEvent)>;

struct MouseBinding<S: SceneKey> {
    button: Option<MouseButton>,
    region: Option<HitRegion>,
    handler: MouseHandler<S>,
}

impl<S: SceneKey> MouseBinding<S> {
    fn matches(&self, runtime: &Runtime<S>, event: &InputEvent) -> bool {
        let button_ok = match self.button {
            Some(button) => event.button() == Some(button),
            None => true,
        };
        button_ok && self.region.map_or(true, |region| region.contains(runtime))
    }
}

/// Bindings attached to one raw mouse controller.
pub(crate) struct MouseBindings<S: SceneKey> {
    bindings: Vec<MouseBinding<S>>,
}

impl<S: SceneKey> MouseBindings<S> {
    pub(crate) fn new() -> Self {
        Self { bindings: Vec::new() }
    }

    fn push(&mut self, button: Option<MouseButton>, region: Option<HitRegion>, handler: MouseHandler<S>) {
        self.bindings.push(MouseBinding { button, region, handler });
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Runs every binding matching the captured event, in binding order.
    pub(crate) fn fire(&mut self, runtime: &mut Runtime<S>, activation: &Activation) {
        let Some(event) = activation.event() else {
            return;
        };

        for binding in self.bindings.iter_mut() {
            if binding.matches(runtime, event) {
                (binding.handler)(runtime, event);
            }
        }
    }
}

//=== MouseController =====================================================

/// Handle to a mouse convenience controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseController {
    press: ControllerId,
    release: ControllerId,
    motion: ControllerId,
    wheel: ControllerId,
}

impl MouseController {
    //--- Construction -----------------------------------------------------

    /// Registers the four raw controllers on the active scene.
    ///
    /// Returns `None` when no scene is active.
    pub fn new<S: SceneKey>(runtime: &mut Runtime<S>) -> Option<Self> {
        let mut raw = |category| runtime.register_handler(category, Handler::Mouse(MouseBindings::new()));
        Some(Self {
            press: raw(EventCategory::MouseButtonDown)?,
            release: raw(EventCategory::MouseButtonUp)?,
            motion: raw(EventCategory::MouseMotion)?,
            wheel: raw(EventCategory::MouseWheel)?,
        })
    }

    //--- Bindings ---------------------------------------------------------

    /// Runs `handler` when `button` (any button if `None`) goes down
    /// inside `region` (anywhere if `None`).
    pub fn on_press<S, F>(
        &self,
        runtime: &mut Runtime<S>,
        button: Option<MouseButton>,
        region: Option<HitRegion>,
        handler: F,
    ) -> bool
    where
        S: SceneKey,
        F: FnMut(&mut Runtime<S>, &InputEvent) + 'static,
    {
        Self::bind(runtime, self.press, button, region, Box::new(handler))
    }

    pub fn on_release<S, F>(
        &self,
        runtime: &mut Runtime<S>,
        button: Option<MouseButton>,
        region: Option<HitRegion>,
        handler: F,
    ) -> bool
    where
        S: SceneKey,
        F: FnMut(&mut Runtime<S>, &InputEvent) + 'static,
    {
        Self::bind(runtime, self.release, button, region, Box::new(handler))
    }

    /// Runs `handler` when the pointer moves while inside `region`.
    pub fn on_hover<S, F>(&self, runtime: &mut Runtime<S>, region: Option<HitRegion>, handler: F) -> bool
    where
        S: SceneKey,
        F: FnMut(&mut Runtime<S>, &InputEvent) + 'static,
    {
        Self::bind(runtime, self.motion, None, region, Box::new(handler))
    }

    /// Runs `handler` when the wheel scrolls while the pointer is inside `region`.
    pub fn on_wheel<S, F>(&self, runtime: &mut Runtime<S>, region: Option<HitRegion>, handler: F) -> bool
    where
        S: SceneKey,
        F: FnMut(&mut Runtime<S>, &InputEvent) + 'static,
    {
        Self::bind(runtime, self.wheel, None, region, Box::new(handler))
    }

    fn bind<S: SceneKey>(
        runtime: &mut Runtime<S>,
        id: ControllerId,
        button: Option<MouseButton>,
        region: Option<HitRegion>,
        handler: MouseHandler<S>,
    ) -> bool {
        match runtime.handler_mut(id) {
            Some(Handler::Mouse(bindings)) => {
                bindings.push(button, region, handler);
                true
            }
            _ => {
                error!(target: "controller", "Mouse controller {:?} unavailable, binding dropped", id);
                false
            }
        }
    }

    //--- Accessors --------------------------------------------------------

    /// Raw controller ids: press, release, motion, wheel.
    pub fn ids(&self) -> [ControllerId; 4] {
        [self.press, self.release, self.motion, self.wheel]
    }

    /// Total bindings across the four raw controllers.
    pub fn binding_count<S: SceneKey>(&self, runtime: &mut Runtime<S>) -> usize {
        self.ids()
            .into_iter()
            .map(|id| match runtime.handler_mut(id) {
                Some(Handler::Mouse(bindings)) => bindings.len(),
                _ => 0,
            })
            .sum()
    }

    /// Removes all four raw controllers.
    pub fn remove<S: SceneKey>(&self, runtime: &mut Runtime<S>) {
        for id in self.ids() {
            runtime.remove_controller(id);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::core::entity::{Entity, Visual};
    use crate::core::input::Modifiers;
    use crate::core::runtime::tests::runtime;

    fn click(button: MouseButton) -> InputEvent {
        InputEvent::MouseButtonDown { button, modifiers: Modifiers::NONE }
    }

    fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let hits = Rc::new(Cell::new(0));
        (hits.clone(), hits)
    }

    #[test]
    fn press_inside_area_fires() {
        let mut rt = runtime();
        let (hits, seen) = counter();
        let mouse = MouseController::new(&mut rt).unwrap();
        mouse.on_press(
            &mut rt,
            Some(MouseButton::Left),
            Some(HitRegion::Area(Aabb::new(0.0, 0.0, 50.0, 50.0))),
            move |_, _| hits.set(hits.get() + 1),
        );

        rt.dispatch(&InputEvent::MouseMoved { x: 10.0, y: 10.0 });
        rt.dispatch(&click(MouseButton::Left));
        rt.update_tick(10);

        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn press_outside_area_or_wrong_button_is_ignored() {
        let mut rt = runtime();
        let (hits, seen) = counter();
        let mouse = MouseController::new(&mut rt).unwrap();
        mouse.on_press(
            &mut rt,
            Some(MouseButton::Left),
            Some(HitRegion::Area(Aabb::new(0.0, 0.0, 50.0, 50.0))),
            move |_, _| hits.set(hits.get() + 1),
        );

        rt.dispatch(&InputEvent::MouseMoved { x: 80.0, y: 10.0 });
        rt.dispatch(&click(MouseButton::Left));
        rt.update_tick(10);

        rt.dispatch(&InputEvent::MouseMoved { x: 10.0, y: 10.0 });
        rt.dispatch(&click(MouseButton::Right));
        rt.update_tick(20);

        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn any_button_anywhere_matches() {
        let mut rt = runtime();
        let (hits, seen) = counter();
        let mouse = MouseController::new(&mut rt).unwrap();
        mouse.on_press(&mut rt, None, None, move |_, _| hits.set(hits.get() + 1));

        rt.dispatch(&click(MouseButton::Middle));
        rt.update_tick(10);

        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn hover_over_entity_region() {
        let mut rt = runtime();
        let (hits, seen) = counter();
        let button = rt.spawn(Entity::new(Visual::None).at(100.0, 100.0).with_size(20, 20));
        let mouse = MouseController::new(&mut rt).unwrap();
        mouse.on_hover(&mut rt, Some(HitRegion::Entity(button)), move |_, _| hits.set(hits.get() + 1));

        rt.dispatch(&InputEvent::MouseMoved { x: 110.0, y: 105.0 });
        rt.update_tick(10);
        rt.dispatch(&InputEvent::MouseMoved { x: 10.0, y: 5.0 });
        rt.update_tick(20);

        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn wheel_binding_receives_delta() {
        let mut rt = runtime();
        let (hits, seen) = counter();
        let mouse = MouseController::new(&mut rt).unwrap();
        mouse.on_wheel(&mut rt, None, move |_, event| {
            if let InputEvent::MouseWheel { dy, .. } = event {
                hits.set(*dy as u32);
            }
        });

        rt.dispatch(&InputEvent::MouseWheel { dx: 0.0, dy: 3.0 });
        rt.update_tick(10);

        assert_eq!(seen.get(), 3);
        assert_eq!(mouse.binding_count(&mut rt), 1);
    }

    #[test]
    fn removal_drops_all_four_controllers() {
        let mut rt = runtime();
        let mouse = MouseController::new(&mut rt).unwrap();
        assert_eq!(rt.controller_count(), 4);

        mouse.remove(&mut rt);
        assert_eq!(rt.controller_count(), 0);
        assert!(!mouse.on_press(&mut rt, None, None, |_, _| {}));
    }
}
