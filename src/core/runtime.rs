//=========================================================================
// Runtime
//=========================================================================
//
// The handle every layer, controller and init closure receives.
//
// Architecture:
//   Runtime
//     ├─ scenes:     SceneManager        (active scene + queued swap)
//     ├─ input:      StateTracker        (held keys/buttons, pointer)
//     ├─ backend:    Box<dyn RenderBackend>
//     ├─ counters:   controller ids, entity ids   (start at 1)
//     └─ window:     size, title
//
// One update tick:
//   1. purge controllers removed during the previous tick
//   2. fire due controllers in registration order
//   3. run layers in ascending priority, then drop retired layers
//   4. apply a queued scene swap
//
// A running handler is taken out of its slot for the duration of the
// call, so it can freely use `&mut Runtime` (register, remove, swap, ...)
// without aliasing the storage it lives in.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec2;
use log::{debug, error, info, trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::controller::{Activation, Controller, ControllerId, Handler};
use crate::core::entity::{Entity, EntityId};
use crate::core::input::{EventCategory, InputEvent, KeyCode, MouseButton, StateTracker};
use crate::core::physics::{BodyType, ColliderLabel, Force, PhysicsBody};
use crate::core::render::RenderBackend;
use crate::core::scene::{Layer, LayerPriority, Scene, SceneKey, SceneManager};
use crate::core::timer::SleepState;
use crate::error::EngineError;

//=== Runtime =============================================================

/// Mutable view of the engine handed to user code.
pub struct Runtime<S: SceneKey> {
    pub(crate) scenes: SceneManager<S>,
    input: StateTracker,
    backend: Box<dyn RenderBackend>,
    now: u64,
    next_controller_id: u32,
    next_entity_id: u32,
    window_size: (u32, u32),
    title: String,
    title_changed: bool,
    quit_requested: bool,
}

impl<S: SceneKey> Runtime<S> {
    pub(crate) fn new(window_size: (u32, u32), title: String, backend: Box<dyn RenderBackend>) -> Self {
        Self {
            scenes: SceneManager::new(),
            input: StateTracker::new(),
            backend,
            now: 0,
            next_controller_id: 1,
            next_entity_id: 1,
            window_size,
            title,
            title_changed: true,
            quit_requested: false,
        }
    }

    /// Simulation time of the current update tick, in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    //=====================================================================
    // Scheduler Hooks
    //=====================================================================

    /// Input phase: update held state, then arm matching controllers.
    pub(crate) fn dispatch(&mut self, event: &InputEvent) {
        self.input.process_event(event);

        if let InputEvent::WindowResized { width, height } = *event {
            self.window_size = (width, height);
            self.backend.resize(width, height);
        }

        if let Some(scene) = self.scenes.active_mut() {
            let armed = scene.controllers.dispatch(event);
            trace!(target: "controller", "{:?} armed {} controller(s)", event.category(), armed);
        }
    }

    /// Runs one update tick at simulation time `now`.
    pub(crate) fn update_tick(&mut self, now: u64) {
        self.now = now;

        if let Some(scene) = self.scenes.active_mut() {
            scene.purge_controllers();
        }

        self.fire_controllers();
        self.run_layers();

        if let Some(key) = self.scenes.apply_pending() {
            debug!(target: "scene", "Scene {:?} active from tick {}", key, now);
        }
    }

    /// Hands the active scene's entities to the backend in draw order.
    pub(crate) fn render(&mut self) {
        if self.title_changed {
            self.backend.set_title(&self.title);
            self.title_changed = false;
        }

        let Some(scene) = self.scenes.active() else {
            return;
        };

        self.backend.begin_frame();
        for (id, entity) in scene.entities.iter() {
            self.backend.draw(id, entity);
        }
        self.backend.present();
    }

    /// Releases every scene.
    pub(crate) fn release(&mut self) {
        self.scenes.clear();
    }

    fn fire_controllers(&mut self) {
        let Some(key) = self.scenes.active_key() else {
            return;
        };
        let slots = self.scenes.get(key).map_or(0, |scene| scene.controllers.slots());
        let now = self.now;

        for index in 0..slots {
            let Some(scene) = self.scenes.get_mut(key) else {
                return;
            };
            let Some(controller) = scene.controllers.at_mut(index) else {
                break;
            };
            if !controller.is_due(now) {
                continue;
            }
            let Some((mut handler, mut activation)) = controller.begin_fire() else {
                continue;
            };
            scene.current_controller = Some(activation.id());

            self.invoke(&mut handler, &mut activation);

            if let Some(scene) = self.scenes.get_mut(key) {
                scene.current_controller = None;
                if let Some(controller) = scene.controllers.at_mut(index) {
                    controller.end_fire(handler, &activation, now);
                }
            }
        }
    }

    fn invoke(&mut self, handler: &mut Handler<S>, activation: &mut Activation) {
        match handler {
            Handler::Callback(callback) => callback(self, activation),
            Handler::Keyboard(bindings) => bindings.fire(self, activation),
            Handler::Mouse(bindings) => bindings.fire(self, activation),
            Handler::Physics(body) => {
                if self.step_body(body) {
                    activation.rearm();
                }
            }
        }
    }

    fn step_body(&mut self, body: &mut PhysicsBody) -> bool {
        let Some(scene) = self.scenes.active_mut() else {
            return false;
        };
        match scene.entities.get_mut(body.entity()) {
            Some(entity) => {
                body.step(entity, &mut scene.colliders);
                true
            }
            None => {
                error!(
                    target: "physics",
                    "Body {:?} lost entity {:?}, body removed",
                    body.owner(),
                    body.entity()
                );
                scene.colliders.remove(body.owner());
                scene.controllers.remove(body.owner());
                false
            }
        }
    }

    fn run_layers(&mut self) {
        let Some(key) = self.scenes.active_key() else {
            return;
        };
        let count = match self.scenes.get_mut(key) {
            Some(scene) => {
                if scene.needs_sort {
                    scene.sort_layers();
                }
                scene.layers.len()
            }
            None => return,
        };

        for index in 0..count {
            let Some(scene) = self.scenes.get_mut(key) else {
                return;
            };
            let Some(mut run) = scene.layers.get_mut(index).and_then(Layer::begin_run) else {
                continue;
            };
            scene.current_layer = Some(index);

            run(self);

            if let Some(scene) = self.scenes.get_mut(key) {
                scene.current_layer = None;
                if let Some(layer) = scene.layers.get_mut(index) {
                    layer.end_run(run);
                }
            }
        }

        if let Some(scene) = self.scenes.get_mut(key) {
            scene.purge_layers();
        }
    }

    //=====================================================================
    // Controllers
    //=====================================================================

    fn allocate_controller_id(&mut self) -> ControllerId {
        let id = ControllerId::from_raw(self.next_controller_id);
        self.next_controller_id += 1;
        id
    }

    pub(crate) fn register_handler(&mut self, category: EventCategory, handler: Handler<S>) -> Option<ControllerId> {
        if self.scenes.active().is_none() {
            error!(target: "controller", "No active scene, {:?} controller discarded", category);
            return None;
        }
        let id = self.allocate_controller_id();
        let scene = self.scenes.active_mut()?;
        scene.controllers.register(id, category, handler);
        Some(id)
    }

    /// Registers `scene` under `key`, giving its builder-side controllers
    /// their ids.
    pub(crate) fn register_scene(&mut self, key: S, mut scene: Scene<S>) {
        for (category, callback) in std::mem::take(&mut scene.deferred) {
            let id = self.allocate_controller_id();
            scene.controllers.register(id, category, Handler::Callback(callback));
        }
        self.scenes.register_scene(key, scene);
    }

    /// Handler of a live, idle controller.
    pub(crate) fn handler_mut(&mut self, id: ControllerId) -> Option<&mut Handler<S>> {
        self.scenes
            .active_mut()?
            .controllers
            .get_mut(id)?
            .handler
            .as_mut()
    }

    /// Registers `handler` on the active scene for events of `category`.
    ///
    /// The handler can call [`Activation::rearm`] to fire again on the
    /// next eligible tick without a new event. Returns `None` when no
    /// scene is active; no id is consumed then.
    pub fn register_controller<F>(&mut self, category: EventCategory, handler: F) -> Option<ControllerId>
    where
        F: FnMut(&mut Runtime<S>, &mut Activation) + 'static,
    {
        self.register_handler(category, Handler::Callback(Box::new(handler)))
    }

    /// Removes a controller. Unknown or already removed ids are ignored.
    ///
    /// A removed controller never fires again; its storage and collider
    /// label are dropped at the start of the next tick.
    pub fn remove_controller(&mut self, id: ControllerId) {
        if let Some(scene) = self.scenes.active_mut() {
            scene.controllers.remove(id);
        }
    }

    /// Sets the minimum milliseconds between two firings.
    pub fn set_controller_delay(&mut self, id: ControllerId, delay_ms: u64) -> bool {
        match self.scenes.active_mut().and_then(|scene| scene.controllers.get_mut(id)) {
            Some(controller) => {
                controller.set_delay(delay_ms);
                true
            }
            None => {
                error!(target: "controller", "Controller {:?} not found, delay unchanged", id);
                false
            }
        }
    }

    /// Marks a controller pending without an event.
    pub fn trigger_controller(&mut self, id: ControllerId) -> bool {
        match self.scenes.active_mut().and_then(|scene| scene.controllers.get_mut(id)) {
            Some(controller) => {
                controller.set_pending(true);
                true
            }
            None => {
                error!(target: "controller", "Controller {:?} not found, trigger ignored", id);
                false
            }
        }
    }

    /// Live controllers in the active scene.
    pub fn controller_count(&self) -> usize {
        self.scenes.active().map_or(0, |scene| scene.controllers.len())
    }

    /// Controller currently firing, if any.
    pub fn current_controller(&self) -> Option<ControllerId> {
        self.scenes.active()?.current_controller()
    }

    //=====================================================================
    // Physics
    //=====================================================================

    /// Attaches a physics body to `entity` and returns its controller id.
    ///
    /// The body is registered in the collider registry at once and steps
    /// on every eligible tick from the next one on.
    pub fn init_physics_body(
        &mut self,
        entity: EntityId,
        body_type: BodyType,
        group: u32,
    ) -> Result<ControllerId, EngineError> {
        let exists = self.scenes.active().ok_or(EngineError::NoScene)?.entities.contains(entity);
        if !exists {
            return Err(EngineError::MissingEntity(entity));
        }

        let id = self.allocate_controller_id();
        let scene = self.scenes.active_mut().ok_or(EngineError::NoScene)?;
        let body = PhysicsBody::new(id, entity, body_type, group);
        if let Some(target) = scene.entities.get(entity) {
            scene.colliders.insert(body.label_for(target));
        }
        scene.controllers.register(id, EventCategory::User, Handler::Physics(body));
        if let Some(controller) = scene.controllers.get_mut(id) {
            controller.set_pending(true);
        }

        debug!(target: "physics", "{:?} body {:?} on entity {:?}, group {}", body_type, id, entity, group);
        Ok(id)
    }

    /// Minimum milliseconds between two physics steps of one body.
    pub fn set_physics_delay(&mut self, id: ControllerId, delay_ms: u64) -> bool {
        if self.physics_body(id).is_none() {
            error!(target: "physics", "No physics body {:?}, delay unchanged", id);
            return false;
        }
        self.set_controller_delay(id, delay_ms)
    }

    /// Queues `force` on a body. Only dynamic bodies move.
    pub fn apply_force(&mut self, id: ControllerId, force: Force) -> bool {
        match self.physics_body_mut(id) {
            Some(body) => {
                body.apply_force(force);
                true
            }
            None => {
                error!(target: "physics", "No physics body {:?}, force dropped", id);
                false
            }
        }
    }

    /// `true` if the body overlapped anything on its latest step.
    pub fn is_currently_colliding(&self, id: ControllerId) -> bool {
        self.physics_body(id).map_or(false, PhysicsBody::is_colliding)
    }

    /// Labels the body overlapped on its latest step.
    pub fn colliding_with(&self, id: ControllerId) -> Vec<ColliderLabel> {
        self.physics_body(id)
            .map(|body| body.colliding().to_vec())
            .unwrap_or_default()
    }

    pub fn physics_body(&self, id: ControllerId) -> Option<&PhysicsBody> {
        self.scenes.active()?.controllers.get(id)?.physics()
    }

    pub fn physics_body_mut(&mut self, id: ControllerId) -> Option<&mut PhysicsBody> {
        self.scenes.active_mut()?.controllers.get_mut(id)?.physics_mut()
    }

    //=====================================================================
    // Layers
    //=====================================================================

    /// Adds a layer to the active scene.
    ///
    /// Returns `false` if no scene is active or a live layer already
    /// carries `name`.
    pub fn add_layer<P, F>(&mut self, name: &str, priority: P, run: F) -> bool
    where
        P: Into<LayerPriority>,
        F: FnMut(&mut Runtime<S>) + 'static,
    {
        match self.scenes.active_mut() {
            Some(scene) => scene.add_layer(name, priority, run),
            None => {
                error!(target: "scene", "No active scene, layer '{}' dropped", name);
                false
            }
        }
    }

    /// Changes a layer's priority. Ordering is refreshed on the next tick;
    /// a retired layer is skipped from now on.
    pub fn set_layer_priority<P: Into<LayerPriority>>(&mut self, name: &str, priority: P) -> bool {
        let priority = priority.into();
        let Some(scene) = self.scenes.active_mut() else {
            return false;
        };
        match scene.layer_mut(name) {
            Some(layer) => {
                layer.set_priority(priority);
                scene.needs_sort = true;
                debug!(target: "scene", "Layer '{}' now {:?}", name, priority);
                true
            }
            None => {
                error!(target: "scene", "Layer '{}' not found", name);
                false
            }
        }
    }

    /// Retires a layer.
    pub fn remove_layer(&mut self, name: &str) -> bool {
        self.set_layer_priority(name, LayerPriority::Retired)
    }

    /// Names of the active scene's live layers in execution order.
    pub fn layer_names(&self) -> Vec<String> {
        self.scenes
            .active()
            .map(|scene| scene.layer_names().into_iter().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.scenes.active().map_or(false, |scene| scene.has_layer(name))
    }

    /// Name of the layer currently running, if any.
    pub fn current_layer(&self) -> Option<&str> {
        self.scenes.active()?.current_layer()
    }

    //--- Sleep ------------------------------------------------------------

    /// Puts layer `name` to sleep for `duration_ms`.
    pub fn sleep_for(&mut self, name: &str, duration_ms: u64) -> bool {
        let now = self.now;
        match self.layer_mut(name) {
            Some(layer) => {
                layer.sleep.sleep_for(now, duration_ms);
                trace!(target: "timer", "Layer '{}' sleeps until {}", name, now + duration_ms);
                true
            }
            None => {
                warn!(target: "timer", "Layer '{}' not found, sleep ignored", name);
                false
            }
        }
    }

    /// Polls layer `name`'s deadline. Unknown layers report `Clear`.
    pub fn check_sleep(&mut self, name: &str) -> SleepState {
        let now = self.now;
        match self.layer_mut(name) {
            Some(layer) => layer.sleep.check(now),
            None => {
                warn!(target: "timer", "Layer '{}' not found, reporting clear", name);
                SleepState::Clear
            }
        }
    }

    /// Drops layer `name`'s deadline.
    pub fn unsleep(&mut self, name: &str, suppress_next_arm: bool) -> bool {
        match self.layer_mut(name) {
            Some(layer) => {
                layer.sleep.unsleep(suppress_next_arm);
                true
            }
            None => {
                warn!(target: "timer", "Layer '{}' not found, unsleep ignored", name);
                false
            }
        }
    }

    /// Guarded block helper for the running layer.
    ///
    /// ```
    /// # use plume_engine::prelude::*;
    /// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// # enum Scenes { Game }
    /// # impl SceneKey for Scenes {}
    /// let scene: Scene<Scenes> = Scene::new().with_layer("spawner", 1, |runtime| {
    ///     if runtime.sleep_gate(1500) {
    ///         // spawn a pipe pair
    ///     }
    /// });
    /// ```
    ///
    /// Outside a layer there is nothing to guard and the block always runs.
    pub fn sleep_gate(&mut self, duration_ms: u64) -> bool {
        let now = self.now;
        match self.running_layer_mut() {
            Some(layer) => layer.sleep.gate(now, duration_ms),
            None => {
                warn!(target: "timer", "sleep_gate called outside a layer");
                true
            }
        }
    }

    /// [`unsleep`](Self::unsleep) for the running layer.
    pub fn unsleep_current_layer(&mut self, suppress_next_arm: bool) -> bool {
        match self.running_layer_mut() {
            Some(layer) => {
                layer.sleep.unsleep(suppress_next_arm);
                true
            }
            None => {
                warn!(target: "timer", "unsleep_current_layer called outside a layer");
                false
            }
        }
    }

    fn layer_mut(&mut self, name: &str) -> Option<&mut Layer<S>> {
        self.scenes.active_mut()?.layer_mut(name)
    }

    fn running_layer_mut(&mut self) -> Option<&mut Layer<S>> {
        let scene = self.scenes.active_mut()?;
        let index = scene.current_layer?;
        scene.layers.get_mut(index)
    }

    //=====================================================================
    // Entities
    //=====================================================================

    /// Adds `entity` to the active scene's drawables.
    ///
    /// A textured entity without an explicit size takes the texture's
    /// size from the render backend.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId::from_raw(self.next_entity_id);
        self.next_entity_id += 1;

        if let Some(size) = self.backend.texture_size(&entity.visual) {
            entity.resolve_texture_size(size);
        }

        match self.scenes.active_mut() {
            Some(scene) => {
                trace!(target: "scene", "Spawned entity {:?} at z {}", id, entity.z());
                scene.entities.insert(id, entity);
            }
            None => error!(target: "scene", "No active scene, entity {:?} discarded", id),
        }
        id
    }

    /// Removes an entity. Physics bodies attached to it are removed too
    /// and their collider labels leave the registry at once.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let scene = self.scenes.active_mut()?;
        let removed = scene.entities.remove(id);
        if removed.is_none() {
            error!(target: "scene", "Entity {:?} not found, despawn ignored", id);
            return None;
        }

        let bodies: Vec<ControllerId> = scene
            .controllers
            .iter()
            .filter_map(Controller::physics)
            .filter(|body| body.entity() == id)
            .map(PhysicsBody::owner)
            .collect();
        for owner in bodies {
            scene.colliders.remove(owner);
            scene.controllers.remove(owner);
            debug!(target: "physics", "Body {:?} removed with entity {:?}", owner, id);
        }
        removed
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.scenes.active()?.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.scenes.active_mut()?.entities.get_mut(id)
    }

    /// Stretches an entity over the whole window.
    pub fn fit_fullscreen(&mut self, id: EntityId) -> bool {
        let (window_w, window_h) = self.window_size;
        self.rescale(id, |(w, h)| Vec2::new(window_w as f32 / w as f32, window_h as f32 / h as f32))
    }

    /// Scales an entity uniformly to the window height.
    pub fn fit_fullscreen_height(&mut self, id: EntityId) -> bool {
        let window_h = self.window_size.1;
        self.rescale(id, |(_, h)| Vec2::splat(window_h as f32 / h as f32))
    }

    fn rescale(&mut self, id: EntityId, scale_for: impl FnOnce((u32, u32)) -> Vec2) -> bool {
        let Some(entity) = self.entity_mut(id) else {
            error!(target: "scene", "Entity {:?} not found, fit ignored", id);
            return false;
        };
        let (w, h) = entity.size();
        if w == 0 || h == 0 {
            warn!(target: "scene", "Entity {:?} has no size, fit skipped", id);
            return false;
        }
        entity.transform.position = Vec2::ZERO;
        entity.transform.scale = scale_for((w, h));
        true
    }

    /// Advances an entity's frame animation; see [`Entity::with_animation`].
    pub fn animate(&mut self, id: EntityId, sequence: usize, period_ms: u64) -> bool {
        let now = self.now;
        match self.entity_mut(id) {
            Some(entity) => entity.animate(now, sequence, period_ms),
            None => {
                error!(target: "scene", "Entity {:?} not found, animation ignored", id);
                false
            }
        }
    }

    //=====================================================================
    // Window & Input
    //=====================================================================

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_window_title(&mut self, title: &str) {
        if self.title != title {
            self.title = title.to_owned();
            self.title_changed = true;
        }
    }

    pub fn input(&self) -> &StateTracker {
        &self.input
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.input.is_key_down(key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.input.is_button_down(button)
    }

    pub fn pointer_position(&self) -> Vec2 {
        self.input.pointer_position()
    }

    //=====================================================================
    // Scenes & Lifecycle
    //=====================================================================

    /// Switches to `key` at the end of the current tick.
    ///
    /// The outgoing scene keeps its state; the incoming one resumes with
    /// its layers re-sorted.
    pub fn swap_scene(&mut self, key: S) -> bool {
        self.scenes.queue_swap(key)
    }

    pub fn active_scene(&self) -> Option<S> {
        self.scenes.active_key()
    }

    pub fn scene(&self) -> Option<&Scene<S>> {
        self.scenes.active()
    }

    /// Ends the main loop after the current frame.
    pub fn request_quit(&mut self) {
        if !self.quit_requested {
            info!(target: "engine", "Quit requested at tick time {}", self.now);
        }
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
