//=========================================================================
// Scene System
//=========================================================================
//
// A scene owns everything a running game state needs.
//
// Architecture:
//   Scene
//     ├─ layers:      Vec<Layer>            (ascending priority)
//     ├─ controllers: ControllerRegistry    (registration order)
//     ├─ entities:    EntityStore           (draw order)
//     ├─ colliders:   ColliderRegistry
//     └─ cursors:     current layer / current controller
//
//   SceneManager
//     ├─ scenes: HashMap<S, Scene>
//     ├─ active: Option<S>
//     └─ pending swap: Option<S>   (applied at the tick boundary)
//
//=========================================================================

//=== Module Declarations =================================================

pub mod layer;
mod scene_manager;

//=== Public API ==========================================================

pub use layer::{Layer, LayerFn, LayerPriority};
pub use scene_manager::{SceneKey, SceneManager};

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::controller::{Activation, Callback, ControllerId, ControllerRegistry};
use crate::core::input::EventCategory;
use crate::core::entity::EntityStore;
use crate::core::physics::ColliderRegistry;
use crate::core::runtime::Runtime;

//=== Scene ===============================================================

/// Layers, controllers, entities and colliders of one game state.
///
/// Scenes are built explicitly and registered with the engine:
///
/// ```
/// use plume_engine::prelude::*;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Scenes { Title }
/// impl SceneKey for Scenes {}
///
/// let scene: Scene<Scenes> = Scene::new()
///     .with_layer("setup", LayerPriority::once(), |runtime| {
///         runtime.set_window_title("Title screen");
///     })
///     .with_layer("tick", 1, |_| {});
///
/// assert_eq!(scene.layer_names(), vec!["setup", "tick"]);
/// ```
pub struct Scene<S: SceneKey> {
    pub(crate) layers: Vec<Layer<S>>,
    pub(crate) controllers: ControllerRegistry<S>,
    pub(crate) entities: EntityStore,
    pub(crate) colliders: ColliderRegistry,
    pub(crate) current_layer: Option<usize>,
    pub(crate) current_controller: Option<ControllerId>,
    pub(crate) needs_sort: bool,

    /// Controllers added before registration; they get ids when the
    /// engine adopts the scene.
    pub(crate) deferred: Vec<(EventCategory, Callback<S>)>,
}

impl<S: SceneKey> Scene<S> {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            controllers: ControllerRegistry::new(),
            entities: EntityStore::new(),
            colliders: ColliderRegistry::new(),
            current_layer: None,
            current_controller: None,
            needs_sort: false,
            deferred: Vec::new(),
        }
    }

    /// Builder form of [`add_layer`](Self::add_layer).
    pub fn with_layer<P, F>(mut self, name: &str, priority: P, run: F) -> Self
    where
        P: Into<LayerPriority>,
        F: FnMut(&mut Runtime<S>) + 'static,
    {
        self.add_layer(name, priority, run);
        self
    }

    /// Appends a layer. Ordering is re-established before the next pass.
    ///
    /// Names are unique among live layers; a duplicate is rejected and
    /// `false` returned.
    pub fn add_layer<P, F>(&mut self, name: &str, priority: P, run: F) -> bool
    where
        P: Into<LayerPriority>,
        F: FnMut(&mut Runtime<S>) + 'static,
    {
        if self.has_layer(name) {
            warn!(target: "scene", "Layer '{}' already exists, duplicate rejected", name);
            return false;
        }
        let priority = priority.into();
        debug!(target: "scene", "Layer '{}' added with {:?}", name, priority);
        self.layers.push(Layer::new(name, priority, Box::new(run)));
        self.needs_sort = true;
        true
    }

    /// Builder form of [`add_controller`](Self::add_controller).
    pub fn with_controller<F>(mut self, category: EventCategory, handler: F) -> Self
    where
        F: FnMut(&mut Runtime<S>, &mut Activation) + 'static,
    {
        self.add_controller(category, handler);
        self
    }

    /// Attaches a controller for events of `category`.
    ///
    /// The controller is assigned its id and joins the registry when the
    /// scene is registered with the engine, ahead of any controller the
    /// scene's layers register at run time.
    pub fn add_controller<F>(&mut self, category: EventCategory, handler: F)
    where
        F: FnMut(&mut Runtime<S>, &mut Activation) + 'static,
    {
        self.deferred.push((category, Box::new(handler)));
    }

    //--- Ordering ---------------------------------------------------------

    /// Stable sort by ascending priority.
    pub(crate) fn sort_layers(&mut self) {
        self.layers.sort_by_key(|layer| layer.priority().sort_key());
        self.needs_sort = false;
    }

    /// Drops retired layers.
    pub(crate) fn purge_layers(&mut self) {
        let before = self.layers.len();
        self.layers.retain(|layer| !layer.priority().is_retired());
        let removed = before - self.layers.len();
        if removed > 0 {
            debug!(target: "scene", "Purged {} retired layer(s)", removed);
        }
    }

    /// Drops removed controllers together with their collider labels.
    pub(crate) fn purge_controllers(&mut self) {
        for id in self.controllers.purge() {
            self.colliders.remove(id);
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Layer names in execution order, retired layers excluded.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|layer| !layer.priority().is_retired())
            .map(Layer::name)
            .collect()
    }

    /// Live layer called `name`.
    pub fn layer(&self, name: &str) -> Option<&Layer<S>> {
        self.layers
            .iter()
            .find(|layer| layer.name() == name && !layer.priority().is_retired())
    }

    pub(crate) fn layer_mut(&mut self, name: &str) -> Option<&mut Layer<S>> {
        self.layers
            .iter_mut()
            .find(|layer| layer.name() == name && !layer.priority().is_retired())
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layer(name).is_some()
    }

    pub fn controllers(&self) -> &ControllerRegistry<S> {
        &self.controllers
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn colliders(&self) -> &ColliderRegistry {
        &self.colliders
    }

    /// Name of the layer currently executing.
    pub fn current_layer(&self) -> Option<&str> {
        self.current_layer
            .and_then(|index| self.layers.get(index))
            .map(Layer::name)
    }

    /// Controller currently executing.
    pub fn current_controller(&self) -> Option<ControllerId> {
        self.current_controller
    }

    /// Releases every collection.
    pub(crate) fn clear(&mut self) {
        self.layers.clear();
        self.controllers.clear();
        self.entities.clear();
        self.colliders.clear();
        self.deferred.clear();
        self.current_layer = None;
        self.current_controller = None;
    }
}

impl<S: SceneKey> Default for Scene<S> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestScene {
        Main,
    }

    impl SceneKey for TestScene {}

    #[test]
    fn sort_is_ascending_and_stable() {
        let mut scene = Scene::<TestScene>::new()
            .with_layer("b", 2, |_| {})
            .with_layer("a1", 1, |_| {})
            .with_layer("init", -1, |_| {})
            .with_layer("a2", 1, |_| {});

        assert!(scene.needs_sort);
        scene.sort_layers();

        assert_eq!(scene.layer_names(), vec!["init", "a1", "a2", "b"]);
        assert!(!scene.needs_sort);
    }

    #[test]
    fn retired_layers_hidden_then_purged() {
        let mut scene = Scene::<TestScene>::new()
            .with_layer("keep", 1, |_| {})
            .with_layer("gone", 0, |_| {});

        assert_eq!(scene.layer_names(), vec!["keep"]);
        assert!(!scene.has_layer("gone"));
        assert_eq!(scene.layers.len(), 2);

        scene.purge_layers();
        assert_eq!(scene.layers.len(), 1);
    }

    #[test]
    fn duplicate_layer_names_are_rejected() {
        let mut scene = Scene::<TestScene>::new();

        assert!(scene.add_layer("tick", 1, |_| {}));
        assert!(!scene.add_layer("tick", 2, |_| {}));
        assert_eq!(scene.layers.len(), 1);
        assert_eq!(scene.layer("tick").map(|layer| layer.priority()), Some(LayerPriority::Recurring(1)));
    }

    #[test]
    fn retired_name_can_be_reused() {
        let mut scene = Scene::<TestScene>::new().with_layer("tick", 0, |_| {});

        assert!(scene.add_layer("tick", 3, |_| {}));
        assert_eq!(scene.layer_names(), vec!["tick"]);
        assert_eq!(scene.layer("tick").map(|layer| layer.priority()), Some(LayerPriority::Recurring(3)));
    }

    #[test]
    fn scene_controllers_wait_for_registration() {
        let scene = Scene::<TestScene>::new()
            .with_controller(EventCategory::KeyDown, |_, _| {})
            .with_controller(EventCategory::User, |_, _| {});

        assert_eq!(scene.deferred.len(), 2);
        assert!(scene.controllers().is_empty());
    }

    #[test]
    fn cursors_start_empty() {
        let scene = Scene::<TestScene>::new();
        assert!(scene.current_layer().is_none());
        assert!(scene.current_controller().is_none());
    }
}
