//=========================================================================
// Scene Manager
//=========================================================================
//
// Scene registration and the single active scene.
//
// Scenes are stored in a HashMap by key. Swapping only changes which key
// is active: the previous scene keeps its layers, controllers and
// entities and resumes where it left off when swapped back in.
//
// Swaps requested during a tick are queued and applied at the tick
// boundary.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::Scene;

//=== Scene Key Trait =====================================================

/// Marker trait for scene identifiers.
///
/// Typically implemented by game-specific enums.
pub trait SceneKey: Clone + Copy + Eq + Hash + Debug + 'static {}

//=== Scene Manager =======================================================

/// Owns every registered scene and tracks the active one.
pub struct SceneManager<S: SceneKey> {
    scenes: HashMap<S, Scene<S>>,
    active: Option<S>,
    pending: Option<S>,
}

impl<S: SceneKey> SceneManager<S> {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            scenes: HashMap::new(),
            active: None,
            pending: None,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a scene under `key`, replacing any previous one.
    pub fn register_scene(&mut self, key: S, scene: Scene<S>) {
        if self.scenes.insert(key, scene).is_some() {
            warn!(target: "scene", "Scene {:?} was already registered and has been replaced", key);
        } else {
            debug!(target: "scene", "Registered scene {:?}", key);
        }
    }

    /// Makes `key` active immediately. Returns `false` if unregistered.
    pub fn activate(&mut self, key: S) -> bool {
        if !self.scenes.contains_key(&key) {
            warn!(target: "scene", "Attempted to activate unregistered scene {:?}", key);
            return false;
        }
        self.active = Some(key);
        if let Some(scene) = self.scenes.get_mut(&key) {
            scene.sort_layers();
        }
        true
    }

    //--- Transitions ------------------------------------------------------

    /// Queues a swap to `key`, applied at the next tick boundary.
    ///
    /// A later request in the same tick overrides an earlier one.
    pub fn queue_swap(&mut self, key: S) -> bool {
        if !self.scenes.contains_key(&key) {
            warn!(target: "scene", "Attempted to swap to unregistered scene {:?}", key);
            return false;
        }
        self.pending = Some(key);
        true
    }

    /// Applies a queued swap. Returns the newly active key.
    pub(crate) fn apply_pending(&mut self) -> Option<S> {
        let key = self.pending.take()?;
        if self.active == Some(key) {
            return None;
        }

        info!(target: "scene", "Swapping scene {:?} -> {:?}", self.active, key);
        self.activate(key).then_some(key)
    }

    pub fn pending_swap(&self) -> Option<S> {
        self.pending
    }

    //--- Access -----------------------------------------------------------

    pub fn active_key(&self) -> Option<S> {
        self.active
    }

    pub fn active(&self) -> Option<&Scene<S>> {
        self.active.and_then(|key| self.scenes.get(&key))
    }

    pub fn active_mut(&mut self) -> Option<&mut Scene<S>> {
        self.active.and_then(|key| self.scenes.get_mut(&key))
    }

    pub fn get(&self, key: S) -> Option<&Scene<S>> {
        self.scenes.get(&key)
    }

    pub fn get_mut(&mut self, key: S) -> Option<&mut Scene<S>> {
        self.scenes.get_mut(&key)
    }

    pub fn contains(&self, key: S) -> bool {
        self.scenes.contains_key(&key)
    }

    /// Releases every scene's collections and forgets all scenes.
    pub(crate) fn clear(&mut self) {
        for scene in self.scenes.values_mut() {
            scene.clear();
        }
        self.scenes.clear();
        self.active = None;
        self.pending = None;
    }
}

impl<S: SceneKey> Default for SceneManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Tests ===============================================================
