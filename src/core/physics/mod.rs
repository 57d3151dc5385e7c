//=========================================================================
// Physics
//=========================================================================
//
// Per-entity bodies driven by displacement forces and AABB collision.
//
// A body lives inside the controller that drives it. The controller is
// self-re-arming, so once initialised the body steps on every eligible
// update tick:
//
//   1. sync label   ← entity bounds
//   2. Dynamic      → apply forces (position += direction * speed)
//   3. Dynamic/Static → colliding = registry.overlapping(owner)
//
// `Collider` bodies stop after step 1: they exist to be found.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod collider;

//=== Public API ==========================================================

pub use collider::{Aabb, ColliderLabel, ColliderRegistry};

//=== External Dependencies ===============================================

use glam::Vec2;
use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::controller::ControllerId;
use crate::core::entity::{Entity, EntityId};

//=== BodyType ============================================================

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// Moved by forces and checked against colliders.
    Dynamic,

    /// Not moved by forces but still checked against colliders.
    Static,

    /// Passive obstacle: registered, never moved or checked.
    Collider,
}

//=== GravityDirection ====================================================

/// Direction gravity pulls a body. A hint for application code; the core
/// applies no implicit gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GravityDirection {
    #[default]
    Bottom,
    Top,
    Left,
    Right,
}

impl GravityDirection {
    /// Unit vector in screen space (y down).
    pub fn unit(self) -> Vec2 {
        match self {
            Self::Bottom => Vec2::Y,
            Self::Top => Vec2::NEG_Y,
            Self::Left => Vec2::NEG_X,
            Self::Right => Vec2::X,
        }
    }
}

//=== Repeat ==============================================================

/// How many more ticks a force stays after the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Never consumed.
    Forever,

    /// Applied `n + 1` more times in total, then dropped.
    Remaining(u32),
}

//=== Force ===============================================================

/// Additive displacement impulse applied once per eligible tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    pub direction: Vec2,
    pub speed: f32,
    pub repeat: Repeat,
}

impl Force {
    //--- Construction -----------------------------------------------------

    pub fn new(direction: Vec2, speed: f32, repeat: Repeat) -> Self {
        Self { direction, speed, repeat }
    }

    /// Applied on a single tick.
    pub fn once(direction: Vec2, speed: f32) -> Self {
        Self::new(direction, speed, Repeat::Remaining(0))
    }

    /// Applied on `extra + 1` ticks.
    pub fn repeated(direction: Vec2, speed: f32, extra: u32) -> Self {
        Self::new(direction, speed, Repeat::Remaining(extra))
    }

    /// Applied until the body is removed.
    pub fn forever(direction: Vec2, speed: f32) -> Self {
        Self::new(direction, speed, Repeat::Forever)
    }

    //--- Composition ------------------------------------------------------

    /// Folds `other`'s speed into this force.
    ///
    /// Speeds combine by the law of cosines over the two directions
    /// (which should be unit vectors) and are clamped to `max_speed`.
    /// The direction of `self` is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::Vec2;
    /// use plume_engine::core::physics::Force;
    ///
    /// let mut main = Force::forever(Vec2::X, 3.0);
    /// main.append(&Force::once(Vec2::Y, 4.0), 100.0);
    /// assert!((main.speed - 5.0).abs() < 1e-5);
    /// ```
    pub fn append(&mut self, other: &Force, max_speed: f32) {
        let dot = self.direction.dot(other.direction);
        let squared = self.speed * self.speed
            + other.speed * other.speed
            + 2.0 * self.speed * other.speed * dot;

        self.speed = squared.max(0.0).sqrt().min(max_speed);
    }

    /// Displacement this force contributes per tick.
    pub fn displacement(&self) -> Vec2 {
        self.direction * self.speed
    }

    /// Advances the repeat counter after an application.
    ///
    /// Returns `false` once the force is consumed.
    fn consume(&mut self) -> bool {
        match self.repeat {
            Repeat::Forever => true,
            Repeat::Remaining(0) => false,
            Repeat::Remaining(n) => {
                self.repeat = Repeat::Remaining(n - 1);
                true
            }
        }
    }
}

//=== PhysicsBody =========================================================

/// Physics state attached to one entity.
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    owner: ControllerId,
    entity: EntityId,
    body_type: BodyType,
    gravity: GravityDirection,
    group: u32,
    forces: Vec<Force>,
    colliding: Vec<ColliderLabel>,
}

impl PhysicsBody {
    pub(crate) fn new(owner: ControllerId, entity: EntityId, body_type: BodyType, group: u32) -> Self {
        Self {
            owner,
            entity,
            body_type,
            gravity: GravityDirection::default(),
            group,
            forces: Vec::new(),
            colliding: Vec::new(),
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn owner(&self) -> ControllerId {
        self.owner
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn gravity(&self) -> GravityDirection {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: GravityDirection) {
        self.gravity = gravity;
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    /// Labels found overlapping on the body's latest step.
    pub fn colliding(&self) -> &[ColliderLabel] {
        &self.colliding
    }

    pub fn is_colliding(&self) -> bool {
        !self.colliding.is_empty()
    }

    //--- Mutation ---------------------------------------------------------

    pub fn apply_force(&mut self, force: Force) {
        self.forces.push(force);
    }

    pub fn clear_forces(&mut self) {
        self.forces.clear();
    }

    /// Label describing the entity's current bounds.
    pub(crate) fn label_for(&self, entity: &Entity) -> ColliderLabel {
        ColliderLabel {
            owner: self.owner,
            group: self.group,
            bounds: entity.bounds(),
        }
    }

    //--- Step -------------------------------------------------------------

    /// Runs one physics step against `entity` and the scene's registry.
    pub(crate) fn step(&mut self, entity: &mut Entity, colliders: &mut ColliderRegistry) {
        if !colliders.update(self.owner, entity.bounds()) {
            colliders.insert(self.label_for(entity));
        }

        if self.body_type == BodyType::Dynamic {
            self.apply_forces(entity);
        }

        if matches!(self.body_type, BodyType::Dynamic | BodyType::Static) {
            self.colliding = colliders.overlapping(self.owner);
            if !self.colliding.is_empty() {
                trace!(
                    target: "physics",
                    "Body {:?} overlaps {} label(s)",
                    self.owner,
                    self.colliding.len()
                );
            }
        }
    }

    fn apply_forces(&mut self, entity: &mut Entity) {
        for force in &self.forces {
            entity.transform.position += force.displacement();
        }
        self.forces.retain_mut(Force::consume);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Visual;

    fn entity_at(x: f32, y: f32) -> Entity {
        Entity::new(Visual::None).at(x, y).with_size(10, 10)
    }

    fn body(owner: u32, body_type: BodyType, group: u32) -> PhysicsBody {
        PhysicsBody::new(ControllerId::from_raw(owner), EntityId::from_raw(owner), body_type, group)
    }

    //=====================================================================
    // Force Tests
    //=====================================================================

    #[test]
    fn repeated_force_applies_counter_plus_one_times() {
        let mut entity = entity_at(0.0, 0.0);
        let mut registry = ColliderRegistry::new();
        let mut body = body(1, BodyType::Dynamic, 0);
        body.apply_force(Force::repeated(Vec2::X, 1.0, 2));

        for expected in [1.0, 2.0, 3.0] {
            assert_eq!(body.forces().len(), 1);
            body.step(&mut entity, &mut registry);
            assert_eq!(entity.transform.position.x, expected);
        }

        assert!(body.forces().is_empty());
        body.step(&mut entity, &mut registry);
        assert_eq!(entity.transform.position.x, 3.0);
    }

    #[test]
    fn forever_force_is_never_consumed() {
        let mut entity = entity_at(0.0, 0.0);
        let mut registry = ColliderRegistry::new();
        let mut body = body(1, BodyType::Dynamic, 0);
        body.apply_force(Force::forever(Vec2::Y, 2.0));

        for _ in 0..50 {
            body.step(&mut entity, &mut registry);
        }

        assert_eq!(body.forces().len(), 1);
        assert_eq!(entity.transform.position.y, 100.0);
    }

    #[test]
    fn static_body_ignores_forces() {
        let mut entity = entity_at(5.0, 5.0);
        let mut registry = ColliderRegistry::new();
        let mut body = body(1, BodyType::Static, 0);
        body.apply_force(Force::forever(Vec2::X, 3.0));

        body.step(&mut entity, &mut registry);

        assert_eq!(entity.transform.position, Vec2::new(5.0, 5.0));
        assert_eq!(body.forces().len(), 1);
    }

    #[test]
    fn append_same_direction_adds_speeds() {
        let mut main = Force::forever(Vec2::X, 2.0);
        main.append(&Force::once(Vec2::X, 3.0), 100.0);
        assert!((main.speed - 5.0).abs() < 1e-5);
    }

    #[test]
    fn append_clamps_to_max_speed() {
        let mut main = Force::forever(Vec2::X, 8.0);
        main.append(&Force::once(Vec2::X, 8.0), 10.0);
        assert_eq!(main.speed, 10.0);
    }

    #[test]
    fn append_opposite_directions_cancel() {
        let mut main = Force::forever(Vec2::X, 4.0);
        main.append(&Force::once(Vec2::NEG_X, 4.0), 10.0);
        assert!(main.speed.abs() < 1e-5);
    }

    //=====================================================================
    // Collision Tests
    //=====================================================================

    #[test]
    fn step_registers_and_syncs_label() {
        let mut entity = entity_at(3.0, 4.0).scaled(2.0, 3.0);
        let mut registry = ColliderRegistry::new();
        let mut body = body(7, BodyType::Collider, 1);

        body.step(&mut entity, &mut registry);

        let label = registry.get(ControllerId::from_raw(7)).unwrap();
        assert_eq!(label.bounds, Aabb::new(3.0, 4.0, 20.0, 30.0));
        assert_eq!(label.group, 1);
    }

    #[test]
    fn colliding_set_is_refreshed_each_step() {
        let mut registry = ColliderRegistry::new();
        let mut wall = entity_at(5.0, 5.0);
        let mut wall_body = body(2, BodyType::Collider, 1);
        wall_body.step(&mut wall, &mut registry);

        let mut player = entity_at(0.0, 0.0);
        let mut player_body = body(1, BodyType::Static, 1);

        player_body.step(&mut player, &mut registry);
        assert!(player_body.is_colliding());
        assert_eq!(player_body.colliding().len(), 1);

        // Second step over the same overlap does not accumulate.
        player_body.step(&mut player, &mut registry);
        assert_eq!(player_body.colliding().len(), 1);

        player.transform.position = Vec2::new(100.0, 100.0);
        player_body.step(&mut player, &mut registry);
        assert!(!player_body.is_colliding());
    }

    #[test]
    fn collider_bodies_never_collect_overlaps() {
        let mut registry = ColliderRegistry::new();
        let mut a = entity_at(0.0, 0.0);
        let mut b = entity_at(1.0, 1.0);
        let mut a_body = body(1, BodyType::Collider, 1);
        let mut b_body = body(2, BodyType::Collider, 1);

        a_body.step(&mut a, &mut registry);
        b_body.step(&mut b, &mut registry);
        a_body.step(&mut a, &mut registry);

        assert!(!a_body.is_colliding());
        assert!(!b_body.is_colliding());
    }

    #[test]
    fn other_group_overlap_is_ignored() {
        let mut registry = ColliderRegistry::new();
        let mut wall = entity_at(5.0, 5.0);
        let mut wall_body = body(2, BodyType::Collider, 2);
        wall_body.step(&mut wall, &mut registry);

        let mut player = entity_at(0.0, 0.0);
        let mut player_body = body(1, BodyType::Dynamic, 1);
        player_body.step(&mut player, &mut registry);

        assert!(!player_body.is_colliding());
    }

    #[test]
    fn gravity_units() {
        assert_eq!(GravityDirection::default(), GravityDirection::Bottom);
        assert_eq!(GravityDirection::Bottom.unit(), Vec2::new(0.0, 1.0));
        assert_eq!(GravityDirection::Left.unit(), Vec2::new(-1.0, 0.0));
    }
}
