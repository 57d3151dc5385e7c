//=========================================================================
// Drawable Entities
//=========================================================================
//
// Entities are the drawable half of a scene: a transform, a visual
// source handed to the render backend, and the frame geometry physics
// bodies read their bounds from.
//
// Architecture:
//   EntityStore
//     └─ entries: Vec<(EntityId, Entity)>   sorted by z, ties in spawn order
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Vec2;

//=== Internal Dependencies ===============================================

use crate::core::physics::Aabb;
use crate::core::timer::{SleepSlot, SleepState};

//=== EntityId ============================================================

/// Handle to an entity inside one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

//=== Visual ==============================================================

/// What the render backend draws for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Visual {
    /// Invisible; still has bounds.
    None,

    /// Solid RGBA fill.
    Color([u8; 4]),

    /// Image asset, resolved by the backend.
    Texture(String),
}

//=== Transform ===========================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,

    /// Degrees, clockwise.
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

//=== SpriteSheet =========================================================

/// Grid slicing of a texture into equally sized frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    pub frame_width: u32,
    pub frame_height: u32,

    /// Frame drawn, counted left to right then top to bottom.
    pub index: u32,
}

//=== Entity ==============================================================

/// A drawable object.
///
/// Built with chained setters, then handed to
/// [`Runtime::spawn`](crate::core::runtime::Runtime::spawn):
///
/// ```
/// use plume_engine::core::entity::{Entity, Visual};
///
/// let pipe = Entity::new(Visual::Color([0, 200, 0, 255]))
///     .at(120.0, 0.0)
///     .with_size(40, 200)
///     .with_z(2);
///
/// assert_eq!(pipe.bounds().right(), 160.0);
/// ```
#[derive(Debug, Clone)]
pub struct Entity {
    pub transform: Transform,
    pub visual: Visual,
    size: (u32, u32),
    texture_size: (u32, u32),
    z: i32,
    sprite: Option<SpriteSheet>,
    animations: Vec<Vec<u32>>,
    animation: Option<usize>,
    animation_cursor: usize,
    animation_sleep: SleepSlot,
}

impl Entity {
    //--- Construction -----------------------------------------------------

    pub fn new(visual: Visual) -> Self {
        Self {
            transform: Transform::default(),
            visual,
            size: (0, 0),
            texture_size: (0, 0),
            z: 0,
            sprite: None,
            animations: Vec::new(),
            animation: None,
            animation_cursor: 0,
            animation_sleep: SleepSlot::new(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.position = Vec2::new(x, y);
        self
    }

    pub fn scaled(mut self, sx: f32, sy: f32) -> Self {
        self.transform.scale = Vec2::new(sx, sy);
        self
    }

    pub fn rotated(mut self, degrees: f32) -> Self {
        self.transform.rotation = degrees;
        self
    }

    /// Unscaled frame size in pixels.
    ///
    /// Left at zero for textures, the size is taken from the backend at
    /// spawn time.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Draw order; lower values are drawn first.
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    /// Slices the texture into `frame_width` × `frame_height` frames and
    /// shows frame `index`. The entity's frame size becomes the cell size.
    pub fn indexed(mut self, index: u32, frame_width: u32, frame_height: u32) -> Self {
        self.set_sprite(SpriteSheet { frame_width, frame_height, index });
        self
    }

    /// Adds a frame sequence; returns the entity for chaining.
    pub fn with_animation(mut self, frames: impl Into<Vec<u32>>) -> Self {
        self.animations.push(frames.into());
        self
    }

    //--- Geometry ---------------------------------------------------------

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    /// Scaled on-screen extent.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.size.0 as f32, self.size.1 as f32) * self.transform.scale
    }

    /// Bounding box used for collision and hit tests.
    pub fn bounds(&self) -> Aabb {
        let extent = self.extent();
        Aabb::new(self.transform.position.x, self.transform.position.y, extent.x, extent.y)
    }

    pub(crate) fn resolve_texture_size(&mut self, size: (u32, u32)) {
        self.texture_size = size;
        if self.size == (0, 0) {
            self.size = size;
        }
    }

    //--- Sprite Sheets ----------------------------------------------------

    pub fn sprite(&self) -> Option<&SpriteSheet> {
        self.sprite.as_ref()
    }

    pub fn set_sprite(&mut self, sheet: SpriteSheet) {
        self.size = (sheet.frame_width, sheet.frame_height);
        self.sprite = Some(sheet);
    }

    pub fn set_frame(&mut self, index: u32) {
        if let Some(sheet) = &mut self.sprite {
            sheet.index = index;
        }
    }

    /// Source rectangle of the current frame inside the texture.
    ///
    /// `None` without a sprite sheet or before the texture size is known.
    pub fn source_rect(&self) -> Option<Aabb> {
        let sheet = self.sprite?;
        if sheet.frame_width == 0 || self.texture_size.0 < sheet.frame_width {
            return None;
        }

        let columns = self.texture_size.0 / sheet.frame_width;
        let column = sheet.index % columns;
        let row = sheet.index / columns;

        Some(Aabb::new(
            (column * sheet.frame_width) as f32,
            (row * sheet.frame_height) as f32,
            sheet.frame_width as f32,
            sheet.frame_height as f32,
        ))
    }

    //--- Animation --------------------------------------------------------

    pub fn push_animation(&mut self, frames: Vec<u32>) -> usize {
        self.animations.push(frames);
        self.animations.len() - 1
    }

    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Shows the next frame of `sequence` once every `period_ms`.
    ///
    /// Switching sequence restarts it from the first frame on the same
    /// call. Returns `false` if the sequence does not exist or is empty.
    pub(crate) fn animate(&mut self, now: u64, sequence: usize, period_ms: u64) -> bool {
        let Some(frames) = self.animations.get(sequence) else {
            return false;
        };
        if frames.is_empty() {
            return false;
        }

        if self.animation != Some(sequence) {
            self.animation = Some(sequence);
            self.animation_cursor = 0;
            self.animation_sleep.unsleep(false);
        }

        if self.animation_sleep.check(now) == SleepState::Sleeping {
            return true;
        }

        let frame = frames[self.animation_cursor];
        self.animation_cursor = (self.animation_cursor + 1) % frames.len();
        self.set_frame(frame);
        self.animation_sleep.sleep_for(now, period_ms);
        true
    }
}

//=== EntityStore =========================================================

/// Entities of one scene in draw order.
#[derive(Debug, Default)]
pub struct EntityStore {
    entries: Vec<(EntityId, Entity)>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts after every entity with `z <= entity.z`.
    pub fn insert(&mut self, id: EntityId, entity: Entity) {
        let at = self.entries.partition_point(|(_, e)| e.z <= entity.z);
        self.entries.insert(at, (id, entity));
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let at = self.entries.iter().position(|(eid, _)| *eid == id)?;
        Some(self.entries.remove(at).1)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entries.iter().find(|(eid, _)| *eid == id).map(|(_, e)| e)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entries.iter_mut().find(|(eid, _)| *eid == id).map(|(_, e)| e)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Draw-order iteration.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> EntityId {
        EntityId::from_raw(raw)
    }

    //=====================================================================
    // Geometry Tests
    //=====================================================================

    #[test]
    fn bounds_follow_scale() {
        let entity = Entity::new(Visual::None).at(10.0, 20.0).with_size(16, 8).scaled(2.0, 3.0);
        assert_eq!(entity.bounds(), Aabb::new(10.0, 20.0, 32.0, 24.0));
    }

    #[test]
    fn texture_size_fills_unset_frame_size() {
        let mut entity = Entity::new(Visual::Texture("bird.png".into()));
        entity.resolve_texture_size((64, 32));
        assert_eq!(entity.size(), (64, 32));

        let mut sized = Entity::new(Visual::Texture("bird.png".into())).with_size(8, 8);
        sized.resolve_texture_size((64, 32));
        assert_eq!(sized.size(), (8, 8));
    }

    //=====================================================================
    // Sprite Sheet Tests
    //=====================================================================

    #[test]
    fn source_rect_walks_rows() {
        let mut entity = Entity::new(Visual::Texture("sheet.png".into())).indexed(5, 32, 32);
        entity.resolve_texture_size((128, 64));

        assert_eq!(entity.size(), (32, 32));
        assert_eq!(entity.source_rect(), Some(Aabb::new(32.0, 32.0, 32.0, 32.0)));
    }

    #[test]
    fn source_rect_none_without_sheet() {
        let entity = Entity::new(Visual::None).with_size(4, 4);
        assert_eq!(entity.source_rect(), None);
    }

    #[test]
    fn animation_advances_once_per_period() {
        let mut entity = Entity::new(Visual::None)
            .indexed(0, 8, 8)
            .with_animation([3, 4, 5]);

        assert!(entity.animate(0, 0, 100));
        assert_eq!(entity.sprite().unwrap().index, 3);

        assert!(entity.animate(50, 0, 100));
        assert_eq!(entity.sprite().unwrap().index, 3);

        assert!(entity.animate(100, 0, 100));
        assert_eq!(entity.sprite().unwrap().index, 4);

        assert!(entity.animate(200, 0, 100));
        assert!(entity.animate(300, 0, 100));
        assert_eq!(entity.sprite().unwrap().index, 3);
    }

    #[test]
    fn switching_sequence_restarts_immediately() {
        let mut entity = Entity::new(Visual::None)
            .indexed(0, 8, 8)
            .with_animation([1, 2])
            .with_animation([7, 8]);

        entity.animate(0, 0, 1_000);
        entity.animate(10, 1, 1_000);
        assert_eq!(entity.sprite().unwrap().index, 7);
    }

    #[test]
    fn unknown_sequence_is_rejected() {
        let mut entity = Entity::new(Visual::None).indexed(0, 8, 8);
        assert!(!entity.animate(0, 0, 100));
        assert_eq!(entity.push_animation(vec![]), 0);
        assert!(!entity.animate(0, 0, 100));
    }

    //=====================================================================
    // Store Tests
    //=====================================================================

    #[test]
    fn store_orders_by_z_then_insertion() {
        let mut store = EntityStore::new();
        store.insert(id(1), Entity::new(Visual::None).with_z(1));
        store.insert(id(2), Entity::new(Visual::None).with_z(0));
        store.insert(id(3), Entity::new(Visual::None).with_z(1));
        store.insert(id(4), Entity::new(Visual::None).with_z(-5));

        let order: Vec<u32> = store.iter().map(|(id, _)| id.raw()).collect();
        assert_eq!(order, vec![4, 2, 1, 3]);
    }

    #[test]
    fn store_remove_and_lookup() {
        let mut store = EntityStore::new();
        store.insert(id(1), Entity::new(Visual::None));
        store.insert(id(2), Entity::new(Visual::None));

        assert!(store.remove(id(1)).is_some());
        assert!(store.remove(id(1)).is_none());
        assert!(!store.contains(id(1)));
        assert!(store.get_mut(id(2)).is_some());
        assert_eq!(store.len(), 1);
    }
}
