//=========================================================================
// Collider Registry
//=========================================================================
//
// Axis-aligned bounding boxes tagged with an owner and a group.
//
// Architecture:
//   slots: Vec<Option<ColliderLabel>>   (arena, stable indices)
//   index: HashMap<owner, slot>         (owner → slot lookup)
//   free:  Vec<usize>                   (recycled slots)
//
// Scans return an owned snapshot, so callers may mutate the registry
// (their own label included) while holding the result.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use glam::Vec2;

//=== Internal Dependencies ===============================================

use crate::core::controller::ControllerId;

//=== Aabb ================================================================

/// Axis-aligned box: top-left corner plus extent, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap. Boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.right() <= other.left()
            || self.left() >= other.right()
            || self.bottom() <= other.top()
            || self.top() >= other.bottom())
    }

    /// Point containment, edges inclusive.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

//=== ColliderLabel =======================================================

/// Registry entry owned by one physics body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderLabel {
    /// Controller id of the owning physics body.
    pub owner: ControllerId,

    /// Partition key; only same-group labels are tested against each other.
    pub group: u32,

    pub bounds: Aabb,
}

impl ColliderLabel {
    /// `true` when `other` is a different body in the same group and the
    /// boxes overlap.
    pub fn collides_with(&self, other: &ColliderLabel) -> bool {
        self.group == other.group && self.owner != other.owner && self.bounds.overlaps(&other.bounds)
    }
}

//=== ColliderRegistry ====================================================

/// Arena of collider labels keyed by owner.
#[derive(Debug, Default)]
pub struct ColliderRegistry {
    slots: Vec<Option<ColliderLabel>>,
    index: HashMap<ControllerId, usize>,
    free: Vec<usize>,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Mutation ---------------------------------------------------------

    /// Inserts a label, replacing any label already held by the same owner.
    pub fn insert(&mut self, label: ColliderLabel) {
        if let Some(&slot) = self.index.get(&label.owner) {
            self.slots[slot] = Some(label);
            return;
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(label);
                slot
            }
            None => {
                self.slots.push(Some(label));
                self.slots.len() - 1
            }
        };
        self.index.insert(label.owner, slot);
    }

    /// Rewrites the bounds of `owner`'s label in place.
    ///
    /// Returns `false` if the owner has no label.
    pub fn update(&mut self, owner: ControllerId, bounds: Aabb) -> bool {
        match self.index.get(&owner).and_then(|&slot| self.slots[slot].as_mut()) {
            Some(label) => {
                label.bounds = bounds;
                true
            }
            None => false,
        }
    }

    /// Removes `owner`'s label. Returns the removed label, if any.
    pub fn remove(&mut self, owner: ControllerId) -> Option<ColliderLabel> {
        let slot = self.index.remove(&owner)?;
        self.free.push(slot);
        self.slots[slot].take()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.free.clear();
    }

    //--- Queries ----------------------------------------------------------

    pub fn get(&self, owner: ControllerId) -> Option<&ColliderLabel> {
        self.index.get(&owner).and_then(|&slot| self.slots[slot].as_ref())
    }

    /// Labels currently colliding with `owner`'s label, in slot order.
    ///
    /// Empty if the owner is not registered.
    pub fn overlapping(&self, owner: ControllerId) -> Vec<ColliderLabel> {
        let Some(subject) = self.get(owner).copied() else {
            return Vec::new();
        };

        self.iter()
            .filter(|other| subject.collides_with(other))
            .copied()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColliderLabel> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn label(owner: u32, group: u32, x: f32, y: f32, w: f32, h: f32) -> ColliderLabel {
        ColliderLabel {
            owner: ControllerId::from_raw(owner),
            group,
            bounds: Aabb::new(x, y, w, h),
        }
    }

    //=====================================================================
    // Aabb Tests
    //=====================================================================

    #[test]
    fn overlapping_boxes() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let right = Aabb::new(10.0, 0.0, 10.0, 10.0);
        let below = Aabb::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn contained_box_overlaps() {
        let outer = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let inner = Aabb::new(40.0, 40.0, 5.0, 5.0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn point_containment_is_edge_inclusive() {
        let a = Aabb::new(10.0, 10.0, 20.0, 20.0);
        assert!(a.contains(Vec2::new(10.0, 10.0)));
        assert!(a.contains(Vec2::new(30.0, 30.0)));
        assert!(!a.contains(Vec2::new(31.0, 15.0)));
    }

    //=====================================================================
    // Label Tests
    //=====================================================================

    #[test]
    fn same_group_overlap_is_symmetric() {
        let a = label(1, 1, 0.0, 0.0, 10.0, 10.0);
        let b = label(2, 1, 5.0, 5.0, 10.0, 10.0);
        assert!(a.collides_with(&b));
        assert!(b.collides_with(&a));
    }

    #[test]
    fn different_groups_never_collide() {
        let a = label(1, 1, 0.0, 0.0, 10.0, 10.0);
        let b = label(2, 2, 5.0, 5.0, 10.0, 10.0);
        assert!(!a.collides_with(&b));
        assert!(!b.collides_with(&a));
    }

    #[test]
    fn label_never_collides_with_own_owner() {
        let a = label(1, 1, 0.0, 0.0, 10.0, 10.0);
        assert!(!a.collides_with(&a));
    }

    //=====================================================================
    // Registry Tests
    //=====================================================================

    #[test]
    fn overlapping_filters_group_and_owner() {
        let mut registry = ColliderRegistry::new();
        registry.insert(label(1, 1, 0.0, 0.0, 10.0, 10.0));
        registry.insert(label(2, 1, 5.0, 5.0, 10.0, 10.0));
        registry.insert(label(3, 2, 5.0, 5.0, 10.0, 10.0));
        registry.insert(label(4, 1, 50.0, 50.0, 10.0, 10.0));

        let hits = registry.overlapping(ControllerId::from_raw(1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, ControllerId::from_raw(2));
    }

    #[test]
    fn update_moves_label_in_place() {
        let mut registry = ColliderRegistry::new();
        registry.insert(label(1, 1, 0.0, 0.0, 10.0, 10.0));
        registry.insert(label(2, 1, 50.0, 50.0, 10.0, 10.0));
        assert!(registry.overlapping(ControllerId::from_raw(1)).is_empty());

        assert!(registry.update(ControllerId::from_raw(2), Aabb::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(registry.overlapping(ControllerId::from_raw(1)).len(), 1);
    }

    #[test]
    fn update_unknown_owner_returns_false() {
        let mut registry = ColliderRegistry::new();
        assert!(!registry.update(ControllerId::from_raw(9), Aabb::default()));
    }

    #[test]
    fn insert_same_owner_replaces() {
        let mut registry = ColliderRegistry::new();
        registry.insert(label(1, 1, 0.0, 0.0, 10.0, 10.0));
        registry.insert(label(1, 3, 1.0, 1.0, 2.0, 2.0));

        assert_eq!(registry.len(), 1);
        let stored = registry.get(ControllerId::from_raw(1)).unwrap();
        assert_eq!(stored.group, 3);
    }

    #[test]
    fn removed_slots_are_recycled() {
        let mut registry = ColliderRegistry::new();
        registry.insert(label(1, 1, 0.0, 0.0, 1.0, 1.0));
        registry.insert(label(2, 1, 0.0, 0.0, 1.0, 1.0));

        assert!(registry.remove(ControllerId::from_raw(1)).is_some());
        assert!(registry.remove(ControllerId::from_raw(1)).is_none());
        assert_eq!(registry.len(), 1);

        registry.insert(label(3, 1, 0.0, 0.0, 1.0, 1.0));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.slots.len(), 2);
    }

    #[test]
    fn unknown_owner_has_no_overlaps() {
        let mut registry = ColliderRegistry::new();
        registry.insert(label(1, 1, 0.0, 0.0, 10.0, 10.0));
        assert!(registry.overlapping(ControllerId::from_raw(42)).is_empty());
    }
}
