//! Colliders: the broad phase's real unit of work. A `RigidBody` owns zero or more
//! `Collider`s (spec §3: "A body may own one or more collidables; each collidable
//! belongs to exactly one body").

pub mod shape;

pub use shape::Shape;

use crate::body::{Material, RigidBodyHandle};
use crate::bounding::Aabb;
use crate::math::Isometry;

slotmap::new_key_type! {
    pub struct ColliderHandle;
}

/// A collidable: owns a shape, a cached world-space AABB, and a back-reference to
/// its owning body (spec §3's `Collidable`). The event dispatcher described in the
/// spec lives on `Space` (keyed by `ColliderHandle`) rather than on this struct, to
/// keep `Collider` plain data (Design Note "Event dispatch").
pub struct Collider {
    pub parent: RigidBodyHandle,
    /// Pose of the collider relative to its parent body; identity for the common
    /// case of one collider per body.
    pub local_pose: Isometry,
    pub shape: Shape,
    pub material: Material,
    pub aabb: Aabb,
}

impl Collider {
    pub fn new(parent: RigidBodyHandle, shape: Shape) -> Self {
        Self {
            parent,
            local_pose: Isometry::identity(),
            shape,
            material: Material::default(),
            aabb: shape.local_aabb(),
        }
    }

    /// Refreshes `aabb` from the body's current world pose, loosened by
    /// `prediction_distance` so the broad phase doesn't thrash pairs apart by a hair's
    /// width of motion per step.
    pub fn refresh_aabb(&mut self, body_pose: &Isometry, prediction_distance: f32) {
        let world_pose = body_pose * self.local_pose;
        self.aabb = self.shape.world_aabb(&world_pose).loosened(prediction_distance);
    }

    pub fn world_pose(&self, body_pose: &Isometry) -> Isometry {
        body_pose * self.local_pose
    }
}

/// Owning arena of colliders.
#[derive(Default)]
pub struct ColliderSet {
    colliders: crate::data::Arena<ColliderHandle, Collider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collider: Collider) -> ColliderHandle {
        self.colliders.insert(collider)
    }

    pub fn remove(&mut self, handle: ColliderHandle) -> Option<Collider> {
        self.colliders.remove(handle)
    }

    pub fn get(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    pub fn get_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.colliders.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ColliderHandle, &mut Collider)> {
        self.colliders.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }
}

impl std::ops::Index<ColliderHandle> for ColliderSet {
    type Output = Collider;
    fn index(&self, handle: ColliderHandle) -> &Collider {
        self.colliders.get(handle).expect("stale ColliderHandle")
    }
}

impl std::ops::IndexMut<ColliderHandle> for ColliderSet {
    fn index_mut(&mut self, handle: ColliderHandle) -> &mut Collider {
        self.colliders.get_mut(handle).expect("stale ColliderHandle")
    }
}

/// A pair of colliders, order-independent for hashing/equality purposes (spec §5:
/// "narrow-phase pair lookups are therefore keyed by an order-independent pair
/// identity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderPair {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
}

impl ColliderPair {
    pub fn new(a: ColliderHandle, b: ColliderHandle) -> Self {
        // Order by the underlying key representation for a canonical form regardless
        // of discovery order, matching spec §5's ordering guarantee.
        use slotmap::Key;
        if a.data().as_ffi() <= b.data().as_ffi() {
            Self { collider1: a, collider2: b }
        } else {
            Self { collider1: b, collider2: a }
        }
    }
}
