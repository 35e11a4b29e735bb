//! Rigid bodies and their owning arena.
//!
//! Grounded on the handle/arena pattern of
//! `examples/other_examples/cd89ebd2_schnippl0r-rapier__src-dynamics-rigid_body_set.rs.rs`
//! (generational handles, active-set bookkeeping, activation energy) and on the
//! activation-energy scheme of the original BEPUphysics `ActivationManager`
//! (`examples/loafofpiecrust-nphysics/src/detection/activation_manager.rs`).

mod activation;

pub use activation::Activation;

use crate::collider::ColliderHandle;
use crate::data::Arena;
use crate::errors::{PhysicsError, PhysicsResult};
use crate::math::{Isometry, Matrix3x3, Real, Rotation, Vector};

slotmap::new_key_type! {
    pub struct RigidBodyHandle;
}

/// How a body's pose is advanced each step (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionUpdateMode {
    /// Pose is simply integrated from velocity; fast movers may tunnel.
    Discrete,
    /// The body's AABB is swept across its motion this step and fast-movers are
    /// clamped against the wall they'd otherwise tunnel through (spec scenario 6).
    Continuous,
}

/// Dynamic, kinematic (velocity prescribed externally, infinite mass), or static
/// (never moves). Spec §3: "if inverse mass = 0 then linear velocity must be treated
/// as prescribed (kinematic) or zero (static)".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Kinematic,
    Static,
}

/// Friction and restitution (bounciness), blended per spec §4.E: effective friction is
/// the geometric mean, effective restitution is the max above a relative-velocity
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub friction: Real,
    pub restitution: Real,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

impl Material {
    pub fn combine_friction(a: Material, b: Material) -> Real {
        (a.friction * b.friction).max(0.0).sqrt()
    }

    pub fn combine_restitution(a: Material, b: Material) -> Real {
        a.restitution.max(b.restitution)
    }
}

/// A rigid body: pose, velocities, and the mass/inertia data the solver needs.
/// Invariants (spec §3), enforced at construction and after every integration step:
/// orientation stays unit length, inverse mass is non-negative, kinematic/static
/// bodies don't carry an externally-unprescribed velocity.
pub struct RigidBody {
    pub position: Vector,
    pub orientation: Rotation,
    pub linvel: Vector,
    pub angvel: Vector,
    pub body_type: BodyType,
    pub inv_mass: Real,
    /// Inverse inertia tensor in body-local space; `world_inv_inertia` is derived
    /// from this each step by `update_world_mass_properties`.
    pub local_inv_inertia: Matrix3x3,
    world_inv_inertia: Matrix3x3,
    pub material: Material,
    pub update_mode: PositionUpdateMode,
    pub linear_damping: Real,
    pub angular_damping: Real,
    pub activation: Activation,
    pub colliders: Vec<ColliderHandle>,
    pub(crate) active_island_id: usize,
    pub(crate) active_set_offset: usize,
}

impl RigidBody {
    pub fn new_dynamic(position: Vector, inv_mass: Real, local_inv_inertia: Matrix3x3) -> Self {
        Self {
            position,
            orientation: Rotation::identity(),
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            body_type: BodyType::Dynamic,
            inv_mass,
            local_inv_inertia,
            world_inv_inertia: local_inv_inertia,
            material: Material::default(),
            update_mode: PositionUpdateMode::Discrete,
            linear_damping: 0.0,
            angular_damping: 0.0,
            activation: Activation::new(),
            colliders: Vec::new(),
            active_island_id: usize::MAX,
            active_set_offset: usize::MAX,
        }
    }

    pub fn new_static(position: Vector) -> Self {
        Self {
            body_type: BodyType::Static,
            inv_mass: 0.0,
            local_inv_inertia: Matrix3x3::zeros(),
            world_inv_inertia: Matrix3x3::zeros(),
            activation: Activation::asleep(),
            ..Self::new_dynamic(position, 0.0, Matrix3x3::zeros())
        }
    }

    pub fn new_kinematic(position: Vector) -> Self {
        Self {
            body_type: BodyType::Kinematic,
            inv_mass: 0.0,
            local_inv_inertia: Matrix3x3::zeros(),
            world_inv_inertia: Matrix3x3::zeros(),
            ..Self::new_dynamic(position, 0.0, Matrix3x3::zeros())
        }
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    #[inline]
    pub fn can_move(&self) -> bool {
        !matches!(self.body_type, BodyType::Static)
    }

    #[inline]
    pub fn world_inv_inertia(&self) -> &Matrix3x3 {
        &self.world_inv_inertia
    }

    pub fn pose(&self) -> Isometry {
        Isometry::from_parts(self.position.into(), self.orientation)
    }

    /// Recomputes the world-space inverse inertia tensor from the local one and the
    /// current orientation: `I_world^-1 = R * I_local^-1 * R^T` (spec §3).
    pub fn update_world_mass_properties(&mut self) {
        if self.is_dynamic() {
            let r = self.orientation.to_rotation_matrix();
            self.world_inv_inertia = r.matrix() * self.local_inv_inertia * r.matrix().transpose();
        }
    }

    pub fn add_gravity(&mut self, gravity: Vector, dt: Real) {
        if self.inv_mass > 0.0 {
            self.linvel += gravity * dt;
        }
    }

    /// Symplectic-Euler pose integration from the (already solved) velocities, then
    /// re-normalizes the orientation quaternion (spec invariant: `|orientation| ~= 1`
    /// after every integration).
    pub fn integrate(&mut self, dt: Real) {
        if !self.can_move() {
            return;
        }
        self.linvel *= 1.0 / (1.0 + dt * self.linear_damping);
        self.angvel *= 1.0 / (1.0 + dt * self.angular_damping);

        self.position += self.linvel * dt;
        let delta = self.angvel * dt;
        let dq = Rotation::new(delta);
        self.orientation = (dq * self.orientation).normalize();
    }

    /// Velocity this body imparts at a world-space point (used by the character
    /// controller's relative-velocity computation against a moving support).
    pub fn point_velocity(&self, point: Vector) -> Vector {
        self.linvel + self.angvel.cross(&(point - self.position))
    }

    pub fn apply_impulse(&mut self, impulse: Vector, point: Vector) {
        if self.inv_mass <= 0.0 {
            return;
        }
        self.linvel += impulse * self.inv_mass;
        let r = point - self.position;
        self.angvel += self.world_inv_inertia * r.cross(&impulse);
    }

    pub fn kinetic_energy(&self) -> Real {
        if self.inv_mass <= 0.0 {
            return 0.0;
        }
        let mass = 1.0 / self.inv_mass;
        0.5 * mass * self.linvel.norm_squared() + 0.5 * self.angvel.dot(&(self.world_inv_inertia.try_inverse().unwrap_or(Matrix3x3::zeros()) * self.angvel))
    }
}

fn validate_new_body(position: &Vector, linvel: &Vector, inv_mass: Real) -> PhysicsResult<()> {
    if !position.iter().all(|c| c.is_finite()) {
        return Err(PhysicsError::InvalidAabb {
            min: [position.x, position.y, position.z],
            max: [position.x, position.y, position.z],
        });
    }
    if !linvel.iter().all(|c| c.is_finite()) {
        return Err(PhysicsError::NonFiniteVelocity([linvel.x, linvel.y, linvel.z]));
    }
    if inv_mass < 0.0 {
        return Err(PhysicsError::NegativeInverseMass(inv_mass));
    }
    Ok(())
}

/// Owning arena of rigid bodies plus the active/sleeping-set bookkeeping the
/// island-builder and solver consume.
#[derive(Default)]
pub struct RigidBodySet {
    bodies: Arena<RigidBodyHandle, RigidBody>,
}

impl RigidBodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: RigidBody) -> PhysicsResult<RigidBodyHandle> {
        validate_new_body(&body.position, &body.linvel, body.inv_mass)?;
        Ok(self.bodies.insert(body))
    }

    pub fn remove(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        self.bodies.remove(handle)
    }

    pub fn get(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn get_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn get2_mut(
        &mut self,
        a: RigidBodyHandle,
        b: RigidBodyHandle,
    ) -> (Option<&mut RigidBody>, Option<&mut RigidBody>) {
        self.bodies.get2_mut(a, b)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RigidBodyHandle, &RigidBody)> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RigidBodyHandle, &mut RigidBody)> {
        self.bodies.iter_mut()
    }

    pub fn total_kinetic_energy(&self) -> Real {
        self.bodies.iter().map(|(_, b)| b.kinetic_energy()).sum()
    }
}

impl std::ops::Index<RigidBodyHandle> for RigidBodySet {
    type Output = RigidBody;
    fn index(&self, handle: RigidBodyHandle) -> &RigidBody {
        self.bodies.get(handle).expect("stale RigidBodyHandle")
    }
}

impl std::ops::IndexMut<RigidBodyHandle> for RigidBodySet {
    fn index_mut(&mut self, handle: RigidBodyHandle) -> &mut RigidBody {
        self.bodies.get_mut(handle).expect("stale RigidBodyHandle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_stays_unit_after_integration() {
        let mut body = RigidBody::new_dynamic(Vector::zeros(), 1.0, Matrix3x3::identity());
        body.angvel = Vector::new(3.0, -2.0, 5.0);
        for _ in 0..120 {
            body.integrate(1.0 / 60.0);
        }
        approx::assert_relative_eq!(body.orientation.norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn rejects_negative_inverse_mass() {
        let mut set = RigidBodySet::new();
        let body = RigidBody::new_dynamic(Vector::zeros(), -1.0, Matrix3x3::identity());
        assert!(matches!(
            set.insert(body),
            Err(PhysicsError::NegativeInverseMass(_))
        ));
    }

    #[test]
    fn rejects_non_finite_velocity() {
        let mut set = RigidBodySet::new();
        let mut body = RigidBody::new_dynamic(Vector::zeros(), 1.0, Matrix3x3::identity());
        body.linvel = Vector::new(Real::NAN, 0.0, 0.0);
        assert!(matches!(
            set.insert(body),
            Err(PhysicsError::NonFiniteVelocity(_))
        ));
    }

    #[test]
    fn free_fall_matches_closed_form() {
        let mut set = RigidBodySet::new();
        let handle = set
            .insert(RigidBody::new_dynamic(
                Vector::zeros(),
                1.0,
                Matrix3x3::identity(),
            ))
            .unwrap();
        let gravity = Vector::new(0.0, -9.81, 0.0);
        let dt = 1.0 / 240.0; // fine step to keep O(dt^2) error small
        let t = 1.0;
        let steps = (t / dt).round() as u32;
        for _ in 0..steps {
            let body = &mut set[handle];
            body.add_gravity(gravity, dt);
            body.integrate(dt);
        }
        let expected = 0.5 * gravity * t * t;
        let body = &set[handle];
        approx::assert_relative_eq!(body.position.y, expected.y, epsilon = 0.05);
    }
}
