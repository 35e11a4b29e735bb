//! Precondition-violation taxonomy (spec §7.1). These are reported as fatal caller
//! errors: the kernel does not attempt to recover from them, it rejects the offending
//! call so the caller's bug surfaces immediately instead of corrupting simulation state.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("AABB is inverted or contains NaN: min={min:?} max={max:?}")]
    InvalidAabb { min: [f32; 3], max: [f32; 3] },

    #[error("rigid body velocity has a non-finite component: {0:?}")]
    NonFiniteVelocity([f32; 3]),

    #[error("inverse mass must be >= 0, got {0}")]
    NegativeInverseMass(f32),

    #[error("a static or kinematic body's linear velocity must be prescribed or zero, got {0:?}")]
    KinematicVelocityNotPrescribed([f32; 3]),

    #[error("character controller jumpForceFactor must be >= 0, got {0}")]
    NegativeJumpForceFactor(f32),

    #[error("softness must be >= 0, got {0}")]
    NegativeSoftness(f32),

    #[error("error correction factor must be within [0, 1], got {0}")]
    ErrorCorrectionOutOfRange(f32),

    #[error("handle {0:?} does not refer to a live rigid body")]
    UnknownRigidBody(crate::body::RigidBodyHandle),

    #[error("handle {0:?} does not refer to a live collider")]
    UnknownCollider(crate::collider::ColliderHandle),
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
