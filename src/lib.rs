//! `rigid3d`: a real-time 3D rigid-body simulation kernel — broad phase, narrow
//! phase, an iterative PGS constraint solver with warm-starting, island
//! decomposition, and a character controller built on top of it.
//!
//! The top-level entry point is [`space::Space`]: it owns every subsystem and
//! advances the whole world one fixed step at a time via [`space::Space::step`].

pub mod body;
pub mod bounding;
pub mod broad_phase;
pub mod character;
pub mod collider;
pub mod config;
pub mod continuous;
pub mod data;
pub mod dynamics;
pub mod errors;
pub mod events;
pub mod islands;
pub mod math;
pub mod narrow_phase;
pub mod pipeline;
pub mod space;
pub mod utils;

pub use body::{BodyType, Material, RigidBody, RigidBodyHandle, RigidBodySet};
pub use collider::{Collider, ColliderHandle, ColliderPair, ColliderSet, Shape};
pub use config::{CharacterConfig, IntegrationParameters, WorldConfig};
pub use errors::{PhysicsError, PhysicsResult};
pub use events::CollisionEvent;
pub use space::Space;
