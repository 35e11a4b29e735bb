//! Character controller (spec §4.H): composes `SupportFinder`,
//! `HorizontalMotionConstraint`, and `Stepper` around a capsule body, driven
//! through the `Updateable` phases the rest of the per-step pipeline exposes. The
//! teacher carries no character controller of its own; the stepping/sweep pattern
//! here is grounded on
//! `examples/other_examples/045d2aba_onx2-av__shared-src-collision-kinematic.rs.rs`.

mod controller;
mod motion;
mod stepper;
mod support;

pub use controller::CharacterController;
pub use motion::HorizontalMotionConstraint;
pub use stepper::Stepper;
pub use support::{SupportData, SupportFinder, SupportKind};
