//! Constraint types and the solver that resolves them (spec §4.E-F).

pub mod solver;

pub use solver::{Constraint, ContactConstraint, SingleBoneConstraint};

use slotmap::SlotMap;

slotmap::new_key_type! {
    pub struct BoneConstraintHandle;
}

/// Registered articulated/IK constraints, kept separately from contact manifolds
/// since they have no broad-phase/narrow-phase lifecycle of their own — callers
/// add and remove them directly (spec §3: "Bone... articulated layer").
#[derive(Default)]
pub struct BoneConstraintSet {
    bones: SlotMap<BoneConstraintHandle, SingleBoneConstraint>,
}

impl BoneConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, constraint: SingleBoneConstraint) -> BoneConstraintHandle {
        self.bones.insert(constraint)
    }

    pub fn remove(&mut self, handle: BoneConstraintHandle) -> Option<SingleBoneConstraint> {
        self.bones.remove(handle)
    }

    pub fn get_mut(&mut self, handle: BoneConstraintHandle) -> Option<&mut SingleBoneConstraint> {
        self.bones.get_mut(handle)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BoneConstraintHandle, &mut SingleBoneConstraint)> {
        self.bones.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}
