//! Broad phase: prunes the O(N^2) pair space down to a stream of candidate
//! overlapping pairs (spec §4.B).

mod grid;

pub use grid::Grid2DSortAndSweep;

use crate::collider::ColliderPair;

/// A pair add/remove notification, mirroring the `BroadPhasePairEvent` shape used in
/// `examples/other_examples/75769cbb_Ralith-rapier__...broad_phase_sieve_tree.rs.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadPhasePairEvent {
    AddPair(ColliderPair),
    DeletePair(ColliderPair),
}

/// The interface the narrow phase consumes. A closed implementation set (only
/// `Grid2DSortAndSweep` exists today) dispatched directly rather than through `dyn`,
/// since `Space` owns a single concrete broad phase for its whole lifetime.
pub trait BroadPhase {
    fn update(
        &mut self,
        colliders: &crate::collider::ColliderSet,
        events: &mut Vec<BroadPhasePairEvent>,
    );
}
