//! `Grid2DSortAndSweep`: a 2D-grid + sort-and-sweep broad phase (spec §4.B).
//!
//! World space is quantized on the (Y, Z) plane into `cell_size`-wide square cells;
//! each collider registers in every cell its AABB projects onto, and each cell keeps
//! an X-sorted list swept once per step to emit overlapping pairs. Grounded on the
//! `BroadPhase` trait shape and `FxHashMap`-keyed cell storage seen in
//! `examples/other_examples/75769cbb_Ralith-rapier__...broad_phase_sieve_tree.rs.rs`,
//! generalized from a sieve tree to the grid+sweep scheme the spec calls for.

use rustc_hash::{FxHashMap, FxHashSet};

use super::BroadPhasePairEvent;
use crate::collider::{ColliderHandle, ColliderPair, ColliderSet};
use crate::math::Real;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min_y: i32,
    max_y: i32,
    min_z: i32,
    max_z: i32,
}

impl CellRange {
    fn contains(&self, y: i32, z: i32) -> bool {
        y >= self.min_y && y <= self.max_y && z >= self.min_z && z <= self.max_z
    }

    fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.min_y..=self.max_y).flat_map(move |y| (self.min_z..=self.max_z).map(move |z| (y, z)))
    }
}

#[derive(Default)]
struct GridCell {
    entries: Vec<ColliderHandle>,
}

/// `H(Y, Z) = Y * 15485863 + Z * 32452843 (mod 2^32)` (spec §4.B), giving a 64-bit
/// key (widened so the `FxHashMap` bucket spread stays uniform across negative and
/// positive cell coordinates alike).
fn cell_key(y: i32, z: i32) -> u64 {
    let y = y as i64;
    let z = z as i64;
    let h = y.wrapping_mul(15_485_863).wrapping_add(z.wrapping_mul(32_452_843));
    (h as u64) & 0xFFFF_FFFF
}

pub struct Grid2DSortAndSweep {
    cell_size: Real,
    cells: FxHashMap<u64, GridCell>,
    entry_ranges: FxHashMap<ColliderHandle, CellRange>,
    current_pairs: FxHashSet<ColliderPair>,
}

impl Grid2DSortAndSweep {
    pub fn new(cell_size: Real) -> Self {
        Self {
            cell_size,
            cells: FxHashMap::default(),
            entry_ranges: FxHashMap::default(),
            current_pairs: FxHashSet::default(),
        }
    }

    fn cell_coord(&self, y: Real, z: Real) -> (i32, i32) {
        let inv = 1.0 / self.cell_size;
        ((y * inv).floor() as i32, (z * inv).floor() as i32)
    }

    fn range_for(&self, aabb: &crate::bounding::Aabb) -> CellRange {
        let (min_y, min_z) = self.cell_coord(aabb.mins.y, aabb.mins.z);
        let (max_y, max_z) = self.cell_coord(aabb.maxs.y, aabb.maxs.z);
        CellRange { min_y, max_y, min_z, max_z }
    }

    fn insert_into_cell(&mut self, y: i32, z: i32, handle: ColliderHandle) {
        self.cells.entry(cell_key(y, z)).or_default().entries.push(handle);
    }

    fn remove_from_cell(&mut self, y: i32, z: i32, handle: ColliderHandle) {
        let key = cell_key(y, z);
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.entries.retain(|&h| h != handle);
            if cell.entries.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Deregisters a collider entirely: called when a collidable is removed from the
    /// space (spec §3 lifecycle: "destroyed on removal, which must deregister from
    /// all cells").
    pub fn notify_removed(&mut self, handle: ColliderHandle, events: &mut Vec<BroadPhasePairEvent>) {
        if let Some(range) = self.entry_ranges.remove(&handle) {
            for (y, z) in range.cells() {
                self.remove_from_cell(y, z, handle);
            }
        }
        self.current_pairs.retain(|pair| {
            let touches = pair.collider1 == handle || pair.collider2 == handle;
            if touches {
                events.push(BroadPhasePairEvent::DeletePair(*pair));
            }
            !touches
        });
    }

    /// Per-cell insertion sort by `aabb.min.x` — optimal given the frame-to-frame
    /// temporal coherence the spec calls out, since cells are nearly sorted already.
    fn insertion_sort_by_x(entries: &mut [ColliderHandle], colliders: &ColliderSet) {
        for i in 1..entries.len() {
            let key = entries[i];
            let key_x = colliders[key].aabb.mins.x;
            let mut j = i;
            while j > 0 && colliders[entries[j - 1]].aabb.mins.x > key_x {
                entries[j] = entries[j - 1];
                j -= 1;
            }
            entries[j] = key;
        }
    }
}

impl super::BroadPhase for Grid2DSortAndSweep {
    fn update(&mut self, colliders: &ColliderSet, events: &mut Vec<BroadPhasePairEvent>) {
        // --- Entry-side update: re-register any collider whose occupied cells changed.
        for (handle, collider) in colliders.iter() {
            let new_range = self.range_for(&collider.aabb);
            let old_range = self.entry_ranges.get(&handle).copied();

            if old_range == Some(new_range) {
                continue;
            }

            if let Some(old_range) = old_range {
                for (y, z) in old_range.cells() {
                    if !new_range.contains(y, z) {
                        self.remove_from_cell(y, z, handle);
                    }
                }
                for (y, z) in new_range.cells() {
                    if !old_range.contains(y, z) {
                        self.insert_into_cell(y, z, handle);
                    }
                }
            } else {
                for (y, z) in new_range.cells() {
                    self.insert_into_cell(y, z, handle);
                }
            }

            self.entry_ranges.insert(handle, new_range);
        }

        // Drop entries for colliders that vanished without going through
        // `notify_removed` (defensive; the normal path is the explicit call above).
        let stale: Vec<ColliderHandle> = self
            .entry_ranges
            .keys()
            .copied()
            .filter(|h| colliders.get(*h).is_none())
            .collect();
        for handle in stale {
            self.notify_removed(handle, events);
        }

        // --- Cell-side sort-and-sweep.
        let mut touching = FxHashSet::default();
        for cell in self.cells.values_mut() {
            Self::insertion_sort_by_x(&mut cell.entries, colliders);

            for i in 0..cell.entries.len() {
                let ei = cell.entries[i];
                let Some(collider_i) = colliders.get(ei) else { continue };
                for &ej in &cell.entries[i + 1..] {
                    let Some(collider_j) = colliders.get(ej) else { continue };
                    if collider_j.aabb.mins.x > collider_i.aabb.maxs.x {
                        // Entries past this point start further right than `ei`
                        // ends; nothing further in this cell can overlap it.
                        break;
                    }
                    if collider_i.aabb.intersects(&collider_j.aabb) {
                        touching.insert(ColliderPair::new(ei, ej));
                    }
                }
            }
        }

        for pair in &touching {
            if !self.current_pairs.contains(pair) {
                events.push(BroadPhasePairEvent::AddPair(*pair));
            }
        }
        for pair in &self.current_pairs {
            if !touching.contains(pair) {
                events.push(BroadPhasePairEvent::DeletePair(*pair));
            }
        }
        self.current_pairs = touching;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{RigidBody, RigidBodyHandle, RigidBodySet};
    use crate::broad_phase::BroadPhase;
    use crate::collider::{Collider, Shape};
    use crate::math::{Matrix3x3, Vector};

    fn make_set_with_spheres(
        positions: &[Vector],
    ) -> (RigidBodySet, ColliderSet, Vec<RigidBodyHandle>, Vec<ColliderHandle>) {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut body_handles = Vec::new();
        let mut collider_handles = Vec::new();
        for &p in positions {
            let handle = bodies
                .insert(RigidBody::new_dynamic(p, 1.0, Matrix3x3::identity()))
                .unwrap();
            let mut collider = Collider::new(handle, Shape::ball(0.5));
            collider.refresh_aabb(&bodies[handle].pose(), 0.0);
            collider_handles.push(colliders.insert(collider));
            body_handles.push(handle);
        }
        (bodies, colliders, body_handles, collider_handles)
    }

    #[test]
    fn overlapping_pair_emitted_exactly_once() {
        let (_bodies, colliders, _handles, _chandles) =
            make_set_with_spheres(&[Vector::new(0.0, 0.0, 0.0), Vector::new(0.6, 0.0, 0.0)]);
        let mut bp = Grid2DSortAndSweep::new(8.0);
        let mut events = Vec::new();
        bp.update(&colliders, &mut events);
        let adds = events
            .iter()
            .filter(|e| matches!(e, BroadPhasePairEvent::AddPair(_)))
            .count();
        assert_eq!(adds, 1);

        // Re-running on an unchanged world must not re-emit the same pair.
        events.clear();
        bp.update(&colliders, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn far_apart_pair_not_emitted() {
        let (_bodies, colliders, _handles, _chandles) =
            make_set_with_spheres(&[Vector::new(0.0, 0.0, 0.0), Vector::new(50.0, 0.0, 0.0)]);
        let mut bp = Grid2DSortAndSweep::new(8.0);
        let mut events = Vec::new();
        bp.update(&colliders, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn separating_pair_emits_delete() {
        let (mut bodies, mut colliders, handles, chandles) =
            make_set_with_spheres(&[Vector::new(0.0, 0.0, 0.0), Vector::new(0.6, 0.0, 0.0)]);
        let mut bp = Grid2DSortAndSweep::new(8.0);
        let mut events = Vec::new();
        bp.update(&colliders, &mut events);
        assert_eq!(events.len(), 1);

        bodies[handles[1]].position = Vector::new(50.0, 0.0, 0.0);
        let pose = bodies[handles[1]].pose();
        colliders[chandles[1]].refresh_aabb(&pose, 0.0);

        events.clear();
        bp.update(&colliders, &mut events);
        assert!(matches!(events[0], BroadPhasePairEvent::DeletePair(_)));
    }
}
