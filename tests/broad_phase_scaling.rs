//! Scenario 5: the broad phase should only report pairs whose AABBs actually
//! overlap, scaling with the number of colliders *near each other* rather than with
//! the total collider count — a sparse field of spheres should report far fewer
//! pairs than a tightly packed cluster of the same size.

use rigid3d::broad_phase::{BroadPhase, BroadPhasePairEvent, Grid2DSortAndSweep};
use rigid3d::math::{Matrix3x3, Vector};
use rigid3d::{Collider, ColliderSet, RigidBody, RigidBodySet, Shape};

fn build_grid_of_spheres(count_per_axis: i32, spacing: f32) -> ColliderSet {
    let mut bodies = RigidBodySet::new();
    let mut colliders = ColliderSet::new();
    for i in 0..count_per_axis {
        for j in 0..count_per_axis {
            let position = Vector::new(0.0, (i as f32) * spacing, (j as f32) * spacing);
            let handle = bodies.insert(RigidBody::new_dynamic(position, 1.0, Matrix3x3::identity())).unwrap();
            let mut collider = Collider::new(handle, Shape::ball(0.5));
            collider.refresh_aabb(&bodies[handle].pose(), 0.0);
            colliders.insert(collider);
        }
    }
    colliders
}

fn count_add_pairs(colliders: &ColliderSet) -> usize {
    let mut bp = Grid2DSortAndSweep::new(8.0);
    let mut events = Vec::new();
    bp.update(colliders, &mut events);
    events.iter().filter(|e| matches!(e, BroadPhasePairEvent::AddPair(_))).count()
}

#[test]
fn sparse_field_reports_no_pairs() {
    // Spacing far larger than the spheres' own radius means nothing overlaps.
    let colliders = build_grid_of_spheres(10, 5.0);
    assert_eq!(colliders.len(), 100);
    assert_eq!(count_add_pairs(&colliders), 0);
}

#[test]
fn tightly_packed_cluster_reports_many_pairs_but_stays_bounded() {
    // Spacing smaller than twice the radius means every axis-adjacent sphere touches
    // its neighbors; still far fewer pairs than the O(n^2) = 4950 a naive all-pairs
    // test over 100 colliders would produce.
    let colliders = build_grid_of_spheres(10, 0.9);
    assert_eq!(colliders.len(), 100);
    let pairs = count_add_pairs(&colliders);
    assert!(pairs > 0, "adjacent spheres in a packed grid should overlap");
    assert!(pairs < 400, "grid broad phase should prune well below the O(n^2) pair count, got {pairs}");
}
