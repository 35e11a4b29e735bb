//! Continuous (swept-sphere) collision for fast-moving bodies (spec §4.H scenario 6,
//! §1 Non-goals: "continuous collision across arbitrary shapes (only swept spheres
//! for fast-movers)"). Runs once per step, after the discrete solve, against static
//! colliders only — a deliberately narrow scope matching the Non-goal.

use crate::body::{BodyType, RigidBodySet};
use crate::collider::{ColliderSet, Shape};
use crate::math::{Point, Real, Vector};

/// Earliest time of impact (as a fraction of the step, `[0, 1]`) and surface normal
/// for a sphere of `radius` sweeping from `start` to `end` against every static
/// collider. `None` if the sweep stays clear.
pub fn sweep_vs_statics(start: Point, end: Point, radius: Real, bodies: &RigidBodySet, colliders: &ColliderSet) -> Option<(Real, Vector)> {
    let displacement = end - start;
    if displacement.norm_squared() < 1e-12 {
        return None;
    }

    let mut best: Option<(Real, Vector)> = None;
    for (_, collider) in colliders.iter() {
        let Some(body) = bodies.get(collider.parent) else { continue };
        if body.body_type != BodyType::Static {
            continue;
        }
        let pose = collider.world_pose(&body.pose());

        let hit = match &collider.shape {
            Shape::Plane { normal, offset } => {
                let world_normal = pose.rotation.transform_vector(normal);
                let plane_point = pose.transform_point(&Point::from(*normal * *offset));
                ray_vs_plane(start, displacement, world_normal, plane_point, radius)
            }
            _ => {
                let aabb = collider.aabb.loosened(radius);
                ray_vs_aabb(start, displacement, &aabb)
            }
        };

        if let Some((toi, normal)) = hit {
            if best.map(|(best_toi, _)| toi < best_toi).unwrap_or(true) {
                best = Some((toi, normal));
            }
        }
    }
    best
}

fn ray_vs_plane(start: Point, displacement: Vector, normal: Vector, plane_point: Point, radius: Real) -> Option<(Real, Vector)> {
    let denom = normal.dot(&displacement);
    if denom >= 0.0 {
        return None; // moving away from or parallel to the plane
    }
    let dist_to_surface = normal.dot(&(plane_point - start)) + radius;
    let toi = dist_to_surface / denom;
    if (0.0..=1.0).contains(&toi) {
        Some((toi, normal))
    } else {
        None
    }
}

/// Slab-method ray/AABB intersection (Ericson, *Real-Time Collision Detection*,
/// §5.3.3), against an AABB already loosened by the sphere's radius — conservative
/// but adequate for the thin-wall scenario this exists for.
fn ray_vs_aabb(start: Point, displacement: Vector, aabb: &crate::bounding::Aabb) -> Option<(Real, Vector)> {
    let mut t_min: Real = 0.0;
    let mut t_max: Real = 1.0;
    let mut normal = Vector::zeros();

    for axis in 0..3 {
        let d = displacement[axis];
        if d.abs() < 1e-9 {
            if start[axis] < aabb.mins[axis] || start[axis] > aabb.maxs[axis] {
                return None;
            }
            continue;
        }
        let inv_d = 1.0 / d;
        let mut t1 = (aabb.mins[axis] - start[axis]) * inv_d;
        let mut t2 = (aabb.maxs[axis] - start[axis]) * inv_d;
        let mut axis_normal = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            axis_normal = 1.0;
        }
        if t1 > t_min {
            t_min = t1;
            normal = Vector::zeros();
            normal[axis] = axis_normal;
        }
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    if t_min > 0.0 && t_min <= 1.0 {
        Some((t_min, normal))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_sphere_stops_before_wall() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let wall_body = bodies.insert(crate::body::RigidBody::new_static(Vector::new(5.0, 0.0, 0.0))).unwrap();
        let mut wall = crate::collider::Collider::new(wall_body, Shape::cuboid(Vector::new(0.05, 2.0, 2.0)));
        wall.refresh_aabb(&bodies[wall_body].pose(), 0.0);
        colliders.insert(wall);

        let start = Point::new(0.0, 0.0, 0.0);
        let end = Point::new(10.0, 0.0, 0.0);
        let hit = sweep_vs_statics(start, end, 0.1, &bodies, &colliders);
        assert!(hit.is_some());
        let (toi, normal) = hit.unwrap();
        assert!(toi > 0.0 && toi < 1.0);
        assert!(normal.x < 0.0);
    }

    #[test]
    fn slow_sphere_far_from_wall_has_no_hit() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let wall_body = bodies.insert(crate::body::RigidBody::new_static(Vector::new(500.0, 0.0, 0.0))).unwrap();
        let mut wall = crate::collider::Collider::new(wall_body, Shape::cuboid(Vector::new(0.05, 2.0, 2.0)));
        wall.refresh_aabb(&bodies[wall_body].pose(), 0.0);
        colliders.insert(wall);

        let start = Point::new(0.0, 0.0, 0.0);
        let end = Point::new(1.0, 0.0, 0.0);
        assert!(sweep_vs_statics(start, end, 0.1, &bodies, &colliders).is_none());
    }
}
