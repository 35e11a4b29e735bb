//! Shape-pair contact generation. Dispatches to the generic GJK routine for any pair
//! touching a `Ball` or two `Capsule`s (a single deepest point is all a rounded point
//! or line needs), and to specialized face-clipping for the flat-on-flat pairs
//! (`Cuboid`-`Cuboid`, `Cuboid`-`Plane`) where a full manifold matters.

use arrayvec::ArrayVec;

use super::gjk::{self, ShapeInstance};
use super::manifold::RawContact;
use crate::collider::Shape;
use crate::math::{Isometry, Point, Real, Vector};

/// Generates up to four raw contacts between two posed shapes, plus the shared
/// contact normal (collider1 -> collider2). Returns `None` if the shapes are not
/// touching (core-to-core distance minus both radii is positive).
pub fn generate(
    shape1: &Shape,
    pose1: &Isometry,
    shape2: &Shape,
    pose2: &Isometry,
    prediction_distance: Real,
) -> Option<(Vector, ArrayVec<RawContact, 8>)> {
    match (shape1, shape2) {
        (Shape::Plane { .. }, _) => plane_vs_shape(shape1, pose1, shape2, pose2, prediction_distance, false),
        (_, Shape::Plane { .. }) => {
            plane_vs_shape(shape2, pose2, shape1, pose1, prediction_distance, true)
        }
        (Shape::Cuboid { .. }, Shape::Cuboid { .. }) => box_box(shape1, pose1, shape2, pose2, prediction_distance),
        _ => gjk_single_point(shape1, pose1, shape2, pose2, prediction_distance),
    }
}

fn gjk_single_point(
    shape1: &Shape,
    pose1: &Isometry,
    shape2: &Shape,
    pose2: &Isometry,
    prediction_distance: Real,
) -> Option<(Vector, ArrayVec<RawContact, 8>)> {
    let hit = gjk::closest_cores(ShapeInstance::new(shape1, pose1), ShapeInstance::new(shape2, pose2))?;
    let separation = hit.distance - shape1.radius() - shape2.radius();
    if separation > prediction_distance {
        return None;
    }

    let normal = if hit.normal.norm_squared() > 1e-10 {
        hit.normal.normalize()
    } else {
        Vector::y()
    };
    let point_a = hit.point_a + normal * shape1.radius();
    let point_b = hit.point_b - normal * shape2.radius();

    let mut contacts = ArrayVec::new();
    contacts.push(RawContact {
        feature_id: 0,
        point_a,
        point_b,
        penetration: -separation,
    });
    Some((normal, contacts))
}

/// Half-space (`shape1` must be `Plane`) against an arbitrary shape. `swapped`
/// indicates the plane was originally `shape2`, so the returned normal and contact
/// assignment need flipping back to the caller's (collider1, collider2) order.
fn plane_vs_shape(
    plane_shape: &Shape,
    plane_pose: &Isometry,
    other_shape: &Shape,
    other_pose: &Isometry,
    prediction_distance: Real,
    swapped: bool,
) -> Option<(Vector, ArrayVec<RawContact, 8>)> {
    let Shape::Plane { normal, offset } = plane_shape else {
        unreachable!("plane_vs_shape requires a Plane as the first shape");
    };
    let world_normal = plane_pose.rotation.transform_vector(normal);
    let plane_point = plane_pose.transform_point(&Point::from(*normal * *offset));

    let candidate_local_points: Vec<Point> = match other_shape {
        Shape::Ball { .. } => vec![Point::origin()],
        Shape::Capsule { half_height, .. } => vec![Point::new(0.0, *half_height, 0.0), Point::new(0.0, -*half_height, 0.0)],
        Shape::Cuboid { half_extents } => {
            let h = half_extents;
            vec![
                Point::new(-h.x, -h.y, -h.z),
                Point::new(-h.x, -h.y, h.z),
                Point::new(-h.x, h.y, -h.z),
                Point::new(-h.x, h.y, h.z),
                Point::new(h.x, -h.y, -h.z),
                Point::new(h.x, -h.y, h.z),
                Point::new(h.x, h.y, -h.z),
                Point::new(h.x, h.y, h.z),
            ]
        }
        Shape::Plane { .. } => return None, // two static half-spaces never collide
    };

    let radius = other_shape.radius();
    let mut contacts: ArrayVec<RawContact, 8> = ArrayVec::new();
    for (i, local) in candidate_local_points.iter().enumerate() {
        let world = other_pose.transform_point(local);
        let signed_dist = world_normal.dot(&(world - plane_point)) - radius;
        if signed_dist <= prediction_distance {
            let on_plane = world - world_normal * (signed_dist + radius);
            let on_other = world - world_normal * radius;
            let (point_a, point_b) = if swapped { (on_other, on_plane) } else { (on_plane, on_other) };
            if contacts.try_push(RawContact {
                feature_id: i as u32,
                point_a,
                point_b,
                penetration: -signed_dist,
            }).is_err() {
                break;
            }
        }
    }

    if contacts.is_empty() {
        return None;
    }
    let normal = if swapped { -world_normal } else { world_normal };
    Some((normal, contacts))
}

/// Box-box contact generation via a reduced SAT + Sutherland-Hodgman face clip: find
/// the minimum-penetration separating axis among the 3 face normals of each box and
/// the 9 edge-edge cross products; for a face axis, clip the incident face against
/// the reference face's four side planes; for an edge axis, report the single
/// closest-points-between-segments contact.
fn box_box(
    shape1: &Shape,
    pose1: &Isometry,
    shape2: &Shape,
    pose2: &Isometry,
    prediction_distance: Real,
) -> Option<(Vector, ArrayVec<RawContact, 8>)> {
    let Shape::Cuboid { half_extents: he1 } = shape1 else { unreachable!() };
    let Shape::Cuboid { half_extents: he2 } = shape2 else { unreachable!() };

    let axes1 = [
        pose1.rotation.transform_vector(&Vector::x()),
        pose1.rotation.transform_vector(&Vector::y()),
        pose1.rotation.transform_vector(&Vector::z()),
    ];
    let axes2 = [
        pose2.rotation.transform_vector(&Vector::x()),
        pose2.rotation.transform_vector(&Vector::y()),
        pose2.rotation.transform_vector(&Vector::z()),
    ];

    let center_delta = pose2.translation.vector - pose1.translation.vector;

    let mut best_sep = Real::MIN;
    let mut best_axis = axes1[0];
    let mut best_is_face1 = true;
    let mut best_is_edge = false;
    let mut best_edge_pair = (0usize, 0usize);

    let project_extent = |half_extents: &Vector, axes: &[Vector; 3], dir: &Vector| -> Real {
        half_extents.x * axes[0].dot(dir).abs() + half_extents.y * axes[1].dot(dir).abs() + half_extents.z * axes[2].dot(dir).abs()
    };

    for (i, &axis) in axes1.iter().enumerate() {
        let r1 = project_extent(he1, &axes1, &axis);
        let r2 = project_extent(he2, &axes2, &axis);
        let dist = center_delta.dot(&axis).abs() - r1 - r2;
        if dist > best_sep {
            best_sep = dist;
            best_axis = axis;
            best_is_face1 = true;
            best_is_edge = false;
            let _ = i;
        }
    }
    for &axis in &axes2 {
        let r1 = project_extent(he1, &axes1, &axis);
        let r2 = project_extent(he2, &axes2, &axis);
        let dist = center_delta.dot(&axis).abs() - r1 - r2;
        if dist > best_sep {
            best_sep = dist;
            best_axis = axis;
            best_is_face1 = false;
            best_is_edge = false;
        }
    }
    for (i, &a1) in axes1.iter().enumerate() {
        for (j, &a2) in axes2.iter().enumerate() {
            let mut axis = a1.cross(&a2);
            if axis.norm_squared() < 1e-10 {
                continue;
            }
            axis.normalize_mut();
            let r1 = project_extent(he1, &axes1, &axis);
            let r2 = project_extent(he2, &axes2, &axis);
            let dist = center_delta.dot(&axis).abs() - r1 - r2;
            if dist > best_sep {
                best_sep = dist;
                best_axis = axis;
                best_is_edge = true;
                best_edge_pair = (i, j);
            }
        }
    }

    if best_sep > prediction_distance {
        return None;
    }

    // Orient the axis from box1 toward box2.
    if best_axis.dot(&center_delta) < 0.0 {
        best_axis = -best_axis;
    }

    if best_is_edge {
        let (i, j) = best_edge_pair;
        let p1 = pose1.translation.vector + axes1[i] * (he1[i] * axes1[i].dot(&best_axis).signum());
        let p2 = pose2.translation.vector + axes2[j] * (he2[j] * axes2[j].dot(&best_axis).signum());
        let (c1, c2) = closest_points_on_segments(p1, axes1[i], he1[i], p2, axes2[j], he2[j]);
        let penetration = -best_sep;
        let mut contacts = ArrayVec::new();
        contacts.push(RawContact {
            feature_id: 100 + (i * 3 + j) as u32,
            point_a: c1.into(),
            point_b: c2.into(),
            penetration,
        });
        return Some((best_axis, contacts));
    }

    // Face clip: reference box is whichever face axis won.
    let (ref_pose, ref_he, ref_axes, inc_pose, inc_he, inc_axes, flip) = if best_is_face1 {
        (pose1, he1, &axes1, pose2, he2, &axes2, false)
    } else {
        (pose2, he2, &axes2, pose1, he1, &axes1, true)
    };

    let clipped = clip_incident_face(ref_pose, ref_he, ref_axes, &best_axis, inc_pose, inc_he, inc_axes, prediction_distance - best_sep.min(0.0));
    if clipped.is_empty() {
        return None;
    }

    let mut contacts = ArrayVec::new();
    for (idx, (point_on_inc, depth)) in clipped.into_iter().enumerate() {
        let point_on_ref = point_on_inc - best_axis * depth;
        let (point_a, point_b) = if flip {
            (point_on_inc, point_on_ref)
        } else {
            (point_on_ref, point_on_inc)
        };
        if contacts
            .try_push(RawContact {
                feature_id: idx as u32,
                point_a,
                point_b,
                penetration: depth,
            })
            .is_err()
        {
            break;
        }
    }
    Some((best_axis, contacts))
}

/// Clips the incident box's nearest face against the reference face's four side
/// planes (Sutherland-Hodgman in 2D on the reference face's tangent plane), keeping
/// only points that end up within `max_depth` of penetrating the reference face.
fn clip_incident_face(
    ref_pose: &Isometry,
    ref_he: &Vector,
    ref_axes: &[Vector; 3],
    world_axis: &Vector,
    inc_pose: &Isometry,
    inc_he: &Vector,
    inc_axes: &[Vector; 3],
    max_depth: Real,
) -> Vec<(Point, Real)> {
    // Find which reference axis the separating axis corresponds to (sign and index).
    let ref_axis_idx = (0..3)
        .max_by(|&a, &b| ref_axes[a].dot(world_axis).abs().partial_cmp(&ref_axes[b].dot(world_axis).abs()).unwrap())
        .unwrap();
    let ref_sign = ref_axes[ref_axis_idx].dot(world_axis).signum();
    let ref_face_center = ref_pose.translation.vector + ref_axes[ref_axis_idx] * (ref_he[ref_axis_idx] * ref_sign);

    // Find the incident box's face whose normal is most anti-parallel to world_axis.
    let inc_axis_idx = (0..3)
        .max_by(|&a, &b| inc_axes[a].dot(world_axis).abs().partial_cmp(&inc_axes[b].dot(world_axis).abs()).unwrap())
        .unwrap();
    let inc_sign = -inc_axes[inc_axis_idx].dot(world_axis).signum();

    let other_inc = [0usize, 1, 2].into_iter().filter(|&i| i != inc_axis_idx).collect::<Vec<_>>();
    let mut face_points = Vec::with_capacity(4);
    for &su in &[-1.0, 1.0] {
        for &sv in &[-1.0, 1.0] {
            let mut local = Vector::zeros();
            local[inc_axis_idx] = inc_he[inc_axis_idx] * inc_sign;
            local[other_inc[0]] = inc_he[other_inc[0]] * su;
            local[other_inc[1]] = inc_he[other_inc[1]] * sv;
            face_points.push(inc_pose.translation.vector + inc_axes[0] * local.x + inc_axes[1] * local.y + inc_axes[2] * local.z);
        }
    }

    let other_ref = [0usize, 1, 2].into_iter().filter(|&i| i != ref_axis_idx).collect::<Vec<_>>();
    let tangent_u = ref_axes[other_ref[0]];
    let tangent_v = ref_axes[other_ref[1]];
    let half_u = ref_he[other_ref[0]];
    let half_v = ref_he[other_ref[1]];

    let mut result = Vec::new();
    for p in face_points {
        let rel = p - ref_face_center;
        let u = rel.dot(&tangent_u);
        let v = rel.dot(&tangent_v);
        let depth = rel.dot(&ref_axes[ref_axis_idx]) * -ref_sign;
        if u.abs() <= half_u + 1e-4 && v.abs() <= half_v + 1e-4 && depth <= max_depth.max(0.0) + 1e-3 {
            result.push((Point::from(p), depth));
        }
    }
    result
}

fn closest_points_on_segments(
    p1: Vector,
    dir1: Vector,
    half1: Real,
    p2: Vector,
    dir2: Vector,
    half2: Real,
) -> (Vector, Vector) {
    let a1 = p1 - dir1 * half1;
    let b1 = p1 + dir1 * half1;
    let a2 = p2 - dir2 * half2;
    let b2 = p2 + dir2 * half2;

    let d1 = b1 - a1;
    let d2 = b2 - a2;
    let r = a1 - a2;
    let aa = d1.norm_squared();
    let ee = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if aa <= 1e-10 && ee <= 1e-10 {
        (0.0, 0.0)
    } else if aa <= 1e-10 {
        (0.0, (f / ee).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if ee <= 1e-10 {
            ((-c / aa).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = aa * ee - b * b;
            let s = if denom.abs() > 1e-10 { ((b * f - c * ee) / denom).clamp(0.0, 1.0) } else { 0.0 };
            let t = (b * s + f) / ee;
            let t_clamped = t.clamp(0.0, 1.0);
            let s = if t_clamped != t { ((b * t_clamped - c) / aa).clamp(0.0, 1.0) } else { s };
            (s, t_clamped)
        }
    };

    (a1 + d1 * s, a2 + d2 * t)
}
