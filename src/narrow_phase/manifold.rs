//! Persistent contact manifolds (spec §3, §4.D): up to four points per pair, with
//! feature-id matching across frames so the solver's warm start has something to
//! reuse.

use arrayvec::ArrayVec;

use crate::body::RigidBodyHandle;
use crate::collider::ColliderHandle;
use crate::math::{Point, Real, Vector};

/// A single contact, carrying the accumulated impulses the solver warm-starts from.
/// `feature_id` is the persistence key: clipped manifolds derive it from
/// (reference-face index, incident-vertex index); single-point manifolds use `0`.
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    pub feature_id: u32,
    pub point_a: Point,
    pub point_b: Point,
    pub penetration: Real,
    pub normal_impulse: Real,
    pub tangent_impulse: [Real; 2],
}

impl ContactPoint {
    fn fresh(feature_id: u32, point_a: Point, point_b: Point, penetration: Real) -> Self {
        Self {
            feature_id,
            point_a,
            point_b,
            penetration,
            normal_impulse: 0.0,
            tangent_impulse: [0.0, 0.0],
        }
    }
}

/// A raw candidate contact produced by shape-pair dispatch, before manifold
/// persistence (impulse carry-forward) and the four-point reduction are applied.
#[derive(Debug, Clone, Copy)]
pub struct RawContact {
    pub feature_id: u32,
    pub point_a: Point,
    pub point_b: Point,
    pub penetration: Real,
}

/// Persistent contact set between exactly one collider pair.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    /// Parent bodies, refreshed alongside the manifold each step so the solver can
    /// address both ends of the constraint without going back through `ColliderSet`.
    pub body1: RigidBodyHandle,
    pub body2: RigidBodyHandle,
    /// Shared contact normal, pointing from collider1 to collider2.
    pub normal: Vector,
    pub points: ArrayVec<ContactPoint, 4>,
}

impl ContactManifold {
    pub fn new(collider1: ColliderHandle, collider2: ColliderHandle, body1: RigidBodyHandle, body2: RigidBodyHandle) -> Self {
        Self {
            collider1,
            collider2,
            body1,
            body2,
            normal: Vector::y(),
            points: ArrayVec::new(),
        }
    }

    pub fn is_touching(&self) -> bool {
        !self.points.is_empty()
    }

    /// Replaces the manifold's contents with freshly generated candidates, carrying
    /// forward accumulated impulses for any feature id that survives from the
    /// previous frame (spec §3/§4.D: "retained contacts carry forward their
    /// accumulated impulses; new contacts start at zero").
    pub fn update(&mut self, normal: Vector, mut candidates: Vec<RawContact>) {
        self.normal = normal;

        let reduced = reduce_to_four(&mut candidates, normal);

        let previous = std::mem::take(&mut self.points);
        for raw in reduced {
            let mut point = ContactPoint::fresh(raw.feature_id, raw.point_a, raw.point_b, raw.penetration);
            if let Some(old) = previous.iter().find(|p| p.feature_id == raw.feature_id) {
                point.normal_impulse = old.normal_impulse;
                point.tangent_impulse = old.tangent_impulse;
            }
            // `reduce_to_four` never yields more than 4 candidates.
            let _ = self.points.try_push(point);
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Reduces an arbitrary candidate list to at most four, maximizing the manifold's
/// spanned area: keep the deepest point, then repeatedly add whichever remaining
/// candidate maximizes the signed triangle area against the points already kept
/// (spec §4.D's "deepest contact + three that maximize signed triangle area").
fn reduce_to_four(candidates: &mut Vec<RawContact>, normal: Vector) -> ArrayVec<RawContact, 4> {
    let mut kept: ArrayVec<RawContact, 4> = ArrayVec::new();
    if candidates.is_empty() {
        return kept;
    }
    if candidates.len() <= 4 {
        kept.extend(candidates.iter().copied());
        return kept;
    }

    let (tangent1, tangent2) = crate::math::orthonormal_basis(normal);
    let project = |p: Point| Vector::new(p.coords.dot(&tangent1), p.coords.dot(&tangent2), 0.0);

    let deepest = candidates
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.penetration.partial_cmp(&b.penetration).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    kept.push(candidates.remove(deepest));

    while kept.len() < 4 && !candidates.is_empty() {
        let kept_2d: Vec<Vector> = kept.iter().map(|c| project(c.point_a)).collect();
        let mut best_idx = 0;
        let mut best_area = -1.0;
        for (i, cand) in candidates.iter().enumerate() {
            let p = project(cand.point_a);
            let area = signed_area_gain(&kept_2d, p);
            if area > best_area {
                best_area = area;
                best_idx = i;
            }
        }
        kept.push(candidates.remove(best_idx));
    }

    kept
}

/// Sum of absolute signed areas of the triangles formed by `point` and each
/// consecutive pair of already-kept points; a cheap proxy for "how much does adding
/// this point grow the manifold's hull".
fn signed_area_gain(kept: &[Vector], point: Vector) -> Real {
    if kept.len() < 2 {
        return kept.iter().map(|k| (point - k).norm()).sum();
    }
    let mut total = 0.0;
    for i in 0..kept.len() {
        let a = kept[i];
        let b = kept[(i + 1) % kept.len()];
        total += ((b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x)).abs();
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point;

    fn raw(id: u32, x: Real, y: Real, pen: Real) -> RawContact {
        RawContact {
            feature_id: id,
            point_a: Point::new(x, y, 0.0),
            point_b: Point::new(x, y, 0.0),
            penetration: pen,
        }
    }

    #[test]
    fn reduce_to_four_keeps_all_when_already_small() {
        let mut candidates = vec![raw(0, 0.0, 0.0, 0.1), raw(1, 1.0, 0.0, 0.2)];
        let reduced = reduce_to_four(&mut candidates, Vector::y());
        assert_eq!(reduced.len(), 2);
    }

    #[test]
    fn reduce_to_four_caps_at_four() {
        let mut candidates: Vec<RawContact> = (0..8)
            .map(|i| raw(i, (i as Real).cos(), (i as Real).sin(), i as Real * 0.01))
            .collect();
        let reduced = reduce_to_four(&mut candidates, Vector::y());
        assert_eq!(reduced.len(), 4);
    }

    #[test]
    fn warm_start_carries_across_feature_id() {
        let mut bodies = crate::body::RigidBodySet::new();
        let mut colliders = crate::collider::ColliderSet::new();
        let body1 = bodies.insert(crate::body::RigidBody::new_static(Vector::zeros())).unwrap();
        let body2 = bodies.insert(crate::body::RigidBody::new_static(Vector::zeros())).unwrap();
        let collider1 = colliders.insert(crate::collider::Collider::new(body1, crate::collider::Shape::ball(1.0)));
        let collider2 = colliders.insert(crate::collider::Collider::new(body2, crate::collider::Shape::ball(1.0)));

        let mut manifold = ContactManifold::new(collider1, collider2, body1, body2);
        manifold.update(Vector::y(), vec![raw(42, 0.0, 0.0, 0.1)]);
        manifold.points[0].normal_impulse = 3.5;
        manifold.update(Vector::y(), vec![raw(42, 0.01, 0.0, 0.1)]);
        assert_eq!(manifold.points[0].normal_impulse, 3.5);
    }
}
