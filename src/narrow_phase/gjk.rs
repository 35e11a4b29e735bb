//! Generic closest-feature query between two convex "cores" (point, segment, or box —
//! every `Shape` variant's support geometry with its rounding radius stripped off).
//!
//! Builds a simplex of Minkowski-difference vertices exactly like the textbook GJK
//! loop, but resolves the closest point to the origin on each candidate simplex via
//! direct barycentric projection (vertex/segment/triangle/tetrahedron) rather than
//! Johnson's incremental sub-algorithm — equivalent result, simpler to get right for
//! simplices this small. Falls back to a single-iteration "EPA-lite" (closest
//! tetrahedron face to the origin) when the cores interpenetrate, which is enough
//! precision for the single-point contacts this routine is used for (pairs touching a
//! `Ball` or two `Capsule`s); flat pairs go through `contacts::box_box` instead.

use arrayvec::ArrayVec;

use crate::collider::Shape;
use crate::math::{Isometry, Matrix3x3, Point, Real, Vector};

const MAX_ITERATIONS: u32 = 32;
const CONVERGENCE_EPS: Real = 1e-6;

/// A shape plus the pose placing it in world space; the only two operations the
/// narrow phase needs from a convex primitive.
#[derive(Clone, Copy)]
pub struct ShapeInstance<'a> {
    pub shape: &'a Shape,
    pub pose: &'a Isometry,
}

impl<'a> ShapeInstance<'a> {
    pub fn new(shape: &'a Shape, pose: &'a Isometry) -> Self {
        Self { shape, pose }
    }

    /// World-space support point of the shape's core (radius excluded) along `dir`.
    fn core_support(&self, dir: Vector) -> Point {
        let local_dir = self.pose.inverse_transform_vector(&dir);
        self.pose.transform_point(&self.shape.core_support_local(local_dir))
    }
}

#[derive(Clone, Copy)]
struct SimplexVertex {
    w: Vector,
    on_a: Point,
    on_b: Point,
}

fn support(a: ShapeInstance, b: ShapeInstance, dir: Vector) -> SimplexVertex {
    let on_a = a.core_support(dir);
    let on_b = b.core_support(-dir);
    SimplexVertex {
        w: on_a.coords - on_b.coords,
        on_a,
        on_b,
    }
}

/// Result of a core-to-core query. `distance` is always between the shapes' cores;
/// callers subtract the two radii to get the rounded-convex separation.
pub struct GjkHit {
    pub normal: Vector,
    pub distance: Real,
    pub point_a: Point,
    pub point_b: Point,
}

/// Closest-feature query between two convex cores. Returns `None` if the cores
/// interpenetrate (handled via the bundled EPA-lite fallback instead of a precise
/// distance).
pub fn closest_cores(a: ShapeInstance, b: ShapeInstance) -> Option<GjkHit> {
    let mut dir = b.pose.translation.vector - a.pose.translation.vector;
    if dir.norm_squared() < CONVERGENCE_EPS {
        dir = Vector::x();
    }

    let mut simplex: ArrayVec<SimplexVertex, 4> = ArrayVec::new();
    simplex.push(support(a, b, dir));

    for _ in 0..MAX_ITERATIONS {
        let closest = reduce_simplex(&mut simplex);
        let Some((point, sub_indices)) = closest else {
            // Tetrahedron encloses the origin: cores overlap.
            let verts: Vec<Vector> = simplex.iter().map(|v| v.w).collect();
            let (normal, depth) = epa_lite(&verts);
            let (on_a, on_b) = average_support(&simplex, &(0..simplex.len()).collect::<Vec<_>>());
            return approx_overlap(normal, depth, on_a, on_b);
        };

        retain_indices(&mut simplex, &sub_indices);

        if point.norm_squared() < CONVERGENCE_EPS {
            // Touching (distance ~0) without full enclosure — treat like a shallow
            // overlap with the best normal estimate we have.
            let (on_a, on_b) = average_support(&simplex, &(0..simplex.len()).collect::<Vec<_>>());
            return approx_overlap(-point.normalize_or(Vector::y()), 0.0, on_a, on_b);
        }

        let new_dir = -point;
        let candidate = support(a, b, new_dir);

        let progress = candidate.w.dot(&new_dir) - simplex.iter().map(|v| v.w.dot(&new_dir)).fold(Real::MIN, Real::max);
        if progress < CONVERGENCE_EPS || simplex.len() == 4 {
            let dist = point.norm();
            let weights = barycentric_weights(&simplex, point);
            let (on_a, on_b) = weighted_support(&simplex, &weights);
            return Some(GjkHit {
                normal: (point / dist.max(CONVERGENCE_EPS)).into(),
                distance: dist,
                point_a: on_a,
                point_b: on_b,
            });
        }

        simplex.push(candidate);
    }

    // Hit the iteration cap without converging; report the current best guess.
    let point = reduce_simplex(&mut simplex).map(|(p, _)| p).unwrap_or_else(Vector::zeros);
    let dist = point.norm();
    let weights = barycentric_weights(&simplex, point);
    let (on_a, on_b) = weighted_support(&simplex, &weights);
    Some(GjkHit {
        normal: (point / dist.max(CONVERGENCE_EPS)).into(),
        distance: dist,
        point_a: on_a,
        point_b: on_b,
    })
}

fn approx_overlap(normal: Vector, depth: Real, on_a: Point, on_b: Point) -> Option<GjkHit> {
    Some(GjkHit {
        normal,
        distance: -depth,
        point_a: on_a,
        point_b: on_b,
    })
}

fn average_support(simplex: &[SimplexVertex], indices: &[usize]) -> (Point, Point) {
    let n = indices.len() as Real;
    let mut on_a = Vector::zeros();
    let mut on_b = Vector::zeros();
    for &i in indices {
        on_a += simplex[i].on_a.coords;
        on_b += simplex[i].on_b.coords;
    }
    ((on_a / n).into(), (on_b / n).into())
}

fn weighted_support(simplex: &[SimplexVertex], weights: &[Real]) -> (Point, Point) {
    let mut on_a = Vector::zeros();
    let mut on_b = Vector::zeros();
    for (v, &w) in simplex.iter().zip(weights) {
        on_a += v.on_a.coords * w;
        on_b += v.on_b.coords * w;
    }
    (on_a.into(), on_b.into())
}

/// Recomputes barycentric weights of `point` against the (already reduced) simplex,
/// for recovering the world contact points.
fn barycentric_weights(simplex: &[SimplexVertex], point: Vector) -> Vec<Real> {
    match simplex.len() {
        1 => vec![1.0],
        2 => {
            let (_, w) = closest_on_segment(simplex[0].w, simplex[1].w);
            w.to_vec()
        }
        3 => {
            let (_, w) = closest_on_triangle(simplex[0].w, simplex[1].w, simplex[2].w);
            w.to_vec()
        }
        _ => {
            let _ = point;
            vec![1.0 / simplex.len() as Real; simplex.len()]
        }
    }
}

fn retain_indices(simplex: &mut ArrayVec<SimplexVertex, 4>, indices: &[usize]) {
    let kept: ArrayVec<SimplexVertex, 4> = indices.iter().map(|&i| simplex[i]).collect();
    *simplex = kept;
}

/// Returns the closest point to the origin on the current simplex, and the indices of
/// the minimal sub-simplex supporting it. `None` means the simplex is a tetrahedron
/// enclosing the origin (i.e. the cores overlap).
fn reduce_simplex(simplex: &mut ArrayVec<SimplexVertex, 4>) -> Option<(Vector, ArrayVec<usize, 4>)> {
    match simplex.len() {
        1 => {
            let mut idx = ArrayVec::new();
            idx.push(0);
            Some((simplex[0].w, idx))
        }
        2 => {
            let (p, w) = closest_on_segment(simplex[0].w, simplex[1].w);
            let mut idx = ArrayVec::new();
            for (i, &wi) in w.iter().enumerate() {
                if wi > 0.0 {
                    idx.push(i);
                }
            }
            Some((p, idx))
        }
        3 => {
            let (p, w) = closest_on_triangle(simplex[0].w, simplex[1].w, simplex[2].w);
            let mut idx = ArrayVec::new();
            for (i, &wi) in w.iter().enumerate() {
                if wi > 0.0 {
                    idx.push(i);
                }
            }
            Some((p, idx))
        }
        4 => closest_on_tetrahedron([simplex[0].w, simplex[1].w, simplex[2].w, simplex[3].w]),
        _ => unreachable!("simplex never exceeds 4 vertices"),
    }
}

fn closest_on_segment(a: Vector, b: Vector) -> (Vector, [Real; 2]) {
    let ab = b - a;
    let denom = ab.norm_squared();
    let t = if denom > CONVERGENCE_EPS {
        (-a.dot(&ab) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (a + ab * t, [1.0 - t, t])
}

/// Closest point on triangle `abc` to the origin (Ericson, *Real-Time Collision
/// Detection*, §5.1.5), specialized to a query point fixed at the origin.
fn closest_on_triangle(a: Vector, b: Vector, c: Vector) -> (Vector, [Real; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = -a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0]);
    }

    let bp = -b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = -c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let denom = (d4 - d3) + (d5 - d6);
        let w = (d4 - d3) / denom;
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

fn closest_on_tetrahedron(p: [Vector; 4]) -> Option<(Vector, ArrayVec<usize, 4>)> {
    let a = p[0];
    let m = Matrix3x3::from_columns(&[p[1] - a, p[2] - a, p[3] - a]);
    if let Some(inv) = m.try_inverse() {
        let bary = inv * (-a);
        let (b1, b2, b3) = (bary.x, bary.y, bary.z);
        let b0 = 1.0 - b1 - b2 - b3;
        if b0 >= 0.0 && b1 >= 0.0 && b2 >= 0.0 && b3 >= 0.0 {
            return None; // origin enclosed
        }
    }

    let faces: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    let mut best_dist = Real::MAX;
    let mut best_point = Vector::zeros();
    let mut best_idx: ArrayVec<usize, 4> = ArrayVec::new();
    for face in faces {
        let (pt, bary) = closest_on_triangle(p[face[0]], p[face[1]], p[face[2]]);
        let dist = pt.norm_squared();
        if dist < best_dist {
            best_dist = dist;
            best_point = pt;
            best_idx = face
                .iter()
                .zip(bary.iter())
                .filter(|(_, &w)| w > 0.0)
                .map(|(&i, _)| i)
                .collect();
        }
    }
    Some((best_point, best_idx))
}

/// Single-iteration expanding-polytope step: the penetration normal/depth estimate is
/// the closest of the tetrahedron's four faces to the origin, outward-oriented.
fn epa_lite(p: &[Vector]) -> (Vector, Real) {
    if p.len() < 4 {
        // Degenerate simplex (can happen right at first contact); fall back to a
        // direction away from the simplex centroid.
        let centroid: Vector = p.iter().sum::<Vector>() / (p.len().max(1) as Real);
        let normal = (-centroid).normalize_or(Vector::y());
        return (normal, 0.0);
    }

    let faces: [[usize; 4]; 4] = [[0, 1, 2, 3], [0, 1, 3, 2], [0, 2, 3, 1], [1, 2, 3, 0]];
    let mut best_depth = Real::MAX;
    let mut best_normal = Vector::y();
    for f in faces {
        let (a, b, c, opposite) = (p[f[0]], p[f[1]], p[f[2]], p[f[3]]);
        let mut n = (b - a).cross(&(c - a));
        if n.norm_squared() < 1e-12 {
            continue;
        }
        n.normalize_mut();
        if n.dot(&(opposite - a)) > 0.0 {
            n = -n;
        }
        let depth = n.dot(&(-a)).abs();
        if depth < best_depth {
            best_depth = depth;
            best_normal = n;
        }
    }
    (best_normal, best_depth)
}

trait NormalizeOr {
    fn normalize_or(self, fallback: Vector) -> Vector;
}

impl NormalizeOr for Vector {
    fn normalize_or(self, fallback: Vector) -> Vector {
        if self.norm_squared() > CONVERGENCE_EPS {
            self.normalize()
        } else {
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::Shape;
    use approx::assert_relative_eq;

    #[test]
    fn separated_spheres_report_gap() {
        let shape_a = Shape::ball(1.0);
        let shape_b = Shape::ball(1.0);
        let pose_a = Isometry::identity();
        let pose_b = Isometry::translation(5.0, 0.0, 0.0);
        let hit = closest_cores(ShapeInstance::new(&shape_a, &pose_a), ShapeInstance::new(&shape_b, &pose_b)).unwrap();
        // Cores here are points (ball core is the origin), so distance is exactly 5.
        assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn overlapping_balls_report_negative_distance() {
        let shape_a = Shape::ball(1.0);
        let shape_b = Shape::ball(1.0);
        let pose_a = Isometry::identity();
        let pose_b = Isometry::translation(0.05, 0.0, 0.0);
        let hit = closest_cores(ShapeInstance::new(&shape_a, &pose_a), ShapeInstance::new(&shape_b, &pose_b)).unwrap();
        assert!(hit.distance <= 0.0);
    }
}
