//! Convex primitive shapes and the support-mapping abstraction the narrow phase's
//! GJK routine is built on.
//!
//! Every shape here is expressed as a "core" (a point, a segment, or a box) plus a
//! rounding `radius`; this is the standard "rounded convex" representation used by
//! production GJK/EPA implementations (including `parry`, the geometry crate behind
//! `rapier3d`) and lets a single generic closest-feature routine handle every shape
//! pair instead of an O(shapes^2) table of hand-written routines.

use crate::bounding::Aabb;
use crate::math::{Isometry, Point, Real, Vector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Ball { radius: Real },
    Cuboid { half_extents: Vector },
    Capsule { half_height: Real, radius: Real },
    /// An infinite half-space, `dot(n, x) <= offset`. Static-only: used for ground
    /// planes where an actual (large) box would need face-clipping against an
    /// arbitrary extent.
    Plane { normal: Vector, offset: Real },
}

impl Shape {
    pub fn ball(radius: Real) -> Self {
        Shape::Ball { radius }
    }

    pub fn cuboid(half_extents: Vector) -> Self {
        Shape::Cuboid { half_extents }
    }

    pub fn capsule(half_height: Real, radius: Real) -> Self {
        Shape::Capsule { half_height, radius }
    }

    pub fn plane(normal: Vector, offset: Real) -> Self {
        Shape::Plane {
            normal: normal.normalize(),
            offset,
        }
    }

    pub fn radius(&self) -> Real {
        match self {
            Shape::Ball { radius } => *radius,
            Shape::Capsule { radius, .. } => *radius,
            Shape::Cuboid { .. } | Shape::Plane { .. } => 0.0,
        }
    }

    /// Local-space AABB enclosing the shape.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Shape::Ball { radius } => {
                let r = Vector::repeat(*radius);
                Aabb::new_unchecked((-r).into(), r.into())
            }
            Shape::Cuboid { half_extents } => {
                Aabb::new_unchecked((-half_extents).into(), (*half_extents).into())
            }
            Shape::Capsule { half_height, radius } => {
                let r = Vector::new(*radius, *half_height + *radius, *radius);
                Aabb::new_unchecked((-r).into(), r.into())
            }
            Shape::Plane { .. } => {
                // A half-space has no finite extent; callers special-case planes in
                // the broad phase (they're always static and pre-registered once).
                let big = Vector::repeat(1.0e6);
                Aabb::new_unchecked((-big).into(), big.into())
            }
        }
    }

    /// World-space AABB given the body's pose.
    pub fn world_aabb(&self, pose: &Isometry) -> Aabb {
        match self {
            Shape::Plane { .. } => self.local_aabb(),
            _ => {
                let local = self.local_aabb();
                // Conservative: transform all 8 corners of the local AABB rather than
                // the (cheaper, tighter) rotated-extents formula, trading a few flops
                // for a one-path implementation that's trivially correct for every
                // shape above.
                let corners = [
                    Vector::new(local.mins.x, local.mins.y, local.mins.z),
                    Vector::new(local.mins.x, local.mins.y, local.maxs.z),
                    Vector::new(local.mins.x, local.maxs.y, local.mins.z),
                    Vector::new(local.mins.x, local.maxs.y, local.maxs.z),
                    Vector::new(local.maxs.x, local.mins.y, local.mins.z),
                    Vector::new(local.maxs.x, local.mins.y, local.maxs.z),
                    Vector::new(local.maxs.x, local.maxs.y, local.mins.z),
                    Vector::new(local.maxs.x, local.maxs.y, local.maxs.z),
                ];
                let mut mins = Vector::repeat(Real::MAX);
                let mut maxs = Vector::repeat(Real::MIN);
                for c in corners {
                    let p = pose.transform_point(&Point::from(c));
                    mins = mins.inf(&p.coords);
                    maxs = maxs.sup(&p.coords);
                }
                Aabb::new_unchecked(mins.into(), maxs.into())
            }
        }
    }

    /// Support mapping of this shape's *core* (radius stripped off) in local space:
    /// the furthest point of the core along `dir`. Planes have no finite support and
    /// are handled specially by the narrow phase rather than through GJK.
    pub fn core_support_local(&self, dir: Vector) -> Point {
        match self {
            Shape::Ball { .. } => Point::origin(),
            Shape::Cuboid { half_extents } => Point::new(
                half_extents.x * dir.x.signum(),
                half_extents.y * dir.y.signum(),
                half_extents.z * dir.z.signum(),
            ),
            Shape::Capsule { half_height, .. } => {
                if dir.y >= 0.0 {
                    Point::new(0.0, *half_height, 0.0)
                } else {
                    Point::new(0.0, -*half_height, 0.0)
                }
            }
            Shape::Plane { .. } => Point::origin(),
        }
    }

    /// Is this shape representable as a point/segment/box core suitable for the
    /// generic GJK routine? (Everything except `Plane`.)
    pub fn has_gjk_core(&self) -> bool {
        !matches!(self, Shape::Plane { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_support_picks_correct_corner() {
        let cuboid = Shape::cuboid(Vector::new(1.0, 2.0, 3.0));
        let p = cuboid.core_support_local(Vector::new(-1.0, 1.0, -1.0));
        assert_eq!(p, Point::new(-1.0, 2.0, -3.0));
    }

    #[test]
    fn ball_local_aabb_is_symmetric() {
        let ball = Shape::ball(2.0);
        let aabb = ball.local_aabb();
        assert_eq!(aabb.mins, Point::new(-2.0, -2.0, -2.0));
        assert_eq!(aabb.maxs, Point::new(2.0, 2.0, 2.0));
    }
}
