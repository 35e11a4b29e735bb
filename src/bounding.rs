//! Axis-aligned bounding boxes.
//!
//! Unlike shape geometry (delegated to the narrow phase's own convex tests), the
//! `Aabb` type and its invariants are part of the hard core per spec §3: `min <= max`
//! componentwise after every refresh, and it must enclose the swept motion of a
//! continuously-updated body.

use crate::errors::{PhysicsError, PhysicsResult};
use crate::math::{Point, Real, Vector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub mins: Point,
    pub maxs: Point,
}

impl Aabb {
    pub fn new(mins: Point, maxs: Point) -> PhysicsResult<Self> {
        let aabb = Self { mins, maxs };
        aabb.validate()?;
        Ok(aabb)
    }

    /// Builds an AABB without validating it; used internally where the inputs are
    /// already known-good (e.g. computed from a shape's own extents).
    pub(crate) fn new_unchecked(mins: Point, maxs: Point) -> Self {
        Self { mins, maxs }
    }

    fn validate(&self) -> PhysicsResult<()> {
        let ok = (0..3).all(|i| self.mins[i].is_finite() && self.maxs[i].is_finite() && self.mins[i] <= self.maxs[i]);
        if ok {
            Ok(())
        } else {
            Err(PhysicsError::InvalidAabb {
                min: [self.mins.x, self.mins.y, self.mins.z],
                max: [self.maxs.x, self.maxs.y, self.maxs.z],
            })
        }
    }

    pub fn center(&self) -> Point {
        nalgebra::center(&self.mins, &self.maxs)
    }

    pub fn half_extents(&self) -> Vector {
        (self.maxs - self.mins) * 0.5
    }

    pub fn loosened(&self, margin: Real) -> Self {
        let m = Vector::repeat(margin);
        Self {
            mins: self.mins - m,
            maxs: self.maxs + m,
        }
    }

    pub fn merged(&self, other: &Aabb) -> Self {
        Self {
            mins: self.mins.coords.inf(&other.mins.coords).into(),
            maxs: self.maxs.coords.sup(&other.maxs.coords).into(),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.mins[i] <= other.maxs[i] && other.mins[i] <= self.maxs[i])
    }

    pub fn intersects_axes(&self, other: &Aabb, axes: &[usize]) -> bool {
        axes.iter()
            .all(|&i| self.mins[i] <= other.maxs[i] && other.mins[i] <= self.maxs[i])
    }

    /// Extends `self` to also enclose `self` translated by `displacement`, i.e. the
    /// swept volume of a body moving by `displacement` this step (spec §3,
    /// `PositionUpdateMode::Continuous`).
    pub fn swept(&self, displacement: Vector) -> Self {
        let translated = Self {
            mins: self.mins + displacement,
            maxs: self.maxs + displacement,
        };
        self.merged(&translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_aabb() {
        let result = Aabb::new(Point::new(1.0, 0.0, 0.0), Point::new(0.0, 1.0, 1.0));
        assert!(matches!(result, Err(PhysicsError::InvalidAabb { .. })));
    }

    #[test]
    fn swept_aabb_encloses_motion() {
        let aabb = Aabb::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0)).unwrap();
        let swept = aabb.swept(Vector::new(5.0, 0.0, 0.0));
        assert!(swept.mins.x <= 0.0 && swept.maxs.x >= 6.0);
    }
}
