//! Configuration knobs (spec §6), gathered into plain structs instead of the
//! `public static Entity Entity` / `static float cellSizeInverse` globals the source
//! used (Design Note "Global mutable state"). Both structs are threaded explicitly
//! through `Space` and its subsystems; nothing here is a `static`.

use crate::math::{Real, Vector};

/// Broad-phase and character-controller knobs that rarely change once a `Space` is
/// built, analogous to rapier's own long-lived configuration split from per-step
/// solver parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Grid quantum on the (Y, Z) plane, spec default 8.0.
    pub cell_size: Real,
    pub gravity: Vector,
    pub character: CharacterConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: 8.0,
            gravity: Vector::new(0.0, -9.81, 0.0),
            character: CharacterConfig::default(),
        }
    }
}

impl WorldConfig {
    #[inline]
    pub fn inv_cell_size(&self) -> Real {
        1.0 / self.cell_size
    }
}

/// Character-controller knobs (spec §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterConfig {
    pub jump_speed: Real,
    pub sliding_jump_speed: Real,
    pub jump_force_factor: Real,
    pub glue_speed: Real,
    pub maximum_step_height: Real,
    pub collision_margin: Real,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            jump_speed: 4.5,
            sliding_jump_speed: 3.0,
            jump_force_factor: 1.0,
            glue_speed: 1.0,
            maximum_step_height: 0.5,
            collision_margin: 0.1,
        }
    }
}

/// Per-step solver and narrow-phase parameters, mirroring rapier's
/// `IntegrationParameters`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationParameters {
    pub dt: Real,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// Below this penetration depth, no position correction is applied (spec §6).
    pub allowed_penetration: Real,
    /// How far ahead of their AABB fast-moving bodies are allowed to be predicted
    /// for broad-phase purposes.
    pub prediction_distance: Real,
    /// Baumgarte error-correction factor applied to contact position bias.
    pub erp: Real,
    /// Minimum number of dynamic bodies before an island is split off on its own
    /// rather than folded into a neighboring one; mirrors rapier's
    /// `min_island_size` (kept at 1 here: we do not merge small islands).
    pub min_island_size: usize,
}

impl Default for IntegrationParameters {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            velocity_iterations: 10,
            position_iterations: 2,
            allowed_penetration: 0.01,
            prediction_distance: 0.002,
            erp: 0.2,
            min_island_size: 1,
        }
    }
}

impl IntegrationParameters {
    #[inline]
    pub fn inv_dt(&self) -> Real {
        if self.dt > 0.0 {
            1.0 / self.dt
        } else {
            0.0
        }
    }

    /// Fraction of positional error corrected into velocity bias per step.
    #[inline]
    pub fn erp_inv_dt(&self) -> Real {
        self.erp * self.inv_dt()
    }
}
