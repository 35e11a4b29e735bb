//! Per-body sleep/wake bookkeeping.
//!
//! Ported from the original BEPUphysics `ActivationManager`'s energy mixing scheme
//! (`examples/loafofpiecrust-nphysics/src/detection/activation_manager.rs`): a running,
//! exponentially-mixed estimate of kinetic energy that, once it drops and stays below
//! a threshold for an entire island, lets the island go to sleep.

use crate::math::Real;

const DEFAULT_THRESHOLD: Real = 0.01;
const DEFAULT_MIX_FACTOR: Real = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation {
    pub energy: Real,
    pub threshold: Real,
    pub mix_factor: Real,
    pub sleeping: bool,
}

impl Activation {
    pub fn new() -> Self {
        Self {
            energy: DEFAULT_THRESHOLD * 4.0,
            threshold: DEFAULT_THRESHOLD,
            mix_factor: DEFAULT_MIX_FACTOR,
            sleeping: false,
        }
    }

    /// A body that never needs to sleep (static bodies) or that starts asleep.
    pub fn asleep() -> Self {
        Self {
            sleeping: true,
            ..Self::new()
        }
    }

    /// Exponentially mixes the previous energy estimate with the instantaneous
    /// `v.v + w.w`, clamped so a single high-velocity impact can't leave the energy
    /// pinned far above the threshold forever.
    pub fn update_energy(&mut self, instantaneous: Real) {
        let mixed = (1.0 - self.mix_factor) * self.energy + self.mix_factor * instantaneous;
        self.energy = mixed.min(self.threshold * 4.0);
    }

    pub fn wake_up(&mut self) {
        self.sleeping = false;
        self.energy = self.threshold * 2.0;
    }

    pub fn sleep(&mut self) {
        self.sleeping = true;
        self.energy = 0.0;
    }

    pub fn is_below_threshold(&self) -> bool {
        self.energy < self.threshold
    }
}

impl Default for Activation {
    fn default() -> Self {
        Self::new()
    }
}
