//! Fixed-distance links between cloth particles.

use crate::buffers::ParticleBuffers;
use crate::observer::{DegeneracyKind, StepObserver};

/// Which tier of the grid a constraint belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Immediate neighbours: horizontal, vertical and both diagonals.
    Structural,
    /// Distance-2 neighbours, resisting shear and bending.
    Secondary,
}

/// Keeps two particles at the distance they had when the cloth was built.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DistanceConstraint {
    pub a: usize,
    pub b: usize,
    pub rest_distance: f64,
    pub kind: ConstraintKind,
}

impl DistanceConstraint {
    pub fn new(a: usize, b: usize, rest_distance: f64, kind: ConstraintKind) -> Self {
        DistanceConstraint { a, b, rest_distance, kind }
    }

    /// Link `a` and `b` at their current separation.
    pub fn from_particles(a: usize, b: usize, particles: &ParticleBuffers, kind: ConstraintKind) -> Self {
        let rest_distance = particles.position(a).distance(particles.position(b));
        DistanceConstraint { a, b, rest_distance, kind }
    }

    /// Move both endpoints halfway toward the rest distance. Fixed endpoints stay put.
    pub fn solve<O: StepObserver>(&self, particles: &mut ParticleBuffers, observer: &mut O) {
        let a_pos = particles.position(self.a);
        let b_pos = particles.position(self.b);

        let delta = b_pos - a_pos;
        let dist = delta.length();
        if dist < 1e-12 {
            observer.on_degenerate(DegeneracyKind::CoincidentConstraint);
            return;
        }

        let correction = delta * ((1.0 - self.rest_distance / dist) * 0.5);

        if !particles.is_fixed(self.a) {
            particles.set_position(self.a, a_pos + correction);
        }
        if !particles.is_fixed(self.b) {
            particles.set_position(self.b, b_pos - correction);
        }
    }
}
