//! Iterative constraint relaxation.

use alloc::vec::Vec;

use crate::buffers::ParticleBuffers;
use crate::constraint::{ConstraintKind, DistanceConstraint};
use crate::observer::StepObserver;

/// Gauss-Seidel style relaxation over a fixed list of distance constraints.
///
/// Constraints are visited in creation order on every pass, so the result is
/// deterministic for a given build.
#[derive(Clone, Debug)]
pub struct ConstraintSolver {
    constraints: Vec<DistanceConstraint>,
    iterations: usize,
}

impl ConstraintSolver {
    pub fn new(constraints: Vec<DistanceConstraint>, iterations: usize) -> Self {
        ConstraintSolver { constraints, iterations }
    }

    pub fn relax<O: StepObserver>(&self, particles: &mut ParticleBuffers, observer: &mut O) {
        for i in 0..self.iterations {
            for constraint in self.constraints.iter() {
                constraint.solve(particles, observer);
            }
            observer.on_constraint_iteration(i);
        }
    }

    pub fn iterations(&self) -> usize { self.iterations }
    pub fn constraints(&self) -> &[DistanceConstraint] { &self.constraints }
    pub fn constraint_count(&self) -> usize { self.constraints.len() }

    pub fn count_of(&self, kind: ConstraintKind) -> usize {
        self.constraints.iter().filter(|c| c.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{NoOpStepObserver, StepObserver};
    use alloc::vec;
    use glam::DVec3;

    struct IterationCounter(usize);

    impl StepObserver for IterationCounter {
        fn on_constraint_iteration(&mut self, _iteration: usize) {
            self.0 += 1;
        }
    }

    #[test]
    fn reports_every_pass() {
        let mut particles = ParticleBuffers::new(&[DVec3::ZERO, DVec3::X]);
        let solver = ConstraintSolver::new(
            vec![DistanceConstraint::new(0, 1, 1.0, ConstraintKind::Structural)],
            7,
        );
        let mut counter = IterationCounter(0);
        solver.relax(&mut particles, &mut counter);
        assert_eq!(counter.0, 7);
    }

    #[test]
    fn counts_constraints_per_tier() {
        let solver = ConstraintSolver::new(
            vec![
                DistanceConstraint::new(0, 1, 1.0, ConstraintKind::Structural),
                DistanceConstraint::new(1, 2, 1.0, ConstraintKind::Structural),
                DistanceConstraint::new(0, 2, 2.0, ConstraintKind::Secondary),
            ],
            1,
        );
        assert_eq!(solver.count_of(ConstraintKind::Structural), 2);
        assert_eq!(solver.count_of(ConstraintKind::Secondary), 1);
        assert_eq!(solver.constraint_count(), 3);
    }

    #[test]
    fn chain_converges_with_fixed_anchor() {
        let mut particles = ParticleBuffers::new(&[
            DVec3::ZERO,
            DVec3::new(3.0, 0.0, 0.0),
            DVec3::new(6.0, 0.0, 0.0),
        ]);
        particles.set_fixed(0, true, None);
        let solver = ConstraintSolver::new(
            vec![
                DistanceConstraint::new(0, 1, 1.0, ConstraintKind::Structural),
                DistanceConstraint::new(1, 2, 1.0, ConstraintKind::Structural),
            ],
            200,
        );
        solver.relax(&mut particles, &mut NoOpStepObserver);
        assert_eq!(particles.position(0), DVec3::ZERO);
        assert!((particles.position(0).distance(particles.position(1)) - 1.0).abs() < 1e-6);
        assert!((particles.position(1).distance(particles.position(2)) - 1.0).abs() < 1e-6);
    }
}
