//! Step observer trait for monitoring the simulation pipeline.

/// A numeric degeneracy that was skipped instead of producing NaN.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DegeneracyKind {
    /// Two constrained particles occupied the same point.
    CoincidentConstraint,
    /// A triangle had zero area, so it has no normal.
    DegenerateTriangle,
    /// A vertex accumulated a zero-length normal.
    ZeroNormal,
    /// A particle sat exactly on a collision sphere center.
    SphereCenterHit,
}

/// Trait for observing simulation ticks.
///
/// Implement this trait to monitor solver progress (e.g., for debugging,
/// visualization, or performance profiling). All methods have default
/// no-op implementations.
pub trait StepObserver {
    /// Called after gravity and wind have been accumulated.
    fn on_forces(&mut self) {}

    /// Called after each constraint relaxation pass.
    fn on_constraint_iteration(&mut self, _iteration: usize) {}

    /// Called after all free particles have been integrated.
    fn on_integrate(&mut self) {}

    /// Called after collision spheres have moved and pushed particles out.
    fn on_collisions(&mut self) {}

    /// Called when a tick is fully complete.
    fn on_step_complete(&mut self, _step: u64) {}

    /// Called whenever a degenerate contribution is skipped.
    fn on_degenerate(&mut self, _kind: DegeneracyKind) {}
}

/// A no-op observer that does nothing. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}

/// Running totals of skipped degeneracies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardCounters {
    pub coincident_constraints: u64,
    pub degenerate_triangles: u64,
    pub zero_normals: u64,
    pub sphere_center_hits: u64,
}

impl GuardCounters {
    pub fn total(&self) -> u64 {
        self.coincident_constraints + self.degenerate_triangles + self.zero_normals + self.sphere_center_hits
    }
}

impl StepObserver for GuardCounters {
    fn on_degenerate(&mut self, kind: DegeneracyKind) {
        match kind {
            DegeneracyKind::CoincidentConstraint => self.coincident_constraints += 1,
            DegeneracyKind::DegenerateTriangle => self.degenerate_triangles += 1,
            DegeneracyKind::ZeroNormal => self.zero_normals += 1,
            DegeneracyKind::SphereCenterHit => self.sphere_center_hits += 1,
        }
    }
}

/// Forwards every hook to `inner` while counting degeneracies.
pub(crate) struct Counting<'a, O: StepObserver> {
    pub counters: &'a mut GuardCounters,
    pub inner: &'a mut O,
}

impl<O: StepObserver> StepObserver for Counting<'_, O> {
    fn on_forces(&mut self) {
        self.inner.on_forces();
    }

    fn on_constraint_iteration(&mut self, iteration: usize) {
        self.inner.on_constraint_iteration(iteration);
    }

    fn on_integrate(&mut self) {
        self.inner.on_integrate();
    }

    fn on_collisions(&mut self) {
        self.inner.on_collisions();
    }

    fn on_step_complete(&mut self, step: u64) {
        self.inner.on_step_complete(step);
    }

    fn on_degenerate(&mut self, kind: DegeneracyKind) {
        self.counters.on_degenerate(kind);
        self.inner.on_degenerate(kind);
    }
}
