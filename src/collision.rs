//! Moving spheres that push cloth particles out.

use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffers::ParticleBuffers;
use crate::observer::{DegeneracyKind, StepObserver};

/// Identifies a collision sphere in published frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphereId(pub u32);

/// A sphere gliding from its center toward `destination`.
///
/// `speed` is the fraction of the path added to `progress` every tick; it is
/// not scaled by elapsed time.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionSphere {
    pub id: Option<SphereId>,
    pub center: DVec3,
    pub radius: f64,
    pub destination: DVec3,
    pub speed: f64,
    pub progress: f64,
}

impl CollisionSphere {
    /// A sphere resting at `center`.
    pub fn new(center: DVec3, radius: f64) -> Self {
        CollisionSphere {
            id: None,
            center,
            radius,
            destination: center,
            speed: 0.0,
            progress: 0.0,
        }
    }

    pub fn moving_to(mut self, destination: DVec3, speed: f64) -> Self {
        self.destination = destination;
        self.speed = speed;
        self
    }

    /// Move the center toward the destination by the accumulated progress,
    /// then accumulate `speed`.
    pub fn advance(&mut self) {
        self.center = self.center.lerp(self.destination, self.progress.clamp(0.0, 1.0));
        self.progress += self.speed;
    }

    /// Push a particle at `pos` onto the surface if it is inside.
    ///
    /// Returns `None` when the particle is outside. A particle exactly at the
    /// center has no push direction and is reported as `Some(None)`.
    fn push_out(&self, pos: DVec3) -> Option<Option<DVec3>> {
        let offset = pos - self.center;
        if offset.length() >= self.radius {
            return None;
        }
        Some(offset.try_normalize().map(|dir| self.center + dir * self.radius))
    }
}

/// Advance each sphere and resolve it against every free particle, in order.
pub fn resolve<O: StepObserver>(
    particles: &mut ParticleBuffers,
    spheres: &mut [CollisionSphere],
    observer: &mut O,
) {
    for sphere in spheres.iter_mut() {
        sphere.advance();
        for i in 0..particles.len() {
            if particles.is_fixed(i) {
                continue;
            }
            match sphere.push_out(particles.position(i)) {
                None => {}
                Some(Some(surface)) => particles.set_position(i, surface),
                Some(None) => observer.on_degenerate(DegeneracyKind::SphereCenterHit),
            }
        }
    }
    observer.on_collisions();
}
