//! Verlet time stepping.

use crate::buffers::ParticleBuffers;

/// Advance every free particle one step.
///
/// `next = current + (current - previous) * (1 - damping) + acceleration * dt^2`.
/// Acceleration is consumed. Fixed particles are skipped entirely.
pub fn integrate(particles: &mut ParticleBuffers, damping: f64, time_step: f64) {
    let dt_sq = time_step * time_step;
    let keep = 1.0 - damping;
    for i in 0..particles.len() {
        if particles.is_fixed(i) {
            continue;
        }
        let current = particles.position(i);
        let velocity = (current - particles.previous(i)) * keep;
        let next = current + velocity + particles.acceleration(i).as_dvec3() * dt_sq;
        particles.set_previous(i, current);
        particles.set_position(i, next);
        particles.clear_acceleration(i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec3, Vec3};

    #[test]
    fn resting_particle_moves_by_a_dt_squared() {
        let mut particles = ParticleBuffers::new(&[DVec3::new(1.0, 2.0, 3.0)]);
        particles.add_acceleration(0, Vec3::new(0.0, -2.0, 0.5));
        integrate(&mut particles, 0.0, 0.1);
        let moved = particles.position(0) - DVec3::new(1.0, 2.0, 3.0);
        assert!((moved - DVec3::new(0.0, -0.02, 0.005)).length() < 1e-9);
        assert_eq!(particles.previous(0), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(particles.acceleration(0), Vec3::ZERO);
    }

    #[test]
    fn velocity_carries_over() {
        let mut particles = ParticleBuffers::new(&[DVec3::ZERO]);
        particles.set_previous(0, DVec3::new(-1.0, 0.0, 0.0));
        integrate(&mut particles, 0.0, 1.0);
        assert_eq!(particles.position(0), DVec3::new(1.0, 0.0, 0.0));
        integrate(&mut particles, 0.5, 1.0);
        assert_eq!(particles.position(0), DVec3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn fixed_particle_is_untouched() {
        let mut particles = ParticleBuffers::new(&[DVec3::ONE]);
        particles.set_previous(0, DVec3::ZERO);
        particles.set_fixed(0, true, None);
        integrate(&mut particles, 0.0, 1.0);
        assert_eq!(particles.position(0), DVec3::ONE);
        assert_eq!(particles.previous(0), DVec3::ZERO);
    }
}
