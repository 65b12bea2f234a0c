//! Gravity and aerodynamic wind.

use glam::{DMat3, DVec3};

use crate::buffers::ParticleBuffers;
use crate::config::GravityFrame;
use crate::normals::triangle_normal;
use crate::observer::{DegeneracyKind, StepObserver};

/// Wind steps between noise injections.
pub const WIND_NOISE_PERIOD: u32 = 1000;
/// Added to the two horizontal wind components on a noise step.
pub const WIND_NOISE: f64 = 0.001;

const WGS84_RADII_SQ: DVec3 = DVec3::new(
    6_378_137.0 * 6_378_137.0,
    6_378_137.0 * 6_378_137.0,
    6_356_752.314_245_179 * 6_356_752.314_245_179,
);

/// East/north/up frame of the ellipsoid surface normal under `origin`.
///
/// Returns `None` at the earth's center, where there is no surface normal.
pub fn east_north_up(origin: DVec3) -> Option<DMat3> {
    let up = (origin / WGS84_RADII_SQ).try_normalize()?;
    let east = DVec3::new(-origin.y, origin.x, 0.0).try_normalize().unwrap_or(DVec3::X);
    let north = up.cross(east);
    Some(DMat3::from_cols(east, north, up))
}

/// Accumulates gravity and wind into particle acceleration each tick.
#[derive(Clone, Debug)]
pub struct ForceModel {
    pub gravity: DVec3,
    pub wind: DVec3,
    frame: DMat3,
    wind_steps: u32,
}

impl ForceModel {
    /// Forces anchored at corner `anchor`.
    pub fn new(gravity: DVec3, wind: DVec3, gravity_frame: GravityFrame, anchor: DVec3) -> Self {
        let frame = match gravity_frame {
            GravityFrame::EastNorthUp => east_north_up(anchor).unwrap_or(DMat3::IDENTITY),
            GravityFrame::World => DMat3::IDENTITY,
        };
        ForceModel { gravity, wind, frame, wind_steps: 0 }
    }

    /// Per-particle gravity acceleration, or `None` when gravity is off.
    pub fn gravity_acceleration(&self, time_step: f64) -> Option<DVec3> {
        if self.gravity == DVec3::ZERO {
            return None;
        }
        let world = (self.frame * self.gravity).try_normalize()?;
        Some(world * -time_step)
    }

    /// Wind for the next step. Every `WIND_NOISE_PERIOD`th call adds noise.
    fn next_wind(&mut self) -> DVec3 {
        self.wind_steps += 1;
        if self.wind_steps >= WIND_NOISE_PERIOD {
            self.wind_steps = 0;
            self.wind + DVec3::new(WIND_NOISE, WIND_NOISE, 0.0)
        } else {
            self.wind
        }
    }

    pub fn apply<O: StepObserver>(
        &mut self,
        particles: &mut ParticleBuffers,
        indices: &[u32],
        time_step: f64,
        observer: &mut O,
    ) {
        if let Some(gravity) = self.gravity_acceleration(time_step) {
            let gravity = gravity.as_vec3();
            for i in 0..particles.len() {
                particles.add_acceleration(i, gravity);
            }
        }

        if self.wind != DVec3::ZERO {
            let wind = self.next_wind();
            for tri in indices.chunks_exact(3) {
                let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                let Some(normal) =
                    triangle_normal(particles.position(a), particles.position(b), particles.position(c))
                else {
                    observer.on_degenerate(DegeneracyKind::DegenerateTriangle);
                    continue;
                };
                let force = (normal * normal.dot(wind)).as_vec3();
                particles.add_acceleration(a, force);
                particles.add_acceleration(b, force);
                particles.add_acceleration(c, force);
            }
        }

        observer.on_forces();
    }
}
