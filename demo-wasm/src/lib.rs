use drape::glam::DVec3;
use drape::{
    ClothConfig, ClothSimulation, CollisionSphere, FixedParticle, ForceUpdate, Frame, GravityFrame,
    NoOpStepObserver,
};
use wasm_bindgen::prelude::*;

// ---- Cloth Demo ----

/// Browser-side cloth, stepped from `requestAnimationFrame` instead of a thread.
#[wasm_bindgen]
pub struct ClothDemo {
    sim: ClothSimulation,
    frame: Frame,
    grabbed: Option<(usize, usize)>,
}

#[wasm_bindgen]
impl ClothDemo {
    /// A `width x height` cloth hanging from its two top corners.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, spacing: f64) -> Result<ClothDemo, JsError> {
        let config = ClothConfig::new([
            DVec3::new(0.0, 0.0, height),
            DVec3::new(width, 0.0, height),
            DVec3::new(width, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 0.0),
        ])
        .with_spacing(spacing, spacing)
        .with_iterations(8)
        .with_gravity_frame(GravityFrame::World)
        .with_gravity(DVec3::Z)
        .with_time_step(0.1);

        let mut sim = ClothSimulation::build(&config).map_err(|e| JsError::new(&e.to_string()))?;
        let right = sim.width() - 1;
        sim.apply(ForceUpdate::fixed(vec![FixedParticle::pin(0, 0), FixedParticle::pin(right, 0)]))
            .map_err(|e| JsError::new(&e.to_string()))?;
        let frame = sim.publish();
        Ok(ClothDemo { sim, frame, grabbed: None })
    }

    pub fn update(&mut self) {
        self.frame = self.sim.tick(&mut NoOpStepObserver);
    }

    pub fn set_wind(&mut self, x: f64, y: f64, z: f64) {
        let _ = self.sim.apply(ForceUpdate::wind(DVec3::new(x, y, z)));
    }

    /// Launch a sphere from `(x, y, z)` toward `(tx, ty, tz)`, replacing any previous one.
    #[allow(clippy::too_many_arguments)]
    pub fn throw_sphere(&mut self, x: f64, y: f64, z: f64, radius: f64, tx: f64, ty: f64, tz: f64, speed: f64) {
        let sphere = CollisionSphere::new(DVec3::new(x, y, z), radius).moving_to(DVec3::new(tx, ty, tz), speed);
        let _ = self.sim.apply(ForceUpdate::spheres(vec![sphere]));
    }

    /// Pin the particle nearest to the point and drag it there.
    pub fn grab(&mut self, x: f64, y: f64, z: f64) -> bool {
        let point = DVec3::new(x, y, z);
        let target = self.grabbed.or_else(|| self.sim.grid_coordinate(point));
        let Some((gx, gy)) = target else {
            return false;
        };
        self.grabbed = Some((gx, gy));
        self.sim.set_fixed(FixedParticle::pin_at(gx, gy, point)).is_ok()
    }

    pub fn release(&mut self) {
        if let Some((x, y)) = self.grabbed.take() {
            let _ = self.sim.set_fixed(FixedParticle::release(x, y));
        }
    }

    /// High halves of `x, y, z` positions, for RTC rendering.
    pub fn positions_high(&self) -> Vec<f32> {
        self.frame.data.positions_high.clone()
    }

    pub fn positions_low(&self) -> Vec<f32> {
        self.frame.data.positions_low.clone()
    }

    pub fn normals(&self) -> Vec<f32> {
        self.frame.data.normals.clone()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.frame.topology.indices.clone()
    }

    pub fn uvs(&self) -> Vec<f32> {
        self.frame.topology.uvs.clone()
    }

    /// Returns [x, y, z, radius] of the current sphere, or an empty array.
    pub fn sphere(&self) -> Vec<f64> {
        self.frame
            .spheres
            .first()
            .map(|s| vec![s.center.x, s.center.y, s.center.z, s.radius])
            .unwrap_or_default()
    }

    pub fn width(&self) -> usize {
        self.frame.width
    }

    pub fn height(&self) -> usize {
        self.frame.height
    }
}
