//! Structure-of-arrays particle storage.
//!
//! Every per-particle quantity lives in its own flat buffer. Vector buffers
//! hold `x, y, z` triples, so particle `i = y * width + x` occupies
//! `3 * i .. 3 * i + 3`.

use alloc::vec;
use alloc::vec::Vec;

use glam::{DVec3, Vec3};

/// Particle state for one cloth.
#[derive(Clone, Debug)]
pub struct ParticleBuffers {
    positions: Vec<f64>,
    previous: Vec<f64>,
    acceleration: Vec<f32>,
    normals: Vec<f32>,
    fixed: Vec<bool>,
}

impl ParticleBuffers {
    /// Create buffers for particles resting at `positions`.
    pub fn new(positions: &[DVec3]) -> Self {
        let count = positions.len();
        let mut flat = Vec::with_capacity(count * 3);
        for p in positions {
            flat.extend_from_slice(&[p.x, p.y, p.z]);
        }
        ParticleBuffers {
            previous: flat.clone(),
            positions: flat,
            acceleration: vec![0.0; count * 3],
            normals: vec![0.0; count * 3],
            fixed: vec![false; count],
        }
    }

    pub fn len(&self) -> usize {
        self.fixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty()
    }

    pub fn position(&self, index: usize) -> DVec3 {
        DVec3::from_slice(&self.positions[3 * index..3 * index + 3])
    }

    pub fn set_position(&mut self, index: usize, pos: DVec3) {
        pos.write_to_slice(&mut self.positions[3 * index..3 * index + 3]);
    }

    pub fn previous(&self, index: usize) -> DVec3 {
        DVec3::from_slice(&self.previous[3 * index..3 * index + 3])
    }

    pub fn set_previous(&mut self, index: usize, pos: DVec3) {
        pos.write_to_slice(&mut self.previous[3 * index..3 * index + 3]);
    }

    pub fn acceleration(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.acceleration[3 * index..3 * index + 3])
    }

    /// Accumulate acceleration on a free particle. Fixed particles ignore it.
    pub fn add_acceleration(&mut self, index: usize, accel: Vec3) {
        if self.fixed[index] {
            return;
        }
        let slot = &mut self.acceleration[3 * index..3 * index + 3];
        slot[0] += accel.x;
        slot[1] += accel.y;
        slot[2] += accel.z;
    }

    pub fn clear_acceleration(&mut self, index: usize) {
        self.acceleration[3 * index..3 * index + 3].fill(0.0);
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.normals[3 * index..3 * index + 3])
    }

    pub fn set_normal(&mut self, index: usize, normal: Vec3) {
        normal.write_to_slice(&mut self.normals[3 * index..3 * index + 3]);
    }

    pub fn add_normal(&mut self, index: usize, normal: Vec3) {
        let slot = &mut self.normals[3 * index..3 * index + 3];
        slot[0] += normal.x;
        slot[1] += normal.y;
        slot[2] += normal.z;
    }

    pub fn clear_normals(&mut self) {
        self.normals.fill(0.0);
    }

    pub fn is_fixed(&self, index: usize) -> bool {
        self.fixed[index]
    }

    /// Fix or release a particle, optionally moving it.
    ///
    /// A relocated particle gets the same previous position so the move does
    /// not turn into velocity once it is released.
    pub fn set_fixed(&mut self, index: usize, fixed: bool, position: Option<DVec3>) {
        self.fixed[index] = fixed;
        if let Some(pos) = position {
            self.set_position(index, pos);
            self.set_previous(index, pos);
        }
        if fixed {
            self.clear_acceleration(index);
        }
    }

    /// Flat `x, y, z` positions in double precision.
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Flat `x, y, z` unit normals.
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }
}
