//! Double-buffered frame publication.
//!
//! The simulation writes positions and normals in place, then publishes them
//! as an `Arc<FrameData>`. The publisher keeps two buffers and only rewrites
//! the back one once every consumer has dropped it, so a published frame is
//! never modified underneath a reader.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::buffers::ParticleBuffers;
use crate::collision::CollisionSphere;
use crate::config::InstanceId;
use crate::encoding::encode_into;
use crate::geometry::MeshTopology;

/// Per-tick vertex data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameData {
    /// Flat `x, y, z` positions in double precision.
    pub positions: Vec<f64>,
    /// High parts of `positions`, see [`crate::encoding`].
    pub positions_high: Vec<f32>,
    /// Low parts of `positions`.
    pub positions_low: Vec<f32>,
    /// Flat `x, y, z` unit normals.
    pub normals: Vec<f32>,
}

impl FrameData {
    fn with_len(len: usize) -> Self {
        FrameData {
            positions: vec![0.0; len],
            positions_high: vec![0.0; len],
            positions_low: vec![0.0; len],
            normals: vec![0.0; len],
        }
    }

    fn fill_from(&mut self, particles: &ParticleBuffers) {
        self.positions.copy_from_slice(particles.positions());
        self.normals.copy_from_slice(particles.normals());
        encode_into(&self.positions, &mut self.positions_high, &mut self.positions_low);
    }
}

/// Everything a consumer needs to draw one tick.
#[derive(Clone, Debug)]
pub struct Frame {
    pub instance: InstanceId,
    /// Ticks completed when this frame was published.
    pub step: u64,
    pub width: usize,
    pub height: usize,
    pub data: Arc<FrameData>,
    pub topology: Arc<MeshTopology>,
    /// Collision spheres after this tick, all carrying ids.
    pub spheres: Vec<CollisionSphere>,
}

/// Owns the front/back buffers on the producer side.
#[derive(Debug)]
pub struct FramePublisher {
    front: Arc<FrameData>,
    back: Arc<FrameData>,
    reallocations: u64,
}

impl FramePublisher {
    /// Buffers for `particle_count` particles, front initialised from `particles`.
    pub fn new(particles: &ParticleBuffers) -> Self {
        let len = particles.positions().len();
        let mut front = FrameData::with_len(len);
        front.fill_from(particles);
        FramePublisher {
            front: Arc::new(front),
            back: Arc::new(FrameData::with_len(len)),
            reallocations: 0,
        }
    }

    /// The most recently published buffer.
    pub fn front(&self) -> Arc<FrameData> {
        Arc::clone(&self.front)
    }

    /// Write `particles` into the back buffer and swap it to the front.
    ///
    /// If a consumer still holds the back buffer a fresh one is allocated
    /// instead of writing into shared memory.
    pub fn publish(&mut self, particles: &ParticleBuffers) -> Arc<FrameData> {
        if Arc::get_mut(&mut self.back).is_none() {
            self.reallocations += 1;
            log::trace!("back frame buffer still shared; allocating ({} so far)", self.reallocations);
            self.back = Arc::new(FrameData::with_len(particles.positions().len()));
        }
        if let Some(back) = Arc::get_mut(&mut self.back) {
            back.fill_from(particles);
        }
        core::mem::swap(&mut self.front, &mut self.back);
        Arc::clone(&self.front)
    }

    /// How often a still-shared back buffer forced an allocation.
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn released_buffers_are_reused() {
        let mut particles = ParticleBuffers::new(&[DVec3::ZERO]);
        let mut publisher = FramePublisher::new(&particles);
        for i in 0..4 {
            particles.set_position(0, DVec3::splat(i as f64));
            let frame = publisher.publish(&particles);
            assert_eq!(frame.positions, vec![i as f64; 3]);
        }
        assert_eq!(publisher.reallocations(), 0);
    }

    #[test]
    fn held_frame_is_never_overwritten() {
        let mut particles = ParticleBuffers::new(&[DVec3::new(70_000.0, 1.0, 2.0)]);
        let mut publisher = FramePublisher::new(&particles);
        let first = publisher.publish(&particles);
        particles.set_position(0, DVec3::ZERO);
        let _second = publisher.publish(&particles);
        particles.set_position(0, DVec3::ONE);
        let third = publisher.publish(&particles);

        assert_eq!(first.positions, vec![70_000.0, 1.0, 2.0]);
        assert_eq!(first.positions_high[0], 65_536.0);
        assert_eq!(third.positions, vec![1.0, 1.0, 1.0]);
        assert_eq!(publisher.reallocations(), 1);
    }
}
