//! Single-threaded cloth simulation core.
//!
//! [`ClothSimulation`] owns every mutable buffer and runs the tick pipeline:
//! forces, constraint relaxation, Verlet integration, collisions, normals.
//! [`publish`](ClothSimulation::publish) then encodes positions and hands the
//! result out as a [`Frame`]. The threaded coordinator drives this type; it can
//! also be stepped directly, e.g. from a render loop.

use alloc::sync::Arc;
use alloc::vec::Vec;

use glam::DVec3;

use crate::buffers::ParticleBuffers;
use crate::collision::{self, CollisionSphere, SphereId};
use crate::config::{ClothConfig, InstanceId};
use crate::error::{ClothError, Result};
use crate::force::ForceModel;
use crate::frame::{Frame, FramePublisher};
use crate::geometry::{BoundingSphere, ClothGeometry, GridProjection, MeshTopology};
use crate::integrator;
use crate::normals;
use crate::observer::{Counting, GuardCounters, StepObserver};
use crate::protocol::{Event, FixedParticle, ForceUpdate};
use crate::solver::ConstraintSolver;

pub struct ClothSimulation {
    instance: InstanceId,
    width: usize,
    height: usize,
    particles: ParticleBuffers,
    solver: ConstraintSolver,
    forces: ForceModel,
    spheres: Vec<CollisionSphere>,
    next_sphere_id: u32,
    topology: Arc<MeshTopology>,
    bounds: BoundingSphere,
    projection: GridProjection,
    damping: f64,
    time_step: f64,
    step: u64,
    guards: GuardCounters,
    publisher: FramePublisher,
}

impl ClothSimulation {
    /// Build a cloth, using `config.instance` or a freshly issued id.
    pub fn build(config: &ClothConfig) -> Result<Self> {
        let instance = config.instance.unwrap_or_else(InstanceId::next);
        Self::build_with_id(instance, config)
    }

    pub fn build_with_id(instance: InstanceId, config: &ClothConfig) -> Result<Self> {
        let geometry = ClothGeometry::build(config)?;
        let mut particles = ParticleBuffers::new(&geometry.positions);
        normals::recompute(&mut particles, &geometry.topology.indices, &mut GuardCounters::default());
        let publisher = FramePublisher::new(&particles);

        log::info!(
            "cloth {:?} built: {}x{} particles, {} constraints",
            instance,
            geometry.width,
            geometry.height,
            geometry.constraints.len()
        );

        Ok(ClothSimulation {
            instance,
            width: geometry.width,
            height: geometry.height,
            particles,
            solver: ConstraintSolver::new(geometry.constraints, config.iterations),
            forces: ForceModel::new(config.gravity, config.wind, config.gravity_frame, config.corners[0]),
            spheres: Vec::new(),
            next_sphere_id: 0,
            topology: Arc::new(geometry.topology),
            bounds: geometry.bounds,
            projection: geometry.projection,
            damping: config.damping,
            time_step: config.time_step,
            step: 0,
            guards: GuardCounters::default(),
            publisher,
        })
    }

    /// Merge a partial force/collision update into the live state.
    ///
    /// Every valid fixed-particle edit is applied. The first out-of-range
    /// edit, if any, is returned as an error after the rest went through.
    pub fn apply(&mut self, update: ForceUpdate) -> Result<()> {
        if let Some(gravity) = update.gravity {
            self.forces.gravity = gravity;
        }
        if let Some(wind) = update.wind {
            self.forces.wind = wind;
        }
        if let Some(spheres) = update.spheres {
            self.spheres = spheres;
        }

        let mut first_error = None;
        for edit in update.fixed.unwrap_or_default() {
            if let Err(err) = self.set_fixed(edit) {
                log::warn!("ignoring fixed-particle edit: {}", err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn set_fixed(&mut self, edit: FixedParticle) -> Result<()> {
        let index = self.index(edit.x, edit.y)?;
        self.particles.set_fixed(index, edit.fixed, edit.position);
        Ok(())
    }

    /// Run one tick of the pipeline.
    pub fn step<O: StepObserver>(&mut self, observer: &mut O) {
        let mut observer = Counting { counters: &mut self.guards, inner: observer };
        let indices = &self.topology.indices;

        self.forces.apply(&mut self.particles, indices, self.time_step, &mut observer);
        self.solver.relax(&mut self.particles, &mut observer);
        integrator::integrate(&mut self.particles, self.damping, self.time_step);
        observer.on_integrate();
        collision::resolve(&mut self.particles, &mut self.spheres, &mut observer);
        normals::recompute(&mut self.particles, indices, &mut observer);

        self.step += 1;
        observer.on_step_complete(self.step);
    }

    /// Encode the current state into a frame. Spheres without an id get one here.
    pub fn publish(&mut self) -> Frame {
        for sphere in self.spheres.iter_mut().filter(|s| s.id.is_none()) {
            sphere.id = Some(SphereId(self.next_sphere_id));
            self.next_sphere_id += 1;
        }
        Frame {
            instance: self.instance,
            step: self.step,
            width: self.width,
            height: self.height,
            data: self.publisher.publish(&self.particles),
            topology: Arc::clone(&self.topology),
            spheres: self.spheres.clone(),
        }
    }

    /// `step` followed by `publish`.
    pub fn tick<O: StepObserver>(&mut self, observer: &mut O) -> Frame {
        self.step(observer);
        self.publish()
    }

    pub(crate) fn built_event(&self) -> Event {
        Event::Built {
            instance: self.instance,
            width: self.width,
            height: self.height,
            positions: self.publisher.front(),
            bounds: self.bounds,
            projection: self.projection,
        }
    }

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(ClothError::GridOutOfBounds { x, y, width: self.width, height: self.height });
        }
        Ok(y * self.width + x)
    }

    pub fn position_at(&self, x: usize, y: usize) -> Result<DVec3> {
        Ok(self.particles.position(self.index(x, y)?))
    }

    pub fn is_fixed(&self, x: usize, y: usize) -> Result<bool> {
        Ok(self.particles.is_fixed(self.index(x, y)?))
    }

    /// Nearest grid coordinate to a world-space point, if it lies on the cloth.
    pub fn grid_coordinate(&self, point: DVec3) -> Option<(usize, usize)> {
        self.projection.grid_coordinate(point)
    }

    pub fn instance(&self) -> InstanceId { self.instance }
    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn step_count(&self) -> u64 { self.step }
    pub fn bounds(&self) -> BoundingSphere { self.bounds }
    pub fn projection(&self) -> GridProjection { self.projection }
    pub fn particles(&self) -> &ParticleBuffers { &self.particles }
    pub fn topology(&self) -> &Arc<MeshTopology> { &self.topology }
    pub fn spheres(&self) -> &[CollisionSphere] { &self.spheres }
    pub fn solver(&self) -> &ConstraintSolver { &self.solver }
    pub fn constraint_count(&self) -> usize { self.solver.constraint_count() }
    pub fn guards(&self) -> GuardCounters { self.guards }
    pub fn frame_reallocations(&self) -> u64 { self.publisher.reallocations() }
}
