//! Mass-spring cloth simulation for real-time rendering.
//!
//! `drape` lays a particle grid over four arbitrary corner points and advances
//! it with Verlet integration and iterative distance constraints. Each tick
//! runs the same pipeline:
//!
//! 1. gravity and per-triangle wind accumulate into particle acceleration
//! 2. distance constraints are relaxed for a configured number of passes
//! 3. free particles are integrated
//! 4. moving collision spheres push particles out
//! 5. vertex normals are rebuilt
//! 6. positions are split into high/low `f32` pairs and published
//!
//! # Features
//!
//! - **Arbitrary quads**: corners need not be axis-aligned or rectangular
//! - **Two-tier constraints**: structural links plus optional distance-2 links
//! - **Precise at world scale**: high/low encoding for GPU-side RTC rendering
//! - **Threaded**: `Coordinator` runs the loop on its own thread (`std` feature)
//! - **Tear-free frames**: double-buffered, zero-copy `Arc` publication
//! - **Observable**: per-phase hooks and degeneracy counters via `StepObserver`
//! - **`no_std` core**: `ClothSimulation` works with `alloc` only

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod buffers;
pub mod constraint;
pub mod solver;
pub mod geometry;
pub mod integrator;
pub mod force;
pub mod collision;
pub mod normals;
pub mod encoding;
pub mod observer;
pub mod frame;
pub mod protocol;
pub mod simulation;
#[cfg(feature = "std")]
pub mod coordinator;

// Re-export primary API
pub use config::{ClothConfig, GravityFrame, InstanceId};
pub use error::{ClothError, Result};
pub use buffers::ParticleBuffers;
pub use constraint::{ConstraintKind, DistanceConstraint};
pub use solver::ConstraintSolver;
pub use geometry::{BoundingSphere, ClothGeometry, GridProjection, MeshTopology};
pub use force::ForceModel;
pub use collision::{CollisionSphere, SphereId};
pub use encoding::EncodedCoordinate;
pub use observer::{DegeneracyKind, GuardCounters, NoOpStepObserver, StepObserver};
pub use frame::{Frame, FrameData, FramePublisher};
pub use protocol::{Command, Event, FixedParticle, ForceUpdate};
pub use simulation::ClothSimulation;
#[cfg(feature = "std")]
pub use coordinator::{Coordinator, CoordinatorState};

pub use glam;
