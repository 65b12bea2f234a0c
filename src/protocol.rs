//! Messages exchanged between the simulation thread and its consumer.

use alloc::sync::Arc;
use alloc::vec::Vec;

use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collision::CollisionSphere;
use crate::config::{ClothConfig, InstanceId};
use crate::error::ClothError;
use crate::frame::{Frame, FrameData};
use crate::geometry::{BoundingSphere, GridProjection};

/// A fixed-flag edit for the particle at grid `(x, y)`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixedParticle {
    pub x: usize,
    pub y: usize,
    pub fixed: bool,
    /// Move the particle here as part of the edit.
    pub position: Option<DVec3>,
}

impl FixedParticle {
    pub fn pin(x: usize, y: usize) -> Self {
        FixedParticle { x, y, fixed: true, position: None }
    }

    pub fn release(x: usize, y: usize) -> Self {
        FixedParticle { x, y, fixed: false, position: None }
    }

    pub fn pin_at(x: usize, y: usize, position: DVec3) -> Self {
        FixedParticle { x, y, fixed: true, position: Some(position) }
    }
}

/// Partial update of the live forces and collisions. `None` fields are left alone.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceUpdate {
    pub gravity: Option<DVec3>,
    pub wind: Option<DVec3>,
    /// Replaces the whole sphere list.
    pub spheres: Option<Vec<CollisionSphere>>,
    pub fixed: Option<Vec<FixedParticle>>,
}

impl ForceUpdate {
    pub fn gravity(gravity: DVec3) -> Self {
        ForceUpdate { gravity: Some(gravity), ..Default::default() }
    }

    pub fn wind(wind: DVec3) -> Self {
        ForceUpdate { wind: Some(wind), ..Default::default() }
    }

    pub fn spheres(spheres: Vec<CollisionSphere>) -> Self {
        ForceUpdate { spheres: Some(spheres), ..Default::default() }
    }

    pub fn fixed(fixed: Vec<FixedParticle>) -> Self {
        ForceUpdate { fixed: Some(fixed), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.gravity.is_none() && self.wind.is_none() && self.spheres.is_none() && self.fixed.is_none()
    }
}

/// Commands sent to the simulation thread.
#[derive(Clone, Debug)]
pub enum Command {
    Build { instance: InstanceId, config: ClothConfig },
    Update(ForceUpdate),
    SetRunning(bool),
    Destroy,
}

/// Events published by the simulation thread.
#[derive(Clone, Debug)]
pub enum Event {
    Built {
        instance: InstanceId,
        width: usize,
        height: usize,
        positions: Arc<FrameData>,
        bounds: BoundingSphere,
        projection: GridProjection,
    },
    /// The corner geometry could not be turned into a grid.
    BuildFailed { instance: InstanceId, error: ClothError },
    FrameReady(Frame),
    /// A command was ignored.
    Rejected { error: ClothError },
    /// The thread is exiting; no further events follow.
    Destroyed { instance: Option<InstanceId> },
}
