//! Configuration for a simulated cloth.

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ClothError, Result};

/// Identifies one simulated cloth across the command/event protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceId(pub u64);

/// Default upper bound on `width * height`.
pub const DEFAULT_MAX_PARTICLES: usize = 1 << 20;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    /// Issue a fresh id. Ids handed out this way never repeat within a process.
    pub fn next() -> Self {
        InstanceId(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// How the configured gravity vector is mapped into world space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GravityFrame {
    /// Gravity is given in the east/north/up frame of the ellipsoid surface
    /// under corner `p1`; `+z` is local up.
    #[default]
    EastNorthUp,
    /// Gravity is given directly in world coordinates.
    World,
}

/// Configuration for a cloth simulation.
///
/// # Builder Pattern
/// ```
/// use drape::config::ClothConfig;
/// use drape::glam::DVec3;
///
/// let config = ClothConfig::new([
///         DVec3::new(0.0, 0.0, 0.0),
///         DVec3::new(1.0, 0.0, 0.0),
///         DVec3::new(1.0, 1.0, 0.0),
///         DVec3::new(0.0, 1.0, 0.0),
///     ])
///     .with_spacing(0.1, 0.1)
///     .with_iterations(10)
///     .with_wind(DVec3::new(0.0, 0.2, 0.0));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClothConfig {
    /// Corners `p1..p4`. The width axis runs `p1 -> p2`, the height axis `p1 -> p4`.
    pub corners: [DVec3; 4],
    /// Target particle spacing along the width and height axes.
    pub spacing: (f64, f64),
    /// Constraint relaxation passes per tick. Default: 15.
    pub iterations: usize,
    /// Ticks per second on the simulation thread. Default: 60.
    pub frequency_hz: f64,
    /// Also link distance-2 neighbours. Default: true.
    pub secondary_neighbors: bool,
    /// Gravity direction; zero disables gravity. Default: zero.
    pub gravity: DVec3,
    /// Wind vector; zero disables wind. Default: zero.
    pub wind: DVec3,
    /// Fraction of velocity lost per tick, in [0, 1]. Default: 0.01.
    pub damping: f64,
    /// Integration time step. Default: 1/60.
    pub time_step: f64,
    /// Frame the gravity vector is expressed in. Default: east/north/up.
    pub gravity_frame: GravityFrame,
    /// Caller-chosen id for this cloth. Default: none.
    pub instance: Option<InstanceId>,
    /// Largest grid the build accepts; never above `u32::MAX`. Default: 2^20.
    pub max_particles: usize,
}

impl ClothConfig {
    /// Create a config spanning the four corners, with default values elsewhere.
    pub fn new(corners: [DVec3; 4]) -> Self {
        ClothConfig {
            corners,
            spacing: (1.0, 1.0),
            iterations: 15,
            frequency_hz: 60.0,
            secondary_neighbors: true,
            gravity: DVec3::ZERO,
            wind: DVec3::ZERO,
            damping: 0.01,
            time_step: 1.0 / 60.0,
            gravity_frame: GravityFrame::EastNorthUp,
            instance: None,
            max_particles: DEFAULT_MAX_PARTICLES,
        }
    }

    /// Set the target spacing along the width and height axes.
    pub fn with_spacing(mut self, width: f64, height: f64) -> Self {
        self.spacing = (width, height);
        self
    }

    /// Set the number of constraint iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the tick frequency of the simulation thread.
    pub fn with_frequency(mut self, frequency_hz: f64) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    /// Enable or disable distance-2 neighbour constraints.
    pub fn with_secondary_neighbors(mut self, enabled: bool) -> Self {
        self.secondary_neighbors = enabled;
        self
    }

    /// Set the gravity vector.
    pub fn with_gravity(mut self, gravity: DVec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the wind vector.
    pub fn with_wind(mut self, wind: DVec3) -> Self {
        self.wind = wind;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Set the integration time step.
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Set the frame the gravity vector is expressed in.
    pub fn with_gravity_frame(mut self, frame: GravityFrame) -> Self {
        self.gravity_frame = frame;
        self
    }

    /// Set the instance id used in every event for this cloth.
    pub fn with_instance(mut self, instance: InstanceId) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Set the particle limit, capped at `u32::MAX` so indices fit the mesh.
    pub fn with_max_particles(mut self, max_particles: usize) -> Self {
        self.max_particles = max_particles.min(u32::MAX as usize);
        self
    }

    /// Check the scalar parameters before any geometry is built.
    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self.corners.iter().position(|c| !c.is_finite()) {
            return Err(ClothError::NonFiniteCorner { index });
        }
        let (w, h) = self.spacing;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ClothError::InvalidSpacing { width: w, height: h });
        }
        if self.iterations == 0 {
            return Err(ClothError::InvalidIterations);
        }
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(ClothError::InvalidFrequency(self.frequency_hz));
        }
        self.tick_interval()?;
        Ok(())
    }

    /// Time between ticks at `frequency_hz`.
    pub fn tick_interval(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(1.0 / self.frequency_hz)
            .map_err(|_| ClothError::InvalidFrequency(self.frequency_hz))
    }
}

impl Default for ClothConfig {
    /// A unit square in the XY plane.
    fn default() -> Self {
        Self::new([
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ])
    }
}
