//! Error types for cloth construction and the command protocol.

use thiserror::Error;

/// Errors that can occur while building or driving a cloth simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClothError {
    /// Particle spacing must be positive and finite on both axes.
    #[error("particle spacing must be positive and finite (got {width} x {height})")]
    InvalidSpacing { width: f64, height: f64 },
    /// The constraint solver needs at least one pass.
    #[error("solver iteration count must be at least 1")]
    InvalidIterations,
    /// Tick frequency must be positive, finite and give a representable interval.
    #[error("tick frequency must be positive and finite (got {0})")]
    InvalidFrequency(f64),
    /// Corner coordinates must be finite.
    #[error("corner p{} has a non-finite coordinate", .index + 1)]
    NonFiniteCorner { index: usize },
    /// Axis length over spacing asks for more particles than allowed.
    #[error("grid would exceed the limit of {limit} particles")]
    GridTooLarge { limit: usize },
    /// The interpolated edge segments for a grid vertex did not intersect.
    #[error("corner geometry is degenerate: no edge intersection for vertex ({x}, {y})")]
    DegenerateGeometry { x: usize, y: usize },
    /// The corner midlines did not intersect, so the cloth has no center.
    #[error("corner geometry is degenerate: midlines do not intersect")]
    DegenerateCenter,
    /// A grid coordinate lies outside the particle grid.
    #[error("grid coordinate ({x}, {y}) out of bounds ({width} x {height})")]
    GridOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// The command requires a built cloth.
    #[error("cloth has not been built")]
    NotBuilt,
    /// Build may only be issued once per instance.
    #[error("cloth is already built; construct a new instance to change topology")]
    AlreadyBuilt,
    /// The operating system refused to start the simulation thread.
    #[error("failed to spawn simulation thread")]
    ThreadSpawn,
    /// The simulation thread has been torn down.
    #[error("simulation has been destroyed")]
    Destroyed,
}

/// Result alias for cloth operations.
pub type Result<T> = core::result::Result<T, ClothError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn out_of_bounds_display() {
        let err = ClothError::GridOutOfBounds { x: 4, y: 1, width: 3, height: 3 };
        assert_eq!(format!("{}", err), "grid coordinate (4, 1) out of bounds (3 x 3)");
    }

    #[test]
    fn non_finite_corner_is_one_based() {
        let err = ClothError::NonFiniteCorner { index: 2 };
        assert_eq!(format!("{}", err), "corner p3 has a non-finite coordinate");
    }

    #[test]
    fn degenerate_geometry_names_vertex() {
        let err = ClothError::DegenerateGeometry { x: 2, y: 7 };
        assert!(format!("{}", err).contains("(2, 7)"));
    }
}
