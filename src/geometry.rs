//! Cloth construction from four corner points.
//!
//! The builder lays a `width x height` particle grid over the quadrilateral
//! `p1 p2 p3 p4` and derives everything that stays fixed for the lifetime of
//! the cloth: triangle indices, texture coordinates, distance constraints and
//! the bounding sphere.

use alloc::vec::Vec;

use glam::DVec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ClothConfig;
use crate::constraint::{ConstraintKind, DistanceConstraint};
use crate::error::{ClothError, Result};

/// Index/uv data shared by every published frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshTopology {
    /// Two counter-clockwise triangles per grid cell.
    pub indices: Vec<u32>,
    /// One `u, v` pair per particle, in `[0, 1]`.
    pub uvs: Vec<f32>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

/// Maps world-space points back onto grid coordinates.
///
/// Points are projected onto the `p1 -> p2` and `p1 -> p4` axes and rounded
/// to the nearest particle. Anything that rounds outside `0..width` or
/// `0..height` is rejected.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridProjection {
    pub origin: DVec3,
    pub width_axis: DVec3,
    pub height_axis: DVec3,
    pub width: usize,
    pub height: usize,
}

impl GridProjection {
    pub fn grid_coordinate(&self, point: DVec3) -> Option<(usize, usize)> {
        let offset = point - self.origin;
        let x = axis_index(offset, self.width_axis, self.width)?;
        let y = axis_index(offset, self.height_axis, self.height)?;
        Some((x, y))
    }
}

fn axis_index(offset: DVec3, axis: DVec3, count: usize) -> Option<usize> {
    let len_sq = axis.length_squared();
    let t = if len_sq > 1e-24 { offset.dot(axis) / len_sq } else { 0.0 };
    let last = (count - 1) as f64;
    let index = libm::round(t * last);
    if index >= 0.0 && index <= last {
        Some(index as usize)
    } else {
        None
    }
}

/// Everything produced by a successful build.
#[derive(Clone, Debug)]
pub struct ClothGeometry {
    pub width: usize,
    pub height: usize,
    pub positions: Vec<DVec3>,
    pub topology: MeshTopology,
    pub constraints: Vec<DistanceConstraint>,
    pub bounds: BoundingSphere,
    pub projection: GridProjection,
}

impl ClothGeometry {
    /// Build the particle grid for `config`.
    ///
    /// Fails if any vertex (or the center) cannot be placed because the
    /// interpolated edge segments do not intersect.
    pub fn build(config: &ClothConfig) -> Result<Self> {
        config.validate()?;
        let [p1, p2, p3, p4] = config.corners;
        let (width, height) = grid_dimensions(&config.corners, config.spacing, config.max_particles)?;

        let mut positions = Vec::with_capacity(width * height);
        for py in 0..height {
            let y = normalized(py, height);
            let left = p1.lerp(p4, y);
            let right = p2.lerp(p3, y);
            for px in 0..width {
                let x = normalized(px, width);
                let top = p1.lerp(p2, x);
                let bottom = p4.lerp(p3, x);
                let pos = segment_intersection(top, bottom, left, right)
                    .ok_or(ClothError::DegenerateGeometry { x: px, y: py })?;
                positions.push(pos);
            }
        }

        let center = segment_intersection(
            p1.lerp(p4, 0.5),
            p2.lerp(p3, 0.5),
            p1.lerp(p2, 0.5),
            p4.lerp(p3, 0.5),
        )
        .ok_or(ClothError::DegenerateCenter)?;
        let radius = config.corners.iter().map(|c| c.distance(center)).sum::<f64>() / 4.0;

        let constraints = grid_constraints(width, height, &positions, config.secondary_neighbors);
        log::debug!(
            "built {}x{} cloth grid with {} constraints",
            width,
            height,
            constraints.len()
        );

        Ok(ClothGeometry {
            width,
            height,
            topology: MeshTopology {
                indices: triangle_indices(width, height),
                uvs: texture_coordinates(width, height),
            },
            positions,
            constraints,
            bounds: BoundingSphere { center, radius },
            projection: GridProjection {
                origin: p1,
                width_axis: p2 - p1,
                height_axis: p4 - p1,
                width,
                height,
            },
        })
    }

    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }
}

/// Particles per axis: `floor(axis_length / spacing) + 1`.
///
/// Fails with [`ClothError::GridTooLarge`] when `width * height` exceeds
/// `max_particles` (itself capped at `u32::MAX`) or the flat `x, y, z`
/// buffers would not be addressable.
pub fn grid_dimensions(corners: &[DVec3; 4], spacing: (f64, f64), max_particles: usize) -> Result<(usize, usize)> {
    let limit = max_particles.min(u32::MAX as usize);
    let too_large = ClothError::GridTooLarge { limit };

    let width = axis_count(corners[0].distance(corners[1]), spacing.0, limit).ok_or(too_large.clone())?;
    let height = axis_count(corners[0].distance(corners[3]), spacing.1, limit).ok_or(too_large.clone())?;
    width
        .checked_mul(height)
        .filter(|&count| count <= limit)
        .and_then(|count| count.checked_mul(3))
        .ok_or(too_large)?;
    Ok((width, height))
}

fn axis_count(length: f64, spacing: f64, limit: usize) -> Option<usize> {
    let cells = libm::floor(length / spacing);
    if cells.is_finite() && cells >= 0.0 && cells < limit as f64 {
        Some(cells as usize + 1)
    } else {
        None
    }
}

/// Position of grid line `i` of `count` along `[0, 1]`. A single line sits at 0.
fn normalized(i: usize, count: usize) -> f64 {
    if count > 1 {
        i as f64 / (count - 1) as f64
    } else {
        0.0
    }
}

/// Intersect segments `a0 a1` and `b0 b1`.
///
/// Uses the closest points of the two carrier lines and returns their
/// midpoint, so slightly non-planar quads still resolve. Returns `None` for
/// zero-length or parallel segments, or when the closest points fall outside
/// either segment.
pub fn segment_intersection(a0: DVec3, a1: DVec3, b0: DVec3, b1: DVec3) -> Option<DVec3> {
    const RANGE_TOLERANCE: f64 = 1e-9;

    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let r = a0 - b0;
    let a = d1.length_squared();
    let e = d2.length_squared();
    if a < 1e-24 || e < 1e-24 {
        return None;
    }

    let b = d1.dot(d2);
    let c = d1.dot(r);
    let f = d2.dot(r);
    let denom = a * e - b * b;
    if denom <= 1e-12 * a * e {
        return None;
    }

    let s = (b * f - c * e) / denom;
    let t = (b * s + f) / e;
    let range = -RANGE_TOLERANCE..=1.0 + RANGE_TOLERANCE;
    if !range.contains(&s) || !range.contains(&t) {
        return None;
    }

    let on_a = a0 + d1 * s;
    let on_b = b0 + d2 * t;
    Some(on_a.lerp(on_b, 0.5))
}

/// Two triangles per cell: `(x,y)-(x+1,y)-(x,y+1)` and `(x+1,y)-(x+1,y+1)-(x,y+1)`.
pub fn triangle_indices(width: usize, height: usize) -> Vec<u32> {
    let cells = width.saturating_sub(1) * height.saturating_sub(1);
    let mut indices = Vec::with_capacity(cells * 6);
    for y in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            let i = (y * width + x) as u32;
            let w = width as u32;
            indices.extend_from_slice(&[i, i + 1, i + w]);
            indices.extend_from_slice(&[i + 1, i + w + 1, i + w]);
        }
    }
    indices
}

pub fn texture_coordinates(width: usize, height: usize) -> Vec<f32> {
    let mut uvs = Vec::with_capacity(width * height * 2);
    for y in 0..height {
        for x in 0..width {
            uvs.push(normalized(x, width) as f32);
            uvs.push(normalized(y, height) as f32);
        }
    }
    uvs
}

/// Create the constraint set in a fixed order.
///
/// Structural links come first (horizontal, vertical, both diagonals per
/// cell), followed by the same pattern at stride 2 when `secondary` is set.
/// Rest distances are taken from `positions`.
pub fn grid_constraints(
    width: usize,
    height: usize,
    positions: &[DVec3],
    secondary: bool,
) -> Vec<DistanceConstraint> {
    let mut constraints = Vec::new();
    link_stride(&mut constraints, width, height, positions, 1, ConstraintKind::Structural);
    if secondary {
        link_stride(&mut constraints, width, height, positions, 2, ConstraintKind::Secondary);
    }
    constraints
}

fn link_stride(
    out: &mut Vec<DistanceConstraint>,
    width: usize,
    height: usize,
    positions: &[DVec3],
    stride: usize,
    kind: ConstraintKind,
) {
    let idx = |x: usize, y: usize| y * width + x;
    let mut link = |a: usize, b: usize| {
        out.push(DistanceConstraint::new(a, b, positions[a].distance(positions[b]), kind));
    };

    // Horizontal
    for y in 0..height {
        for x in 0..width.saturating_sub(stride) {
            link(idx(x, y), idx(x + stride, y));
        }
    }

    // Vertical
    for y in 0..height.saturating_sub(stride) {
        for x in 0..width {
            link(idx(x, y), idx(x, y + stride));
        }
    }

    // Diagonals
    for y in 0..height.saturating_sub(stride) {
        for x in 0..width.saturating_sub(stride) {
            link(idx(x, y), idx(x + stride, y + stride));
            link(idx(x + stride, y), idx(x, y + stride));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64, spacing: f64) -> ClothConfig {
        ClothConfig::new([
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(size, 0.0, 0.0),
            DVec3::new(size, size, 0.0),
            DVec3::new(0.0, size, 0.0),
        ])
        .with_spacing(spacing, spacing)
    }

    #[test]
    fn corners_land_on_corners() {
        let geometry = ClothGeometry::build(&square(2.0, 0.5)).unwrap();
        assert_eq!((geometry.width, geometry.height), (5, 5));
        let last = geometry.particle_count() - 1;
        assert!(geometry.positions[0].distance(DVec3::ZERO) < 1e-9);
        assert!(geometry.positions[4].distance(DVec3::new(2.0, 0.0, 0.0)) < 1e-9);
        assert!(geometry.positions[last].distance(DVec3::new(2.0, 2.0, 0.0)) < 1e-9);
        assert!(geometry.positions[20].distance(DVec3::new(0.0, 2.0, 0.0)) < 1e-9);
    }

    #[test]
    fn bounding_sphere_of_square() {
        let geometry = ClothGeometry::build(&square(2.0, 0.5)).unwrap();
        assert!(geometry.bounds.center.distance(DVec3::new(1.0, 1.0, 0.0)) < 1e-9);
        assert!((geometry.bounds.radius - 2.0f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn triangle_winding_follows_grid() {
        let indices = triangle_indices(3, 2);
        assert_eq!(indices.len(), 2 * 2 * 3);
        assert_eq!(&indices[0..6], &[0, 1, 3, 1, 4, 3]);
        assert_eq!(&indices[6..12], &[1, 2, 4, 2, 5, 4]);
    }

    #[test]
    fn uvs_span_unit_square() {
        let uvs = texture_coordinates(3, 2);
        assert_eq!(uvs.len(), 12);
        assert_eq!(&uvs[0..2], &[0.0, 0.0]);
        assert_eq!(&uvs[2..4], &[0.5, 0.0]);
        assert_eq!(&uvs[10..12], &[1.0, 1.0]);
    }

    #[test]
    fn constraint_order_starts_structural() {
        let geometry = ClothGeometry::build(&square(2.0, 0.5)).unwrap();
        let first = geometry.constraints[0];
        assert_eq!((first.a, first.b), (0, 1));
        assert_eq!(first.kind, ConstraintKind::Structural);
        assert_eq!(geometry.constraints.last().map(|c| c.kind), Some(ConstraintKind::Secondary));
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocation() {
        let corners = square(1.0, 1.0).corners;
        assert_eq!(grid_dimensions(&corners, (0.25, 0.5), 15), Ok((5, 3)));
        assert_eq!(grid_dimensions(&corners, (0.25, 0.5), 14), Err(ClothError::GridTooLarge { limit: 14 }));
        assert_eq!(
            grid_dimensions(&corners, (1e-10, 1e-10), usize::MAX),
            Err(ClothError::GridTooLarge { limit: u32::MAX as usize })
        );
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let hit = segment_intersection(
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::new(1.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn crossing_segments_intersect() {
        let hit = segment_intersection(
            DVec3::new(0.0, -1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert!(hit.length() < 1e-12);
    }

    #[test]
    fn projection_rejects_points_past_the_edge() {
        let geometry = ClothGeometry::build(&square(2.0, 0.5)).unwrap();
        let projection = geometry.projection;
        assert_eq!(projection.grid_coordinate(DVec3::new(1.0, 0.5, 0.0)), Some((2, 1)));
        assert_eq!(projection.grid_coordinate(DVec3::new(2.0, 2.0, 0.0)), Some((4, 4)));
        assert_eq!(projection.grid_coordinate(DVec3::new(2.4, 0.0, 0.0)), None);
        assert_eq!(projection.grid_coordinate(DVec3::new(0.0, -0.4, 0.0)), None);
    }
}
