//! Per-vertex normals from the triangle mesh.

use glam::{DVec3, Vec3};

use crate::buffers::ParticleBuffers;
use crate::observer::{DegeneracyKind, StepObserver};

/// Unit normal of triangle `a b c`, or `None` if it has no area.
pub fn triangle_normal(a: DVec3, b: DVec3, c: DVec3) -> Option<DVec3> {
    (b - a).cross(c - a).try_normalize()
}

/// Recompute every particle normal from the triangles in `indices`.
///
/// Each triangle adds its unit normal to its three vertices; the sums are
/// then normalized. Degenerate triangles contribute nothing and vertices
/// whose sum cancels out keep a zero normal.
pub fn recompute<O: StepObserver>(particles: &mut ParticleBuffers, indices: &[u32], observer: &mut O) {
    particles.clear_normals();

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let Some(normal) = triangle_normal(particles.position(a), particles.position(b), particles.position(c))
        else {
            observer.on_degenerate(DegeneracyKind::DegenerateTriangle);
            continue;
        };
        let normal = normal.as_vec3();
        particles.add_normal(a, normal);
        particles.add_normal(b, normal);
        particles.add_normal(c, normal);
    }

    for i in 0..particles.len() {
        match particles.normal(i).try_normalize() {
            Some(n) => particles.set_normal(i, n),
            None => {
                observer.on_degenerate(DegeneracyKind::ZeroNormal);
                particles.set_normal(i, Vec3::ZERO);
            }
        }
    }
}
