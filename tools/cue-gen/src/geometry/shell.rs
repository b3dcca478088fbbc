//! Tapered cylindrical shells and flat end caps

use super::{CAP_UV, GeometryError, MAX_VERTICES, MeshData};
use std::f32::consts::TAU;

/// Fewest radial segments that still enclose a volume
pub const MIN_SEGMENTS: u32 = 3;

/// Radius at normalized height `t` (0 at the start ring, 1 at the end ring)
pub fn radius_at(radius_start: f32, radius_end: f32, t: f32) -> f32 {
    radius_start + (radius_end - radius_start) * t.clamp(0.0, 1.0)
}

/// Generate the open side surface of a tapered cylinder around +Y
///
/// Ring `i` of `0..=segments` sits at angle `2π·i/segments` and contributes a
/// bottom vertex at `height_start` then a top vertex at `height_end`. The first
/// and last rings share positions but carry u = 0 and u = 1, so the texture seam
/// is explicit. Normals are radial with no height component.
///
/// Produces exactly `2(segments + 1)` vertices and `6 · segments` indices,
/// wound counter-clockwise seen from outside.
pub fn generate_shell(
    segments: u32,
    radius_start: f32,
    radius_end: f32,
    height_start: f32,
    height_end: f32,
) -> Result<MeshData, GeometryError> {
    if segments < MIN_SEGMENTS {
        return Err(GeometryError::TooFewSegments(segments));
    }
    for radius in [radius_start, radius_end] {
        if radius < 0.0 {
            return Err(GeometryError::NegativeRadius(radius));
        }
    }
    let vertex_count = 2 * (segments as usize + 1);
    if vertex_count > MAX_VERTICES {
        return Err(GeometryError::TooManyVertices(vertex_count));
    }

    let bottom_radius = radius_at(radius_start, radius_end, 0.0);
    let top_radius = radius_at(radius_start, radius_end, 1.0);

    let mut mesh = MeshData {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity(6 * segments as usize),
    };

    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let (sin, cos) = (u * TAU).sin_cos();

        mesh.positions
            .push([bottom_radius * cos, height_start, bottom_radius * sin]);
        mesh.positions
            .push([top_radius * cos, height_end, top_radius * sin]);
        mesh.normals.push([cos, 0.0, sin]);
        mesh.normals.push([cos, 0.0, sin]);
        mesh.uvs.push([u, 0.0]);
        mesh.uvs.push([u, 1.0]);
    }

    for i in 0..segments as u16 {
        let b0 = 2 * i;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        mesh.indices.extend_from_slice(&[b0, t0, b1, t0, t1, b1]);
    }

    Ok(mesh)
}

/// Which way a cap faces along the cue axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapFacing {
    /// +Y, closes the top (tip-side) end
    Up,
    /// -Y, closes the bottom (butt-side) end
    Down,
}

/// Flat n-gon cap: a center vertex plus `segments` rim vertices as a triangle fan
///
/// Every cap vertex gets the collapsed cap UV so textures meant for the side
/// never bleed onto the ends.
pub fn generate_cap(
    segments: u32,
    radius: f32,
    height: f32,
    facing: CapFacing,
) -> Result<MeshData, GeometryError> {
    if segments < MIN_SEGMENTS {
        return Err(GeometryError::TooFewSegments(segments));
    }
    if radius < 0.0 {
        return Err(GeometryError::NegativeRadius(radius));
    }
    let vertex_count = segments as usize + 1;
    if vertex_count > MAX_VERTICES {
        return Err(GeometryError::TooManyVertices(vertex_count));
    }

    let normal = match facing {
        CapFacing::Up => [0.0, 1.0, 0.0],
        CapFacing::Down => [0.0, -1.0, 0.0],
    };

    let mut positions = Vec::with_capacity(vertex_count);
    positions.push([0.0, height, 0.0]);
    for i in 0..segments {
        let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
        positions.push([radius * cos, height, radius * sin]);
    }

    let mut indices = Vec::with_capacity(3 * segments as usize);
    for i in 0..segments as u16 {
        let rim = 1 + i;
        let next = 1 + (i + 1) % segments as u16;
        match facing {
            CapFacing::Up => indices.extend_from_slice(&[0, next, rim]),
            CapFacing::Down => indices.extend_from_slice(&[0, rim, next]),
        }
    }

    Ok(MeshData {
        positions,
        normals: vec![normal; vertex_count],
        uvs: vec![CAP_UV; vertex_count],
        indices,
    })
}
