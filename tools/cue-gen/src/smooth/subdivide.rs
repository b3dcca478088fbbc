//! Midpoint subdivision

use super::normals::check_triangles;
use super::{MeshModifier, ModifierError};
use crate::geometry::{GeometryError, MAX_VERTICES, MeshData};
use glam::{Vec2, Vec3};
use std::collections::HashMap;

/// Split every triangle into four at its edge midpoints, `levels` times
///
/// Positions, normals and UVs are interpolated; the mesh is left untouched if
/// the result would not fit u16 indices.
pub struct Subdivide {
    pub levels: u32,
}

impl Default for Subdivide {
    fn default() -> Self {
        Self { levels: 1 }
    }
}

impl MeshModifier for Subdivide {
    fn name(&self) -> &'static str {
        "subdivide"
    }

    fn apply(&self, mesh: &mut MeshData) -> Result<(), ModifierError> {
        check_triangles(mesh)?;
        let mut result = mesh.clone();
        for _ in 0..self.levels {
            result = subdivide_once(&result)?;
        }
        *mesh = result;
        Ok(())
    }
}

struct Midpoints<'a> {
    source: &'a MeshData,
    target: MeshData,
    cache: HashMap<(u16, u16), u16>,
}

impl Midpoints<'_> {
    fn get(&mut self, a: u16, b: u16) -> Result<u16, GeometryError> {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&index) = self.cache.get(&key) {
            return Ok(index);
        }

        let index = self.target.positions.len();
        if index >= MAX_VERTICES {
            return Err(GeometryError::TooManyVertices(index + 1));
        }

        let (a, b) = (a as usize, b as usize);
        let src = self.source;
        let mid3 = |values: &[[f32; 3]]| (Vec3::from(values[a]) + Vec3::from(values[b])) * 0.5;

        self.target.positions.push(mid3(&src.positions).to_array());
        if src.normals.len() == src.positions.len() {
            self.target
                .normals
                .push(mid3(&src.normals).normalize_or_zero().to_array());
        }
        if src.uvs.len() == src.positions.len() {
            let uv = (Vec2::from(src.uvs[a]) + Vec2::from(src.uvs[b])) * 0.5;
            self.target.uvs.push(uv.to_array());
        }

        let index = index as u16;
        self.cache.insert(key, index);
        Ok(index)
    }
}

fn subdivide_once(mesh: &MeshData) -> Result<MeshData, GeometryError> {
    let mut target = mesh.clone();
    target.indices = Vec::with_capacity(mesh.indices.len() * 4);
    // Attributes that do not cover every vertex cannot be interpolated
    if target.normals.len() != target.positions.len() {
        target.normals.clear();
    }
    if target.uvs.len() != target.positions.len() {
        target.uvs.clear();
    }

    let mut midpoints = Midpoints {
        source: mesh,
        target,
        cache: HashMap::new(),
    };
    let mut indices = Vec::with_capacity(mesh.indices.len() * 4);

    for tri in mesh.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        let m01 = midpoints.get(i0, i1)?;
        let m12 = midpoints.get(i1, i2)?;
        let m20 = midpoints.get(i2, i0)?;

        indices.extend_from_slice(&[i0, m01, m20]);
        indices.extend_from_slice(&[m01, i1, m12]);
        indices.extend_from_slice(&[m20, m12, i2]);
        indices.extend_from_slice(&[m01, m12, m20]);
    }

    let mut result = midpoints.target;
    result.indices = indices;
    Ok(result)
}
