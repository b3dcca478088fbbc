//! Cylindrical UV projection

use super::{GeometryError, MAX_VERTICES, MeshData};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

/// UV given to cap vertices: a single point near the bottom edge of the texture
pub const CAP_UV: [f32; 2] = [0.5, 0.005];

/// A vertex is a cap vertex when its normal's component along the axis exceeds this
pub const CAP_NORMAL_THRESHOLD: f32 = 0.9;

/// Cylinder axis used for projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// glTF up axis; what the generator produces
    #[default]
    Y,
    /// Blender up axis
    Z,
}

impl Axis {
    /// Split a vector into (a, b) around the axis and h along it
    fn split(self, v: [f32; 3]) -> (f32, f32, f32) {
        match self {
            Axis::Y => (v[0], v[2], v[1]),
            Axis::Z => (v[0], v[1], v[2]),
        }
    }
}

/// Rebuild TEXCOORD_0 by wrapping u around `axis` and stretching v over the height
///
/// Side vertices get `u = (atan2(b, a) + π) / 2π` and `v` normalized over the
/// mesh's height range (0.5 everywhere when the range is zero). Cap vertices
/// collapse to [`CAP_UV`]. Requires one normal per vertex. The wrap is then
/// split with [`fix_cylindrical_seam`], so the vertex count can grow.
pub fn project_cylindrical(mesh: &mut MeshData, axis: Axis) -> Result<(), GeometryError> {
    if mesh.normals.len() != mesh.positions.len() {
        return Err(GeometryError::MissingAttribute {
            attribute: "NORMAL",
            expected: mesh.positions.len(),
            actual: mesh.normals.len(),
        });
    }

    let (h_min, h_max) = mesh
        .positions
        .iter()
        .map(|p| axis.split(*p).2)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| {
            (lo.min(h), hi.max(h))
        });
    let range = h_max - h_min;

    let uvs = mesh
        .positions
        .iter()
        .zip(&mesh.normals)
        .map(|(p, n)| {
            if axis.split(*n).2.abs() > CAP_NORMAL_THRESHOLD {
                return CAP_UV;
            }
            let (a, b, h) = axis.split(*p);
            let u = (b.atan2(a) + PI) / TAU;
            let v = if range > 0.0 { (h - h_min) / range } else { 0.5 };
            [u, v]
        })
        .collect();

    let previous = std::mem::replace(&mut mesh.uvs, uvs);
    if let Err(e) = fix_cylindrical_seam(mesh) {
        mesh.uvs = previous;
        return Err(e);
    }
    Ok(())
}

/// Split triangles that straddle the u wrap
///
/// A triangle spanning more than half the texture crosses the seam. Its
/// vertices on the low side are duplicated with `u + 1`, one copy per original
/// vertex, so the strip samples a continuous range. The mesh is left untouched
/// when the copies would not fit u16 indices.
pub fn fix_cylindrical_seam(mesh: &mut MeshData) -> Result<(), GeometryError> {
    if mesh.uvs.len() != mesh.positions.len() {
        return Err(GeometryError::MissingAttribute {
            attribute: "TEXCOORD_0",
            expected: mesh.positions.len(),
            actual: mesh.uvs.len(),
        });
    }

    let mut shifted: HashMap<u16, u16> = HashMap::new();
    let mut copies = Vec::new();
    let mut indices = mesh.indices.clone();

    for tri in indices.chunks_exact_mut(3) {
        if tri.iter().any(|&i| i as usize >= mesh.uvs.len()) {
            continue;
        }
        let us = [tri[0], tri[1], tri[2]].map(|i| mesh.uvs[i as usize][0]);
        let u_max = us[0].max(us[1]).max(us[2]);
        let u_min = us[0].min(us[1]).min(us[2]);
        if u_max - u_min <= 0.5 {
            continue;
        }

        for (index, u) in tri.iter_mut().zip(us) {
            if u_max - u <= 0.5 {
                continue;
            }
            let next = mesh.positions.len() + copies.len();
            let copy = match shifted.get(&*index) {
                Some(&copy) => copy,
                None => {
                    if next >= MAX_VERTICES {
                        return Err(GeometryError::TooManyVertices(next + 1));
                    }
                    copies.push(*index as usize);
                    shifted.insert(*index, next as u16);
                    next as u16
                }
            };
            *index = copy;
        }
    }

    for original in copies {
        mesh.positions.push(mesh.positions[original]);
        if let Some(&normal) = mesh.normals.get(original) {
            mesh.normals.push(normal);
        }
        let [u, v] = mesh.uvs[original];
        mesh.uvs.push([u + 1.0, v]);
    }
    mesh.indices = indices;
    Ok(())
}
