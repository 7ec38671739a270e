//! Wavefront OBJ loading and the GPU-side model.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use glow::HasContext;

use crate::abs::{Mesh, Vertex};

/// Interleaved vertex layout for loaded models.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct ModelVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex for ModelVertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            let stride = std::mem::size_of::<ModelVertex>() as i32;

            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(0);

            gl.vertex_attrib_pointer_f32(
                1,
                3,
                glow::FLOAT,
                false,
                stride,
                std::mem::size_of::<Vec3>() as i32,
            );
            gl.enable_vertex_attrib_array(1);

            gl.vertex_attrib_pointer_f32(
                2,
                2,
                glow::FLOAT,
                false,
                stride,
                2 * std::mem::size_of::<Vec3>() as i32,
            );
            gl.enable_vertex_attrib_array(2);
        }
    }
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}

/// CPU-side mesh data decoded from an OBJ file.
#[derive(Debug)]
pub struct ObjData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl ObjData {
    /// Loads and flattens an OBJ file from disk. A missing or malformed
    /// file is an error naming the path; it never yields an empty mesh.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let (models, _materials) = tobj::load_obj(path, &load_options())
            .map_err(|e| format!("failed to load model {}: {e}", path.display()))?;
        Ok(Self::from_models(&models))
    }

    /// Decodes OBJ text from an in-memory reader. Material libraries are
    /// not resolved.
    pub fn from_reader(reader: &mut impl BufRead) -> Result<Self, String> {
        let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
            Ok(Default::default())
        })
        .map_err(|e| format!("failed to decode model: {e}"))?;
        Ok(Self::from_models(&models))
    }

    fn from_models(models: &[tobj::Model]) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut index_offset = 0u32;
        for model in models {
            let mesh = &model.mesh;
            let normals = if mesh.normals.is_empty() {
                vertex_normals(&mesh.positions, &mesh.indices)
            } else {
                mesh.normals.clone()
            };
            for i in 0..mesh.positions.len() / 3 {
                let uv = if mesh.texcoords.is_empty() {
                    Vec2::ZERO
                } else {
                    Vec2::new(mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1])
                };
                vertices.push(ModelVertex {
                    position: Vec3::new(
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ),
                    normal: Vec3::new(normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]),
                    uv,
                });
            }
            indices.extend(mesh.indices.iter().map(|index| index + index_offset));
            index_offset += (mesh.positions.len() / 3) as u32;
        }
        Self { vertices, indices }
    }
}

/// Accumulates area-weighted face normals per vertex, for meshes that ship
/// without authored normals.
pub fn vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut accumulated = vec![Vec3::ZERO; positions.len() / 3];
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let v0 = Vec3::new(positions[i0 * 3], positions[i0 * 3 + 1], positions[i0 * 3 + 2]);
        let v1 = Vec3::new(positions[i1 * 3], positions[i1 * 3 + 1], positions[i1 * 3 + 2]);
        let v2 = Vec3::new(positions[i2 * 3], positions[i2 * 3 + 1], positions[i2 * 3 + 2]);

        let face_normal = (v1 - v0).cross(v2 - v0);
        accumulated[i0] += face_normal;
        accumulated[i1] += face_normal;
        accumulated[i2] += face_normal;
    }

    accumulated
        .into_iter()
        .flat_map(|normal| normal.normalize_or_zero().to_array())
        .collect()
}

/// A loaded model resident on the GPU.
pub struct Model {
    mesh: Mesh,
}

impl Model {
    /// Uploads the decoded mesh data.
    pub fn new(gl: &Arc<glow::Context>, data: &ObjData) -> Self {
        Self {
            mesh: Mesh::new(gl, &data.vertices, &data.indices),
        }
    }

    /// Draws the model.
    pub fn draw(&self) {
        self.mesh.draw();
    }
}
