//! CPU-side mesh representation handed to the renderer.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::material::Material;

/// Floats per interleaved vertex: position(3) + uv(2) + normal(3).
pub const VERTEX_STRIDE: usize = 8;
pub const POSITION_OFFSET: usize = 0;
pub const TEXCOORD_OFFSET: usize = 3;
pub const NORMAL_OFFSET: usize = 5;

/// One interleaved vertex, layout-compatible with a [`VERTEX_STRIDE`] float run.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// Interleaved vertex buffer plus `u32` triangle-list indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }
}

/// Immutable result of a mesh load.
#[derive(Clone, Debug)]
pub struct MeshAsset {
    name: String,
    buffers: MeshBuffers,
    material: Arc<Material>,
}

impl MeshAsset {
    pub fn new(name: impl Into<String>, buffers: MeshBuffers, material: Arc<Material>) -> Self {
        Self {
            name: name.into(),
            buffers,
            material,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interleaved floats, [`VERTEX_STRIDE`] per vertex.
    pub fn vertex_buffer(&self) -> &[f32] {
        &self.buffers.vertices
    }

    pub fn index_buffer(&self) -> &[u32] {
        &self.buffers.indices
    }

    pub fn vertices(&self) -> &[Vertex] {
        bytemuck::cast_slice(&self.buffers.vertices)
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buffers.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buffers.indices)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.buffers.vertex_count()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.buffers.indices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }
}
