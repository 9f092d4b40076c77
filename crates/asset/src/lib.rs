//! Asset loading: Wavefront OBJ geometry, MTL materials and their textures.
//!
//! Pipeline: text → [`obj::ParsedMeshData`] → [`mesh::MeshBuffers`] →
//! [`mesh::MeshAsset`]. [`factory::MeshFactory`] drives it for an asset name.

pub mod builder;
pub mod factory;
pub mod material;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod source;
pub mod texture;

pub use corelib::{AssetError, AssetResult};
pub use factory::{MeshFactory, MeshFormat};
pub use material::Material;
pub use mesh::{MeshAsset, MeshBuffers, VERTEX_STRIDE, Vertex};
pub use source::{AssetRoots, AssetSource, FsSource, MemorySource};
pub use texture::{ImageTextureLoader, TextureCache, TextureData, TextureHandle, TextureLoader};
