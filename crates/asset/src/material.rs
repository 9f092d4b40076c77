//! Surface description attached to every mesh.

use corelib::Vec3;

use crate::texture::TextureHandle;

/// Phong-style material as described by an MTL `newmtl` block.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub emissive_color: Vec3,
    /// `Ns`
    pub specular_factor: f32,
    /// `d`; 0.0 means unset.
    pub dissolve_factor: f32,
    pub ambient_texture: TextureHandle,
    pub diffuse_texture: TextureHandle,
    pub specular_texture: TextureHandle,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient_color: Vec3::ONE,
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ZERO,
            emissive_color: Vec3::ZERO,
            specular_factor: 1.0,
            dissolve_factor: 0.0,
            ambient_texture: TextureHandle::MISSING,
            diffuse_texture: TextureHandle::MISSING,
            specular_texture: TextureHandle::MISSING,
        }
    }

    /// Material used when a mesh declares none.
    pub fn fallback_for(asset_name: &str) -> Self {
        Self::new(format!("material {}", asset_name))
    }

    /// Packs the colors and factors into four vec4 rows, as the shaders read them:
    /// `[Ka, d] [Kd, 1] [Ks, Ns] [Ke, 1]`.
    #[rustfmt::skip]
    pub fn uniform(&self) -> [f32; 16] {
        let a = self.ambient_color;
        let d = self.diffuse_color;
        let s = self.specular_color;
        let e = self.emissive_color;
        [
            a.x, a.y, a.z, self.dissolve_factor,
            d.x, d.y, d.z, 1.0,
            s.x, s.y, s.z, self.specular_factor,
            e.x, e.y, e.z, 1.0,
        ]
    }
}
