//! Mesh asset factory: name → format loader → immutable [`MeshAsset`].

use std::{collections::HashMap, path::Path, sync::Arc};

use corelib::{AssetError, AssetResult};
use parking_lot::Mutex;

use crate::{
    builder::build_buffers,
    material::Material,
    mesh::MeshAsset,
    mtl::parse_mtl,
    obj::{ParsedMeshData, parse_obj},
    source::{AssetRoots, AssetSource, FsSource},
    texture::{ImageTextureLoader, TextureCache, TextureLoader},
};

/// Geometry formats the factory can dispatch to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshFormat {
    Wavefront,
}

impl MeshFormat {
    /// Pick the loader from the asset name's extension.
    pub fn from_name(name: &str) -> AssetResult<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if ext.eq_ignore_ascii_case("obj") {
            Ok(Self::Wavefront)
        } else {
            Err(AssetError::configuration(format!(
                "Unable to load mesh '{}': unsupported format",
                name
            )))
        }
    }
}

/// Materials of one parsed library, shared by every mesh that references it.
type MaterialLibrary = Arc<[Arc<Material>]>;

/// Loads meshes by name. Holds the process-lifetime texture and material
/// library caches; everything else is per call, so `create` can run from
/// several threads at once.
pub struct MeshFactory<S, L> {
    source: S,
    textures: TextureCache<L>,
    libraries: Mutex<HashMap<String, MaterialLibrary>>,
}

impl MeshFactory<FsSource, ImageTextureLoader> {
    /// Factory reading geometry from `roots.meshes` and decoding textures from `roots.textures`.
    pub fn from_roots(roots: &AssetRoots) -> Self {
        Self::new(
            FsSource::new(&roots.meshes),
            ImageTextureLoader::new(&roots.textures),
        )
    }
}

impl<S: AssetSource, L: TextureLoader> MeshFactory<S, L> {
    pub fn new(source: S, loader: L) -> Self {
        Self {
            source,
            textures: TextureCache::new(loader),
            libraries: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn textures(&self) -> &TextureCache<L> {
        &self.textures
    }

    pub fn create(&self, name: &str) -> AssetResult<MeshAsset> {
        if name.is_empty() {
            return Err(AssetError::configuration("Mesh name is empty"));
        }

        let asset = match MeshFormat::from_name(name)? {
            MeshFormat::Wavefront => self.load_wavefront(name)?,
        };

        log::info!(
            "Loaded mesh '{}': {} vertices, {} triangles, material '{}'",
            asset.name(),
            asset.vertex_count(),
            asset.triangle_count(),
            asset.material().name
        );
        Ok(asset)
    }

    fn load_wavefront(&self, name: &str) -> AssetResult<MeshAsset> {
        let path = Path::new(name);
        let reader = self
            .source
            .open(path)
            .map_err(|e| AssetError::from_io(self.source.display_path(path), e))?;
        let data = parse_obj(reader, name)?;

        let materials = self.load_materials(&data);
        let material = select_material(&materials, data.material_name.as_deref())
            .unwrap_or_else(|| Arc::new(Material::fallback_for(name)));

        let buffers = build_buffers(&data, name)?;
        Ok(MeshAsset::new(name, buffers, material))
    }

    /// Materials from every referenced library, in order. Libraries that are
    /// missing or unreadable contribute nothing.
    fn load_materials(&self, data: &ParsedMeshData) -> Vec<Arc<Material>> {
        let mut materials = Vec::new();
        for library in &data.material_libraries {
            if let Some(parsed) = self.library(library) {
                materials.extend(parsed.iter().cloned());
            }
        }
        materials
    }

    /// Parsed library by path, from the cache when already read. Absent
    /// libraries are not cached, so a later load looks again.
    fn library(&self, library: &str) -> Option<MaterialLibrary> {
        if let Some(cached) = self.libraries.lock().get(library) {
            return Some(Arc::clone(cached));
        }

        let path = Path::new(library);
        let reader = match self.source.open(path) {
            Ok(reader) => reader,
            Err(err) => {
                log::warn!(
                    "Material library {} unavailable ({}); continuing without it",
                    self.source.display_path(path).display(),
                    err
                );
                return None;
            }
        };
        let parsed: MaterialLibrary = parse_mtl(reader, library, &self.textures)
            .into_iter()
            .map(Arc::new)
            .collect();

        // First insert wins when two loads parsed the same library concurrently.
        let mut libraries = self.libraries.lock();
        let entry = libraries.entry(library.to_owned()).or_insert(parsed);
        Some(Arc::clone(entry))
    }
}

/// The material named by `usemtl` when present in the libraries, else the first one declared.
fn select_material(materials: &[Arc<Material>], wanted: Option<&str>) -> Option<Arc<Material>> {
    if let Some(wanted) = wanted {
        if let Some(found) = materials.iter().find(|m| m.name == wanted) {
            return Some(Arc::clone(found));
        }
        log::debug!("usemtl '{}' not found in loaded libraries", wanted);
    }
    materials.first().cloned()
}
