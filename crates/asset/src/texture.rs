//! Texture collaborator: handles, the process-wide path cache and an
//! image-backed loader that decodes PNG/TGA into RGBA8.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::{Context, Result};
use parking_lot::Mutex;

/// Opaque reference to a texture owned by a [`TextureLoader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// Bound whenever a material names no texture, so binding always has a target.
    pub const MISSING: TextureHandle = TextureHandle(0);

    #[inline]
    pub fn is_missing(self) -> bool {
        self == Self::MISSING
    }
}

impl Default for TextureHandle {
    fn default() -> Self {
        Self::MISSING
    }
}

/// Turns a texture path (relative to the texture root) into a handle.
/// Implementations must never hand out [`TextureHandle::MISSING`] for a real texture.
pub trait TextureLoader {
    fn load_texture(&self, path: &str) -> Result<TextureHandle>;
}

/// Per-path slot; `None` until a load succeeds.
type TextureSlot = Arc<Mutex<Option<TextureHandle>>>;

/// Path → handle cache in front of a loader. Append-only: a path that loaded
/// once is never handed to the loader again. Failed loads are not cached.
pub struct TextureCache<L> {
    loader: L,
    entries: Mutex<HashMap<String, TextureSlot>>,
    loaded: AtomicUsize,
}

impl<L: TextureLoader> TextureCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
            loaded: AtomicUsize::new(0),
        }
    }

    /// Get-or-load. Callers racing on one path wait on that path's slot and
    /// share a single load; different paths load in parallel.
    pub fn resolve(&self, path: &str) -> Result<TextureHandle> {
        let slot = Arc::clone(self.entries.lock().entry(path.to_owned()).or_default());

        let mut cached = slot.lock();
        if let Some(handle) = *cached {
            return Ok(handle);
        }

        let loaded = self
            .loader
            .load_texture(path)
            .with_context(|| format!("Failed to load texture '{}'", path))?;
        log::debug!("Texture '{}' -> {:?}", path, loaded);
        *cached = Some(loaded);
        self.loaded.fetch_add(1, Ordering::Relaxed);
        Ok(loaded)
    }

    /// Number of paths that loaded successfully.
    pub fn len(&self) -> usize {
        self.loaded.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Pixel layout of [`TextureData::data`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

const MISSING_TEXTURE_SIZE: u32 = 16;

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Decode a PNG or TGA file (format picked from the extension) into RGBA8.
    /// Images with no pixels are rejected.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let rgba = image::open(path)
            .with_context(|| format!("Failed to open image {:?}", path))?
            .into_rgba8();
        let (width, height) = rgba.dimensions();

        let texture = Self::new_rgba8(width, height, rgba.into_raw());
        anyhow::ensure!(texture.is_valid(), "Image {:?} has no pixels", path);
        log::info!("Loaded texture {:?}: {}x{}", path, width, height);
        Ok(texture)
    }

    /// Opaque white square bound in place of absent textures.
    pub fn missing() -> Self {
        let size = MISSING_TEXTURE_SIZE;
        Self::new_rgba8(size, size, vec![255; (size * size * 4) as usize])
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Non-empty and `data` covers exactly `width * height` pixels.
    pub fn is_valid(&self) -> bool {
        let pixels = self.width as usize * self.height as usize;
        pixels > 0 && self.data.len() == pixels * self.bytes_per_pixel() as usize
    }
}

/// Decodes textures below a root directory and keeps them for the renderer.
/// Slot 0 always holds [`TextureData::missing`].
pub struct ImageTextureLoader {
    root: PathBuf,
    textures: Mutex<Vec<Arc<TextureData>>>,
}

impl ImageTextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            textures: Mutex::new(vec![Arc::new(TextureData::missing())]),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, handle: TextureHandle) -> Option<Arc<TextureData>> {
        self.textures.lock().get(handle.0 as usize).cloned()
    }

    /// Number of stored textures, the missing texture included.
    pub fn len(&self) -> usize {
        self.textures.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load_texture(&self, path: &str) -> Result<TextureHandle> {
        let texture = TextureData::load(self.root.join(path))?;
        let mut textures = self.textures.lock();
        let id = u32::try_from(textures.len())
            .map_err(|_| anyhow::anyhow!("Too many textures (>{})", u32::MAX))?;
        textures.push(Arc::new(texture));
        Ok(TextureHandle(id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Barrier, atomic::AtomicU32};

    use super::*;

    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicU32,
    }

    impl TextureLoader for CountingLoader {
        fn load_texture(&self, path: &str) -> Result<TextureHandle> {
            if path.starts_with("broken") {
                anyhow::bail!("cannot decode {}", path);
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TextureHandle(n + 1))
        }
    }

    /// Blocks every load until `expected` loads are in flight at once.
    struct RendezvousLoader {
        barrier: Barrier,
        calls: AtomicU32,
    }

    impl TextureLoader for RendezvousLoader {
        fn load_texture(&self, _path: &str) -> Result<TextureHandle> {
            self.barrier.wait();
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TextureHandle(n + 1))
        }
    }

    #[test]
    fn cache_loads_each_path_once() {
        let cache = TextureCache::new(CountingLoader::default());
        let a = cache.resolve("wood.png").unwrap();
        let b = cache.resolve("wood.png").unwrap();
        let c = cache.resolve("stone.png").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.loader().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache = TextureCache::new(CountingLoader::default());
        assert!(cache.resolve("broken.png").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_load_can_be_retried() {
        let cache = TextureCache::new(CountingLoader::default());
        assert!(cache.resolve("broken.png").is_err());
        assert!(cache.resolve("broken.png").is_err());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn different_paths_load_concurrently() {
        // Both loads must be in flight together to pass the barrier.
        let cache = TextureCache::new(RendezvousLoader {
            barrier: Barrier::new(2),
            calls: AtomicU32::new(0),
        });
        std::thread::scope(|scope| {
            let a = scope.spawn(|| cache.resolve("wood.png").unwrap());
            let b = scope.spawn(|| cache.resolve("stone.png").unwrap());
            assert_ne!(a.join().unwrap(), b.join().unwrap());
        });
        assert_eq!(cache.loader().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn same_path_races_share_one_load() {
        let cache = TextureCache::new(CountingLoader::default());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| cache.resolve("wood.png").unwrap());
            }
        });
        assert_eq!(cache.loader().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_texture_is_invalid() {
        assert!(!TextureData::new_rgba8(0, 4, Vec::new()).is_valid());
        assert!(TextureData::new_rgba8(1, 1, vec![0; 4]).is_valid());
    }

    #[test]
    fn missing_texture_is_white() {
        let tex = TextureData::missing();
        assert!(tex.is_valid());
        assert_eq!(tex.width, 16);
        assert!(tex.data.iter().all(|&b| b == 255));
    }

    #[test]
    fn image_loader_reserves_missing_slot() {
        let loader = ImageTextureLoader::new("textures");
        let missing = loader.get(TextureHandle::MISSING).expect("missing slot");
        assert_eq!(missing.width, 16);
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn image_loader_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        img.save(dir.path().join("tiny.png")).unwrap();

        let loader = ImageTextureLoader::new(dir.path());
        let handle = loader.load_texture("tiny.png").unwrap();
        assert!(!handle.is_missing());

        let tex = loader.get(handle).unwrap();
        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(&tex.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn image_loader_reports_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ImageTextureLoader::new(dir.path());
        assert!(loader.load_texture("nope.png").is_err());
        assert_eq!(loader.len(), 1);
    }
}
