//! Where asset bytes come from: a directory on disk or an in-memory table.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader, Cursor},
    path::{Path, PathBuf},
};

/// Directory layout the importer reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRoots {
    /// Geometry and material libraries.
    pub meshes: PathBuf,
    pub textures: PathBuf,
}

impl AssetRoots {
    pub fn new(meshes: impl Into<PathBuf>, textures: impl Into<PathBuf>) -> Self {
        Self {
            meshes: meshes.into(),
            textures: textures.into(),
        }
    }
}

impl Default for AssetRoots {
    fn default() -> Self {
        Self::new("meshes", "textures")
    }
}

/// Opens a named asset as a line reader. A missing asset must surface as
/// [`io::ErrorKind::NotFound`].
pub trait AssetSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>>;

    /// Path used in log and error messages.
    fn display_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Files below a root directory.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(self.root.join(path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn display_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// Assets held in memory, keyed by their relative path.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn with(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl AssetSource for MemorySource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        let contents = self.files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory asset at {}", path.display()),
            )
        })?;
        Ok(Box::new(Cursor::new(contents.as_bytes())))
    }
}

/// Line iterator that decodes each line as UTF-8, replacing invalid bytes with
/// U+FFFD instead of failing. Trailing `\n` / `\r\n` are stripped.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

/// Lossy counterpart of [`BufRead::lines`].
pub fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn memory_source_serves_inserted_files() {
        let source = MemorySource::new().with("a.obj", "v 0 0 0\n");
        let mut text = String::new();
        source
            .open(Path::new("a.obj"))
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "v 0 0 0\n");
    }

    #[test]
    fn memory_source_reports_not_found() {
        let source = MemorySource::new();
        let err = source.open(Path::new("missing.obj")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn fs_source_resolves_against_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.obj"), "v 1 2 3\n").unwrap();

        let source = FsSource::new(dir.path());
        let mut text = String::new();
        source
            .open(Path::new("tri.obj"))
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "v 1 2 3\n");
        assert_eq!(
            source.display_path(Path::new("tri.obj")),
            dir.path().join("tri.obj")
        );

        let err = source.open(Path::new("other.obj")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn lossy_lines_replace_invalid_bytes() {
        let bytes: &[u8] = b"# Caf\xe9\r\nv 1 2 3\nlast";
        let lines: Vec<String> = lossy_lines(Cursor::new(bytes))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, ["# Caf\u{FFFD}", "v 1 2 3", "last"]);
    }

    #[test]
    fn default_roots() {
        let roots = AssetRoots::default();
        assert_eq!(roots.meshes, PathBuf::from("meshes"));
        assert_eq!(roots.textures, PathBuf::from("textures"));
    }
}
