//! Collaborator contracts for reading sources and persisting artifacts

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Encoding;

/// Supplies file content by name
pub trait ProjectSource: Send + Sync {
    /// Decoded content of `name`, or `None` if it does not exist
    fn file_content(&self, name: &str) -> Option<String>;
}

/// Persists generated files
pub trait ArtifactSink: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Write the whole file; readers never observe partial content
    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Remove a file; a missing file is not an error
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// Files below a root directory
#[derive(Debug, Clone)]
pub struct FsProject {
    root: PathBuf,
    encoding: Encoding,
}

impl FsProject {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, encoding: Encoding) -> Self {
        Self {
            root: root.into(),
            encoding,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ProjectSource for FsProject {
    fn file_content(&self, name: &str) -> Option<String> {
        let path = self.root.join(name);
        let bytes = std::fs::read(&path).ok()?;
        match self.encoding.decode(&bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("{}: not valid {} text: {e}", path.display(), self.encoding.name());
                None
            }
        }
    }
}

/// Writes to a temporary file next to the destination, then renames it into place
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl ArtifactSink for FsSink {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(bytes)?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
