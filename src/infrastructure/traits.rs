//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::{Node, OutlineItem, PageHandle};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    ///
    /// The content goes to a temporary sibling first and replaces `path` only
    /// once fully written, so a failure never leaves a truncated file behind.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Regular files in `dir`; subdirectories are descended only if `recursive`.
    fn list_files(&self, dir: &Path, recursive: bool) -> io::Result<Vec<PathBuf>>;
}

/// Source document as seen by the outline service.
///
/// Existing outline nesting is not part of this contract: `read_outline`
/// returns all items in document order as one flat list.
pub trait Document {
    /// Pages in document order, numbered from 1.
    fn list_pages(&self) -> Vec<PageHandle>;

    /// Bookmarks in pre-order, nesting flattened.
    fn read_outline(&self) -> Vec<OutlineItem>;

    /// Write a copy of this document carrying `forest` as its outline.
    ///
    /// Every node becomes one outline item under its parent's item, pointing at
    /// page index `page_number - 1`. Nothing is written to `output` unless the
    /// whole document serialized successfully.
    fn write_outline(&self, forest: &[Node], output: &Path) -> io::Result<()>;
}

/// Opens documents from disk.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> io::Result<Box<dyn Document>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

/// Write `path` through a temporary file in the same directory.
pub(crate) fn persist_atomic(
    path: &Path,
    write: impl FnOnce(&mut tempfile::NamedTempFile) -> io::Result<()>,
) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write(&mut tmp)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        persist_atomic(path, |tmp| tmp.write_all(content.as_bytes()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        let walker = WalkDir::new(dir).min_depth(1);
        let walker = if recursive {
            walker
        } else {
            walker.max_depth(1)
        };

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
