//! In-memory content trees for workspace payloads
//!
//! A [`ContentTree`] holds every file of a workspace as opaque bytes keyed by
//! its workspace-relative path. Paths are stored with `/` separators and kept
//! in a `BTreeMap`, so iteration order is deterministic across runs and
//! platforms.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A single file payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Ordered set of workspace-relative files and their payloads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTree {
    files: BTreeMap<String, File>,
}

impl ContentTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every regular file below `root`.
    ///
    /// `keep` receives the normalised relative path and decides whether the
    /// file belongs to the tree. Directories whose name starts with `.` are
    /// not descended into (`.git`, `.github`), but dot-files inside item
    /// folders such as `.platform` are kept.
    pub fn load_dir<F>(root: &Path, keep: F) -> Result<Self>
    where
        F: Fn(&str) -> bool,
    {
        let mut tree = Self::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            let entry = entry.map_err(|e| Error::Filesystem {
                message: format!("Failed to walk '{}': {}", root.display(), e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).map_err(|e| Error::Filesystem {
                message: format!("Path '{}' escapes root: {}", entry.path().display(), e),
            })?;
            let relative = normalize(relative);
            if !keep(&relative) {
                continue;
            }

            let content = fs::read(entry.path()).map_err(|e| Error::Filesystem {
                message: format!("Failed to read '{}': {}", entry.path().display(), e),
            })?;
            tree.files.insert(relative, File::new(content));
        }

        debug!("Loaded {} file(s) from {}", tree.len(), root.display());
        Ok(tree)
    }

    /// Add or update a file
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) {
        self.files.insert(normalize(path.as_ref()), file);
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) {
        self.add_file(path, File::from_string(content));
    }

    /// Get a file by relative path
    pub fn get_file(&self, path: &str) -> Option<&File> {
        self.files.get(path)
    }

    /// Get a file's content as UTF-8 text, if it is valid UTF-8
    pub fn get_text(&self, path: &str) -> Option<&str> {
        self.get_file(path)
            .and_then(|f| std::str::from_utf8(&f.content).ok())
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total payload size in bytes
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(File::size).sum()
    }

    /// Iterate over all files in path order
    pub fn files(&self) -> impl Iterator<Item = (&str, &File)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    /// Write every file below `output_path`, creating parent directories.
    pub fn write_to(&self, output_path: &Path) -> Result<()> {
        for (relative_path, file) in &self.files {
            let full_path = output_path.join(relative_path);

            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                    message: format!("Failed to create directory '{}': {}", parent.display(), e),
                })?;
            }

            fs::write(&full_path, &file.content).map_err(|e| Error::Filesystem {
                message: format!("Failed to write file '{}': {}", full_path.display(), e),
            })?;
        }

        Ok(())
    }
}

/// Render a relative path with `/` separators regardless of platform
fn normalize(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
