//! File access used by both pipeline stages.
//!
//! Every read and write goes through [`FileStore`] so the stages can run
//! against a real directory tree ([`DiskStore`]) or a map held in memory
//! ([`MemoryStore`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{Error, Result};

pub trait FileStore {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;
    fn create_dir_all(&mut self, path: &Path) -> Result<()>;
    /// Names of the regular files directly inside `dir`, sorted.
    fn list_files(&self, dir: &Path) -> Result<Vec<String>>;
    /// Paths of every regular file below `dir`, sorted. A missing directory
    /// yields nothing.
    fn walk_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|err| Error::io(path, err))
    }
    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|err| Error::io(path, err))
    }
    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|err| Error::io(path, err))
    }
    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Error::io(dir, err))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
    fn walk_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut walker = WalkBuilder::new(dir);
        walker
            .standard_filters(false)
            .follow_links(false)
            .threads(1);

        let mut files = Vec::new();
        for entry in walker.build() {
            let entry = entry.map_err(|source| Error::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            // Symlinks are neither followed nor collected.
            if entry.file_type().map_or(false, |kind| kind.is_file()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// A file tree kept entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        for ancestor in path.ancestors().skip(1) {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
        self.files.insert(path, contents.into());
    }
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}

impl FileStore for MemoryStore {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })
    }
    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.dirs.contains(parent) => {
                Err(Error::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "parent directory missing"),
                ))
            }
            _ => {
                self.files.insert(path.to_path_buf(), contents.to_string());
                Ok(())
            }
        }
    }
    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }
    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        if !self.dirs.contains(dir) {
            return Err(Error::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
            ));
        }
        Ok(self
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }
    fn walk_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .keys()
            .filter(|path| path.starts_with(dir) && path.as_path() != dir)
            .cloned()
            .collect())
    }
}
