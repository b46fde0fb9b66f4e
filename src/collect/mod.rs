//! Local scaffold collection.
//!
//! Walks a rendered scaffold directory and loads every regular file into a
//! [`FileSet`] keyed by the path it will have in the remote repository.

mod fs_scan;

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use fs_scan::collect_files;

/// How many leading components of each walked path to drop when deriving
/// its remote-relative key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripPrefix {
    /// Strip exactly the components of the root path that was walked, so
    /// `<root>/a/b.txt` becomes `a/b.txt`.
    #[default]
    Root,
    /// Strip a fixed number of leading components.
    Segments(usize),
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to walk {}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} has no remote path left after stripping {strip} segments", .path.display())]
    EmptyKey { path: PathBuf, strip: usize },
}

/// Remote-relative path → file content.
///
/// Keys are `/`-separated and unique; only leaf files are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<String, Vec<u8>>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file, returning the previous content stored under `path`.
    pub fn insert(&mut self, path: impl Into<String>, content: Vec<u8>) -> Option<Vec<u8>> {
        self.files.insert(path.into(), content)
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn total_bytes(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// SHA-256 of the content stored under `path`, hex encoded.
    pub fn digest(&self, path: &str) -> Option<String> {
        self.get(path).map(|bytes| hex::encode(Sha256::digest(bytes)))
    }
}
