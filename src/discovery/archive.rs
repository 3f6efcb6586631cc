//! Archive sources
//!
//! The analysis only needs two things from a container of class files: the
//! list of entry names and the bytes of an entry. Zip archives, exploded
//! directories and in-memory maps all provide that.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::parser::CLASS_SUFFIX;

/// Upper bound on the buffer reserved from a zip header's declared size
const MAX_RESERVED_ENTRY_BYTES: u64 = 1 << 20;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed zip archive {path}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("no entry `{entry}` in {archive}")]
    MissingEntry { archive: String, entry: String },
}

/// A container of named entries
pub trait ArchiveSource {
    /// Human readable name used in logs and reports
    fn label(&self) -> &str;

    /// All entry names, in a stable order
    fn entries(&mut self) -> Result<Vec<String>, ArchiveError>;

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError>;

    /// Entries that hold compiled classes
    fn class_entries(&mut self) -> Result<Vec<String>, ArchiveError> {
        Ok(self.entries()?.into_iter().filter(|name| is_class_entry(name)).collect())
    }
}

pub fn is_class_entry(name: &str) -> bool {
    name.ends_with(CLASS_SUFFIX)
}

/// Open a zip archive or an exploded class directory
pub fn open_archive(path: &Path) -> Result<Box<dyn ArchiveSource + Send>, ArchiveError> {
    if !path.exists() {
        return Err(ArchiveError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        debug!("Opening class directory: {}", path.display());
        Ok(Box::new(DirectoryArchive::new(path)))
    } else {
        debug!("Opening archive: {}", path.display());
        Ok(Box::new(ZipArchiveSource::open(path)?))
    }
}

/// A `.jar` (zip) file on disk
pub struct ZipArchiveSource {
    path: PathBuf,
    label: String,
    archive: zip::ZipArchive<BufReader<File>>,
}

impl ZipArchiveSource {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            label: path.display().to_string(),
            archive,
        })
    }
}

impl ArchiveSource for ZipArchiveSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn entries(&mut self) -> Result<Vec<String>, ArchiveError> {
        let mut names = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let entry = self.archive.by_index(index).map_err(|source| ArchiveError::Zip {
                path: self.path.clone(),
                source,
            })?;
            if !entry.is_dir() {
                names.push(entry.name().to_string());
            }
        }
        Ok(names)
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let path = self.path.clone();
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ArchiveError::MissingEntry {
                    archive: self.label.clone(),
                    entry: name.to_string(),
                })
            }
            Err(source) => return Err(ArchiveError::Zip { path, source }),
        };
        let mut bytes = Vec::with_capacity(entry.size().min(MAX_RESERVED_ENTRY_BYTES) as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| ArchiveError::Io { path, source })?;
        Ok(bytes)
    }
}

/// A directory of class files laid out by package (`a/b/C.class`)
pub struct DirectoryArchive {
    root: PathBuf,
    label: String,
}

impl DirectoryArchive {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            label: root.display().to_string(),
        }
    }
}

impl ArchiveSource for DirectoryArchive {
    fn label(&self) -> &str {
        &self.label
    }

    fn entries(&mut self) -> Result<Vec<String>, ArchiveError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| ArchiveError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            trace!("Found entry: {}", name);
            names.push(name);
        }
        Ok(names)
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(ArchiveError::MissingEntry {
                archive: self.label.clone(),
                entry: name.to_string(),
            });
        }
        std::fs::read(&path).map_err(|source| ArchiveError::Io { path, source })
    }
}

/// Entries held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    label: String,
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(name.into(), bytes);
    }
}

impl ArchiveSource for MemoryArchive {
    fn label(&self) -> &str {
        &self.label
    }

    fn entries(&mut self) -> Result<Vec<String>, ArchiveError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.entries.get(name).cloned().ok_or_else(|| ArchiveError::MissingEntry {
            archive: self.label.clone(),
            entry: name.to_string(),
        })
    }
}
