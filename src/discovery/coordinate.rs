use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Scope used when a coordinate does not name one
pub const DEFAULT_SCOPE: &str = "root";

/// Classifier that stands for the main artifact
const MAIN_CLASSIFIER: &str = "jar";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid archive coordinate `{0}` (expected group:artifact:classifier:version[:scope])")]
pub struct CoordinateError(pub String);

/// Identity of an archive in a package repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArchiveCoordinate {
    pub group: String,
    pub artifact: String,
    pub classifier: String,
    pub version: String,
    pub scope: String,
}

impl ArchiveCoordinate {
    /// Classifier as used in file names; `jar` and the empty string mean none
    pub fn file_classifier(&self) -> Option<&str> {
        match self.classifier.as_str() {
            "" | MAIN_CLASSIFIER => None,
            other => Some(other),
        }
    }

    /// `group/as/dirs/artifact/version/artifact-version[-classifier].jar`
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.artifact);
        path.push(&self.version);
        let file = match self.file_classifier() {
            Some(classifier) => format!("{}-{}-{}.jar", self.artifact, self.version, classifier),
            None => format!("{}-{}.jar", self.artifact, self.version),
        };
        path.push(file);
        path
    }
}

impl FromStr for ArchiveCoordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().splitn(5, ':').collect();
        if parts.len() < 4 || parts[0].is_empty() || parts[1].is_empty() || parts[3].is_empty() {
            return Err(CoordinateError(s.to_string()));
        }
        let scope = parts.get(4).map(|s| s.trim()).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SCOPE);
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            classifier: parts[2].to_string(),
            version: parts[3].to_string(),
            scope: scope.to_string(),
        })
    }
}

impl fmt::Display for ArchiveCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.group, self.artifact, self.classifier, self.version, self.scope
        )
    }
}

/// Local package repository laid out by coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn locate(&self, coordinate: &ArchiveCoordinate) -> PathBuf {
        self.root.join(coordinate.relative_path())
    }
}
