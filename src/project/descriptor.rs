//! Project descriptor
//!
//! ```text
//! app com.acme:app:jar:1.0
//! core com.acme:core:jar:1.0:compile
//! #
//! app core
//! ```
//!
//! Archive lines come first (`id coordinate`), then a line holding only
//! `#`, then one `parent child` classpath edge per line. Blank lines are
//! ignored, as are tokens after the child id.

use std::collections::HashMap;
use std::path::Path;

use super::ProjectError;
use crate::discovery::ArchiveCoordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub id: String,
    pub coordinate: ArchiveCoordinate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectDescriptor {
    /// Archives in declaration order; the first is the project's own archive
    pub archives: Vec<ArchiveEntry>,

    /// `(parent, child)` positions into `archives`
    pub edges: Vec<(usize, usize)>,
}

impl ProjectDescriptor {
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ProjectError> {
        let mut descriptor = Self::default();
        let mut ids: HashMap<&str, usize> = HashMap::new();
        let mut in_edges = false;

        for (number, line) in text.lines().enumerate() {
            let line_no = number + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "#" {
                in_edges = true;
                continue;
            }

            let mut tokens = line.split_whitespace();
            let (Some(first), Some(second)) = (tokens.next(), tokens.next()) else {
                return Err(ProjectError::Syntax {
                    line: line_no,
                    message: format!("expected two fields, found `{}`", line),
                });
            };

            if in_edges {
                let lookup = |id: &str| {
                    ids.get(id).copied().ok_or_else(|| ProjectError::UnknownArchive {
                        line: line_no,
                        id: id.to_string(),
                    })
                };
                let edge = (lookup(first)?, lookup(second)?);
                descriptor.edges.push(edge);
            } else {
                if tokens.next().is_some() {
                    return Err(ProjectError::Syntax {
                        line: line_no,
                        message: format!("unexpected text after coordinate in `{}`", line),
                    });
                }
                if ids.contains_key(first) {
                    return Err(ProjectError::DuplicateArchive {
                        line: line_no,
                        id: first.to_string(),
                    });
                }
                let coordinate = second
                    .parse()
                    .map_err(|source| ProjectError::Coordinate { line: line_no, source })?;
                ids.insert(first, descriptor.archives.len());
                descriptor.archives.push(ArchiveEntry {
                    id: first.to_string(),
                    coordinate,
                });
            }
        }

        if descriptor.archives.is_empty() {
            return Err(ProjectError::Empty);
        }
        Ok(descriptor)
    }
}
