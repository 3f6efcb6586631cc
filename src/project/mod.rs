// Project module - multi-archive projects

mod descriptor;
mod model;

pub use descriptor::{ArchiveEntry, ProjectDescriptor};
pub use model::{ArchiveNode, ProjectModel};

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::discovery::{open_archive, ArchiveError, CoordinateError, Repository};
use crate::graph::{ArchiveIngest, IngestError, IngestOptions};

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("failed to read project descriptor {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown archive id `{id}`")]
    UnknownArchive { line: usize, id: String },

    #[error("line {line}: archive id `{id}` is declared twice")]
    DuplicateArchive { line: usize, id: String },

    #[error("line {line}: {source}")]
    Coordinate {
        line: usize,
        #[source]
        source: CoordinateError,
    },

    #[error("project descriptor declares no archives")]
    Empty,

    #[error("cannot open archive `{id}` ({coordinate})")]
    Archive {
        id: String,
        coordinate: String,
        #[source]
        source: ArchiveError,
    },

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Locate every archive of `model` under `repository` and ingest it in
/// classpath order. A missing archive is fatal.
pub fn ingest_from_repository(
    model: &mut ProjectModel,
    repository: &Repository,
    options: IngestOptions,
    mut on_archive: impl FnMut(&ArchiveNode, &ArchiveIngest),
) -> Result<(), ProjectError> {
    for index in model.ingestion_order() {
        let archive = model.archive(index);
        let path = repository.locate(&archive.coordinate);
        let mut source = open_archive(&path).map_err(|source| ProjectError::Archive {
            id: archive.id.clone(),
            coordinate: archive.coordinate.to_string(),
            source,
        })?;
        let ingest = model.ingest(index, &mut *source, options)?;
        on_archive(model.archive(index), &ingest);
    }
    info!(
        "Ingested {} classes from {} archives",
        model.extractor().len(),
        model.archives().len()
    );
    Ok(())
}
