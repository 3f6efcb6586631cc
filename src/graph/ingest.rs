//! Archive ingestion
//!
//! Reads every class entry of an archive and records its dependencies with
//! the extractor. A unit's dependencies are committed only once it has been
//! decoded completely, so a malformed class never leaves partial state.

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::discovery::{ArchiveError, ArchiveSource};
use crate::parser::{extract, DecodeError, DependencyExtractor, UnitDependencies, Visit};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("failed to decode {entry} in {archive}")]
    Decode {
        archive: String,
        entry: String,
        #[source]
        source: DecodeError,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Fail on the first undecodable class instead of skipping it
    pub strict: bool,

    /// Decode entries on the rayon thread pool
    pub parallel: bool,
}

/// A class entry that could not be decoded
#[derive(Debug, Clone)]
pub struct SkippedUnit {
    pub entry: String,
    pub error: DecodeError,
}

/// What one archive contributed
#[derive(Debug, Clone, Default)]
pub struct ArchiveIngest {
    pub label: String,

    /// Class names in entry order, with whether each was new to the extractor
    pub units: Vec<(String, Visit)>,

    pub skipped: Vec<SkippedUnit>,
}

impl ArchiveIngest {
    pub fn recorded(&self) -> usize {
        self.units.iter().filter(|(_, visit)| *visit == Visit::Recorded).count()
    }
}

/// Ingest every class entry of `source` into `extractor`.
///
/// Parallel mode reads entries sequentially, extracts on worker threads and
/// commits in entry order, so the outcome matches sequential mode.
pub fn ingest_archive(
    extractor: &mut DependencyExtractor,
    source: &mut dyn ArchiveSource,
    options: IngestOptions,
) -> Result<ArchiveIngest, IngestError> {
    let label = source.label().to_string();
    let entries = source.class_entries()?;
    debug!("{}: {} class entries", label, entries.len());

    let mut ingest = ArchiveIngest {
        label,
        ..ArchiveIngest::default()
    };

    if options.parallel {
        let mut blobs = Vec::with_capacity(entries.len());
        for entry in entries {
            let bytes = source.read_entry(&entry)?;
            blobs.push((entry, bytes));
        }
        let system = extractor.system().clone();
        let results: Vec<(String, Result<UnitDependencies, DecodeError>)> = blobs
            .into_par_iter()
            .map(|(entry, bytes)| {
                let unit = extract(&bytes, &system);
                (entry, unit)
            })
            .collect();

        for (entry, unit) in results {
            commit(extractor, &mut ingest, entry, unit, options.strict)?;
        }
    } else {
        for entry in entries {
            let bytes = source.read_entry(&entry)?;
            let unit = extract(&bytes, extractor.system());
            commit(extractor, &mut ingest, entry, unit, options.strict)?;
        }
    }

    if !ingest.skipped.is_empty() {
        warn!("{}: skipped {} undecodable classes", ingest.label, ingest.skipped.len());
    }
    Ok(ingest)
}

fn commit(
    extractor: &mut DependencyExtractor,
    ingest: &mut ArchiveIngest,
    entry: String,
    unit: Result<UnitDependencies, DecodeError>,
    strict: bool,
) -> Result<(), IngestError> {
    match unit {
        Ok(unit) => {
            let name = unit.name.clone();
            let visit = extractor.record(unit);
            ingest.units.push((name, visit));
        }
        Err(source) if strict => {
            return Err(IngestError::Decode {
                archive: ingest.label.clone(),
                entry,
                source,
            });
        }
        Err(error) => {
            warn!("Skipping {} in {}: {}", entry, ingest.label, error);
            ingest.skipped.push(SkippedUnit { entry, error });
        }
    }
    Ok(())
}
