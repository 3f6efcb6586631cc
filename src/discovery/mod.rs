// Discovery module - archive sources and repository layout

mod archive;
mod coordinate;

pub use archive::{
    is_class_entry, open_archive, ArchiveError, ArchiveSource, DirectoryArchive, MemoryArchive, ZipArchiveSource,
};
pub use coordinate::{ArchiveCoordinate, CoordinateError, Repository, DEFAULT_SCOPE};
