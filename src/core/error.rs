use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Name '{name}' is too long ({len} bytes, max {capacity})")]
    NameTooLong {
        name: String,
        len: usize,
        capacity: usize,
    },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Nothing to archive: source tree contains no non-empty regular files")]
    EmptyArchive,

    #[error("Value does not fit the archive format: {0}")]
    TooLarge(String),

    #[error("Miscalculated directory entry count: need {required} slots, table has {capacity}")]
    TableOverflow { required: usize, capacity: usize },

    #[error("Bad archive - header corrupted or not present ({0} bytes)")]
    Truncated(usize),

    #[error("Bad archive - bad signature {0:#010x}")]
    InvalidMagic(u32),

    #[error("Bad archive - unsupported version {0}")]
    UnsupportedVersion(u16),

    #[error("Bad archive - root directory empty")]
    EmptyRoot,

    #[error("Bad archive - data offset incorrect (root needs {root_bytes} bytes, data starts at byte {data_start})")]
    BadDataOffset { root_bytes: u64, data_start: u64 },

    #[error("Bad archive - comment length out of range ({0})")]
    HeaderNameTooLong(u8),

    #[error("Bad archive - archive corrupted (needs {required} bytes, have {actual})")]
    DataRegionTruncated { required: u64, actual: u64 },

    #[error("Bad archive - entry block {offset}+{count} outside entry table of {capacity}")]
    EntryOutOfRange {
        offset: u32,
        count: u32,
        capacity: usize,
    },

    #[error("Bad archive - file '{name}' spans bytes outside the data region")]
    DataOutOfRange { name: String },

    #[error("Bad archive - {0}")]
    CorruptArchive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {path:?}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error reading {path:?}: expected {expected} bytes, got {actual}")]
    ShortRead {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ArchiveError {
    /// Attach the path an I/O failure happened on.
    pub(crate) fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::IoAt {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
