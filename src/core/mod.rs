//! Pagearc archive format
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Bytes 0..64: Header                         │
//! │  - Magic "os99", version 0                  │
//! │  - Root entry count, data offset/length     │
//! │  - Optional 47-byte name                    │
//! ├─────────────────────────────────────────────┤
//! │ Bytes 64..: Directory entry table           │
//! │  - 64-byte entries, root block at index 0   │
//! │  - One contiguous block per directory       │
//! │  - Zero padding to the next page            │
//! ├─────────────────────────────────────────────┤
//! │ Page data_offset..: Data region             │
//! │  - Every file starts on a page boundary     │
//! │  - Zero padding after each file             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! - [`header`] - header codec and header-only validation
//! - [`dirent`] - directory entry codec
//! - [`page`] - page arithmetic and borrowed page views
//! - [`tree`] - source directory scan
//! - [`flatten`] - tree to entry table
//! - [`writer`] - archive output
//! - [`reader`] - validation, listing and extraction

pub mod dirent;
pub mod error;
pub mod flatten;
pub mod header;
pub mod page;
pub mod reader;
pub mod tree;
pub mod writer;

pub use dirent::{DirEntry, DIRENT_SIZE};
pub use error::{ArchiveError, Result};
pub use header::{Header, PAGE_SIZE};
pub use reader::{Archive, ExtractStats, ListedEntry};
pub use tree::SourceTree;
pub use writer::{ArchiveWriter, PackOptions, PackStats};
