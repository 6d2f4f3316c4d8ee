//! # Pagearc - Page-Aligned Container Archives
//!
//! `pagearc` packs a directory tree into a single flat file whose file
//! contents each start on a 4 KiB page boundary, and unpacks it again.
//! There is no compression and no checksumming: the format exists so file
//! data can be read or mapped in place at page-aligned offsets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagearc::{pack_directory, unpack_archive, PackOptions, Result};
//!
//! # fn main() -> Result<()> {
//! let stats = pack_directory("assets", "assets.arc", &PackOptions::new().name("assets"))?;
//! println!("{} files in {} data pages", stats.files, stats.data_pages);
//!
//! unpack_archive("assets.arc", "restored")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Inspecting an archive
//!
//! ```rust,no_run
//! use pagearc::{load_archive, Archive, Result};
//!
//! # fn main() -> Result<()> {
//! let blob = load_archive("assets.arc")?;
//! let archive = Archive::parse(&blob)?;
//!
//! for entry in archive.list()? {
//!     println!("{} {:?}", entry.path, entry.size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use crate::core::{dirent, error, flatten, header, page, reader, tree, writer};

pub use crate::core::{
    dirent::{DirEntry, DIRECTORY_FLAG, DIRENT_NAME_CAPACITY, DIRENT_SIZE},
    error::{ArchiveError, Result},
    flatten::{flatten, Block, EntryTable},
    header::{Header, HEADER_NAME_CAPACITY, HEADER_SIZE, MAGIC, PAGE_SIZE, VERSION},
    page::Pages,
    reader::{load_archive, unpack_archive, Archive, ExtractStats, ListedEntry},
    tree::{ContentItem, SourceTree, TreeNode},
    writer::{build_header, pack_directory, ArchiveWriter, PackOptions, PackStats},
};
