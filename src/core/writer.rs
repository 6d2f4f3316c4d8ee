//! Archive writer
//!
//! Output layout: header, entry table, zero padding to the next page, then
//! the data region with every file starting on its assigned page. The file
//! is padded out to the full declared data extent.

use crate::error::{ArchiveError, Result};
use crate::flatten::{flatten, EntryTable};
use crate::header::{Header, HEADER_SIZE, PAGE_SIZE};
use crate::page::pages;
use crate::tree::{ContentItem, SourceTree};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Options for building an archive
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    name: Option<String>,
}

impl PackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name/comment stored in the header (max 47 bytes)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Summary of a written archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackStats {
    pub files: usize,
    pub entries: usize,
    pub data_pages: u32,
    pub archive_bytes: u64,
}

/// Writes one archive from a scanned [`SourceTree`]
pub struct ArchiveWriter<'a> {
    tree: &'a SourceTree,
    table: EntryTable,
    header: Header,
}

impl<'a> ArchiveWriter<'a> {
    /// Flatten `tree` and compute the header.
    ///
    /// An empty tree is rejected here, before any output exists, since the
    /// reader refuses a header with no root entries.
    pub fn new(tree: &'a SourceTree, options: &PackOptions) -> Result<Self> {
        if tree.is_empty() {
            return Err(ArchiveError::EmptyArchive);
        }

        let table = flatten(tree)?;
        let header = build_header(tree, &table, options)?;
        debug!(
            "Header: root_length={}, data_offset={}, data_length={}",
            header.root_length, header.data_offset, header.data_length
        );

        Ok(ArchiveWriter {
            tree,
            table,
            header,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    /// Create `path` and write the archive into it
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<PackStats> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ArchiveError::io_at(path, e))?;
        let mut out = BufWriter::new(file);
        let stats = self.write_to(&mut out)?;
        out.flush().map_err(|e| ArchiveError::io_at(path, e))?;
        Ok(stats)
    }

    /// Write the archive to `out`
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<PackStats> {
        out.write_all(&self.header.to_bytes())?;
        out.write_all(&self.table.to_bytes())?;

        let data_start = self.header.data_start();
        let mut position = HEADER_SIZE as u64 + self.table.byte_len();
        pad_to(out, &mut position, data_start)?;

        for item in self.tree.items() {
            let target = data_start + item.offset;
            pad_to(out, &mut position, target)?;
            info!(
                "Writing {} to 0x{:016x}, size {} ...",
                item.source.display(),
                target,
                item.length
            );
            copy_item(item, out)?;
            position += item.length;
        }

        let end = data_start + self.header.data_bytes();
        pad_to(out, &mut position, end)?;

        Ok(PackStats {
            files: self.tree.items().len(),
            entries: self.table.len(),
            data_pages: self.header.data_length,
            archive_bytes: end,
        })
    }
}

/// Scan `source`, then write its archive to `output`.
///
/// Name and tree validation happen before `output` is created.
pub fn pack_directory<S: AsRef<Path>, O: AsRef<Path>>(
    source: S,
    output: O,
    options: &PackOptions,
) -> Result<PackStats> {
    let tree = SourceTree::scan(source)?;
    let writer = ArchiveWriter::new(&tree, options)?;
    let stats = writer.write_file(output.as_ref())?;
    info!(
        "Packed {} files ({} entries, {} data pages) into {}",
        stats.files,
        stats.entries,
        stats.data_pages,
        output.as_ref().display()
    );
    Ok(stats)
}

/// Compute the header for a flattened tree
pub fn build_header(tree: &SourceTree, table: &EntryTable, options: &PackOptions) -> Result<Header> {
    let mut header = Header::new();

    header.root_length = u16::try_from(tree.root().count()).map_err(|_| {
        ArchiveError::TooLarge(format!("{} root entries", tree.root().count()))
    })?;

    let data_offset = pages(table.byte_len() + HEADER_SIZE as u64);
    header.data_offset = u32::try_from(data_offset)
        .map_err(|_| ArchiveError::TooLarge(format!("data offset of {} pages", data_offset)))?;

    let data_length = pages(tree.data_len());
    header.data_length = u32::try_from(data_length)
        .map_err(|_| ArchiveError::TooLarge(format!("data region of {} pages", data_length)))?;

    if let Some(name) = &options.name {
        header.set_name(name)?;
    }

    header.validate()?;
    Ok(header)
}

/// Emit zero bytes until `position` reaches `target`
fn pad_to<W: Write>(out: &mut W, position: &mut u64, target: u64) -> Result<()> {
    if target < *position {
        return Err(ArchiveError::CorruptArchive(format!(
            "content overlap: at byte {}, next item starts at {}",
            position, target
        )));
    }
    io::copy(&mut io::repeat(0).take(target - *position), out)?;
    *position = target;
    Ok(())
}

/// Copy exactly `item.length` bytes from the item's source file
fn copy_item<W: Write>(item: &ContentItem, out: &mut W) -> Result<()> {
    let path = &item.source;
    let mut source = File::open(path).map_err(|e| ArchiveError::io_at(path, e))?;
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE.min(item.length.max(1) as usize)];
    let mut remaining = item.length;

    while remaining > 0 {
        let want = remaining.min(buffer.len() as u64) as usize;
        let read = match source.read(&mut buffer[..want]) {
            Ok(0) => {
                return Err(ArchiveError::ShortRead {
                    path: path.clone(),
                    expected: item.length,
                    actual: item.length - remaining,
                })
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ArchiveError::io_at(path, e)),
        };
        out.write_all(&buffer[..read])?;
        remaining -= read as u64;
    }

    Ok(())
}
