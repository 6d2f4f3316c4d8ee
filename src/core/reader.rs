//! Archive reader
//!
//! [`Archive::parse`] validates a fully loaded blob and exposes borrowed
//! views over the entry table and the data region. Traversal is depth-first
//! and preorder, in table order, and checks every block reference against
//! the table actually present before following it.

use crate::dirent::{check_entry_name, DirEntry, DIRENT_SIZE};
use crate::error::{ArchiveError, Result};
use crate::header::{Header, HEADER_SIZE, PAGE_SIZE};
use crate::page::{align, Pages};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Read a whole archive into memory, zero-padded to a page boundary
pub fn load_archive<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut blob = fs::read(path).map_err(|e| ArchiveError::io_at(path, e))?;
    if blob.len() % PAGE_SIZE != 0 {
        blob.resize(align(blob.len() as u64) as usize, 0);
    }
    debug!("Loaded {} ({} bytes)", path.display(), blob.len());
    Ok(blob)
}

/// Load, validate and extract `archive` into `dest`
pub fn unpack_archive<A: AsRef<Path>, D: AsRef<Path>>(archive: A, dest: D) -> Result<ExtractStats> {
    let blob = load_archive(archive)?;
    Archive::parse(&blob)?.extract(dest)
}

/// Counts from one extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
}

/// One entry as seen by [`Archive::list`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEntry {
    /// Path relative to the archive root, `/`-separated
    pub path: String,
    pub is_dir: bool,
    /// Content length; `None` for directories
    pub size: Option<u64>,
}

enum Visit<'p, 'a> {
    Directory { path: &'p str },
    File { path: &'p str, contents: &'a [u8] },
}

struct Frame {
    path: String,
    entries: Vec<DirEntry>,
    next: usize,
}

/// A validated archive borrowed from a loaded blob
#[derive(Debug, Clone, Copy)]
pub struct Archive<'a> {
    header: Header,
    /// Entry slots between the header and the data region
    entries: &'a [u8],
    data: Pages<'a>,
}

impl<'a> Archive<'a> {
    /// Validate `blob` and build the entry and data views.
    ///
    /// The bytes before the data region are treated as a uniform array of
    /// 64-byte slots; slot 0 is the header and is dropped from the entry view.
    pub fn parse(blob: &'a [u8]) -> Result<Self> {
        if blob.len() < HEADER_SIZE {
            return Err(ArchiveError::Truncated(blob.len()));
        }

        let header = Header::from_bytes(blob)?;

        let required = (header.data_offset as u64 + header.data_length as u64)
            .saturating_sub(1)
            * PAGE_SIZE as u64;
        if (blob.len() as u64) < required {
            return Err(ArchiveError::DataRegionTruncated {
                required,
                actual: blob.len() as u64,
            });
        }

        let slots_end = header.data_start().min(blob.len() as u64) as usize;
        let slots_end = slots_end - slots_end % DIRENT_SIZE;
        let entries = &blob[HEADER_SIZE.min(slots_end)..slots_end];
        let data = Pages::new(blob).from_page(header.data_offset as usize);

        Ok(Archive {
            header,
            entries,
            data,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of entry slots available before the data region
    pub fn entry_capacity(&self) -> usize {
        self.entries.len() / DIRENT_SIZE
    }

    pub fn entry(&self, index: usize) -> Result<DirEntry> {
        self.block(index as u32, 1)?
            .pop()
            .ok_or(ArchiveError::EntryOutOfRange {
                offset: index as u32,
                count: 1,
                capacity: self.entry_capacity(),
            })
    }

    /// Decode the `count` entries starting at table index `offset`
    pub fn block(&self, offset: u32, count: u32) -> Result<Vec<DirEntry>> {
        let out_of_range = || ArchiveError::EntryOutOfRange {
            offset,
            count,
            capacity: self.entry_capacity(),
        };
        let start = (offset as usize)
            .checked_mul(DIRENT_SIZE)
            .ok_or_else(out_of_range)?;
        let end = (count as usize)
            .checked_mul(DIRENT_SIZE)
            .and_then(|len| start.checked_add(len))
            .ok_or_else(out_of_range)?;
        let bytes = self.entries.get(start..end).ok_or_else(out_of_range)?;

        bytes.chunks_exact(DIRENT_SIZE).map(DirEntry::from_bytes).collect()
    }

    /// Entries of the root directory
    pub fn root(&self) -> Result<Vec<DirEntry>> {
        self.block(0, self.header.root_length as u32)
    }

    /// The data region as pages
    pub fn data(&self) -> Pages<'a> {
        self.data
    }

    /// Content of a file entry, bound-checked against the data region
    pub fn file_contents(&self, entry: &DirEntry) -> Result<&'a [u8]> {
        let len = usize::try_from(entry.content_len()).ok();
        len.and_then(|len| self.data.span(entry.offset as usize, len))
            .ok_or_else(|| ArchiveError::DataOutOfRange {
                name: entry.name().unwrap_or("<unreadable>").to_string(),
            })
    }

    /// Recreate the archived tree below `dest`.
    ///
    /// Stops at the first failure and leaves whatever was already written.
    pub fn extract<P: AsRef<Path>>(&self, dest: P) -> Result<ExtractStats> {
        let dest = dest.as_ref();
        let mut stats = ExtractStats::default();

        self.walk(|visit| match visit {
            Visit::Directory { path } => {
                let target = dest.join(path);
                debug!("Creating directory {}", target.display());
                fs::create_dir_all(&target).map_err(|e| ArchiveError::io_at(&target, e))?;
                if !path.is_empty() {
                    stats.directories += 1;
                }
                Ok(())
            }
            Visit::File { path, contents } => {
                let target = dest.join(path);
                debug!("Writing {} ({} bytes)", target.display(), contents.len());
                fs::write(&target, contents).map_err(|e| ArchiveError::io_at(&target, e))?;
                stats.files += 1;
                stats.bytes += contents.len() as u64;
                Ok(())
            }
        })?;

        info!(
            "Extracted {} files ({} bytes) and {} directories into {}",
            stats.files,
            stats.bytes,
            stats.directories,
            dest.display()
        );
        Ok(stats)
    }

    /// Every entry in traversal order, without touching the filesystem
    pub fn list(&self) -> Result<Vec<ListedEntry>> {
        let mut listed = Vec::new();
        self.walk(|visit| {
            match visit {
                Visit::Directory { path } if path.is_empty() => {}
                Visit::Directory { path } => listed.push(ListedEntry {
                    path: path.to_string(),
                    is_dir: true,
                    size: None,
                }),
                Visit::File { path, contents } => listed.push(ListedEntry {
                    path: path.to_string(),
                    is_dir: false,
                    size: Some(contents.len() as u64),
                }),
            }
            Ok(())
        })?;
        Ok(listed)
    }

    /// [`Archive::list`] as a pretty-printed JSON array
    pub fn list_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.list()?)?)
    }

    /// Depth-first preorder traversal starting at the root block.
    ///
    /// Each table slot may belong to at most one visited block, which rules
    /// out cycles and shared blocks in crafted tables.
    fn walk<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Visit<'_, 'a>) -> Result<()>,
    {
        let mut claimed = vec![false; self.entry_capacity()];

        let root = self.claim(&mut claimed, 0, self.header.root_length as u32)?;
        visit(Visit::Directory { path: "" })?;
        let mut stack = vec![Frame {
            path: String::new(),
            entries: root,
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.entries.get(frame.next).copied() else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            let name = checked_name(&entry)?;
            let path = if frame.path.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", frame.path, name)
            };

            if entry.is_dir() {
                if entry.remainder != 0 {
                    return Err(ArchiveError::CorruptArchive(format!(
                        "directory '{}' has nonzero remainder {}",
                        path, entry.remainder
                    )));
                }
                let children = self.claim(&mut claimed, entry.offset, entry.length)?;
                visit(Visit::Directory { path: &path })?;
                stack.push(Frame {
                    path,
                    entries: children,
                    next: 0,
                });
            } else {
                let contents = self.file_contents(&entry)?;
                visit(Visit::File {
                    path: &path,
                    contents,
                })?;
            }
        }

        Ok(())
    }

    fn claim(&self, claimed: &mut [bool], offset: u32, count: u32) -> Result<Vec<DirEntry>> {
        let entries = self.block(offset, count)?;
        let start = offset as usize;
        let slots = &mut claimed[start..start + entries.len()];
        if slots.iter().any(|&taken| taken) {
            return Err(ArchiveError::CorruptArchive(format!(
                "entry block {}+{} overlaps another block",
                offset, count
            )));
        }
        slots.fill(true);
        Ok(entries)
    }
}

/// Entry name usable as a single path component below the destination
fn checked_name(entry: &DirEntry) -> Result<&str> {
    let name = entry.name()?;
    check_entry_name(name)?;
    Ok(name)
}
