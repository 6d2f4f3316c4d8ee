//! Flatten a [`SourceTree`] into the fixed-size directory entry table
//!
//! Blocks are allocated in preorder from a single cursor: a directory
//! reserves one contiguous block for its immediate children, then each
//! subdirectory reserves its own block after everything reserved so far.
//! The root block therefore always starts at index 0, and a child block
//! always starts after its parent's block ends.

use crate::dirent::{DirEntry, DIRENT_SIZE};
use crate::error::{ArchiveError, Result};
use crate::header::PAGE_SIZE;
use crate::tree::{ContentItem, SourceTree, TreeNode};
use tracing::debug;

/// A contiguous run of entries holding one directory's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: usize,
    pub count: usize,
}

impl Block {
    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

/// The flattened entry table
#[derive(Debug, Clone)]
pub struct EntryTable {
    entries: Vec<DirEntry>,
    /// Every directory block in allocation order; the root block is first
    blocks: Vec<Block>,
}

impl EntryTable {
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn root(&self) -> Block {
        self.blocks.first().copied().unwrap_or(Block { start: 0, count: 0 })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the serialized table in bytes
    pub fn byte_len(&self) -> u64 {
        (self.entries.len() * DIRENT_SIZE) as u64
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.entries.len() * DIRENT_SIZE);
        for entry in &self.entries {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes
    }
}

/// Flatten `tree` into a table sized to its recursive node count
pub fn flatten(tree: &SourceTree) -> Result<EntryTable> {
    flatten_into(tree, tree.root().recursive_count())
}

/// Flatten into a table of exactly `capacity` slots.
///
/// Fails with [`ArchiveError::TableOverflow`] instead of writing past the end
/// when the tree needs more slots than that.
pub(crate) fn flatten_into(tree: &SourceTree, capacity: usize) -> Result<EntryTable> {
    let mut flattener = Flattener {
        entries: vec![DirEntry::default(); capacity],
        blocks: Vec::new(),
        cursor: 0,
        items: tree.items(),
    };
    flattener.flatten_dir(tree.root())?;

    debug!(
        "Flattened {} entries into {} blocks",
        flattener.cursor,
        flattener.blocks.len()
    );

    Ok(EntryTable {
        entries: flattener.entries,
        blocks: flattener.blocks,
    })
}

struct Flattener<'a> {
    entries: Vec<DirEntry>,
    blocks: Vec<Block>,
    cursor: usize,
    items: &'a [ContentItem],
}

impl<'a> Flattener<'a> {
    fn reserve(&mut self, count: usize) -> Result<Block> {
        let required = self.cursor + count;
        if required > self.entries.len() {
            return Err(ArchiveError::TableOverflow {
                required,
                capacity: self.entries.len(),
            });
        }

        let block = Block {
            start: self.cursor,
            count,
        };
        self.cursor = required;
        self.blocks.push(block);
        Ok(block)
    }

    fn flatten_dir(&mut self, node: &TreeNode) -> Result<Block> {
        let block = self.reserve(node.count())?;
        debug!("Reserved block {}+{}", block.start, block.count);

        for (slot, (name, child)) in (block.start..).zip(node.children()) {
            let entry = match child.content() {
                Some(index) => self.file_entry(name, index)?,
                None => {
                    let child_block = self.flatten_dir(child)?;
                    DirEntry::directory(
                        name,
                        to_u32(child_block.start, "entry table index")?,
                        to_u32(child_block.count, "directory child count")?,
                    )?
                }
            };
            self.entries[slot] = entry;
        }

        Ok(block)
    }

    fn file_entry(&self, name: &str, index: usize) -> Result<DirEntry> {
        let item = self.items.get(index).ok_or_else(|| {
            ArchiveError::CorruptArchive(format!(
                "'{}' refers to missing content item {}",
                name, index
            ))
        })?;
        let first_page = item.offset / PAGE_SIZE as u64;
        let first_page = u32::try_from(first_page).map_err(|_| {
            ArchiveError::TooLarge(format!(
                "data page index {} for '{}'",
                first_page, name
            ))
        })?;
        DirEntry::file(name, first_page, item.length)
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| ArchiveError::TooLarge(format!("{} {}", what, value)))
}
