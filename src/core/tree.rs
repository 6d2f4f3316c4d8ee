//! In-memory directory tree built from a source directory
//!
//! Every non-empty regular file becomes a [`ContentItem`] placed at the next
//! page-aligned offset of a virtual data region, and its relative path is
//! inserted into a [`TreeNode`] hierarchy. Intermediate directories are
//! created on demand, so empty directories never appear in an archive.

use crate::dirent::{check_entry_name, DIRENT_NAME_CAPACITY};
use crate::error::{ArchiveError, Result};
use crate::page::align;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A source file and its assigned place in the data region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Absolute path of the source file
    pub source: PathBuf,
    /// Content length in bytes
    pub length: u64,
    /// Byte offset within the data region (always page-aligned)
    pub offset: u64,
}

/// One path segment of the tree.
///
/// Children are kept sorted by name so flattening is reproducible
/// whatever order the filesystem walk produced.
#[derive(Debug, Default, Clone)]
pub struct TreeNode {
    children: BTreeMap<String, TreeNode>,
    /// Index into the content list; `None` for directories
    content: Option<usize>,
}

impl TreeNode {
    /// Insert `components` below this node, creating directories on demand.
    ///
    /// Returns `false` without changing the tree when the path is already
    /// taken or passes through a file.
    fn insert(&mut self, components: &[String], content: usize) -> bool {
        let (head, rest) = match components.split_first() {
            Some(split) => split,
            None => return false,
        };
        let child = self.children.entry(head.clone()).or_default();
        if rest.is_empty() {
            if child.content.is_some() || !child.children.is_empty() {
                return false;
            }
            child.content = Some(content);
            true
        } else if child.content.is_some() {
            false
        } else {
            child.insert(rest, content)
        }
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Content index for file nodes
    pub fn content(&self) -> Option<usize> {
        self.content
    }

    pub fn is_file(&self) -> bool {
        self.content.is_some()
    }

    /// Number of immediate children
    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Number of nodes below this one, not counting itself
    pub fn recursive_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.recursive_count())
            .sum()
    }
}

/// The tree plus the ordered content list that the writer copies from
#[derive(Debug, Default, Clone)]
pub struct SourceTree {
    root: TreeNode,
    items: Vec<ContentItem>,
    cursor: u64,
}

impl SourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root` recursively and collect every non-empty regular file.
    ///
    /// Entries that vanish during the walk or are empty are skipped with a
    /// warning. Path segments longer than an entry name can hold fail the
    /// whole scan.
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .map_err(|e| ArchiveError::io_at(root, e))?;
        debug!("Scanning {}", root.display());

        let mut tree = SourceTree::new();
        for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if is_not_found(&e) => {
                    warn!(
                        "Skipping {} ...",
                        e.path().map(|p| p.display().to_string()).unwrap_or_default()
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let path = entry.path();
            // Follows symlinks: a link to a file is archived as that file's content
            let metadata = match std::fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("Skipping {} ...", path.display());
                    continue;
                }
                Err(e) => return Err(ArchiveError::io_at(path, e)),
            };

            if !metadata.is_file() {
                continue;
            }
            if metadata.len() == 0 {
                warn!("Skipping {} ...", path.display());
                continue;
            }

            let relative = path.strip_prefix(&root).map_err(|_| {
                ArchiveError::InvalidName(format!(
                    "{} is not below {}",
                    path.display(),
                    root.display()
                ))
            })?;
            tree.add_file(relative, path, metadata.len())?;
        }

        Ok(tree)
    }

    /// Register a file at `relative` whose content lives at `source`.
    ///
    /// Returns the index of the new content item.
    pub fn add_file<P: AsRef<Path>, S: Into<PathBuf>>(
        &mut self,
        relative: P,
        source: S,
        length: u64,
    ) -> Result<usize> {
        let components = path_components(relative.as_ref())?;
        if components.is_empty() {
            return Err(ArchiveError::InvalidName(format!(
                "empty relative path for {}",
                relative.as_ref().display()
            )));
        }

        let index = self.items.len();
        if !self.root.insert(&components, index) {
            return Err(ArchiveError::InvalidName(format!(
                "{} collides with an existing entry",
                relative.as_ref().display()
            )));
        }
        self.items.push(ContentItem {
            source: source.into(),
            length,
            offset: self.cursor,
        });
        self.cursor += align(length);
        Ok(index)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Data region size: every item's length rounded up to a page
    pub fn data_len(&self) -> u64 {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.root.count() == 0
    }
}

/// Split a relative path into validated entry names
fn path_components(relative: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let name = segment.to_str().ok_or_else(|| {
                    ArchiveError::InvalidName(format!(
                        "{} is not valid UTF-8",
                        segment.to_string_lossy()
                    ))
                })?;
                if name.len() > DIRENT_NAME_CAPACITY {
                    return Err(ArchiveError::NameTooLong {
                        name: name.to_string(),
                        len: name.len(),
                        capacity: DIRENT_NAME_CAPACITY,
                    });
                }
                check_entry_name(name)?;
                names.push(name.to_string());
            }
            Component::CurDir => {}
            _ => {
                return Err(ArchiveError::InvalidName(format!(
                    "{} is not a plain relative path",
                    relative.display()
                )))
            }
        }
    }
    Ok(names)
}

fn is_not_found(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .map_or(false, |e| e.kind() == std::io::ErrorKind::NotFound)
}
