use crate::error::{ArchiveError, Result};
use crate::header::{decode_name, encode_name, le_u16, le_u32, HEADER_SIZE, PAGE_SIZE};

pub const DIRENT_SIZE: usize = 64;
pub const DIRENT_NAME_CAPACITY: usize = 49;

/// Entry describes a directory, not a file
pub const DIRECTORY_FLAG: u32 = 0x1;

// The reader views bytes [0, data_start) as a uniform array of entry-sized
// slots with the header in slot 0.
const _: () = assert!(DIRENT_SIZE == HEADER_SIZE);
const _: () = assert!(PAGE_SIZE % DIRENT_SIZE == 0);

/// Directory entry (64 bytes)
///
/// ```text
/// 0   flags      u32   bit 0 = directory
/// 4   offset     u32   file: first data page; dir: table index of child block
/// 8   length     u32   file: whole pages;     dir: child count
/// 12  remainder  u16   file: trailing bytes;  dir: 0
/// 14  name_len   u8
/// 15  name       [u8; 49]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub flags: u32,
    pub offset: u32,
    pub length: u32,
    pub remainder: u16,
    pub name_len: u8,
    pub name: [u8; DIRENT_NAME_CAPACITY],
}

impl DirEntry {
    /// Entry for a file whose content starts at data page `first_page`
    pub fn file(name: &str, first_page: u32, content_len: u64) -> Result<Self> {
        let (name_len, name_bytes) = encode_name::<DIRENT_NAME_CAPACITY>(name)?;
        let whole_pages = u32::try_from(content_len / PAGE_SIZE as u64).map_err(|_| {
            ArchiveError::TooLarge(format!("file '{}' is {} bytes", name, content_len))
        })?;

        Ok(DirEntry {
            flags: 0,
            offset: first_page,
            length: whole_pages,
            remainder: (content_len % PAGE_SIZE as u64) as u16,
            name_len,
            name: name_bytes,
        })
    }

    /// Entry for a directory whose `count` children start at table index `block`
    pub fn directory(name: &str, block: u32, count: u32) -> Result<Self> {
        let (name_len, name_bytes) = encode_name::<DIRENT_NAME_CAPACITY>(name)?;

        Ok(DirEntry {
            flags: DIRECTORY_FLAG,
            offset: block,
            length: count,
            remainder: 0,
            name_len,
            name: name_bytes,
        })
    }

    pub fn is_dir(&self) -> bool {
        self.flags & DIRECTORY_FLAG != 0
    }

    /// Total content length of a file entry
    pub fn content_len(&self) -> u64 {
        self.length as u64 * PAGE_SIZE as u64 + self.remainder as u64
    }

    /// Entry name.
    ///
    /// Fails if the stored length exceeds the field or the bytes are not UTF-8.
    pub fn name(&self) -> Result<&str> {
        let len = self.name_len as usize;
        if len > DIRENT_NAME_CAPACITY {
            return Err(ArchiveError::CorruptArchive(format!(
                "entry name length {} exceeds {}",
                len, DIRENT_NAME_CAPACITY
            )));
        }
        decode_name(&self.name[..len])
    }

    pub fn to_bytes(&self) -> [u8; DIRENT_SIZE] {
        let mut bytes = [0u8; DIRENT_SIZE];
        bytes[0..4].copy_from_slice(&self.flags.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.offset.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.length.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.remainder.to_le_bytes());
        bytes[14] = self.name_len;
        bytes[15..DIRENT_SIZE].copy_from_slice(&self.name);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DIRENT_SIZE {
            return Err(ArchiveError::CorruptArchive(format!(
                "directory entry needs {} bytes, got {}",
                DIRENT_SIZE,
                bytes.len()
            )));
        }

        let mut name = [0u8; DIRENT_NAME_CAPACITY];
        name.copy_from_slice(&bytes[15..DIRENT_SIZE]);

        Ok(DirEntry {
            flags: le_u32(bytes, 0),
            offset: le_u32(bytes, 4),
            length: le_u32(bytes, 8),
            remainder: le_u16(bytes, 12),
            name_len: bytes[14],
            name,
        })
    }
}

/// Check that `name` can be recreated as a single path component.
///
/// Applied when packing and again when extracting, so every archive the
/// writer accepts can be unpacked.
pub(crate) fn check_entry_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c| matches!(c, '/' | '\\' | '\0'))
    {
        return Err(ArchiveError::InvalidName(format!(
            "unsafe entry name {:?}",
            name
        )));
    }
    Ok(())
}

impl Default for DirEntry {
    fn default() -> Self {
        DirEntry {
            flags: 0,
            offset: 0,
            length: 0,
            remainder: 0,
            name_len: 0,
            name: [0; DIRENT_NAME_CAPACITY],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_lengths() {
        let entry = DirEntry::file("b.txt", 1, 5000).unwrap();
        assert!(!entry.is_dir());
        assert_eq!(entry.offset, 1);
        assert_eq!(entry.length, 1);
        assert_eq!(entry.remainder, 904);
        assert_eq!(entry.content_len(), 5000);
        assert_eq!(entry.name().unwrap(), "b.txt");
    }

    #[test]
    fn test_exact_page_file() {
        let entry = DirEntry::file("page.bin", 0, PAGE_SIZE as u64 * 2).unwrap();
        assert_eq!(entry.length, 2);
        assert_eq!(entry.remainder, 0);
    }

    #[test]
    fn test_directory_entry() {
        let entry = DirEntry::directory("sub", 7, 3).unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.offset, 7);
        assert_eq!(entry.length, 3);
        assert_eq!(entry.remainder, 0);
    }

    #[test]
    fn test_entry_layout() {
        let bytes = DirEntry::directory("sub", 7, 3).unwrap().to_bytes();
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[7, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[3, 0, 0, 0]);
        assert_eq!(&bytes[12..14], &[0, 0]);
        assert_eq!(bytes[14], 3);
        assert_eq!(&bytes[15..18], b"sub");
        assert!(bytes[18..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_entry_serialization() {
        let entry = DirEntry::file("a.txt", 4, 2).unwrap();
        let decoded = DirEntry::from_bytes(&entry.to_bytes()).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_name_capacity() {
        assert!(DirEntry::file(&"x".repeat(49), 0, 1).is_ok());
        assert!(matches!(
            DirEntry::file(&"x".repeat(50), 0, 1),
            Err(ArchiveError::NameTooLong { len: 50, capacity: 49, .. })
        ));
    }

    #[test]
    fn test_entry_name_rule() {
        assert!(check_entry_name("a.txt").is_ok());
        assert!(check_entry_name("..hidden").is_ok());
        for name in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(check_entry_name(name), Err(ArchiveError::InvalidName(_))),
                "{:?} accepted",
                name
            );
        }
    }

    #[test]
    fn test_corrupt_name_length() {
        let mut bytes = DirEntry::file("a", 0, 1).unwrap().to_bytes();
        bytes[14] = 50;
        let entry = DirEntry::from_bytes(&bytes).unwrap();
        assert!(matches!(entry.name(), Err(ArchiveError::CorruptArchive(_))));
    }
}
