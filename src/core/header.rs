use crate::dirent::DIRENT_SIZE;
use crate::error::{ArchiveError, Result};

/// Format identifier: the multi-character constant `'99so'`.
///
/// Stored little-endian like every other integer field, so the first
/// four bytes of an archive read `b"os99"`.
pub const MAGIC: u32 = 0x3939_736F;
pub const MAGIC_BYTES: [u8; 4] = MAGIC.to_le_bytes();
pub const VERSION: u16 = 0;
pub const PAGE_SIZE: usize = 4096;

pub const HEADER_SIZE: usize = 64;
pub const HEADER_NAME_CAPACITY: usize = 47;

/// Archive header (offset 0)
///
/// Packed little-endian layout, 64 bytes:
///
/// ```text
/// 0   magic        u32
/// 4   version      u16
/// 6   root_length  u16   entries in the root block (table index 0)
/// 8   data_offset  u32   first page of the data region
/// 12  data_length  u32   data region length in pages
/// 16  name_len     u8
/// 17  name         [u8; 47]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u16,
    pub root_length: u16,
    pub data_offset: u32,
    pub data_length: u32,
    pub name_len: u8,
    pub name: [u8; HEADER_NAME_CAPACITY],
}

impl Header {
    /// Create a header with the current magic/version and no name
    pub fn new() -> Self {
        Header {
            magic: MAGIC,
            version: VERSION,
            root_length: 0,
            data_offset: 0,
            data_length: 0,
            name_len: 0,
            name: [0; HEADER_NAME_CAPACITY],
        }
    }

    /// Set the archive name/comment.
    ///
    /// Names longer than the 47-byte field are rejected, never truncated.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let (len, bytes) = encode_name::<HEADER_NAME_CAPACITY>(name)?;
        self.name_len = len;
        self.name = bytes;
        Ok(())
    }

    /// Archive name/comment, if it is valid UTF-8
    pub fn name(&self) -> Result<&str> {
        let len = (self.name_len as usize).min(HEADER_NAME_CAPACITY);
        decode_name(&self.name[..len])
    }

    /// Byte offset of the data region
    pub fn data_start(&self) -> u64 {
        self.data_offset as u64 * PAGE_SIZE as u64
    }

    /// Data region length in bytes
    pub fn data_bytes(&self) -> u64 {
        self.data_length as u64 * PAGE_SIZE as u64
    }

    /// Check the structural invariants that depend on the header alone.
    ///
    /// Rules run in a fixed order and the first failure is reported.
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(ArchiveError::InvalidMagic(self.magic));
        }

        if self.version != VERSION {
            return Err(ArchiveError::UnsupportedVersion(self.version));
        }

        if self.root_length == 0 {
            return Err(ArchiveError::EmptyRoot);
        }

        let root_bytes = self.root_length as u64 * DIRENT_SIZE as u64;
        if root_bytes > self.data_start() {
            return Err(ArchiveError::BadDataOffset {
                root_bytes,
                data_start: self.data_start(),
            });
        }

        if self.name_len as usize > HEADER_NAME_CAPACITY {
            return Err(ArchiveError::HeaderNameTooLong(self.name_len));
        }

        Ok(())
    }

    /// Serialize header to its 64-byte on-disk form
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.root_length.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.data_offset.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.data_length.to_le_bytes());
        bytes[16] = self.name_len;
        bytes[17..HEADER_SIZE].copy_from_slice(&self.name);
        bytes
    }

    /// Decode a header without validating it
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArchiveError::Truncated(bytes.len()));
        }

        let mut name = [0u8; HEADER_NAME_CAPACITY];
        name.copy_from_slice(&bytes[17..HEADER_SIZE]);

        Ok(Header {
            magic: le_u32(bytes, 0),
            version: le_u16(bytes, 4),
            root_length: le_u16(bytes, 6),
            data_offset: le_u32(bytes, 8),
            data_length: le_u32(bytes, 12),
            name_len: bytes[16],
            name,
        })
    }

    /// Decode and validate a header
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::decode(bytes)?;
        header.validate()?;
        Ok(header)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a name into a fixed-capacity, zero-filled field.
pub(crate) fn encode_name<const N: usize>(name: &str) -> Result<(u8, [u8; N])> {
    let bytes = name.as_bytes();
    if bytes.len() > N || bytes.len() > u8::MAX as usize {
        return Err(ArchiveError::NameTooLong {
            name: name.to_string(),
            len: bytes.len(),
            capacity: N,
        });
    }

    let mut field = [0u8; N];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok((bytes.len() as u8, field))
}

pub(crate) fn decode_name(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| {
        ArchiveError::InvalidName(format!("not valid UTF-8: {:?}", String::from_utf8_lossy(bytes)))
    })
}

pub(crate) fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub(crate) fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_header() -> Header {
        let mut header = Header::new();
        header.root_length = 2;
        header.data_offset = 1;
        header.data_length = 3;
        header
    }

    #[test]
    fn test_magic_bytes_on_disk() {
        assert_eq!(&MAGIC_BYTES, b"os99");
        let bytes = valid_header().to_bytes();
        assert_eq!(&bytes[0..4], b"os99");
    }

    #[test]
    fn test_header_layout() {
        let mut header = valid_header();
        header.set_name("backup").unwrap();
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[4..6], &[0, 0]);
        assert_eq!(&bytes[6..8], &[2, 0]);
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[3, 0, 0, 0]);
        assert_eq!(bytes[16], 6);
        assert_eq!(&bytes[17..23], b"backup");
        assert!(bytes[23..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_header_serialization() {
        let mut header = valid_header();
        header.set_name("nightly").unwrap();

        let decoded = Header::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.name().unwrap(), "nightly");
    }

    #[test]
    fn test_truncated_header() {
        let bytes = valid_header().to_bytes();
        assert!(matches!(
            Header::from_bytes(&bytes[..63]),
            Err(ArchiveError::Truncated(63))
        ));
    }

    #[test]
    fn test_invalid_magic() {
        let mut header = valid_header();
        header.magic = u32::from_le_bytes(*b"so99");
        assert!(matches!(
            header.validate(),
            Err(ArchiveError::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_invalid_version() {
        let mut header = valid_header();
        header.version = 1;
        assert!(matches!(
            header.validate(),
            Err(ArchiveError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn test_empty_root() {
        let mut header = valid_header();
        header.root_length = 0;
        assert!(matches!(header.validate(), Err(ArchiveError::EmptyRoot)));
    }

    #[test]
    fn test_root_block_must_fit_before_data() {
        let mut header = valid_header();
        // One page holds exactly PAGE_SIZE / DIRENT_SIZE root entries
        let per_page = (PAGE_SIZE / DIRENT_SIZE) as u16;
        header.root_length = per_page;
        assert!(header.validate().is_ok());
        header.root_length = per_page + 1;
        assert!(matches!(
            header.validate(),
            Err(ArchiveError::BadDataOffset { root_bytes, .. }) if root_bytes == 65 * 64
        ));
    }

    #[test]
    fn test_name_length_out_of_range() {
        let mut header = valid_header();
        header.name_len = 48;
        assert!(matches!(
            header.validate(),
            Err(ArchiveError::HeaderNameTooLong(48))
        ));
    }

    #[test]
    fn test_name_capacity() {
        let mut header = Header::new();
        assert!(header.set_name(&"n".repeat(HEADER_NAME_CAPACITY)).is_ok());
        assert!(matches!(
            header.set_name(&"n".repeat(HEADER_NAME_CAPACITY + 1)),
            Err(ArchiveError::NameTooLong { capacity: 47, .. })
        ));
    }
}
