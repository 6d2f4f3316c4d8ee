use crate::header::PAGE_SIZE;

/// Round `offset` up to the next page boundary
pub const fn align(offset: u64) -> u64 {
    let mask = PAGE_SIZE as u64 - 1;
    (offset + mask) & !mask
}

/// Number of pages needed to hold `length` bytes
pub const fn pages(length: u64) -> u64 {
    (length + PAGE_SIZE as u64 - 1) / PAGE_SIZE as u64
}

/// Read-only view over a run of whole pages
///
/// Any trailing partial page in the backing slice is not part of the view.
#[derive(Debug, Clone, Copy)]
pub struct Pages<'a> {
    bytes: &'a [u8],
}

impl<'a> Pages<'a> {
    /// View `bytes` as pages, dropping a trailing partial page
    pub fn new(bytes: &'a [u8]) -> Self {
        let whole = bytes.len() - bytes.len() % PAGE_SIZE;
        Pages {
            bytes: &bytes[..whole],
        }
    }

    /// Number of pages in the view
    pub fn len(&self) -> usize {
        self.bytes.len() / PAGE_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn page(&self, index: usize) -> Option<&'a [u8]> {
        self.span(index, PAGE_SIZE)
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'a, u8> {
        self.bytes.chunks_exact(PAGE_SIZE)
    }

    /// The suffix of pages starting at `first`
    pub fn from_page(&self, first: usize) -> Pages<'a> {
        let start = first.saturating_mul(PAGE_SIZE).min(self.bytes.len());
        Pages {
            bytes: &self.bytes[start..],
        }
    }

    /// `len` bytes starting at the beginning of page `first`.
    ///
    /// Returns `None` if the range runs past the end of the view.
    pub fn span(&self, first: usize, len: usize) -> Option<&'a [u8]> {
        let start = first.checked_mul(PAGE_SIZE)?;
        let end = start.checked_add(len)?;
        self.bytes.get(start..end)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(0), 0);
        assert_eq!(align(1), 4096);
        assert_eq!(align(4096), 4096);
        assert_eq!(align(4097), 8192);
    }

    #[test]
    fn test_pages() {
        assert_eq!(pages(0), 0);
        assert_eq!(pages(1), 1);
        assert_eq!(pages(4096), 1);
        assert_eq!(pages(5000), 2);
    }

    #[test]
    fn test_page_view() {
        let mut bytes = vec![0u8; PAGE_SIZE * 3 + 10];
        bytes[PAGE_SIZE] = 1;
        bytes[PAGE_SIZE * 2] = 2;

        let view = Pages::new(&bytes);
        assert_eq!(view.len(), 3);
        assert_eq!(view.iter().count(), 3);
        assert_eq!(view.page(1).unwrap()[0], 1);
        assert!(view.page(3).is_none());

        let tail = view.from_page(2);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.page(0).unwrap()[0], 2);
        assert!(view.from_page(7).is_empty());
    }

    #[test]
    fn test_span_bounds() {
        let bytes = vec![7u8; PAGE_SIZE * 2];
        let view = Pages::new(&bytes);

        assert_eq!(view.span(1, PAGE_SIZE).unwrap().len(), PAGE_SIZE);
        assert_eq!(view.span(0, PAGE_SIZE + 5).unwrap().len(), PAGE_SIZE + 5);
        assert!(view.span(1, PAGE_SIZE + 1).is_none());
        assert!(view.span(usize::MAX, 1).is_none());
    }
}
