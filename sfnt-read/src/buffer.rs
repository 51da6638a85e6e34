//! Storage for the bytes of a font file

use std::ops::Deref;

use crate::{FontData, FontRef, ReadError};

/// The bytes of a font file.
///
/// Views created from the buffer ([`FontRef`], [`FontData`], table slices)
/// borrow it, and so cannot outlive it.
pub struct ByteBuffer {
    inner: Storage,
}

enum Storage {
    Owned(Vec<u8>),
    Static(&'static [u8]),
    #[cfg(feature = "mmap")]
    Mapped(memmap2::Mmap),
}

impl ByteBuffer {
    /// Create a buffer that owns its bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        ByteBuffer {
            inner: Storage::Owned(bytes),
        }
    }

    /// Create a buffer over static data, such as the output of `include_bytes!`.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        ByteBuffer {
            inner: Storage::Static(bytes),
        }
    }

    /// Map a file into memory, read-only.
    ///
    /// The mapping is released when the buffer is dropped. The file must not
    /// be modified by another process while it is mapped.
    #[cfg(feature = "mmap")]
    pub fn map_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the map is read-only, and we document that the file must not
        // be truncated or modified while the buffer is alive.
        #[allow(unsafe_code)]
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Ok(ByteBuffer {
            inner: Storage::Mapped(map),
        })
    }

    /// The length of the buffer, in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// `true` if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The contents of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.inner {
            Storage::Owned(bytes) => bytes.as_slice(),
            Storage::Static(bytes) => bytes,
            #[cfg(feature = "mmap")]
            Storage::Mapped(map) => map.as_ref(),
        }
    }

    /// The whole buffer as [`FontData`].
    pub fn data(&self) -> FontData<'_> {
        FontData::new(self.as_bytes())
    }

    /// Return `len` bytes starting at `offset`, or `None` if that range is
    /// not entirely within the buffer.
    pub fn try_slice(&self, offset: usize, len: usize) -> Option<FontData<'_>> {
        let end = offset.checked_add(len)?;
        self.data().slice(offset..end)
    }

    /// Parse the buffer as a single font.
    pub fn font(&self) -> Result<FontRef<'_>, ReadError> {
        FontRef::new(self.as_bytes())
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(src: Vec<u8>) -> Self {
        ByteBuffer::from_vec(src)
    }
}

impl std::fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            Storage::Owned(_) => "Owned",
            Storage::Static(_) => "Static",
            #[cfg(feature = "mmap")]
            Storage::Mapped(_) => "Mapped",
        };
        f.debug_struct("ByteBuffer")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slicing_is_checked() {
        let buf = ByteBuffer::from_vec(vec![1, 2, 3, 4]);
        assert_eq!(buf.try_slice(1, 2).unwrap().as_bytes(), &[2, 3]);
        assert_eq!(buf.try_slice(4, 0).unwrap().len(), 0);
        assert!(buf.try_slice(3, 2).is_none());
        assert!(buf.try_slice(usize::MAX, 2).is_none());
    }

    #[test]
    fn static_bytes() {
        static BYTES: &[u8] = b"wOFF";
        let buf = ByteBuffer::from_static(BYTES);
        assert_eq!(buf.len(), 4);
        assert!(matches!(buf.font(), Err(ReadError::InvalidSfnt(0x774F_4646))));
    }

    #[cfg(feature = "mmap")]
    #[test]
    fn map_a_file() {
        let path = std::env::temp_dir().join("sfnt_read_map_a_file_test.bin");
        std::fs::write(&path, [0u8, 1, 0, 0]).unwrap();
        let buf = ByteBuffer::map_file(&path).unwrap();
        assert_eq!(buf.as_bytes(), &[0, 1, 0, 0]);
        drop(buf);
        let _ = std::fs::remove_file(&path);
    }
}
