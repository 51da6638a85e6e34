//! Anything that can supply the bytes of a table to the sfnt writer

use std::borrow::Cow;

use read::{checksum::HEAD_CHECKSUM_ADJUSTMENT_OFFSET, TableSlice};
use types::Tag;

const HEAD: Tag = Tag::new(b"head");

/// A source for the bytes of a single table.
///
/// The writer knows nothing about tables beyond this: it asks for a length
/// when laying out the file, and then asks the source to append exactly that
/// many bytes.
pub trait TableSource {
    /// The number of bytes [`write_to`][Self::write_to] will append.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the table's bytes to `sink`.
    ///
    /// Sources that know they hold a `head` table write
    /// `head_checksum_adjustment` in place of the stored adjustment, or the
    /// stored value when it is `None`. Anything else ignores it.
    fn write_to(&self, sink: &mut Vec<u8>, head_checksum_adjustment: Option<u32>);
}

impl TableSource for &[u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn write_to(&self, sink: &mut Vec<u8>, _: Option<u32>) {
        sink.extend_from_slice(self)
    }
}

impl TableSource for Vec<u8> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn write_to(&self, sink: &mut Vec<u8>, _: Option<u32>) {
        sink.extend_from_slice(self)
    }
}

impl TableSource for Cow<'_, [u8]> {
    fn len(&self) -> usize {
        self.as_ref().len()
    }

    fn write_to(&self, sink: &mut Vec<u8>, _: Option<u32>) {
        sink.extend_from_slice(self)
    }
}

impl TableSource for TableSlice<'_> {
    fn len(&self) -> usize {
        TableSlice::len(self)
    }

    fn write_to(&self, sink: &mut Vec<u8>, head_checksum_adjustment: Option<u32>) {
        let bytes = self.as_bytes();
        let adjustment_end = HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4;
        match head_checksum_adjustment {
            Some(adjustment) if self.tag() == HEAD && bytes.len() >= adjustment_end => {
                sink.extend_from_slice(&bytes[..HEAD_CHECKSUM_ADJUSTMENT_OFFSET]);
                sink.extend_from_slice(&adjustment.to_be_bytes());
                sink.extend_from_slice(&bytes[adjustment_end..]);
            }
            _ => sink.extend_from_slice(bytes),
        }
    }
}
