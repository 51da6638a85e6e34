//! Zero-copy references to the bytes of a single table

use types::Tag;

use crate::{checksum, FontData, TableRecord};

/// The bytes of one table, along with its directory information.
///
/// A slice either comes from a parsed table directory, in which case the
/// checksum is the value stored in the directory, or is created from loose
/// bytes with [`TableSlice::standalone`], in which case the checksum is
/// computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableSlice<'a> {
    tag: Tag,
    offset: u32,
    checksum: u32,
    data: FontData<'a>,
}

impl<'a> TableSlice<'a> {
    /// Create a slice for a directory record, resolving it against the file data.
    ///
    /// Returns `None` if the record's range does not fit in `file_data`.
    pub fn from_record(record: &TableRecord, file_data: FontData<'a>) -> Option<Self> {
        let start = record.offset() as usize;
        let end = start.checked_add(record.length() as usize)?;
        let data = file_data.slice(start..end)?;
        Some(TableSlice {
            tag: record.tag(),
            offset: record.offset(),
            checksum: record.checksum(),
            data,
        })
    }

    /// Create a slice for bytes that do not come from a parsed font.
    ///
    /// The checksum is computed now, using the `head`-aware rule for `head`.
    pub fn standalone(tag: Tag, bytes: &'a [u8]) -> Self {
        TableSlice {
            tag,
            offset: 0,
            checksum: checksum::table_checksum(tag, bytes),
            data: FontData::new(bytes),
        }
    }

    /// The table's tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The offset of the table from the start of the file.
    ///
    /// This is zero for standalone slices.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The length of the table in bytes, excluding padding.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the table has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The precomputed checksum.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Compute the checksum of the bytes, ignoring any stored value.
    pub fn computed_checksum(&self) -> u32 {
        checksum::table_checksum(self.tag, self.data.as_bytes())
    }

    /// The table bytes.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }

    /// The table bytes, as a slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_checksums() {
        let bytes = [0u8, 0, 0, 5, 0, 0, 0, 6, 0xFF, 0xFF, 0xFF, 0xFF];
        let hhea = TableSlice::standalone(Tag::new(b"hhea"), &bytes);
        assert_eq!(hhea.checksum(), 10);
        let head = TableSlice::standalone(Tag::new(b"head"), &bytes);
        assert_eq!(head.checksum(), 11);
        assert_eq!(head.offset(), 0);
        assert_eq!(head.len(), 12);
    }
}
