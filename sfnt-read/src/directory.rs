//! The table directory and collection header
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>

use types::{BigEndian, FixedSize, MajorMinor, Tag, TTC_HEADER_TAG};

use crate::{FontData, FontRead, ReadError};

const TABLE_DIRECTORY_HEADER_LEN: usize = 12;

/// The [TableDirectory](https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory)
/// at the start of every sfnt font.
#[derive(Clone)]
pub struct TableDirectory<'a> {
    data: FontData<'a>,
    sfnt_version: u32,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
    table_records: &'a [TableRecord],
}

impl<'a> TableDirectory<'a> {
    /// `0x00010000`, `OTTO`, `true` or `typ1`
    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// Number of tables.
    pub fn num_tables(&self) -> u16 {
        self.table_records.len() as u16
    }

    /// The stored search range; this is not trusted when looking up tables.
    pub fn search_range(&self) -> u16 {
        self.search_range
    }

    /// The stored entry selector; this is not trusted when looking up tables.
    pub fn entry_selector(&self) -> u16 {
        self.entry_selector
    }

    /// The stored range shift; this is not trusted when looking up tables.
    pub fn range_shift(&self) -> u16 {
        self.range_shift
    }

    /// Table records array, one for each top-level table in the font
    pub fn table_records(&self) -> &'a [TableRecord] {
        self.table_records
    }

    /// The bytes of the header and records.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl<'a> FontRead<'a> for TableDirectory<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let sfnt_version: u32 = cursor.read()?;
        if !types::is_known_sfnt_version(sfnt_version) {
            return Err(ReadError::InvalidSfnt(sfnt_version));
        }
        let num_tables: u16 = cursor.read()?;
        let search_range = cursor.read()?;
        let entry_selector = cursor.read()?;
        let range_shift = cursor.read()?;
        if num_tables == 0 {
            return Err(ReadError::MalformedData("font has no tables"));
        }
        let table_records: &[TableRecord] = cursor.read_array(num_tables as usize)?;
        let is_sorted = table_records
            .windows(2)
            .all(|pair| pair[0].tag() < pair[1].tag());
        if !is_sorted {
            return Err(ReadError::MalformedData(
                "table directory tags are not unique and sorted",
            ));
        }
        let len = TABLE_DIRECTORY_HEADER_LEN + table_records.len() * TableRecord::RAW_BYTE_LEN;
        let data = data.slice(..len).ok_or(ReadError::OutOfBounds)?;
        Ok(TableDirectory {
            data,
            sfnt_version,
            search_range,
            entry_selector,
            range_shift,
            table_records,
        })
    }
}

/// Record for a table in a font.
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct TableRecord {
    /// Table identifier.
    pub tag: BigEndian<Tag>,
    /// Checksum for the table.
    pub checksum: BigEndian<u32>,
    /// Offset from the beginning of the font data.
    pub offset: BigEndian<u32>,
    /// Length of the table.
    pub length: BigEndian<u32>,
}

impl TableRecord {
    /// Table identifier.
    pub fn tag(&self) -> Tag {
        self.tag.get()
    }

    /// Checksum for the table.
    pub fn checksum(&self) -> u32 {
        self.checksum.get()
    }

    /// Offset from the beginning of the font data.
    pub fn offset(&self) -> u32 {
        self.offset.get()
    }

    /// Length of the table, excluding padding.
    pub fn length(&self) -> u32 {
        self.length.get()
    }
}

impl FixedSize for TableRecord {
    const RAW_BYTE_LEN: usize = Tag::RAW_BYTE_LEN + u32::RAW_BYTE_LEN * 3;
}

/// The [TTC Header](https://learn.microsoft.com/en-us/typography/opentype/spec/otff#ttc-header)
#[derive(Clone)]
pub struct TTCHeader<'a> {
    version: MajorMinor,
    table_directory_offsets: &'a [BigEndian<u32>],
}

impl<'a> TTCHeader<'a> {
    /// Font Collection ID string: "ttcf"
    pub fn ttc_tag(&self) -> Tag {
        TTC_HEADER_TAG
    }

    /// Major/minor version of the TTC Header
    pub fn version(&self) -> MajorMinor {
        self.version
    }

    /// Number of fonts in TTC
    pub fn num_fonts(&self) -> u32 {
        self.table_directory_offsets.len() as u32
    }

    /// Array of offsets to the TableDirectory for each font from the beginning of the file
    pub fn table_directory_offsets(&self) -> &'a [BigEndian<u32>] {
        self.table_directory_offsets
    }
}

impl<'a> FontRead<'a> for TTCHeader<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let tag: Tag = cursor.read()?;
        if tag != TTC_HEADER_TAG {
            return Err(ReadError::InvalidTtc(tag));
        }
        let version = cursor.read()?;
        let num_fonts: u32 = cursor.read()?;
        if num_fonts == 0 {
            return Err(ReadError::MalformedData("font collection has no fonts"));
        }
        // version 2.0 adds DSIG fields, which we don't need
        let table_directory_offsets = cursor.read_array(num_fonts as usize)?;
        Ok(TTCHeader {
            version,
            table_directory_offsets,
        })
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn stored_search_fields() {
        let bytes = be_buffer! {
            0x00010000u32, 1u16, 16u16, 0u16, 0u16,
            (Tag::new(b"abcd")), 0u32, 28u32, 0u32
        };
        let dir = TableDirectory::read(FontData::new(&bytes)).unwrap();
        assert_eq!(dir.num_tables(), 1);
        assert_eq!(
            (dir.search_range(), dir.entry_selector(), dir.range_shift()),
            (16, 0, 0)
        );
        assert_eq!(dir.data().len(), 28);
        assert_eq!(dir.table_records()[0].tag(), Tag::new(b"abcd"));
    }

    #[test]
    fn ttc_header_tag() {
        let bytes = be_buffer! { (Tag::new(b"true")), 1u16, 0u16, 1u32, 16u32 };
        assert_eq!(
            TTCHeader::read(FontData::new(&bytes)).err(),
            Some(ReadError::InvalidTtc(Tag::new(b"true")))
        );
    }
}
