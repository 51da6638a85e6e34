//! Reading sfnt font files
//!
//! This crate provides memory safe zero-allocation parsing of font files in
//! the sfnt container format (TrueType and OpenType fonts). It parses the
//! table directory into [`TableSlice`]s, and provides lazily constructed,
//! bounds-checked views of the `head`, `maxp`, `GSUB` and `GPOS` tables,
//! including all of the OpenType Layout common tables.
//!
//! Every other table is available as raw bytes, through
//! [`FontRef::table_data`] or [`FontRef::table_slice`].
//!
//! # Example
//!
//! ```no_run
//! # let path_to_my_font_file = std::path::Path::new("");
//! use sfnt_read::{ByteBuffer, TableProvider};
//! let buffer = ByteBuffer::map_file(path_to_my_font_file).unwrap();
//! let font = buffer.font().expect("failed to read font data");
//! let head = font.head().expect("missing 'head' table");
//! let maxp = font.maxp().expect("missing 'maxp' table");
//!
//! println!("{} units per em, {} glyphs", head.units_per_em(), maxp.num_glyphs());
//! ```
//!
//! [spec]: https://learn.microsoft.com/en-us/typography/opentype/spec/

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

mod any_table;
#[cfg(feature = "std")]
mod buffer;
pub mod checksum;
mod directory;
mod font_data;
#[cfg(feature = "std")]
pub mod layout_index;
mod offset;
mod offset_array;
mod read;
mod table_provider;
mod table_slice;
pub mod tables;

pub use any_table::AnyTable;
#[cfg(feature = "std")]
pub use buffer::ByteBuffer;
pub use directory::{TTCHeader, TableDirectory, TableRecord};
pub use font_data::{Cursor, FontData};
pub use offset::{ResolveNullableOffset, ResolveOffset};
pub use offset_array::{ArrayOfNullableOffsets, ArrayOfOffsets};
pub use read::{FontRead, FontReadWithArgs, Format, ReadArgs, ReadError};
pub use table_provider::{TableProvider, TopLevelTable};
pub use table_slice::TableSlice;

/// Public re-export of the sfnt-types crate.
pub extern crate sfnt_types as types;

use types::{Tag, TTC_HEADER_TAG};

/// Reference to the content of a font or font collection file.
#[derive(Clone)]
pub enum FileRef<'a> {
    /// A single font.
    Font(FontRef<'a>),
    /// A collection of fonts.
    Collection(CollectionRef<'a>),
}

impl<'a> FileRef<'a> {
    /// Creates a new reference to a file representing a font or font collection.
    ///
    /// The kind of file is decided by its first four bytes.
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let first = FontData::new(data).read_at::<Tag>(0)?;
        if first == TTC_HEADER_TAG {
            CollectionRef::new(data).map(Self::Collection)
        } else {
            FontRef::new(data).map(Self::Font)
        }
    }

    /// Returns an iterator over the fonts contained in the file.
    pub fn fonts(&self) -> impl Iterator<Item = Result<FontRef<'a>, ReadError>> + 'a + Clone {
        let (iter_one, iter_two) = match self {
            Self::Font(font) => (Some(Ok(font.clone())), None),
            Self::Collection(collection) => (None, Some(collection.iter())),
        };
        iter_two.into_iter().flatten().chain(iter_one)
    }
}

/// Reference to the content of a font collection file.
#[derive(Clone)]
pub struct CollectionRef<'a> {
    data: FontData<'a>,
    header: TTCHeader<'a>,
}

impl<'a> CollectionRef<'a> {
    /// Creates a new reference to a font collection.
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let header = TTCHeader::read(data)?;
        Ok(Self { data, header })
    }

    /// Returns the number of fonts in the collection.
    pub fn len(&self) -> u32 {
        self.header.num_fonts()
    }

    /// Returns true if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The collection header.
    pub fn header(&self) -> &TTCHeader<'a> {
        &self.header
    }

    /// Returns the font in the collection at the specified index.
    pub fn get(&self, index: u32) -> Result<FontRef<'a>, ReadError> {
        let offset = self
            .header
            .table_directory_offsets()
            .get(index as usize)
            .ok_or(ReadError::InvalidCollectionIndex(index))?
            .get();
        let mut font = FontRef::with_offset(self.data.as_bytes(), offset)?;
        font.ttc_index = Some(index);
        Ok(font)
    }

    /// Returns an iterator over the fonts in the collection.
    pub fn iter(&self) -> impl Iterator<Item = Result<FontRef<'a>, ReadError>> + 'a + Clone {
        let copy = self.clone();
        (0..self.len()).map(move |ix| copy.get(ix))
    }
}

/// Reference to an in-memory font.
///
/// This is a parsed table directory, borrowing the data of the file that
/// contains it. Construction checks that the directory is well formed: the
/// sfnt version is known, there is at least one table, tags are unique and
/// sorted, and every table lies within the file.
#[derive(Clone)]
pub struct FontRef<'a> {
    data: FontData<'a>,
    table_directory: TableDirectory<'a>,
    /// The index of this font in a TrueType collection
    ttc_index: Option<u32>,
}

impl<'a> FontRef<'a> {
    /// Creates a new reference to an in-memory font backed by the given data.
    ///
    /// The data must be a single font (not a font collection) and must begin
    /// with a [table directory].
    ///
    /// To load a font from a font collection, use [`FontRef::from_index`] instead.
    ///
    /// [table directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        Self::with_offset(data, 0)
    }

    /// Creates a new reference to a font whose table directory begins at
    /// `offset` within `data`.
    ///
    /// Table offsets are always relative to the start of `data`, which is
    /// what is needed for fonts in a collection.
    pub fn with_offset(data: &'a [u8], offset: u32) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let directory_data = data
            .split_off(offset as usize)
            .ok_or(ReadError::OutOfBounds)?;
        let table_directory = TableDirectory::read(directory_data)?;
        for record in table_directory.table_records() {
            let start = record.offset() as usize;
            let end = start
                .checked_add(record.length() as usize)
                .ok_or(ReadError::OutOfBounds)?;
            if end > data.len() {
                return Err(ReadError::OutOfBounds);
            }
        }
        Ok(FontRef {
            data,
            table_directory,
            ttc_index: None,
        })
    }

    /// Creates a new reference to an in-memory font at the specified index
    /// backed by the given data.
    ///
    /// This accepts either font collection (ttc) or single font (ttf/otf)
    /// files. If a single font file is provided, the index must be 0.
    pub fn from_index(data: &'a [u8], index: u32) -> Result<Self, ReadError> {
        match FileRef::new(data)? {
            FileRef::Font(font) if index == 0 => Ok(font),
            FileRef::Font(_) => Err(ReadError::InvalidCollectionIndex(index)),
            FileRef::Collection(collection) => collection.get(index),
        }
    }

    /// Returns the underlying font data.
    ///
    /// This is the base from which tables are loaded, meaning that for
    /// TrueType collection files, this will be the entire font file data.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }

    /// The sfnt version of the font, for instance `0x00010000` or `OTTO`.
    pub fn sfnt_version(&self) -> u32 {
        self.table_directory.sfnt_version()
    }

    /// If the font is in a TrueType collection (ttc) file, returns the index
    /// of the font in that collection.
    pub fn ttc_index(&self) -> Option<u32> {
        self.ttc_index
    }

    /// Returns the associated table directory.
    pub fn table_directory(&self) -> &TableDirectory<'a> {
        &self.table_directory
    }

    /// The number of tables in the font.
    pub fn num_tables(&self) -> usize {
        self.table_directory.table_records().len()
    }

    /// Returns `true` if the font contains a table with this tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.find_record(tag).is_some()
    }

    /// Returns the data for the table with the specified tag, if present.
    pub fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table_slice(tag).map(|slice| slice.data())
    }

    /// Returns the [`TableSlice`] for the table with the specified tag, if present.
    pub fn table_slice(&self, tag: Tag) -> Option<TableSlice<'a>> {
        self.find_record(tag)
            .and_then(|record| TableSlice::from_record(record, self.data))
    }

    /// Iterate over the tables in the font, in directory order.
    pub fn table_slices(&self) -> impl Iterator<Item = TableSlice<'a>> + '_ {
        let data = self.data;
        self.table_directory
            .table_records()
            .iter()
            .filter_map(move |record| TableSlice::from_record(record, data))
    }

    /// Iterate over the tags of the tables in the font, in directory order.
    pub fn table_tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.table_directory
            .table_records()
            .iter()
            .map(TableRecord::tag)
    }

    fn find_record(&self, tag: Tag) -> Option<&'a TableRecord> {
        let records = self.table_directory.table_records();
        records
            .binary_search_by(|rec| rec.tag().cmp(&tag))
            .ok()
            .and_then(|idx| records.get(idx))
    }
}

impl<'a> TableProvider<'a> for FontRef<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table_data(tag)
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::{assemble_font, bebuffer::BeBuffer, be_buffer, simple_font, HEAD};
    use types::{TT_SFNT_VERSION, CFF_SFNT_VERSION};

    use super::*;

    const ABCD: Tag = Tag::new(b"abcd");
    const WXYZ: Tag = Tag::new(b"wxyz");

    #[test]
    fn read_simple_font() {
        let bytes = simple_font(&[(WXYZ, &[1, 2, 3]), (ABCD, &[9, 8, 7, 6, 5])]);
        let font = FontRef::new(&bytes).unwrap();
        assert_eq!(font.sfnt_version(), TT_SFNT_VERSION);
        assert_eq!(font.num_tables(), 2);
        assert_eq!(font.table_data(WXYZ).unwrap().as_bytes(), &[1, 2, 3]);
        assert_eq!(font.table_data(ABCD).unwrap().as_bytes(), &[9, 8, 7, 6, 5]);
        assert!(font.table_data(Tag::new(b"nope")).is_none());
        assert_eq!(font.table_tags().collect::<Vec<_>>(), [ABCD, WXYZ]);
        assert_eq!(font.ttc_index(), None);

        let slice = font.table_slice(ABCD).unwrap();
        assert_eq!(slice.offset(), 12 + 2 * 16);
        assert_eq!(slice.checksum(), slice.computed_checksum());
    }

    #[test]
    fn reject_unsorted_directory() {
        let bytes = assemble_font(TT_SFNT_VERSION, &[(WXYZ, &[1]), (ABCD, &[2])]);
        assert!(matches!(
            FontRef::new(&bytes),
            Err(ReadError::MalformedData(_))
        ));
    }

    #[test]
    fn reject_duplicate_tags() {
        let bytes = assemble_font(TT_SFNT_VERSION, &[(ABCD, &[1]), (ABCD, &[2])]);
        assert!(matches!(
            FontRef::new(&bytes),
            Err(ReadError::MalformedData(_))
        ));
    }

    #[test]
    fn reject_bad_version_and_empty() {
        let bytes = assemble_font(0x1234_5678, &[(ABCD, &[1])]);
        assert_eq!(
            FontRef::new(&bytes).err(),
            Some(ReadError::InvalidSfnt(0x1234_5678))
        );
        let bytes = assemble_font(CFF_SFNT_VERSION, &[]);
        assert!(matches!(
            FontRef::new(&bytes),
            Err(ReadError::MalformedData(_))
        ));
    }

    #[test]
    fn reject_table_past_end() {
        let mut bytes = simple_font(&[(ABCD, &[1, 2, 3, 4])]);
        // bump the record's length field
        let len_pos = 12 + 12;
        bytes[len_pos..len_pos + 4].copy_from_slice(&100u32.to_be_bytes());
        assert_eq!(FontRef::new(&bytes).err(), Some(ReadError::OutOfBounds));
    }

    #[test]
    fn truncated_directory() {
        let bytes = simple_font(&[(ABCD, &[1, 2, 3, 4])]);
        assert_eq!(FontRef::new(&bytes[..20]).err(), Some(ReadError::OutOfBounds));
    }

    fn make_collection(fonts: &[&[u8]]) -> Vec<u8> {
        let header_len = 12 + 4 * fonts.len();
        let mut buf = BeBuffer::new()
            .push(TTC_HEADER_TAG)
            .push(1u16)
            .push(0u16)
            .push(fonts.len() as u32);
        // each font's table offsets are relative to its own start, so we
        // need to rebase them when we copy the font into the collection.
        let mut offset = header_len;
        for font in fonts {
            buf = buf.push(offset as u32);
            offset += font.len();
        }
        let mut bytes = buf.into_vec();
        for font in fonts {
            let base = bytes.len() as u32;
            let mut font = font.to_vec();
            let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
            for i in 0..num_tables {
                let pos = 12 + i * 16 + 8;
                let off = u32::from_be_bytes(font[pos..pos + 4].try_into().unwrap());
                font[pos..pos + 4].copy_from_slice(&(off + base).to_be_bytes());
            }
            bytes.extend(font);
        }
        bytes
    }

    #[test]
    fn read_collection() {
        let one = simple_font(&[(ABCD, &[1, 1, 1, 1])]);
        let two = simple_font(&[(WXYZ, &[2, 2]), (Tag::new(b"head"), HEAD)]);
        let bytes = make_collection(&[&one, &two]);

        let file = FileRef::new(&bytes).unwrap();
        let FileRef::Collection(collection) = &file else {
            panic!("expected collection");
        };
        assert_eq!(collection.len(), 2);
        let second = collection.get(1).unwrap();
        assert_eq!(second.ttc_index(), Some(1));
        assert_eq!(second.table_data(WXYZ).unwrap().as_bytes(), &[2, 2]);
        assert_eq!(
            collection.get(2).err(),
            Some(ReadError::InvalidCollectionIndex(2))
        );
        assert_eq!(file.fonts().count(), 2);

        let first = FontRef::from_index(&bytes, 0).unwrap();
        assert_eq!(first.table_data(ABCD).unwrap().as_bytes(), &[1, 1, 1, 1]);
    }

    #[test]
    fn single_font_index() {
        let bytes = simple_font(&[(ABCD, &[1])]);
        assert!(FontRef::from_index(&bytes, 0).is_ok());
        assert_eq!(
            FontRef::from_index(&bytes, 1).err(),
            Some(ReadError::InvalidCollectionIndex(1))
        );
        assert_eq!(FileRef::new(&bytes).unwrap().fonts().count(), 1);
    }

    #[test]
    fn collection_needs_fonts() {
        let bytes = be_buffer! { TTC_HEADER_TAG, 1u16, 0u16, 0u32 };
        assert!(matches!(
            CollectionRef::new(&bytes),
            Err(ReadError::MalformedData(_))
        ));
    }
}
