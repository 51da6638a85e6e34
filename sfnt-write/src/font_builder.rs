//! A builder for sfnt font files

use std::{borrow::Cow, fmt::Display};

use indexmap::IndexMap;
use read::{
    checksum::{self, HEAD_CHECKSUM_ADJUSTMENT_OFFSET},
    FontRef, TopLevelTable,
};
use types::{Tag, TT_SFNT_VERSION};

use crate::{
    table_source::TableSource,
    validate::Validate,
    write::{FontWrite, TableWriter},
};

const HEAD: Tag = Tag::new(b"head");
const HEADER_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;

/// The order in which table bodies are laid out in the file.
///
/// Records in the table directory are always sorted by tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TableOrder {
    /// Table bodies follow the order of their tags.
    #[default]
    TagAscending,
    /// Table bodies follow the order in which they were added.
    Insertion,
}

/// Whether to set `head.checksumAdjustment` when writing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HeadAdjustment {
    /// Set the adjustment, failing if there is no `head` table.
    Required,
    /// Set the adjustment if there is a `head` table.
    #[default]
    IfPresent,
    /// Write `head` exactly as its source provides it.
    Off,
}

/// Options controlling how a file is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WriteOptions {
    pub table_order: TableOrder,
    pub head_checksum_adjustment: HeadAdjustment,
}

/// Build a font from some set of tables.
///
/// A table added with a tag that is already present replaces the earlier
/// table.
pub struct SfntBuilder<'a> {
    sfnt_version: u32,
    tables: IndexMap<Tag, Box<dyn TableSource + 'a>>,
    options: WriteOptions,
}

/// An error returned when building a font, or adding a table to the builder.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum BuilderError {
    /// The builder contains no tables.
    NoTables,
    /// More tables than fit in a table directory.
    TooManyTables(usize),
    /// A table source wrote a different number of bytes than it reported.
    LengthMismatch {
        tag: Tag,
        declared: usize,
        written: usize,
    },
    /// A structured table failed to compile.
    Table {
        /// The tag of the root table where the error occurred
        tag: Tag,
        /// The underlying error
        inner: crate::error::Error,
    },
    /// The `head` table is too short to hold a checksum adjustment.
    HeadTooShort(usize),
    /// A checksum adjustment was required, but there is no `head` table.
    MissingHead,
    /// The file is too large to address with 32-bit offsets.
    TooLarge,
}

impl<'a> SfntBuilder<'a> {
    /// Create a new builder for a TrueType-flavoured font.
    pub fn new() -> Self {
        SfntBuilder {
            sfnt_version: TT_SFNT_VERSION,
            tables: IndexMap::new(),
            options: WriteOptions::default(),
        }
    }

    /// Set the version tag written at the start of the file.
    pub fn with_sfnt_version(&mut self, sfnt_version: u32) -> &mut Self {
        self.sfnt_version = sfnt_version;
        self
    }

    pub fn with_options(&mut self, options: WriteOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn options(&self) -> WriteOptions {
        self.options
    }

    /// Add a table to the builder.
    ///
    /// The table can be any top-level table defined in this crate. This function
    /// will attempt to compile the table and then add it to the builder if
    /// successful, returning an error otherwise.
    pub fn add_table<T>(&mut self, table: &T) -> Result<&mut Self, BuilderError>
    where
        T: FontWrite + Validate + TopLevelTable,
    {
        let tag = T::TAG;
        let bytes = crate::dump_table(table).map_err(|inner| BuilderError::Table { tag, inner })?;
        Ok(self.add_raw(tag, bytes))
    }

    /// A builder method to add raw data for the provided tag
    pub fn add_raw(&mut self, tag: Tag, data: impl Into<Cow<'a, [u8]>>) -> &mut Self {
        self.add_source(tag, Box::new(data.into()))
    }

    /// Add anything that can write its own bytes.
    pub fn add_source(&mut self, tag: Tag, source: Box<dyn TableSource + 'a>) -> &mut Self {
        self.tables.insert(tag, source);
        self
    }

    /// Remove a table, returning its source if it was present.
    pub fn remove(&mut self, tag: Tag) -> Option<Box<dyn TableSource + 'a>> {
        self.tables.shift_remove(&tag)
    }

    /// Copy each table from the source font if it does not already exist
    pub fn copy_missing_tables(&mut self, font: &FontRef<'a>) -> &mut Self {
        for slice in font.table_slices() {
            let tag = slice.tag();
            if !self.tables.contains_key(&tag) {
                self.add_source(tag, Box::new(slice));
            }
        }
        if font.table_slices().count() != font.num_tables() {
            log::warn!("some tables could not be copied from the source font");
        }
        self
    }

    /// Returns `true` if the builder contains a table with this tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// The source for this tag, if present.
    pub fn get(&self, tag: Tag) -> Option<&(dyn TableSource + 'a)> {
        self.tables.get(&tag).map(|source| source.as_ref())
    }

    /// The number of tables in the builder.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The tags of the tables in the builder, in insertion order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.keys().copied()
    }

    /// Assemble all the tables into a binary font file with a [Table Directory].
    ///
    /// [Table Directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
    pub fn build(&self) -> Result<Vec<u8>, BuilderError> {
        if self.tables.is_empty() {
            return Err(BuilderError::NoTables);
        }
        u16::try_from(self.tables.len())
            .map_err(|_| BuilderError::TooManyTables(self.tables.len()))?;

        let mut order: Vec<_> = self.tables.iter().collect();
        if self.options.table_order == TableOrder::TagAscending {
            order.sort_by_key(|(tag, _)| **tag);
        }

        let header_len = HEADER_LEN + order.len() * TABLE_RECORD_LEN;
        let mut data = vec![0u8; header_len];
        let mut records = Vec::with_capacity(order.len());
        let mut head_range = None;
        // zeroed while summing; the real value is filled in at the end
        let adjustment_placeholder =
            (self.options.head_checksum_adjustment != HeadAdjustment::Off).then_some(0);

        for (tag, source) in order {
            let start = data.len();
            let declared = source.len();
            source.write_to(&mut data, adjustment_placeholder);
            let written = data.len() - start;
            if written != declared {
                return Err(BuilderError::LengthMismatch {
                    tag: *tag,
                    declared,
                    written,
                });
            }
            let checksum = checksum::table_checksum(*tag, &data[start..]);
            if *tag == HEAD {
                head_range = Some((start, written));
            }
            data.resize(round4(data.len()), 0);
            if u32::try_from(data.len()).is_err() {
                return Err(BuilderError::TooLarge);
            }
            log::debug!("wrote '{tag}' ({written} bytes) at {start}");
            records.push(TableRecord {
                tag: *tag,
                checksum,
                offset: start as u32,
                length: written as u32,
            });
        }

        records.sort_by_key(|record| record.tag);
        let directory = TableDirectoryHeader {
            sfnt_version: self.sfnt_version,
            records: &records,
        };
        let mut writer = TableWriter::default();
        directory.write_into(&mut writer);
        data[..header_len].copy_from_slice(&writer.into_bytes());

        match (self.options.head_checksum_adjustment, head_range) {
            (HeadAdjustment::Off, _) => (),
            (HeadAdjustment::Required, None) => return Err(BuilderError::MissingHead),
            (HeadAdjustment::IfPresent, None) => {
                log::warn!("no 'head' table, checksum adjustment not written")
            }
            (_, Some((start, len))) => {
                let pos = start + HEAD_CHECKSUM_ADJUSTMENT_OFFSET;
                let field = data
                    .get_mut(pos..pos + 4)
                    .filter(|_| len >= HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4)
                    .ok_or(BuilderError::HeadTooShort(len))?;
                field.fill(0);
                let adjustment = checksum::checksum_adjustment(checksum::checksum(&data));
                data[pos..pos + 4].copy_from_slice(&adjustment.to_be_bytes());
            }
        }
        Ok(data)
    }
}

impl Default for SfntBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SfntBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfntBuilder")
            .field("sfnt_version", &Tag::from_u32(self.sfnt_version))
            .field(
                "tables",
                &self
                    .tables
                    .iter()
                    .map(|(tag, source)| (*tag, source.len()))
                    .collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}

#[derive(Clone, Copy, Debug)]
struct TableRecord {
    tag: Tag,
    checksum: u32,
    offset: u32,
    length: u32,
}

struct TableDirectoryHeader<'r> {
    sfnt_version: u32,
    records: &'r [TableRecord],
}

impl FontWrite for TableDirectoryHeader<'_> {
    fn write_into(&self, writer: &mut TableWriter) {
        // See https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
        let computed = SearchRange::compute(self.records.len(), TABLE_RECORD_LEN);
        self.sfnt_version.write_into(writer);
        (self.records.len() as u16).write_into(writer);
        computed.search_range.write_into(writer);
        computed.entry_selector.write_into(writer);
        computed.range_shift.write_into(writer);
        for record in self.records {
            record.tag.write_into(writer);
            record.checksum.write_into(writer);
            record.offset.write_into(writer);
            record.length.write_into(writer);
        }
    }
}

/// The binary search assists found in the table directory.
struct SearchRange {
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl SearchRange {
    // n_items must be non-zero and fit in a u16
    fn compute(n_items: usize, item_size: usize) -> Self {
        let entry_selector = n_items.max(1).ilog2() as usize;
        let search_range = (1 << entry_selector) * item_size;
        let range_shift = n_items * item_size - search_range;
        SearchRange {
            search_range: search_range as u16,
            entry_selector: entry_selector as u16,
            range_shift: range_shift as u16,
        }
    }
}

/// <https://github.com/google/woff2/blob/a0d0ed7da27b708c0a4e96ad7a998bddc933c06e/src/round.h#L19>
fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}

impl Display for BuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderError::NoTables => write!(f, "a font must contain at least one table"),
            BuilderError::TooManyTables(n) => write!(f, "too many tables ({n})"),
            BuilderError::LengthMismatch {
                tag,
                declared,
                written,
            } => write!(
                f,
                "source for '{tag}' declared {declared} bytes but wrote {written}"
            ),
            BuilderError::Table { tag, inner } => {
                write!(f, "failed to build '{}' table: '{}'", tag, inner)
            }
            BuilderError::HeadTooShort(len) => write!(
                f,
                "'head' table is {len} bytes, too short for a checksum adjustment"
            ),
            BuilderError::MissingHead => write!(f, "checksum adjustment requires a 'head' table"),
            BuilderError::TooLarge => write!(f, "font data exceeds 32-bit offsets"),
        }
    }
}

impl std::error::Error for BuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuilderError::Table { inner, .. } => Some(inner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{checksum::CHECKSUM_MAGIC, TableProvider};
    use sfnt_test_data::{simple_font, HEAD as HEAD_DATA, MAXP_0_5};
    use types::{Fixed, CFF_SFNT_VERSION};

    use super::*;
    use crate::tables::{head::Head, maxp::Maxp};

    const ABCD: Tag = Tag::new(b"abcd");
    const WXYZ: Tag = Tag::new(b"wxyz");

    #[test]
    fn sets_binary_search_assists() {
        // Based on Roboto's num tables
        let data = b"doesn't matter".to_vec();
        let mut builder = SfntBuilder::default();
        (0..0x16u32).for_each(|i| {
            builder.add_raw(Tag::from_u32(0x6161_6100 + i), data.as_slice());
        });
        let bytes = builder.build().unwrap();
        let font = FontRef::new(&bytes).unwrap();
        let td = font.table_directory();
        assert_eq!(
            (256, 4, 96),
            (td.search_range(), td.entry_selector(), td.range_shift())
        );
    }

    #[test]
    fn search_range_single_table() {
        let computed = SearchRange::compute(1, TABLE_RECORD_LEN);
        assert_eq!(
            (16, 0, 0),
            (
                computed.search_range,
                computed.entry_selector,
                computed.range_shift
            )
        );
    }

    #[test]
    fn rejects_no_tables() {
        assert!(matches!(
            SfntBuilder::default().build(),
            Err(BuilderError::NoTables)
        ));
    }

    #[test]
    fn pad4() {
        for i in 0..10 {
            let pad = round4(i) - i;
            assert!(pad < 4);
            assert!((i + pad) % 4 == 0, "pad {i} +{pad} bytes");
        }
    }

    #[test]
    fn whole_file_checksum() {
        let mut builder = SfntBuilder::new();
        builder
            .add_raw(WXYZ, vec![1, 2, 3])
            .add_table(&Head::new(Fixed::ONE, 2048))
            .unwrap()
            .add_table(&Maxp::new(4))
            .unwrap();
        let bytes = builder.build().unwrap();
        assert_eq!(checksum::checksum(&bytes), CHECKSUM_MAGIC);

        let font = FontRef::new(&bytes).unwrap();
        assert_eq!(font.table_tags().collect::<Vec<_>>(), [HEAD, Maxp::TAG, WXYZ]);
        for slice in font.table_slices() {
            assert_eq!(slice.checksum(), slice.computed_checksum(), "{}", slice.tag());
            assert_eq!(slice.offset() % 4, 0);
        }
        assert_eq!(font.head().unwrap().units_per_em(), 2048);
        assert_eq!(font.maxp().unwrap().num_glyphs(), 4);
        // bodies are padded but lengths are not
        assert_eq!(font.table_data(WXYZ).unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn stale_adjustment_is_replaced() {
        let mut head = HEAD_DATA.to_vec();
        head[8..12].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let mut builder = SfntBuilder::new();
        builder.add_raw(HEAD, head).add_raw(ABCD, MAXP_0_5);
        let bytes = builder.build().unwrap();
        assert_eq!(checksum::checksum(&bytes), CHECKSUM_MAGIC);
    }

    #[test]
    fn insertion_order_bodies() {
        let mut builder = SfntBuilder::new();
        builder
            .with_options(WriteOptions {
                table_order: TableOrder::Insertion,
                ..Default::default()
            })
            .add_raw(WXYZ, vec![1, 1, 1, 1])
            .add_raw(ABCD, vec![2, 2]);
        let bytes = builder.build().unwrap();
        let font = FontRef::new(&bytes).unwrap();
        // the directory is sorted, the bodies are not
        assert_eq!(font.table_tags().collect::<Vec<_>>(), [ABCD, WXYZ]);
        let wxyz = font.table_slice(WXYZ).unwrap();
        let abcd = font.table_slice(ABCD).unwrap();
        assert_eq!(wxyz.offset(), 12 + 2 * 16);
        assert_eq!(abcd.offset(), wxyz.offset() + 4);
    }

    #[test]
    fn overwrite_replaces() {
        let mut builder = SfntBuilder::new();
        builder.add_raw(ABCD, vec![1]).add_raw(ABCD, vec![2, 2]);
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.get(ABCD).map(|source| source.len()), Some(2));
        assert!(builder.remove(ABCD).is_some());
        assert!(!builder.contains(ABCD));
    }

    struct Liar;

    impl TableSource for Liar {
        fn len(&self) -> usize {
            8
        }

        fn write_to(&self, sink: &mut Vec<u8>, _: Option<u32>) {
            sink.extend_from_slice(&[0; 4])
        }
    }

    #[test]
    fn length_mismatch() {
        let mut builder = SfntBuilder::new();
        builder.add_source(ABCD, Box::new(Liar));
        assert!(matches!(
            builder.build(),
            Err(BuilderError::LengthMismatch {
                tag: ABCD,
                declared: 8,
                written: 4
            })
        ));
    }

    #[test]
    fn head_requirements() {
        let mut builder = SfntBuilder::new();
        builder.add_raw(ABCD, vec![1, 2, 3, 4]);
        // absent head is fine by default
        assert!(builder.build().is_ok());

        builder.with_options(WriteOptions {
            head_checksum_adjustment: HeadAdjustment::Required,
            ..Default::default()
        });
        assert!(matches!(builder.build(), Err(BuilderError::MissingHead)));

        builder.add_raw(HEAD, vec![0u8; 10]);
        assert!(matches!(builder.build(), Err(BuilderError::HeadTooShort(10))));

        builder.with_options(WriteOptions {
            head_checksum_adjustment: HeadAdjustment::Off,
            ..Default::default()
        });
        let bytes = builder.build().unwrap();
        let font = FontRef::new(&bytes).unwrap();
        assert_eq!(font.table_data(HEAD).unwrap().as_bytes(), &[0u8; 10]);
    }

    #[test]
    fn copied_head_passes_through_when_off() {
        let mut head = HEAD_DATA.to_vec();
        head[8..12].copy_from_slice(&0x1234_5678u32.to_be_bytes());
        let source = simple_font(&[(HEAD, &head), (ABCD, &[1, 2, 3, 4])]);
        let font = FontRef::new(&source).unwrap();

        let mut builder = SfntBuilder::new();
        builder
            .with_options(WriteOptions {
                head_checksum_adjustment: HeadAdjustment::Off,
                ..Default::default()
            })
            .copy_missing_tables(&font);
        let bytes = builder.build().unwrap();
        let copy = FontRef::new(&bytes).unwrap();
        assert_eq!(copy.table_data(HEAD).unwrap().as_bytes(), head.as_slice());

        builder.with_options(WriteOptions::default());
        let bytes = builder.build().unwrap();
        let copy = FontRef::new(&bytes).unwrap();
        assert_ne!(
            &copy.table_data(HEAD).unwrap().as_bytes()[8..12],
            &0x1234_5678u32.to_be_bytes()
        );
    }

    #[test]
    fn invalid_table_is_reported() {
        let mut builder = SfntBuilder::new();
        let err = builder.add_table(&Head::new(Fixed::ONE, 0)).unwrap_err();
        assert!(matches!(err, BuilderError::Table { tag: HEAD, .. }));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!builder.contains(HEAD));
    }

    #[test]
    fn copies_missing_tables() {
        let source = simple_font(&[(ABCD, &[1, 2, 3, 4]), (WXYZ, &[5, 6])]);
        let font = FontRef::new(&source).unwrap();
        let mut builder = SfntBuilder::new();
        builder
            .with_sfnt_version(CFF_SFNT_VERSION)
            .add_raw(WXYZ, vec![9])
            .copy_missing_tables(&font);
        let bytes = builder.build().unwrap();
        let copy = FontRef::new(&bytes).unwrap();
        assert_eq!(copy.sfnt_version(), CFF_SFNT_VERSION);
        assert_eq!(copy.table_data(ABCD).unwrap().as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(copy.table_data(WXYZ).unwrap().as_bytes(), &[9]);
    }
}
