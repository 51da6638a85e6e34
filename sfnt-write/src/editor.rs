//! Rewriting an existing font

use std::{borrow::Cow, collections::BTreeMap};

use read::{FontRef, TopLevelTable};
use types::Tag;

use crate::{
    font_builder::{BuilderError, SfntBuilder, WriteOptions},
    table_source::TableSource,
    validate::Validate,
    write::FontWrite,
};

/// Build a new font from an existing one, replacing only some tables.
///
/// Tables that are not replaced or removed are copied from the original
/// font without being parsed.
pub struct SfntEditor<'a> {
    font: FontRef<'a>,
    sfnt_version: Option<u32>,
    staged: BTreeMap<Tag, Staged<'a>>,
    options: WriteOptions,
}

enum Staged<'a> {
    Source(Box<dyn TableSource + 'a>),
    Removed,
}

impl<'a> SfntEditor<'a> {
    pub fn new(font: &FontRef<'a>) -> Self {
        SfntEditor {
            font: font.clone(),
            sfnt_version: None,
            staged: BTreeMap::new(),
            options: WriteOptions::default(),
        }
    }

    /// The font being edited.
    pub fn font(&self) -> &FontRef<'a> {
        &self.font
    }

    /// Override the sfnt version of the original font.
    pub fn with_sfnt_version(&mut self, sfnt_version: u32) -> &mut Self {
        self.sfnt_version = Some(sfnt_version);
        self
    }

    pub fn with_options(&mut self, options: WriteOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Replace (or add) a table with raw bytes.
    pub fn set_raw(&mut self, tag: Tag, data: impl Into<Cow<'a, [u8]>>) -> &mut Self {
        self.set_source(tag, Box::new(data.into()))
    }

    /// Replace (or add) a table by compiling a structured table.
    pub fn set_table<T>(&mut self, table: &T) -> Result<&mut Self, BuilderError>
    where
        T: FontWrite + Validate + TopLevelTable,
    {
        let tag = T::TAG;
        let bytes = crate::dump_table(table).map_err(|inner| BuilderError::Table { tag, inner })?;
        Ok(self.set_raw(tag, bytes))
    }

    pub fn set_source(&mut self, tag: Tag, source: Box<dyn TableSource + 'a>) -> &mut Self {
        self.staged.insert(tag, Staged::Source(source));
        self
    }

    /// Drop a table from the output.
    ///
    /// Returns `true` if the table would otherwise have been written.
    pub fn remove(&mut self, tag: Tag) -> bool {
        let present = self.contains(tag);
        if present {
            self.staged.insert(tag, Staged::Removed);
        }
        present
    }

    /// Returns `true` if a table with this tag will be written.
    pub fn contains(&self, tag: Tag) -> bool {
        match self.staged.get(&tag) {
            Some(Staged::Source(_)) => true,
            Some(Staged::Removed) => false,
            None => self.font.contains(tag),
        }
    }

    /// Returns `true` if this table has been replaced or removed.
    pub fn is_modified(&self, tag: Tag) -> bool {
        self.staged.contains_key(&tag)
    }

    /// Write the edited font.
    ///
    /// Replaced tables keep their position in the original font when the
    /// body order follows insertion; new tables follow in tag order.
    pub fn build(&self) -> Result<Vec<u8>, BuilderError> {
        let mut builder = SfntBuilder::new();
        builder
            .with_sfnt_version(self.sfnt_version.unwrap_or(self.font.sfnt_version()))
            .with_options(self.options);

        for slice in self.font.table_slices() {
            let tag = slice.tag();
            match self.staged.get(&tag) {
                Some(Staged::Source(source)) => {
                    builder.add_source(tag, Box::new(BorrowedSource(source.as_ref())));
                }
                Some(Staged::Removed) => (),
                None => {
                    builder.add_source(tag, Box::new(slice));
                }
            }
        }
        for (tag, staged) in &self.staged {
            if let Staged::Source(source) = staged {
                if !builder.contains(*tag) {
                    builder.add_source(*tag, Box::new(BorrowedSource(source.as_ref())));
                }
            }
        }
        log::debug!(
            "editing font: {} of {} tables changed",
            self.staged.len(),
            self.font.num_tables()
        );
        builder.build()
    }
}

struct BorrowedSource<'b>(&'b dyn TableSource);

impl TableSource for BorrowedSource<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn write_to(&self, sink: &mut Vec<u8>, head_checksum_adjustment: Option<u32>) {
        self.0.write_to(sink, head_checksum_adjustment)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{checksum, TableProvider};
    use sfnt_test_data::{simple_font, HEAD, MAXP_1_0};
    use types::CFF_SFNT_VERSION;

    use super::*;
    use crate::{font_builder::TableOrder, from_obj::ToOwnedTable, tables::maxp::Maxp};

    const HEAD_TAG: Tag = Tag::new(b"head");
    const MAXP: Tag = Tag::new(b"maxp");
    const ABCD: Tag = Tag::new(b"abcd");
    const WXYZ: Tag = Tag::new(b"wxyz");

    fn source_font() -> Vec<u8> {
        simple_font(&[
            (HEAD_TAG, HEAD),
            (MAXP, MAXP_1_0),
            (ABCD, &[1, 2, 3, 4, 5]),
            (WXYZ, &[9; 8]),
        ])
    }

    #[test]
    fn untouched_tables_are_identical() {
        let bytes = source_font();
        let font = FontRef::new(&bytes).unwrap();
        let mut editor = SfntEditor::new(&font);
        let mut maxp: Maxp = font.maxp().unwrap().to_owned_table().unwrap();
        maxp.num_glyphs = 1000;
        editor.set_table(&maxp).unwrap();
        let edited = editor.build().unwrap();
        assert_eq!(checksum::checksum(&edited), checksum::CHECKSUM_MAGIC);

        let new_font = FontRef::new(&edited).unwrap();
        assert_eq!(new_font.maxp().unwrap().num_glyphs(), 1000);
        for tag in [ABCD, WXYZ] {
            assert_eq!(
                new_font.table_data(tag).unwrap().as_bytes(),
                font.table_data(tag).unwrap().as_bytes()
            );
        }
        // only the adjustment differs
        let old_head = font.table_data(HEAD_TAG).unwrap().as_bytes();
        let new_head = new_font.table_data(HEAD_TAG).unwrap().as_bytes();
        assert_eq!(&old_head[..8], &new_head[..8]);
        assert_eq!(&old_head[12..], &new_head[12..]);
    }

    #[test]
    fn unedited_round_trip() {
        let bytes = source_font();
        let font = FontRef::new(&bytes).unwrap();
        let first = SfntEditor::new(&font).build().unwrap();
        let reread = FontRef::new(&first).unwrap();
        let second = SfntEditor::new(&reread).build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn remove_and_restore() {
        let bytes = source_font();
        let font = FontRef::new(&bytes).unwrap();
        let mut editor = SfntEditor::new(&font);
        assert!(editor.remove(ABCD));
        assert!(!editor.remove(ABCD));
        assert!(!editor.contains(ABCD));
        let edited = editor.build().unwrap();
        let new_font = FontRef::new(&edited).unwrap();
        assert!(!new_font.contains(ABCD));
        assert_eq!(new_font.num_tables(), 3);

        editor.set_raw(ABCD, vec![7, 7]);
        assert!(editor.contains(ABCD));
        let edited = editor.build().unwrap();
        let new_font = FontRef::new(&edited).unwrap();
        assert_eq!(new_font.table_data(ABCD).unwrap().as_bytes(), &[7, 7]);
    }

    #[test]
    fn new_tables_are_merged() {
        let bytes = source_font();
        let font = FontRef::new(&bytes).unwrap();
        let mut editor = SfntEditor::new(&font);
        editor
            .with_sfnt_version(CFF_SFNT_VERSION)
            .set_raw(Tag::new(b"CFF "), vec![1, 0, 4, 1]);
        let edited = editor.build().unwrap();
        let new_font = FontRef::new(&edited).unwrap();
        assert_eq!(new_font.sfnt_version(), CFF_SFNT_VERSION);
        assert_eq!(
            new_font.table_tags().collect::<Vec<_>>(),
            [Tag::new(b"CFF "), ABCD, HEAD_TAG, MAXP, WXYZ]
        );
        assert_eq!(checksum::checksum(&edited), checksum::CHECKSUM_MAGIC);
    }

    #[test]
    fn insertion_order_keeps_original_layout() {
        let bytes = source_font();
        let font = FontRef::new(&bytes).unwrap();
        let mut editor = SfntEditor::new(&font);
        editor
            .with_options(WriteOptions {
                table_order: TableOrder::Insertion,
                ..Default::default()
            })
            .set_raw(Tag::new(b"aaaa"), vec![0; 4]);
        let edited = editor.build().unwrap();
        let new_font = FontRef::new(&edited).unwrap();
        let new_table = new_font.table_slice(Tag::new(b"aaaa")).unwrap();
        // appended after the original bodies
        assert!(new_font
            .table_slices()
            .all(|slice| slice.offset() <= new_table.offset()));
    }
}
