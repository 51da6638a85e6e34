//! a trait for things that can serve font tables

use types::Tag;

use crate::{tables, FontData, FontRead, ReadError};

/// A table that has an associated tag.
///
/// This is true of top-level tables, but not their various subtables.
pub trait TopLevelTable {
    /// The table's tag.
    const TAG: Tag;
}

/// An interface for accessing tables from a font (or font-like object)
pub trait TableProvider<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>>;

    fn expect_data_for_tag(&self, tag: Tag) -> Result<FontData<'a>, ReadError> {
        self.data_for_tag(tag).ok_or(ReadError::TableIsMissing(tag))
    }

    /// Attempt to read a top-level table.
    ///
    /// Returns `None` if the table is absent, and `Some(Err(..))` if it is
    /// present but malformed.
    fn try_table<T>(&self) -> Option<Result<T, ReadError>>
    where
        T: TopLevelTable + FontRead<'a>,
    {
        self.data_for_tag(T::TAG).map(T::read)
    }

    fn head(&self) -> Result<tables::head::Head<'a>, ReadError> {
        self.expect_data_for_tag(tables::head::TAG)
            .and_then(FontRead::read)
    }

    fn maxp(&self) -> Result<tables::maxp::Maxp<'a>, ReadError> {
        self.expect_data_for_tag(tables::maxp::TAG)
            .and_then(FontRead::read)
    }

    fn gsub(&self) -> Result<tables::gsub::Gsub<'a>, ReadError> {
        self.expect_data_for_tag(tables::gsub::TAG)
            .and_then(FontRead::read)
    }

    fn gpos(&self) -> Result<tables::gpos::Gpos<'a>, ReadError> {
        self.expect_data_for_tag(tables::gpos::TAG)
            .and_then(FontRead::read)
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::{simple_font, HEAD, MAXP_0_5};

    use super::*;
    use crate::FontRef;

    #[test]
    fn absent_and_malformed_are_distinct() {
        let bad_maxp = [0u8, 0, 0x50, 0];
        let bytes = simple_font(&[(Tag::new(b"head"), HEAD), (Tag::new(b"maxp"), &bad_maxp)]);
        let font = FontRef::new(&bytes).unwrap();

        assert!(matches!(font.try_table::<tables::head::Head>(), Some(Ok(_))));
        assert!(matches!(
            font.try_table::<tables::maxp::Maxp>(),
            Some(Err(_))
        ));
        assert!(font.try_table::<tables::gsub::Gsub>().is_none());
        assert_eq!(
            font.gsub().err(),
            Some(ReadError::TableIsMissing(Tag::new(b"GSUB")))
        );
    }

    #[test]
    fn typed_accessors() {
        let bytes = simple_font(&[(Tag::new(b"head"), HEAD), (Tag::new(b"maxp"), MAXP_0_5)]);
        let font = FontRef::new(&bytes).unwrap();
        assert_eq!(font.head().unwrap().units_per_em(), 1000);
        assert_eq!(font.maxp().unwrap().num_glyphs(), 12);
    }
}
