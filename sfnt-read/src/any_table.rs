//! Dispatch from a table tag to a parsed view

use crate::{
    tables::{
        gpos::{self, Gpos},
        gsub::{self, Gsub},
        head::{self, Head},
        maxp::{self, Maxp},
    },
    FontRead, ReadError, TableSlice,
};

/// A parsed view of any table, selected by tag.
///
/// Tables that this crate does not parse are available as [`AnyTable::Raw`].
#[derive(Clone)]
pub enum AnyTable<'a> {
    Head(Head<'a>),
    Maxp(Maxp<'a>),
    Gsub(Gsub<'a>),
    Gpos(Gpos<'a>),
    Raw(TableSlice<'a>),
}

impl<'a> AnyTable<'a> {
    /// Parse a table slice, based on its tag.
    ///
    /// Unknown tags are never an error.
    pub fn read(slice: TableSlice<'a>) -> Result<Self, ReadError> {
        let data = slice.data();
        match slice.tag() {
            head::TAG => Head::read(data).map(Self::Head),
            maxp::TAG => Maxp::read(data).map(Self::Maxp),
            gsub::TAG => Gsub::read(data).map(Self::Gsub),
            gpos::TAG => Gpos::read(data).map(Self::Gpos),
            _ => Ok(Self::Raw(slice)),
        }
    }

    /// The bytes of the table, whatever its kind.
    pub fn data(&self) -> crate::FontData<'a> {
        match self {
            AnyTable::Head(table) => table.data(),
            AnyTable::Maxp(table) => table.data(),
            AnyTable::Gsub(table) => table.data(),
            AnyTable::Gpos(table) => table.data(),
            AnyTable::Raw(slice) => slice.data(),
        }
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::{simple_font, HEAD};
    use types::Tag;

    use super::*;
    use crate::FontRef;

    #[test]
    fn dispatch_by_tag() {
        let bytes = simple_font(&[(Tag::new(b"head"), HEAD), (Tag::new(b"cmap"), &[0, 0, 0, 0])]);
        let font = FontRef::new(&bytes).unwrap();
        let kinds = font
            .table_slices()
            .map(|slice| AnyTable::read(slice).unwrap())
            .map(|table| match table {
                AnyTable::Head(_) => "head",
                AnyTable::Raw(_) => "raw",
                _ => "other",
            })
            .collect::<Vec<_>>();
        assert_eq!(kinds, ["raw", "head"]);
    }
}
