//! Identifiers for specific tables
//!
//! These record the kind of a serialized table when packing needs to treat
//! it specially; layout lookups, for instance, can be promoted to extension
//! lookups when their offsets overflow.

use types::Tag;

use crate::write::{FontWrite, TableWriter};

/// A marker for identifying the original source of various compiled tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TableType {
    // a table with no special behaviour
    #[default]
    Unknown,
    /// A top-level table
    TopLevel(Tag),
    GposLookup(u16),
    GsubLookup(u16),
}

/// Raw values for the different layout subtables
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupType {
    Gpos(u16),
    Gsub(u16),
}

impl TableType {
    pub(crate) const GSUB: TableType = TableType::TopLevel(Tag::new(b"GSUB"));
    pub(crate) const GPOS: TableType = TableType::TopLevel(Tag::new(b"GPOS"));

    /// `true` if this is a lookup that could become an extension lookup.
    pub(crate) fn is_promotable(self) -> bool {
        match self {
            TableType::GsubLookup(type_) => type_ != LookupType::GSUB_EXT_TYPE,
            TableType::GposLookup(type_) => type_ != LookupType::GPOS_EXT_TYPE,
            _ => false,
        }
    }

    pub(crate) fn to_lookup_type(self) -> Option<LookupType> {
        match self {
            TableType::GsubLookup(type_) => Some(LookupType::Gsub(type_)),
            TableType::GposLookup(type_) => Some(LookupType::Gpos(type_)),
            _ => None,
        }
    }
}

impl LookupType {
    pub(crate) const GSUB_EXT_TYPE: u16 = 7;
    pub(crate) const GPOS_EXT_TYPE: u16 = 9;

    pub(crate) fn to_raw(self) -> u16 {
        match self {
            LookupType::Gpos(val) => val,
            LookupType::Gsub(val) => val,
        }
    }

    pub(crate) fn promote(self) -> Self {
        match self {
            LookupType::Gpos(_) => LookupType::Gpos(Self::GPOS_EXT_TYPE),
            LookupType::Gsub(_) => LookupType::Gsub(Self::GSUB_EXT_TYPE),
        }
    }
}

impl From<LookupType> for TableType {
    fn from(src: LookupType) -> TableType {
        match src {
            LookupType::Gpos(type_) => TableType::GposLookup(type_),
            LookupType::Gsub(type_) => TableType::GsubLookup(type_),
        }
    }
}

impl FontWrite for LookupType {
    fn write_into(&self, writer: &mut TableWriter) {
        self.to_raw().write_into(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotable() {
        assert!(TableType::GsubLookup(4).is_promotable());
        assert!(TableType::GposLookup(2).is_promotable());
        assert!(!TableType::GsubLookup(7).is_promotable());
        assert!(!TableType::GposLookup(9).is_promotable());
        assert!(!TableType::GSUB.is_promotable());
        assert_eq!(
            TableType::from(LookupType::Gpos(4).promote()),
            TableType::GposLookup(9)
        );
    }
}
