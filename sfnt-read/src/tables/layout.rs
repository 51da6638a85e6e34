//! OpenType Layout common table formats
//!
//! These are the structures shared by `GSUB` and `GPOS`: the script, feature
//! and lookup lists, and the coverage, class definition, device and
//! contextual subtables.

mod class_def;
mod context;
mod coverage;
mod device;
mod feature;
mod feature_variations;
mod lookup_flag;
mod script;

use std::marker::PhantomData;

use types::{BigEndian, MajorMinor, Nullable, Offset, Offset16, Offset32, Tag};

use crate::{
    ArrayOfOffsets, FontData, FontRead, FontReadWithArgs, ReadArgs, ReadError, ResolveOffset,
};

pub use class_def::{ClassDef, ClassDefFormat1, ClassDefFormat2, ClassRangeRecord};
pub use context::{
    ChainedClassSequenceRule, ChainedClassSequenceRuleSet, ChainedSequenceContext,
    ChainedSequenceContextFormat1, ChainedSequenceContextFormat2, ChainedSequenceContextFormat3,
    ChainedSequenceRule, ChainedSequenceRuleSet, ClassSequenceRule, ClassSequenceRuleSet,
    SequenceContext, SequenceContextFormat1, SequenceContextFormat2, SequenceContextFormat3,
    SequenceLookupRecord, SequenceRule, SequenceRuleSet,
};
pub use coverage::{CoverageFormat1, CoverageFormat2, CoverageTable, RangeRecord};
pub use device::{DeltaFormat, Device, DeviceOrVariationIndex, VariationIndex};
pub use feature::{Feature, FeatureList, FeatureParams, FeatureRecord};
pub use feature_variations::{
    ConditionFormat1, ConditionSet, FeatureTableSubstitution, FeatureTableSubstitutionRecord,
    FeatureVariationRecord, FeatureVariations,
};
pub use lookup_flag::LookupFlag;
pub use script::{LangSys, LangSysRecord, Script, ScriptList, ScriptRecord, SelectedScript};

/// An element of a tagged list, along with its tag.
#[derive(Clone, Debug)]
pub struct TaggedElement<T> {
    pub tag: Tag,
    pub element: T,
}

impl<T> TaggedElement<T> {
    pub fn new(tag: Tag, element: T) -> Self {
        Self { tag, element }
    }
}

impl<T> std::ops::Deref for TaggedElement<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.element
    }
}

/// The subtable type of a `GSUB` or `GPOS` lookup.
///
/// Subtables are read with the lookup type as an argument, and an
/// implementation is responsible for dispatching on it.
pub trait LookupSubtable<'a>: FontReadWithArgs<'a> + ReadArgs<Args = u16> {
    /// The lookup type used for extension lookups in this table.
    const EXTENSION_TYPE: u16;
}

/// The header shared by `GSUB` and `GPOS`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LayoutHeader<'a> {
    pub(crate) data: FontData<'a>,
    pub(crate) version: MajorMinor,
    pub(crate) script_list_offset: Nullable<Offset16>,
    pub(crate) feature_list_offset: Nullable<Offset16>,
    pub(crate) lookup_list_offset: Nullable<Offset16>,
    pub(crate) feature_variations_offset: Option<Nullable<Offset32>>,
}

impl<'a> FontRead<'a> for LayoutHeader<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: MajorMinor = cursor.read()?;
        if version.major != 1 {
            return Err(ReadError::InvalidFormat(version.major as _));
        }
        let script_list_offset = cursor.read()?;
        let feature_list_offset = cursor.read()?;
        let lookup_list_offset = cursor.read()?;
        let feature_variations_offset = version
            .compatible(MajorMinor::VERSION_1_1)
            .then(|| cursor.read())
            .transpose()?;
        cursor.finish()?;
        Ok(LayoutHeader {
            data,
            version,
            script_list_offset,
            feature_list_offset,
            lookup_list_offset,
            feature_variations_offset,
        })
    }
}

impl<'a> LayoutHeader<'a> {
    // a null list offset is treated as an empty list
    fn resolve_list<T: FontRead<'a>>(&self, offset: Nullable<Offset16>) -> Result<T, ReadError> {
        match offset.offset().non_null() {
            Some(_) => offset.offset().resolve(self.data),
            None => T::read(FontData::new(&[0, 0])),
        }
    }

    pub(crate) fn script_list(&self) -> Result<ScriptList<'a>, ReadError> {
        self.resolve_list(self.script_list_offset)
    }

    pub(crate) fn feature_list(&self) -> Result<FeatureList<'a>, ReadError> {
        self.resolve_list(self.feature_list_offset)
    }

    pub(crate) fn lookup_list<T>(&self) -> Result<LookupList<'a, T>, ReadError> {
        self.resolve_list(self.lookup_list_offset)
    }

    pub(crate) fn feature_variations(
        &self,
    ) -> Option<Result<FeatureVariations<'a>, ReadError>> {
        let offset = self.feature_variations_offset?;
        offset.offset().non_null()?;
        Some(offset.offset().resolve(self.data))
    }
}

/// Common access to the lists of a `GSUB` or `GPOS` table.
pub trait LayoutTable<'a> {
    /// The type of this table's lookup subtables.
    type Subtable;

    fn script_list(&self) -> Result<ScriptList<'a>, ReadError>;

    fn feature_list(&self) -> Result<FeatureList<'a>, ReadError>;

    fn lookup_list(&self) -> Result<LookupList<'a, Self::Subtable>, ReadError>;
}

/// A [Lookup List](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-list-table) table
pub struct LookupList<'a, T> {
    data: FontData<'a>,
    lookup_offsets: &'a [BigEndian<Offset16>],
    phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for LookupList<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LookupList<'_, T> {}

impl<'a, T> FontRead<'a> for LookupList<'a, T> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let lookup_count: u16 = cursor.read()?;
        let lookup_offsets = cursor.read_array(lookup_count as usize)?;
        Ok(LookupList {
            data,
            lookup_offsets,
            phantom: PhantomData,
        })
    }
}

impl<'a, T> LookupList<'a, T> {
    /// Number of lookups in this table
    pub fn lookup_count(&self) -> u16 {
        self.lookup_offsets.len() as u16
    }

    /// Array of offsets to Lookup tables, from beginning of LookupList
    pub fn lookup_offsets(&self) -> &'a [BigEndian<Offset16>] {
        self.lookup_offsets
    }

    /// Return the lookup at the provided index.
    pub fn get(&self, index: u16) -> Result<Lookup<'a, T>, ReadError> {
        self.lookup_offsets
            .get(index as usize)
            .ok_or(ReadError::InvalidCollectionIndex(index as _))
            .and_then(|offset| offset.get().resolve(self.data))
    }

    /// Iterate over the lookups in this list, in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Lookup<'a, T>, ReadError>> + 'a {
        let data = self.data;
        self.lookup_offsets
            .iter()
            .map(move |offset| offset.get().resolve(data))
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// A [Lookup Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#lookupTbl)
///
/// `T` is the type of the lookup's subtables.
pub struct Lookup<'a, T> {
    data: FontData<'a>,
    lookup_type: u16,
    lookup_flag: LookupFlag,
    subtable_offsets: &'a [BigEndian<Offset16>],
    mark_filtering_set: Option<u16>,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Lookup<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Lookup<'_, T> {}

impl<'a, T> FontRead<'a> for Lookup<'a, T> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let lookup_type = cursor.read()?;
        let lookup_flag: LookupFlag = cursor.read()?;
        let sub_table_count: u16 = cursor.read()?;
        let subtable_offsets = cursor.read_array(sub_table_count as usize)?;
        let mark_filtering_set = lookup_flag
            .contains(LookupFlag::USE_MARK_FILTERING_SET)
            .then(|| cursor.read())
            .transpose()?;
        cursor.finish()?;
        Ok(Lookup {
            data,
            lookup_type,
            lookup_flag,
            subtable_offsets,
            mark_filtering_set,
            phantom: PhantomData,
        })
    }
}

impl<'a, T> Lookup<'a, T> {
    /// Different enumerations for GSUB and GPOS
    pub fn lookup_type(&self) -> u16 {
        self.lookup_type
    }

    /// Lookup qualifiers
    pub fn lookup_flag(&self) -> LookupFlag {
        self.lookup_flag
    }

    /// Number of subtables for this lookup
    pub fn subtable_count(&self) -> u16 {
        self.subtable_offsets.len() as u16
    }

    /// Array of offsets to lookup subtables, from beginning of Lookup table
    pub fn subtable_offsets(&self) -> &'a [BigEndian<Offset16>] {
        self.subtable_offsets
    }

    /// Index (base 0) into GDEF mark glyph sets structure.
    ///
    /// Present only if the `USE_MARK_FILTERING_SET` flag is set.
    pub fn mark_filtering_set(&self) -> Option<u16> {
        self.mark_filtering_set
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl<'a, T: LookupSubtable<'a>> Lookup<'a, T> {
    /// Read the subtable at the provided index.
    ///
    /// Extension subtables are resolved to the subtable they point to.
    pub fn subtable(&self, index: u16) -> Result<T, ReadError> {
        self.subtable_offsets
            .get(index as usize)
            .ok_or(ReadError::InvalidCollectionIndex(index as _))
            .and_then(|offset| {
                offset
                    .get()
                    .resolve_with_args(self.data, &self.lookup_type)
            })
    }

    /// The subtables of this lookup, resolved as they are accessed.
    pub fn subtables(&self) -> ArrayOfOffsets<'a, T, Offset16> {
        ArrayOfOffsets::new(self.subtable_offsets, self.data, self.lookup_type)
    }
}

/// An extension subtable, format 1.
///
/// This is used as [`ExtensionSubstFormat1`][crate::tables::gsub::ExtensionSubstFormat1]
/// and [`ExtensionPosFormat1`][crate::tables::gpos::ExtensionPosFormat1].
#[derive(Clone, Copy, Debug)]
pub struct ExtensionFormat1<'a> {
    data: FontData<'a>,
    extension_lookup_type: u16,
    extension_offset: Offset32,
}

impl<'a> FontRead<'a> for ExtensionFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format as _));
        }
        let extension_lookup_type = cursor.read()?;
        let extension_offset = cursor.read()?;
        cursor.finish()?;
        Ok(ExtensionFormat1 {
            data,
            extension_lookup_type,
            extension_offset,
        })
    }
}

impl<'a> ExtensionFormat1<'a> {
    /// The lookup type of the subtable this extension points to.
    pub fn extension_lookup_type(&self) -> u16 {
        self.extension_lookup_type
    }

    /// Offset to the extension subtable, relative to the start of this table.
    pub fn extension_offset(&self) -> Offset32 {
        self.extension_offset
    }

    /// Resolve the wrapped subtable, typed by the inner lookup type.
    ///
    /// It is an error for an extension to point to another extension.
    pub fn resolve<T: LookupSubtable<'a>>(&self) -> Result<T, ReadError> {
        if self.extension_lookup_type == T::EXTENSION_TYPE {
            return Err(ReadError::MalformedData("extension of an extension"));
        }
        self.extension_offset
            .resolve_with_args(self.data, &self.extension_lookup_type)
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn lookup_with_mark_filtering_set() {
        let bytes = be_buffer! {
            1u16,      // lookup type
            0x0010u16, // use mark filtering set
            2u16, 12u16, 20u16,
            7u16       // mark filtering set
        };
        let lookup: Lookup<()> = Lookup::read(FontData::new(&bytes)).unwrap();
        assert_eq!(lookup.lookup_type(), 1);
        assert_eq!(lookup.subtable_count(), 2);
        assert_eq!(lookup.mark_filtering_set(), Some(7));

        // the flag requires the field
        let truncated = &bytes[..bytes.len() - 2];
        assert!(Lookup::<()>::read(FontData::new(truncated)).is_err());
    }

    #[test]
    fn extension_format() {
        let bytes = be_buffer! { 2u16, 1u16, 8u32 };
        assert_eq!(
            ExtensionFormat1::read(FontData::new(&bytes)).err(),
            Some(ReadError::InvalidFormat(2))
        );
    }

    #[test]
    fn layout_header_versions() {
        let v1_0 = be_buffer! { 1u16, 0u16, 10u16, 0u16, 0u16 };
        let header = LayoutHeader::read(FontData::new(&v1_0)).unwrap();
        assert!(header.feature_variations_offset.is_none());
        // null lists read as empty
        assert_eq!(header.feature_list().unwrap().feature_count(), 0);
        assert_eq!(header.lookup_list::<()>().unwrap().lookup_count(), 0);

        let v1_1 = be_buffer! { 1u16, 1u16, 0u16, 0u16, 0u16, 0u32 };
        let header = LayoutHeader::read(FontData::new(&v1_1)).unwrap();
        assert_eq!(header.version, MajorMinor::VERSION_1_1);
        assert!(header.feature_variations().is_none());

        let v2 = be_buffer! { 2u16, 0u16, 0u16, 0u16, 0u16 };
        assert!(LayoutHeader::read(FontData::new(&v2)).is_err());
    }
}
