//! OpenType layout.

use std::collections::BTreeSet;

use read::{tables::layout as read_layout, FontData, ReadError, ResolveOffset};
use types::{GlyphId16, Tag};

use crate::{
    from_obj::{FromObjRef, FromTableRef, ToOwnedObj, ToOwnedTable},
    offsets::{NullableOffsetMarker, OffsetMarker},
    table_type::LookupType,
    validate::{Validate, ValidationCtx},
    write::{array_len, FontWrite, TableWriter},
};

pub use read::tables::layout::{DeltaFormat, LookupFlag};

pub mod builders;
mod context;
mod feature_variations;

pub use builders::{
    Builder, ChainedSequenceContextBuilder, ClassDefBuilder, CoverageTableBuilder,
    FeatureBuilder, LangSysBuilder, LayoutBuilder, LayoutError, LookupId, ScriptBuilder,
    SequenceContextBuilder,
};
pub use context::{
    ChainedClassSequenceRule, ChainedClassSequenceRuleSet, ChainedSequenceContext,
    ChainedSequenceContextFormat1, ChainedSequenceContextFormat2, ChainedSequenceContextFormat3,
    ChainedSequenceRule, ChainedSequenceRuleSet, ClassSequenceRule, ClassSequenceRuleSet,
    SequenceContext, SequenceContextFormat1, SequenceContextFormat2, SequenceContextFormat3,
    SequenceLookupRecord, SequenceRule, SequenceRuleSet,
};
pub use feature_variations::{
    ConditionFormat1, ConditionSet, FeatureTableSubstitution, FeatureTableSubstitutionRecord,
    FeatureVariationRecord, FeatureVariations,
};

/// A macro to implement the [LookupSubtable] trait.
macro_rules! lookup_type {
    (gsub, $ty:ty, $val:expr) => {
        impl $crate::tables::layout::LookupSubtable for $ty {
            const TYPE: $crate::table_type::LookupType =
                $crate::table_type::LookupType::Gsub($val);
        }
    };

    (gpos, $ty:ty, $val:expr) => {
        impl $crate::tables::layout::LookupSubtable for $ty {
            const TYPE: $crate::table_type::LookupType =
                $crate::table_type::LookupType::Gpos($val);
        }
    };
}

/// A macro to define a newtype around an existing table, that defers all
/// impls to that table.
///
/// We use this to ensure that shared lookup types (sequence contexts) can be
/// given different lookup ids for each of GSUB/GPOS.
macro_rules! table_newtype {
    ($name:ident, $inner:ident) => {
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name($inner);

        impl std::ops::Deref for $name {
            type Target = $inner;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl $crate::write::FontWrite for $name {
            fn write_into(&self, writer: &mut $crate::write::TableWriter) {
                self.0.write_into(writer)
            }
        }

        impl $crate::validate::Validate for $name {
            fn validate_impl(&self, ctx: &mut $crate::validate::ValidationCtx) {
                self.0.validate_impl(ctx)
            }
        }

        impl From<$inner> for $name {
            fn from(src: $inner) -> $name {
                $name(src)
            }
        }
    };
}

pub(crate) use lookup_type;
pub(crate) use table_newtype;

/// A utility trait for writing lookup tables.
///
/// This attaches the numerical lookup type to the concrete subtable types,
/// so that it can be written without being passed around.
pub trait LookupSubtable {
    /// The lookup type of this layout subtable.
    const TYPE: LookupType;
}

/// [Script List Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-list-table-and-script-record)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptList {
    /// Array of ScriptRecords, listed alphabetically by script tag
    pub script_records: Vec<ScriptRecord>,
}

impl ScriptList {
    pub fn new(script_records: Vec<ScriptRecord>) -> Self {
        Self { script_records }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptRecord {
    pub script_tag: Tag,
    pub script: OffsetMarker<Script>,
}

impl ScriptRecord {
    pub fn new(script_tag: Tag, script: Script) -> Self {
        Self {
            script_tag,
            script: script.into(),
        }
    }
}

/// [Script Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-table-and-language-system-record)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Script {
    pub default_lang_sys: NullableOffsetMarker<LangSys>,
    /// Array of LangSysRecords, listed alphabetically by LangSys tag
    pub lang_sys_records: Vec<LangSysRecord>,
}

impl Script {
    pub fn new(default_lang_sys: Option<LangSys>, lang_sys_records: Vec<LangSysRecord>) -> Self {
        Self {
            default_lang_sys: default_lang_sys.into(),
            lang_sys_records,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LangSysRecord {
    pub lang_sys_tag: Tag,
    pub lang_sys: OffsetMarker<LangSys>,
}

impl LangSysRecord {
    pub fn new(lang_sys_tag: Tag, lang_sys: LangSys) -> Self {
        Self {
            lang_sys_tag,
            lang_sys: lang_sys.into(),
        }
    }
}

/// [Language System Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#language-system-table)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LangSys {
    /// Index of a feature required for this language system; 0xFFFF if none
    pub required_feature_index: u16,
    /// Array of indices into the FeatureList, in arbitrary order
    pub feature_indices: Vec<u16>,
}

impl LangSys {
    /// The `required_feature_index` that means there is no required feature.
    pub const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

    pub fn new(feature_indices: Vec<u16>) -> Self {
        Self {
            required_feature_index: Self::NO_REQUIRED_FEATURE,
            feature_indices,
        }
    }
}

impl Default for LangSys {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// [Feature List Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-list-table)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureList {
    /// Array of FeatureRecords, ordered alphabetically by feature tag
    pub feature_records: Vec<FeatureRecord>,
}

impl FeatureList {
    pub fn new(feature_records: Vec<FeatureRecord>) -> Self {
        Self { feature_records }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureRecord {
    pub feature_tag: Tag,
    pub feature: OffsetMarker<Feature>,
}

impl FeatureRecord {
    pub fn new(feature_tag: Tag, feature: Feature) -> Self {
        Self {
            feature_tag,
            feature: feature.into(),
        }
    }
}

/// [Feature Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-table)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    pub feature_params: NullableOffsetMarker<FeatureParams>,
    /// Array of indices into the LookupList, zero-based, in any order
    pub lookup_list_indices: Vec<u16>,
}

impl Feature {
    pub fn new(feature_params: Option<FeatureParams>, lookup_list_indices: Vec<u16>) -> Self {
        Self {
            feature_params: feature_params.into(),
            lookup_list_indices,
        }
    }
}

/// The parameters of a feature.
///
/// These are carried as uninterpreted bytes; they contain no offsets.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureParams {
    bytes: Vec<u8>,
}

impl FeatureParams {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// [Lookup List Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-list-table)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupList<T> {
    pub lookups: Vec<OffsetMarker<T>>,
}

impl<T> LookupList<T> {
    pub fn new(lookups: Vec<T>) -> Self {
        Self {
            lookups: lookups.into_iter().map(OffsetMarker::new).collect(),
        }
    }
}

impl<T> Default for LookupList<T> {
    fn default() -> Self {
        Self {
            lookups: Vec::new(),
        }
    }
}

/// [Lookup Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-table)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lookup<T> {
    pub lookup_flag: LookupFlag,
    pub subtables: Vec<OffsetMarker<T>>,
    /// Index into the GDEF mark glyph sets structure.
    ///
    /// Present only if the USE_MARK_FILTERING_SET flag is set.
    pub mark_filtering_set: Option<u16>,
}

impl<T> Lookup<T> {
    pub fn new(lookup_flag: LookupFlag, subtables: Vec<T>) -> Self {
        Self {
            lookup_flag,
            subtables: subtables.into_iter().map(OffsetMarker::new).collect(),
            mark_filtering_set: None,
        }
    }

    /// Set the mark filtering set, along with the flag that enables it.
    pub fn with_mark_filtering_set(mut self, mark_filtering_set: u16) -> Self {
        self.lookup_flag
            .set(LookupFlag::USE_MARK_FILTERING_SET, true);
        self.mark_filtering_set = Some(mark_filtering_set);
        self
    }
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self {
            lookup_flag: LookupFlag::empty(),
            subtables: Vec::new(),
            mark_filtering_set: None,
        }
    }
}

/// [Coverage Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoverageTable {
    Format1(CoverageFormat1),
    Format2(CoverageFormat2),
}

/// [Coverage Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverageFormat1 {
    /// Array of glyph IDs, in numerical order
    pub glyph_array: Vec<GlyphId16>,
}

/// [Coverage Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-2)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverageFormat2 {
    /// Array of glyph ranges, ordered by start glyph ID
    pub range_records: Vec<RangeRecord>,
}

/// Used in [CoverageFormat2]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeRecord {
    pub start_glyph_id: GlyphId16,
    pub end_glyph_id: GlyphId16,
    /// Coverage index of the first glyph in the range
    pub start_coverage_index: u16,
}

impl RangeRecord {
    pub fn new(start_glyph_id: GlyphId16, end_glyph_id: GlyphId16, start_coverage_index: u16) -> Self {
        Self {
            start_glyph_id,
            end_glyph_id,
            start_coverage_index,
        }
    }

    /// An iterator over records for this array of glyphs.
    ///
    /// The glyphs must be sorted and free of duplicates. Coverage indices
    /// that do not fit in a `u16` saturate.
    pub fn iter_for_glyphs(glyphs: &[GlyphId16]) -> impl Iterator<Item = RangeRecord> + '_ {
        let mut cur_range = glyphs.first().copied().map(|g| (g, g));
        let mut len = 0u16;
        let mut iter = glyphs.iter().skip(1).copied();

        #[allow(clippy::while_let_on_iterator)]
        std::iter::from_fn(move || {
            while let Some(glyph) = iter.next() {
                match cur_range {
                    None => return None,
                    Some((a, b)) if are_sequential(b, glyph) => cur_range = Some((a, glyph)),
                    Some((a, b)) => {
                        let result = RangeRecord::new(a, b, len);
                        cur_range = Some((glyph, glyph));
                        len = len.saturating_add(1 + b.to_u16().saturating_sub(a.to_u16()));
                        return Some(result);
                    }
                }
            }
            cur_range
                .take()
                .map(|(start, end)| RangeRecord::new(start, end, len))
        })
    }

    fn len(&self) -> usize {
        self.end_glyph_id
            .to_u16()
            .saturating_sub(self.start_glyph_id.to_u16()) as usize
            + 1
    }
}

impl CoverageTable {
    /// The coverage index of `glyph`, if it is covered.
    pub fn get(&self, glyph: GlyphId16) -> Option<u16> {
        match self {
            CoverageTable::Format1(table) => table
                .glyph_array
                .binary_search(&glyph)
                .ok()
                .and_then(|idx| u16::try_from(idx).ok()),
            CoverageTable::Format2(table) => {
                let record = table
                    .range_records
                    .iter()
                    .find(|rec| rec.start_glyph_id <= glyph && glyph <= rec.end_glyph_id)?;
                let index = record.start_coverage_index as u32
                    + (glyph.to_u16() - record.start_glyph_id.to_u16()) as u32;
                u16::try_from(index).ok()
            }
        }
    }

    /// Iterate the covered glyphs, in coverage index order.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId16> + '_ {
        let (one, two) = match self {
            Self::Format1(table) => (Some(table.glyph_array.iter().copied()), None),
            Self::Format2(table) => (
                None,
                Some(
                    table
                        .range_records
                        .iter()
                        .flat_map(|rcd| iter_gids(rcd.start_glyph_id, rcd.end_glyph_id)),
                ),
            ),
        };

        one.into_iter().flatten().chain(two.into_iter().flatten())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Format1(table) => table.glyph_array.len(),
            Self::Format2(table) => table.range_records.iter().map(RangeRecord::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> u16 {
        match self {
            Self::Format1(_) => 1,
            Self::Format2(_) => 2,
        }
    }
}

impl Default for CoverageTable {
    fn default() -> Self {
        Self::Format1(CoverageFormat1::default())
    }
}

impl FromIterator<GlyphId16> for CoverageTable {
    fn from_iter<T: IntoIterator<Item = GlyphId16>>(iter: T) -> Self {
        CoverageTableBuilder::from_glyphs(iter).build()
    }
}

impl From<Vec<GlyphId16>> for CoverageTable {
    fn from(value: Vec<GlyphId16>) -> Self {
        CoverageTableBuilder::from_glyphs(value).build()
    }
}

/// [Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassDef {
    Format1(ClassDefFormat1),
    Format2(ClassDefFormat2),
}

/// [Class Definition Table Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassDefFormat1 {
    pub start_glyph_id: GlyphId16,
    /// Array of class values, one per glyph ID
    pub class_value_array: Vec<u16>,
}

/// [Class Definition Table Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-2)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassDefFormat2 {
    /// Array of ClassRangeRecords, ordered by start glyph ID
    pub class_range_records: Vec<ClassRangeRecord>,
}

impl ClassDefFormat2 {
    pub fn new(class_range_records: Vec<ClassRangeRecord>) -> Self {
        Self {
            class_range_records,
        }
    }
}

/// Used in [ClassDefFormat2]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassRangeRecord {
    pub start_glyph_id: GlyphId16,
    pub end_glyph_id: GlyphId16,
    /// Applied to all glyphs in the range
    pub class: u16,
}

impl ClassRangeRecord {
    pub fn new(start_glyph_id: GlyphId16, end_glyph_id: GlyphId16, class: u16) -> Self {
        Self {
            start_glyph_id,
            end_glyph_id,
            class,
        }
    }

    fn validate_glyph_range(&self, ctx: &mut ValidationCtx) {
        if self.start_glyph_id > self.end_glyph_id {
            ctx.report(format!(
                "start_glyph_id {} larger than end_glyph_id {}",
                self.start_glyph_id, self.end_glyph_id
            ));
        }
    }
}

impl ClassDef {
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, u16)> + '_ {
        let (one, two) = match self {
            Self::Format1(table) => (
                Some(table.class_value_array.iter().enumerate().map(|(i, cls)| {
                    (
                        GlyphId16::new(table.start_glyph_id.to_u16().saturating_add(i as u16)),
                        *cls,
                    )
                })),
                None,
            ),
            Self::Format2(table) => (
                None,
                Some(table.class_range_records.iter().flat_map(|rcd| {
                    iter_gids(rcd.start_glyph_id, rcd.end_glyph_id).map(|gid| (gid, rcd.class))
                })),
            ),
        };

        one.into_iter().flatten().chain(two.into_iter().flatten())
    }

    /// Return the glyph class for the provided glyph.
    ///
    /// Glyphs which have not been assigned a class are given class 0
    pub fn get(&self, glyph: GlyphId16) -> u16 {
        self.get_raw(glyph).unwrap_or(0)
    }

    fn get_raw(&self, glyph: GlyphId16) -> Option<u16> {
        match self {
            ClassDef::Format1(table) => glyph
                .to_u16()
                .checked_sub(table.start_glyph_id.to_u16())
                .and_then(|idx| table.class_value_array.get(idx as usize))
                .copied(),
            ClassDef::Format2(table) => table.class_range_records.iter().find_map(|rec| {
                (rec.start_glyph_id <= glyph && glyph <= rec.end_glyph_id).then_some(rec.class)
            }),
        }
    }

    /// The number of classes, including the implicit class 0.
    pub fn class_count(&self) -> u16 {
        let classes = self
            .iter()
            .map(|(_, cls)| cls)
            .chain(std::iter::once(0))
            .collect::<BTreeSet<_>>();
        u16::try_from(classes.len()).unwrap_or(u16::MAX)
    }

    pub fn format(&self) -> u16 {
        match self {
            Self::Format1(_) => 1,
            Self::Format2(_) => 2,
        }
    }
}

impl Default for ClassDef {
    fn default() -> Self {
        Self::Format2(ClassDefFormat2::default())
    }
}

impl From<ClassDefFormat2> for ClassDef {
    fn from(src: ClassDefFormat2) -> ClassDef {
        ClassDef::Format2(src)
    }
}

impl From<ClassDefFormat1> for ClassDef {
    fn from(src: ClassDefFormat1) -> ClassDef {
        ClassDef::Format1(src)
    }
}

/// [Device Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#device-and-variationindex-tables)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Device {
    pub start_size: u16,
    pub end_size: u16,
    pub delta_format: DeltaFormat,
    /// Packed deltas, most significant bits first
    pub delta_value: Vec<u16>,
}

impl Device {
    /// Create a device table with one delta per ppem in `start_size..=end_size`.
    ///
    /// The smallest format that can hold every value is chosen.
    ///
    /// # Panics
    ///
    /// If `end_size` is less than `start_size`, or if the number of values
    /// does not match the size range.
    pub fn new(start_size: u16, end_size: u16, values: &[i8]) -> Self {
        assert!(
            start_size <= end_size,
            "device end size {end_size} precedes start size {start_size}"
        );
        assert_eq!(
            (start_size..=end_size).count(),
            values.len(),
            "device range and values must match"
        );
        let delta_format = values
            .iter()
            .map(|val| match val {
                -2..=1 => DeltaFormat::Local2BitDeltas,
                -8..=7 => DeltaFormat::Local4BitDeltas,
                _ => DeltaFormat::Local8BitDeltas,
            })
            .max()
            .unwrap_or(DeltaFormat::Local2BitDeltas);
        let delta_value = encode_delta(delta_format, values);

        Device {
            start_size,
            end_size,
            delta_format,
            delta_value,
        }
    }

    /// The adjustment for this ppem size; zero outside of the table's range.
    pub fn get(&self, ppem: u16) -> i16 {
        let Some(bits) = self.delta_format.bits_per_value() else {
            return 0;
        };
        if ppem < self.start_size || ppem > self.end_size {
            return 0;
        }
        let per_word = 16 / bits;
        let idx = ppem - self.start_size;
        let Some(word) = self.delta_value.get((idx / per_word) as usize) else {
            return 0;
        };
        let shift = 16 - bits * (idx % per_word + 1);
        let raw = (word >> shift) & ((1u16 << bits) - 1);
        if raw >= 1 << (bits - 1) {
            raw as i16 - (1i16 << bits)
        } else {
            raw as i16
        }
    }
}

/// [VariationIndex Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#device-and-variationindex-tables)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariationIndex {
    /// A delta-set outer index, used to select an item variation data subtable
    pub delta_set_outer_index: u16,
    /// A delta-set inner index, used to select a delta-set row
    pub delta_set_inner_index: u16,
}

impl VariationIndex {
    pub fn new(delta_set_outer_index: u16, delta_set_inner_index: u16) -> Self {
        Self {
            delta_set_outer_index,
            delta_set_inner_index,
        }
    }
}

/// Either a [Device] table (in a non-variable font) or a [VariationIndex] table (in a variable font)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceOrVariationIndex {
    Device(Device),
    VariationIndex(VariationIndex),
}

impl From<Device> for DeviceOrVariationIndex {
    fn from(src: Device) -> Self {
        Self::Device(src)
    }
}

impl From<VariationIndex> for DeviceOrVariationIndex {
    fn from(src: VariationIndex) -> Self {
        Self::VariationIndex(src)
    }
}

fn iter_gids(gid1: GlyphId16, gid2: GlyphId16) -> impl Iterator<Item = GlyphId16> {
    (gid1.to_u16()..=gid2.to_u16()).map(GlyphId16::new)
}

fn are_sequential(gid1: GlyphId16, gid2: GlyphId16) -> bool {
    gid2.to_u16().saturating_sub(gid1.to_u16()) == 1
}

fn encode_delta(format: DeltaFormat, values: &[i8]) -> Vec<u16> {
    let (chunk_size, mask, bits) = match format {
        DeltaFormat::Local2BitDeltas => (8, 0b11, 2),
        DeltaFormat::Local4BitDeltas => (4, 0b1111, 4),
        DeltaFormat::Local8BitDeltas | DeltaFormat::VariationIndex => (2, 0b11111111, 8),
    };
    values
        .chunks(chunk_size)
        .map(|chunk| encode_chunk(chunk, mask, bits))
        .collect()
}

fn encode_chunk(chunk: &[i8], mask: u8, bits: usize) -> u16 {
    let mut out = 0u16;
    for (i, val) in chunk.iter().enumerate() {
        out |= ((val.to_be_bytes()[0] & mask) as u16) << ((16 - bits) - i * bits);
    }
    out
}

/* font write */

impl FontWrite for LookupFlag {
    fn write_into(&self, writer: &mut TableWriter) {
        self.to_bits().write_into(writer)
    }
}

impl FontWrite for ScriptList {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.script_records).write_into(writer);
        self.script_records.write_into(writer);
    }
}

impl FontWrite for ScriptRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.script_tag.write_into(writer);
        self.script.write_into(writer);
    }
}

impl FontWrite for Script {
    fn write_into(&self, writer: &mut TableWriter) {
        self.default_lang_sys.write_into(writer);
        array_len(&self.lang_sys_records).write_into(writer);
        self.lang_sys_records.write_into(writer);
    }
}

impl FontWrite for LangSysRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.lang_sys_tag.write_into(writer);
        self.lang_sys.write_into(writer);
    }
}

impl FontWrite for LangSys {
    fn write_into(&self, writer: &mut TableWriter) {
        // lookupOrderOffset, reserved
        0u16.write_into(writer);
        self.required_feature_index.write_into(writer);
        array_len(&self.feature_indices).write_into(writer);
        self.feature_indices.write_into(writer);
    }
}

impl FontWrite for FeatureList {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.feature_records).write_into(writer);
        self.feature_records.write_into(writer);
    }
}

impl FontWrite for FeatureRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.feature_tag.write_into(writer);
        self.feature.write_into(writer);
    }
}

impl FontWrite for Feature {
    fn write_into(&self, writer: &mut TableWriter) {
        self.feature_params.write_into(writer);
        array_len(&self.lookup_list_indices).write_into(writer);
        self.lookup_list_indices.write_into(writer);
    }
}

impl FontWrite for FeatureParams {
    fn write_into(&self, writer: &mut TableWriter) {
        writer.write_slice(&self.bytes)
    }
}

impl<T: FontWrite> FontWrite for LookupList<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.lookups).write_into(writer);
        self.lookups.write_into(writer);
    }
}

impl<T: LookupSubtable + FontWrite> FontWrite for Lookup<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        T::TYPE.write_into(writer);
        self.lookup_flag.write_into(writer);
        array_len(&self.subtables).write_into(writer);
        self.subtables.write_into(writer);
        self.mark_filtering_set.write_into(writer);
    }

    fn table_type(&self) -> crate::table_type::TableType {
        T::TYPE.into()
    }
}

impl FontWrite for CoverageTable {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            CoverageTable::Format1(table) => {
                1u16.write_into(writer);
                array_len(&table.glyph_array).write_into(writer);
                table.glyph_array.write_into(writer);
            }
            CoverageTable::Format2(table) => {
                2u16.write_into(writer);
                array_len(&table.range_records).write_into(writer);
                table.range_records.write_into(writer);
            }
        }
    }
}

impl FontWrite for RangeRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_glyph_id.write_into(writer);
        self.end_glyph_id.write_into(writer);
        self.start_coverage_index.write_into(writer);
    }
}

impl FontWrite for ClassDef {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            ClassDef::Format1(table) => {
                1u16.write_into(writer);
                table.start_glyph_id.write_into(writer);
                array_len(&table.class_value_array).write_into(writer);
                table.class_value_array.write_into(writer);
            }
            ClassDef::Format2(table) => {
                2u16.write_into(writer);
                array_len(&table.class_range_records).write_into(writer);
                table.class_range_records.write_into(writer);
            }
        }
    }
}

impl FontWrite for ClassRangeRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_glyph_id.write_into(writer);
        self.end_glyph_id.write_into(writer);
        self.class.write_into(writer);
    }
}

impl FontWrite for Device {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_size.write_into(writer);
        self.end_size.write_into(writer);
        self.delta_format.to_bits().write_into(writer);
        self.delta_value.write_into(writer);
    }
}

impl FontWrite for VariationIndex {
    fn write_into(&self, writer: &mut TableWriter) {
        self.delta_set_outer_index.write_into(writer);
        self.delta_set_inner_index.write_into(writer);
        DeltaFormat::VariationIndex.to_bits().write_into(writer);
    }
}

impl FontWrite for DeviceOrVariationIndex {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            DeviceOrVariationIndex::Device(table) => table.write_into(writer),
            DeviceOrVariationIndex::VariationIndex(table) => table.write_into(writer),
        }
    }
}

/* validation */

impl Validate for ScriptList {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ScriptList", |ctx| {
            ctx.in_field("script_records", |ctx| {
                ctx.check_array_len(self.script_records.len());
                if !is_strictly_sorted(self.script_records.iter().map(|rec| rec.script_tag)) {
                    ctx.report("script records must be sorted by tag, without duplicates");
                }
                self.script_records.validate_impl(ctx);
            })
        })
    }
}

impl Validate for ScriptRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ScriptRecord", |ctx| {
            ctx.in_field("script", |ctx| self.script.validate_impl(ctx))
        })
    }
}

impl Validate for Script {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Script", |ctx| {
            ctx.in_field("default_lang_sys", |ctx| {
                self.default_lang_sys.validate_impl(ctx)
            });
            ctx.in_field("lang_sys_records", |ctx| {
                ctx.check_array_len(self.lang_sys_records.len());
                if !is_strictly_sorted(self.lang_sys_records.iter().map(|rec| rec.lang_sys_tag)) {
                    ctx.report("language system records must be sorted by tag, without duplicates");
                }
                self.lang_sys_records.validate_impl(ctx);
            })
        })
    }
}

impl Validate for LangSysRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("LangSysRecord", |ctx| {
            ctx.in_field("lang_sys", |ctx| self.lang_sys.validate_impl(ctx))
        })
    }
}

impl Validate for LangSys {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("LangSys", |ctx| {
            ctx.in_field("feature_indices", |ctx| {
                ctx.check_array_len(self.feature_indices.len())
            })
        })
    }
}

impl Validate for FeatureList {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("FeatureList", |ctx| {
            ctx.in_field("feature_records", |ctx| {
                ctx.check_array_len(self.feature_records.len());
                self.feature_records.validate_impl(ctx);
            })
        })
    }
}

impl Validate for FeatureRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("FeatureRecord", |ctx| {
            ctx.in_field("feature", |ctx| self.feature.validate_impl(ctx))
        })
    }
}

impl Validate for Feature {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Feature", |ctx| {
            ctx.in_field("feature_params", |ctx| self.feature_params.validate_impl(ctx));
            ctx.in_field("lookup_list_indices", |ctx| {
                ctx.check_array_len(self.lookup_list_indices.len())
            })
        })
    }
}

impl Validate for FeatureParams {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.bytes.is_empty() {
            ctx.report("feature params must not be empty");
        }
    }
}

impl<T: Validate> Validate for LookupList<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("LookupList", |ctx| {
            ctx.in_field("lookups", |ctx| {
                ctx.check_array_len(self.lookups.len());
                self.lookups.validate_impl(ctx);
            })
        })
    }
}

impl<T: Validate> Validate for Lookup<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Lookup", |ctx| {
            ctx.in_field("subtables", |ctx| {
                ctx.check_array_len(self.subtables.len());
                self.subtables.validate_impl(ctx);
            });
            ctx.in_field("mark_filtering_set", |ctx| {
                check_mark_filtering_set(self.lookup_flag, self.mark_filtering_set, ctx)
            })
        })
    }
}

fn check_mark_filtering_set(flag: LookupFlag, set: Option<u16>, ctx: &mut ValidationCtx) {
    match (flag.contains(LookupFlag::USE_MARK_FILTERING_SET), set) {
        (true, None) => ctx.report("USE_MARK_FILTERING_SET is set but no filtering set is provided"),
        (false, Some(_)) => ctx.report("mark filtering set requires USE_MARK_FILTERING_SET flag"),
        _ => (),
    }
}

impl Validate for CoverageTable {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            CoverageTable::Format1(table) => ctx.in_table("CoverageFormat1", |ctx| {
                ctx.in_field("glyph_array", |ctx| {
                    ctx.check_array_len(table.glyph_array.len());
                    if !is_strictly_sorted(table.glyph_array.iter().copied()) {
                        ctx.report("glyphs must be sorted, without duplicates");
                    }
                })
            }),
            CoverageTable::Format2(table) => ctx.in_table("CoverageFormat2", |ctx| {
                ctx.in_field("range_records", |ctx| {
                    ctx.check_array_len(table.range_records.len());
                    let sorted = table
                        .range_records
                        .windows(2)
                        .all(|pair| pair[0].end_glyph_id < pair[1].start_glyph_id);
                    if !sorted {
                        ctx.report("ranges must be sorted and must not overlap");
                    }
                    ctx.with_array_items(table.range_records.iter(), |ctx, rec| {
                        if rec.start_glyph_id > rec.end_glyph_id {
                            ctx.report(format!(
                                "start_glyph_id {} larger than end_glyph_id {}",
                                rec.start_glyph_id, rec.end_glyph_id
                            ));
                        }
                    })
                })
            }),
        }
    }
}

impl Validate for ClassDef {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            ClassDef::Format1(table) => ctx.in_table("ClassDefFormat1", |ctx| {
                ctx.in_field("class_value_array", |ctx| {
                    ctx.check_array_len(table.class_value_array.len())
                })
            }),
            ClassDef::Format2(table) => table.validate_impl(ctx),
        }
    }
}

impl Validate for ClassDefFormat2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ClassDefFormat2", |ctx| {
            ctx.in_field("class_range_records", |ctx| {
                ctx.check_array_len(self.class_range_records.len());
                ctx.with_array_items(self.class_range_records.iter(), |ctx, rec| {
                    rec.validate_glyph_range(ctx)
                })
            })
        })
    }
}

impl Validate for Device {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Device", |ctx| {
            if self.start_size > self.end_size {
                ctx.in_field("end_size", |ctx| {
                    ctx.report("end_size must not be less than start_size")
                });
            }
            ctx.in_field("delta_value", |ctx| {
                if self.delta_format == DeltaFormat::VariationIndex {
                    ctx.report("a device table must use a local delta format");
                }
                let expected = self
                    .delta_format
                    .value_count(self.start_size, self.end_size);
                if self.delta_value.len() != expected {
                    ctx.report(format!(
                        "expected {expected} delta words, found {}",
                        self.delta_value.len()
                    ));
                }
            })
        })
    }
}

impl Validate for VariationIndex {
    fn validate_impl(&self, _ctx: &mut ValidationCtx) {}
}

impl Validate for DeviceOrVariationIndex {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            DeviceOrVariationIndex::Device(table) => table.validate_impl(ctx),
            DeviceOrVariationIndex::VariationIndex(table) => table.validate_impl(ctx),
        }
    }
}

/// Check that an array has one item per covered glyph.
pub(crate) fn check_coverage_len(coverage: &CoverageTable, len: usize, ctx: &mut ValidationCtx) {
    ctx.check_array_len(len);
    if coverage.len() != len {
        ctx.report(format!(
            "{len} items for {} covered glyphs",
            coverage.len()
        ));
    }
}

pub(crate) fn is_strictly_sorted<T: PartialOrd>(items: impl IntoIterator<Item = T>) -> bool {
    let mut iter = items.into_iter();
    let Some(mut prev) = iter.next() else {
        return true;
    };
    for item in iter {
        if item <= prev {
            return false;
        }
        prev = item;
    }
    true
}

/* conversion from parsed tables */

impl FromObjRef<read_layout::ScriptList<'_>> for ScriptList {
    fn from_obj_ref(obj: &read_layout::ScriptList, _: FontData) -> Result<Self, ReadError> {
        let data = obj.data();
        Ok(ScriptList {
            script_records: obj
                .script_records()
                .iter()
                .map(|rec| {
                    Ok(ScriptRecord {
                        script_tag: rec.script_tag(),
                        script: rec.script(data).to_owned_table()?,
                    })
                })
                .collect::<Result<_, ReadError>>()?,
        })
    }
}

impl FromTableRef<read_layout::ScriptList<'_>> for ScriptList {}

impl FromObjRef<read_layout::Script<'_>> for Script {
    fn from_obj_ref(obj: &read_layout::Script, _: FontData) -> Result<Self, ReadError> {
        let data = obj.data();
        Ok(Script {
            default_lang_sys: obj.default_lang_sys().to_owned_table()?,
            lang_sys_records: obj
                .lang_sys_records()
                .iter()
                .map(|rec| {
                    Ok(LangSysRecord {
                        lang_sys_tag: rec.lang_sys_tag(),
                        lang_sys: rec.lang_sys(data).to_owned_table()?,
                    })
                })
                .collect::<Result<_, ReadError>>()?,
        })
    }
}

impl FromTableRef<read_layout::Script<'_>> for Script {}

impl FromObjRef<read_layout::LangSys<'_>> for LangSys {
    fn from_obj_ref(obj: &read_layout::LangSys, data: FontData) -> Result<Self, ReadError> {
        Ok(LangSys {
            required_feature_index: obj.raw_required_feature_index(),
            feature_indices: obj.feature_indices().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_layout::LangSys<'_>> for LangSys {}

impl FromObjRef<read_layout::FeatureList<'_>> for FeatureList {
    fn from_obj_ref(obj: &read_layout::FeatureList, _: FontData) -> Result<Self, ReadError> {
        let data = obj.data();
        Ok(FeatureList {
            feature_records: obj
                .feature_records()
                .iter()
                .map(|rec| {
                    Ok(FeatureRecord {
                        feature_tag: rec.feature_tag(),
                        feature: rec.feature(data).to_owned_table()?,
                    })
                })
                .collect::<Result<_, ReadError>>()?,
        })
    }
}

impl FromTableRef<read_layout::FeatureList<'_>> for FeatureList {}

impl FromObjRef<read_layout::Feature<'_>> for Feature {
    fn from_obj_ref(obj: &read_layout::Feature, data: FontData) -> Result<Self, ReadError> {
        Ok(Feature {
            feature_params: obj.feature_params().to_owned_table()?,
            lookup_list_indices: obj.lookup_list_indices().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_layout::Feature<'_>> for Feature {}

impl FromObjRef<read_layout::FeatureParams<'_>> for FeatureParams {
    fn from_obj_ref(obj: &read_layout::FeatureParams, _: FontData) -> Result<Self, ReadError> {
        Ok(FeatureParams::new(obj.data().as_bytes()))
    }
}

impl FromTableRef<read_layout::FeatureParams<'_>> for FeatureParams {}

impl<'a, R, T> FromObjRef<read_layout::LookupList<'a, R>> for LookupList<T>
where
    T: FromTableRef<read_layout::Lookup<'a, R>>,
{
    fn from_obj_ref(obj: &read_layout::LookupList<'a, R>, _: FontData) -> Result<Self, ReadError> {
        Ok(LookupList {
            lookups: obj
                .iter()
                .map(|lookup| lookup.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl<'a, R, T> FromTableRef<read_layout::LookupList<'a, R>> for LookupList<T> where
    T: FromTableRef<read_layout::Lookup<'a, R>>
{
}

/// The error for a lookup whose subtables are not all of the lookup's type.
pub(crate) const MIXED_SUBTABLES: ReadError =
    ReadError::MalformedData("lookup subtables have mixed types");

/// The type of a parsed lookup, looking through extension subtables.
pub(crate) fn resolved_lookup_type<'a, R>(
    lookup: &read_layout::Lookup<'a, R>,
) -> Result<u16, ReadError>
where
    R: read_layout::LookupSubtable<'a>,
{
    let lookup_type = lookup.lookup_type();
    if lookup_type != R::EXTENSION_TYPE {
        return Ok(lookup_type);
    }
    let first = lookup
        .subtable_offsets()
        .first()
        .ok_or(ReadError::MalformedData("extension lookup has no subtables"))?;
    let ext: read_layout::ExtensionFormat1 = first.get().resolve(lookup.data())?;
    Ok(ext.extension_lookup_type())
}

/// Convert the subtables of a parsed lookup.
///
/// Fails if any subtable cannot be read, or if `convert` rejects one.
pub(crate) fn convert_lookup<'a, R, T>(
    lookup: &read_layout::Lookup<'a, R>,
    mut convert: impl FnMut(R) -> Result<T, ReadError>,
) -> Result<Lookup<T>, ReadError>
where
    R: read_layout::LookupSubtable<'a>,
{
    let subtables = lookup
        .subtables()
        .iter()
        .map(|subtable| subtable.and_then(&mut convert).map(OffsetMarker::new))
        .collect::<Result<_, _>>()?;
    Ok(Lookup {
        lookup_flag: lookup.lookup_flag(),
        subtables,
        mark_filtering_set: lookup.mark_filtering_set(),
    })
}

impl FromObjRef<read_layout::CoverageTable<'_>> for CoverageTable {
    fn from_obj_ref(obj: &read_layout::CoverageTable, data: FontData) -> Result<Self, ReadError> {
        Ok(match obj {
            read_layout::CoverageTable::Format1(table) => {
                CoverageTable::Format1(CoverageFormat1 {
                    glyph_array: table.glyph_array().to_owned_obj(data)?,
                })
            }
            read_layout::CoverageTable::Format2(table) => {
                CoverageTable::Format2(CoverageFormat2 {
                    range_records: table.range_records().to_owned_obj(data)?,
                })
            }
        })
    }
}

impl FromTableRef<read_layout::CoverageTable<'_>> for CoverageTable {}

impl FromObjRef<read_layout::RangeRecord> for RangeRecord {
    fn from_obj_ref(obj: &read_layout::RangeRecord, _: FontData) -> Result<Self, ReadError> {
        Ok(RangeRecord {
            start_glyph_id: obj.start_glyph_id(),
            end_glyph_id: obj.end_glyph_id(),
            start_coverage_index: obj.start_coverage_index(),
        })
    }
}

impl FromObjRef<read_layout::ClassDef<'_>> for ClassDef {
    fn from_obj_ref(obj: &read_layout::ClassDef, data: FontData) -> Result<Self, ReadError> {
        Ok(match obj {
            read_layout::ClassDef::Format1(table) => ClassDef::Format1(ClassDefFormat1 {
                start_glyph_id: table.start_glyph_id(),
                class_value_array: table.class_value_array().to_owned_obj(data)?,
            }),
            read_layout::ClassDef::Format2(table) => ClassDef::Format2(ClassDefFormat2 {
                class_range_records: table.class_range_records().to_owned_obj(data)?,
            }),
        })
    }
}

impl FromTableRef<read_layout::ClassDef<'_>> for ClassDef {}

impl FromObjRef<read_layout::ClassRangeRecord> for ClassRangeRecord {
    fn from_obj_ref(obj: &read_layout::ClassRangeRecord, _: FontData) -> Result<Self, ReadError> {
        Ok(ClassRangeRecord {
            start_glyph_id: obj.start_glyph_id(),
            end_glyph_id: obj.end_glyph_id(),
            class: obj.class(),
        })
    }
}

impl FromObjRef<read_layout::Device<'_>> for Device {
    fn from_obj_ref(obj: &read_layout::Device, data: FontData) -> Result<Self, ReadError> {
        Ok(Device {
            start_size: obj.start_size(),
            end_size: obj.end_size(),
            delta_format: obj.delta_format(),
            delta_value: obj.delta_value().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_layout::Device<'_>> for Device {}

impl FromObjRef<read_layout::VariationIndex<'_>> for VariationIndex {
    fn from_obj_ref(obj: &read_layout::VariationIndex, _: FontData) -> Result<Self, ReadError> {
        Ok(VariationIndex {
            delta_set_outer_index: obj.delta_set_outer_index(),
            delta_set_inner_index: obj.delta_set_inner_index(),
        })
    }
}

impl FromTableRef<read_layout::VariationIndex<'_>> for VariationIndex {}

impl FromObjRef<read_layout::DeviceOrVariationIndex<'_>> for DeviceOrVariationIndex {
    fn from_obj_ref(
        obj: &read_layout::DeviceOrVariationIndex,
        _: FontData,
    ) -> Result<Self, ReadError> {
        Ok(match obj {
            read_layout::DeviceOrVariationIndex::Device(table) => {
                DeviceOrVariationIndex::Device(table.to_owned_table()?)
            }
            read_layout::DeviceOrVariationIndex::VariationIndex(table) => {
                DeviceOrVariationIndex::VariationIndex(table.to_owned_table()?)
            }
        })
    }
}

impl FromTableRef<read_layout::DeviceOrVariationIndex<'_>> for DeviceOrVariationIndex {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::FontRead;
    use rstest::rstest;

    use super::*;
    use crate::dump_table;

    fn make_glyph_vec<const N: usize>(gids: [u16; N]) -> Vec<GlyphId16> {
        gids.into_iter().map(GlyphId16::new).collect()
    }

    #[test]
    fn array_len_smoke_test() {
        let table = ScriptList {
            script_records: vec![ScriptRecord::new(
                Tag::new(b"hihi"),
                Script::new(
                    None,
                    vec![LangSysRecord::new(
                        Tag::new(b"coco"),
                        LangSys::new(vec![69; (u16::MAX) as usize + 5]),
                    )],
                ),
            )],
        };

        let report = table.validate().unwrap_err();
        assert!(report.to_string().contains("array exceeds max length"));
    }

    #[test]
    fn validate_classdef_ranges() {
        let classdef = ClassDefFormat2::new(vec![ClassRangeRecord::new(
            GlyphId16::new(12),
            GlyphId16::new(3),
            7,
        )]);

        let report = classdef.validate().unwrap_err();
        assert!(report.to_string().contains("larger than end_glyph_id"));
    }

    #[test]
    fn unsorted_scripts_are_rejected() {
        let table = ScriptList::new(vec![
            ScriptRecord::new(Tag::new(b"latn"), Script::default()),
            ScriptRecord::new(Tag::new(b"cyrl"), Script::default()),
        ]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn delta_encode() {
        let inp = [1i8, 2, 3, -1];
        let result = encode_delta(DeltaFormat::Local4BitDeltas, &inp);
        assert_eq!(result, vec![0x123f_u16]);

        let inp = [1i8, 1, 1, 1, 1];
        let result = encode_delta(DeltaFormat::Local2BitDeltas, &inp);
        assert_eq!(result, vec![0x5540_u16]);
    }

    #[test]
    fn device_format_2_round_trip() {
        let device = Device::new(10, 13, &[-1, 0, 3, -8]);
        assert_eq!(device.delta_format, DeltaFormat::Local4BitDeltas);
        assert_eq!(device.delta_value, vec![0xf038]);

        let bytes = dump_table(&device).unwrap();
        assert_eq!(bytes, [0, 10, 0, 13, 0, 2, 0xf0, 0x38]);
        let read_back = read_layout::Device::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.iter().collect::<Vec<_>>(), [-1, 0, 3, -8]);
        assert_eq!(read_back.get(9), 0);
        assert_eq!(read_back.get(14), 0);

        let owned: Device = read_back.to_owned_table().unwrap();
        assert_eq!(owned, device);
        assert_eq!((10..=13).map(|ppem| owned.get(ppem)).collect::<Vec<_>>(), [-1, 0, 3, -8]);
    }

    #[rstest]
    #[case(&[1, -2, 0], DeltaFormat::Local2BitDeltas)]
    #[case(&[1, 7, -8], DeltaFormat::Local4BitDeltas)]
    #[case(&[1, 8, 0], DeltaFormat::Local8BitDeltas)]
    #[case(&[-100, 0, 127], DeltaFormat::Local8BitDeltas)]
    fn device_picks_smallest_format(#[case] values: &[i8], #[case] expected: DeltaFormat) {
        let device = Device::new(12, 14, values);
        assert_eq!(device.delta_format, expected);
        assert!(device.validate().is_ok());
        let decoded = (12..=14).map(|ppem| device.get(ppem) as i8).collect::<Vec<_>>();
        assert_eq!(decoded, values);
    }

    #[test]
    #[should_panic(expected = "precedes start size")]
    fn device_reversed_range() {
        Device::new(12, 11, &[]);
    }

    #[test]
    fn variation_index_format() {
        let table = DeviceOrVariationIndex::from(VariationIndex::new(0xff, 0xee));
        let bytes = dump_table(&table).unwrap();
        assert_eq!(bytes, [0, 0xff, 0, 0xee, 0x80, 0]);
        let read_back = read_layout::DeviceOrVariationIndex::read(FontData::new(&bytes)).unwrap();
        let owned: DeviceOrVariationIndex = read_back.to_owned_table().unwrap();
        assert_eq!(owned, table);
    }

    #[test]
    fn coverage_builder() {
        let coverage = make_glyph_vec([1u16, 2, 9, 3, 6, 9])
            .into_iter()
            .collect::<CoverageTable>();
        assert_eq!(coverage.iter().collect::<Vec<_>>(), make_glyph_vec([1, 2, 3, 6, 9]));
    }

    #[test]
    fn coverage_round_trip() {
        let coverage = CoverageTable::from(make_glyph_vec([2, 3, 4, 5, 6, 20, 21, 22, 23, 40]));
        assert_eq!(coverage.format(), 2);
        let bytes = dump_table(&coverage).unwrap();
        let read_back = read_layout::CoverageTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.iter().collect::<Vec<_>>(), coverage.iter().collect::<Vec<_>>());
        let owned: CoverageTable = read_back.to_owned_table().unwrap();
        assert_eq!(owned, coverage);
        assert_eq!(dump_table(&owned).unwrap(), bytes);
    }

    #[test]
    fn coverage_format_2_saturates() {
        // one range covering every glyph id ends at index 65535
        let coverage = CoverageTable::Format2(CoverageFormat2 {
            range_records: vec![
                RangeRecord::new(GlyphId16::new(0), GlyphId16::new(9), 65530),
                RangeRecord::new(GlyphId16::new(20), GlyphId16::new(29), 0),
            ],
        });
        assert_eq!(coverage.get(GlyphId16::new(5)), Some(65535));
        assert_eq!(coverage.get(GlyphId16::new(6)), None);

        let bytes = dump_table(&coverage).unwrap();
        let read_back = read_layout::CoverageTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.get(GlyphId16::new(5)), Some(65535));
        assert_eq!(read_back.get(GlyphId16::new(6)), None);
        assert_eq!(read_back.get(GlyphId16::new(21)), Some(1));
    }

    #[test]
    fn classdef_round_trip() {
        let class_def = [(3u16, 4u16), (4, 6), (5, 1), (9, 5), (10, 2), (11, 3)]
            .map(|(gid, cls)| (GlyphId16::new(gid), cls))
            .into_iter()
            .collect::<ClassDefBuilder>()
            .build();
        let bytes = dump_table(&class_def).unwrap();
        let read_back = read_layout::ClassDef::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.get(GlyphId16::new(9)), 5);
        assert_eq!(read_back.get(GlyphId16::new(7)), 0);
        let owned: ClassDef = read_back.to_owned_table().unwrap();
        assert_eq!(owned, class_def);
        assert_eq!(owned.class_count(), 7);
    }

    #[test]
    fn classdef_f2_get() {
        let cls: ClassDef = ClassDefFormat2::new(vec![
            ClassRangeRecord::new(GlyphId16::new(1), GlyphId16::new(1), 1),
            ClassRangeRecord::new(GlyphId16::new(2), GlyphId16::new(9), 2),
        ])
        .into();
        assert_eq!(cls.get(GlyphId16::new(2)), 2);
        assert_eq!(cls.get(GlyphId16::new(9)), 2);
        assert_eq!(cls.get(GlyphId16::new(20)), 0);
    }

    #[test]
    fn lookup_mark_filtering_set() {
        let lookup: Lookup<CoverageTable> = Lookup::new(LookupFlag::IGNORE_MARKS, Vec::new());
        assert!(lookup.validate().is_ok());
        let lookup = lookup.with_mark_filtering_set(3);
        assert!(lookup.lookup_flag.contains(LookupFlag::USE_MARK_FILTERING_SET));
        assert!(lookup.validate().is_ok());

        let bad = Lookup::<CoverageTable> {
            mark_filtering_set: None,
            ..lookup
        };
        assert!(bad.validate().is_err());
    }
}
