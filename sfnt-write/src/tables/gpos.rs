//! the [GPOS] table
//!
//! [GPOS]: https://docs.microsoft.com/en-us/typography/opentype/spec/gpos

use read::{tables::gpos as read_gpos, FontData, ReadError, ResolveOffset, TopLevelTable};
use types::{GlyphId16, MajorMinor, Tag};

use super::layout::{
    check_coverage_len, convert_lookup, is_strictly_sorted, resolved_lookup_type,
    ChainedSequenceContext, ClassDef, CoverageTable, DeviceOrVariationIndex, FeatureList,
    FeatureVariations, LayoutBuilder, LayoutError, Lookup, LookupList, ScriptList,
    SequenceContext, MIXED_SUBTABLES,
};
use crate::{
    from_obj::{FromObjRef, FromTableRef, ToOwnedObj, ToOwnedTable},
    offsets::{NullableOffsetMarker, OffsetMarker, WIDTH_32},
    table_type::TableType,
    validate::{Validate, ValidationCtx},
    write::{array_len, FontWrite, TableWriter},
};

pub mod builders;
#[path = "./value_record.rs"]
mod value_record;

pub use builders::{
    ClassPairPosBuilder, CursivePosBuilder, MarkBasePosBuilder, MarkLigPosBuilder,
    MarkMarkPosBuilder, PairPosBuilder, SinglePosBuilder,
};
pub use read::tables::gpos::ValueFormat;
pub use value_record::ValueRecord;

use value_record::union_format;

/// A GPOS lookup list table.
pub type PositionLookupList = LookupList<PositionLookup>;

super::layout::table_newtype!(PositionSequenceContext, SequenceContext);
super::layout::table_newtype!(PositionChainContext, ChainedSequenceContext);

super::layout::lookup_type!(gpos, SinglePos, 1);
super::layout::lookup_type!(gpos, PairPos, 2);
super::layout::lookup_type!(gpos, CursivePosFormat1, 3);
super::layout::lookup_type!(gpos, MarkBasePosFormat1, 4);
super::layout::lookup_type!(gpos, MarkLigPosFormat1, 5);
super::layout::lookup_type!(gpos, MarkMarkPosFormat1, 6);
super::layout::lookup_type!(gpos, PositionSequenceContext, 7);
super::layout::lookup_type!(gpos, PositionChainContext, 8);

/// [GPOS](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#gpos-header)
///
/// Version 1.1 is written only when feature variations are present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gpos {
    pub script_list: OffsetMarker<ScriptList>,
    pub feature_list: OffsetMarker<FeatureList>,
    pub lookup_list: OffsetMarker<PositionLookupList>,
    pub feature_variations: NullableOffsetMarker<FeatureVariations, WIDTH_32>,
}

impl Gpos {
    pub fn new(
        script_list: ScriptList,
        feature_list: FeatureList,
        lookup_list: PositionLookupList,
    ) -> Self {
        Self {
            script_list: script_list.into(),
            feature_list: feature_list.into(),
            lookup_list: lookup_list.into(),
            feature_variations: NullableOffsetMarker::new(None),
        }
    }

    pub fn with_feature_variations(mut self, feature_variations: FeatureVariations) -> Self {
        self.feature_variations.set(feature_variations);
        self
    }

    /// Construct a GPOS table from a [LayoutBuilder].
    pub fn from_builder(builder: LayoutBuilder<PositionLookup>) -> Result<Self, LayoutError> {
        let (scripts, features, lookups) = builder.build()?;
        Ok(Self::new(scripts, features, lookups))
    }
}

impl TopLevelTable for Gpos {
    const TAG: Tag = read_gpos::TAG;
}

/// A lookup in the GPOS table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PositionLookup {
    Single(Lookup<SinglePos>),
    Pair(Lookup<PairPos>),
    Cursive(Lookup<CursivePosFormat1>),
    MarkToBase(Lookup<MarkBasePosFormat1>),
    MarkToLig(Lookup<MarkLigPosFormat1>),
    MarkToMark(Lookup<MarkMarkPosFormat1>),
    Contextual(Lookup<PositionSequenceContext>),
    ChainContextual(Lookup<PositionChainContext>),
}

impl PositionLookup {
    /// The lookup type of this lookup (never the extension type)
    pub fn lookup_type(&self) -> u16 {
        match self {
            PositionLookup::Single(_) => 1,
            PositionLookup::Pair(_) => 2,
            PositionLookup::Cursive(_) => 3,
            PositionLookup::MarkToBase(_) => 4,
            PositionLookup::MarkToLig(_) => 5,
            PositionLookup::MarkToMark(_) => 6,
            PositionLookup::Contextual(_) => 7,
            PositionLookup::ChainContextual(_) => 8,
        }
    }
}

impl Default for PositionLookup {
    fn default() -> Self {
        PositionLookup::Single(Lookup::default())
    }
}

/// LookupType 1: [Single Adjustment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-1-single-adjustment-positioning-subtable) Positioning Subtable
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SinglePos {
    Format1(SinglePosFormat1),
    Format2(SinglePosFormat2),
}

/// One value record for every covered glyph.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinglePosFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub value_record: ValueRecord,
}

/// One value record per covered glyph, ordered by coverage index.
///
/// The records are written with the union of their formats.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinglePosFormat2 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub value_records: Vec<ValueRecord>,
}

impl SinglePos {
    pub fn format_1(coverage: CoverageTable, value_record: ValueRecord) -> Self {
        Self::Format1(SinglePosFormat1 {
            coverage: coverage.into(),
            value_record,
        })
    }

    pub fn format_2(coverage: CoverageTable, value_records: Vec<ValueRecord>) -> Self {
        Self::Format2(SinglePosFormat2 {
            coverage: coverage.into(),
            value_records,
        })
    }

    pub fn coverage(&self) -> &CoverageTable {
        match self {
            SinglePos::Format1(table) => &table.coverage,
            SinglePos::Format2(table) => &table.coverage,
        }
    }
}

impl Default for SinglePos {
    fn default() -> Self {
        Self::Format1(SinglePosFormat1::default())
    }
}

impl SinglePosFormat2 {
    fn compute_value_format(&self) -> ValueFormat {
        union_format(&self.value_records)
    }
}

/// LookupType 2: [Pair Adjustment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-2-pair-adjustment-positioning-subtable) Positioning Subtable
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PairPos {
    Format1(PairPosFormat1),
    Format2(PairPosFormat2),
}

/// Adjustments for glyph pairs, one [PairSet] per covered first glyph.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairPosFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub pair_sets: Vec<OffsetMarker<PairSet>>,
}

/// Part of [PairPosFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairSet {
    /// Records ordered by second glyph
    pub pair_value_records: Vec<PairValueRecord>,
}

/// Part of [PairSet]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairValueRecord {
    pub second_glyph: GlyphId16,
    pub value_record1: ValueRecord,
    pub value_record2: ValueRecord,
}

/// Class pair adjustment.
///
/// `class1_records` is indexed by the class of the first glyph, and each
/// record's `class2_records` by the class of the second glyph (class 0
/// included).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairPosFormat2 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub class_def1: OffsetMarker<ClassDef>,
    pub class_def2: OffsetMarker<ClassDef>,
    pub class1_records: Vec<Class1Record>,
}

/// Part of [PairPosFormat2]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Class1Record {
    pub class2_records: Vec<Class2Record>,
}

/// Part of [PairPosFormat2]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Class2Record {
    pub value_record1: ValueRecord,
    pub value_record2: ValueRecord,
}

impl PairPos {
    pub fn format_1(coverage: CoverageTable, pair_sets: Vec<PairSet>) -> Self {
        Self::Format1(PairPosFormat1::new(coverage, pair_sets))
    }

    pub fn format_2(
        coverage: CoverageTable,
        class_def1: ClassDef,
        class_def2: ClassDef,
        class1_records: Vec<Class1Record>,
    ) -> Self {
        Self::Format2(PairPosFormat2 {
            coverage: coverage.into(),
            class_def1: class_def1.into(),
            class_def2: class_def2.into(),
            class1_records,
        })
    }

    pub fn coverage(&self) -> &CoverageTable {
        match self {
            PairPos::Format1(table) => &table.coverage,
            PairPos::Format2(table) => &table.coverage,
        }
    }
}

impl Default for PairPos {
    fn default() -> Self {
        Self::Format1(PairPosFormat1::default())
    }
}

impl PairPosFormat1 {
    pub fn new(coverage: CoverageTable, pair_sets: Vec<PairSet>) -> Self {
        Self {
            coverage: coverage.into(),
            pair_sets: pair_sets.into_iter().map(Into::into).collect(),
        }
    }

    fn records(&self) -> impl Iterator<Item = &PairValueRecord> {
        self.pair_sets
            .iter()
            .flat_map(|set| set.pair_value_records.iter())
    }

    fn compute_value_format1(&self) -> ValueFormat {
        union_format(self.records().map(|rec| &rec.value_record1))
    }

    fn compute_value_format2(&self) -> ValueFormat {
        union_format(self.records().map(|rec| &rec.value_record2))
    }
}

impl PairSet {
    pub fn new(pair_value_records: Vec<PairValueRecord>) -> Self {
        Self { pair_value_records }
    }
}

impl PairValueRecord {
    pub fn new(
        second_glyph: GlyphId16,
        value_record1: ValueRecord,
        value_record2: ValueRecord,
    ) -> Self {
        Self {
            second_glyph,
            value_record1,
            value_record2,
        }
    }
}

impl PairPosFormat2 {
    fn records(&self) -> impl Iterator<Item = &Class2Record> {
        self.class1_records
            .iter()
            .flat_map(|rec| rec.class2_records.iter())
    }

    fn compute_value_format1(&self) -> ValueFormat {
        union_format(self.records().map(|rec| &rec.value_record1))
    }

    fn compute_value_format2(&self) -> ValueFormat {
        union_format(self.records().map(|rec| &rec.value_record2))
    }

    fn compute_class1_count(&self) -> u16 {
        array_len(&self.class1_records)
    }

    fn compute_class2_count(&self) -> u16 {
        self.class1_records
            .first()
            .map(|rec| array_len(&rec.class2_records))
            .unwrap_or(0)
    }

    fn check_matrix_shape(&self, ctx: &mut ValidationCtx) {
        let class1_count = self.class1_records.len();
        let class2_count = self.compute_class2_count() as usize;
        if let Some(max) = self.class_def1.iter().map(|(_, cls)| cls).max() {
            if max as usize >= class1_count {
                ctx.report(format!(
                    "class1_records has {class1_count} rows but class_def1 uses class {max}"
                ));
            }
        }
        if let Some(max) = self.class_def2.iter().map(|(_, cls)| cls).max() {
            if max as usize >= class2_count {
                ctx.report(format!(
                    "class2_records has {class2_count} columns but class_def2 uses class {max}"
                ));
            }
        }
        ctx.in_field("class1_records", |ctx| {
            ctx.check_array_len(class1_count);
            ctx.with_array_items(self.class1_records.iter(), |ctx, rec| {
                if rec.class2_records.len() != class2_count {
                    ctx.report(format!(
                        "class1 record has {} class2 records, expected {class2_count}",
                        rec.class2_records.len()
                    ));
                }
            })
        });
    }
}

impl Class1Record {
    pub fn new(class2_records: Vec<Class2Record>) -> Self {
        Self { class2_records }
    }
}

impl Class2Record {
    pub fn new(value_record1: ValueRecord, value_record2: ValueRecord) -> Self {
        Self {
            value_record1,
            value_record2,
        }
    }
}

/// LookupType 3: [Cursive Attachment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-3-cursive-attachment-positioning-subtable) Positioning Subtable
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CursivePosFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    /// One record per covered glyph, in coverage order
    pub entry_exit_records: Vec<EntryExitRecord>,
}

/// Part of [CursivePosFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryExitRecord {
    pub entry_anchor: NullableOffsetMarker<AnchorTable>,
    pub exit_anchor: NullableOffsetMarker<AnchorTable>,
}

impl CursivePosFormat1 {
    pub fn new(coverage: CoverageTable, entry_exit_records: Vec<EntryExitRecord>) -> Self {
        Self {
            coverage: coverage.into(),
            entry_exit_records,
        }
    }
}

impl EntryExitRecord {
    pub fn new(entry_anchor: Option<AnchorTable>, exit_anchor: Option<AnchorTable>) -> Self {
        Self {
            entry_anchor: entry_anchor.into(),
            exit_anchor: exit_anchor.into(),
        }
    }
}

/// [Anchor Tables](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-tables)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnchorTable {
    Format1(AnchorFormat1),
    Format2(AnchorFormat2),
    Format3(AnchorFormat3),
}

/// Design units only
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorFormat1 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
}

/// Design units plus contour point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorFormat2 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
    pub anchor_point: u16,
}

/// Design units plus Device or VariationIndex tables
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorFormat3 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
    pub x_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub y_device: NullableOffsetMarker<DeviceOrVariationIndex>,
}

impl AnchorTable {
    pub fn format_1(x_coordinate: i16, y_coordinate: i16) -> Self {
        Self::Format1(AnchorFormat1 {
            x_coordinate,
            y_coordinate,
        })
    }

    pub fn format_2(x_coordinate: i16, y_coordinate: i16, anchor_point: u16) -> Self {
        Self::Format2(AnchorFormat2 {
            x_coordinate,
            y_coordinate,
            anchor_point,
        })
    }

    pub fn format_3(
        x_coordinate: i16,
        y_coordinate: i16,
        x_device: Option<DeviceOrVariationIndex>,
        y_device: Option<DeviceOrVariationIndex>,
    ) -> Self {
        Self::Format3(AnchorFormat3 {
            x_coordinate,
            y_coordinate,
            x_device: x_device.into(),
            y_device: y_device.into(),
        })
    }

    pub fn x_coordinate(&self) -> i16 {
        match self {
            AnchorTable::Format1(table) => table.x_coordinate,
            AnchorTable::Format2(table) => table.x_coordinate,
            AnchorTable::Format3(table) => table.x_coordinate,
        }
    }

    pub fn y_coordinate(&self) -> i16 {
        match self {
            AnchorTable::Format1(table) => table.y_coordinate,
            AnchorTable::Format2(table) => table.y_coordinate,
            AnchorTable::Format3(table) => table.y_coordinate,
        }
    }
}

impl Default for AnchorTable {
    fn default() -> Self {
        Self::Format1(AnchorFormat1::default())
    }
}

/// [Mark Array](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#mark-array-table)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkArray {
    /// Records ordered by the mark coverage index
    pub mark_records: Vec<MarkRecord>,
}

/// Part of [MarkArray]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkRecord {
    pub mark_class: u16,
    pub mark_anchor: OffsetMarker<AnchorTable>,
}

impl MarkArray {
    pub fn new(mark_records: Vec<MarkRecord>) -> Self {
        Self { mark_records }
    }

    /// The number of mark classes: one more than the largest class.
    pub fn class_count(&self) -> u16 {
        self.mark_records
            .iter()
            .map(|rec| rec.mark_class.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

impl MarkRecord {
    pub fn new(mark_class: u16, mark_anchor: AnchorTable) -> Self {
        Self {
            mark_class,
            mark_anchor: mark_anchor.into(),
        }
    }
}

/// A matrix of optional anchors, one row per glyph (or ligature component)
/// and one column per mark class.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorMatrix {
    pub rows: Vec<Vec<NullableOffsetMarker<AnchorTable>>>,
}

/// Part of [MarkBasePosFormat1]
pub type BaseArray = AnchorMatrix;
/// Part of [MarkMarkPosFormat1]
pub type Mark2Array = AnchorMatrix;
/// Part of [LigatureArray]; one row per ligature component.
pub type LigatureAttach = AnchorMatrix;

impl AnchorMatrix {
    pub fn new(rows: Vec<Vec<Option<AnchorTable>>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn check_class_count(&self, class_count: u16, ctx: &mut ValidationCtx) {
        ctx.in_field("rows", |ctx| {
            ctx.with_array_items(self.rows.iter(), |ctx, row| {
                if row.len() != class_count as usize {
                    ctx.report(format!(
                        "{} anchors for {class_count} mark classes",
                        row.len()
                    ));
                }
            })
        })
    }
}

/// Part of [MarkLigPosFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LigatureArray {
    /// One entry per covered ligature, ordered by coverage index
    pub ligature_attaches: Vec<OffsetMarker<LigatureAttach>>,
}

impl LigatureArray {
    pub fn new(ligature_attaches: Vec<LigatureAttach>) -> Self {
        Self {
            ligature_attaches: ligature_attaches.into_iter().map(Into::into).collect(),
        }
    }

    fn len(&self) -> usize {
        self.ligature_attaches.len()
    }

    fn check_class_count(&self, class_count: u16, ctx: &mut ValidationCtx) {
        ctx.in_field("ligature_attaches", |ctx| {
            ctx.with_array_items(self.ligature_attaches.iter(), |ctx, attach| {
                attach.check_class_count(class_count, ctx)
            })
        })
    }
}

/// The three mark attachment subtables share one layout.
macro_rules! mark_attachment {
    (
        $(#[$attrs:meta])*
        $name:ident {
            $mark_coverage:ident,
            $base_coverage:ident,
            $mark_array:ident,
            $base_array:ident: $base_ty:ident,
        }
    ) => {
        $(#[$attrs])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            pub $mark_coverage: OffsetMarker<CoverageTable>,
            pub $base_coverage: OffsetMarker<CoverageTable>,
            pub $mark_array: OffsetMarker<MarkArray>,
            pub $base_array: OffsetMarker<$base_ty>,
        }

        impl $name {
            pub fn new(
                $mark_coverage: CoverageTable,
                $base_coverage: CoverageTable,
                $mark_array: MarkArray,
                $base_array: $base_ty,
            ) -> Self {
                Self {
                    $mark_coverage: $mark_coverage.into(),
                    $base_coverage: $base_coverage.into(),
                    $mark_array: $mark_array.into(),
                    $base_array: $base_array.into(),
                }
            }

            fn compute_mark_class_count(&self) -> u16 {
                self.$mark_array.class_count()
            }
        }

        impl FontWrite for $name {
            fn write_into(&self, writer: &mut TableWriter) {
                1u16.write_into(writer);
                self.$mark_coverage.write_into(writer);
                self.$base_coverage.write_into(writer);
                self.compute_mark_class_count().write_into(writer);
                self.$mark_array.write_into(writer);
                self.$base_array.write_into(writer);
            }
        }

        impl Validate for $name {
            fn validate_impl(&self, ctx: &mut ValidationCtx) {
                ctx.in_table(stringify!($name), |ctx| {
                    ctx.in_field(stringify!($mark_coverage), |ctx| {
                        self.$mark_coverage.validate_impl(ctx)
                    });
                    ctx.in_field(stringify!($base_coverage), |ctx| {
                        self.$base_coverage.validate_impl(ctx)
                    });
                    ctx.in_field(stringify!($mark_array), |ctx| {
                        check_coverage_len(
                            &self.$mark_coverage,
                            self.$mark_array.mark_records.len(),
                            ctx,
                        );
                        self.$mark_array.validate_impl(ctx);
                    });
                    ctx.in_field(stringify!($base_array), |ctx| {
                        check_coverage_len(&self.$base_coverage, self.$base_array.len(), ctx);
                        self.$base_array
                            .check_class_count(self.compute_mark_class_count(), ctx);
                        self.$base_array.validate_impl(ctx);
                    });
                })
            }
        }
    };
}

mark_attachment!(
    /// LookupType 4: [Mark-to-Base Attachment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-4-mark-to-base-attachment-positioning-subtable) Positioning Subtable
    MarkBasePosFormat1 {
        mark_coverage,
        base_coverage,
        mark_array,
        base_array: BaseArray,
    }
);

mark_attachment!(
    /// LookupType 5: [Mark-to-Ligature Attachment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-5-mark-to-ligature-attachment-positioning-subtable) Positioning Subtable
    MarkLigPosFormat1 {
        mark_coverage,
        ligature_coverage,
        mark_array,
        ligature_array: LigatureArray,
    }
);

mark_attachment!(
    /// LookupType 6: [Mark-to-Mark Attachment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-6-mark-to-mark-attachment-positioning-subtable) Positioning Subtable
    MarkMarkPosFormat1 {
        mark1_coverage,
        mark2_coverage,
        mark1_array,
        mark2_array: Mark2Array,
    }
);

impl FontWrite for Gpos {
    fn write_into(&self, writer: &mut TableWriter) {
        match self.feature_variations.is_some() {
            true => MajorMinor::VERSION_1_1,
            false => MajorMinor::VERSION_1_0,
        }
        .write_into(writer);
        self.script_list.write_into(writer);
        self.feature_list.write_into(writer);
        self.lookup_list.write_into(writer);
        if self.feature_variations.is_some() {
            self.feature_variations.write_into(writer);
        }
    }

    fn table_type(&self) -> TableType {
        TableType::GPOS
    }
}

impl FontWrite for PositionLookup {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            PositionLookup::Single(lookup) => lookup.write_into(writer),
            PositionLookup::Pair(lookup) => lookup.write_into(writer),
            PositionLookup::Cursive(lookup) => lookup.write_into(writer),
            PositionLookup::MarkToBase(lookup) => lookup.write_into(writer),
            PositionLookup::MarkToLig(lookup) => lookup.write_into(writer),
            PositionLookup::MarkToMark(lookup) => lookup.write_into(writer),
            PositionLookup::Contextual(lookup) => lookup.write_into(writer),
            PositionLookup::ChainContextual(lookup) => lookup.write_into(writer),
        }
    }

    fn table_type(&self) -> TableType {
        match self {
            PositionLookup::Single(lookup) => lookup.table_type(),
            PositionLookup::Pair(lookup) => lookup.table_type(),
            PositionLookup::Cursive(lookup) => lookup.table_type(),
            PositionLookup::MarkToBase(lookup) => lookup.table_type(),
            PositionLookup::MarkToLig(lookup) => lookup.table_type(),
            PositionLookup::MarkToMark(lookup) => lookup.table_type(),
            PositionLookup::Contextual(lookup) => lookup.table_type(),
            PositionLookup::ChainContextual(lookup) => lookup.table_type(),
        }
    }
}

impl FontWrite for SinglePos {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            SinglePos::Format1(table) => {
                1u16.write_into(writer);
                table.coverage.write_into(writer);
                table.value_record.format().write_into(writer);
                table.value_record.write_into(writer);
            }
            SinglePos::Format2(table) => {
                let format = table.compute_value_format();
                2u16.write_into(writer);
                table.coverage.write_into(writer);
                format.write_into(writer);
                array_len(&table.value_records).write_into(writer);
                for record in &table.value_records {
                    record.write_with_format(format, writer);
                }
            }
        }
    }
}

/// A pair set along with the value formats of its parent subtable.
struct PairSetWithFormats<'a> {
    set: &'a PairSet,
    formats: (ValueFormat, ValueFormat),
}

impl FontWrite for PairSetWithFormats<'_> {
    fn write_into(&self, writer: &mut TableWriter) {
        let (format1, format2) = self.formats;
        array_len(&self.set.pair_value_records).write_into(writer);
        for record in &self.set.pair_value_records {
            record.second_glyph.write_into(writer);
            record.value_record1.write_with_format(format1, writer);
            record.value_record2.write_with_format(format2, writer);
        }
    }
}

impl FontWrite for PairPos {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            PairPos::Format1(table) => table.write_into(writer),
            PairPos::Format2(table) => table.write_into(writer),
        }
    }
}

impl FontWrite for PairPosFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        let formats = (self.compute_value_format1(), self.compute_value_format2());
        1u16.write_into(writer);
        self.coverage.write_into(writer);
        formats.0.write_into(writer);
        formats.1.write_into(writer);
        array_len(&self.pair_sets).write_into(writer);
        for set in &self.pair_sets {
            writer.write_offset(&PairSetWithFormats { set, formats }, 2);
        }
    }
}

// a standalone pair set has only its own records to take formats from
impl FontWrite for PairSet {
    fn write_into(&self, writer: &mut TableWriter) {
        let formats = (
            union_format(self.pair_value_records.iter().map(|rec| &rec.value_record1)),
            union_format(self.pair_value_records.iter().map(|rec| &rec.value_record2)),
        );
        PairSetWithFormats { set: self, formats }.write_into(writer)
    }
}

impl FontWrite for PairPosFormat2 {
    fn write_into(&self, writer: &mut TableWriter) {
        let format1 = self.compute_value_format1();
        let format2 = self.compute_value_format2();
        2u16.write_into(writer);
        self.coverage.write_into(writer);
        format1.write_into(writer);
        format2.write_into(writer);
        self.class_def1.write_into(writer);
        self.class_def2.write_into(writer);
        self.compute_class1_count().write_into(writer);
        self.compute_class2_count().write_into(writer);
        for record in self.records() {
            record.value_record1.write_with_format(format1, writer);
            record.value_record2.write_with_format(format2, writer);
        }
    }
}

impl FontWrite for CursivePosFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.coverage.write_into(writer);
        array_len(&self.entry_exit_records).write_into(writer);
        for record in &self.entry_exit_records {
            record.entry_anchor.write_into(writer);
            record.exit_anchor.write_into(writer);
        }
    }
}

impl FontWrite for AnchorTable {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            AnchorTable::Format1(table) => {
                1u16.write_into(writer);
                table.x_coordinate.write_into(writer);
                table.y_coordinate.write_into(writer);
            }
            AnchorTable::Format2(table) => {
                2u16.write_into(writer);
                table.x_coordinate.write_into(writer);
                table.y_coordinate.write_into(writer);
                table.anchor_point.write_into(writer);
            }
            AnchorTable::Format3(table) => {
                3u16.write_into(writer);
                table.x_coordinate.write_into(writer);
                table.y_coordinate.write_into(writer);
                table.x_device.write_into(writer);
                table.y_device.write_into(writer);
            }
        }
    }
}

impl FontWrite for MarkArray {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.mark_records).write_into(writer);
        self.mark_records.write_into(writer);
    }
}

impl FontWrite for MarkRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.mark_class.write_into(writer);
        self.mark_anchor.write_into(writer);
    }
}

impl FontWrite for AnchorMatrix {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.rows).write_into(writer);
        for row in &self.rows {
            row.write_into(writer);
        }
    }
}

impl FontWrite for LigatureArray {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.ligature_attaches).write_into(writer);
        self.ligature_attaches.write_into(writer);
    }
}

impl Validate for Gpos {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Gpos", |ctx| {
            ctx.in_field("script_list", |ctx| self.script_list.validate_impl(ctx));
            ctx.in_field("feature_list", |ctx| self.feature_list.validate_impl(ctx));
            ctx.in_field("lookup_list", |ctx| self.lookup_list.validate_impl(ctx));
            ctx.in_field("feature_variations", |ctx| {
                self.feature_variations.validate_impl(ctx)
            });
        })
    }
}

impl Validate for PositionLookup {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            PositionLookup::Single(lookup) => lookup.validate_impl(ctx),
            PositionLookup::Pair(lookup) => lookup.validate_impl(ctx),
            PositionLookup::Cursive(lookup) => lookup.validate_impl(ctx),
            PositionLookup::MarkToBase(lookup) => lookup.validate_impl(ctx),
            PositionLookup::MarkToLig(lookup) => lookup.validate_impl(ctx),
            PositionLookup::MarkToMark(lookup) => lookup.validate_impl(ctx),
            PositionLookup::Contextual(lookup) => lookup.validate_impl(ctx),
            PositionLookup::ChainContextual(lookup) => lookup.validate_impl(ctx),
        }
    }
}

impl Validate for SinglePos {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            SinglePos::Format1(table) => ctx.in_table("SinglePosFormat1", |ctx| {
                ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx));
                ctx.in_field("value_record", |ctx| table.value_record.validate_impl(ctx));
            }),
            SinglePos::Format2(table) => ctx.in_table("SinglePosFormat2", |ctx| {
                ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx));
                ctx.in_field("value_records", |ctx| {
                    check_coverage_len(&table.coverage, table.value_records.len(), ctx);
                    table.value_records.validate_impl(ctx);
                })
            }),
        }
    }
}

impl Validate for PairPos {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            PairPos::Format1(table) => table.validate_impl(ctx),
            PairPos::Format2(table) => table.validate_impl(ctx),
        }
    }
}

impl Validate for PairPosFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("PairPosFormat1", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("pair_sets", |ctx| {
                check_coverage_len(&self.coverage, self.pair_sets.len(), ctx);
                self.pair_sets.validate_impl(ctx);
            })
        })
    }
}

impl Validate for PairSet {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("PairSet", |ctx| {
            ctx.in_field("pair_value_records", |ctx| {
                ctx.check_array_len(self.pair_value_records.len());
                if !is_strictly_sorted(self.pair_value_records.iter().map(|rec| rec.second_glyph))
                {
                    ctx.report("pair value records must be sorted by second glyph");
                }
                ctx.with_array_items(self.pair_value_records.iter(), |ctx, rec| {
                    rec.value_record1.validate_impl(ctx);
                    rec.value_record2.validate_impl(ctx);
                })
            })
        })
    }
}

impl Validate for PairPosFormat2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("PairPosFormat2", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("class_def1", |ctx| self.class_def1.validate_impl(ctx));
            ctx.in_field("class_def2", |ctx| self.class_def2.validate_impl(ctx));
            self.check_matrix_shape(ctx);
            ctx.in_field("class1_records", |ctx| {
                ctx.with_array_items(self.records(), |ctx, rec| {
                    rec.value_record1.validate_impl(ctx);
                    rec.value_record2.validate_impl(ctx);
                })
            })
        })
    }
}

impl Validate for CursivePosFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("CursivePosFormat1", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("entry_exit_records", |ctx| {
                check_coverage_len(&self.coverage, self.entry_exit_records.len(), ctx);
                ctx.with_array_items(self.entry_exit_records.iter(), |ctx, rec| {
                    ctx.in_field("entry_anchor", |ctx| rec.entry_anchor.validate_impl(ctx));
                    ctx.in_field("exit_anchor", |ctx| rec.exit_anchor.validate_impl(ctx));
                })
            })
        })
    }
}

impl Validate for AnchorTable {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if let AnchorTable::Format3(table) = self {
            ctx.in_table("AnchorFormat3", |ctx| {
                ctx.in_field("x_device", |ctx| table.x_device.validate_impl(ctx));
                ctx.in_field("y_device", |ctx| table.y_device.validate_impl(ctx));
            })
        }
    }
}

impl Validate for MarkArray {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("MarkArray", |ctx| {
            ctx.in_field("mark_records", |ctx| {
                ctx.check_array_len(self.mark_records.len());
                ctx.with_array_items(self.mark_records.iter(), |ctx, rec| {
                    rec.mark_anchor.validate_impl(ctx)
                })
            })
        })
    }
}

impl Validate for AnchorMatrix {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("AnchorMatrix", |ctx| {
            ctx.in_field("rows", |ctx| {
                ctx.check_array_len(self.rows.len());
                ctx.with_array_items(self.rows.iter(), |ctx, row| row.validate_impl(ctx))
            })
        })
    }
}

impl Validate for LigatureArray {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("LigatureArray", |ctx| {
            ctx.in_field("ligature_attaches", |ctx| {
                ctx.check_array_len(self.ligature_attaches.len());
                self.ligature_attaches.validate_impl(ctx);
            })
        })
    }
}

/* conversion from parsed tables */

impl FromObjRef<read_gpos::Gpos<'_>> for Gpos {
    fn from_obj_ref(obj: &read_gpos::Gpos, _: FontData) -> Result<Self, ReadError> {
        let feature_list = obj.feature_list()?;
        let feature_variations = match obj.feature_variations().transpose()? {
            Some(table) => Some(FeatureVariations::from_read(&table, &feature_list)?),
            None => None,
        };
        Ok(Gpos {
            script_list: obj.script_list().to_owned_table()?,
            feature_list: OffsetMarker::new(feature_list.to_owned_table()?),
            lookup_list: obj.lookup_list().to_owned_table()?,
            feature_variations: feature_variations.into(),
        })
    }
}

impl FromTableRef<read_gpos::Gpos<'_>> for Gpos {}

impl FromObjRef<read_gpos::PositionLookup<'_>> for PositionLookup {
    fn from_obj_ref(from: &read_gpos::PositionLookup, _: FontData) -> Result<Self, ReadError> {
        use read_gpos::PositionSubtable as Sub;
        let lookup = match resolved_lookup_type(from)? {
            1 => PositionLookup::Single(convert_lookup(from, |sub| match sub {
                Sub::Single(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            2 => PositionLookup::Pair(convert_lookup(from, |sub| match sub {
                Sub::Pair(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            3 => PositionLookup::Cursive(convert_lookup(from, |sub| match sub {
                Sub::Cursive(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            4 => PositionLookup::MarkToBase(convert_lookup(from, |sub| match sub {
                Sub::MarkToBase(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            5 => PositionLookup::MarkToLig(convert_lookup(from, |sub| match sub {
                Sub::MarkToLig(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            6 => PositionLookup::MarkToMark(convert_lookup(from, |sub| match sub {
                Sub::MarkToMark(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            7 => PositionLookup::Contextual(convert_lookup(from, |sub| match sub {
                Sub::Contextual(table) => SequenceContext::from_table_ref(&table).map(Into::into),
                _ => Err(MIXED_SUBTABLES),
            })?),
            8 => PositionLookup::ChainContextual(convert_lookup(from, |sub| match sub {
                Sub::ChainContextual(table) => {
                    ChainedSequenceContext::from_table_ref(&table).map(Into::into)
                }
                _ => Err(MIXED_SUBTABLES),
            })?),
            other => return Err(ReadError::InvalidFormat(other.into())),
        };
        Ok(lookup)
    }
}

impl FromTableRef<read_gpos::PositionLookup<'_>> for PositionLookup {}

impl FromObjRef<read_gpos::SinglePos<'_>> for SinglePos {
    fn from_obj_ref(obj: &read_gpos::SinglePos, _: FontData) -> Result<Self, ReadError> {
        Ok(match obj {
            read_gpos::SinglePos::Format1(table) => SinglePos::Format1(SinglePosFormat1 {
                coverage: table.coverage().to_owned_table()?,
                value_record: table.value_record()?.to_owned_obj(table.data())?,
            }),
            read_gpos::SinglePos::Format2(table) => SinglePos::Format2(SinglePosFormat2 {
                coverage: table.coverage().to_owned_table()?,
                value_records: table
                    .value_records()
                    .map(|rec| rec.and_then(|rec| rec.to_owned_obj(table.data())))
                    .collect::<Result<_, _>>()?,
            }),
        })
    }
}

impl FromTableRef<read_gpos::SinglePos<'_>> for SinglePos {}

impl FromObjRef<read_gpos::PairPos<'_>> for PairPos {
    fn from_obj_ref(obj: &read_gpos::PairPos, _: FontData) -> Result<Self, ReadError> {
        Ok(match obj {
            read_gpos::PairPos::Format1(table) => PairPos::Format1(PairPosFormat1 {
                coverage: table.coverage().to_owned_table()?,
                pair_sets: table
                    .pair_sets()
                    .iter()
                    .map(|set| set.to_owned_table())
                    .collect::<Result<_, _>>()?,
            }),
            read_gpos::PairPos::Format2(table) => {
                let data = table.data();
                let class1_records = (0..table.class1_count())
                    .map(|class1| {
                        (0..table.class2_count())
                            .map(|class2| {
                                let (rec1, rec2) = table.get(class1, class2)?;
                                Ok(Class2Record::new(
                                    rec1.to_owned_obj(data)?,
                                    rec2.to_owned_obj(data)?,
                                ))
                            })
                            .collect::<Result<_, ReadError>>()
                            .map(Class1Record::new)
                    })
                    .collect::<Result<_, _>>()?;
                PairPos::Format2(PairPosFormat2 {
                    coverage: table.coverage().to_owned_table()?,
                    class_def1: table.class_def1().to_owned_table()?,
                    class_def2: table.class_def2().to_owned_table()?,
                    class1_records,
                })
            }
        })
    }
}

impl FromTableRef<read_gpos::PairPos<'_>> for PairPos {}

impl FromObjRef<read_gpos::PairSet<'_>> for PairSet {
    fn from_obj_ref(obj: &read_gpos::PairSet, _: FontData) -> Result<Self, ReadError> {
        let data = obj.data();
        let pair_value_records = obj
            .pair_value_records()
            .map(|rec| {
                let rec = rec?;
                Ok(PairValueRecord {
                    second_glyph: rec.second_glyph,
                    value_record1: rec.value_record1.to_owned_obj(data)?,
                    value_record2: rec.value_record2.to_owned_obj(data)?,
                })
            })
            .collect::<Result<_, ReadError>>()?;
        Ok(PairSet { pair_value_records })
    }
}

impl FromTableRef<read_gpos::PairSet<'_>> for PairSet {}

impl FromObjRef<read_gpos::CursivePosFormat1<'_>> for CursivePosFormat1 {
    fn from_obj_ref(obj: &read_gpos::CursivePosFormat1, _: FontData) -> Result<Self, ReadError> {
        let data = obj.data();
        Ok(CursivePosFormat1 {
            coverage: obj.coverage().to_owned_table()?,
            entry_exit_records: obj
                .entry_exit_records()
                .iter()
                .map(|rec| {
                    Ok(EntryExitRecord {
                        entry_anchor: rec.entry_anchor(data).to_owned_table()?,
                        exit_anchor: rec.exit_anchor(data).to_owned_table()?,
                    })
                })
                .collect::<Result<_, ReadError>>()?,
        })
    }
}

impl FromTableRef<read_gpos::CursivePosFormat1<'_>> for CursivePosFormat1 {}

impl FromObjRef<read_gpos::AnchorTable<'_>> for AnchorTable {
    fn from_obj_ref(obj: &read_gpos::AnchorTable, _: FontData) -> Result<Self, ReadError> {
        Ok(match obj {
            read_gpos::AnchorTable::Format1(table) => {
                AnchorTable::format_1(table.x_coordinate, table.y_coordinate)
            }
            read_gpos::AnchorTable::Format2(table) => {
                AnchorTable::format_2(table.x_coordinate, table.y_coordinate, table.anchor_point)
            }
            read_gpos::AnchorTable::Format3(table) => AnchorTable::Format3(AnchorFormat3 {
                x_coordinate: table.x_coordinate(),
                y_coordinate: table.y_coordinate(),
                x_device: table.x_device().to_owned_table()?,
                y_device: table.y_device().to_owned_table()?,
            }),
        })
    }
}

impl FromTableRef<read_gpos::AnchorTable<'_>> for AnchorTable {}

impl FromObjRef<read_gpos::MarkArray<'_>> for MarkArray {
    fn from_obj_ref(obj: &read_gpos::MarkArray, _: FontData) -> Result<Self, ReadError> {
        let data = obj.data();
        let mark_records = obj
            .mark_records()
            .iter()
            .map(|rec| {
                let anchor: Result<read_gpos::AnchorTable, _> =
                    rec.mark_anchor_offset().resolve(data);
                Ok(MarkRecord {
                    mark_class: rec.mark_class(),
                    mark_anchor: anchor.to_owned_table()?,
                })
            })
            .collect::<Result<_, ReadError>>()?;
        Ok(MarkArray { mark_records })
    }
}

impl FromTableRef<read_gpos::MarkArray<'_>> for MarkArray {}

impl FromObjRef<read_gpos::AnchorMatrix<'_>> for AnchorMatrix {
    fn from_obj_ref(obj: &read_gpos::AnchorMatrix, _: FontData) -> Result<Self, ReadError> {
        let rows = (0..obj.row_count())
            .map(|row| {
                let anchors = obj
                    .anchors(row)
                    .ok_or(ReadError::InvalidCollectionIndex(row.into()))?;
                anchors
                    .iter()
                    .map(|anchor| anchor.to_owned_table())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()?;
        Ok(AnchorMatrix { rows })
    }
}

impl FromTableRef<read_gpos::AnchorMatrix<'_>> for AnchorMatrix {}

impl FromObjRef<read_gpos::LigatureArray<'_>> for LigatureArray {
    fn from_obj_ref(obj: &read_gpos::LigatureArray, _: FontData) -> Result<Self, ReadError> {
        Ok(LigatureArray {
            ligature_attaches: obj
                .ligature_attaches()
                .iter()
                .map(|attach| attach.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_gpos::LigatureArray<'_>> for LigatureArray {}

impl FromObjRef<read_gpos::MarkBasePosFormat1<'_>> for MarkBasePosFormat1 {
    fn from_obj_ref(obj: &read_gpos::MarkBasePosFormat1, _: FontData) -> Result<Self, ReadError> {
        Ok(MarkBasePosFormat1 {
            mark_coverage: obj.mark_coverage().to_owned_table()?,
            base_coverage: obj.base_coverage().to_owned_table()?,
            mark_array: obj.mark_array().to_owned_table()?,
            base_array: obj.base_array().to_owned_table()?,
        })
    }
}

impl FromTableRef<read_gpos::MarkBasePosFormat1<'_>> for MarkBasePosFormat1 {}

impl FromObjRef<read_gpos::MarkLigPosFormat1<'_>> for MarkLigPosFormat1 {
    fn from_obj_ref(obj: &read_gpos::MarkLigPosFormat1, _: FontData) -> Result<Self, ReadError> {
        Ok(MarkLigPosFormat1 {
            mark_coverage: obj.mark_coverage().to_owned_table()?,
            ligature_coverage: obj.ligature_coverage().to_owned_table()?,
            mark_array: obj.mark_array().to_owned_table()?,
            ligature_array: obj.ligature_array().to_owned_table()?,
        })
    }
}

impl FromTableRef<read_gpos::MarkLigPosFormat1<'_>> for MarkLigPosFormat1 {}

impl FromObjRef<read_gpos::MarkMarkPosFormat1<'_>> for MarkMarkPosFormat1 {
    fn from_obj_ref(obj: &read_gpos::MarkMarkPosFormat1, _: FontData) -> Result<Self, ReadError> {
        Ok(MarkMarkPosFormat1 {
            mark1_coverage: obj.mark1_coverage().to_owned_table()?,
            mark2_coverage: obj.mark2_coverage().to_owned_table()?,
            mark1_array: obj.mark1_array().to_owned_table()?,
            mark2_array: obj.mark2_array().to_owned_table()?,
        })
    }
}

impl FromTableRef<read_gpos::MarkMarkPosFormat1<'_>> for MarkMarkPosFormat1 {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{tables::layout::LookupFlag, FontRead};
    use sfnt_test_data::be_buffer;
    use types::F2Dot14;

    use super::*;
    use crate::{
        dump_table,
        tables::layout::{
            builders::Builder, ClassDefBuilder, ConditionFormat1, ConditionSet,
            CoverageTableBuilder, Device, Feature, FeatureRecord, FeatureTableSubstitution,
            FeatureTableSubstitutionRecord, FeatureVariationRecord, SequenceLookupRecord,
            VariationIndex,
        },
    };

    fn gids<const N: usize>(raw: [u16; N]) -> Vec<GlyphId16> {
        raw.into_iter().map(GlyphId16::new).collect()
    }

    fn coverage<const N: usize>(raw: [u16; N]) -> CoverageTable {
        CoverageTableBuilder::from_glyphs(gids(raw)).build()
    }

    fn round_trip(table: &Gpos) -> Gpos {
        let bytes = dump_table(table).unwrap();
        let read_back = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        let owned: Gpos = read_back.to_owned_table().unwrap();
        assert_eq!(dump_table(&owned).unwrap(), bytes);
        owned
    }

    fn gpos_with(lookups: Vec<PositionLookup>) -> Gpos {
        Gpos::new(
            Default::default(),
            Default::default(),
            LookupList::new(lookups),
        )
    }

    // adapted from/motivated by https://github.com/fonttools/fonttools/issues/471
    #[test]
    fn gpos_1_zero() {
        let sub1 = SinglePos::format_1(coverage([2]), ValueRecord::default());
        let sub2 = SinglePos::format_1(coverage([4]), ValueRecord::new().with_x_advance(500));
        let lookup = Lookup::new(LookupFlag::default(), vec![sub1, sub2]);
        let bytes = dump_table(&lookup).unwrap();

        let parsed = read_gpos::PositionLookup::read(FontData::new(&bytes)).unwrap();
        assert_eq!(parsed.lookup_flag(), LookupFlag::empty());
        let subtables = parsed.subtables();
        assert_eq!(subtables.len(), 2);
        let read_gpos::PositionSubtable::Single(read_gpos::SinglePos::Format1(sub1)) =
            subtables.get(0).unwrap()
        else {
            panic!("wrong table type");
        };
        let read_gpos::PositionSubtable::Single(read_gpos::SinglePos::Format1(sub2)) =
            subtables.get(1).unwrap()
        else {
            panic!("wrong table type");
        };

        assert_eq!(sub1.value_format(), ValueFormat::empty());
        assert_eq!(sub1.value_record().unwrap(), read_gpos::ValueRecord::default());
        assert_eq!(sub2.value_format(), ValueFormat::X_ADVANCE);
        assert_eq!(
            sub2.value_record().unwrap(),
            read_gpos::ValueRecord {
                x_advance: Some(500),
                ..Default::default()
            }
        );
    }

    #[test]
    fn single_pos_format_2_uses_union_format() {
        let table = SinglePos::format_2(
            coverage([3, 4]),
            vec![
                ValueRecord::new().with_x_advance(10),
                ValueRecord::new().with_y_placement(-5),
            ],
        );
        let bytes = dump_table(&table).unwrap();
        let read_gpos::SinglePos::Format2(read_back) =
            read_gpos::SinglePos::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        assert_eq!(
            read_back.value_format(),
            ValueFormat::Y_PLACEMENT | ValueFormat::X_ADVANCE
        );
        let second = read_back.value_record(1).unwrap();
        assert_eq!(second.y_placement, Some(-5));
        assert_eq!(second.x_advance, Some(0));
    }

    #[test]
    fn pair_pos_round_trip() {
        let pair_sets = vec![
            PairSet::new(vec![
                PairValueRecord::new(
                    GlyphId16::new(5),
                    ValueRecord::new().with_x_advance(-20),
                    ValueRecord::new(),
                ),
                PairValueRecord::new(
                    GlyphId16::new(9),
                    ValueRecord::new().with_x_advance(-40),
                    ValueRecord::new(),
                ),
            ]),
            PairSet::new(vec![PairValueRecord::new(
                GlyphId16::new(1),
                ValueRecord::new().with_x_advance(42),
                ValueRecord::new(),
            )]),
        ];
        let table = gpos_with(vec![PositionLookup::Pair(Lookup::new(
            LookupFlag::empty(),
            vec![PairPos::format_1(coverage([1, 2]), pair_sets)],
        ))]);
        assert_eq!(round_trip(&table), table);

        let bytes = dump_table(&table).unwrap();
        let gpos = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        let lookup = gpos.lookup_list().unwrap().get(0).unwrap();
        let read_gpos::PositionSubtable::Pair(read_gpos::PairPos::Format1(pair_pos)) =
            lookup.subtable(0).unwrap()
        else {
            panic!("wrong subtable");
        };
        let rec = pair_pos
            .get(GlyphId16::new(1), GlyphId16::new(9))
            .unwrap()
            .unwrap();
        assert_eq!(rec.value_record1.x_advance, Some(-40));
        assert!(pair_pos
            .get(GlyphId16::new(2), GlyphId16::new(9))
            .is_none());
    }

    #[test]
    fn unsorted_pair_set_is_invalid() {
        let set = PairSet::new(vec![
            PairValueRecord::new(GlyphId16::new(9), ValueRecord::new(), ValueRecord::new()),
            PairValueRecord::new(GlyphId16::new(5), ValueRecord::new(), ValueRecord::new()),
        ]);
        let report = set.validate().unwrap_err();
        assert!(report.to_string().contains("sorted by second glyph"));
    }

    // shared between a pair of tests below
    fn make_rec(i: u16) -> ValueRecord {
        // '0' here is shorthand for 'no device table'
        if i == 0 {
            return ValueRecord::new();
        }
        ValueRecord::new().with_x_advance_device(VariationIndex::new(0xff, i))
    }

    fn class_pair_table(class1recs: Vec<Class1Record>) -> PairPos {
        let class1 = ClassDefBuilder::from_iter([(GlyphId16::new(6), 1)]).build();
        // class 0 is 'all the rest', here, always implicitly present
        let class2 = ClassDefBuilder::from_iter([(GlyphId16::new(8), 1)]).build();
        PairPos::format_2(coverage([5, 6]), class1, class2, class1recs)
    }

    #[test]
    fn compile_devices_pairpos2() {
        // two c1recs, each with two c2recs
        let table = class_pair_table(vec![
            Class1Record::new(vec![
                Class2Record::new(make_rec(0), make_rec(0)),
                Class2Record::new(make_rec(1), make_rec(2)),
            ]),
            Class1Record::new(vec![
                Class2Record::new(make_rec(0), make_rec(0)),
                Class2Record::new(make_rec(2), make_rec(3)),
            ]),
        ]);

        let bytes = dump_table(&table).unwrap();
        let read_gpos::PairPos::Format2(read_back) =
            read_gpos::PairPos::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        assert_eq!(read_back.class1_count(), 2);
        assert_eq!(read_back.class2_count(), 2);

        let (empty, _) = read_back.get(0, 0).unwrap();
        assert_eq!(empty.format(), ValueFormat::X_ADVANCE_DEVICE);
        assert!(empty.x_advance_device.is_null());

        let (_, rec2) = read_back.get(0, 1).unwrap();
        let Some(Ok(read::tables::layout::DeviceOrVariationIndex::VariationIndex(dev2))) =
            rec2.x_advance_device(read_back.data())
        else {
            panic!("not a variation index")
        };
        assert_eq!(dev2.delta_set_inner_index(), 2);

        let owned: PairPos = read_gpos::PairPos::Format2(read_back)
            .to_owned_table()
            .unwrap();
        assert_eq!(dump_table(&owned).unwrap(), bytes);
    }

    #[test]
    fn pairpos2_matrix_shape_is_checked() {
        let table = class_pair_table(vec![
            Class1Record::new(vec![
                Class2Record::new(make_rec(0), make_rec(0)),
                Class2Record::new(make_rec(1), make_rec(2)),
            ]),
            // missing a column
            Class1Record::new(vec![Class2Record::new(make_rec(0), make_rec(0))]),
        ]);
        let report = table.validate().unwrap_err();
        assert!(
            report
                .to_string()
                .contains("class1 record has 1 class2 records, expected 2"),
            "{report}"
        );

        let missing_row = class_pair_table(vec![Class1Record::new(vec![
            Class2Record::default(),
            Class2Record::default(),
        ])]);
        let report = missing_row.validate().unwrap_err();
        assert!(report.to_string().contains("class_def1 uses class 1"));
    }

    #[test]
    fn anchor_formats() {
        let f1 = dump_table(&AnchorTable::format_1(10, -20)).unwrap();
        assert_eq!(f1, [0, 1, 0, 10, 0xff, 0xec]);
        let f2 = dump_table(&AnchorTable::format_2(1, 2, 7)).unwrap();
        assert_eq!(f2, [0, 2, 0, 1, 0, 2, 0, 7]);

        let f3 = AnchorTable::format_3(
            5,
            6,
            Some(Device::new(11, 12, &[1, -1]).into()),
            None,
        );
        let bytes = dump_table(&f3).unwrap();
        let read_back = read_gpos::AnchorTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.x_coordinate(), 5);
        assert!(read_back.y_device().is_none());
        let owned: AnchorTable = read_back.to_owned_table().unwrap();
        assert_eq!(owned, f3);
    }

    #[test]
    fn mark_attachment_round_trip() {
        let marks = MarkArray::new(vec![
            MarkRecord::new(0, AnchorTable::format_1(100, 500)),
            MarkRecord::new(1, AnchorTable::format_1(100, -50)),
        ]);
        let mark_base = MarkBasePosFormat1::new(
            coverage([30, 31]),
            coverage([10]),
            marks.clone(),
            AnchorMatrix::new(vec![vec![
                Some(AnchorTable::format_1(250, 700)),
                None,
            ]]),
        );
        let mark_lig = MarkLigPosFormat1::new(
            coverage([30, 31]),
            coverage([20]),
            marks.clone(),
            LigatureArray::new(vec![AnchorMatrix::new(vec![
                vec![Some(AnchorTable::format_1(200, 700)), None],
                vec![Some(AnchorTable::format_1(600, 700)), None],
            ])]),
        );
        let mark_mark = MarkMarkPosFormat1::new(
            coverage([30, 31]),
            coverage([32]),
            marks,
            AnchorMatrix::new(vec![vec![None, Some(AnchorTable::format_2(0, 0, 3))]]),
        );
        let table = gpos_with(vec![
            PositionLookup::MarkToBase(Lookup::new(LookupFlag::empty(), vec![mark_base])),
            PositionLookup::MarkToLig(Lookup::new(LookupFlag::empty(), vec![mark_lig])),
            PositionLookup::MarkToMark(Lookup::new(LookupFlag::empty(), vec![mark_mark])),
        ]);
        assert_eq!(round_trip(&table), table);

        let bytes = dump_table(&table).unwrap();
        let gpos = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        let lookups = gpos.lookup_list().unwrap();
        let read_gpos::PositionSubtable::MarkToLig(lig) =
            lookups.get(1).unwrap().subtable(0).unwrap()
        else {
            panic!("wrong subtable");
        };
        assert_eq!(lig.mark_class_count(), 2);
        let anchor = lig
            .ligature_anchor(GlyphId16::new(20), 1, 0)
            .unwrap()
            .unwrap();
        assert_eq!(anchor.x_coordinate(), 600);
        assert!(lig.ligature_anchor(GlyphId16::new(20), 1, 1).is_none());
    }

    #[test]
    fn base_rows_must_match_class_count() {
        let table = MarkBasePosFormat1::new(
            coverage([30, 31]),
            coverage([10]),
            MarkArray::new(vec![
                MarkRecord::new(0, AnchorTable::default()),
                MarkRecord::new(1, AnchorTable::default()),
            ]),
            AnchorMatrix::new(vec![vec![Some(AnchorTable::default())]]),
        );
        let report = table.validate().unwrap_err();
        assert!(report.to_string().contains("1 anchors for 2 mark classes"));
    }

    #[test]
    fn cursive_round_trip() {
        let cursive = CursivePosFormat1::new(
            coverage([40, 41]),
            vec![
                EntryExitRecord::new(None, Some(AnchorTable::format_1(500, 20))),
                EntryExitRecord::new(
                    Some(AnchorTable::format_1(0, 20)),
                    Some(AnchorTable::format_2(480, 10, 4)),
                ),
            ],
        );
        let table = gpos_with(vec![PositionLookup::Cursive(Lookup::new(
            LookupFlag::RIGHT_TO_LEFT,
            vec![cursive],
        ))]);
        assert_eq!(round_trip(&table), table);

        let bytes = dump_table(&table).unwrap();
        let gpos = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        let lookup = gpos.lookup_list().unwrap().get(0).unwrap();
        assert_eq!(lookup.lookup_type(), 3);
        let read_gpos::PositionSubtable::Cursive(read_back) = lookup.subtable(0).unwrap() else {
            panic!("wrong subtable");
        };
        let first = read_back.entry_exit_records()[0];
        assert!(first.entry_anchor(read_back.data()).is_none());
        let exit = first.exit_anchor(read_back.data()).unwrap().unwrap();
        assert_eq!(exit.x_coordinate(), 500);
    }

    #[test]
    fn cursive_records_match_coverage() {
        let cursive = CursivePosFormat1::new(
            coverage([40, 41]),
            vec![EntryExitRecord::new(None, None)],
        );
        let report = cursive.validate().unwrap_err();
        assert!(report.to_string().contains("1 items for 2 covered glyphs"), "{report}");
    }

    #[test]
    fn chain_context_and_variations_round_trip() {
        let chain = ChainedSequenceContext::format_3(
            Vec::new(),
            vec![coverage([10]), coverage([11, 12])],
            vec![coverage([13])],
            vec![SequenceLookupRecord::new(1, 0)],
        );
        let kern = PositionLookup::Single(Lookup::new(
            LookupFlag::empty(),
            vec![SinglePos::format_1(coverage([11, 12]), ValueRecord::new().with_x_advance(-30))],
        ));
        let feature_list = FeatureList::new(vec![FeatureRecord::new(
            Tag::new(b"kern"),
            Feature::new(None, vec![1]),
        )]);
        let variations = FeatureVariations::new(vec![FeatureVariationRecord::new(
            Some(ConditionSet::new(vec![ConditionFormat1::new(
                1,
                F2Dot14::from_f32(-1.0),
                F2Dot14::from_f32(-0.5),
            )])),
            Some(FeatureTableSubstitution::new(vec![
                FeatureTableSubstitutionRecord::new(0, Feature::new(None, vec![0, 1])),
            ])),
        )]);
        let table = Gpos::new(
            Default::default(),
            feature_list,
            LookupList::new(vec![
                kern,
                PositionLookup::ChainContextual(Lookup::new(LookupFlag::empty(), vec![chain.into()])),
            ]),
        )
        .with_feature_variations(variations);

        let bytes = dump_table(&table).unwrap();
        let read_back = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.version(), MajorMinor::VERSION_1_1);
        let owned = round_trip(&table);
        assert_eq!(owned, table);
        assert_eq!(owned.lookup_list.lookups[1].lookup_type(), 8);
        let substitutions = &owned
            .feature_variations
            .as_ref()
            .unwrap()
            .feature_variation_records[0]
            .feature_table_substitution;
        assert_eq!(
            substitutions.as_ref().unwrap().substitutions[0]
                .alternate_feature
                .lookup_list_indices,
            [0, 1]
        );
    }

    // version 1.0, script list and feature list empty, one lookup
    fn gpos_with_lookup(lookup_type: u16, subtable_offset: u16) -> Vec<u8> {
        be_buffer! {
            1u16, 0u16, 0u16, 0u16, 10u16,
            // lookup list
            1u16, 4u16,
            // lookup
            lookup_type, 0u16, 1u16, subtable_offset
        }
        .into_vec()
    }

    #[test]
    fn unknown_lookup_type_is_an_error() {
        let bytes = gpos_with_lookup(10, 8);
        let gpos = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        let owned: Result<Gpos, _> = gpos.to_owned_table();
        assert_eq!(owned.err(), Some(ReadError::InvalidFormat(10)));
    }

    #[test]
    fn unreadable_anchor_is_an_error() {
        let mut bytes = gpos_with_lookup(3, 8);
        // cursive subtable with one record whose entry anchor is past the end
        bytes.extend_from_slice(&be_buffer! {
            1u16, 10u16, 1u16, 0x7000u16, 0u16,
            // coverage
            1u16, 1u16, 40u16
        });
        let gpos = read_gpos::Gpos::read(FontData::new(&bytes)).unwrap();
        let owned: Result<Gpos, _> = gpos.to_owned_table();
        assert!(matches!(owned, Err(ReadError::OutOfBounds)), "{owned:?}");
    }
}
