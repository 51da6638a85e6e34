//! the [GSUB] table
//!
//! [GSUB]: https://docs.microsoft.com/en-us/typography/opentype/spec/gsub

use read::{tables::gsub as read_gsub, FontData, ReadError, TopLevelTable};
use types::{GlyphId16, MajorMinor, Tag};

use super::layout::{
    check_coverage_len, convert_lookup, resolved_lookup_type, ChainedSequenceContext,
    CoverageTable, FeatureList, FeatureVariations, LayoutBuilder, LayoutError, Lookup,
    LookupList, ScriptList, SequenceContext, MIXED_SUBTABLES,
};
use crate::{
    from_obj::{FromObjRef, FromTableRef, ToOwnedObj, ToOwnedTable},
    offsets::{NullableOffsetMarker, OffsetMarker, WIDTH_32},
    table_type::TableType,
    validate::{Validate, ValidationCtx},
    write::{array_len, FontWrite, TableWriter},
};

pub mod builders;

pub use builders::{AlternateSubBuilder, LigatureSubBuilder, MultipleSubBuilder, SingleSubBuilder};

/// A GSUB lookup list table.
pub type SubstitutionLookupList = LookupList<SubstitutionLookup>;

super::layout::table_newtype!(SubstitutionSequenceContext, SequenceContext);
super::layout::table_newtype!(SubstitutionChainContext, ChainedSequenceContext);

super::layout::lookup_type!(gsub, SingleSubst, 1);
super::layout::lookup_type!(gsub, MultipleSubstFormat1, 2);
super::layout::lookup_type!(gsub, AlternateSubstFormat1, 3);
super::layout::lookup_type!(gsub, LigatureSubstFormat1, 4);
super::layout::lookup_type!(gsub, SubstitutionSequenceContext, 5);
super::layout::lookup_type!(gsub, SubstitutionChainContext, 6);
super::layout::lookup_type!(gsub, ReverseChainSingleSubstFormat1, 8);

/// [GSUB](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#gsub-header)
///
/// This is written as version 1.1 if it has feature variations, and as
/// version 1.0 otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gsub {
    pub script_list: OffsetMarker<ScriptList>,
    pub feature_list: OffsetMarker<FeatureList>,
    pub lookup_list: OffsetMarker<SubstitutionLookupList>,
    pub feature_variations: NullableOffsetMarker<FeatureVariations, WIDTH_32>,
}

impl Gsub {
    pub fn new(
        script_list: ScriptList,
        feature_list: FeatureList,
        lookup_list: SubstitutionLookupList,
    ) -> Self {
        Self {
            script_list: script_list.into(),
            feature_list: feature_list.into(),
            lookup_list: lookup_list.into(),
            feature_variations: NullableOffsetMarker::new(None),
        }
    }

    /// Set the feature variations, which makes this a version 1.1 table.
    pub fn with_feature_variations(mut self, feature_variations: FeatureVariations) -> Self {
        self.feature_variations.set(feature_variations);
        self
    }

    /// Construct a GSUB table from a [LayoutBuilder].
    pub fn from_builder(builder: LayoutBuilder<SubstitutionLookup>) -> Result<Self, LayoutError> {
        let (scripts, features, lookups) = builder.build()?;
        Ok(Self::new(scripts, features, lookups))
    }
}

impl TopLevelTable for Gsub {
    const TAG: Tag = read_gsub::TAG;
}

/// A lookup in the GSUB table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubstitutionLookup {
    Single(Lookup<SingleSubst>),
    Multiple(Lookup<MultipleSubstFormat1>),
    Alternate(Lookup<AlternateSubstFormat1>),
    Ligature(Lookup<LigatureSubstFormat1>),
    Contextual(Lookup<SubstitutionSequenceContext>),
    ChainContextual(Lookup<SubstitutionChainContext>),
    Reverse(Lookup<ReverseChainSingleSubstFormat1>),
}

impl SubstitutionLookup {
    /// The lookup type of this lookup (never the extension type)
    pub fn lookup_type(&self) -> u16 {
        match self {
            SubstitutionLookup::Single(_) => 1,
            SubstitutionLookup::Multiple(_) => 2,
            SubstitutionLookup::Alternate(_) => 3,
            SubstitutionLookup::Ligature(_) => 4,
            SubstitutionLookup::Contextual(_) => 5,
            SubstitutionLookup::ChainContextual(_) => 6,
            SubstitutionLookup::Reverse(_) => 8,
        }
    }
}

impl Default for SubstitutionLookup {
    fn default() -> Self {
        SubstitutionLookup::Single(Lookup::default())
    }
}

/// LookupType 1: [Single Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-1-single-substitution-subtable) Subtable
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SingleSubst {
    Format1(SingleSubstFormat1),
    Format2(SingleSubstFormat2),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SingleSubstFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    /// Add to original glyph ID to get substitute glyph ID
    pub delta_glyph_id: i16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SingleSubstFormat2 {
    pub coverage: OffsetMarker<CoverageTable>,
    /// Array of substitute glyph IDs, ordered by Coverage index
    pub substitute_glyph_ids: Vec<GlyphId16>,
}

impl SingleSubst {
    pub fn format_1(coverage: CoverageTable, delta_glyph_id: i16) -> Self {
        Self::Format1(SingleSubstFormat1 {
            coverage: coverage.into(),
            delta_glyph_id,
        })
    }

    pub fn format_2(coverage: CoverageTable, substitute_glyph_ids: Vec<GlyphId16>) -> Self {
        Self::Format2(SingleSubstFormat2 {
            coverage: coverage.into(),
            substitute_glyph_ids,
        })
    }

    pub fn coverage(&self) -> &CoverageTable {
        match self {
            SingleSubst::Format1(table) => &table.coverage,
            SingleSubst::Format2(table) => &table.coverage,
        }
    }
}

impl Default for SingleSubst {
    fn default() -> Self {
        Self::Format1(SingleSubstFormat1::default())
    }
}

/// LookupType 2: [Multiple Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-2-multiple-substitution-subtable) Subtable
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultipleSubstFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    /// One sequence per covered glyph, ordered by Coverage index
    pub sequences: Vec<OffsetMarker<Sequence>>,
}

impl MultipleSubstFormat1 {
    pub fn new(coverage: CoverageTable, sequences: Vec<Sequence>) -> Self {
        Self {
            coverage: coverage.into(),
            sequences: sequences.into_iter().map(Into::into).collect(),
        }
    }
}

/// Part of [MultipleSubstFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sequence {
    pub substitute_glyph_ids: Vec<GlyphId16>,
}

impl Sequence {
    pub fn new(substitute_glyph_ids: Vec<GlyphId16>) -> Self {
        Self {
            substitute_glyph_ids,
        }
    }
}

/// LookupType 3: [Alternate Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-3-alternate-substitution-subtable) Subtable
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlternateSubstFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub alternate_sets: Vec<OffsetMarker<AlternateSet>>,
}

impl AlternateSubstFormat1 {
    pub fn new(coverage: CoverageTable, alternate_sets: Vec<AlternateSet>) -> Self {
        Self {
            coverage: coverage.into(),
            alternate_sets: alternate_sets.into_iter().map(Into::into).collect(),
        }
    }
}

/// Part of [AlternateSubstFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlternateSet {
    /// Array of alternate glyph IDs, in arbitrary order
    pub alternate_glyph_ids: Vec<GlyphId16>,
}

impl AlternateSet {
    pub fn new(alternate_glyph_ids: Vec<GlyphId16>) -> Self {
        Self {
            alternate_glyph_ids,
        }
    }
}

/// LookupType 4: [Ligature Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-4-ligature-substitution-subtable) Subtable
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LigatureSubstFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub ligature_sets: Vec<OffsetMarker<LigatureSet>>,
}

impl LigatureSubstFormat1 {
    pub fn new(coverage: CoverageTable, ligature_sets: Vec<LigatureSet>) -> Self {
        Self {
            coverage: coverage.into(),
            ligature_sets: ligature_sets.into_iter().map(Into::into).collect(),
        }
    }
}

/// Part of [LigatureSubstFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LigatureSet {
    /// Ligatures, ordered by preference
    pub ligatures: Vec<OffsetMarker<Ligature>>,
}

impl LigatureSet {
    pub fn new(ligatures: Vec<Ligature>) -> Self {
        Self {
            ligatures: ligatures.into_iter().map(Into::into).collect(),
        }
    }
}

/// Part of [LigatureSubstFormat1]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ligature {
    pub ligature_glyph: GlyphId16,
    /// Component glyph IDs, starting with the second component
    pub component_glyph_ids: Vec<GlyphId16>,
}

impl Ligature {
    pub fn new(ligature_glyph: GlyphId16, component_glyph_ids: Vec<GlyphId16>) -> Self {
        Self {
            ligature_glyph,
            component_glyph_ids,
        }
    }
}

/// LookupType 8: [Reverse Chaining Contextual Single Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-8-reverse-chaining-contextual-single-substitution-subtable) Subtable
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReverseChainSingleSubstFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    /// Backtrack coverages, in reverse logical order
    pub backtrack_coverages: Vec<OffsetMarker<CoverageTable>>,
    pub lookahead_coverages: Vec<OffsetMarker<CoverageTable>>,
    /// Substitute glyph IDs, ordered by Coverage index
    pub substitute_glyph_ids: Vec<GlyphId16>,
}

impl ReverseChainSingleSubstFormat1 {
    pub fn new(
        coverage: CoverageTable,
        backtrack_coverages: Vec<CoverageTable>,
        lookahead_coverages: Vec<CoverageTable>,
        substitute_glyph_ids: Vec<GlyphId16>,
    ) -> Self {
        Self {
            coverage: coverage.into(),
            backtrack_coverages: backtrack_coverages.into_iter().map(Into::into).collect(),
            lookahead_coverages: lookahead_coverages.into_iter().map(Into::into).collect(),
            substitute_glyph_ids,
        }
    }
}

impl FontWrite for Gsub {
    fn write_into(&self, writer: &mut TableWriter) {
        let version = if self.feature_variations.is_some() {
            MajorMinor::VERSION_1_1
        } else {
            MajorMinor::VERSION_1_0
        };
        version.write_into(writer);
        self.script_list.write_into(writer);
        self.feature_list.write_into(writer);
        self.lookup_list.write_into(writer);
        if self.feature_variations.is_some() {
            self.feature_variations.write_into(writer);
        }
    }

    fn table_type(&self) -> TableType {
        TableType::GSUB
    }
}

impl FontWrite for SubstitutionLookup {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            SubstitutionLookup::Single(lookup) => lookup.write_into(writer),
            SubstitutionLookup::Multiple(lookup) => lookup.write_into(writer),
            SubstitutionLookup::Alternate(lookup) => lookup.write_into(writer),
            SubstitutionLookup::Ligature(lookup) => lookup.write_into(writer),
            SubstitutionLookup::Contextual(lookup) => lookup.write_into(writer),
            SubstitutionLookup::ChainContextual(lookup) => lookup.write_into(writer),
            SubstitutionLookup::Reverse(lookup) => lookup.write_into(writer),
        }
    }

    fn table_type(&self) -> TableType {
        match self {
            SubstitutionLookup::Single(lookup) => lookup.table_type(),
            SubstitutionLookup::Multiple(lookup) => lookup.table_type(),
            SubstitutionLookup::Alternate(lookup) => lookup.table_type(),
            SubstitutionLookup::Ligature(lookup) => lookup.table_type(),
            SubstitutionLookup::Contextual(lookup) => lookup.table_type(),
            SubstitutionLookup::ChainContextual(lookup) => lookup.table_type(),
            SubstitutionLookup::Reverse(lookup) => lookup.table_type(),
        }
    }
}

impl FontWrite for SingleSubst {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            SingleSubst::Format1(table) => {
                1u16.write_into(writer);
                table.coverage.write_into(writer);
                table.delta_glyph_id.write_into(writer);
            }
            SingleSubst::Format2(table) => {
                2u16.write_into(writer);
                table.coverage.write_into(writer);
                array_len(&table.substitute_glyph_ids).write_into(writer);
                table.substitute_glyph_ids.write_into(writer);
            }
        }
    }
}

/// Format, coverage, then a counted array of offsets.
macro_rules! coverage_and_sets_write {
    ($name:ident, $sets:ident) => {
        impl FontWrite for $name {
            fn write_into(&self, writer: &mut TableWriter) {
                1u16.write_into(writer);
                self.coverage.write_into(writer);
                array_len(&self.$sets).write_into(writer);
                self.$sets.write_into(writer);
            }
        }
    };
}

coverage_and_sets_write!(MultipleSubstFormat1, sequences);
coverage_and_sets_write!(AlternateSubstFormat1, alternate_sets);
coverage_and_sets_write!(LigatureSubstFormat1, ligature_sets);

impl FontWrite for Sequence {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.substitute_glyph_ids).write_into(writer);
        self.substitute_glyph_ids.write_into(writer);
    }
}

impl FontWrite for AlternateSet {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.alternate_glyph_ids).write_into(writer);
        self.alternate_glyph_ids.write_into(writer);
    }
}

impl FontWrite for LigatureSet {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.ligatures).write_into(writer);
        self.ligatures.write_into(writer);
    }
}

impl FontWrite for ReverseChainSingleSubstFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.coverage.write_into(writer);
        array_len(&self.backtrack_coverages).write_into(writer);
        self.backtrack_coverages.write_into(writer);
        array_len(&self.lookahead_coverages).write_into(writer);
        self.lookahead_coverages.write_into(writer);
        array_len(&self.substitute_glyph_ids).write_into(writer);
        self.substitute_glyph_ids.write_into(writer);
    }
}

impl FontWrite for Ligature {
    fn write_into(&self, writer: &mut TableWriter) {
        self.ligature_glyph.write_into(writer);
        array_len(&self.component_glyph_ids)
            .saturating_add(1)
            .write_into(writer);
        self.component_glyph_ids.write_into(writer);
    }
}

impl Validate for Gsub {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Gsub", |ctx| {
            ctx.in_field("script_list", |ctx| self.script_list.validate_impl(ctx));
            ctx.in_field("feature_list", |ctx| self.feature_list.validate_impl(ctx));
            ctx.in_field("lookup_list", |ctx| self.lookup_list.validate_impl(ctx));
            ctx.in_field("feature_variations", |ctx| {
                self.feature_variations.validate_impl(ctx)
            });
        })
    }
}

impl Validate for SubstitutionLookup {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            SubstitutionLookup::Single(lookup) => lookup.validate_impl(ctx),
            SubstitutionLookup::Multiple(lookup) => lookup.validate_impl(ctx),
            SubstitutionLookup::Alternate(lookup) => lookup.validate_impl(ctx),
            SubstitutionLookup::Ligature(lookup) => lookup.validate_impl(ctx),
            SubstitutionLookup::Contextual(lookup) => lookup.validate_impl(ctx),
            SubstitutionLookup::ChainContextual(lookup) => lookup.validate_impl(ctx),
            SubstitutionLookup::Reverse(lookup) => lookup.validate_impl(ctx),
        }
    }
}

impl Validate for SingleSubst {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            SingleSubst::Format1(table) => ctx.in_table("SingleSubstFormat1", |ctx| {
                ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx))
            }),
            SingleSubst::Format2(table) => ctx.in_table("SingleSubstFormat2", |ctx| {
                ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx));
                ctx.in_field("substitute_glyph_ids", |ctx| {
                    check_coverage_len(&table.coverage, table.substitute_glyph_ids.len(), ctx)
                })
            }),
        }
    }
}

macro_rules! coverage_and_sets_validate {
    ($name:ident, $sets:ident) => {
        impl Validate for $name {
            fn validate_impl(&self, ctx: &mut ValidationCtx) {
                ctx.in_table(stringify!($name), |ctx| {
                    ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
                    ctx.in_field(stringify!($sets), |ctx| {
                        check_coverage_len(&self.coverage, self.$sets.len(), ctx);
                        self.$sets.validate_impl(ctx);
                    })
                })
            }
        }
    };
}

coverage_and_sets_validate!(MultipleSubstFormat1, sequences);
coverage_and_sets_validate!(AlternateSubstFormat1, alternate_sets);
coverage_and_sets_validate!(LigatureSubstFormat1, ligature_sets);

impl Validate for Sequence {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Sequence", |ctx| {
            ctx.in_field("substitute_glyph_ids", |ctx| {
                ctx.check_array_len(self.substitute_glyph_ids.len())
            })
        })
    }
}

impl Validate for AlternateSet {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("AlternateSet", |ctx| {
            ctx.in_field("alternate_glyph_ids", |ctx| {
                ctx.check_array_len(self.alternate_glyph_ids.len());
                if self.alternate_glyph_ids.is_empty() {
                    ctx.report("alternate set must not be empty");
                }
            })
        })
    }
}

impl Validate for LigatureSet {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("LigatureSet", |ctx| {
            ctx.in_field("ligatures", |ctx| {
                ctx.check_array_len(self.ligatures.len());
                self.ligatures.validate_impl(ctx);
            })
        })
    }
}

impl Validate for ReverseChainSingleSubstFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ReverseChainSingleSubstFormat1", |ctx| {
            ctx.in_field("coverage", |ctx| self.coverage.validate_impl(ctx));
            ctx.in_field("backtrack_coverages", |ctx| {
                ctx.check_array_len(self.backtrack_coverages.len());
                self.backtrack_coverages.validate_impl(ctx);
            });
            ctx.in_field("lookahead_coverages", |ctx| {
                ctx.check_array_len(self.lookahead_coverages.len());
                self.lookahead_coverages.validate_impl(ctx);
            });
            ctx.in_field("substitute_glyph_ids", |ctx| {
                check_coverage_len(&self.coverage, self.substitute_glyph_ids.len(), ctx)
            })
        })
    }
}

impl Validate for Ligature {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Ligature", |ctx| {
            ctx.in_field("component_glyph_ids", |ctx| {
                ctx.check_array_len(self.component_glyph_ids.len() + 1)
            })
        })
    }
}

impl FromObjRef<read_gsub::Gsub<'_>> for Gsub {
    fn from_obj_ref(obj: &read_gsub::Gsub, _: FontData) -> Result<Self, ReadError> {
        let feature_list = obj.feature_list()?;
        let feature_variations = obj
            .feature_variations()
            .transpose()?
            .map(|table| FeatureVariations::from_read(&table, &feature_list))
            .transpose()?;
        Ok(Gsub {
            script_list: obj.script_list().to_owned_table()?,
            feature_list: OffsetMarker::new(feature_list.to_owned_table()?),
            lookup_list: obj.lookup_list().to_owned_table()?,
            feature_variations: feature_variations.into(),
        })
    }
}

impl FromTableRef<read_gsub::Gsub<'_>> for Gsub {}

impl FromObjRef<read_gsub::SubstitutionLookup<'_>> for SubstitutionLookup {
    fn from_obj_ref(from: &read_gsub::SubstitutionLookup, _: FontData) -> Result<Self, ReadError> {
        use read_gsub::SubstitutionSubtable as Sub;
        Ok(match resolved_lookup_type(from)? {
            1 => SubstitutionLookup::Single(convert_lookup(from, |sub| match sub {
                Sub::Single(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            2 => SubstitutionLookup::Multiple(convert_lookup(from, |sub| match sub {
                Sub::Multiple(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            3 => SubstitutionLookup::Alternate(convert_lookup(from, |sub| match sub {
                Sub::Alternate(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            4 => SubstitutionLookup::Ligature(convert_lookup(from, |sub| match sub {
                Sub::Ligature(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            5 => SubstitutionLookup::Contextual(convert_lookup(from, |sub| match sub {
                Sub::Contextual(table) => Ok(SequenceContext::from_table_ref(&table)?.into()),
                _ => Err(MIXED_SUBTABLES),
            })?),
            6 => SubstitutionLookup::ChainContextual(convert_lookup(from, |sub| match sub {
                Sub::ChainContextual(table) => {
                    Ok(ChainedSequenceContext::from_table_ref(&table)?.into())
                }
                _ => Err(MIXED_SUBTABLES),
            })?),
            8 => SubstitutionLookup::Reverse(convert_lookup(from, |sub| match sub {
                Sub::Reverse(table) => table.to_owned_table(),
                _ => Err(MIXED_SUBTABLES),
            })?),
            other => return Err(ReadError::InvalidFormat(other.into())),
        })
    }
}

impl FromTableRef<read_gsub::SubstitutionLookup<'_>> for SubstitutionLookup {}

impl FromObjRef<read_gsub::SingleSubst<'_>> for SingleSubst {
    fn from_obj_ref(obj: &read_gsub::SingleSubst, data: FontData) -> Result<Self, ReadError> {
        Ok(match obj {
            read_gsub::SingleSubst::Format1(table) => SingleSubst::Format1(SingleSubstFormat1 {
                coverage: table.coverage().to_owned_table()?,
                delta_glyph_id: table.delta_glyph_id(),
            }),
            read_gsub::SingleSubst::Format2(table) => SingleSubst::Format2(SingleSubstFormat2 {
                coverage: table.coverage().to_owned_table()?,
                substitute_glyph_ids: table.substitute_glyph_ids().to_owned_obj(data)?,
            }),
        })
    }
}

impl FromTableRef<read_gsub::SingleSubst<'_>> for SingleSubst {}

impl FromObjRef<read_gsub::MultipleSubstFormat1<'_>> for MultipleSubstFormat1 {
    fn from_obj_ref(obj: &read_gsub::MultipleSubstFormat1, _: FontData) -> Result<Self, ReadError> {
        Ok(MultipleSubstFormat1 {
            coverage: obj.coverage().to_owned_table()?,
            sequences: obj
                .sequences()
                .iter()
                .map(|seq| seq.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_gsub::MultipleSubstFormat1<'_>> for MultipleSubstFormat1 {}

impl FromObjRef<read_gsub::Sequence<'_>> for Sequence {
    fn from_obj_ref(obj: &read_gsub::Sequence, data: FontData) -> Result<Self, ReadError> {
        Ok(Sequence {
            substitute_glyph_ids: obj.substitute_glyph_ids().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_gsub::Sequence<'_>> for Sequence {}

impl FromObjRef<read_gsub::AlternateSubstFormat1<'_>> for AlternateSubstFormat1 {
    fn from_obj_ref(obj: &read_gsub::AlternateSubstFormat1, _: FontData) -> Result<Self, ReadError> {
        Ok(AlternateSubstFormat1 {
            coverage: obj.coverage().to_owned_table()?,
            alternate_sets: obj
                .alternate_sets()
                .iter()
                .map(|set| set.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_gsub::AlternateSubstFormat1<'_>> for AlternateSubstFormat1 {}

impl FromObjRef<read_gsub::AlternateSet<'_>> for AlternateSet {
    fn from_obj_ref(obj: &read_gsub::AlternateSet, data: FontData) -> Result<Self, ReadError> {
        Ok(AlternateSet {
            alternate_glyph_ids: obj.alternate_glyph_ids().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_gsub::AlternateSet<'_>> for AlternateSet {}

impl FromObjRef<read_gsub::LigatureSubstFormat1<'_>> for LigatureSubstFormat1 {
    fn from_obj_ref(obj: &read_gsub::LigatureSubstFormat1, _: FontData) -> Result<Self, ReadError> {
        Ok(LigatureSubstFormat1 {
            coverage: obj.coverage().to_owned_table()?,
            ligature_sets: obj
                .ligature_sets()
                .iter()
                .map(|set| set.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_gsub::LigatureSubstFormat1<'_>> for LigatureSubstFormat1 {}

impl FromObjRef<read_gsub::LigatureSet<'_>> for LigatureSet {
    fn from_obj_ref(obj: &read_gsub::LigatureSet, _: FontData) -> Result<Self, ReadError> {
        Ok(LigatureSet {
            ligatures: obj
                .ligatures()
                .iter()
                .map(|lig| lig.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_gsub::LigatureSet<'_>> for LigatureSet {}

impl FromObjRef<read_gsub::Ligature<'_>> for Ligature {
    fn from_obj_ref(obj: &read_gsub::Ligature, data: FontData) -> Result<Self, ReadError> {
        Ok(Ligature {
            ligature_glyph: obj.ligature_glyph(),
            component_glyph_ids: obj.component_glyph_ids().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_gsub::Ligature<'_>> for Ligature {}

impl FromObjRef<read_gsub::ReverseChainSingleSubstFormat1<'_>> for ReverseChainSingleSubstFormat1 {
    fn from_obj_ref(
        obj: &read_gsub::ReverseChainSingleSubstFormat1,
        data: FontData,
    ) -> Result<Self, ReadError> {
        Ok(ReverseChainSingleSubstFormat1 {
            coverage: obj.coverage().to_owned_table()?,
            backtrack_coverages: obj
                .backtrack_coverages()
                .iter()
                .map(|coverage| coverage.to_owned_table())
                .collect::<Result<_, _>>()?,
            lookahead_coverages: obj
                .lookahead_coverages()
                .iter()
                .map(|coverage| coverage.to_owned_table())
                .collect::<Result<_, _>>()?,
            substitute_glyph_ids: obj.substitute_glyph_ids().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_gsub::ReverseChainSingleSubstFormat1<'_>>
    for ReverseChainSingleSubstFormat1
{
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{tables::layout::LookupFlag, FontRead};

    use super::*;
    use crate::{
        dump_table,
        tables::layout::{
            builders::Builder, ConditionFormat1, ConditionSet, CoverageTableBuilder, Feature,
            FeatureRecord, FeatureTableSubstitution, FeatureTableSubstitutionRecord,
            FeatureVariationRecord, SequenceContextFormat3, SequenceLookupRecord,
        },
    };
    use sfnt_test_data::be_buffer;
    use types::F2Dot14;

    fn gids<const N: usize>(raw: [u16; N]) -> Vec<GlyphId16> {
        raw.into_iter().map(GlyphId16::new).collect()
    }

    fn coverage<const N: usize>(raw: [u16; N]) -> CoverageTable {
        CoverageTableBuilder::from_glyphs(gids(raw)).build()
    }

    fn round_trip(table: &Gsub) -> Gsub {
        let bytes = dump_table(table).unwrap();
        let read_back = read_gsub::Gsub::read(FontData::new(&bytes)).unwrap();
        let owned: Gsub = read_back.to_owned_table().unwrap();
        assert_eq!(dump_table(&owned).unwrap(), bytes);
        owned
    }

    #[test]
    fn single_subst_round_trip() {
        let lookup = Lookup::new(
            LookupFlag::IGNORE_MARKS,
            vec![
                SingleSubst::format_1(coverage([4, 5, 6]), 2),
                SingleSubst::format_2(coverage([1, 3]), gids([40, 41])),
            ],
        );
        let table = Gsub::new(
            Default::default(),
            Default::default(),
            LookupList::new(vec![SubstitutionLookup::Single(lookup)]),
        );
        assert_eq!(round_trip(&table), table);
    }

    #[test]
    fn multiple_alternate_ligature_round_trip() {
        let table = Gsub::new(
            Default::default(),
            Default::default(),
            LookupList::new(vec![
                SubstitutionLookup::Multiple(Lookup::new(
                    LookupFlag::empty(),
                    vec![MultipleSubstFormat1::new(
                        coverage([9]),
                        vec![Sequence::new(gids([3, 4, 5]))],
                    )],
                )),
                SubstitutionLookup::Alternate(Lookup::new(
                    LookupFlag::empty(),
                    vec![AlternateSubstFormat1::new(
                        coverage([2, 7]),
                        vec![
                            AlternateSet::new(gids([20, 21])),
                            AlternateSet::new(gids([70])),
                        ],
                    )],
                )),
                SubstitutionLookup::Ligature(Lookup::new(
                    LookupFlag::empty(),
                    vec![LigatureSubstFormat1::new(
                        coverage([10]),
                        vec![LigatureSet::new(vec![
                            Ligature::new(GlyphId16::new(100), gids([11, 12])),
                            Ligature::new(GlyphId16::new(101), gids([11])),
                        ])],
                    )],
                )),
            ]),
        );
        assert_eq!(round_trip(&table), table);
    }

    #[test]
    fn contextual_round_trip() {
        let context = SequenceContext::Format3(SequenceContextFormat3 {
            coverages: vec![coverage([1]).into(), coverage([2, 3]).into()],
            seq_lookup_records: vec![SequenceLookupRecord::new(1, 0)],
        });
        let table = Gsub::new(
            Default::default(),
            Default::default(),
            LookupList::new(vec![
                SubstitutionLookup::Single(Lookup::new(
                    LookupFlag::empty(),
                    vec![SingleSubst::format_1(coverage([2, 3]), 10)],
                )),
                SubstitutionLookup::Contextual(Lookup::new(
                    LookupFlag::empty(),
                    vec![context.into()],
                )),
            ]),
        );
        assert_eq!(round_trip(&table), table);
    }

    #[test]
    fn mismatched_coverage_is_invalid() {
        let table = SingleSubst::format_2(coverage([1, 2, 3]), gids([7]));
        let report = table.validate().unwrap_err();
        assert!(report.to_string().contains("1 items for 3 covered glyphs"));
    }

    #[test]
    fn ligature_component_count() {
        let lig = Ligature::new(GlyphId16::new(50), gids([2, 3]));
        let bytes = dump_table(&lig).unwrap();
        assert_eq!(bytes, [0, 50, 0, 3, 0, 2, 0, 3]);
    }

    #[test]
    fn extension_promotion() {
        let _ = env_logger::builder().is_test(true).try_init();
        // 16 distinct subtables of ~8k each (plus their coverage) cannot all
        // sit within 16-bit reach of their lookups
        let lookups = (0..16u16)
            .map(|i| {
                let glyphs = (i..i + 8000).step_by(2).map(GlyphId16::new);
                let coverage = CoverageTableBuilder::from_glyphs(glyphs).build();
                let replacements = (0..4000).map(|j| GlyphId16::new(j + i)).collect();
                SubstitutionLookup::Single(Lookup::new(
                    LookupFlag::empty(),
                    vec![SingleSubst::format_2(coverage, replacements)],
                ))
            })
            .collect::<Vec<_>>();
        let table = Gsub::new(
            Default::default(),
            Default::default(),
            LookupList::new(lookups),
        );
        let bytes = dump_table(&table).unwrap();
        let read_back = read_gsub::Gsub::read(FontData::new(&bytes)).unwrap();
        let lookup_list = read_back.lookup_list().unwrap();
        let types = lookup_list
            .iter()
            .map(|lookup| lookup.unwrap().lookup_type())
            .collect::<Vec<_>>();
        assert!(types.contains(&read_gsub::EXTENSION_LOOKUP_TYPE), "{types:?}");

        // extension lookups are read back as their inner type
        let owned: Gsub = read_back.to_owned_table().unwrap();
        assert_eq!(owned, table);
    }

    #[test]
    fn chain_and_reverse_round_trip() {
        let chain = ChainedSequenceContext::format_3(
            vec![coverage([1])],
            vec![coverage([2, 3])],
            vec![coverage([4])],
            vec![SequenceLookupRecord::new(0, 0)],
        );
        let reverse = ReverseChainSingleSubstFormat1::new(
            coverage([20, 21]),
            vec![coverage([5])],
            vec![coverage([6]), coverage([7, 8])],
            gids([30, 31]),
        );
        let table = Gsub::new(
            Default::default(),
            Default::default(),
            LookupList::new(vec![
                SubstitutionLookup::Single(Lookup::new(
                    LookupFlag::empty(),
                    vec![SingleSubst::format_1(coverage([2, 3]), 10)],
                )),
                SubstitutionLookup::ChainContextual(Lookup::new(
                    LookupFlag::IGNORE_MARKS,
                    vec![chain.into()],
                )),
                SubstitutionLookup::Reverse(Lookup::new(LookupFlag::empty(), vec![reverse])),
            ]),
        );
        let owned = round_trip(&table);
        assert_eq!(owned, table);
        let types = owned
            .lookup_list
            .lookups
            .iter()
            .map(|lookup| lookup.lookup_type())
            .collect::<Vec<_>>();
        assert_eq!(types, [1, 6, 8]);
    }

    #[test]
    fn feature_variations_round_trip() {
        let feature_list = FeatureList::new(vec![FeatureRecord::new(
            Tag::new(b"rvrn"),
            Feature::new(None, vec![0]),
        )]);
        let variations = FeatureVariations::new(vec![FeatureVariationRecord::new(
            Some(ConditionSet::new(vec![ConditionFormat1::new(
                0,
                F2Dot14::from_f32(0.25),
                F2Dot14::ONE,
            )])),
            Some(FeatureTableSubstitution::new(vec![
                FeatureTableSubstitutionRecord::new(0, Feature::new(None, vec![1])),
            ])),
        )]);
        let lookups = (0..2)
            .map(|delta| {
                SubstitutionLookup::Single(Lookup::new(
                    LookupFlag::empty(),
                    vec![SingleSubst::format_1(coverage([5]), delta + 1)],
                ))
            })
            .collect();
        let table = Gsub::new(Default::default(), feature_list, LookupList::new(lookups))
            .with_feature_variations(variations);

        let bytes = dump_table(&table).unwrap();
        let read_back = read_gsub::Gsub::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.version(), MajorMinor::VERSION_1_1);
        assert!(read_back.feature_variations().is_some());
        assert_eq!(round_trip(&table), table);

        // without variations the table is written as 1.0
        let plain = Gsub {
            feature_variations: NullableOffsetMarker::new(None),
            ..table
        };
        let bytes = dump_table(&plain).unwrap();
        let read_back = read_gsub::Gsub::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.version(), MajorMinor::VERSION_1_0);
        assert!(read_back.feature_variations().is_none());
    }

    #[test]
    fn unknown_lookup_type_is_an_error() {
        // header with null script and feature lists; one lookup of type 9
        let bytes = be_buffer! {
            1u16, 0u16, 0u16, 0u16, 10u16,
            1u16, 4u16,
            9u16, 0u16, 0u16
        };
        let read_back = read_gsub::Gsub::read(FontData::new(&bytes)).unwrap();
        let owned: Result<Gsub, _> = read_back.to_owned_table();
        assert_eq!(owned.err(), Some(ReadError::InvalidFormat(9)));
    }

    #[test]
    fn unreadable_subtable_is_an_error() {
        // a single subst lookup whose subtable offset is past the end
        let bytes = be_buffer! {
            1u16, 0u16, 0u16, 0u16, 10u16,
            1u16, 4u16,
            1u16, 0u16, 1u16, 0x200u16
        };
        let read_back = read_gsub::Gsub::read(FontData::new(&bytes)).unwrap();
        let owned: Result<Gsub, _> = read_back.to_owned_table();
        assert_eq!(owned.err(), Some(ReadError::OutOfBounds));
    }
}
