//! the [GSUB] table
//!
//! [GSUB]: https://docs.microsoft.com/en-us/typography/opentype/spec/gsub

use types::{BigEndian, GlyphId16, MajorMinor, Offset16, Tag};

pub use super::layout::{
    ChainedSequenceContext, ClassDef, CoverageTable, ExtensionFormat1 as ExtensionSubstFormat1,
    FeatureList, FeatureVariations, Lookup, LookupList, ScriptList, SequenceContext,
};
use super::layout::{LayoutHeader, LayoutTable, LookupSubtable};
use crate::{
    ArrayOfOffsets, FontData, FontRead, FontReadWithArgs, ReadArgs, ReadError, ResolveOffset,
    TopLevelTable,
};

/// 'GSUB'
pub const TAG: Tag = Tag::new(b"GSUB");

/// The lookup type of extension substitution lookups.
pub const EXTENSION_LOOKUP_TYPE: u16 = 7;

/// A typed GSUB [LookupList] table
pub type SubstitutionLookupList<'a> = LookupList<'a, SubstitutionSubtable<'a>>;

/// A lookup in the GSUB table
pub type SubstitutionLookup<'a> = Lookup<'a, SubstitutionSubtable<'a>>;

/// [GSUB](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#gsub-header)
#[derive(Clone, Copy, Debug)]
pub struct Gsub<'a> {
    header: LayoutHeader<'a>,
}

impl TopLevelTable for Gsub<'_> {
    const TAG: Tag = TAG;
}

impl<'a> FontRead<'a> for Gsub<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        LayoutHeader::read(data).map(|header| Gsub { header })
    }
}

impl<'a> Gsub<'a> {
    /// The major and minor version of the GSUB table, as a tuple (u16, u16)
    pub fn version(&self) -> MajorMinor {
        self.header.version
    }

    /// The script list; a null offset is read as an empty list.
    pub fn script_list(&self) -> Result<ScriptList<'a>, ReadError> {
        self.header.script_list()
    }

    /// The feature list; a null offset is read as an empty list.
    pub fn feature_list(&self) -> Result<FeatureList<'a>, ReadError> {
        self.header.feature_list()
    }

    /// The lookup list; a null offset is read as an empty list.
    pub fn lookup_list(&self) -> Result<SubstitutionLookupList<'a>, ReadError> {
        self.header.lookup_list()
    }

    /// The FeatureVariations table, present in version 1.1 only.
    pub fn feature_variations(&self) -> Option<Result<FeatureVariations<'a>, ReadError>> {
        self.header.feature_variations()
    }

    pub fn data(&self) -> FontData<'a> {
        self.header.data
    }
}

impl<'a> LayoutTable<'a> for Gsub<'a> {
    type Subtable = SubstitutionSubtable<'a>;

    fn script_list(&self) -> Result<ScriptList<'a>, ReadError> {
        self.header.script_list()
    }

    fn feature_list(&self) -> Result<FeatureList<'a>, ReadError> {
        self.header.feature_list()
    }

    fn lookup_list(&self) -> Result<SubstitutionLookupList<'a>, ReadError> {
        self.header.lookup_list()
    }
}

/// A GSUB lookup subtable, as selected by the lookup type.
///
/// Extension subtables are resolved to the subtable they wrap.
#[derive(Clone, Copy, Debug)]
pub enum SubstitutionSubtable<'a> {
    Single(SingleSubst<'a>),
    Multiple(MultipleSubstFormat1<'a>),
    Alternate(AlternateSubstFormat1<'a>),
    Ligature(LigatureSubstFormat1<'a>),
    Contextual(SequenceContext<'a>),
    ChainContextual(ChainedSequenceContext<'a>),
    Reverse(ReverseChainSingleSubstFormat1<'a>),
}

impl ReadArgs for SubstitutionSubtable<'_> {
    type Args = u16;
}

impl<'a> FontReadWithArgs<'a> for SubstitutionSubtable<'a> {
    fn read_with_args(data: FontData<'a>, lookup_type: &u16) -> Result<Self, ReadError> {
        match *lookup_type {
            1 => SingleSubst::read(data).map(Self::Single),
            2 => MultipleSubstFormat1::read(data).map(Self::Multiple),
            3 => AlternateSubstFormat1::read(data).map(Self::Alternate),
            4 => LigatureSubstFormat1::read(data).map(Self::Ligature),
            5 => SequenceContext::read(data).map(Self::Contextual),
            6 => ChainedSequenceContext::read(data).map(Self::ChainContextual),
            8 => ReverseChainSingleSubstFormat1::read(data).map(Self::Reverse),
            EXTENSION_LOOKUP_TYPE => ExtensionSubstFormat1::read(data)?.resolve(),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> LookupSubtable<'a> for SubstitutionSubtable<'a> {
    const EXTENSION_TYPE: u16 = EXTENSION_LOOKUP_TYPE;
}

impl<'a> SubstitutionSubtable<'a> {
    /// The lookup type of this subtable.
    ///
    /// For resolved extension subtables, this is the wrapped type.
    pub fn lookup_type(&self) -> u16 {
        match self {
            SubstitutionSubtable::Single(_) => 1,
            SubstitutionSubtable::Multiple(_) => 2,
            SubstitutionSubtable::Alternate(_) => 3,
            SubstitutionSubtable::Ligature(_) => 4,
            SubstitutionSubtable::Contextual(_) => 5,
            SubstitutionSubtable::ChainContextual(_) => 6,
            SubstitutionSubtable::Reverse(_) => 8,
        }
    }
}

/// LookupType 1: [Single Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-1-single-substitution-subtable) Subtable
#[derive(Clone, Copy, Debug)]
pub enum SingleSubst<'a> {
    Format1(SingleSubstFormat1<'a>),
    Format2(SingleSubstFormat2<'a>),
}

impl<'a> FontRead<'a> for SingleSubst<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => SingleSubstFormat1::read(data).map(Self::Format1),
            2 => SingleSubstFormat2::read(data).map(Self::Format2),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> SingleSubst<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        match self {
            SingleSubst::Format1(table) => table.coverage(),
            SingleSubst::Format2(table) => table.coverage(),
        }
    }

    /// The substitute for this glyph, if it is covered.
    pub fn get(&self, gid: GlyphId16) -> Result<Option<GlyphId16>, ReadError> {
        let Some(index) = self.coverage()?.get(gid) else {
            return Ok(None);
        };
        Ok(match self {
            SingleSubst::Format1(table) => Some(GlyphId16::new(
                (gid.to_u16() as i32 + table.delta_glyph_id() as i32) as u16,
            )),
            SingleSubst::Format2(table) => table
                .substitute_glyph_ids()
                .get(index as usize)
                .map(|gid| gid.get()),
        })
    }
}

/// [Single Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#11-single-substitution-format-1)
#[derive(Clone, Copy, Debug)]
pub struct SingleSubstFormat1<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    delta_glyph_id: i16,
}

impl<'a> FontRead<'a> for SingleSubstFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let delta_glyph_id = cursor.read()?;
        cursor.finish()?;
        Ok(SingleSubstFormat1 {
            data,
            coverage_offset,
            delta_glyph_id,
        })
    }
}

impl<'a> SingleSubstFormat1<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    /// Add to original glyph ID to get substitute glyph ID
    pub fn delta_glyph_id(&self) -> i16 {
        self.delta_glyph_id
    }
}

/// [Single Substitution Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#12-single-substitution-format-2)
#[derive(Clone, Copy, Debug)]
pub struct SingleSubstFormat2<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    substitute_glyph_ids: &'a [BigEndian<GlyphId16>],
}

impl<'a> FontRead<'a> for SingleSubstFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let glyph_count: u16 = cursor.read()?;
        let substitute_glyph_ids = cursor.read_array(glyph_count as usize)?;
        Ok(SingleSubstFormat2 {
            data,
            coverage_offset,
            substitute_glyph_ids,
        })
    }
}

impl<'a> SingleSubstFormat2<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    /// Array of substitute glyph IDs, ordered by Coverage index
    pub fn substitute_glyph_ids(&self) -> &'a [BigEndian<GlyphId16>] {
        self.substitute_glyph_ids
    }
}

/// A subtable made of a coverage table and an array of offsets to sets,
/// one per covered glyph.
macro_rules! coverage_and_sets {
    ($(#[$attrs:meta])* $name:ident, $set:ident, $sets_fn:ident) => {
        $(#[$attrs])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            data: FontData<'a>,
            coverage_offset: Offset16,
            set_offsets: &'a [BigEndian<Offset16>],
        }

        impl<'a> FontRead<'a> for $name<'a> {
            fn read(data: FontData<'a>) -> Result<Self, ReadError> {
                let mut cursor = data.cursor();
                let format: u16 = cursor.read()?;
                if format != 1 {
                    return Err(ReadError::InvalidFormat(format.into()));
                }
                let coverage_offset = cursor.read()?;
                let count: u16 = cursor.read()?;
                let set_offsets = cursor.read_array(count as usize)?;
                Ok($name {
                    data,
                    coverage_offset,
                    set_offsets,
                })
            }
        }

        impl<'a> $name<'a> {
            pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
                self.coverage_offset.resolve(self.data)
            }

            /// One entry per covered glyph, ordered by coverage index.
            pub fn $sets_fn(&self) -> ArrayOfOffsets<'a, $set<'a>> {
                ArrayOfOffsets::new(self.set_offsets, self.data, ())
            }

            pub fn data(&self) -> FontData<'a> {
                self.data
            }
        }
    };
}

coverage_and_sets!(
    /// [Multiple Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#21-multiple-substitution-format-1)
    MultipleSubstFormat1,
    Sequence,
    sequences
);

coverage_and_sets!(
    /// [Alternate Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#31-alternate-substitution-format-1)
    AlternateSubstFormat1,
    AlternateSet,
    alternate_sets
);

coverage_and_sets!(
    /// [Ligature Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#41-ligature-substitution-format-1)
    LigatureSubstFormat1,
    LigatureSet,
    ligature_sets
);

/// A counted array of glyph ids.
macro_rules! glyph_array_table {
    ($(#[$attrs:meta])* $name:ident, $getter:ident) => {
        $(#[$attrs])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            glyphs: &'a [BigEndian<GlyphId16>],
        }

        impl<'a> FontRead<'a> for $name<'a> {
            fn read(data: FontData<'a>) -> Result<Self, ReadError> {
                let mut cursor = data.cursor();
                let count: u16 = cursor.read()?;
                let glyphs = cursor.read_array(count as usize)?;
                Ok($name { glyphs })
            }
        }

        impl<'a> $name<'a> {
            pub fn $getter(&self) -> &'a [BigEndian<GlyphId16>] {
                self.glyphs
            }
        }
    };
}

glyph_array_table!(
    /// Part of [MultipleSubstFormat1]
    Sequence,
    substitute_glyph_ids
);

glyph_array_table!(
    /// Part of [AlternateSubstFormat1]
    AlternateSet,
    alternate_glyph_ids
);

/// Part of [LigatureSubstFormat1]
#[derive(Clone, Copy, Debug)]
pub struct LigatureSet<'a> {
    data: FontData<'a>,
    ligature_offsets: &'a [BigEndian<Offset16>],
}

impl<'a> FontRead<'a> for LigatureSet<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let ligature_count: u16 = cursor.read()?;
        let ligature_offsets = cursor.read_array(ligature_count as usize)?;
        Ok(LigatureSet {
            data,
            ligature_offsets,
        })
    }
}

impl<'a> LigatureSet<'a> {
    /// Ligatures, ordered by preference
    pub fn ligatures(&self) -> ArrayOfOffsets<'a, Ligature<'a>> {
        ArrayOfOffsets::new(self.ligature_offsets, self.data, ())
    }
}

/// Part of [LigatureSubstFormat1]
#[derive(Clone, Copy, Debug)]
pub struct Ligature<'a> {
    ligature_glyph: GlyphId16,
    component_glyph_ids: &'a [BigEndian<GlyphId16>],
}

impl<'a> FontRead<'a> for Ligature<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let ligature_glyph = cursor.read()?;
        let component_count: u16 = cursor.read()?;
        let n_components = component_count
            .checked_sub(1)
            .ok_or(ReadError::MalformedData("ligature has no components"))?;
        let component_glyph_ids = cursor.read_array(n_components as usize)?;
        Ok(Ligature {
            ligature_glyph,
            component_glyph_ids,
        })
    }
}

impl<'a> Ligature<'a> {
    /// glyph ID of ligature to substitute
    pub fn ligature_glyph(&self) -> GlyphId16 {
        self.ligature_glyph
    }

    /// Number of components in the ligature, including the first.
    pub fn component_count(&self) -> u16 {
        self.component_glyph_ids.len() as u16 + 1
    }

    /// Array of component glyph IDs, starting with the second component,
    /// ordered in writing direction
    pub fn component_glyph_ids(&self) -> &'a [BigEndian<GlyphId16>] {
        self.component_glyph_ids
    }
}

/// LookupType 8: [Reverse Chaining Contextual Single Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#81-reverse-chaining-contextual-single-substitution-format-1-coverage-based-glyph-contexts) Subtable
#[derive(Clone, Copy, Debug)]
pub struct ReverseChainSingleSubstFormat1<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    backtrack_coverage_offsets: &'a [BigEndian<Offset16>],
    lookahead_coverage_offsets: &'a [BigEndian<Offset16>],
    substitute_glyph_ids: &'a [BigEndian<GlyphId16>],
}

impl<'a> FontRead<'a> for ReverseChainSingleSubstFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format.into()));
        }
        let coverage_offset = cursor.read()?;
        let backtrack_count: u16 = cursor.read()?;
        let backtrack_coverage_offsets = cursor.read_array(backtrack_count as usize)?;
        let lookahead_count: u16 = cursor.read()?;
        let lookahead_coverage_offsets = cursor.read_array(lookahead_count as usize)?;
        let glyph_count: u16 = cursor.read()?;
        let substitute_glyph_ids = cursor.read_array(glyph_count as usize)?;
        Ok(ReverseChainSingleSubstFormat1 {
            data,
            coverage_offset,
            backtrack_coverage_offsets,
            lookahead_coverage_offsets,
            substitute_glyph_ids,
        })
    }
}

impl<'a> ReverseChainSingleSubstFormat1<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    /// Coverage of each backtrack position, in reverse logical order.
    pub fn backtrack_coverages(&self) -> ArrayOfOffsets<'a, CoverageTable<'a>> {
        ArrayOfOffsets::new(self.backtrack_coverage_offsets, self.data, ())
    }

    pub fn lookahead_coverages(&self) -> ArrayOfOffsets<'a, CoverageTable<'a>> {
        ArrayOfOffsets::new(self.lookahead_coverage_offsets, self.data, ())
    }

    /// Array of substitute glyph IDs, ordered by Coverage index
    pub fn substitute_glyph_ids(&self) -> &'a [BigEndian<GlyphId16>] {
        self.substitute_glyph_ids
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::gsub as test_data;

    use super::*;
    use crate::tables::layout::LookupFlag;

    fn gids(raw: &[BigEndian<GlyphId16>]) -> Vec<u16> {
        raw.iter().map(|g| g.get().to_u16()).collect()
    }

    #[test]
    fn single_subst_formats() {
        let table = SingleSubst::read(FontData::new(test_data::SINGLESUBSTFORMAT1)).unwrap();
        assert!(matches!(table, SingleSubst::Format1(_)));
        assert_eq!(table.get(GlyphId16::new(4)).unwrap(), Some(GlyphId16::new(6)));
        assert_eq!(table.get(GlyphId16::new(7)).unwrap(), None);

        let table = SingleSubst::read(FontData::new(test_data::SINGLESUBSTFORMAT2)).unwrap();
        let SingleSubst::Format2(inner) = table else {
            panic!("wrong format");
        };
        assert_eq!(gids(inner.substitute_glyph_ids()), [10, 20, 30]);
        assert_eq!(table.get(GlyphId16::new(2)).unwrap(), Some(GlyphId16::new(20)));
    }

    #[test]
    fn multiple_and_alternate() {
        let table =
            MultipleSubstFormat1::read(FontData::new(test_data::MULTIPLESUBSTFORMAT1)).unwrap();
        let seq = table.sequences().get(0).unwrap();
        assert_eq!(gids(seq.substitute_glyph_ids()), [26, 26, 29]);

        let table =
            AlternateSubstFormat1::read(FontData::new(test_data::ALTERNATESUBSTFORMAT1)).unwrap();
        assert_eq!(table.coverage().unwrap().get(GlyphId16::new(58)), Some(0));
        let alts = table.alternate_sets().get(0).unwrap();
        assert_eq!(gids(alts.alternate_glyph_ids()), [59, 60]);
    }

    #[test]
    fn ligatures() {
        let table =
            LigatureSubstFormat1::read(FontData::new(test_data::LIGATURESUBSTFORMAT1)).unwrap();
        let coverage = table.coverage().unwrap();
        assert_eq!(coverage.iter().map(|g| g.to_u16()).collect::<Vec<_>>(), [25, 26]);
        let set = table.ligature_sets().get(0).unwrap();
        let ligs = set.ligatures().iter().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(ligs.len(), 2);
        assert_eq!(ligs[0].ligature_glyph(), GlyphId16::new(347));
        assert_eq!(ligs[0].component_count(), 3);
        assert_eq!(gids(ligs[0].component_glyph_ids()), [40, 41]);
        assert_eq!(ligs[1].component_count(), 2);
    }

    #[test]
    fn lookups_and_extensions() {
        let gsub = Gsub::read(FontData::new(test_data::GSUB_WITH_EXTENSION)).unwrap();
        let lookups = gsub.lookup_list().unwrap();
        assert_eq!(lookups.lookup_count(), 2);

        let first = lookups.get(0).unwrap();
        assert_eq!(first.lookup_type(), 1);
        assert_eq!(first.lookup_flag(), LookupFlag::IGNORE_MARKS);
        assert!(matches!(
            first.subtable(0).unwrap(),
            SubstitutionSubtable::Single(_)
        ));

        let second = lookups.get(1).unwrap();
        assert_eq!(second.lookup_type(), EXTENSION_LOOKUP_TYPE);
        let resolved = second.subtable(0).unwrap();
        assert_eq!(resolved.lookup_type(), 4);
        assert!(second.subtable(1).is_err());
        assert!(lookups.get(2).is_err());

        assert_eq!(gsub.script_list().unwrap().script_count(), 1);
        assert_eq!(gsub.feature_list().unwrap().feature_count(), 1);
    }

    #[test]
    fn nested_extension_is_an_error() {
        let bytes = sfnt_test_data::be_buffer! { 1u16, 7u16, 8u32, 1u16, 1u16, 8u32 };
        assert_eq!(
            SubstitutionSubtable::read_with_args(FontData::new(&bytes), &7).err(),
            Some(ReadError::MalformedData("extension of an extension"))
        );
    }

    #[test]
    fn chain_and_reverse_types() {
        let chained = sfnt_test_data::be_buffer! {
            3u16, 0u16, 1u16, 12u16, 0u16, 0u16,
            1u16, 1u16, 5u16
        };
        let table = SubstitutionSubtable::read_with_args(FontData::new(&chained), &6).unwrap();
        assert_eq!(table.lookup_type(), 6);
        assert!(matches!(
            table,
            SubstitutionSubtable::ChainContextual(ChainedSequenceContext::Format3(_))
        ));

        let reverse = sfnt_test_data::be_buffer! {
            1u16, 16u16, 1u16, 24u16, 0u16, 2u16, 30u16, 31u16,
            // coverage at 16
            1u16, 2u16, 10u16, 11u16,
            // backtrack coverage at 24
            1u16, 1u16, 9u16
        };
        let table = SubstitutionSubtable::read_with_args(FontData::new(&reverse), &8).unwrap();
        let SubstitutionSubtable::Reverse(inner) = table else {
            panic!("wrong lookup type");
        };
        assert_eq!(inner.coverage().unwrap().population(), 2);
        assert_eq!(inner.backtrack_coverages().len(), 1);
        assert!(inner.lookahead_coverages().is_empty());
        assert_eq!(gids(inner.substitute_glyph_ids()), [30, 31]);

        let bytes = [0u8, 1, 0, 0];
        assert_eq!(
            SubstitutionSubtable::read_with_args(FontData::new(&bytes), &9).err(),
            Some(ReadError::InvalidFormat(9))
        );
    }
}
