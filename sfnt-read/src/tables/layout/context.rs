//! Sequence context and chained sequence context subtables
//!
//! Sequence contexts are shared by GSUB lookup type 5 and GPOS lookup type 7;
//! chained contexts by GSUB lookup type 6 and GPOS lookup type 8.

use types::{BigEndian, FixedSize, GlyphId16, Nullable, Offset16};

use super::{ClassDef, CoverageTable};
use crate::{
    ArrayOfNullableOffsets, ArrayOfOffsets, FontData, FontRead, Format, ReadError, ResolveOffset,
};

/// A [Sequence Context](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#sequence-context-format-1-simple-glyph-contexts) subtable
#[derive(Clone, Copy, Debug)]
pub enum SequenceContext<'a> {
    Format1(SequenceContextFormat1<'a>),
    Format2(SequenceContextFormat2<'a>),
    Format3(SequenceContextFormat3<'a>),
}

impl<'a> FontRead<'a> for SequenceContext<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => FontRead::read(data).map(Self::Format1),
            2 => FontRead::read(data).map(Self::Format2),
            3 => FontRead::read(data).map(Self::Format3),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> SequenceContext<'a> {
    pub fn format(&self) -> u16 {
        match self {
            SequenceContext::Format1(_) => SequenceContextFormat1::FORMAT,
            SequenceContext::Format2(_) => SequenceContextFormat2::FORMAT,
            SequenceContext::Format3(_) => SequenceContextFormat3::FORMAT,
        }
    }

    pub fn data(&self) -> FontData<'a> {
        match self {
            SequenceContext::Format1(table) => table.data,
            SequenceContext::Format2(table) => table.data,
            SequenceContext::Format3(table) => table.data,
        }
    }
}

/// Used in several contextual lookups: which lookup to apply, at which
/// position of the input sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct SequenceLookupRecord {
    /// Index (zero-based) into the input glyph sequence
    pub sequence_index: BigEndian<u16>,
    /// Index (zero-based) into the LookupList
    pub lookup_list_index: BigEndian<u16>,
}

impl SequenceLookupRecord {
    pub fn sequence_index(&self) -> u16 {
        self.sequence_index.get()
    }

    pub fn lookup_list_index(&self) -> u16 {
        self.lookup_list_index.get()
    }
}

impl FixedSize for SequenceLookupRecord {
    const RAW_BYTE_LEN: usize = u16::RAW_BYTE_LEN * 2;
}

impl Format<u16> for SequenceContextFormat1<'_> {
    const FORMAT: u16 = 1;
}

impl Format<u16> for SequenceContextFormat2<'_> {
    const FORMAT: u16 = 2;
}

impl Format<u16> for SequenceContextFormat3<'_> {
    const FORMAT: u16 = 3;
}

// the input sequence of a rule stores every element but the first, which is
// implied by the coverage or class of the rule set.
fn read_input_len(count: u16) -> Result<usize, ReadError> {
    count
        .checked_sub(1)
        .map(usize::from)
        .ok_or(ReadError::MalformedData("sequence rule has no glyphs"))
}

/// A set of rules, all starting with the same glyph or class.
macro_rules! rule_set {
    ($(#[$attr:meta])* $name:ident, $rule:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            data: FontData<'a>,
            rule_offsets: &'a [BigEndian<Offset16>],
        }

        impl<'a> FontRead<'a> for $name<'a> {
            fn read(data: FontData<'a>) -> Result<Self, ReadError> {
                let mut cursor = data.cursor();
                let count: u16 = cursor.read()?;
                let rule_offsets = cursor.read_array(count as usize)?;
                Ok($name { data, rule_offsets })
            }
        }

        impl<'a> $name<'a> {
            /// Offsets to the rules, from the beginning of this table
            pub fn rule_offsets(&self) -> &'a [BigEndian<Offset16>] {
                self.rule_offsets
            }

            /// The rules, in order of preference.
            pub fn rules(&self) -> ArrayOfOffsets<'a, $rule<'a>> {
                ArrayOfOffsets::new(self.rule_offsets, self.data, ())
            }
        }
    };
}

/// A rule matching an input sequence of glyphs or of classes.
macro_rules! sequence_rule {
    ($(#[$attr:meta])* $name:ident, $item:ty) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            input_sequence: &'a [BigEndian<$item>],
            seq_lookup_records: &'a [SequenceLookupRecord],
        }

        impl<'a> FontRead<'a> for $name<'a> {
            fn read(data: FontData<'a>) -> Result<Self, ReadError> {
                let mut cursor = data.cursor();
                let glyph_count: u16 = cursor.read()?;
                let seq_lookup_count: u16 = cursor.read()?;
                let input_sequence = cursor.read_array(read_input_len(glyph_count)?)?;
                let seq_lookup_records = cursor.read_array(seq_lookup_count as usize)?;
                Ok($name {
                    input_sequence,
                    seq_lookup_records,
                })
            }
        }

        impl<'a> $name<'a> {
            /// The length of the input sequence, including the first element.
            pub fn glyph_count(&self) -> u16 {
                self.input_sequence.len() as u16 + 1
            }

            /// The input sequence, starting with the second element
            pub fn input_sequence(&self) -> &'a [BigEndian<$item>] {
                self.input_sequence
            }

            pub fn seq_lookup_records(&self) -> &'a [SequenceLookupRecord] {
                self.seq_lookup_records
            }
        }
    };
}

/// A chained rule matching backtrack, input and lookahead sequences of
/// glyphs or of classes.
macro_rules! chained_sequence_rule {
    ($(#[$attr:meta])* $name:ident, $item:ty) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            backtrack_sequence: &'a [BigEndian<$item>],
            input_sequence: &'a [BigEndian<$item>],
            lookahead_sequence: &'a [BigEndian<$item>],
            seq_lookup_records: &'a [SequenceLookupRecord],
        }

        impl<'a> FontRead<'a> for $name<'a> {
            fn read(data: FontData<'a>) -> Result<Self, ReadError> {
                let mut cursor = data.cursor();
                let backtrack_count: u16 = cursor.read()?;
                let backtrack_sequence = cursor.read_array(backtrack_count as usize)?;
                let input_count: u16 = cursor.read()?;
                let input_sequence = cursor.read_array(read_input_len(input_count)?)?;
                let lookahead_count: u16 = cursor.read()?;
                let lookahead_sequence = cursor.read_array(lookahead_count as usize)?;
                let seq_lookup_count: u16 = cursor.read()?;
                let seq_lookup_records = cursor.read_array(seq_lookup_count as usize)?;
                Ok($name {
                    backtrack_sequence,
                    input_sequence,
                    lookahead_sequence,
                    seq_lookup_records,
                })
            }
        }

        impl<'a> $name<'a> {
            /// The backtrack sequence, in reverse logical order
            pub fn backtrack_sequence(&self) -> &'a [BigEndian<$item>] {
                self.backtrack_sequence
            }

            /// The length of the input sequence, including the first element.
            pub fn input_glyph_count(&self) -> u16 {
                self.input_sequence.len() as u16 + 1
            }

            /// The input sequence, starting with the second element
            pub fn input_sequence(&self) -> &'a [BigEndian<$item>] {
                self.input_sequence
            }

            pub fn lookahead_sequence(&self) -> &'a [BigEndian<$item>] {
                self.lookahead_sequence
            }

            pub fn seq_lookup_records(&self) -> &'a [SequenceLookupRecord] {
                self.seq_lookup_records
            }
        }
    };
}

rule_set!(
    /// Part of [SequenceContextFormat1]
    SequenceRuleSet,
    SequenceRule
);
sequence_rule!(
    /// Part of [SequenceContextFormat1]
    SequenceRule,
    GlyphId16
);
rule_set!(
    /// Part of [SequenceContextFormat2]
    ClassSequenceRuleSet,
    ClassSequenceRule
);
sequence_rule!(
    /// Part of [SequenceContextFormat2]
    ClassSequenceRule,
    u16
);
rule_set!(
    /// Part of [ChainedSequenceContextFormat1]
    ChainedSequenceRuleSet,
    ChainedSequenceRule
);
chained_sequence_rule!(
    /// Part of [ChainedSequenceContextFormat1]
    ChainedSequenceRule,
    GlyphId16
);
rule_set!(
    /// Part of [ChainedSequenceContextFormat2]
    ChainedClassSequenceRuleSet,
    ChainedClassSequenceRule
);
chained_sequence_rule!(
    /// Part of [ChainedSequenceContextFormat2]
    ChainedClassSequenceRule,
    u16
);

/// Sequence Context Format 1: simple glyph contexts
#[derive(Clone, Copy, Debug)]
pub struct SequenceContextFormat1<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    seq_rule_set_offsets: &'a [BigEndian<Nullable<Offset16>>],
}

impl<'a> FontRead<'a> for SequenceContextFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let seq_rule_set_count: u16 = cursor.read()?;
        let seq_rule_set_offsets = cursor.read_array(seq_rule_set_count as usize)?;
        Ok(SequenceContextFormat1 {
            data,
            coverage_offset,
            seq_rule_set_offsets,
        })
    }
}

impl<'a> SequenceContextFormat1<'a> {
    /// Offset to Coverage table, from beginning of SequenceContextFormat1 table
    pub fn coverage_offset(&self) -> Offset16 {
        self.coverage_offset
    }

    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    /// The rule sets, one per covered glyph, ordered by coverage index.
    pub fn seq_rule_sets(&self) -> ArrayOfNullableOffsets<'a, SequenceRuleSet<'a>> {
        ArrayOfNullableOffsets::new(self.seq_rule_set_offsets, self.data, ())
    }
}

/// Sequence Context Format 2: class-based glyph contexts
#[derive(Clone, Copy, Debug)]
pub struct SequenceContextFormat2<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    class_def_offset: Offset16,
    class_seq_rule_set_offsets: &'a [BigEndian<Nullable<Offset16>>],
}

impl<'a> FontRead<'a> for SequenceContextFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let class_def_offset = cursor.read()?;
        let count: u16 = cursor.read()?;
        let class_seq_rule_set_offsets = cursor.read_array(count as usize)?;
        Ok(SequenceContextFormat2 {
            data,
            coverage_offset,
            class_def_offset,
            class_seq_rule_set_offsets,
        })
    }
}

impl<'a> SequenceContextFormat2<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    pub fn class_def(&self) -> Result<ClassDef<'a>, ReadError> {
        self.class_def_offset.resolve(self.data)
    }

    /// The rule sets, indexed by the class of the first input glyph.
    pub fn class_seq_rule_sets(&self) -> ArrayOfNullableOffsets<'a, ClassSequenceRuleSet<'a>> {
        ArrayOfNullableOffsets::new(self.class_seq_rule_set_offsets, self.data, ())
    }
}

/// Sequence Context Format 3: coverage-based contexts
#[derive(Clone, Copy, Debug)]
pub struct SequenceContextFormat3<'a> {
    data: FontData<'a>,
    coverage_offsets: &'a [BigEndian<Offset16>],
    seq_lookup_records: &'a [SequenceLookupRecord],
}

impl<'a> FontRead<'a> for SequenceContextFormat3<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let glyph_count: u16 = cursor.read()?;
        let seq_lookup_count: u16 = cursor.read()?;
        let coverage_offsets = cursor.read_array(glyph_count as usize)?;
        let seq_lookup_records = cursor.read_array(seq_lookup_count as usize)?;
        Ok(SequenceContextFormat3 {
            data,
            coverage_offsets,
            seq_lookup_records,
        })
    }
}

impl<'a> SequenceContextFormat3<'a> {
    /// The number of glyphs in the input sequence
    pub fn glyph_count(&self) -> u16 {
        self.coverage_offsets.len() as u16
    }

    /// Array of offsets to Coverage tables, from beginning of
    /// SequenceContextFormat3 subtable
    pub fn coverage_offsets(&self) -> &'a [BigEndian<Offset16>] {
        self.coverage_offsets
    }

    /// One coverage table per position of the input sequence.
    pub fn coverages(&self) -> ArrayOfOffsets<'a, CoverageTable<'a>> {
        ArrayOfOffsets::new(self.coverage_offsets, self.data, ())
    }

    /// Array of SequenceLookupRecords
    pub fn seq_lookup_records(&self) -> &'a [SequenceLookupRecord] {
        self.seq_lookup_records
    }
}

/// A [Chained Sequence Context](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#chained-sequence-context-format-1-simple-glyph-contexts) subtable
#[derive(Clone, Copy, Debug)]
pub enum ChainedSequenceContext<'a> {
    Format1(ChainedSequenceContextFormat1<'a>),
    Format2(ChainedSequenceContextFormat2<'a>),
    Format3(ChainedSequenceContextFormat3<'a>),
}

impl<'a> FontRead<'a> for ChainedSequenceContext<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => FontRead::read(data).map(Self::Format1),
            2 => FontRead::read(data).map(Self::Format2),
            3 => FontRead::read(data).map(Self::Format3),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> ChainedSequenceContext<'a> {
    pub fn format(&self) -> u16 {
        match self {
            ChainedSequenceContext::Format1(_) => ChainedSequenceContextFormat1::FORMAT,
            ChainedSequenceContext::Format2(_) => ChainedSequenceContextFormat2::FORMAT,
            ChainedSequenceContext::Format3(_) => ChainedSequenceContextFormat3::FORMAT,
        }
    }

    pub fn data(&self) -> FontData<'a> {
        match self {
            ChainedSequenceContext::Format1(table) => table.data,
            ChainedSequenceContext::Format2(table) => table.data,
            ChainedSequenceContext::Format3(table) => table.data,
        }
    }
}

impl Format<u16> for ChainedSequenceContextFormat1<'_> {
    const FORMAT: u16 = 1;
}

impl Format<u16> for ChainedSequenceContextFormat2<'_> {
    const FORMAT: u16 = 2;
}

impl Format<u16> for ChainedSequenceContextFormat3<'_> {
    const FORMAT: u16 = 3;
}

/// Chained Sequence Context Format 1: simple glyph contexts
#[derive(Clone, Copy, Debug)]
pub struct ChainedSequenceContextFormat1<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    chained_seq_rule_set_offsets: &'a [BigEndian<Nullable<Offset16>>],
}

impl<'a> FontRead<'a> for ChainedSequenceContextFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let count: u16 = cursor.read()?;
        let chained_seq_rule_set_offsets = cursor.read_array(count as usize)?;
        Ok(ChainedSequenceContextFormat1 {
            data,
            coverage_offset,
            chained_seq_rule_set_offsets,
        })
    }
}

impl<'a> ChainedSequenceContextFormat1<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    /// The rule sets, one per covered glyph, ordered by coverage index.
    pub fn chained_seq_rule_sets(
        &self,
    ) -> ArrayOfNullableOffsets<'a, ChainedSequenceRuleSet<'a>> {
        ArrayOfNullableOffsets::new(self.chained_seq_rule_set_offsets, self.data, ())
    }
}

/// Chained Sequence Context Format 2: class-based glyph contexts
#[derive(Clone, Copy, Debug)]
pub struct ChainedSequenceContextFormat2<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    backtrack_class_def_offset: Offset16,
    input_class_def_offset: Offset16,
    lookahead_class_def_offset: Offset16,
    chained_class_seq_rule_set_offsets: &'a [BigEndian<Nullable<Offset16>>],
}

impl<'a> FontRead<'a> for ChainedSequenceContextFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let backtrack_class_def_offset = cursor.read()?;
        let input_class_def_offset = cursor.read()?;
        let lookahead_class_def_offset = cursor.read()?;
        let count: u16 = cursor.read()?;
        let chained_class_seq_rule_set_offsets = cursor.read_array(count as usize)?;
        Ok(ChainedSequenceContextFormat2 {
            data,
            coverage_offset,
            backtrack_class_def_offset,
            input_class_def_offset,
            lookahead_class_def_offset,
            chained_class_seq_rule_set_offsets,
        })
    }
}

impl<'a> ChainedSequenceContextFormat2<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    pub fn backtrack_class_def(&self) -> Result<ClassDef<'a>, ReadError> {
        self.backtrack_class_def_offset.resolve(self.data)
    }

    pub fn input_class_def(&self) -> Result<ClassDef<'a>, ReadError> {
        self.input_class_def_offset.resolve(self.data)
    }

    pub fn lookahead_class_def(&self) -> Result<ClassDef<'a>, ReadError> {
        self.lookahead_class_def_offset.resolve(self.data)
    }

    /// The rule sets, indexed by the input class of the first glyph.
    pub fn chained_class_seq_rule_sets(
        &self,
    ) -> ArrayOfNullableOffsets<'a, ChainedClassSequenceRuleSet<'a>> {
        ArrayOfNullableOffsets::new(self.chained_class_seq_rule_set_offsets, self.data, ())
    }
}

/// Chained Sequence Context Format 3: coverage-based contexts
#[derive(Clone, Copy, Debug)]
pub struct ChainedSequenceContextFormat3<'a> {
    data: FontData<'a>,
    backtrack_coverage_offsets: &'a [BigEndian<Offset16>],
    input_coverage_offsets: &'a [BigEndian<Offset16>],
    lookahead_coverage_offsets: &'a [BigEndian<Offset16>],
    seq_lookup_records: &'a [SequenceLookupRecord],
}

impl<'a> FontRead<'a> for ChainedSequenceContextFormat3<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let backtrack_count: u16 = cursor.read()?;
        let backtrack_coverage_offsets = cursor.read_array(backtrack_count as usize)?;
        let input_count: u16 = cursor.read()?;
        let input_coverage_offsets = cursor.read_array(input_count as usize)?;
        let lookahead_count: u16 = cursor.read()?;
        let lookahead_coverage_offsets = cursor.read_array(lookahead_count as usize)?;
        let seq_lookup_count: u16 = cursor.read()?;
        let seq_lookup_records = cursor.read_array(seq_lookup_count as usize)?;
        Ok(ChainedSequenceContextFormat3 {
            data,
            backtrack_coverage_offsets,
            input_coverage_offsets,
            lookahead_coverage_offsets,
            seq_lookup_records,
        })
    }
}

impl<'a> ChainedSequenceContextFormat3<'a> {
    /// Coverage of each backtrack position, in reverse logical order.
    pub fn backtrack_coverages(&self) -> ArrayOfOffsets<'a, CoverageTable<'a>> {
        ArrayOfOffsets::new(self.backtrack_coverage_offsets, self.data, ())
    }

    pub fn input_coverages(&self) -> ArrayOfOffsets<'a, CoverageTable<'a>> {
        ArrayOfOffsets::new(self.input_coverage_offsets, self.data, ())
    }

    pub fn lookahead_coverages(&self) -> ArrayOfOffsets<'a, CoverageTable<'a>> {
        ArrayOfOffsets::new(self.lookahead_coverage_offsets, self.data, ())
    }

    pub fn seq_lookup_records(&self) -> &'a [SequenceLookupRecord] {
        self.seq_lookup_records
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn format_1() {
        let bytes = be_buffer! {
            1u16, 8u16, 1u16, 14u16,
            // coverage at 8
            1u16, 1u16, 4u16,
            // rule set at 14
            1u16, 4u16,
            // rule at 18
            3u16, 1u16, 5u16, 6u16,
            1u16, 2u16
        };
        let SequenceContext::Format1(table) =
            SequenceContext::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        assert_eq!(table.coverage().unwrap().get(GlyphId16::new(4)), Some(0));
        let rule_set = table.seq_rule_sets().get(0).unwrap().unwrap();
        let rule = rule_set.rules().get(0).unwrap();
        assert_eq!(rule.glyph_count(), 3);
        assert_eq!(
            rule.input_sequence().iter().map(|g| g.get().to_u16()).collect::<Vec<_>>(),
            [5, 6]
        );
        let record = rule.seq_lookup_records()[0];
        assert_eq!((record.sequence_index(), record.lookup_list_index()), (1, 2));
    }

    #[test]
    fn format_2() {
        let bytes = be_buffer! {
            2u16, 12u16, 18u16, 2u16, 0u16, 32u16,
            // coverage at 12
            1u16, 1u16, 7u16,
            // class def at 18
            1u16, 7u16, 4u16, 1u16, 1u16, 2u16, 0u16,
            // rule set for class 1 at 32
            1u16, 4u16,
            // rule at 36
            2u16, 1u16, 2u16,
            0u16, 5u16
        };
        let SequenceContext::Format2(table) =
            SequenceContext::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        assert_eq!(table.class_def().unwrap().get(GlyphId16::new(9)), 2);
        let sets = table.class_seq_rule_sets();
        assert!(sets.get(0).is_none());
        let rule = sets.get(1).unwrap().unwrap().rules().get(0).unwrap();
        assert_eq!(rule.glyph_count(), 2);
        assert_eq!(rule.input_sequence()[0].get(), 2);
        assert_eq!(rule.seq_lookup_records()[0].lookup_list_index(), 5);
    }

    #[test]
    fn empty_rule_is_malformed() {
        let bytes = be_buffer! { 0u16, 0u16 };
        assert_eq!(
            ClassSequenceRule::read(FontData::new(&bytes)).err(),
            Some(ReadError::MalformedData("sequence rule has no glyphs"))
        );
    }

    #[test]
    fn format_3() {
        let bytes = be_buffer! {
            3u16, 2u16, 1u16, 14u16, 20u16,
            0u16, 3u16,
            // coverages
            1u16, 1u16, 9u16,
            1u16, 1u16, 10u16
        };
        let SequenceContext::Format3(table) =
            SequenceContext::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        assert_eq!(table.glyph_count(), 2);
        let covered = table
            .coverages()
            .iter()
            .map(|cov| cov.unwrap().iter().next().unwrap().to_u16())
            .collect::<Vec<_>>();
        assert_eq!(covered, [9, 10]);
        assert_eq!(table.seq_lookup_records()[0].lookup_list_index(), 3);
    }

    #[test]
    fn chained_format_1() {
        let bytes = be_buffer! {
            1u16, 8u16, 1u16, 14u16,
            // coverage at 8
            1u16, 1u16, 20u16,
            // rule set at 14
            1u16, 4u16,
            // rule at 18
            1u16, 19u16,
            2u16, 21u16,
            2u16, 22u16, 23u16,
            1u16, 0u16, 4u16
        };
        let ChainedSequenceContext::Format1(table) =
            ChainedSequenceContext::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        let rule = table
            .chained_seq_rule_sets()
            .get(0)
            .unwrap()
            .unwrap()
            .rules()
            .get(0)
            .unwrap();
        let gids = |seq: &[BigEndian<GlyphId16>]| {
            seq.iter().map(|g| g.get().to_u16()).collect::<Vec<_>>()
        };
        assert_eq!(gids(rule.backtrack_sequence()), [19]);
        assert_eq!(rule.input_glyph_count(), 2);
        assert_eq!(gids(rule.input_sequence()), [21]);
        assert_eq!(gids(rule.lookahead_sequence()), [22, 23]);
        assert_eq!(rule.seq_lookup_records()[0].lookup_list_index(), 4);
    }

    #[test]
    fn chained_format_2() {
        let bytes = be_buffer! {
            2u16, 14u16, 20u16, 20u16, 20u16, 1u16, 30u16,
            // coverage at 14
            1u16, 1u16, 3u16,
            // shared class def at 20
            2u16, 1u16, 3u16, 3u16, 0u16,
            // rule set at 30
            1u16, 4u16,
            // rule at 34
            0u16, 1u16, 0u16, 0u16
        };
        let ChainedSequenceContext::Format2(table) =
            ChainedSequenceContext::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        assert_eq!(table.input_class_def().unwrap().get(GlyphId16::new(3)), 0);
        assert!(table.backtrack_class_def().is_ok());
        assert!(table.lookahead_class_def().is_ok());
        let rule = table
            .chained_class_seq_rule_sets()
            .get(0)
            .unwrap()
            .unwrap()
            .rules()
            .get(0)
            .unwrap();
        assert_eq!(rule.input_glyph_count(), 1);
        assert!(rule.seq_lookup_records().is_empty());
    }

    #[test]
    fn chained_format_3() {
        let bytes = be_buffer! {
            3u16,
            1u16, 20u16,
            1u16, 26u16,
            1u16, 20u16,
            1u16, 0u16, 1u16,
            // coverage at 20
            1u16, 1u16, 8u16,
            // coverage at 26
            1u16, 1u16, 9u16
        };
        let ChainedSequenceContext::Format3(table) =
            ChainedSequenceContext::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("wrong format");
        };
        fn first<'a>(coverages: ArrayOfOffsets<'a, CoverageTable<'a>>) -> Vec<u16> {
            coverages
                .iter()
                .map(|cov| cov.unwrap().iter().next().unwrap().to_u16())
                .collect::<Vec<_>>()
        }
        assert_eq!(first(table.backtrack_coverages()), [8]);
        assert_eq!(first(table.input_coverages()), [9]);
        assert_eq!(first(table.lookahead_coverages()), [8]);
        assert_eq!(table.seq_lookup_records()[0].lookup_list_index(), 1);
    }
}
