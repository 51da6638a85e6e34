//! Sequence context and chained sequence context subtables

use read::{tables::layout as read_layout, FontData, ReadError};
use types::GlyphId16;

use super::{ClassDef, CoverageTable};
use crate::{
    from_obj::{FromObjRef, FromTableRef, ToOwnedObj, ToOwnedTable},
    offsets::{NullableOffsetMarker, OffsetMarker},
    validate::{Validate, ValidationCtx},
    write::{array_len, FontWrite, TableWriter},
};

/// [Sequence Context](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#sequence-context-format-1-simple-glyph-contexts)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceContext {
    Format1(SequenceContextFormat1),
    Format2(SequenceContextFormat2),
    Format3(SequenceContextFormat3),
}

/// Sequence Context Format 1: simple glyph contexts
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceContextFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    /// One (possibly null) rule set per covered glyph, in coverage index order
    pub seq_rule_sets: Vec<NullableOffsetMarker<SequenceRuleSet>>,
}

/// Sequence Context Format 2: class-based glyph contexts
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceContextFormat2 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub class_def: OffsetMarker<ClassDef>,
    /// One (possibly null) rule set per class, indexed by the class of the
    /// first input glyph
    pub class_seq_rule_sets: Vec<NullableOffsetMarker<ClassSequenceRuleSet>>,
}

/// Sequence Context Format 3: coverage-based contexts
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceContextFormat3 {
    /// One coverage table per position in the input sequence
    pub coverages: Vec<OffsetMarker<CoverageTable>>,
    pub seq_lookup_records: Vec<SequenceLookupRecord>,
}

/// [Chained Sequence Context](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#chained-sequence-context-format-1-simple-glyph-contexts)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChainedSequenceContext {
    Format1(ChainedSequenceContextFormat1),
    Format2(ChainedSequenceContextFormat2),
    Format3(ChainedSequenceContextFormat3),
}

/// Chained Sequence Context Format 1: simple glyph contexts
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainedSequenceContextFormat1 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub chained_seq_rule_sets: Vec<NullableOffsetMarker<ChainedSequenceRuleSet>>,
}

/// Chained Sequence Context Format 2: class-based glyph contexts
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainedSequenceContextFormat2 {
    pub coverage: OffsetMarker<CoverageTable>,
    pub backtrack_class_def: OffsetMarker<ClassDef>,
    pub input_class_def: OffsetMarker<ClassDef>,
    pub lookahead_class_def: OffsetMarker<ClassDef>,
    pub chained_class_seq_rule_sets: Vec<NullableOffsetMarker<ChainedClassSequenceRuleSet>>,
}

/// Chained Sequence Context Format 3: coverage-based glyph contexts
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainedSequenceContextFormat3 {
    /// Backtrack coverages, in reverse logical order
    pub backtrack_coverages: Vec<OffsetMarker<CoverageTable>>,
    pub input_coverages: Vec<OffsetMarker<CoverageTable>>,
    pub lookahead_coverages: Vec<OffsetMarker<CoverageTable>>,
    pub seq_lookup_records: Vec<SequenceLookupRecord>,
}

/// Which lookup to apply, at which position of the input sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceLookupRecord {
    pub sequence_index: u16,
    pub lookup_list_index: u16,
}

impl SequenceLookupRecord {
    pub fn new(sequence_index: u16, lookup_list_index: u16) -> Self {
        Self {
            sequence_index,
            lookup_list_index,
        }
    }
}

macro_rules! rule_set {
    ($(#[$attr:meta])* $name:ident, $rule:ident, $rules:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            pub $rules: Vec<OffsetMarker<$rule>>,
        }

        impl $name {
            pub fn new($rules: Vec<$rule>) -> Self {
                Self {
                    $rules: $rules.into_iter().map(Into::into).collect(),
                }
            }
        }

        impl FontWrite for $name {
            fn write_into(&self, writer: &mut TableWriter) {
                array_len(&self.$rules).write_into(writer);
                self.$rules.write_into(writer);
            }
        }

        impl Validate for $name {
            fn validate_impl(&self, ctx: &mut ValidationCtx) {
                ctx.in_table(stringify!($name), |ctx| {
                    ctx.in_field(stringify!($rules), |ctx| {
                        ctx.check_array_len(self.$rules.len());
                        self.$rules.validate_impl(ctx);
                    })
                })
            }
        }

        impl FromObjRef<read_layout::$name<'_>> for $name {
            fn from_obj_ref(obj: &read_layout::$name, _: FontData) -> Result<Self, ReadError> {
                Ok($name {
                    $rules: obj
                        .rules()
                        .iter()
                        .map(|rule| rule.to_owned_table())
                        .collect::<Result<_, _>>()?,
                })
            }
        }

        impl FromTableRef<read_layout::$name<'_>> for $name {}
    };
}

macro_rules! sequence_rule {
    ($(#[$attr:meta])* $name:ident, $item:ty) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            /// The input sequence, starting with the second item
            pub input_sequence: Vec<$item>,
            pub seq_lookup_records: Vec<SequenceLookupRecord>,
        }

        impl $name {
            pub fn new(input_sequence: Vec<$item>, seq_lookup_records: Vec<SequenceLookupRecord>) -> Self {
                Self {
                    input_sequence,
                    seq_lookup_records,
                }
            }

            fn glyph_count(&self) -> u16 {
                array_len(&self.input_sequence).saturating_add(1)
            }
        }

        impl FontWrite for $name {
            fn write_into(&self, writer: &mut TableWriter) {
                self.glyph_count().write_into(writer);
                array_len(&self.seq_lookup_records).write_into(writer);
                self.input_sequence.write_into(writer);
                self.seq_lookup_records.write_into(writer);
            }
        }

        impl Validate for $name {
            fn validate_impl(&self, ctx: &mut ValidationCtx) {
                ctx.in_table(stringify!($name), |ctx| {
                    ctx.in_field("input_sequence", |ctx| {
                        ctx.check_array_len(self.input_sequence.len() + 1)
                    });
                    ctx.in_field("seq_lookup_records", |ctx| {
                        check_lookup_records(
                            &self.seq_lookup_records,
                            self.input_sequence.len() + 1,
                            ctx,
                        )
                    })
                })
            }
        }

        impl FromObjRef<read_layout::$name<'_>> for $name {
            fn from_obj_ref(obj: &read_layout::$name, data: FontData) -> Result<Self, ReadError> {
                Ok($name {
                    input_sequence: obj.input_sequence().to_owned_obj(data)?,
                    seq_lookup_records: obj.seq_lookup_records().to_owned_obj(data)?,
                })
            }
        }

        impl FromTableRef<read_layout::$name<'_>> for $name {}
    };
}

macro_rules! chained_sequence_rule {
    ($(#[$attr:meta])* $name:ident, $item:ty) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            /// The backtrack sequence, in reverse logical order
            pub backtrack_sequence: Vec<$item>,
            /// The input sequence, starting with the second item
            pub input_sequence: Vec<$item>,
            pub lookahead_sequence: Vec<$item>,
            pub seq_lookup_records: Vec<SequenceLookupRecord>,
        }

        impl $name {
            pub fn new(
                backtrack_sequence: Vec<$item>,
                input_sequence: Vec<$item>,
                lookahead_sequence: Vec<$item>,
                seq_lookup_records: Vec<SequenceLookupRecord>,
            ) -> Self {
                Self {
                    backtrack_sequence,
                    input_sequence,
                    lookahead_sequence,
                    seq_lookup_records,
                }
            }

            fn input_glyph_count(&self) -> u16 {
                array_len(&self.input_sequence).saturating_add(1)
            }
        }

        impl FontWrite for $name {
            fn write_into(&self, writer: &mut TableWriter) {
                array_len(&self.backtrack_sequence).write_into(writer);
                self.backtrack_sequence.write_into(writer);
                self.input_glyph_count().write_into(writer);
                self.input_sequence.write_into(writer);
                array_len(&self.lookahead_sequence).write_into(writer);
                self.lookahead_sequence.write_into(writer);
                array_len(&self.seq_lookup_records).write_into(writer);
                self.seq_lookup_records.write_into(writer);
            }
        }

        impl Validate for $name {
            fn validate_impl(&self, ctx: &mut ValidationCtx) {
                ctx.in_table(stringify!($name), |ctx| {
                    ctx.in_field("backtrack_sequence", |ctx| {
                        ctx.check_array_len(self.backtrack_sequence.len())
                    });
                    ctx.in_field("input_sequence", |ctx| {
                        ctx.check_array_len(self.input_sequence.len() + 1)
                    });
                    ctx.in_field("lookahead_sequence", |ctx| {
                        ctx.check_array_len(self.lookahead_sequence.len())
                    });
                    ctx.in_field("seq_lookup_records", |ctx| {
                        check_lookup_records(
                            &self.seq_lookup_records,
                            self.input_sequence.len() + 1,
                            ctx,
                        )
                    })
                })
            }
        }

        impl FromObjRef<read_layout::$name<'_>> for $name {
            fn from_obj_ref(obj: &read_layout::$name, data: FontData) -> Result<Self, ReadError> {
                Ok($name {
                    backtrack_sequence: obj.backtrack_sequence().to_owned_obj(data)?,
                    input_sequence: obj.input_sequence().to_owned_obj(data)?,
                    lookahead_sequence: obj.lookahead_sequence().to_owned_obj(data)?,
                    seq_lookup_records: obj.seq_lookup_records().to_owned_obj(data)?,
                })
            }
        }

        impl FromTableRef<read_layout::$name<'_>> for $name {}
    };
}

rule_set!(SequenceRuleSet, SequenceRule, seq_rules);
rule_set!(ClassSequenceRuleSet, ClassSequenceRule, class_seq_rules);
rule_set!(ChainedSequenceRuleSet, ChainedSequenceRule, chained_seq_rules);
rule_set!(
    ChainedClassSequenceRuleSet,
    ChainedClassSequenceRule,
    chained_class_seq_rules
);

sequence_rule!(
    /// A rule matching a sequence of glyphs
    SequenceRule,
    GlyphId16
);
sequence_rule!(
    /// A rule matching a sequence of glyph classes
    ClassSequenceRule,
    u16
);
chained_sequence_rule!(
    /// A rule matching a sequence of glyphs in context
    ChainedSequenceRule,
    GlyphId16
);
chained_sequence_rule!(
    /// A rule matching a sequence of glyph classes in context
    ChainedClassSequenceRule,
    u16
);

impl SequenceContext {
    pub fn format_1(coverage: CoverageTable, seq_rule_sets: Vec<Option<SequenceRuleSet>>) -> Self {
        Self::Format1(SequenceContextFormat1 {
            coverage: coverage.into(),
            seq_rule_sets: seq_rule_sets.into_iter().map(Into::into).collect(),
        })
    }

    pub fn format_2(
        coverage: CoverageTable,
        class_def: ClassDef,
        class_seq_rule_sets: Vec<Option<ClassSequenceRuleSet>>,
    ) -> Self {
        Self::Format2(SequenceContextFormat2 {
            coverage: coverage.into(),
            class_def: class_def.into(),
            class_seq_rule_sets: class_seq_rule_sets.into_iter().map(Into::into).collect(),
        })
    }

    pub fn format_3(
        coverages: Vec<CoverageTable>,
        seq_lookup_records: Vec<SequenceLookupRecord>,
    ) -> Self {
        Self::Format3(SequenceContextFormat3 {
            coverages: coverages.into_iter().map(Into::into).collect(),
            seq_lookup_records,
        })
    }
}

impl Default for SequenceContext {
    fn default() -> Self {
        Self::Format1(SequenceContextFormat1::default())
    }
}

impl ChainedSequenceContext {
    pub fn format_1(
        coverage: CoverageTable,
        chained_seq_rule_sets: Vec<Option<ChainedSequenceRuleSet>>,
    ) -> Self {
        Self::Format1(ChainedSequenceContextFormat1 {
            coverage: coverage.into(),
            chained_seq_rule_sets: chained_seq_rule_sets.into_iter().map(Into::into).collect(),
        })
    }

    pub fn format_2(
        coverage: CoverageTable,
        backtrack_class_def: ClassDef,
        input_class_def: ClassDef,
        lookahead_class_def: ClassDef,
        chained_class_seq_rule_sets: Vec<Option<ChainedClassSequenceRuleSet>>,
    ) -> Self {
        Self::Format2(ChainedSequenceContextFormat2 {
            coverage: coverage.into(),
            backtrack_class_def: backtrack_class_def.into(),
            input_class_def: input_class_def.into(),
            lookahead_class_def: lookahead_class_def.into(),
            chained_class_seq_rule_sets: chained_class_seq_rule_sets
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    }

    pub fn format_3(
        backtrack_coverages: Vec<CoverageTable>,
        input_coverages: Vec<CoverageTable>,
        lookahead_coverages: Vec<CoverageTable>,
        seq_lookup_records: Vec<SequenceLookupRecord>,
    ) -> Self {
        Self::Format3(ChainedSequenceContextFormat3 {
            backtrack_coverages: backtrack_coverages.into_iter().map(Into::into).collect(),
            input_coverages: input_coverages.into_iter().map(Into::into).collect(),
            lookahead_coverages: lookahead_coverages.into_iter().map(Into::into).collect(),
            seq_lookup_records,
        })
    }
}

impl Default for ChainedSequenceContext {
    fn default() -> Self {
        Self::Format1(ChainedSequenceContextFormat1::default())
    }
}

/* font write */

impl FontWrite for SequenceContext {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            SequenceContext::Format1(table) => {
                1u16.write_into(writer);
                table.coverage.write_into(writer);
                array_len(&table.seq_rule_sets).write_into(writer);
                table.seq_rule_sets.write_into(writer);
            }
            SequenceContext::Format2(table) => {
                2u16.write_into(writer);
                table.coverage.write_into(writer);
                table.class_def.write_into(writer);
                array_len(&table.class_seq_rule_sets).write_into(writer);
                table.class_seq_rule_sets.write_into(writer);
            }
            SequenceContext::Format3(table) => {
                3u16.write_into(writer);
                array_len(&table.coverages).write_into(writer);
                array_len(&table.seq_lookup_records).write_into(writer);
                table.coverages.write_into(writer);
                table.seq_lookup_records.write_into(writer);
            }
        }
    }
}

impl FontWrite for ChainedSequenceContext {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            ChainedSequenceContext::Format1(table) => {
                1u16.write_into(writer);
                table.coverage.write_into(writer);
                array_len(&table.chained_seq_rule_sets).write_into(writer);
                table.chained_seq_rule_sets.write_into(writer);
            }
            ChainedSequenceContext::Format2(table) => {
                2u16.write_into(writer);
                table.coverage.write_into(writer);
                table.backtrack_class_def.write_into(writer);
                table.input_class_def.write_into(writer);
                table.lookahead_class_def.write_into(writer);
                array_len(&table.chained_class_seq_rule_sets).write_into(writer);
                table.chained_class_seq_rule_sets.write_into(writer);
            }
            ChainedSequenceContext::Format3(table) => {
                3u16.write_into(writer);
                array_len(&table.backtrack_coverages).write_into(writer);
                table.backtrack_coverages.write_into(writer);
                array_len(&table.input_coverages).write_into(writer);
                table.input_coverages.write_into(writer);
                array_len(&table.lookahead_coverages).write_into(writer);
                table.lookahead_coverages.write_into(writer);
                array_len(&table.seq_lookup_records).write_into(writer);
                table.seq_lookup_records.write_into(writer);
            }
        }
    }
}

impl FontWrite for SequenceLookupRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.sequence_index.write_into(writer);
        self.lookup_list_index.write_into(writer);
    }
}

/* validation */

impl Validate for SequenceContext {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            SequenceContext::Format1(table) => ctx.in_table("SequenceContextFormat1", |ctx| {
                ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx));
                ctx.in_field("seq_rule_sets", |ctx| {
                    check_rule_set_count(&table.coverage, table.seq_rule_sets.len(), ctx);
                    table.seq_rule_sets.validate_impl(ctx);
                })
            }),
            SequenceContext::Format2(table) => ctx.in_table("SequenceContextFormat2", |ctx| {
                ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx));
                ctx.in_field("class_def", |ctx| table.class_def.validate_impl(ctx));
                ctx.in_field("class_seq_rule_sets", |ctx| {
                    ctx.check_array_len(table.class_seq_rule_sets.len());
                    table.class_seq_rule_sets.validate_impl(ctx);
                })
            }),
            SequenceContext::Format3(table) => ctx.in_table("SequenceContextFormat3", |ctx| {
                ctx.in_field("coverages", |ctx| {
                    check_input_coverages(&table.coverages, ctx);
                    table.coverages.validate_impl(ctx);
                });
                ctx.in_field("seq_lookup_records", |ctx| {
                    check_lookup_records(&table.seq_lookup_records, table.coverages.len(), ctx)
                })
            }),
        }
    }
}

impl Validate for ChainedSequenceContext {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self {
            ChainedSequenceContext::Format1(table) => {
                ctx.in_table("ChainedSequenceContextFormat1", |ctx| {
                    ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx));
                    ctx.in_field("chained_seq_rule_sets", |ctx| {
                        check_rule_set_count(
                            &table.coverage,
                            table.chained_seq_rule_sets.len(),
                            ctx,
                        );
                        table.chained_seq_rule_sets.validate_impl(ctx);
                    })
                })
            }
            ChainedSequenceContext::Format2(table) => {
                ctx.in_table("ChainedSequenceContextFormat2", |ctx| {
                    ctx.in_field("coverage", |ctx| table.coverage.validate_impl(ctx));
                    ctx.in_field("backtrack_class_def", |ctx| {
                        table.backtrack_class_def.validate_impl(ctx)
                    });
                    ctx.in_field("input_class_def", |ctx| {
                        table.input_class_def.validate_impl(ctx)
                    });
                    ctx.in_field("lookahead_class_def", |ctx| {
                        table.lookahead_class_def.validate_impl(ctx)
                    });
                    ctx.in_field("chained_class_seq_rule_sets", |ctx| {
                        ctx.check_array_len(table.chained_class_seq_rule_sets.len());
                        table.chained_class_seq_rule_sets.validate_impl(ctx);
                    })
                })
            }
            ChainedSequenceContext::Format3(table) => {
                ctx.in_table("ChainedSequenceContextFormat3", |ctx| {
                    ctx.in_field("backtrack_coverages", |ctx| {
                        ctx.check_array_len(table.backtrack_coverages.len());
                        table.backtrack_coverages.validate_impl(ctx);
                    });
                    ctx.in_field("input_coverages", |ctx| {
                        check_input_coverages(&table.input_coverages, ctx);
                        table.input_coverages.validate_impl(ctx);
                    });
                    ctx.in_field("lookahead_coverages", |ctx| {
                        ctx.check_array_len(table.lookahead_coverages.len());
                        table.lookahead_coverages.validate_impl(ctx);
                    });
                    ctx.in_field("seq_lookup_records", |ctx| {
                        check_lookup_records(
                            &table.seq_lookup_records,
                            table.input_coverages.len(),
                            ctx,
                        )
                    })
                })
            }
        }
    }
}

fn check_rule_set_count(coverage: &CoverageTable, len: usize, ctx: &mut ValidationCtx) {
    ctx.check_array_len(len);
    if len != coverage.len() {
        ctx.report(format!("{len} rule sets for {} covered glyphs", coverage.len()));
    }
}

fn check_input_coverages(coverages: &[OffsetMarker<CoverageTable>], ctx: &mut ValidationCtx) {
    ctx.check_array_len(coverages.len());
    if coverages.is_empty() {
        ctx.report("a coverage-based context needs at least one input coverage");
    }
}

fn check_lookup_records(
    records: &[SequenceLookupRecord],
    glyph_count: usize,
    ctx: &mut ValidationCtx,
) {
    ctx.check_array_len(records.len());
    ctx.with_array_items(records.iter(), |ctx, rec| {
        if rec.sequence_index as usize >= glyph_count {
            ctx.report(format!(
                "sequence index {} out of range for {glyph_count} glyphs",
                rec.sequence_index
            ));
        }
    })
}

/* conversion from parsed tables */

impl FromObjRef<read_layout::SequenceContext<'_>> for SequenceContext {
    fn from_obj_ref(obj: &read_layout::SequenceContext, _: FontData) -> Result<Self, ReadError> {
        Ok(match obj {
            read_layout::SequenceContext::Format1(table) => {
                SequenceContext::Format1(table.to_owned_table()?)
            }
            read_layout::SequenceContext::Format2(table) => {
                SequenceContext::Format2(table.to_owned_table()?)
            }
            read_layout::SequenceContext::Format3(table) => {
                SequenceContext::Format3(table.to_owned_table()?)
            }
        })
    }
}

impl FromTableRef<read_layout::SequenceContext<'_>> for SequenceContext {}

impl FromObjRef<read_layout::SequenceContextFormat1<'_>> for SequenceContextFormat1 {
    fn from_obj_ref(
        obj: &read_layout::SequenceContextFormat1,
        _: FontData,
    ) -> Result<Self, ReadError> {
        Ok(SequenceContextFormat1 {
            coverage: obj.coverage().to_owned_table()?,
            seq_rule_sets: obj
                .seq_rule_sets()
                .iter()
                .map(|set| set.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_layout::SequenceContextFormat1<'_>> for SequenceContextFormat1 {}

impl FromObjRef<read_layout::SequenceContextFormat2<'_>> for SequenceContextFormat2 {
    fn from_obj_ref(
        obj: &read_layout::SequenceContextFormat2,
        _: FontData,
    ) -> Result<Self, ReadError> {
        Ok(SequenceContextFormat2 {
            coverage: obj.coverage().to_owned_table()?,
            class_def: obj.class_def().to_owned_table()?,
            class_seq_rule_sets: obj
                .class_seq_rule_sets()
                .iter()
                .map(|set| set.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_layout::SequenceContextFormat2<'_>> for SequenceContextFormat2 {}

impl FromObjRef<read_layout::SequenceContextFormat3<'_>> for SequenceContextFormat3 {
    fn from_obj_ref(
        obj: &read_layout::SequenceContextFormat3,
        data: FontData,
    ) -> Result<Self, ReadError> {
        Ok(SequenceContextFormat3 {
            coverages: obj
                .coverages()
                .iter()
                .map(|coverage| coverage.to_owned_table())
                .collect::<Result<_, _>>()?,
            seq_lookup_records: obj.seq_lookup_records().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_layout::SequenceContextFormat3<'_>> for SequenceContextFormat3 {}

impl FromObjRef<read_layout::ChainedSequenceContext<'_>> for ChainedSequenceContext {
    fn from_obj_ref(
        obj: &read_layout::ChainedSequenceContext,
        _: FontData,
    ) -> Result<Self, ReadError> {
        Ok(match obj {
            read_layout::ChainedSequenceContext::Format1(table) => {
                ChainedSequenceContext::Format1(table.to_owned_table()?)
            }
            read_layout::ChainedSequenceContext::Format2(table) => {
                ChainedSequenceContext::Format2(table.to_owned_table()?)
            }
            read_layout::ChainedSequenceContext::Format3(table) => {
                ChainedSequenceContext::Format3(table.to_owned_table()?)
            }
        })
    }
}

impl FromTableRef<read_layout::ChainedSequenceContext<'_>> for ChainedSequenceContext {}

impl FromObjRef<read_layout::ChainedSequenceContextFormat1<'_>> for ChainedSequenceContextFormat1 {
    fn from_obj_ref(
        obj: &read_layout::ChainedSequenceContextFormat1,
        _: FontData,
    ) -> Result<Self, ReadError> {
        Ok(ChainedSequenceContextFormat1 {
            coverage: obj.coverage().to_owned_table()?,
            chained_seq_rule_sets: obj
                .chained_seq_rule_sets()
                .iter()
                .map(|set| set.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_layout::ChainedSequenceContextFormat1<'_>>
    for ChainedSequenceContextFormat1
{
}

impl FromObjRef<read_layout::ChainedSequenceContextFormat2<'_>> for ChainedSequenceContextFormat2 {
    fn from_obj_ref(
        obj: &read_layout::ChainedSequenceContextFormat2,
        _: FontData,
    ) -> Result<Self, ReadError> {
        Ok(ChainedSequenceContextFormat2 {
            coverage: obj.coverage().to_owned_table()?,
            backtrack_class_def: obj.backtrack_class_def().to_owned_table()?,
            input_class_def: obj.input_class_def().to_owned_table()?,
            lookahead_class_def: obj.lookahead_class_def().to_owned_table()?,
            chained_class_seq_rule_sets: obj
                .chained_class_seq_rule_sets()
                .iter()
                .map(|set| set.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_layout::ChainedSequenceContextFormat2<'_>>
    for ChainedSequenceContextFormat2
{
}

impl FromObjRef<read_layout::ChainedSequenceContextFormat3<'_>> for ChainedSequenceContextFormat3 {
    fn from_obj_ref(
        obj: &read_layout::ChainedSequenceContextFormat3,
        data: FontData,
    ) -> Result<Self, ReadError> {
        fn convert<'a>(
            coverages: read::ArrayOfOffsets<'a, read_layout::CoverageTable<'a>>,
        ) -> Result<Vec<OffsetMarker<CoverageTable>>, ReadError> {
            coverages
                .iter()
                .map(|coverage| coverage.to_owned_table())
                .collect::<Result<Vec<_>, _>>()
        }
        Ok(ChainedSequenceContextFormat3 {
            backtrack_coverages: convert(obj.backtrack_coverages())?,
            input_coverages: convert(obj.input_coverages())?,
            lookahead_coverages: convert(obj.lookahead_coverages())?,
            seq_lookup_records: obj.seq_lookup_records().to_owned_obj(data)?,
        })
    }
}

impl FromTableRef<read_layout::ChainedSequenceContextFormat3<'_>>
    for ChainedSequenceContextFormat3
{
}

impl FromObjRef<read_layout::SequenceLookupRecord> for SequenceLookupRecord {
    fn from_obj_ref(obj: &read_layout::SequenceLookupRecord, _: FontData) -> Result<Self, ReadError> {
        Ok(SequenceLookupRecord {
            sequence_index: obj.sequence_index(),
            lookup_list_index: obj.lookup_list_index(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::FontRead;

    use super::*;
    use crate::{
        dump_table,
        tables::layout::{Builder, ClassDefBuilder},
    };

    fn glyphs<const N: usize>(gids: [u16; N]) -> Vec<GlyphId16> {
        gids.into_iter().map(GlyphId16::new).collect()
    }

    fn round_trip(context: &SequenceContext) -> Vec<u8> {
        let bytes = dump_table(context).unwrap();
        let read_back = read_layout::SequenceContext::read(FontData::new(&bytes)).unwrap();
        let owned: SequenceContext = read_back.to_owned_table().unwrap();
        assert_eq!(&owned, context);
        bytes
    }

    fn chained_round_trip(context: &ChainedSequenceContext) -> Vec<u8> {
        let bytes = dump_table(context).unwrap();
        let read_back = read_layout::ChainedSequenceContext::read(FontData::new(&bytes)).unwrap();
        let owned: ChainedSequenceContext = read_back.to_owned_table().unwrap();
        assert_eq!(&owned, context);
        bytes
    }

    #[test]
    fn format_3_round_trip() {
        let context = SequenceContext::format_3(
            vec![glyphs([1, 2]).into(), glyphs([5]).into()],
            vec![SequenceLookupRecord::new(1, 4)],
        );
        let bytes = round_trip(&context);
        let read_back = read_layout::SequenceContext::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.format(), 3);
    }

    #[test]
    fn format_2_round_trip() {
        let class_def = [(10u16, 1u16), (11, 1), (20, 2)]
            .map(|(gid, cls)| (GlyphId16::new(gid), cls))
            .into_iter()
            .collect::<ClassDefBuilder>()
            .build();
        let context = SequenceContext::format_2(
            glyphs([10, 11]).into(),
            class_def,
            vec![
                None,
                Some(ClassSequenceRuleSet::new(vec![ClassSequenceRule::new(
                    vec![2, 1],
                    vec![SequenceLookupRecord::new(2, 0)],
                )])),
            ],
        );
        assert!(context.validate().is_ok());
        round_trip(&context);
    }

    #[test]
    fn sequence_rule_indices_are_checked() {
        let context = SequenceContext::format_1(
            glyphs([7]).into(),
            vec![Some(SequenceRuleSet::new(vec![SequenceRule::new(
                glyphs([8]),
                vec![SequenceLookupRecord::new(2, 0)],
            )]))],
        );
        let report = context.validate().unwrap_err();
        assert!(report.to_string().contains("sequence index 2"), "{report}");
    }

    #[test]
    fn chained_format_1_layout() {
        let context = ChainedSequenceContext::format_1(
            glyphs([5]).into(),
            vec![Some(ChainedSequenceRuleSet::new(vec![
                ChainedSequenceRule::new(
                    glyphs([3]),
                    glyphs([6]),
                    glyphs([7, 8]),
                    vec![SequenceLookupRecord::new(0, 1)],
                ),
            ]))],
        );
        let bytes = chained_round_trip(&context);
        let read_back =
            read_layout::ChainedSequenceContext::read(FontData::new(&bytes)).unwrap();
        let read_layout::ChainedSequenceContext::Format1(table) = read_back else {
            panic!("expected format 1");
        };
        let set = table.chained_seq_rule_sets().get(0).unwrap().unwrap();
        let rule = set.rules().get(0).unwrap();
        assert_eq!(rule.backtrack_sequence()[0].get(), GlyphId16::new(3));
        assert_eq!(rule.input_glyph_count(), 2);
        assert_eq!(rule.lookahead_sequence().len(), 2);
    }

    #[test]
    fn chained_format_2_round_trip() {
        let classes = |pairs: &[(u16, u16)]| {
            pairs
                .iter()
                .map(|&(gid, cls)| (GlyphId16::new(gid), cls))
                .collect::<ClassDefBuilder>()
                .build()
        };
        let context = ChainedSequenceContext::format_2(
            glyphs([40]).into(),
            classes(&[(30, 1)]),
            classes(&[(40, 1), (41, 2)]),
            classes(&[]),
            vec![
                None,
                Some(ChainedClassSequenceRuleSet::new(vec![
                    ChainedClassSequenceRule::new(
                        vec![1],
                        vec![2],
                        vec![],
                        vec![SequenceLookupRecord::new(1, 3)],
                    ),
                ])),
            ],
        );
        assert!(context.validate().is_ok());
        chained_round_trip(&context);
    }

    #[test]
    fn chained_format_3_round_trip() {
        let context = ChainedSequenceContext::format_3(
            vec![glyphs([1]).into()],
            vec![glyphs([2, 3]).into()],
            vec![glyphs([4]).into(), glyphs([5]).into()],
            vec![SequenceLookupRecord::new(0, 2)],
        );
        chained_round_trip(&context);
    }

    #[test]
    fn chained_format_3_needs_input() {
        let context = ChainedSequenceContext::format_3(
            vec![glyphs([1]).into()],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let report = context.validate().unwrap_err();
        assert!(report.to_string().contains("at least one input coverage"), "{report}");
    }

    #[test]
    fn unreadable_rule_fails_conversion() {
        // format 1, coverage at 8, one rule set at 14 whose rule offset is
        // past the end of the data
        let bytes = sfnt_test_data::be_buffer! {
            1u16, 8u16, 1u16, 14u16,
            1u16, 1u16, 9u16,
            1u16, 0x40u16
        };
        let read_back = read_layout::SequenceContext::read(FontData::new(&bytes)).unwrap();
        let owned: Result<SequenceContext, _> = read_back.to_owned_table();
        assert_eq!(owned.err(), Some(ReadError::OutOfBounds));
    }
}
