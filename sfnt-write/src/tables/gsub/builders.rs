//! Builders for the glyph-to-glyph GSUB lookups
//!
//! Each builder collects rules keyed by their first glyph. Rules for a glyph
//! that already has one replace it, with a warning if the two differ.
//! Building packs the rules into as many subtables as are needed to keep
//! every subtable addressable with 16-bit offsets.

use std::collections::BTreeMap;

use types::{FixedSize, GlyphId16, Offset16};

use super::{
    AlternateSet, AlternateSubstFormat1, Ligature, LigatureSet, LigatureSubstFormat1,
    MultipleSubstFormat1, Sequence, SingleSubst,
};
use crate::tables::layout::{builders::Builder, CoverageTable};

const MAX_SUBTABLE_LEN: usize = u16::MAX as usize;

// format, coverage offset and count, plus the header of a format 1 coverage
const SUBTABLE_HEADER_LEN: usize = u16::RAW_BYTE_LEN * 3 + u16::RAW_BYTE_LEN * 2;

/// Group per-glyph entries into runs that each fit in one subtable.
///
/// `entry_len` is the number of bytes an entry adds to the subtable, not
/// counting its slot in the coverage table.
fn pack_entries<T>(
    entries: impl IntoIterator<Item = (GlyphId16, T)>,
    entry_len: impl Fn(&T) -> usize,
) -> Vec<(CoverageTable, Vec<T>)> {
    let mut runs = Vec::new();
    let mut glyphs = Vec::new();
    let mut items = Vec::new();
    let mut len = SUBTABLE_HEADER_LEN;
    for (glyph, entry) in entries {
        let cost = entry_len(&entry) + GlyphId16::RAW_BYTE_LEN;
        if !items.is_empty() && len + cost > MAX_SUBTABLE_LEN {
            log::debug!("starting a new subtable after {} glyphs", glyphs.len());
            runs.push((std::mem::take(&mut glyphs).into(), std::mem::take(&mut items)));
            len = SUBTABLE_HEADER_LEN;
        }
        len += cost;
        glyphs.push(glyph);
        items.push(entry);
    }
    if !items.is_empty() {
        runs.push((glyphs.into(), items));
    }
    runs
}

fn sequence_len(glyphs: &[GlyphId16]) -> usize {
    Offset16::RAW_BYTE_LEN + u16::RAW_BYTE_LEN + GlyphId16::RAW_BYTE_LEN * glyphs.len()
}

fn replace_rule<T: PartialEq + std::fmt::Debug>(
    rules: &mut BTreeMap<GlyphId16, T>,
    target: GlyphId16,
    replacement: T,
) {
    if let Some(prev) = rules.get(&target).filter(|prev| **prev != replacement) {
        log::warn!("substitution for glyph {target} changed from {prev:?} to {replacement:?}");
    }
    rules.insert(target, replacement);
}

/// Builds [`SingleSubst`] subtables, picking format 1 when every glyph moves
/// by the same delta.
#[derive(Clone, Debug, Default)]
pub struct SingleSubBuilder {
    rules: BTreeMap<GlyphId16, GlyphId16>,
}

impl SingleSubBuilder {
    /// Substitute `target` with `replacement`.
    pub fn insert(&mut self, target: GlyphId16, replacement: GlyphId16) {
        replace_rule(&mut self.rules, target, replacement);
    }

    /// The replacement currently recorded for `target`.
    pub fn get(&self, target: GlyphId16) -> Option<GlyphId16> {
        self.rules.get(&target).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, GlyphId16)> + '_ {
        self.rules.iter().map(|(target, alt)| (*target, *alt))
    }

    fn common_delta(&self) -> Option<i16> {
        let mut deltas = self
            .rules
            .iter()
            .map(|(target, alt)| alt.to_u16() as i32 - target.to_u16() as i32);
        let first = deltas.next()?;
        if deltas.all(|delta| delta == first) {
            i16::try_from(first).ok()
        } else {
            None
        }
    }
}

impl Builder for SingleSubBuilder {
    type Output = Vec<SingleSubst>;

    fn build(self) -> Self::Output {
        if let Some(delta) = self.common_delta() {
            return vec![SingleSubst::format_1(
                self.rules.into_keys().collect(),
                delta,
            )];
        }
        pack_entries(self.rules, |_| GlyphId16::RAW_BYTE_LEN)
            .into_iter()
            .map(|(coverage, glyphs)| SingleSubst::format_2(coverage, glyphs))
            .collect()
    }
}

/// Builds [`MultipleSubstFormat1`] subtables.
#[derive(Clone, Debug, Default)]
pub struct MultipleSubBuilder {
    rules: BTreeMap<GlyphId16, Vec<GlyphId16>>,
}

impl MultipleSubBuilder {
    /// Substitute `target` with the sequence `replacement`.
    pub fn insert(&mut self, target: GlyphId16, replacement: Vec<GlyphId16>) {
        replace_rule(&mut self.rules, target, replacement);
    }

    pub fn get(&self, target: GlyphId16) -> Option<&[GlyphId16]> {
        self.rules.get(&target).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, &[GlyphId16])> {
        self.rules.iter().map(|(target, seq)| (*target, seq.as_slice()))
    }
}

impl Builder for MultipleSubBuilder {
    type Output = Vec<MultipleSubstFormat1>;

    fn build(self) -> Self::Output {
        pack_entries(self.rules, |seq| sequence_len(seq))
            .into_iter()
            .map(|(coverage, seqs)| {
                MultipleSubstFormat1::new(coverage, seqs.into_iter().map(Sequence::new).collect())
            })
            .collect()
    }
}

/// Builds [`AlternateSubstFormat1`] subtables.
#[derive(Clone, Debug, Default)]
pub struct AlternateSubBuilder {
    rules: BTreeMap<GlyphId16, Vec<GlyphId16>>,
}

impl AlternateSubBuilder {
    /// Offer `alternates` for `target`, in order of preference.
    pub fn insert(&mut self, target: GlyphId16, alternates: Vec<GlyphId16>) {
        replace_rule(&mut self.rules, target, alternates);
    }

    pub fn get(&self, target: GlyphId16) -> Option<&[GlyphId16]> {
        self.rules.get(&target).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, &[GlyphId16])> {
        self.rules.iter().map(|(target, alts)| (*target, alts.as_slice()))
    }
}

impl Builder for AlternateSubBuilder {
    type Output = Vec<AlternateSubstFormat1>;

    fn build(self) -> Self::Output {
        pack_entries(self.rules, |alts| sequence_len(alts))
            .into_iter()
            .map(|(coverage, alts)| {
                AlternateSubstFormat1::new(
                    coverage,
                    alts.into_iter().map(AlternateSet::new).collect(),
                )
            })
            .collect()
    }
}

/// Builds [`LigatureSubstFormat1`] subtables.
///
/// Within the set for a first glyph, longer ligatures are placed before
/// shorter ones; ligatures of equal length keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct LigatureSubBuilder {
    // first glyph -> (remaining components, ligature glyph)
    rules: BTreeMap<GlyphId16, Vec<(Vec<GlyphId16>, GlyphId16)>>,
}

impl LigatureSubBuilder {
    /// Substitute the sequence `components` with `ligature`.
    ///
    /// An empty sequence is ignored.
    pub fn insert(&mut self, components: Vec<GlyphId16>, ligature: GlyphId16) {
        let Some((first, rest)) = components.split_first() else {
            log::warn!("ignoring ligature {ligature} with no components");
            return;
        };
        let set = self.rules.entry(*first).or_default();
        match set.iter_mut().find(|(existing, _)| existing == rest) {
            Some((_, prev)) if *prev != ligature => {
                log::warn!("ligature for {components:?} changed from {prev} to {ligature}");
                *prev = ligature;
            }
            Some(_) => (),
            None => set.push((rest.to_owned(), ligature)),
        }
    }

    /// The ligature currently recorded for `components`.
    pub fn get(&self, components: &[GlyphId16]) -> Option<GlyphId16> {
        let (first, rest) = components.split_first()?;
        self.rules
            .get(first)?
            .iter()
            .find_map(|(seq, lig)| (seq == rest).then_some(*lig))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules as `(components, ligature)`.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<GlyphId16>, GlyphId16)> + '_ {
        self.rules.iter().flat_map(|(first, set)| {
            set.iter().map(|(rest, lig)| {
                let mut components = vec![*first];
                components.extend_from_slice(rest);
                (components, *lig)
            })
        })
    }
}

impl Builder for LigatureSubBuilder {
    type Output = Vec<LigatureSubstFormat1>;

    fn build(self) -> Self::Output {
        let sets = self.rules.into_iter().map(|(first, mut ligs)| {
            ligs.sort_by_key(|(rest, _)| std::cmp::Reverse(rest.len()));
            let set = LigatureSet::new(
                ligs.into_iter()
                    .map(|(rest, lig)| Ligature::new(lig, rest))
                    .collect(),
            );
            (first, set)
        });
        pack_entries(sets, |set| Offset16::RAW_BYTE_LEN + set.byte_len())
            .into_iter()
            .map(|(coverage, sets)| LigatureSubstFormat1::new(coverage, sets))
            .collect()
    }
}

impl LigatureSet {
    fn byte_len(&self) -> usize {
        let ligs = self
            .ligatures
            .iter()
            .map(|lig| {
                // glyph, count, components
                u16::RAW_BYTE_LEN * 2 + GlyphId16::RAW_BYTE_LEN * lig.component_glyph_ids.len()
            })
            .sum::<usize>();
        u16::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN * self.ligatures.len() + ligs
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{dump_table, validate::Validate};

    fn gids<const N: usize>(raw: [u16; N]) -> Vec<GlyphId16> {
        raw.into_iter().map(GlyphId16::new).collect()
    }

    fn gid(raw: u16) -> GlyphId16 {
        GlyphId16::new(raw)
    }

    #[test]
    fn ligature_set_len_matches_output() {
        for n_components in [1u16, 2, 17, 400] {
            let set = LigatureSet::new(vec![
                Ligature::new(gid(3), (1..n_components).map(gid).collect()),
                Ligature::new(gid(4), vec![gid(9)]),
            ]);
            assert_eq!(dump_table(&set).unwrap().len(), set.byte_len());
        }
    }

    #[test]
    fn packing_starts_new_runs_when_full() {
        let entries = (0u16..10).map(|g| (gid(g), g));
        let runs = pack_entries(entries, |_| 16_000);
        let glyphs_per_run = runs
            .iter()
            .map(|(coverage, items)| {
                assert_eq!(coverage.len(), items.len());
                items.len()
            })
            .collect::<Vec<_>>();
        assert_eq!(glyphs_per_run, [4, 4, 2]);
        assert_eq!(runs[1].1[0], 4);
        assert!(pack_entries(std::iter::empty::<(GlyphId16, ())>(), |_| 0).is_empty());
    }

    #[test]
    fn single_sub_common_delta() {
        let mut builder = SingleSubBuilder::default();
        builder.insert(gid(10), gid(15));
        builder.insert(gid(20), gid(25));
        let built = builder.build();
        assert!(matches!(
            built.as_slice(),
            [SingleSubst::Format1(table)] if table.delta_glyph_id == 5
        ));
    }

    #[test]
    fn single_sub_negative_delta() {
        let mut builder = SingleSubBuilder::default();
        builder.insert(gid(30), gid(10));
        builder.insert(gid(40), gid(20));
        assert_eq!(builder.common_delta(), Some(-20));
    }

    #[test]
    fn single_sub_no_common_delta() {
        let mut builder = SingleSubBuilder::default();
        builder.insert(gid(10), gid(15));
        builder.insert(gid(20), gid(2));
        let built = builder.build();
        let [SingleSubst::Format2(table)] = built.as_slice() else {
            panic!("expected format 2: {built:?}");
        };
        assert_eq!(table.substitute_glyph_ids, gids([15, 2]));
    }

    #[test]
    fn large_single_sub_is_split() {
        let mut builder = SingleSubBuilder::default();
        for g in 0..20_000u16 {
            // alternate deltas so no format 1 is possible
            builder.insert(gid(g), gid(if g % 2 == 0 { g + 1 } else { g + 3 }));
        }
        let built = builder.build();
        assert_eq!(built.len(), 2);
        for subtable in &built {
            assert!(subtable.validate().is_ok());
            assert!(dump_table(subtable).unwrap().len() <= MAX_SUBTABLE_LEN);
        }
    }

    #[test]
    fn later_rule_wins() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut single = SingleSubBuilder::default();
        single.insert(gid(3), gid(4));
        single.insert(gid(3), gid(5));
        assert_eq!(single.get(gid(3)), Some(gid(5)));
        assert_eq!(single.len(), 1);

        let mut multi = MultipleSubBuilder::default();
        multi.insert(gid(3), gids([1, 2]));
        multi.insert(gid(3), gids([7]));
        assert_eq!(multi.get(gid(3)), Some(gids([7]).as_slice()));

        let mut alt = AlternateSubBuilder::default();
        alt.insert(gid(3), gids([8, 9]));
        alt.insert(gid(3), gids([8, 9]));
        alt.insert(gid(4), gids([10]));
        alt.insert(gid(4), gids([11, 12]));
        assert_eq!(alt.get(gid(3)), Some(gids([8, 9]).as_slice()));
        assert_eq!(alt.get(gid(4)), Some(gids([11, 12]).as_slice()));

        let mut ligs = LigatureSubBuilder::default();
        ligs.insert(gids([1, 2]), gid(100));
        ligs.insert(gids([1, 3]), gid(101));
        ligs.insert(gids([1, 2]), gid(102));
        assert_eq!(ligs.get(&gids([1, 2])), Some(gid(102)));
        assert_eq!(
            ligs.iter().collect::<Vec<_>>(),
            [(gids([1, 2]), gid(102)), (gids([1, 3]), gid(101))]
        );
    }

    #[test]
    fn empty_builders_produce_nothing() {
        assert!(SingleSubBuilder::default().build().is_empty());
        assert!(MultipleSubBuilder::default().build().is_empty());
        assert!(AlternateSubBuilder::default().build().is_empty());
        assert!(LigatureSubBuilder::default().build().is_empty());
    }

    #[test]
    fn multiple_and_alternate() {
        let mut multi = MultipleSubBuilder::default();
        multi.insert(gid(8), gids([1, 2]));
        multi.insert(gid(3), gids([4]));
        let built = multi.build();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].coverage.iter().collect::<Vec<_>>(), gids([3, 8]));
        assert_eq!(built[0].sequences[1].substitute_glyph_ids, gids([1, 2]));
        assert!(built[0].validate().is_ok());

        let mut alt = AlternateSubBuilder::default();
        alt.insert(gid(5), gids([50, 51]));
        assert_eq!(
            alt.iter().collect::<Vec<_>>(),
            [(gid(5), gids([50, 51]).as_slice())]
        );
        let built = alt.build();
        assert_eq!(built[0].alternate_sets[0].alternate_glyph_ids, gids([50, 51]));
    }

    #[test]
    fn ligatures_longest_first() {
        let mut builder = LigatureSubBuilder::default();
        builder.insert(gids([1, 2]), gid(100));
        builder.insert(gids([1, 2, 3]), gid(101));
        builder.insert(gids([1, 4]), gid(102));
        builder.insert(gids([1, 2]), gid(100));
        builder.insert(gids([7, 8]), gid(103));
        builder.insert(Vec::new(), gid(104));
        assert_eq!(builder.get(&[]), None);

        let built = builder.build();
        assert_eq!(built.len(), 1);
        let ligs = built[0].ligature_sets[0]
            .ligatures
            .iter()
            .map(|lig| lig.ligature_glyph.to_u16())
            .collect::<Vec<_>>();
        assert_eq!(ligs, [101, 100, 102]);
        assert_eq!(built[0].coverage.iter().collect::<Vec<_>>(), gids([1, 7]));
    }

    #[test]
    fn long_ligatures_are_split() {
        let mut builder = LigatureSubBuilder::default();
        for first in 0..40u16 {
            let mut components = vec![gid(first)];
            components.extend((1000..1999).map(gid));
            builder.insert(components, gid(3000 + first));
        }
        let built = builder.build();
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].ligature_sets.len(), 32);
        assert_eq!(built[1].coverage.iter().next(), Some(gid(32)));
        for subtable in &built {
            assert!(dump_table(subtable).unwrap().len() <= MAX_SUBTABLE_LEN);
        }
    }
}
