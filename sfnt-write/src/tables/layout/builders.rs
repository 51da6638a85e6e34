//! Common utilities and helpers for constructing layout tables

use std::collections::BTreeMap;

use types::{GlyphId16, Tag};

use super::{
    ChainedSequenceContext, ChainedSequenceRule, ChainedSequenceRuleSet, ClassDef,
    ClassDefFormat1, ClassDefFormat2, ClassRangeRecord, CoverageFormat1, CoverageFormat2,
    CoverageTable, Feature, FeatureList, FeatureParams, FeatureRecord, LangSys, LangSysRecord,
    LookupList, RangeRecord, Script, ScriptList, ScriptRecord, SequenceContext,
    SequenceLookupRecord, SequenceRule, SequenceRuleSet,
};

/// A type that builds a single layout table or subtable.
pub trait Builder {
    type Output;

    fn build(self) -> Self::Output;
}

/// A builder for [ClassDef] tables.
///
/// This will choose the best format based for the included glyphs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDefBuilder {
    items: BTreeMap<GlyphId16, u16>,
}

impl ClassDefBuilder {
    /// Assign `glyph` to `class`.
    ///
    /// A glyph belongs to exactly one class; if it was already assigned a
    /// different class, the new assignment replaces it.
    pub fn add(&mut self, glyph: GlyphId16, class: u16) {
        if let Some(prev) = self.items.insert(glyph, class) {
            if prev != class {
                log::warn!("glyph {glyph} moved from class {prev} to class {class}");
            }
        }
    }

    /// The assigned classes, not including class 0.
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, u16)> + '_ {
        self.items
            .iter()
            .filter(|(_, cls)| **cls != 0)
            .map(|(gid, cls)| (*gid, *cls))
    }

    fn prefer_format_1(&self) -> bool {
        const U16_LEN: usize = std::mem::size_of::<u16>();
        const FORMAT1_HEADER_LEN: usize = U16_LEN * 3;
        const FORMAT2_HEADER_LEN: usize = U16_LEN * 2;
        const CLASS_RANGE_RECORD_LEN: usize = U16_LEN * 3;
        // format 2 is the most efficient way to represent an empty classdef
        let (Some(first), Some(last)) = (
            self.items.keys().next().copied(),
            self.items.keys().next_back().copied(),
        ) else {
            return false;
        };
        let format1_array_len = (last.to_u16() - first.to_u16()) as usize + 1;
        let len_format1 = FORMAT1_HEADER_LEN + format1_array_len * U16_LEN;
        let len_format2 =
            FORMAT2_HEADER_LEN + iter_class_ranges(&self.items).count() * CLASS_RANGE_RECORD_LEN;

        len_format1 <= len_format2
    }
}

impl Builder for ClassDefBuilder {
    type Output = ClassDef;

    fn build(mut self) -> ClassDef {
        // class 0 is implicit
        self.items.retain(|_, cls| *cls != 0);
        if self.prefer_format_1() {
            let first = self.items.keys().next().copied().unwrap_or(GlyphId16::NOTDEF);
            let last = self.items.keys().next_back().copied().unwrap_or(first);
            let class_value_array = (first.to_u16()..=last.to_u16())
                .map(|g| self.items.get(&GlyphId16::new(g)).copied().unwrap_or(0))
                .collect();
            log::debug!("classdef with {} glyphs as format 1", self.items.len());
            ClassDef::Format1(ClassDefFormat1 {
                start_glyph_id: first,
                class_value_array,
            })
        } else {
            ClassDef::Format2(ClassDefFormat2 {
                class_range_records: iter_class_ranges(&self.items).collect(),
            })
        }
    }
}

impl FromIterator<(GlyphId16, u16)> for ClassDefBuilder {
    fn from_iter<T: IntoIterator<Item = (GlyphId16, u16)>>(iter: T) -> Self {
        let mut builder = ClassDefBuilder::default();
        builder.extend(iter);
        builder
    }
}

impl Extend<(GlyphId16, u16)> for ClassDefBuilder {
    fn extend<T: IntoIterator<Item = (GlyphId16, u16)>>(&mut self, iter: T) {
        for (glyph, class) in iter {
            self.add(glyph, class);
        }
    }
}

/// A builder for [CoverageTable] tables.
///
/// This will choose the best format based for the included glyphs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageTableBuilder {
    // invariant: is always sorted
    glyphs: Vec<GlyphId16>,
}

impl CoverageTableBuilder {
    /// Create a new builder from some glyphs, in any order.
    pub fn from_glyphs(glyphs: impl IntoIterator<Item = GlyphId16>) -> Self {
        let mut glyphs = glyphs.into_iter().collect::<Vec<_>>();
        glyphs.sort_unstable();
        glyphs.dedup();
        CoverageTableBuilder { glyphs }
    }

    /// Add a `GlyphId16` to this coverage table.
    ///
    /// Returns the coverage index of the added glyph, saturating at
    /// `u16::MAX`. Indices of glyphs added earlier may shift.
    ///
    /// If the glyph already exists, this returns its current index.
    pub fn add(&mut self, glyph: GlyphId16) -> u16 {
        let ix = match self.glyphs.binary_search(&glyph) {
            Ok(ix) => ix,
            Err(ix) => {
                self.glyphs.insert(ix, glyph);
                ix
            }
        };
        u16::try_from(ix).unwrap_or(u16::MAX)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[GlyphId16] {
        &self.glyphs
    }
}

impl Builder for CoverageTableBuilder {
    type Output = CoverageTable;

    /// Convert this builder into the appropriate [CoverageTable] variant.
    fn build(self) -> CoverageTable {
        if should_choose_coverage_format_2(&self.glyphs) {
            log::debug!("coverage with {} glyphs as format 2", self.glyphs.len());
            CoverageTable::Format2(CoverageFormat2 {
                range_records: RangeRecord::iter_for_glyphs(&self.glyphs).collect(),
            })
        } else {
            CoverageTable::Format1(CoverageFormat1 {
                glyph_array: self.glyphs,
            })
        }
    }
}

impl FromIterator<GlyphId16> for CoverageTableBuilder {
    fn from_iter<T: IntoIterator<Item = GlyphId16>>(iter: T) -> Self {
        CoverageTableBuilder::from_glyphs(iter)
    }
}

impl Extend<GlyphId16> for CoverageTableBuilder {
    fn extend<T: IntoIterator<Item = GlyphId16>>(&mut self, iter: T) {
        self.glyphs.extend(iter);
        self.glyphs.sort_unstable();
        self.glyphs.dedup();
    }
}

impl From<&CoverageTable> for CoverageTableBuilder {
    fn from(src: &CoverageTable) -> Self {
        CoverageTableBuilder::from_glyphs(src.iter())
    }
}

/// Add `rule` to the rules of its first glyph, replacing a rule that
/// matches the same context.
fn insert_rule<R: PartialEq>(
    rules: &mut BTreeMap<GlyphId16, Vec<R>>,
    first: GlyphId16,
    rule: R,
    same_context: impl Fn(&R, &R) -> bool,
) {
    let set = rules.entry(first).or_default();
    match set.iter_mut().find(|existing| same_context(existing, &rule)) {
        Some(existing) => {
            if *existing != rule {
                log::warn!("context rule starting with glyph {first} redefined");
            }
            *existing = rule;
        }
        None => set.push(rule),
    }
}

/// A builder for glyph-based (format 1) [SequenceContext] tables.
///
/// Rules are grouped by their first input glyph, which makes up the
/// coverage. Within a rule set, rules keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct SequenceContextBuilder {
    rules: BTreeMap<GlyphId16, Vec<SequenceRule>>,
}

impl SequenceContextBuilder {
    /// Apply `lookups` wherever the glyph sequence `input` matches.
    ///
    /// A rule with no input glyphs is ignored.
    pub fn add_rule(&mut self, input: &[GlyphId16], lookups: Vec<SequenceLookupRecord>) {
        let Some((first, rest)) = input.split_first() else {
            log::warn!("ignoring context rule with no input glyphs");
            return;
        };
        insert_rule(
            &mut self.rules,
            *first,
            SequenceRule::new(rest.to_vec(), lookups),
            |a, b| a.input_sequence == b.input_sequence,
        );
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Builder for SequenceContextBuilder {
    type Output = Option<SequenceContext>;

    fn build(self) -> Self::Output {
        if self.is_empty() {
            return None;
        }
        let coverage = self.rules.keys().copied().collect();
        let rule_sets = self
            .rules
            .into_values()
            .map(|rules| Some(SequenceRuleSet::new(rules)))
            .collect();
        Some(SequenceContext::format_1(coverage, rule_sets))
    }
}

/// A builder for glyph-based (format 1) [ChainedSequenceContext] tables.
#[derive(Clone, Debug, Default)]
pub struct ChainedSequenceContextBuilder {
    rules: BTreeMap<GlyphId16, Vec<ChainedSequenceRule>>,
}

impl ChainedSequenceContextBuilder {
    /// Apply `lookups` wherever `input` matches between `backtrack` and
    /// `lookahead`.
    ///
    /// `backtrack` is in logical order; it is reversed when stored. A rule
    /// with no input glyphs is ignored.
    pub fn add_rule(
        &mut self,
        backtrack: &[GlyphId16],
        input: &[GlyphId16],
        lookahead: &[GlyphId16],
        lookups: Vec<SequenceLookupRecord>,
    ) {
        let Some((first, rest)) = input.split_first() else {
            log::warn!("ignoring chained context rule with no input glyphs");
            return;
        };
        let rule = ChainedSequenceRule::new(
            backtrack.iter().rev().copied().collect(),
            rest.to_vec(),
            lookahead.to_vec(),
            lookups,
        );
        insert_rule(&mut self.rules, *first, rule, |a, b| {
            a.backtrack_sequence == b.backtrack_sequence
                && a.input_sequence == b.input_sequence
                && a.lookahead_sequence == b.lookahead_sequence
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Builder for ChainedSequenceContextBuilder {
    type Output = Option<ChainedSequenceContext>;

    fn build(self) -> Self::Output {
        if self.is_empty() {
            return None;
        }
        let coverage = self.rules.keys().copied().collect();
        let rule_sets = self
            .rules
            .into_values()
            .map(|rules| Some(ChainedSequenceRuleSet::new(rules)))
            .collect();
        Some(ChainedSequenceContext::format_1(coverage, rule_sets))
    }
}

fn iter_class_ranges(
    values: &BTreeMap<GlyphId16, u16>,
) -> impl Iterator<Item = ClassRangeRecord> + '_ {
    let mut iter = values.iter();
    let mut prev = None;

    #[allow(clippy::while_let_on_iterator)]
    std::iter::from_fn(move || {
        while let Some((gid, class)) = iter.next() {
            match prev.take() {
                None => prev = Some((*gid, *gid, *class)),
                Some((start, end, pclass))
                    if super::are_sequential(end, *gid) && pclass == *class =>
                {
                    prev = Some((start, *gid, pclass))
                }
                Some((start_glyph_id, end_glyph_id, pclass)) => {
                    prev = Some((*gid, *gid, *class));
                    return Some(ClassRangeRecord::new(start_glyph_id, end_glyph_id, pclass));
                }
            }
        }
        prev.take()
            .map(|(start, end, class)| ClassRangeRecord::new(start, end, class))
    })
}

fn should_choose_coverage_format_2(glyphs: &[GlyphId16]) -> bool {
    let format2_len = 4 + RangeRecord::iter_for_glyphs(glyphs).count() * 6;
    let format1_len = 4 + glyphs.len() * 2;
    format2_len < format1_len
}

/// An error that occurs when resolving the references in a [LayoutBuilder].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// A language system references a feature that was never added.
    UnknownFeature(Tag),
    /// A feature references a lookup that this builder did not create.
    UnknownLookup { feature: Tag, lookup: LookupId },
    /// A feature's parameters are present but empty.
    EmptyFeatureParams(Tag),
    /// There are more features or lookups than a 16-bit index can address.
    TooManyItems(&'static str),
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::UnknownFeature(tag) => write!(f, "reference to unknown feature '{tag}'"),
            LayoutError::UnknownLookup { feature, lookup } => write!(
                f,
                "feature '{feature}' references unknown lookup {}",
                lookup.0
            ),
            LayoutError::EmptyFeatureParams(tag) => {
                write!(f, "feature '{tag}' has empty parameters")
            }
            LayoutError::TooManyItems(what) => write!(f, "too many {what}"),
        }
    }
}

impl std::error::Error for LayoutError {}

/// A handle to a lookup added to a [LayoutBuilder].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupId(usize);

impl LookupId {
    /// The index of this lookup in the final lookup list.
    pub fn to_raw(self) -> usize {
        self.0
    }
}

/// Builds the script, feature and lookup lists shared by GSUB and GPOS.
///
/// Lookups are added first, and referenced by handle; features are
/// referenced by tag. All references are resolved to indices in
/// [`build`](LayoutBuilder::build).
#[derive(Clone, Debug)]
pub struct LayoutBuilder<L> {
    pub lookups: LookupsBuilder<L>,
    pub features: FeaturesBuilder,
    pub scripts: ScriptsBuilder,
}

#[derive(Clone, Debug)]
pub struct LookupsBuilder<L> {
    lookups: Vec<L>,
}

#[derive(Clone, Debug, Default)]
pub struct FeaturesBuilder {
    features: BTreeMap<Tag, FeatureBuilder>,
}

#[derive(Clone, Debug, Default)]
pub struct FeatureBuilder {
    lookups: Vec<LookupId>,
    params: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
pub struct ScriptsBuilder {
    scripts: BTreeMap<Tag, ScriptBuilder>,
}

#[derive(Clone, Debug, Default)]
pub struct ScriptBuilder {
    default_lang_sys: Option<LangSysBuilder>,
    lang_sys: BTreeMap<Tag, LangSysBuilder>,
}

#[derive(Clone, Debug, Default)]
pub struct LangSysBuilder {
    required_feature: Option<Tag>,
    features: Vec<Tag>,
}

impl<L> Default for LayoutBuilder<L> {
    fn default() -> Self {
        Self {
            lookups: LookupsBuilder::default(),
            features: FeaturesBuilder::default(),
            scripts: ScriptsBuilder::default(),
        }
    }
}

impl<L> Default for LookupsBuilder<L> {
    fn default() -> Self {
        Self {
            lookups: Vec::new(),
        }
    }
}

impl<L> LookupsBuilder<L> {
    /// Add a lookup, returning a handle that features can reference.
    pub fn push(&mut self, lookup: L) -> LookupId {
        self.lookups.push(lookup);
        LookupId(self.lookups.len() - 1)
    }

    pub fn get_mut(&mut self, id: LookupId) -> Option<&mut L> {
        self.lookups.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl FeaturesBuilder {
    pub fn get_or_add(&mut self, tag: Tag) -> &mut FeatureBuilder {
        self.features.entry(tag).or_default()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.features.contains_key(&tag)
    }
}

impl FeatureBuilder {
    /// Append a lookup to this feature; a repeated lookup is ignored.
    pub fn add_lookup(&mut self, lookup: LookupId) -> &mut Self {
        if !self.lookups.contains(&lookup) {
            self.lookups.push(lookup);
        }
        self
    }

    /// Set the raw bytes of this feature's parameters table.
    pub fn set_params(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.params = Some(bytes.into());
        self
    }

    pub fn clear_params(&mut self) -> &mut Self {
        self.params = None;
        self
    }
}

impl ScriptsBuilder {
    pub fn get_or_add(&mut self, tag: Tag) -> &mut ScriptBuilder {
        self.scripts.entry(tag).or_default()
    }
}

impl ScriptBuilder {
    pub fn default_lang_sys_mut(&mut self) -> &mut LangSysBuilder {
        self.default_lang_sys.get_or_insert_with(Default::default)
    }

    pub fn get_or_add_lang_sys(&mut self, tag: Tag) -> &mut LangSysBuilder {
        self.lang_sys.entry(tag).or_default()
    }
}

impl LangSysBuilder {
    pub fn set_required_feature(&mut self, feature: Tag) -> &mut Self {
        self.required_feature = Some(feature);
        self
    }

    /// Append a feature; the order of calls is kept and repeats are ignored.
    pub fn add_feature(&mut self, feature: Tag) -> &mut Self {
        if !self.features.contains(&feature) {
            self.features.push(feature);
        }
        self
    }

    fn build(&self, feature_indices: &BTreeMap<Tag, u16>) -> Result<LangSys, LayoutError> {
        let index_for = |tag: &Tag| {
            feature_indices
                .get(tag)
                .copied()
                .ok_or(LayoutError::UnknownFeature(*tag))
        };
        let required_feature_index = match &self.required_feature {
            Some(tag) => index_for(tag)?,
            None => LangSys::NO_REQUIRED_FEATURE,
        };
        let feature_indices = self
            .features
            .iter()
            .map(index_for)
            .collect::<Result<_, _>>()?;
        Ok(LangSys {
            required_feature_index,
            feature_indices,
        })
    }
}

impl<L> LayoutBuilder<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve all references, producing the three layout lists.
    ///
    /// Scripts, language systems and features are sorted by tag.
    pub fn build(self) -> Result<(ScriptList, FeatureList, LookupList<L>), LayoutError> {
        let LayoutBuilder {
            lookups,
            features,
            scripts,
        } = self;
        let lookup_count = lookups.lookups.len();
        if lookup_count > u16::MAX as usize {
            return Err(LayoutError::TooManyItems("lookups"));
        }

        let feature_indices = features
            .features
            .keys()
            .enumerate()
            .map(|(i, tag)| {
                u16::try_from(i)
                    .map(|i| (*tag, i))
                    .map_err(|_| LayoutError::TooManyItems("features"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let feature_records = features
            .features
            .into_iter()
            .map(|(tag, feature)| {
                let lookup_list_indices = feature
                    .lookups
                    .iter()
                    .map(|id| {
                        u16::try_from(id.0)
                            .ok()
                            .filter(|_| id.0 < lookup_count)
                            .ok_or(LayoutError::UnknownLookup {
                                feature: tag,
                                lookup: *id,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let params = match feature.params {
                    Some(bytes) if bytes.is_empty() => {
                        return Err(LayoutError::EmptyFeatureParams(tag))
                    }
                    other => other.map(FeatureParams::new),
                };
                Ok(FeatureRecord::new(
                    tag,
                    Feature::new(params, lookup_list_indices),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let script_records = scripts
            .scripts
            .into_iter()
            .map(|(tag, script)| {
                let default_lang_sys = script
                    .default_lang_sys
                    .as_ref()
                    .map(|lang_sys| lang_sys.build(&feature_indices))
                    .transpose()?;
                let lang_sys_records = script
                    .lang_sys
                    .iter()
                    .map(|(tag, lang_sys)| {
                        lang_sys
                            .build(&feature_indices)
                            .map(|lang_sys| LangSysRecord::new(*tag, lang_sys))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ScriptRecord::new(
                    tag,
                    Script::new(default_lang_sys, lang_sys_records),
                ))
            })
            .collect::<Result<Vec<_>, LayoutError>>()?;

        log::debug!(
            "built layout with {} scripts, {} features, {lookup_count} lookups",
            script_records.len(),
            feature_records.len(),
        );
        Ok((
            ScriptList::new(script_records),
            FeatureList::new(feature_records),
            LookupList::new(lookups.lookups),
        ))
    }
}
