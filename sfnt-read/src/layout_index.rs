//! A decoded index of the scripts, features and lookups of a layout table
//!
//! Read views re-derive everything on each access; when the same table is
//! queried repeatedly (for instance when selecting lookups for many runs of
//! text) it is cheaper to decode the lists once.

use types::{Nullable, Offset16, Tag};

use crate::tables::layout::{LangSys, LayoutTable, LookupFlag, Script};
use crate::ReadError;

const DFLT: Tag = Tag::new(b"DFLT");

/// The decoded header of a single lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupEntry {
    pub lookup_type: u16,
    pub lookup_flag: LookupFlag,
    pub subtable_count: u16,
    pub mark_filtering_set: Option<u16>,
}

/// A decoded feature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureEntry {
    pub tag: Tag,
    /// The offset of the feature params, relative to the feature table.
    pub params_offset: Nullable<Offset16>,
    pub lookup_indices: Vec<u16>,
}

/// A decoded language system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LangSysEntry {
    pub required_feature: Option<u16>,
    pub feature_indices: Vec<u16>,
}

/// A decoded script, with its language systems sorted by tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptEntry {
    pub tag: Tag,
    pub default_lang_sys: Option<LangSysEntry>,
    pub lang_systems: Vec<(Tag, LangSysEntry)>,
}

impl ScriptEntry {
    /// The language system with this tag, if present.
    pub fn lang_sys(&self, tag: Tag) -> Option<&LangSysEntry> {
        self.lang_systems
            .binary_search_by_key(&tag, |(tag, _)| *tag)
            .ok()
            .map(|idx| &self.lang_systems[idx].1)
    }
}

/// The scripts, features and lookups of a `GSUB` or `GPOS` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutIndex {
    lookups: Vec<LookupEntry>,
    features: Vec<FeatureEntry>,
    scripts: Vec<ScriptEntry>,
}

impl LayoutIndex {
    /// Decode the lists of a layout table.
    ///
    /// Subtables are not read.
    pub fn new<'a>(table: &impl LayoutTable<'a>) -> Result<Self, ReadError> {
        let lookups = table
            .lookup_list()?
            .iter()
            .map(|lookup| {
                lookup.map(|lookup| LookupEntry {
                    lookup_type: lookup.lookup_type(),
                    lookup_flag: lookup.lookup_flag(),
                    subtable_count: lookup.subtable_count(),
                    mark_filtering_set: lookup.mark_filtering_set(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let feature_list = table.feature_list()?;
        let features = (0..feature_list.feature_count())
            .map(|i| {
                feature_list.get(i).map(|feature| FeatureEntry {
                    tag: feature.tag,
                    params_offset: feature.feature_params_offset(),
                    lookup_indices: collect_u16s(feature.lookup_list_indices()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let script_list = table.script_list()?;
        let mut scripts = (0..script_list.script_count())
            .map(|i| {
                let script = script_list.get(i)?;
                decode_script(script.tag, &script)
            })
            .collect::<Result<Vec<_>, _>>()?;
        scripts.sort_by_key(|script| script.tag);

        Ok(LayoutIndex {
            lookups,
            features,
            scripts,
        })
    }

    pub fn lookups(&self) -> &[LookupEntry] {
        &self.lookups
    }

    pub fn features(&self) -> &[FeatureEntry] {
        &self.features
    }

    /// The scripts, sorted by tag.
    pub fn scripts(&self) -> &[ScriptEntry] {
        &self.scripts
    }

    /// The script with this tag, if present.
    pub fn script(&self, tag: Tag) -> Option<&ScriptEntry> {
        self.scripts
            .binary_search_by_key(&tag, |script| script.tag)
            .ok()
            .map(|idx| &self.scripts[idx])
    }

    /// The script with this tag, or the `DFLT` script if it is absent.
    pub fn script_or_default(&self, tag: Tag) -> Option<&ScriptEntry> {
        self.script(tag).or_else(|| self.script(DFLT))
    }

    /// The language system for this script and language.
    ///
    /// Falls back to the `DFLT` script if the script is missing, and to the
    /// script's default language system if the language is missing or `None`.
    pub fn lang_sys(&self, script: Tag, lang: Option<Tag>) -> Option<&LangSysEntry> {
        let script = self.script_or_default(script)?;
        lang.and_then(|lang| script.lang_sys(lang))
            .or(script.default_lang_sys.as_ref())
    }

    /// The lookups to apply for this script and language, in feature order.
    ///
    /// The lookups of the required feature come first and are never filtered.
    /// The remaining features are visited in language system order, and are
    /// skipped unless their tag is in `enabled_features`; an empty
    /// `enabled_features` enables every feature.
    ///
    /// Iteration stops at the first feature or lookup index that is out of
    /// range for this table.
    pub fn lookup_indices<'a>(
        &'a self,
        script: Tag,
        lang: Option<Tag>,
        enabled_features: &'a [Tag],
    ) -> impl Iterator<Item = u16> + 'a {
        let lang_sys = self.lang_sys(script, lang);
        let required = lang_sys.and_then(|lang_sys| lang_sys.required_feature);
        let optional = lang_sys
            .into_iter()
            .flat_map(|lang_sys| lang_sys.feature_indices.iter().copied())
            .filter(move |idx| Some(*idx) != required);

        required
            .into_iter()
            .map(|idx| (idx, true))
            .chain(optional.map(|idx| (idx, false)))
            .map_while(move |(idx, is_required)| {
                self.features
                    .get(idx as usize)
                    .map(|feature| (feature, is_required))
            })
            .filter(move |(feature, is_required)| {
                *is_required
                    || enabled_features.is_empty()
                    || enabled_features.contains(&feature.tag)
            })
            .flat_map(|(feature, _)| feature.lookup_indices.iter().copied())
            .map_while(move |idx| ((idx as usize) < self.lookups.len()).then_some(idx))
    }
}

fn collect_u16s(raw: &[types::BigEndian<u16>]) -> Vec<u16> {
    raw.iter().map(|idx| idx.get()).collect()
}

fn decode_lang_sys(lang_sys: &LangSys) -> LangSysEntry {
    LangSysEntry {
        required_feature: lang_sys.required_feature_index(),
        feature_indices: collect_u16s(lang_sys.feature_indices()),
    }
}

fn decode_script(tag: Tag, script: &Script) -> Result<ScriptEntry, ReadError> {
    let default_lang_sys = script
        .default_lang_sys()
        .transpose()?
        .map(|lang_sys| decode_lang_sys(&lang_sys));
    let mut lang_systems = script
        .lang_sys_records()
        .iter()
        .map(|record| {
            record
                .lang_sys(script.data())
                .map(|lang_sys| (record.lang_sys_tag(), decode_lang_sys(&lang_sys)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    lang_systems.sort_by_key(|(tag, _)| *tag);
    Ok(ScriptEntry {
        tag,
        default_lang_sys,
        lang_systems,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sfnt_test_data::layout::LOOKUP_ORDER_GSUB;

    use super::*;
    use crate::{tables::gsub::Gsub, FontData, FontRead};

    fn index() -> LayoutIndex {
        let gsub = Gsub::read(FontData::new(LOOKUP_ORDER_GSUB)).unwrap();
        LayoutIndex::new(&gsub).unwrap()
    }

    #[test]
    fn decoded_lists() {
        let index = index();
        assert_eq!(index.lookups().len(), 3);
        assert_eq!(index.lookups()[1].lookup_type, 4);
        let tags = index.features().iter().map(|f| f.tag).collect::<Vec<_>>();
        assert_eq!(tags, [Tag::new(b"ccmp"), Tag::new(b"liga"), Tag::new(b"rlig")]);
        let dflt = index.script(DFLT).unwrap();
        assert_eq!(
            dflt.default_lang_sys,
            Some(LangSysEntry {
                required_feature: Some(0),
                feature_indices: vec![1, 2],
            })
        );
    }

    #[rstest]
    #[case::all(&[], &[0, 1, 2])]
    #[case::liga(&[Tag::new(b"liga")], &[0, 1])]
    #[case::liga_rlig(&[Tag::new(b"liga"), Tag::new(b"rlig")], &[0, 1, 2])]
    #[case::required_only(&[Tag::new(b"kern")], &[0])]
    fn lookup_order(#[case] enabled: &[Tag], #[case] expected: &[u16]) {
        let index = index();
        let lookups = index
            .lookup_indices(Tag::new(b"latn"), None, enabled)
            .collect::<Vec<_>>();
        assert_eq!(lookups, expected);
    }

    #[test]
    fn missing_language_uses_default() {
        let index = index();
        let dflt = index.lang_sys(DFLT, None).unwrap();
        assert_eq!(index.lang_sys(DFLT, Some(Tag::new(b"TRK "))), Some(dflt));
        assert!(index.script(Tag::new(b"latn")).is_none());
        assert!(index.script_or_default(Tag::new(b"latn")).is_some());
    }

    #[test]
    fn out_of_range_feature_stops_iteration() {
        let index = LayoutIndex {
            lookups: vec![
                LookupEntry {
                    lookup_type: 1,
                    lookup_flag: LookupFlag::empty(),
                    subtable_count: 0,
                    mark_filtering_set: None,
                };
                2
            ],
            features: vec![FeatureEntry {
                tag: Tag::new(b"liga"),
                params_offset: Nullable::default(),
                lookup_indices: vec![1, 5, 0],
            }],
            scripts: vec![ScriptEntry {
                tag: DFLT,
                default_lang_sys: Some(LangSysEntry {
                    required_feature: None,
                    feature_indices: vec![0, 3, 0],
                }),
                lang_systems: Vec::new(),
            }],
        };
        let lookups = index.lookup_indices(DFLT, None, &[]).collect::<Vec<_>>();
        assert_eq!(lookups, [1]);
    }
}
