//! Script and language system tables

use types::{BigEndian, FixedSize, Nullable, Offset16, Tag};

use super::TaggedElement;
use crate::{FontData, FontRead, ReadError, ResolveNullableOffset, ResolveOffset};

/// The value of `requiredFeatureIndex` when there is no required feature.
const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

/// [Script List Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-list-table-and-script-record)
#[derive(Clone, Copy, Debug)]
pub struct ScriptList<'a> {
    data: FontData<'a>,
    script_records: &'a [ScriptRecord],
}

/// [Script Record](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-list-table-and-script-record)
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct ScriptRecord {
    /// 4-byte script tag identifier
    pub script_tag: BigEndian<Tag>,
    /// Offset to Script table, from beginning of ScriptList
    pub script_offset: BigEndian<Offset16>,
}

impl FixedSize for ScriptRecord {
    const RAW_BYTE_LEN: usize = Tag::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

/// A script chosen from a set of candidate tags.
///
/// Returned by the [`ScriptList::select`] method.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SelectedScript {
    /// The actual OpenType tag of the chosen script.
    pub tag: Tag,
    /// Index of the script in the [`ScriptList`].
    pub index: u16,
    /// True if a script was chosen that wasn't in the requested list.
    pub is_fallback: bool,
}

impl<'a> FontRead<'a> for ScriptList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let script_count: u16 = cursor.read()?;
        let script_records = cursor.read_array(script_count as usize)?;
        Ok(ScriptList {
            data,
            script_records,
        })
    }
}

impl<'a> ScriptList<'a> {
    /// Number of ScriptRecords
    pub fn script_count(&self) -> u16 {
        self.script_records.len() as u16
    }

    /// Array of ScriptRecords, listed alphabetically by script tag
    pub fn script_records(&self) -> &'a [ScriptRecord] {
        self.script_records
    }

    /// Returns the index of the script with the given tag.
    pub fn index_for_tag(&self, tag: Tag) -> Option<u16> {
        self.script_records
            .binary_search_by_key(&tag, |rec| rec.script_tag())
            .map(|index| index as u16)
            .ok()
    }

    /// Returns the tag and script at the given index.
    pub fn get(&self, index: u16) -> Result<TaggedElement<Script<'a>>, ReadError> {
        self.script_records
            .get(index as usize)
            .ok_or(ReadError::InvalidCollectionIndex(index as _))
            .and_then(|rec| {
                Ok(TaggedElement::new(
                    rec.script_tag(),
                    rec.script(self.data)?,
                ))
            })
    }

    /// The script with this tag, if present.
    pub fn script(&self, tag: Tag) -> Option<Result<Script<'a>, ReadError>> {
        self.index_for_tag(tag)
            .map(|idx| self.get(idx).map(|script| script.element))
    }

    /// Finds the first available script that matches one of the given tags.
    ///
    /// When none of the requested scripts are available, then `DFLT`, `dflt`
    /// and `latn` tags are tried in that order.
    pub fn select(&self, tags: &[Tag]) -> Option<SelectedScript> {
        for &tag in tags {
            if let Some(index) = self.index_for_tag(tag) {
                return Some(SelectedScript {
                    tag,
                    index,
                    is_fallback: false,
                });
            }
        }
        // 'dflt' is a common misspelling, and some fonts put everything in 'latn'
        for tag in [Tag::new(b"DFLT"), Tag::new(b"dflt"), Tag::new(b"latn")] {
            if let Some(index) = self.index_for_tag(tag) {
                return Some(SelectedScript {
                    tag,
                    index,
                    is_fallback: true,
                });
            }
        }
        None
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl ScriptRecord {
    /// 4-byte script tag identifier
    pub fn script_tag(&self) -> Tag {
        self.script_tag.get()
    }

    /// Offset to Script table, from beginning of ScriptList
    pub fn script_offset(&self) -> Offset16 {
        self.script_offset.get()
    }

    /// Resolve the script, relative to the start of the script list.
    pub fn script<'a>(&self, data: FontData<'a>) -> Result<Script<'a>, ReadError> {
        self.script_offset().resolve(data)
    }
}

/// [Script Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-table-and-language-system-record)
#[derive(Clone, Copy, Debug)]
pub struct Script<'a> {
    data: FontData<'a>,
    default_lang_sys_offset: Nullable<Offset16>,
    lang_sys_records: &'a [LangSysRecord],
}

/// [Language System Record](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-table-and-language-system-record)
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct LangSysRecord {
    /// 4-byte LangSysTag identifier
    pub lang_sys_tag: BigEndian<Tag>,
    /// Offset to LangSys table, from beginning of Script table
    pub lang_sys_offset: BigEndian<Offset16>,
}

impl FixedSize for LangSysRecord {
    const RAW_BYTE_LEN: usize = Tag::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

impl<'a> FontRead<'a> for Script<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let default_lang_sys_offset = cursor.read()?;
        let lang_sys_count: u16 = cursor.read()?;
        let lang_sys_records = cursor.read_array(lang_sys_count as usize)?;
        Ok(Script {
            data,
            default_lang_sys_offset,
            lang_sys_records,
        })
    }
}

impl<'a> Script<'a> {
    /// Offset to default LangSys table, from beginning of Script table; may be NULL
    pub fn default_lang_sys_offset(&self) -> Nullable<Offset16> {
        self.default_lang_sys_offset
    }

    /// The default language system, if there is one.
    pub fn default_lang_sys(&self) -> Option<Result<LangSys<'a>, ReadError>> {
        self.default_lang_sys_offset.resolve(self.data)
    }

    /// Array of LangSysRecords, listed alphabetically by LangSys tag
    pub fn lang_sys_records(&self) -> &'a [LangSysRecord] {
        self.lang_sys_records
    }

    /// Returns the index of the language system with the given tag.
    pub fn lang_sys_index_for_tag(&self, tag: Tag) -> Option<u16> {
        self.lang_sys_records
            .binary_search_by_key(&tag, |rec| rec.lang_sys_tag())
            .map(|index| index as u16)
            .ok()
    }

    /// The language system with the given tag, if present.
    pub fn lang_sys(&self, tag: Tag) -> Option<Result<LangSys<'a>, ReadError>> {
        let index = self.lang_sys_index_for_tag(tag)?;
        self.lang_sys_records
            .get(index as usize)
            .map(|rec| rec.lang_sys(self.data))
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl LangSysRecord {
    /// 4-byte LangSysTag identifier
    pub fn lang_sys_tag(&self) -> Tag {
        self.lang_sys_tag.get()
    }

    /// Offset to LangSys table, from beginning of Script table
    pub fn lang_sys_offset(&self) -> Offset16 {
        self.lang_sys_offset.get()
    }

    /// Resolve the language system, relative to the start of the script.
    pub fn lang_sys<'a>(&self, data: FontData<'a>) -> Result<LangSys<'a>, ReadError> {
        self.lang_sys_offset().resolve(data)
    }
}

/// [Language System Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#language-system-table)
#[derive(Clone, Copy, Debug)]
pub struct LangSys<'a> {
    required_feature_index: u16,
    feature_indices: &'a [BigEndian<u16>],
}

impl<'a> FontRead<'a> for LangSys<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        // lookupOrderOffset, reserved
        cursor.advance::<u16>();
        let required_feature_index = cursor.read()?;
        let feature_index_count: u16 = cursor.read()?;
        let feature_indices = cursor.read_array(feature_index_count as usize)?;
        Ok(LangSys {
            required_feature_index,
            feature_indices,
        })
    }
}

impl<'a> LangSys<'a> {
    /// Index of the feature required for this language system, if any.
    pub fn required_feature_index(&self) -> Option<u16> {
        (self.required_feature_index != NO_REQUIRED_FEATURE).then_some(self.required_feature_index)
    }

    /// The raw `requiredFeatureIndex` field; 0xFFFF if there is no required feature.
    pub fn raw_required_feature_index(&self) -> u16 {
        self.required_feature_index
    }

    /// Array of indices into the FeatureList, in arbitrary order
    pub fn feature_indices(&self) -> &'a [BigEndian<u16>] {
        self.feature_indices
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    fn script_list_bytes() -> Vec<u8> {
        be_buffer! {
            2u16,
            (Tag::new(b"DFLT")), 14u16,
            (Tag::new(b"latn")), 26u16,
            // DFLT at 14: default langsys only
            4u16, 0u16,
            0u16, 0xFFFFu16, 1u16, 0u16,
            // latn at 26: no default, and "TRK "
            0u16, 1u16, (Tag::new(b"TRK ")), 10u16,
            0u16, 2u16, 2u16, 1u16, 0u16
        }
        .into_vec()
    }

    #[test]
    fn scripts_and_lang_sys() {
        let bytes = script_list_bytes();
        let list = ScriptList::read(FontData::new(&bytes)).unwrap();
        assert_eq!(list.script_count(), 2);
        assert_eq!(list.index_for_tag(Tag::new(b"latn")), Some(1));
        assert_eq!(list.index_for_tag(Tag::new(b"cyrl")), None);

        let dflt = list.get(0).unwrap();
        assert_eq!(dflt.tag, Tag::new(b"DFLT"));
        let lang_sys = dflt.default_lang_sys().unwrap().unwrap();
        assert_eq!(lang_sys.required_feature_index(), None);
        assert_eq!(lang_sys.feature_indices().len(), 1);

        let latn = list.script(Tag::new(b"latn")).unwrap().unwrap();
        assert!(latn.default_lang_sys().is_none());
        let trk = latn.lang_sys(Tag::new(b"TRK ")).unwrap().unwrap();
        assert_eq!(trk.required_feature_index(), Some(2));
        assert_eq!(
            trk.feature_indices().iter().map(|x| x.get()).collect::<Vec<_>>(),
            [1, 0]
        );
        assert!(latn.lang_sys(Tag::new(b"ROM ")).is_none());
        assert!(list.get(2).is_err());
    }

    #[test]
    fn select_falls_back() {
        let bytes = script_list_bytes();
        let list = ScriptList::read(FontData::new(&bytes)).unwrap();
        let selected = list.select(&[Tag::new(b"arab"), Tag::new(b"latn")]).unwrap();
        assert_eq!((selected.index, selected.is_fallback), (1, false));
        let selected = list.select(&[Tag::new(b"arab")]).unwrap();
        assert_eq!(selected.tag, Tag::new(b"DFLT"));
        assert!(selected.is_fallback);
    }
}
