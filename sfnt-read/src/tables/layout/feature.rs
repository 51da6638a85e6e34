//! Feature list and feature tables

use types::{BigEndian, FixedSize, Nullable, Offset16, Tag};

use super::TaggedElement;
use crate::{
    FontData, FontRead, FontReadWithArgs, ReadArgs, ReadError, ResolveNullableOffset,
    ResolveOffset,
};

/// [Feature List Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-list-table)
#[derive(Clone, Copy, Debug)]
pub struct FeatureList<'a> {
    data: FontData<'a>,
    feature_records: &'a [FeatureRecord],
}

/// Part of [FeatureList]
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct FeatureRecord {
    /// 4-byte feature identification tag
    pub feature_tag: BigEndian<Tag>,
    /// Offset to Feature table, from beginning of FeatureList
    pub feature_offset: BigEndian<Offset16>,
}

impl FixedSize for FeatureRecord {
    const RAW_BYTE_LEN: usize = Tag::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

impl<'a> FontRead<'a> for FeatureList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let feature_count: u16 = cursor.read()?;
        let feature_records = cursor.read_array(feature_count as usize)?;
        Ok(FeatureList {
            data,
            feature_records,
        })
    }
}

impl<'a> FeatureList<'a> {
    /// Number of FeatureRecords in this table
    pub fn feature_count(&self) -> u16 {
        self.feature_records.len() as u16
    }

    /// Array of FeatureRecords, ordered alphabetically by feature tag
    pub fn feature_records(&self) -> &'a [FeatureRecord] {
        self.feature_records
    }

    /// Returns the tag and feature at the given index.
    pub fn get(&self, index: u16) -> Result<TaggedElement<Feature<'a>>, ReadError> {
        self.feature_records
            .get(index as usize)
            .ok_or(ReadError::InvalidCollectionIndex(index as _))
            .and_then(|rec| {
                Ok(TaggedElement::new(
                    rec.feature_tag(),
                    rec.feature(self.data)?,
                ))
            })
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl FeatureRecord {
    /// 4-byte feature identification tag
    pub fn feature_tag(&self) -> Tag {
        self.feature_tag.get()
    }

    /// Offset to Feature table, from beginning of FeatureList
    pub fn feature_offset(&self) -> Offset16 {
        self.feature_offset.get()
    }

    /// Resolve the feature, relative to the start of the feature list.
    pub fn feature<'a>(&self, data: FontData<'a>) -> Result<Feature<'a>, ReadError> {
        self.feature_offset()
            .resolve_with_args(data, &self.feature_tag())
    }
}

/// [Feature Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-table)
///
/// Reading a feature requires its tag, which determines how any feature
/// parameters are interpreted.
#[derive(Clone, Copy, Debug)]
pub struct Feature<'a> {
    data: FontData<'a>,
    feature_tag: Tag,
    feature_params_offset: Nullable<Offset16>,
    lookup_list_indices: &'a [BigEndian<u16>],
}

impl ReadArgs for Feature<'_> {
    type Args = Tag;
}

impl<'a> FontReadWithArgs<'a> for Feature<'a> {
    fn read_with_args(data: FontData<'a>, args: &Tag) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let feature_params_offset = cursor.read()?;
        let lookup_index_count: u16 = cursor.read()?;
        let lookup_list_indices = cursor.read_array(lookup_index_count as usize)?;
        Ok(Feature {
            data,
            feature_tag: *args,
            feature_params_offset,
            lookup_list_indices,
        })
    }
}

impl<'a> Feature<'a> {
    /// The tag this feature was read with.
    pub fn feature_tag(&self) -> Tag {
        self.feature_tag
    }

    /// Offset from start of Feature table to FeatureParams table, if defined
    /// for the feature and present, else NULL
    pub fn feature_params_offset(&self) -> Nullable<Offset16> {
        self.feature_params_offset
    }

    /// The feature parameters, if present.
    pub fn feature_params(&self) -> Option<Result<FeatureParams<'a>, ReadError>> {
        self.feature_params_offset
            .resolve_with_args(self.data, &self.feature_tag)
    }

    /// Array of indices into the LookupList, zero-based (first lookup is
    /// LookupListIndex = 0)
    pub fn lookup_list_indices(&self) -> &'a [BigEndian<u16>] {
        self.lookup_list_indices
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// The parameters of a feature, as raw bytes.
///
/// Only the three registered parameter layouts are recognized; their length
/// is computed from the tag and contents, and the bytes are otherwise
/// uninterpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureParams<'a> {
    /// Parameters of the `size` feature
    Size(FontData<'a>),
    /// Parameters of the stylistic set features `ss01` to `ss20`
    StylisticSet(FontData<'a>),
    /// Parameters of the character variant features `cv01` to `cv99`
    CharacterVariant(FontData<'a>),
}

const SIZE_PARAMS_LEN: usize = 10;
const STYLISTIC_SET_PARAMS_LEN: usize = 4;
// up to and including charCount
const CHARACTER_VARIANT_HEADER_LEN: usize = 14;
const UINT24_LEN: usize = 3;

fn numbered_tag(tag: Tag, prefix: &[u8; 2], max: u8) -> bool {
    let [a, b, c, d] = tag.to_be_bytes();
    if [a, b] != *prefix || !c.is_ascii_digit() || !d.is_ascii_digit() {
        return false;
    }
    let n = (c - b'0') * 10 + (d - b'0');
    (1..=max).contains(&n)
}

impl ReadArgs for FeatureParams<'_> {
    type Args = Tag;
}

impl<'a> FontReadWithArgs<'a> for FeatureParams<'a> {
    fn read_with_args(data: FontData<'a>, args: &Tag) -> Result<FeatureParams<'a>, ReadError> {
        let tag = *args;
        let take = |len: usize| data.slice(..len).ok_or(ReadError::OutOfBounds);
        if tag == Tag::new(b"size") {
            take(SIZE_PARAMS_LEN).map(Self::Size)
        } else if numbered_tag(tag, b"ss", 20) {
            take(STYLISTIC_SET_PARAMS_LEN).map(Self::StylisticSet)
        } else if numbered_tag(tag, b"cv", 99) {
            let char_count: u16 = data.read_at(CHARACTER_VARIANT_HEADER_LEN - 2)?;
            take(CHARACTER_VARIANT_HEADER_LEN + char_count as usize * UINT24_LEN)
                .map(Self::CharacterVariant)
        } else {
            Err(ReadError::MalformedData("feature params for unknown feature"))
        }
    }
}

impl<'a> FeatureParams<'a> {
    /// The bytes of the parameters.
    pub fn data(&self) -> FontData<'a> {
        match self {
            FeatureParams::Size(data)
            | FeatureParams::StylisticSet(data)
            | FeatureParams::CharacterVariant(data) => *data,
        }
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn features_and_params() {
        let bytes = be_buffer! {
            2u16,
            (Tag::new(b"liga")), 14u16,
            (Tag::new(b"ss02")), 22u16,
            // liga at 14
            0u16, 2u16, 3u16, 1u16,
            // ss02 at 22, params at +6
            6u16, 1u16, 4u16,
            0u16, 256u16, 0xFFFFu16
        };
        let list = FeatureList::read(FontData::new(&bytes)).unwrap();
        assert_eq!(list.feature_count(), 2);

        let liga = list.get(0).unwrap();
        assert_eq!(liga.tag, Tag::new(b"liga"));
        assert_eq!(
            liga.lookup_list_indices().iter().map(|x| x.get()).collect::<Vec<_>>(),
            [3, 1]
        );
        assert!(liga.feature_params().is_none());

        let ss02 = list.get(1).unwrap();
        let params = ss02.feature_params().unwrap().unwrap();
        assert!(matches!(params, FeatureParams::StylisticSet(_)));
        assert_eq!(params.data().as_bytes(), &[0, 0, 1, 0]);
        assert!(list.get(2).is_err());
    }

    #[test]
    fn character_variant_params_length() {
        let bytes = be_buffer! {
            0u16, 256u16, 257u16, 258u16, 0u16, 0u16, 2u16,
            [0u8, 0, 0x41, 0, 0, 0x42],
            0xFFu8
        };
        let params =
            FeatureParams::read_with_args(FontData::new(&bytes), &Tag::new(b"cv01")).unwrap();
        assert_eq!(params.data().len(), 20);
    }

    #[test]
    fn unknown_params() {
        let bytes = [0u8; 16];
        for tag in [b"liga", b"ss21", b"ss00", b"cvXX"] {
            assert!(
                FeatureParams::read_with_args(FontData::new(&bytes), &Tag::new(tag)).is_err(),
                "{tag:?}"
            );
        }
    }
}
