//! The FeatureVariations table of `GSUB` and `GPOS` 1.1

use types::{BigEndian, F2Dot14, FixedSize, MajorMinor, Nullable, Offset32};

use super::{Feature, FeatureList};
use crate::{
    ArrayOfOffsets, FontData, FontRead, ReadError, ResolveNullableOffset, ResolveOffset,
};

/// [FeatureVariations Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#featurevariations-table)
#[derive(Clone, Copy, Debug)]
pub struct FeatureVariations<'a> {
    data: FontData<'a>,
    version: MajorMinor,
    feature_variation_records: &'a [FeatureVariationRecord],
}

impl<'a> FontRead<'a> for FeatureVariations<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: MajorMinor = cursor.read()?;
        if version.major != 1 {
            return Err(ReadError::InvalidFormat(version.major as _));
        }
        let count: u32 = cursor.read()?;
        let feature_variation_records = cursor.read_array(count as usize)?;
        Ok(FeatureVariations {
            data,
            version,
            feature_variation_records,
        })
    }
}

impl<'a> FeatureVariations<'a> {
    pub fn version(&self) -> MajorMinor {
        self.version
    }

    /// The records, in order of precedence.
    pub fn feature_variation_records(&self) -> &'a [FeatureVariationRecord] {
        self.feature_variation_records
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// Part of [FeatureVariations]
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct FeatureVariationRecord {
    /// Offset to a condition set table, from beginning of FeatureVariations table.
    pub condition_set_offset: BigEndian<Nullable<Offset32>>,
    /// Offset to a feature table substitution table, from beginning of the
    /// FeatureVariations table.
    pub feature_table_substitution_offset: BigEndian<Nullable<Offset32>>,
}

impl FixedSize for FeatureVariationRecord {
    const RAW_BYTE_LEN: usize = Offset32::RAW_BYTE_LEN * 2;
}

impl FeatureVariationRecord {
    /// The conditions under which this record applies.
    ///
    /// A null condition set matches everywhere.
    pub fn condition_set<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<ConditionSet<'a>, ReadError>> {
        self.condition_set_offset.get().resolve(data)
    }

    pub fn feature_table_substitution<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<FeatureTableSubstitution<'a>, ReadError>> {
        self.feature_table_substitution_offset.get().resolve(data)
    }
}

/// [ConditionSet Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#conditionset-table)
#[derive(Clone, Copy, Debug)]
pub struct ConditionSet<'a> {
    data: FontData<'a>,
    condition_offsets: &'a [BigEndian<Offset32>],
}

impl<'a> FontRead<'a> for ConditionSet<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let count: u16 = cursor.read()?;
        let condition_offsets = cursor.read_array(count as usize)?;
        Ok(ConditionSet {
            data,
            condition_offsets,
        })
    }
}

impl<'a> ConditionSet<'a> {
    /// The conditions, all of which must hold.
    pub fn conditions(&self) -> ArrayOfOffsets<'a, ConditionFormat1, Offset32> {
        ArrayOfOffsets::new(self.condition_offsets, self.data, ())
    }
}

/// [Condition Table Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#condition-table-format-1-font-variation-axis-range): Font Variation Axis Range
///
/// This is the only condition format this crate reads; others are an
/// [`InvalidFormat`][ReadError::InvalidFormat] error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConditionFormat1 {
    axis_index: u16,
    filter_range_min_value: F2Dot14,
    filter_range_max_value: F2Dot14,
}

impl<'a> FontRead<'a> for ConditionFormat1 {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format.into()));
        }
        Ok(ConditionFormat1 {
            axis_index: cursor.read()?,
            filter_range_min_value: cursor.read()?,
            filter_range_max_value: cursor.read()?,
        })
    }
}

impl ConditionFormat1 {
    /// Index (zero-based) of the axis in the `fvar` table
    pub fn axis_index(&self) -> u16 {
        self.axis_index
    }

    /// Minimum normalized axis coordinate of the range
    pub fn filter_range_min_value(&self) -> F2Dot14 {
        self.filter_range_min_value
    }

    /// Maximum normalized axis coordinate of the range
    pub fn filter_range_max_value(&self) -> F2Dot14 {
        self.filter_range_max_value
    }
}

/// [FeatureTableSubstitution Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#featuretablesubstitution-table)
#[derive(Clone, Copy, Debug)]
pub struct FeatureTableSubstitution<'a> {
    data: FontData<'a>,
    substitutions: &'a [FeatureTableSubstitutionRecord],
}

impl<'a> FontRead<'a> for FeatureTableSubstitution<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: MajorMinor = cursor.read()?;
        if version.major != 1 {
            return Err(ReadError::InvalidFormat(version.major as _));
        }
        let count: u16 = cursor.read()?;
        let substitutions = cursor.read_array(count as usize)?;
        Ok(FeatureTableSubstitution {
            data,
            substitutions,
        })
    }
}

impl<'a> FeatureTableSubstitution<'a> {
    /// The substitution records, ordered by feature index.
    pub fn substitutions(&self) -> &'a [FeatureTableSubstitutionRecord] {
        self.substitutions
    }

    /// Resolve the alternate feature of a record.
    ///
    /// Features are read with their tag, which is taken from the record in
    /// `feature_list` that this substitution replaces.
    pub fn alternate_feature(
        &self,
        record: &FeatureTableSubstitutionRecord,
        feature_list: &FeatureList,
    ) -> Result<Feature<'a>, ReadError> {
        let index = record.feature_index();
        let tag = feature_list
            .feature_records()
            .get(index as usize)
            .ok_or(ReadError::InvalidCollectionIndex(index.into()))?
            .feature_tag();
        record
            .alternate_feature_offset()
            .resolve_with_args(self.data, &tag)
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// Part of [FeatureTableSubstitution]
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct FeatureTableSubstitutionRecord {
    /// The feature table index to match
    pub feature_index: BigEndian<u16>,
    /// Offset to an alternate feature table, from start of the
    /// FeatureTableSubstitution table
    pub alternate_feature_offset: BigEndian<Offset32>,
}

impl FixedSize for FeatureTableSubstitutionRecord {
    const RAW_BYTE_LEN: usize = u16::RAW_BYTE_LEN + Offset32::RAW_BYTE_LEN;
}

impl FeatureTableSubstitutionRecord {
    pub fn feature_index(&self) -> u16 {
        self.feature_index.get()
    }

    pub fn alternate_feature_offset(&self) -> Offset32 {
        self.alternate_feature_offset.get()
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;
    use types::Tag;

    use super::*;

    #[test]
    fn read_feature_variations() {
        let variations = be_buffer! {
            1u16, 0u16, 1u32,
            16u32, 30u32,
            // condition set at 16
            1u16, 6u32,
            // condition at 22
            1u16, 0u16, 0x2000u16, 0x4000u16,
            // substitution at 30
            1u16, 0u16, 1u16,
            0u16, 12u32,
            // alternate feature at 42
            0u16, 1u16, 3u16
        };
        let list = be_buffer! {
            1u16,
            (Tag::new(b"rvrn")), 8u16,
            0u16, 0u16
        };
        let feature_list = FeatureList::read(FontData::new(&list)).unwrap();
        let table = FeatureVariations::read(FontData::new(&variations)).unwrap();
        assert_eq!(table.version(), MajorMinor::VERSION_1_0);
        let record = table.feature_variation_records()[0];

        let conditions = record.condition_set(table.data()).unwrap().unwrap();
        let condition = conditions.conditions().get(0).unwrap();
        assert_eq!(condition.axis_index(), 0);
        assert_eq!(condition.filter_range_min_value(), F2Dot14::from_f32(0.5));
        assert_eq!(condition.filter_range_max_value(), F2Dot14::ONE);

        let subst = record
            .feature_table_substitution(table.data())
            .unwrap()
            .unwrap();
        let sub_record = subst.substitutions()[0];
        assert_eq!(sub_record.feature_index(), 0);
        let alternate = subst.alternate_feature(&sub_record, &feature_list).unwrap();
        assert_eq!(alternate.feature_tag(), Tag::new(b"rvrn"));
        assert_eq!(alternate.lookup_list_indices()[0].get(), 3);
    }

    #[test]
    fn substitution_index_must_exist() {
        let subst = be_buffer! { 1u16, 0u16, 1u16, 4u16, 12u32, 0u16, 0u16 };
        let list = be_buffer! { 0u16 };
        let feature_list = FeatureList::read(FontData::new(&list)).unwrap();
        let table = FeatureTableSubstitution::read(FontData::new(&subst)).unwrap();
        assert_eq!(
            table
                .alternate_feature(&table.substitutions()[0], &feature_list)
                .err(),
            Some(ReadError::InvalidCollectionIndex(4))
        );
    }

    #[test]
    fn other_condition_formats() {
        let bytes = be_buffer! { 2u16, 0u16 };
        assert_eq!(
            ConditionFormat1::read(FontData::new(&bytes)).err(),
            Some(ReadError::InvalidFormat(2))
        );
    }
}
