//! The FeatureVariations table of `GSUB` and `GPOS` 1.1

use read::{tables::layout as read_layout, FontData, ReadError};
use types::{F2Dot14, MajorMinor};

use super::{is_strictly_sorted, Feature};
use crate::{
    from_obj::{FromObjRef, FromTableRef, ToOwnedTable},
    offsets::{NullableOffsetMarker, OffsetMarker, WIDTH_32},
    validate::{Validate, ValidationCtx},
    write::{array_len, FontWrite, TableWriter},
};

/// [FeatureVariations Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#featurevariations-table)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureVariations {
    /// The records, in order of precedence
    pub feature_variation_records: Vec<FeatureVariationRecord>,
}

impl FeatureVariations {
    pub fn new(feature_variation_records: Vec<FeatureVariationRecord>) -> Self {
        Self {
            feature_variation_records,
        }
    }

    /// Convert a parsed table.
    ///
    /// Alternate features take their tags from the records of `feature_list`
    /// that they replace, which decides how their parameters are read.
    pub fn from_read(
        obj: &read_layout::FeatureVariations,
        feature_list: &read_layout::FeatureList,
    ) -> Result<Self, ReadError> {
        let data = obj.data();
        let feature_variation_records = obj
            .feature_variation_records()
            .iter()
            .map(|record| {
                let feature_table_substitution = record
                    .feature_table_substitution(data)
                    .transpose()?
                    .map(|subst| FeatureTableSubstitution::from_read(&subst, feature_list))
                    .transpose()?;
                Ok(FeatureVariationRecord {
                    condition_set: record.condition_set(data).to_owned_table()?,
                    feature_table_substitution: feature_table_substitution.into(),
                })
            })
            .collect::<Result<_, ReadError>>()?;
        Ok(FeatureVariations {
            feature_variation_records,
        })
    }
}

/// Part of [FeatureVariations]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureVariationRecord {
    /// The conditions under which this record applies; null matches everywhere
    pub condition_set: NullableOffsetMarker<ConditionSet, WIDTH_32>,
    pub feature_table_substitution: NullableOffsetMarker<FeatureTableSubstitution, WIDTH_32>,
}

impl FeatureVariationRecord {
    pub fn new(
        condition_set: Option<ConditionSet>,
        feature_table_substitution: Option<FeatureTableSubstitution>,
    ) -> Self {
        Self {
            condition_set: condition_set.into(),
            feature_table_substitution: feature_table_substitution.into(),
        }
    }
}

/// [ConditionSet Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#conditionset-table)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionSet {
    /// Conditions that must all hold
    pub conditions: Vec<OffsetMarker<ConditionFormat1, WIDTH_32>>,
}

impl ConditionSet {
    pub fn new(conditions: Vec<ConditionFormat1>) -> Self {
        Self {
            conditions: conditions.into_iter().map(Into::into).collect(),
        }
    }
}

/// [Condition Table Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#condition-table-format-1-font-variation-axis-range): Font Variation Axis Range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionFormat1 {
    /// Index (zero-based) of the axis in the `fvar` table
    pub axis_index: u16,
    pub filter_range_min_value: F2Dot14,
    pub filter_range_max_value: F2Dot14,
}

impl ConditionFormat1 {
    pub fn new(axis_index: u16, min: F2Dot14, max: F2Dot14) -> Self {
        Self {
            axis_index,
            filter_range_min_value: min,
            filter_range_max_value: max,
        }
    }
}

/// [FeatureTableSubstitution Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#featuretablesubstitution-table)
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureTableSubstitution {
    /// Substitutions, sorted by feature index
    pub substitutions: Vec<FeatureTableSubstitutionRecord>,
}

impl FeatureTableSubstitution {
    pub fn new(substitutions: Vec<FeatureTableSubstitutionRecord>) -> Self {
        Self { substitutions }
    }

    fn from_read(
        obj: &read_layout::FeatureTableSubstitution,
        feature_list: &read_layout::FeatureList,
    ) -> Result<Self, ReadError> {
        let substitutions = obj
            .substitutions()
            .iter()
            .map(|record| {
                Ok(FeatureTableSubstitutionRecord {
                    feature_index: record.feature_index(),
                    alternate_feature: obj
                        .alternate_feature(record, feature_list)
                        .to_owned_table()?,
                })
            })
            .collect::<Result<_, ReadError>>()?;
        Ok(FeatureTableSubstitution { substitutions })
    }
}

/// Part of [FeatureTableSubstitution]
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureTableSubstitutionRecord {
    /// The index, in the feature list, of the feature to replace
    pub feature_index: u16,
    pub alternate_feature: OffsetMarker<Feature, WIDTH_32>,
}

impl FeatureTableSubstitutionRecord {
    pub fn new(feature_index: u16, alternate_feature: Feature) -> Self {
        Self {
            feature_index,
            alternate_feature: alternate_feature.into(),
        }
    }
}

impl FontWrite for FeatureVariations {
    fn write_into(&self, writer: &mut TableWriter) {
        MajorMinor::VERSION_1_0.write_into(writer);
        (array_len(&self.feature_variation_records) as u32).write_into(writer);
        self.feature_variation_records.write_into(writer);
    }
}

impl FontWrite for FeatureVariationRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.condition_set.write_into(writer);
        self.feature_table_substitution.write_into(writer);
    }
}

impl FontWrite for ConditionSet {
    fn write_into(&self, writer: &mut TableWriter) {
        array_len(&self.conditions).write_into(writer);
        self.conditions.write_into(writer);
    }
}

impl FontWrite for ConditionFormat1 {
    fn write_into(&self, writer: &mut TableWriter) {
        1u16.write_into(writer);
        self.axis_index.write_into(writer);
        self.filter_range_min_value.write_into(writer);
        self.filter_range_max_value.write_into(writer);
    }
}

impl FontWrite for FeatureTableSubstitution {
    fn write_into(&self, writer: &mut TableWriter) {
        MajorMinor::VERSION_1_0.write_into(writer);
        array_len(&self.substitutions).write_into(writer);
        self.substitutions.write_into(writer);
    }
}

impl FontWrite for FeatureTableSubstitutionRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.feature_index.write_into(writer);
        self.alternate_feature.write_into(writer);
    }
}

impl Validate for FeatureVariations {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("FeatureVariations", |ctx| {
            ctx.in_field("feature_variation_records", |ctx| {
                self.feature_variation_records.validate_impl(ctx)
            })
        })
    }
}

impl Validate for FeatureVariationRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("FeatureVariationRecord", |ctx| {
            ctx.in_field("condition_set", |ctx| self.condition_set.validate_impl(ctx));
            ctx.in_field("feature_table_substitution", |ctx| {
                self.feature_table_substitution.validate_impl(ctx)
            })
        })
    }
}

impl Validate for ConditionSet {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ConditionSet", |ctx| {
            ctx.in_field("conditions", |ctx| {
                ctx.check_array_len(self.conditions.len());
                self.conditions.validate_impl(ctx);
            })
        })
    }
}

impl Validate for ConditionFormat1 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ConditionFormat1", |ctx| {
            let range = F2Dot14::MIN_ONE..=F2Dot14::ONE;
            let (min, max) = (self.filter_range_min_value, self.filter_range_max_value);
            if !range.contains(&min) || !range.contains(&max) {
                ctx.report(format!("axis range {min}..{max} is not normalized"));
            }
            if min > max {
                ctx.report(format!("axis range minimum {min} exceeds maximum {max}"));
            }
        })
    }
}

impl Validate for FeatureTableSubstitution {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("FeatureTableSubstitution", |ctx| {
            ctx.in_field("substitutions", |ctx| {
                ctx.check_array_len(self.substitutions.len());
                if !is_strictly_sorted(self.substitutions.iter().map(|rec| rec.feature_index)) {
                    ctx.report("substitutions must be sorted by feature index, without duplicates");
                }
                ctx.with_array_items(self.substitutions.iter(), |ctx, rec| {
                    ctx.in_field("alternate_feature", |ctx| {
                        rec.alternate_feature.validate_impl(ctx)
                    })
                })
            })
        })
    }
}

impl FromObjRef<read_layout::ConditionSet<'_>> for ConditionSet {
    fn from_obj_ref(obj: &read_layout::ConditionSet, _: FontData) -> Result<Self, ReadError> {
        Ok(ConditionSet {
            conditions: obj
                .conditions()
                .iter()
                .map(|condition| condition.to_owned_table())
                .collect::<Result<_, _>>()?,
        })
    }
}

impl FromTableRef<read_layout::ConditionSet<'_>> for ConditionSet {}

impl FromObjRef<read_layout::ConditionFormat1> for ConditionFormat1 {
    fn from_obj_ref(obj: &read_layout::ConditionFormat1, _: FontData) -> Result<Self, ReadError> {
        Ok(ConditionFormat1 {
            axis_index: obj.axis_index(),
            filter_range_min_value: obj.filter_range_min_value(),
            filter_range_max_value: obj.filter_range_max_value(),
        })
    }
}

impl FromTableRef<read_layout::ConditionFormat1> for ConditionFormat1 {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::FontRead;
    use types::Tag;

    use super::*;
    use crate::{
        dump_table,
        tables::layout::{FeatureList, FeatureRecord},
    };

    fn condition(min: f32, max: f32) -> ConditionFormat1 {
        ConditionFormat1::new(0, F2Dot14::from_f32(min), F2Dot14::from_f32(max))
    }

    #[test]
    fn round_trip_with_feature_list() {
        let feature_list = FeatureList::new(vec![FeatureRecord::new(
            Tag::new(b"rvrn"),
            Feature::new(None, vec![0]),
        )]);
        let variations = FeatureVariations::new(vec![
            FeatureVariationRecord::new(
                Some(ConditionSet::new(vec![condition(0.5, 1.0)])),
                Some(FeatureTableSubstitution::new(vec![
                    FeatureTableSubstitutionRecord::new(0, Feature::new(None, vec![1])),
                ])),
            ),
            FeatureVariationRecord::new(None, None),
        ]);
        let list_bytes = dump_table(&feature_list).unwrap();
        let bytes = dump_table(&variations).unwrap();

        let read_list = read_layout::FeatureList::read(FontData::new(&list_bytes)).unwrap();
        let read_back = read_layout::FeatureVariations::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.feature_variation_records().len(), 2);
        let owned = FeatureVariations::from_read(&read_back, &read_list).unwrap();
        assert_eq!(owned, variations);
    }

    #[test]
    fn substitution_of_missing_feature() {
        let variations = FeatureVariations::new(vec![FeatureVariationRecord::new(
            None,
            Some(FeatureTableSubstitution::new(vec![
                FeatureTableSubstitutionRecord::new(3, Feature::new(None, vec![1])),
            ])),
        )]);
        let bytes = dump_table(&variations).unwrap();
        let list_bytes = dump_table(&FeatureList::default()).unwrap();
        let read_list = read_layout::FeatureList::read(FontData::new(&list_bytes)).unwrap();
        let read_back = read_layout::FeatureVariations::read(FontData::new(&bytes)).unwrap();
        assert_eq!(
            FeatureVariations::from_read(&read_back, &read_list).err(),
            Some(ReadError::InvalidCollectionIndex(3))
        );
    }

    #[test]
    fn validate_conditions() {
        assert!(condition(-1.0, 0.0).validate().is_ok());
        let report = condition(0.5, 0.25).validate().unwrap_err();
        assert!(report.to_string().contains("exceeds maximum"), "{report}");
        let report = condition(0.0, 1.5).validate().unwrap_err();
        assert!(report.to_string().contains("not normalized"), "{report}");
    }

    #[test]
    fn unsorted_substitutions() {
        let subst = FeatureTableSubstitution::new(vec![
            FeatureTableSubstitutionRecord::new(2, Feature::default()),
            FeatureTableSubstitutionRecord::new(1, Feature::default()),
        ]);
        assert!(subst.validate().is_err());
    }
}
