//! The [maxp](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp) table

use read::{tables::maxp as read_maxp, FontData, ReadError, TopLevelTable};
use types::Tag;

use crate::{
    from_obj::{FromObjRef, FromTableRef},
    table_type::TableType,
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

pub use read_maxp::MaxpV1;

/// The [maxp](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp) table
///
/// The version is computed: 1.0 if the TrueType limits are present,
/// otherwise 0.5.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Maxp {
    pub num_glyphs: u16,
    pub v1: Option<MaxpV1>,
}

impl Maxp {
    /// Construct a version 0.5 table.
    pub fn new(num_glyphs: u16) -> Self {
        Self {
            num_glyphs,
            v1: None,
        }
    }

    fn compute_version(&self) -> u32 {
        if self.v1.is_some() {
            read_maxp::VERSION_1_0
        } else {
            read_maxp::VERSION_0_5
        }
    }
}

impl TopLevelTable for Maxp {
    const TAG: Tag = read_maxp::TAG;
}

impl FontWrite for Maxp {
    fn write_into(&self, writer: &mut TableWriter) {
        self.compute_version().write_into(writer);
        self.num_glyphs.write_into(writer);
        if let Some(v1) = &self.v1 {
            for field in [
                v1.max_points,
                v1.max_contours,
                v1.max_composite_points,
                v1.max_composite_contours,
                v1.max_zones,
                v1.max_twilight_points,
                v1.max_storage,
                v1.max_function_defs,
                v1.max_instruction_defs,
                v1.max_stack_elements,
                v1.max_size_of_instructions,
                v1.max_component_elements,
                v1.max_component_depth,
            ] {
                field.write_into(writer);
            }
        }
    }

    fn table_type(&self) -> TableType {
        TableType::TopLevel(read_maxp::TAG)
    }
}

impl Validate for Maxp {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Maxp", |ctx| {
            if let Some(v1) = &self.v1 {
                ctx.in_field("max_zones", |ctx| {
                    if !matches!(v1.max_zones, 1 | 2) {
                        ctx.report("max_zones must be 1 or 2");
                    }
                })
            }
        })
    }
}

impl FromObjRef<read_maxp::Maxp<'_>> for Maxp {
    fn from_obj_ref(obj: &read_maxp::Maxp, _: FontData) -> Result<Self, ReadError> {
        Ok(Maxp {
            num_glyphs: obj.num_glyphs(),
            v1: obj.v1().copied(),
        })
    }
}

impl FromTableRef<read_maxp::Maxp<'_>> for Maxp {}

#[cfg(test)]
mod tests {
    use read::FontRead;
    use rstest::rstest;

    use super::*;
    use crate::from_obj::ToOwnedTable;

    #[rstest]
    #[case::cff(sfnt_test_data::MAXP_0_5, 6)]
    #[case::truetype(sfnt_test_data::MAXP_1_0, 32)]
    fn round_trip(#[case] fixture: &[u8], #[case] len: usize) {
        let read_back = read_maxp::Maxp::read(FontData::new(fixture)).unwrap();
        let owned: Maxp = read_back.to_owned_table().unwrap();
        let bytes = crate::dump_table(&owned).unwrap();
        assert_eq!(bytes.len(), len);
        assert_eq!(bytes, fixture);
    }

    #[test]
    fn version_follows_fields() {
        let mut maxp = Maxp::new(5);
        let bytes = crate::dump_table(&maxp).unwrap();
        let loaded = read_maxp::Maxp::read(FontData::new(&bytes)).unwrap();
        assert_eq!(loaded.version(), read_maxp::VERSION_0_5);
        assert_eq!(loaded.num_glyphs(), 5);

        maxp.v1 = Some(MaxpV1 {
            max_zones: 2,
            max_points: 6,
            ..Default::default()
        });
        let bytes = crate::dump_table(&maxp).unwrap();
        let loaded = read_maxp::Maxp::read(FontData::new(&bytes)).unwrap();
        assert_eq!(loaded.version(), read_maxp::VERSION_1_0);
        assert_eq!(loaded.v1().unwrap().max_points, 6);
    }

    #[test]
    fn zero_zones_is_invalid() {
        let maxp = Maxp {
            num_glyphs: 1,
            v1: Some(MaxpV1::default()),
        };
        assert!(maxp.validate().is_err());
    }
}
