//! The [head](https://docs.microsoft.com/en-us/typography/opentype/spec/head) table

use read::{tables::head as read_head, FontData, ReadError, TopLevelTable};
use types::{Fixed, MajorMinor, Tag};

use crate::{
    from_obj::{FromObjRef, FromTableRef},
    table_type::TableType,
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

/// The [head](https://docs.microsoft.com/en-us/typography/opentype/spec/head)
/// (font header) table.
///
/// This is always written as version 1.0, with the required magic number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Head {
    pub font_revision: Fixed,
    /// Patched by the sfnt writer; the value here is only written when the
    /// table is dumped on its own.
    pub checksum_adjustment: u32,
    pub flags: u16,
    /// Set to a value from 16 to 16384.
    pub units_per_em: u16,
    /// Seconds since 12:00 midnight, January 1st 1904, UTC.
    pub created: i64,
    pub modified: i64,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    /// 0 for short offsets (Offset16), 1 for long (Offset32).
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

impl Head {
    /// Construct a new `head` table.
    ///
    /// The remaining fields take their usual defaults.
    pub fn new(font_revision: Fixed, units_per_em: u16) -> Self {
        Self {
            font_revision,
            units_per_em,
            ..Default::default()
        }
    }
}

impl Default for Head {
    fn default() -> Self {
        Self {
            font_revision: Fixed::ONE,
            checksum_adjustment: 0,
            flags: 0,
            units_per_em: 1000,
            created: 0,
            modified: 0,
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            mac_style: 0,
            lowest_rec_ppem: 0,
            font_direction_hint: 2,
            index_to_loc_format: 0,
            glyph_data_format: 0,
        }
    }
}

impl TopLevelTable for Head {
    const TAG: Tag = read_head::TAG;
}

impl FontWrite for Head {
    fn write_into(&self, writer: &mut TableWriter) {
        MajorMinor::VERSION_1_0.write_into(writer);
        self.font_revision.write_into(writer);
        self.checksum_adjustment.write_into(writer);
        read_head::MAGIC_NUMBER.write_into(writer);
        self.flags.write_into(writer);
        self.units_per_em.write_into(writer);
        self.created.write_into(writer);
        self.modified.write_into(writer);
        self.x_min.write_into(writer);
        self.y_min.write_into(writer);
        self.x_max.write_into(writer);
        self.y_max.write_into(writer);
        self.mac_style.write_into(writer);
        self.lowest_rec_ppem.write_into(writer);
        self.font_direction_hint.write_into(writer);
        self.index_to_loc_format.write_into(writer);
        self.glyph_data_format.write_into(writer);
    }

    fn table_type(&self) -> TableType {
        TableType::TopLevel(read_head::TAG)
    }
}

impl Validate for Head {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("Head", |ctx| {
            ctx.in_field("units_per_em", |ctx| {
                if !(16..=16384).contains(&self.units_per_em) {
                    ctx.report(format!(
                        "units_per_em {} outside of 16..=16384",
                        self.units_per_em
                    ));
                }
            });
            ctx.in_field("index_to_loc_format", |ctx| {
                if !matches!(self.index_to_loc_format, 0 | 1) {
                    ctx.report("index_to_loc_format must be 0 or 1");
                }
            });
        })
    }
}

impl FromObjRef<read_head::Head<'_>> for Head {
    fn from_obj_ref(obj: &read_head::Head, _: FontData) -> Result<Self, ReadError> {
        Ok(Head {
            font_revision: obj.font_revision(),
            checksum_adjustment: obj.checksum_adjustment(),
            flags: obj.flags(),
            units_per_em: obj.units_per_em(),
            created: obj.created(),
            modified: obj.modified(),
            x_min: obj.x_min(),
            y_min: obj.y_min(),
            x_max: obj.x_max(),
            y_max: obj.y_max(),
            mac_style: obj.mac_style(),
            lowest_rec_ppem: obj.lowest_rec_ppem(),
            font_direction_hint: obj.font_direction_hint(),
            index_to_loc_format: obj.index_to_loc_format(),
            glyph_data_format: obj.glyph_data_format(),
        })
    }
}

impl FromTableRef<read_head::Head<'_>> for Head {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::FontRead;

    use super::*;
    use crate::from_obj::ToOwnedTable;

    #[test]
    fn round_trip_fixture() {
        let read_back = read_head::Head::read(FontData::new(sfnt_test_data::HEAD)).unwrap();
        let owned: Head = read_back.to_owned_table().unwrap();
        assert_eq!(owned.units_per_em, 1000);
        assert_eq!(owned.font_revision, Fixed::from_f64(2.5));
        let bytes = crate::dump_table(&owned).unwrap();
        assert_eq!(bytes, sfnt_test_data::HEAD);
    }

    #[test]
    fn default_is_well_formed() {
        let head = Head::new(Fixed::from_f64(1.5), 2048);
        let bytes = crate::dump_table(&head).unwrap();
        assert_eq!(bytes.len(), read_head::HEAD_LEN);
        let read_back = read_head::Head::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.units_per_em(), 2048);
        assert_eq!(read_back.font_direction_hint(), 2);
    }

    #[test]
    fn bad_units_per_em() {
        let head = Head::new(Fixed::ONE, 8);
        assert!(head.validate().is_err());
        assert!(crate::dump_table(&head).is_err());
    }
}
