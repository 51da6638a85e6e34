//! The ValueRecord type used in the GPOS table

use read::{tables::gpos as read_gpos, FontData, ReadError};

use super::ValueFormat;
use crate::{
    from_obj::{FromObjRef, ToOwnedObj},
    offsets::NullableOffsetMarker,
    tables::layout::DeviceOrVariationIndex,
    validate::{Validate, ValidationCtx},
    write::{FontWrite, TableWriter},
};

/// A [ValueRecord](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#valueRecord)
///
/// The x/y placement and advance adjustments for a glyph, each with an
/// optional Device or VariationIndex table. Device offsets are written
/// relative to the start of the subtable containing the record.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueRecord {
    // The format is normally computed from the fields that are present.
    //
    // Records in a subtable must all share one format, though, and an empty
    // record in a class pair matrix may need to be written with explicit
    // null device offsets; null offsets can't be told apart from absent
    // fields, so the format can be given explicitly.
    explicit_format: Option<ValueFormat>,
    pub x_placement: Option<i16>,
    pub y_placement: Option<i16>,
    pub x_advance: Option<i16>,
    pub y_advance: Option<i16>,
    pub x_placement_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub y_placement_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub x_advance_device: NullableOffsetMarker<DeviceOrVariationIndex>,
    pub y_advance_device: NullableOffsetMarker<DeviceOrVariationIndex>,
}

impl ValueRecord {
    pub fn new() -> ValueRecord {
        ValueRecord::default()
    }

    pub fn with_x_placement(mut self, val: i16) -> Self {
        self.x_placement = Some(val);
        self
    }

    pub fn with_y_placement(mut self, val: i16) -> Self {
        self.y_placement = Some(val);
        self
    }

    pub fn with_x_advance(mut self, val: i16) -> Self {
        self.x_advance = Some(val);
        self
    }

    pub fn with_y_advance(mut self, val: i16) -> Self {
        self.y_advance = Some(val);
        self
    }

    pub fn with_x_placement_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.x_placement_device = val.into().into();
        self
    }

    pub fn with_y_placement_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.y_placement_device = val.into().into();
        self
    }

    pub fn with_x_advance_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.x_advance_device = val.into().into();
        self
    }

    pub fn with_y_advance_device(mut self, val: impl Into<DeviceOrVariationIndex>) -> Self {
        self.y_advance_device = val.into().into();
        self
    }

    pub fn with_explicit_value_format(mut self, format: ValueFormat) -> Self {
        self.set_explicit_value_format(format);
        self
    }

    /// Set an explicit ValueFormat, overriding the computed format.
    ///
    /// Fields that are set but not included in the format are not written.
    pub fn set_explicit_value_format(&mut self, format: ValueFormat) {
        self.explicit_format = Some(format)
    }

    /// The [ValueFormat] of this record.
    pub fn format(&self) -> ValueFormat {
        self.explicit_format
            .unwrap_or_else(|| self.computed_format())
    }

    fn computed_format(&self) -> ValueFormat {
        macro_rules! flag_if_true {
            ($field:expr, $flag:expr) => {
                if $field.is_some() {
                    $flag
                } else {
                    ValueFormat::empty()
                }
            };
        }

        flag_if_true!(self.x_placement, ValueFormat::X_PLACEMENT)
            | flag_if_true!(self.y_placement, ValueFormat::Y_PLACEMENT)
            | flag_if_true!(self.x_advance, ValueFormat::X_ADVANCE)
            | flag_if_true!(self.y_advance, ValueFormat::Y_ADVANCE)
            | flag_if_true!(self.x_placement_device, ValueFormat::X_PLACEMENT_DEVICE)
            | flag_if_true!(self.y_placement_device, ValueFormat::Y_PLACEMENT_DEVICE)
            | flag_if_true!(self.x_advance_device, ValueFormat::X_ADVANCE_DEVICE)
            | flag_if_true!(self.y_advance_device, ValueFormat::Y_ADVANCE_DEVICE)
    }

    /// `true` if no field of this record is set.
    pub fn is_empty(&self) -> bool {
        self.computed_format().is_empty()
    }

    /// Return the number of bytes required to encode this value record
    pub fn encoded_size(&self) -> usize {
        self.format().record_byte_len()
    }

    /// A copy of this record that is written with the given format.
    pub(crate) fn with_format(&self, format: ValueFormat) -> Self {
        let mut result = self.clone();
        result.explicit_format = (result.computed_format() != format).then_some(format);
        result
    }
}

impl FontWrite for ValueFormat {
    fn write_into(&self, writer: &mut TableWriter) {
        self.bits().write_into(writer)
    }
}

impl FontWrite for ValueRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.write_with_format(self.format(), writer)
    }
}

impl ValueRecord {
    /// Write the fields in `format`.
    ///
    /// Fields in the format that this record doesn't set are written as zero
    /// (or as a null offset).
    pub(crate) fn write_with_format(&self, format: ValueFormat, writer: &mut TableWriter) {
        macro_rules! write_field {
            ($field:expr, $flag:expr) => {
                if format.contains($flag) {
                    $field.unwrap_or_default().write_into(writer);
                }
            };
            ($field:expr, $flag:expr, off) => {
                if format.contains($flag) {
                    $field.write_into(writer);
                }
            };
        }

        write_field!(self.x_placement, ValueFormat::X_PLACEMENT);
        write_field!(self.y_placement, ValueFormat::Y_PLACEMENT);
        write_field!(self.x_advance, ValueFormat::X_ADVANCE);
        write_field!(self.y_advance, ValueFormat::Y_ADVANCE);
        write_field!(
            self.x_placement_device,
            ValueFormat::X_PLACEMENT_DEVICE,
            off
        );
        write_field!(
            self.y_placement_device,
            ValueFormat::Y_PLACEMENT_DEVICE,
            off
        );
        write_field!(self.x_advance_device, ValueFormat::X_ADVANCE_DEVICE, off);
        write_field!(self.y_advance_device, ValueFormat::Y_ADVANCE_DEVICE, off);
    }
}

/// The union of the formats of these records.
pub(crate) fn union_format<'a>(records: impl IntoIterator<Item = &'a ValueRecord>) -> ValueFormat {
    records
        .into_iter()
        .fold(ValueFormat::empty(), |acc, rec| acc | rec.format())
}

impl std::fmt::Debug for ValueRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut f = f.debug_struct("ValueRecord");
        self.x_placement.map(|x| f.field("x_placement", &x));
        self.y_placement.map(|y| f.field("y_placement", &y));
        self.x_advance.map(|x| f.field("x_advance", &x));
        self.y_advance.map(|y| f.field("y_advance", &y));
        self.x_placement_device
            .as_ref()
            .map(|x| f.field("x_placement_device", &x));
        self.y_placement_device
            .as_ref()
            .map(|y| f.field("y_placement_device", &y));
        self.x_advance_device
            .as_ref()
            .map(|x| f.field("x_advance_device", &x));
        self.y_advance_device
            .as_ref()
            .map(|y| f.field("y_advance_device", &y));
        if let Some(format) = self.explicit_format {
            f.field("format", &format);
        }
        f.finish()
    }
}

impl Validate for ValueRecord {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("ValueRecord", |ctx| {
            for (name, device) in [
                ("x_placement_device", &self.x_placement_device),
                ("y_placement_device", &self.y_placement_device),
                ("x_advance_device", &self.x_advance_device),
                ("y_advance_device", &self.y_advance_device),
            ] {
                ctx.in_field(name, |ctx| device.validate_impl(ctx));
            }
        })
    }
}

impl FromObjRef<read_gpos::ValueRecord> for ValueRecord {
    fn from_obj_ref(from: &read_gpos::ValueRecord, data: FontData) -> Result<Self, ReadError> {
        let record = ValueRecord {
            explicit_format: None,
            x_placement: from.x_placement,
            y_placement: from.y_placement,
            x_advance: from.x_advance,
            y_advance: from.y_advance,
            x_placement_device: from.x_placement_device(data).to_owned_obj(data)?,
            y_placement_device: from.y_placement_device(data).to_owned_obj(data)?,
            x_advance_device: from.x_advance_device(data).to_owned_obj(data)?,
            y_advance_device: from.y_advance_device(data).to_owned_obj(data)?,
        };
        // keep explicit null device offsets
        Ok(record.with_format(from.format()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::FontRead;
    use types::GlyphId16;

    use crate::tables::{
        gpos::SinglePos,
        layout::{builders::Builder, CoverageTableBuilder, Device, VariationIndex},
    };

    use super::*;

    #[test]
    fn serialize_explicit_value_record() {
        let mut my_record = ValueRecord {
            x_advance: Some(5),
            ..Default::default()
        };
        my_record.set_explicit_value_format(ValueFormat::X_ADVANCE | ValueFormat::X_ADVANCE_DEVICE);
        let bytes = crate::dump_table(&my_record).unwrap();
        assert_eq!(bytes.len(), 4);
        let read_back =
            read_gpos::ValueRecord::read(FontData::new(&bytes), my_record.format()).unwrap();
        assert!(read_back.x_advance_device.is_null());
        assert_eq!(read_back.x_advance, Some(5));
    }

    #[test]
    fn computed_format() {
        let record = ValueRecord::new()
            .with_x_placement(1)
            .with_y_advance(-2)
            .with_x_advance_device(Device::new(10, 11, &[1, -1]));
        assert_eq!(
            record.format(),
            ValueFormat::X_PLACEMENT | ValueFormat::Y_ADVANCE | ValueFormat::X_ADVANCE_DEVICE
        );
        assert_eq!(record.encoded_size(), 6);
        assert!(ValueRecord::new().is_empty());
    }

    #[test]
    fn widened_format_writes_zeros() {
        let record = ValueRecord::new()
            .with_x_advance(7)
            .with_format(ValueFormat::X_PLACEMENT | ValueFormat::X_ADVANCE);
        let bytes = crate::dump_table(&record).unwrap();
        assert_eq!(bytes, [0, 0, 0, 7]);
        // a matching format is not stored
        let same = ValueRecord::new()
            .with_x_advance(7)
            .with_format(ValueFormat::X_ADVANCE);
        assert_eq!(same, ValueRecord::new().with_x_advance(7));
    }

    #[test]
    fn compile_devices() {
        let my_record = ValueRecord::new().with_x_advance_device(VariationIndex::new(0xff, 0xee));
        let a_table = SinglePos::format_1(
            CoverageTableBuilder::from_glyphs([GlyphId16::new(42)]).build(),
            my_record.clone(),
        );

        let bytes = crate::dump_table(&a_table).unwrap();
        let read_back = read_gpos::SinglePos::read(FontData::new(&bytes)).unwrap();
        let read_gpos::SinglePos::Format1(table) = read_back else {
            panic!("wrong format");
        };
        let record: ValueRecord = table
            .value_record()
            .unwrap()
            .to_owned_obj(table.data())
            .unwrap();
        assert!(
            matches!(record.x_advance_device.as_ref(), Some(DeviceOrVariationIndex::VariationIndex(var_idx)) if var_idx.delta_set_inner_index == 0xee)
        );
        assert_eq!(record, my_record);
    }
}
