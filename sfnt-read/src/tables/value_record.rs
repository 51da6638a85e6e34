//! A GPOS ValueRecord

use types::{FixedSize, Nullable, Offset16};

use super::DeviceOrVariationIndex;
use crate::{
    read::ComputeSize, FontData, FontReadWithArgs, ReadArgs, ReadError, ResolveNullableOffset,
};

/// The [ValueFormat](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#value-record)
/// flags, describing which fields are present in a [`ValueRecord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueFormat(u16);

impl ValueFormat {
    /// Includes horizontal adjustment for placement
    pub const X_PLACEMENT: Self = ValueFormat(0x0001);
    /// Includes vertical adjustment for placement
    pub const Y_PLACEMENT: Self = ValueFormat(0x0002);
    /// Includes horizontal adjustment for advance
    pub const X_ADVANCE: Self = ValueFormat(0x0004);
    /// Includes vertical adjustment for advance
    pub const Y_ADVANCE: Self = ValueFormat(0x0008);
    /// Includes Device table (non-variable font) / VariationIndex table
    /// (variable font) for horizontal placement
    pub const X_PLACEMENT_DEVICE: Self = ValueFormat(0x0010);
    /// Includes Device table (non-variable font) / VariationIndex table
    /// (variable font) for vertical placement
    pub const Y_PLACEMENT_DEVICE: Self = ValueFormat(0x0020);
    /// Includes Device table (non-variable font) / VariationIndex table
    /// (variable font) for horizontal advance
    pub const X_ADVANCE_DEVICE: Self = ValueFormat(0x0040);
    /// Includes Device table (non-variable font) / VariationIndex table
    /// (variable font) for vertical advance
    pub const Y_ADVANCE_DEVICE: Self = ValueFormat(0x0080);

    /// A mask with all the device/variation index bits set
    pub const ANY_DEVICE_OR_VARIDX: Self = ValueFormat(0x00F0);

    const ALL_BITS: u16 = 0x00FF;

    pub const fn empty() -> Self {
        ValueFormat(0)
    }

    /// Construct a format from raw bits, clearing the reserved bits.
    pub const fn from_bits_truncate(bits: u16) -> Self {
        ValueFormat(bits & Self::ALL_BITS)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if all the bits in `other` are set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Return the number of bytes required to store a [`ValueRecord`] in this format.
    #[inline]
    pub fn record_byte_len(self) -> usize {
        self.0.count_ones() as usize * u16::RAW_BYTE_LEN
    }
}

impl std::ops::BitOr for ValueFormat {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        ValueFormat(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ValueFormat {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

types::newtype_scalar!(ValueFormat, [u8; 2]);

/// A Positioning ValueRecord.
///
/// Parsing depends on the associated [`ValueFormat`], so these are read
/// eagerly rather than viewed in place. Device offsets are relative to the
/// start of the table that contains the record.
#[derive(Clone, Default, Eq)]
pub struct ValueRecord {
    pub x_placement: Option<i16>,
    pub y_placement: Option<i16>,
    pub x_advance: Option<i16>,
    pub y_advance: Option<i16>,
    pub x_placement_device: Nullable<Offset16>,
    pub y_placement_device: Nullable<Offset16>,
    pub x_advance_device: Nullable<Offset16>,
    pub y_advance_device: Nullable<Offset16>,
    #[doc(hidden)]
    // kept so that a round-tripped record keeps its format
    pub format: ValueFormat,
}

// the format is redundant with the fields, and is not compared
impl PartialEq for ValueRecord {
    fn eq(&self, other: &Self) -> bool {
        self.x_placement == other.x_placement
            && self.y_placement == other.y_placement
            && self.x_advance == other.x_advance
            && self.y_advance == other.y_advance
            && self.x_placement_device == other.x_placement_device
            && self.y_placement_device == other.y_placement_device
            && self.x_advance_device == other.x_advance_device
            && self.y_advance_device == other.y_advance_device
    }
}

impl ValueRecord {
    pub fn read(data: FontData, format: ValueFormat) -> Result<Self, ReadError> {
        let mut this = ValueRecord {
            format,
            ..Default::default()
        };
        let mut cursor = data.cursor();

        if format.contains(ValueFormat::X_PLACEMENT) {
            this.x_placement = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::Y_PLACEMENT) {
            this.y_placement = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::X_ADVANCE) {
            this.x_advance = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::Y_ADVANCE) {
            this.y_advance = Some(cursor.read()?);
        }
        if format.contains(ValueFormat::X_PLACEMENT_DEVICE) {
            this.x_placement_device = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_PLACEMENT_DEVICE) {
            this.y_placement_device = cursor.read()?;
        }
        if format.contains(ValueFormat::X_ADVANCE_DEVICE) {
            this.x_advance_device = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_ADVANCE_DEVICE) {
            this.y_advance_device = cursor.read()?;
        }
        Ok(this)
    }

    /// The format of this record, as read.
    pub fn format(&self) -> ValueFormat {
        self.format
    }

    pub fn x_placement_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.x_placement_device.resolve(data)
    }

    pub fn y_placement_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.y_placement_device.resolve(data)
    }

    pub fn x_advance_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.x_advance_device.resolve(data)
    }

    pub fn y_advance_device<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.y_advance_device.resolve(data)
    }
}

impl ReadArgs for ValueRecord {
    type Args = ValueFormat;
}

impl<'a> FontReadWithArgs<'a> for ValueRecord {
    fn read_with_args(data: FontData<'a>, args: &Self::Args) -> Result<Self, ReadError> {
        ValueRecord::read(data, *args)
    }
}

impl ComputeSize for ValueRecord {
    #[inline]
    fn compute_size(args: &ValueFormat) -> Result<usize, ReadError> {
        Ok(args.record_byte_len())
    }
}

impl std::fmt::Debug for ValueRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut f = f.debug_struct("ValueRecord");
        self.x_placement.map(|x| f.field("x_placement", &x));
        self.y_placement.map(|y| f.field("y_placement", &y));
        self.x_advance.map(|x| f.field("x_advance", &x));
        self.y_advance.map(|y| f.field("y_advance", &y));
        for (name, offset) in [
            ("x_placement_device", self.x_placement_device),
            ("y_placement_device", self.y_placement_device),
            ("x_advance_device", self.x_advance_device),
            ("y_advance_device", self.y_advance_device),
        ] {
            if !offset.is_null() {
                f.field(name, &offset.offset());
            }
        }
        f.finish()
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn fields_follow_format() {
        let format = ValueFormat::X_ADVANCE | ValueFormat::X_ADVANCE_DEVICE;
        assert_eq!(format.record_byte_len(), 4);
        let bytes = be_buffer! { (-20i16), 4u16, 0u16, 0u16, 0x8000u16 };
        let record = ValueRecord::read(FontData::new(&bytes), format).unwrap();
        assert_eq!(record.x_advance, Some(-20));
        assert_eq!(record.x_placement, None);
        assert_eq!(record.format(), format);
        let DeviceOrVariationIndex::VariationIndex(_) = record
            .x_advance_device(FontData::new(&bytes))
            .unwrap()
            .unwrap()
        else {
            panic!("expected variation index");
        };
        assert!(record.y_advance_device(FontData::new(&bytes)).is_none());
    }

    #[test]
    fn truncated() {
        let bytes = [0u8, 1];
        let format = ValueFormat::X_PLACEMENT | ValueFormat::Y_PLACEMENT;
        assert_eq!(
            ValueRecord::read(FontData::new(&bytes), format).err(),
            Some(ReadError::OutOfBounds)
        );
    }

    #[test]
    fn reserved_bits_dropped() {
        assert_eq!(ValueFormat::from_bits_truncate(0xFF05).bits(), 0x0005);
    }
}
