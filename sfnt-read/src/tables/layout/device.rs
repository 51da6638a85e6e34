//! Device and VariationIndex tables

use types::BigEndian;

use crate::{FontData, FontRead, ReadError};

/// The `deltaFormat` field of a device table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum DeltaFormat {
    /// Signed 2-bit value, 8 values per uint16
    Local2BitDeltas = 0x0001,
    /// Signed 4-bit value, 4 values per uint16
    Local4BitDeltas = 0x0002,
    /// Signed 8-bit value, 2 values per uint16
    Local8BitDeltas = 0x0003,
    /// VariationIndex table, contains a delta-set index pair.
    VariationIndex = 0x8000,
}

impl DeltaFormat {
    /// Parse a raw format value.
    pub fn new(raw: u16) -> Result<Self, ReadError> {
        match raw {
            0x0001 => Ok(Self::Local2BitDeltas),
            0x0002 => Ok(Self::Local4BitDeltas),
            0x0003 => Ok(Self::Local8BitDeltas),
            0x8000 => Ok(Self::VariationIndex),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }

    pub fn to_bits(self) -> u16 {
        self as u16
    }

    /// The number of bits used per delta value, for local formats.
    pub fn bits_per_value(self) -> Option<u16> {
        match self {
            DeltaFormat::Local2BitDeltas => Some(2),
            DeltaFormat::Local4BitDeltas => Some(4),
            DeltaFormat::Local8BitDeltas => Some(8),
            DeltaFormat::VariationIndex => None,
        }
    }

    /// The number of u16 words needed to store deltas for `start..=end`.
    pub fn value_count(self, start_size: u16, end_size: u16) -> usize {
        let Some(bits) = self.bits_per_value() else {
            return 0;
        };
        let range_len = end_size.saturating_add(1).saturating_sub(start_size) as usize;
        let val_per_word = (16 / bits) as usize;
        range_len.div_ceil(val_per_word)
    }
}

/// Either a [Device] table (in a non-variable font) or a [VariationIndex] table (in a variable font)
#[derive(Clone, Copy, Debug)]
pub enum DeviceOrVariationIndex<'a> {
    Device(Device<'a>),
    VariationIndex(VariationIndex<'a>),
}

/// [Device Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#device-and-variationindex-tables)
#[derive(Clone, Copy, Debug)]
pub struct Device<'a> {
    data: FontData<'a>,
    start_size: u16,
    end_size: u16,
    delta_format: DeltaFormat,
    delta_value: &'a [BigEndian<u16>],
}

/// Variation index table
#[derive(Clone, Copy, Debug)]
pub struct VariationIndex<'a> {
    data: FontData<'a>,
    delta_set_outer_index: u16,
    delta_set_inner_index: u16,
}

impl<'a> FontRead<'a> for DeviceOrVariationIndex<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(4)?;
        match DeltaFormat::new(format)? {
            DeltaFormat::VariationIndex => VariationIndex::read(data).map(Self::VariationIndex),
            _ => Device::read(data).map(Self::Device),
        }
    }
}

impl<'a> FontRead<'a> for Device<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let start_size = cursor.read()?;
        let end_size = cursor.read()?;
        let delta_format = DeltaFormat::new(cursor.read()?)?;
        if delta_format == DeltaFormat::VariationIndex {
            return Err(ReadError::InvalidFormat(delta_format.to_bits().into()));
        }
        if end_size < start_size {
            return Err(ReadError::MalformedData("device table ends before it starts"));
        }
        let delta_value = cursor.read_array(delta_format.value_count(start_size, end_size))?;
        Ok(Device {
            data,
            start_size,
            end_size,
            delta_format,
            delta_value,
        })
    }
}

impl<'a> FontRead<'a> for VariationIndex<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let delta_set_outer_index = cursor.read()?;
        let delta_set_inner_index = cursor.read()?;
        let delta_format: u16 = cursor.read()?;
        if delta_format != DeltaFormat::VariationIndex.to_bits() {
            return Err(ReadError::InvalidFormat(delta_format.into()));
        }
        Ok(VariationIndex {
            data,
            delta_set_outer_index,
            delta_set_inner_index,
        })
    }
}

impl<'a> Device<'a> {
    /// Smallest size to correct, in ppem
    pub fn start_size(&self) -> u16 {
        self.start_size
    }

    /// Largest size to correct, in ppem
    pub fn end_size(&self) -> u16 {
        self.end_size
    }

    /// Format of deltaValue array data
    pub fn delta_format(&self) -> DeltaFormat {
        self.delta_format
    }

    /// The packed delta words
    pub fn delta_value(&self) -> &'a [BigEndian<u16>] {
        self.delta_value
    }

    /// The adjustment for this ppem size; zero outside of the table's range.
    pub fn get(&self, ppem: u16) -> i16 {
        let Some(bits) = self.delta_format.bits_per_value() else {
            return 0;
        };
        if ppem < self.start_size || ppem > self.end_size {
            return 0;
        }
        let per_word = 16 / bits;
        let idx = ppem - self.start_size;
        let Some(word) = self.delta_value.get((idx / per_word) as usize) else {
            return 0;
        };
        let shift = 16 - bits * (idx % per_word + 1);
        let mask = (1u16 << bits) - 1;
        let raw = (word.get() >> shift) & mask;
        // sign extend
        if raw >= 1 << (bits - 1) {
            raw as i16 - (1i16 << bits)
        } else {
            raw as i16
        }
    }

    /// Iterate over the deltas for each ppem in `start_size..=end_size`.
    pub fn iter(&self) -> impl Iterator<Item = i16> + '_ {
        (self.start_size..=self.end_size).map(|ppem| self.get(ppem))
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl<'a> VariationIndex<'a> {
    /// A delta-set outer index: used to select an item variation data subtable
    /// within the item variation store.
    pub fn delta_set_outer_index(&self) -> u16 {
        self.delta_set_outer_index
    }

    /// A delta-set inner index: used to select a delta-set row within an item
    /// variation data subtable.
    pub fn delta_set_inner_index(&self) -> u16 {
        self.delta_set_inner_index
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl<'a> DeviceOrVariationIndex<'a> {
    pub fn data(&self) -> FontData<'a> {
        match self {
            DeviceOrVariationIndex::Device(table) => table.data,
            DeviceOrVariationIndex::VariationIndex(table) => table.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn format_2_deltas() {
        // {-1, 0, 3, -8} as 4-bit values: 0xF, 0x0, 0x3, 0x8
        let bytes = be_buffer! { 10u16, 13u16, 2u16, 0xF038u16 };
        let device = Device::read(FontData::new(&bytes)).unwrap();
        assert_eq!(device.iter().collect::<Vec<_>>(), [-1, 0, 3, -8]);
        assert_eq!(device.get(9), 0);
        assert_eq!(device.get(14), 0);
    }

    #[rstest]
    #[case::two_bit(1, 10, 17, 1)]
    #[case::two_bit_partial(1, 10, 18, 2)]
    #[case::four_bit(2, 1, 4, 1)]
    #[case::eight_bit(3, 1, 3, 2)]
    #[case::variation_index(0x8000, 1, 3, 0)]
    fn value_counts(#[case] format: u16, #[case] start: u16, #[case] end: u16, #[case] n: usize) {
        let format = DeltaFormat::new(format).unwrap();
        assert_eq!(format.value_count(start, end), n);
    }

    #[test]
    fn eight_bit_and_two_bit() {
        let bytes = be_buffer! { 12u16, 13u16, 3u16, 0x7F80u16 };
        let device = Device::read(FontData::new(&bytes)).unwrap();
        assert_eq!(device.iter().collect::<Vec<_>>(), [127, -128]);

        // 01 11 10 00 -> 1, -1, -2, 0
        let bytes = be_buffer! { 1u16, 4u16, 1u16, 0b0111_1000_0000_0000u16 };
        let device = Device::read(FontData::new(&bytes)).unwrap();
        assert_eq!(device.iter().collect::<Vec<_>>(), [1, -1, -2, 0]);
    }

    #[test]
    fn variation_index() {
        let bytes = be_buffer! { 2u16, 9u16, 0x8000u16 };
        let table = DeviceOrVariationIndex::read(FontData::new(&bytes)).unwrap();
        let DeviceOrVariationIndex::VariationIndex(idx) = table else {
            panic!("expected variation index");
        };
        assert_eq!((idx.delta_set_outer_index(), idx.delta_set_inner_index()), (2, 9));
    }

    #[test]
    fn bad_device() {
        let bytes = be_buffer! { 1u16, 4u16, 4u16, 0u16 };
        assert_eq!(
            DeviceOrVariationIndex::read(FontData::new(&bytes)).err(),
            Some(ReadError::InvalidFormat(4))
        );
        let bytes = be_buffer! { 5u16, 4u16, 1u16, 0u16 };
        assert!(Device::read(FontData::new(&bytes)).is_err());
        // too few words
        let bytes = be_buffer! { 1u16, 16u16, 1u16, 0u16 };
        assert_eq!(
            Device::read(FontData::new(&bytes)).err(),
            Some(ReadError::OutOfBounds)
        );
    }
}
