//! the [GPOS] table
//!
//! [GPOS]: https://docs.microsoft.com/en-us/typography/opentype/spec/gpos

#[path = "./value_record.rs"]
mod value_record;

use types::{BigEndian, FixedSize, GlyphId16, MajorMinor, Nullable, Offset16, Tag};

pub use super::layout::{
    ChainedSequenceContext, ClassDef, CoverageTable, Device, DeviceOrVariationIndex,
    ExtensionFormat1 as ExtensionPosFormat1, FeatureList, FeatureVariations, Lookup, LookupList,
    ScriptList, SequenceContext,
};
use super::layout::{LayoutHeader, LayoutTable, LookupSubtable};
use crate::{
    ArrayOfNullableOffsets, ArrayOfOffsets, FontData, FontRead, FontReadWithArgs, ReadArgs,
    ReadError, ResolveNullableOffset, ResolveOffset, TopLevelTable,
};
pub use value_record::{ValueFormat, ValueRecord};

/// 'GPOS'
pub const TAG: Tag = Tag::new(b"GPOS");

/// The lookup type of extension positioning lookups.
pub const EXTENSION_LOOKUP_TYPE: u16 = 9;

/// A typed GPOS [LookupList] table
pub type PositionLookupList<'a> = LookupList<'a, PositionSubtable<'a>>;

/// A lookup in the GPOS table
pub type PositionLookup<'a> = Lookup<'a, PositionSubtable<'a>>;

/// [GPOS Version 1.0](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#gpos-header)
#[derive(Clone, Copy, Debug)]
pub struct Gpos<'a> {
    header: LayoutHeader<'a>,
}

impl TopLevelTable for Gpos<'_> {
    const TAG: Tag = TAG;
}

impl<'a> FontRead<'a> for Gpos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        LayoutHeader::read(data).map(|header| Gpos { header })
    }
}

impl<'a> Gpos<'a> {
    /// The major and minor version of the GPOS table, as a tuple (u16, u16)
    pub fn version(&self) -> MajorMinor {
        self.header.version
    }

    /// The script list; a null offset is read as an empty list.
    pub fn script_list(&self) -> Result<ScriptList<'a>, ReadError> {
        self.header.script_list()
    }

    /// The feature list; a null offset is read as an empty list.
    pub fn feature_list(&self) -> Result<FeatureList<'a>, ReadError> {
        self.header.feature_list()
    }

    /// The lookup list; a null offset is read as an empty list.
    pub fn lookup_list(&self) -> Result<PositionLookupList<'a>, ReadError> {
        self.header.lookup_list()
    }

    /// The FeatureVariations table, present in version 1.1 only.
    pub fn feature_variations(&self) -> Option<Result<FeatureVariations<'a>, ReadError>> {
        self.header.feature_variations()
    }

    pub fn data(&self) -> FontData<'a> {
        self.header.data
    }
}

impl<'a> LayoutTable<'a> for Gpos<'a> {
    type Subtable = PositionSubtable<'a>;

    fn script_list(&self) -> Result<ScriptList<'a>, ReadError> {
        self.header.script_list()
    }

    fn feature_list(&self) -> Result<FeatureList<'a>, ReadError> {
        self.header.feature_list()
    }

    fn lookup_list(&self) -> Result<PositionLookupList<'a>, ReadError> {
        self.header.lookup_list()
    }
}

/// A GPOS lookup subtable, as selected by the lookup type.
///
/// Extension subtables are resolved to the subtable they wrap.
#[derive(Clone, Copy, Debug)]
pub enum PositionSubtable<'a> {
    Single(SinglePos<'a>),
    Pair(PairPos<'a>),
    Cursive(CursivePosFormat1<'a>),
    MarkToBase(MarkBasePosFormat1<'a>),
    MarkToLig(MarkLigPosFormat1<'a>),
    MarkToMark(MarkMarkPosFormat1<'a>),
    Contextual(SequenceContext<'a>),
    ChainContextual(ChainedSequenceContext<'a>),
}

impl ReadArgs for PositionSubtable<'_> {
    type Args = u16;
}

impl<'a> FontReadWithArgs<'a> for PositionSubtable<'a> {
    fn read_with_args(data: FontData<'a>, lookup_type: &u16) -> Result<Self, ReadError> {
        match *lookup_type {
            1 => SinglePos::read(data).map(Self::Single),
            2 => PairPos::read(data).map(Self::Pair),
            3 => CursivePosFormat1::read(data).map(Self::Cursive),
            4 => MarkBasePosFormat1::read(data).map(Self::MarkToBase),
            5 => MarkLigPosFormat1::read(data).map(Self::MarkToLig),
            6 => MarkMarkPosFormat1::read(data).map(Self::MarkToMark),
            7 => SequenceContext::read(data).map(Self::Contextual),
            8 => ChainedSequenceContext::read(data).map(Self::ChainContextual),
            EXTENSION_LOOKUP_TYPE => ExtensionPosFormat1::read(data)?.resolve(),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> LookupSubtable<'a> for PositionSubtable<'a> {
    const EXTENSION_TYPE: u16 = EXTENSION_LOOKUP_TYPE;
}

impl<'a> PositionSubtable<'a> {
    /// The lookup type of this subtable.
    ///
    /// For resolved extension subtables, this is the wrapped type.
    pub fn lookup_type(&self) -> u16 {
        match self {
            PositionSubtable::Single(_) => 1,
            PositionSubtable::Pair(_) => 2,
            PositionSubtable::Cursive(_) => 3,
            PositionSubtable::MarkToBase(_) => 4,
            PositionSubtable::MarkToLig(_) => 5,
            PositionSubtable::MarkToMark(_) => 6,
            PositionSubtable::Contextual(_) => 7,
            PositionSubtable::ChainContextual(_) => 8,
        }
    }
}

fn read_format(data: FontData, expected: u16) -> Result<(), ReadError> {
    let format: u16 = data.read_at(0)?;
    if format != expected {
        return Err(ReadError::InvalidFormat(format.into()));
    }
    Ok(())
}

/// [Anchor Tables](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-tables)
/// position one glyph with respect to another.
#[derive(Clone, Copy, Debug)]
pub enum AnchorTable<'a> {
    Format1(AnchorFormat1),
    Format2(AnchorFormat2),
    Format3(AnchorFormat3<'a>),
}

/// [Anchor Table Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-table-format-1-design-units): Design Units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorFormat1 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
}

/// [Anchor Table Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-table-format-2-design-units-plus-contour-point): Design Units Plus Contour Point
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorFormat2 {
    pub x_coordinate: i16,
    pub y_coordinate: i16,
    /// Index to glyph contour point
    pub anchor_point: u16,
}

/// [Anchor Table Format 3]()https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-table-format-3-design-units-plus-device-or-variationindex-tables): Design Units Plus Device or VariationIndex Tables
#[derive(Clone, Copy, Debug)]
pub struct AnchorFormat3<'a> {
    data: FontData<'a>,
    x_coordinate: i16,
    y_coordinate: i16,
    x_device_offset: Nullable<Offset16>,
    y_device_offset: Nullable<Offset16>,
}

impl<'a> FontRead<'a> for AnchorTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        let x_coordinate = cursor.read()?;
        let y_coordinate = cursor.read()?;
        let table = match format {
            1 => AnchorTable::Format1(AnchorFormat1 {
                x_coordinate,
                y_coordinate,
            }),
            2 => AnchorTable::Format2(AnchorFormat2 {
                x_coordinate,
                y_coordinate,
                anchor_point: cursor.read()?,
            }),
            3 => AnchorTable::Format3(AnchorFormat3 {
                data,
                x_coordinate,
                y_coordinate,
                x_device_offset: cursor.read()?,
                y_device_offset: cursor.read()?,
            }),
            other => return Err(ReadError::InvalidFormat(other.into())),
        };
        cursor.finish()?;
        Ok(table)
    }
}

impl<'a> AnchorFormat3<'a> {
    pub fn x_coordinate(&self) -> i16 {
        self.x_coordinate
    }

    pub fn y_coordinate(&self) -> i16 {
        self.y_coordinate
    }

    pub fn x_device_offset(&self) -> Nullable<Offset16> {
        self.x_device_offset
    }

    pub fn y_device_offset(&self) -> Nullable<Offset16> {
        self.y_device_offset
    }

    /// The `Device` or `VariationIndex` table for the x coordinate, if present
    pub fn x_device(&self) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.x_device_offset.resolve(self.data)
    }

    /// The `Device` or `VariationIndex` table for the y coordinate, if present
    pub fn y_device(&self) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        self.y_device_offset.resolve(self.data)
    }
}

impl<'a> AnchorTable<'a> {
    pub fn x_coordinate(&self) -> i16 {
        match self {
            AnchorTable::Format1(table) => table.x_coordinate,
            AnchorTable::Format2(table) => table.x_coordinate,
            AnchorTable::Format3(table) => table.x_coordinate,
        }
    }

    pub fn y_coordinate(&self) -> i16 {
        match self {
            AnchorTable::Format1(table) => table.y_coordinate,
            AnchorTable::Format2(table) => table.y_coordinate,
            AnchorTable::Format3(table) => table.y_coordinate,
        }
    }

    /// Attempt to resolve the `Device` or `VariationIndex` table for the
    /// x_coordinate, if present
    pub fn x_device(&self) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        match self {
            AnchorTable::Format3(inner) => inner.x_device(),
            _ => None,
        }
    }

    /// Attempt to resolve the `Device` or `VariationIndex` table for the
    /// y_coordinate, if present
    pub fn y_device(&self) -> Option<Result<DeviceOrVariationIndex<'a>, ReadError>> {
        match self {
            AnchorTable::Format3(inner) => inner.y_device(),
            _ => None,
        }
    }
}

/// LookupType 1: [Single Adjustment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-1-single-adjustment-positioning-subtable) Positioning Subtable
#[derive(Clone, Copy, Debug)]
pub enum SinglePos<'a> {
    Format1(SinglePosFormat1<'a>),
    Format2(SinglePosFormat2<'a>),
}

impl<'a> FontRead<'a> for SinglePos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => SinglePosFormat1::read(data).map(Self::Format1),
            2 => SinglePosFormat2::read(data).map(Self::Format2),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> SinglePos<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        match self {
            SinglePos::Format1(table) => table.coverage(),
            SinglePos::Format2(table) => table.coverage(),
        }
    }

    /// The adjustment for this glyph, if it is covered.
    pub fn get(&self, gid: GlyphId16) -> Result<Option<ValueRecord>, ReadError> {
        let Some(index) = self.coverage()?.get(gid) else {
            return Ok(None);
        };
        match self {
            SinglePos::Format1(table) => table.value_record().map(Some),
            SinglePos::Format2(table) => table.value_record(index).map(Some),
        }
    }

    /// The data that device offsets in this subtable's value records are relative to.
    pub fn data(&self) -> FontData<'a> {
        match self {
            SinglePos::Format1(table) => table.data,
            SinglePos::Format2(table) => table.data,
        }
    }
}

/// [Single Adjustment Positioning Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#single-adjustment-positioning-format-1-single-positioning-value): Single Positioning Value
#[derive(Clone, Copy, Debug)]
pub struct SinglePosFormat1<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    value_format: ValueFormat,
}

const SINGLE_POS_FORMAT1_HEADER_LEN: usize = 6;

impl<'a> FontRead<'a> for SinglePosFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        read_format(data, 1)?;
        let coverage_offset = data.read_at(2)?;
        let value_format: ValueFormat = data.read_at(4)?;
        data.check_in_bounds(SINGLE_POS_FORMAT1_HEADER_LEN + value_format.record_byte_len())?;
        Ok(SinglePosFormat1 {
            data,
            coverage_offset,
            value_format,
        })
    }
}

impl<'a> SinglePosFormat1<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    pub fn value_format(&self) -> ValueFormat {
        self.value_format
    }

    /// The adjustment applied to every covered glyph
    pub fn value_record(&self) -> Result<ValueRecord, ReadError> {
        self.data
            .split_off(SINGLE_POS_FORMAT1_HEADER_LEN)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|data| ValueRecord::read(data, self.value_format))
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// [Single Adjustment Positioning Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#single-adjustment-positioning-format-2-array-of-positioning-values): Array of Positioning Values
#[derive(Clone, Copy, Debug)]
pub struct SinglePosFormat2<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    value_format: ValueFormat,
    value_count: u16,
}

const SINGLE_POS_FORMAT2_HEADER_LEN: usize = 8;

impl<'a> FontRead<'a> for SinglePosFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        read_format(data, 2)?;
        let coverage_offset = data.read_at(2)?;
        let value_format: ValueFormat = data.read_at(4)?;
        let value_count: u16 = data.read_at(6)?;
        let values_len = value_format.record_byte_len() * value_count as usize;
        data.check_in_bounds(SINGLE_POS_FORMAT2_HEADER_LEN + values_len)?;
        Ok(SinglePosFormat2 {
            data,
            coverage_offset,
            value_format,
            value_count,
        })
    }
}

impl<'a> SinglePosFormat2<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    pub fn value_format(&self) -> ValueFormat {
        self.value_format
    }

    /// Number of ValueRecords; this must equal glyphCount in the Coverage table.
    pub fn value_count(&self) -> u16 {
        self.value_count
    }

    /// The value record at this coverage index.
    pub fn value_record(&self, index: u16) -> Result<ValueRecord, ReadError> {
        if index >= self.value_count {
            return Err(ReadError::InvalidCollectionIndex(index.into()));
        }
        let pos =
            SINGLE_POS_FORMAT2_HEADER_LEN + index as usize * self.value_format.record_byte_len();
        self.data
            .split_off(pos)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|data| ValueRecord::read(data, self.value_format))
    }

    /// Iterate over the value records, in coverage order.
    pub fn value_records(&self) -> impl Iterator<Item = Result<ValueRecord, ReadError>> + '_ {
        (0..self.value_count).map(|i| self.value_record(i))
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// Lookup Type 2: [Pair Adjustment](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#lookup-type-2-pair-adjustment-positioning-subtable) Positioning Subtable
#[derive(Clone, Copy, Debug)]
pub enum PairPos<'a> {
    Format1(PairPosFormat1<'a>),
    Format2(PairPosFormat2<'a>),
}

impl<'a> FontRead<'a> for PairPos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => PairPosFormat1::read(data).map(Self::Format1),
            2 => PairPosFormat2::read(data).map(Self::Format2),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> PairPos<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        match self {
            PairPos::Format1(table) => table.coverage(),
            PairPos::Format2(table) => table.coverage(),
        }
    }

    pub fn value_format1(&self) -> ValueFormat {
        match self {
            PairPos::Format1(table) => table.value_format1,
            PairPos::Format2(table) => table.value_format1,
        }
    }

    pub fn value_format2(&self) -> ValueFormat {
        match self {
            PairPos::Format1(table) => table.value_format2,
            PairPos::Format2(table) => table.value_format2,
        }
    }
}

/// [Pair Adjustment Positioning Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#pair-adjustment-positioning-format-1-adjustments-for-glyph-pairs): Adjustments for Glyph Pairs
#[derive(Clone, Copy, Debug)]
pub struct PairPosFormat1<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    value_format1: ValueFormat,
    value_format2: ValueFormat,
    pair_set_offsets: &'a [BigEndian<Offset16>],
}

impl<'a> FontRead<'a> for PairPosFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let value_format1 = cursor.read()?;
        let value_format2 = cursor.read()?;
        let pair_set_count: u16 = cursor.read()?;
        let pair_set_offsets = cursor.read_array(pair_set_count as usize)?;
        Ok(PairPosFormat1 {
            data,
            coverage_offset,
            value_format1,
            value_format2,
            pair_set_offsets,
        })
    }
}

impl<'a> PairPosFormat1<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    /// Defines the types of data in valueRecord1, for the first glyph in the pair
    pub fn value_format1(&self) -> ValueFormat {
        self.value_format1
    }

    /// Defines the types of data in valueRecord2, for the second glyph in the pair
    pub fn value_format2(&self) -> ValueFormat {
        self.value_format2
    }

    /// One pair set per covered first glyph, ordered by coverage index.
    pub fn pair_sets(&self) -> ArrayOfOffsets<'a, PairSet<'a>> {
        ArrayOfOffsets::new(
            self.pair_set_offsets,
            self.data,
            (self.value_format1, self.value_format2),
        )
    }

    /// The adjustments for a pair of glyphs, if the pair is present.
    pub fn get(
        &self,
        first: GlyphId16,
        second: GlyphId16,
    ) -> Option<Result<PairValueRecord, ReadError>> {
        let index = match self.coverage() {
            Ok(coverage) => coverage.get(first)?,
            Err(e) => return Some(Err(e)),
        };
        match self.pair_sets().get(index as usize) {
            Ok(set) => set.get(second),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Part of [PairPosFormat1]
///
/// Device offsets in the value records are relative to the start of the pair set.
#[derive(Clone, Copy, Debug)]
pub struct PairSet<'a> {
    data: FontData<'a>,
    value_format1: ValueFormat,
    value_format2: ValueFormat,
    pair_value_count: u16,
}

impl ReadArgs for PairSet<'_> {
    type Args = (ValueFormat, ValueFormat);
}

impl<'a> FontReadWithArgs<'a> for PairSet<'a> {
    fn read_with_args(
        data: FontData<'a>,
        args: &(ValueFormat, ValueFormat),
    ) -> Result<Self, ReadError> {
        let (value_format1, value_format2) = *args;
        let pair_value_count: u16 = data.read_at(0)?;
        let this = PairSet {
            data,
            value_format1,
            value_format2,
            pair_value_count,
        };
        data.check_in_bounds(u16::RAW_BYTE_LEN + this.record_len() * pair_value_count as usize)?;
        Ok(this)
    }
}

impl<'a> PairSet<'a> {
    fn record_len(&self) -> usize {
        GlyphId16::RAW_BYTE_LEN
            + self.value_format1.record_byte_len()
            + self.value_format2.record_byte_len()
    }

    fn record_pos(&self, index: u16) -> usize {
        u16::RAW_BYTE_LEN + index as usize * self.record_len()
    }

    /// Number of PairValueRecords
    pub fn pair_value_count(&self) -> u16 {
        self.pair_value_count
    }

    /// The record at this index.
    pub fn pair_value_record(&self, index: u16) -> Result<PairValueRecord, ReadError> {
        if index >= self.pair_value_count {
            return Err(ReadError::InvalidCollectionIndex(index.into()));
        }
        let mut pos = self.record_pos(index);
        let second_glyph = self.data.read_at(pos)?;
        pos += GlyphId16::RAW_BYTE_LEN;
        let rest = self.data.split_off(pos).ok_or(ReadError::OutOfBounds)?;
        let value_record1 = ValueRecord::read(rest, self.value_format1)?;
        let rest = rest
            .split_off(self.value_format1.record_byte_len())
            .ok_or(ReadError::OutOfBounds)?;
        let value_record2 = ValueRecord::read(rest, self.value_format2)?;
        Ok(PairValueRecord {
            second_glyph,
            value_record1,
            value_record2,
        })
    }

    /// Iterate over the records, ordered by second glyph.
    pub fn pair_value_records(
        &self,
    ) -> impl Iterator<Item = Result<PairValueRecord, ReadError>> + '_ {
        (0..self.pair_value_count).map(|i| self.pair_value_record(i))
    }

    /// The record for this second glyph, if present.
    pub fn get(&self, second: GlyphId16) -> Option<Result<PairValueRecord, ReadError>> {
        let (mut lo, mut hi) = (0u16, self.pair_value_count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let glyph: GlyphId16 = match self.data.read_at(self.record_pos(mid)) {
                Ok(glyph) => glyph,
                Err(e) => return Some(Err(e)),
            };
            match glyph.cmp(&second) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Some(self.pair_value_record(mid)),
            }
        }
        None
    }

    /// The data that device offsets in this set's value records are relative to.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// Part of [PairSet]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairValueRecord {
    /// Glyph ID of second glyph in the pair
    pub second_glyph: GlyphId16,
    /// Positioning data for the first glyph in the pair
    pub value_record1: ValueRecord,
    /// Positioning data for the second glyph in the pair
    pub value_record2: ValueRecord,
}

/// [Pair Adjustment Positioning Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#pair-adjustment-positioning-format-2-class-pair-adjustment): Class Pair Adjustment
///
/// Device offsets in the value records are relative to the start of this subtable.
#[derive(Clone, Copy, Debug)]
pub struct PairPosFormat2<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    value_format1: ValueFormat,
    value_format2: ValueFormat,
    class_def1_offset: Offset16,
    class_def2_offset: Offset16,
    class1_count: u16,
    class2_count: u16,
}

const PAIR_POS_FORMAT2_HEADER_LEN: usize = 16;

impl<'a> FontRead<'a> for PairPosFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let value_format1 = cursor.read()?;
        let value_format2 = cursor.read()?;
        let class_def1_offset = cursor.read()?;
        let class_def2_offset = cursor.read()?;
        let class1_count = cursor.read()?;
        let class2_count = cursor.read()?;
        cursor.finish()?;
        let this = PairPosFormat2 {
            data,
            coverage_offset,
            value_format1,
            value_format2,
            class_def1_offset,
            class_def2_offset,
            class1_count,
            class2_count,
        };
        let matrix_len = this.class2_record_len() * class1_count as usize * class2_count as usize;
        data.check_in_bounds(PAIR_POS_FORMAT2_HEADER_LEN + matrix_len)?;
        Ok(this)
    }
}

impl<'a> PairPosFormat2<'a> {
    fn class2_record_len(&self) -> usize {
        self.value_format1.record_byte_len() + self.value_format2.record_byte_len()
    }

    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    pub fn value_format1(&self) -> ValueFormat {
        self.value_format1
    }

    pub fn value_format2(&self) -> ValueFormat {
        self.value_format2
    }

    /// ClassDef table for the first glyph of the pair
    pub fn class_def1(&self) -> Result<ClassDef<'a>, ReadError> {
        self.class_def1_offset.resolve(self.data)
    }

    /// ClassDef table for the second glyph of the pair
    pub fn class_def2(&self) -> Result<ClassDef<'a>, ReadError> {
        self.class_def2_offset.resolve(self.data)
    }

    /// Number of classes in classDef1 table, including class 0
    pub fn class1_count(&self) -> u16 {
        self.class1_count
    }

    /// Number of classes in classDef2 table, including class 0
    pub fn class2_count(&self) -> u16 {
        self.class2_count
    }

    /// The value records for a pair of classes.
    pub fn get(&self, class1: u16, class2: u16) -> Result<(ValueRecord, ValueRecord), ReadError> {
        if class1 >= self.class1_count {
            return Err(ReadError::InvalidCollectionIndex(class1.into()));
        }
        if class2 >= self.class2_count {
            return Err(ReadError::InvalidCollectionIndex(class2.into()));
        }
        let index = class1 as usize * self.class2_count as usize + class2 as usize;
        let pos = PAIR_POS_FORMAT2_HEADER_LEN + index * self.class2_record_len();
        let rest = self.data.split_off(pos).ok_or(ReadError::OutOfBounds)?;
        let record1 = ValueRecord::read(rest, self.value_format1)?;
        let rest = rest
            .split_off(self.value_format1.record_byte_len())
            .ok_or(ReadError::OutOfBounds)?;
        let record2 = ValueRecord::read(rest, self.value_format2)?;
        Ok((record1, record2))
    }

    /// The value records for a pair of glyphs, if the first glyph is covered.
    pub fn get_for_glyphs(
        &self,
        first: GlyphId16,
        second: GlyphId16,
    ) -> Result<Option<(ValueRecord, ValueRecord)>, ReadError> {
        if self.coverage()?.get(first).is_none() {
            return Ok(None);
        }
        let class1 = self.class_def1()?.get(first);
        let class2 = self.class_def2()?.get(second);
        self.get(class1, class2).map(Some)
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// [Cursive Attachment Positioning Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#cursive-attachment-positioning-format1-cursive-attachment)
#[derive(Clone, Copy, Debug)]
pub struct CursivePosFormat1<'a> {
    data: FontData<'a>,
    coverage_offset: Offset16,
    entry_exit_records: &'a [EntryExitRecord],
}

impl<'a> FontRead<'a> for CursivePosFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        read_format(data, 1)?;
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let coverage_offset = cursor.read()?;
        let count: u16 = cursor.read()?;
        let entry_exit_records = cursor.read_array(count as usize)?;
        Ok(CursivePosFormat1 {
            data,
            coverage_offset,
            entry_exit_records,
        })
    }
}

impl<'a> CursivePosFormat1<'a> {
    pub fn coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
        self.coverage_offset.resolve(self.data)
    }

    /// Array of EntryExit records, in Coverage index order.
    pub fn entry_exit_records(&self) -> &'a [EntryExitRecord] {
        self.entry_exit_records
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// Part of [CursivePosFormat1]
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct EntryExitRecord {
    /// Offset to entryAnchor table, from beginning of CursivePos subtable.
    pub entry_anchor_offset: BigEndian<Nullable<Offset16>>,
    /// Offset to exitAnchor table, from beginning of CursivePos subtable.
    pub exit_anchor_offset: BigEndian<Nullable<Offset16>>,
}

impl FixedSize for EntryExitRecord {
    const RAW_BYTE_LEN: usize = Offset16::RAW_BYTE_LEN * 2;
}

impl EntryExitRecord {
    /// The entry anchor, if any; `data` is the parent subtable.
    pub fn entry_anchor<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<AnchorTable<'a>, ReadError>> {
        self.entry_anchor_offset.get().resolve(data)
    }

    /// The exit anchor, if any; `data` is the parent subtable.
    pub fn exit_anchor<'a>(
        &self,
        data: FontData<'a>,
    ) -> Option<Result<AnchorTable<'a>, ReadError>> {
        self.exit_anchor_offset.get().resolve(data)
    }
}

/// Part of [MarkArray]
#[derive(Clone, Copy, Debug, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct MarkRecord {
    /// Class defined for the associated mark.
    pub mark_class: BigEndian<u16>,
    /// Offset to Anchor table, from beginning of MarkArray table.
    pub mark_anchor_offset: BigEndian<Offset16>,
}

impl FixedSize for MarkRecord {
    const RAW_BYTE_LEN: usize = u16::RAW_BYTE_LEN + Offset16::RAW_BYTE_LEN;
}

impl MarkRecord {
    pub fn mark_class(&self) -> u16 {
        self.mark_class.get()
    }

    pub fn mark_anchor_offset(&self) -> Offset16 {
        self.mark_anchor_offset.get()
    }
}

/// [Mark Array](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#mark-array-table)
#[derive(Clone, Copy, Debug)]
pub struct MarkArray<'a> {
    data: FontData<'a>,
    mark_records: &'a [MarkRecord],
}

impl<'a> FontRead<'a> for MarkArray<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let mark_count: u16 = cursor.read()?;
        let mark_records = cursor.read_array(mark_count as usize)?;
        Ok(MarkArray { data, mark_records })
    }
}

impl<'a> MarkArray<'a> {
    /// Array of MarkRecords, ordered by corresponding glyphs in the
    /// associated mark Coverage table.
    pub fn mark_records(&self) -> &'a [MarkRecord] {
        self.mark_records
    }

    /// The class and anchor of the mark at this coverage index.
    pub fn get(&self, index: u16) -> Result<(u16, AnchorTable<'a>), ReadError> {
        let record = self
            .mark_records
            .get(index as usize)
            .ok_or(ReadError::InvalidCollectionIndex(index.into()))?;
        let anchor = record.mark_anchor_offset().resolve(self.data)?;
        Ok((record.mark_class(), anchor))
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

/// A matrix of nullable anchor offsets, one row per glyph (or per ligature
/// component) and one column per mark class.
///
/// This is the layout of the [BaseArray], [Mark2Array], and [LigatureAttach]
/// tables. Reading it requires the mark class count.
#[derive(Clone, Copy, Debug)]
pub struct AnchorMatrix<'a> {
    data: FontData<'a>,
    class_count: u16,
    anchor_offsets: &'a [BigEndian<Nullable<Offset16>>],
}

/// Part of [MarkBasePosFormat1]
pub type BaseArray<'a> = AnchorMatrix<'a>;
/// Part of [MarkMarkPosFormat1]
pub type Mark2Array<'a> = AnchorMatrix<'a>;
/// Part of [MarkLigPosFormat1]; one row per ligature component.
pub type LigatureAttach<'a> = AnchorMatrix<'a>;

impl ReadArgs for AnchorMatrix<'_> {
    type Args = u16;
}

impl<'a> FontReadWithArgs<'a> for AnchorMatrix<'a> {
    fn read_with_args(data: FontData<'a>, class_count: &u16) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let row_count: u16 = cursor.read()?;
        let anchor_offsets = cursor.read_array(row_count as usize * *class_count as usize)?;
        Ok(AnchorMatrix {
            data,
            class_count: *class_count,
            anchor_offsets,
        })
    }
}

impl<'a> AnchorMatrix<'a> {
    /// The number of rows.
    pub fn row_count(&self) -> u16 {
        match self.class_count {
            0 => 0,
            n => (self.anchor_offsets.len() / n as usize) as u16,
        }
    }

    /// The number of mark classes, which is the number of columns.
    pub fn class_count(&self) -> u16 {
        self.class_count
    }

    /// The anchor offsets of one row, one per mark class.
    pub fn row(&self, row: u16) -> Option<&'a [BigEndian<Nullable<Offset16>>]> {
        let start = row as usize * self.class_count as usize;
        self.anchor_offsets
            .get(start..start + self.class_count as usize)
    }

    /// The anchors of one row, one per mark class; `None` for null anchors.
    pub fn anchors(&self, row: u16) -> Option<ArrayOfNullableOffsets<'a, AnchorTable<'a>>> {
        self.row(row)
            .map(|offsets| ArrayOfNullableOffsets::new(offsets, self.data, ()))
    }

    /// The anchor at this row and mark class.
    ///
    /// Returns `None` if the anchor is null or the class is out of range.
    pub fn get(&self, row: u16, class: u16) -> Option<Result<AnchorTable<'a>, ReadError>> {
        if class >= self.class_count {
            return None;
        }
        let Some(row) = self.row(row) else {
            return Some(Err(ReadError::InvalidCollectionIndex(row.into())));
        };
        row.get(class as usize)?.get().resolve(self.data)
    }
}

/// Part of [MarkLigPosFormat1]
#[derive(Clone, Copy, Debug)]
pub struct LigatureArray<'a> {
    data: FontData<'a>,
    class_count: u16,
    ligature_attach_offsets: &'a [BigEndian<Offset16>],
}

impl ReadArgs for LigatureArray<'_> {
    type Args = u16;
}

impl<'a> FontReadWithArgs<'a> for LigatureArray<'a> {
    fn read_with_args(data: FontData<'a>, class_count: &u16) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let ligature_count: u16 = cursor.read()?;
        let ligature_attach_offsets = cursor.read_array(ligature_count as usize)?;
        Ok(LigatureArray {
            data,
            class_count: *class_count,
            ligature_attach_offsets,
        })
    }
}

impl<'a> LigatureArray<'a> {
    /// One entry per covered ligature, ordered by coverage index.
    pub fn ligature_attaches(&self) -> ArrayOfOffsets<'a, LigatureAttach<'a>> {
        ArrayOfOffsets::new(self.ligature_attach_offsets, self.data, self.class_count)
    }
}

/// The header shared by the three mark attachment subtables.
macro_rules! mark_attachment {
    (
        $(#[$attrs:meta])*
        $name:ident {
            $mark_coverage:ident,
            $base_coverage:ident,
            $mark_array:ident,
            $base_array:ident: $base_ty:ident,
        }
    ) => {
        $(#[$attrs])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            data: FontData<'a>,
            mark_coverage_offset: Offset16,
            base_coverage_offset: Offset16,
            mark_class_count: u16,
            mark_array_offset: Offset16,
            base_array_offset: Offset16,
        }

        impl<'a> FontRead<'a> for $name<'a> {
            fn read(data: FontData<'a>) -> Result<Self, ReadError> {
                read_format(data, 1)?;
                let mut cursor = data.cursor();
                cursor.advance::<u16>();
                let this = $name {
                    data,
                    mark_coverage_offset: cursor.read()?,
                    base_coverage_offset: cursor.read()?,
                    mark_class_count: cursor.read()?,
                    mark_array_offset: cursor.read()?,
                    base_array_offset: cursor.read()?,
                };
                cursor.finish()?;
                Ok(this)
            }
        }

        impl<'a> $name<'a> {
            pub fn $mark_coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
                self.mark_coverage_offset.resolve(self.data)
            }

            pub fn $base_coverage(&self) -> Result<CoverageTable<'a>, ReadError> {
                self.base_coverage_offset.resolve(self.data)
            }

            /// Number of defined mark classes
            pub fn mark_class_count(&self) -> u16 {
                self.mark_class_count
            }

            pub fn $mark_array(&self) -> Result<MarkArray<'a>, ReadError> {
                self.mark_array_offset.resolve(self.data)
            }

            pub fn $base_array(&self) -> Result<$base_ty<'a>, ReadError> {
                self.base_array_offset
                    .resolve_with_args(self.data, &self.mark_class_count)
            }

            /// The class and anchor of this mark glyph, if it is covered.
            pub fn mark_anchor(
                &self,
                mark: GlyphId16,
            ) -> Option<Result<(u16, AnchorTable<'a>), ReadError>> {
                let index = match self.$mark_coverage() {
                    Ok(coverage) => coverage.get(mark)?,
                    Err(e) => return Some(Err(e)),
                };
                Some(self.$mark_array().and_then(|array| array.get(index)))
            }

            pub fn data(&self) -> FontData<'a> {
                self.data
            }
        }
    };
}

mark_attachment!(
    /// [Mark-to-Base Attachment Positioning Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#mark-to-base-attachment-positioning-format-1-mark-to-base-attachment-point)
    MarkBasePosFormat1 {
        mark_coverage,
        base_coverage,
        mark_array,
        base_array: BaseArray,
    }
);

mark_attachment!(
    /// [Mark-to-Ligature Positioning Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#mark-to-ligature-attachment-positioning-format-1-mark-to-ligature-attachment)
    MarkLigPosFormat1 {
        mark_coverage,
        ligature_coverage,
        mark_array,
        ligature_array: LigatureArray,
    }
);

mark_attachment!(
    /// [Mark-to-Mark Attachment Positioning Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gpos#mark-to-mark-attachment-positioning-format-1-mark-to-mark-attachment)
    MarkMarkPosFormat1 {
        mark1_coverage,
        mark2_coverage,
        mark1_array,
        mark2_array: Mark2Array,
    }
);

impl<'a> MarkBasePosFormat1<'a> {
    /// The anchor for this mark class on this base glyph.
    pub fn base_anchor(
        &self,
        base: GlyphId16,
        class: u16,
    ) -> Option<Result<AnchorTable<'a>, ReadError>> {
        let index = match self.base_coverage() {
            Ok(coverage) => coverage.get(base)?,
            Err(e) => return Some(Err(e)),
        };
        match self.base_array() {
            Ok(array) => array.get(index, class),
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a> MarkLigPosFormat1<'a> {
    /// The anchor for this mark class on one component of this ligature.
    pub fn ligature_anchor(
        &self,
        ligature: GlyphId16,
        component: u16,
        class: u16,
    ) -> Option<Result<AnchorTable<'a>, ReadError>> {
        let index = match self.ligature_coverage() {
            Ok(coverage) => coverage.get(ligature)?,
            Err(e) => return Some(Err(e)),
        };
        let attach = self
            .ligature_array()
            .and_then(|array| array.ligature_attaches().get(index as usize));
        match attach {
            Ok(attach) => attach.get(component, class),
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a> MarkMarkPosFormat1<'a> {
    /// The anchor for this mark class on this base mark.
    pub fn mark2_anchor(
        &self,
        mark2: GlyphId16,
        class: u16,
    ) -> Option<Result<AnchorTable<'a>, ReadError>> {
        let index = match self.mark2_coverage() {
            Ok(coverage) => coverage.get(mark2)?,
            Err(e) => return Some(Err(e)),
        };
        match self.mark2_array() {
            Ok(array) => array.get(index, class),
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::gpos as test_data;

    use super::*;

    fn gid(raw: u16) -> GlyphId16 {
        GlyphId16::new(raw)
    }

    #[test]
    fn single_pos_format1() {
        let table = SinglePos::read(FontData::new(test_data::SINGLEPOSFORMAT1)).unwrap();
        let SinglePos::Format1(inner) = table else {
            panic!("wrong format");
        };
        assert_eq!(inner.value_format(), ValueFormat::Y_PLACEMENT);
        let record = table.get(gid(0x52)).unwrap().unwrap();
        assert_eq!(record.y_placement, Some(-80));
        assert!(table.get(gid(0x51)).unwrap().is_none());
    }

    #[test]
    fn single_pos_format2() {
        let table = SinglePos::read(FontData::new(test_data::SINGLEPOSFORMAT2)).unwrap();
        let SinglePos::Format2(inner) = table else {
            panic!("wrong format");
        };
        assert_eq!(inner.value_count(), 3);
        let advances = inner
            .value_records()
            .map(|rec| rec.unwrap().x_advance.unwrap())
            .collect::<Vec<_>>();
        assert_eq!(advances, [50, 60, 70]);
        assert_eq!(
            table.get(gid(0x4F)).unwrap().unwrap().x_placement,
            Some(-5)
        );
        assert!(inner.value_record(3).is_err());
    }

    #[test]
    fn pair_pos_format1() {
        let table = PairPos::read(FontData::new(test_data::PAIRPOSFORMAT1)).unwrap();
        let PairPos::Format1(inner) = table else {
            panic!("wrong format");
        };
        let set = inner.pair_sets().get(0).unwrap();
        assert_eq!(set.pair_value_count(), 2);
        let rec = inner.get(gid(0x17), gid(0x59)).unwrap().unwrap();
        assert_eq!(rec.value_record1.x_advance, Some(-30));
        assert_eq!(rec.value_record2.x_placement, None);
        let rec = inner.get(gid(0x17), gid(0x2D)).unwrap().unwrap();
        assert_eq!(rec.value_record1.x_advance, Some(-40));
        assert!(inner.get(gid(0x17), gid(0x30)).is_none());
        assert!(inner.get(gid(0x18), gid(0x2D)).is_none());
    }

    #[test]
    fn pair_pos_format2() {
        let table = PairPos::read(FontData::new(test_data::PAIRPOSFORMAT2)).unwrap();
        let PairPos::Format2(inner) = table else {
            panic!("wrong format");
        };
        assert_eq!((inner.class1_count(), inner.class2_count()), (2, 2));
        let (first, _) = inner.get(1, 1).unwrap();
        assert_eq!(first.x_advance, Some(-20));
        let (first, _) = inner.get_for_glyphs(gid(0x2D), gid(0x6A)).unwrap().unwrap();
        assert_eq!(first.x_advance, Some(-20));
        let (first, _) = inner.get_for_glyphs(gid(0x2D), gid(0x10)).unwrap().unwrap();
        assert_eq!(first.x_advance, Some(0));
        assert!(inner.get(2, 0).is_err());
    }

    #[test]
    fn mark_to_ligature() {
        let table = MarkLigPosFormat1::read(FontData::new(test_data::MARKLIGPOSFORMAT1)).unwrap();
        assert_eq!(table.mark_class_count(), 1);
        let (class, anchor) = table.mark_anchor(gid(0x333)).unwrap().unwrap();
        assert_eq!(class, 0);
        assert_eq!((anchor.x_coordinate(), anchor.y_coordinate()), (294, 0));

        let anchor = table.ligature_anchor(gid(0x127), 1, 0).unwrap().unwrap();
        assert_eq!(anchor.x_coordinate(), 325);
        // the first component has no anchor
        assert!(table.ligature_anchor(gid(0x127), 0, 0).is_none());
        assert!(table.ligature_anchor(gid(0x127), 2, 0).unwrap().is_err());
        assert!(table.ligature_anchor(gid(0x128), 0, 0).is_none());
    }

    #[test]
    fn mark_to_mark() {
        let table =
            MarkMarkPosFormat1::read(FontData::new(test_data::MARKMARKPOSFORMAT1)).unwrap();
        let (class, anchor) = table.mark_anchor(gid(0x296)).unwrap().unwrap();
        assert_eq!(class, 0);
        let AnchorTable::Format1(anchor) = anchor else {
            panic!("wrong anchor format");
        };
        assert_eq!(anchor.y_coordinate, 395);
        let anchor = table.mark2_anchor(gid(0x289), 0).unwrap().unwrap();
        assert_eq!(anchor.y_coordinate(), 500);
        assert!(table.mark2_anchor(gid(0x289), 1).is_none());
    }

    #[test]
    fn anchor_formats() {
        let anchor = AnchorTable::read(FontData::new(test_data::ANCHORFORMAT2)).unwrap();
        let AnchorTable::Format2(inner) = anchor else {
            panic!("wrong format");
        };
        assert_eq!(inner.anchor_point, 13);

        let anchor = AnchorTable::read(FontData::new(test_data::ANCHORFORMAT3)).unwrap();
        assert_eq!(anchor.x_coordinate(), 279);
        let Some(Ok(DeviceOrVariationIndex::Device(device))) = anchor.x_device() else {
            panic!("missing device");
        };
        assert_eq!(device.get(11), 1);
        assert!(anchor.y_device().is_some());
    }

    #[test]
    fn cursive_attachment() {
        let bytes = sfnt_test_data::be_buffer! {
            1u16, 14u16, 2u16,
            0u16, 22u16,
            28u16, 22u16,
            // coverage at 14
            1u16, 2u16, 4u16, 5u16,
            // anchors at 22 and 28
            1u16, 10u16, 20u16,
            1u16, (-5i16), 0u16
        };
        let table = PositionSubtable::read_with_args(FontData::new(&bytes), &3).unwrap();
        assert_eq!(table.lookup_type(), 3);
        let PositionSubtable::Cursive(table) = table else {
            panic!("wrong lookup type");
        };
        assert_eq!(table.coverage().unwrap().get(gid(5)), Some(1));
        let [first, second] = table.entry_exit_records() else {
            panic!("wrong record count");
        };
        assert!(first.entry_anchor(table.data()).is_none());
        let exit = first.exit_anchor(table.data()).unwrap().unwrap();
        assert_eq!((exit.x_coordinate(), exit.y_coordinate()), (10, 20));
        let entry = second.entry_anchor(table.data()).unwrap().unwrap();
        assert_eq!(entry.x_coordinate(), -5);
    }

    #[test]
    fn chained_and_unknown_lookup_types() {
        let bytes = sfnt_test_data::be_buffer! {
            3u16, 0u16, 1u16, 12u16, 0u16, 0u16,
            1u16, 1u16, 5u16
        };
        let table = PositionSubtable::read_with_args(FontData::new(&bytes), &8).unwrap();
        assert!(matches!(table, PositionSubtable::ChainContextual(_)));
        assert!(PositionSubtable::read_with_args(FontData::new(&bytes), &10).is_err());
    }
}
