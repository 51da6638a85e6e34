//! Coverage tables

use types::{BigEndian, FixedSize, GlyphId16};

use crate::{FontData, FontRead, Format, ReadError};

/// A [Coverage Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table)
///
/// Maps a set of glyphs to a dense range of coverage indices, assigned in
/// ascending glyph order.
#[derive(Clone, Copy, Debug)]
pub enum CoverageTable<'a> {
    Format1(CoverageFormat1<'a>),
    Format2(CoverageFormat2<'a>),
}

/// [Coverage Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-1): individual glyph indices
#[derive(Clone, Copy, Debug)]
pub struct CoverageFormat1<'a> {
    data: FontData<'a>,
    glyph_array: &'a [BigEndian<GlyphId16>],
}

/// [Coverage Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-2): Range of glyphs
#[derive(Clone, Copy, Debug)]
pub struct CoverageFormat2<'a> {
    data: FontData<'a>,
    range_records: &'a [RangeRecord],
}

/// Used in [CoverageFormat2]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct RangeRecord {
    /// First glyph ID in the range
    pub start_glyph_id: BigEndian<GlyphId16>,
    /// Last glyph ID in the range
    pub end_glyph_id: BigEndian<GlyphId16>,
    /// Coverage Index of first glyph ID in range
    pub start_coverage_index: BigEndian<u16>,
}

impl FixedSize for RangeRecord {
    const RAW_BYTE_LEN: usize = GlyphId16::RAW_BYTE_LEN * 2 + u16::RAW_BYTE_LEN;
}

impl Format<u16> for CoverageFormat1<'_> {
    const FORMAT: u16 = 1;
}

impl Format<u16> for CoverageFormat2<'_> {
    const FORMAT: u16 = 2;
}

impl<'a> FontRead<'a> for CoverageTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => FontRead::read(data).map(Self::Format1),
            2 => FontRead::read(data).map(Self::Format2),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> FontRead<'a> for CoverageFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let glyph_count: u16 = cursor.read()?;
        let glyph_array = cursor.read_array(glyph_count as usize)?;
        Ok(CoverageFormat1 { data, glyph_array })
    }
}

impl<'a> FontRead<'a> for CoverageFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let range_count: u16 = cursor.read()?;
        let range_records: &[RangeRecord] = cursor.read_array(range_count as usize)?;
        if range_records
            .iter()
            .any(|rec| rec.start_glyph_id() > rec.end_glyph_id())
        {
            return Err(ReadError::MalformedData("coverage range ends before it starts"));
        }
        Ok(CoverageFormat2 {
            data,
            range_records,
        })
    }
}

impl<'a> CoverageFormat1<'a> {
    /// Array of glyph IDs, in numerical order
    pub fn glyph_array(&self) -> &'a [BigEndian<GlyphId16>] {
        self.glyph_array
    }

    /// The coverage index for this glyph, if it is covered.
    pub fn get(&self, gid: GlyphId16) -> Option<u16> {
        self.glyph_array
            .binary_search_by(|probe| probe.get().cmp(&gid))
            .ok()
            .map(|idx| idx as u16)
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl<'a> CoverageFormat2<'a> {
    /// Array of glyph ranges, ordered by start glyph ID
    pub fn range_records(&self) -> &'a [RangeRecord] {
        self.range_records
    }

    /// The coverage index for this glyph, if it is covered.
    ///
    /// An index that does not fit in a u16 is treated as uncovered.
    pub fn get(&self, gid: GlyphId16) -> Option<u16> {
        let record = self
            .range_records
            .binary_search_by(|rec| {
                if rec.end_glyph_id() < gid {
                    std::cmp::Ordering::Less
                } else if rec.start_glyph_id() > gid {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
            .and_then(|idx| self.range_records.get(idx))?;
        let index = record.start_coverage_index() as u32
            + (gid.to_u16() - record.start_glyph_id().to_u16()) as u32;
        u16::try_from(index).ok()
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl RangeRecord {
    /// First glyph ID in the range
    pub fn start_glyph_id(&self) -> GlyphId16 {
        self.start_glyph_id.get()
    }

    /// Last glyph ID in the range
    pub fn end_glyph_id(&self) -> GlyphId16 {
        self.end_glyph_id.get()
    }

    /// Coverage Index of first glyph ID in range
    pub fn start_coverage_index(&self) -> u16 {
        self.start_coverage_index.get()
    }

    /// Iterate over the glyphs in this range.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId16> {
        (self.start_glyph_id().to_u16()..=self.end_glyph_id().to_u16()).map(GlyphId16::new)
    }
}

impl<'a> CoverageTable<'a> {
    /// The coverage index for this glyph, if it is covered.
    pub fn get(&self, gid: impl Into<GlyphId16>) -> Option<u16> {
        let gid = gid.into();
        match self {
            CoverageTable::Format1(t) => t.get(gid),
            CoverageTable::Format2(t) => t.get(gid),
        }
    }

    /// Iterate over the covered glyphs, in coverage index order.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId16> + 'a {
        // all one expression so that we have a single return type
        let (iter1, iter2) = match *self {
            CoverageTable::Format1(t) => (Some(t.glyph_array.iter().map(|g| g.get())), None),
            CoverageTable::Format2(t) => {
                let iter = t.range_records.iter().flat_map(RangeRecord::iter);
                (None, Some(iter))
            }
        };

        iter1
            .into_iter()
            .flatten()
            .chain(iter2.into_iter().flatten())
    }

    /// The number of covered glyphs.
    pub fn population(&self) -> usize {
        match self {
            CoverageTable::Format1(t) => t.glyph_array.len(),
            CoverageTable::Format2(t) => t
                .range_records
                .iter()
                .map(|rec| rec.iter().count())
                .sum(),
        }
    }

    pub fn format(&self) -> u16 {
        match self {
            CoverageTable::Format1(_) => CoverageFormat1::FORMAT,
            CoverageTable::Format2(_) => CoverageFormat2::FORMAT,
        }
    }

    pub fn data(&self) -> FontData<'a> {
        match self {
            CoverageTable::Format1(t) => t.data,
            CoverageTable::Format2(t) => t.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn format_1() {
        let bytes = be_buffer! { 1u16, 3u16, 5u16, 6u16, 7u16 };
        let coverage = CoverageTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(coverage.get(GlyphId16::new(5)), Some(0));
        assert_eq!(coverage.get(GlyphId16::new(7)), Some(2));
        assert_eq!(coverage.get(GlyphId16::new(4)), None);
        assert_eq!(coverage.iter().map(|g| g.to_u16()).collect::<Vec<_>>(), [5, 6, 7]);
        assert_eq!(coverage.population(), 3);
    }

    #[test]
    fn format_2() {
        let bytes = be_buffer! {
            2u16, 2u16,
            5u16, 8u16, 0u16,
            20u16, 21u16, 4u16
        };
        let coverage = CoverageTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(coverage.get(GlyphId16::new(5)), Some(0));
        assert_eq!(coverage.get(GlyphId16::new(8)), Some(3));
        assert_eq!(coverage.get(GlyphId16::new(21)), Some(5));
        assert_eq!(coverage.get(GlyphId16::new(9)), None);
        assert_eq!(coverage.population(), 6);
    }

    #[test]
    fn format_2_index_saturates() {
        let bytes = be_buffer! { 2u16, 1u16, 100u16, 110u16, 65530u16 };
        let coverage = CoverageTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(coverage.get(GlyphId16::new(104)), Some(65534));
        assert_eq!(coverage.get(GlyphId16::new(105)), Some(u16::MAX));
        assert_eq!(coverage.get(GlyphId16::new(106)), None);
    }

    #[test]
    fn bad_format_and_ranges() {
        let bytes = be_buffer! { 3u16, 0u16 };
        assert_eq!(
            CoverageTable::read(FontData::new(&bytes)).err(),
            Some(ReadError::InvalidFormat(3))
        );
        let bytes = be_buffer! { 2u16, 1u16, 9u16, 8u16, 0u16 };
        assert!(CoverageTable::read(FontData::new(&bytes)).is_err());
        let bytes = be_buffer! { 1u16, 4u16, 5u16 };
        assert_eq!(
            CoverageTable::read(FontData::new(&bytes)).err(),
            Some(ReadError::OutOfBounds)
        );
    }
}
