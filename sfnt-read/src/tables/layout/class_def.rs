//! Class definition tables

use types::{BigEndian, FixedSize, GlyphId16};

use crate::{FontData, FontRead, Format, ReadError};

/// A [Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table)
///
/// Glyphs that are not listed are in class 0.
#[derive(Clone, Copy, Debug)]
pub enum ClassDef<'a> {
    Format1(ClassDefFormat1<'a>),
    Format2(ClassDefFormat2<'a>),
}

/// [Class Definition Table Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-1)
#[derive(Clone, Copy, Debug)]
pub struct ClassDefFormat1<'a> {
    data: FontData<'a>,
    start_glyph_id: GlyphId16,
    class_value_array: &'a [BigEndian<u16>],
}

/// [Class Definition Table Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-2)
#[derive(Clone, Copy, Debug)]
pub struct ClassDefFormat2<'a> {
    data: FontData<'a>,
    class_range_records: &'a [ClassRangeRecord],
}

/// Used in [ClassDefFormat2]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::AnyBitPattern)]
#[repr(C)]
#[repr(packed)]
pub struct ClassRangeRecord {
    /// First glyph ID in the range
    pub start_glyph_id: BigEndian<GlyphId16>,
    /// Last glyph ID in the range
    pub end_glyph_id: BigEndian<GlyphId16>,
    /// Applied to all glyphs in the range
    pub class: BigEndian<u16>,
}

impl FixedSize for ClassRangeRecord {
    const RAW_BYTE_LEN: usize = GlyphId16::RAW_BYTE_LEN * 2 + u16::RAW_BYTE_LEN;
}

impl Format<u16> for ClassDefFormat1<'_> {
    const FORMAT: u16 = 1;
}

impl Format<u16> for ClassDefFormat2<'_> {
    const FORMAT: u16 = 2;
}

impl<'a> FontRead<'a> for ClassDef<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => FontRead::read(data).map(Self::Format1),
            2 => FontRead::read(data).map(Self::Format2),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl<'a> FontRead<'a> for ClassDefFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let start_glyph_id = cursor.read()?;
        let glyph_count: u16 = cursor.read()?;
        let class_value_array = cursor.read_array(glyph_count as usize)?;
        Ok(ClassDefFormat1 {
            data,
            start_glyph_id,
            class_value_array,
        })
    }
}

impl<'a> FontRead<'a> for ClassDefFormat2<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>();
        let class_range_count: u16 = cursor.read()?;
        let class_range_records: &[ClassRangeRecord] =
            cursor.read_array(class_range_count as usize)?;
        if class_range_records
            .iter()
            .any(|rec| rec.start_glyph_id() > rec.end_glyph_id())
        {
            return Err(ReadError::MalformedData("class range ends before it starts"));
        }
        Ok(ClassDefFormat2 {
            data,
            class_range_records,
        })
    }
}

impl<'a> ClassDefFormat1<'a> {
    /// First glyph ID of the class_value_array
    pub fn start_glyph_id(&self) -> GlyphId16 {
        self.start_glyph_id
    }

    /// Array of class values, one per glyph ID
    pub fn class_value_array(&self) -> &'a [BigEndian<u16>] {
        self.class_value_array
    }

    pub fn get(&self, gid: GlyphId16) -> u16 {
        gid.to_u16()
            .checked_sub(self.start_glyph_id.to_u16())
            .and_then(|idx| self.class_value_array.get(idx as usize))
            .map(|class| class.get())
            .unwrap_or(0)
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl<'a> ClassDefFormat2<'a> {
    /// Array of ClassRangeRecords, ordered by startGlyphID
    pub fn class_range_records(&self) -> &'a [ClassRangeRecord] {
        self.class_range_records
    }

    pub fn get(&self, gid: GlyphId16) -> u16 {
        self.class_range_records
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
            .and_then(|idx| self.class_range_records.get(idx))
            .map(|rec| rec.class())
            .unwrap_or(0)
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

impl ClassRangeRecord {
    /// First glyph ID in the range
    pub fn start_glyph_id(&self) -> GlyphId16 {
        self.start_glyph_id.get()
    }

    /// Last glyph ID in the range
    pub fn end_glyph_id(&self) -> GlyphId16 {
        self.end_glyph_id.get()
    }

    /// Applied to all glyphs in the range
    pub fn class(&self) -> u16 {
        self.class.get()
    }
}

impl<'a> ClassDef<'a> {
    /// Get the class for this glyph id
    pub fn get(&self, gid: impl Into<GlyphId16>) -> u16 {
        let gid = gid.into();
        match self {
            ClassDef::Format1(table) => table.get(gid),
            ClassDef::Format2(table) => table.get(gid),
        }
    }

    /// Iterate over each glyph and its class.
    ///
    /// Entries explicitly assigned class 0 are included.
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, u16)> + 'a {
        let (one, two) = match *self {
            ClassDef::Format1(table) => {
                let start = table.start_glyph_id.to_u16();
                let iter = table
                    .class_value_array
                    .iter()
                    .enumerate()
                    .map(move |(i, class)| {
                        (GlyphId16::new(start.saturating_add(i as u16)), class.get())
                    });
                (Some(iter), None)
            }
            ClassDef::Format2(table) => {
                let iter = table.class_range_records.iter().flat_map(|rec| {
                    let class = rec.class();
                    (rec.start_glyph_id().to_u16()..=rec.end_glyph_id().to_u16())
                        .map(move |gid| (GlyphId16::new(gid), class))
                });
                (None, Some(iter))
            }
        };
        one.into_iter().flatten().chain(two.into_iter().flatten())
    }

    pub fn format(&self) -> u16 {
        match self {
            ClassDef::Format1(_) => ClassDefFormat1::FORMAT,
            ClassDef::Format2(_) => ClassDefFormat2::FORMAT,
        }
    }

    pub fn data(&self) -> FontData<'a> {
        match self {
            ClassDef::Format1(table) => table.data,
            ClassDef::Format2(table) => table.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::be_buffer;

    use super::*;

    #[test]
    fn format_1() {
        let bytes = be_buffer! { 1u16, 10u16, 3u16, 1u16, 0u16, 2u16 };
        let class_def = ClassDef::read(FontData::new(&bytes)).unwrap();
        assert_eq!(class_def.get(GlyphId16::new(10)), 1);
        assert_eq!(class_def.get(GlyphId16::new(11)), 0);
        assert_eq!(class_def.get(GlyphId16::new(12)), 2);
        assert_eq!(class_def.get(GlyphId16::new(9)), 0);
        assert_eq!(class_def.get(GlyphId16::new(13)), 0);
        assert_eq!(
            class_def.iter().map(|(g, c)| (g.to_u16(), c)).collect::<Vec<_>>(),
            [(10, 1), (11, 0), (12, 2)]
        );
    }

    #[test]
    fn format_2() {
        let bytes = be_buffer! {
            2u16, 2u16,
            3u16, 5u16, 1u16,
            40u16, 40u16, 7u16
        };
        let class_def = ClassDef::read(FontData::new(&bytes)).unwrap();
        assert_eq!(class_def.get(GlyphId16::new(4)), 1);
        assert_eq!(class_def.get(GlyphId16::new(40)), 7);
        assert_eq!(class_def.get(GlyphId16::new(6)), 0);
        assert_eq!(class_def.iter().count(), 4);
    }

    #[test]
    fn malformed() {
        let bytes = be_buffer! { 2u16, 2u16, 3u16, 5u16, 1u16 };
        assert_eq!(
            ClassDef::read(FontData::new(&bytes)).err(),
            Some(ReadError::OutOfBounds)
        );
        let bytes = be_buffer! { 7u16 };
        assert_eq!(
            ClassDef::read(FontData::new(&bytes)).err(),
            Some(ReadError::InvalidFormat(7))
        );
    }
}
