//! The [head](https://docs.microsoft.com/en-us/typography/opentype/spec/head) table

use types::{Fixed, MajorMinor, Tag};

use crate::{FontData, FontRead, ReadError, TopLevelTable};

/// 'head'
pub const TAG: Tag = Tag::new(b"head");

/// The expected value of the `magic_number` field.
pub const MAGIC_NUMBER: u32 = 0x5F0F3CF5;

/// The length in bytes of a version 1.0 `head` table.
pub const HEAD_LEN: usize = 54;

/// The [head](https://docs.microsoft.com/en-us/typography/opentype/spec/head)
/// (font header) table.
#[derive(Clone, Copy, Debug)]
pub struct Head<'a> {
    data: FontData<'a>,
    version: MajorMinor,
    font_revision: Fixed,
    checksum_adjustment: u32,
    flags: u16,
    units_per_em: u16,
    created: i64,
    modified: i64,
    x_min: i16,
    y_min: i16,
    x_max: i16,
    y_max: i16,
    mac_style: u16,
    lowest_rec_ppem: u16,
    font_direction_hint: i16,
    index_to_loc_format: i16,
    glyph_data_format: i16,
}

impl TopLevelTable for Head<'_> {
    const TAG: Tag = TAG;
}

impl<'a> FontRead<'a> for Head<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version = cursor.read()?;
        let font_revision = cursor.read()?;
        let checksum_adjustment = cursor.read()?;
        let magic: u32 = cursor.read()?;
        if magic != MAGIC_NUMBER {
            return Err(ReadError::MalformedData("bad head magic number"));
        }
        let flags = cursor.read()?;
        let units_per_em = cursor.read()?;
        let created = cursor.read()?;
        let modified = cursor.read()?;
        let x_min = cursor.read()?;
        let y_min = cursor.read()?;
        let x_max = cursor.read()?;
        let y_max = cursor.read()?;
        let mac_style = cursor.read()?;
        let lowest_rec_ppem = cursor.read()?;
        let font_direction_hint = cursor.read()?;
        let index_to_loc_format = cursor.read()?;
        let glyph_data_format = cursor.read()?;
        cursor.finish()?;
        Ok(Head {
            data,
            version,
            font_revision,
            checksum_adjustment,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl<'a> Head<'a> {
    /// Version number of the font header table, set to (1, 0)
    pub fn version(&self) -> MajorMinor {
        self.version
    }

    /// Set by font manufacturer.
    pub fn font_revision(&self) -> Fixed {
        self.font_revision
    }

    /// To compute: set it to 0, sum the entire font as uint32, then
    /// store 0xB1B0AFBA - sum.
    pub fn checksum_adjustment(&self) -> u32 {
        self.checksum_adjustment
    }

    /// Set to 0x5F0F3CF5.
    pub fn magic_number(&self) -> u32 {
        MAGIC_NUMBER
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Set to a value from 16 to 16384.
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Number of seconds since 12:00 midnight that started January 1st
    /// 1904 in GMT/UTC time zone.
    pub fn created(&self) -> i64 {
        self.created
    }

    /// Number of seconds since 12:00 midnight that started January 1st
    /// 1904 in GMT/UTC time zone.
    pub fn modified(&self) -> i64 {
        self.modified
    }

    /// Minimum x coordinate across all glyph bounding boxes.
    pub fn x_min(&self) -> i16 {
        self.x_min
    }

    /// Minimum y coordinate across all glyph bounding boxes.
    pub fn y_min(&self) -> i16 {
        self.y_min
    }

    /// Maximum x coordinate across all glyph bounding boxes.
    pub fn x_max(&self) -> i16 {
        self.x_max
    }

    /// Maximum y coordinate across all glyph bounding boxes.
    pub fn y_max(&self) -> i16 {
        self.y_max
    }

    pub fn mac_style(&self) -> u16 {
        self.mac_style
    }

    /// Smallest readable size in pixels.
    pub fn lowest_rec_ppem(&self) -> u16 {
        self.lowest_rec_ppem
    }

    /// Deprecated (Set to 2).
    pub fn font_direction_hint(&self) -> i16 {
        self.font_direction_hint
    }

    /// 0 for short offsets (Offset16), 1 for long (Offset32).
    pub fn index_to_loc_format(&self) -> i16 {
        self.index_to_loc_format
    }

    /// 0 for current format.
    pub fn glyph_data_format(&self) -> i16 {
        self.glyph_data_format
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use sfnt_test_data::{bebuffer::BeBuffer, HEAD};

    use super::*;

    #[test]
    fn read_fixture() {
        let head = Head::read(FontData::new(HEAD)).unwrap();
        assert_eq!(head.version(), MajorMinor::VERSION_1_0);
        assert_eq!(head.font_revision(), Fixed::from_f64(2.5));
        assert_eq!(head.units_per_em(), 1000);
        assert_eq!(head.flags(), 3);
        assert_eq!(
            (head.x_min(), head.y_min(), head.x_max(), head.y_max()),
            (-50, -200, 900, 800)
        );
        assert_eq!(head.modified() - head.created(), 1);
        assert_eq!(head.lowest_rec_ppem(), 8);
        assert_eq!(head.data().len(), HEAD_LEN);
    }

    #[test]
    fn bad_magic() {
        let buf = BeBuffer::new()
            .extend([1u16, 0u16])
            .push(Fixed::from_f64(2.8))
            .extend([0u32, 0xDEADBEEFu32]);
        let mut bytes = buf.into_vec();
        bytes.resize(HEAD_LEN, 0);
        assert_eq!(
            Head::read(FontData::new(&bytes)).err(),
            Some(ReadError::MalformedData("bad head magic number"))
        );
    }

    #[test]
    fn truncated() {
        assert_eq!(
            Head::read(FontData::new(&HEAD[..40])).err(),
            Some(ReadError::OutOfBounds)
        );
    }
}
