//! The [maxp](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp) table

use types::Tag;

use crate::{FontData, FontRead, ReadError, TopLevelTable};

/// 'maxp'
pub const TAG: Tag = Tag::new(b"maxp");

/// The version of a `maxp` table used by CFF fonts.
pub const VERSION_0_5: u32 = 0x00005000;
/// The version of a `maxp` table used by TrueType fonts.
pub const VERSION_1_0: u32 = 0x00010000;

/// The [maxp](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp) table
#[derive(Clone, Copy, Debug)]
pub struct Maxp<'a> {
    data: FontData<'a>,
    version: u32,
    num_glyphs: u16,
    v1: Option<MaxpV1>,
}

/// The fields present only in version 1.0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaxpV1 {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

impl TopLevelTable for Maxp<'_> {
    const TAG: Tag = TAG;
}

impl<'a> FontRead<'a> for Maxp<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: u32 = cursor.read()?;
        let num_glyphs = cursor.read()?;
        let v1 = match version {
            VERSION_0_5 => None,
            VERSION_1_0 => Some(MaxpV1 {
                max_points: cursor.read()?,
                max_contours: cursor.read()?,
                max_composite_points: cursor.read()?,
                max_composite_contours: cursor.read()?,
                max_zones: cursor.read()?,
                max_twilight_points: cursor.read()?,
                max_storage: cursor.read()?,
                max_function_defs: cursor.read()?,
                max_instruction_defs: cursor.read()?,
                max_stack_elements: cursor.read()?,
                max_size_of_instructions: cursor.read()?,
                max_component_elements: cursor.read()?,
                max_component_depth: cursor.read()?,
            }),
            other => return Err(ReadError::InvalidFormat(other as _)),
        };
        cursor.finish()?;
        Ok(Maxp {
            data,
            version,
            num_glyphs,
            v1,
        })
    }
}

impl<'a> Maxp<'a> {
    /// The version: 0x00005000 for version 0.5, 0x00010000 for version 1.0.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The number of glyphs in the font.
    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    /// The TrueType limits, present in version 1.0 only.
    pub fn v1(&self) -> Option<&MaxpV1> {
        self.v1.as_ref()
    }

    pub fn data(&self) -> FontData<'a> {
        self.data
    }
}
