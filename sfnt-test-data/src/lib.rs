//! test data shared between the sfnt crates.

pub mod bebuffer;
pub mod gpos;
pub mod gsub;
pub mod layout;

use sfnt_types::{Tag, TT_SFNT_VERSION};

/// Assemble a font file from the provided tables, in the order given.
///
/// This is independent of the writer under test: it computes
/// real checksums but never patches `head`, and it does not sort its input,
/// which allows tests to construct malformed directories.
pub fn assemble_font(sfnt_version: u32, tables: &[(Tag, &[u8])]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let max_pow2 = if num_tables == 0 {
        0
    } else {
        15 - num_tables.leading_zeros() as u16
    };
    let search_range = if num_tables == 0 { 0 } else { (1u16 << max_pow2) * 16 };
    let mut out = Vec::new();
    out.extend(sfnt_version.to_be_bytes());
    out.extend(num_tables.to_be_bytes());
    out.extend(search_range.to_be_bytes());
    out.extend(max_pow2.to_be_bytes());
    out.extend((num_tables * 16 - search_range).to_be_bytes());

    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in tables {
        out.extend(tag.to_be_bytes());
        out.extend(checksum(data).to_be_bytes());
        out.extend((offset as u32).to_be_bytes());
        out.extend((data.len() as u32).to_be_bytes());
        offset += (data.len() + 3) & !3;
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
        out.resize((out.len() + 3) & !3, 0);
    }
    out
}

/// A TrueType-flavoured font built with [`assemble_font`], sorting tables by tag.
pub fn simple_font(tables: &[(Tag, &[u8])]) -> Vec<u8> {
    let mut tables = tables.to_vec();
    tables.sort_by_key(|(tag, _)| *tag);
    assemble_font(TT_SFNT_VERSION, &tables)
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// A 54-byte `head` table with checksum adjustment 0 and units per em 1000.
#[rustfmt::skip]
pub static HEAD: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, // version 1.0
    0x00, 0x02, 0x80, 0x00, // fontRevision 2.5
    0x00, 0x00, 0x00, 0x00, // checksumAdjustment
    0x5F, 0x0F, 0x3C, 0xF5, // magicNumber
    0x00, 0x03,             // flags
    0x03, 0xE8,             // unitsPerEm 1000
    0x00, 0x00, 0x00, 0x00, 0xD5, 0x5C, 0x2E, 0x00, // created
    0x00, 0x00, 0x00, 0x00, 0xD5, 0x5C, 0x2E, 0x01, // modified
    0xFF, 0xCE,             // xMin -50
    0xFF, 0x38,             // yMin -200
    0x03, 0x84,             // xMax 900
    0x03, 0x20,             // yMax 800
    0x00, 0x00,             // macStyle
    0x00, 0x08,             // lowestRecPPEM
    0x00, 0x02,             // fontDirectionHint
    0x00, 0x00,             // indexToLocFormat
    0x00, 0x00,             // glyphDataFormat
];

/// A version 0.5 `maxp` table declaring 12 glyphs.
#[rustfmt::skip]
pub static MAXP_0_5: &[u8] = &[
    0x00, 0x00, 0x50, 0x00, // version 0.5
    0x00, 0x0C,             // numGlyphs
];

/// A version 1.0 `maxp` table declaring 300 glyphs.
#[rustfmt::skip]
pub static MAXP_1_0: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, // version 1.0
    0x01, 0x2C,             // numGlyphs 300
    0x00, 0x40,             // maxPoints
    0x00, 0x04,             // maxContours
    0x00, 0x00,             // maxCompositePoints
    0x00, 0x00,             // maxCompositeContours
    0x00, 0x02,             // maxZones
    0x00, 0x00,             // maxTwilightPoints
    0x00, 0x01,             // maxStorage
    0x00, 0x01,             // maxFunctionDefs
    0x00, 0x00,             // maxInstructionDefs
    0x00, 0x40,             // maxStackElements
    0x00, 0x00,             // maxSizeOfInstructions
    0x00, 0x00,             // maxComponentElements
    0x00, 0x00,             // maxComponentDepth
];
