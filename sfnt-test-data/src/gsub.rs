//! GSUB subtables, hand-assembled.

#[rustfmt::skip]
pub static SINGLESUBSTFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x06, //  2: coverage offset
    0x00, 0x02, //  4: delta glyph id
    0x00, 0x01, 0x00, 0x03, // 6: coverage format 1, 3 glyphs
    0x00, 0x02, 0x00, 0x03, 0x00, 0x04,
];

#[rustfmt::skip]
pub static SINGLESUBSTFORMAT2: &[u8] = &[
    0x00, 0x02, //  0: format 2
    0x00, 0x0C, //  2: coverage offset
    0x00, 0x03, //  4: glyph count
    0x00, 0x0A, 0x00, 0x14, 0x00, 0x1E, // 6: 10, 20, 30
    0x00, 0x01, 0x00, 0x03, // 12: coverage format 1, 3 glyphs
    0x00, 0x01, 0x00, 0x02, 0x00, 0x05,
];

#[rustfmt::skip]
pub static MULTIPLESUBSTFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x08, //  2: coverage offset
    0x00, 0x01, //  4: sequence count
    0x00, 0x0E, //  6: sequence offset
    0x00, 0x01, 0x00, 0x01, 0x00, 0xF1, // 8: coverage [241]
    0x00, 0x03, // 14: glyph count
    0x00, 0x1A, 0x00, 0x1A, 0x00, 0x1D, // 26, 26, 29
];

#[rustfmt::skip]
pub static ALTERNATESUBSTFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x08, //  2: coverage offset
    0x00, 0x01, //  4: alternate set count
    0x00, 0x0E, //  6: alternate set offset
    0x00, 0x01, 0x00, 0x01, 0x00, 0x3A, // 8: coverage [58]
    0x00, 0x02, // 14: glyph count
    0x00, 0x3B, 0x00, 0x3C, // 59, 60
];

#[rustfmt::skip]
pub static LIGATURESUBSTFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x0A, //  2: coverage offset
    0x00, 0x02, //  4: ligature set count
    0x00, 0x12, //  6: ligature set offset (18)
    0x00, 0x26, //  8: ligature set offset (38)
    0x00, 0x01, 0x00, 0x02, 0x00, 0x19, 0x00, 0x1A, // 10: coverage [25, 26]
    // 18: ligature set
    0x00, 0x02, 0x00, 0x06, 0x00, 0x0E,
    0x01, 0x5B, 0x00, 0x03, 0x00, 0x28, 0x00, 0x29, // 24: lig 347 = 25 40 41
    0x01, 0x5C, 0x00, 0x02, 0x00, 0x2A, // 32: lig 348 = 25 42
    // 38: ligature set
    0x00, 0x01, 0x00, 0x04,
    0x01, 0x5D, 0x00, 0x02, 0x00, 0x1B, // 42: lig 349 = 26 27
];

/// A GSUB table with a single substitution lookup and an extension lookup
/// wrapping a ligature substitution.
#[rustfmt::skip]
pub static GSUB_WITH_EXTENSION: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, //  0: version 1.0
    0x00, 0x0A, //  4: script list offset
    0x00, 0x1E, //  6: feature list offset (30)
    0x00, 0x2E, //  8: lookup list offset (46)
    // 10: script list
    0x00, 0x01, b'D', b'F', b'L', b'T', 0x00, 0x08,
    0x00, 0x04, 0x00, 0x00, // 18: script, default langsys at +4
    0x00, 0x00, 0xFF, 0xFF, 0x00, 0x01, 0x00, 0x00, // 22: langsys
    // 30: feature list
    0x00, 0x01, b'l', b'i', b'g', b'a', 0x00, 0x08,
    0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, // 38: feature, lookups 0 and 1
    // 46: lookup list
    0x00, 0x02, 0x00, 0x06, 0x00, 0x1A,
    // 52: lookup 0, type 1, ignore marks
    0x00, 0x01, 0x00, 0x08, 0x00, 0x01, 0x00, 0x08,
    0x00, 0x01, 0x00, 0x06, 0x00, 0x01, // 60: single subst, delta 1
    0x00, 0x01, 0x00, 0x01, 0x00, 0x05, // 66: coverage [5]
    // 72: lookup 1, type 7
    0x00, 0x07, 0x00, 0x00, 0x00, 0x01, 0x00, 0x08,
    0x00, 0x01, 0x00, 0x04, 0x00, 0x00, 0x00, 0x08, // 80: extension to type 4
    0x00, 0x01, 0x00, 0x08, 0x00, 0x01, 0x00, 0x0E, // 88: ligature subst
    0x00, 0x01, 0x00, 0x01, 0x00, 0x05, // 96: coverage [5]
    0x00, 0x01, 0x00, 0x04, // 102: ligature set
    0x00, 0x64, 0x00, 0x02, 0x00, 0x06, // 106: lig 100 = 5 6
];
