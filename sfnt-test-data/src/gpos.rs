//! GPOS subtables, hand-assembled.

#[rustfmt::skip]
pub static SINGLEPOSFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x08, //  2: coverage offset
    0x00, 0x02, //  4: value format: y placement
    0xFF, 0xB0, //  6: -80
    0x00, 0x01, 0x00, 0x01, 0x00, 0x52, // 8: coverage [0x52]
];

#[rustfmt::skip]
pub static SINGLEPOSFORMAT2: &[u8] = &[
    0x00, 0x02, //  0: format 2
    0x00, 0x14, //  2: coverage offset
    0x00, 0x05, //  4: value format: x placement | x advance
    0x00, 0x03, //  6: value count
    0x00, 0x00, 0x00, 0x32, //  8: (0, 50)
    0x00, 0x00, 0x00, 0x3C, // 12: (0, 60)
    0xFF, 0xFB, 0x00, 0x46, // 16: (-5, 70)
    0x00, 0x01, 0x00, 0x03, // 20: coverage format 1, 3 glyphs
    0x00, 0x4D, 0x00, 0x4E, 0x00, 0x4F,
];

#[rustfmt::skip]
pub static PAIRPOSFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x16, //  2: coverage offset
    0x00, 0x04, //  4: value format 1: x advance
    0x00, 0x00, //  6: value format 2: empty
    0x00, 0x01, //  8: pair set count
    0x00, 0x0C, // 10: pair set offset
    0x00, 0x02, // 12: pair value count
    0x00, 0x2D, 0xFF, 0xD8, // 14: 0x2D, -40
    0x00, 0x59, 0xFF, 0xE2, // 18: 0x59, -30
    0x00, 0x01, 0x00, 0x01, 0x00, 0x17, // 22: coverage [0x17]
];

#[rustfmt::skip]
pub static PAIRPOSFORMAT2: &[u8] = &[
    0x00, 0x02, //  0: format 2
    0x00, 0x18, //  2: coverage offset
    0x00, 0x04, //  4: value format 1: x advance
    0x00, 0x00, //  6: value format 2: empty
    0x00, 0x1E, //  8: class def 1 offset
    0x00, 0x26, // 10: class def 2 offset
    0x00, 0x02, // 12: class 1 count
    0x00, 0x02, // 14: class 2 count
    0x00, 0x00, 0x00, 0x00, // 16: class 1 = 0
    0x00, 0x00, 0xFF, 0xEC, // 20: class 1 = 1: (0, -20)
    0x00, 0x01, 0x00, 0x01, 0x00, 0x2D, // 24: coverage [0x2D]
    0x00, 0x01, 0x00, 0x2D, 0x00, 0x01, 0x00, 0x01, // 30: class def 1: 0x2D -> 1
    0x00, 0x01, 0x00, 0x6A, 0x00, 0x01, 0x00, 0x01, // 38: class def 2: 0x6A -> 1
];

#[rustfmt::skip]
pub static MARKLIGPOSFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x0C, //  2: mark coverage offset
    0x00, 0x12, //  4: ligature coverage offset
    0x00, 0x01, //  6: mark class count
    0x00, 0x18, //  8: mark array offset
    0x00, 0x24, // 10: ligature array offset
    0x00, 0x01, 0x00, 0x01, 0x03, 0x33, // 12: mark coverage [0x333]
    0x00, 0x01, 0x00, 0x01, 0x01, 0x27, // 18: ligature coverage [0x127]
    0x00, 0x01, 0x00, 0x00, 0x00, 0x06, // 24: mark array: class 0, anchor at +6
    0x00, 0x01, 0x01, 0x26, 0x00, 0x00, // 30: anchor (294, 0)
    0x00, 0x01, 0x00, 0x04, // 36: ligature array: 1 ligature attach at +4
    0x00, 0x02, // 40: component count
    0x00, 0x00, 0x00, 0x06, // 42: component 0 null, component 1 at +6
    0x00, 0x01, 0x01, 0x45, 0x01, 0x00, // 46: anchor (325, 256)
];

#[rustfmt::skip]
pub static MARKMARKPOSFORMAT1: &[u8] = &[
    0x00, 0x01, //  0: format 1
    0x00, 0x0C, //  2: mark 1 coverage offset
    0x00, 0x12, //  4: mark 2 coverage offset
    0x00, 0x01, //  6: mark class count
    0x00, 0x18, //  8: mark 1 array offset
    0x00, 0x24, // 10: mark 2 array offset
    0x00, 0x01, 0x00, 0x01, 0x02, 0x96, // 12: mark 1 coverage [0x296]
    0x00, 0x01, 0x00, 0x01, 0x02, 0x89, // 18: mark 2 coverage [0x289]
    0x00, 0x01, 0x00, 0x00, 0x00, 0x06, // 24: mark array: class 0, anchor at +6
    0x00, 0x01, 0x00, 0xDD, 0x01, 0x8B, // 30: anchor (221, 395)
    0x00, 0x01, 0x00, 0x04, // 36: mark 2 array: 1 row, anchor at +4
    0x00, 0x01, 0x00, 0xDD, 0x01, 0xF4, // 40: anchor (221, 500)
];

#[rustfmt::skip]
pub static ANCHORFORMAT2: &[u8] = &[
    0x00, 0x02, 0x01, 0x42, 0x00, 0x80, // format 2, (322, 128)
    0x00, 0x0D, // anchor point
];

#[rustfmt::skip]
pub static ANCHORFORMAT3: &[u8] = &[
    0x00, 0x03, 0x01, 0x17, 0x05, 0x15, // format 3, (279, 1301)
    0x00, 0x0A, //  6: x device offset
    0x00, 0x12, //  8: y device offset
    0x00, 0x0B, 0x00, 0x0B, 0x00, 0x01, // 10: ppem 11..=11, 2-bit deltas
    0x40, 0x00, // [1]
    0x00, 0x0B, 0x00, 0x0F, 0x00, 0x02, // 18: ppem 11..=15, 4-bit deltas
    0x11, 0x11, 0x10, 0x00, // [1, 1, 1, 1, 1]
];
