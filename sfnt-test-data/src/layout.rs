//! Layout tables for testing script, feature and lookup selection.

/// A GSUB table with three empty lookups and a `DFLT` script whose default
/// language system requires `ccmp` and lists `liga` and `rlig`.
///
/// Features are `ccmp` → lookup 0, `liga` → lookup 1, `rlig` → lookup 2.
#[rustfmt::skip]
pub static LOOKUP_ORDER_GSUB: &[u8] = &[
    0x00, 0x01, 0x00, 0x00, //  0: version 1.0
    0x00, 0x0A, //  4: script list offset
    0x00, 0x20, //  6: feature list offset (32)
    0x00, 0x46, //  8: lookup list offset (70)
    // 10: script list
    0x00, 0x01, b'D', b'F', b'L', b'T', 0x00, 0x08,
    0x00, 0x04, 0x00, 0x00, // 18: script, default langsys at +4
    // 22: langsys, required feature 0, features 1, 2
    0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x02,
    // 32: feature list
    0x00, 0x03,
    b'c', b'c', b'm', b'p', 0x00, 0x14,
    b'l', b'i', b'g', b'a', 0x00, 0x1A,
    b'r', b'l', b'i', b'g', 0x00, 0x20,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, // 52: ccmp
    0x00, 0x00, 0x00, 0x01, 0x00, 0x01, // 58: liga
    0x00, 0x00, 0x00, 0x01, 0x00, 0x02, // 64: rlig
    // 70: lookup list
    0x00, 0x03, 0x00, 0x08, 0x00, 0x0E, 0x00, 0x14,
    0x00, 0x01, 0x00, 0x00, 0x00, 0x00, // 78: lookup 0
    0x00, 0x04, 0x00, 0x00, 0x00, 0x00, // 84: lookup 1
    0x00, 0x01, 0x00, 0x00, 0x00, 0x00, // 90: lookup 2
];
