//! Lookup qualifiers

use core::ops::{BitOr, BitOrAssign};

/// The [LookupFlag](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookupFlag)
/// field of a lookup table.
///
/// The low byte holds independent flag bits; the high byte holds a mark
/// attachment class, so this is not a plain bit set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupFlag(u16);

impl LookupFlag {
    /// Only meaningful for cursive attachment: the last glyph of a sequence is
    /// positioned on the baseline.
    pub const RIGHT_TO_LEFT: Self = LookupFlag(0x0001);
    /// Skip base glyphs.
    pub const IGNORE_BASE_GLYPHS: Self = LookupFlag(0x0002);
    /// Skip ligatures.
    pub const IGNORE_LIGATURES: Self = LookupFlag(0x0004);
    /// Skip all combining marks.
    pub const IGNORE_MARKS: Self = LookupFlag(0x0008);
    /// The lookup is followed by a `markFilteringSet` field; marks not in
    /// that set are skipped.
    pub const USE_MARK_FILTERING_SET: Self = LookupFlag(0x0010);

    const FLAG_BITS: u16 = 0x001F;
    const RESERVED_BITS: u16 = 0x00E0;
    const MARK_CLASS_BITS: u16 = 0xFF00;

    /// No flags, and no mark attachment class.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Construct a flag from raw bits, clearing the reserved bits.
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & !Self::RESERVED_BITS)
    }

    /// The raw value.
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// `true` if every flag bit set in `other` is also set in `self`.
    ///
    /// The mark attachment class is ignored.
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        let other = other.0 & Self::FLAG_BITS;
        (self.0 & other) == other
    }

    /// Set or clear the flag bits in `other`.
    pub fn set(&mut self, other: Self, value: bool) {
        let bits = other.0 & Self::FLAG_BITS;
        if value {
            self.0 |= bits;
        } else {
            self.0 &= !bits;
        }
    }

    /// The mark attachment class, if one is set.
    ///
    /// When set, marks of any other attachment class are skipped.
    pub fn mark_attachment_class(self) -> Option<u16> {
        match (self.0 & Self::MARK_CLASS_BITS) >> 8 {
            0 => None,
            class => Some(class),
        }
    }

    /// Set the mark attachment class; only the low byte of `class` is used.
    pub fn set_mark_attachment_class(&mut self, class: u16) {
        self.0 = (self.0 & !Self::MARK_CLASS_BITS) | ((class & 0xFF) << 8);
    }
}

// combining two flags with different mark classes produces a meaningless class;
// callers only combine flag bits in practice.
impl BitOr for LookupFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LookupFlag {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

types::newtype_scalar!(LookupFlag, [u8; 2]);
