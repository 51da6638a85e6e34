//! Fixed-point numbers

/// A 32-bit signed fixed-point number with 16 bits of fraction.
///
/// Used for the `fontRevision` field of the `head` table.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fixed(i32);

impl Fixed {
    /// One.
    pub const ONE: Fixed = Fixed(1 << 16);

    /// Create a fixed point value from its raw bit representation.
    pub const fn from_bits(bits: i32) -> Self {
        Fixed(bits)
    }

    /// The raw bits of this value.
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Create a value from an integer, saturating on overflow.
    pub const fn from_i32(int: i32) -> Self {
        Fixed(int.saturating_mul(1 << 16))
    }

    /// Create a value from an `f64`, rounding to the nearest representable value.
    pub fn from_f64(value: f64) -> Self {
        let scaled = value * 65536.0;
        let rounded = if scaled < 0.0 {
            scaled - 0.5
        } else {
            scaled + 0.5
        };
        Fixed(rounded as i32)
    }

    /// Convert to `f64`.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

crate::newtype_scalar!(Fixed, [u8; 4]);

/// A 16-bit signed fixed-point number with 14 bits of fraction.
///
/// Used for normalized variation coordinates.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct F2Dot14(i16);

impl F2Dot14 {
    pub const ZERO: F2Dot14 = F2Dot14(0);
    pub const ONE: F2Dot14 = F2Dot14(1 << 14);
    pub const MIN_ONE: F2Dot14 = F2Dot14(-(1 << 14));

    pub const fn from_bits(bits: i16) -> Self {
        F2Dot14(bits)
    }

    pub const fn to_bits(self) -> i16 {
        self.0
    }

    /// Create a value from an `f32`, rounding and saturating.
    pub fn from_f32(value: f32) -> Self {
        let scaled = value * 16384.0;
        let rounded = if scaled < 0.0 {
            scaled - 0.5
        } else {
            scaled + 0.5
        };
        // float to int casts saturate
        F2Dot14(rounded as i16)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 16384.0
    }

    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Debug for F2Dot14 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl std::fmt::Display for F2Dot14 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

crate::newtype_scalar!(F2Dot14, [u8; 2]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Fixed::from_i32(1), Fixed::ONE);
        assert_eq!(Fixed::from_f64(1.5).to_bits(), 0x18000);
        assert_eq!(Fixed::from_bits(0x8000).to_f64(), 0.5);
        assert_eq!(Fixed::from_f64(-2.0).to_be_bytes(), [0xff, 0xfe, 0, 0]);
    }

    #[test]
    fn f2dot14() {
        assert_eq!(F2Dot14::from_f32(1.0), F2Dot14::ONE);
        assert_eq!(F2Dot14::from_f32(-1.0), F2Dot14::MIN_ONE);
        assert_eq!(F2Dot14::from_f32(0.5).to_bits(), 0x2000);
        assert_eq!(F2Dot14::from_f32(4.0).to_bits(), i16::MAX);
        assert_eq!(F2Dot14::from_bits(-0x2000).to_be_bytes(), [0xe0, 0x00]);
    }
}
