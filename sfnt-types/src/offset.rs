//! Offsets to tables

use crate::Scalar;

/// The width in bytes of an offset type.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OffsetLen {
    Offset16 = 2,
    Offset32 = 4,
}

impl OffsetLen {
    /// The largest offset representable at this width.
    pub const fn max_value(self) -> u32 {
        match self {
            Self::Offset16 => u16::MAX as u32,
            Self::Offset32 => u32::MAX,
        }
    }
}

impl std::fmt::Display for OffsetLen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offset16 => write!(f, "Offset16"),
            Self::Offset32 => write!(f, "Offset32"),
        }
    }
}

/// A trait for the different offset representations.
pub trait Offset: Scalar + Copy {
    /// Returns this offset as a `usize`, or `None` if it is `0`.
    fn non_null(self) -> Option<usize>;
}

macro_rules! impl_offset {
    ($name:ident, $bits:literal, $rawty:ty) => {
        #[doc = concat!("A", stringify!($bits), "-bit offset to a table.")]
        ///
        /// Specific offset fields may or may not permit NULL values; however we
        /// assume that errors are possible, and expect the caller to handle
        /// the `None` case.
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name($rawty);

        impl $name {
            /// Create a new offset.
            #[inline]
            pub const fn new(raw: $rawty) -> Self {
                Self(raw)
            }

            /// Return `true` if this offset is null.
            #[inline]
            pub fn is_null(self) -> bool {
                self.0 == 0
            }

            /// The raw value of the offset.
            #[inline]
            pub const fn to_u32(self) -> u32 {
                self.0 as u32
            }

            /// The width of this offset type, in bytes.
            pub const LEN: OffsetLen = OffsetLen::$name;
        }

        impl Offset for $name {
            #[inline]
            fn non_null(self) -> Option<usize> {
                match self.0 {
                    0 => None,
                    other => Some(other as usize),
                }
            }
        }

        crate::newtype_scalar!($name, <$rawty as crate::Scalar>::Raw);
    };
}

impl_offset!(Offset16, 16, u16);
impl_offset!(Offset32, 32, u32);

/// An offset of a given width for which NULL (zero) is a valid value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nullable<T>(T);

impl<T: Offset> Nullable<T> {
    /// Return the wrapped offset.
    #[inline]
    pub fn offset(&self) -> T {
        self.0
    }

    /// Return `true` if the offset is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.non_null().is_none()
    }
}

impl<T: PartialEq<u32>> PartialEq<u32> for Nullable<T> {
    #[inline]
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl PartialEq<u32> for Offset16 {
    fn eq(&self, other: &u32) -> bool {
        self.to_u32() == *other
    }
}

impl PartialEq<u32> for Offset32 {
    fn eq(&self, other: &u32) -> bool {
        self.to_u32() == *other
    }
}

impl<T: Offset> Scalar for Nullable<T> {
    type Raw = T::Raw;

    #[inline]
    fn from_raw(raw: Self::Raw) -> Self {
        Self(T::from_raw(raw))
    }

    #[inline]
    fn to_raw(self) -> Self::Raw {
        self.0.to_raw()
    }
}

impl<T: Offset> From<T> for Nullable<T> {
    fn from(src: T) -> Self {
        Nullable(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_offsets() {
        assert_eq!(Offset16::new(0).non_null(), None);
        assert_eq!(Offset16::new(12).non_null(), Some(12));
        assert_eq!(Offset32::new(0x10000).non_null(), Some(0x10000));
        assert!(Nullable::from(Offset16::new(0)).is_null());
        assert_eq!(Nullable::from(Offset32::new(8)), 8u32);
    }

    #[test]
    fn widths() {
        assert_eq!(Offset16::LEN as u8, 2);
        assert_eq!(Offset32::LEN.max_value(), u32::MAX);
        assert_eq!(Offset16::LEN.max_value(), 0xFFFF);
    }
}
