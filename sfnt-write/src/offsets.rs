//! compile-time representations of offsets

use crate::write::{FontWrite, TableWriter};

/// The width in bytes of an Offset16
pub const WIDTH_16: usize = 2;
/// The width in bytes of an Offset32
pub const WIDTH_32: usize = 4;

/// An offset to a subtable.
///
/// The generic const `N` is the width of the offset, in bytes. The subtable
/// is written wherever packing puts it, and the offset is filled in then.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetMarker<T, const N: usize = WIDTH_16> {
    obj: T,
}

/// An offset to a subtable which may be null.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NullableOffsetMarker<T, const N: usize = WIDTH_16> {
    obj: Option<T>,
}

impl<T, const N: usize> OffsetMarker<T, N> {
    pub fn new(obj: T) -> Self {
        OffsetMarker { obj }
    }

    /// Replace the subtable.
    pub fn set(&mut self, obj: impl Into<T>) {
        self.obj = obj.into();
    }

    pub fn into_inner(self) -> T {
        self.obj
    }
}

impl<T, const N: usize> NullableOffsetMarker<T, N> {
    pub fn new(obj: Option<T>) -> Self {
        NullableOffsetMarker { obj }
    }

    pub fn set(&mut self, obj: impl Into<T>) {
        self.obj = Some(obj.into());
    }

    /// Make this a null offset.
    pub fn clear(&mut self) {
        self.obj = None;
    }

    pub fn into_inner(self) -> Option<T> {
        self.obj
    }
}

// a null offset is the default for any subtable type
impl<T, const N: usize> Default for NullableOffsetMarker<T, N> {
    fn default() -> Self {
        NullableOffsetMarker { obj: None }
    }
}

impl<T, const N: usize> std::ops::Deref for OffsetMarker<T, N> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl<T, const N: usize> std::ops::DerefMut for OffsetMarker<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.obj
    }
}

impl<T, const N: usize> std::ops::Deref for NullableOffsetMarker<T, N> {
    type Target = Option<T>;
    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl<T, const N: usize> std::ops::DerefMut for NullableOffsetMarker<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.obj
    }
}

impl<T, const N: usize> AsRef<T> for OffsetMarker<T, N> {
    fn as_ref(&self) -> &T {
        &self.obj
    }
}

impl<T: FontWrite, const N: usize> FontWrite for OffsetMarker<T, N> {
    fn write_into(&self, writer: &mut TableWriter) {
        writer.write_offset(&self.obj, N);
    }
}

impl<T: FontWrite, const N: usize> FontWrite for NullableOffsetMarker<T, N> {
    fn write_into(&self, writer: &mut TableWriter) {
        match self.obj.as_ref() {
            Some(obj) => writer.write_offset(obj, N),
            None => writer.write_slice([0u8; N].as_slice()),
        }
    }
}

impl<T, const N: usize> From<T> for OffsetMarker<T, N> {
    fn from(src: T) -> Self {
        OffsetMarker::new(src)
    }
}

impl<T, const N: usize> From<T> for NullableOffsetMarker<T, N> {
    fn from(src: T) -> Self {
        NullableOffsetMarker::new(Some(src))
    }
}

impl<T, const N: usize> From<Option<T>> for NullableOffsetMarker<T, N> {
    fn from(src: Option<T>) -> Self {
        NullableOffsetMarker::new(src)
    }
}

impl<T: std::fmt::Debug, const N: usize> std::fmt::Debug for OffsetMarker<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "OffsetMarker({}, {:?})", N * 8, &self.obj)
    }
}

impl<T: std::fmt::Debug, const N: usize> std::fmt::Debug for NullableOffsetMarker<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "NullableOffsetMarker({}, {:?})", N * 8, &self.obj)
    }
}
