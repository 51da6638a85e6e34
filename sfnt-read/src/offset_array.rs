//! Arrays of offsets with dynamic resolution
//!
//! Layout tables are mostly arrays of offsets to further tables. The types
//! here bundle such an array with the data the offsets are relative to, so
//! that items can be resolved as they are accessed.

use types::{BigEndian, Nullable, Offset, Offset16};

use crate::offset::{ResolveNullableOffset, ResolveOffset};
use crate::{FontData, FontReadWithArgs, ReadArgs, ReadError};

/// An array of offsets that can be resolved on access.
pub struct ArrayOfOffsets<'a, T: ReadArgs, O: Offset = Offset16> {
    offsets: &'a [BigEndian<O>],
    data: FontData<'a>,
    args: T::Args,
}

/// An array of nullable offsets that can be resolved on access.
///
/// This is identical to [`ArrayOfOffsets`], except that each offset is
/// allowed to be null.
pub struct ArrayOfNullableOffsets<'a, T: ReadArgs, O: Offset = Offset16> {
    offsets: &'a [BigEndian<Nullable<O>>],
    data: FontData<'a>,
    args: T::Args,
}

// manual impls so that `T` itself need not be `Copy`
impl<T: ReadArgs, O: Offset> Clone for ArrayOfOffsets<'_, T, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ReadArgs, O: Offset> Copy for ArrayOfOffsets<'_, T, O> {}

impl<T: ReadArgs, O: Offset> Clone for ArrayOfNullableOffsets<'_, T, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ReadArgs, O: Offset> Copy for ArrayOfNullableOffsets<'_, T, O> {}

impl<'a, T, O> ArrayOfOffsets<'a, T, O>
where
    O: Offset,
    T: ReadArgs,
{
    pub(crate) fn new(offsets: &'a [BigEndian<O>], data: FontData<'a>, args: T::Args) -> Self {
        Self {
            offsets,
            data,
            args,
        }
    }

    /// The raw offsets.
    pub fn offsets(&self) -> &'a [BigEndian<O>] {
        self.offsets
    }
}

impl<'a, T, O> ArrayOfOffsets<'a, T, O>
where
    O: Offset,
    T: ReadArgs + FontReadWithArgs<'a>,
    T::Args: 'static,
{
    /// The number of offsets in the array
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if the array is empty
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Resolve the offset at the provided index.
    ///
    /// Note: if the index is invalid this will return the `InvalidCollectionIndex`
    /// error variant instead of `None`.
    pub fn get(&self, idx: usize) -> Result<T, ReadError> {
        self.offsets
            .get(idx)
            .ok_or(ReadError::InvalidCollectionIndex(idx as _))
            .and_then(|o| o.get().resolve_with_args(self.data, &self.args))
    }

    /// Iterate over all of the offset targets.
    ///
    /// Each offset will be resolved as it is encountered.
    pub fn iter(&self) -> impl Iterator<Item = Result<T, ReadError>> + 'a {
        let mut iter = self.offsets.iter();
        let args = self.args;
        let data = self.data;
        std::iter::from_fn(move || {
            iter.next()
                .map(|off| off.get().resolve_with_args(data, &args))
        })
    }
}

impl<'a, T, O> ArrayOfNullableOffsets<'a, T, O>
where
    O: Offset,
    T: ReadArgs,
{
    pub(crate) fn new(
        offsets: &'a [BigEndian<Nullable<O>>],
        data: FontData<'a>,
        args: T::Args,
    ) -> Self {
        Self {
            offsets,
            data,
            args,
        }
    }

    /// The raw offsets.
    pub fn offsets(&self) -> &'a [BigEndian<Nullable<O>>] {
        self.offsets
    }
}

impl<'a, T, O> ArrayOfNullableOffsets<'a, T, O>
where
    O: Offset,
    T: ReadArgs + FontReadWithArgs<'a>,
    T::Args: 'static,
{
    /// The number of offsets in the array
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if the array is empty
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Resolve the offset at the provided index.
    ///
    /// This will return `None` only if the offset *exists*, but is null. if the
    /// provided index does not exist, this will return the `InvalidCollectionIndex`
    /// error variant.
    pub fn get(&self, idx: usize) -> Option<Result<T, ReadError>> {
        let Some(offset) = self.offsets.get(idx) else {
            return Some(Err(ReadError::InvalidCollectionIndex(idx as _)));
        };
        offset.get().resolve_with_args(self.data, &self.args)
    }

    /// Iterate over all of the offset targets.
    ///
    /// Each offset will be resolved as it is encountered.
    pub fn iter(&self) -> impl Iterator<Item = Option<Result<T, ReadError>>> + 'a {
        let mut iter = self.offsets.iter();
        let args = self.args;
        let data = self.data;
        std::iter::from_fn(move || {
            iter.next()
                .map(|off| off.get().resolve_with_args(data, &args))
        })
    }
}
