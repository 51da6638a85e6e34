//! Conversions from parsed tables to their owned, writable equivalents
//!
//! Conversion fails if anything reachable from the source table cannot be
//! parsed: an owned table never silently stands in for data it could not
//! read.

use std::collections::BTreeSet;

use read::{FontData, ReadError};
use types::{BigEndian, Scalar};

use crate::offsets::{NullableOffsetMarker, OffsetMarker};

/// A type that can be built from a parsed table whose offsets are relative
/// to the start of that table.
pub trait FromTableRef<T>: FromObjRef<T> {
    fn from_table_ref(from: &T) -> Result<Self, ReadError> {
        Self::from_obj_ref(from, FontData::EMPTY)
    }
}

/// A type that can be built from a parsed record, given the data against
/// which its offsets are resolved.
pub trait FromObjRef<T: ?Sized>: Sized {
    /// Convert `from` to an instance of `Self`, resolving offsets against `data`.
    fn from_obj_ref(from: &T, data: FontData) -> Result<Self, ReadError>;
}

/// Conversion from a parsed object to its owned version.
///
/// This is blanket-implemented for every [`FromObjRef`] pair.
pub trait ToOwnedObj<T> {
    fn to_owned_obj(&self, data: FontData) -> Result<T, ReadError>;
}

/// Conversion from a self-contained parsed table to its owned version.
pub trait ToOwnedTable<T>: ToOwnedObj<T> {
    fn to_owned_table(&self) -> Result<T, ReadError>;
}

impl<U, T> ToOwnedObj<U> for T
where
    U: FromObjRef<T>,
{
    fn to_owned_obj(&self, data: FontData) -> Result<U, ReadError> {
        U::from_obj_ref(self, data)
    }
}

impl<U, T> ToOwnedTable<U> for T
where
    U: FromTableRef<T>,
{
    fn to_owned_table(&self) -> Result<U, ReadError> {
        U::from_table_ref(self)
    }
}

impl<T> FromObjRef<BigEndian<T>> for T
where
    T: Scalar,
    BigEndian<T>: Copy,
{
    fn from_obj_ref(from: &BigEndian<T>, _: FontData) -> Result<Self, ReadError> {
        Ok(from.get())
    }
}

impl<T, U> FromObjRef<&[U]> for Vec<T>
where
    T: FromObjRef<U>,
{
    fn from_obj_ref(from: &&[U], data: FontData) -> Result<Self, ReadError> {
        from.iter().map(|item| item.to_owned_obj(data)).collect()
    }
}

impl<T, U> FromObjRef<&[U]> for BTreeSet<T>
where
    T: FromObjRef<U> + Ord,
{
    fn from_obj_ref(from: &&[U], data: FontData) -> Result<Self, ReadError> {
        from.iter().map(|item| item.to_owned_obj(data)).collect()
    }
}

impl<T: FromObjRef<U>, U> FromObjRef<Option<U>> for Option<T> {
    fn from_obj_ref(from: &Option<U>, data: FontData) -> Result<Self, ReadError> {
        from.as_ref()
            .map(|inner| T::from_obj_ref(inner, data))
            .transpose()
    }
}

impl<T: FromTableRef<U>, U> FromTableRef<Option<U>> for Option<T> {
    fn from_table_ref(from: &Option<U>) -> Result<Self, ReadError> {
        from.as_ref().map(ToOwnedTable::to_owned_table).transpose()
    }
}

// resolved offsets become offset markers; an offset that fails to resolve
// fails the whole conversion.

impl<T: FromObjRef<U>, U, const N: usize> FromObjRef<Result<U, ReadError>>
    for OffsetMarker<T, N>
{
    fn from_obj_ref(from: &Result<U, ReadError>, data: FontData) -> Result<Self, ReadError> {
        match from {
            Ok(table) => table.to_owned_obj(data).map(OffsetMarker::new),
            Err(e) => Err(e.clone()),
        }
    }
}

impl<T: FromObjRef<U>, U, const N: usize> FromObjRef<Option<Result<U, ReadError>>>
    for NullableOffsetMarker<T, N>
{
    fn from_obj_ref(
        from: &Option<Result<U, ReadError>>,
        data: FontData,
    ) -> Result<Self, ReadError> {
        match from {
            Some(Ok(table)) => table
                .to_owned_obj(data)
                .map(|table| NullableOffsetMarker::new(Some(table))),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(NullableOffsetMarker::new(None)),
        }
    }
}

impl<T: FromTableRef<U>, U, const N: usize> FromTableRef<Result<U, ReadError>>
    for OffsetMarker<T, N>
{
    fn from_table_ref(from: &Result<U, ReadError>) -> Result<Self, ReadError> {
        match from {
            Ok(table) => table.to_owned_table().map(OffsetMarker::new),
            Err(e) => Err(e.clone()),
        }
    }
}

impl<T: FromTableRef<U>, U, const N: usize> FromTableRef<Option<Result<U, ReadError>>>
    for NullableOffsetMarker<T, N>
{
    fn from_table_ref(from: &Option<Result<U, ReadError>>) -> Result<Self, ReadError> {
        match from {
            Some(Ok(table)) => table
                .to_owned_table()
                .map(|table| NullableOffsetMarker::new(Some(table))),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(NullableOffsetMarker::new(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use types::BigEndian;

    use super::*;

    #[test]
    fn unresolved_offsets() {
        let resolved: Result<BigEndian<u16>, ReadError> = Ok(BigEndian::from(7u16));
        let failed: Result<BigEndian<u16>, ReadError> = Err(ReadError::OutOfBounds);

        let marker: OffsetMarker<u16> = resolved.to_owned_obj(FontData::EMPTY).unwrap();
        assert_eq!(*marker, 7);
        let marker: Result<OffsetMarker<u16>, _> = failed.clone().to_owned_obj(FontData::EMPTY);
        assert_eq!(marker.err(), Some(ReadError::OutOfBounds));

        let nullable: Result<NullableOffsetMarker<u16>, _> =
            Some(failed).to_owned_obj(FontData::EMPTY);
        assert_eq!(nullable.err(), Some(ReadError::OutOfBounds));

        let nothing: Option<Result<BigEndian<u16>, ReadError>> = None;
        let nullable: NullableOffsetMarker<u16> = nothing.to_owned_obj(FontData::EMPTY).unwrap();
        assert!(nullable.is_none());
    }

    #[test]
    fn arrays() {
        let raw = [BigEndian::from(3u16), BigEndian::from(1u16), BigEndian::from(3u16)];
        let as_vec: Vec<u16> = raw.as_slice().to_owned_obj(FontData::EMPTY).unwrap();
        assert_eq!(as_vec, [3, 1, 3]);
        let as_set: BTreeSet<u16> = raw.as_slice().to_owned_obj(FontData::EMPTY).unwrap();
        assert_eq!(as_set.into_iter().collect::<Vec<_>>(), [1, 3]);
    }
}
