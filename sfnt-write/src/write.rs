use types::{OffsetLen, Scalar};

use crate::error::{Error, PackingError};
use crate::graph::{Graph, ObjectId, ObjectStore};
use crate::table_type::TableType;
use crate::validate::Validate;

/// A type that that can be written out as part of a font file.
///
/// This both handles writing big-endian bytes as well as describing the
/// relationship between tables and their subtables.
pub trait FontWrite {
    /// Write our data and information about offsets into this [TableWriter].
    fn write_into(&self, writer: &mut TableWriter);

    /// The type of this table, if it needs special handling when packing.
    fn table_type(&self) -> TableType {
        TableType::Unknown
    }
}

/// An object that manages a collection of serialized tables.
///
/// This handles deduplicating objects and tracking offsets.
#[derive(Debug)]
pub struct TableWriter {
    /// Finished tables, associated with an ObjectId; duplicate tables share an id.
    tables: ObjectStore,
    /// The table currently being written.
    ///
    /// Subtables are written as they are encountered; the parent's partial
    /// data is held on the call stack while this happens.
    current: TableData,
}

/// Attempt to serialize a table.
///
/// The table is validated, compiled into a graph of subtables, and packed so
/// that every offset is in range. If the table is malformed this returns
/// [`Error::ValidationFailed`]; if no packing is found it returns
/// [`Error::PackingFailed`].
pub fn dump_table<T: FontWrite + Validate>(table: &T) -> Result<Vec<u8>, Error> {
    log::trace!("writing table '{:?}'", table.table_type());
    table.validate()?;
    let mut graph = TableWriter::make_graph(table);

    if !graph.pack_objects() {
        return Err(Error::PackingFailed(PackingError {
            graph: graph.into(),
        }));
    }
    Ok(graph.serialize())
}

impl TableWriter {
    /// Compile a table and all of its subtables into a graph.
    pub(crate) fn make_graph(root: &impl FontWrite) -> Graph {
        let mut writer = TableWriter::default();
        let root_id = writer.add_table(root);
        Graph::from_obj_store(writer.tables, root_id)
    }

    fn add_table(&mut self, table: &dyn FontWrite) -> ObjectId {
        let parent = std::mem::replace(&mut self.current, TableData::new(table.table_type()));
        table.write_into(self);
        let data = std::mem::replace(&mut self.current, parent);
        self.tables.add(data)
    }

    /// Write raw bytes into this table.
    ///
    /// The caller is responsible for ensuring bytes are in big-endian order.
    #[inline]
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.current.write_bytes(bytes)
    }

    /// Create an offset to another table.
    ///
    /// The `width` argument is the size in bytes of the offset, e.g. 2 for
    /// an `Offset16`, and 4 for an `Offset32`.
    ///
    /// The provided table will be serialized immediately, and the position
    /// of the offset within the current table will be recorded. Offsets
    /// are resolved when the root table object is serialized, at which point
    /// we overwrite each recorded offset position with the final offset of the
    /// appropriate table.
    pub fn write_offset(&mut self, obj: &dyn FontWrite, width: usize) {
        let obj_id = self.add_table(obj);
        self.current.add_offset(obj_id, width);
    }

    /// The bytes of the current table, for tables without offsets.
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        debug_assert!(self.current.offsets.is_empty());
        self.current.bytes
    }
}

impl Default for TableWriter {
    fn default() -> Self {
        TableWriter {
            tables: ObjectStore::default(),
            current: TableData::default(),
        }
    }
}

/// The encoded data for a given table, along with info on included offsets
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq)]
pub(crate) struct TableData {
    pub(crate) type_: TableType,
    pub(crate) bytes: Vec<u8>,
    pub(crate) offsets: Vec<OffsetRecord>,
}

/// The position and type of an offset, along with the id of the pointed-to entity
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct OffsetRecord {
    /// the position of the offset within the parent table
    pub(crate) pos: u32,
    /// the offset length in bytes
    pub(crate) len: OffsetLen,
    /// The object pointed to by the offset
    pub(crate) object: ObjectId,
}

impl TableData {
    pub(crate) fn new(type_: TableType) -> Self {
        TableData {
            type_,
            ..Default::default()
        }
    }

    pub(crate) fn add_offset(&mut self, object: ObjectId, width: usize) {
        let len = match width {
            2 => OffsetLen::Offset16,
            _ => OffsetLen::Offset32,
        };
        self.offsets.push(OffsetRecord {
            pos: self.bytes.len() as u32,
            len,
            object,
        });
        let null_bytes = [0u8; 4];
        self.write_bytes(&null_bytes[..len as usize]);
    }

    pub(crate) fn write<T: Scalar>(&mut self, value: T) {
        self.write_bytes(value.to_raw().as_ref())
    }

    /// Replace the bytes at `pos` with `value`; `pos` must be in bounds.
    pub(crate) fn write_over<T: Scalar>(&mut self, value: T, pos: usize) {
        let raw = value.to_raw();
        let raw = raw.as_ref();
        match self.bytes.get_mut(pos..pos + raw.len()) {
            Some(dest) => dest.copy_from_slice(raw),
            None => log::warn!("write_over at {pos} is out of bounds"),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes)
    }

    #[cfg(test)]
    pub(crate) fn make_mock(size: usize) -> Self {
        TableData {
            bytes: vec![0xca; size], // has no special meaning
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub(crate) fn add_mock_offset(&mut self, object: ObjectId, len: OffsetLen) {
        let pos = self.offsets.iter().map(|off| off.len as u32).sum();
        self.offsets.push(OffsetRecord { pos, len, object });
    }
}

/// The length of an array, as written in a 16-bit count field.
///
/// Longer arrays are rejected by validation before anything is written.
pub(crate) fn array_len<T>(items: &[T]) -> u16 {
    u16::try_from(items.len()).unwrap_or(u16::MAX)
}

macro_rules! write_be_bytes {
    ($ty:ty) => {
        impl FontWrite for $ty {
            #[inline]
            fn write_into(&self, writer: &mut TableWriter) {
                writer.write_slice(&self.to_be_bytes())
            }
        }
    };
}

//NOTE: not implemented for offsets! it would be too easy to accidentally write them.
write_be_bytes!(u8);
write_be_bytes!(i8);
write_be_bytes!(u16);
write_be_bytes!(i16);
write_be_bytes!(u32);
write_be_bytes!(i32);
write_be_bytes!(i64);
write_be_bytes!(types::Fixed);
write_be_bytes!(types::F2Dot14);
write_be_bytes!(types::Tag);
write_be_bytes!(types::MajorMinor);
write_be_bytes!(types::GlyphId16);

impl<T: FontWrite> FontWrite for [T] {
    fn write_into(&self, writer: &mut TableWriter) {
        self.iter().for_each(|item| item.write_into(writer))
    }
}

impl<T: FontWrite> FontWrite for Vec<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        self.as_slice().write_into(writer)
    }
}

impl<T: FontWrite> FontWrite for Option<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        if let Some(obj) = self {
            obj.write_into(writer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf(u16);

    impl FontWrite for Leaf {
        fn write_into(&self, writer: &mut TableWriter) {
            self.0.write_into(writer)
        }
    }

    struct Pair {
        first: Leaf,
        second: Leaf,
    }

    impl FontWrite for Pair {
        fn write_into(&self, writer: &mut TableWriter) {
            0xffu8.write_into(writer);
            writer.write_offset(&self.first, 2);
            writer.write_offset(&self.second, 4);
        }
    }

    impl Validate for Pair {
        fn validate_impl(&self, _ctx: &mut crate::validate::ValidationCtx) {}
    }

    #[test]
    fn offsets_are_resolved() {
        let table = Pair {
            first: Leaf(7),
            second: Leaf(9),
        };
        let bytes = dump_table(&table).unwrap();
        // header is 7 bytes; children follow in offset order
        assert_eq!(bytes, [0xff, 0, 7, 0, 0, 0, 9, 0, 7, 0, 9]);
    }

    #[test]
    fn identical_subtables_are_shared() {
        let table = Pair {
            first: Leaf(3),
            second: Leaf(3),
        };
        let bytes = dump_table(&table).unwrap();
        assert_eq!(bytes, [0xff, 0, 7, 0, 0, 0, 7, 0, 3]);
    }

    #[test]
    fn write_over() {
        let mut data = TableData::default();
        data.write(1u16);
        data.write(2u16);
        data.write_over(9u16, 2);
        assert_eq!(data.bytes, [0, 1, 0, 9]);
    }
}
