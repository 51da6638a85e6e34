//! small utilities used in tests

use std::collections::HashMap;

use sfnt_types::Scalar;

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains zero bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a reference to the contents of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write a scalar, remembering its position so it can be patched later.
    pub fn push_with_tag(mut self, item: impl Scalar, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self.data.extend(item.to_raw().as_ref());
        }
        self
    }

    /// Append raw bytes, such as a subtable built elsewhere.
    pub fn append(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// The position of a value written with [`push_with_tag`](Self::push_with_tag).
    ///
    /// # Panics
    ///
    /// Panics if the tag is unknown.
    pub fn offset_for(&self, tag: &str) -> usize {
        self.tagged_locations.get(tag).copied().unwrap()
    }

    /// Overwrite the value at a tagged location.
    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        let offset = self.offset_for(tag);
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();
        let data = &mut self.data[offset..];
        if data.len() < new_data.len() {
            panic!("not enough room left in buffer for the requested write.");
        }
        data[..new_data.len()].copy_from_slice(new_data);
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Build a [`BeBuffer`] from a list of items.
///
/// Items can be literals (`1u16`), identifiers, parenthesized expressions
/// (`(Tag::new(b"liga"))`), arrays of literals (`[1u16, 2, 3]`) or tagged
/// values (`{0u16: "my_offset"}`) whose position can later be looked up with
/// [`BeBuffer::offset_for`].
#[macro_export]
macro_rules! be_buffer {
    () => {
        $crate::bebuffer::BeBuffer::new()
    };
    ($($item:tt),+ $(,)?) => {{
        let buf = $crate::bebuffer::BeBuffer::new();
        $( let buf = $crate::be_buffer_add!(buf, $item); )+
        buf
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! be_buffer_add {
    ($b:ident, $x:literal) => {
        $b.push($x)
    };
    ($b:ident, $x:ident) => {
        $b.push($x)
    };
    ($b:ident, [$($x:expr),+ $(,)?]) => {
        $b.extend([$($x),+])
    };
    ($b:ident, {$v:tt : $tag:literal}) => {
        $b.push_with_tag($v, $tag)
    };
    ($b:ident, ($x:expr)) => {
        $b.push($x)
    };
}

#[cfg(test)]
mod tests {
    use sfnt_types::Tag;

    #[test]
    fn macro_items() {
        let version = 1u16;
        let buf = be_buffer! {
            version,
            2u32,
            [3u16, 4],
            {5u16: "five"},
            (Tag::new(b"liga"))
        };
        assert_eq!(
            buf.as_slice(),
            &[0, 1, 0, 0, 0, 2, 0, 3, 0, 4, 0, 5, b'l', b'i', b'g', b'a']
        );
        assert_eq!(buf.offset_for("five"), 10);
    }

    #[test]
    fn patch_tagged_value() {
        let mut buf = be_buffer!(1u16, {0u16: "offset"}, 3u16);
        buf.write_at("offset", 0xABCDu16);
        assert_eq!(buf.as_slice(), &[0, 1, 0xAB, 0xCD, 0, 3]);
    }
}
