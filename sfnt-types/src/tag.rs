use std::{
    borrow::Borrow,
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

/// A four-byte sfnt tag, such as `head` or `GSUB`.
///
/// Tags compare by their big-endian numeric value, which is the order used
/// by the table directory and by the tag-sorted records of layout tables.
///
/// Tags read from existing fonts are not validated, since fonts in the wild
/// do contain odd tags; use [`Tag::new_checked`] or [`Tag::validate`] when
/// creating new ones.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Construct a `Tag` from raw bytes, without validation.
    pub const fn new(src: &[u8; 4]) -> Tag {
        Tag(*src)
    }

    /// Attempt to create a `Tag` from one to four printable ascii bytes.
    ///
    /// Short inputs are padded with trailing spaces. A leading space, or a
    /// non-space byte following a space, is an error.
    pub const fn new_checked(src: &[u8]) -> Result<Self, InvalidTag> {
        if src.is_empty() || src.len() > 4 {
            return Err(InvalidTag::InvalidLength(src.len()));
        }
        let mut raw = [b' '; 4];
        let mut seen_space = false;
        let mut i = 0;
        while i < src.len() {
            let byte = src[i];
            if byte < 0x20 || byte > 0x7E || (byte == b' ' && i == 0) {
                return Err(InvalidTag::InvalidByte { pos: i, byte });
            }
            if byte != b' ' && seen_space {
                return Err(InvalidTag::ByteAfterSpace { pos: i });
            }
            seen_space |= byte == b' ';
            raw[i] = byte;
            i += 1;
        }
        Ok(Tag(raw))
    }

    /// Construct a tag from its big-endian `u32` value.
    pub const fn from_u32(src: u32) -> Self {
        Self::from_be_bytes(src.to_be_bytes())
    }

    /// Create a tag from raw big-endian bytes.
    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// The big-endian numeric value of this tag.
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Return the memory representation of this tag.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Return the raw byte array representing this tag.
    pub fn into_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Check that an existing tag is well-formed.
    ///
    /// A valid tag is non-blank, contains only printable ascii, does not
    /// start with a space and has nothing but spaces after its first space.
    pub fn validate(self) -> Result<(), InvalidTag> {
        if self == Tag::default() {
            return Err(InvalidTag::InvalidLength(0));
        }
        let mut seen_space = false;
        for (pos, byte) in self.0.iter().copied().enumerate() {
            match byte {
                b' ' if pos == 0 => return Err(InvalidTag::InvalidByte { pos, byte }),
                b' ' => seen_space = true,
                0..=0x1F | 0x7F.. => return Err(InvalidTag::InvalidByte { pos, byte }),
                _ if seen_space => return Err(InvalidTag::ByteAfterSpace { pos }),
                _ => (),
            }
        }
        Ok(())
    }
}

/// An error returned by [`Tag::new_checked`] and [`Tag::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidTag {
    /// The tag was not between 1 and 4 bytes in length.
    InvalidLength(usize),
    /// A byte outside the printable ascii range, or a leading space.
    InvalidByte { pos: usize, byte: u8 },
    /// A non-space byte after a space.
    ByteAfterSpace { pos: usize },
}

impl FromStr for Tag {
    type Err = InvalidTag;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Tag::new_checked(src.as_bytes())
    }
}

impl crate::raw::Scalar for Tag {
    type Raw = [u8; 4];

    fn to_raw(self) -> Self::Raw {
        self.0
    }

    fn from_raw(raw: Self::Raw) -> Self {
        Self(raw)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidTag {}

impl Borrow<[u8; 4]> for Tag {
    fn borrow(&self) -> &[u8; 4] {
        &self.0
    }
}

impl PartialEq<[u8; 4]> for Tag {
    fn eq(&self, other: &[u8; 4]) -> bool {
        &self.0 == other
    }
}

impl PartialEq<&[u8; 4]> for Tag {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl AsRef<[u8]> for Tag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            if (0x20..=0x7E).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "{{0x{byte:02X}}}")?;
            }
        }
        Ok(())
    }
}

impl Display for InvalidTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTag::InvalidByte { pos, byte } => {
                write!(f, "Invalid byte 0x{byte:X} at index {pos}")
            }
            InvalidTag::InvalidLength(len) => write!(f, "Invalid length ({len})"),
            InvalidTag::ByteAfterSpace { pos } => {
                write!(f, "Non-space character at index {pos} after a space")
            }
        }
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}

// four spaces; not a valid tag.
impl Default for Tag {
    fn default() -> Self {
        Tag([b' '; 4])
    }
}

// human readable formats get a string, binary formats get the raw bytes.
#[cfg(feature = "serde")]
impl serde::Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            std::str::from_utf8(&self.0)
                .map_err(serde::ser::Error::custom)?
                .serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TagVisitor;
        impl serde::de::Visitor<'_> for TagVisitor {
            type Value = Tag;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a tag of one to four ascii characters")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(serde::de::Error::custom)
            }
        }
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(TagVisitor)
        } else {
            <[u8; 4]>::deserialize(deserializer).map(Tag::from_be_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_construction() {
        assert!(Tag::new_checked(b"").is_err());
        assert!(Tag::new_checked(b" ").is_err());
        assert!(Tag::new_checked(b"abcde").is_err());
        assert_eq!(Tag::new_checked(b"cv"), Ok(Tag::new(b"cv  ")));
        assert_eq!(Tag::new_checked(b"GSUB"), Ok(Tag::new(b"GSUB")));
        assert_eq!(
            Tag::new_checked(b"a b"),
            Err(InvalidTag::ByteAfterSpace { pos: 2 })
        );
        assert_eq!(
            Tag::new_checked(&[b'a', 0x7F]),
            Err(InvalidTag::InvalidByte { pos: 1, byte: 0x7F })
        );
    }

    #[test]
    fn validate_existing() {
        assert!(Tag::new(b"    ").validate().is_err());
        assert!(Tag::new(b"cvt ").validate().is_ok());
        assert!(Tag::new(b" abc").validate().is_err());
        assert!(Tag::new(b"a bc").validate().is_err());
        assert!(Tag::new(&[0x19, b'a', b'a', b'a']).validate().is_err());
    }

    #[test]
    fn ordering_matches_numeric_value() {
        let mut tags = [Tag::new(b"head"), Tag::new(b"GSUB"), Tag::new(b"OS/2")];
        tags.sort();
        assert_eq!(tags, [Tag::new(b"GSUB"), Tag::new(b"OS/2"), Tag::new(b"head")]);
        assert!(Tag::new(b"GPOS").to_u32() < Tag::new(b"GSUB").to_u32());
        assert_eq!(Tag::from_u32(0x68656164), Tag::new(b"head"));
    }

    #[test]
    fn display_escapes_unprintable() {
        let tag = Tag::new(&[0x19, b'z', b'@', 0x7F]);
        assert_eq!(tag.to_string(), "{0x19}z@{0x7F}");
    }
}
