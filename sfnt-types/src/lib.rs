//! Scalar types shared by the sfnt reading and writing crates.
//!
//! Everything stored in an sfnt file is big-endian. The types here know how
//! to move between their native representation and those raw bytes; see
//! [`Scalar`] and [`BigEndian`].

#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate core as std;

mod fixed;
mod glyph_id;
mod offset;
mod raw;
mod tag;
mod version;

#[cfg(all(test, feature = "serde"))]
mod serde_test;

pub use fixed::{F2Dot14, Fixed};
pub use glyph_id::GlyphId16;
pub use offset::{Nullable, Offset, Offset16, Offset32, OffsetLen};
pub use raw::{BigEndian, FixedSize, Scalar};
pub use tag::{InvalidTag, Tag};
pub use version::MajorMinor;

/// The header tag for a font collection file.
pub const TTC_HEADER_TAG: Tag = Tag::new(b"ttcf");

/// The sfnt version for fonts containing TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x00010000;
/// The sfnt version for fonts containing CFF outlines (`OTTO`).
pub const CFF_SFNT_VERSION: u32 = 0x4F54544F;
/// The legacy Apple sfnt version for TrueType fonts (`true`).
pub const TRUE_SFNT_VERSION: u32 = 0x74727565;
/// The legacy sfnt version for PostScript Type 1 wrapped fonts (`typ1`).
pub const TYP1_SFNT_VERSION: u32 = 0x74797031;

/// Returns `true` if `version` is one of the recognized sfnt versions.
pub const fn is_known_sfnt_version(version: u32) -> bool {
    matches!(
        version,
        TT_SFNT_VERSION | CFF_SFNT_VERSION | TRUE_SFNT_VERSION | TYP1_SFNT_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sfnt_versions() {
        assert!(is_known_sfnt_version(TT_SFNT_VERSION));
        assert!(is_known_sfnt_version(Tag::new(b"OTTO").to_u32()));
        assert!(is_known_sfnt_version(Tag::new(b"true").to_u32()));
        assert!(is_known_sfnt_version(Tag::new(b"typ1").to_u32()));
        assert!(!is_known_sfnt_version(TTC_HEADER_TAG.to_u32()));
        assert!(!is_known_sfnt_version(0));
    }
}
