//! Table and file checksums
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums>

use types::Tag;

/// The value the checksum of a whole font file must equal once the `head`
/// table's `checksumAdjustment` has been set.
pub const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

/// The byte offset of `checksumAdjustment` in the `head` table.
pub const HEAD_CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

const HEAD: Tag = Tag::new(b"head");

/// Compute the checksum of some data.
///
/// This is the wrapping sum of the data as big-endian `u32`s; a trailing
/// partial word is padded with zeros.
pub fn checksum(data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(4);
    let mut sum = chunks.by_ref().fold(0u32, |sum, chunk| {
        let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        sum.wrapping_add(word)
    });
    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut last = [0u8; 4];
        last[..rem.len()].copy_from_slice(rem);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

/// Compute the directory checksum of a `head` table.
///
/// This treats the `checksumAdjustment` field as zero, whatever it contains.
/// Inputs shorter than 12 bytes are summed as-is.
pub fn head_directory_checksum(data: &[u8]) -> u32 {
    let end = HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4;
    match data.get(HEAD_CHECKSUM_ADJUSTMENT_OFFSET..end) {
        Some(adjustment) => {
            let adjustment = u32::from_be_bytes([
                adjustment[0],
                adjustment[1],
                adjustment[2],
                adjustment[3],
            ]);
            // the adjustment is word aligned, so it contributes exactly its value
            checksum(data).wrapping_sub(adjustment)
        }
        None => checksum(data),
    }
}

/// The checksum of a table as recorded in the table directory.
pub fn table_checksum(tag: Tag, data: &[u8]) -> u32 {
    if tag == HEAD {
        head_directory_checksum(data)
    } else {
        checksum(data)
    }
}

/// The value to store in `head.checksumAdjustment`, given the checksum of the
/// whole file computed with that field set to zero.
pub fn checksum_adjustment(file_checksum: u32) -> u32 {
    CHECKSUM_MAGIC.wrapping_sub(file_checksum)
}
