//! The font tables this crate can parse.
//!
//! Tables not listed here are still available as raw bytes; see
//! [`AnyTable::Raw`](crate::AnyTable::Raw).

pub mod gpos;
pub mod gsub;
pub mod head;
pub mod layout;
pub mod maxp;
