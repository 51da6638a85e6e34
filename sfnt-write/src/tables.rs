//! Owned, writable versions of font tables

pub mod gpos;
pub mod gsub;
pub mod head;
pub mod layout;
pub mod maxp;
