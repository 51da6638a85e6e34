//! Writing and editing sfnt font files
//!
//! This crate provides owned, writable versions of the `head`, `maxp`,
//! `GSUB` and `GPOS` tables (including the OpenType Layout common tables)
//! and the machinery to assemble tables into a complete font file.
//!
//! There are three ways to produce a file:
//!
//! - [`SfntBuilder`] lays out a font from scratch, from raw bytes or
//!   structured tables.
//! - [`SfntEditor`] starts from an existing font, replacing or removing
//!   only some tables and copying the rest unchanged.
//! - [`FontModel`] parses tables on demand so they can be edited in place,
//!   and checks that tables derived from an edited table have been updated.
//!
//! Every file written has a correct table directory, per-table checksums,
//! and (when there is a `head` table) a checksum adjustment.
//!
//! # Example
//!
//! ```no_run
//! # let path_to_my_font_file = std::path::Path::new("");
//! use sfnt_write::{read::FontRef, tables::head::Head, FontModel};
//! let data = std::fs::read(path_to_my_font_file).unwrap();
//! let font = FontRef::new(&data).expect("failed to read font data");
//! let mut model = FontModel::new(&font);
//! model.try_edit::<Head>().unwrap().units_per_em = 2048;
//! let bytes = model.to_bytes().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

mod dependency;
mod editor;
pub mod error;
mod font_builder;
pub mod from_obj;
mod graph;
mod model;
mod offsets;
mod table_source;
mod table_type;
pub mod tables;
pub mod validate;
mod write;

pub use dependency::{DependencyKind, TableDependencyGraph};
pub use editor::SfntEditor;
pub use font_builder::{BuilderError, HeadAdjustment, SfntBuilder, TableOrder, WriteOptions};
pub use model::{EditError, EditTable, FontModel, StagedTable};
pub use offsets::{NullableOffsetMarker, OffsetMarker};
pub use table_source::TableSource;
pub use table_type::TableType;
pub use validate::Validate;
pub use write::{dump_table, FontWrite, TableWriter};

/// Public re-export of the sfnt-read crate.
pub extern crate sfnt_read as read;

/// Public re-export of the sfnt-types crate.
pub extern crate sfnt_types as types;
