//! Editing a font one structured table at a time

use std::{
    borrow::Cow,
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    fmt::Display,
};

use read::{FontData, FontRead, FontRef, ReadError, TopLevelTable};
use types::Tag;

use crate::{
    dependency::{DependencyKind, TableDependencyGraph},
    editor::SfntEditor,
    font_builder::{BuilderError, SfntBuilder},
    from_obj::ToOwnedTable,
    tables::{gpos::Gpos, gsub::Gsub, head::Head, maxp::Maxp},
    validate::Validate,
    write::FontWrite,
};

/// A table staged for writing by a [`FontModel`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StagedTable {
    Head(Head),
    Maxp(Maxp),
    Gsub(Gsub),
    Gpos(Gpos),
    /// Bytes for any table, written as they are.
    Raw(Vec<u8>),
}

/// A table that a [`FontModel`] knows how to parse and stage.
pub trait EditTable: TopLevelTable + FontWrite + Validate + Default {
    /// Parse the table from its bytes in a font.
    fn from_font_data(data: FontData) -> Result<Self, ReadError>;

    #[doc(hidden)]
    fn from_staged(staged: &mut StagedTable) -> Option<&mut Self>;

    #[doc(hidden)]
    fn into_staged(self) -> StagedTable;
}

macro_rules! edit_table {
    ($variant:ident, $ty:ty, $read_ty:ty) => {
        impl EditTable for $ty {
            fn from_font_data(data: FontData) -> Result<Self, ReadError> {
                <$read_ty as FontRead>::read(data).and_then(|table| table.to_owned_table())
            }

            fn from_staged(staged: &mut StagedTable) -> Option<&mut Self> {
                match staged {
                    StagedTable::$variant(table) => Some(table),
                    _ => None,
                }
            }

            fn into_staged(self) -> StagedTable {
                StagedTable::$variant(self)
            }
        }
    };
}

edit_table!(Head, Head, read::tables::head::Head);
edit_table!(Maxp, Maxp, read::tables::maxp::Maxp);
edit_table!(Gsub, Gsub, read::tables::gsub::Gsub);
edit_table!(Gpos, Gpos, read::tables::gpos::Gpos);

impl StagedTable {
    /// Parse the bytes of a table, if this is a table we know how to edit.
    ///
    /// Tables of other kinds are kept as raw bytes.
    pub fn parse(tag: Tag, data: FontData) -> Result<Self, ReadError> {
        match tag {
            Head::TAG => Head::from_font_data(data).map(Self::Head),
            Maxp::TAG => Maxp::from_font_data(data).map(Self::Maxp),
            Gsub::TAG => Gsub::from_font_data(data).map(Self::Gsub),
            Gpos::TAG => Gpos::from_font_data(data).map(Self::Gpos),
            _ => Ok(Self::Raw(data.as_bytes().to_vec())),
        }
    }

    fn compile(&self, tag: Tag) -> Result<Cow<'_, [u8]>, BuilderError> {
        let dumped = match self {
            StagedTable::Head(table) => crate::dump_table(table),
            StagedTable::Maxp(table) => crate::dump_table(table),
            StagedTable::Gsub(table) => crate::dump_table(table),
            StagedTable::Gpos(table) => crate::dump_table(table),
            StagedTable::Raw(bytes) => return Ok(Cow::Borrowed(bytes)),
        };
        dumped
            .map(Cow::Owned)
            .map_err(|inner| BuilderError::Table { tag, inner })
    }
}

/// An error that occurs while editing a [`FontModel`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum EditError {
    /// The existing table could not be parsed.
    Read { tag: Tag, error: ReadError },
    /// The table is staged as a different kind, for instance as raw bytes.
    KindMismatch { tag: Tag },
    /// The table has been removed.
    Removed(Tag),
    /// Tables that derive from edited tables have not been updated.
    StaleTables(Vec<Tag>),
    /// Writing the font failed.
    Build(BuilderError),
}

/// A font that is edited by staging structured tables.
///
/// Tables are parsed the first time they are edited; everything else is
/// carried through from the base font untouched. Because some tables are
/// derived from others (`loca` from `glyf`, `hmtx` from `maxp`, and so on)
/// the model refuses to write a file where a table was edited but its
/// dependents were not, unless stale tables are explicitly allowed.
pub struct FontModel<'a> {
    base: Option<FontRef<'a>>,
    sfnt_version: u32,
    staged: BTreeMap<Tag, StagedTable>,
    removed: BTreeSet<Tag>,
    allow_stale: bool,
    dependencies: TableDependencyGraph,
}

impl<'a> FontModel<'a> {
    /// A model that edits an existing font.
    pub fn new(font: &FontRef<'a>) -> Self {
        FontModel {
            base: Some(font.clone()),
            sfnt_version: font.sfnt_version(),
            ..Self::empty(types::TT_SFNT_VERSION)
        }
    }

    /// A model for a font built from scratch.
    pub fn empty(sfnt_version: u32) -> Self {
        FontModel {
            base: None,
            sfnt_version,
            staged: BTreeMap::new(),
            removed: BTreeSet::new(),
            allow_stale: false,
            dependencies: TableDependencyGraph::default(),
        }
    }

    pub fn with_sfnt_version(&mut self, sfnt_version: u32) -> &mut Self {
        self.sfnt_version = sfnt_version;
        self
    }

    /// Get a mutable reference to a table, parsing and staging it if needed.
    ///
    /// If the font has no such table, a default table is staged. If the
    /// existing table can't be parsed the error is returned and nothing is
    /// staged; use [`reset`][Self::reset] to start from a default table
    /// instead.
    pub fn try_edit<T: EditTable>(&mut self) -> Result<&mut T, EditError> {
        let tag = T::TAG;
        if self.removed.contains(&tag) {
            return Err(EditError::Removed(tag));
        }
        let staged = match self.staged.entry(tag) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let table = match self.base.as_ref().and_then(|font| font.table_data(tag)) {
                    Some(data) => {
                        T::from_font_data(data).map_err(|error| EditError::Read { tag, error })?
                    }
                    None => T::default(),
                };
                log::debug!("staged '{tag}' for editing");
                entry.insert(table.into_staged())
            }
        };
        T::from_staged(staged).ok_or(EditError::KindMismatch { tag })
    }

    /// Replace a table with its default value, discarding any edits.
    ///
    /// This also restores a removed table.
    pub fn reset<T: EditTable>(&mut self) -> Result<&mut T, EditError> {
        self.removed.remove(&T::TAG);
        self.staged.insert(T::TAG, T::default().into_staged());
        self.try_edit()
    }

    /// Stage raw bytes for a table.
    ///
    /// This also restores a removed table.
    pub fn set_raw(&mut self, tag: Tag, data: impl Into<Vec<u8>>) -> &mut Self {
        self.removed.remove(&tag);
        self.staged.insert(tag, StagedTable::Raw(data.into()));
        self
    }

    /// Remove a table from the font.
    ///
    /// Returns `true` if the table was present.
    pub fn remove(&mut self, tag: Tag) -> bool {
        let present = self.has_table(tag);
        self.staged.remove(&tag);
        self.removed.insert(tag);
        present
    }

    /// Returns `true` if a table with this tag will be written.
    pub fn has_table(&self, tag: Tag) -> bool {
        !self.removed.contains(&tag)
            && (self.staged.contains_key(&tag)
                || self.base.as_ref().is_some_and(|font| font.contains(tag)))
    }

    /// The staged version of a table, if it has been edited or set.
    pub fn staged(&self, tag: Tag) -> Option<&StagedTable> {
        self.staged.get(&tag)
    }

    /// Write the font even when dependent tables have not been updated.
    pub fn allow_stale_tables(&mut self, allow: bool) -> &mut Self {
        self.allow_stale = allow;
        self
    }

    /// The graph used to find tables made stale by an edit.
    pub fn dependencies_mut(&mut self) -> &mut TableDependencyGraph {
        &mut self.dependencies
    }

    /// Tables in the base font that depend on a staged or removed table,
    /// but are themselves neither staged nor removed.
    pub fn stale_tables(&self) -> Vec<Tag> {
        let Some(font) = &self.base else {
            return Vec::new();
        };
        let mut stale = BTreeSet::new();
        for changed in self.staged.keys().chain(&self.removed) {
            for dependent in self
                .dependencies
                .transitive_dependents(*changed, DependencyKind::RebuildRequired)
            {
                if !self.staged.contains_key(&dependent)
                    && !self.removed.contains(&dependent)
                    && font.contains(dependent)
                {
                    stale.insert(dependent);
                }
            }
        }
        stale.into_iter().collect()
    }

    /// Compile the staged tables and write the font.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EditError> {
        if !self.allow_stale {
            let stale = self.stale_tables();
            if !stale.is_empty() {
                return Err(EditError::StaleTables(stale));
            }
        }

        let compiled = self
            .staged
            .iter()
            .map(|(tag, table)| table.compile(*tag).map(|bytes| (*tag, bytes)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(EditError::Build)?;

        let result = match &self.base {
            Some(font) => {
                let mut editor = SfntEditor::new(font);
                editor.with_sfnt_version(self.sfnt_version);
                for tag in &self.removed {
                    editor.remove(*tag);
                }
                for (tag, bytes) in compiled {
                    editor.set_raw(tag, bytes);
                }
                editor.build()
            }
            None => {
                let mut builder = SfntBuilder::new();
                builder.with_sfnt_version(self.sfnt_version);
                for (tag, bytes) in compiled {
                    builder.add_raw(tag, bytes);
                }
                builder.build()
            }
        };
        result.map_err(EditError::Build)
    }
}

impl Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::Read { tag, error } => write!(f, "failed to read '{tag}': {error}"),
            EditError::KindMismatch { tag } => {
                write!(f, "'{tag}' is staged as a different kind of table")
            }
            EditError::Removed(tag) => write!(f, "'{tag}' has been removed"),
            EditError::StaleTables(tags) => {
                write!(f, "tables need to be rebuilt:")?;
                for tag in tags {
                    write!(f, " '{tag}'")?;
                }
                Ok(())
            }
            EditError::Build(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditError::Read { error, .. } => Some(error),
            EditError::Build(error) => Some(error),
            _ => None,
        }
    }
}

impl From<BuilderError> for EditError {
    fn from(src: BuilderError) -> EditError {
        EditError::Build(src)
    }
}
