//! The pre-compilation validation pass

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Debug, Display},
};

use crate::offsets::{NullableOffsetMarker, OffsetMarker};

/// Pre-compilation validation of tables.
///
/// Some requirements of the format are awkward to express in types, such as
/// array lengths that must fit in a `u16`, or two arrays whose lengths must
/// agree. These are checked before a table is written.
pub trait Validate {
    /// Ensure that this table is well-formed, reporting any errors.
    fn validate(&self) -> Result<(), ValidationReport> {
        let mut ctx = ValidationCtx::default();
        self.validate_impl(&mut ctx);
        if ctx.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { errors: ctx.errors })
        }
    }

    /// Validate this table, reporting errors to `ctx`.
    ///
    /// ```rust
    /// # use sfnt_write::validate::{Validate, ValidationCtx};
    /// struct GlyphList {
    ///     glyphs: Vec<u16>,
    /// }
    ///
    /// impl Validate for GlyphList {
    ///     fn validate_impl(&self, ctx: &mut ValidationCtx) {
    ///         ctx.in_table("GlyphList", |ctx| {
    ///             ctx.in_field("glyphs", |ctx| {
    ///                 if self.glyphs.len() > (u16::MAX as usize) {
    ///                     ctx.report("array exceeds max length");
    ///                 }
    ///             })
    ///         })
    ///     }
    /// }
    /// ```
    fn validate_impl(&self, ctx: &mut ValidationCtx);
}

/// A context for collecting validation errors.
///
/// Tracks the path (tables, fields and array indices) at which each error
/// is reported.
#[derive(Clone, Debug, Default)]
pub struct ValidationCtx {
    cur_location: Vec<LocationElem>,
    errors: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
struct ValidationError {
    error: String,
    location: Vec<LocationElem>,
}

/// One or more validation errors.
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
enum LocationElem {
    Table(&'static str),
    Field(&'static str),
    Index(usize),
}

impl ValidationCtx {
    /// Run the provided closure in the context of a new table.
    pub fn in_table(&mut self, name: &'static str, f: impl FnOnce(&mut ValidationCtx)) {
        self.with_elem(LocationElem::Table(name), f);
    }

    /// Run the provided closure in the context of a field.
    pub fn in_field(&mut self, name: &'static str, f: impl FnOnce(&mut ValidationCtx)) {
        self.with_elem(LocationElem::Field(name), f);
    }

    /// Run the provided closure once for each item, tracking the item's index.
    pub fn with_array_items<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        mut f: impl FnMut(&mut ValidationCtx, T),
    ) {
        for (i, item) in items.into_iter().enumerate() {
            self.with_elem(LocationElem::Index(i), |ctx| f(ctx, item));
        }
    }

    /// Report a new error, associating it with the current path.
    pub fn report(&mut self, msg: impl Display) {
        self.errors.push(ValidationError {
            location: self.cur_location.clone(),
            error: msg.to_string(),
        });
    }

    /// Report an error if an array is too long for its 16-bit count.
    pub(crate) fn check_array_len(&mut self, len: usize) {
        if len > u16::MAX as usize {
            self.report("array exceeds max length");
        }
    }

    fn with_elem(&mut self, elem: LocationElem, f: impl FnOnce(&mut ValidationCtx)) {
        self.cur_location.push(elem);
        f(self);
        self.cur_location.pop();
    }
}

impl ValidationReport {
    /// The number of errors in this report.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The message of each error, in the order they were reported.
    pub fn messages(&self) -> impl Iterator<Item = &str> + '_ {
        self.errors.iter().map(|err| err.error.as_str())
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let [only] = self.errors.as_slice() {
            return write!(f, "Validation error: {only}");
        }

        writeln!(f, "{} validation errors:", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "#{} {error}", i + 1)?;
        }
        Ok(())
    }
}

impl Debug for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.error)?;
        if self.location.is_empty() {
            return Ok(());
        }
        f.write_str(" at ")?;
        for (i, elem) in self.location.iter().enumerate() {
            match elem {
                LocationElem::Table(name) if i == 0 => f.write_str(name),
                LocationElem::Table(name) => write!(f, " > {name}"),
                LocationElem::Field(name) => write!(f, ".{name}"),
                LocationElem::Index(idx) => write!(f, "[{idx}]"),
            }?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.with_array_items(self, |ctx, item| item.validate_impl(ctx));
    }
}

impl<T: Validate> Validate for BTreeSet<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.with_array_items(self, |ctx, item| item.validate_impl(ctx));
    }
}

impl<K, V: Validate> Validate for BTreeMap<K, V> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.with_array_items(self.values(), |ctx, item| item.validate_impl(ctx));
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if let Some(inner) = self {
            inner.validate_impl(ctx)
        }
    }
}

impl<T: Validate, const N: usize> Validate for OffsetMarker<T, N> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        (**self).validate_impl(ctx)
    }
}

impl<T: Validate, const N: usize> Validate for NullableOffsetMarker<T, N> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        (**self).validate_impl(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sequence(Vec<u16>);

    struct Lookup {
        sequences: Vec<Sequence>,
    }

    impl Validate for Sequence {
        fn validate_impl(&self, ctx: &mut ValidationCtx) {
            ctx.in_table("Sequence", |ctx| {
                ctx.in_field("glyphs", |ctx| {
                    if self.0.is_empty() {
                        ctx.report("sequence must not be empty");
                    }
                })
            })
        }
    }

    impl Validate for Lookup {
        fn validate_impl(&self, ctx: &mut ValidationCtx) {
            ctx.in_table("Lookup", |ctx| {
                ctx.in_field("sequences", |ctx| self.sequences.validate_impl(ctx))
            })
        }
    }

    #[test]
    fn errors_carry_their_path() {
        let lookup = Lookup {
            sequences: vec![Sequence(vec![1]), Sequence(vec![]), Sequence(vec![])],
        };
        let report = lookup.validate().unwrap_err();
        assert_eq!(report.len(), 2);
        let text = report.to_string();
        assert!(
            text.contains("Lookup.sequences[1] > Sequence.glyphs"),
            "{text}"
        );
        assert!(text.contains("[2]"), "{text}");
    }

    #[test]
    fn valid_tables_pass() {
        let lookup = Lookup {
            sequences: vec![Sequence(vec![4, 5])],
        };
        assert!(lookup.validate().is_ok());
    }
}
