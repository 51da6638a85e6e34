//! Errors that occur during writing

use std::rc::Rc;

use crate::{graph::Graph, validate::ValidationReport};

/// A packing could not be found that satisfied all offsets
#[derive(Clone, Debug)]
pub struct PackingError {
    // this is Rc so that we can impl Clone, which is nice for some tests
    pub(crate) graph: Rc<Graph>,
}

/// An error occured while writing this table
#[derive(Debug, Clone)]
pub enum Error {
    ValidationFailed(Rc<ValidationReport>),
    PackingFailed(PackingError),
}

impl PackingError {
    /// The number of offsets that could not be represented.
    pub fn overflow_count(&self) -> usize {
        self.graph.find_overflows().len()
    }
}

impl From<ValidationReport> for Error {
    fn from(src: ValidationReport) -> Error {
        Error::ValidationFailed(Rc::new(src))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ValidationFailed(report) => report.fmt(f),
            Error::PackingFailed(error) => error.fmt(f),
        }
    }
}

impl std::fmt::Display for PackingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Table packing failed with {} overflows",
            self.overflow_count()
        )
    }
}

impl std::error::Error for PackingError {}
impl std::error::Error for Error {}
