//! Specification execution errors.

use thiserror::Error;

/// A specification that cannot be executed as requested.
///
/// Specifications are not validated when built; these surface when a query runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecificationError {
    /// A projected query was executed but the specification never declared `select`.
    #[error("projected query has no projection: {specification}")]
    MissingProjection { specification: &'static str },
}
