//! `storefront-specification`: reusable, composable query definitions.
//!
//! A specification describes *what* to query (criteria, ordering, distinctness and an
//! optional projection) without saying *how*. Repositories turn specifications into
//! [`QueryPlan`]s and hand those to a data source.

pub mod base;
pub mod contract;
pub mod error;
pub mod expression;
pub mod plan;

mod macros;

pub use base::{
    ProjectedSpecification, ProjectedSpecificationBuilder, Specification, SpecificationBuilder,
};
pub use contract::{ProjectedQuerySpecification, ProjectionOutput, QuerySpecification};
pub use error::SpecificationError;
pub use expression::{KeySelector, Predicate, Projection};
pub use plan::{ProjectedPlan, QueryPlan};
