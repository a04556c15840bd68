//! Query shape every specification exposes to a repository.

use core::hash::Hash;
use std::sync::Arc;

use crate::expression::{KeySelector, Predicate, Projection};

/// Values a projected query may return.
///
/// Distinct projected queries deduplicate by value equality, hence `Eq + Hash`.
pub trait ProjectionOutput: Clone + Eq + Hash + Send + Sync + 'static {}

impl<R> ProjectionOutput for R where R: Clone + Eq + Hash + Send + Sync + 'static {}

/// Read-only description of a query over `T`.
///
/// Implementations are pure accessors. Absence is `None`, never an error.
pub trait QuerySpecification<T>: Send + Sync {
    /// Filter predicate; `None` matches every entity.
    fn criteria(&self) -> Option<&Predicate<T>>;

    /// Ascending sort key.
    fn order_by(&self) -> Option<&KeySelector<T>>;

    /// Descending sort key.
    fn order_by_desc(&self) -> Option<&KeySelector<T>>;

    /// Whether duplicates are removed from the final result shape.
    fn is_distinct(&self) -> bool;
}

/// Query over `T` that returns `Self::Output` values instead of entities.
pub trait ProjectedQuerySpecification<T>: QuerySpecification<T> {
    type Output: ProjectionOutput;

    fn select(&self) -> Option<&Projection<T, Self::Output>>;
}

impl<T, S> QuerySpecification<T> for Arc<S>
where
    S: QuerySpecification<T> + ?Sized,
{
    fn criteria(&self) -> Option<&Predicate<T>> {
        (**self).criteria()
    }

    fn order_by(&self) -> Option<&KeySelector<T>> {
        (**self).order_by()
    }

    fn order_by_desc(&self) -> Option<&KeySelector<T>> {
        (**self).order_by_desc()
    }

    fn is_distinct(&self) -> bool {
        (**self).is_distinct()
    }
}

impl<T, S> ProjectedQuerySpecification<T> for Arc<S>
where
    S: ProjectedQuerySpecification<T> + ?Sized,
{
    type Output = S::Output;

    fn select(&self) -> Option<&Projection<T, Self::Output>> {
        (**self).select()
    }
}
