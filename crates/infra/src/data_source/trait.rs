use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use storefront_core::Entity;
use storefront_specification::{ProjectedPlan, ProjectionOutput, QueryPlan};

/// A mutation intent waiting for the next commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange<T> {
    /// Create; the data source allocates the identity on commit.
    Add(T),
    /// Replace the committed record with the same identity.
    Update(T),
    /// Delete the committed record with the same identity.
    Remove(T),
}

impl<T> PendingChange<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            PendingChange::Add(_) => "add",
            PendingChange::Update(_) => "update",
            PendingChange::Remove(_) => "remove",
        }
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary<Id> {
    /// Number of records created, modified or deleted.
    pub affected: usize,
    /// Identities allocated to `Add` changes, in registration order.
    pub assigned: Vec<Id>,
}

impl<Id> CommitSummary<Id> {
    pub fn empty() -> Self {
        Self {
            affected: 0,
            assigned: Vec::new(),
        }
    }
}

/// Data source operation error.
///
/// These are **persistence errors** reported by the backing store. Repositories pass
/// them through unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("constraint '{constraint}' violated: {detail}")]
    ConstraintViolation { constraint: String, detail: String },

    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type DataSourceResult<T> = Result<T, DataSourceError>;

/// Queryable, transactional source of `T` entities.
///
/// A data source is the only thing a repository talks to. It must be able to:
/// - look up committed entities by identity
/// - execute a [`QueryPlan`] (criteria, ordering, distinct, take) and materialize it
/// - execute a [`ProjectedPlan`] and return projected values, deduplicated after
///   projection when the plan is distinct
/// - record pending add/update/remove intents and commit them as one batch
///
/// When a plan declares no ordering, results come back in the source's default
/// order, which must be stable across calls.
///
/// Pending intents belong to the data source instance (a session). Instances are
/// not meant to be shared between concurrent writers.
#[async_trait]
pub trait DataSource<T: Entity>: Send + Sync {
    /// Committed entity with this identity, if any.
    async fn find(&self, id: &T::Id) -> DataSourceResult<Option<T>>;

    /// Whether a committed entity with this identity exists. Ignores pending changes.
    async fn contains(&self, id: &T::Id) -> DataSourceResult<bool>;

    async fn fetch(&self, plan: &QueryPlan<T>) -> DataSourceResult<Vec<T>>;

    async fn fetch_projected<R>(&self, plan: &ProjectedPlan<T, R>) -> DataSourceResult<Vec<R>>
    where
        R: ProjectionOutput;

    /// Record a mutation intent. Nothing is visible until [`DataSource::commit`].
    fn register(&self, change: PendingChange<T>);

    /// Apply every pending intent atomically.
    ///
    /// On failure nothing is applied and the error is returned as reported by the
    /// backing store.
    async fn commit(&self) -> DataSourceResult<CommitSummary<T::Id>>;
}

#[async_trait]
impl<T, S> DataSource<T> for Arc<S>
where
    T: Entity,
    S: DataSource<T>,
{
    async fn find(&self, id: &T::Id) -> DataSourceResult<Option<T>> {
        (**self).find(id).await
    }

    async fn contains(&self, id: &T::Id) -> DataSourceResult<bool> {
        (**self).contains(id).await
    }

    async fn fetch(&self, plan: &QueryPlan<T>) -> DataSourceResult<Vec<T>> {
        (**self).fetch(plan).await
    }

    async fn fetch_projected<R>(&self, plan: &ProjectedPlan<T, R>) -> DataSourceResult<Vec<R>>
    where
        R: ProjectionOutput,
    {
        (**self).fetch_projected(plan).await
    }

    fn register(&self, change: PendingChange<T>) {
        (**self).register(change)
    }

    async fn commit(&self) -> DataSourceResult<CommitSummary<T::Id>> {
        (**self).commit().await
    }
}
