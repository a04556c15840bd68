use async_trait::async_trait;
use thiserror::Error;

use storefront_core::Entity;
use storefront_specification::{ProjectedQuerySpecification, QuerySpecification, SpecificationError};

use crate::data_source::{CommitSummary, DataSourceError};

/// Repository operation error.
///
/// Both variants are transparent: the caller sees the data source's (or the
/// specification's) own message and can match on the wrapped error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Raised by the data source (constraint violation, lost connection, ...).
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    /// The specification cannot be executed as requested.
    #[error(transparent)]
    Specification(#[from] SpecificationError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Generic, specification-driven repository over `T`.
///
/// ## Reads
///
/// Not-found is `Ok(None)`, never an error. Specification reads apply, in order:
/// criteria, ascending key, descending key, projection, distinct. Without a declared
/// order, results follow the data source's default order.
///
/// `get_one`/`get_one_projected` return the **first** match of that same ordering
/// when several entities match, so callers that care which one they get must
/// declare an order.
///
/// ## Writes
///
/// `add`/`update`/`remove` only register intents with the underlying data source
/// session. They become visible, all together, when `save_all` (or `commit`)
/// succeeds. Persistence failures are returned unchanged and nothing is retried.
#[async_trait]
pub trait GenericRepository<T: Entity>: Send + Sync {
    async fn get_by_id(&self, id: &T::Id) -> RepositoryResult<Option<T>>;

    /// Every committed entity, in data-source default order.
    async fn list_all(&self) -> RepositoryResult<Vec<T>>;

    async fn get_one<Q>(&self, spec: &Q) -> RepositoryResult<Option<T>>
    where
        Q: QuerySpecification<T> + ?Sized;

    async fn list<Q>(&self, spec: &Q) -> RepositoryResult<Vec<T>>
    where
        Q: QuerySpecification<T> + ?Sized;

    async fn get_one_projected<Q>(&self, spec: &Q) -> RepositoryResult<Option<Q::Output>>
    where
        Q: ProjectedQuerySpecification<T> + ?Sized;

    /// Projected listing; a distinct specification deduplicates projected values.
    async fn list_projected<Q>(&self, spec: &Q) -> RepositoryResult<Vec<Q::Output>>
    where
        Q: ProjectedQuerySpecification<T> + ?Sized;

    fn add(&self, entity: T);

    fn update(&self, entity: T);

    fn remove(&self, entity: T);

    /// Commit pending intents; `true` if at least one record was affected.
    async fn save_all(&self) -> RepositoryResult<bool> {
        Ok(self.commit().await?.affected > 0)
    }

    /// Commit pending intents, reporting affected count and allocated identities.
    async fn commit(&self) -> RepositoryResult<CommitSummary<T::Id>>;

    /// Whether a committed entity has this identity. Pending changes are ignored.
    async fn exists(&self, id: &T::Id) -> RepositoryResult<bool>;
}
