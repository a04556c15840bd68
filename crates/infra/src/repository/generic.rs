use core::any::type_name;
use core::marker::PhantomData;

use async_trait::async_trait;

use storefront_core::Entity;
use storefront_specification::{
    ProjectedPlan, ProjectedQuerySpecification, QueryPlan, QuerySpecification,
};

use super::r#trait::{GenericRepository, RepositoryResult};
use crate::data_source::{CommitSummary, DataSource, PendingChange};

/// [`GenericRepository`] backed by an injected [`DataSource`].
///
/// Holds nothing but the data source handle: every read becomes one plan execution,
/// every write one registered intent.
pub struct Repository<T, S> {
    source: S,
    _entity: PhantomData<fn() -> T>,
}

impl<T, S> Repository<T, S>
where
    T: Entity,
    S: DataSource<T>,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            _entity: PhantomData,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<T, S: core::fmt::Debug> core::fmt::Debug for Repository<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &type_name::<T>())
            .field("source", &self.source)
            .finish()
    }
}

#[async_trait]
impl<T, S> GenericRepository<T> for Repository<T, S>
where
    T: Entity,
    S: DataSource<T>,
{
    async fn get_by_id(&self, id: &T::Id) -> RepositoryResult<Option<T>> {
        let found = self.source.find(id).await?;
        tracing::debug!(entity = type_name::<T>(), id = ?id, found = found.is_some(), "get by id");
        Ok(found)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<T>> {
        let rows = self.source.fetch(&QueryPlan::unfiltered()).await?;
        tracing::debug!(entity = type_name::<T>(), count = rows.len(), "list all");
        Ok(rows)
    }

    async fn get_one<Q>(&self, spec: &Q) -> RepositoryResult<Option<T>>
    where
        Q: QuerySpecification<T> + ?Sized,
    {
        let plan = QueryPlan::from_specification(spec).first();
        let found = self.source.fetch(&plan).await?.into_iter().next();
        tracing::debug!(
            entity = type_name::<T>(),
            specification = type_name::<Q>(),
            found = found.is_some(),
            "get one with specification"
        );
        Ok(found)
    }

    async fn list<Q>(&self, spec: &Q) -> RepositoryResult<Vec<T>>
    where
        Q: QuerySpecification<T> + ?Sized,
    {
        let plan = QueryPlan::from_specification(spec);
        let rows = self.source.fetch(&plan).await?;
        tracing::debug!(
            entity = type_name::<T>(),
            specification = type_name::<Q>(),
            count = rows.len(),
            "list with specification"
        );
        Ok(rows)
    }

    async fn get_one_projected<Q>(&self, spec: &Q) -> RepositoryResult<Option<Q::Output>>
    where
        Q: ProjectedQuerySpecification<T> + ?Sized,
    {
        let plan = ProjectedPlan::from_specification(spec)?.first();
        let found = self.source.fetch_projected(&plan).await?.into_iter().next();
        tracing::debug!(
            entity = type_name::<T>(),
            specification = type_name::<Q>(),
            projection = plan.projection().label(),
            found = found.is_some(),
            "get one projected"
        );
        Ok(found)
    }

    async fn list_projected<Q>(&self, spec: &Q) -> RepositoryResult<Vec<Q::Output>>
    where
        Q: ProjectedQuerySpecification<T> + ?Sized,
    {
        let plan = ProjectedPlan::from_specification(spec)?;
        let values = self.source.fetch_projected(&plan).await?;
        tracing::debug!(
            entity = type_name::<T>(),
            specification = type_name::<Q>(),
            projection = plan.projection().label(),
            count = values.len(),
            "list projected"
        );
        Ok(values)
    }

    fn add(&self, entity: T) {
        self.source.register(PendingChange::Add(entity));
    }

    fn update(&self, entity: T) {
        self.source.register(PendingChange::Update(entity));
    }

    fn remove(&self, entity: T) {
        self.source.register(PendingChange::Remove(entity));
    }

    async fn commit(&self) -> RepositoryResult<CommitSummary<T::Id>> {
        match self.source.commit().await {
            Ok(summary) => {
                tracing::info!(
                    entity = type_name::<T>(),
                    affected = summary.affected,
                    assigned = summary.assigned.len(),
                    "changes committed"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(entity = type_name::<T>(), error = %err, "commit failed");
                Err(err.into())
            }
        }
    }

    async fn exists(&self, id: &T::Id) -> RepositoryResult<bool> {
        Ok(self.source.contains(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storefront_core::RecordId;
    use storefront_specification::{
        ProjectedSpecificationBuilder, SpecificationBuilder, SpecificationError,
    };

    use super::*;
    use crate::data_source::{DataSourceError, DataSourceResult, InMemorySession, InMemoryStore};
    use crate::repository::RepositoryError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Widget {
        id: RecordId,
        colour: &'static str,
        weight: u32,
    }

    impl Entity for Widget {
        type Id = RecordId;

        fn id(&self) -> &RecordId {
            &self.id
        }

        fn assign_id(&mut self, id: RecordId) {
            self.id = id;
        }
    }

    fn widget(colour: &'static str, weight: u32) -> Widget {
        Widget {
            id: RecordId::UNASSIGNED,
            colour,
            weight,
        }
    }

    fn seeded_repository() -> Repository<Widget, InMemorySession<Widget>> {
        let store = Arc::new(InMemoryStore::new());
        store
            .seed([widget("red", 3), widget("blue", 1), widget("red", 2)])
            .unwrap();
        Repository::new(store.session())
    }

    fn weights(rows: &[Widget]) -> Vec<u32> {
        rows.iter().map(|w| w.weight).collect()
    }

    /// Data source whose every operation fails with the same error.
    struct BrokenSource(DataSourceError);

    #[async_trait]
    impl DataSource<Widget> for BrokenSource {
        async fn find(&self, _id: &RecordId) -> DataSourceResult<Option<Widget>> {
            Err(self.0.clone())
        }

        async fn contains(&self, _id: &RecordId) -> DataSourceResult<bool> {
            Err(self.0.clone())
        }

        async fn fetch(&self, _plan: &QueryPlan<Widget>) -> DataSourceResult<Vec<Widget>> {
            Err(self.0.clone())
        }

        async fn fetch_projected<R>(&self, _plan: &ProjectedPlan<Widget, R>) -> DataSourceResult<Vec<R>>
        where
            R: storefront_specification::ProjectionOutput,
        {
            Err(self.0.clone())
        }

        fn register(&self, _change: PendingChange<Widget>) {}

        async fn commit(&self) -> DataSourceResult<CommitSummary<RecordId>> {
            Err(self.0.clone())
        }
    }

    #[tokio::test]
    async fn get_by_id_returns_none_when_missing() {
        let repo = seeded_repository();
        assert!(repo.get_by_id(&RecordId::new(99)).await.unwrap().is_none());
        assert_eq!(repo.get_by_id(&RecordId::new(2)).await.unwrap().unwrap().colour, "blue");
    }

    #[tokio::test]
    async fn list_all_returns_identity_order() {
        let repo = seeded_repository();
        assert_eq!(weights(&repo.list_all().await.unwrap()), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn list_applies_criteria_and_order() {
        let repo = seeded_repository();
        let spec = SpecificationBuilder::matching("colour", |w: &Widget| w.colour == "red")
            .order_by("weight", |w: &Widget| w.weight)
            .build();
        assert_eq!(weights(&repo.list(&spec).await.unwrap()), vec![2, 3]);
    }

    #[tokio::test]
    async fn get_one_with_no_match_returns_none() {
        let repo = seeded_repository();
        let spec = SpecificationBuilder::matching("colour", |w: &Widget| w.colour == "green").build();
        assert!(repo.get_one(&spec).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_one_with_single_match_returns_it() {
        let repo = seeded_repository();
        let spec = SpecificationBuilder::matching("colour", |w: &Widget| w.colour == "blue").build();
        let found = repo.get_one(&spec).await.unwrap().unwrap();
        assert_eq!(found.id, RecordId::new(2));
    }

    #[tokio::test]
    async fn get_one_with_many_matches_takes_first_in_declared_order() {
        let repo = seeded_repository();

        let unordered = SpecificationBuilder::matching("colour", |w: &Widget| w.colour == "red").build();
        let first = repo.get_one(&unordered).await.unwrap().unwrap();
        assert_eq!(first.id, RecordId::new(1));

        let lightest = SpecificationBuilder::matching("colour", |w: &Widget| w.colour == "red")
            .order_by("weight", |w: &Widget| w.weight)
            .build();
        assert_eq!(repo.get_one(&lightest).await.unwrap().unwrap().id, RecordId::new(3));

        let heaviest = SpecificationBuilder::matching("colour", |w: &Widget| w.colour == "red")
            .order_by_desc("weight", |w: &Widget| w.weight)
            .build();
        assert_eq!(repo.get_one(&heaviest).await.unwrap().unwrap().id, RecordId::new(1));
    }

    #[tokio::test]
    async fn list_projected_deduplicates_after_projection() {
        let repo = seeded_repository();
        let spec = SpecificationBuilder::<Widget>::unfiltered()
            .select("colour", |w: &Widget| w.colour.to_string())
            .distinct()
            .build();
        assert_eq!(repo.list_projected(&spec).await.unwrap(), vec!["red", "blue"]);
    }

    #[tokio::test]
    async fn get_one_projected_returns_first_projected_value() {
        let repo = seeded_repository();
        let spec = SpecificationBuilder::<Widget>::unfiltered()
            .order_by("weight", |w: &Widget| w.weight)
            .select("colour", |w: &Widget| w.colour)
            .build();
        assert_eq!(repo.get_one_projected(&spec).await.unwrap(), Some("blue"));
    }

    #[tokio::test]
    async fn projected_query_without_select_is_rejected() {
        let repo = seeded_repository();
        let spec = ProjectedSpecificationBuilder::<Widget, String>::unfiltered().build();
        let err = repo.list_projected(&spec).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Specification(SpecificationError::MissingProjection { .. })
        ));
    }

    #[tokio::test]
    async fn mutations_are_deferred_until_save_all() {
        let repo = seeded_repository();

        repo.add(widget("green", 7));
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
        assert_eq!(repo.source().pending_count(), 1);

        assert!(repo.save_all().await.unwrap());
        let rows = repo.list_all().await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].id, RecordId::new(4));

        let session = repo.into_inner();
        assert_eq!(session.pending_count(), 0);
        assert_eq!(session.store().row_count().unwrap(), 4);
    }

    #[tokio::test]
    async fn save_all_without_changes_reports_false() {
        let repo = seeded_repository();
        assert!(!repo.save_all().await.unwrap());
    }

    #[tokio::test]
    async fn commit_reports_assigned_identities() {
        let repo = seeded_repository();
        repo.add(widget("green", 7));
        repo.add(widget("white", 8));

        let summary = repo.commit().await.unwrap();
        assert_eq!(summary.affected, 2);
        assert_eq!(summary.assigned, vec![RecordId::new(4), RecordId::new(5)]);

        let added = repo.get_by_id(&summary.assigned[1]).await.unwrap().unwrap();
        assert_eq!(added.colour, "white");
    }

    #[tokio::test]
    async fn update_and_remove_apply_in_one_batch() {
        let repo = seeded_repository();
        let mut first = repo.get_by_id(&RecordId::new(1)).await.unwrap().unwrap();
        let second = repo.get_by_id(&RecordId::new(2)).await.unwrap().unwrap();

        first.weight = 10;
        repo.update(first);
        repo.remove(second);
        assert!(repo.exists(&RecordId::new(2)).await.unwrap());

        let summary = repo.commit().await.unwrap();
        assert_eq!(summary.affected, 2);
        assert!(!repo.exists(&RecordId::new(2)).await.unwrap());
        assert_eq!(repo.get_by_id(&RecordId::new(1)).await.unwrap().unwrap().weight, 10);
    }

    #[tokio::test]
    async fn data_source_errors_propagate_unchanged() {
        let source_err = DataSourceError::Unavailable("connection reset".to_string());
        let repo: Repository<Widget, BrokenSource> = Repository::new(BrokenSource(source_err.clone()));

        let err = repo.save_all().await.unwrap_err();
        assert_eq!(err, RepositoryError::DataSource(source_err.clone()));
        assert_eq!(err.to_string(), source_err.to_string());

        assert!(repo.get_by_id(&RecordId::new(1)).await.is_err());
        assert!(repo.exists(&RecordId::new(1)).await.is_err());
        assert!(repo.list_all().await.is_err());
    }

    #[tokio::test]
    async fn repeated_lists_are_consistent() {
        let repo = seeded_repository();
        let spec = SpecificationBuilder::<Widget>::unfiltered()
            .order_by_desc("weight", |w: &Widget| w.weight)
            .build();
        let first = repo.list(&spec).await.unwrap();
        let second = repo.list(&spec).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(weights(&first), vec![3, 2, 1]);
    }
}
