use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;

use storefront_core::{Entity, EntityId};
use storefront_specification::{ProjectedPlan, ProjectionOutput, QueryPlan};

use super::r#trait::{CommitSummary, DataSource, DataSourceError, DataSourceResult, PendingChange};
use crate::config::StoreConfig;

/// Named uniqueness rule checked on every commit.
pub struct UniqueConstraint<T> {
    name: &'static str,
    key: Arc<dyn Fn(&T) -> String + Send + Sync>,
}

impl<T> UniqueConstraint<T> {
    pub fn new<F>(name: &'static str, key: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            name,
            key: Arc::new(key),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> core::fmt::Debug for UniqueConstraint<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("UniqueConstraint").field(&self.name).finish()
    }
}

#[derive(Debug, Clone)]
struct Table<T: Entity> {
    rows: BTreeMap<T::Id, T>,
    next_sequence: u64,
}

/// In-memory committed state for one entity type.
///
/// Intended for tests/dev. Rows are kept ordered by identity, which is the default
/// order of every query that does not declare one. Writers go through an
/// [`InMemorySession`]; the store itself only exposes reads and seeding.
#[derive(Debug)]
pub struct InMemoryStore<T: Entity> {
    table: RwLock<Table<T>>,
    constraints: Vec<UniqueConstraint<T>>,
    config: StoreConfig,
    online: AtomicBool,
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Zero settings in `config` fall back to their defaults.
    pub fn with_config(config: StoreConfig) -> Self {
        let config = config.normalized();
        Self {
            table: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_sequence: config.identity_seed,
            }),
            constraints: Vec::new(),
            config,
            online: AtomicBool::new(true),
        }
    }

    /// Reject commits that would leave two rows with the same key.
    pub fn with_unique_constraint(mut self, constraint: UniqueConstraint<T>) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open a unit-of-work session against this store.
    pub fn session(self: &Arc<Self>) -> InMemorySession<T> {
        InMemorySession {
            store: Arc::clone(self),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Simulate losing (or regaining) the connection to the backing store.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Insert entities directly, allocating identities as a commit would.
    pub fn seed<I>(&self, entities: I) -> DataSourceResult<Vec<T::Id>>
    where
        I: IntoIterator<Item = T>,
    {
        let changes: Vec<PendingChange<T>> = entities.into_iter().map(PendingChange::Add).collect();
        Ok(self.apply(&changes)?.assigned)
    }

    /// Number of committed rows.
    pub fn row_count(&self) -> DataSourceResult<usize> {
        Ok(self.read()?.rows.len())
    }

    fn ensure_online(&self) -> DataSourceResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DataSourceError::Unavailable("in-memory store is offline".to_string()))
        }
    }

    fn read(&self) -> DataSourceResult<RwLockReadGuard<'_, Table<T>>> {
        self.ensure_online()?;
        self.table
            .read()
            .map_err(|_| DataSourceError::Storage("lock poisoned".to_string()))
    }

    /// Apply a batch all-or-nothing: changes go to a working copy that replaces the
    /// committed table only after every change and constraint succeeded.
    fn apply(&self, changes: &[PendingChange<T>]) -> DataSourceResult<CommitSummary<T::Id>> {
        self.ensure_online()?;
        if changes.is_empty() {
            return Ok(CommitSummary::empty());
        }

        let mut table = self
            .table
            .write()
            .map_err(|_| DataSourceError::Storage("lock poisoned".to_string()))?;

        let mut working = table.clone();
        let mut assigned = Vec::new();

        for change in changes {
            match change {
                PendingChange::Add(entity) => {
                    let id = T::Id::from_sequence(working.next_sequence);
                    working.next_sequence = working
                        .next_sequence
                        .checked_add(self.config.identity_increment)
                        .ok_or_else(|| DataSourceError::Storage("identity sequence exhausted".to_string()))?;

                    if working.rows.contains_key(&id) {
                        return Err(DataSourceError::Storage(format!(
                            "allocated identity {id:?} is already in use"
                        )));
                    }

                    let mut row = entity.clone();
                    row.assign_id(id.clone());
                    working.rows.insert(id.clone(), row);
                    assigned.push(id);
                }
                PendingChange::Update(entity) => match working.rows.get_mut(entity.id()) {
                    Some(row) => *row = entity.clone(),
                    None => {
                        return Err(DataSourceError::Concurrency(format!(
                            "update expected 1 record with id {:?}, found 0",
                            entity.id()
                        )));
                    }
                },
                PendingChange::Remove(entity) => {
                    if working.rows.remove(entity.id()).is_none() {
                        return Err(DataSourceError::Concurrency(format!(
                            "remove expected 1 record with id {:?}, found 0",
                            entity.id()
                        )));
                    }
                }
            }
        }

        self.check_constraints(&working.rows)?;

        *table = working;
        tracing::debug!(affected = changes.len(), "in-memory commit applied");

        Ok(CommitSummary {
            affected: changes.len(),
            assigned,
        })
    }

    fn check_constraints(&self, rows: &BTreeMap<T::Id, T>) -> DataSourceResult<()> {
        for constraint in &self.constraints {
            let mut seen: HashMap<String, &T::Id> = HashMap::with_capacity(rows.len());
            for (id, row) in rows {
                let key = (constraint.key)(row);
                if let Some(existing) = seen.get(&key) {
                    return Err(DataSourceError::ConstraintViolation {
                        constraint: constraint.name.to_string(),
                        detail: format!("duplicate key '{key}' (ids {existing:?} and {id:?})"),
                    });
                }
                seen.insert(key, id);
            }
        }
        Ok(())
    }
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit-of-work session over an [`InMemoryStore`].
///
/// Reads always see committed state. Registered changes are held here until
/// `commit`; a failed commit keeps them so the caller can inspect or discard them.
/// A poisoned pending list fails `commit` with [`DataSourceError::Storage`];
/// `register`, `pending_count` and `discard_pending` still reach it.
#[derive(Debug)]
pub struct InMemorySession<T: Entity> {
    store: Arc<InMemoryStore<T>>,
    pending: Mutex<Vec<PendingChange<T>>>,
}

impl<T: Entity> InMemorySession<T> {
    pub fn store(&self) -> &Arc<InMemoryStore<T>> {
        &self.store
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every pending change, returning how many were discarded.
    pub fn discard_pending(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let discarded = pending.len();
        pending.clear();
        discarded
    }
}

#[async_trait]
impl<T: Entity> DataSource<T> for InMemorySession<T> {
    async fn find(&self, id: &T::Id) -> DataSourceResult<Option<T>> {
        Ok(self.store.read()?.rows.get(id).cloned())
    }

    async fn contains(&self, id: &T::Id) -> DataSourceResult<bool> {
        Ok(self.store.read()?.rows.contains_key(id))
    }

    async fn fetch(&self, plan: &QueryPlan<T>) -> DataSourceResult<Vec<T>> {
        let table = self.store.read()?;
        Ok(plan.evaluate(table.rows.values()))
    }

    async fn fetch_projected<R>(&self, plan: &ProjectedPlan<T, R>) -> DataSourceResult<Vec<R>>
    where
        R: ProjectionOutput,
    {
        let table = self.store.read()?;
        Ok(plan.evaluate(table.rows.values()))
    }

    fn register(&self, change: PendingChange<T>) {
        tracing::trace!(kind = change.kind(), "pending change registered");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(change);
    }

    async fn commit(&self) -> DataSourceResult<CommitSummary<T::Id>> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| DataSourceError::Storage("lock poisoned".to_string()))?;
        let summary = self.store.apply(&pending)?;
        pending.clear();
        Ok(summary)
    }
}
