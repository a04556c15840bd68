//! Entity trait: identity + continuity across state changes.

use core::fmt::Debug;
use core::hash::Hash;

/// Identifier of a persisted entity.
///
/// Identifiers are ordered so that a data source has a stable default ordering
/// (ascending identity) when a query does not declare one.
pub trait EntityId: Clone + Ord + Hash + Debug + Send + Sync + 'static {
    /// Build an identifier from a store-allocated sequence value.
    fn from_sequence(value: u64) -> Self;
}

/// Entity marker + minimal interface.
///
/// Entities are owned and materialized by a data source. The domain never allocates
/// identities itself: a freshly constructed entity is transient until the data source
/// commits it and calls [`Entity::assign_id`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: EntityId;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Set the identity allocated by the data source on commit.
    fn assign_id(&mut self, id: Self::Id);
}
