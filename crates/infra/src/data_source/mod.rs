//! Data source boundary.
//!
//! The abstraction a repository executes query plans and unit-of-work commits
//! against, without making any storage assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemorySession, InMemoryStore, UniqueConstraint};
pub use r#trait::{CommitSummary, DataSource, DataSourceError, DataSourceResult, PendingChange};
