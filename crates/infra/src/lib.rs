//! Infrastructure layer: data sources, repositories, config.

pub mod config;
pub mod data_source;
pub mod repository;


pub use config::StoreConfig;
pub use data_source::{
    CommitSummary, DataSource, DataSourceError, DataSourceResult, InMemorySession, InMemoryStore,
    PendingChange, UniqueConstraint,
};
pub use repository::{GenericRepository, Repository, RepositoryError, RepositoryResult};
