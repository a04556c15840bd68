//! Specification-driven repositories.

pub mod generic;
pub mod r#trait;

pub use generic::Repository;
pub use r#trait::{GenericRepository, RepositoryError, RepositoryResult};
