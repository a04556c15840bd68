//! Catalog domain module.
//!
//! The `Product` entity and the named specifications the storefront queries it with.
//! Pure domain logic: no IO, no storage.

pub mod product;
pub mod specifications;

pub use product::{NewProduct, Product, ProductId};
pub use specifications::{
    BrandListSpecification, ProductSort, ProductSpecParams, ProductSpecification,
    TypeListSpecification,
};
