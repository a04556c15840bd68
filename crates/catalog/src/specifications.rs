//! Named catalog queries.

use serde::{Deserialize, Serialize};

use storefront_specification::{
    ProjectedSpecification, Specification, SpecificationBuilder, delegate_specification,
};

use crate::product::Product;

/// Every distinct brand in the catalog.
#[derive(Debug, Clone)]
pub struct BrandListSpecification {
    inner: ProjectedSpecification<Product, String>,
}

impl BrandListSpecification {
    pub fn new() -> Self {
        Self {
            inner: SpecificationBuilder::unfiltered()
                .select("brand", |p: &Product| p.brand().to_string())
                .distinct()
                .build(),
        }
    }
}

impl Default for BrandListSpecification {
    fn default() -> Self {
        Self::new()
    }
}

delegate_specification!(projected BrandListSpecification => Product, String; inner);

/// Every distinct product type in the catalog.
#[derive(Debug, Clone)]
pub struct TypeListSpecification {
    inner: ProjectedSpecification<Product, String>,
}

impl TypeListSpecification {
    pub fn new() -> Self {
        Self {
            inner: SpecificationBuilder::unfiltered()
                .select("type", |p: &Product| p.product_type().to_string())
                .distinct()
                .build(),
        }
    }
}

impl Default for TypeListSpecification {
    fn default() -> Self {
        Self::new()
    }
}

delegate_specification!(projected TypeListSpecification => Product, String; inner);

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Parse a sort token; unknown tokens fall back to name order.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "priceAsc" => Self::PriceAsc,
            "priceDesc" => Self::PriceDesc,
            _ => Self::Name,
        }
    }
}

/// Catalog browsing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductSpecParams {
    /// Match any of these brands (exact). Empty = any brand.
    pub brands: Vec<String>,
    /// Match any of these types (exact). Empty = any type.
    pub types: Vec<String>,
    pub sort: Option<String>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl ProductSpecParams {
    pub fn sort(&self) -> ProductSort {
        self.sort.as_deref().map(ProductSort::parse).unwrap_or_default()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn has_filter(&self) -> bool {
        !self.brands.is_empty() || !self.types.is_empty() || self.search_term().is_some()
    }
}

/// Filtered, sorted product listing.
#[derive(Debug, Clone)]
pub struct ProductSpecification {
    inner: Specification<Product>,
}

impl ProductSpecification {
    pub fn new(params: &ProductSpecParams) -> Self {
        let builder = if params.has_filter() {
            let brands = params.brands.clone();
            let types = params.types.clone();
            let search = params.search_term();

            SpecificationBuilder::matching("brand,type,name", move |p: &Product| {
                (brands.is_empty() || brands.iter().any(|b| b == p.brand()))
                    && (types.is_empty() || types.iter().any(|t| t == p.product_type()))
                    && search
                        .as_deref()
                        .is_none_or(|term| p.name().to_lowercase().contains(term))
            })
        } else {
            SpecificationBuilder::unfiltered()
        };

        let builder = match params.sort() {
            ProductSort::PriceAsc => builder.order_by("price", |p: &Product| p.price()),
            ProductSort::PriceDesc => builder.order_by_desc("price", |p: &Product| p.price()),
            ProductSort::Name => builder.order_by("name", |p: &Product| p.name().to_string()),
        };

        Self {
            inner: builder.build(),
        }
    }
}

delegate_specification!(query ProductSpecification => Product; inner);
