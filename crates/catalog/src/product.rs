use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, EntityId, RecordId};

/// Product identifier, allocated by the data source on first commit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RecordId);

impl ProductId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(RecordId::new(value))
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl EntityId for ProductId {
    fn from_sequence(value: u64) -> Self {
        Self(RecordId::from_sequence(value))
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: u64, // Price in smallest currency unit (e.g., cents)
    pub picture_url: String,
    pub product_type: String,
    pub brand: String,
    pub quantity_in_stock: u32,
}

/// Entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: u64,
    picture_url: String,
    product_type: String,
    brand: String,
    quantity_in_stock: u32,
}

impl Product {
    /// Create a transient product (identity unassigned until committed).
    pub fn new(input: NewProduct) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if input.brand.trim().is_empty() {
            return Err(DomainError::validation("brand cannot be empty"));
        }
        if input.product_type.trim().is_empty() {
            return Err(DomainError::validation("product type cannot be empty"));
        }

        Ok(Self {
            id: ProductId::default(),
            name: input.name,
            description: input.description,
            price: input.price,
            picture_url: input.picture_url,
            product_type: input.product_type,
            brand: input.brand,
            quantity_in_stock: input.quantity_in_stock,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn picture_url(&self) -> &str {
        &self.picture_url
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn quantity_in_stock(&self) -> u32 {
        self.quantity_in_stock
    }

    pub fn is_in_stock(&self) -> bool {
        self.quantity_in_stock > 0
    }

    pub fn reprice(&mut self, price: u64) {
        self.price = price;
    }

    pub fn restock(&mut self, quantity: u32) {
        self.quantity_in_stock = quantity;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn assign_id(&mut self, id: Self::Id) {
        self.id = id;
    }
}
