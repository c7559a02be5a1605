//! Collaborator contracts. The concrete transport (HTTP client, endpoints,
//! auth token plumbing) lives outside this crate; managers only depend on
//! these traits.

pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{CatalogProduct, Category, CategoryInput, Coupon, ProductInput};

/// Product summary as nested inside cart/wishlist payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
}

/// A purchasable variant: one named attribute (e.g. "Size" / "M") with a
/// price delta on top of the product's base price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationDto {
    pub id: String,
    pub name: String,
    pub value: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub product: Option<ProductDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineDto {
    pub id: String,
    pub quantity: u32,
    pub specification: SpecificationDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntryDto {
    pub id: String,
    pub specification: SpecificationDto,
}

#[async_trait]
pub trait CartApi: Send + Sync {
    async fn list(&self) -> AppResult<Vec<CartLineDto>>;
    async fn add(&self, specification_id: &str, quantity: u32) -> AppResult<CartLineDto>;
    async fn update(&self, line_id: &str, quantity: u32) -> AppResult<CartLineDto>;
    async fn remove(&self, line_id: &str) -> AppResult<()>;
    async fn clear(&self) -> AppResult<()>;
}

#[async_trait]
pub trait WishlistApi: Send + Sync {
    async fn list(&self) -> AppResult<Vec<WishlistEntryDto>>;
    /// Fails with [`crate::error::AppError::Conflict`] when the variant is
    /// already wishlisted.
    async fn add(&self, specification_id: &str) -> AppResult<WishlistEntryDto>;
    async fn remove(&self, entry_id: &str) -> AppResult<()>;
}

#[async_trait]
pub trait SpecificationApi: Send + Sync {
    async fn list_by_product(&self, product_id: &str) -> AppResult<Vec<SpecificationDto>>;
}

#[async_trait]
pub trait CouponApi: Send + Sync {
    /// Validates `code` against the given subtotal and returns the coupon on
    /// success; business-rule rejections come back as errors.
    async fn apply(&self, code: &str, subtotal: Decimal) -> AppResult<Coupon>;
}

#[async_trait]
pub trait CategoryAdminApi: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Category>>;
    async fn create(&self, input: CategoryInput) -> AppResult<Category>;
    async fn update(&self, id: &str, input: CategoryInput) -> AppResult<Category>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}

#[async_trait]
pub trait ProductAdminApi: Send + Sync {
    async fn list(&self) -> AppResult<Vec<CatalogProduct>>;
    async fn create(&self, input: ProductInput) -> AppResult<CatalogProduct>;
    async fn update(&self, id: &str, input: ProductInput) -> AppResult<CatalogProduct>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}
