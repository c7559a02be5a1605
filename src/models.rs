use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether cart/wishlist state lives in local storage or behind the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Guest,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// A single purchasable line in the effective cart.
///
/// For guests `id` is the product id and only `price` is populated; for
/// authenticated sessions `id` is the server-issued cart-item id and
/// `unit_price` carries the base price plus the variant delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub name: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub category: Option<String>,
}

impl CartLine {
    pub fn effective_product_id(&self) -> &str {
        self.product_id.as_deref().unwrap_or(&self.id)
    }

    /// Unit price fallback chain: `unit_price` -> `price` -> 0.
    pub fn effective_unit_price(&self) -> Decimal {
        self.unit_price.unwrap_or(self.price)
    }

    pub fn line_total(&self) -> Decimal {
        self.effective_unit_price() * Decimal::from(self.quantity)
    }
}

/// Membership marker for a product or a specific variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification_id: Option<String>,
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl WishlistEntry {
    pub fn effective_product_id(&self) -> &str {
        self.product_id.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_purchase: Option<Decimal>,
    pub is_active: bool,
}

/// Admin-side category record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Admin-side product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}
