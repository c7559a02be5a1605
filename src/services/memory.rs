//! In-memory reference backend. Stands in for the remote API in tests and
//! the demo binary; mirrors the server-side semantics the managers rely on
//! (cart upsert per variant, wishlist uniqueness, coupon validation).

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CatalogProduct, Category, CategoryInput, Coupon, ProductInput};
use crate::services::{
    CartApi, CartLineDto, CategoryAdminApi, CouponApi, ProductAdminApi, ProductDto,
    SpecificationApi, SpecificationDto, WishlistApi, WishlistEntryDto,
};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    specifications: Vec<SpecificationDto>,
    cart: Vec<CartLineDto>,
    wishlist: Vec<WishlistEntryDto>,
    coupons: Vec<Coupon>,
    categories: Vec<Category>,
    products: Vec<CatalogProduct>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a product and its variants; returns the specification ids
    /// in the order given. Each variant is `(attribute name, value, price delta)`.
    pub fn seed_product(
        &self,
        product: ProductDto,
        variants: &[(&str, &str, Decimal)],
    ) -> Vec<String> {
        let mut inner = self.locked();
        let mut ids = Vec::with_capacity(variants.len());
        for (name, value, delta) in variants {
            let id = Uuid::new_v4().to_string();
            inner.specifications.push(SpecificationDto {
                id: id.clone(),
                name: (*name).to_string(),
                value: (*value).to_string(),
                price: *delta,
                product: Some(product.clone()),
            });
            ids.push(id);
        }
        ids
    }

    pub fn seed_coupon(&self, coupon: Coupon) {
        self.locked().coupons.push(coupon);
    }

    pub fn cart_len(&self) -> usize {
        self.locked().cart.len()
    }

    pub fn wishlist_len(&self) -> usize {
        self.locked().wishlist.len()
    }
}

#[async_trait]
impl CartApi for MemoryBackend {
    async fn list(&self) -> AppResult<Vec<CartLineDto>> {
        Ok(self.locked().cart.clone())
    }

    async fn add(&self, specification_id: &str, quantity: u32) -> AppResult<CartLineDto> {
        let mut inner = self.locked();
        let spec = inner
            .specifications
            .iter()
            .find(|s| s.id == specification_id)
            .cloned()
            .ok_or(AppError::NotFound)?;
        if let Some(line) = inner
            .cart
            .iter_mut()
            .find(|l| l.specification.id == specification_id)
        {
            line.quantity += quantity;
            return Ok(line.clone());
        }
        let line = CartLineDto {
            id: Uuid::new_v4().to_string(),
            quantity,
            specification: spec,
        };
        inner.cart.push(line.clone());
        Ok(line)
    }

    async fn update(&self, line_id: &str, quantity: u32) -> AppResult<CartLineDto> {
        let mut inner = self.locked();
        let line = inner
            .cart
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or(AppError::NotFound)?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn remove(&self, line_id: &str) -> AppResult<()> {
        let mut inner = self.locked();
        let before = inner.cart.len();
        inner.cart.retain(|l| l.id != line_id);
        if inner.cart.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.locked().cart.clear();
        Ok(())
    }
}

#[async_trait]
impl WishlistApi for MemoryBackend {
    async fn list(&self) -> AppResult<Vec<WishlistEntryDto>> {
        Ok(self.locked().wishlist.clone())
    }

    async fn add(&self, specification_id: &str) -> AppResult<WishlistEntryDto> {
        let mut inner = self.locked();
        if inner
            .wishlist
            .iter()
            .any(|e| e.specification.id == specification_id)
        {
            return Err(AppError::Conflict("already in wishlist".into()));
        }
        let spec = inner
            .specifications
            .iter()
            .find(|s| s.id == specification_id)
            .cloned()
            .ok_or(AppError::NotFound)?;
        let entry = WishlistEntryDto {
            id: Uuid::new_v4().to_string(),
            specification: spec,
        };
        inner.wishlist.push(entry.clone());
        Ok(entry)
    }

    async fn remove(&self, entry_id: &str) -> AppResult<()> {
        let mut inner = self.locked();
        let before = inner.wishlist.len();
        inner.wishlist.retain(|e| e.id != entry_id);
        if inner.wishlist.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SpecificationApi for MemoryBackend {
    async fn list_by_product(&self, product_id: &str) -> AppResult<Vec<SpecificationDto>> {
        Ok(self
            .locked()
            .specifications
            .iter()
            .filter(|s| s.product.as_ref().is_some_and(|p| p.id == product_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CouponApi for MemoryBackend {
    async fn apply(&self, code: &str, subtotal: Decimal) -> AppResult<Coupon> {
        let inner = self.locked();
        let coupon = inner
            .coupons
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .ok_or_else(|| AppError::BadRequest("Unknown coupon code".into()))?;
        if !coupon.is_active {
            return Err(AppError::BadRequest("Coupon is no longer active".into()));
        }
        if let Some(min) = coupon.minimum_purchase {
            if subtotal < min {
                return Err(AppError::BadRequest(format!(
                    "Coupon requires a minimum purchase of {min}"
                )));
            }
        }
        Ok(coupon.clone())
    }
}

#[async_trait]
impl CategoryAdminApi for MemoryBackend {
    async fn list(&self) -> AppResult<Vec<Category>> {
        Ok(self.locked().categories.clone())
    }

    async fn create(&self, input: CategoryInput) -> AppResult<Category> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
        };
        self.locked().categories.push(category.clone());
        Ok(category)
    }

    async fn update(&self, id: &str, input: CategoryInput) -> AppResult<Category> {
        let mut inner = self.locked();
        let category = inner
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(AppError::NotFound)?;
        category.name = input.name;
        category.description = input.description;
        Ok(category.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut inner = self.locked();
        let before = inner.categories.len();
        inner.categories.retain(|c| c.id != id);
        if inner.categories.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ProductAdminApi for MemoryBackend {
    async fn list(&self) -> AppResult<Vec<CatalogProduct>> {
        Ok(self.locked().products.clone())
    }

    async fn create(&self, input: ProductInput) -> AppResult<CatalogProduct> {
        let product = CatalogProduct {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            price: input.price,
            image: input.image,
            category_id: input.category_id,
        };
        self.locked().products.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: &str, input: ProductInput) -> AppResult<CatalogProduct> {
        let mut inner = self.locked();
        let product = inner
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        product.name = input.name;
        product.price = input.price;
        product.image = input.image;
        product.category_id = input.category_id;
        Ok(product.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut inner = self.locked();
        let before = inner.products.len();
        inner.products.retain(|p| p.id != id);
        if inner.products.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
