//! Admin catalog CRUD. Validation runs before any external call; failures
//! surface a notice and leave the collaborator untouched.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::models::{CatalogProduct, Category, CategoryInput, ProductInput};
use crate::notify::Notifier;
use crate::services::{CategoryAdminApi, ProductAdminApi};

const MAX_NAME_LEN: usize = 100;

pub struct AdminCatalog {
    categories: Arc<dyn CategoryAdminApi>,
    products: Arc<dyn ProductAdminApi>,
    notifier: Arc<dyn Notifier>,
}

impl AdminCatalog {
    pub fn new(
        categories: Arc<dyn CategoryAdminApi>,
        products: Arc<dyn ProductAdminApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            categories,
            products,
            notifier,
        }
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.categories.list().await
    }

    pub async fn create_category(&self, input: CategoryInput) -> AppResult<Category> {
        validate_category_name(&input.name)?;
        match self.categories.create(input).await {
            Ok(category) => {
                self.notifier.success("Category created");
                Ok(category)
            }
            Err(err) => {
                tracing::warn!(error = %err, "category create failed");
                self.notifier.error("Could not create category");
                Err(err)
            }
        }
    }

    pub async fn update_category(&self, id: &str, input: CategoryInput) -> AppResult<Category> {
        validate_category_name(&input.name)?;
        match self.categories.update(id, input).await {
            Ok(category) => {
                self.notifier.success("Category updated");
                Ok(category)
            }
            Err(err) => {
                tracing::warn!(category = %id, error = %err, "category update failed");
                self.notifier.error("Could not update category");
                Err(err)
            }
        }
    }

    pub async fn delete_category(&self, id: &str) -> AppResult<()> {
        match self.categories.delete(id).await {
            Ok(()) => {
                self.notifier.success("Category deleted");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(category = %id, error = %err, "category delete failed");
                self.notifier.error("Could not delete category");
                Err(err)
            }
        }
    }

    pub async fn list_products(&self) -> AppResult<Vec<CatalogProduct>> {
        self.products.list().await
    }

    pub async fn create_product(&self, input: ProductInput) -> AppResult<CatalogProduct> {
        validate_product(&input)?;
        match self.products.create(input).await {
            Ok(product) => {
                self.notifier.success("Product created");
                Ok(product)
            }
            Err(err) => {
                tracing::warn!(error = %err, "product create failed");
                self.notifier.error("Could not create product");
                Err(err)
            }
        }
    }

    pub async fn update_product(&self, id: &str, input: ProductInput) -> AppResult<CatalogProduct> {
        validate_product(&input)?;
        match self.products.update(id, input).await {
            Ok(product) => {
                self.notifier.success("Product updated");
                Ok(product)
            }
            Err(err) => {
                tracing::warn!(product = %id, error = %err, "product update failed");
                self.notifier.error("Could not update product");
                Err(err)
            }
        }
    }

    pub async fn delete_product(&self, id: &str) -> AppResult<()> {
        match self.products.delete(id).await {
            Ok(()) => {
                self.notifier.success("Product deleted");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(product = %id, error = %err, "product delete failed");
                self.notifier.error("Could not delete product");
                Err(err)
            }
        }
    }
}

fn validate_category_name(name: &str) -> AppResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Category name is required".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(
            "Category name must be 100 characters or fewer".into(),
        ));
    }
    Ok(())
}

fn validate_product(input: &ProductInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    if input.price < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Product price cannot be negative".into(),
        ));
    }
    Ok(())
}
