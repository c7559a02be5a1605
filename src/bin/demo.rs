//! Walkthrough of the storefront state core against the in-memory backend:
//! guest browsing and cart/wishlist mutations, coupon application, then a
//! sign-in that migrates the guest state to the server.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_state::{
    cart::{CartInput, CartManager},
    catalog::{filter_by_category, filter_recent_products, normalize_products},
    config::AppConfig,
    models::{AuthUser, Coupon, DiscountType},
    notify::TracingNotifier,
    services::{ProductDto, memory::MemoryBackend},
    state::Storefront,
    storage::LocalStore,
    wishlist::{WishlistInput, WishlistManager},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_state=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let store = LocalStore::open(&config.data_dir)?;
    let backend = Arc::new(MemoryBackend::new());
    let notifier = Arc::new(TracingNotifier);

    backend.seed_product(
        ProductDto {
            id: "tee-1".into(),
            name: "Basic Tee".into(),
            image_url: Some("/img/tee.png".into()),
            image: None,
            price: Decimal::from(20),
            category: Some("Men's Shirts".into()),
        },
        &[
            ("Size", "M", Decimal::ZERO),
            ("Size", "L", Decimal::from(2)),
        ],
    );
    backend.seed_coupon(Coupon {
        code: "SAVE10".into(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(10),
        minimum_purchase: None,
        is_active: true,
    });

    let cart = CartManager::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        notifier.clone(),
        store.clone(),
    );
    let wishlist = WishlistManager::new(
        backend.clone(),
        backend.clone(),
        notifier.clone(),
        store.clone(),
    );
    let mut shop = Storefront::new(cart, wishlist);

    // Listing page shaping a raw API response.
    let raw = serde_json::json!([
        { "id": "tee-1", "name": "Basic Tee", "price": 20,
          "category": { "name": "Men's Shirts" },
          "specifications": [{ "name": "Size", "value": "M" }] },
        { "id": "bag-1", "name": "Tote Bag", "price": 35, "category": "Accessories" },
    ]);
    let products = normalize_products(&raw);
    tracing::info!(
        total = products.len(),
        men = filter_by_category(&products, "men").len(),
        recent = filter_recent_products(&products, config.recent_days).len(),
        "catalog loaded"
    );

    // Guest session.
    let mut input = CartInput::new("tee-1", "Basic Tee", Decimal::from(20));
    input.size = Some("M".into());
    input.quantity = Some(2);
    shop.cart.add_to_cart(input).await;
    shop.cart.apply_coupon("SAVE10").await;
    tracing::info!(
        items = shop.cart.total_items(),
        subtotal = %shop.cart.total_price(),
        discount = %shop.cart.discount_amount(),
        total = %shop.cart.final_total(),
        "guest cart"
    );
    shop.wishlist
        .toggle_wishlist(WishlistInput::new("bag-1", "Tote Bag", Decimal::from(35)))
        .await;

    // Sign-in migrates the guest cart and wishlist to the server.
    shop.sign_in(AuthUser {
        id: "user-1".into(),
        email: "user@example.com".into(),
    })
    .await;
    tracing::info!(
        items = shop.cart.total_items(),
        subtotal = %shop.cart.total_price(),
        "server cart after sign-in"
    );

    Ok(())
}
