use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use storefront_state::{
    cart::{CartInput, CartManager, VariantSelection},
    error::{AppError, AppResult},
    models::{AuthUser, CartLine, Coupon, DiscountType, SessionMode},
    notify::{NoticeKind, RecordingNotifier},
    services::{CartApi, CartLineDto, ProductDto, memory::MemoryBackend},
    state::Storefront,
    storage::{CART_KEY, LocalStore},
    wishlist::WishlistManager,
};

struct Harness {
    backend: Arc<MemoryBackend>,
    notifier: Arc<RecordingNotifier>,
    store: LocalStore,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LocalStore::open(dir.path()).expect("open store");
    Harness {
        backend: Arc::new(MemoryBackend::new()),
        notifier: Arc::new(RecordingNotifier::default()),
        store,
        _dir: dir,
    }
}

fn cart_manager(h: &Harness) -> CartManager {
    CartManager::new(
        h.backend.clone(),
        h.backend.clone(),
        h.backend.clone(),
        h.notifier.clone(),
        h.store.clone(),
    )
}

fn storefront(h: &Harness) -> Storefront {
    let wishlist = WishlistManager::new(
        h.backend.clone(),
        h.backend.clone(),
        h.notifier.clone(),
        h.store.clone(),
    );
    Storefront::new(cart_manager(h), wishlist)
}

fn user() -> AuthUser {
    AuthUser {
        id: "user-1".into(),
        email: "user@example.com".into(),
    }
}

fn tee_product() -> ProductDto {
    ProductDto {
        id: "p1".into(),
        name: "Basic Tee".into(),
        image_url: Some("/img/tee.png".into()),
        image: None,
        price: Decimal::from(20),
        category: Some("Men's Shirts".into()),
    }
}

fn tee_input(quantity: u32) -> CartInput {
    let mut input = CartInput::new("p1", "Basic Tee", Decimal::from(20));
    input.size = Some("M".into());
    input.color = Some("blue".into());
    input.quantity = Some(quantity);
    input
}

#[tokio::test]
async fn repeated_guest_adds_accumulate_into_one_line() {
    let h = harness();
    let mut cart = cart_manager(&h);

    for _ in 0..3 {
        cart.add_to_cart(tee_input(2)).await;
    }

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, 6);
    assert_eq!(cart.total_items(), 6);
}

#[tokio::test]
async fn distinct_variant_tuples_get_distinct_lines() {
    let h = harness();
    let mut cart = cart_manager(&h);

    cart.add_to_cart(tee_input(1)).await;
    let mut large = tee_input(1);
    large.size = Some("L".into());
    cart.add_to_cart(large).await;

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.total_items(), 2);
}

#[tokio::test]
async fn save10_scenario_totals() {
    let h = harness();
    h.backend.seed_coupon(Coupon {
        code: "SAVE10".into(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(10),
        minimum_purchase: None,
        is_active: true,
    });
    let mut cart = cart_manager(&h);
    cart.add_to_cart(tee_input(2)).await;

    assert!(cart.apply_coupon("SAVE10").await);
    assert_eq!(cart.total_price(), Decimal::from(40));
    assert_eq!(cart.discount_amount(), Decimal::from(4));
    assert_eq!(cart.final_total(), Decimal::from(36));
}

#[tokio::test]
async fn coupon_rejections_return_false_without_state_change() {
    let h = harness();
    h.backend.seed_coupon(Coupon {
        code: "BIGSPEND".into(),
        discount_type: DiscountType::Fixed,
        discount_value: Decimal::from(5),
        minimum_purchase: Some(Decimal::from(100)),
        is_active: true,
    });
    h.backend.seed_coupon(Coupon {
        code: "EXPIRED".into(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(50),
        minimum_purchase: None,
        is_active: false,
    });
    let mut cart = cart_manager(&h);
    cart.add_to_cart(tee_input(2)).await;

    assert!(!cart.apply_coupon("UNKNOWN").await);
    assert!(!cart.apply_coupon("BIGSPEND").await);
    assert!(!cart.apply_coupon("EXPIRED").await);
    assert!(cart.coupon().is_none());
    assert_eq!(cart.discount_amount(), Decimal::ZERO);
}

#[tokio::test]
async fn fixed_discount_never_exceeds_subtotal() {
    let h = harness();
    h.backend.seed_coupon(Coupon {
        code: "FLAT50".into(),
        discount_type: DiscountType::Fixed,
        discount_value: Decimal::from(50),
        minimum_purchase: None,
        is_active: true,
    });
    let mut cart = cart_manager(&h);
    cart.add_to_cart(tee_input(2)).await;

    assert!(cart.apply_coupon("FLAT50").await);
    assert_eq!(cart.discount_amount(), Decimal::from(40));
    assert_eq!(cart.final_total(), Decimal::ZERO);
}

#[tokio::test]
async fn discount_is_clamped_to_subtotal_for_any_coupon_value() {
    let h = harness();
    h.backend.seed_coupon(Coupon {
        code: "OVER150".into(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(150),
        minimum_purchase: None,
        is_active: true,
    });
    h.backend.seed_coupon(Coupon {
        code: "NEGATIVE".into(),
        discount_type: DiscountType::Fixed,
        discount_value: Decimal::from(-5),
        minimum_purchase: None,
        is_active: true,
    });
    let mut cart = cart_manager(&h);
    cart.add_to_cart(tee_input(2)).await;

    assert!(cart.apply_coupon("OVER150").await);
    assert_eq!(cart.discount_amount(), Decimal::from(40));
    assert_eq!(cart.final_total(), Decimal::ZERO);

    assert!(cart.apply_coupon("NEGATIVE").await);
    assert_eq!(cart.discount_amount(), Decimal::ZERO);
    assert_eq!(cart.final_total(), Decimal::from(40));
}

#[tokio::test]
async fn update_quantity_zero_matches_remove() {
    let h = harness();
    let mut cart = cart_manager(&h);
    cart.add_to_cart(tee_input(2)).await;
    cart.update_quantity("p1", Some("M"), Some("blue"), 0).await;

    assert!(cart.lines().is_empty());
    let persisted: Vec<CartLine> = h.store.load(CART_KEY).unwrap().unwrap_or_default();
    assert!(persisted.is_empty());

    cart.add_to_cart(tee_input(2)).await;
    cart.remove_from_cart("p1", Some("M"), Some("blue")).await;
    assert!(cart.lines().is_empty());
    let persisted: Vec<CartLine> = h.store.load(CART_KEY).unwrap().unwrap_or_default();
    assert!(persisted.is_empty());
}

#[tokio::test]
async fn guest_update_quantity_rewrites_matching_line() {
    let h = harness();
    let mut cart = cart_manager(&h);
    cart.add_to_cart(tee_input(2)).await;
    cart.update_quantity("p1", Some("M"), Some("blue"), 5).await;

    assert_eq!(cart.lines()[0].quantity, 5);
    assert_eq!(cart.total_items(), 5);
}

#[tokio::test]
async fn sign_in_migrates_guest_cart_and_clears_local_storage() {
    let h = harness();
    h.backend.seed_product(
        tee_product(),
        &[("Size", "M", Decimal::ZERO), ("Size", "L", Decimal::from(2))],
    );
    // No variants registered for p2: its line cannot migrate.
    let mut shop = storefront(&h);
    let mut large = tee_input(2);
    large.size = Some("L".into());
    large.color = None;
    shop.cart.add_to_cart(large).await;
    let mut orphan = CartInput::new("p2", "Discontinued", Decimal::from(9));
    orphan.quantity = Some(1);
    shop.cart.add_to_cart(orphan).await;
    assert_eq!(shop.cart.lines().len(), 2);

    shop.sign_in(user()).await;

    assert_eq!(shop.cart.mode(), SessionMode::Authenticated);
    // Local storage is cleared even though one line failed to migrate.
    let persisted: Option<Vec<CartLine>> = h.store.load(CART_KEY).unwrap();
    assert!(persisted.is_none());
    // The matching variant (L, +2) was chosen, not the first one.
    assert_eq!(shop.cart.lines().len(), 1);
    let line = &shop.cart.lines()[0];
    assert_eq!(line.size.as_deref(), Some("L"));
    assert_eq!(line.quantity, 2);
    assert_eq!(line.unit_price, Some(Decimal::from(22)));
}

#[tokio::test]
async fn authenticated_default_variant_add_notifies_when_multiple_exist() {
    let h = harness();
    h.backend.seed_product(
        tee_product(),
        &[("Size", "M", Decimal::ZERO), ("Size", "L", Decimal::from(2))],
    );
    let mut shop = storefront(&h);
    shop.sign_in(user()).await;

    let mut input = CartInput::new("p1", "Basic Tee", Decimal::from(20));
    input.selection = VariantSelection::Default;
    shop.cart.add_to_cart(input).await;

    assert_eq!(h.backend.cart_len(), 1);
    assert_eq!(shop.cart.lines()[0].size.as_deref(), Some("M"));
    assert!(h.notifier.has(NoticeKind::Info));
    assert!(h.notifier.has(NoticeKind::Success));
}

#[tokio::test]
async fn zero_variants_is_a_failure_without_mutation() {
    let h = harness();
    let mut shop = storefront(&h);
    shop.sign_in(user()).await;

    shop.cart
        .add_to_cart(CartInput::new("ghost", "Ghost", Decimal::from(5)))
        .await;

    assert_eq!(h.backend.cart_len(), 0);
    assert!(shop.cart.lines().is_empty());
    assert!(h.notifier.has(NoticeKind::Error));
}

#[tokio::test]
async fn authenticated_mutations_reload_from_server() {
    let h = harness();
    let spec_ids = h
        .backend
        .seed_product(tee_product(), &[("Size", "M", Decimal::ZERO)]);
    let mut shop = storefront(&h);
    shop.sign_in(user()).await;

    let mut input = CartInput::new("p1", "Basic Tee", Decimal::from(20));
    input.selection = VariantSelection::Specification(spec_ids[0].clone());
    input.quantity = Some(2);
    shop.cart.add_to_cart(input).await;
    assert_eq!(shop.cart.lines().len(), 1);
    let line_id = shop.cart.lines()[0].id.clone();

    shop.cart.update_quantity(&line_id, None, None, 5).await;
    assert_eq!(shop.cart.lines()[0].quantity, 5);

    shop.cart.remove_from_cart(&line_id, None, None).await;
    assert!(shop.cart.lines().is_empty());
    assert_eq!(h.backend.cart_len(), 0);
}

#[tokio::test]
async fn clear_cart_empties_both_modes() {
    let h = harness();
    let spec_ids = h
        .backend
        .seed_product(tee_product(), &[("Size", "M", Decimal::ZERO)]);
    let mut shop = storefront(&h);
    shop.cart.add_to_cart(tee_input(3)).await;
    shop.cart.clear_cart().await;
    assert!(shop.cart.lines().is_empty());

    shop.sign_in(user()).await;
    let mut input = CartInput::new("p1", "Basic Tee", Decimal::from(20));
    input.selection = VariantSelection::Specification(spec_ids[0].clone());
    shop.cart.add_to_cart(input).await;
    shop.cart.clear_cart().await;
    assert!(shop.cart.lines().is_empty());
    assert_eq!(h.backend.cart_len(), 0);
}

/// Cart service that fails every call, as a network outage would.
struct UnavailableCartApi;

#[async_trait]
impl CartApi for UnavailableCartApi {
    async fn list(&self) -> AppResult<Vec<CartLineDto>> {
        Err(AppError::Service("cart service unavailable".into()))
    }

    async fn add(&self, _specification_id: &str, _quantity: u32) -> AppResult<CartLineDto> {
        Err(AppError::Service("cart service unavailable".into()))
    }

    async fn update(&self, _line_id: &str, _quantity: u32) -> AppResult<CartLineDto> {
        Err(AppError::Service("cart service unavailable".into()))
    }

    async fn remove(&self, _line_id: &str) -> AppResult<()> {
        Err(AppError::Service("cart service unavailable".into()))
    }

    async fn clear(&self) -> AppResult<()> {
        Err(AppError::Service("cart service unavailable".into()))
    }
}

#[tokio::test]
async fn transient_cart_failure_notifies_and_leaves_state_unchanged() {
    let h = harness();
    let spec_ids = h
        .backend
        .seed_product(tee_product(), &[("Size", "M", Decimal::ZERO)]);
    let cart = CartManager::new(
        Arc::new(UnavailableCartApi),
        h.backend.clone(),
        h.backend.clone(),
        h.notifier.clone(),
        h.store.clone(),
    );
    let wishlist = WishlistManager::new(
        h.backend.clone(),
        h.backend.clone(),
        h.notifier.clone(),
        h.store.clone(),
    );
    let mut shop = Storefront::new(cart, wishlist);
    shop.sign_in(user()).await;

    let mut input = CartInput::new("p1", "Basic Tee", Decimal::from(20));
    input.selection = VariantSelection::Specification(spec_ids[0].clone());
    shop.cart.add_to_cart(input).await;

    assert!(shop.cart.lines().is_empty());
    assert!(h.notifier.has(NoticeKind::Error));
    assert!(!h.notifier.has(NoticeKind::Success));
}

#[tokio::test]
async fn sign_out_returns_to_persisted_guest_state() {
    let h = harness();
    h.backend
        .seed_product(tee_product(), &[("Size", "M", Decimal::ZERO)]);
    let mut shop = storefront(&h);
    shop.cart.add_to_cart(tee_input(1)).await;
    shop.sign_in(user()).await;
    assert_eq!(shop.cart.mode(), SessionMode::Authenticated);

    shop.sign_out();
    assert_eq!(shop.cart.mode(), SessionMode::Guest);
    // Migration already cleared the local cart, so the guest view is empty.
    assert!(shop.cart.lines().is_empty());
}
