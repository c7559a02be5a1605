//! Dual-mode cart state. Guests get a locally persisted line list keyed by
//! (product, size, color); authenticated sessions mirror the server cart and
//! reload it after every write instead of patching locally.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::catalog::PLACEHOLDER_IMAGE;
use crate::error::{AppError, AppResult};
use crate::models::{CartLine, Coupon, DiscountType, SessionMode};
use crate::notify::Notifier;
use crate::services::{CartApi, CartLineDto, CouponApi, SpecificationApi, SpecificationDto};
use crate::storage::{CART_KEY, COUPON_KEY, LocalStore};

/// How an add-to-cart call identifies the variant(s) to add.
#[derive(Debug, Clone, Default)]
pub enum VariantSelection {
    /// Explicit selections, attribute name -> specification id. Every value
    /// is added; an empty map falls back to the default variant.
    Selected(BTreeMap<String, String>),
    /// A single explicit specification id.
    Specification(String),
    /// Look the product's variants up and add the first one.
    #[default]
    Default,
}

#[derive(Debug, Clone)]
pub struct CartInput {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: Option<u32>,
    pub selection: VariantSelection,
}

impl CartInput {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            image: PLACEHOLDER_IMAGE.to_string(),
            category: None,
            size: None,
            color: None,
            quantity: None,
            selection: VariantSelection::Default,
        }
    }
}

pub struct CartManager {
    api: Arc<dyn CartApi>,
    specifications: Arc<dyn SpecificationApi>,
    coupons: Arc<dyn CouponApi>,
    notifier: Arc<dyn Notifier>,
    store: LocalStore,
    mode: SessionMode,
    lines: Vec<CartLine>,
    coupon: Option<Coupon>,
}

impl CartManager {
    /// Starts in guest mode, hydrating lines and any active coupon from the
    /// local store.
    pub fn new(
        api: Arc<dyn CartApi>,
        specifications: Arc<dyn SpecificationApi>,
        coupons: Arc<dyn CouponApi>,
        notifier: Arc<dyn Notifier>,
        store: LocalStore,
    ) -> Self {
        let lines = store.load_or_default(CART_KEY);
        let coupon = store.load(COUPON_KEY).ok().flatten();
        Self {
            api,
            specifications,
            coupons,
            notifier,
            store,
            mode: SessionMode::Guest,
            lines,
            coupon,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    pub async fn add_to_cart(&mut self, input: CartInput) {
        match self.mode {
            SessionMode::Guest => self.add_local(input),
            SessionMode::Authenticated => self.add_remote(input).await,
        }
    }

    /// Upserts a guest line keyed by (product, size, color). Silent: local
    /// mutations do not surface notices.
    fn add_local(&mut self, input: CartInput) {
        let quantity = input.quantity.unwrap_or(1);
        let mut lines = self.lines.clone();
        let existing = lines.iter_mut().find(|l| {
            l.id == input.product_id && l.size == input.size && l.color == input.color
        });
        match existing {
            Some(line) => line.quantity += quantity,
            None => lines.push(CartLine {
                id: input.product_id,
                product_id: None,
                name: input.name,
                unit_price: None,
                price: input.price,
                image: input.image,
                size: input.size,
                color: input.color,
                quantity,
                category: input.category,
            }),
        }
        self.replace_lines(lines);
    }

    async fn add_remote(&mut self, input: CartInput) {
        let quantity = input.quantity.unwrap_or(1);
        let specification_ids = match self.resolve_specifications(&input).await {
            Ok(ids) => ids,
            Err(AppError::NoSpecifications(product)) => {
                tracing::warn!(product, "no variants available to add");
                self.notifier
                    .error("This product has no purchasable options");
                return;
            }
            Err(err) => {
                tracing::warn!(product = %input.product_id, error = %err, "variant lookup failed");
                self.notifier.error("Could not add to cart");
                return;
            }
        };

        // Partial success is tolerated; the reload below reflects whatever
        // the server accepted.
        let mut added = 0usize;
        for specification_id in &specification_ids {
            match self.api.add(specification_id, quantity).await {
                Ok(_) => added += 1,
                Err(err) => {
                    tracing::warn!(specification = %specification_id, error = %err, "add to cart failed");
                }
            }
        }
        self.reload_from_server().await;
        if added > 0 {
            self.notifier.success("Added to cart");
        } else {
            self.notifier.error("Could not add to cart");
        }
    }

    async fn resolve_specifications(&self, input: &CartInput) -> AppResult<Vec<String>> {
        match &input.selection {
            VariantSelection::Selected(selected) if !selected.is_empty() => {
                Ok(selected.values().cloned().collect())
            }
            VariantSelection::Specification(id) => Ok(vec![id.clone()]),
            _ => {
                let specs = self
                    .specifications
                    .list_by_product(&input.product_id)
                    .await?;
                match specs.first() {
                    Some(first) => {
                        if specs.len() > 1 {
                            self.notifier
                                .info("Multiple options available; added the default one");
                        }
                        Ok(vec![first.id.clone()])
                    }
                    None => Err(AppError::NoSpecifications(input.product_id.clone())),
                }
            }
        }
    }

    pub async fn remove_from_cart(&mut self, line_id: &str, size: Option<&str>, color: Option<&str>) {
        match self.mode {
            SessionMode::Guest => {
                let lines = self
                    .lines
                    .iter()
                    .filter(|l| {
                        !(l.id == line_id
                            && l.size.as_deref() == size
                            && l.color.as_deref() == color)
                    })
                    .cloned()
                    .collect();
                self.replace_lines(lines);
            }
            SessionMode::Authenticated => match self.api.remove(line_id).await {
                Ok(()) => {
                    self.reload_from_server().await;
                    self.notifier.success("Removed from cart");
                }
                Err(err) => {
                    tracing::warn!(line = %line_id, error = %err, "remove from cart failed");
                    self.notifier.error("Could not remove from cart");
                }
            },
        }
    }

    pub async fn update_quantity(
        &mut self,
        line_id: &str,
        size: Option<&str>,
        color: Option<&str>,
        quantity: u32,
    ) {
        if quantity == 0 {
            return self.remove_from_cart(line_id, size, color).await;
        }
        match self.mode {
            SessionMode::Guest => {
                let lines = self
                    .lines
                    .iter()
                    .map(|l| {
                        let mut line = l.clone();
                        if line.id == line_id
                            && line.size.as_deref() == size
                            && line.color.as_deref() == color
                        {
                            line.quantity = quantity;
                        }
                        line
                    })
                    .collect();
                self.replace_lines(lines);
            }
            SessionMode::Authenticated => match self.api.update(line_id, quantity).await {
                Ok(_) => {
                    self.reload_from_server().await;
                    self.notifier.success("Cart updated");
                }
                Err(err) => {
                    tracing::warn!(line = %line_id, error = %err, "quantity update failed");
                    self.notifier.error("Could not update cart");
                }
            },
        }
    }

    pub async fn clear_cart(&mut self) {
        match self.mode {
            SessionMode::Guest => self.replace_lines(Vec::new()),
            SessionMode::Authenticated => match self.api.clear().await {
                Ok(()) => {
                    self.lines = Vec::new();
                    self.notifier.success("Cart cleared");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "cart clear failed");
                    self.notifier.error("Could not clear cart");
                }
            },
        }
    }

    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Discount for the active coupon; zero when there is none, it is
    /// inactive, or the subtotal misses the minimum purchase. The coupon
    /// comes from the collaborator, so the value is not trusted: the result
    /// is clamped to `[0, subtotal]` whatever the type/value combination.
    pub fn discount_amount(&self) -> Decimal {
        let Some(coupon) = &self.coupon else {
            return Decimal::ZERO;
        };
        if !coupon.is_active {
            return Decimal::ZERO;
        }
        let subtotal = self.total_price();
        if let Some(min) = coupon.minimum_purchase {
            if subtotal < min {
                return Decimal::ZERO;
            }
        }
        let amount = match coupon.discount_type {
            DiscountType::Percentage => subtotal * coupon.discount_value / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => coupon.discount_value,
        };
        amount.max(Decimal::ZERO).min(subtotal)
    }

    pub fn final_total(&self) -> Decimal {
        self.total_price() - self.discount_amount()
    }

    /// Applies a coupon against the current subtotal. Returns false on any
    /// rejection or failure; never bubbles an error to the caller.
    pub async fn apply_coupon(&mut self, code: &str) -> bool {
        match self.coupons.apply(code, self.total_price()).await {
            Ok(coupon) => {
                if let Err(err) = self.store.save(COUPON_KEY, &coupon) {
                    tracing::warn!(error = %err, "failed to persist coupon");
                }
                self.coupon = Some(coupon);
                self.notifier.success("Coupon applied");
                true
            }
            Err(err) => {
                tracing::warn!(code, error = %err, "coupon rejected");
                self.notifier.error("Invalid or ineligible coupon");
                false
            }
        }
    }

    pub fn remove_coupon(&mut self) {
        self.coupon = None;
        if let Err(err) = self.store.remove(COUPON_KEY) {
            tracing::warn!(error = %err, "failed to remove persisted coupon");
        }
    }

    /// Guest -> authenticated transition: migrate local lines best-effort,
    /// then mirror the server cart. Runs once per transition.
    pub(crate) async fn enter_authenticated(&mut self) {
        if self.mode == SessionMode::Authenticated {
            return;
        }
        self.mode = SessionMode::Authenticated;
        self.migrate_local_to_server().await;
    }

    /// Authenticated -> guest transition: drop the server mirror and re-read
    /// whatever is persisted locally.
    pub(crate) fn enter_guest(&mut self) {
        if self.mode == SessionMode::Guest {
            return;
        }
        self.mode = SessionMode::Guest;
        self.lines = self.store.load_or_default(CART_KEY);
    }

    /// Clears in-memory state only; persisted storage is untouched.
    pub(crate) fn clear_in_memory(&mut self) {
        self.lines = Vec::new();
        self.coupon = None;
    }

    async fn migrate_local_to_server(&mut self) {
        let local = std::mem::take(&mut self.lines);
        if local.is_empty() {
            self.reload_from_server().await;
            return;
        }

        let mut migrated = 0usize;
        for line in &local {
            match self.migrate_line(line).await {
                Ok(()) => migrated += 1,
                Err(err) => {
                    tracing::warn!(
                        product = line.effective_product_id(),
                        error = %err,
                        "cart line skipped during migration"
                    );
                }
            }
        }

        // The local cart is cleared even when some lines failed to migrate.
        if let Err(err) = self.store.remove(CART_KEY) {
            tracing::warn!(error = %err, "failed to clear local cart after migration");
        }
        self.reload_from_server().await;
        if migrated > 0 {
            self.notifier.success("Your cart has been synced to your account");
        }
    }

    async fn migrate_line(&self, line: &CartLine) -> AppResult<()> {
        let specs = self
            .specifications
            .list_by_product(line.effective_product_id())
            .await?;
        let spec = match_specification(&specs, line.size.as_deref(), line.color.as_deref())
            .or_else(|| specs.first())
            .ok_or_else(|| AppError::NoSpecifications(line.effective_product_id().to_string()))?;
        self.api.add(&spec.id, line.quantity).await?;
        Ok(())
    }

    async fn reload_from_server(&mut self) {
        match self.api.list().await {
            Ok(dtos) => self.lines = dtos.into_iter().map(cart_line_from_dto).collect(),
            Err(err) => tracing::warn!(error = %err, "failed to reload cart from server"),
        }
    }

    fn replace_lines(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
        if self.mode == SessionMode::Guest {
            if let Err(err) = self.store.save(CART_KEY, &self.lines) {
                tracing::warn!(error = %err, "failed to persist local cart");
            }
        }
    }
}

/// Finds a variant whose attribute name/value matches the line's size or
/// color, using the same name-substring heuristic as the catalog.
fn match_specification<'a>(
    specs: &'a [SpecificationDto],
    size: Option<&str>,
    color: Option<&str>,
) -> Option<&'a SpecificationDto> {
    specs.iter().find(|s| {
        let name = s.name.to_lowercase();
        (name.contains("size") && size.is_some_and(|v| v.eq_ignore_ascii_case(&s.value)))
            || (name.contains("color") && color.is_some_and(|v| v.eq_ignore_ascii_case(&s.value)))
    })
}

/// Flattens the server's nested specification/product payload into a line.
fn cart_line_from_dto(dto: CartLineDto) -> CartLine {
    let spec = dto.specification;
    let attribute = spec.name.to_lowercase();
    let size = attribute.contains("size").then(|| spec.value.clone());
    let color = attribute.contains("color").then(|| spec.value.clone());
    let (product_id, name, image, base_price, category) = match spec.product {
        Some(p) => (
            p.id,
            p.name,
            p.image_url
                .or(p.image)
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            p.price,
            p.category,
        ),
        None => (
            String::new(),
            String::new(),
            PLACEHOLDER_IMAGE.to_string(),
            Decimal::ZERO,
            None,
        ),
    };
    CartLine {
        id: dto.id,
        product_id: Some(product_id),
        name,
        unit_price: Some(base_price + spec.price),
        price: base_price,
        image,
        size,
        color,
        quantity: dto.quantity,
        category,
    }
}
