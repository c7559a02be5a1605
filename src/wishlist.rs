//! Dual-mode wishlist state. Guests track membership by product id only;
//! authenticated sessions track individual variants behind the API, with
//! duplicate adds treated as benign.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::catalog::PLACEHOLDER_IMAGE;
use crate::error::{AppError, AppResult};
use crate::models::{SessionMode, WishlistEntry};
use crate::notify::Notifier;
use crate::services::{SpecificationApi, WishlistApi, WishlistEntryDto};
use crate::storage::{LocalStore, WISHLIST_KEY};

#[derive(Debug, Clone)]
pub struct WishlistInput {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub category: Option<String>,
    /// Variant to wishlist; when absent the product's first variant is used.
    pub specification_id: Option<String>,
}

impl WishlistInput {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            image: PLACEHOLDER_IMAGE.to_string(),
            category: None,
            specification_id: None,
        }
    }
}

pub struct WishlistManager {
    api: Arc<dyn WishlistApi>,
    specifications: Arc<dyn SpecificationApi>,
    notifier: Arc<dyn Notifier>,
    store: LocalStore,
    mode: SessionMode,
    entries: Vec<WishlistEntry>,
}

impl WishlistManager {
    pub fn new(
        api: Arc<dyn WishlistApi>,
        specifications: Arc<dyn SpecificationApi>,
        notifier: Arc<dyn Notifier>,
        store: LocalStore,
    ) -> Self {
        let entries = store.load_or_default(WISHLIST_KEY);
        Self {
            api,
            specifications,
            notifier,
            store,
            mode: SessionMode::Guest,
            entries,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    /// Guest adds are a no-op when the product is already present; there is
    /// no variant granularity without a server id.
    pub async fn add_to_wishlist(&mut self, input: WishlistInput) {
        match self.mode {
            SessionMode::Guest => {
                if self.is_product_wishlisted(&input.product_id) {
                    return;
                }
                let mut entries = self.entries.clone();
                entries.push(WishlistEntry {
                    id: input.product_id,
                    product_id: None,
                    specification_id: None,
                    name: input.name,
                    price: input.price,
                    image: input.image,
                    category: input.category,
                });
                self.replace_entries(entries);
            }
            SessionMode::Authenticated => self.add_remote(input).await,
        }
    }

    async fn add_remote(&mut self, input: WishlistInput) {
        let specification_id = match &input.specification_id {
            Some(id) => id.clone(),
            None => match self.default_specification(&input.product_id).await {
                Ok(id) => id,
                Err(AppError::NoSpecifications(product)) => {
                    tracing::warn!(product, "no variants available to wishlist");
                    self.notifier
                        .error("This product has no purchasable options");
                    return;
                }
                Err(err) => {
                    tracing::warn!(product = %input.product_id, error = %err, "variant lookup failed");
                    self.notifier.error("Could not add to wishlist");
                    return;
                }
            },
        };
        match self.api.add(&specification_id).await {
            Ok(_) => {
                self.reload_from_server().await;
                self.notifier.success("Added to wishlist");
            }
            // Already present on the server: informational, not a failure.
            Err(AppError::Conflict(_)) => {
                self.notifier.info("Already in your wishlist");
            }
            Err(err) => {
                tracing::warn!(specification = %specification_id, error = %err, "wishlist add failed");
                self.notifier.error("Could not add to wishlist");
            }
        }
    }

    async fn default_specification(&self, product_id: &str) -> AppResult<String> {
        let specs = self.specifications.list_by_product(product_id).await?;
        specs
            .first()
            .map(|s| s.id.clone())
            .ok_or_else(|| AppError::NoSpecifications(product_id.to_string()))
    }

    /// Membership toggle. Authenticated mode checks by variant id when one
    /// is given, else by product id, removing the first match; guest mode
    /// toggles by product id only.
    pub async fn toggle_wishlist(&mut self, input: WishlistInput) {
        match self.mode {
            SessionMode::Guest => {
                if self.is_product_wishlisted(&input.product_id) {
                    let entries = self
                        .entries
                        .iter()
                        .filter(|e| e.effective_product_id() != input.product_id)
                        .cloned()
                        .collect();
                    self.replace_entries(entries);
                } else {
                    self.add_to_wishlist(input).await;
                }
            }
            SessionMode::Authenticated => {
                let existing = match &input.specification_id {
                    Some(spec) => self
                        .entries
                        .iter()
                        .find(|e| e.specification_id.as_deref() == Some(spec.as_str())),
                    None => self
                        .entries
                        .iter()
                        .find(|e| e.effective_product_id() == input.product_id),
                }
                .map(|e| e.id.clone());
                match existing {
                    Some(entry_id) => self.remove_remote(&entry_id).await,
                    None => self.add_remote(input).await,
                }
            }
        }
    }

    pub async fn remove_from_wishlist(&mut self, entry_id: &str) {
        match self.mode {
            SessionMode::Guest => {
                let entries = self
                    .entries
                    .iter()
                    .filter(|e| e.id != entry_id)
                    .cloned()
                    .collect();
                self.replace_entries(entries);
            }
            SessionMode::Authenticated => self.remove_remote(entry_id).await,
        }
    }

    async fn remove_remote(&mut self, entry_id: &str) {
        match self.api.remove(entry_id).await {
            Ok(()) => {
                self.reload_from_server().await;
                self.notifier.success("Removed from wishlist");
            }
            Err(err) => {
                tracing::warn!(entry = %entry_id, error = %err, "wishlist remove failed");
                self.notifier.error("Could not remove from wishlist");
            }
        }
    }

    /// Variant-level membership. Always false in guest mode, which tracks
    /// products only; callers must tolerate the asymmetry.
    pub fn is_wishlisted_by_spec(&self, specification_id: &str) -> bool {
        self.mode == SessionMode::Authenticated
            && self
                .entries
                .iter()
                .any(|e| e.specification_id.as_deref() == Some(specification_id))
    }

    pub fn is_product_wishlisted(&self, product_id: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.effective_product_id() == product_id)
    }

    pub(crate) async fn enter_authenticated(&mut self) {
        if self.mode == SessionMode::Authenticated {
            return;
        }
        self.mode = SessionMode::Authenticated;
        self.migrate_local_to_server().await;
    }

    pub(crate) fn enter_guest(&mut self) {
        if self.mode == SessionMode::Guest {
            return;
        }
        self.mode = SessionMode::Guest;
        self.entries = self.store.load_or_default(WISHLIST_KEY);
    }

    pub(crate) fn clear_in_memory(&mut self) {
        self.entries = Vec::new();
    }

    /// Best-effort, mirrors the cart migration: per-entry failures are
    /// logged and skipped, conflicts count as already-synced, and the local
    /// wishlist is cleared regardless of per-entry outcomes.
    async fn migrate_local_to_server(&mut self) {
        let local = std::mem::take(&mut self.entries);
        if local.is_empty() {
            self.reload_from_server().await;
            return;
        }

        let mut migrated = 0usize;
        for entry in &local {
            match self.migrate_entry(entry).await {
                Ok(()) => migrated += 1,
                Err(AppError::Conflict(_)) => migrated += 1,
                Err(err) => {
                    tracing::warn!(
                        product = entry.effective_product_id(),
                        error = %err,
                        "wishlist entry skipped during migration"
                    );
                }
            }
        }

        if let Err(err) = self.store.remove(WISHLIST_KEY) {
            tracing::warn!(error = %err, "failed to clear local wishlist after migration");
        }
        self.reload_from_server().await;
        if migrated > 0 {
            self.notifier
                .success("Your wishlist has been synced to your account");
        }
    }

    async fn migrate_entry(&self, entry: &WishlistEntry) -> AppResult<()> {
        let specification_id = self
            .default_specification(entry.effective_product_id())
            .await?;
        self.api.add(&specification_id).await?;
        Ok(())
    }

    async fn reload_from_server(&mut self) {
        match self.api.list().await {
            Ok(dtos) => self.entries = dtos.into_iter().map(wishlist_entry_from_dto).collect(),
            Err(err) => tracing::warn!(error = %err, "failed to reload wishlist from server"),
        }
    }

    fn replace_entries(&mut self, entries: Vec<WishlistEntry>) {
        self.entries = entries;
        if self.mode == SessionMode::Guest {
            if let Err(err) = self.store.save(WISHLIST_KEY, &self.entries) {
                tracing::warn!(error = %err, "failed to persist local wishlist");
            }
        }
    }
}

fn wishlist_entry_from_dto(dto: WishlistEntryDto) -> WishlistEntry {
    let spec = dto.specification;
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
    WishlistEntry {
        id: dto.id,
        product_id: Some(product_id),
        specification_id: Some(spec.id),
        name,
        price: base_price + spec.price,
        image,
        category,
    }
}
