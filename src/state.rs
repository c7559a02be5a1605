//! Root storefront context. Owns both managers and the signed-in user, and
//! drives session transitions in a fixed order: auth state first, then cart,
//! then wishlist, since both managers branch on it.

use crate::cart::CartManager;
use crate::models::{AuthUser, SessionMode};
use crate::wishlist::WishlistManager;

pub struct Storefront {
    pub cart: CartManager,
    pub wishlist: WishlistManager,
    user: Option<AuthUser>,
}

impl Storefront {
    pub fn new(cart: CartManager, wishlist: WishlistManager) -> Self {
        Self {
            cart,
            wishlist,
            user: None,
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn mode(&self) -> SessionMode {
        if self.user.is_some() {
            SessionMode::Authenticated
        } else {
            SessionMode::Guest
        }
    }

    /// Switches both managers to authenticated mode, migrating any guest
    /// state. A second call while signed in is a no-op.
    pub async fn sign_in(&mut self, user: AuthUser) {
        if self.user.is_some() {
            return;
        }
        tracing::info!(user = %user.id, "signing in");
        self.user = Some(user);
        self.cart.enter_authenticated().await;
        self.wishlist.enter_authenticated().await;
    }

    /// Drops the server-backed mirror and falls back to whatever guest
    /// state is persisted locally. The server cart itself is untouched.
    pub fn sign_out(&mut self) {
        if self.user.take().is_none() {
            return;
        }
        self.cart.enter_guest();
        self.wishlist.enter_guest();
    }

    /// Root unmount: clear in-memory collections, leave persisted storage.
    pub fn teardown(&mut self) {
        self.cart.clear_in_memory();
        self.wishlist.clear_in_memory();
        self.user = None;
    }
}
