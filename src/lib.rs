//! State core for an e-commerce storefront: product normalization and
//! listing filters, a local persistent store, and dual-mode (guest vs.
//! authenticated) cart/wishlist managers with best-effort migration of
//! guest state on sign-in.
//!
//! Transport, rendering, and auth are external; the managers talk to the
//! API through the traits in [`services`] and report outcomes through
//! [`notify::Notifier`].

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod services;
pub mod state;
pub mod storage;
pub mod wishlist;
