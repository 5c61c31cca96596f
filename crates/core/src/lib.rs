//! Cupcake Core - Shared domain types.
//!
//! This crate provides the types used by the storefront server and the CLI:
//! - `storefront` - Public shop and administration panel
//! - `cli` - Command-line tools for migrations, admin users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The session cart and the order lifecycle live here so they
//! can be tested without a web session or a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, price, order status, rating
//! - [`cart`] - Session-held shopping cart
//! - [`order`] - Order total arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod types;

pub use cart::{Cart, CartEntry, CartLine, CartSnapshot, CatalogEntry, Decrement, MAX_LINE_QUANTITY};
pub use order::{LineAmount, StatusTransition, order_total};
pub use types::*;
