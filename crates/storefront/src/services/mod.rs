//! Business logic for the storefront.
//!
//! # Services
//!
//! - `auth` - Password login, registration and account editing
//! - `orders` - Order placement and dashboard metrics
//! - `export` - PDF and spreadsheet reports
//! - `whatsapp` - Prefilled chat links to the store

pub mod auth;
pub mod export;
pub mod orders;
pub mod whatsapp;
