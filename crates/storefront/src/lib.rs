//! Cupcake bakery storefront library.
//!
//! Public catalog, session cart, customer orders and the administration
//! panel, served by the `cupcake-storefront` binary. Exposed as a library so
//! the CLI can reuse the repositories and migrations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

/// Embedded SQL migrations for the storefront database.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
