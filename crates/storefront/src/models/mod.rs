//! Domain models for the storefront.
//!
//! These types are what handlers and templates work with. Database row types
//! live next to their queries in [`crate::db`] and convert into these.

pub mod cupcake;
pub mod order;
pub mod session;
pub mod user;

pub use cupcake::{Cupcake, CupcakeInput, CupcakeListing};
pub use order::{Order, OrderDetail, OrderLine, OrderSummary, ReportFilter, ReportQuery, StatusLogEntry};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
