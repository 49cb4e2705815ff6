//! Database module.
//!
//! SQLite storage for monitors and their probe records.

mod models;
mod store;

pub use models::*;
pub use store::*;
