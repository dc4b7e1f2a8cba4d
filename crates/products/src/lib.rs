//! Products domain module.
//!
//! This crate contains the catalog's `Product` record and its validation rules,
//! implemented as plain domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod product;

#[cfg(any(test, feature = "factory"))]
pub mod factory;

pub use category::Category;
pub use product::{parse_price, Product, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_PRICE_SCALE};
