//! Product persistence boundary.
//!
//! `ProductStore` is the synchronous contract callers depend on; the in-memory
//! and Postgres implementations live alongside it.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;
pub use r#trait::{IntoPrice, ProductStore, StoreError};
