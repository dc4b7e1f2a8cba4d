//! Infrastructure layer: product persistence and its configuration.

pub mod config;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use store::{
    InMemoryProductStore, IntoPrice, PostgresProductStore, ProductStore, StoreError,
};
