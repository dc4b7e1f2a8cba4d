use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use storefront_core::{DomainError, Entity, ProductId};
use storefront_products::{parse_price, Category, Product};

/// Product store operation error.
///
/// ## Error Categories
///
/// - **MissingId**: update/delete called on a product that was never persisted
/// - **NotFound**: update targeted an id with no stored row
/// - **Validation**: the product (or a price argument) is malformed
/// - **Constraint**: the database rejected the row (unique/check/range violation)
/// - **Database**: connection, pool or runtime failure
///
/// Lookups by id never produce `NotFound`; they return `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("cannot {operation} a product without an id")]
    MissingId { operation: &'static str },

    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => StoreError::Validation(msg),
            other => StoreError::Validation(other.to_string()),
        }
    }
}

/// A price argument for [`ProductStore::find_by_price`].
///
/// Callers may pass the native decimal or its textual form; text is parsed
/// here so both compare equal to the stored value.
pub trait IntoPrice {
    fn into_price(self) -> Result<Decimal, StoreError>;
}

impl IntoPrice for Decimal {
    fn into_price(self) -> Result<Decimal, StoreError> {
        Ok(self)
    }
}

impl IntoPrice for &Decimal {
    fn into_price(self) -> Result<Decimal, StoreError> {
        Ok(*self)
    }
}

impl IntoPrice for &str {
    fn into_price(self) -> Result<Decimal, StoreError> {
        Ok(parse_price(self)?)
    }
}

impl IntoPrice for String {
    fn into_price(self) -> Result<Decimal, StoreError> {
        self.as_str().into_price()
    }
}

impl IntoPrice for &String {
    fn into_price(self) -> Result<Decimal, StoreError> {
        self.as_str().into_price()
    }
}

/// Durable CRUD and field lookups for products.
///
/// ## Identity
///
/// `create` assigns a fresh id (discarding any id the value carried) and writes
/// it back into the product. `update` and `delete` need an assigned id and
/// fail with [`StoreError::MissingId`] otherwise, without touching storage.
///
/// ## Atomicity
///
/// Every write either fully applies or leaves storage unchanged.
///
/// ## Ordering
///
/// `all` and the `find_by_*` lookups return exactly the matching products in
/// whatever order the backend yields them.
pub trait ProductStore: Send + Sync {
    /// Persist a new row and assign `product.id`.
    fn create(&self, product: &mut Product) -> Result<ProductId, StoreError>;

    /// Load one product; `Ok(None)` when no row has this id.
    fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Overwrite the stored row with the product's current field values.
    fn update(&self, product: &Product) -> Result<(), StoreError>;

    /// Remove the product's row. Deleting an id that is already gone is a no-op.
    fn delete(&self, product: &Product) -> Result<(), StoreError>;

    fn all(&self) -> Result<Vec<Product>, StoreError>;

    /// Exact, case-sensitive name match.
    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError>;

    fn find_by_availability(&self, available: bool) -> Result<Vec<Product>, StoreError>;

    fn find_by_category(&self, category: Category) -> Result<Vec<Product>, StoreError>;

    /// Exact decimal equality (`12.5` matches a stored `12.50`).
    fn find_by_exact_price(&self, price: Decimal) -> Result<Vec<Product>, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    /// Remove every product.
    fn delete_all(&self) -> Result<(), StoreError>;

    /// Price lookup accepting a decimal or its textual form.
    fn find_by_price<P: IntoPrice>(&self, price: P) -> Result<Vec<Product>, StoreError>
    where
        Self: Sized,
    {
        self.find_by_exact_price(price.into_price()?)
    }
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn create(&self, product: &mut Product) -> Result<ProductId, StoreError> {
        (**self).create(product)
    }

    fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).find(id)
    }

    fn update(&self, product: &Product) -> Result<(), StoreError> {
        (**self).update(product)
    }

    fn delete(&self, product: &Product) -> Result<(), StoreError> {
        (**self).delete(product)
    }

    fn all(&self) -> Result<Vec<Product>, StoreError> {
        (**self).all()
    }

    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        (**self).find_by_name(name)
    }

    fn find_by_availability(&self, available: bool) -> Result<Vec<Product>, StoreError> {
        (**self).find_by_availability(available)
    }

    fn find_by_category(&self, category: Category) -> Result<Vec<Product>, StoreError> {
        (**self).find_by_category(category)
    }

    fn find_by_exact_price(&self, price: Decimal) -> Result<Vec<Product>, StoreError> {
        (**self).find_by_exact_price(price)
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        (**self).delete_all()
    }
}

/// Id of an entity that must already be persisted for `operation`.
pub(crate) fn require_id<E: Entity>(entity: &E, operation: &'static str) -> Result<E::Id, StoreError> {
    entity.id().ok_or(StoreError::MissingId { operation })
}
