use std::collections::BTreeMap;
use std::sync::RwLock;

use rust_decimal::Decimal;
use tracing::debug;

use storefront_core::ProductId;
use storefront_products::{Category, Product};

use super::r#trait::{require_id, ProductStore, StoreError};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

/// In-memory product store.
///
/// Intended for tests/dev. Ids come from a counter that never goes backwards, so
/// an id is not reused after its product is deleted.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: RwLock<Table>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Table>, StoreError> {
        self.table
            .read()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Table>, StoreError> {
        self.table
            .write()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))
    }

    fn select(&self, pred: impl Fn(&Product) -> bool) -> Result<Vec<Product>, StoreError> {
        let table = self.read()?;
        Ok(table.rows.values().filter(|p| pred(p)).cloned().collect())
    }
}

impl ProductStore for InMemoryProductStore {
    fn create(&self, product: &mut Product) -> Result<ProductId, StoreError> {
        product.validate()?;

        let mut table = self.write()?;
        table.last_id += 1;
        let id = ProductId::from_i64(table.last_id);

        let mut row = product.clone();
        row.id = Some(id);
        table.rows.insert(id, row);
        product.id = Some(id);

        debug!(product_id = %id, name = %product.name, "created product");
        Ok(id)
    }

    fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    fn update(&self, product: &Product) -> Result<(), StoreError> {
        let id = require_id(product, "update")?;
        product.validate()?;

        let mut table = self.write()?;
        let row = table.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *row = product.clone();

        debug!(product_id = %id, "updated product");
        Ok(())
    }

    fn delete(&self, product: &Product) -> Result<(), StoreError> {
        let id = require_id(product, "delete")?;
        let removed = self.write()?.rows.remove(&id).is_some();
        debug!(product_id = %id, removed, "deleted product");
        Ok(())
    }

    fn all(&self) -> Result<Vec<Product>, StoreError> {
        self.select(|_| true)
    }

    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        self.select(|p| p.name == name)
    }

    fn find_by_availability(&self, available: bool) -> Result<Vec<Product>, StoreError> {
        self.select(|p| p.available == available)
    }

    fn find_by_category(&self, category: Category) -> Result<Vec<Product>, StoreError> {
        self.select(|p| p.category == category)
    }

    fn find_by_exact_price(&self, price: Decimal) -> Result<Vec<Product>, StoreError> {
        self.select(|p| p.price == price)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.rows.len())
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        self.write()?.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hat() -> Product {
        Product::new("Hat", "Wool", Decimal::new(1999, 2), true, Category::Cloths)
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let store = InMemoryProductStore::new();
        let mut a = hat();
        let mut b = hat();
        let id_a = store.create(&mut a).unwrap();
        let id_b = store.create(&mut b).unwrap();
        assert_eq!(a.id, Some(id_a));
        assert_eq!(b.id, Some(id_b));
        assert!(id_b > id_a);
    }

    #[test]
    fn create_discards_caller_supplied_id() {
        let store = InMemoryProductStore::new();
        let mut product = hat();
        product.id = Some(ProductId::from_i64(999));
        let id = store.create(&mut product).unwrap();
        assert_eq!(id, ProductId::from_i64(1));
        assert!(store.find(ProductId::from_i64(999)).unwrap().is_none());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = InMemoryProductStore::new();
        let mut first = hat();
        store.create(&mut first).unwrap();
        store.delete(&first).unwrap();

        let mut second = hat();
        store.create(&mut second).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn invalid_product_is_not_stored() {
        let store = InMemoryProductStore::new();
        let mut product = hat();
        product.name = String::new();
        assert!(matches!(
            store.create(&mut product),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(product.id, None);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let store = InMemoryProductStore::new();
        let mut product = hat();
        product.id = Some(ProductId::from_i64(42));
        assert_eq!(
            store.update(&product).unwrap_err(),
            StoreError::NotFound(ProductId::from_i64(42))
        );
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn delete_all_empties_the_table() {
        let store = InMemoryProductStore::new();
        for _ in 0..3 {
            store.create(&mut hat()).unwrap();
        }
        store.delete_all().unwrap();
        assert!(store.all().unwrap().is_empty());
    }
}
