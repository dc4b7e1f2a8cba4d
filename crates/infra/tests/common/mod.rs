//! Behaviour every `ProductStore` must show, written once and run per backend.
//!
//! Each check expects an empty store.

use rust_decimal::Decimal;

use storefront_core::ProductId;
use storefront_infra::{ProductStore, StoreError};
use storefront_products::factory::ProductFactory;
use storefront_products::{Category, Product};

pub fn fedora() -> Product {
    Product::new(
        "Fedora",
        "A red hat",
        Decimal::new(1250, 2),
        true,
        Category::Cloths,
    )
}

/// Create `count` factory products and return them with their assigned ids.
pub fn seed<S: ProductStore>(store: &S, count: usize) -> Vec<Product> {
    let mut products = ProductFactory::build_batch(count);
    for product in &mut products {
        store.create(product).unwrap();
    }
    products
}

pub fn create_assigns_id_and_round_trips<S: ProductStore>(store: &S) {
    let mut product = fedora();
    assert_eq!(product.to_string(), "<Product Fedora id=[None]>");

    let id = store.create(&mut product).unwrap();
    assert_eq!(product.id, Some(id));
    assert_eq!(product.to_string(), format!("<Product Fedora id=[{id}]>"));

    let found = store.find(id).unwrap().expect("created product should be found");
    assert_eq!(found, product);
    assert_eq!(found.price, Decimal::new(1250, 2));
}

pub fn factory_product_round_trips<S: ProductStore>(store: &S) {
    let mut product = ProductFactory::build();
    store.create(&mut product).unwrap();

    let found = store.find(product.id.unwrap()).unwrap().unwrap();
    assert_eq!(found.id, product.id);
    assert_eq!(found.name, product.name);
    assert_eq!(found.description, product.description);
    assert_eq!(found.price, product.price);
    assert_eq!(found.available, product.available);
    assert_eq!(found.category, product.category);
}

pub fn ids_are_unique<S: ProductStore>(store: &S) {
    let products = seed(store, 10);
    let mut ids: Vec<ProductId> = products.iter().map(|p| p.id.unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

pub fn find_unknown_id_returns_none<S: ProductStore>(store: &S) {
    assert_eq!(store.find(ProductId::from_i64(i64::MAX)).unwrap(), None);
}

pub fn invalid_product_is_rejected<S: ProductStore>(store: &S) {
    let mut product = fedora();
    product.name = "  ".to_string();
    assert!(matches!(
        store.create(&mut product),
        Err(StoreError::Validation(_))
    ));
    assert_eq!(product.id, None);

    let mut product = fedora();
    product.price = Decimal::new(12505, 3);
    assert!(matches!(
        store.create(&mut product),
        Err(StoreError::Validation(_))
    ));

    assert_eq!(store.count().unwrap(), 0);
}

pub fn update_changes_fields_and_keeps_id<S: ProductStore>(store: &S) {
    let mut product = ProductFactory::build();
    store.create(&mut product).unwrap();
    let original_id = product.id;

    product.description = "CHANGED_DESCRIPTION".to_string();
    product.price = Decimal::new(4200, 2);
    product.available = !product.available;
    store.update(&product).unwrap();
    assert_eq!(product.id, original_id);

    let all = store.all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, original_id);
    assert_eq!(all[0].description, "CHANGED_DESCRIPTION");
    assert_eq!(all[0].price, Decimal::new(4200, 2));
    assert_eq!(all[0].available, product.available);
}

pub fn update_without_id_fails_and_writes_nothing<S: ProductStore>(store: &S) {
    let mut product = ProductFactory::build();
    product.id = None;

    assert_eq!(
        store.update(&product).unwrap_err(),
        StoreError::MissingId { operation: "update" }
    );
    assert_eq!(store.count().unwrap(), 0);
}

pub fn update_of_deleted_product_is_not_found<S: ProductStore>(store: &S) {
    let mut product = ProductFactory::build();
    let id = store.create(&mut product).unwrap();
    store.delete(&product).unwrap();

    assert_eq!(store.update(&product).unwrap_err(), StoreError::NotFound(id));
    assert_eq!(store.count().unwrap(), 0);
}

pub fn delete_removes_exactly_one_row<S: ProductStore>(store: &S) {
    let products = seed(store, 3);
    assert_eq!(store.all().unwrap().len(), 3);

    store.delete(&products[1]).unwrap();
    assert_eq!(store.all().unwrap().len(), 2);
    assert_eq!(store.find(products[1].id.unwrap()).unwrap(), None);
    assert!(store.find(products[0].id.unwrap()).unwrap().is_some());
    assert!(store.find(products[2].id.unwrap()).unwrap().is_some());

    // Already gone: nothing else changes.
    store.delete(&products[1]).unwrap();
    assert_eq!(store.count().unwrap(), 2);
}

pub fn delete_without_id_fails<S: ProductStore>(store: &S) {
    seed(store, 1);
    let product = ProductFactory::build();
    assert_eq!(
        store.delete(&product).unwrap_err(),
        StoreError::MissingId { operation: "delete" }
    );
    assert_eq!(store.count().unwrap(), 1);
}

pub fn all_lists_every_product<S: ProductStore>(store: &S) {
    assert!(store.all().unwrap().is_empty());
    let created = seed(store, 5);

    let listed = store.all().unwrap();
    assert_eq!(listed.len(), 5);
    for product in &created {
        assert!(listed.contains(product), "missing {product}");
    }
}

pub fn find_by_name_matches_exactly<S: ProductStore>(store: &S) {
    let mut products = seed(store, 5);

    products[1].name = products[0].name.clone();
    store.update(&products[1]).unwrap();

    let name = products[0].name.clone();
    let expected = products.iter().filter(|p| p.name == name).count();
    assert!(expected >= 2);

    let found = store.find_by_name(&name).unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|p| p.name == name));

    assert!(store.find_by_name(&name.to_lowercase()).unwrap().is_empty());
}

pub fn find_by_availability_matches_exactly<S: ProductStore>(store: &S) {
    let products = seed(store, 10);
    let available = products[0].available;
    let expected = products.iter().filter(|p| p.available == available).count();

    let found = store.find_by_availability(available).unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|p| p.available == available));

    let others = store.find_by_availability(!available).unwrap();
    assert_eq!(found.len() + others.len(), 10);
}

pub fn find_by_category_matches_exactly<S: ProductStore>(store: &S) {
    let mut products = seed(store, 10);

    products[1].category = products[0].category;
    store.update(&products[1]).unwrap();

    let category = products[0].category;
    let expected = products.iter().filter(|p| p.category == category).count();
    assert!(expected >= 2);

    let found = store.find_by_category(category).unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|p| p.category == category));
}

pub fn find_by_price_accepts_decimal_and_text<S: ProductStore>(store: &S) {
    let mut products = seed(store, 10);

    // Guarantee a duplicate price in the population.
    products[1].price = products[0].price;
    store.update(&products[1]).unwrap();

    let price = products[0].price;
    let expected = products.iter().filter(|p| p.price == price).count();
    assert!(expected >= 2);

    let by_decimal = store.find_by_price(price).unwrap();
    assert_eq!(by_decimal.len(), expected);
    assert!(by_decimal.iter().all(|p| p.price == price));

    let by_text = store.find_by_price(price.to_string()).unwrap();
    assert_eq!(by_text.len(), expected);

    let normalized = price.normalize().to_string();
    assert_eq!(store.find_by_price(normalized.as_str()).unwrap().len(), expected);
}

pub fn find_by_price_rejects_garbage<S: ProductStore>(store: &S) {
    assert!(matches!(
        store.find_by_price("not a price"),
        Err(StoreError::Validation(_))
    ));
}
