//! Random, always-valid products for test setup.

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

use crate::category::Category;
use crate::product::Product;

/// Names the factory draws from (small on purpose, so batches share names).
pub const PRODUCT_NAMES: [&str; 11] = [
    "Hat", "Pants", "Shirt", "Apple", "Banana", "Pots", "Towels", "Ford", "Chevy", "Hammer",
    "Wrench",
];

const DESCRIPTIONS: [&str; 6] = [
    "Sturdy and reliable.",
    "Fresh from the farm.",
    "Fits most sizes.",
    "Limited edition.",
    "Imported goods.",
    "",
];

/// Price bounds in cents: 0.50 ..= 2000.00.
const MIN_PRICE_CENTS: i64 = 50;
const MAX_PRICE_CENTS: i64 = 200_000;

/// Builds unpersisted products with random field values.
#[derive(Debug, Default)]
pub struct ProductFactory;

impl ProductFactory {
    pub fn build() -> Product {
        Self::build_with(&mut rand::thread_rng())
    }

    pub fn build_batch(count: usize) -> Vec<Product> {
        let mut rng = rand::thread_rng();
        (0..count).map(|_| Self::build_with(&mut rng)).collect()
    }

    pub fn build_with<R: Rng>(rng: &mut R) -> Product {
        let name = PRODUCT_NAMES.choose(rng).copied().unwrap_or("Hat");
        let description = DESCRIPTIONS.choose(rng).copied().unwrap_or_default();
        let price = Decimal::new(rng.gen_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS), 2);
        let available = rng.gen_bool(0.5);
        let category = Category::ALL.choose(rng).copied().unwrap_or_default();
        Product::new(name, description, price, available, category)
    }
}

pub fn arb_category() -> impl Strategy<Value = Category> {
    proptest::sample::select(Category::ALL.to_vec())
}

/// Strategy over the same space as [`ProductFactory`], with free-form text.
pub fn arb_product() -> impl Strategy<Value = Product> {
    (
        "[A-Za-z][A-Za-z0-9 ]{0,49}",
        "[A-Za-z0-9 .,]{0,80}",
        MIN_PRICE_CENTS..=MAX_PRICE_CENTS,
        any::<bool>(),
        arb_category(),
    )
        .prop_map(|(name, description, cents, available, category)| {
            Product::new(name, description, Decimal::new(cents, 2), available, category)
        })
}
