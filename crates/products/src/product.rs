use core::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{json, Map, Value as JsonValue};

use storefront_core::{DomainError, DomainResult, Entity, ProductId};

use crate::category::Category;

/// Maximum number of fractional digits a price may carry.
///
/// Matches the `NUMERIC(14, 2)` price column; anything finer would be rounded
/// on the way in and no longer compare equal on the way out.
pub const MAX_PRICE_SCALE: u32 = 2;

/// Column widths of the products table (in characters).
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 250;

/// Largest price representable by the price column.
const MAX_PRICE: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2); // 999_999_999_999.99

/// Catalog product.
///
/// A detached, mutable view of one stored row. `id` is `None` until a store
/// assigns one on create; every other field may be changed freely and written
/// back with the store's `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: Option<ProductId>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available: bool,
    pub category: Category,
}

impl Product {
    /// Create an unpersisted product (`id = None`).
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        available: bool,
        category: Category,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            price,
            available,
            category,
        }
    }

    /// Check the field rules every stored product must satisfy.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "name is longer than {MAX_NAME_LEN} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::validation(format!(
                "description is longer than {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        validate_price(self.price)
    }

    /// JSON object form (`price` as a decimal string, `category` by name).
    pub fn to_json(&self) -> JsonValue {
        json!({
            "id": self.id.map(|id| id.as_i64()),
            "name": self.name,
            "description": self.description,
            "price": self.price.to_string(),
            "available": self.available,
            "category": self.category.as_str(),
        })
    }

    /// Build an unpersisted product from its JSON object form.
    ///
    /// Any `id` in the payload is ignored; identity only comes from a store.
    pub fn from_json(data: &JsonValue) -> DomainResult<Self> {
        let obj = data
            .as_object()
            .ok_or_else(|| DomainError::validation("invalid product: body contained bad or no data"))?;

        let name = required_str(obj, "name")?.to_string();
        let description = required_str(obj, "description")?.to_string();

        let available = match required(obj, "available")? {
            JsonValue::Bool(b) => *b,
            other => {
                return Err(DomainError::validation(format!(
                    "invalid type for boolean [available]: {}",
                    json_type_name(other)
                )));
            }
        };

        let category = required_str(obj, "category")?
            .parse::<Category>()
            .map_err(|_| DomainError::validation("invalid attribute: category"))?;

        let price = match required(obj, "price")? {
            JsonValue::String(s) => parse_price(s)?,
            JsonValue::Number(n) => parse_price(&n.to_string())?,
            other => {
                return Err(DomainError::validation(format!(
                    "invalid type for decimal [price]: {}",
                    json_type_name(other)
                )));
            }
        };

        let product = Product::new(name, description, price, available, category);
        product.validate()?;
        Ok(product)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Option<ProductId> {
        self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Product {} id=[{}]>", self.name, id),
            None => write!(f, "<Product {} id=[None]>", self.name),
        }
    }
}

/// Parse a textual price into an exact decimal.
pub fn parse_price(text: &str) -> DomainResult<Decimal> {
    Decimal::from_str(text.trim())
        .map_err(|e| DomainError::validation(format!("invalid price '{text}': {e}")))
}

fn validate_price(price: Decimal) -> DomainResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::validation("price cannot be negative"));
    }
    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(DomainError::validation(format!(
            "price {price} has more than {MAX_PRICE_SCALE} fractional digits"
        )));
    }
    if price > MAX_PRICE {
        return Err(DomainError::validation(format!("price {price} is out of range")));
    }
    Ok(())
}

fn required<'a>(obj: &'a Map<String, JsonValue>, key: &str) -> DomainResult<&'a JsonValue> {
    obj.get(key)
        .ok_or_else(|| DomainError::validation(format!("invalid product: missing {key}")))
}

fn required_str<'a>(obj: &'a Map<String, JsonValue>, key: &str) -> DomainResult<&'a str> {
    match required(obj, key)? {
        JsonValue::String(s) => Ok(s),
        other => Err(DomainError::validation(format!(
            "invalid type for string [{key}]: {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
