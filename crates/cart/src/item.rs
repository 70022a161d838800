use serde::{Deserialize, Serialize};

use storefront_catalog::Product;
use storefront_core::{Price, ProductId, UserId, ValueObject};

/// One cart line.
///
/// `name` and `price` are copied from the catalog when the item is added and never refreshed
/// afterwards, so the cart shows what the shopper saw even if the product later changes or
/// disappears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Milliseconds since the Unix epoch.
    pub added_at: i64,
}

impl CartItem {
    pub fn from_product(product: &Product, added_at: i64) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price.clone(),
            added_at,
        }
    }
}

impl ValueObject for CartItem {}

/// Which backing store the visible cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CartScope {
    /// No one signed in: the cart lives in device storage.
    #[default]
    Anonymous,
    /// Signed in: the cart lives in the `cart` field of the user's record.
    Identified(UserId),
}

impl CartScope {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            CartScope::Anonymous => None,
            CartScope::Identified(uid) => Some(uid),
        }
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, CartScope::Identified(_))
    }
}

impl core::fmt::Display for CartScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CartScope::Anonymous => f.write_str("anonymous"),
            CartScope::Identified(uid) => write!(f, "user:{uid}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cart_item_wire_shape() {
        let item = CartItem {
            id: ProductId::from("a"),
            name: "Herbal Tea".into(),
            price: Price::from("9.99"),
            added_at: 1_700_000_000_000,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"id": "a", "name": "Herbal Tea", "price": "9.99", "addedAt": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn scope_display() {
        assert_eq!(CartScope::Anonymous.to_string(), "anonymous");
        assert_eq!(CartScope::Identified(UserId::from("u1")).to_string(), "user:u1");
    }
}
