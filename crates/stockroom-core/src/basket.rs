//! # Basket
//!
//! A validated set of `(product, quantity)` pairs submitted for purchase.
//!
//! Holding a [`Basket`] proves the items are non-empty, unique by product,
//! and within quantity limits, so nothing downstream re-checks them.
//!
//! ```text
//! raw items ──► Basket::new ──┬── Err(InvalidBasket)
//!                             └── Ok(Basket) ──► ledger.reserve_basket
//!                                           └──► price_basket
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::{MAX_BASKET_ITEMS, MAX_ITEM_QUANTITY};

/// One requested product and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BasketItem {
    pub product_id: String,
    pub quantity: i64,
}

impl BasketItem {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        BasketItem {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A basket that passed validation.
///
/// Items keep their submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Basket {
    items: Vec<BasketItem>,
}

impl Basket {
    /// Validates raw items into a basket.
    ///
    /// ## Errors
    /// `InvalidBasket` when the list is empty, longer than
    /// [`MAX_BASKET_ITEMS`], names a product twice, has a blank product id,
    /// or has a quantity outside `1..=MAX_ITEM_QUANTITY`.
    ///
    /// ```rust
    /// use stockroom_core::{Basket, BasketItem};
    ///
    /// assert!(Basket::new(vec![BasketItem::new("a", 2)]).is_ok());
    /// assert!(Basket::new(vec![]).is_err());
    /// assert!(Basket::new(vec![BasketItem::new("a", 1), BasketItem::new("a", 1)]).is_err());
    /// ```
    pub fn new(items: Vec<BasketItem>) -> CoreResult<Self> {
        if items.is_empty() {
            return Err(CoreError::invalid_basket("basket is empty"));
        }

        if items.len() > MAX_BASKET_ITEMS {
            return Err(CoreError::invalid_basket(format!(
                "basket has {} items, at most {} allowed",
                items.len(),
                MAX_BASKET_ITEMS
            )));
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.product_id.trim().is_empty() {
                return Err(CoreError::invalid_basket("product id is required"));
            }
            if item.quantity <= 0 {
                return Err(CoreError::invalid_basket(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
            if item.quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::invalid_basket(format!(
                    "quantity for product {} exceeds {}",
                    item.product_id, MAX_ITEM_QUANTITY
                )));
            }
            if !seen.insert(item.product_id.as_str()) {
                return Err(CoreError::invalid_basket(format!(
                    "product {} appears more than once",
                    item.product_id
                )));
            }
        }

        Ok(Basket { items })
    }

    /// Single-product basket, as used by `BuyProduct`.
    pub fn single(product_id: impl Into<String>, quantity: i64) -> CoreResult<Self> {
        Basket::new(vec![BasketItem::new(product_id, quantity)])
    }

    pub fn items(&self) -> &[BasketItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed basket.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Product ids in ascending order, the order locks must be taken in.
    pub fn sorted_product_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.items.iter().map(|i| i.product_id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn into_items(self) -> Vec<BasketItem> {
        self.items
    }
}

impl TryFrom<Vec<BasketItem>> for Basket {
    type Error = CoreError;

    fn try_from(items: Vec<BasketItem>) -> CoreResult<Self> {
        Basket::new(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: CoreResult<Basket>) -> String {
        match result {
            Err(CoreError::InvalidBasket { reason }) => reason,
            other => panic!("expected InvalidBasket, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_basket_keeps_order() {
        let basket = Basket::new(vec![BasketItem::new("b", 1), BasketItem::new("a", 2)]).unwrap();
        assert_eq!(basket.len(), 2);
        assert_eq!(basket.items()[0].product_id, "b");
        assert_eq!(basket.sorted_product_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(reason(Basket::new(vec![])).contains("empty"));
    }

    #[test]
    fn test_rejects_duplicate_product() {
        let r = reason(Basket::new(vec![
            BasketItem::new("a", 1),
            BasketItem::new("b", 1),
            BasketItem::new("a", 3),
        ]));
        assert!(r.contains("more than once"));
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert!(reason(Basket::single("a", 0)).contains("positive"));
        assert!(reason(Basket::single("a", -2)).contains("positive"));
    }

    #[test]
    fn test_rejects_quantity_over_limit() {
        assert!(Basket::single("a", MAX_ITEM_QUANTITY).is_ok());
        assert!(reason(Basket::single("a", MAX_ITEM_QUANTITY + 1)).contains("exceeds"));
    }

    #[test]
    fn test_rejects_too_many_items() {
        let items = (0..=MAX_BASKET_ITEMS)
            .map(|i| BasketItem::new(format!("p{i}"), 1))
            .collect();
        assert!(reason(Basket::new(items)).contains("at most"));
    }

    #[test]
    fn test_rejects_blank_product_id() {
        assert!(reason(Basket::single("  ", 1)).contains("required"));
    }
}
