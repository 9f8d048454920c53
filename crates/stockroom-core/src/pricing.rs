//! # Pricing
//!
//! Turns a validated basket plus current product prices into line totals,
//! a subtotal, and a discounted order total.
//!
//! ## Example
//! ```text
//!   A × 2 @ 100  ──► line 200
//!   B × 1 @  50  ──► line  50
//!                      ─────
//!             subtotal   250
//!   10% off (rounded once)  ──► total 225
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::basket::Basket;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;

/// A basket item with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Result of pricing a basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedBasket {
    pub lines: Vec<PricedLine>,
    /// Σ line totals, undiscounted.
    pub subtotal: Money,
    pub discount_percent: u32,
    /// `subtotal` with `discount_percent` applied once.
    pub total: Money,
}

/// Prices `basket` against `products` at `discount_percent`.
///
/// Unit prices are read from `products` as they are now and copied onto
/// the lines. Lines keep basket order.
///
/// ## Errors
/// - `ProductNotFound` when a basket product is missing from `products`
/// - `InvalidBasket` when a line or the subtotal overflows
///
/// ```rust
/// use chrono::Utc;
/// use stockroom_core::{price_basket, Basket, BasketItem, Product};
///
/// let product = |id: &str, price| Product {
///     id: id.into(), name: id.into(), description: None,
///     price_cents: price, stock: 10,
///     created_at: Utc::now(), updated_at: Utc::now(),
/// };
/// let basket = Basket::new(vec![BasketItem::new("a", 2), BasketItem::new("b", 1)]).unwrap();
/// let priced = price_basket(&basket, &[product("a", 100), product("b", 50)], 10).unwrap();
///
/// assert_eq!(priced.subtotal.cents(), 250);
/// assert_eq!(priced.total.cents(), 225);
/// ```
pub fn price_basket(
    basket: &Basket,
    products: &[Product],
    discount_percent: u32,
) -> CoreResult<PricedBasket> {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut lines = Vec::with_capacity(basket.len());
    let mut subtotal = Money::zero();

    for item in basket.items() {
        let product = by_id
            .get(item.product_id.as_str())
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

        let unit_price = product.price();
        let line_total = unit_price
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(|| overflow(&item.product_id))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| overflow(&item.product_id))?;

        lines.push(PricedLine {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            unit_price,
            line_total,
        });
    }

    let discount_percent = discount_percent.min(100);
    Ok(PricedBasket {
        lines,
        subtotal,
        discount_percent,
        total: subtotal.apply_discount_percent(discount_percent),
    })
}

fn overflow(product_id: &str) -> CoreError {
    CoreError::invalid_basket(format!("order amount overflows at product {product_id}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::BasketItem;
    use chrono::Utc;

    fn product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            price_cents,
            stock: 100,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn basket(items: &[(&str, i64)]) -> Basket {
        Basket::new(items.iter().map(|(id, q)| BasketItem::new(*id, *q)).collect()).unwrap()
    }

    #[test]
    fn test_two_line_basket_at_ten_percent() {
        let priced = price_basket(
            &basket(&[("a", 2), ("b", 1)]),
            &[product("a", 100), product("b", 50)],
            10,
        )
        .unwrap();

        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[0].line_total.cents(), 200);
        assert_eq!(priced.lines[1].line_total.cents(), 50);
        assert_eq!(priced.subtotal.cents(), 250);
        assert_eq!(priced.total.cents(), 225);
    }

    #[test]
    fn test_subtotal_equals_sum_of_lines() {
        let priced = price_basket(
            &basket(&[("a", 3), ("b", 7), ("c", 1)]),
            &[product("a", 333), product("b", 1), product("c", 999)],
            15,
        )
        .unwrap();

        let sum: Money = priced.lines.iter().map(|l| l.line_total).sum();
        assert_eq!(sum, priced.subtotal);
        // 2005 × 0.85 = 1704.25
        assert_eq!(priced.total.cents(), 1704);
    }

    #[test]
    fn test_discount_rounded_on_total_not_per_line() {
        // per-line rounding would give 5 + 5 = 10; once on the total gives 9
        let priced = price_basket(
            &basket(&[("a", 1), ("b", 1)]),
            &[product("a", 5), product("b", 5)],
            10,
        )
        .unwrap();
        assert_eq!(priced.total.cents(), 9);
    }

    #[test]
    fn test_zero_discount_total_equals_subtotal() {
        let priced = price_basket(&basket(&[("a", 4)]), &[product("a", 125)], 0).unwrap();
        assert_eq!(priced.total, priced.subtotal);
    }

    #[test]
    fn test_missing_product_is_reported() {
        let err = price_basket(&basket(&[("a", 1), ("ghost", 1)]), &[product("a", 1)], 0)
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_overflow_is_rejected() {
        let err = price_basket(&basket(&[("a", 2)]), &[product("a", i64::MAX)], 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBasket { .. }));
    }
}
