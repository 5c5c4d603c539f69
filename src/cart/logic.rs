//! Pure state transitions over a cart's line collection.
//!
//! None of these functions hold state or fail. Each returns a fresh collection;
//! untouched lines keep their position.

use crate::model::{CartItem, CartLine, OrderItem, OrderRequest};

/// Adds one unit of `item`.
///
/// An existing line with the same id is bumped in place; otherwise a new line
/// with `qty = 1` is appended.
pub fn upsert(lines: &[CartLine], item: CartItem) -> Vec<CartLine> {
    if lines.iter().any(|l| l.id == item.id) {
        return increase(lines, &item.id);
    }
    let mut next = lines.to_vec();
    next.push(CartLine::new(item, 1));
    next
}

/// Increments the matching line. No-op if `id` is absent.
pub fn increase(lines: &[CartLine], id: &str) -> Vec<CartLine> {
    lines
        .iter()
        .map(|l| {
            if l.id == id {
                CartLine {
                    qty: l.qty.saturating_add(1),
                    ..l.clone()
                }
            } else {
                l.clone()
            }
        })
        .collect()
}

/// Decrements the matching line, removing it when it reaches zero.
pub fn decrease(lines: &[CartLine], id: &str) -> Vec<CartLine> {
    lines
        .iter()
        .map(|l| {
            if l.id == id {
                CartLine {
                    qty: l.qty.saturating_sub(1),
                    ..l.clone()
                }
            } else {
                l.clone()
            }
        })
        .filter(|l| l.qty > 0)
        .collect()
}

/// Sum of `price * qty`; 0 for an empty cart.
pub fn total(lines: &[CartLine]) -> u64 {
    lines
        .iter()
        .fold(0u64, |sum, l| sum.saturating_add(l.subtotal()))
}

/// Number of units across all lines (the cart badge count).
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|l| u64::from(l.qty)).sum()
}

pub fn clear() -> Vec<CartLine> {
    Vec::new()
}

/// Takes the quantities in `order` out of the cart, dropping lines that reach zero.
///
/// Lines not named in `order`, or added after it was taken, are kept.
pub fn subtract(lines: &[CartLine], order: &OrderRequest) -> Vec<CartLine> {
    lines
        .iter()
        .map(|l| {
            let ordered: u32 = order
                .items
                .iter()
                .filter(|i| i.id == l.id)
                .map(|i| i.qty)
                .sum();
            CartLine {
                qty: l.qty.saturating_sub(ordered),
                ..l.clone()
            }
        })
        .filter(|l| l.qty > 0)
        .collect()
}

/// Snapshots the lines into a `POST /orders` body.
pub fn to_order_request(lines: &[CartLine]) -> OrderRequest {
    OrderRequest {
        items: lines
            .iter()
            .map(|l| OrderItem {
                id: l.id.clone(),
                qty: l.qty,
            })
            .collect(),
    }
}
