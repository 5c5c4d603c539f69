use serde::{Deserialize, Serialize};

/// One product entry in the cart together with its quantity.
///
/// A line with `qty == 0` never lives in a cart collection; the cart engine
/// removes it instead. Ids are unique within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub price: u64,
    pub qty: u32,
    pub available: bool,
}

impl CartLine {
    /// Creates a line for `item` with the given quantity.
    pub fn new(item: CartItem, qty: u32) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            qty,
            available: item.available,
        }
    }

    /// `price * qty`, saturating on overflow.
    pub fn subtotal(&self) -> u64 {
        self.price.saturating_mul(u64::from(self.qty))
    }
}

/// A cart line without a quantity: what the UI hands to `upsert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: u64,
    pub available: bool,
}

impl CartItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            available: true,
        }
    }
}

/// The cart as owned by the cart actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub lines: Vec<CartLine>,
    /// Set once the persisted snapshot has been loaded (or found unusable).
    pub hydrated: bool,
}
