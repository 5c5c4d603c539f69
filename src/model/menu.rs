use serde::{Deserialize, Serialize};

use super::CartItem;

/// An entry on the menu served by `GET /menu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: u64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl From<MenuItem> for CartItem {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            available: item.available,
        }
    }
}

impl From<&MenuItem> for CartItem {
    fn from(item: &MenuItem) -> Self {
        item.clone().into()
    }
}

/// Body of `GET /menu`.
///
/// Some backends answer with a bare array instead of `{ "items": [...] }`;
/// both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MenuResponse {
    Wrapped {
        #[serde(default)]
        items: Vec<MenuItem>,
    },
    Bare(Vec<MenuItem>),
}

impl MenuResponse {
    pub fn into_items(self) -> Vec<MenuItem> {
        match self {
            MenuResponse::Wrapped { items } => items,
            MenuResponse::Bare(items) => items,
        }
    }
}
