//! Encoding of the persisted cart snapshot.
//!
//! Restoring is all-or-nothing: anything that is not a JSON array of objects
//! carrying a string `id` and a numeric `qty` yields an empty cart.

use serde_json::Value;
use tracing::{debug, warn};

use crate::model::CartLine;

/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "sc_cart";

pub fn encode(lines: &[CartLine]) -> Result<String, serde_json::Error> {
    serde_json::to_string(lines)
}

/// Decodes a stored snapshot, falling back to an empty cart.
pub fn decode(raw: &str) -> Vec<CartLine> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Stored cart is not valid JSON");
            return Vec::new();
        }
    };
    let Value::Array(entries) = value else {
        warn!("Stored cart is not an array");
        return Vec::new();
    };

    let mut lines: Vec<CartLine> = Vec::with_capacity(entries.len());
    for entry in &entries {
        let Some(line) = decode_line(entry) else {
            warn!(?entry, "Stored cart entry is invalid, discarding snapshot");
            return Vec::new();
        };
        if line.qty == 0 {
            continue;
        }
        match lines.iter_mut().find(|l| l.id == line.id) {
            Some(existing) => existing.qty = existing.qty.saturating_add(line.qty),
            None => lines.push(line),
        }
    }
    debug!(lines = lines.len(), "Decoded cart snapshot");
    lines
}

fn decode_line(entry: &Value) -> Option<CartLine> {
    let id = entry.get("id")?.as_str()?.to_string();
    let qty = entry.get("qty")?.as_f64()?;
    if !qty.is_finite() || qty < 0.0 {
        return None;
    }
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let price = entry
        .get("price")
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite() && *p >= 0.0)
        .map_or(0, |p| p.round() as u64);
    let available = entry
        .get("available")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    Some(CartLine {
        id,
        name,
        price,
        qty: qty.min(f64::from(u32::MAX)).floor() as u32,
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restores_encoded_lines() {
        let lines = vec![CartLine {
            id: "1".into(),
            name: "Chicken Burger".into(),
            price: 120,
            qty: 2,
            available: true,
        }];
        let raw = encode(&lines).unwrap();
        assert_eq!(decode(&raw), lines);
    }

    #[test]
    fn test_malformed_and_non_array_are_empty() {
        assert!(decode("not json").is_empty());
        assert!(decode(r#"{"id":"1","qty":1}"#).is_empty());
        assert!(decode("null").is_empty());
    }

    #[test]
    fn test_one_bad_entry_discards_everything() {
        let raw = r#"[{"id":"1","qty":1,"price":10},{"id":2,"qty":1}]"#;
        assert!(decode(raw).is_empty());

        let raw = r#"[{"id":"1","qty":"3"}]"#;
        assert!(decode(raw).is_empty());
    }

    #[test]
    fn test_lenient_fields_and_invariants() {
        let raw = r#"[
            {"id":"1","qty":2},
            {"id":"2","qty":0,"price":5},
            {"id":"1","qty":1,"price":99}
        ]"#;
        let lines = decode(raw);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, "1");
        assert_eq!(lines[0].qty, 3);
        assert_eq!(lines[0].price, 0);
        assert!(lines[0].available);
    }
}
