//! Fee table.

use serde::{Deserialize, Serialize};

/// Unit fee for anything not in the table.
pub const DEFAULT_UNIT_PRICE: u32 = 500;

const PRICE_TABLE: [(&str, u32); 4] = [
    ("ソファ", 1200),
    ("マットレス", 800),
    ("机", 700),
    ("椅子", 300),
];

const OVERSIZE_HINTS: [&str; 5] = ["2m", "200cm", "大型", "特大", "超え"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub unit_price: u32,
    pub subtotal: u32,
    #[serde(default)]
    pub notes: String,
}

/// Rough fee for `quantity` pieces of `item`.
///
/// Exact table names win; otherwise the first table entry contained in the
/// description (`2人掛けソファ` is a sofa). Quantity is clamped to at least 1.
pub fn estimate_fee(item: &str, quantity: i64, size_hint: &str) -> FeeQuote {
    let item = item.trim();
    let unit_price = PRICE_TABLE
        .iter()
        .find(|(name, _)| *name == item)
        .or_else(|| PRICE_TABLE.iter().find(|(name, _)| item.contains(name)))
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_UNIT_PRICE);
    let qty = quantity.clamp(1, u32::MAX as i64) as u32;

    let notes = if OVERSIZE_HINTS.iter().any(|h| size_hint.contains(h)) {
        "最大辺が2mを超えるものは個別相談となり、料金が変わる場合があります。".to_string()
    } else {
        String::new()
    };

    FeeQuote {
        unit_price,
        subtotal: unit_price.saturating_mul(qty),
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_prices() {
        let q = estimate_fee("ソファ", 2, "");
        assert_eq!((q.unit_price, q.subtotal), (1200, 2400));
        assert!(q.notes.is_empty());
        assert_eq!(estimate_fee("椅子", 4, "").subtotal, 1200);
    }

    #[test]
    fn unknown_item_and_zero_quantity() {
        let q = estimate_fee("unknown_item", 0, "");
        assert_eq!((q.unit_price, q.subtotal), (500, 500));
        assert_eq!(estimate_fee("テーブル", -3, "").subtotal, 500);
    }

    #[test]
    fn contained_names_match() {
        assert_eq!(estimate_fee("3人掛けソファ", 1, "").unit_price, 1200);
        assert_eq!(estimate_fee("学習机", 1, "").unit_price, 700);
    }

    #[test]
    fn oversize_hint_adds_note() {
        let q = estimate_fee("ソファ", 1, "幅2m以上");
        assert!(q.notes.contains("個別相談"));
        assert_eq!(q.subtotal, 1200);
    }
}
