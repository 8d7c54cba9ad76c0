//! Field-level merge of an incoming patch into the working record.
//!
//! A non-blank, well-formed incoming value overwrites; everything else keeps
//! the base. A malformed value never clears a field that is already set. The
//! one exception is `preferred_date`: a non-ISO date resets the field so a
//! later turn can resolve it again.

use chrono::NaiveDate;
use sg_domain::record::{IntakeRecord, TimeSlot};

use crate::patch::{blank, RecordPatch};

pub fn merge(base: &IntakeRecord, incoming: &RecordPatch) -> IntakeRecord {
    fn pick(base: &Option<String>, new: &Option<String>) -> Option<String> {
        if blank(new) {
            base.clone()
        } else {
            new.clone()
        }
    }

    let mut out = IntakeRecord {
        name: pick(&base.name, &incoming.name),
        address: pick(&base.address, &incoming.address),
        phone: incoming
            .phone
            .as_deref()
            .and_then(normalize_phone)
            .or_else(|| base.phone.as_deref().and_then(normalize_phone)),
        item_description: pick(&base.item_description, &incoming.item_description),
        quantity: incoming
            .quantity
            .as_deref()
            .and_then(normalize_quantity)
            .or(base.quantity),
        preferred_date: pick(&base.preferred_date, &incoming.preferred_date),
        time_slot: incoming
            .time_slot
            .as_deref()
            .and_then(|s| s.parse::<TimeSlot>().ok())
            .or(base.time_slot),
        pickup_location: pick(&base.pickup_location, &incoming.pickup_location),
        notes: pick(&base.notes, &incoming.notes),
    };

    out.name = trimmed(out.name);
    out.address = trimmed(out.address);
    out.item_description = trimmed(out.item_description);
    out.pickup_location = trimmed(out.pickup_location);
    out.notes = trimmed(out.notes);
    out.preferred_date = out.preferred_date.as_deref().and_then(normalize_date);
    out
}

/// Keep digits only (ASCII or full-width); nothing left means unset.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = to_half_width(raw)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    (!digits.is_empty()).then_some(digits)
}

/// `"2"`, `"2.0"` and full-width `"２"` all read as 2. Values below 1 or
/// with a fractional part are unset.
pub fn normalize_quantity(raw: &str) -> Option<u32> {
    let s = to_half_width(raw.trim());
    if let Ok(n) = s.parse::<u32>() {
        return (n >= 1).then_some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= 1.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// Strict `YYYY-MM-DD` naming a real calendar day.
pub fn normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    let b = s.as_bytes();
    let shape_ok = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Fold full-width digits and the common full-width separators to ASCII.
pub fn to_half_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '／' => '/',
            '－' => '-',
            '．' => '.',
            _ => c,
        })
        .collect()
}

fn trimmed(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(json: serde_json::Value) -> RecordPatch {
        serde_json::from_value(json).unwrap()
    }

    fn filled() -> IntakeRecord {
        IntakeRecord {
            name: Some("ヤマダ タロウ".into()),
            address: Some("大阪市北区中之島1-1-1".into()),
            phone: Some("09012345678".into()),
            item_description: Some("ソファ".into()),
            quantity: Some(2),
            preferred_date: Some("2025-08-29".into()),
            time_slot: Some(TimeSlot::Morning),
            pickup_location: Some("自宅前".into()),
            notes: None,
        }
    }

    #[test]
    fn empty_patch_is_identity() {
        let base = filled();
        assert_eq!(merge(&base, &RecordPatch::default()), base);
        assert_eq!(merge(&IntakeRecord::default(), &RecordPatch::default()), IntakeRecord::default());
    }

    #[test]
    fn merge_is_idempotent() {
        let incoming = patch(serde_json::json!({
            "phone": "090-1234-5678",
            "quantity": "3",
            "preferred_date": "2025/08/30",
            "time_slot": "午後",
            "pickup_location": "  集合所  "
        }));
        let once = merge(&filled(), &incoming);
        assert_eq!(merge(&once, &incoming), once);
    }

    #[test]
    fn blank_values_never_clobber() {
        let incoming = patch(serde_json::json!({"name": "", "address": "   ", "phone": null}));
        let merged = merge(&filled(), &incoming);
        assert_eq!(merged.name.as_deref(), Some("ヤマダ タロウ"));
        assert_eq!(merged.address.as_deref(), Some("大阪市北区中之島1-1-1"));
        assert_eq!(merged.phone.as_deref(), Some("09012345678"));
    }

    #[test]
    fn phone_keeps_digits_only() {
        let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"phone": "090-1234-5678"})));
        assert_eq!(merged.phone.as_deref(), Some("09012345678"));
        let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"phone": "不明"})));
        assert!(merged.phone.is_none());
    }

    #[test]
    fn quantity_coercion() {
        for (raw, want) in [
            (serde_json::json!("2"), Some(2)),
            (serde_json::json!(2), Some(2)),
            (serde_json::json!(2.0), Some(2)),
            (serde_json::json!("２"), Some(2)),
            (serde_json::json!(0), None),
            (serde_json::json!(-1), None),
            (serde_json::json!(1.5), None),
            (serde_json::json!("たくさん"), None),
        ] {
            let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"quantity": raw})));
            assert_eq!(merged.quantity, want, "input {raw}");
        }
    }

    #[test]
    fn non_iso_date_degrades_to_unset() {
        let merged = merge(&filled(), &patch(serde_json::json!({"preferred_date": "2025/08/30"})));
        assert!(merged.preferred_date.is_none());
        let merged = merge(&filled(), &patch(serde_json::json!({"preferred_date": "2025-02-30"})));
        assert!(merged.preferred_date.is_none());
        let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"preferred_date": "2025-08-30"})));
        assert_eq!(merged.preferred_date.as_deref(), Some("2025-08-30"));
    }

    #[test]
    fn time_slot_maps_onto_enum() {
        let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"time_slot": "午前"})));
        assert_eq!(merged.time_slot, Some(TimeSlot::Morning));
        let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"time_slot": "PM"})));
        assert_eq!(merged.time_slot, Some(TimeSlot::Afternoon));
        let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"time_slot": "夕方"})));
        assert!(merged.time_slot.is_none());
    }

    #[test]
    fn malformed_values_keep_what_is_already_set() {
        let incoming = patch(serde_json::json!({
            "time_slot": "夕方",
            "phone": "不明",
            "quantity": "たくさん",
        }));
        let merged = merge(&filled(), &incoming);
        assert_eq!(merged.time_slot, Some(TimeSlot::Morning));
        assert_eq!(merged.phone.as_deref(), Some("09012345678"));
        assert_eq!(merged.quantity, Some(2));
        assert_eq!(merge(&merged, &incoming), merged);
    }

    #[test]
    fn text_fields_are_trimmed() {
        let merged = merge(&IntakeRecord::default(), &patch(serde_json::json!({"name": "  ヤマダ  ", "item_description": "ソファ\n"})));
        assert_eq!(merged.name.as_deref(), Some("ヤマダ"));
        assert_eq!(merged.item_description.as_deref(), Some("ソファ"));
    }
}
