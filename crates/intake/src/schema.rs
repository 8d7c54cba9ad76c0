//! Record fields, their ask order and the one-field question templates.

use serde::{Deserialize, Serialize};
use sg_domain::record::IntakeRecord;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Address,
    Phone,
    ItemDescription,
    Quantity,
    PreferredDate,
    TimeSlot,
    PickupLocation,
    Notes,
}

/// Everything a booking needs. `notes` is never required.
pub const REQUIRED_FIELDS: [Field; 8] = [
    Field::Name,
    Field::Address,
    Field::Phone,
    Field::ItemDescription,
    Field::Quantity,
    Field::PreferredDate,
    Field::TimeSlot,
    Field::PickupLocation,
];

/// Ask order, highest first.
pub const PRIORITY: [Field; 9] = [
    Field::Name,
    Field::Address,
    Field::Phone,
    Field::ItemDescription,
    Field::Quantity,
    Field::PreferredDate,
    Field::TimeSlot,
    Field::PickupLocation,
    Field::Notes,
];

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Address => "address",
            Field::Phone => "phone",
            Field::ItemDescription => "item_description",
            Field::Quantity => "quantity",
            Field::PreferredDate => "preferred_date",
            Field::TimeSlot => "time_slot",
            Field::PickupLocation => "pickup_location",
            Field::Notes => "notes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "お名前（フルネーム・カタカナ）",
            Field::Address => "ご住所（市区町村〜番地）",
            Field::Phone => "お電話番号（数字のみ）",
            Field::ItemDescription => "回収物の品目",
            Field::Quantity => "個数（半角数字）",
            Field::PreferredDate => "希望日（YYYY-MM-DD もしくは『来週火曜』でも可）",
            Field::TimeSlot => "時間帯（午前/午後）",
            Field::PickupLocation => "回収場所（自宅前/集合所 など）",
            Field::Notes => "備考",
        }
    }

    pub fn example(&self) -> &'static str {
        match self {
            Field::Name => "アイウエオ タロウ",
            Field::Address => "大阪市北区中之島1-1-1",
            Field::Phone => "09012345678",
            Field::ItemDescription => "ソファ",
            Field::Quantity => "1",
            Field::PreferredDate => "2025-08-22",
            Field::TimeSlot => "午前",
            Field::PickupLocation => "自宅前",
            Field::Notes => "",
        }
    }

    /// Whether `record` holds a non-empty value for this field.
    pub fn is_set(&self, record: &IntakeRecord) -> bool {
        fn filled(v: &Option<String>) -> bool {
            v.as_deref().is_some_and(|s| !s.trim().is_empty())
        }
        match self {
            Field::Name => filled(&record.name),
            Field::Address => filled(&record.address),
            Field::Phone => filled(&record.phone),
            Field::ItemDescription => filled(&record.item_description),
            Field::Quantity => record.quantity.is_some(),
            Field::PreferredDate => filled(&record.preferred_date),
            Field::TimeSlot => record.time_slot.is_some(),
            Field::PickupLocation => filled(&record.pickup_location),
            Field::Notes => filled(&record.notes),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required fields still unset, in [`PRIORITY`] order.
pub fn missing(record: &IntakeRecord) -> Vec<Field> {
    PRIORITY
        .iter()
        .filter(|f| REQUIRED_FIELDS.contains(f) && !f.is_set(record))
        .copied()
        .collect()
}

/// The highest-priority field in `missing`; the first element when none of
/// them is ranked; `None` on empty input.
pub fn pick_next(missing: &[Field]) -> Option<Field> {
    PRIORITY
        .iter()
        .find(|f| missing.contains(f))
        .copied()
        .or_else(|| missing.first().copied())
}

/// The polite one-field question used whenever the dialogue engine's wording
/// is unavailable or unusable.
pub fn question_for(field: Field) -> String {
    let mut msg = format!("ありがとうございます。次に **{}** を教えてください。", field.label());
    let ex = field.example();
    if !ex.is_empty() {
        msg.push_str(&format!("\n例）{ex}"));
    }
    if field == Field::PreferredDate {
        msg.push_str("\n※『来週金曜』などの表現でも大丈夫です。こちらで日付に直します。");
    }
    msg
}
