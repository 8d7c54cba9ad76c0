//! Reservation issuing.

use serde::{Deserialize, Serialize};
use sg_domain::record::{IntakeRecord, TimeSlot};

/// Issued once per affirmative confirmation. Never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub confirmation_id: String,
    pub date: Option<String>,
    pub time_slot: Option<TimeSlot>,
    pub address: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<u32>,
    pub pickup_location: Option<String>,
    pub contact: Option<String>,
    pub applicant: Option<String>,
}

/// Reserve a pickup for `record`. The id is `G` followed by 8 uppercase hex
/// digits.
pub fn reserve(record: &IntakeRecord) -> BookingConfirmation {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    BookingConfirmation {
        confirmation_id: format!("G{}", hex[..8].to_uppercase()),
        date: record.preferred_date.clone(),
        time_slot: record.time_slot,
        address: record.address.clone(),
        item: record.item_description.clone(),
        quantity: record.quantity,
        pickup_location: record.pickup_location.clone(),
        contact: record.phone.clone(),
        applicant: record.name.clone(),
    }
}

impl BookingConfirmation {
    /// The completion notice shown to the resident.
    pub fn message(&self) -> String {
        let s = |v: &Option<String>| v.clone().unwrap_or_default();
        format!(
            "【✅ 予約完了】\n  受付番号：{}\n  回収日　：{}（{}）\n  回収物　：{} × {}点\n  回収場所：{}（{}）\n  申込者　：{}（連絡先：{}）\n",
            self.confirmation_id,
            s(&self.date),
            self.time_slot.map(|t| t.label()).unwrap_or_default(),
            s(&self.item),
            self.quantity.map(|q| q.to_string()).unwrap_or_default(),
            s(&self.pickup_location),
            s(&self.address),
            s(&self.applicant),
            s(&self.contact),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_id_shape() {
        let b = reserve(&IntakeRecord::default());
        assert_eq!(b.confirmation_id.len(), 9);
        assert!(b.confirmation_id.starts_with('G'));
        assert!(b.confirmation_id[1..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn message_lists_the_booking() {
        let record = IntakeRecord {
            name: Some("ヤマダ タロウ".into()),
            address: Some("大阪市北区中之島1-1-1".into()),
            phone: Some("09012345678".into()),
            item_description: Some("ソファ".into()),
            quantity: Some(2),
            preferred_date: Some("2025-08-29".into()),
            time_slot: Some(TimeSlot::Morning),
            pickup_location: Some("自宅前".into()),
            notes: None,
        };
        let b = reserve(&record);
        let msg = b.message();
        assert!(msg.starts_with("【✅ 予約完了】"));
        assert!(msg.contains(&b.confirmation_id));
        assert!(msg.contains("回収日　：2025-08-29（午前）"));
        assert!(msg.contains("ソファ × 2点"));
        assert!(msg.contains("自宅前（大阪市北区中之島1-1-1）"));
        assert!(msg.contains("ヤマダ タロウ（連絡先：09012345678）"));
    }
}
