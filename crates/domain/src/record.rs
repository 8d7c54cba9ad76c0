use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
}

impl TimeSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
        }
    }

    /// Label shown to residents.
    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "午前",
            TimeSlot::Afternoon => "午後",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        match t.to_ascii_lowercase().as_str() {
            "morning" | "am" | "a.m." => return Ok(TimeSlot::Morning),
            "afternoon" | "pm" | "p.m." => return Ok(TimeSlot::Afternoon),
            _ => {}
        }
        match t {
            "午前" | "午前中" | "朝" => Ok(TimeSlot::Morning),
            "午後" | "昼過ぎ" => Ok(TimeSlot::Afternoon),
            other => Err(format!("unknown time slot '{other}'")),
        }
    }
}

/// The partially filled pickup application carried by one thread.
///
/// Every field starts unset. Normalization rules live with the merge step in
/// `sg-intake`; this type only holds values that already passed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub name: Option<String>,
    pub address: Option<String>,
    /// Digits only.
    pub phone: Option<String>,
    pub item_description: Option<String>,
    /// Always >= 1 when set.
    pub quantity: Option<u32>,
    /// Strict `YYYY-MM-DD`.
    pub preferred_date: Option<String>,
    pub time_slot: Option<TimeSlot>,
    pub pickup_location: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_slot_accepts_japanese_and_ampm() {
        assert_eq!("午前".parse::<TimeSlot>(), Ok(TimeSlot::Morning));
        assert_eq!("午後".parse::<TimeSlot>(), Ok(TimeSlot::Afternoon));
        assert_eq!("AM".parse::<TimeSlot>(), Ok(TimeSlot::Morning));
        assert_eq!(" pm ".parse::<TimeSlot>(), Ok(TimeSlot::Afternoon));
        assert_eq!("afternoon".parse::<TimeSlot>(), Ok(TimeSlot::Afternoon));
        assert!("夕方".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn record_serializes_time_slot_in_english() {
        let record = IntakeRecord {
            time_slot: Some(TimeSlot::Morning),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["time_slot"], "morning");
        assert!(json["name"].is_null());
    }
}
