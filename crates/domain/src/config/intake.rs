use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intake dialogue
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// IANA timezone used for "today" and relative date phrases.
    #[serde(default = "d_timezone")]
    pub timezone: String,
    /// Additional extraction attempts after a malformed reply.
    #[serde(default = "d_2")]
    pub extraction_retries: u32,
    #[serde(default)]
    pub extractor_temperature: f32,
    #[serde(default = "d_dialogue_temperature")]
    pub dialogue_temperature: f32,
    /// When false the dialogue engine is never called and every message
    /// comes from the built-in templates.
    #[serde(default = "d_true")]
    pub phrasing: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            timezone: d_timezone(),
            extraction_retries: 2,
            extractor_temperature: 0.0,
            dialogue_temperature: d_dialogue_temperature(),
            phrasing: true,
        }
    }
}

fn d_timezone() -> String {
    "Asia/Tokyo".into()
}
fn d_2() -> u32 {
    2
}
fn d_dialogue_temperature() -> f32 {
    0.2
}
fn d_true() -> bool {
    true
}
