//! The yes/no sub-dialogue that follows every review.
//!
//! Runs before extraction: while a thread awaits confirmation the engine is
//! never consulted.

use sg_domain::record::IntakeRecord;
use sg_sessions::ConfirmationState;

use crate::tools::{reserve, BookingConfirmation};

const AFFIRM: [&str; 10] = [
    "はい", "OK", "オーケー", "承認", "問題ない", "大丈夫", "了解", "お願いします", "実行", "yes",
];
const NEGATE: [&str; 9] = [
    "いいえ", "NO", "だめ", "修正", "変更", "やめる", "保留", "キャンセル", "cancel",
];

pub const CORRECTION_PROMPT: &str =
    "どの項目を修正しますか？ 例：「希望日を2025-08-19に」「回収場所は集合所に」";
pub const YES_NO_REPROMPT: &str = "すみません、『はい』または『いいえ』でご回答ください。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReply {
    Affirm,
    Negate,
    Unclear,
}

impl ConfirmationReply {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationReply::Affirm => "affirm",
            ConfirmationReply::Negate => "negate",
            ConfirmationReply::Unclear => "unclear",
        }
    }
}

/// Whole-reply match, trimmed and case-insensitive. `はい、午前で` is unclear.
pub fn parse_confirmation(text: &str) -> ConfirmationReply {
    let t = text.trim().to_lowercase();
    if AFFIRM.iter().any(|w| w.to_lowercase() == t) {
        return ConfirmationReply::Affirm;
    }
    if NEGATE.iter().any(|w| w.to_lowercase() == t) {
        return ConfirmationReply::Negate;
    }
    ConfirmationReply::Unclear
}

/// What the thread looks like after answering a review.
#[derive(Debug, Clone)]
pub struct ConfirmationOutcome {
    pub reply: ConfirmationReply,
    pub message: String,
    pub next_state: ConfirmationState,
    pub booking: Option<BookingConfirmation>,
}

pub fn handle_confirmation(review_text: &str, record: &IntakeRecord, text: &str) -> ConfirmationOutcome {
    let reply = parse_confirmation(text);
    match reply {
        ConfirmationReply::Affirm => {
            let booking = reserve(record);
            ConfirmationOutcome {
                reply,
                message: booking.message(),
                next_state: ConfirmationState::Idle,
                booking: Some(booking),
            }
        }
        ConfirmationReply::Negate => ConfirmationOutcome {
            reply,
            message: CORRECTION_PROMPT.to_string(),
            next_state: ConfirmationState::Idle,
            booking: None,
        },
        ConfirmationReply::Unclear => ConfirmationOutcome {
            reply,
            message: format!("{review_text}\n{YES_NO_REPROMPT}"),
            next_state: ConfirmationState::AwaitingConfirmation {
                review_text: review_text.to_string(),
            },
            booking: None,
        },
    }
}
