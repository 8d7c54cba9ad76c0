//! Rewording a policy decision through the `dialogue` role.
//!
//! The engine only gets to choose words. Its `kind` is never obeyed, and it
//! can fill record fields the resident has not given yet, but nothing more.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use sg_domain::capability::ModelRole;
use sg_domain::error::Result;
use sg_domain::message::Message;
use sg_domain::record::IntakeRecord;
use sg_providers::{ChatRequest, LlmRouter};

use crate::extraction::parse_json_object;
use crate::merge::merge;
use crate::patch::RecordPatch;
use crate::policy::{self, Decision, DecisionKind};
use crate::prompts;
use crate::response::ResponseKind;
use crate::schema::{missing, pick_next, question_for};

pub struct Phraser {
    router: Arc<LlmRouter>,
    temperature: f32,
}

impl Phraser {
    pub fn new(router: Arc<LlmRouter>, temperature: f32) -> Self {
        Self {
            router,
            temperature,
        }
    }

    /// Ask the engine to reword `decision`. Returns the raw reply.
    pub async fn phrase(&self, decision: &Decision, utterance: &str, today: NaiveDate) -> Result<String> {
        let context = json!({
            "today": today.format("%Y-%m-%d").to_string(),
            "utterance": utterance,
            "decision": {
                "kind": decision.kind.as_str(),
                "next_field": decision.next_field.map(|f| f.as_str()),
                "next_field_label": decision.next_field.map(|f| f.label()),
                "missing": decision.missing.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
                "draft": decision.message,
            },
            "fee_quote": decision.fee,
            "record": decision.record,
        });
        let req = ChatRequest::new(vec![
            Message::system(prompts::dialogue_system()),
            Message::user(context.to_string()),
        ])
        .with_temperature(self.temperature)
        .with_json_schema(prompts::reply_schema());

        let resp = self.router.chat_for_role(ModelRole::Dialogue, req).await?;
        Ok(resp.content)
    }
}

/// The engine's reply, read leniently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhrasedReply {
    /// `None` when the reply had no usable `kind`; read as `ask`.
    pub kind: Option<DecisionKind>,
    pub message: String,
    pub record: Option<RecordPatch>,
}

impl PhrasedReply {
    pub fn kind_or_ask(&self) -> DecisionKind {
        self.kind.unwrap_or(DecisionKind::Ask)
    }
}

/// Read the engine's reply. Output that is not JSON becomes the message
/// verbatim.
pub fn parse_reply(raw: &str) -> PhrasedReply {
    match parse_json_object(raw) {
        Some(obj) => PhrasedReply {
            kind: obj
                .get("kind")
                .and_then(|k| k.as_str())
                .and_then(DecisionKind::parse),
            message: obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.trim().to_string())
                .unwrap_or_default(),
            record: obj.get("record").and_then(RecordPatch::from_value),
        },
        None => PhrasedReply {
            kind: None,
            message: raw.trim().to_string(),
            record: None,
        },
    }
}

/// Turn a decision plus the engine's reply into the final response and record.
///
/// `date_pending` withholds `preferred_date` from the reply's record.
pub fn apply_reply(decision: Decision, reply: PhrasedReply, date_pending: bool) -> (ResponseKind, IntakeRecord) {
    if reply.kind_or_ask() != decision.kind {
        tracing::debug!(
            decided = decision.kind.as_str(),
            phrased = reply.kind_or_ask().as_str(),
            "phrasing disagreed with decision kind, keeping decision"
        );
    }

    let record = match &reply.record {
        Some(patch) => fill_unset(&decision.record, patch, date_pending),
        None => decision.record.clone(),
    };

    match decision.kind {
        DecisionKind::Ask => {
            let asked_is_filled = decision.next_field.is_some_and(|f| f.is_set(&record));
            if record != decision.record && asked_is_filled {
                let miss = missing(&record);
                return match pick_next(&miss) {
                    Some(next) => (
                        ResponseKind::Ask {
                            message: question_for(next),
                            missing_fields: miss,
                            next_field: Some(next),
                        },
                        record,
                    ),
                    None => {
                        let review = policy::review(record);
                        let record = review.record.clone();
                        (to_response(review), record)
                    }
                };
            }
            let message = if reply.message.is_empty() {
                policy::fallback_message(&record)
            } else {
                reply.message
            };
            (
                ResponseKind::Ask {
                    message,
                    missing_fields: missing(&record),
                    next_field: decision.next_field,
                },
                record,
            )
        }
        DecisionKind::Review => {
            let mut message = if reply.message.is_empty() {
                decision.message.clone()
            } else {
                reply.message
            };
            if let Some(fee) = &decision.fee {
                if !policy::mentions_subtotal(&message, fee) {
                    message.push_str(&format!(
                        "\n概算料金：{}円 × {}点 = {}円",
                        fee.unit_price,
                        decision.record.quantity.unwrap_or(1).max(1),
                        fee.subtotal
                    ));
                }
            }
            (
                ResponseKind::Review {
                    message,
                    record: decision.record.clone(),
                    fee_quote: decision.fee,
                },
                decision.record,
            )
        }
        DecisionKind::Answer => {
            let message = if reply.message.is_empty() {
                decision.message.clone()
            } else {
                reply.message
            };
            (ResponseKind::Answer { message }, record)
        }
    }
}

/// The decision as-is, for when phrasing is off or failed.
pub fn to_response(decision: Decision) -> ResponseKind {
    match decision.kind {
        DecisionKind::Ask => ResponseKind::Ask {
            message: decision.message,
            missing_fields: decision.missing,
            next_field: decision.next_field,
        },
        DecisionKind::Review => ResponseKind::Review {
            message: decision.message,
            record: decision.record,
            fee_quote: decision.fee,
        },
        DecisionKind::Answer => ResponseKind::Answer {
            message: decision.message,
        },
    }
}

fn fill_unset(record: &IntakeRecord, patch: &RecordPatch, date_pending: bool) -> IntakeRecord {
    let current = RecordPatch::from(record);
    let keep = |have: &Option<String>, offered: &Option<String>| {
        if have.is_some() {
            None
        } else {
            offered.clone()
        }
    };
    let filtered = RecordPatch {
        name: keep(&current.name, &patch.name),
        address: keep(&current.address, &patch.address),
        phone: keep(&current.phone, &patch.phone),
        item_description: keep(&current.item_description, &patch.item_description),
        quantity: keep(&current.quantity, &patch.quantity),
        preferred_date: if date_pending {
            None
        } else {
            keep(&current.preferred_date, &patch.preferred_date)
        },
        time_slot: keep(&current.time_slot, &patch.time_slot),
        pickup_location: keep(&current.pickup_location, &patch.pickup_location),
        notes: keep(&current.notes, &patch.notes),
    };
    merge(record, &filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use sg_domain::record::TimeSlot;

    fn complete() -> IntakeRecord {
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
    fn reply_without_kind_reads_as_ask() {
        let r = parse_reply(r#"{"message": "お名前を教えてください。"}"#);
        assert_eq!(r.kind, None);
        assert_eq!(r.kind_or_ask(), DecisionKind::Ask);
        assert_eq!(r.message, "お名前を教えてください。");
    }

    #[test]
    fn non_json_becomes_message() {
        let r = parse_reply("  お電話番号を教えてください。 ");
        assert_eq!(r.message, "お電話番号を教えてください。");
        assert!(r.record.is_none());
    }

    #[test]
    fn empty_ask_falls_back_to_next_question() {
        let decision = policy::next_step(IntakeRecord::default());
        let (resp, _) = apply_reply(decision, parse_reply(r#"{"kind": "ask", "message": ""}"#), false);
        assert_eq!(resp.message(), question_for(Field::Name));
        assert_eq!(resp.next_field(), Some(Field::Name));
    }

    #[test]
    fn decision_kind_wins() {
        let decision = policy::next_step(IntakeRecord::default());
        let reply = parse_reply(r#"{"kind": "review", "message": "お名前をお願いします。"}"#);
        let (resp, _) = apply_reply(decision, reply, false);
        assert_eq!(resp.kind(), "ask");
        assert_eq!(resp.message(), "お名前をお願いします。");
    }

    #[test]
    fn reply_record_never_overwrites() {
        let record = IntakeRecord {
            name: Some("ヤマダ タロウ".into()),
            ..Default::default()
        };
        let decision = policy::next_step(record);
        let reply = parse_reply(
            r#"{"kind": "ask", "message": "ご住所は？", "record": {"name": "スズキ", "notes": "2階"}}"#,
        );
        let (_, record) = apply_reply(decision, reply, false);
        assert_eq!(record.name.as_deref(), Some("ヤマダ タロウ"));
        assert_eq!(record.notes.as_deref(), Some("2階"));
    }

    #[test]
    fn pending_date_is_withheld_from_reply_record() {
        let decision = policy::next_step(IntakeRecord::default());
        let reply = parse_reply(
            r#"{"kind": "ask", "message": "x", "record": {"preferred_date": "2025-08-29"}}"#,
        );
        let (_, record) = apply_reply(decision, reply, true);
        assert!(record.preferred_date.is_none());
    }

    #[test]
    fn filled_asked_field_switches_to_template() {
        let decision = policy::next_step(IntakeRecord::default());
        let reply = parse_reply(
            r#"{"kind": "ask", "message": "ご住所を教えてください", "record": {"name": "ヤマダ"}}"#,
        );
        let (resp, record) = apply_reply(decision, reply, false);
        assert_eq!(record.name.as_deref(), Some("ヤマダ"));
        assert_eq!(resp.next_field(), Some(Field::Address));
        assert_eq!(resp.message(), question_for(Field::Address));
    }

    #[test]
    fn review_gets_subtotal_appended() {
        let decision = policy::review(complete());
        let reply = parse_reply(r#"{"kind": "review", "message": "この内容でよろしいですか？"}"#);
        let (resp, _) = apply_reply(decision, reply, false);
        assert_eq!(resp.kind(), "review");
        assert!(resp.message().contains("2400円"));
        let ResponseKind::Review { fee_quote, .. } = resp else {
            panic!("expected review");
        };
        assert_eq!(fee_quote.unwrap().subtotal, 2400);
    }

    #[test]
    fn empty_answer_keeps_template() {
        let mut decision = policy::next_step(IntakeRecord::default());
        decision.kind = DecisionKind::Answer;
        decision.message = "回収可能です。".into();
        let (resp, _) = apply_reply(decision, PhrasedReply::default(), false);
        assert_eq!(resp.message(), "回収可能です。");
    }
}
