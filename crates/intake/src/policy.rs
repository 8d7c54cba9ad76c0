//! Deterministic dialogue policy.
//!
//! Decides what a turn does (ask one field, review, answer) and drafts a
//! templated message for it. The dialogue engine may reword the draft later,
//! but every rule about dates, eligibility, the ask order and the fee lives
//! here.

use chrono::NaiveDate;
use sg_domain::record::IntakeRecord;

use crate::merge::merge;
use crate::patch::RecordPatch;
use crate::schema::{missing, pick_next, question_for, Field};
use crate::tools::{
    check_collectible, estimate_fee, find_date_phrase, format_date_ja, next_collectible_day,
    rag_search, universal_ng_reason, FeeQuote,
};

/// Wording that asks whether a pickup can happen at all.
const FEASIBILITY_MARKERS: [&str; 11] = [
    "回収でき",
    "回収可能",
    "回収して",
    "収集でき",
    "収集可能",
    "出せ",
    "出して",
    "来てもらえ",
    "来てくれ",
    "取りに来",
    "引き取",
];

const QUESTION_ENDINGS: [&str; 5] = ["ですか", "ますか", "でしょうか", "教えて", "知りたい"];

const ACKNOWLEDGEMENT: &str = "内容を理解しました。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Ask,
    Review,
    Answer,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Ask => "ask",
            DecisionKind::Review => "review",
            DecisionKind::Answer => "answer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Some(DecisionKind::Ask),
            "review" => Some(DecisionKind::Review),
            "answer" => Some(DecisionKind::Answer),
            _ => None,
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    PendingDateRejected,
    UniversalNgAnswered,
    AddressNeeded,
    FeasibilityChecked,
    DateToConfirm,
    Ineligible,
    Informational,
    MissingField,
    Complete,
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub kind: DecisionKind,
    pub rule: Rule,
    /// Templated wording, used as-is when phrasing is off or fails.
    pub message: String,
    pub record: IntakeRecord,
    pub missing: Vec<Field>,
    pub next_field: Option<Field>,
    pub fee: Option<FeeQuote>,
    /// A date the resident has to confirm before it is adopted.
    pub pending_date: Option<String>,
}

/// Inputs for one turn after extraction.
pub struct TurnContext<'a> {
    pub utterance: &'a str,
    pub today: NaiveDate,
    /// The record before this turn's patch.
    pub base: &'a IntakeRecord,
    pub patch: &'a RecordPatch,
}

pub fn decide(ctx: &TurnContext<'_>) -> Decision {
    let phrase = find_date_phrase(ctx.utterance, ctx.today);
    let feasibility = is_feasibility_question(ctx.utterance);

    let mut patch = ctx.patch.clone();
    // A relative phrase is confirmed before it lands in the record, whatever
    // the extractor made of it.
    if phrase.is_some_and(|p| p.relative) {
        patch.preferred_date = None;
    }

    // Universal NG days are answered without waiting for the address.
    if feasibility {
        if let Some(p) = phrase {
            if let Some(reason) = universal_ng_reason(p.date) {
                patch.preferred_date = None;
                let record = merge(ctx.base, &patch);
                let message = ng_with_alternative(p.date, reason);
                return answer(Rule::UniversalNgAnswered, message, record);
            }
        }
    }

    let mut record = merge(ctx.base, &patch);

    if feasibility {
        if !Field::Address.is_set(&record) {
            let mut d = ask(Rule::AddressNeeded, record, Field::Address);
            d.message = format!(
                "回収できるかどうかはご住所によって異なります。先に **{}** を教えてください。\n例）{}",
                Field::Address.label(),
                Field::Address.example()
            );
            return d;
        }
        let asked = phrase
            .map(|p| p.date)
            .or_else(|| record.preferred_date.as_deref().and_then(parse_iso));
        if let Some(date) = asked {
            let iso = iso(date);
            let address = record.address.clone().unwrap_or_default();
            let result = check_collectible(&iso, &address);
            // A relative phrase still goes through date confirmation.
            if phrase.is_some_and(|p| p.relative) {
                let mut d = confirm_date(Rule::FeasibilityChecked, record, date, result.reason());
                if result.is_ok() {
                    d.message = format!("{}は回収可能です。\n{}", format_date_ja(date), d.message);
                }
                return d;
            }
            return match result.reason() {
                None => {
                    let mut message = format!("{}は回収可能です。", format_date_ja(date));
                    let mut pending = None;
                    if record.preferred_date.as_deref() != Some(iso.as_str()) {
                        message.push_str("この日でお申し込みを進めてよろしいですか？（はい／いいえ）");
                        pending = Some(iso);
                    }
                    let mut d = answer(Rule::FeasibilityChecked, message, record);
                    d.pending_date = pending;
                    d
                }
                Some(reason) => {
                    if record.preferred_date.as_deref() == Some(iso.as_str()) {
                        record.preferred_date = None;
                    }
                    let message = ng_with_alternative(date, reason);
                    answer(Rule::FeasibilityChecked, message, record)
                }
            };
        }
    }

    if let Some(p) = phrase.filter(|p| p.relative) {
        let iso_date = iso(p.date);
        if record.preferred_date.as_deref() != Some(iso_date.as_str()) {
            return confirm_date(Rule::DateToConfirm, record, p.date, None);
        }
    }

    if let (Some(address), Some(date)) = (record.address.clone(), record.preferred_date.clone()) {
        let result = check_collectible(&date, &address);
        if let Some(reason) = result.reason() {
            record.preferred_date = None;
            let ng_date = parse_iso(&date);
            return match ng_date {
                Some(d) => confirm_date(Rule::Ineligible, record, d, Some(reason)),
                None => {
                    let mut d = ask(Rule::Ineligible, record, Field::PreferredDate);
                    d.message = format!("{reason}。\n{}", question_for(Field::PreferredDate));
                    d
                }
            };
        }
    }

    if is_question(ctx.utterance) && record == *ctx.base {
        let mut message = rag_search(ctx.utterance);
        let miss = missing(&record);
        let next = pick_next(&miss);
        if let Some(f) = next {
            message.push_str("\n\n");
            message.push_str(&question_for(f));
        }
        let mut d = answer(Rule::Informational, message, record);
        d.missing = miss;
        d.next_field = next;
        return d;
    }

    next_step(record)
}

/// Ask for the highest-priority missing field, or review when none is left.
pub fn next_step(record: IntakeRecord) -> Decision {
    let miss = missing(&record);
    match pick_next(&miss) {
        Some(field) => ask(Rule::MissingField, record, field),
        None => review(record),
    }
}

/// The resident turned down a proposed date.
pub fn reask_date(record: IntakeRecord) -> Decision {
    let mut d = ask(Rule::PendingDateRejected, record, Field::PreferredDate);
    d.message = format!(
        "承知しました。ご希望の日付を改めて教えてください。\n{}",
        question_for(Field::PreferredDate)
    );
    d
}

pub fn review(record: IntakeRecord) -> Decision {
    let fee = fee_for(&record);
    let message = review_text(&record, fee.as_ref());
    Decision {
        kind: DecisionKind::Review,
        rule: Rule::Complete,
        message,
        missing: missing(&record),
        next_field: None,
        fee,
        pending_date: None,
        record,
    }
}

/// Fee quote, whenever item and quantity are both known.
pub fn fee_for(record: &IntakeRecord) -> Option<FeeQuote> {
    let item = record.item_description.as_deref()?;
    let qty = record.quantity?;
    Some(estimate_fee(item, qty as i64, record.notes.as_deref().unwrap_or("")))
}

/// Whether `message` states the quote's subtotal (`2400円` or `2,400円`).
pub fn mentions_subtotal(message: &str, fee: &FeeQuote) -> bool {
    message.contains(&format!("{}円", fee.subtotal)) || message.contains(&yen(fee.subtotal))
}

pub fn review_text(record: &IntakeRecord, fee: Option<&FeeQuote>) -> String {
    let v = |s: &Option<String>| s.clone().unwrap_or_default();
    let date = record
        .preferred_date
        .as_deref()
        .and_then(parse_iso)
        .map(format_date_ja)
        .unwrap_or_default();
    let slot = record.time_slot.map(|t| t.label()).unwrap_or_default();
    let qty = record.quantity.unwrap_or(0);

    let mut lines = vec![
        "以下の内容でお申し込みを承ります。内容をご確認ください。".to_string(),
        format!("・お名前：{}", v(&record.name)),
        format!("・ご住所：{}", v(&record.address)),
        format!("・お電話番号：{}", v(&record.phone)),
        format!("・回収物：{} × {}点", v(&record.item_description), qty),
        format!("・希望日：{date}（{slot}）"),
        format!("・回収場所：{}", v(&record.pickup_location)),
    ];
    if let Some(notes) = record.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("・備考：{notes}"));
    }
    if let Some(fee) = fee {
        lines.push(format!(
            "・概算料金：{} × {}点 = {}",
            yen(fee.unit_price),
            qty.max(1),
            yen(fee.subtotal)
        ));
        if !fee.notes.is_empty() {
            lines.push(format!("　※{}", fee.notes));
        }
    }
    lines.push("よろしければ『はい』、修正がある場合は『いいえ』とお答えください。".to_string());
    lines.join("\n")
}

/// Fallback wording when the engine returned nothing usable.
pub fn fallback_message(record: &IntakeRecord) -> String {
    match pick_next(&missing(record)) {
        Some(f) => question_for(f),
        None => ACKNOWLEDGEMENT.to_string(),
    }
}

pub fn is_question(text: &str) -> bool {
    let t = text.trim();
    t.ends_with('?') || t.ends_with('？') || QUESTION_ENDINGS.iter().any(|e| t.contains(e))
}

pub fn is_feasibility_question(text: &str) -> bool {
    is_question(text) && FEASIBILITY_MARKERS.iter().any(|m| text.contains(m))
}

// ── builders ───────────────────────────────────────────────────────

fn ask(rule: Rule, record: IntakeRecord, field: Field) -> Decision {
    Decision {
        kind: DecisionKind::Ask,
        rule,
        message: question_for(field),
        missing: missing(&record),
        next_field: Some(field),
        fee: None,
        pending_date: None,
        record,
    }
}

fn answer(rule: Rule, message: String, record: IntakeRecord) -> Decision {
    Decision {
        kind: DecisionKind::Answer,
        rule,
        message,
        missing: missing(&record),
        next_field: None,
        fee: None,
        pending_date: None,
        record,
    }
}

/// Ask the resident to confirm `date`, or the next collectible day when
/// `date` cannot be served.
fn confirm_date(rule: Rule, record: IntakeRecord, date: NaiveDate, ng: Option<&str>) -> Decision {
    let ng = ng.map(str::to_string).or_else(|| universal_ng_reason(date).map(str::to_string));
    let mut d = ask(rule, record, Field::PreferredDate);
    match ng {
        None => {
            d.message = format!(
                "希望日は **{}** でよろしいですか？\nよろしければ『はい』、違う場合は正しい日付をお知らせください。",
                format_date_ja(date)
            );
            d.pending_date = Some(iso(date));
        }
        Some(reason) => match next_collectible_day(date) {
            Some(alt) => {
                d.message = format!(
                    "申し訳ありません、{}は回収できません（{reason}）。\n代わりに **{}** はいかがでしょうか？よろしければ『はい』、別の日をご希望の場合は日付をお知らせください。",
                    format_date_ja(date),
                    format_date_ja(alt)
                );
                d.pending_date = Some(iso(alt));
            }
            None => {
                d.message = format!("{reason}。\n{}", question_for(Field::PreferredDate));
            }
        },
    }
    d
}

fn ng_with_alternative(date: NaiveDate, reason: &str) -> String {
    let mut message = format!(
        "申し訳ありません、{}は回収できません（{reason}）。",
        format_date_ja(date)
    );
    if let Some(alt) = next_collectible_day(date) {
        message.push_str(&format!("近い回収可能日は {} です。", format_date_ja(alt)));
    }
    message
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `2400` → `2,400円`
fn yen(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push('円');
    out
}
