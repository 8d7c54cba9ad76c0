//! One intake turn, end to end.
//!
//! Order inside a turn: confirmation sub-dialogue, pending-date reply,
//! extraction, policy, phrasing, persistence. The caller serializes turns per
//! thread.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use sg_domain::capability::ModelRole;
use sg_domain::config::IntakeConfig;
use sg_domain::error::{Error, Result};
use sg_domain::message::Role;
use sg_domain::record::IntakeRecord;
use sg_domain::trace::TraceEvent;
use sg_providers::LlmRouter;
use sg_sessions::{ConfirmationState, SessionStore};

use crate::confirmation::{handle_confirmation, parse_confirmation, ConfirmationReply};
use crate::extraction::Extractor;
use crate::patch::RecordPatch;
use crate::phrasing::{apply_reply, parse_reply, to_response, Phraser};
use crate::policy::{self, Decision, TurnContext};
use crate::response::ResponseKind;
use crate::tools::{self, BookingConfirmation};

pub const EXTRACTION_APOLOGY: &str =
    "申し訳ありません。内容をうまく読み取れませんでした。お手数ですが、もう一度お知らせください。";

/// Everything a caller needs to render one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub thread_id: String,
    pub response: ResponseKind,
    pub record: IntakeRecord,
    pub pending_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingConfirmation>,
}

pub struct IntakeAgent {
    extractor: Extractor,
    phraser: Option<Phraser>,
    tz: Tz,
}

impl IntakeAgent {
    pub fn new(router: Arc<LlmRouter>, config: &IntakeConfig) -> Result<Self> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|_| Error::Config(format!("unknown timezone '{}'", config.timezone)))?;
        let phraser = if config.phrasing && router.has_role(ModelRole::Dialogue) {
            Some(Phraser::new(router.clone(), config.dialogue_temperature))
        } else {
            tracing::info!("dialogue phrasing disabled, using templated wording");
            None
        };
        Ok(Self {
            extractor: Extractor::new(router, config.extraction_retries, config.extractor_temperature),
            phraser,
            tz,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn today(&self) -> NaiveDate {
        tools::today(self.tz)
    }

    pub async fn run_turn(&self, store: &SessionStore, thread_id: &str, utterance: &str) -> Result<TurnOutcome> {
        self.run_turn_on(store, thread_id, utterance, self.today()).await
    }

    /// [`Self::run_turn`] with an explicit "today".
    pub async fn run_turn_on(
        &self,
        store: &SessionStore,
        thread_id: &str,
        utterance: &str,
        today: NaiveDate,
    ) -> Result<TurnOutcome> {
        let session = store
            .get(thread_id)
            .ok_or_else(|| Error::SessionNotFound(thread_id.to_owned()))?;
        store.append_message(thread_id, Role::User, utterance)?;

        if session.pending_confirmation() {
            let out = handle_confirmation(session.last_review_text(), &session.record, utterance);
            TraceEvent::ConfirmationReply {
                thread_id: thread_id.to_owned(),
                reply: out.reply.as_str().to_string(),
            }
            .emit();
            if let Some(b) = &out.booking {
                TraceEvent::BookingIssued {
                    thread_id: thread_id.to_owned(),
                    confirmation_id: b.confirmation_id.clone(),
                }
                .emit();
            }
            let awaiting = matches!(out.next_state, ConfirmationState::AwaitingConfirmation { .. });
            store.set_confirmation(thread_id, out.next_state)?;
            store.append_message(thread_id, Role::Assistant, &out.message)?;
            return Ok(TurnOutcome {
                thread_id: thread_id.to_owned(),
                response: ResponseKind::Answer { message: out.message },
                record: session.record,
                pending_confirmation: awaiting,
                booking: out.booking,
            });
        }

        let mut base = session.record.clone();
        if let Some(date) = session.pending_date.clone() {
            match parse_confirmation(utterance) {
                ConfirmationReply::Affirm => {
                    tracing::debug!(thread_id, date = %date, "proposed date accepted");
                    base.preferred_date = Some(date);
                    let decision = policy::decide(&TurnContext {
                        utterance,
                        today,
                        base: &base,
                        patch: &RecordPatch::default(),
                    });
                    return self.finish(store, thread_id, utterance, today, decision).await;
                }
                ConfirmationReply::Negate => {
                    let decision = policy::reask_date(base);
                    return self.finish(store, thread_id, utterance, today, decision).await;
                }
                ConfirmationReply::Unclear => {}
            }
        }

        let patch = match self.extractor.extract(utterance, today).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "extraction failed, apologizing");
                let message = EXTRACTION_APOLOGY.to_string();
                store.append_message(thread_id, Role::Assistant, &message)?;
                return Ok(TurnOutcome {
                    thread_id: thread_id.to_owned(),
                    response: ResponseKind::Error { message },
                    record: base,
                    pending_confirmation: false,
                    booking: None,
                });
            }
        };

        let decision = policy::decide(&TurnContext {
            utterance,
            today,
            base: &base,
            patch: &patch,
        });
        self.finish(store, thread_id, utterance, today, decision).await
    }

    async fn finish(
        &self,
        store: &SessionStore,
        thread_id: &str,
        utterance: &str,
        today: NaiveDate,
        decision: Decision,
    ) -> Result<TurnOutcome> {
        let rule = decision.rule;
        let pending_date = decision.pending_date.clone();
        let (response, record) = self.phrase(decision, utterance, today, pending_date.is_some()).await;

        let awaiting = matches!(response, ResponseKind::Review { .. });
        store.set_record(thread_id, record.clone())?;
        store.set_pending_date(thread_id, pending_date)?;
        if let ResponseKind::Review { message, .. } = &response {
            store.set_confirmation(
                thread_id,
                ConfirmationState::AwaitingConfirmation {
                    review_text: message.clone(),
                },
            )?;
        }
        store.append_message(thread_id, Role::Assistant, response.message())?;

        let missing = match &response {
            ResponseKind::Ask { missing_fields, .. } => missing_fields.len(),
            _ => crate::schema::missing(&record).len(),
        };
        TraceEvent::TurnClassified {
            thread_id: thread_id.to_owned(),
            kind: response.kind().to_string(),
            next_field: response.next_field().map(|f| f.as_str().to_string()),
            missing,
        }
        .emit();
        tracing::debug!(thread_id, rule = ?rule, "turn decided");

        Ok(TurnOutcome {
            thread_id: thread_id.to_owned(),
            response,
            record,
            pending_confirmation: awaiting,
            booking: None,
        })
    }

    async fn phrase(
        &self,
        decision: Decision,
        utterance: &str,
        today: NaiveDate,
        date_pending: bool,
    ) -> (ResponseKind, IntakeRecord) {
        let Some(phraser) = &self.phraser else {
            let record = decision.record.clone();
            return (to_response(decision), record);
        };
        match phraser.phrase(&decision, utterance, today).await {
            Ok(raw) => apply_reply(decision, parse_reply(&raw), date_pending),
            Err(e) => {
                tracing::warn!(error = %e, kind = decision.kind.as_str(), "phrasing failed, using template");
                let record = decision.record.clone();
                (to_response(decision), record)
            }
        }
    }
}

