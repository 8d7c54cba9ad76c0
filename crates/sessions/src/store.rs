//! Gateway-owned thread store.
//!
//! Keeps every thread in memory. When a state path is configured the whole
//! map is written to `threads.json` on [`SessionStore::flush`] and reloaded by
//! [`SessionStore::open`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use sg_domain::error::{Error, Result};
use sg_domain::message::Role;
use sg_domain::record::IntakeRecord;
use sg_domain::trace::TraceEvent;

use crate::transcript::TranscriptLine;

const SNAPSHOT_FILE: &str = "threads.json";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whether the thread is waiting for a yes/no on a review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfirmationState {
    #[default]
    Idle,
    AwaitingConfirmation {
        review_text: String,
    },
}

/// One conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub thread_id: String,
    #[serde(default)]
    pub messages: Vec<TranscriptLine>,
    #[serde(default)]
    pub record: IntakeRecord,
    #[serde(default)]
    pub confirmation: ConfirmationState,
    /// A resolved relative date the resident has not confirmed yet.
    #[serde(default)]
    pub pending_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            record: IntakeRecord::default(),
            confirmation: ConfirmationState::Idle,
            pending_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pending_confirmation(&self) -> bool {
        matches!(self.confirmation, ConfirmationState::AwaitingConfirmation { .. })
    }

    /// The review text shown last, or `""` when idle.
    pub fn last_review_text(&self) -> &str {
        match &self.confirmation {
            ConfirmationState::AwaitingConfirmation { review_text } => review_text,
            ConfirmationState::Idle => "",
        }
    }
}

/// Mint a thread id of the form `YYYYMMDD-HHMMSS-xxxx` in the given timezone.
pub fn new_thread_id(tz: Tz) -> String {
    let now = Utc::now().with_timezone(&tz);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.format("%Y%m%d-%H%M%S"), &suffix[..4])
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionStore {
    snapshot_path: Option<PathBuf>,
    threads: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            snapshot_path: None,
            threads: RwLock::new(HashMap::new()),
        }
    }

    /// Load or create the store at `state_path/threads.json`.
    pub fn open(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;

        let snapshot_path = state_path.join(SNAPSHOT_FILE);
        let threads: HashMap<String, Session> = if snapshot_path.exists() {
            let raw = std::fs::read_to_string(&snapshot_path).map_err(Error::Io)?;
            match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        path = %snapshot_path.display(),
                        error = %e,
                        "unreadable thread snapshot, starting empty"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        tracing::info!(
            threads = threads.len(),
            path = %snapshot_path.display(),
            "thread store loaded"
        );

        Ok(Self {
            snapshot_path: Some(snapshot_path),
            threads: RwLock::new(threads),
        })
    }

    /// Create a thread. Creating an id that already exists returns the
    /// existing thread untouched.
    pub fn create(&self, thread_id: &str) -> Session {
        let mut threads = self.threads.write();
        if let Some(existing) = threads.get(thread_id) {
            return existing.clone();
        }
        let session = Session::new(thread_id);
        threads.insert(thread_id.to_owned(), session.clone());
        drop(threads);

        TraceEvent::ThreadCreated {
            thread_id: thread_id.to_owned(),
        }
        .emit();

        session
    }

    pub fn get(&self, thread_id: &str) -> Option<Session> {
        self.threads.read().get(thread_id).cloned()
    }

    pub fn contains(&self, thread_id: &str) -> bool {
        self.threads.read().contains_key(thread_id)
    }

    pub fn set_record(&self, thread_id: &str, record: IntakeRecord) -> Result<()> {
        self.update(thread_id, |s| s.record = record)
    }

    pub fn append_message(&self, thread_id: &str, role: Role, text: &str) -> Result<()> {
        let line = TranscriptLine::new(role, text);
        self.update(thread_id, |s| s.messages.push(line))
    }

    pub fn set_confirmation(&self, thread_id: &str, state: ConfirmationState) -> Result<()> {
        self.update(thread_id, |s| s.confirmation = state)
    }

    pub fn set_pending_date(&self, thread_id: &str, date: Option<String>) -> Result<()> {
        self.update(thread_id, |s| s.pending_date = date)
    }

    /// All thread ids, oldest first (ids start with their creation time).
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.threads.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.threads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.read().is_empty()
    }

    /// Persist the current thread state to disk. No-op for in-memory stores.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let json = {
            let threads = self.threads.read();
            serde_json::to_string_pretty(&*threads)
                .map_err(|e| Error::Other(format!("serializing threads: {e}")))?
        };
        std::fs::write(path, json).map_err(Error::Io)?;
        tracing::debug!(path = %path.display(), "thread snapshot written");
        Ok(())
    }

    fn update<F>(&self, thread_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Session),
    {
        let mut threads = self.threads.write();
        let session = threads
            .get_mut(thread_id)
            .ok_or_else(|| Error::SessionNotFound(thread_id.to_owned()))?;
        f(session);
        session.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_domain::record::TimeSlot;

    #[test]
    fn thread_id_has_timestamp_and_suffix() {
        let id = new_thread_id(chrono_tz::Asia::Tokyo);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn create_is_idempotent() {
        let store = SessionStore::in_memory();
        store.create("t1");
        store.append_message("t1", Role::User, "こんにちは").unwrap();
        let again = store.create("t1");
        assert_eq!(again.messages.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_thread_is_an_error() {
        let store = SessionStore::in_memory();
        let err = store
            .set_record("missing", IntakeRecord::default())
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(id) if id == "missing"));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn messages_keep_order() {
        let store = SessionStore::in_memory();
        store.create("t1");
        store.append_message("t1", Role::User, "one").unwrap();
        store.append_message("t1", Role::Assistant, "two").unwrap();
        let s = store.get("t1").unwrap();
        let texts: Vec<&str> = s.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, ["one", "two"]);
        assert_eq!(s.messages[1].role, Role::Assistant);
    }

    #[test]
    fn confirmation_state_derives_flags() {
        let store = SessionStore::in_memory();
        store.create("t1");
        assert!(!store.get("t1").unwrap().pending_confirmation());

        store
            .set_confirmation(
                "t1",
                ConfirmationState::AwaitingConfirmation {
                    review_text: "ご確認ください".into(),
                },
            )
            .unwrap();
        let s = store.get("t1").unwrap();
        assert!(s.pending_confirmation());
        assert_eq!(s.last_review_text(), "ご確認ください");

        store.set_confirmation("t1", ConfirmationState::Idle).unwrap();
        assert_eq!(store.get("t1").unwrap().last_review_text(), "");
    }

    #[test]
    fn threads_are_isolated() {
        let store = SessionStore::in_memory();
        store.create("a");
        store.create("b");
        store
            .set_record(
                "a",
                IntakeRecord {
                    name: Some("ヤマダ タロウ".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        store.set_pending_date("a", Some("2025-08-29".into())).unwrap();
        let b = store.get("b").unwrap();
        assert!(b.record.name.is_none());
        assert!(b.pending_date.is_none());
        assert_eq!(store.list_ids(), ["a", "b"]);
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SessionStore::open(dir.path()).unwrap();
            store.create("20250820-101500-abcd");
            store
                .set_record(
                    "20250820-101500-abcd",
                    IntakeRecord {
                        quantity: Some(2),
                        time_slot: Some(TimeSlot::Afternoon),
                        ..Default::default()
                    },
                )
                .unwrap();
            store.flush().unwrap();
        }
        let reopened = SessionStore::open(dir.path()).unwrap();
        let s = reopened.get("20250820-101500-abcd").unwrap();
        assert_eq!(s.record.quantity, Some(2));
        assert_eq!(s.record.time_slot, Some(TimeSlot::Afternoon));
    }

    #[test]
    fn in_memory_flush_is_a_no_op() {
        let store = SessionStore::in_memory();
        store.create("t1");
        store.flush().unwrap();
    }
}
