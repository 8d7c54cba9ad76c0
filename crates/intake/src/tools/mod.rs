//! Deterministic lookup tools used by the dialogue policy.

mod booking;
mod dates;
mod faq;
mod fee;

pub use booking::{reserve, BookingConfirmation};
pub use dates::{
    check_collectible, find_date_phrase, format_date_ja, next_collectible_day, resolve_date,
    today, universal_ng_reason, weekday_ja, Collectibility, DatePhrase, JST,
};
pub use faq::rag_search;
pub use fee::{estimate_fee, FeeQuote, DEFAULT_UNIT_PRICE};
