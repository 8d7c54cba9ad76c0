//! Japanese date phrases and collection-day rules.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;

use crate::merge::{normalize_date, to_half_width};

/// Reference timezone for "today" when nothing else is configured.
pub const JST: Tz = chrono_tz::Asia::Tokyo;

static YMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[-/年.]\s*(\d{1,2})\s*[-/月.]\s*(\d{1,2})\s*日?").expect("ymd regex")
});
static NEXT_MONTH_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"来月\s*の?\s*(\d{1,2})\s*日").expect("next month regex"));
static MD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s*月\s*(\d{1,2})\s*日|(\d{1,2})\s*/\s*(\d{1,2})").expect("md regex")
});
static DAYS_LATER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*日\s*後").expect("days later regex"));
static WEEKS_LATER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*週間?\s*後").expect("weeks later regex"));
static MONTHS_LATER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*[かヶカケ]\s*月\s*後").expect("months later regex"));
static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(再来週|来週|今週)?\s*の?\s*([月火水木金土日])\s*曜").expect("weekday regex")
});

/// Day words, longest first so 明明後日 is not read as 明後日.
const DAY_WORDS: [(&str, u64); 8] = [
    ("明明後日", 3),
    ("明々後日", 3),
    ("しあさって", 3),
    ("明後日", 2),
    ("あさって", 2),
    ("明日", 1),
    ("あした", 1),
    ("今日", 0),
];

/// A date found in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePhrase {
    pub date: NaiveDate,
    /// Relative or vague wording (明日, 来週金曜, 3日後) as opposed to a
    /// calendar date the resident spelled out.
    pub relative: bool,
}

/// Today's calendar day in `tz`.
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Resolve a Japanese date phrase against `base_date` (`YYYY-MM-DD`, JST).
///
/// Returns `""` when no phrase is recognized. An unparsable base date falls
/// back to today in JST.
pub fn resolve_date(text: &str, base_date: &str) -> String {
    let base = normalize_date(base_date)
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| today(JST));
    find_date_phrase(text, base)
        .map(|p| p.date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Find the first recognizable date phrase in `text`.
pub fn find_date_phrase(text: &str, base: NaiveDate) -> Option<DatePhrase> {
    let text = to_half_width(text);
    let absolute = |date| DatePhrase { date, relative: false };
    let relative = |date| DatePhrase { date, relative: true };

    if let Some(c) = YMD_RE.captures(&text) {
        return ymd(num(&c[1])?, num(&c[2])?, num(&c[3])?).map(absolute);
    }
    if let Some(c) = NEXT_MONTH_DAY_RE.captures(&text) {
        let first = base.with_day(1)?.checked_add_months(Months::new(1))?;
        return first.with_day(num(&c[1])?).map(relative);
    }
    if let Some(c) = MD_RE.captures(&text) {
        let (m, d) = match (c.get(1), c.get(2)) {
            (Some(m), Some(d)) => (m.as_str(), d.as_str()),
            _ => (c.get(3)?.as_str(), c.get(4)?.as_str()),
        };
        return month_day_from(base, num(m)?, num(d)?).map(absolute);
    }
    if let Some(c) = DAYS_LATER_RE.captures(&text) {
        return base.checked_add_days(Days::new(num(&c[1])? as u64)).map(relative);
    }
    if let Some(c) = WEEKS_LATER_RE.captures(&text) {
        return base
            .checked_add_days(Days::new(7 * num(&c[1])? as u64))
            .map(relative);
    }
    if let Some(c) = MONTHS_LATER_RE.captures(&text) {
        return base.checked_add_months(Months::new(num(&c[1])?)).map(relative);
    }
    let words = strip_greeting(&text);
    for (word, days) in DAY_WORDS {
        if words.contains(word) {
            return base.checked_add_days(Days::new(days)).map(relative);
        }
    }
    if let Some(c) = WEEKDAY_RE.captures(&text) {
        let target = weekday_from_kanji(&c[2])?;
        let week = c.get(1).map(|m| m.as_str());
        return weekday_date(base, week, target).map(relative);
    }
    if text.contains("再来週") {
        return base.checked_add_days(Days::new(14)).map(relative);
    }
    if text.contains("来週") {
        return base.checked_add_days(Days::new(7)).map(relative);
    }
    if text.contains("来月") {
        return base.checked_add_months(Months::new(1)).map(relative);
    }
    None
}

/// Drop a leading 「今日は、」 greeting (こんにちは written in kanji) so it is
/// not read as a date.
fn strip_greeting(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.strip_prefix("今日は") {
        Some(rest)
            if rest.is_empty()
                || rest.starts_with(|c: char| {
                    c.is_whitespace() || matches!(c, '、' | '，' | ',' | '。' | '！' | '!' | '～' | '〜')
                }) =>
        {
            rest
        }
        _ => text,
    }
}

fn num(s: &str) -> Option<u32> {
    s.parse().ok()
}

fn ymd(y: u32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)
}

/// `M/D` without a year: this year, or next year once the day has passed.
fn month_day_from(base: NaiveDate, m: u32, d: u32) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(base.year(), m, d);
    match this_year {
        Some(date) if date >= base => Some(date),
        _ => NaiveDate::from_ymd_opt(base.year() + 1, m, d),
    }
}

fn weekday_from_kanji(s: &str) -> Option<Weekday> {
    Some(match s {
        "月" => Weekday::Mon,
        "火" => Weekday::Tue,
        "水" => Weekday::Wed,
        "木" => Weekday::Thu,
        "金" => Weekday::Fri,
        "土" => Weekday::Sat,
        "日" => Weekday::Sun,
        _ => return None,
    })
}

/// Weeks start on Monday. A bare weekday is the next occurrence strictly
/// after `base`; 今週 falls forward a week once the day has passed.
fn weekday_date(base: NaiveDate, week: Option<&str>, target: Weekday) -> Option<NaiveDate> {
    let monday = base.checked_sub_days(Days::new(base.weekday().num_days_from_monday() as u64))?;
    let offset = target.num_days_from_monday() as u64;
    match week {
        Some("来週") => monday.checked_add_days(Days::new(7 + offset)),
        Some("再来週") => monday.checked_add_days(Days::new(14 + offset)),
        Some(_) => {
            let d = monday.checked_add_days(Days::new(offset))?;
            if d < base {
                d.checked_add_days(Days::new(7))
            } else {
                Some(d)
            }
        }
        None => {
            let from = base.weekday().num_days_from_monday() as u64;
            let ahead = (offset + 7 - from) % 7;
            base.checked_add_days(Days::new(if ahead == 0 { 7 } else { ahead }))
        }
    }
}

pub fn weekday_ja(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// `2025-08-29（金）`
pub fn format_date_ja(date: NaiveDate) -> String {
    format!("{}（{}）", date.format("%Y-%m-%d"), weekday_ja(date))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Collection days
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of a collection-day check. Displays as `ok` or `ng: <reason>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collectibility {
    Ok,
    Ng(String),
}

impl Collectibility {
    pub fn is_ok(&self) -> bool {
        matches!(self, Collectibility::Ok)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Collectibility::Ok => None,
            Collectibility::Ng(r) => Some(r),
        }
    }
}

impl fmt::Display for Collectibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collectibility::Ok => f.write_str("ok"),
            Collectibility::Ng(reason) => write!(f, "ng: {reason}"),
        }
    }
}

/// Reasons that apply to every address.
pub fn universal_ng_reason(date: NaiveDate) -> Option<&'static str> {
    if date.weekday() == Weekday::Sun {
        return Some("日曜日は回収不可です");
    }
    if matches!((date.month(), date.day()), (1, 1) | (12, 31)) {
        return Some("祝日/年末年始は回収不可です");
    }
    None
}

/// Whether a pickup can happen on `date` at `address`.
///
/// No per-district calendar is loaded, so only the universal rules apply and
/// `address` does not change the outcome.
pub fn check_collectible(date: &str, _address: &str) -> Collectibility {
    let parsed = normalize_date(date).and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
    match parsed {
        None => Collectibility::Ng("日付形式エラー".into()),
        Some(d) => match universal_ng_reason(d) {
            Some(reason) => Collectibility::Ng(reason.into()),
            None => Collectibility::Ok,
        },
    }
}

/// First collectible day strictly after `after`.
pub fn next_collectible_day(after: NaiveDate) -> Option<NaiveDate> {
    let mut d = after.succ_opt()?;
    while universal_ng_reason(d).is_some() {
        d = d.succ_opt()?;
    }
    Some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-08-20 is a Wednesday.
    const BASE: &str = "2025-08-20";

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
    }

    #[test]
    fn day_words() {
        assert_eq!(resolve_date("今日", BASE), "2025-08-20");
        assert_eq!(resolve_date("明日でお願いします", BASE), "2025-08-21");
        assert_eq!(resolve_date("明後日", BASE), "2025-08-22");
        assert_eq!(resolve_date("あさって", BASE), "2025-08-22");
        assert_eq!(resolve_date("しあさって", BASE), "2025-08-23");
    }

    #[test]
    fn kanji_greeting_is_not_a_date() {
        assert!(find_date_phrase("今日は、ヤマダです", base()).is_none());
        assert!(find_date_phrase("今日は！ソファを出したいです", base()).is_none());
        assert_eq!(resolve_date("今日は回収できますか", BASE), "2025-08-20");
        let p = find_date_phrase("今日は、明日の回収をお願いしたいです", base()).unwrap();
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2025, 8, 21).unwrap());
    }

    #[test]
    fn weekdays() {
        assert_eq!(resolve_date("来週金曜", BASE), "2025-08-29");
        assert_eq!(resolve_date("来週の火曜日", BASE), "2025-08-26");
        assert_eq!(resolve_date("再来週月曜", BASE), "2025-09-01");
        assert_eq!(resolve_date("今週土曜", BASE), "2025-08-23");
        assert_eq!(resolve_date("今週月曜", BASE), "2025-08-25");
        assert_eq!(resolve_date("金曜", BASE), "2025-08-22");
        // Bare weekday equal to today means next week.
        assert_eq!(resolve_date("水曜", BASE), "2025-08-27");
    }

    #[test]
    fn offsets() {
        assert_eq!(resolve_date("3日後", BASE), "2025-08-23");
        assert_eq!(resolve_date("３日後", BASE), "2025-08-23");
        assert_eq!(resolve_date("2週間後", BASE), "2025-09-03");
        assert_eq!(resolve_date("1ヶ月後", BASE), "2025-09-20");
        assert_eq!(resolve_date("来週", BASE), "2025-08-27");
        assert_eq!(resolve_date("来月5日", BASE), "2025-09-05");
    }

    #[test]
    fn absolute_dates_prefer_future() {
        assert_eq!(resolve_date("8/30", BASE), "2025-08-30");
        assert_eq!(resolve_date("8月30日に", BASE), "2025-08-30");
        assert_eq!(resolve_date("1/10", BASE), "2026-01-10");
        assert_eq!(resolve_date("2025/09/01", BASE), "2025-09-01");
        assert_eq!(resolve_date("２０２５－０９－０２", BASE), "2025-09-02");
    }

    #[test]
    fn relative_flag() {
        assert!(find_date_phrase("来週金曜", base()).unwrap().relative);
        assert!(find_date_phrase("明日", base()).unwrap().relative);
        assert!(!find_date_phrase("8/30", base()).unwrap().relative);
        assert!(!find_date_phrase("2025-08-30", base()).unwrap().relative);
        assert!(find_date_phrase("ソファを出したい", base()).is_none());
    }

    #[test]
    fn unknown_phrase_and_bad_base() {
        assert_eq!(resolve_date("そのうち", BASE), "");
        assert_eq!(resolve_date("2月30日", BASE), "");
        // Bad base falls back to today; an absolute date is unaffected.
        assert_eq!(resolve_date("2030-01-15", "not-a-date"), "2030-01-15");
        assert!(!resolve_date("明日", "2025/08/20").is_empty());
    }

    #[test]
    fn collectible_rules() {
        assert_eq!(check_collectible("2025-08-22", "大阪市").to_string(), "ok");
        assert!(check_collectible("2025-01-01", "").to_string().starts_with("ng:"));
        assert!(check_collectible("2025-12-31", "").to_string().starts_with("ng:"));
        assert_eq!(
            check_collectible("2025-08-24", "大阪市").to_string(),
            "ng: 日曜日は回収不可です"
        );
        assert_eq!(
            check_collectible("2025/08/22", "").to_string(),
            "ng: 日付形式エラー"
        );
    }

    #[test]
    fn next_collectible_skips_ng_days() {
        let sat = NaiveDate::from_ymd_opt(2025, 8, 23).unwrap();
        assert_eq!(
            next_collectible_day(sat),
            NaiveDate::from_ymd_opt(2025, 8, 25)
        );
        let dec30 = NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
        assert_eq!(
            next_collectible_day(dec30),
            NaiveDate::from_ymd_opt(2026, 1, 2)
        );
    }

    #[test]
    fn japanese_date_format() {
        assert_eq!(
            format_date_ja(NaiveDate::from_ymd_opt(2025, 8, 29).unwrap()),
            "2025-08-29（金）"
        );
    }
}
