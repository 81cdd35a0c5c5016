//! Display formatting for inbox rows.
//!
//! # Responsibility
//! - Turn inbox items into the strings an inbox row renders.
//!
//! # Invariants
//! - Every function is pure and total; none of them fail.
//! - Negative or sub-minute ages render as "just now".

use crate::model::action::{actions_for, InboxAction};
use crate::model::inbox_item::{AiLabel, InboxItem, InboxItemId, InboxItemType};
use once_cell::sync::Lazy;
use regex::Regex;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
const TITLE_MAX_CHARS: usize = 48;
const UNTITLED: &str = "Untitled";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Renders the age of `created_at_ms` relative to `now_ms`.
///
/// Thresholds are 60s, 3600s and 86400s; counts are floored and never
/// pluralized differently ("1 mins ago").
pub fn format_relative_time(created_at_ms: i64, now_ms: i64) -> String {
    let diff_secs = now_ms.saturating_sub(created_at_ms) / 1_000;
    if diff_secs < SECONDS_PER_MINUTE {
        "just now".to_string()
    } else if diff_secs < SECONDS_PER_HOUR {
        format!("{} mins ago", diff_secs / SECONDS_PER_MINUTE)
    } else if diff_secs < SECONDS_PER_DAY {
        format!("{} hours ago", diff_secs / SECONDS_PER_HOUR)
    } else {
        format!("{} days ago", diff_secs / SECONDS_PER_DAY)
    }
}

pub fn item_type_label(kind: InboxItemType) -> &'static str {
    match kind {
        InboxItemType::Voice => "Voice Note",
        InboxItemType::Note => "Note",
        InboxItemType::ImportedEmail => "Email",
    }
}

pub fn ai_label_badge(label: AiLabel) -> &'static str {
    match label {
        AiLabel::Idea => "Idea",
        AiLabel::Reflection => "Reflection",
        AiLabel::Bill => "Bill",
    }
}

/// Title shown for a row: the explicit title, or the first content line.
pub fn derive_title(title: Option<&str>, content: &str) -> String {
    let source = title
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .or_else(|| content.lines().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or(UNTITLED);

    let collapsed = WHITESPACE_RE.replace_all(source, " ");
    let mut truncated = collapsed.chars().take(TITLE_MAX_CHARS).collect::<String>();
    if collapsed.chars().count() > TITLE_MAX_CHARS {
        truncated.push_str("...");
    }
    truncated
}

pub fn display_title(item: &InboxItem) -> String {
    derive_title(item.title.as_deref(), &item.content)
}

/// Voice clip length as `m:ss`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Bill amount with two decimals.
pub fn format_amount(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Everything an inbox row needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    pub id: InboxItemId,
    pub kind: InboxItemType,
    pub type_label: &'static str,
    pub title: String,
    pub content: String,
    pub relative_time: String,
    pub badge: Option<&'static str>,
    pub sender: Option<String>,
    pub amount: Option<String>,
    pub duration: Option<String>,
    pub attachment_count: usize,
    pub actions: &'static [InboxAction],
}

pub fn present_item(item: &InboxItem, now_ms: i64) -> ItemView {
    ItemView {
        id: item.id,
        kind: item.kind,
        type_label: item_type_label(item.kind),
        title: display_title(item),
        content: item.content.clone(),
        relative_time: format_relative_time(item.created_at, now_ms),
        badge: item.ai_label.map(ai_label_badge),
        sender: item.from.clone(),
        amount: item.amount.map(format_amount),
        duration: item.duration_seconds.map(format_duration),
        attachment_count: item.attachments.len(),
        actions: actions_for(item.kind),
    }
}
