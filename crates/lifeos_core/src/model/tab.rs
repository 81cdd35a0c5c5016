//! Inbox list tabs and the filter they apply.
//!
//! `ImportedEmail` items only appear under `All`; neither the voice nor the
//! notes tab claims them.

use crate::model::inbox_item::{InboxItem, InboxItemType};
use serde::{Deserialize, Serialize};

/// Active filter of the inbox list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxTab {
    #[default]
    All,
    Voice,
    Notes,
}

impl InboxTab {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Voice => "voice",
            Self::Notes => "notes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "voice" => Some(Self::Voice),
            "notes" => Some(Self::Notes),
            _ => None,
        }
    }

    /// Whether an item of `kind` is visible under this tab.
    pub const fn admits(self, kind: InboxItemType) -> bool {
        match self {
            Self::All => true,
            Self::Voice => matches!(kind, InboxItemType::Voice),
            Self::Notes => matches!(kind, InboxItemType::Note),
        }
    }
}

/// Item counts shown on tab badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabCounts {
    pub all: usize,
    pub voice: usize,
    pub notes: usize,
}

/// Returns the visible subset for `tab`, preserving store order.
pub fn filter_items(items: &[InboxItem], tab: InboxTab) -> Vec<InboxItem> {
    items
        .iter()
        .filter(|item| tab.admits(item.kind))
        .cloned()
        .collect()
}

/// Counts items per tab in one pass.
pub fn tab_counts(items: &[InboxItem]) -> TabCounts {
    items.iter().fold(TabCounts::default(), |mut counts, item| {
        counts.all += 1;
        if InboxTab::Voice.admits(item.kind) {
            counts.voice += 1;
        }
        if InboxTab::Notes.admits(item.kind) {
            counts.notes += 1;
        }
        counts
    })
}
