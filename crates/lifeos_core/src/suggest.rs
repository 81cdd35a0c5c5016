//! Capture labelling hooks.
//!
//! # Responsibility
//! - Define the seam an LLM-backed classifier plugs into.
//! - Provide an offline keyword classifier used when none is configured.
//!
//! # Invariants
//! - Suggestions are advisory; they never change an item's type or actions.
//! - Blank text yields no label.

use crate::model::action::{actions_for, ConversionKind};
use crate::model::inbox_item::{AiLabel, InboxItem};
use once_cell::sync::Lazy;
use regex::Regex;

static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[$€£]\s?\d+(?:[.,]\d{1,2})?)|(?:\b\d+(?:[.,]\d{1,2})?\s?(?:usd|eur|gbp)\b)")
        .expect("valid currency regex")
});
static BILL_WORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:invoice|bill|payment due|amount due|receipt|subscription|rent)\b")
        .expect("valid bill words regex")
});
static REFLECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:i feel|i felt|i realized|i realised|grateful|today i|i learned|i'm thankful|reflect)",
    )
    .expect("valid reflection regex")
});

/// Suggests an [`AiLabel`] for captured text.
pub trait LabelSuggester {
    fn suggest(&self, title: Option<&str>, content: &str) -> Option<AiLabel>;
}

/// Regex heuristics over lowercase title and content.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordLabelSuggester;

impl LabelSuggester for KeywordLabelSuggester {
    fn suggest(&self, title: Option<&str>, content: &str) -> Option<AiLabel> {
        let text = format!("{} {}", title.unwrap_or_default(), content).to_lowercase();
        if text.trim().is_empty() {
            return None;
        }
        if CURRENCY_RE.is_match(&text) || BILL_WORDS_RE.is_match(&text) {
            return Some(AiLabel::Bill);
        }
        if REFLECTION_RE.is_match(&text) {
            return Some(AiLabel::Reflection);
        }
        Some(AiLabel::Idea)
    }
}

/// Suggester that never labels anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLabelSuggester;

impl LabelSuggester for NoLabelSuggester {
    fn suggest(&self, _title: Option<&str>, _content: &str) -> Option<AiLabel> {
        None
    }
}

/// First offered action that fits the item's label, if any.
///
/// BILL prefers "To Bill", IDEA prefers "To Task", REFLECTION prefers
/// "Keep as Note". A preference the item's type does not offer is skipped.
pub fn recommended_action(item: &InboxItem) -> Option<ConversionKind> {
    let preferred = match item.ai_label? {
        AiLabel::Bill => ConversionKind::ToBill,
        AiLabel::Idea => ConversionKind::ToTask,
        AiLabel::Reflection => ConversionKind::KeepAsNote,
    };
    actions_for(item.kind)
        .iter()
        .map(|action| action.conversion)
        .find(|conversion| *conversion == preferred)
}

#[cfg(test)]
mod tests {
    use super::{recommended_action, KeywordLabelSuggester, LabelSuggester};
    use crate::model::action::ConversionKind;
    use crate::model::inbox_item::{AiLabel, NewInboxItem};

    #[test]
    fn keyword_suggester_detects_bills() {
        let suggester = KeywordLabelSuggester;
        assert_eq!(
            suggester.suggest(Some("Electricity"), "Amount due $54.20 by Friday"),
            Some(AiLabel::Bill)
        );
        assert_eq!(
            suggester.suggest(None, "Your INVOICE is attached"),
            Some(AiLabel::Bill)
        );
    }

    #[test]
    fn keyword_suggester_detects_reflections_and_defaults_to_idea() {
        let suggester = KeywordLabelSuggester;
        assert_eq!(
            suggester.suggest(None, "Today I walked by the river"),
            Some(AiLabel::Reflection)
        );
        assert_eq!(
            suggester.suggest(None, "app that sorts socks"),
            Some(AiLabel::Idea)
        );
        assert_eq!(suggester.suggest(Some(" "), "  "), None);
    }

    #[test]
    fn recommendation_respects_offered_actions() {
        let email = NewInboxItem::imported_email("a@b.c", "Rent", "due")
            .with_ai_label(AiLabel::Bill)
            .into_item();
        assert_eq!(recommended_action(&email), Some(ConversionKind::ToBill));

        let voice_bill = NewInboxItem::voice("pay rent", 3)
            .with_ai_label(AiLabel::Bill)
            .into_item();
        assert_eq!(recommended_action(&voice_bill), None);

        let unlabeled = NewInboxItem::note("plain").into_item();
        assert_eq!(recommended_action(&unlabeled), None);
    }
}
