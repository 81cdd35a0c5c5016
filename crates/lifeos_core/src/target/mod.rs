//! Conversion target seam.
//!
//! # Responsibility
//! - Describe the minimal creation payload sent to the collaborating API.
//! - Abstract "create task/event/habit/bill" behind one trait so the inbox
//!   executor never depends on a transport.
//!
//! # Invariants
//! - A target reports success only after the object exists on its side.
//! - Payloads are derived from item `title`/`content`/`amount`/`from` only.

mod sqlite;

pub use sqlite::{ConvertedRecord, SqliteConversionTarget};

use crate::model::action::ConversionKind;
use crate::model::inbox_item::{InboxItem, InboxItemId};
use crate::present::derive_title;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Structured domain object a conversion creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Task,
    Event,
    Habit,
    Bill,
}

impl TargetKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Event => "event",
            Self::Habit => "habit",
            Self::Bill => "bill",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "task" => Some(Self::Task),
            "event" => Some(Self::Event),
            "habit" => Some(Self::Habit),
            "bill" => Some(Self::Bill),
            _ => None,
        }
    }

    /// Target created by `conversion`; `None` for keep-as-note.
    pub const fn for_conversion(conversion: ConversionKind) -> Option<Self> {
        match conversion {
            ConversionKind::ToTask => Some(Self::Task),
            ConversionKind::ToEvent => Some(Self::Event),
            ConversionKind::ToHabit => Some(Self::Habit),
            ConversionKind::ToBill => Some(Self::Bill),
            ConversionKind::KeepAsNote => None,
        }
    }
}

/// Creation request sent to a conversion target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionPayload {
    pub kind: TargetKind,
    pub source_item_id: InboxItemId,
    pub title: String,
    pub body: String,
    /// Only carried for bills.
    pub amount: Option<f64>,
    /// Email sender, when the item was imported.
    pub counterparty: Option<String>,
}

impl ConversionPayload {
    pub fn from_item(item: &InboxItem, kind: TargetKind) -> Self {
        Self {
            kind,
            source_item_id: item.id,
            title: derive_title(item.title.as_deref(), &item.content),
            body: item.content.clone(),
            amount: match kind {
                TargetKind::Bill => item.amount,
                _ => None,
            },
            counterparty: item.from.clone(),
        }
    }
}

/// Handle to an object created by a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub kind: TargetKind,
    /// Identifier assigned by the target.
    pub id: String,
}

/// Creation failure reported by a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Target could not be reached or is not configured.
    Unavailable(String),
    /// Target refused the payload.
    Rejected(String),
    /// Local storage failure while recording the object.
    Storage(String),
}

impl Display for TargetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "conversion target unavailable: {message}"),
            Self::Rejected(message) => write!(f, "conversion target rejected payload: {message}"),
            Self::Storage(message) => write!(f, "conversion target storage failed: {message}"),
        }
    }
}

impl Error for TargetError {}

/// Collaborator that creates structured objects from inbox items.
pub trait ConversionTarget {
    fn create(&self, payload: &ConversionPayload) -> Result<TargetRef, TargetError>;
}

impl<T: ConversionTarget + ?Sized> ConversionTarget for &T {
    fn create(&self, payload: &ConversionPayload) -> Result<TargetRef, TargetError> {
        (**self).create(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversionPayload, TargetKind};
    use crate::model::action::ConversionKind;
    use crate::model::inbox_item::NewInboxItem;

    #[test]
    fn bill_payload_carries_amount_and_sender() {
        let item = NewInboxItem::imported_email("billing@power.co", "Power bill", "Due Friday")
            .with_amount(82.4)
            .into_item();

        let payload = ConversionPayload::from_item(&item, TargetKind::Bill);
        assert_eq!(payload.title, "Power bill");
        assert_eq!(payload.body, "Due Friday");
        assert_eq!(payload.amount, Some(82.4));
        assert_eq!(payload.counterparty.as_deref(), Some("billing@power.co"));
    }

    #[test]
    fn non_bill_payload_drops_amount() {
        let item = NewInboxItem::imported_email("a@b.c", "Invoice", "pay")
            .with_amount(10.0)
            .into_item();
        assert_eq!(
            ConversionPayload::from_item(&item, TargetKind::Task).amount,
            None
        );
    }

    #[test]
    fn keep_as_note_has_no_target() {
        assert_eq!(TargetKind::for_conversion(ConversionKind::KeepAsNote), None);
        assert_eq!(
            TargetKind::for_conversion(ConversionKind::ToHabit),
            Some(TargetKind::Habit)
        );
    }
}
