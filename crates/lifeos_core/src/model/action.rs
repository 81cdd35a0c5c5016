//! Inbox triage actions.
//!
//! # Responsibility
//! - Map each inbox item type to the conversions the user may pick.
//!
//! # Invariants
//! - The table is static; changing offered conversions is a table edit.
//! - Unrecognized type names resolve to an empty action list.

use crate::model::inbox_item::InboxItemType;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Target of a triage action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    ToTask,
    ToEvent,
    ToHabit,
    ToBill,
    /// Reviewed and intentionally left in place.
    KeepAsNote,
}

impl ConversionKind {
    /// Button label shown by the presentation layer.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ToTask => "To Task",
            Self::ToEvent => "To Event",
            Self::ToHabit => "To Habit",
            Self::ToBill => "To Bill",
            Self::KeepAsNote => "Keep as Note",
        }
    }

    /// snake_case name used in logs and storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToTask => "to_task",
            Self::ToEvent => "to_event",
            Self::ToHabit => "to_habit",
            Self::ToBill => "to_bill",
            Self::KeepAsNote => "keep_as_note",
        }
    }

    /// Parses either a button label (`"To Task"`) or a snake_case name (`"to_task"`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(' ', "_");
        match normalized.as_str() {
            "to_task" => Some(Self::ToTask),
            "to_event" => Some(Self::ToEvent),
            "to_habit" => Some(Self::ToHabit),
            "to_bill" => Some(Self::ToBill),
            "keep_as_note" => Some(Self::KeepAsNote),
            _ => None,
        }
    }

    /// Whether this action creates an object outside the inbox.
    pub const fn creates_target(self) -> bool {
        !matches!(self, Self::KeepAsNote)
    }
}

impl Display for ConversionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of an item's action list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxAction {
    pub label: &'static str,
    pub conversion: ConversionKind,
}

const fn action(conversion: ConversionKind) -> InboxAction {
    InboxAction {
        label: conversion.label(),
        conversion,
    }
}

const VOICE_ACTIONS: &[InboxAction] = &[
    action(ConversionKind::ToTask),
    action(ConversionKind::ToEvent),
    action(ConversionKind::ToHabit),
];

const NOTE_ACTIONS: &[InboxAction] = &[
    action(ConversionKind::ToHabit),
    action(ConversionKind::KeepAsNote),
];

const IMPORTED_EMAIL_ACTIONS: &[InboxAction] = &[
    action(ConversionKind::ToTask),
    action(ConversionKind::ToEvent),
    action(ConversionKind::ToBill),
];

/// Ordered actions offered for `kind`.
pub fn actions_for(kind: InboxItemType) -> &'static [InboxAction] {
    match kind {
        InboxItemType::Voice => VOICE_ACTIONS,
        InboxItemType::Note => NOTE_ACTIONS,
        InboxItemType::ImportedEmail => IMPORTED_EMAIL_ACTIONS,
    }
}

/// Ordered actions for a raw type name; unknown names get `[]`.
pub fn actions_for_type_name(type_name: &str) -> &'static [InboxAction] {
    match InboxItemType::parse(type_name) {
        Some(kind) => actions_for(kind),
        None => &[],
    }
}

/// Whether `conversion` is offered for items of `kind`.
pub fn is_action_available(kind: InboxItemType, conversion: ConversionKind) -> bool {
    actions_for(kind)
        .iter()
        .any(|action| action.conversion == conversion)
}
