//! Inbox item domain model.
//!
//! # Responsibility
//! - Define the captured, not-yet-triaged record held by the inbox store.
//! - Provide capture constructors for voice notes, quick notes and emails.
//! - Validate capture payloads before they reach any store.
//!
//! # Invariants
//! - `id` is a non-nil UUID and never reused for another item.
//! - `kind` is fixed at capture time; no API mutates it afterwards.
//! - Blank content is a valid capture (an untranscribed recording is still
//!   worth triaging).
//! - `amount`, when set, is finite. Negative amounts are refunds and credits.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for one inbox item.
pub type InboxItemId = Uuid;

/// Capture channel of an inbox item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxItemType {
    /// Transcribed voice recording.
    Voice,
    /// Quick typed note.
    Note,
    /// Email forwarded into the inbox.
    ImportedEmail,
}

impl InboxItemType {
    /// Canonical snake_case name used in storage and FFI payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Note => "note",
            Self::ImportedEmail => "imported_email",
        }
    }

    /// Parses a canonical type name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "voice" => Some(Self::Voice),
            "note" => Some(Self::Note),
            "imported_email" => Some(Self::ImportedEmail),
            _ => None,
        }
    }
}

impl Display for InboxItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification label attached by the suggestion layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AiLabel {
    Idea,
    Reflection,
    Bill,
}

impl AiLabel {
    /// Canonical uppercase name used in storage and FFI payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idea => "IDEA",
            Self::Reflection => "REFLECTION",
            Self::Bill => "BILL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IDEA" => Some(Self::Idea),
            "REFLECTION" => Some(Self::Reflection),
            "BILL" => Some(Self::Bill),
            _ => None,
        }
    }
}

/// File or media reference captured alongside an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: String,
    pub uri: String,
}

/// Validation failures for capture payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum InboxValidationError {
    /// Identifier is the nil UUID.
    NilId,
    /// `amount` is NaN or infinite.
    InvalidAmount(f64),
}

impl Display for InboxValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "inbox item id must not be nil"),
            Self::InvalidAmount(value) => write!(f, "amount ({value}) must be a finite number"),
        }
    }
}

impl Error for InboxValidationError {}

/// Capture payload before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInboxItem {
    #[serde(rename = "type")]
    pub kind: InboxItemType,
    pub title: Option<String>,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub ai_label: Option<AiLabel>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub from: Option<String>,
    pub amount: Option<f64>,
    pub duration_seconds: Option<u32>,
}

impl NewInboxItem {
    /// Creates a bare capture of `kind` stamped with the current time.
    pub fn new(kind: InboxItemType, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: None,
            content: content.into(),
            created_at: now_epoch_ms(),
            ai_label: None,
            attachments: Vec::new(),
            from: None,
            amount: None,
            duration_seconds: None,
        }
    }

    /// Transcribed voice recording of `duration_seconds` length.
    pub fn voice(transcript: impl Into<String>, duration_seconds: u32) -> Self {
        let mut item = Self::new(InboxItemType::Voice, transcript);
        item.duration_seconds = Some(duration_seconds);
        item
    }

    /// Quick typed note.
    pub fn note(content: impl Into<String>) -> Self {
        Self::new(InboxItemType::Note, content)
    }

    /// Email imported from `from`; the subject becomes the item title.
    pub fn imported_email(
        from: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let mut item = Self::new(InboxItemType::ImportedEmail, body);
        item.from = Some(from.into());
        item.title = Some(subject.into());
        item
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_ai_label(mut self, label: AiLabel) -> Self {
        self.ai_label = Some(label);
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_attachment(mut self, kind: impl Into<String>, uri: impl Into<String>) -> Self {
        self.attachments.push(Attachment {
            kind: kind.into(),
            uri: uri.into(),
        });
        self
    }

    /// Overrides the capture timestamp (epoch milliseconds).
    pub fn created_at(mut self, epoch_ms: i64) -> Self {
        self.created_at = epoch_ms;
        self
    }

    /// Validates capture payload invariants.
    pub fn validate(&self) -> Result<(), InboxValidationError> {
        validate_amount(self.amount)
    }

    /// Attaches a freshly generated identifier.
    pub fn into_item(self) -> InboxItem {
        self.into_item_with_id(Uuid::new_v4())
    }

    /// Attaches a caller-provided identifier (restore/import paths).
    pub fn into_item_with_id(self, id: InboxItemId) -> InboxItem {
        InboxItem {
            id,
            kind: self.kind,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
            ai_label: self.ai_label,
            attachments: self.attachments,
            from: self.from,
            amount: self.amount,
            duration_seconds: self.duration_seconds,
        }
    }
}

/// Captured inbox record owned by the inbox store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxItem {
    pub id: InboxItemId,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: InboxItemType,
    pub title: Option<String>,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub ai_label: Option<AiLabel>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub from: Option<String>,
    pub amount: Option<f64>,
    pub duration_seconds: Option<u32>,
}

impl InboxItem {
    /// Validates stored-item invariants.
    pub fn validate(&self) -> Result<(), InboxValidationError> {
        if self.id.is_nil() {
            return Err(InboxValidationError::NilId);
        }
        validate_amount(self.amount)
    }
}

fn validate_amount(amount: Option<f64>) -> Result<(), InboxValidationError> {
    match amount {
        Some(amount) if !amount.is_finite() => Err(InboxValidationError::InvalidAmount(amount)),
        _ => Ok(()),
    }
}

/// Current wall-clock time as Unix epoch milliseconds.
///
/// Falls back to `0` if the clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
