//! Core inbox triage logic for LifeOS.
//! This crate is the single source of truth for inbox capture and conversion
//! invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod present;
pub mod repo;
pub mod service;
pub mod suggest;
pub mod target;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::action::{
    actions_for, actions_for_type_name, is_action_available, ConversionKind, InboxAction,
};
pub use model::inbox_item::{
    now_epoch_ms, AiLabel, Attachment, InboxItem, InboxItemId, InboxItemType,
    InboxValidationError, NewInboxItem,
};
pub use model::tab::{filter_items, tab_counts, InboxTab, TabCounts};
pub use present::{format_relative_time, present_item, ItemView};
pub use repo::inbox_repo::{
    InboxRepository, MemoryInboxRepository, RepoError, RepoResult, SqliteInboxRepository,
};
pub use service::inbox_service::{
    ConversionError, ConversionOutcome, InFlightConversions, InboxService, PendingConversion,
};
pub use suggest::{recommended_action, KeywordLabelSuggester, LabelSuggester, NoLabelSuggester};
pub use target::{
    ConversionPayload, ConversionTarget, ConvertedRecord, SqliteConversionTarget, TargetError,
    TargetKind, TargetRef,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
