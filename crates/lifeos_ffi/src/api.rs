//! FFI use-case API for the inbox screen.
//!
//! # Responsibility
//! - Expose inbox capture, listing and triage calls to Dart via FRB.
//! - Translate core errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Duplicate conversion submissions are rejected process-wide.
//! - Item ids cross the boundary as UUID strings.

use lifeos_core::db::open_db;
use lifeos_core::{
    actions_for_type_name, core_version as core_version_inner, init_logging as init_logging_inner,
    now_epoch_ms, ping as ping_inner, ConversionError, ConversionKind, ConversionOutcome,
    InFlightConversions, InboxItemId, InboxService, InboxTab, ItemView, KeywordLabelSuggester,
    NewInboxItem, SqliteConversionTarget, SqliteInboxRepository,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const INBOX_DB_FILE_NAME: &str = "lifeos_inbox.sqlite3";
static INBOX_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static IN_FLIGHT: OnceLock<InFlightConversions> = OnceLock::new();

type LocalInboxService<'conn> =
    InboxService<SqliteInboxRepository<'conn>, SqliteConversionTarget<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One inbox row as rendered by the list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct InboxRow {
    pub item_id: String,
    /// `voice|note|imported_email`.
    pub item_type: String,
    pub type_label: String,
    pub title: String,
    pub content: String,
    pub relative_time: String,
    pub badge: Option<String>,
    pub sender: Option<String>,
    pub amount: Option<String>,
    pub duration: Option<String>,
    pub attachment_count: u32,
    /// Action button labels in display order.
    pub actions: Vec<String>,
    /// True while a conversion of this item is outstanding.
    pub converting: bool,
}

/// List response envelope for one tab.
#[derive(Debug, Clone, PartialEq)]
pub struct InboxListResponse {
    pub ok: bool,
    pub items: Vec<InboxRow>,
    pub message: String,
}

/// Tab badge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InboxTabCounts {
    pub all: u32,
    pub voice: u32,
    pub notes: u32,
}

/// Generic action response envelope for capture and triage calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Captured item id, or created target id after a conversion (also set
    /// when the target was created but the item could not be removed).
    pub id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl InboxActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Captures a quick typed note.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_capture_note(content: String) -> InboxActionResponse {
    capture(NewInboxItem::note(content.trim()), "inbox_capture_note")
}

/// Captures a transcribed voice recording.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_capture_voice(transcript: String, duration_seconds: u32) -> InboxActionResponse {
    capture(
        NewInboxItem::voice(transcript.trim(), duration_seconds),
        "inbox_capture_voice",
    )
}

/// Imports an email; `amount` is the billed amount when the sender reported one.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_import_email(
    from: String,
    subject: String,
    body: String,
    amount: Option<f64>,
) -> InboxActionResponse {
    let mut item = NewInboxItem::imported_email(from.trim(), subject.trim(), body);
    item.amount = amount;
    capture(item, "inbox_import_email")
}

/// Lists rows for `tab` (`all|voice|notes`), newest first.
///
/// `now_ms` overrides the clock used for relative times.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_list(tab: String, now_ms: Option<i64>) -> InboxListResponse {
    let Some(tab) = InboxTab::parse(&tab) else {
        return InboxListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("inbox_list failed: unknown tab `{}`", tab.trim()),
        };
    };
    let now_ms = now_ms.unwrap_or_else(now_epoch_ms);

    let listed = with_inbox_service(|service| {
        let views = service.present(tab, now_ms).map_err(|err| err.to_string())?;
        Ok(views
            .into_iter()
            .map(|view| {
                let converting = service.is_converting(view.id);
                to_inbox_row(view, converting)
            })
            .collect::<Vec<_>>())
    });

    match listed {
        Ok(items) => {
            let message = if items.is_empty() {
                "Inbox zero.".to_string()
            } else {
                format!("{} item(s).", items.len())
            };
            InboxListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => InboxListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("inbox_list failed: {err}"),
        },
    }
}

/// Tab badge counts for the inbox header.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_tab_counts() -> InboxTabCounts {
    let counts = with_inbox_service(|service| service.tab_counts().map_err(|err| err.to_string()));
    match counts {
        Ok(counts) => InboxTabCounts {
            all: saturating_u32(counts.all),
            voice: saturating_u32(counts.voice),
            notes: saturating_u32(counts.notes),
        },
        Err(err) => {
            warn!("event=inbox_tab_counts module=ffi status=error error={err}");
            InboxTabCounts::default()
        }
    }
}

/// Action labels for an item type; empty for unknown types.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_actions(item_type: String) -> Vec<String> {
    actions_for_type_name(&item_type)
        .iter()
        .map(|action| action.label.to_string())
        .collect()
}

/// Runs a triage action picked by the user.
///
/// # FFI contract
/// - Async call on the FRB worker pool; Dart awaits the result.
/// - A second submission for the same item while the first is running
///   returns `ok=false`.
/// - The item stays in the inbox when creation fails.
/// - Unknown item ids succeed as a no-op.
pub fn inbox_convert(item_id: String, action: String) -> InboxActionResponse {
    let Some(conversion) = ConversionKind::parse(&action) else {
        return InboxActionResponse::failure(format!(
            "inbox_convert failed: unknown action `{}`",
            action.trim()
        ));
    };
    let id = match parse_item_id(&item_id) {
        Ok(id) => id,
        Err(err) => return InboxActionResponse::failure(format!("inbox_convert failed: {err}")),
    };

    match with_inbox_service(|service| Ok(service.convert(id, conversion))) {
        Ok(Ok(outcome)) => outcome_response(outcome),
        Ok(Err(ConversionError::RemoveAfterCreate { target, source })) => {
            warn!("event=inbox_convert module=ffi status=error stage=remove error={source}");
            InboxActionResponse {
                ok: false,
                id: Some(target.id),
                message: format!(
                    "inbox_convert failed: created {} but the item stayed in the inbox: {source}",
                    target.kind.as_str()
                ),
            }
        }
        Ok(Err(err)) => InboxActionResponse::failure(format!("inbox_convert failed: {err}")),
        Err(err) => InboxActionResponse::failure(format!("inbox_convert failed: {err}")),
    }
}

/// Marks an item as reviewed while leaving it in the inbox.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_keep_as_note(item_id: String) -> InboxActionResponse {
    let id = match parse_item_id(&item_id) {
        Ok(id) => id,
        Err(err) => {
            return InboxActionResponse::failure(format!("inbox_keep_as_note failed: {err}"))
        }
    };
    match with_inbox_service(|service| service.keep_as_note(id).map_err(|err| err.to_string())) {
        Ok(outcome) => outcome_response(outcome),
        Err(err) => InboxActionResponse::failure(format!("inbox_keep_as_note failed: {err}")),
    }
}

fn capture(item: NewInboxItem, operation: &str) -> InboxActionResponse {
    match with_inbox_service(|service| service.add_item(item).map_err(|err| err.to_string())) {
        Ok(id) => InboxActionResponse::success("Captured.", Some(id.to_string())),
        Err(err) => InboxActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn outcome_response(outcome: ConversionOutcome) -> InboxActionResponse {
    match outcome {
        ConversionOutcome::Converted(target) => InboxActionResponse::success(
            format!("Converted to {}.", target.kind.as_str()),
            Some(target.id),
        ),
        ConversionOutcome::Kept => InboxActionResponse::success("Kept as note.", None),
        ConversionOutcome::Missing => InboxActionResponse::success("Item already handled.", None),
    }
}

fn parse_item_id(raw: &str) -> Result<InboxItemId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid item id `{}`", raw.trim()))
}

fn resolve_inbox_db_path() -> PathBuf {
    INBOX_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("LIFEOS_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(INBOX_DB_FILE_NAME)
        })
        .clone()
}

fn with_inbox_service<T>(
    f: impl FnOnce(&LocalInboxService<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_inbox_db_path())
        .map_err(|err| format!("inbox DB open failed: {err}"))?;
    let repo = SqliteInboxRepository::try_new(&conn)
        .map_err(|err| format!("inbox repo init failed: {err}"))?;
    let service = InboxService::new(repo, SqliteConversionTarget::new(&conn))
        .with_in_flight(IN_FLIGHT.get_or_init(InFlightConversions::new).clone())
        .with_suggester(KeywordLabelSuggester);
    f(&service)
}

fn to_inbox_row(view: ItemView, converting: bool) -> InboxRow {
    InboxRow {
        item_id: view.id.to_string(),
        item_type: view.kind.as_str().to_string(),
        type_label: view.type_label.to_string(),
        title: view.title,
        content: view.content,
        relative_time: view.relative_time,
        badge: view.badge.map(str::to_string),
        sender: view.sender,
        amount: view.amount,
        duration: view.duration,
        attachment_count: saturating_u32(view.attachment_count),
        actions: view
            .actions
            .iter()
            .map(|action| action.label.to_string())
            .collect(),
        converting,
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
