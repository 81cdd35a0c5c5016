//! Inbox store contracts with in-memory and SQLite implementations.
//!
//! # Responsibility
//! - Own the ordered collection of captured inbox items.
//! - Keep SQL details inside the persistence adapter.
//!
//! # Invariants
//! - Listing is newest-first by insertion order, not by `created_at`.
//! - Removing an absent id is a no-op, never an error.
//! - Any finite capture is accepted; blank content and negative amounts are
//!   stored as given.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::inbox_item::{
    AiLabel, Attachment, InboxItem, InboxItemId, InboxItemType, InboxValidationError,
    NewInboxItem,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const INBOX_SELECT_SQL: &str = "SELECT
    id,
    type,
    title,
    content,
    created_at,
    ai_label,
    attachments,
    sender,
    amount,
    duration_seconds
FROM inbox_items";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for inbox persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(InboxValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted inbox data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<InboxValidationError> for RepoError {
    fn from(value: InboxValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ordered inbox item store.
pub trait InboxRepository {
    /// Assigns a fresh id and prepends the capture.
    fn add_item(&self, item: NewInboxItem) -> RepoResult<InboxItemId>;
    /// Removes the item with `id`; returns whether anything was removed.
    fn remove_item(&self, id: InboxItemId) -> RepoResult<bool>;
    fn get_item(&self, id: InboxItemId) -> RepoResult<Option<InboxItem>>;
    /// Snapshot of all items, newest first.
    fn list_items(&self) -> RepoResult<Vec<InboxItem>>;
    fn len(&self) -> RepoResult<usize>;

    fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<R: InboxRepository + ?Sized> InboxRepository for &R {
    fn add_item(&self, item: NewInboxItem) -> RepoResult<InboxItemId> {
        (**self).add_item(item)
    }

    fn remove_item(&self, id: InboxItemId) -> RepoResult<bool> {
        (**self).remove_item(id)
    }

    fn get_item(&self, id: InboxItemId) -> RepoResult<Option<InboxItem>> {
        (**self).get_item(id)
    }

    fn list_items(&self) -> RepoResult<Vec<InboxItem>> {
        (**self).list_items()
    }

    fn len(&self) -> RepoResult<usize> {
        (**self).len()
    }
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryInboxRepository {
    // Index 0 is the newest item.
    items: RefCell<Vec<InboxItem>>,
}

impl MemoryInboxRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InboxRepository for MemoryInboxRepository {
    fn add_item(&self, item: NewInboxItem) -> RepoResult<InboxItemId> {
        item.validate()?;
        let item = item.into_item();
        let id = item.id;
        self.items.borrow_mut().insert(0, item);
        Ok(id)
    }

    fn remove_item(&self, id: InboxItemId) -> RepoResult<bool> {
        let mut items = self.items.borrow_mut();
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() != before)
    }

    fn get_item(&self, id: InboxItemId) -> RepoResult<Option<InboxItem>> {
        Ok(self.items.borrow().iter().find(|item| item.id == id).cloned())
    }

    fn list_items(&self) -> RepoResult<Vec<InboxItem>> {
        Ok(self.items.borrow().clone())
    }

    fn len(&self) -> RepoResult<usize> {
        Ok(self.items.borrow().len())
    }
}

/// SQLite-backed store that survives process restarts.
pub struct SqliteInboxRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInboxRepository<'conn> {
    /// Wraps a connection whose schema is fully migrated.
    ///
    /// Use [`crate::db::open_db`] or [`crate::db::open_db_in_memory`] to get one.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let version = current_user_version(conn)?;
        if version < latest_version() {
            return Err(DbError::OutdatedSchemaVersion {
                db_version: version,
                required: latest_version(),
            }
            .into());
        }
        Ok(Self { conn })
    }
}

impl InboxRepository for SqliteInboxRepository<'_> {
    fn add_item(&self, item: NewInboxItem) -> RepoResult<InboxItemId> {
        item.validate()?;
        let item = item.into_item();
        let attachments = serde_json::to_string(&item.attachments).map_err(|err| {
            RepoError::InvalidData(format!("attachments are not serializable: {err}"))
        })?;

        self.conn.execute(
            "INSERT INTO inbox_items (
                id,
                type,
                title,
                content,
                created_at,
                ai_label,
                attachments,
                sender,
                amount,
                duration_seconds
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                item.id.to_string(),
                item.kind.as_str(),
                item.title.as_deref(),
                item.content.as_str(),
                item.created_at,
                item.ai_label.map(AiLabel::as_str),
                attachments,
                item.from.as_deref(),
                item.amount,
                item.duration_seconds,
            ],
        )?;

        debug!(
            "event=inbox_insert module=repo status=ok type={}",
            item.kind
        );
        Ok(item.id)
    }

    fn remove_item(&self, id: InboxItemId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM inbox_items WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn get_item(&self, id: InboxItemId) -> RepoResult<Option<InboxItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INBOX_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], read_raw_row)
            .optional()?;
        row.map(RawInboxRow::into_item).transpose()
    }

    fn list_items(&self) -> RepoResult<Vec<InboxItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INBOX_SELECT_SQL} ORDER BY seq DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(read_raw_row(row)?.into_item()?);
        }

        Ok(items)
    }

    fn len(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM inbox_items;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

struct RawInboxRow {
    id: String,
    kind: String,
    title: Option<String>,
    content: String,
    created_at: i64,
    ai_label: Option<String>,
    attachments: String,
    sender: Option<String>,
    amount: Option<f64>,
    duration_seconds: Option<u32>,
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawInboxRow> {
    Ok(RawInboxRow {
        id: row.get("id")?,
        kind: row.get("type")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        ai_label: row.get("ai_label")?,
        attachments: row.get("attachments")?,
        sender: row.get("sender")?,
        amount: row.get("amount")?,
        duration_seconds: row.get("duration_seconds")?,
    })
}

impl RawInboxRow {
    fn into_item(self) -> RepoResult<InboxItem> {
        let id = Uuid::parse_str(&self.id).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{}` in inbox_items.id", self.id))
        })?;
        let kind = InboxItemType::parse(&self.kind).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid item type `{}` in inbox_items.type",
                self.kind
            ))
        })?;
        let ai_label = match self.ai_label {
            Some(value) => Some(AiLabel::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid ai label `{value}` in inbox_items.ai_label"))
            })?),
            None => None,
        };
        let attachments: Vec<Attachment> =
            serde_json::from_str(&self.attachments).map_err(|err| {
                RepoError::InvalidData(format!("invalid inbox_items.attachments json: {err}"))
            })?;

        let item = InboxItem {
            id,
            kind,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
            ai_label,
            attachments,
            from: self.sender,
            amount: self.amount,
            duration_seconds: self.duration_seconds,
        };
        item.validate()?;
        Ok(item)
    }
}
