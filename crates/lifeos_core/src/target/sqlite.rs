//! Local SQLite conversion target.
//!
//! Records converted objects in `converted_items` when no remote backend is
//! wired in (offline mode, CLI smoke runs).

use super::{ConversionPayload, ConversionTarget, TargetError, TargetKind, TargetRef};
use crate::model::inbox_item::{now_epoch_ms, InboxItemId};
use crate::repo::inbox_repo::{RepoError, RepoResult};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Object recorded by [`SqliteConversionTarget`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRecord {
    pub id: Uuid,
    pub kind: TargetKind,
    pub source_item_id: InboxItemId,
    pub title: String,
    pub body: String,
    pub amount: Option<f64>,
    pub counterparty: Option<String>,
    pub created_at: i64,
}

pub struct SqliteConversionTarget<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConversionTarget<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lists recorded objects of `kind`, newest first.
    pub fn list_converted(&self, kind: Option<TargetKind>) -> RepoResult<Vec<ConvertedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, source_item_id, title, body, amount, counterparty, created_at
             FROM converted_items
             WHERE (?1 IS NULL OR kind = ?1)
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([kind.map(TargetKind::as_str)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_converted_row(row)?);
        }
        Ok(records)
    }
}

impl ConversionTarget for SqliteConversionTarget<'_> {
    fn create(&self, payload: &ConversionPayload) -> Result<TargetRef, TargetError> {
        let id = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO converted_items (
                id,
                kind,
                source_item_id,
                title,
                body,
                amount,
                counterparty,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                payload.kind.as_str(),
                payload.source_item_id.to_string(),
                payload.title.as_str(),
                payload.body.as_str(),
                payload.amount,
                payload.counterparty.as_deref(),
                now_epoch_ms(),
            ],
        );

        match inserted {
            Ok(_) => {
                info!(
                    "event=target_create module=target status=ok kind={}",
                    payload.kind.as_str()
                );
                Ok(TargetRef {
                    kind: payload.kind,
                    id: id.to_string(),
                })
            }
            Err(err) => {
                error!(
                    "event=target_create module=target status=error kind={} error={err}",
                    payload.kind.as_str()
                );
                Err(TargetError::Storage(err.to_string()))
            }
        }
    }
}

fn parse_converted_row(row: &Row<'_>) -> RepoResult<ConvertedRecord> {
    let parse_uuid = |column: &str, value: String| {
        Uuid::parse_str(&value).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid uuid value `{value}` in converted_items.{column}"
            ))
        })
    };

    let kind_text: String = row.get("kind")?;
    let kind = TargetKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in converted_items.kind"))
    })?;

    Ok(ConvertedRecord {
        id: parse_uuid("id", row.get("id")?)?,
        kind,
        source_item_id: parse_uuid("source_item_id", row.get("source_item_id")?)?,
        title: row.get("title")?,
        body: row.get("body")?,
        amount: row.get("amount")?,
        counterparty: row.get("counterparty")?,
        created_at: row.get("created_at")?,
    })
}
