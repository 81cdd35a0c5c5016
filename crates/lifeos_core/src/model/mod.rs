//! Inbox domain model.
//!
//! # Responsibility
//! - Define capture records, triage actions and view-tab selection.
//!
//! # Invariants
//! - Every inbox item is identified by a stable `InboxItemId`.
//! - Item type never changes after capture.

pub mod action;
pub mod inbox_item;
pub mod tab;
