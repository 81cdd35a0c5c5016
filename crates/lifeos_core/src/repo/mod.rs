//! Inbox store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the ordered item store contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Store writes validate captures before persistence.

pub mod inbox_repo;
