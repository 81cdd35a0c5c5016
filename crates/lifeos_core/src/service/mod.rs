//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and target calls into inbox triage APIs.
//! - Keep UI/FFI layers decoupled from storage and transport details.

pub mod inbox_service;
