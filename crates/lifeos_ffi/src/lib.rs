//! Flutter-facing FFI surface for LifeOS core.

pub mod api;
