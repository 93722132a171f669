//! Shared domain types.

pub mod format;
