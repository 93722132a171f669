//! # convhub-core
//!
//! Core crate for ConvHub. Contains configuration schemas, the file format
//! model with its static capability table, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ConvHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
pub use types::format::{CapabilityTable, Format, FormatFamily};
