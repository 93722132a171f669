//! Request parsing helpers.

pub mod upload;

pub use upload::{FileFilter, UploadForm, UploadPolicy};
