//! Document format readers and writers.

pub mod docx;
pub mod html;
pub mod pdf;

pub use docx::DocxError;
pub use pdf::PdfTextRenderer;
