//! Document conversion as `extract(source) -> Ir` followed by
//! `render(Ir, target)`.
//!
//! Every cross-format path funnels through plain text or HTML; there are
//! only two real writers (PDF and DOCX) plus the HTML template.

use convhub_core::config::ConversionConfig;
use convhub_core::types::format::{CapabilityTable, Format, FormatFamily};

use crate::document::{PdfTextRenderer, docx, html, pdf};
use crate::error::ConversionError;

/// Intermediate representation between extraction and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ir {
    /// Unformatted text, one line per paragraph.
    PlainText(String),
    /// An HTML document or fragment.
    Html(String),
}

impl Ir {
    /// Flatten to plain text, stripping markup from HTML.
    pub fn into_text(self) -> String {
        match self {
            Self::PlainText(text) => text,
            Self::Html(markup) => html::html_to_text(&markup),
        }
    }
}

/// Converts between pdf, txt, docx, and html.
#[derive(Debug, Clone, Default)]
pub struct DocumentConverter {
    pdf: PdfTextRenderer,
}

impl DocumentConverter {
    /// Create a converter using the configured PDF layout.
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            pdf: PdfTextRenderer::new(config.pdf_font_size, config.pdf_margin),
        }
    }

    /// Convert `bytes` from `source` to `target`.
    ///
    /// Any codec failure is reported as a conversion error carrying the
    /// format pair; no partial output is ever returned.
    pub fn convert(
        &self,
        source: Format,
        target: Format,
        bytes: &[u8],
    ) -> Result<Vec<u8>, ConversionError> {
        if source.family() != FormatFamily::Document || !CapabilityTable::supports(source, target)
        {
            return Err(ConversionError::Unsupported {
                source_format: source,
                target,
            });
        }

        let ir = self.extract(source, target, bytes)?;
        self.render(ir, source, target)
    }

    /// Read a source document into the representation its target needs.
    pub fn extract(
        &self,
        source: Format,
        target: Format,
        bytes: &[u8],
    ) -> Result<Ir, ConversionError> {
        let fail = |e: String| ConversionError::document(source, target, e);

        let ir = match source {
            Format::Pdf => Ir::PlainText(pdf::extract_text(bytes).map_err(|e| fail(e.to_string()))?),
            Format::Txt => Ir::PlainText(String::from_utf8_lossy(bytes).into_owned()),
            Format::Docx if target == Format::Html => {
                Ir::Html(docx::to_html(bytes).map_err(|e| fail(e.to_string()))?)
            }
            Format::Docx => Ir::PlainText(docx::extract_raw_text(bytes).map_err(|e| fail(e.to_string()))?),
            Format::Html => Ir::Html(String::from_utf8_lossy(bytes).into_owned()),
            _ => {
                return Err(ConversionError::Unsupported {
                    source_format: source,
                    target,
                });
            }
        };
        Ok(ir)
    }

    /// Render an intermediate representation into `target`.
    pub fn render(&self, ir: Ir, source: Format, target: Format) -> Result<Vec<u8>, ConversionError> {
        let fail = |e: String| ConversionError::document(source, target, e);

        match target {
            Format::Txt => Ok(ir.into_text().into_bytes()),
            Format::Html => Ok(match ir {
                Ir::PlainText(text) => html::text_to_html(&text).into_bytes(),
                Ir::Html(markup) => markup.into_bytes(),
            }),
            Format::Pdf => self.pdf.render(&ir.into_text()).map_err(|e| fail(e.to_string())),
            Format::Docx => match ir {
                // Uploaded text keeps its line layout in one paragraph and is
                // never entity-decoded.
                Ir::PlainText(text) if source == Format::Txt => docx::single_paragraph(&text),
                Ir::PlainText(text) => docx::paragraphs_from_lines(&text),
                Ir::Html(markup) => docx::single_paragraph(&html::html_to_text(&markup)),
            }
            .map_err(|e| fail(e.to_string())),
            _ => Err(ConversionError::Unsupported {
                source_format: source,
                target,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: [Format; 4] = [Format::Pdf, Format::Txt, Format::Docx, Format::Html];

    fn sample(converter: &DocumentConverter, format: Format) -> Vec<u8> {
        let text = "Hello\nWorld";
        match format {
            Format::Txt => text.as_bytes().to_vec(),
            Format::Html => b"<html><body><h1>Hello</h1><p>World &amp; more</p></body></html>".to_vec(),
            Format::Pdf => converter.pdf.render(text).unwrap(),
            Format::Docx => docx::paragraphs_from_lines(text).unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_every_supported_pair_produces_output() {
        let converter = DocumentConverter::default();
        for source in DOCS {
            for target in CapabilityTable::targets(source) {
                let input = sample(&converter, source);
                let out = converter.convert(source, *target, &input).unwrap();
                assert!(!out.is_empty(), "{source} -> {target}");
            }
        }
    }

    #[test]
    fn test_txt_to_html_scenario() {
        let converter = DocumentConverter::default();
        let out = converter
            .convert(Format::Txt, Format::Html, b"Hello\nWorld")
            .unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.contains("<pre>Hello\nWorld</pre>"));
        assert!(html.contains("<html>"));
    }

    #[test]
    fn test_html_to_txt_strips_tags() {
        let converter = DocumentConverter::default();
        let out = converter
            .convert(Format::Html, Format::Txt, b"<p>a &lt;b&gt;</p><br/>c")
            .unwrap();
        assert_eq!(out, b"a <b>c");
    }

    #[test]
    fn test_pdf_to_docx_one_paragraph_per_line() {
        let converter = DocumentConverter::default();
        let ir = Ir::PlainText("one\n\n  two  \n".into());
        let out = converter.render(ir, Format::Pdf, Format::Docx).unwrap();
        assert_eq!(docx::extract_raw_text(&out).unwrap(), "one\ntwo");
    }

    #[test]
    fn test_txt_to_docx_terminates_in_single_paragraph() {
        let converter = DocumentConverter::default();
        let out = converter
            .convert(Format::Txt, Format::Docx, b"x < y\nsecond")
            .unwrap();
        assert_eq!(docx::extract_raw_text(&out).unwrap(), "x < y\nsecond");
    }

    #[test]
    fn test_txt_to_docx_keeps_literal_entities() {
        let converter = DocumentConverter::default();
        let input = "say &quot;hi&quot; &#39;x&#39; &amp; &lt;b&gt;";
        let out = converter
            .convert(Format::Txt, Format::Docx, input.as_bytes())
            .unwrap();
        assert_eq!(docx::extract_raw_text(&out).unwrap(), input);
    }

    #[test]
    fn test_docx_to_html_keeps_structure() {
        let converter = DocumentConverter::default();
        let input = docx::paragraphs_from_lines("alpha\nbeta").unwrap();
        let out = converter.convert(Format::Docx, Format::Html, &input).unwrap();
        assert_eq!(out, b"<p>alpha</p><p>beta</p>");
    }

    #[test]
    fn test_unsupported_pairs_rejected() {
        let converter = DocumentConverter::default();
        let err = converter.convert(Format::Txt, Format::Txt, b"x").unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { .. }));
        let err = converter.convert(Format::Png, Format::Pdf, b"x").unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { .. }));
    }

    #[test]
    fn test_corrupt_input_is_document_error() {
        let converter = DocumentConverter::default();
        let err = converter.convert(Format::Pdf, Format::Txt, b"garbage").unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Document {
                source_format: Format::Pdf,
                target: Format::Txt,
                ..
            }
        ));
        let err = converter.convert(Format::Docx, Format::Html, b"garbage").unwrap_err();
        assert!(matches!(err, ConversionError::Document { .. }));
    }
}
