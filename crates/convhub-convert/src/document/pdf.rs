//! PDF text extraction and plain-text PDF rendering via `lopdf`.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// A4 page width in points.
pub const A4_WIDTH: f32 = 595.0;
/// A4 page height in points.
pub const A4_HEIGHT: f32 = 842.0;

const FONT_NAME: &str = "F1";
const BASE_FONT: &str = "Times-Roman";
const LINE_SPACING: f32 = 1.2;
const TAB_WIDTH: usize = 4;

/// Extract plain text from every page, in page order.
pub fn extract_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let doc = Document::load_mem(bytes)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }
    doc.extract_text(&pages)
}

/// Renders UTF-8 text onto A4 pages in a built-in serif font.
#[derive(Debug, Clone)]
pub struct PdfTextRenderer {
    font_size: f32,
    margin: f32,
}

impl Default for PdfTextRenderer {
    fn default() -> Self {
        Self::new(12.0, 50.0)
    }
}

impl PdfTextRenderer {
    /// Create a renderer with the given font size and page margin (points).
    pub fn new(font_size: f32, margin: f32) -> Self {
        Self { font_size, margin }
    }

    fn line_height(&self) -> f32 {
        self.font_size * LINE_SPACING
    }

    fn lines_per_page(&self) -> usize {
        let usable = A4_HEIGHT - 2.0 * self.margin;
        ((usable / self.line_height()).floor() as usize).max(1)
    }

    fn max_line_width(&self) -> f32 {
        (A4_WIDTH - 2.0 * self.margin).max(self.font_size)
    }

    /// Render text left-aligned with word wrapping and automatic pagination.
    pub fn render(&self, text: &str) -> Result<Vec<u8>, lopdf::Error> {
        let lines = self.layout(text);
        let pages: Vec<&[String]> = if lines.is_empty() {
            vec![&[]]
        } else {
            lines.chunks(self.lines_per_page()).collect()
        };

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => BASE_FONT,
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_NAME => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page_lines in pages {
            let content = self.page_content(page_lines);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), A4_WIDTH.into(), A4_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        Ok(out)
    }

    fn page_content(&self, lines: &[String]) -> Content {
        let mut operations = Vec::with_capacity(lines.len() * 5);
        let mut y = A4_HEIGHT - self.margin - self.font_size;
        for line in lines {
            if !line.is_empty() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![FONT_NAME.into(), self.font_size.into()],
                ));
                operations.push(Operation::new("Td", vec![self.margin.into(), y.into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(line))],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            y -= self.line_height();
        }
        Content { operations }
    }

    /// Split text into rendered lines, wrapping at word boundaries.
    fn layout(&self, text: &str) -> Vec<String> {
        let max_width = self.max_line_width();
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut lines = Vec::new();

        for raw in normalized.split('\n') {
            let raw = raw.replace('\t', &" ".repeat(TAB_WIDTH));
            if raw.trim().is_empty() {
                lines.push(String::new());
                continue;
            }

            let mut current = String::new();
            for word in raw.split(' ') {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{current} {word}")
                };

                if self.text_width(&candidate) <= max_width {
                    current = candidate;
                    continue;
                }

                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }

                // A single word wider than the line is broken by characters.
                for c in word.chars() {
                    let mut next = current.clone();
                    next.push(c);
                    if !current.is_empty() && self.text_width(&next) > max_width {
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    } else {
                        current = next;
                    }
                }
            }
            lines.push(current);
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars().map(glyph_width).sum::<f32>() * self.font_size
    }
}

/// Approximate Times-Roman advance width in em units.
fn glyph_width(c: char) -> f32 {
    match c {
        ' ' => 0.25,
        'i' | 'j' | 'l' | 't' | 'f' | 'r' | 'I' => 0.3,
        '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
        'm' | 'M' | 'W' => 0.9,
        'w' => 0.72,
        'A'..='Z' => 0.68,
        'a'..='z' => 0.48,
        '0'..='9' => 0.5,
        _ => 0.55,
    }
}

/// Encode text for a WinAnsiEncoding font; unmappable characters become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_pdf() {
        let bytes = PdfTextRenderer::default().render("Hello\nWorld").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_render_then_extract() {
        let bytes = PdfTextRenderer::default()
            .render("Quarterly report\nRevenue grew")
            .unwrap();
        let text = extract_text(&bytes).unwrap();
        assert!(text.contains("Quarterly report"), "extracted: {text:?}");
        assert!(text.contains("Revenue grew"), "extracted: {text:?}");
    }

    #[test]
    fn test_long_text_paginates() {
        let renderer = PdfTextRenderer::default();
        let text = (0..200).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let bytes = renderer.render(&text).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let expected = 200_usize.div_ceil(renderer.lines_per_page());
        assert_eq!(doc.get_pages().len(), expected);
        assert!(expected > 1);
    }

    #[test]
    fn test_empty_text_yields_single_page() {
        let bytes = PdfTextRenderer::default().render("").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_wraps_long_lines() {
        let renderer = PdfTextRenderer::default();
        let text = "word ".repeat(200);
        let lines = renderer.layout(&text);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(renderer.text_width(line) <= renderer.max_line_width());
        }
    }

    #[test]
    fn test_breaks_unbreakable_word() {
        let renderer = PdfTextRenderer::default();
        let lines = renderer.layout(&"x".repeat(500));
        assert!(lines.len() > 1);
        assert_eq!(lines.concat().len(), 500);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("A€é"), vec![b'A', 0x80, 0xe9]);
        assert_eq!(encode_win_ansi("中"), vec![b'?']);
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract_text(b"not a pdf").is_err());
    }
}
