//! DOCX reading (raw text and structural HTML) and minimal DOCX writing.
//!
//! A DOCX file is a ZIP package; only `word/document.xml` and, for list
//! detection, `word/numbering.xml` are read. Written packages contain the
//! three parts Word needs to open a document.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use quick_xml::escape::escape;
use roxmltree::Node;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::html::escape_text;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";
const NUMBERING_PART: &str = "word/numbering.xml";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Errors raised while reading or writing DOCX packages.
#[derive(Debug, Error)]
pub enum DocxError {
    /// The bytes are not a readable ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML.
    #[error("XML error in {part}: {source}")]
    Xml {
        /// Part name.
        part: &'static str,
        /// Parser error.
        #[source]
        source: roxmltree::Error,
    },

    /// A required part is absent.
    #[error("Missing package part: {0}")]
    MissingPart(&'static str),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Build a DOCX with one paragraph per non-blank line, trimmed.
pub fn paragraphs_from_lines(text: &str) -> Result<Vec<u8>, DocxError> {
    let paragraphs: Vec<Vec<&str>> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| vec![l])
        .collect();
    write_document(&paragraphs)
}

/// Build a DOCX with the whole text in a single paragraph; line breaks
/// inside the text become soft breaks.
pub fn single_paragraph(text: &str) -> Result<Vec<u8>, DocxError> {
    let lines: Vec<&str> = text.lines().collect();
    write_document(&[lines])
}

/// Write a package where each entry is a paragraph and each inner string
/// is a line separated by `<w:br/>`.
pub fn write_document<S: AsRef<str>>(paragraphs: &[Vec<S>]) -> Result<Vec<u8>, DocxError> {
    let mut body = String::new();
    for lines in paragraphs {
        body.push_str("<w:p>");
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                body.push_str("<w:r><w:br/></w:r>");
            }
            push_run(&mut body, line.as_ref());
        }
        body.push_str("</w:p>");
    }

    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440"/></w:sectPr></w:body></w:document>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELS_XML.as_bytes())?;
    zip.start_file(DOCUMENT_PART, options)?;
    zip.write_all(document.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn push_run(body: &mut String, line: &str) {
    let clean: String = line
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect();
    if clean.is_empty() {
        return;
    }
    body.push_str("<w:r>");
    for (i, segment) in clean.split('\t').enumerate() {
        if i > 0 {
            body.push_str("<w:tab/>");
        }
        if !segment.is_empty() {
            body.push_str(r#"<w:t xml:space="preserve">"#);
            body.push_str(&escape(segment));
            body.push_str("</w:t>");
        }
    }
    body.push_str("</w:r>");
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &'static str,
) -> Result<Option<String>, DocxError> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

fn parse<'a>(part: &'static str, xml: &'a str) -> Result<roxmltree::Document<'a>, DocxError> {
    roxmltree::Document::parse(xml).map_err(|source| DocxError::Xml { part, source })
}

fn is_w(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(W_NS)
}

fn w_child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_w(c, name))
}

fn w_val<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.attribute((W_NS, "val"))
}

fn body<'a, 'input>(doc: &'a roxmltree::Document<'input>) -> Result<Node<'a, 'input>, DocxError> {
    w_child(&doc.root_element(), "body").ok_or(DocxError::MissingPart("w:body"))
}

/// Extract raw text: one line per paragraph, no style markers.
pub fn extract_raw_text(bytes: &[u8]) -> Result<String, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?.ok_or(DocxError::MissingPart(DOCUMENT_PART))?;
    let doc = parse(DOCUMENT_PART, &xml)?;

    let lines: Vec<String> = body(&doc)?
        .descendants()
        .filter(|n| is_w(n, "p"))
        .map(|p| paragraph_text(&p))
        .collect();

    Ok(lines.join("\n"))
}

fn paragraph_text(p: &Node<'_, '_>) -> String {
    let mut text = String::new();
    for node in p.descendants() {
        if is_w(&node, "t") {
            text.push_str(node.text().unwrap_or_default());
        } else if is_w(&node, "tab") && node.parent().is_some_and(|n| is_w(&n, "r")) {
            text.push('\t');
        } else if is_w(&node, "br") || is_w(&node, "cr") {
            text.push('\n');
        }
    }
    text
}

/// Whether list level `(numId, ilvl)` is numbered rather than bulleted.
#[derive(Debug, Default)]
struct Numbering {
    ordered: HashMap<(String, u32), bool>,
}

impl Numbering {
    fn parse(xml: &str) -> Result<Self, DocxError> {
        let doc = parse(NUMBERING_PART, xml)?;
        let root = doc.root_element();

        let mut abstract_formats: HashMap<&str, HashMap<u32, bool>> = HashMap::new();
        for abs in root.children().filter(|n| is_w(n, "abstractNum")) {
            let Some(id) = abs.attribute((W_NS, "abstractNumId")) else {
                continue;
            };
            let levels = abs
                .children()
                .filter(|n| is_w(n, "lvl"))
                .filter_map(|lvl| {
                    let ilvl = lvl.attribute((W_NS, "ilvl"))?.parse::<u32>().ok()?;
                    let fmt = w_child(&lvl, "numFmt").and_then(|f| w_val(&f)).unwrap_or("bullet");
                    Some((ilvl, !matches!(fmt, "bullet" | "none")))
                })
                .collect();
            abstract_formats.insert(id, levels);
        }

        let mut ordered = HashMap::new();
        for num in root.children().filter(|n| is_w(n, "num")) {
            let Some(num_id) = num.attribute((W_NS, "numId")) else {
                continue;
            };
            let Some(abs_id) = w_child(&num, "abstractNumId").and_then(|a| w_val(&a)) else {
                continue;
            };
            if let Some(levels) = abstract_formats.get(abs_id) {
                for (&ilvl, &is_ordered) in levels {
                    ordered.insert((num_id.to_string(), ilvl), is_ordered);
                }
            }
        }

        Ok(Self { ordered })
    }

    fn is_ordered(&self, num_id: &str, ilvl: u32) -> bool {
        self.ordered
            .get(&(num_id.to_string(), ilvl))
            .copied()
            .unwrap_or(false)
    }
}

/// Convert a DOCX to an HTML fragment preserving headings, lists,
/// bold/italic/underline, line breaks, and tables.
pub fn to_html(bytes: &[u8]) -> Result<String, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?.ok_or(DocxError::MissingPart(DOCUMENT_PART))?;
    let numbering = match read_part(&mut archive, NUMBERING_PART)? {
        Some(xml) => Numbering::parse(&xml)?,
        None => Numbering::default(),
    };
    let doc = parse(DOCUMENT_PART, &xml)?;

    let mut html = HtmlBuilder::new(&numbering);
    for block in body(&doc)?.children().filter(Node::is_element) {
        html.block(&block);
    }
    Ok(html.finish())
}

struct HtmlBuilder<'n> {
    out: String,
    numbering: &'n Numbering,
    /// Open lists as `(level, tag)`; each has an open `<li>`.
    lists: Vec<(u32, &'static str)>,
}

impl<'n> HtmlBuilder<'n> {
    fn new(numbering: &'n Numbering) -> Self {
        Self {
            out: String::new(),
            numbering,
            lists: Vec::new(),
        }
    }

    fn finish(mut self) -> String {
        self.close_lists_above(None);
        self.out
    }

    fn block(&mut self, node: &Node<'_, '_>) {
        if is_w(node, "p") {
            self.paragraph(node);
        } else if is_w(node, "tbl") {
            self.close_lists_above(None);
            self.table(node);
        }
    }

    fn paragraph(&mut self, p: &Node<'_, '_>) {
        let inline = inline_html(p);
        let props = w_child(p, "pPr");

        if let Some((num_id, ilvl)) = props.as_ref().and_then(list_info) {
            if inline.is_empty() {
                return;
            }
            let tag = if self.numbering.is_ordered(&num_id, ilvl) {
                "ol"
            } else {
                "ul"
            };
            self.list_item(ilvl, tag, &inline);
            return;
        }

        self.close_lists_above(None);
        if inline.is_empty() {
            return;
        }

        let tag = props
            .as_ref()
            .and_then(|pp| w_child(pp, "pStyle"))
            .and_then(|s| w_val(&s))
            .and_then(heading_level)
            .map(|n| format!("h{n}"))
            .unwrap_or_else(|| "p".to_string());

        self.out.push_str(&format!("<{tag}>{inline}</{tag}>"));
    }

    fn list_item(&mut self, level: u32, tag: &'static str, inline: &str) {
        self.close_lists_above(Some(level));

        if let Some(&(top_level, top_tag)) = self.lists.last() {
            if top_level == level {
                if top_tag == tag {
                    self.out.push_str("</li><li>");
                    self.out.push_str(inline);
                    return;
                }
                self.out.push_str(&format!("</li></{top_tag}>"));
                self.lists.pop();
            }
        }

        self.out.push_str(&format!("<{tag}><li>"));
        self.out.push_str(inline);
        self.lists.push((level, tag));
    }

    /// Close lists deeper than `level`, or all of them for `None`.
    fn close_lists_above(&mut self, level: Option<u32>) {
        while let Some(&(top_level, tag)) = self.lists.last() {
            if level.is_some_and(|l| top_level <= l) {
                break;
            }
            self.out.push_str(&format!("</li></{tag}>"));
            self.lists.pop();
        }
    }

    fn table(&mut self, tbl: &Node<'_, '_>) {
        self.out.push_str("<table>");
        for row in tbl.children().filter(|n| is_w(n, "tr")) {
            self.out.push_str("<tr>");
            for cell in row.children().filter(|n| is_w(n, "tc")) {
                self.out.push_str("<td>");
                for p in cell.children().filter(|n| is_w(n, "p")) {
                    let inline = inline_html(&p);
                    if !inline.is_empty() {
                        self.out.push_str(&format!("<p>{inline}</p>"));
                    }
                }
                self.out.push_str("</td>");
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</table>");
    }
}

fn list_info(ppr: &Node<'_, '_>) -> Option<(String, u32)> {
    let num_pr = w_child(ppr, "numPr")?;
    let num_id = w_child(&num_pr, "numId").and_then(|n| w_val(&n))?;
    if num_id == "0" {
        return None;
    }
    let ilvl = w_child(&num_pr, "ilvl")
        .and_then(|n| w_val(&n))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    Some((num_id.to_string(), ilvl))
}

fn heading_level(style: &str) -> Option<u8> {
    let lower = style.to_ascii_lowercase().replace(' ', "");
    if lower == "title" {
        return Some(1);
    }
    let level = lower.strip_prefix("heading")?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn toggle_on(props: &Node<'_, '_>, name: &str) -> bool {
    match w_child(props, name) {
        Some(el) => !matches!(w_val(&el), Some("0" | "false" | "none")),
        None => false,
    }
}

/// Render the runs of a paragraph, including those inside hyperlinks.
fn inline_html(p: &Node<'_, '_>) -> String {
    let mut out = String::new();
    for run in p
        .descendants()
        .filter(|n| is_w(n, "r") && n.ancestors().skip(1).find(|a| is_w(a, "p")) == Some(*p))
    {
        let mut text = String::new();
        for child in run.children() {
            if is_w(&child, "t") {
                text.push_str(&escape_text(child.text().unwrap_or_default()));
            } else if is_w(&child, "tab") {
                text.push('\t');
            } else if is_w(&child, "br") || is_w(&child, "cr") {
                text.push_str("<br />");
            }
        }
        if text.is_empty() {
            continue;
        }

        let (bold, italic, underline) = match w_child(&run, "rPr") {
            Some(rpr) => (
                toggle_on(&rpr, "b"),
                toggle_on(&rpr, "i"),
                toggle_on(&rpr, "u"),
            ),
            None => (false, false, false),
        };

        if underline {
            text = format!("<u>{text}</u>");
        }
        if italic {
            text = format!("<em>{text}</em>");
        }
        if bold {
            text = format!("<strong>{text}</strong>");
        }
        out.push_str(&text);
    }
    out
}
