//! HTML ↔ plain text.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Entities decoded by [`html_to_text`], applied in this order.
const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

const TEMPLATE_HEAD: &str = r#"
      <!DOCTYPE html>
      <html>
      <head>
        <meta charset="UTF-8">
        <style>
          body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            padding: 20px;
          }
          pre {
            white-space: pre-wrap;
            word-wrap: break-word;
          }
        </style>
      </head>
      <body>
        <pre>"#;

const TEMPLATE_TAIL: &str = r#"</pre>
      </body>
      </html>
    "#;

/// Strip every tag and decode the six basic entities. No other entities
/// are decoded.
pub fn html_to_text(html: &str) -> String {
    let mut text = TAG_RE.replace_all(html, "").into_owned();
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    text
}

/// Wrap text in the fixed standalone HTML page, inside a `<pre>` block.
pub fn text_to_html(text: &str) -> String {
    let escaped = escape_text(text);
    let mut html = String::with_capacity(TEMPLATE_HEAD.len() + escaped.len() + TEMPLATE_TAIL.len());
    html.push_str(TEMPLATE_HEAD);
    html.push_str(&escaped);
    html.push_str(TEMPLATE_TAIL);
    html
}

/// Escape `&`, `<` and `>` so text cannot open tags inside the template.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
