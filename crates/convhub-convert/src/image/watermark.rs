//! Text watermarks rendered from SVG markup and alpha-composited onto the
//! image.

use std::sync::Arc;

use image::{RgbaImage, imageops};
use quick_xml::escape::escape;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};

use super::params::Anchor;
use crate::error::ConversionError;

/// Ratio between the shorter image side and the watermark font size.
const FONT_SIZE_DIVISOR: f32 = 20.0;

/// Renders watermark overlays; holds the font database shared by all
/// requests.
#[derive(Clone)]
pub struct Watermarker {
    fontdb: Arc<fontdb::Database>,
    font_family: String,
}

impl std::fmt::Debug for Watermarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watermarker")
            .field("fonts", &self.fontdb.len())
            .field("font_family", &self.font_family)
            .finish()
    }
}

impl Watermarker {
    /// Create a watermarker that draws with the system fonts.
    pub fn new(font_family: impl Into<String>) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(fonts = db.len(), "Loaded system fonts for watermarks");
        Self::from_database(db, font_family)
    }

    /// Create a watermarker over `db`, pointing every generic family that
    /// names an uninstalled font at an installed face.
    pub fn from_database(mut db: fontdb::Database, font_family: impl Into<String>) -> Self {
        bind_generic_families(&mut db);
        Self::with_fonts(Arc::new(db), font_family)
    }

    /// Create a watermarker over an existing font database, used as is.
    pub fn with_fonts(fontdb: Arc<fontdb::Database>, font_family: impl Into<String>) -> Self {
        Self {
            fontdb,
            font_family: font_family.into(),
        }
    }

    /// Font size used for an image of the given dimensions.
    pub fn font_size(width: u32, height: u32) -> f32 {
        width.min(height) as f32 / FONT_SIZE_DIVISOR
    }

    /// Build the overlay markup for an image of `width` x `height`.
    pub fn svg(&self, width: u32, height: u32, text: &str, anchor: Anchor, opacity: f32) -> String {
        let size = Self::font_size(width, height);
        let (w, h) = (width as f32, height as f32);
        let margin = size;

        let (x, y, text_anchor, baseline) = match anchor {
            Anchor::TopLeft => (margin, margin, "start", "hanging"),
            Anchor::TopRight => (w - margin, margin, "end", "hanging"),
            Anchor::Center => (w / 2.0, h / 2.0, "middle", "middle"),
            Anchor::BottomLeft => (margin, h - margin, "start", "auto"),
            Anchor::BottomRight => (w - margin, h - margin, "end", "auto"),
        };

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><text x="{x}" y="{y}" text-anchor="{text_anchor}" dominant-baseline="{baseline}" font-family="{family}" font-size="{size}" fill="#000000" fill-opacity="{opacity}">{text}</text></svg>"##,
            family = escape(self.font_family.as_str()),
            text = escape(text),
        )
    }

    /// Render the overlay as straight-alpha RGBA pixels.
    pub fn render_overlay(
        &self,
        width: u32,
        height: u32,
        text: &str,
        anchor: Anchor,
        opacity: f32,
    ) -> Result<RgbaImage, ConversionError> {
        let svg = self.svg(width, height, text, anchor, opacity);

        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| ConversionError::Watermark {
            reason: e.to_string(),
        })?;

        // usvg drops text it cannot shape; that must not pass as success.
        if !text.trim().is_empty() && !has_glyphs(tree.root()) {
            return Err(ConversionError::Watermark {
                reason: format!("no installed font can render family '{}'", self.font_family),
            });
        }

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| ConversionError::Watermark {
            reason: format!("cannot allocate a {width}x{height} overlay"),
        })?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        let mut data = Vec::with_capacity(pixmap.pixels().len() * 4);
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        RgbaImage::from_raw(width, height, data).ok_or_else(|| ConversionError::Watermark {
            reason: "overlay buffer size mismatch".to_string(),
        })
    }

    /// Draw `text` onto `image` in place.
    pub fn apply(
        &self,
        image: &mut RgbaImage,
        text: &str,
        anchor: Anchor,
        opacity: f32,
    ) -> Result<(), ConversionError> {
        let (width, height) = image.dimensions();
        let overlay = self.render_overlay(width, height, text, anchor, opacity)?;
        imageops::overlay(image, &overlay, 0, 0);
        Ok(())
    }
}

/// Whether any text node under `group` produced glyph outlines.
fn has_glyphs(group: &usvg::Group) -> bool {
    group.children().iter().any(|node| match node {
        usvg::Node::Text(text) => text.flattened().has_children(),
        usvg::Node::Group(child) => has_glyphs(child),
        _ => false,
    })
}

fn is_installed(db: &fontdb::Database, family: &str) -> bool {
    db.faces()
        .any(|face| face.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(family)))
}

/// fontdb maps `sans-serif` to Arial and `serif` to Times New Roman out of
/// the box; rebind those that are missing to a face that exists.
fn bind_generic_families(db: &mut fontdb::Database) {
    let installed = |pred: &dyn Fn(&str) -> bool| {
        db.faces()
            .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
            .find(|name| pred(name.as_str()))
    };
    let Some(fallback) = installed(&|name: &str| name.contains("Sans") && !name.contains("Mono"))
        .or_else(|| installed(&|_: &str| true))
    else {
        tracing::warn!("No system fonts found; watermarks cannot be rendered");
        return;
    };

    let generics = [
        fontdb::Family::SansSerif,
        fontdb::Family::Serif,
        fontdb::Family::Monospace,
        fontdb::Family::Cursive,
        fontdb::Family::Fantasy,
    ];
    for generic in generics {
        let current = db.family_name(&generic).to_string();
        if is_installed(db, &current) {
            continue;
        }
        tracing::debug!(from = %current, to = %fallback, "Rebinding generic font family");
        match generic {
            fontdb::Family::SansSerif => db.set_sans_serif_family(fallback.clone()),
            fontdb::Family::Serif => db.set_serif_family(fallback.clone()),
            fontdb::Family::Monospace => db.set_monospace_family(fallback.clone()),
            fontdb::Family::Cursive => db.set_cursive_family(fallback.clone()),
            fontdb::Family::Fantasy => db.set_fantasy_family(fallback.clone()),
            fontdb::Family::Name(_) => {}
        }
    }
}
