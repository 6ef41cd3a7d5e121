//! # Page Layout
//!
//! The layout engine produces a `LayoutDocument`: a list of fixed-size
//! pages, each holding absolutely positioned draw commands. Coordinates are
//! millimetres from the top-left corner of the page, and text `y` is the
//! baseline. The PDF writer flips the axis and converts to points.
//!
//! Pages are decided while drawing, never afterwards. `page_break` owns the
//! cursor and the break rules; `form` walks an evaluation record through its
//! stages and asks the cursor before placing every block.

pub mod form;
pub mod page_break;

use crate::font::{FontContext, StandardFont};
use crate::image_loader::EmbeddedImage;

pub use form::{FormLayoutSettings, FormPdfGenerator, RenderStage, RenderedForm};
pub use page_break::{BlockPolicy, BreakDecision, PageFlow};

/// A4 portrait.
pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;

/// Stroke width for rules, table cells and signature lines.
pub const LINE_WIDTH: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        x: f64,
        /// Baseline.
        y: f64,
        text: String,
        font: StandardFont,
        font_size: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    /// Stroked, unfilled rectangle.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: EmbeddedImage,
    },
}

/// A single page of laid-out content.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<DrawCommand>,
}

impl LayoutPage {
    pub fn a4() -> Self {
        Self {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            elements: Vec::new(),
        }
    }

    /// Text runs on this page, top to bottom in draw order.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f64)> {
        self.elements.iter().filter_map(|el| match el {
            DrawCommand::Text { text, y, .. } => Some((text.as_str(), *y)),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|(t, _)| t.contains(needle))
    }

    pub fn images(&self) -> impl Iterator<Item = &DrawCommand> {
        self.elements
            .iter()
            .filter(|el| matches!(el, DrawCommand::Image { .. }))
    }
}

/// Document Info entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// The finished layout: pages plus document metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDocument {
    pub pages: Vec<LayoutPage>,
    pub metadata: Metadata,
    fonts: FontContext,
}

impl Default for LayoutDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutDocument {
    /// A document with one empty A4 page.
    pub fn new() -> Self {
        Self {
            pages: vec![LayoutPage::a4()],
            metadata: Metadata::default(),
            fonts: FontContext::new(),
        }
    }

    /// A document with no pages yet.
    pub fn empty() -> Self {
        Self {
            pages: Vec::new(),
            metadata: Metadata::default(),
            fonts: FontContext::new(),
        }
    }

    pub fn add_page(&mut self) {
        self.pages.push(LayoutPage::a4());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current(&mut self) -> &mut LayoutPage {
        if self.pages.is_empty() {
            self.pages.push(LayoutPage::a4());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.current().elements.push(command);
    }

    pub fn text(&mut self, text: &str, x: f64, y: f64, font: StandardFont, font_size: f64) {
        if text.is_empty() {
            return;
        }
        self.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            font,
            font_size,
        });
    }

    /// Text centred on `center_x`.
    pub fn text_centered(
        &mut self,
        text: &str,
        center_x: f64,
        y: f64,
        font: StandardFont,
        font_size: f64,
    ) {
        let width = self.fonts.measure_mm(text, font, font_size);
        self.text(text, center_x - width / 2.0, y, font, font_size);
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.push(DrawCommand::Line { x1, y1, x2, y2 });
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn image(&mut self, image: EmbeddedImage, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::Image {
            x,
            y,
            width,
            height,
            image,
        });
    }

    /// Largest size not above `preferred` (and not below `min`) at which
    /// `text` fits in `max_width` millimetres.
    pub fn fit_font_size(
        &self,
        text: &str,
        font: StandardFont,
        preferred: f64,
        min: f64,
        max_width: f64,
    ) -> f64 {
        let width = self.fonts.measure_mm(text, font, preferred);
        if width <= max_width || width == 0.0 {
            return preferred;
        }
        (preferred * max_width / width).max(min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_one_page() {
        let mut doc = LayoutDocument::new();
        assert_eq!(doc.page_count(), 1);
        doc.add_page();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[1].width, PAGE_WIDTH);
    }

    #[test]
    fn test_push_goes_to_last_page() {
        let mut doc = LayoutDocument::new();
        doc.text("primeira", 20.0, 30.0, StandardFont::Helvetica, 12.0);
        doc.add_page();
        doc.text("segunda", 20.0, 40.0, StandardFont::Helvetica, 12.0);
        assert!(doc.pages[0].contains_text("primeira"));
        assert!(!doc.pages[0].contains_text("segunda"));
        assert!(doc.pages[1].contains_text("segunda"));
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let mut doc = LayoutDocument::new();
        doc.text("", 20.0, 30.0, StandardFont::Helvetica, 12.0);
        assert!(doc.pages[0].elements.is_empty());
    }

    #[test]
    fn test_centered_text_is_symmetric() {
        let mut doc = LayoutDocument::new();
        doc.text_centered("CENTRO DE TECNOLOGIA", 105.0, 28.0, StandardFont::HelveticaBold, 14.0);
        let width = FontContext::new().measure_mm(
            "CENTRO DE TECNOLOGIA",
            StandardFont::HelveticaBold,
            14.0,
        );
        match &doc.pages[0].elements[0] {
            DrawCommand::Text { x, .. } => assert!((x + width / 2.0 - 105.0).abs() < 1e-9),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_fit_font_size_shrinks_long_text() {
        let doc = LayoutDocument::new();
        let title = "FICHA DE AVALIAÇÃO DE ANDAMENTO DE TCC - CIÊNCIA DA COMPUTAÇÃO";
        let size = doc.fit_font_size(title, StandardFont::HelveticaBold, 14.0, 8.0, 170.0);
        assert!(size < 14.0);
        let width = FontContext::new().measure_mm(title, StandardFont::HelveticaBold, size);
        assert!(width <= 170.0 + 1e-6);
        assert_eq!(
            doc.fit_font_size("ATA", StandardFont::HelveticaBold, 14.0, 8.0, 170.0),
            14.0
        );
    }
}
