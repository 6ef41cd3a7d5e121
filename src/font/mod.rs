//! # Font Management
//!
//! The forms use two of the 14 standard PDF fonts, Helvetica and
//! Helvetica-Bold, which need no embedding. This module resolves a face
//! to its PDF name and measures text with the AFM widths.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// Points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// The standard faces the layout engine draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => StandardFontMetrics::HELVETICA,
            Self::HelveticaBold => StandardFontMetrics::HELVETICA_BOLD,
        }
    }

    /// Resource name used in content streams (`/F0`, `/F1`).
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "F0",
            Self::HelveticaBold => "F1",
        }
    }
}

/// Drawn, and measured, in place of characters WinAnsiEncoding lacks.
pub const MISSING_GLYPH: char = '?';

/// Windows-1252 code points above Latin-1's C1 range.
const WINANSI_EXTRAS: [(char, u8); 17] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('„', 0x84),
    ('…', 0x85),
    ('‰', 0x89),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('™', 0x99),
    ('›', 0x9B),
    ('œ', 0x9C),
];

/// Single-byte WinAnsiEncoding code for `ch`, if it has one.
pub fn winansi_byte(ch: char) -> Option<u8> {
    match ch as u32 {
        cp @ (0x20..=0x7E | 0xA0..=0xFF) => Some(cp as u8),
        _ => WINANSI_EXTRAS
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, b)| *b),
    }
}

/// Text measurement shared by layout and the PDF writer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        font.metrics().measure_string(text, font_size, 0.0)
    }

    /// Width of a string in millimetres.
    pub fn measure_mm(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        self.measure_string(text, font, font_size) / PT_PER_MM
    }
}
