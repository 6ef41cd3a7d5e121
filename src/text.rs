//! # Text Layout
//!
//! Greedy line filling against a width in millimetres. The text is cut
//! into UAX#14 segments (a word plus whatever may hang after it), and each
//! segment goes on the current line if its visible part still fits.
//! Mandatory breaks end the line. A segment wider than a whole line is
//! split between characters.

use std::mem;

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::{FontContext, StandardFont};

#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width in millimetres, trailing spaces excluded.
    pub width: f64,
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayout {
    fonts: FontContext,
}

/// One font at one size, filling lines up to `max_width`.
struct LineFiller<'t> {
    layout: &'t TextLayout,
    font: StandardFont,
    font_size: f64,
    max_width: f64,
    lines: Vec<BrokenLine>,
    current: String,
}

impl LineFiller<'_> {
    fn width(&self, text: &str) -> f64 {
        self.layout
            .fonts
            .measure_mm(text.trim_end(), self.font, self.font_size)
    }

    fn fits(&self, text: &str) -> bool {
        self.width(text) <= self.max_width
    }

    fn end_line(&mut self) {
        let text = mem::take(&mut self.current).trim_end().to_string();
        let width = self.width(&text);
        self.lines.push(BrokenLine { text, width });
    }

    fn push_segment(&mut self, segment: &str) {
        if self.fits(&format!("{}{}", self.current, segment)) {
            self.current.push_str(segment);
            return;
        }
        if !self.current.is_empty() {
            self.end_line();
        }
        if self.fits(segment) {
            self.current.push_str(segment);
            return;
        }
        for ch in segment.chars() {
            if ch != ' ' && !self.current.is_empty() && !self.fits(&format!("{}{}", self.current, ch)) {
                self.end_line();
            }
            self.current.push(ch);
        }
    }
}

impl TextLayout {
    pub fn new(fonts: FontContext) -> Self {
        Self { fonts }
    }

    /// Break `text` into lines no wider than `max_width` millimetres.
    /// Always returns at least one line.
    pub fn break_into_lines(
        &self,
        text: &str,
        max_width: f64,
        font: StandardFont,
        font_size: f64,
    ) -> Vec<BrokenLine> {
        let mut filler = LineFiller {
            layout: self,
            font,
            font_size,
            max_width,
            lines: Vec::new(),
            current: String::new(),
        };

        let mut start = 0;
        for (end, opportunity) in linebreaks(text) {
            let segment: String = text[start..end].chars().filter(|c| !is_newline(*c)).collect();
            start = end;
            filler.push_segment(&segment);
            if opportunity == BreakOpportunity::Mandatory {
                filler.end_line();
            }
        }
        if !filler.current.is_empty() || filler.lines.is_empty() {
            filler.end_line();
        }
        filler.lines
    }

    /// Line strings only.
    pub fn split_to_width(
        &self,
        text: &str,
        max_width: f64,
        font: StandardFont,
        font_size: f64,
    ) -> Vec<String> {
        self.break_into_lines(text, max_width, font, font_size)
            .into_iter()
            .map(|l| l.text)
            .collect()
    }
}
