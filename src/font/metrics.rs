//! Advance widths for the standard Helvetica faces.
//!
//! Widths are in 1/1000 em, taken from the Adobe AFM files for the
//! printable ASCII range. Accented Latin-1 letters share the width of
//! their base letter, which holds for every glyph in WinAnsiEncoding that
//! Portuguese text needs. Characters outside WinAnsiEncoding are drawn as
//! `?` and measured as `?`.

use super::{winansi_byte, MISSING_GLYPH};

/// Widths for code points 0x20..=0x7E.
type AsciiWidths = [u16; 95];

#[rustfmt::skip]
const HELVETICA: AsciiWidths = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' - '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0' - '?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@' - 'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P' - '_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`' - 'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p' - '~'
];

#[rustfmt::skip]
const HELVETICA_BOLD: AsciiWidths = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width table of one standard face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    ascii: &'static AsciiWidths,
    bold: bool,
}

impl StandardFontMetrics {
    pub const HELVETICA: StandardFontMetrics = StandardFontMetrics {
        ascii: &HELVETICA,
        bold: false,
    };
    pub const HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
        ascii: &HELVETICA_BOLD,
        bold: true,
    };

    /// Advance width in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return self.ascii[(cp - 0x20) as usize];
        }
        if winansi_byte(ch).is_none() {
            return self.advance(MISSING_GLYPH);
        }
        if let Some(base) = base_letter(ch) {
            return self.advance(base);
        }
        match ch {
            '\u{00A0}' => self.advance(' '),
            '°' => 400,
            'ª' => 370,
            'º' => 365,
            '§' => 556,
            '–' => 556,
            '—' => 1000,
            '‘' | '’' => if self.bold { 278 } else { 222 },
            '“' | '”' => if self.bold { 500 } else { 333 },
            '•' => 350,
            '…' => 1000,
            _ => 556,
        }
    }

    /// Width of a character in points at the given size.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }
}

/// Strip the diacritic from a Latin-1 letter.
fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width() {
        let w = StandardFontMetrics::HELVETICA.char_width(' ', 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_accented_letters_match_base() {
        let m = StandardFontMetrics::HELVETICA;
        assert_eq!(m.advance('ç'), m.advance('c'));
        assert_eq!(m.advance('Ã'), m.advance('A'));
        assert_eq!(m.advance('é'), 556);
    }

    #[test]
    fn test_unencodable_characters_measure_as_question_mark() {
        for m in [StandardFontMetrics::HELVETICA, StandardFontMetrics::HELVETICA_BOLD] {
            let question = m.advance('?');
            assert_eq!(m.advance('ł'), question);
            assert_eq!(m.advance('→'), question);
            assert_eq!(m.advance('漢'), question);
            assert_eq!(m.advance('\t'), question);
        }
        assert_eq!(StandardFontMetrics::HELVETICA_BOLD.advance('ő'), 611);
        // Encodable punctuation keeps its own width.
        assert_eq!(StandardFontMetrics::HELVETICA.advance('—'), 1000);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = StandardFontMetrics::HELVETICA.measure_string("Avaliação", 12.0, 0.0);
        let bold = StandardFontMetrics::HELVETICA_BOLD.measure_string("Avaliação", 12.0, 0.0);
        assert!(bold > regular);
    }
}
