//! Standard Type1 fonts, WinAnsi text encoding and width metrics

use std::fmt;
use std::str::FromStr;

use crate::types::LayoutError;

/// The base-14 fonts every PDF reader provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    pub fn base_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Resolve a font name, substituting `fallback` for unknown names
    pub fn resolve(name: &str, fallback: StandardFont) -> StandardFont {
        name.parse().unwrap_or_else(|_| {
            log::warn!(
                "Unknown font '{}', using {}",
                name,
                fallback.base_name()
            );
            fallback
        })
    }

    /// Advance width of one character in 1/1000 em
    pub fn char_width(self, c: char) -> u16 {
        match self {
            StandardFont::Courier
            | StandardFont::CourierBold
            | StandardFont::CourierOblique
            | StandardFont::CourierBoldOblique => 600,
            StandardFont::Helvetica | StandardFont::HelveticaOblique => {
                ascii_width(&HELVETICA_WIDTHS, c)
            }
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique => {
                ascii_width(&HELVETICA_BOLD_WIDTHS, c)
            }
            // Times metrics are not tabulated; Helvetica runs slightly wide,
            // which keeps wrapped lines inside the margin.
            StandardFont::TimesRoman | StandardFont::TimesItalic => {
                ascii_width(&HELVETICA_WIDTHS, c)
            }
            StandardFont::TimesBold | StandardFont::TimesBoldItalic => {
                ascii_width(&HELVETICA_BOLD_WIDTHS, c)
            }
        }
    }

    /// Rendered width of `text` in points at `size`
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * size / 1000.0
    }
}

impl FromStr for StandardFont {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let font = match s.trim() {
            "Helvetica" => StandardFont::Helvetica,
            "Helvetica-Bold" => StandardFont::HelveticaBold,
            "Helvetica-Oblique" => StandardFont::HelveticaOblique,
            "Helvetica-BoldOblique" => StandardFont::HelveticaBoldOblique,
            "Times-Roman" => StandardFont::TimesRoman,
            "Times-Bold" => StandardFont::TimesBold,
            "Times-Italic" => StandardFont::TimesItalic,
            "Times-BoldItalic" => StandardFont::TimesBoldItalic,
            "Courier" => StandardFont::Courier,
            "Courier-Bold" => StandardFont::CourierBold,
            "Courier-Oblique" => StandardFont::CourierOblique,
            "Courier-BoldOblique" => StandardFont::CourierBoldOblique,
            other => {
                return Err(LayoutError::InvalidInput(format!(
                    "unsupported font '{other}'"
                )));
            }
        };
        Ok(font)
    }
}

impl fmt::Display for StandardFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

/// Width for non-ASCII characters (the width of most Latin-1 letters)
const NON_ASCII_WIDTH: u16 = 556;

fn ascii_width(table: &[u16; 95], c: char) -> u16 {
    match c {
        ' '..='~' => table[c as usize - 32],
        _ => NON_ASCII_WIDTH,
    }
}

// AFM advance widths for codes 32..=126
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Encode text as WinAnsi bytes for a standard font.
///
/// Latin-1 maps directly; typographic quotes, dashes and the ellipsis map
/// to their WinAnsi slots; anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\t' => b' ',
            c if (c as u32) < 0x20 => b'?',
            c if (c as u32) < 0x7F => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(StandardFont::Helvetica.char_width(' '), 278);
        assert_eq!(StandardFont::Helvetica.char_width('W'), 944);
        assert_eq!(StandardFont::HelveticaBold.char_width('m'), 889);
        assert_eq!(StandardFont::Courier.char_width('i'), 600);
        assert_eq!(StandardFont::Helvetica.char_width('~'), 584);
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let w12 = StandardFont::Helvetica.text_width("Hello", 12.0);
        let w24 = StandardFont::Helvetica.text_width("Hello", 24.0);
        assert!((w24 - 2.0 * w12).abs() < 1e-4);
    }

    #[test]
    fn test_resolve_falls_back() {
        assert_eq!(
            StandardFont::resolve("Comic Sans", StandardFont::Helvetica),
            StandardFont::Helvetica
        );
        assert_eq!(
            StandardFont::resolve("Times-Bold", StandardFont::Helvetica),
            StandardFont::TimesBold
        );
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("A\u{2019}s"), vec![b'A', 0x92, b's']);
        assert_eq!(encode_win_ansi("caf\u{e9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("\u{4e2d}"), vec![b'?']);
    }
}
