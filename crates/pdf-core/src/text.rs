//! Text and rectangle operators

use crate::Color;

/// Standard Type1 fonts available in every PDF viewer (no embedding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// PDF BaseFont name
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name used in page content streams
    ///
    /// Prefixed so it never collides with fonts already used by the page.
    pub fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "CkHelv",
            StandardFont::HelveticaBold => "CkHelvB",
        }
    }
}

/// A single line of text to stamp on a page
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun<'a> {
    /// Text to draw
    pub text: &'a str,
    /// Left edge in points
    pub x: f64,
    /// Baseline in points, measured from the top of the page
    pub y: f64,
    /// Font
    pub font: StandardFont,
    /// Font size in points
    pub font_size: f32,
    /// Fill color
    pub color: Color,
}

/// Stroke style for rectangles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectStyle {
    pub color: Color,
    pub line_width: f32,
}

/// Encode text as WinAnsiEncoding bytes
///
/// Latin-1 characters map directly; the common typographic characters of the
/// 0x80-0x9F block (euro, quotes, dashes, ligatures) are mapped to their
/// WinAnsi code points. Anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            'Œ' => 0x8C,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            'œ' => 0x9C,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}

/// Hex string literal for a content stream (e.g. `<416C676572>`)
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push('<');
    for b in bytes {
        out.push_str(&format!("{b:02X}"));
    }
    out.push('>');
    out
}

/// Generate PDF operators for text insertion
///
/// # Arguments
/// * `text_hex` - Hex-encoded text (e.g., "<416C676572>")
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Baseline Y coordinate in points (PDF coordinates, from bottom)
/// * `font` - Font to select
/// * `font_size` - Font size in points
/// * `color` - Fill color
pub fn generate_text_operators(
    text_hex: &str,
    x: f64,
    y: f64,
    font: StandardFont,
    font_size: f32,
    color: Color,
) -> Vec<u8> {
    let mut ops = String::new();
    ops.push_str("BT\n");
    ops.push_str(&format!("{} {} {} rg\n", color.r, color.g, color.b));
    ops.push_str(&format!("/{} {} Tf\n", font.resource_name(), font_size));
    ops.push_str(&format!("{x} {y} Td\n"));
    ops.push_str(&format!("{text_hex} Tj\n"));
    ops.push_str("ET\n");
    ops.into_bytes()
}

/// Generate PDF operators stroking a rectangle
///
/// `x`/`y` is the bottom-left corner in PDF coordinates.
pub fn generate_rect_operators(x: f64, y: f64, width: f64, height: f64, style: RectStyle) -> Vec<u8> {
    let c = style.color;
    format!(
        "q\n{} {} {} RG\n{} w\n{x} {y} {width} {height} re\nS\nQ\n",
        c.r, c.g, c.b, style.line_width
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ascii() {
        assert_eq!(encode_win_ansi("Alger 12"), b"Alger 12".to_vec());
    }

    #[test]
    fn test_encode_latin1_accents() {
        assert_eq!(encode_win_ansi("é"), vec![0xE9]);
        assert_eq!(encode_win_ansi("à"), vec![0xE0]);
    }

    #[test]
    fn test_encode_win_ansi_specials() {
        assert_eq!(encode_win_ansi("€œ’"), vec![0x80, 0x9C, 0x92]);
    }

    #[test]
    fn test_encode_unmapped_becomes_question_mark() {
        assert_eq!(encode_win_ansi("د"), vec![b'?']);
        assert_eq!(encode_win_ansi("\n"), vec![b'?']);
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(b"Al"), "<416C>");
        assert_eq!(hex_string(&[]), "<>");
    }

    #[test]
    fn test_generate_text_operators() {
        let ops = generate_text_operators(
            "<416C676572>",
            50.0,
            700.0,
            StandardFont::Helvetica,
            14.0,
            Color::black(),
        );
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.starts_with("BT\n"));
        assert!(ops_str.contains("0 0 0 rg"));
        assert!(ops_str.contains("/CkHelv 14 Tf"));
        assert!(ops_str.contains("50 700 Td"));
        assert!(ops_str.contains("<416C676572> Tj"));
        assert!(ops_str.ends_with("ET\n"));
    }

    #[test]
    fn test_generate_text_operators_bold_font() {
        let ops = generate_text_operators(
            "<41>",
            0.0,
            0.0,
            StandardFont::HelveticaBold,
            18.0,
            Color::black(),
        );
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("/CkHelvB 18 Tf"));
    }

    #[test]
    fn test_generate_rect_operators() {
        let style = RectStyle {
            color: Color::rgb(1.0, 0.0, 0.0),
            line_width: 2.0,
        };
        let ops = generate_rect_operators(10.0, 20.0, 150.0, 21.0, style);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 0 0 RG"));
        assert!(ops_str.contains("2 w"));
        assert!(ops_str.contains("10 20 150 21 re"));
        assert!(ops_str.contains("\nS\n"));
        assert!(ops_str.starts_with("q\n") && ops_str.ends_with("Q\n"));
    }

    #[test]
    fn test_font_names() {
        assert_eq!(StandardFont::Helvetica.base_font(), "Helvetica");
        assert_eq!(StandardFont::HelveticaBold.base_font(), "Helvetica-Bold");
        assert_ne!(
            StandardFont::Helvetica.resource_name(),
            StandardFont::HelveticaBold.resource_name()
        );
    }
}
