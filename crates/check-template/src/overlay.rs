//! Overlay engine: absolutely positioned text blocks over a check PDF
//!
//! Coordinates are pixels of PDF page 1 rendered at scale 1, top-left
//! origin. A scaled render multiplies every box by the same factor so the
//! calibrated positions stay valid on any viewport.

use crate::config::LayoutConfig;
use crate::positions::{BankPositions, FieldPosition, FieldRole};
use check_text::TextMeasure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message shown on the canvas of a bank without PDF
pub const PLACEHOLDER_MESSAGE: &str = "Aucun PDF téléchargé pour cette banque";

/// Smallest height of a scaled canvas
const MIN_SCALED_HEIGHT: f64 = 400.0;

/// Smallest native geometry accepted for calibration
const MIN_NATIVE_WIDTH: f64 = 400.0;
const MIN_NATIVE_HEIGHT: f64 = 600.0;

/// Inner padding of centered and left-aligned blocks
const CENTER_PADDING: f64 = 2.0;
const LEFT_PADDING: f64 = 4.0;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation, e.g. `#3b82f6`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FieldRole {
    /// Frame color of the field in calibration mode
    pub fn color(self) -> RgbColor {
        match self {
            FieldRole::City => RgbColor::new(0x3b, 0x82, 0xf6),
            FieldRole::Date => RgbColor::new(0x22, 0xc5, 0x5e),
            FieldRole::Payee => RgbColor::new(0xa8, 0x55, 0xf7),
            FieldRole::AmountInWords => RgbColor::new(0xf9, 0x73, 0x16),
            FieldRole::AmountInWordsLine2 => RgbColor::new(0xea, 0x58, 0x0c),
            FieldRole::Amount => RgbColor::new(0xef, 0x44, 0x44),
            FieldRole::Reference => RgbColor::new(0x6b, 0x72, 0x80),
        }
    }
}

/// What the overlay is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Colored frames around every block, for positioning
    Calibration,
    /// Text only, for printing on check paper
    Print,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Calibration => f.write_str("calibration"),
            RenderMode::Print => f.write_str("print"),
        }
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calibration" => Ok(RenderMode::Calibration),
            "print" => Ok(RenderMode::Print),
            other => Err(format!("unknown render mode '{other}'")),
        }
    }
}

/// Native size of PDF page 1 at scale 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    /// Canvas used before any PDF is loaded
    pub const DEFAULT: PageGeometry = PageGeometry {
        width: 600.0,
        height: 850.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Geometry of a loaded PDF, rounded and floored at 400×600
    ///
    /// The floor only sizes the canvas. Blocks keep their native
    /// coordinates, so a smaller page gets empty canvas below or beside it.
    pub fn from_native(width: f64, height: f64) -> Self {
        Self {
            width: width.round().max(MIN_NATIVE_WIDTH),
            height: height.round().max(MIN_NATIVE_HEIGHT),
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Horizontal text alignment inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
}

/// Check contents as typed in the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckValues {
    pub city: String,
    pub date: String,
    pub payee: String,
    pub amount: String,
    pub amount_in_words: String,
    pub reference: String,
}

/// Text of every block for one render pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderValues {
    pub city: String,
    pub date: String,
    pub payee: String,
    pub amount: String,
    pub amount_line1: String,
    /// Empty when the amount in words is on one line
    pub amount_line2: String,
    /// Empty when the check has no reference
    pub reference: String,
}

impl RenderValues {
    /// Build render values, splitting the amount in words when the bank has
    /// a second line configured
    pub fn for_positions(
        positions: &BankPositions,
        measure: &TextMeasure,
        values: &CheckValues,
    ) -> Self {
        let (amount_line1, amount_line2) = if positions.has_second_line() {
            measure.split_amount_in_words(
                &values.amount_in_words,
                positions.amount_in_words.width,
                positions.amount_in_words.font_size,
            )
        } else {
            (values.amount_in_words.clone(), String::new())
        };

        Self {
            city: values.city.clone(),
            date: values.date.clone(),
            payee: values.payee.clone(),
            amount: values.amount.clone(),
            amount_line1,
            amount_line2,
            reference: values.reference.clone(),
        }
    }
}

/// One positioned block of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBlock {
    pub role: FieldRole,
    pub text: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub align: Align,
    pub bold: bool,
    pub padding: f64,
    /// Bounding rectangle color, calibration mode only
    pub frame: Option<RgbColor>,
}

/// Canvas background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Background {
    /// The bank's PDF page 1 drawn at canvas size
    Pdf,
    /// No PDF attached
    Placeholder { message: String },
}

/// Drawing surface of an overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    /// Canvas pixels per native PDF pixel
    pub scale: f64,
    pub background: Background,
}

/// Result of one render pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub mode: RenderMode,
    pub canvas: Canvas,
    /// Glyph ratio used to estimate text widths
    pub glyph_ratio: f64,
    pub blocks: Vec<RenderedBlock>,
}

impl Overlay {
    /// First block of a role
    pub fn block(&self, role: FieldRole) -> Option<&RenderedBlock> {
        self.blocks.iter().find(|b| b.role == role)
    }
}

/// Lays out bank positions and values as an [`Overlay`]
#[derive(Debug, Clone, Default)]
pub struct OverlayEngine {
    config: LayoutConfig,
}

impl OverlayEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Render at native scale
    ///
    /// `page` is the geometry of the attached PDF; `None` means the bank has
    /// no PDF and the default geometry with a placeholder is used.
    pub fn render(
        &self,
        positions: &BankPositions,
        values: &RenderValues,
        mode: RenderMode,
        page: Option<PageGeometry>,
    ) -> Overlay {
        let geometry = page.unwrap_or(self.config.default_page);
        let canvas = Canvas {
            width: geometry.width,
            height: geometry.height,
            scale: 1.0,
            background: background(page.is_some()),
        };
        self.layout(positions, values, mode, canvas)
    }

    /// Render scaled to a presentation width
    ///
    /// The width is floored at the configured minimum and the canvas height
    /// at 400 px.
    pub fn render_scaled(
        &self,
        positions: &BankPositions,
        values: &RenderValues,
        mode: RenderMode,
        page: Option<PageGeometry>,
        presentation_width: f64,
    ) -> Overlay {
        let geometry = page.unwrap_or(self.config.default_page);
        let width = presentation_width.max(self.config.min_presentation_width);
        let scale = if geometry.width > 0.0 {
            width / geometry.width
        } else {
            1.0
        };
        let canvas = Canvas {
            width,
            height: (geometry.height * scale).round().max(MIN_SCALED_HEIGHT),
            scale,
            background: background(page.is_some()),
        };
        self.layout(positions, values, mode, canvas)
    }

    fn layout(
        &self,
        positions: &BankPositions,
        values: &RenderValues,
        mode: RenderMode,
        canvas: Canvas,
    ) -> Overlay {
        let mut blocks = vec![
            self.block(FieldRole::City, &positions.city, &values.city, mode, canvas.scale),
            self.block(FieldRole::Date, &positions.date, &values.date, mode, canvas.scale),
            self.block(FieldRole::Payee, &positions.payee, &values.payee, mode, canvas.scale),
            self.block(
                FieldRole::AmountInWords,
                &positions.amount_in_words,
                &values.amount_line1,
                mode,
                canvas.scale,
            ),
        ];

        if let Some(line2) = &positions.amount_in_words_line2 {
            if !values.amount_line2.is_empty() {
                blocks.push(self.block(
                    FieldRole::AmountInWordsLine2,
                    line2,
                    &values.amount_line2,
                    mode,
                    canvas.scale,
                ));
            }
        }

        blocks.push(self.block(FieldRole::Amount, &positions.amount, &values.amount, mode, canvas.scale));

        if let Some(reference) = &positions.reference {
            if !values.reference.trim().is_empty() {
                blocks.push(self.block(
                    FieldRole::Reference,
                    reference,
                    &values.reference,
                    mode,
                    canvas.scale,
                ));
            }
        }

        Overlay {
            mode,
            canvas,
            glyph_ratio: self.config.measure().glyph_ratio(),
            blocks,
        }
    }

    fn block(
        &self,
        role: FieldRole,
        position: &FieldPosition,
        text: &str,
        mode: RenderMode,
        scale: f64,
    ) -> RenderedBlock {
        let (align, padding) = match role {
            FieldRole::AmountInWords | FieldRole::AmountInWordsLine2 | FieldRole::Reference => {
                (Align::Left, LEFT_PADDING)
            }
            _ => (Align::Center, CENTER_PADDING),
        };
        let font_size = position.font_size as f64;

        RenderedBlock {
            role,
            text: text.to_string(),
            left: position.x as f64 * scale,
            top: position.y as f64 * scale,
            width: position.width as f64 * scale,
            height: font_size * self.config.line_height * scale,
            font_size: font_size * scale,
            align,
            bold: role == FieldRole::Amount,
            padding: padding * scale,
            frame: (mode == RenderMode::Calibration).then(|| role.color()),
        }
    }
}

fn background(has_pdf: bool) -> Background {
    if has_pdf {
        Background::Pdf
    } else {
        Background::Placeholder {
            message: PLACEHOLDER_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::default_positions;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "cinquante mille trois cent quarante-deux dinars algériens";

    fn sample_values() -> CheckValues {
        CheckValues {
            city: "Alger".to_string(),
            date: "22/01/2025".to_string(),
            payee: "M. Exemple Bénéficiaire".to_string(),
            amount: "50,342".to_string(),
            amount_in_words: SAMPLE.to_string(),
            reference: String::new(),
        }
    }

    fn with_line2() -> BankPositions {
        let mut positions = default_positions();
        positions.amount_in_words_line2 = Some(FieldPosition::new(120, 265, 500, 12));
        positions
    }

    #[test]
    fn test_single_line_keeps_full_text() {
        let positions = default_positions();
        let values = RenderValues::for_positions(&positions, &TextMeasure::default(), &sample_values());
        assert_eq!(values.amount_line1, SAMPLE);
        assert_eq!(values.amount_line2, "");

        let overlay = OverlayEngine::default().render(&positions, &values, RenderMode::Print, None);
        assert_eq!(overlay.block(FieldRole::AmountInWords).unwrap().text, SAMPLE);
        assert!(overlay.block(FieldRole::AmountInWordsLine2).is_none());
    }

    #[test]
    fn test_second_line_split() {
        let positions = with_line2();
        let values = RenderValues::for_positions(&positions, &TextMeasure::default(), &sample_values());
        assert!(!values.amount_line1.is_empty());
        assert!(!values.amount_line2.is_empty());
        assert_eq!(format!("{} {}", values.amount_line1, values.amount_line2), SAMPLE);

        let overlay = OverlayEngine::default().render(&positions, &values, RenderMode::Print, None);
        let line2 = overlay.block(FieldRole::AmountInWordsLine2).unwrap();
        assert_eq!(line2.text, values.amount_line2);
        assert_eq!((line2.left, line2.top), (120.0, 265.0));
    }

    #[test]
    fn test_line2_box_skipped_when_text_empty() {
        let positions = with_line2();
        let values = RenderValues {
            amount_line1: "mille dinars".to_string(),
            ..Default::default()
        };
        let overlay = OverlayEngine::default().render(&positions, &values, RenderMode::Calibration, None);
        assert!(overlay.block(FieldRole::AmountInWordsLine2).is_none());
    }

    #[test]
    fn test_no_pdf_uses_placeholder_canvas() {
        let positions = default_positions();
        let values = RenderValues::for_positions(&positions, &TextMeasure::default(), &sample_values());
        let overlay = OverlayEngine::default().render(&positions, &values, RenderMode::Calibration, None);

        assert_eq!(overlay.canvas.width, 600.0);
        assert_eq!(overlay.canvas.height, 850.0);
        assert_eq!(
            overlay.canvas.background,
            Background::Placeholder {
                message: PLACEHOLDER_MESSAGE.to_string()
            }
        );
        let city = overlay.block(FieldRole::City).unwrap();
        assert_eq!((city.left, city.top, city.width, city.height), (50.0, 100.0, 150.0, 21.0));
        assert_eq!(overlay.blocks.len(), 5);
    }

    #[test]
    fn test_calibration_frames_and_print_text_only() {
        let positions = with_line2();
        let values = RenderValues::for_positions(&positions, &TextMeasure::default(), &sample_values());
        let engine = OverlayEngine::default();

        let calibration = engine.render(&positions, &values, RenderMode::Calibration, None);
        for block in &calibration.blocks {
            assert_eq!(block.frame, Some(block.role.color()));
        }

        let print = engine.render(&positions, &values, RenderMode::Print, None);
        assert!(print.blocks.iter().all(|b| b.frame.is_none()));
    }

    #[test]
    fn test_role_colors_are_distinct() {
        let mut colors: Vec<String> = FieldRole::ALL.iter().map(|r| r.color().to_hex()).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), FieldRole::ALL.len());
        assert_eq!(FieldRole::City.color().to_hex(), "#3b82f6");
    }

    #[test]
    fn test_alignment_and_weight() {
        let positions = default_positions();
        let values = RenderValues::default();
        let overlay = OverlayEngine::default().render(&positions, &values, RenderMode::Print, None);

        let amount = overlay.block(FieldRole::Amount).unwrap();
        assert!(amount.bold);
        assert_eq!(amount.align, Align::Center);
        assert_eq!(amount.height, 27.0);

        let words = overlay.block(FieldRole::AmountInWords).unwrap();
        assert!(!words.bold);
        assert_eq!(words.align, Align::Left);
        assert_eq!(words.padding, 4.0);
    }

    #[test]
    fn test_reference_needs_box_and_value() {
        let mut positions = default_positions();
        let mut input = sample_values();
        input.reference = "CHQ-0042".to_string();
        let engine = OverlayEngine::default();

        let values = RenderValues::for_positions(&positions, &TextMeasure::default(), &input);
        let overlay = engine.render(&positions, &values, RenderMode::Print, None);
        assert!(overlay.block(FieldRole::Reference).is_none());

        positions.reference = Some(FieldPosition::new(400, 60, 150, 10));
        let overlay = engine.render(&positions, &values, RenderMode::Print, None);
        assert_eq!(overlay.block(FieldRole::Reference).unwrap().text, "CHQ-0042");
    }

    #[test]
    fn test_render_is_idempotent() {
        let positions = with_line2();
        let values = RenderValues::for_positions(&positions, &TextMeasure::default(), &sample_values());
        let engine = OverlayEngine::default();
        let page = Some(PageGeometry::new(612.0, 792.0));

        let first = engine.render(&positions, &values, RenderMode::Calibration, page);
        let second = engine.render(&positions, &values, RenderMode::Calibration, page);
        assert_eq!(first, second);
        assert_eq!(first.canvas.background, Background::Pdf);
    }

    #[test]
    fn test_render_scaled() {
        let positions = default_positions();
        let values = RenderValues::default();
        let engine = OverlayEngine::default();
        let page = Some(PageGeometry::new(600.0, 850.0));

        let overlay = engine.render_scaled(&positions, &values, RenderMode::Calibration, page, 300.0);
        // width floored at 320
        assert_eq!(overlay.canvas.width, 320.0);
        let scale = 320.0 / 600.0;
        assert_eq!(overlay.canvas.scale, scale);
        assert_eq!(overlay.canvas.height, (850.0_f64 * scale).round());

        let city = overlay.block(FieldRole::City).unwrap();
        assert_eq!(city.left, 50.0 * scale);
        assert_eq!(city.font_size, 14.0 * scale);

        let wide = engine.render_scaled(&positions, &values, RenderMode::Print, page, 1200.0);
        assert_eq!(wide.canvas.scale, 2.0);
        assert_eq!(wide.block(FieldRole::Amount).unwrap().left, 900.0);
    }

    #[test]
    fn test_scaled_height_floor() {
        let engine = OverlayEngine::default();
        let page = Some(PageGeometry::new(1000.0, 300.0));
        let overlay = engine.render_scaled(
            &default_positions(),
            &RenderValues::default(),
            RenderMode::Print,
            page,
            500.0,
        );
        assert_eq!(overlay.canvas.height, 400.0);
    }

    #[test]
    fn test_geometry_from_native() {
        assert_eq!(
            PageGeometry::from_native(612.4, 791.6),
            PageGeometry::new(612.0, 792.0)
        );
        assert_eq!(
            PageGeometry::from_native(200.0, 300.0),
            PageGeometry::new(400.0, 600.0)
        );
    }

    #[test]
    fn test_render_mode_from_str() {
        assert_eq!("Print".parse::<RenderMode>().unwrap(), RenderMode::Print);
        assert_eq!(RenderMode::Calibration.to_string(), "calibration");
        assert!("draft".parse::<RenderMode>().is_err());
    }

    #[test]
    fn test_overlay_serializes_camel_case() {
        let overlay = OverlayEngine::default().render(
            &default_positions(),
            &RenderValues::default(),
            RenderMode::Calibration,
            None,
        );
        let json = serde_json::to_value(&overlay).unwrap();
        assert_eq!(json["mode"], "calibration");
        assert_eq!(json["canvas"]["background"]["kind"], "placeholder");
        assert_eq!(json["blocks"][0]["role"], "city");
        assert_eq!(json["blocks"][0]["fontSize"], 14.0);
    }
}
