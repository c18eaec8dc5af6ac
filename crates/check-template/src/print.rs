//! Stamping overlays onto check PDFs

use crate::overlay::{Align, Overlay, RenderedBlock, RgbColor};
use crate::Result;
use check_text::TextMeasure;
use pdf_core::{Color, PdfDocument, RectStyle, StandardFont, TextRun};
use tracing::{debug, info};

/// Baseline offset below the vertical center, as a fraction of the font size
const BASELINE_SHIFT: f64 = 0.35;

/// Frame stroke width in points
const FRAME_WIDTH: f32 = 1.0;

/// Stamp an overlay onto page 1
///
/// Canvas pixels are divided by the canvas scale, so every block lands at
/// its native position (one pixel per point) whatever the canvas size.
pub fn stamp_overlay(doc: &mut PdfDocument, overlay: &Overlay) -> Result<()> {
    let k = native_factor(overlay.canvas.scale);
    let measure = TextMeasure::new(overlay.glyph_ratio);

    for block in &overlay.blocks {
        if let Some(frame) = block.frame {
            doc.draw_rect(
                1,
                block.left * k,
                block.top * k,
                block.width * k,
                block.height * k,
                RectStyle {
                    color: pdf_color(frame),
                    line_width: FRAME_WIDTH,
                },
            )?;
        }

        if block.text.trim().is_empty() {
            continue;
        }

        let (x, y) = text_origin(block, &measure);
        doc.insert_text(
            1,
            &TextRun {
                text: &block.text,
                x: x * k,
                y: y * k,
                font: if block.bold {
                    StandardFont::HelveticaBold
                } else {
                    StandardFont::Helvetica
                },
                font_size: (block.font_size * k) as f32,
                color: Color::black(),
            },
        )?;
    }

    debug!(
        blocks = overlay.blocks.len(),
        mode = %overlay.mode,
        "overlay stamped"
    );
    Ok(())
}

/// Produce a printable PDF: the check template with the overlay stamped on
/// page 1, or a blank page of the native canvas size when no template is given
pub fn print_check_pdf(template_pdf: Option<&[u8]>, overlay: &Overlay) -> Result<Vec<u8>> {
    let mut doc = match template_pdf {
        Some(bytes) => PdfDocument::open_from_bytes(bytes)?,
        None => {
            let k = native_factor(overlay.canvas.scale);
            PdfDocument::blank(overlay.canvas.width * k, overlay.canvas.height * k)?
        }
    };

    stamp_overlay(&mut doc, overlay)?;
    let bytes = doc.to_bytes()?;

    info!(
        mode = %overlay.mode,
        with_template = template_pdf.is_some(),
        size = bytes.len(),
        "check PDF generated"
    );
    Ok(bytes)
}

/// Native points per canvas pixel
fn native_factor(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        1.0 / scale
    } else {
        1.0
    }
}

/// Left edge and baseline of a block's text, in canvas pixels
fn text_origin(block: &RenderedBlock, measure: &TextMeasure) -> (f64, f64) {
    let baseline = block.top + block.height / 2.0 + block.font_size * BASELINE_SHIFT;
    let x = match block.align {
        Align::Left => block.left + block.padding,
        Align::Center => {
            let text_width =
                block.text.chars().count() as f64 * block.font_size * measure.glyph_ratio();
            block.left + ((block.width - text_width) / 2.0).max(0.0)
        }
    };
    (x, baseline)
}

fn pdf_color(color: RgbColor) -> Color {
    Color::from_rgb(color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayEngine, RenderMode, RenderValues};
    use crate::positions::{default_positions, FieldRole};

    fn overlay(mode: RenderMode) -> Overlay {
        let values = RenderValues {
            city: "Alger".to_string(),
            amount: "50 342".to_string(),
            amount_line1: "cinquante mille dinars".to_string(),
            ..Default::default()
        };
        OverlayEngine::default().render(&default_positions(), &values, mode, None)
    }

    #[test]
    fn test_text_origin_left() {
        let overlay = overlay(RenderMode::Print);
        let block = overlay.block(FieldRole::AmountInWords).unwrap();
        let (x, y) = text_origin(block, &TextMeasure::default());
        assert_eq!(x, 124.0);
        // 240 + 18/2 + 12 * 0.35
        assert!((y - 253.2).abs() < 1e-9);
    }

    #[test]
    fn test_text_origin_centered() {
        let overlay = overlay(RenderMode::Print);
        let block = overlay.block(FieldRole::City).unwrap();
        let (x, _) = text_origin(block, &TextMeasure::default());
        // "Alger" = 5 * 14 * 0.75 = 52.5 wide in a 150 box at 50
        assert_eq!(x, 50.0 + (150.0 - 52.5) / 2.0);
    }

    #[test]
    fn test_text_origin_centered_overflow_clamps_left() {
        let mut overlay = overlay(RenderMode::Print);
        let block = overlay
            .blocks
            .iter_mut()
            .find(|b| b.role == FieldRole::City)
            .unwrap();
        block.text = "x".repeat(40);
        let (x, _) = text_origin(block, &TextMeasure::default());
        assert_eq!(x, 50.0);
    }

    #[test]
    fn test_print_check_pdf_blank_page() {
        let bytes = print_check_pdf(None, &overlay(RenderMode::Print)).unwrap();
        let doc = PdfDocument::open_from_bytes(&bytes).unwrap();
        let size = doc.page_size(1).unwrap();
        assert_eq!((size.width, size.height), (600.0, 850.0));
    }

    #[test]
    fn test_native_factor() {
        assert_eq!(native_factor(2.0), 0.5);
        assert_eq!(native_factor(1.0), 1.0);
        assert_eq!(native_factor(0.0), 1.0);
    }

    #[test]
    fn test_pdf_color() {
        let color = pdf_color(RgbColor::new(255, 0, 0));
        assert_eq!(color, Color::rgb(1.0, 0.0, 0.0));
    }
}
