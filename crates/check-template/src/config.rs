//! Layout configuration

use crate::overlay::PageGeometry;
use check_text::{TextMeasure, DEFAULT_GLYPH_RATIO};
use serde::{Deserialize, Serialize};

/// Tunables of the overlay engine and the calibration tool
///
/// Every field has a default, so a partial `[layout]` table is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Average glyph width as a fraction of the font size
    pub glyph_ratio: f64,
    /// Box height as a multiple of the font size
    pub line_height: f64,
    /// Vertical offset of a freshly enabled second amount line
    pub second_line_offset: i32,
    /// Canvas used when no PDF is attached
    pub default_page: PageGeometry,
    /// Smallest presentation width of a scaled canvas
    pub min_presentation_width: f64,
}

impl LayoutConfig {
    /// Width estimator for this layout
    pub fn measure(&self) -> TextMeasure {
        TextMeasure::new(self.glyph_ratio)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            glyph_ratio: DEFAULT_GLYPH_RATIO,
            line_height: 1.5,
            second_line_offset: 25,
            default_page: PageGeometry::DEFAULT,
            min_presentation_width: 320.0,
        }
    }
}
