//! Text width estimation

/// Average glyph width as a fraction of the font size
pub const DEFAULT_GLYPH_RATIO: f64 = 0.75;

/// Deterministic width estimator for check text
///
/// Every character counts as one average glyph of `font_size * glyph_ratio`
/// pixels. No font metrics are consulted, so the result is an approximation
/// of what a browser or PDF viewer would draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMeasure {
    glyph_ratio: f64,
}

impl TextMeasure {
    /// Create an estimator with a custom glyph ratio
    ///
    /// Non-finite or non-positive ratios fall back to [`DEFAULT_GLYPH_RATIO`].
    pub fn new(glyph_ratio: f64) -> Self {
        let glyph_ratio = if glyph_ratio.is_finite() && glyph_ratio > 0.0 {
            glyph_ratio
        } else {
            DEFAULT_GLYPH_RATIO
        };
        Self { glyph_ratio }
    }

    /// Glyph ratio used by this estimator
    pub fn glyph_ratio(&self) -> f64 {
        self.glyph_ratio
    }

    /// Width in pixels of a single average glyph
    pub fn glyph_width(&self, font_size: u32) -> f64 {
        font_size as f64 * self.glyph_ratio
    }

    /// Estimated width in pixels of `text` rendered at `font_size`
    pub fn text_width(&self, text: &str, font_size: u32) -> f64 {
        self.char_run_width(text.chars().count(), font_size)
    }

    /// Estimated width of a run of `chars` characters
    pub(crate) fn char_run_width(&self, chars: usize, font_size: u32) -> f64 {
        chars as f64 * self.glyph_width(font_size)
    }

    /// Check whether `text` fits into `available_width` pixels
    pub fn fits(&self, text: &str, available_width: u32, font_size: u32) -> bool {
        self.text_width(text, font_size) <= available_width as f64
    }
}

impl Default for TextMeasure {
    fn default() -> Self {
        Self::new(DEFAULT_GLYPH_RATIO)
    }
}
