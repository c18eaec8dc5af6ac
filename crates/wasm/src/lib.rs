//! WASM bindings for checkfill
//!
//! This crate provides JavaScript-friendly API for:
//! - Splitting an amount in words over one or two lines
//! - French display formatting of amounts and dates
//! - Laying out a bank's check fields over its PDF, for calibration or print
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { CheckLayout, CheckFormatter } from 'checkfill-wasm';
//!
//! await init();
//!
//! const [line1, line2] = CheckFormatter.splitAmountInWords(words, 500, 12);
//!
//! // Bank as returned by GET /api/banks
//! const layout = CheckLayout.fromBank(bank);
//! layout.loadPdf(pdfBytes);
//!
//! // Overlay for the calibration canvas
//! const overlay = layout.renderScaled(values, 'calibration', 800);
//!
//! // Printable PDF
//! const output = layout.printPdf(values);
//! ```

use check_template::{
    default_positions, merge_positions, parse_positions, print_check_pdf, serialize_positions,
    BankPositions, CheckValues, FieldPosition, FieldRole, LayoutConfig, Overlay, OverlayEngine,
    PageGeometry, RenderMode, RenderValues, WireBank,
};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Check text helpers
#[wasm_bindgen]
pub struct CheckFormatter;

#[wasm_bindgen]
impl CheckFormatter {
    /// Split an amount in words over at most two lines
    ///
    /// @param text - Amount in words
    /// @param width - Box width in pixels
    /// @param fontSize - Font size in pixels
    /// @returns [line1, line2], line2 empty when the text fits
    #[wasm_bindgen(js_name = splitAmountInWords)]
    pub fn split_amount_in_words(text: &str, width: u32, font_size: u32) -> js_sys::Array {
        let (line1, line2) = check_text::split_amount_in_words(text, width, font_size);
        js_sys::Array::of2(&JsValue::from_str(&line1), &JsValue::from_str(&line2))
    }

    /// Group the integer digits of an amount by thousands
    ///
    /// @param value - Amount as typed (e.g., "1234567.5")
    /// @returns Grouped amount (e.g., "1 234 567.5")
    #[wasm_bindgen(js_name = formatAmount)]
    pub fn format_amount(value: &str) -> String {
        check_text::format_amount_with_spaces(value)
    }

    /// Convert a yyyy-mm-dd date to dd/mm/yyyy
    ///
    /// @param value - ISO date
    /// @returns French date (e.g., "22/01/2025")
    #[wasm_bindgen(js_name = formatDate)]
    pub fn format_date(value: &str) -> Result<String, JsValue> {
        check_text::format_iso_date_fr(value).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Parse a typed amount
    ///
    /// @param value - Amount as typed, spaces allowed
    /// @returns The amount, or undefined when invalid or not positive
    #[wasm_bindgen(js_name = parseAmount)]
    pub fn parse_amount(value: &str) -> Option<f64> {
        check_text::parse_amount(value)
    }
}

/// Field layout of one bank
#[wasm_bindgen]
pub struct CheckLayout {
    positions: BankPositions,
    engine: OverlayEngine,
    pdf_url: Option<String>,
    pdf_bytes: Option<Vec<u8>>,
    page: Option<PageGeometry>,
}

#[wasm_bindgen]
impl CheckLayout {
    /// Layout with the default positions
    #[wasm_bindgen(constructor)]
    pub fn new() -> CheckLayout {
        Self::with_positions(default_positions())
    }

    /// Create a layout from stored positions JSON
    ///
    /// Missing or invalid fields get their default position.
    ///
    /// @param json - Positions JSON (camelCase or PascalCase keys)
    #[wasm_bindgen(js_name = fromPositionsJson)]
    pub fn from_positions_json(json: &str) -> CheckLayout {
        Self::with_positions(merge_positions(parse_positions(json)))
    }

    /// Create a layout from a bank record of the REST server
    ///
    /// @param bank - Bank object with `positionsJson` or `positions`
    #[wasm_bindgen(js_name = fromBank)]
    pub fn from_bank(bank: JsValue) -> Result<CheckLayout, JsValue> {
        let wire: WireBank = serde_wasm_bindgen::from_value(bank)?;
        let bank = wire.into_bank();
        let mut layout = Self::with_positions(bank.positions);
        layout.pdf_url = bank.pdf_url;
        Ok(layout)
    }

    /// Override layout tunables
    ///
    /// @param config - Partial layout config (e.g., { glyph_ratio: 0.7 })
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: LayoutConfig = serde_wasm_bindgen::from_value(config)?;
        self.engine = OverlayEngine::new(config);
        Ok(())
    }

    /// Positions as stored JSON
    #[wasm_bindgen(js_name = positionsJson)]
    pub fn positions_json(&self) -> String {
        serialize_positions(&self.positions)
    }

    /// PDF path of the bank, if any
    #[wasm_bindgen(getter = pdfUrl)]
    pub fn pdf_url(&self) -> Option<String> {
        self.pdf_url.clone()
    }

    /// Place a field
    ///
    /// @param field - Field key (city, date, payee, amountInWords, amountInWordsLine2, amount, reference)
    #[wasm_bindgen(js_name = setPosition)]
    pub fn set_position(
        &mut self,
        field: &str,
        x: i32,
        y: i32,
        width: u32,
        font_size: u32,
    ) -> Result<(), JsValue> {
        let role: FieldRole = field.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let position = FieldPosition::new(x, y, width, font_size);
        if !position.is_valid() {
            return Err(JsValue::from_str("width and font size must be positive"));
        }
        self.positions.set(role, position);
        Ok(())
    }

    /// Turn the second amount line on or off
    ///
    /// Turning it on places line 2 under line 1.
    #[wasm_bindgen(js_name = setSecondLine)]
    pub fn set_second_line(&mut self, enabled: bool) {
        if !enabled {
            self.positions.clear(FieldRole::AmountInWordsLine2);
        } else if self.positions.amount_in_words_line2.is_none() {
            let offset = self.engine.config().second_line_offset;
            self.positions.amount_in_words_line2 =
                Some(self.positions.amount_in_words.shifted_down(offset));
        }
    }

    #[wasm_bindgen(getter = hasSecondLine)]
    pub fn has_second_line(&self) -> bool {
        self.positions.has_second_line()
    }

    /// Load the check template PDF
    ///
    /// Page 1's size becomes the canvas geometry.
    ///
    /// @param data - PDF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadPdf)]
    pub fn load_pdf(&mut self, data: &[u8]) -> Result<(), JsValue> {
        let size = pdf_core::PdfDocument::open_from_bytes(data)
            .and_then(|doc| doc.page_size(1))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.page = Some(PageGeometry::from_native(size.width, size.height));
        self.pdf_bytes = Some(data.to_vec());
        Ok(())
    }

    /// Record the page size reported by the PDF viewer
    #[wasm_bindgen(js_name = setPageSize)]
    pub fn set_page_size(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.page = Some(PageGeometry::from_native(width, height));
        } else {
            web_sys::console::warn_1(&JsValue::from_str("checkfill: ignoring empty page size"));
        }
    }

    /// Lay out check values at native scale
    ///
    /// @param values - { city, date, payee, amount, amountInWords, reference }
    /// @param mode - "calibration" or "print"
    /// @returns Overlay object
    pub fn render(&self, values: JsValue, mode: &str) -> Result<JsValue, JsValue> {
        let overlay = self.overlay(values, mode, None)?;
        Ok(serde_wasm_bindgen::to_value(&overlay)?)
    }

    /// Lay out check values scaled to a presentation width
    ///
    /// @returns Overlay object
    #[wasm_bindgen(js_name = renderScaled)]
    pub fn render_scaled(
        &self,
        values: JsValue,
        mode: &str,
        presentation_width: f64,
    ) -> Result<JsValue, JsValue> {
        let overlay = self.overlay(values, mode, Some(presentation_width))?;
        Ok(serde_wasm_bindgen::to_value(&overlay)?)
    }

    /// Overlay as a JSON string
    #[wasm_bindgen(js_name = renderJson)]
    pub fn render_json(&self, values: JsValue, mode: &str) -> Result<String, JsValue> {
        let overlay = self.overlay(values, mode, None)?;
        serde_json::to_string(&overlay).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Render the check for printing
    ///
    /// Stamped onto the loaded PDF, or onto a blank page when none is loaded.
    ///
    /// @returns PDF bytes (Uint8Array)
    #[wasm_bindgen(js_name = printPdf)]
    pub fn print_pdf(&self, values: JsValue) -> Result<Vec<u8>, JsValue> {
        let overlay = self.overlay(values, "print", None)?;
        print_check_pdf(self.pdf_bytes.as_deref(), &overlay)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl CheckLayout {
    fn with_positions(positions: BankPositions) -> Self {
        Self {
            positions,
            engine: OverlayEngine::default(),
            pdf_url: None,
            pdf_bytes: None,
            page: None,
        }
    }

    fn overlay(
        &self,
        values: JsValue,
        mode: &str,
        presentation_width: Option<f64>,
    ) -> Result<Overlay, JsValue> {
        let mode: RenderMode = mode.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let input: CheckValues = serde_wasm_bindgen::from_value(values)?;
        Ok(self.layout(&input, mode, presentation_width))
    }

    fn layout(
        &self,
        input: &CheckValues,
        mode: RenderMode,
        presentation_width: Option<f64>,
    ) -> Overlay {
        let values =
            RenderValues::for_positions(&self.positions, &self.engine.config().measure(), input);
        match presentation_width {
            Some(width) => {
                self.engine
                    .render_scaled(&self.positions, &values, mode, self.page, width)
            }
            None => self.engine.render(&self.positions, &values, mode, self.page),
        }
    }
}

impl Default for CheckLayout {
    fn default() -> Self {
        Self::new()
    }
}
