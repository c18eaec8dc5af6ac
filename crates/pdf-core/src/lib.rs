//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening PDF documents and creating blank pages
//! - Reading page geometry (MediaBox, following inheritance)
//! - Stamping text with the standard Helvetica fonts
//! - Stroking rectangles
//!
//! Coordinates passed to this crate are top-left based, matching the pixel
//! space of a PDF rendered at scale 1. They are converted to PDF bottom-left
//! coordinates internally.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument, StandardFont, TextRun};
//!
//! let mut doc = PdfDocument::open("cheque.pdf")?;
//! let size = doc.page_size(1)?;
//! doc.insert_text(1, &TextRun {
//!     text: "Alger",
//!     x: 50.0,
//!     y: 114.0,
//!     font: StandardFont::Helvetica,
//!     font_size: 14.0,
//!     color: Color::black(),
//! })?;
//! doc.save("out.pdf")?;
//! ```

mod document;
mod text;

pub use document::{PageSize, PdfDocument};
pub use text::{
    encode_win_ansi, generate_rect_operators, generate_text_operators, RectStyle, StandardFont,
    TextRun,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Invalid page size: {0}x{1}")]
    InvalidPageSize(f64, f64),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}
