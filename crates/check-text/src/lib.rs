//! Check Text - text layout helpers for check printing
//!
//! This crate provides:
//! - Width estimation for check text (monospace-equivalent heuristic)
//! - Amount-in-words splitting over one or two lines
//! - French amount formatting ("1 234 567.50")
//! - French date formatting ("22/01/2025")
//!
//! # Example
//!
//! ```
//! use check_text::{split_amount_in_words, format_amount_with_spaces};
//!
//! let (line1, line2) = split_amount_in_words("mille dinars algériens", 500, 12);
//! assert_eq!(line1, "mille dinars algériens");
//! assert_eq!(line2, "");
//!
//! assert_eq!(format_amount_with_spaces("1234567.50"), "1 234 567.50");
//! ```

mod formatter;
mod measure;
mod wrap;

pub use formatter::{format_amount_with_spaces, format_date_fr, format_iso_date_fr, parse_amount};
pub use measure::{TextMeasure, DEFAULT_GLYPH_RATIO};
pub use wrap::split_amount_in_words;

use thiserror::Error;

/// Errors that can occur during check text processing
#[derive(Debug, Error)]
pub enum CheckTextError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for check text operations
pub type Result<T> = std::result::Result<T, CheckTextError>;
