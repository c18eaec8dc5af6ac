//! Check Template - bank field positions and check overlays
//!
//! This crate provides:
//! - Field position types, defaults, decoding and merging
//! - A bank template store with pluggable storage (memory, JSON file)
//! - The overlay engine laying out check text over a bank's PDF
//! - Stamping an overlay onto the check PDF for printing
//! - Resolution of bank PDF asset URLs and decoding of server bank records
//!
//! # Example
//!
//! ```ignore
//! use check_template::{
//!     CheckValues, JsonFileStorage, OverlayEngine, RenderMode, RenderValues, TemplateStore,
//! };
//!
//! let store = TemplateStore::open(JsonFileStorage::new("banks.json"))?;
//! let bank = store.get_bank("1".parse()?)?;
//!
//! let engine = OverlayEngine::default();
//! let values = RenderValues::for_positions(&bank.positions, &engine.config().measure(), &input);
//! let overlay = engine.render(&bank.positions, &values, RenderMode::Print, None);
//! let pdf = check_template::print_check_pdf(Some(&template_bytes), &overlay)?;
//! ```

mod asset;
mod config;
mod overlay;
mod positions;
mod print;
mod store;
mod wire;

pub use asset::resolve_pdf_url;
pub use config::LayoutConfig;
pub use overlay::{
    Align, Background, Canvas, CheckValues, Overlay, OverlayEngine, PageGeometry, RenderMode,
    RenderValues, RenderedBlock, RgbColor, PLACEHOLDER_MESSAGE,
};
pub use positions::{
    decode_positions, default_positions, merge_positions, normalize_keys, parse_positions,
    serialize_positions, BankPositions, FieldPosition, FieldRole, PartialBankPositions,
    PositionProperty,
};
pub use print::{print_check_pdf, stamp_overlay};
pub use store::{
    Bank, BankId, BankStorage, BankUpdate, JsonFileStorage, MemoryStorage, NewBank, StoreResult,
    StoredBank, TemplateStore,
};
pub use wire::{WireBank, WireBankList};

use thiserror::Error;

/// Errors of the bank template store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Bank {0} not found")]
    NotFound(BankId),

    #[error("Bank code already in use: {0}")]
    DuplicateCode(String),

    #[error("Invalid bank: {0}")]
    InvalidBank(String),

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while rendering or printing checks
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_bank() {
        let err = StoreError::NotFound(BankId(12));
        assert_eq!(err.to_string(), "Bank 12 not found");
    }

    #[test]
    fn test_store_error_converts() {
        let err: TemplateError = StoreError::DuplicateCode("BNA".to_string()).into();
        assert!(matches!(err, TemplateError::Store(StoreError::DuplicateCode(_))));
    }
}
