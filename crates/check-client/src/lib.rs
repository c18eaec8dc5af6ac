//! Check Client - calibration and printing on top of the bank API
//!
//! This crate provides:
//! - The [`BankApi`] trait with an in-process ([`LocalBankApi`]) and a REST
//!   ([`HttpBankApi`]) implementation
//! - The calibration controller state machine
//! - The print workflow: record the check, then render it for printing
//!
//! # Example
//!
//! ```ignore
//! use check_client::{CalibrationController, ClientConfig, HttpBankApi};
//! use check_template::{FieldRole, LayoutConfig, PositionProperty};
//!
//! let api = HttpBankApi::new(&ClientConfig::default())?;
//! let mut controller = CalibrationController::new(api, LayoutConfig::default());
//! controller.load(Some("3")).await?;
//! controller.edit(FieldRole::City, PositionProperty::X, 60)?;
//! controller.save().await?;
//! ```

mod api;
mod config;
mod controller;
mod http;
mod local;
mod print;

pub use api::{BankApi, CheckRequest, IssuedCheck};
pub use config::ClientConfig;
pub use controller::{
    CalibrationController, CalibrationResult, CalibrationState, Draft, SaveError,
    SAMPLE_AMOUNT_IN_WORDS,
};
pub use http::HttpBankApi;
pub use local::LocalBankApi;
pub use print::{PrintJob, PrintWorkflow};

use check_template::{BankId, FieldRole, PositionProperty, StoreError};
use thiserror::Error;

/// Errors returned by a [`BankApi`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Bank {0} not found")]
    NotFound(BankId),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            StoreError::DuplicateCode(_) => ApiError::Server {
                status: 409,
                message: e.to_string(),
            },
            StoreError::InvalidBank(_) => ApiError::Server {
                status: 400,
                message: e.to_string(),
            },
            StoreError::Io(_) | StoreError::Json(_) => ApiError::Server {
                status: 500,
                message: e.to_string(),
            },
        }
    }
}

/// Result type for bank API calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors of the calibration controller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("No bank selected")]
    NoBankSelected,

    #[error("Unknown bank {0}")]
    UnknownBank(BankId),

    #[error("Bank {0} has unsaved changes")]
    UnsavedChanges(BankId),

    #[error("Invalid value {value} for {property:?}")]
    InvalidValue {
        property: PositionProperty,
        value: i32,
    },

    #[error("Field {0} is not configured")]
    FieldNotConfigured(FieldRole),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("No changes to save")]
    NothingToSave,

    #[error("{0}")]
    Save(SaveError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            ApiError::from(StoreError::NotFound(BankId(4))),
            ApiError::NotFound(BankId(4))
        );
        assert!(matches!(
            ApiError::from(StoreError::DuplicateCode("BNA".to_string())),
            ApiError::Server { status: 409, .. }
        ));
    }

    #[test]
    fn test_calibration_error_messages() {
        let err = CalibrationError::InvalidValue {
            property: PositionProperty::Width,
            value: 0,
        };
        assert_eq!(err.to_string(), "Invalid value 0 for Width");
        assert_eq!(
            CalibrationError::UnsavedChanges(BankId(2)).to_string(),
            "Bank 2 has unsaved changes"
        );
    }
}
