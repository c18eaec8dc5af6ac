//! Bank API abstraction

use crate::ApiResult;
use async_trait::async_trait;
use check_template::{Bank, BankId, BankPositions, CheckValues};
use check_text::{format_amount_with_spaces, format_iso_date_fr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A check to record before printing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub user_id: String,
    pub amount: f64,
    pub amount_in_words: String,
    pub payee: String,
    pub city: String,
    /// ISO `yyyy-mm-dd`
    pub date: String,
    #[serde(default)]
    pub reference: String,
    /// Bank code or name as chosen in the form
    pub bank: String,
}

impl CheckRequest {
    /// Values as printed on the check
    ///
    /// The amount is grouped by thousands and an ISO date becomes
    /// `dd/mm/yyyy`; a date in any other form is printed as given.
    pub fn check_values(&self) -> CheckValues {
        CheckValues {
            city: self.city.clone(),
            date: format_iso_date_fr(&self.date).unwrap_or_else(|_| self.date.clone()),
            payee: self.payee.clone(),
            amount: format_amount_with_spaces(&self.amount.to_string()),
            amount_in_words: self.amount_in_words.clone(),
            reference: self.reference.clone(),
        }
    }
}

/// A check accepted by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCheck {
    /// Server id, when the server returns one
    pub id: Option<u64>,
    pub check: CheckRequest,
}

/// Operations the calibration tool and the check form need from the backend
#[async_trait]
pub trait BankApi: Send + Sync {
    /// Every bank, positions already parsed and merged with defaults
    async fn list_banks(&self) -> ApiResult<Vec<Bank>>;

    /// Replace the positions of a bank, returning the updated bank
    async fn update_positions(&self, id: BankId, positions: &BankPositions) -> ApiResult<Bank>;

    /// Record a check
    async fn create_check(&self, request: &CheckRequest) -> ApiResult<IssuedCheck>;
}

#[async_trait]
impl<T: BankApi + ?Sized> BankApi for Arc<T> {
    async fn list_banks(&self) -> ApiResult<Vec<Bank>> {
        (**self).list_banks().await
    }

    async fn update_positions(&self, id: BankId, positions: &BankPositions) -> ApiResult<Bank> {
        (**self).update_positions(id, positions).await
    }

    async fn create_check(&self, request: &CheckRequest) -> ApiResult<IssuedCheck> {
        (**self).create_check(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> CheckRequest {
        CheckRequest {
            user_id: "u-1".to_string(),
            amount: 50342.0,
            amount_in_words: "cinquante mille trois cent quarante-deux dinars algériens".to_string(),
            payee: "SARL Atlas".to_string(),
            city: "Oran".to_string(),
            date: "2025-01-22".to_string(),
            reference: String::new(),
            bank: "BNA".to_string(),
        }
    }

    #[test]
    fn test_check_values_formats_amount_and_date() {
        let values = request().check_values();
        assert_eq!(values.amount, "50 342");
        assert_eq!(values.date, "22/01/2025");
        assert_eq!(values.city, "Oran");
    }

    #[test]
    fn test_check_values_keeps_decimals_and_raw_dates() {
        let mut req = request();
        req.amount = 1234.5;
        req.date = "22/01/2025".to_string();
        let values = req.check_values();
        assert_eq!(values.amount, "1 234.5");
        assert_eq!(values.date, "22/01/2025");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["userId"], "u-1");
        assert!(json["amountInWords"].is_string());
        assert_eq!(json["amount"], 50342.0);
    }
}
