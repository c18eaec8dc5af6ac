//! In-process bank API over a template store

use crate::api::{BankApi, CheckRequest, IssuedCheck};
use crate::{ApiError, ApiResult};
use async_trait::async_trait;
use check_template::{Bank, BankId, BankPositions, BankStorage, TemplateStore};
use tokio::sync::Mutex;
use tracing::info;

/// [`BankApi`] backed by a local [`TemplateStore`]
///
/// Store access is serialized behind an async mutex. Issued checks are kept
/// in memory.
pub struct LocalBankApi<S: BankStorage> {
    store: Mutex<TemplateStore<S>>,
    checks: Mutex<Vec<IssuedCheck>>,
}

impl<S: BankStorage + Send> LocalBankApi<S> {
    pub fn new(store: TemplateStore<S>) -> Self {
        Self {
            store: Mutex::new(store),
            checks: Mutex::new(Vec::new()),
        }
    }

    /// Checks recorded so far
    pub async fn issued_checks(&self) -> Vec<IssuedCheck> {
        self.checks.lock().await.clone()
    }

    /// Give back the store
    pub fn into_store(self) -> TemplateStore<S> {
        self.store.into_inner()
    }
}

#[async_trait]
impl<S: BankStorage + Send> BankApi for LocalBankApi<S> {
    async fn list_banks(&self) -> ApiResult<Vec<Bank>> {
        Ok(self.store.lock().await.list_banks())
    }

    async fn update_positions(&self, id: BankId, positions: &BankPositions) -> ApiResult<Bank> {
        let mut store = self.store.lock().await;
        Ok(store.update_positions(id, positions.clone())?)
    }

    async fn create_check(&self, request: &CheckRequest) -> ApiResult<IssuedCheck> {
        validate_check(request)?;

        let mut checks = self.checks.lock().await;
        let issued = IssuedCheck {
            id: Some(checks.len() as u64 + 1),
            check: request.clone(),
        };
        checks.push(issued.clone());

        info!(bank = %request.bank, amount = request.amount, "check recorded");
        Ok(issued)
    }
}

fn validate_check(request: &CheckRequest) -> ApiResult<()> {
    let missing = [
        ("payee", &request.payee),
        ("city", &request.city),
        ("date", &request.date),
        ("bank", &request.bank),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());

    if let Some((field, _)) = missing {
        return Err(ApiError::Server {
            status: 400,
            message: format!("Champ requis manquant: {field}"),
        });
    }
    if !(request.amount.is_finite() && request.amount > 0.0) {
        return Err(ApiError::Server {
            status: 400,
            message: "Montant invalide".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use check_template::{default_positions, FieldPosition, MemoryStorage, NewBank};

    fn api() -> LocalBankApi<MemoryStorage> {
        let mut store = TemplateStore::open(MemoryStorage::new()).unwrap();
        store
            .create_bank(NewBank {
                code: "BNA".to_string(),
                name: "Banque Nationale".to_string(),
                pdf_url: None,
            })
            .unwrap();
        LocalBankApi::new(store)
    }

    fn request(amount: f64) -> CheckRequest {
        CheckRequest {
            user_id: "u-1".to_string(),
            amount,
            amount_in_words: "mille dinars".to_string(),
            payee: "SARL Atlas".to_string(),
            city: "Oran".to_string(),
            date: "2025-01-22".to_string(),
            reference: String::new(),
            bank: "BNA".to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_positions_round_trip() {
        let api = api();
        let mut positions = default_positions();
        positions.city = FieldPosition::new(1, 2, 3, 4);

        let bank = api.update_positions(BankId(1), &positions).await.unwrap();
        assert_eq!(bank.positions, positions);
        assert_eq!(api.list_banks().await.unwrap()[0].positions, positions);
    }

    #[tokio::test]
    async fn test_update_positions_rejects_zero_width() {
        let api = api();
        let mut positions = default_positions();
        positions.city = FieldPosition::new(60, 110, 0, 13);

        let result = api.update_positions(BankId(1), &positions).await;
        assert!(matches!(
            result,
            Err(ApiError::Server { status: 400, message }) if message.contains("city")
        ));
        assert_eq!(api.list_banks().await.unwrap()[0].positions, default_positions());
    }

    #[tokio::test]
    async fn test_update_unknown_bank() {
        let api = api();
        let result = api.update_positions(BankId(9), &default_positions()).await;
        assert!(matches!(result, Err(ApiError::NotFound(BankId(9)))));
    }

    #[tokio::test]
    async fn test_create_check_assigns_ids() {
        let api = api();
        let first = api.create_check(&request(1000.0)).await.unwrap();
        let second = api.create_check(&request(2000.0)).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(api.issued_checks().await.len(), 2);
    }

    #[tokio::test]
    async fn test_create_check_validation() {
        let api = api();
        assert!(matches!(
            api.create_check(&request(0.0)).await,
            Err(ApiError::Server { status: 400, .. })
        ));

        let mut missing_payee = request(10.0);
        missing_payee.payee = " ".to_string();
        assert!(matches!(
            api.create_check(&missing_payee).await,
            Err(ApiError::Server { status: 400, message }) if message.contains("payee")
        ));
        assert!(api.issued_checks().await.is_empty());
    }
}
