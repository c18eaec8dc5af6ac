//! REST client for the check server

use crate::api::{BankApi, CheckRequest, IssuedCheck};
use crate::config::ClientConfig;
use crate::{ApiError, ApiResult};
use async_trait::async_trait;
use check_template::{Bank, BankId, BankPositions, WireBank, WireBankList};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// [`BankApi`] talking to the REST server
#[derive(Debug, Clone)]
pub struct HttpBankApi {
    client: Client,
    base: Url,
}

impl HttpBankApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("checkfill/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, config.base_url()?))
    }

    /// Use an existing reqwest client
    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        endpoint(&self.base, path)
    }
}

#[async_trait]
impl BankApi for HttpBankApi {
    async fn list_banks(&self) -> ApiResult<Vec<Bank>> {
        let url = self.endpoint("/api/banks");
        debug!(%url, "listing banks");

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, None).await?;
        let list: WireBankList = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(list.banks.into_iter().map(WireBank::into_bank).collect())
    }

    async fn update_positions(&self, id: BankId, positions: &BankPositions) -> ApiResult<Bank> {
        let url = self.endpoint(&format!("/api/banks/{id}/positions"));
        debug!(%url, bank_id = %id, "saving positions");

        let response = self.client.patch(&url).json(positions).send().await?;
        let response = check_status(response, Some(id)).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        decode_bank(body)
    }

    async fn create_check(&self, request: &CheckRequest) -> ApiResult<IssuedCheck> {
        let url = self.endpoint("/api/checks");

        let mut body = serde_json::to_value(request)?;
        if let Value::Object(map) = &mut body {
            // the server files checks by wilaya
            map.insert("wilaya".to_string(), Value::String(request.city.clone()));
        }

        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status(response, None).await?;
        let text = response.text().await?;

        Ok(IssuedCheck {
            id: check_id(&text),
            check: request.clone(),
        })
    }
}

/// Join an API path onto the base URL
fn endpoint(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

/// Map non-success responses to errors
async fn check_status(response: Response, bank: Option<BankId>) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "request failed");
    Err(status_error(status, &body, bank))
}

fn status_error(status: StatusCode, body: &str, bank: Option<BankId>) -> ApiError {
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = bank {
            return ApiError::NotFound(id);
        }
    }

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message", "Message"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string());

    ApiError::Server {
        status: status.as_u16(),
        message,
    }
}

/// Bank from `{"bank": {...}}` or a bare bank object
fn decode_bank(body: Value) -> ApiResult<Bank> {
    let value = match body {
        Value::Object(mut map) => match map.remove("bank").or_else(|| map.remove("Bank")) {
            Some(bank) => bank,
            None => Value::Object(map),
        },
        other => other,
    };
    let wire: WireBank = serde_json::from_value(value)?;
    Ok(wire.into_bank())
}

/// Id of a created check, from `{"id"}` or `{"check": {"id"}}`
fn check_id(body: &str) -> Option<u64> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("id")
        .or_else(|| value.get("check").and_then(|c| c.get("id")))
        .and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use check_template::{default_positions, FieldPosition};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_endpoint() {
        let base = Url::parse("http://localhost:5000").unwrap();
        assert_eq!(endpoint(&base, "/api/banks"), "http://localhost:5000/api/banks");

        let base = Url::parse("https://cheques.example.dz/backend/").unwrap();
        assert_eq!(
            endpoint(&base, "/api/banks/3/positions"),
            "https://cheques.example.dz/backend/api/banks/3/positions"
        );
    }

    #[test]
    fn test_status_error_not_found_for_bank() {
        let err = status_error(StatusCode::NOT_FOUND, "{}", Some(BankId(3)));
        assert!(matches!(err, ApiError::NotFound(BankId(3))));
    }

    #[test]
    fn test_status_error_uses_server_message() {
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error": "Failed to update bank"}"#,
            Some(BankId(3)),
        );
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to update bank");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_reads_message_key() {
        let err = status_error(
            StatusCode::NOT_FOUND,
            r#"{"message": "Banque non trouvée"}"#,
            None,
        );
        assert!(matches!(
            err,
            ApiError::Server { status: 404, message } if message == "Banque non trouvée"
        ));
    }

    #[test]
    fn test_status_error_plain_body() {
        let err = status_error(StatusCode::NOT_FOUND, "no such route\n", None);
        assert!(matches!(
            err,
            ApiError::Server { status: 404, message } if message == "no such route"
        ));
    }

    #[test]
    fn test_decode_bank_wrapped() {
        let body = json!({
            "bank": {
                "id": 3,
                "code": "CPA",
                "name": "Crédit Populaire",
                "positionsJson": "{\"amountInWordsLine2\":{\"x\":120,\"y\":265,\"width\":500,\"fontSize\":12}}"
            }
        });
        let bank = decode_bank(body).unwrap();
        assert_eq!(bank.id, BankId(3));
        assert_eq!(
            bank.positions.amount_in_words_line2,
            Some(FieldPosition::new(120, 265, 500, 12))
        );
        assert_eq!(bank.positions.city, default_positions().city);
    }

    #[test]
    fn test_decode_bank_bare() {
        let bank = decode_bank(json!({"Id": 8, "Code": "BDL"})).unwrap();
        assert_eq!(bank.code, "BDL");
    }

    #[test]
    fn test_check_id() {
        assert_eq!(check_id(r#"{"id": 12}"#), Some(12));
        assert_eq!(check_id(r#"{"check": {"id": 4}}"#), Some(4));
        assert_eq!(check_id("created"), None);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let config = ClientConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
        };
        let api = HttpBankApi::new(&config).unwrap();
        let result = api.list_banks().await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
