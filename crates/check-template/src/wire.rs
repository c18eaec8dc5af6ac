//! Bank records as sent by the REST server

use crate::positions::{decode_positions, merge_positions, parse_positions, PartialBankPositions};
use crate::store::{Bank, BankId};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Bank as received over the wire
///
/// Field names may be camelCase or PascalCase. Positions arrive either as a
/// JSON string (`positionsJson`) or as an already decoded object
/// (`positions`); the string wins when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct WireBank {
    #[serde(alias = "Id")]
    pub id: BankId,
    #[serde(default, alias = "Code")]
    pub code: String,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, rename = "pdfUrl", alias = "PdfUrl")]
    pub pdf_url: Option<String>,
    #[serde(default, rename = "positionsJson", alias = "PositionsJson")]
    pub positions_json: Option<String>,
    #[serde(default, alias = "Positions")]
    pub positions: Option<Value>,
    #[serde(default, rename = "createdAt", alias = "CreatedAt")]
    pub created_at: Option<String>,
}

impl WireBank {
    /// Decoded, unmerged positions
    pub fn partial_positions(&self) -> PartialBankPositions {
        match (&self.positions_json, &self.positions) {
            (Some(json), _) if !json.trim().is_empty() => parse_positions(json),
            (_, Some(value)) => decode_positions(value.clone()),
            _ => PartialBankPositions::default(),
        }
    }

    /// Convert to a [`Bank`], filling missing positions with defaults
    pub fn into_bank(self) -> Bank {
        let positions = merge_positions(self.partial_positions());
        Bank {
            id: self.id,
            code: self.code,
            name: self.name,
            pdf_url: self.pdf_url.filter(|u| !u.trim().is_empty()),
            positions,
            created_at: self
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_default(),
        }
    }
}

/// `GET /api/banks` response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireBankList {
    #[serde(default, alias = "Banks")]
    pub banks: Vec<WireBank>,
}

/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS` form of SQL servers
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::{default_positions, FieldPosition};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_positions_json_string() {
        let wire: WireBank = serde_json::from_str(
            r#"{
                "id": 4,
                "code": "BNA",
                "name": "Banque Nationale d'Algérie",
                "pdfUrl": "/uploads/bna.pdf",
                "positionsJson": "{\"city\":{\"x\":60,\"y\":90,\"width\":140,\"fontSize\":13}}",
                "createdAt": "2025-01-22T09:30:00Z"
            }"#,
        )
        .unwrap();

        let bank = wire.into_bank();
        assert_eq!(bank.id, BankId(4));
        assert_eq!(bank.positions.city, FieldPosition::new(60, 90, 140, 13));
        assert_eq!(bank.positions.date, default_positions().date);
        assert_eq!(bank.pdf_url.as_deref(), Some("/uploads/bna.pdf"));
        assert_eq!(bank.created_at.to_rfc3339(), "2025-01-22T09:30:00+00:00");
    }

    #[test]
    fn test_pascal_case_decoded_object() {
        let wire: WireBank = serde_json::from_str(
            r#"{
                "Id": 2,
                "Code": "CPA",
                "Name": "Crédit Populaire",
                "Positions": {"AmountInWordsLine2": {"X": 120, "Y": 265, "Width": 500, "FontSize": 12}},
                "CreatedAt": "2024-11-03 08:15:00"
            }"#,
        )
        .unwrap();

        let bank = wire.into_bank();
        assert_eq!(bank.code, "CPA");
        assert_eq!(
            bank.positions.amount_in_words_line2,
            Some(FieldPosition::new(120, 265, 500, 12))
        );
        assert_eq!(bank.created_at.to_rfc3339(), "2024-11-03T08:15:00+00:00");
    }

    #[test]
    fn test_missing_positions_use_defaults() {
        let wire: WireBank = serde_json::from_str(r#"{"id": 1, "pdfUrl": ""}"#).unwrap();
        let bank = wire.into_bank();
        assert_eq!(bank.positions, default_positions());
        assert!(bank.pdf_url.is_none());
    }

    #[test]
    fn test_malformed_positions_json_falls_back() {
        let wire: WireBank =
            serde_json::from_str(r#"{"id": 1, "positionsJson": "{broken"}"#).unwrap();
        assert_eq!(wire.into_bank().positions, default_positions());
    }

    #[test]
    fn test_bank_list() {
        let list: WireBankList =
            serde_json::from_str(r#"{"banks": [{"id": 1}, {"id": 2}]}"#).unwrap();
        assert_eq!(list.banks.len(), 2);

        let empty: WireBankList = serde_json::from_str("{}").unwrap();
        assert!(empty.banks.is_empty());
    }
}
