//! Bank template store
//!
//! [`TemplateStore`] owns the bank records and persists them through a
//! [`BankStorage`]. Every mutation is written to storage before the in-memory
//! set is replaced, so a failed write leaves both untouched.

use crate::positions::{
    default_positions, merge_positions, parse_positions, serialize_positions, BankPositions,
    FieldRole,
};
use crate::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Bank identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(pub u64);

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BankId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(BankId)
    }
}

/// A bank with decoded positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: BankId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub positions: BankPositions,
    pub created_at: DateTime<Utc>,
}

/// A bank as persisted, positions kept as serialized JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBank {
    pub id: BankId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub positions_json: String,
    pub created_at: DateTime<Utc>,
}

impl StoredBank {
    /// Decode the stored row, filling missing positions with defaults
    pub fn to_bank(&self) -> Bank {
        Bank {
            id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
            pdf_url: self.pdf_url.clone(),
            positions: merge_positions(parse_positions(&self.positions_json)),
            created_at: self.created_at,
        }
    }
}

impl From<&Bank> for StoredBank {
    fn from(bank: &Bank) -> Self {
        Self {
            id: bank.id,
            code: bank.code.clone(),
            name: bank.name.clone(),
            pdf_url: bank.pdf_url.clone(),
            positions_json: serialize_positions(&bank.positions),
            created_at: bank.created_at,
        }
    }
}

/// Attributes of a bank to create
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBank {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// Bank attributes to change; positions are updated separately
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    /// `Some(None)` removes the PDF
    pub pdf_url: Option<Option<String>>,
}

/// Durable backing for a [`TemplateStore`]
pub trait BankStorage {
    /// Load every stored bank
    fn load(&self) -> StoreResult<Vec<StoredBank>>;

    /// Replace the stored set with `banks`
    fn save(&mut self, banks: &[StoredBank]) -> StoreResult<()>;
}

/// In-process storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    banks: Vec<StoredBank>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with rows
    pub fn with_banks(banks: Vec<StoredBank>) -> Self {
        Self { banks }
    }

    pub fn banks(&self) -> &[StoredBank] {
        &self.banks
    }
}

impl BankStorage for MemoryStorage {
    fn load(&self) -> StoreResult<Vec<StoredBank>> {
        Ok(self.banks.clone())
    }

    fn save(&mut self, banks: &[StoredBank]) -> StoreResult<()> {
        self.banks = banks.to_vec();
        Ok(())
    }
}

/// JSON file storage
///
/// The file holds an array of stored banks. A missing file is an empty
/// store. Writes go to a sibling temporary file which is then renamed over
/// the original.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "banks.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BankStorage for JsonFileStorage {
    fn load(&self) -> StoreResult<Vec<StoredBank>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "bank file missing, starting empty");
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&mut self, banks: &[StoredBank]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(banks)?;
        let temp = self.temp_path();
        fs::write(&temp, data)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// Repository of banks and their field positions
#[derive(Debug)]
pub struct TemplateStore<S: BankStorage> {
    storage: S,
    banks: Vec<StoredBank>,
}

impl<S: BankStorage> TemplateStore<S> {
    /// Open a store, loading every bank from `storage`
    pub fn open(storage: S) -> StoreResult<Self> {
        let banks = storage.load()?;
        debug!(count = banks.len(), "template store opened");
        Ok(Self { storage, banks })
    }

    /// All banks, positions decoded and merged with defaults
    pub fn list_banks(&self) -> Vec<Bank> {
        self.banks.iter().map(StoredBank::to_bank).collect()
    }

    pub fn get_bank(&self, id: BankId) -> StoreResult<Bank> {
        self.banks
            .iter()
            .find(|b| b.id == id)
            .map(StoredBank::to_bank)
            .ok_or(StoreError::NotFound(id))
    }

    /// Create a bank with the default positions
    pub fn create_bank(&mut self, new_bank: NewBank) -> StoreResult<Bank> {
        let code = required(&new_bank.code, "code")?;
        let name = required(&new_bank.name, "name")?;
        if self.banks.iter().any(|b| b.code == code) {
            return Err(StoreError::DuplicateCode(code));
        }

        let id = BankId(self.banks.iter().map(|b| b.id.0).max().unwrap_or(0) + 1);
        let stored = StoredBank {
            id,
            code,
            name,
            pdf_url: blank_to_none(new_bank.pdf_url),
            positions_json: serialize_positions(&default_positions()),
            created_at: Utc::now(),
        };

        let mut next = self.banks.clone();
        next.push(stored.clone());
        self.commit(next)?;

        info!(bank_id = %id, code = %stored.code, "bank created");
        Ok(stored.to_bank())
    }

    /// Change code, name or PDF of a bank; positions are left as they are
    pub fn update_bank(&mut self, id: BankId, update: BankUpdate) -> StoreResult<Bank> {
        let index = self.index_of(id)?;
        let mut next = self.banks.clone();

        if let Some(code) = &update.code {
            let code = required(code, "code")?;
            if self.banks.iter().any(|b| b.id != id && b.code == code) {
                return Err(StoreError::DuplicateCode(code));
            }
            next[index].code = code;
        }
        if let Some(name) = &update.name {
            next[index].name = required(name, "name")?;
        }
        if let Some(pdf_url) = update.pdf_url {
            next[index].pdf_url = blank_to_none(pdf_url);
        }

        let updated = next[index].to_bank();
        self.commit(next)?;

        info!(bank_id = %id, "bank updated");
        Ok(updated)
    }

    /// Replace the whole positions record of a bank
    ///
    /// Every configured field needs a positive width and font size.
    pub fn update_positions(&mut self, id: BankId, positions: BankPositions) -> StoreResult<Bank> {
        let index = self.index_of(id)?;
        validate_positions(&positions)?;
        let mut next = self.banks.clone();
        next[index].positions_json = serialize_positions(&positions);

        let updated = next[index].to_bank();
        self.commit(next)?;

        info!(
            bank_id = %id,
            second_line = positions.has_second_line(),
            "positions updated"
        );
        Ok(updated)
    }

    pub fn delete_bank(&mut self, id: BankId) -> StoreResult<()> {
        let index = self.index_of(id)?;
        let mut next = self.banks.clone();
        next.remove(index);
        self.commit(next)?;

        info!(bank_id = %id, "bank deleted");
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn index_of(&self, id: BankId) -> StoreResult<usize> {
        self.banks
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Persist `next`, then make it the current set
    fn commit(&mut self, next: Vec<StoredBank>) -> StoreResult<()> {
        self.storage.save(&next)?;
        self.banks = next;
        Ok(())
    }
}

fn required(value: &str, field: &str) -> StoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::InvalidBank(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn validate_positions(positions: &BankPositions) -> StoreResult<()> {
    for role in FieldRole::ALL {
        if let Some(position) = positions.get(role) {
            if !position.is_valid() {
                return Err(StoreError::InvalidBank(format!(
                    "{role} width and font size must be positive"
                )));
            }
        }
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::FieldPosition;
    use pretty_assertions::assert_eq;

    fn new_bank(code: &str) -> NewBank {
        NewBank {
            code: code.to_string(),
            name: format!("Banque {code}"),
            pdf_url: None,
        }
    }

    fn store() -> TemplateStore<MemoryStorage> {
        TemplateStore::open(MemoryStorage::new()).unwrap()
    }

    /// Storage whose writes always fail
    struct ReadOnlyStorage(Vec<StoredBank>);

    impl BankStorage for ReadOnlyStorage {
        fn load(&self) -> StoreResult<Vec<StoredBank>> {
            Ok(self.0.clone())
        }

        fn save(&mut self, _banks: &[StoredBank]) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn test_create_bank_uses_default_positions() {
        let mut store = store();
        let bank = store.create_bank(new_bank("BNA")).unwrap();
        assert_eq!(bank.id, BankId(1));
        assert_eq!(bank.positions, default_positions());
        assert_eq!(store.storage().banks().len(), 1);
    }

    #[test]
    fn test_create_bank_assigns_next_id() {
        let mut store = store();
        store.create_bank(new_bank("BNA")).unwrap();
        let second = store.create_bank(new_bank("CPA")).unwrap();
        assert_eq!(second.id, BankId(2));
    }

    #[test]
    fn test_create_bank_rejects_duplicates_and_blanks() {
        let mut store = store();
        store.create_bank(new_bank("BNA")).unwrap();
        assert!(matches!(
            store.create_bank(new_bank("BNA")),
            Err(StoreError::DuplicateCode(code)) if code == "BNA"
        ));
        assert!(matches!(
            store.create_bank(new_bank("  ")),
            Err(StoreError::InvalidBank(_))
        ));
        assert_eq!(store.list_banks().len(), 1);
    }

    #[test]
    fn test_update_positions_replaces_whole_record() {
        let mut store = store();
        let bank = store.create_bank(new_bank("BNA")).unwrap();

        let mut positions = default_positions();
        positions.city = FieldPosition::new(60, 110, 140, 13);
        positions.amount_in_words_line2 = Some(FieldPosition::new(120, 265, 500, 12));

        let updated = store.update_positions(bank.id, positions.clone()).unwrap();
        assert_eq!(updated.positions, positions);
        assert_eq!(updated.code, "BNA");
        assert_eq!(store.get_bank(bank.id).unwrap().positions, positions);
    }

    #[test]
    fn test_update_positions_unknown_id_leaves_store_unchanged() {
        let mut store = store();
        store.create_bank(new_bank("BNA")).unwrap();
        let before = store.list_banks();

        let result = store.update_positions(BankId(99), default_positions());
        assert!(matches!(result, Err(StoreError::NotFound(BankId(99)))));
        assert_eq!(store.list_banks(), before);
        assert_eq!(store.storage().banks().len(), 1);
    }

    #[test]
    fn test_update_positions_rejects_invalid_fields() {
        let mut store = store();
        let bank = store.create_bank(new_bank("BNA")).unwrap();
        let stored_before = store.storage().banks().to_vec();

        let mut positions = default_positions();
        positions.city = FieldPosition::new(60, 110, 0, 13);
        positions.amount_in_words_line2 = Some(FieldPosition::new(120, 265, 500, 0));

        assert!(matches!(
            store.update_positions(bank.id, positions),
            Err(StoreError::InvalidBank(msg)) if msg.starts_with("city")
        ));

        let mut positions = default_positions();
        positions.amount_in_words_line2 = Some(FieldPosition::new(120, 265, 500, 0));
        assert!(matches!(
            store.update_positions(bank.id, positions),
            Err(StoreError::InvalidBank(msg)) if msg.starts_with("amountInWordsLine2")
        ));

        assert_eq!(store.get_bank(bank.id).unwrap().positions, default_positions());
        assert_eq!(store.storage().banks(), stored_before.as_slice());
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let seed = StoredBank {
            id: BankId(7),
            code: "BEA".to_string(),
            name: "Banque Extérieure".to_string(),
            pdf_url: None,
            positions_json: String::new(),
            created_at: Utc::now(),
        };
        let mut store = TemplateStore::open(ReadOnlyStorage(vec![seed])).unwrap();

        let mut positions = default_positions();
        positions.amount = FieldPosition::new(1, 1, 1, 1);
        assert!(matches!(
            store.update_positions(BankId(7), positions),
            Err(StoreError::Io(_))
        ));
        assert_eq!(store.get_bank(BankId(7)).unwrap().positions, default_positions());
    }

    #[test]
    fn test_update_bank_keeps_positions() {
        let mut store = store();
        let bank = store.create_bank(new_bank("BNA")).unwrap();
        let mut positions = default_positions();
        positions.reference = Some(FieldPosition::new(10, 400, 120, 10));
        store.update_positions(bank.id, positions.clone()).unwrap();

        let updated = store
            .update_bank(
                bank.id,
                BankUpdate {
                    name: Some("Banque Nationale".to_string()),
                    pdf_url: Some(Some("uploads/bna.pdf".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Banque Nationale");
        assert_eq!(updated.pdf_url.as_deref(), Some("uploads/bna.pdf"));
        assert_eq!(updated.positions, positions);

        let cleared = store
            .update_bank(
                bank.id,
                BankUpdate {
                    pdf_url: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(cleared.pdf_url.is_none());
    }

    #[test]
    fn test_update_bank_duplicate_code() {
        let mut store = store();
        store.create_bank(new_bank("BNA")).unwrap();
        let cpa = store.create_bank(new_bank("CPA")).unwrap();
        let result = store.update_bank(
            cpa.id,
            BankUpdate {
                code: Some("BNA".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::DuplicateCode(_))));
        assert_eq!(store.get_bank(cpa.id).unwrap().code, "CPA");
    }

    #[test]
    fn test_delete_bank() {
        let mut store = store();
        let bank = store.create_bank(new_bank("BNA")).unwrap();
        store.delete_bank(bank.id).unwrap();
        assert!(store.list_banks().is_empty());
        assert!(matches!(
            store.delete_bank(bank.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_banks_merges_stored_rows() {
        let row = StoredBank {
            id: BankId(3),
            code: "BDL".to_string(),
            name: "BDL".to_string(),
            pdf_url: None,
            positions_json: r#"{"City":{"X":5,"Y":6,"Width":70,"FontSize":9}}"#.to_string(),
            created_at: Utc::now(),
        };
        let store = TemplateStore::open(MemoryStorage::with_banks(vec![row])).unwrap();
        let bank = store.get_bank(BankId(3)).unwrap();
        assert_eq!(bank.positions.city, FieldPosition::new(5, 6, 70, 9));
        assert_eq!(bank.positions.date, default_positions().date);
    }

    #[test]
    fn test_bank_id_parse_and_display() {
        assert_eq!(" 42 ".parse::<BankId>().unwrap(), BankId(42));
        assert!("abc".parse::<BankId>().is_err());
        assert_eq!(BankId(5).to_string(), "5");
    }
}
