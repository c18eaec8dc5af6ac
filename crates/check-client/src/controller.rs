//! Calibration controller
//!
//! Drives the calibration tool: one selected bank at a time, an editable
//! draft of its positions, and the save round trip through a [`BankApi`].
//!
//! ```text
//! NoBankSelected ──load──▶ Viewing ──edit/toggle──▶ Editing ──begin_save──▶ Saving
//!                             ▲                       ▲                      │
//!                             └──────── success ──────┼──────────────────────┤
//!                                                     └──── edit ── SaveFailed ◀─ failure
//! ```

use crate::api::BankApi;
use crate::{ApiError, CalibrationError};
use check_template::{
    resolve_pdf_url, Bank, BankId, BankPositions, CheckValues, FieldRole, LayoutConfig, Overlay,
    OverlayEngine, PageGeometry, PositionProperty, RenderMode, RenderValues,
};
use check_text::format_date_fr;
use chrono::NaiveDate;
use std::mem;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Amount in words shown while calibrating
pub const SAMPLE_AMOUNT_IN_WORDS: &str = "cinquante mille trois cent quarante-deux dinars algériens";

/// Result type for controller operations
pub type CalibrationResult<T> = std::result::Result<T, CalibrationError>;

/// Edited positions of the selected bank
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub positions: BankPositions,
    /// Whether the amount in words uses a second line
    pub has_second_line: bool,
}

impl Draft {
    fn from_bank(bank: &Bank) -> Self {
        Self {
            positions: bank.positions.clone(),
            has_second_line: bank.positions.has_second_line(),
        }
    }

    /// Positions to persist: line 2 is dropped when the flag is off
    pub fn finalize(&self) -> BankPositions {
        let mut positions = self.positions.clone();
        if !self.has_second_line {
            positions.amount_in_words_line2 = None;
        }
        positions
    }
}

/// Why a save failed, as shown to the user
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    #[error("bank {0} not found")]
    NotFound(BankId),

    #[error("cannot reach server while saving bank {bank_id}: {message}")]
    Transport { bank_id: BankId, message: String },

    #[error("server error {status} while saving bank {bank_id}: {message}")]
    Server {
        bank_id: BankId,
        status: u16,
        message: String,
    },
}

impl SaveError {
    pub fn from_api(bank_id: BankId, error: ApiError) -> Self {
        match error {
            ApiError::NotFound(id) => SaveError::NotFound(id),
            ApiError::Transport(message) => SaveError::Transport { bank_id, message },
            ApiError::Server { status, message } => SaveError::Server {
                bank_id,
                status,
                message,
            },
            other => SaveError::Server {
                bank_id,
                status: 0,
                message: other.to_string(),
            },
        }
    }

    pub fn bank_id(&self) -> BankId {
        match self {
            SaveError::NotFound(id) => *id,
            SaveError::Transport { bank_id, .. } | SaveError::Server { bank_id, .. } => *bank_id,
        }
    }

    /// Message for the save notification
    pub fn user_message(&self) -> String {
        match self {
            SaveError::NotFound(id) => {
                format!("La banque avec l'ID \"{id}\" n'a pas été trouvée.")
            }
            SaveError::Transport { bank_id, message } => format!(
                "Impossible de se connecter au serveur: {message} (Banque ID: {bank_id})"
            ),
            SaveError::Server {
                bank_id,
                status,
                message,
            } => {
                if message.is_empty() {
                    format!("Erreur {status} (Banque ID: {bank_id})")
                } else {
                    format!("{message} (Banque ID: {bank_id})")
                }
            }
        }
    }
}

/// State of the calibration tool
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationState {
    NoBankSelected,
    Viewing { bank: Bank },
    Editing { bank: Bank, draft: Draft },
    Saving { bank: Bank, draft: Draft },
    SaveFailed {
        bank: Bank,
        draft: Draft,
        error: SaveError,
    },
}

impl CalibrationState {
    /// Selected bank
    pub fn bank(&self) -> Option<&Bank> {
        match self {
            CalibrationState::NoBankSelected => None,
            CalibrationState::Viewing { bank }
            | CalibrationState::Editing { bank, .. }
            | CalibrationState::Saving { bank, .. }
            | CalibrationState::SaveFailed { bank, .. } => Some(bank),
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            CalibrationState::Editing { draft, .. }
            | CalibrationState::Saving { draft, .. }
            | CalibrationState::SaveFailed { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// There are edits that have not been saved
    pub fn has_unsaved_changes(&self) -> bool {
        matches!(
            self,
            CalibrationState::Editing { .. } | CalibrationState::SaveFailed { .. }
        )
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, CalibrationState::Saving { .. })
    }

    /// Short state name for logs
    pub fn name(&self) -> &'static str {
        match self {
            CalibrationState::NoBankSelected => "no_bank_selected",
            CalibrationState::Viewing { .. } => "viewing",
            CalibrationState::Editing { .. } => "editing",
            CalibrationState::Saving { .. } => "saving",
            CalibrationState::SaveFailed { .. } => "save_failed",
        }
    }
}

/// Calibration tool controller
pub struct CalibrationController<A> {
    api: A,
    engine: OverlayEngine,
    banks: Vec<Bank>,
    state: CalibrationState,
    /// Native geometry of the selected bank's loaded PDF
    page: Option<PageGeometry>,
}

impl<A: BankApi> CalibrationController<A> {
    pub fn new(api: A, config: LayoutConfig) -> Self {
        Self {
            api,
            engine: OverlayEngine::new(config),
            banks: Vec::new(),
            state: CalibrationState::NoBankSelected,
            page: None,
        }
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn selected_bank(&self) -> Option<&Bank> {
        self.state.bank()
    }

    /// Load the bank list and select a bank
    ///
    /// Selection priority: `preselected` (compared as text), then the
    /// previously selected bank, then the first bank.
    ///
    /// With unsaved edits, reselecting the same bank keeps the draft and
    /// selecting another one is refused with
    /// [`CalibrationError::UnsavedChanges`], leaving the controller as it was.
    pub async fn load(&mut self, preselected: Option<&str>) -> CalibrationResult<()> {
        if self.state.is_saving() {
            return Err(CalibrationError::SaveInProgress);
        }

        let banks = self.api.list_banks().await?;
        let previous = self.state.bank().map(|b| b.id);

        let next = preselected
            .map(str::trim)
            .and_then(|wanted| banks.iter().find(|b| b.id.to_string() == wanted))
            .or_else(|| previous.and_then(|id| banks.iter().find(|b| b.id == id)))
            .or_else(|| banks.first())
            .cloned();

        info!(
            count = banks.len(),
            selected = ?next.as_ref().map(|b| b.id.0),
            "banks loaded"
        );

        let next_id = next.as_ref().map(|b| b.id);
        if self.state.has_unsaved_changes() {
            if next_id != previous {
                if let Some(current) = previous {
                    return Err(CalibrationError::UnsavedChanges(current));
                }
            }
            self.banks = banks;
            return Ok(());
        }

        if next_id != previous {
            self.page = None;
        }
        self.banks = banks;
        self.state = match next {
            Some(bank) => CalibrationState::Viewing { bank },
            None => CalibrationState::NoBankSelected,
        };
        Ok(())
    }

    /// Switch to another bank
    ///
    /// Refused with [`CalibrationError::UnsavedChanges`] while the current
    /// bank has unsaved edits; use [`Self::discard_and_select`] to confirm.
    pub fn select_bank(&mut self, id: BankId) -> CalibrationResult<()> {
        if self.state.is_saving() {
            return Err(CalibrationError::SaveInProgress);
        }
        if let Some(current) = self.state.bank() {
            if current.id == id {
                return Ok(());
            }
            if self.state.has_unsaved_changes() {
                return Err(CalibrationError::UnsavedChanges(current.id));
            }
        }
        self.switch_to(id)
    }

    /// Switch to another bank, dropping unsaved edits
    pub fn discard_and_select(&mut self, id: BankId) -> CalibrationResult<()> {
        if self.state.is_saving() {
            return Err(CalibrationError::SaveInProgress);
        }
        if self.state.has_unsaved_changes() {
            debug!(bank_id = %id, "discarding unsaved positions");
        }
        self.switch_to(id)
    }

    fn switch_to(&mut self, id: BankId) -> CalibrationResult<()> {
        let bank = self
            .banks
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(CalibrationError::UnknownBank(id))?;

        if self.state.bank().map(|b| b.id) != Some(id) {
            self.page = None;
        }
        self.state = CalibrationState::Viewing { bank };
        Ok(())
    }

    /// Change one property of one field in the draft
    ///
    /// Width and font size must be positive.
    pub fn edit(
        &mut self,
        role: FieldRole,
        property: PositionProperty,
        value: i32,
    ) -> CalibrationResult<()> {
        if matches!(property, PositionProperty::Width | PositionProperty::FontSize) && value <= 0 {
            return Err(CalibrationError::InvalidValue { property, value });
        }

        self.update_draft(|draft| {
            let mut position = *draft
                .positions
                .get(role)
                .ok_or(CalibrationError::FieldNotConfigured(role))?;
            match property {
                PositionProperty::X => position.x = value,
                PositionProperty::Y => position.y = value,
                PositionProperty::Width => position.width = value.unsigned_abs(),
                PositionProperty::FontSize => position.font_size = value.unsigned_abs(),
            }
            draft.positions.set(role, position);
            Ok(())
        })
    }

    /// Turn the second amount line on or off, returning the new flag
    ///
    /// Turning it on for the first time places line 2 under line 1.
    pub fn toggle_second_line(&mut self) -> CalibrationResult<bool> {
        let offset = self.engine.config().second_line_offset;
        let mut enabled = false;
        self.update_draft(|draft| {
            draft.has_second_line = !draft.has_second_line;
            if draft.has_second_line && draft.positions.amount_in_words_line2.is_none() {
                draft.positions.amount_in_words_line2 =
                    Some(draft.positions.amount_in_words.shifted_down(offset));
            }
            enabled = draft.has_second_line;
            Ok(())
        })?;
        Ok(enabled)
    }

    /// Apply `change` to the draft, entering `Editing`
    ///
    /// The state is left untouched when `change` fails.
    fn update_draft<F>(&mut self, change: F) -> CalibrationResult<()>
    where
        F: FnOnce(&mut Draft) -> CalibrationResult<()>,
    {
        let (bank, mut draft) = match &self.state {
            CalibrationState::NoBankSelected => return Err(CalibrationError::NoBankSelected),
            CalibrationState::Saving { .. } => return Err(CalibrationError::SaveInProgress),
            CalibrationState::Viewing { bank } => (bank.clone(), Draft::from_bank(bank)),
            CalibrationState::Editing { bank, draft }
            | CalibrationState::SaveFailed { bank, draft, .. } => (bank.clone(), draft.clone()),
        };

        change(&mut draft)?;
        self.state = CalibrationState::Editing { bank, draft };
        Ok(())
    }

    /// Enter `Saving`, returning the bank id and the positions to send
    pub fn begin_save(&mut self) -> CalibrationResult<(BankId, BankPositions)> {
        let (bank, draft) = match mem::replace(&mut self.state, CalibrationState::NoBankSelected) {
            CalibrationState::Editing { bank, draft }
            | CalibrationState::SaveFailed { bank, draft, .. } => (bank, draft),
            other => {
                let err = if other.is_saving() {
                    CalibrationError::SaveInProgress
                } else {
                    CalibrationError::NothingToSave
                };
                self.state = other;
                return Err(err);
            }
        };

        let request = (bank.id, draft.finalize());
        info!(bank_id = %bank.id, "saving positions");
        self.state = CalibrationState::Saving { bank, draft };
        Ok(request)
    }

    /// Apply the outcome of a save started with [`Self::begin_save`]
    ///
    /// On success the bank list is reloaded and the server's copy of the
    /// bank becomes the viewed one; the bank echoed by the save is used when
    /// the reload fails. On failure the draft is kept in `SaveFailed`.
    pub async fn complete_save(&mut self, result: Result<Bank, ApiError>) -> CalibrationResult<()> {
        let (bank, draft) = match mem::replace(&mut self.state, CalibrationState::NoBankSelected) {
            CalibrationState::Saving { bank, draft } => (bank, draft),
            other => {
                self.state = other;
                return Err(CalibrationError::NothingToSave);
            }
        };

        match result {
            Ok(echoed) => {
                info!(bank_id = %bank.id, "positions saved");
                let confirmed = match self.api.list_banks().await {
                    Ok(banks) => {
                        let confirmed = banks.iter().find(|b| b.id == bank.id).cloned();
                        self.banks = banks;
                        confirmed.unwrap_or(echoed)
                    }
                    Err(e) => {
                        warn!(bank_id = %bank.id, error = %e, "reload after save failed");
                        if let Some(slot) = self.banks.iter_mut().find(|b| b.id == echoed.id) {
                            *slot = echoed.clone();
                        }
                        echoed
                    }
                };
                self.state = CalibrationState::Viewing { bank: confirmed };
                Ok(())
            }
            Err(e) => {
                let error = SaveError::from_api(bank.id, e);
                warn!(bank_id = %bank.id, error = %error, "saving positions failed");
                self.state = CalibrationState::SaveFailed {
                    bank,
                    draft,
                    error: error.clone(),
                };
                Err(CalibrationError::Save(error))
            }
        }
    }

    /// Save the draft through the API
    pub async fn save(&mut self) -> CalibrationResult<()> {
        let (id, positions) = self.begin_save()?;
        let result = self.api.update_positions(id, &positions).await;
        self.complete_save(result).await
    }

    /// Record the native size of the selected bank's PDF once it is loaded
    pub fn on_pdf_loaded(&mut self, width: f64, height: f64) {
        self.page = Some(PageGeometry::from_native(width, height));
    }

    /// Geometry the preview is drawn on
    ///
    /// `None` when the bank has no PDF; the default geometry until the PDF
    /// reports its size.
    pub fn page_geometry(&self) -> Option<PageGeometry> {
        let bank = self.state.bank()?;
        let has_pdf = bank
            .pdf_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty());
        has_pdf.then(|| self.page.unwrap_or(self.engine.config().default_page))
    }

    /// Resolved URL of the selected bank's PDF
    pub fn pdf_url(&self, base: &Url) -> Option<Url> {
        resolve_pdf_url(base, self.state.bank()?.pdf_url.as_deref())
    }

    /// Positions shown in the preview: the draft, or the stored ones
    pub fn current_positions(&self) -> Option<BankPositions> {
        match self.state.draft() {
            Some(draft) => Some(draft.finalize()),
            None => self.state.bank().map(|b| b.positions.clone()),
        }
    }

    /// Sample values for a preview drawn on `today`
    pub fn sample_values(&self, today: NaiveDate) -> Option<RenderValues> {
        let positions = self.current_positions()?;
        let reference = if positions.reference.is_some() {
            "CHQ-0001"
        } else {
            ""
        };
        let input = CheckValues {
            city: "Alger".to_string(),
            date: format_date_fr(today),
            payee: "M. Exemple Bénéficiaire".to_string(),
            amount: "50,342".to_string(),
            amount_in_words: SAMPLE_AMOUNT_IN_WORDS.to_string(),
            reference: reference.to_string(),
        };
        Some(RenderValues::for_positions(
            &positions,
            &self.engine.config().measure(),
            &input,
        ))
    }

    /// Calibration overlay of the selected bank, dated `today`
    pub fn preview_on(&self, today: NaiveDate) -> Option<Overlay> {
        let positions = self.current_positions()?;
        let values = self.sample_values(today)?;
        Some(self.engine.render(
            &positions,
            &values,
            RenderMode::Calibration,
            self.page_geometry(),
        ))
    }

    /// Calibration overlay of the selected bank with today's date
    pub fn preview(&self) -> Option<Overlay> {
        self.preview_on(chrono::Local::now().date_naive())
    }
}
