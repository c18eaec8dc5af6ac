//! Bank field positions: defaults, decoding, merging and serialization

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Rectangle of one printable field, in pixels at PDF scale 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPosition {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Box width (> 0)
    pub width: u32,
    /// Font size (> 0)
    pub font_size: u32,
}

impl FieldPosition {
    pub const fn new(x: i32, y: i32, width: u32, font_size: u32) -> Self {
        Self {
            x,
            y,
            width,
            font_size,
        }
    }

    /// Width and font size are both positive
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.font_size > 0
    }

    /// Same box moved down by `dy` pixels
    pub fn shifted_down(&self, dy: i32) -> Self {
        Self {
            y: self.y.saturating_add(dy),
            ..*self
        }
    }
}

/// The printable fields of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldRole {
    City,
    Date,
    Payee,
    AmountInWords,
    AmountInWordsLine2,
    Amount,
    Reference,
}

impl FieldRole {
    /// All roles, in rendering order
    pub const ALL: [FieldRole; 7] = [
        FieldRole::City,
        FieldRole::Date,
        FieldRole::Payee,
        FieldRole::AmountInWords,
        FieldRole::AmountInWordsLine2,
        FieldRole::Amount,
        FieldRole::Reference,
    ];

    /// camelCase key used in serialized positions
    pub fn key(self) -> &'static str {
        match self {
            FieldRole::City => "city",
            FieldRole::Date => "date",
            FieldRole::Payee => "payee",
            FieldRole::AmountInWords => "amountInWords",
            FieldRole::AmountInWordsLine2 => "amountInWordsLine2",
            FieldRole::Amount => "amount",
            FieldRole::Reference => "reference",
        }
    }

    /// Whether a bank may leave this field unconfigured
    pub fn is_optional(self) -> bool {
        matches!(self, FieldRole::AmountInWordsLine2 | FieldRole::Reference)
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FieldRole {
    type Err = String;

    /// Accepts the camelCase key, ignoring the case of the first letter
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = lower_first(s.trim());
        FieldRole::ALL
            .into_iter()
            .find(|role| role.key() == key)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// Editable property of a [`FieldPosition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionProperty {
    X,
    Y,
    Width,
    FontSize,
}

impl FromStr for PositionProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match lower_first(s.trim()).as_str() {
            "x" => Ok(PositionProperty::X),
            "y" => Ok(PositionProperty::Y),
            "width" => Ok(PositionProperty::Width),
            "fontSize" | "font_size" => Ok(PositionProperty::FontSize),
            _ => Err(format!("unknown property '{s}'")),
        }
    }
}

/// Complete field layout of one bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankPositions {
    pub city: FieldPosition,
    pub date: FieldPosition,
    pub payee: FieldPosition,
    pub amount_in_words: FieldPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_in_words_line2: Option<FieldPosition>,
    pub amount: FieldPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<FieldPosition>,
}

impl BankPositions {
    /// Position of a field, `None` when an optional field is not configured
    pub fn get(&self, role: FieldRole) -> Option<&FieldPosition> {
        match role {
            FieldRole::City => Some(&self.city),
            FieldRole::Date => Some(&self.date),
            FieldRole::Payee => Some(&self.payee),
            FieldRole::AmountInWords => Some(&self.amount_in_words),
            FieldRole::AmountInWordsLine2 => self.amount_in_words_line2.as_ref(),
            FieldRole::Amount => Some(&self.amount),
            FieldRole::Reference => self.reference.as_ref(),
        }
    }

    /// Replace a field's position, configuring optional fields as needed
    pub fn set(&mut self, role: FieldRole, position: FieldPosition) {
        match role {
            FieldRole::City => self.city = position,
            FieldRole::Date => self.date = position,
            FieldRole::Payee => self.payee = position,
            FieldRole::AmountInWords => self.amount_in_words = position,
            FieldRole::AmountInWordsLine2 => self.amount_in_words_line2 = Some(position),
            FieldRole::Amount => self.amount = position,
            FieldRole::Reference => self.reference = Some(position),
        }
    }

    /// Remove an optional field (required fields are left as they are)
    pub fn clear(&mut self, role: FieldRole) {
        match role {
            FieldRole::AmountInWordsLine2 => self.amount_in_words_line2 = None,
            FieldRole::Reference => self.reference = None,
            _ => {}
        }
    }

    /// Whether the amount in words may be split over two lines
    pub fn has_second_line(&self) -> bool {
        self.amount_in_words_line2.is_some()
    }
}

impl Default for BankPositions {
    fn default() -> Self {
        default_positions()
    }
}

/// Decoded positions where every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialBankPositions {
    pub city: Option<FieldPosition>,
    pub date: Option<FieldPosition>,
    pub payee: Option<FieldPosition>,
    pub amount_in_words: Option<FieldPosition>,
    pub amount_in_words_line2: Option<FieldPosition>,
    pub amount: Option<FieldPosition>,
    pub reference: Option<FieldPosition>,
}

impl PartialBankPositions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn slot(&mut self, role: FieldRole) -> &mut Option<FieldPosition> {
        match role {
            FieldRole::City => &mut self.city,
            FieldRole::Date => &mut self.date,
            FieldRole::Payee => &mut self.payee,
            FieldRole::AmountInWords => &mut self.amount_in_words,
            FieldRole::AmountInWordsLine2 => &mut self.amount_in_words_line2,
            FieldRole::Amount => &mut self.amount,
            FieldRole::Reference => &mut self.reference,
        }
    }
}

impl From<BankPositions> for PartialBankPositions {
    fn from(positions: BankPositions) -> Self {
        Self {
            city: Some(positions.city),
            date: Some(positions.date),
            payee: Some(positions.payee),
            amount_in_words: Some(positions.amount_in_words),
            amount_in_words_line2: positions.amount_in_words_line2,
            amount: Some(positions.amount),
            reference: positions.reference,
        }
    }
}

/// Canonical layout given to new banks and used to fill missing fields
pub fn default_positions() -> BankPositions {
    BankPositions {
        city: FieldPosition::new(50, 100, 150, 14),
        date: FieldPosition::new(400, 100, 150, 14),
        payee: FieldPosition::new(120, 180, 400, 14),
        amount_in_words: FieldPosition::new(120, 240, 500, 12),
        amount_in_words_line2: None,
        amount: FieldPosition::new(450, 300, 150, 18),
        reference: None,
    }
}

/// Field as found in stored JSON, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFieldPosition {
    x: f64,
    y: f64,
    width: f64,
    font_size: f64,
}

impl RawFieldPosition {
    fn validate(&self) -> Option<FieldPosition> {
        let x = round_to_i32(self.x)?;
        let y = round_to_i32(self.y)?;
        let width = u32::try_from(round_to_i32(self.width)?).ok()?;
        let font_size = u32::try_from(round_to_i32(self.font_size)?).ok()?;
        let position = FieldPosition::new(x, y, width, font_size);
        position.is_valid().then_some(position)
    }
}

fn round_to_i32(value: f64) -> Option<i32> {
    let rounded = value.round();
    (rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64)
        .then_some(rounded as i32)
}

/// Decode stored positions JSON
///
/// Never fails: malformed JSON, a non-object root or an empty blob yield an
/// empty partial. Keys may be camelCase or PascalCase.
pub fn parse_positions(serialized: &str) -> PartialBankPositions {
    if serialized.trim().is_empty() {
        return PartialBankPositions::default();
    }

    match serde_json::from_str::<Value>(serialized) {
        Ok(value) => decode_positions(value),
        Err(e) => {
            debug!(error = %e, "ignoring malformed positions JSON");
            PartialBankPositions::default()
        }
    }
}

/// Decode an already parsed positions object
///
/// Each field is validated on its own; an invalid field is dropped and the
/// others are kept.
pub fn decode_positions(value: Value) -> PartialBankPositions {
    let mut partial = PartialBankPositions::default();

    let Value::Object(map) = normalize_keys(value) else {
        debug!("ignoring positions that are not a JSON object");
        return partial;
    };

    for role in FieldRole::ALL {
        let Some(raw) = map.get(role.key()) else {
            continue;
        };
        if raw.is_null() {
            continue;
        }

        let position = serde_json::from_value::<RawFieldPosition>(raw.clone())
            .ok()
            .and_then(|raw| raw.validate());
        match position {
            Some(position) => *partial.slot(role) = Some(position),
            None => debug!(field = role.key(), "dropping invalid field position"),
        }
    }

    partial
}

/// Fill every missing required field from [`default_positions`]
///
/// Optional fields are passed through untouched.
pub fn merge_positions(partial: PartialBankPositions) -> BankPositions {
    let defaults = default_positions();
    BankPositions {
        city: partial.city.unwrap_or(defaults.city),
        date: partial.date.unwrap_or(defaults.date),
        payee: partial.payee.unwrap_or(defaults.payee),
        amount_in_words: partial.amount_in_words.unwrap_or(defaults.amount_in_words),
        amount_in_words_line2: partial.amount_in_words_line2,
        amount: partial.amount.unwrap_or(defaults.amount),
        reference: partial.reference,
    }
}

/// Serialize positions as camelCase JSON, omitting unconfigured fields
pub fn serialize_positions(positions: &BankPositions) -> String {
    let mut map = Map::new();
    for role in FieldRole::ALL {
        if let Some(position) = positions.get(role) {
            map.insert(
                role.key().to_string(),
                json!({
                    "x": position.x,
                    "y": position.y,
                    "width": position.width,
                    "fontSize": position.font_size,
                }),
            );
        }
    }
    Value::Object(map).to_string()
}

/// Lower-case the first character of every object key, at every depth
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (lower_first(&key), normalize_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
