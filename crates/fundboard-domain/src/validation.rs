//! Client-side validation mirrored from the server's request schema.
//!
//! Drafts carry raw form text. Validating a draft yields either the typed
//! request body or a set of field-keyed messages, first failing rule per field.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::model::{CreateFundRequest, CreateTransferRequest};

pub const MIN_NAME_LENGTH: usize = 1;
pub const MAX_NAME_LENGTH: usize = 255;
/// Non-blank at both ends, with no line terminator (`\n`, `\r`, U+2028 or
/// U+2029) anywhere in between.
pub const NAME_PATTERN: &str = r"^\S([^\n\r\x{2028}\x{2029}]*\S)?$";
pub const MIN_UNITS: i64 = 1;
pub const MAX_UNITS: i64 = 2_147_483_647;

pub const SELF_TRANSFER_MESSAGE: &str = "Cannot transfer to same owner";

static NAME_REGEX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(NAME_PATTERN).ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    TotalUnits,
    InitialOwner,
    FromOwner,
    ToOwner,
    Units,
}

impl Field {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::TotalUnits => "totalUnits",
            Self::InitialOwner => "initialOwner",
            Self::FromOwner => "fromOwner",
            Self::ToOwner => "toOwner",
            Self::Units => "units",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::TotalUnits => "Total units",
            Self::InitialOwner => "Initial owner",
            Self::FromOwner => "From owner",
            Self::ToOwner => "To owner",
            Self::Units => "Units",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` unless the field already has an error.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundDraft {
    pub name: String,
    pub total_units: String,
    pub initial_owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub from_owner: String,
    pub to_owner: String,
    pub units: String,
}

impl Default for TransferDraft {
    fn default() -> Self {
        Self {
            from_owner: String::new(),
            to_owner: String::new(),
            units: "1".to_string(),
        }
    }
}

#[must_use]
pub fn matches_name_pattern(value: &str) -> bool {
    match NAME_REGEX.as_ref() {
        Some(regex) => regex.is_match(value),
        None => false,
    }
}

/// Validates a name-like field, returning the first failing rule's message.
pub fn check_name(field: Field, value: &str) -> Result<(), String> {
    let label = field.label();
    let length = value.chars().count();
    if length < MIN_NAME_LENGTH {
        return Err(format!("{label} is required"));
    }
    if length > MAX_NAME_LENGTH {
        return Err(format!(
            "{label} must be at most {MAX_NAME_LENGTH} characters"
        ));
    }
    if !matches_name_pattern(value) {
        return Err(format!(
            "{label} cannot have leading or trailing whitespace"
        ));
    }
    Ok(())
}

/// Parses and range-checks a unit count field.
pub fn check_units(field: Field, raw: &str) -> Result<i64, String> {
    let label = field.label();
    let trimmed = raw.trim();
    let value = match trimmed.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            let Ok(float) = trimmed.parse::<f64>() else {
                return Err(format!("{label} must be a number"));
            };
            if !float.is_finite() {
                return Err(format!("{label} must be a number"));
            }
            if float.fract() != 0.0 {
                return Err(format!("{label} must be a whole number"));
            }
            if float < MIN_UNITS as f64 {
                return Err(format!("{label} must be at least {MIN_UNITS}"));
            }
            if float > MAX_UNITS as f64 {
                return Err(format!(
                    "{label} must be at most {}",
                    group_thousands(MAX_UNITS)
                ));
            }
            float as i64
        }
    };
    if value < MIN_UNITS {
        return Err(format!("{label} must be at least {MIN_UNITS}"));
    }
    if value > MAX_UNITS {
        return Err(format!(
            "{label} must be at most {}",
            group_thousands(MAX_UNITS)
        ));
    }
    Ok(value)
}

pub fn validate_create_fund(draft: &FundDraft) -> Result<CreateFundRequest, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Err(message) = check_name(Field::Name, &draft.name) {
        errors.insert(Field::Name, message);
    }
    let total_units = check_units(Field::TotalUnits, &draft.total_units)
        .map_err(|message| errors.insert(Field::TotalUnits, message))
        .ok();
    if let Err(message) = check_name(Field::InitialOwner, &draft.initial_owner) {
        errors.insert(Field::InitialOwner, message);
    }

    match total_units {
        Some(total_units) if errors.is_empty() => Ok(CreateFundRequest {
            name: draft.name.clone(),
            total_units,
            initial_owner: draft.initial_owner.clone(),
        }),
        _ => Err(errors),
    }
}

/// Validates a transfer draft. The returned request carries no idempotency
/// key; callers attach one.
pub fn validate_create_transfer(
    draft: &TransferDraft,
) -> Result<CreateTransferRequest, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Err(message) = check_name(Field::FromOwner, &draft.from_owner) {
        errors.insert(Field::FromOwner, message);
    }
    if let Err(message) = check_name(Field::ToOwner, &draft.to_owner) {
        errors.insert(Field::ToOwner, message);
    }
    let units = check_units(Field::Units, &draft.units)
        .map_err(|message| errors.insert(Field::Units, message))
        .ok();

    if draft.from_owner == draft.to_owner {
        errors.insert(Field::ToOwner, SELF_TRANSFER_MESSAGE);
    }

    match units {
        Some(units) if errors.is_empty() => Ok(CreateTransferRequest {
            idempotency_key: None,
            from_owner: draft.from_owner.clone(),
            to_owner: draft.to_owner.clone(),
            units,
        }),
        _ => Err(errors),
    }
}

/// `1234567` as `1,234,567`.
#[must_use]
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}
