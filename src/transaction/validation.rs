//! Validation of the JSON payload used to create and edit transactions.

use serde::Deserialize;
use serde_json::Value;

use crate::transaction::core::{NewTransaction, TransactionType};

/// The smallest amount a transaction may have.
pub const MIN_AMOUNT: f64 = 1.0;

/// The raw JSON body for creating or editing a transaction.
///
/// Fields are kept as loosely typed JSON values so that a wrongly typed field
/// is reported as a validation error instead of a parse error.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionPayload {
    /// Should be "income" or "expense".
    #[serde(rename = "type", default)]
    pub transaction_type: Option<Value>,
    /// Should be a non-empty string.
    #[serde(default)]
    pub category: Option<Value>,
    /// Should be a number, or a string holding a number, of at least 1.
    #[serde(default)]
    pub amount: Option<Value>,
    /// Optional description, defaults to the empty string.
    #[serde(default)]
    pub description: Option<Value>,
    /// Should be a non-empty string.
    #[serde(default)]
    pub date: Option<Value>,
    /// Optional display name of the owner, defaults to the empty string.
    #[serde(default)]
    pub name: Option<Value>,
}

/// The reasons a transaction payload can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The type was missing or not one of "income" or "expense".
    #[error("Invalid type")]
    InvalidType,
    /// The category was missing or empty.
    #[error("Category is required")]
    MissingCategory,
    /// The amount was missing, not a number, or less than 1.
    #[error("Amount must be at least 1")]
    InvalidAmount,
    /// The date was missing or empty.
    #[error("Date is required")]
    MissingDate,
}

impl TransactionPayload {
    /// Check the payload and normalize it into a [NewTransaction].
    ///
    /// The checks run in the order type, category, amount, date and the first
    /// failure is returned.
    ///
    /// # Errors
    /// Returns the [ValidationError] for the first field that is invalid.
    pub fn validate(&self) -> Result<NewTransaction, ValidationError> {
        let transaction_type = self
            .transaction_type
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|text| text.parse::<TransactionType>().ok())
            .ok_or(ValidationError::InvalidType)?;

        let category =
            present_text(self.category.as_ref()).ok_or(ValidationError::MissingCategory)?;

        let amount = self
            .amount
            .as_ref()
            .and_then(coerce_to_number)
            .filter(|amount| *amount >= MIN_AMOUNT)
            .ok_or(ValidationError::InvalidAmount)?;

        let date = present_text(self.date.as_ref()).ok_or(ValidationError::MissingDate)?;

        Ok(NewTransaction {
            transaction_type,
            category,
            amount,
            description: string_or_empty(self.description.as_ref()),
            date,
        })
    }

    /// The display name given in the payload, or the empty string.
    pub fn name(&self) -> String {
        string_or_empty(self.name.as_ref())
    }
}

/// The text of a supplied field, or `None` if it is absent or blank.
///
/// `null`, `false`, zero and the empty string count as blank. Other non-string
/// values are kept as their JSON text, e.g. a date given as epoch milliseconds.
fn present_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn string_or_empty(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

/// Interpret a JSON number or numeric string as a finite number.
fn coerce_to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}
