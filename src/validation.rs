//! Field rules checked before any write reaches the store. Both entry points
//! are pure functions of the payload and report the first offending field in
//! column order (title, author, price, quantity, supplier, supplier phone).

use std::fmt;

use thiserror::Error;

use crate::models::{BookField, ChangeSet, FieldValue};

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Required on insert but not supplied.
    Missing,
    /// Text with no visible characters.
    Empty,
    /// Number below zero, or a price that is not a number at all.
    Negative,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing => f.write_str("missing"),
            Violation::Empty => f.write_str("empty"),
            Violation::Negative => f.write_str("negative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("book requires a valid {field} ({violation})")]
pub struct ValidationError {
    pub field: BookField,
    pub violation: Violation,
}

impl ValidationError {
    fn new(field: BookField, violation: Violation) -> Self {
        Self { field, violation }
    }
}

/// Every writable field must be present and valid.
pub fn validate_insert(changes: &ChangeSet) -> Result<(), ValidationError> {
    for field in BookField::WRITABLE {
        match changes.get(field) {
            Some(value) => check_field(field, &value)?,
            None => return Err(ValidationError::new(field, Violation::Missing)),
        }
    }
    Ok(())
}

/// Only staged fields are checked; an empty change set passes.
pub fn validate_update(changes: &ChangeSet) -> Result<(), ValidationError> {
    for (field, value) in changes.entries() {
        check_field(field, &value)?;
    }
    Ok(())
}

fn check_field(field: BookField, value: &FieldValue) -> Result<(), ValidationError> {
    let violation = match value {
        FieldValue::Text(text) if text.trim().is_empty() => Some(Violation::Empty),
        FieldValue::Integer(number) if *number < 0 => Some(Violation::Negative),
        FieldValue::Real(number) if number.is_nan() || *number < 0.0 => {
            Some(Violation::Negative)
        }
        _ => None,
    };

    match violation {
        Some(violation) => Err(ValidationError::new(field, violation)),
        None => Ok(()),
    }
}
