//! Person entity.
//!
//! # Responsibility
//! - Define the record stored in the phonebook.
//! - Validate field contents before persistence and after read-back.
//!
//! # Invariants
//! - `phone_number` is the identity key; at most one stored record per value.
//! - Both fields are non-empty; values are stored exactly as typed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Phone number used as the identity of a [`Person`].
pub type PhoneNumber = String;

/// One phonebook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Display name. Replaced on upsert of the same phone number.
    pub name: String,
    /// Identity key.
    pub phone_number: PhoneNumber,
}

/// Validation failures for [`Person`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonValidationError {
    EmptyName,
    EmptyPhoneNumber,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "person name cannot be empty"),
            Self::EmptyPhoneNumber => write!(f, "person phone_number cannot be empty"),
        }
    }
}

impl Error for PersonValidationError {}

impl Person {
    /// Creates a person without validating fields.
    ///
    /// Call [`Person::validate`] (or go through a repository) before relying
    /// on the invariants.
    pub fn new(name: impl Into<String>, phone_number: impl Into<PhoneNumber>) -> Self {
        Self {
            name: name.into(),
            phone_number: phone_number.into(),
        }
    }

    /// Checks that both fields are non-empty.
    ///
    /// Text is taken as typed; whitespace counts as content. Name is checked
    /// first, so a record with both fields empty reports `EmptyName`.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.name.is_empty() {
            return Err(PersonValidationError::EmptyName);
        }
        if self.phone_number.is_empty() {
            return Err(PersonValidationError::EmptyPhoneNumber);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Person, PersonValidationError};

    #[test]
    fn validate_accepts_filled_fields() {
        assert_eq!(Person::new("Ana", "111").validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_fields() {
        assert_eq!(
            Person::new("", "111").validate(),
            Err(PersonValidationError::EmptyName)
        );
        assert_eq!(
            Person::new("Ana", "").validate(),
            Err(PersonValidationError::EmptyPhoneNumber)
        );
        assert_eq!(
            Person::new("", "").validate(),
            Err(PersonValidationError::EmptyName)
        );
    }

    #[test]
    fn validate_accepts_whitespace_as_content() {
        assert_eq!(Person::new(" ", "111 ").validate(), Ok(()));
    }
}
