//! Entry form for adding people.
//!
//! # Responsibility
//! - Hold the two text inputs of the add screen.
//! - Submit only when both inputs are non-empty; otherwise do nothing.
//!
//! # Invariants
//! - An ignored submit performs no store mutation and keeps the inputs.
//! - A saved submit clears both inputs.

use crate::model::person::Person;
use crate::repo::person_repo::{PersonRepository, RepoResult};
use crate::service::person_service::PersonService;
use log::debug;

/// Result of [`PersonForm::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored (inserted or replaced) this person.
    Saved(Person),
    /// At least one input was empty; nothing was written.
    Ignored,
}

/// Two-field add form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonForm {
    pub name: String,
    pub phone_number: String,
}

impl PersonForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_phone_number(&mut self, value: impl Into<String>) {
        self.phone_number = value.into();
    }

    /// Whether a submit would write to the store.
    pub fn is_submittable(&self) -> bool {
        !self.name.is_empty() && !self.phone_number.is_empty()
    }

    /// Upserts the inputs, as typed, when both are non-empty.
    ///
    /// # Errors
    /// Storage failures from the service are returned unchanged; the inputs
    /// are kept so the user can retry.
    pub fn submit<R: PersonRepository>(
        &mut self,
        service: &PersonService<R>,
    ) -> RepoResult<SubmitOutcome> {
        if !self.is_submittable() {
            debug!("event=form_submit module=presentation status=ignored");
            return Ok(SubmitOutcome::Ignored);
        }

        let person = Person::new(self.name.as_str(), self.phone_number.as_str());
        service.upsert(&person)?;
        self.clear();
        Ok(SubmitOutcome::Saved(person))
    }

    /// Row-level delete action.
    pub fn delete_row<R: PersonRepository>(
        service: &PersonService<R>,
        person: &Person,
    ) -> RepoResult<()> {
        service.delete(&person.phone_number)
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.phone_number.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::PersonForm;

    #[test]
    fn empty_inputs_are_not_submittable() {
        let mut form = PersonForm::new();
        assert!(!form.is_submittable());

        form.set_name("Ana");
        assert!(!form.is_submittable());

        form.set_phone_number(" ");
        assert!(form.is_submittable());
    }

    #[test]
    fn clear_resets_both_inputs() {
        let mut form = PersonForm {
            name: "Ana".to_string(),
            phone_number: "111".to_string(),
        };
        form.clear();
        assert_eq!(form, PersonForm::default());
    }
}
