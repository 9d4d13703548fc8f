//! Phonebook domain model.
//!
//! # Responsibility
//! - Define the single persisted record (`Person`) and its validation rules.
//!
//! # Invariants
//! - A person is identified by its phone number; there is no surrogate ID.

pub mod person;
