//! Phonebook use-case services.
//!
//! # Responsibility
//! - Forward use-case calls to the repository.
//! - Publish fresh listings to live subscribers after every write.

pub mod person_feed;
pub mod person_service;
