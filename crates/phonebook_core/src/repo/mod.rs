//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the phonebook data access contract.
//! - Keep SQLite query details away from service and presentation code.
//!
//! # Invariants
//! - Repository writes enforce `Person::validate()` before persistence.
//! - Storage failures propagate unchanged as `RepoError::Db`.

pub mod person_repo;
