//! Mobile UI bridge for the phonebook core.

pub mod api;
