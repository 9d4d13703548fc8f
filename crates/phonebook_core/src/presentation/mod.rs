//! UI-agnostic presentation state shared by the FFI bridge and the CLI.

pub mod person_form;
