//! Domain types for the glossary service and the validation applied to
//! request payloads before they reach storage.

pub mod types;
pub mod validation;

pub use types::{NewTerm, Term, TermUpdate};
pub use validation::{validate_new_term, validate_term_update, ValidationError};
