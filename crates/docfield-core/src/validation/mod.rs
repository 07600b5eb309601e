//! Checksum validators for identity numbers.

pub mod identity;

pub use identity::{check_letter, validate_identity, validate_nie, validate_nif, IdentityKind};
