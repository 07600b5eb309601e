//! Data models shared across the pipeline.

pub mod config;
pub mod document;

pub use config::DocfieldConfig;
pub use document::{ClassProfile, DocumentClass, FieldGroup, FilterKind};
