//! Error types for plan-document handling

use crate::anchor::AnchorKind;
use thiserror::Error;

/// Errors raised while unpacking a plan document into its typed parts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("expected a JSON object for {context}")]
    NotAnObject { context: String },

    #[error("missing required key {key} in {context}")]
    MissingKey { key: String, context: String },

    #[error("value for key {key} in {context} is not {expected}")]
    UnexpectedType {
        key: String,
        context: String,
        expected: String,
    },

    #[error("unknown key(s) in {context}: {keys}")]
    UnknownKeys { context: String, keys: String },

    #[error("value for oneof field {context} must have a single key")]
    OneOfNotSingular { context: String },

    #[error("unknown oneof variant for {context}: {variant}")]
    UnknownVariant { context: String, variant: String },

    #[error("illegal {kind} anchor value {value}")]
    IllegalAnchor { kind: AnchorKind, value: String },
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Error raised when a relation-schema oracle cannot classify a field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("cannot classify field {field}: {reason}")]
    Unclassifiable { field: String, reason: String },
}

/// Error raised by anchor allocation.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AnchorError {
    #[error("duplicate {kind} anchor {anchor}")]
    Collision { kind: AnchorKind, anchor: u32 },

    #[error("{kind} anchor space exhausted")]
    Exhausted { kind: AnchorKind },
}
