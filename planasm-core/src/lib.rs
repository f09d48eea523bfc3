//! planasm Core - Plan Document Model
//!
//! Data model shared by the assembler and disassembler: anchor counters,
//! the plan-document wire shape, strict JSON unpacking helpers, and the
//! schema oracle that classifies relation fields during disassembly.
//! No parsing or rendering lives here.

pub mod anchor;
pub mod document;
pub mod error;
pub mod schema;
pub mod unpack;

// Re-export key types for convenience
pub use anchor::{AnchorCounters, AnchorKind, ExtensionKind};
pub use document::{keys, ExtensionEntry, PlanParts, RelationEntry, UriEntry};
pub use error::{AnchorError, DocumentError, DocumentResult, SchemaError};
pub use schema::{FieldClass, PlanSchema, SubstraitSchema};
pub use unpack::{ObjectUnpacker, OneOfUnpacker};
