//! Relation-schema oracle
//!
//! Plan messages arrive as bare JSON with no type information, so the
//! disassembler cannot know on its own which fields of a relation node
//! are nested relations and which integers are anchor references. That
//! knowledge is supplied through the [`PlanSchema`] trait; the traversal
//! itself stays schema-agnostic.

use crate::anchor::AnchorKind;
use crate::error::SchemaError;
use serde_json::Value;

/// How one field inside a relation tree should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Plain data; recurse structurally.
    Value,
    /// A nested relation subtree to hoist into its own binding.
    Relation,
    /// An integer anchor reference of the given kind.
    AnchorRef(AnchorKind),
}

/// Classifies relation-tree fields for the disassembler.
pub trait PlanSchema {
    /// Classify `value` appearing under `field` in a relation node.
    fn classify(&self, field: &str, value: &Value) -> Result<FieldClass, SchemaError>;
}

/// Field classification for Substrait-style plan messages.
///
/// Matching is by field name with a type check on the value, which is the
/// best the JSON serialization allows: an anchor-named field holding a
/// non-integer is treated as plain data rather than rejected, so
/// documents built from arbitrary raw fragments still disassemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstraitSchema;

impl PlanSchema for SubstraitSchema {
    fn classify(&self, field: &str, value: &Value) -> Result<FieldClass, SchemaError> {
        let class = match field {
            "functionReference" | "comparisonFunctionReference" if is_anchor_value(value) => {
                FieldClass::AnchorRef(AnchorKind::Function)
            }
            "userDefinedTypeReference" if is_anchor_value(value) => {
                FieldClass::AnchorRef(AnchorKind::Type)
            }
            "typeVariationReference" if is_anchor_value(value) => {
                FieldClass::AnchorRef(AnchorKind::TypeVariation)
            }
            "input" if value.is_object() => FieldClass::Relation,
            _ => FieldClass::Value,
        };
        Ok(class)
    }
}

fn is_anchor_value(value: &Value) -> bool {
    value
        .as_u64()
        .map(|n| u32::try_from(n).is_ok())
        .unwrap_or(false)
}

// ============================================================================
// TESTS
// ============================================================================
