//! Assembler: statement list to plan document
//!
//! Executes statements in order against a single-pass symbol table and the
//! four anchor counters, accumulating the five top-level sections of the
//! plan document. Identifiers must be bound before use; there is no forward
//! reference resolution pass.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use planasm_core::{keys, AnchorCounters, AnchorError, AnchorKind};

use crate::lexer::Span;
use crate::parser::{JsonExpr, Statement, StatementKind, UriRef};

// ============================================================================
// ERRORS
// ============================================================================

/// Errors raised while executing statements.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("unbound identifier {name} at line {line}, column {column}")]
    UnboundIdentifier {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("identifier {name} at line {line}, column {column} is not bound to an anchor")]
    NotAnAnchor {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("duplicate {kind} anchor {anchor} at line {line}, column {column}")]
    DuplicateAnchor {
        kind: AnchorKind,
        anchor: u32,
        line: usize,
        column: usize,
    },

    #[error("{kind} anchor space exhausted at line {line}, column {column}")]
    AnchorExhausted {
        kind: AnchorKind,
        line: usize,
        column: usize,
    },
}

pub type AssembleResult<T> = Result<T, AssembleError>;

// ============================================================================
// ASSEMBLER
// ============================================================================

/// Accumulated state of one assembly run.
///
/// Statements are pushed one at a time; [`Assembler::finish`] packs the
/// sections into the final document. All five top-level keys are always
/// emitted, in a fixed order, so that equal programs produce byte-equal
/// serialized documents.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    symbols: HashMap<String, Value>,
    counters: AnchorCounters,
    extension_uris: Vec<Value>,
    extensions: Vec<Value>,
    relations: Vec<Value>,
    advanced_extensions: Map<String, Value>,
    expected_type_urls: Vec<Value>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one statement against the current state.
    pub fn push(&mut self, statement: &Statement) -> AssembleResult<()> {
        let span = statement.span;
        match &statement.kind {
            StatementKind::ExtensionUri { ident, uri, anchor } => {
                let anchor = self.allocate(AnchorKind::Uri, *anchor, span)?;
                let mut entry = Map::new();
                entry.insert(keys::EXTENSION_URI_ANCHOR.to_string(), Value::from(anchor));
                entry.insert(keys::URI.to_string(), Value::String(uri.clone()));
                self.extension_uris.push(Value::Object(entry));
                self.symbols.insert(ident.clone(), Value::from(anchor));
            }
            StatementKind::Extension {
                kind,
                ident,
                uri_ref,
                name,
                anchor,
            } => {
                let uri_reference = self.resolve_uri_ref(uri_ref, span)?;
                let anchor = self.allocate(kind.anchor_kind(), *anchor, span)?;
                let mut body = Map::new();
                // Reference 0 means "no URI" on the wire and is left implicit.
                if uri_reference != 0 {
                    body.insert(
                        keys::EXTENSION_URI_REFERENCE.to_string(),
                        Value::from(uri_reference),
                    );
                }
                body.insert(kind.anchor_key().to_string(), Value::from(anchor));
                body.insert(keys::NAME.to_string(), Value::String(name.clone()));
                let mut entry = Map::new();
                entry.insert(kind.tag().to_string(), Value::Object(body));
                self.extensions.push(Value::Object(entry));
                self.symbols.insert(ident.clone(), Value::from(anchor));
            }
            StatementKind::ProtoExtension { url } => {
                self.expected_type_urls.push(Value::String(url.clone()));
            }
            StatementKind::Enhancement { value } => {
                let value = self.eval(value, span)?;
                self.advanced_extensions
                    .insert(keys::ENHANCEMENT.to_string(), value);
            }
            StatementKind::Optimization { value } => {
                let value = self.eval(value, span)?;
                self.advanced_extensions
                    .insert(keys::OPTIMIZATION.to_string(), value);
            }
            StatementKind::Execute { ident, names } => {
                let input = self.lookup(ident, span)?;
                let relation = match names {
                    Some(names) => {
                        let mut root = Map::new();
                        root.insert(keys::INPUT.to_string(), input);
                        root.insert(
                            keys::NAMES.to_string(),
                            Value::Array(names.iter().cloned().map(Value::String).collect()),
                        );
                        let mut wrapper = Map::new();
                        wrapper.insert(keys::ROOT.to_string(), Value::Object(root));
                        Value::Object(wrapper)
                    }
                    None => {
                        let mut wrapper = Map::new();
                        wrapper.insert(keys::REL.to_string(), input);
                        Value::Object(wrapper)
                    }
                };
                self.relations.push(relation);
            }
            StatementKind::Raw { ident, value } => {
                let value = self.eval(value, span)?;
                self.symbols.insert(ident.clone(), value);
            }
        }
        Ok(())
    }

    /// Pack the accumulated sections into the plan document.
    pub fn finish(self) -> Value {
        let mut plan = Map::new();
        plan.insert(
            keys::EXTENSION_URIS.to_string(),
            Value::Array(self.extension_uris),
        );
        plan.insert(keys::EXTENSIONS.to_string(), Value::Array(self.extensions));
        plan.insert(keys::RELATIONS.to_string(), Value::Array(self.relations));
        plan.insert(
            keys::ADVANCED_EXTENSIONS.to_string(),
            Value::Object(self.advanced_extensions),
        );
        plan.insert(
            keys::EXPECTED_TYPE_URLS.to_string(),
            Value::Array(self.expected_type_urls),
        );
        Value::Object(plan)
    }

    // ========================================================================
    // EVALUATION
    // ========================================================================

    /// Evaluate a JSON expression to a concrete value.
    ///
    /// `true`, `false` and `null` resolve to the JSON constants before the
    /// symbol table is consulted, so those three names cannot be shadowed.
    fn eval(&self, expr: &JsonExpr, span: Span) -> AssembleResult<Value> {
        match expr {
            JsonExpr::Number(value) => Ok(Value::Number(value.clone())),
            JsonExpr::String(value) => Ok(Value::String(value.clone())),
            JsonExpr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, span)?);
                }
                Ok(Value::Array(values))
            }
            JsonExpr::Object(members) => {
                // Duplicate keys resolve last-write-wins.
                let mut map = Map::new();
                for (key, value) in members {
                    map.insert(key.clone(), self.eval(value, span)?);
                }
                Ok(Value::Object(map))
            }
            JsonExpr::Reference(name) => match name.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "null" => Ok(Value::Null),
                _ => self.lookup(name, span),
            },
        }
    }

    fn lookup(&self, name: &str, span: Span) -> AssembleResult<Value> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| AssembleError::UnboundIdentifier {
                name: name.to_string(),
                line: span.line,
                column: span.column,
            })
    }

    /// Resolve an optional URI reference to its anchor number. Absent means
    /// 0; a bound identifier must hold a non-negative integer.
    fn resolve_uri_ref(&self, uri_ref: &Option<UriRef>, span: Span) -> AssembleResult<u32> {
        match uri_ref {
            None => Ok(0),
            Some(UriRef::Literal(anchor)) => Ok(*anchor),
            Some(UriRef::Binding(name)) => {
                let value = self.lookup(name, span)?;
                value
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| AssembleError::NotAnAnchor {
                        name: name.clone(),
                        line: span.line,
                        column: span.column,
                    })
            }
        }
    }

    fn allocate(
        &mut self,
        kind: AnchorKind,
        override_anchor: Option<u32>,
        span: Span,
    ) -> AssembleResult<u32> {
        self.counters
            .allocate(kind, override_anchor)
            .map_err(|err| match err {
                AnchorError::Collision { kind, anchor } => AssembleError::DuplicateAnchor {
                    kind,
                    anchor,
                    line: span.line,
                    column: span.column,
                },
                AnchorError::Exhausted { kind } => AssembleError::AnchorExhausted {
                    kind,
                    line: span.line,
                    column: span.column,
                },
            })
    }
}

/// Assemble a statement list into a plan document.
pub fn assemble(statements: &[Statement]) -> AssembleResult<Value> {
    let mut assembler = Assembler::new();
    for statement in statements {
        assembler.push(statement)?;
    }
    Ok(assembler.finish())
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::parser::parse;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Assembly output is deterministic down to the serialized bytes.
        #[test]
        fn prop_assemble_is_deterministic(
            overrides in prop::collection::vec(prop::option::of(1u32..1_000_000), 0..12),
        ) {
            let mut source = String::new();
            for (i, override_anchor) in overrides.iter().enumerate() {
                match override_anchor {
                    Some(anchor) => {
                        source.push_str(&format!("using u{} = \"uri{}.yaml\" = {};\n", i, i, anchor));
                    }
                    None => {
                        source.push_str(&format!("using u{} = \"uri{}.yaml\";\n", i, i));
                    }
                }
            }
            let statements = parse(&source).unwrap();
            let first = assemble(&statements);
            let second = assemble(&statements);
            match (first, second) {
                (Ok(a), Ok(b)) => {
                    prop_assert_eq!(
                        serde_json::to_string(&a).unwrap(),
                        serde_json::to_string(&b).unwrap()
                    );
                }
                (a, b) => prop_assert_eq!(a, b),
            }
        }

        /// Without overrides, anchors of one kind count up from 1.
        #[test]
        fn prop_default_anchors_are_sequential(count in 1usize..20) {
            let mut source = String::new();
            for i in 0..count {
                source.push_str(&format!("function f{} = name{};\n", i, i));
            }
            let plan = assemble(&parse(&source).unwrap()).unwrap();
            let extensions = plan["extensions"].as_array().unwrap();
            prop_assert_eq!(extensions.len(), count);
            for (i, entry) in extensions.iter().enumerate() {
                prop_assert_eq!(
                    entry["extensionFunction"]["functionAnchor"].as_u64(),
                    Some(i as u64 + 1)
                );
            }
        }
    }
}
