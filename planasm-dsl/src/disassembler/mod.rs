//! Disassembler: plan document to statement list
//!
//! Unpacks the document into typed parts, then linearizes each relation
//! tree depth-first so that every hoisted subtree is bound by a `raw`
//! statement before the statement that references it. Which fields hold
//! nested relations or anchor references is decided by a [`PlanSchema`]
//! oracle; the traversal itself knows nothing about relation shapes.
//!
//! Identifiers do not exist in the document, so all of them are invented
//! here. Anchors, on the other hand, are preserved exactly: every emitted
//! declaration forces its anchor so that reassembly reproduces the
//! original numbering no matter what the counters would have chosen.

pub mod naming;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use planasm_core::{
    AnchorKind, DocumentError, FieldClass, PlanParts, PlanSchema, RelationEntry, SchemaError,
    SubstraitSchema,
};

use crate::lexer::Span;
use crate::parser::{JsonExpr, Statement, StatementKind, UriRef};

use self::naming::{make_ident, uri_basename, NameTable, NamingRules};

// ============================================================================
// ERRORS
// ============================================================================

/// Errors raised while disassembling a plan document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisassembleError {
    #[error("malformed plan document: {0}")]
    Document(#[from] DocumentError),

    #[error("schema oracle failure: {0}")]
    Schema(#[from] SchemaError),

    #[error("duplicate {kind} anchor {anchor} in plan document")]
    DuplicateAnchor { kind: AnchorKind, anchor: u32 },
}

pub type DisassembleResult<T> = Result<T, DisassembleError>;

// ============================================================================
// DISASSEMBLER
// ============================================================================

struct Disassembler<'a> {
    schema: &'a dyn PlanSchema,
    rules: &'a NamingRules,
    names: NameTable,
    /// Maps declared anchors back to the identifier bound for them.
    reverse: HashMap<(AnchorKind, u32), String>,
    rel_counter: u32,
    statements: Vec<Statement>,
}

/// Disassemble a plan document into statements.
pub fn disassemble(
    plan: &Value,
    schema: &dyn PlanSchema,
    rules: &NamingRules,
) -> DisassembleResult<Vec<Statement>> {
    let parts = PlanParts::unpack(plan)?;
    let mut disassembler = Disassembler {
        schema,
        rules,
        names: NameTable::new(),
        reverse: HashMap::new(),
        rel_counter: 0,
        statements: Vec::new(),
    };
    disassembler.emit_extension_decls(&parts)?;
    disassembler.emit_proto_decls(&parts);
    disassembler.emit_relations(&parts)?;
    Ok(disassembler.statements)
}

/// [`disassemble`] with the Substrait field schema and default naming rules.
pub fn disassemble_plan(plan: &Value) -> DisassembleResult<Vec<Statement>> {
    disassemble(plan, &SubstraitSchema, &NamingRules::default())
}

impl Disassembler<'_> {
    fn emit_extension_decls(&mut self, parts: &PlanParts) -> DisassembleResult<()> {
        for entry in &parts.extension_uris {
            let ident = self
                .names
                .uniquify(&make_ident(&["uri", uri_basename(&entry.uri)]));
            self.bind_anchor(AnchorKind::Uri, entry.anchor, &ident)?;
            self.push(StatementKind::ExtensionUri {
                ident,
                uri: entry.uri.clone(),
                anchor: Some(entry.anchor),
            });
        }
        for entry in &parts.extensions {
            let alias = self.rules.alias(&entry.name);
            let ident = self
                .names
                .uniquify(&make_ident(&[entry.kind.ident_prefix(), alias]));
            let uri_ref = if entry.uri_reference == 0 {
                None
            } else {
                // A reference to an undeclared URI survives as a literal.
                match self.reverse.get(&(AnchorKind::Uri, entry.uri_reference)) {
                    Some(uri_ident) => Some(UriRef::Binding(uri_ident.clone())),
                    None => Some(UriRef::Literal(entry.uri_reference)),
                }
            };
            self.bind_anchor(entry.kind.anchor_kind(), entry.anchor, &ident)?;
            self.push(StatementKind::Extension {
                kind: entry.kind,
                ident,
                uri_ref,
                name: entry.name.clone(),
                anchor: Some(entry.anchor),
            });
        }
        Ok(())
    }

    /// Protobuf-level extensions carry opaque payloads, so enhancement and
    /// optimization values pass through without anchor rewriting.
    fn emit_proto_decls(&mut self, parts: &PlanParts) {
        for url in &parts.expected_type_urls {
            self.push(StatementKind::ProtoExtension { url: url.clone() });
        }
        if let Some(value) = &parts.enhancement {
            self.push(StatementKind::Enhancement {
                value: JsonExpr::from_value(value),
            });
        }
        if let Some(value) = &parts.optimization {
            self.push(StatementKind::Optimization {
                value: JsonExpr::from_value(value),
            });
        }
    }

    fn emit_relations(&mut self, parts: &PlanParts) -> DisassembleResult<()> {
        for relation in &parts.relations {
            match relation {
                RelationEntry::Root { input, names } => {
                    let ident = self.emit_relation_tree(input)?;
                    self.push(StatementKind::Execute {
                        ident,
                        names: Some(names.clone()),
                    });
                }
                RelationEntry::Rel(value) => {
                    let ident = self.emit_relation_tree(value)?;
                    self.push(StatementKind::Execute { ident, names: None });
                }
            }
        }
        Ok(())
    }

    /// Rewrite one relation tree and bind it to a fresh `rel_<n>` raw
    /// statement. Nested relations are hoisted during the rewrite, so
    /// children always land before their parents and take lower numbers.
    fn emit_relation_tree(&mut self, node: &Value) -> DisassembleResult<String> {
        let value = self.rewrite_value(node)?;
        let ident = self.names.uniquify(&format!("rel_{}", self.rel_counter));
        self.rel_counter += 1;
        self.push(StatementKind::Raw {
            ident: ident.clone(),
            value,
        });
        Ok(ident)
    }

    fn rewrite_value(&mut self, value: &Value) -> DisassembleResult<JsonExpr> {
        match value {
            Value::Object(_) => self.rewrite_node(value),
            Value::Array(elements) => {
                let mut rewritten = Vec::with_capacity(elements.len());
                for element in elements {
                    rewritten.push(self.rewrite_value(element)?);
                }
                Ok(JsonExpr::Array(rewritten))
            }
            leaf => Ok(JsonExpr::from_value(leaf)),
        }
    }

    fn rewrite_node(&mut self, node: &Value) -> DisassembleResult<JsonExpr> {
        let members = match node.as_object() {
            Some(members) => members,
            None => return Ok(JsonExpr::from_value(node)),
        };
        let mut rewritten = Vec::with_capacity(members.len());
        for (key, value) in members {
            let expr = match self.schema.classify(key, value)? {
                FieldClass::Relation => JsonExpr::Reference(self.emit_relation_tree(value)?),
                FieldClass::AnchorRef(kind) => self.rewrite_anchor_ref(kind, value),
                FieldClass::Value => self.rewrite_value(value)?,
            };
            rewritten.push((key.clone(), expr));
        }
        Ok(JsonExpr::Object(rewritten))
    }

    /// Replace an anchor reference with the identifier declared for it.
    /// References to anchors nothing declared stay behind as literals.
    fn rewrite_anchor_ref(&self, kind: AnchorKind, value: &Value) -> JsonExpr {
        let ident = value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .and_then(|anchor| self.reverse.get(&(kind, anchor)));
        match ident {
            Some(ident) => JsonExpr::Reference(ident.clone()),
            None => JsonExpr::from_value(value),
        }
    }

    fn bind_anchor(&mut self, kind: AnchorKind, anchor: u32, ident: &str) -> DisassembleResult<()> {
        if self
            .reverse
            .insert((kind, anchor), ident.to_string())
            .is_some()
        {
            return Err(DisassembleError::DuplicateAnchor { kind, anchor });
        }
        Ok(())
    }

    fn push(&mut self, kind: StatementKind) {
        self.statements.push(Statement::new(kind, Span::default()));
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use planasm_core::ExtensionKind;
    use serde_json::json;

    fn kinds(plan: &Value) -> Vec<StatementKind> {
        disassemble_plan(plan)
            .unwrap()
            .into_iter()
            .map(|statement| statement.kind)
            .collect()
    }

    #[test]
    fn test_disassemble_empty_plan() {
        assert_eq!(kinds(&json!({})), vec![]);
        assert_eq!(
            kinds(&json!({
                "extension_uris": [],
                "extensions": [],
                "relations": [],
                "advanced_extensions": {},
                "expected_type_urls": [],
            })),
            vec![]
        );
    }

    #[test]
    fn test_disassemble_uri_decls_uniquify_basenames() {
        let plan = json!({
            "extension_uris": [
                {"extensionUriAnchor": 1, "uri": "https://example.com/foo.yaml"},
                {"extensionUriAnchor": 2, "uri": "other/foo.core.yaml"},
            ],
        });
        assert_eq!(
            kinds(&plan),
            vec![
                StatementKind::ExtensionUri {
                    ident: "uri_foo".to_string(),
                    uri: "https://example.com/foo.yaml".to_string(),
                    anchor: Some(1),
                },
                StatementKind::ExtensionUri {
                    ident: "uri_foo_2".to_string(),
                    uri: "other/foo.core.yaml".to_string(),
                    anchor: Some(2),
                },
            ]
        );
    }

    #[test]
    fn test_disassemble_extension_decl_with_operator_name() {
        let plan = json!({
            "extension_uris": [
                {"extensionUriAnchor": 1, "uri": "math.yaml"},
            ],
            "extensions": [
                {"extensionFunction": {
                    "extensionUriReference": 1,
                    "functionAnchor": 4,
                    "name": "*",
                }},
            ],
        });
        assert_eq!(
            kinds(&plan)[1],
            StatementKind::Extension {
                kind: ExtensionKind::Function,
                ident: "fn_mult".to_string(),
                uri_ref: Some(UriRef::Binding("uri_math".to_string())),
                name: "*".to_string(),
                anchor: Some(4),
            }
        );
    }

    #[test]
    fn test_disassemble_uri_ref_zero_and_dangling() {
        let plan = json!({
            "extensions": [
                {"extensionType": {"typeAnchor": 1, "name": "point"}},
                {"extensionTypeVariation": {
                    "extensionUriReference": 9,
                    "typeVariationAnchor": 2,
                    "name": "short",
                }},
            ],
        });
        assert_eq!(
            kinds(&plan),
            vec![
                StatementKind::Extension {
                    kind: ExtensionKind::Type,
                    ident: "typ_point".to_string(),
                    uri_ref: None,
                    name: "point".to_string(),
                    anchor: Some(1),
                },
                StatementKind::Extension {
                    kind: ExtensionKind::TypeVariation,
                    ident: "tv_short".to_string(),
                    uri_ref: Some(UriRef::Literal(9)),
                    name: "short".to_string(),
                    anchor: Some(2),
                },
            ]
        );
    }

    #[test]
    fn test_disassemble_forces_zero_anchor() {
        let plan = json!({
            "extension_uris": [{"uri": "foo.yaml"}],
            "extensions": [{"extensionFunction": {"name": "f"}}],
        });
        assert_eq!(
            kinds(&plan),
            vec![
                StatementKind::ExtensionUri {
                    ident: "uri_foo".to_string(),
                    uri: "foo.yaml".to_string(),
                    anchor: Some(0),
                },
                StatementKind::Extension {
                    kind: ExtensionKind::Function,
                    ident: "fn_f".to_string(),
                    uri_ref: None,
                    name: "f".to_string(),
                    anchor: Some(0),
                },
            ]
        );
    }

    #[test]
    fn test_disassemble_proto_decls() {
        let plan = json!({
            "advanced_extensions": {
                "enhancement": {"hint": true},
            },
            "expected_type_urls": ["a/Foo", "b/Bar"],
        });
        assert_eq!(
            kinds(&plan),
            vec![
                StatementKind::ProtoExtension {
                    url: "a/Foo".to_string()
                },
                StatementKind::ProtoExtension {
                    url: "b/Bar".to_string()
                },
                StatementKind::Enhancement {
                    value: JsonExpr::Object(vec![(
                        "hint".to_string(),
                        JsonExpr::Reference("true".to_string()),
                    )]),
                },
            ]
        );
    }

    #[test]
    fn test_disassemble_enhancement_is_not_anchor_rewritten() {
        let plan = json!({
            "extensions": [
                {"extensionFunction": {"functionAnchor": 3, "name": "add"}},
            ],
            "advanced_extensions": {
                "enhancement": {"functionReference": 3},
            },
        });
        let statements = kinds(&plan);
        assert_eq!(
            statements[1],
            StatementKind::Enhancement {
                value: JsonExpr::Object(vec![(
                    "functionReference".to_string(),
                    JsonExpr::Number(3.into()),
                )]),
            }
        );
    }

    #[test]
    fn test_disassemble_plain_relation() {
        let plan = json!({
            "relations": [{"rel": {"read": {"namedTable": {"names": ["t"]}}}}],
        });
        assert_eq!(
            kinds(&plan),
            vec![
                StatementKind::Raw {
                    ident: "rel_0".to_string(),
                    value: JsonExpr::Object(vec![(
                        "read".to_string(),
                        JsonExpr::Object(vec![(
                            "namedTable".to_string(),
                            JsonExpr::Object(vec![(
                                "names".to_string(),
                                JsonExpr::Array(vec![JsonExpr::String("t".to_string())]),
                            )]),
                        )]),
                    )]),
                },
                StatementKind::Execute {
                    ident: "rel_0".to_string(),
                    names: None,
                },
            ]
        );
    }

    #[test]
    fn test_disassemble_hoists_nested_inputs_post_order() {
        let plan = json!({
            "relations": [
                {"root": {
                    "input": {"filter": {"input": {"read": {}}, "condition": true}},
                    "names": ["out"],
                }},
            ],
        });
        assert_eq!(
            kinds(&plan),
            vec![
                StatementKind::Raw {
                    ident: "rel_0".to_string(),
                    value: JsonExpr::Object(vec![("read".to_string(), JsonExpr::Object(vec![]))]),
                },
                StatementKind::Raw {
                    ident: "rel_1".to_string(),
                    value: JsonExpr::Object(vec![(
                        "filter".to_string(),
                        JsonExpr::Object(vec![
                            (
                                "input".to_string(),
                                JsonExpr::Reference("rel_0".to_string()),
                            ),
                            (
                                "condition".to_string(),
                                JsonExpr::Reference("true".to_string()),
                            ),
                        ]),
                    )]),
                },
                StatementKind::Execute {
                    ident: "rel_1".to_string(),
                    names: Some(vec!["out".to_string()]),
                },
            ]
        );
    }

    #[test]
    fn test_disassemble_relation_counter_spans_relations() {
        let plan = json!({
            "relations": [
                {"rel": {"read": {}}},
                {"rel": {"fetch": {"input": {"read": {}}}}},
            ],
        });
        let idents: Vec<String> = disassemble_plan(&plan)
            .unwrap()
            .into_iter()
            .filter_map(|statement| match statement.kind {
                StatementKind::Raw { ident, .. } => Some(ident),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["rel_0", "rel_1", "rel_2"]);
    }

    #[test]
    fn test_disassemble_rewrites_anchor_refs_in_relations() {
        let plan = json!({
            "extensions": [
                {"extensionFunction": {"functionAnchor": 3, "name": "add"}},
                {"extensionType": {"typeAnchor": 1, "name": "point"}},
            ],
            "relations": [
                {"rel": {"project": {"expressions": [
                    {"functionReference": 3},
                    {"functionReference": 99},
                    {"userDefinedTypeReference": 1},
                ]}}},
            ],
        });
        let statements = kinds(&plan);
        assert_eq!(
            statements[2],
            StatementKind::Raw {
                ident: "rel_0".to_string(),
                value: JsonExpr::Object(vec![(
                    "project".to_string(),
                    JsonExpr::Object(vec![(
                        "expressions".to_string(),
                        JsonExpr::Array(vec![
                            JsonExpr::Object(vec![(
                                "functionReference".to_string(),
                                JsonExpr::Reference("fn_add".to_string()),
                            )]),
                            // 99 was never declared and stays numeric.
                            JsonExpr::Object(vec![(
                                "functionReference".to_string(),
                                JsonExpr::Number(99.into()),
                            )]),
                            JsonExpr::Object(vec![(
                                "userDefinedTypeReference".to_string(),
                                JsonExpr::Reference("typ_point".to_string()),
                            )]),
                        ]),
                    )]),
                )]),
            }
        );
    }

    #[test]
    fn test_disassemble_duplicate_anchor_is_rejected() {
        let plan = json!({
            "extension_uris": [
                {"extensionUriAnchor": 1, "uri": "a.yaml"},
                {"extensionUriAnchor": 1, "uri": "b.yaml"},
            ],
        });
        assert_eq!(
            disassemble_plan(&plan),
            Err(DisassembleError::DuplicateAnchor {
                kind: AnchorKind::Uri,
                anchor: 1,
            })
        );
    }

    #[test]
    fn test_disassemble_malformed_documents() {
        assert!(matches!(
            disassemble_plan(&json!([])),
            Err(DisassembleError::Document(_))
        ));
        assert!(matches!(
            disassemble_plan(&json!({"bogus": 1})),
            Err(DisassembleError::Document(_))
        ));
        assert!(matches!(
            disassemble_plan(&json!({"relations": [{"rel": {}, "root": {}}]})),
            Err(DisassembleError::Document(_))
        ));
    }

    #[test]
    fn test_disassemble_schema_errors_propagate() {
        struct Refusing;

        impl PlanSchema for Refusing {
            fn classify(&self, field: &str, _value: &Value) -> Result<FieldClass, SchemaError> {
                Err(SchemaError::Unclassifiable {
                    field: field.to_string(),
                    reason: "no schema loaded".to_string(),
                })
            }
        }

        let plan = json!({"relations": [{"rel": {"read": {}}}]});
        let err = disassemble(&plan, &Refusing, &NamingRules::default()).unwrap_err();
        assert!(matches!(err, DisassembleError::Schema(_)));
    }

    #[test]
    fn test_disassemble_custom_alias() {
        let mut rules = NamingRules::default();
        rules.set_alias("%", "mod");
        let plan = json!({
            "extensions": [
                {"extensionFunction": {"functionAnchor": 1, "name": "%"}},
            ],
        });
        let statements = disassemble(&plan, &SubstraitSchema, &rules).unwrap();
        assert!(matches!(
            &statements[0].kind,
            StatementKind::Extension { ident, .. } if ident == "fn_mod"
        ));
    }
}
