//! Plan-document shape and strict unpacking
//!
//! The plan document is a JSON object with five fixed top-level keys.
//! Assembly builds it directly as a `serde_json::Value`; disassembly
//! starts by unpacking it into the typed parts below, rejecting anything
//! that does not fit the shape.

use crate::anchor::{AnchorKind, ExtensionKind};
use crate::error::{DocumentError, DocumentResult};
use crate::unpack::{ObjectUnpacker, OneOfUnpacker};
use serde_json::Value;

/// Key names of the plan-document wire format.
///
/// Top-level keys are snake_case; entry fields inside them keep the
/// camelCase names of the protobuf JSON serialization.
pub mod keys {
    pub const EXTENSION_URIS: &str = "extension_uris";
    pub const EXTENSIONS: &str = "extensions";
    pub const RELATIONS: &str = "relations";
    pub const ADVANCED_EXTENSIONS: &str = "advanced_extensions";
    pub const EXPECTED_TYPE_URLS: &str = "expected_type_urls";

    pub const EXTENSION_URI_ANCHOR: &str = "extensionUriAnchor";
    pub const URI: &str = "uri";
    pub const EXTENSION_URI_REFERENCE: &str = "extensionUriReference";
    pub const NAME: &str = "name";

    pub const ENHANCEMENT: &str = "enhancement";
    pub const OPTIMIZATION: &str = "optimization";

    pub const ROOT: &str = "root";
    pub const REL: &str = "rel";
    pub const INPUT: &str = "input";
    pub const NAMES: &str = "names";
}

/// One `extension_uris` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct UriEntry {
    pub anchor: u32,
    pub uri: String,
}

/// One `extensions` entry, any of the three tagged kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionEntry {
    pub kind: ExtensionKind,
    pub uri_reference: u32,
    pub anchor: u32,
    pub name: String,
}

/// One `relations` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationEntry {
    /// A `root` wrapper carrying the relation tree and output column names.
    Root { input: Value, names: Vec<String> },
    /// A plain `rel` entry.
    Rel(Value),
}

/// A plan document unpacked into its typed parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanParts {
    pub extension_uris: Vec<UriEntry>,
    pub extensions: Vec<ExtensionEntry>,
    pub relations: Vec<RelationEntry>,
    pub enhancement: Option<Value>,
    pub optimization: Option<Value>,
    pub expected_type_urls: Vec<String>,
}

impl PlanParts {
    /// Unpack a plan document, verifying the full top-level shape.
    ///
    /// Absent keys take their protobuf defaults (empty collections, anchor
    /// zero); present keys must have the right type; unknown keys and
    /// malformed oneof entries are errors. The `enhancement`,
    /// `optimization`, and relation payloads stay arbitrary values, since
    /// assembly places arbitrary bound fragments there.
    pub fn unpack(plan: &Value) -> DocumentResult<Self> {
        let mut u = ObjectUnpacker::new("plan", plan)?;
        let uris_raw = u.array_or_default(keys::EXTENSION_URIS)?;
        let extensions_raw = u.array_or_default(keys::EXTENSIONS)?;
        let relations_raw = u.array_or_default(keys::RELATIONS)?;
        let advanced_raw = u.optional(keys::ADVANCED_EXTENSIONS);
        let expected_type_urls = u.string_array_or_default(keys::EXPECTED_TYPE_URLS)?;
        u.finish()?;

        let mut extension_uris = Vec::with_capacity(uris_raw.len());
        for (index, entry) in uris_raw.iter().enumerate() {
            extension_uris.push(unpack_uri_entry(index, entry)?);
        }

        let mut extensions = Vec::with_capacity(extensions_raw.len());
        for (index, entry) in extensions_raw.iter().enumerate() {
            extensions.push(unpack_extension_entry(index, entry)?);
        }

        let mut relations = Vec::with_capacity(relations_raw.len());
        for (index, entry) in relations_raw.iter().enumerate() {
            relations.push(unpack_relation_entry(index, entry)?);
        }

        let (enhancement, optimization) = match advanced_raw {
            None => (None, None),
            Some(value) => {
                let mut u = ObjectUnpacker::new("advanced extensions", value)?;
                let enhancement = u.optional(keys::ENHANCEMENT).cloned();
                let optimization = u.optional(keys::OPTIMIZATION).cloned();
                u.finish()?;
                (enhancement, optimization)
            }
        };

        Ok(PlanParts {
            extension_uris,
            extensions,
            relations,
            enhancement,
            optimization,
            expected_type_urls,
        })
    }
}

fn unpack_uri_entry(index: usize, entry: &Value) -> DocumentResult<UriEntry> {
    let mut u = ObjectUnpacker::new(format!("extension uri {}", index), entry)?;
    let anchor = anchor_field(&mut u, keys::EXTENSION_URI_ANCHOR, AnchorKind::Uri)?;
    let uri = u.string(keys::URI)?.to_string();
    u.finish()?;
    Ok(UriEntry { anchor, uri })
}

fn unpack_extension_entry(index: usize, entry: &Value) -> DocumentResult<ExtensionEntry> {
    let oneof = OneOfUnpacker::new(format!("extension {}", index), entry)?;
    let kind = match ExtensionKind::ALL
        .iter()
        .find(|kind| kind.tag() == oneof.variant())
    {
        Some(kind) => *kind,
        None => return Err(oneof.unknown()),
    };

    let context = format!("{} extension {}", kind.keyword(), index);
    let mut u = ObjectUnpacker::new(context, oneof.value())?;
    let uri_reference = anchor_field(&mut u, keys::EXTENSION_URI_REFERENCE, AnchorKind::Uri)?;
    let anchor = anchor_field(&mut u, kind.anchor_key(), kind.anchor_kind())?;
    let name = u.string(keys::NAME)?.to_string();
    u.finish()?;

    Ok(ExtensionEntry {
        kind,
        uri_reference,
        anchor,
        name,
    })
}

fn unpack_relation_entry(index: usize, entry: &Value) -> DocumentResult<RelationEntry> {
    let oneof = OneOfUnpacker::new(format!("relation {}", index), entry)?;
    match oneof.variant() {
        k if k == keys::ROOT => {
            let mut u = ObjectUnpacker::new(format!("relation root {}", index), oneof.value())?;
            let input = u.required(keys::INPUT)?.clone();
            let names = u.string_array_or_default(keys::NAMES)?;
            u.finish()?;
            Ok(RelationEntry::Root { input, names })
        }
        k if k == keys::REL => Ok(RelationEntry::Rel(oneof.value().clone())),
        _ => Err(oneof.unknown()),
    }
}

/// An anchor-valued field: absent defaults to 0, anything but an unsigned
/// integer in u32 range is illegal.
fn anchor_field(
    u: &mut ObjectUnpacker<'_>,
    key: &'static str,
    kind: AnchorKind,
) -> DocumentResult<u32> {
    match u.optional(key) {
        None => Ok(0),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| DocumentError::IllegalAnchor {
                kind,
                value: value.to_string(),
            }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_defaults() {
        let parts = PlanParts::unpack(&json!({})).unwrap();
        assert_eq!(parts, PlanParts::default());
    }

    #[test]
    fn test_full_document() {
        let plan = json!({
            "extension_uris": [
                {"extensionUriAnchor": 1, "uri": "functions_arithmetic.yaml"}
            ],
            "extensions": [
                {"extensionFunction": {
                    "extensionUriReference": 1,
                    "functionAnchor": 2,
                    "name": "add"
                }},
                {"extensionTypeVariation": {
                    "typeVariationAnchor": 4,
                    "name": "dense"
                }}
            ],
            "relations": [
                {"rel": {"read": {}}},
                {"root": {"input": {"project": {}}, "names": ["a", "b"]}}
            ],
            "advanced_extensions": {"enhancement": {"x": 1}},
            "expected_type_urls": ["types/custom.proto"]
        });
        let parts = PlanParts::unpack(&plan).unwrap();

        assert_eq!(
            parts.extension_uris,
            vec![UriEntry {
                anchor: 1,
                uri: "functions_arithmetic.yaml".to_string()
            }]
        );
        assert_eq!(
            parts.extensions,
            vec![
                ExtensionEntry {
                    kind: ExtensionKind::Function,
                    uri_reference: 1,
                    anchor: 2,
                    name: "add".to_string(),
                },
                ExtensionEntry {
                    kind: ExtensionKind::TypeVariation,
                    uri_reference: 0,
                    anchor: 4,
                    name: "dense".to_string(),
                },
            ]
        );
        assert_eq!(
            parts.relations,
            vec![
                RelationEntry::Rel(json!({"read": {}})),
                RelationEntry::Root {
                    input: json!({"project": {}}),
                    names: vec!["a".to_string(), "b".to_string()],
                },
            ]
        );
        assert_eq!(parts.enhancement, Some(json!({"x": 1})));
        assert_eq!(parts.optimization, None);
        assert_eq!(parts.expected_type_urls, vec!["types/custom.proto"]);
    }

    #[test]
    fn test_unknown_toplevel_key() {
        let err = PlanParts::unpack(&json!({"relation": []})).unwrap_err();
        assert_eq!(
            err,
            DocumentError::UnknownKeys {
                context: "plan".to_string(),
                keys: "relation".to_string(),
            }
        );
    }

    #[test]
    fn test_uri_entry_requires_uri() {
        let plan = json!({"extension_uris": [{"extensionUriAnchor": 1}]});
        let err = PlanParts::unpack(&plan).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingKey {
                key: "uri".to_string(),
                context: "extension uri 0".to_string(),
            }
        );
    }

    #[test]
    fn test_negative_anchor_is_illegal() {
        let plan = json!({
            "extension_uris": [{"extensionUriAnchor": -3, "uri": "x.yaml"}]
        });
        let err = PlanParts::unpack(&plan).unwrap_err();
        assert_eq!(
            err,
            DocumentError::IllegalAnchor {
                kind: AnchorKind::Uri,
                value: "-3".to_string(),
            }
        );
    }

    #[test]
    fn test_fractional_anchor_is_illegal() {
        let plan = json!({
            "extensions": [
                {"extensionFunction": {"functionAnchor": 1.5, "name": "f"}}
            ]
        });
        assert_eq!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::IllegalAnchor {
                kind: AnchorKind::Function,
                value: "1.5".to_string(),
            }
        );
    }

    #[test]
    fn test_extension_oneof_must_be_singular() {
        let plan = json!({
            "extensions": [
                {"extensionFunction": {"name": "f"}, "extensionType": {"name": "t"}}
            ]
        });
        assert_eq!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::OneOfNotSingular {
                context: "extension 0".to_string()
            }
        );
    }

    #[test]
    fn test_extension_unknown_variant() {
        let plan = json!({"extensions": [{"extensionMystery": {}}]});
        assert_eq!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::UnknownVariant {
                context: "extension 0".to_string(),
                variant: "extensionMystery".to_string(),
            }
        );
    }

    #[test]
    fn test_extension_entry_rejects_unknown_fields() {
        let plan = json!({
            "extensions": [
                {"extensionFunction": {"name": "f", "surprise": true}}
            ]
        });
        assert_eq!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::UnknownKeys {
                context: "function extension 0".to_string(),
                keys: "surprise".to_string(),
            }
        );
    }

    #[test]
    fn test_root_requires_input() {
        let plan = json!({"relations": [{"root": {"names": []}}]});
        assert_eq!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::MissingKey {
                key: "input".to_string(),
                context: "relation root 0".to_string(),
            }
        );
    }

    #[test]
    fn test_root_names_default_to_empty() {
        let plan = json!({"relations": [{"root": {"input": 7}}]});
        let parts = PlanParts::unpack(&plan).unwrap();
        assert_eq!(
            parts.relations,
            vec![RelationEntry::Root {
                input: json!(7),
                names: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_root_names_must_be_strings() {
        let plan = json!({"relations": [{"root": {"input": {}, "names": [1]}}]});
        assert!(matches!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::UnexpectedType { .. }
        ));
    }

    #[test]
    fn test_relation_unknown_variant() {
        let plan = json!({"relations": [{"leaf": {}}]});
        assert_eq!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::UnknownVariant {
                context: "relation 0".to_string(),
                variant: "leaf".to_string(),
            }
        );
    }

    #[test]
    fn test_advanced_extension_values_are_arbitrary() {
        let plan = json!({
            "advanced_extensions": {"enhancement": 42, "optimization": []}
        });
        let parts = PlanParts::unpack(&plan).unwrap();
        assert_eq!(parts.enhancement, Some(json!(42)));
        assert_eq!(parts.optimization, Some(json!([])));
    }

    #[test]
    fn test_advanced_extensions_reject_unknown_keys() {
        let plan = json!({"advanced_extensions": {"futureProof": {}}});
        assert_eq!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::UnknownKeys {
                context: "advanced extensions".to_string(),
                keys: "futureProof".to_string(),
            }
        );
    }

    #[test]
    fn test_expected_type_urls_must_be_strings() {
        let plan = json!({"expected_type_urls": [3]});
        assert!(matches!(
            PlanParts::unpack(&plan).unwrap_err(),
            DocumentError::UnexpectedType { .. }
        ));
    }
}
