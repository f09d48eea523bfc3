//! Abstract syntax tree for assembly statements

use crate::lexer::Span;
use planasm_core::ExtensionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

// ============================================================================
// AST TYPES
// ============================================================================

/// A JSON expression as written in source: JSON structure plus bare
/// identifier references.
///
/// `true`, `false`, and `null` are carried as references and resolved to
/// their constants during evaluation, so the variant set stays closed over
/// what the grammar can actually produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JsonExpr {
    Number(Number),
    String(String),
    /// Ordered elements.
    Array(Vec<JsonExpr>),
    /// Ordered members; duplicate keys are legal in source and resolved
    /// last-write-wins during evaluation.
    Object(Vec<(String, JsonExpr)>),
    /// A bare identifier: a symbol binding or one of the reserved words.
    Reference(String),
}

impl JsonExpr {
    /// Convert a JSON value into the expression that evaluates back to it.
    pub fn from_value(value: &Value) -> JsonExpr {
        match value {
            Value::Null => JsonExpr::Reference("null".to_string()),
            Value::Bool(true) => JsonExpr::Reference("true".to_string()),
            Value::Bool(false) => JsonExpr::Reference("false".to_string()),
            Value::Number(n) => JsonExpr::Number(n.clone()),
            Value::String(s) => JsonExpr::String(s.clone()),
            Value::Array(items) => {
                JsonExpr::Array(items.iter().map(JsonExpr::from_value).collect())
            }
            Value::Object(members) => JsonExpr::Object(
                members
                    .iter()
                    .map(|(key, value)| (key.clone(), JsonExpr::from_value(value)))
                    .collect(),
            ),
        }
    }
}

/// The extension-URI operand of a function/type/type-variation declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UriRef {
    /// A previously bound identifier.
    Binding(String),
    /// A literal anchor number, for URIs with no declaration in scope.
    Literal(u32),
}

/// One statement of a textual program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement payloads, one per grammar production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `using <ident> = "<uri>" [= <anchor>];`
    ExtensionUri {
        ident: String,
        uri: String,
        anchor: Option<u32>,
    },
    /// `function|type|type_variation <ident> = [<uri>::]<name> [= <anchor>];`
    Extension {
        kind: ExtensionKind,
        ident: String,
        uri_ref: Option<UriRef>,
        name: String,
        anchor: Option<u32>,
    },
    /// `proto_extension "<url>";`
    ProtoExtension { url: String },
    /// `enhancement <json>;`
    Enhancement { value: JsonExpr },
    /// `optimization <json>;`
    Optimization { value: JsonExpr },
    /// `execute <ident>;` or `execute <ident>(<names>);`
    Execute {
        ident: String,
        names: Option<Vec<String>>,
    },
    /// `raw <ident> = <json>;`
    Raw { ident: String, value: JsonExpr },
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Parse error with line/column information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}
