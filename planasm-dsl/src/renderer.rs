//! Statement renderer
//!
//! Turns a statement list back into source text. Output is deterministic:
//! the same statements always render to the same bytes, with section
//! comments delimiting the extension declarations, protobuf extensions
//! and each relation group. JSON values print one member per line at two
//! spaces per level, keys always quoted, so diffs stay line-oriented.

use crate::disassembler::naming::is_identifier;
use crate::lexer::keyword;
use crate::parser::{JsonExpr, Statement, StatementKind, UriRef};

/// Render statements as source text.
pub fn render(statements: &[Statement]) -> String {
    let mut out = String::new();
    let mut decl_header = false;
    let mut proto_header = false;
    let mut relation_index = 0usize;
    let mut in_relation_group = false;

    for (i, statement) in statements.iter().enumerate() {
        match &statement.kind {
            StatementKind::ExtensionUri { .. } | StatementKind::Extension { .. } => {
                if !decl_header {
                    out.push_str("\n// Type/function extensions\n");
                    decl_header = true;
                }
                out.push_str(&render_statement(&statement.kind));
                // A blank line closes each run of URI declarations.
                if matches!(statement.kind, StatementKind::ExtensionUri { .. }) {
                    let next_is_uri = matches!(
                        statements.get(i + 1).map(|next| &next.kind),
                        Some(StatementKind::ExtensionUri { .. })
                    );
                    if !next_is_uri {
                        out.push('\n');
                    }
                }
            }
            StatementKind::ProtoExtension { .. }
            | StatementKind::Enhancement { .. }
            | StatementKind::Optimization { .. } => {
                if !proto_header {
                    out.push_str("\n// Protobuf extensions\n");
                    proto_header = true;
                }
                out.push_str(&render_statement(&statement.kind));
            }
            StatementKind::Raw { .. } | StatementKind::Execute { .. } => {
                if !in_relation_group {
                    out.push_str(&format!("\n// Relation {}\n", relation_index));
                    relation_index += 1;
                    in_relation_group = true;
                }
                out.push_str(&render_statement(&statement.kind));
                if matches!(statement.kind, StatementKind::Execute { .. }) {
                    in_relation_group = false;
                }
            }
        }
    }
    out
}

fn render_statement(kind: &StatementKind) -> String {
    match kind {
        StatementKind::ExtensionUri { ident, uri, anchor } => format!(
            "using {} = {}{};\n",
            ident,
            render_string(uri),
            render_anchor(anchor)
        ),
        StatementKind::Extension {
            kind,
            ident,
            uri_ref,
            name,
            anchor,
        } => format!(
            "{} {} = {}{}{};\n",
            kind.keyword(),
            ident,
            render_uri_ref(uri_ref),
            render_name(name),
            render_anchor(anchor)
        ),
        StatementKind::ProtoExtension { url } => {
            format!("proto_extension {};\n", render_string(url))
        }
        StatementKind::Enhancement { value } => {
            format!("enhancement {};\n", render_value(value, ""))
        }
        StatementKind::Optimization { value } => {
            format!("optimization {};\n", render_value(value, ""))
        }
        StatementKind::Execute { ident, names } => {
            let names = match names {
                Some(names) => {
                    let joined = names
                        .iter()
                        .map(|name| render_string(name))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("({})", joined)
                }
                None => String::new(),
            };
            format!("execute {}{};\n", ident, names)
        }
        StatementKind::Raw { ident, value } => {
            format!("raw {} = {};\n\n", ident, render_value(value, ""))
        }
    }
}

fn render_anchor(anchor: &Option<u32>) -> String {
    match anchor {
        Some(anchor) => format!(" = {}", anchor),
        None => String::new(),
    }
}

fn render_uri_ref(uri_ref: &Option<UriRef>) -> String {
    match uri_ref {
        None => String::new(),
        Some(UriRef::Binding(name)) => format!("{}::", name),
        Some(UriRef::Literal(anchor)) => format!("{}::", anchor),
    }
}

/// Extension names render bare when they read back as one token; anything
/// else, keywords included, is quoted.
fn render_name(name: &str) -> String {
    if is_identifier(name) && keyword(name).is_none() {
        name.to_string()
    } else {
        render_string(name)
    }
}

fn render_value(value: &JsonExpr, indent: &str) -> String {
    match value {
        JsonExpr::Reference(name) => name.clone(),
        JsonExpr::Number(number) => number.to_string(),
        JsonExpr::String(value) => render_string(value),
        JsonExpr::Array(elements) => {
            let mut out = String::from("[");
            let inner = format!("{}  ", indent);
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&format!("\n{}", inner));
                out.push_str(&render_value(element, &inner));
            }
            out.push_str(&format!("\n{}]", indent));
            out
        }
        JsonExpr::Object(members) => {
            let mut out = String::from("{");
            let inner = format!("{}  ", indent);
            for (i, (key, value)) in members.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&format!("\n{}{}: ", inner, render_string(key)));
                out.push_str(&render_value(value, &inner));
            }
            out.push_str(&format!("\n{}}}", indent));
            out
        }
    }
}

/// Quote and escape a string literal. Printable ASCII and characters
/// beyond the BMP stay literal; the rest escape to `\uXXXX` or the short
/// forms where one exists.
pub fn render_string(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len() + 2);
    out.push('"');
    for c in contents.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(c),
            c if (c as u32) > 0xFFFF => out.push(c),
            c => out.push_str(&format!("\\u{:04X}", c as u32)),
        }
    }
    out.push('"');
    out
}

// ============================================================================
// TESTS
// ============================================================================
