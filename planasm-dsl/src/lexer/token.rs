//! Lexer token types

use serde::{Deserialize, Serialize};
use serde_json::Number;

// ============================================================================
// LEXER TYPES
// ============================================================================

/// Token kinds for the planasm assembly language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Using,
    Function,
    Type,
    TypeVariation,
    ProtoExtension,
    Enhancement,
    Optimization,
    Execute,
    Raw,

    // Delimiters
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    DoubleColon,
    Comma,
    Semicolon,
    Equals,

    // Literals
    String(String),
    Number(Number),
    Identifier(String),

    // Special
    Eof,
    Error(String),
}

/// Look up the keyword token for an identifier, if it is one.
///
/// Keywords are case-sensitive: `Using` or `EXECUTE` are ordinary
/// identifiers. The renderer uses this to decide when a bare name
/// must be quoted.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    match ident {
        "using" => Some(TokenKind::Using),
        "function" => Some(TokenKind::Function),
        "type" => Some(TokenKind::Type),
        "type_variation" => Some(TokenKind::TypeVariation),
        "proto_extension" => Some(TokenKind::ProtoExtension),
        "enhancement" => Some(TokenKind::Enhancement),
        "optimization" => Some(TokenKind::Optimization),
        "execute" => Some(TokenKind::Execute),
        "raw" => Some(TokenKind::Raw),
        _ => None,
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
