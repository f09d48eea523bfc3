//! Recursive-descent parser for planasm statements
//!
//! Consumes the token stream produced by the lexer and builds the statement
//! list defined in [`crate::parser::ast`]. JSON values are parsed into
//! [`JsonExpr`] trees so that bare identifiers survive as references until
//! assembly resolves them.

use std::mem;

use planasm_core::ExtensionKind;

use super::ast::{JsonExpr, ParseError, Statement, StatementKind, UriRef};
use crate::lexer::{Lexer, Token, TokenKind};

// ============================================================================
// PARSER
// ============================================================================

/// Statement parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the whole token stream into a statement list.
    pub fn parse(&mut self) -> Result<Vec<Statement>, ParseError> {
        // Surface lexer errors before attempting to parse.
        for token in &self.tokens {
            if let TokenKind::Error(message) = &token.kind {
                return Err(ParseError {
                    message: format!("Lexer error: {}", message),
                    line: token.span.line,
                    column: token.span.column,
                });
            }
        }

        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let token = self.current().clone();
        let kind = match token.kind {
            TokenKind::Using => self.parse_extension_uri()?,
            TokenKind::Function => self.parse_extension(ExtensionKind::Function)?,
            TokenKind::Type => self.parse_extension(ExtensionKind::Type)?,
            TokenKind::TypeVariation => self.parse_extension(ExtensionKind::TypeVariation)?,
            TokenKind::ProtoExtension => self.parse_proto_extension()?,
            TokenKind::Enhancement => self.parse_enhancement()?,
            TokenKind::Optimization => self.parse_optimization()?,
            TokenKind::Execute => self.parse_execute()?,
            TokenKind::Raw => self.parse_raw()?,
            other => {
                return Err(self.error(&format!("Expected statement, found {:?}", other)));
            }
        };
        Ok(Statement::new(kind, token.span))
    }

    /// `using <ident> = <uri string> [= <anchor>] ;`
    fn parse_extension_uri(&mut self) -> Result<StatementKind, ParseError> {
        self.expect(TokenKind::Using)?;
        let ident = self.expect_identifier()?;
        self.expect(TokenKind::Equals)?;
        let uri = self.expect_string()?;
        let anchor = self.parse_anchor_override()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StatementKind::ExtensionUri { ident, uri, anchor })
    }

    /// `function|type|type_variation <ident> = [<uri_ref>::] <name> [= <anchor>] ;`
    ///
    /// The URI reference is only present when the token after it is `::`,
    /// which disambiguates `f = u::add` from `f = add = 2` since both start
    /// with an identifier after the equals sign.
    fn parse_extension(&mut self, kind: ExtensionKind) -> Result<StatementKind, ParseError> {
        self.advance(); // declaration keyword
        let ident = self.expect_identifier()?;
        self.expect(TokenKind::Equals)?;

        let uri_ref = if self.next_is(&TokenKind::DoubleColon) {
            let uri_ref = match &self.current().kind {
                TokenKind::Identifier(name) => {
                    let name = name.clone();
                    self.advance();
                    UriRef::Binding(name)
                }
                TokenKind::Number(_) => UriRef::Literal(self.expect_anchor()?),
                other => {
                    return Err(self.error(&format!(
                        "Expected URI reference before '::', found {:?}",
                        other
                    )));
                }
            };
            self.expect(TokenKind::DoubleColon)?;
            Some(uri_ref)
        } else {
            None
        };

        let name = self.expect_name()?;
        let anchor = self.parse_anchor_override()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StatementKind::Extension {
            kind,
            ident,
            uri_ref,
            name,
            anchor,
        })
    }

    /// `proto_extension <url string> ;`
    fn parse_proto_extension(&mut self) -> Result<StatementKind, ParseError> {
        self.expect(TokenKind::ProtoExtension)?;
        let url = self.expect_string()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StatementKind::ProtoExtension { url })
    }

    /// `enhancement <json value> ;`
    fn parse_enhancement(&mut self) -> Result<StatementKind, ParseError> {
        self.expect(TokenKind::Enhancement)?;
        let value = self.parse_json_value()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StatementKind::Enhancement { value })
    }

    /// `optimization <json value> ;`
    fn parse_optimization(&mut self) -> Result<StatementKind, ParseError> {
        self.expect(TokenKind::Optimization)?;
        let value = self.parse_json_value()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StatementKind::Optimization { value })
    }

    /// `execute <ident> [( <name strings> )] ;`
    ///
    /// Names are comma-separated with one trailing comma tolerated, like
    /// every other list in the language. An empty pair of parentheses is
    /// still a root relation, just one without output names.
    fn parse_execute(&mut self) -> Result<StatementKind, ParseError> {
        self.expect(TokenKind::Execute)?;
        let ident = self.expect_identifier()?;
        let names = if self.check(&TokenKind::LParen) {
            self.advance();
            let mut names = Vec::new();
            while !self.check(&TokenKind::RParen) {
                names.push(self.expect_string()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            Some(names)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(StatementKind::Execute { ident, names })
    }

    /// `raw <ident> = <json value> ;`
    fn parse_raw(&mut self) -> Result<StatementKind, ParseError> {
        self.expect(TokenKind::Raw)?;
        let ident = self.expect_identifier()?;
        self.expect(TokenKind::Equals)?;
        let value = self.parse_json_value()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StatementKind::Raw { ident, value })
    }

    // ========================================================================
    // JSON VALUES
    // ========================================================================

    fn parse_json_value(&mut self) -> Result<JsonExpr, ParseError> {
        match &self.current().kind {
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(JsonExpr::String(value))
            }
            TokenKind::Number(value) => {
                let value = value.clone();
                self.advance();
                Ok(JsonExpr::Number(value))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(JsonExpr::Reference(name))
            }
            TokenKind::LBracket => self.parse_json_array(),
            TokenKind::LBrace => self.parse_json_object(),
            other => Err(self.error(&format!("Expected JSON value, found {:?}", other))),
        }
    }

    /// Elements are comma-separated; one trailing comma before the closing
    /// bracket is tolerated.
    fn parse_json_array(&mut self) -> Result<JsonExpr, ParseError> {
        self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            elements.push(self.parse_json_value()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(JsonExpr::Array(elements))
    }

    /// Keys must be string literals. Duplicate keys are kept in order here;
    /// evaluation resolves them with a last-write-wins rule.
    fn parse_json_object(&mut self) -> Result<JsonExpr, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let key = self.expect_string()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_json_value()?;
            members.push((key, value));
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(JsonExpr::Object(members))
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    /// Compare token kinds by variant only, ignoring payloads.
    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current().kind) == mem::discriminant(kind)
    }

    /// Like [`Self::check`] but one token ahead.
    fn next_is(&self, kind: &TokenKind) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map(|token| mem::discriminant(&token.kind) == mem::discriminant(kind))
            .unwrap_or(false)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&format!(
                "Expected {:?}, found {:?}",
                kind,
                self.current().kind
            )))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(&format!("Expected identifier, found {:?}", other))),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            other => Err(self.error(&format!("Expected string, found {:?}", other))),
        }
    }

    /// An extension name: a bare identifier or a string literal. Keywords
    /// are not identifiers, so names that collide with a keyword must be
    /// written as strings.
    fn expect_name(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::String(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(&format!(
                "Expected name (identifier or string), found {:?}",
                other
            ))),
        }
    }

    /// Anchors are non-negative integers that fit in 32 bits.
    fn expect_anchor(&mut self) -> Result<u32, ParseError> {
        let anchor = match &self.current().kind {
            TokenKind::Number(value) => value.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        };
        match anchor {
            Some(anchor) => {
                self.advance();
                Ok(anchor)
            }
            None => Err(self.error("Expected non-negative integer anchor")),
        }
    }

    /// Parse the optional `= <anchor>` tail of an extension declaration.
    fn parse_anchor_override(&mut self) -> Result<Option<u32>, ParseError> {
        if self.check(&TokenKind::Equals) {
            self.advance();
            Ok(Some(self.expect_anchor()?))
        } else {
            Ok(None)
        }
    }

    fn error(&self, message: &str) -> ParseError {
        let span = self.current().span;
        ParseError {
            message: message.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

/// Lex and parse a full source text.
pub fn parse(source: &str) -> Result<Vec<Statement>, ParseError> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    let mut parser = Parser::new(tokens);
    parser.parse()
}

// ============================================================================
// TESTS
// ============================================================================
