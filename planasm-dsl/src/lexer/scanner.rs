//! Lexer implementation

use super::token::*;
use serde_json::Number;
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

/// Lexer for the planasm assembly language.
///
/// String and number literals follow JSON syntax exactly, so anything the
/// lexer accepts can be re-emitted into a JSON document verbatim.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            let start_pos = self.pos;
            let start_line = self.line;
            let start_col = self.column;

            let kind = match self.peek_char() {
                None => TokenKind::Eof,
                Some(c) => match c {
                    '{' => {
                        self.advance();
                        TokenKind::LBrace
                    }
                    '}' => {
                        self.advance();
                        TokenKind::RBrace
                    }
                    '[' => {
                        self.advance();
                        TokenKind::LBracket
                    }
                    ']' => {
                        self.advance();
                        TokenKind::RBracket
                    }
                    '(' => {
                        self.advance();
                        TokenKind::LParen
                    }
                    ')' => {
                        self.advance();
                        TokenKind::RParen
                    }
                    ',' => {
                        self.advance();
                        TokenKind::Comma
                    }
                    ';' => {
                        self.advance();
                        TokenKind::Semicolon
                    }
                    '=' => {
                        self.advance();
                        TokenKind::Equals
                    }

                    ':' => {
                        self.advance();
                        if self.peek_char() == Some(':') {
                            self.advance();
                            TokenKind::DoubleColon
                        } else {
                            TokenKind::Colon
                        }
                    }

                    '/' => match self.peek_next_char() {
                        Some('/') => {
                            while let Some(c) = self.peek_char() {
                                if c == '\n' {
                                    break;
                                }
                                self.advance();
                            }
                            continue;
                        }
                        Some('*') => {
                            self.advance();
                            self.advance();
                            if self.skip_block_comment() {
                                continue;
                            }
                            TokenKind::Error("Unterminated block comment".to_string())
                        }
                        _ => {
                            self.advance();
                            TokenKind::Error("Unexpected character: /".to_string())
                        }
                    },

                    '"' => self.scan_string(),

                    '-' => self.scan_number(),

                    c if c.is_ascii_digit() => self.scan_number(),

                    c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),

                    c => {
                        self.advance();
                        TokenKind::Error(format!("Unexpected character: {}", c))
                    }
                },
            };

            return Token {
                kind,
                span: Span {
                    start: start_pos,
                    end: self.pos,
                    line: start_line,
                    column: start_col,
                },
            };
        }
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let ident = &self.source[start..self.pos];
        keyword(ident).unwrap_or_else(|| TokenKind::Identifier(ident.to_string()))
    }

    /// Scan a string literal with JSON escape sequences.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => return TokenKind::Error("Unterminated string".to_string()),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('"') => {
                            self.advance();
                            value.push('"');
                        }
                        Some('\\') => {
                            self.advance();
                            value.push('\\');
                        }
                        Some('/') => {
                            self.advance();
                            value.push('/');
                        }
                        Some('b') => {
                            self.advance();
                            value.push('\u{0008}');
                        }
                        Some('f') => {
                            self.advance();
                            value.push('\u{000C}');
                        }
                        Some('n') => {
                            self.advance();
                            value.push('\n');
                        }
                        Some('r') => {
                            self.advance();
                            value.push('\r');
                        }
                        Some('t') => {
                            self.advance();
                            value.push('\t');
                        }
                        Some('u') => {
                            self.advance();
                            match self.scan_unicode_escape() {
                                Ok(c) => value.push(c),
                                Err(message) => return TokenKind::Error(message),
                            }
                        }
                        Some(c) => {
                            return TokenKind::Error(format!("Invalid escape sequence: \\{}", c))
                        }
                        None => return TokenKind::Error("Unterminated string".to_string()),
                    }
                }
                Some(c) if (c as u32) < 0x20 => {
                    return TokenKind::Error("Control character in string".to_string());
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        TokenKind::String(value)
    }

    /// Scan the four hex digits and optional low-surrogate pair of a
    /// `\u` escape. The leading `\u` has already been consumed.
    fn scan_unicode_escape(&mut self) -> Result<char, String> {
        let first = self.scan_hex4()?;

        if (0xD800..=0xDBFF).contains(&first) {
            // High surrogate, must be followed by an escaped low surrogate
            if self.peek_char() == Some('\\') && self.peek_next_char() == Some('u') {
                self.advance();
                self.advance();
                let second = self.scan_hex4()?;
                if (0xDC00..=0xDFFF).contains(&second) {
                    let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                    return char::from_u32(combined)
                        .ok_or_else(|| "Invalid unicode escape".to_string());
                }
            }
            Err("Unpaired surrogate in unicode escape".to_string())
        } else if (0xDC00..=0xDFFF).contains(&first) {
            Err("Unpaired surrogate in unicode escape".to_string())
        } else {
            char::from_u32(first).ok_or_else(|| "Invalid unicode escape".to_string())
        }
    }

    fn scan_hex4(&mut self) -> Result<u32, String> {
        let mut code = 0u32;
        for _ in 0..4 {
            let c = self
                .peek_char()
                .ok_or_else(|| "Unterminated string".to_string())?;
            let digit = c
                .to_digit(16)
                .ok_or_else(|| format!("Invalid hex digit in unicode escape: {}", c))?;
            self.advance();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// Scan a number literal. The scanned text must form a complete JSON
    /// number; anything else (leading zeros, bare `-`, `1.`) is an error.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;

        if self.peek_char() == Some('-') {
            self.advance();
        }
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        if self.peek_char() == Some('.') {
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.advance();
            }
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let text = &self.source[start..self.pos];
        match serde_json::from_str::<Number>(text) {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Error(format!("Invalid number: {}", text)),
        }
    }

    /// Skip whitespace, tracking line and column.
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                _ => break,
            }
        }
    }

    /// Skip to the end of a block comment whose `/*` has been consumed.
    /// Returns false if the comment never closes.
    fn skip_block_comment(&mut self) -> bool {
        loop {
            match self.peek_char() {
                None => return false,
                Some('*') if self.peek_next_char() == Some('/') => {
                    self.advance();
                    self.advance();
                    return true;
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].char_indices();
        iter.next();
        iter.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            self.column += 1;
            Some(c)
        } else {
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
