//! Fuzz test for the planasm lexer
//!
//! This fuzz target tests the lexer with arbitrary byte sequences to find:
//! - Panics or crashes
//! - Infinite loops
//! - Memory safety issues
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use planasm_dsl::Lexer;

fuzz_target!(|data: &[u8]| {
    // The lexer should handle any valid UTF-8 string without panicking;
    // malformed input surfaces as Error tokens, never as a crash.
    if let Ok(input) = std::str::from_utf8(data) {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize();

        // 1. We should always get at least one token (Eof)
        assert!(!tokens.is_empty(), "Tokenization should produce at least Eof");

        // 2. The last token should always be Eof
        assert_eq!(
            tokens.last().unwrap().kind,
            planasm_dsl::TokenKind::Eof,
            "Last token should always be Eof"
        );

        // 3. Span positions should be valid
        for token in &tokens {
            assert!(token.span.start <= token.span.end, "Span start should be <= end");
            assert!(token.span.line >= 1, "Line numbers should be >= 1");
            assert!(token.span.column >= 1, "Column numbers should be >= 1");
        }
    }
});
