//! Fuzz test for the planasm parser
//!
//! This fuzz target tests the parser with arbitrary byte sequences to find:
//! - Panics or crashes
//! - Infinite loops
//! - Memory safety issues
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use planasm_dsl::{parse, render, Lexer, Parser};

fuzz_target!(|data: &[u8]| {
    // The parser should handle any valid UTF-8 string without panicking
    if let Ok(input) = std::str::from_utf8(data) {
        match parse(input) {
            Ok(statements) => {
                // Statement positions are always valid
                for statement in &statements {
                    assert!(statement.span.line >= 1, "Statement line should be >= 1");
                    assert!(statement.span.column >= 1, "Statement column should be >= 1");
                }

                // Anything that parses must survive render -> reparse
                let rendered = render(&statements);
                let reparsed = parse(&rendered)
                    .unwrap_or_else(|err| panic!("Rendered output failed to reparse: {}", err));
                assert!(
                    reparsed
                        .iter()
                        .map(|statement| &statement.kind)
                        .eq(statements.iter().map(|statement| &statement.kind)),
                    "Render/reparse changed the statement sequence"
                );
            }
            Err(err) => {
                // If parsing failed, verify error has valid location info
                assert!(err.line >= 1, "Error line should be >= 1");
                assert!(err.column >= 1, "Error column should be >= 1");
                assert!(!err.message.is_empty(), "Error message should not be empty");
            }
        }

        // Also test lexer -> parser pipeline separately; the parser should
        // handle any Eof-terminated token stream without panicking.
        let tokens = Lexer::new(input).tokenize();
        let mut parser = Parser::new(tokens);
        let _ = parser.parse();
    }
});
