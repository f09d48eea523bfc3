//! planasm DSL - Plan Assembly Language
//!
//! A textual assembly language for JSON plan documents. Source text is a
//! flat statement sequence over a single-pass symbol table; assembly
//! executes the statements into the nested plan document, and disassembly
//! linearizes a document back into statements that reassemble to a
//! structurally equal document.
//!
//! Pipeline:
//!
//! ```text
//!   source text -> Lexer -> Parser -> [Statement] -> Assembler -> plan JSON
//!   plan JSON -> Disassembler -> [Statement] -> Renderer -> source text
//! ```

pub mod assembler;
pub mod disassembler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod renderer;

// Re-export key types for convenience
pub use assembler::{assemble, AssembleError, AssembleResult, Assembler};
pub use disassembler::naming::{NameTable, NamingRules};
pub use disassembler::{disassemble, disassemble_plan, DisassembleError, DisassembleResult};
pub use error::{PlanasmError, PlanasmResult};
pub use lexer::{keyword, Lexer, Span, Token, TokenKind};
pub use parser::{parse, JsonExpr, ParseError, Parser, Statement, StatementKind, UriRef};
pub use renderer::render;

use serde_json::Value;

/// Parse and assemble source text into a plan document.
pub fn assemble_source(source: &str) -> PlanasmResult<Value> {
    let statements = parser::parse(source)?;
    Ok(assembler::assemble(&statements)?)
}

/// Disassemble a plan document and render it as source text, using the
/// Substrait field schema and default naming rules.
pub fn disassemble_to_source(plan: &Value) -> PlanasmResult<String> {
    let statements = disassembler::disassemble_plan(plan)?;
    Ok(renderer::render(&statements))
}
