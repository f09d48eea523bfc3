//! Crate-level error type

use thiserror::Error;

use crate::assembler::AssembleError;
use crate::disassembler::DisassembleError;
use crate::parser::ParseError;

/// Any error the assembly pipeline can produce.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanasmError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("assembly failed: {0}")]
    Assemble(#[from] AssembleError),

    #[error("disassembly failed: {0}")]
    Disassemble(#[from] DisassembleError),
}

pub type PlanasmResult<T> = Result<T, PlanasmError>;
