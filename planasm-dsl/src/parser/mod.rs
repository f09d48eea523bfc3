//! Parser module for the planasm assembly language

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::*;
