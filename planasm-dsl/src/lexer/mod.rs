//! Lexer module for the planasm assembly language

pub mod token;
pub mod scanner;

pub use token::*;
pub use scanner::*;
