//! HTML lexer, node tree and scanners
//!
//! The [`lexer::Lexer`] reads flat nodes from a page, the scanners in [`scanner`] assemble
//! them into composite nodes, and the [`parser::Parser`] hands out the resulting top level
//! nodes while keeping an eye on charset declarations.

pub mod lexer;
pub mod node;
pub mod parser;
pub mod scanner;
