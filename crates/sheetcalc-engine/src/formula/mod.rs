//! Formula syntax: the AST consumed by the engine and the text parser that
//! produces it.

pub mod ast;
mod parser;

pub use ast::{Ast, BinaryOp, CellRef, Coord, UnaryOp};
pub use parser::parse;
