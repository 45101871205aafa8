//! Surface syntax: tokens, untyped parse trees and the parser producing them.
//!
//! Trees can also be assembled by hand through [`TreeFactory`], which is how tests and other
//! front ends feed the elaborator without going through text.
mod parser;
mod token;
mod tree;

pub use parser::{ParseError, lex, parse_expr, parse_program};
pub use token::{Span, Token, TokenKind};
pub use tree::{Tree, TreeFactory};
