// Declare modules publicly so they are part of the library interface
pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod source;

pub use ast::{AddOp, Expr, MulOp, Node};
pub use environment::{EnvError, Environment};
pub use error::{CalcError, CalcResult};
pub use evaluator::{evaluate_all, evaluate_line};
pub use function::{Function, Macro};
pub use lexer::{LexerError, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_str};
pub use source::Span;
