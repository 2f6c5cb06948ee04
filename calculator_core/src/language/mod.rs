pub mod token;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod error;
pub mod builtins;
pub mod evaluator;

pub use error::{ErrorKind, EvaluationError, Result};
pub use ast::Expr;
pub use lexer::Lexer;
pub use parser::parse;
pub use evaluator::{evaluate, evaluate_in, Evaluator, Scope};
