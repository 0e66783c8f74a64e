//! Evaluation of small boolean rule expressions such as
//! `(label_01 && label_03) || !label_02` or `tier == 'gold'`
//! against a caller-supplied set of named values.
//!
//! The pipeline is scanner -> parser -> evaluator. Each call is independent;
//! nothing is shared between calls.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod parser;
pub mod scanner;
pub mod token_type;
pub mod tools;
pub mod value;

use log::debug;

pub use config::{Grammar, Options};
pub use error::{ErrorKind, ExprError};
pub use expr::{BinaryOp, Expr};
pub use parser::{parse, parse_with};
pub use scanner::{tokenize, tokenize_with, Token};
pub use token_type::TokenType;
pub use tools::{extract_variables, extract_variables_with, translate, translate_with};
pub use value::{Value, ValueKind, Variables};

/// Evaluates `expression` against `variables` with default options.
pub fn evaluate(expression: &str, variables: &Variables) -> Result<bool, ExprError> {
    evaluate_with(expression, variables, &Options::default())
}

pub fn evaluate_with(
    expression: &str,
    variables: &Variables,
    options: &Options,
) -> Result<bool, ExprError> {
    let tokens = tokenize_with(expression, options.grammar)?;
    let expr = parse_with(tokens, variables, options)?;
    let result = expr.reduce()?;
    debug!("{:?} evaluated to {}", expression, result);
    Ok(result)
}
