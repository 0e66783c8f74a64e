//! Helpers built on the scanner's output: listing the variables an
//! expression references and rewriting shorthand expressions.

use crate::config::Grammar;
use crate::error::ExprError;
use crate::scanner::{tokenize_with, Token};
use crate::token_type::TokenType::{self, *};

/// Names of the identifiers in `source`, in order of first appearance.
pub fn extract_variables(source: &str) -> Result<Vec<String>, ExprError> {
    extract_variables_with(source, Grammar::Standard)
}

pub fn extract_variables_with(source: &str, grammar: Grammar) -> Result<Vec<String>, ExprError> {
    let tokens = tokenize_with(source, grammar)?;
    Ok(variables_of(&tokens))
}

fn variables_of(tokens: &[Token]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in tokens.iter().filter(|t| t.variant == Identifier) {
        if !names.contains(&token.lexeme) {
            names.push(token.lexeme.clone());
        }
    }
    names
}

/// Rewrites every identifier that is not an operand of `==`/`!=` into
/// `ident == true`, and returns the rewritten text with the referenced variables.
///
/// `"a && !b || c == 'x'"` becomes `"a == true && !b == true || c == 'x'"`.
pub fn translate(source: &str) -> Result<(String, Vec<String>), ExprError> {
    translate_with(source, Grammar::Standard)
}

pub fn translate_with(source: &str, grammar: Grammar) -> Result<(String, Vec<String>), ExprError> {
    let tokens = tokenize_with(source, grammar)?;

    let mut output: Vec<Token> = Vec::with_capacity(tokens.len());
    for (idx, token) in tokens.iter().enumerate() {
        output.push(token.clone());

        let compared = (idx > 0 && is_comparison(&tokens[idx - 1]))
            || tokens.get(idx + 1).is_some_and(is_comparison);
        if token.variant == Identifier && !compared {
            output.push(synthetic(BinaryOperator, "==", token));
            output.push(synthetic(Boolean, "true", token));
        }
    }

    Ok((render(&output), variables_of(&tokens)))
}

fn is_comparison(token: &Token) -> bool {
    token.variant == BinaryOperator && (token.lexeme == "==" || token.lexeme == "!=")
}

fn synthetic(variant: TokenType, lexeme: &str, origin: &Token) -> Token {
    Token { variant, lexeme: lexeme.to_string(), line: origin.line, column: origin.column }
}

/// Joins token lexemes into text that scans back to the same token kinds.
///
/// Tokens are separated by one space, except after '!' and '(' and before ')'.
/// A string literal must be followed by whitespace, so it keeps its space before ')'.
pub fn render(tokens: &[Token]) -> String {
    let mut text = String::new();
    let mut previous: Option<&Token> = None;

    for token in tokens.iter().filter(|t| t.variant != EOF) {
        if let Some(prev) = previous {
            let space = match (prev.variant, token.variant) {
                (Negation, _) | (LeftParen, _) => false,
                (Str, RightParen) => true,
                (_, RightParen) => false,
                _ => true,
            };
            if space {
                text.push(' ');
            }
        }
        text.push_str(&token.lexeme);
        previous = Some(token);
    }
    text
}
