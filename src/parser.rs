//! A recursive descent parser for boolean rule expressions.
//!
//! Grammar:
//!
//! expr -> atom ( ( "&&" | "||" | "==" | "!=" ) atom )*
//! atom -> IDENTIFIER | BOOLEAN | INTEGER | STRING | "!" negatable | "(" expr ")"
//! negatable -> IDENTIFIER | "(" expr ")"
//!
//! All binary operators share one level and group left to right, so
//! "a || b && c" is "(a || b) && c". Only parentheses change grouping.
//! Identifiers are looked up in the variables as soon as they are parsed.
//!
//! Examples: "label_01", "(label_01 && label_03) || !label_02", "count == 15", "name == 'x' "

use std::str::FromStr;

use log::debug;

use crate::config::Options;
use crate::error::ExprError;
use crate::expr::{BinaryOp, Expr};
use crate::scanner::Token;
use crate::token_type::TokenType::*;
use crate::value::{Value, Variables};

pub struct Parser<'a> {
    tokens: &'a [Token], // tokens of this (sub-)expression
    end: &'a Token, // token terminating `tokens`: EOF, or the ')' closing a group
    current: usize,
    variables: &'a Variables,
    options: &'a Options,
    depth: usize, // parenthesis nesting of this (sub-)expression
}

impl<'a> Parser<'a> {

    /// `tokens` must not contain the terminating `end` token.
    pub fn new(
        tokens: &'a [Token],
        end: &'a Token,
        variables: &'a Variables,
        options: &'a Options,
    ) -> Self {
        Parser {
            tokens,
            end,
            current: 0,
            variables,
            options,
            depth: 0,
        }
    }

    /// Matches production: expr -> atom ( binary_op atom )*
    pub fn parse(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.atom()?;

        while !self.at_end() {
            let token = self.peek();
            let operator = match token.variant {
                BinaryOperator => {
                    BinaryOp::from_str(&token.lexeme).map_err(|_| self.unexpected(token))?
                }
                RightParen => return Err(self.unbalanced(token)),
                _ => return Err(self.unexpected(token)),
            };
            self.advance();

            let right = self.atom()?;
            left = Expr::binary(operator, left, right);
        }
        Ok(left)
    }

    /// Matches production:
    /// atom -> IDENTIFIER | BOOLEAN | INTEGER | STRING | "!" negatable | "(" expr ")"
    fn atom(&mut self) -> Result<Expr, ExprError> {
        let token = self.peek();
        match token.variant {
            Identifier => {
                self.advance();
                self.resolve(token)
            }
            Boolean => {
                self.advance();
                Ok(Expr::Literal(Value::Boolean(token.lexeme == "true")))
            }
            Integer => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ExprError::lexical(
                        format!("unexpected value {}, expected int", token.lexeme),
                        token.line,
                        token.column,
                    )
                })?;
                Ok(Expr::Literal(Value::Integer(value)))
            }
            Str => {
                self.advance();
                Ok(Expr::Literal(Value::Text(unquote(&token.lexeme).to_string())))
            }
            Negation => {
                self.advance();
                self.negatable()
            }
            LeftParen => self.grouping(),
            _ => Err(self.unexpected(token)),
        }
    }

    /// Matches production: negatable -> IDENTIFIER | "(" expr ")"
    /// The leading '!' is already consumed.
    fn negatable(&mut self) -> Result<Expr, ExprError> {
        let token = self.peek();
        match token.variant {
            Identifier => {
                self.advance();
                Ok(Expr::negate(self.resolve(token)?))
            }
            LeftParen => Ok(Expr::negate(self.grouping()?)),
            _ => Err(self.unexpected(token)),
        }
    }

    /// Matches production: "(" expr ")"
    /// The enclosed tokens are parsed by a nested parser bounded by the matching ')'.
    fn grouping(&mut self) -> Result<Expr, ExprError> {
        let open = self.peek();
        if self.depth + 1 > self.options.max_depth {
            return Err(ExprError::parser(
                format!(
                    "maximum nesting depth exceeded ({}) at line:{} pos:{}",
                    self.options.max_depth, open.line, open.column
                ),
                open.line,
                open.column,
            ));
        }

        let start = self.current + 1;
        let close = self.matching_paren(start).ok_or_else(|| self.unbalanced(open))?;

        let tokens = self.tokens;
        let mut nested = Parser {
            tokens: &tokens[start..close],
            end: &tokens[close],
            current: 0,
            variables: self.variables,
            options: self.options,
            depth: self.depth + 1,
        };
        let expr = nested.parse()?;

        self.current = close + 1;
        Ok(expr)
    }

    /// Index of the ')' closing the group whose content starts at `start`.
    fn matching_paren(&self, start: usize) -> Option<usize> {
        let mut depth = 1;
        for (idx, token) in self.tokens.iter().enumerate().skip(start) {
            match token.variant {
                LeftParen => depth += 1,
                RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx)
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn resolve(&self, token: &Token) -> Result<Expr, ExprError> {
        match self.variables.get(&token.lexeme) {
            // text may arrive still wrapped in the quotes of the literal it came from
            Some(Value::Text(text)) => {
                Ok(Expr::Literal(Value::Text(text.trim_matches('\'').to_string())))
            }
            Some(value) => Ok(Expr::Literal(value.clone())),
            None => {
                debug!("undefined variable {} at {}:{}", token.lexeme, token.line, token.column);
                Err(ExprError::parser(
                    format!("undefined variable: {}", token.lexeme),
                    token.line,
                    token.column,
                ))
            }
        }
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.current += 1;
        }
    }

    fn peek(&self) -> &'a Token {
        self.tokens.get(self.current).unwrap_or(self.end)
    }

    fn at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn unexpected(&self, token: &Token) -> ExprError {
        let value = if token.variant == EOF { "end of expression" } else { token.lexeme.as_str() };
        ExprError::parser(
            format!("unexpected token: {} at line:{} pos:{}", value, token.line, token.column),
            token.line,
            token.column,
        )
    }

    fn unbalanced(&self, token: &Token) -> ExprError {
        ExprError::parser(
            format!("unbalanced parentheses at line:{} pos:{}", token.line, token.column),
            token.line,
            token.column,
        )
    }
}

/// Strips the delimiting quotes of a string literal lexeme.
fn unquote(lexeme: &str) -> &str {
    lexeme
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(lexeme)
}

/// Parses `tokens` against `variables` with default options.
pub fn parse(tokens: Vec<Token>, variables: &Variables) -> Result<Expr, ExprError> {
    parse_with(tokens, variables, &Options::default())
}

/// Parses `tokens` against `variables`. An `EOF` token is appended when missing.
pub fn parse_with(
    mut tokens: Vec<Token>,
    variables: &Variables,
    options: &Options,
) -> Result<Expr, ExprError> {
    if tokens.last().map(|t| t.variant) != Some(EOF) {
        let (line, column) = tokens
            .last()
            .map(|t| (t.line, t.column + t.lexeme.chars().count()))
            .unwrap_or((1, 1));
        tokens.push(Token { variant: EOF, lexeme: String::new(), line, column });
    }

    let (end, body) = match tokens.split_last() {
        Some(split) => split,
        None => {
            let message = "unexpected token: end of expression at line:1 pos:1";
            return Err(ExprError::parser(message, 1, 1));
        }
    };

    if body.len() > options.max_tokens {
        return Err(ExprError::parser(
            format!("expression too long ({} tokens, limit {})", body.len(), options.max_tokens),
            end.line,
            end.column,
        ));
    }

    let expr = Parser::new(body, end, variables, options).parse()?;
    debug!("parsed {} tokens into {} expression", body.len(), expr.kind());
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::scanner::tokenize;

    fn variables() -> Variables {
        Variables::from([
            ("a".to_string(), Value::Boolean(true)),
            ("b".to_string(), Value::Boolean(false)),
            ("c".to_string(), Value::Boolean(false)),
            ("n".to_string(), Value::Integer(15)),
            ("s".to_string(), Value::Text("Test String".to_string())),
        ])
    }

    fn run(source: &str) -> Result<Expr, ExprError> {
        parse(tokenize(source)?, &variables())
    }

    fn lit(value: impl Into<Value>) -> Box<Expr> {
        Box::new(Expr::Literal(value.into()))
    }

    #[test]
    fn test_flat_left_to_right() {
        // conventional precedence would give a || (b && c)
        assert_eq!(
            run("a || b && c").unwrap(),
            Expr::And(Box::new(Expr::Or(lit(true), lit(false))), lit(false))
        );
        assert_eq!(
            run("a == b != c").unwrap(),
            Expr::NotEquals(Box::new(Expr::Equals(lit(true), lit(false))), lit(false))
        );
    }

    #[test]
    fn test_grouping() {
        assert_eq!(
            run("a || (b && c)").unwrap(),
            Expr::Or(lit(true), Box::new(Expr::And(lit(false), lit(false))))
        );
        assert_eq!(run("((a))").unwrap(), *lit(true));
    }

    #[test]
    fn test_literals_and_resolution() {
        assert_eq!(run("n == 15").unwrap(), Expr::Equals(lit(15), lit(15)));
        assert_eq!(
            run("s != 'Test String'").unwrap(),
            Expr::NotEquals(lit("Test String"), lit("Test String"))
        );
        assert_eq!(run("''").unwrap(), *lit(""));
        assert_eq!(run("false").unwrap(), *lit(false));
    }

    #[test]
    fn test_resolved_text_loses_quotes() {
        let vars = Variables::from([
            ("quoted".to_string(), Value::from("'x'")),
            ("inner".to_string(), Value::from("it's")),
            ("empty".to_string(), Value::from("''")),
        ]);
        let run = |source: &str| parse(tokenize(source).unwrap(), &vars).unwrap();
        assert_eq!(run("quoted == 'x'"), Expr::Equals(lit("x"), lit("x")));
        assert_eq!(run("inner"), *lit("it's"));
        assert_eq!(run("empty == ''"), Expr::Equals(lit(""), lit("")));
    }

    #[test]
    fn test_negation() {
        assert_eq!(run("!a").unwrap(), Expr::Negate(lit(true)));
        assert_eq!(
            run("!(a && b)").unwrap(),
            Expr::Negate(Box::new(Expr::And(lit(true), lit(false))))
        );
        assert_eq!(
            run("!a == true").unwrap(),
            Expr::Equals(Box::new(Expr::Negate(lit(true))), lit(true))
        );
        assert_eq!(run("b || !!(a)").err().map(|e| e.kind()), Some(ErrorKind::Lexical));
    }

    #[test]
    fn test_valid_input() {
        let cases = vec![
            "a",
            "((!(a)))",
            "(((!a)))",
            "!(!(!(!a)))",
            "(a && c) || !b",
            "a && !(b || c)",
            "a\n&&\nb",
            "n != 7 == true",
            "(n == 15) == (s == 'x' )",
        ];
        for case in cases {
            let result = run(case);
            assert!(result.is_ok(), "Failed to parse valid input {:?}: {:?}", case, result);
        }
    }

    #[test]
    fn test_invalid_input() {
        let cases = vec![
            "()",
            "a b",
            "a &&",
            "&& a",
            "!true",
            "!15",
            "!'x'",
            "a && (b",
            "(a",
            "a)",
            "(a))",
            "a && ()",
            "a == !",
            "undefined_label",
            "a && undefined_label",
            "!undefined_label",
            "(undefined_label)",
        ];
        for case in cases {
            let result = run(case);
            assert!(
                matches!(result, Err(ref e) if e.kind() == ErrorKind::Parser),
                "Expected parser error. Input: {:?}, Got: {:?}", case, result
            );
        }
    }

    #[test]
    fn test_error_messages() {
        let cases = vec![
            ("undefined_label == true", "undefined variable: undefined_label"),
            ("a b", "unexpected token: b at line:1 pos:3"),
            ("a &&", "unexpected token: end of expression at line:1 pos:5"),
            ("()", "unexpected token: ) at line:1 pos:2"),
            ("a && (b || c", "unbalanced parentheses at line:1 pos:6"),
            ("a)", "unbalanced parentheses at line:1 pos:2"),
            ("!true", "unexpected token: true at line:1 pos:2"),
        ];
        for (source, message) in cases {
            let err = run(source).unwrap_err();
            assert_eq!(err.to_string(), message, "Input: {:?}", source);
        }
    }

    #[test]
    fn test_integer_overflow_is_lexical() {
        let err = run("n == 99999999999999999999").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lexical);
        assert_eq!(err.position(), Some((1, 6)));
    }

    #[test]
    fn test_max_depth() {
        let options = Options::default().with_max_depth(3);
        let tokens = tokenize("(((a)))").unwrap();
        assert!(parse_with(tokens, &variables(), &options).is_ok());

        let tokens = tokenize("((((a))))").unwrap();
        let err = parse_with(tokens, &variables(), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parser);
        assert_eq!(err.position(), Some((1, 4)));
    }

    #[test]
    fn test_max_tokens() {
        let options = Options::default().with_max_tokens(3);
        assert!(parse_with(tokenize("a && b").unwrap(), &variables(), &options).is_ok());

        let err = parse_with(tokenize("a && b && c").unwrap(), &variables(), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parser);
    }

    #[test]
    fn test_missing_eof_is_appended() {
        let mut tokens = tokenize("a && b").unwrap();
        tokens.pop();
        assert_eq!(parse(tokens, &variables()).unwrap(), Expr::And(lit(true), lit(false)));

        let err = parse(Vec::new(), &variables()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parser);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("''"), "");
        assert_eq!(unquote("abc"), "abc");
    }
}
