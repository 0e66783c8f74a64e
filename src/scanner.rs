use std::fmt;

use log::{debug, trace};

use crate::config::Grammar;
use crate::error::ExprError;
use crate::token_type::TokenType::{self, *};

/// States of the scanner. Each step consumes input and returns the state to run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle, // dispatch on the current char
    Whitespace,
    Identifier,
    Number,
    StringLiteral,
    OperatorRun,
    Done,
}

/// The `Scanner` walks the source char by char, accumulating lexemes and
/// classifying each completed one into a `Token`.
pub struct Scanner<'a> {
    chars: std::str::Chars<'a>, // iterator over chars of source
    current: Option<char>, // char under examination, None at end of source
    buffer: String, // lexeme being accumulated
    tokens: Vec<Token>, // stores scanned tokens
    grammar: Grammar,
    line: usize, // line of current char
    column: usize, // column of current char
    line_start: usize, // line of lexeme start
    column_start: usize, // column of lexeme start
}

impl<'a> Scanner<'a> {

    pub fn new(source: &'a str, grammar: Grammar) -> Self {
        let mut chars = source.chars();
        let current = chars.next();

        Scanner {
            chars,
            current,
            buffer: String::new(),
            tokens: Vec::new(),
            grammar,
            line: 1,
            column: 1,
            line_start: 1,
            column_start: 1,
        }
    }

    /// Runs the state machine until the source is exhausted or a lexeme fails to classify.
    /// The returned tokens always end with an `EOF` token.
    pub fn scan(mut self) -> Result<Vec<Token>, ExprError> {
        if self.current.is_none() {
            return Err(ExprError::lexical("empty expression", 1, 1));
        }

        let mut state = State::Idle;
        while state != State::Done {
            let next = self.step(state)?;
            trace!("scanner {:?} -> {:?} at {}:{}", state, next, self.line, self.column);
            state = next;
        }

        self.mark_start();
        self.tokens.push(Token {
            variant: EOF,
            lexeme: String::new(),
            line: self.line_start,
            column: self.column_start,
        });
        Ok(self.tokens)
    }

    /// Runs a single state and returns its successor.
    pub fn step(&mut self, state: State) -> Result<State, ExprError> {
        match state {
            State::Idle => self.idle(),
            State::Whitespace => Ok(self.whitespace()),
            State::Identifier => self.identifier(),
            State::Number => self.number(),
            State::StringLiteral => self.string_literal(),
            State::OperatorRun => self.operator_run(),
            State::Done => Ok(State::Done),
        }
    }

    /// Tokens emitted so far. Lets a caller driving `step` by hand see what each
    /// state produced; no `EOF` is present until `scan` finishes.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn idle(&mut self) -> Result<State, ExprError> {
        let c = match self.current {
            Some(c) => c,
            None => return Ok(State::Done),
        };
        self.mark_start();

        let next = match c {
            _ if is_whitespace(c) => State::Whitespace,
            '(' | ')' => {
                self.consume();
                self.emit()?;
                State::Idle
            }
            '\'' => State::StringLiteral,
            _ if is_operator_symbol(c) => State::OperatorRun,
            _ if c.is_ascii_digit() => State::Number,
            _ if self.grammar.is_identifier_start(c) => State::Identifier,
            _ => return Err(self.error(format!("unexpected char: {:?}", c))),
        };
        Ok(next)
    }

    fn whitespace(&mut self) -> State {
        while matches!(self.current, Some(c) if is_whitespace(c)) {
            self.advance();
        }
        State::Idle
    }

    fn identifier(&mut self) -> Result<State, ExprError> {
        self.consume();
        while matches!(self.current, Some(c) if self.grammar.is_identifier_continue(c)) {
            self.consume();
        }
        self.emit()?;
        Ok(State::Idle)
    }

    /// Digits only; a sign never starts a number.
    fn number(&mut self) -> Result<State, ExprError> {
        while matches!(self.current, Some(c) if c.is_ascii_digit()) {
            self.consume();
        }
        self.emit()?;
        Ok(State::Idle)
    }

    fn string_literal(&mut self) -> Result<State, ExprError> {
        self.consume(); // opening quote
        loop {
            match self.current {
                None => return Err(self.error("unterminated string literal".to_string())),
                Some('\'') => {
                    self.consume();
                    break;
                }
                Some(_) => self.consume(),
            }
        }

        // A closing quote must be followed by whitespace or the end of source
        if let Some(c) = self.current {
            if !is_whitespace(c) {
                return Err(self.error_here(format!("unexpected char: {:?}", c)));
            }
        }

        self.emit()?;
        Ok(State::Idle)
    }

    fn operator_run(&mut self) -> Result<State, ExprError> {
        while matches!(self.current, Some(c) if is_operator_symbol(c)) {
            self.consume();
        }

        let variant = self.emit()?;
        if variant == Negation && matches!(self.current, Some(c) if is_whitespace(c)) {
            return Err(self.error_here("unexpected whitespace after '!'".to_string()));
        }
        Ok(State::Idle)
    }

    /// Classifies the buffered lexeme and stores it as a token.
    fn emit(&mut self) -> Result<TokenType, ExprError> {
        let variant = match classify(&self.buffer, self.grammar) {
            Some(variant) => variant,
            None => return Err(self.error(format!("unrecognized token: {}", self.buffer))),
        };

        self.tokens.push(Token {
            variant,
            lexeme: std::mem::take(&mut self.buffer),
            line: self.line_start,
            column: self.column_start,
        });
        Ok(variant)
    }

    fn mark_start(&mut self) {
        self.line_start = self.line;
        self.column_start = self.column;
    }

    /// Return current char and advance to next.
    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        match c {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        self.current = self.chars.next();
        c
    }

    /// Move current char into the lexeme buffer.
    fn consume(&mut self) {
        if let Some(c) = self.advance() {
            self.buffer.push(c);
        }
    }

    /// Error located at the start of the current lexeme.
    fn error(&self, message: String) -> ExprError {
        ExprError::lexical(message, self.line_start, self.column_start)
    }

    /// Error located at the current char.
    fn error_here(&self, message: String) -> ExprError {
        ExprError::lexical(message, self.line, self.column)
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_operator_symbol(c: char) -> bool {
    matches!(c, '!' | '|' | '&' | '=')
}

/// Classifies a completed lexeme. Checks run in priority order, so `true` is a
/// boolean constant rather than an identifier.
pub fn classify(lexeme: &str, grammar: Grammar) -> Option<TokenType> {
    match lexeme {
        "(" => Some(LeftParen),
        ")" => Some(RightParen),
        "==" | "!=" | "||" | "&&" => Some(BinaryOperator),
        "!" => Some(Negation),
        "true" | "false" => Some(Boolean),
        _ if is_identifier(lexeme, grammar) => Some(Identifier),
        _ if is_integer(lexeme) => Some(Integer),
        _ if is_string(lexeme) => Some(Str),
        _ => None,
    }
}

fn is_identifier(lexeme: &str, grammar: Grammar) -> bool {
    let mut chars = lexeme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(|c| grammar.is_identifier_continue(c)),
        _ => false,
    }
}

fn is_integer(lexeme: &str) -> bool {
    let digits = lexeme.strip_prefix('-').unwrap_or(lexeme);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_string(lexeme: &str) -> bool {
    match lexeme.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => !inner.contains(['\'', '\t', '\n', '\r']),
        None => false,
    }
}

/// Tokenizes `source` with the standard grammar.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    tokenize_with(source, Grammar::Standard)
}

pub fn tokenize_with(source: &str, grammar: Grammar) -> Result<Vec<Token>, ExprError> {
    let tokens = Scanner::new(source, grammar).scan()?;
    debug!("scanned {} tokens from {:?}", tokens.len(), source);
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub variant: TokenType,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.variant, self.lexeme)
    }
}
