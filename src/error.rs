use ariadne::{Label, Report, ReportKind, Source};
use thiserror::Error;

/// Errors produced by the tokenize -> parse -> reduce pipeline.
/// The first error raised by any stage aborts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// Malformed character sequence, unterminated string, whitespace after '!', empty input.
    #[error("{message} at line:{line} pos:{column}")]
    Lexical {
        message: String,
        line: usize,
        column: usize,
    },
    /// Token in an invalid position or a reference to an unknown variable.
    #[error("{message}")]
    Parser {
        message: String,
        line: usize,
        column: usize,
    },
    /// Operands of incompatible kinds.
    #[error("{message}")]
    Evaluate { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorKind {
    Lexical,
    Parser,
    Evaluate,
}

impl ExprError {
    pub fn lexical(message: impl Into<String>, line: usize, column: usize) -> Self {
        ExprError::Lexical { message: message.into(), line, column }
    }

    pub fn parser(message: impl Into<String>, line: usize, column: usize) -> Self {
        ExprError::Parser { message: message.into(), line, column }
    }

    pub fn evaluate(message: impl Into<String>) -> Self {
        ExprError::Evaluate { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExprError::Lexical { .. } => ErrorKind::Lexical,
            ExprError::Parser { .. } => ErrorKind::Parser,
            ExprError::Evaluate { .. } => ErrorKind::Evaluate,
        }
    }

    /// (line, column) the error points at, both 1-based.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ExprError::Lexical { line, column, .. } | ExprError::Parser { line, column, .. } => {
                Some((*line, *column))
            }
            ExprError::Evaluate { .. } => None,
        }
    }

    fn message(&self) -> &str {
        match self {
            ExprError::Lexical { message, .. }
            | ExprError::Parser { message, .. }
            | ExprError::Evaluate { message } => message,
        }
    }
}

/// Prints `error` as an ariadne report on stderr, labelled at its position in `source`.
pub fn print_error(source: &str, error: &ExprError) -> std::io::Result<()> {
    let source_name = "expression";
    let title = format!("{} error", error.kind());

    let mut report = Report::build(ReportKind::Error, (source_name, 0..0)).with_message(title);

    match error.position() {
        Some((line, column)) => {
            let offset = char_offset(source, line, column);
            report = report.with_label(
                Label::new((source_name, offset..offset)).with_message(error.message()),
            );
        }
        None => report = report.with_note(error.message()),
    }

    report.finish().eprint((source_name, Source::from(source)))
}

/// Converts a 1-based (line, column) into a char offset into `source`.
/// Positions past the end are clamped to the end of `source`.
fn char_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (idx, text) in source.split('\n').enumerate() {
        let length = text.chars().count();
        if idx + 1 == line {
            return offset + (column.saturating_sub(1)).min(length);
        }
        offset += length + 1; // +1 for '\n'
    }
    source.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ExprError::lexical("unrecognized token: &=", 1, 3);
        assert_eq!(err.to_string(), "unrecognized token: &= at line:1 pos:3");

        let err = ExprError::parser("undefined variable: label_09", 2, 1);
        assert_eq!(err.to_string(), "undefined variable: label_09");

        let err = ExprError::evaluate("can't evaluate expression");
        assert_eq!(err.to_string(), "can't evaluate expression");
    }

    #[test]
    fn test_kind_and_position() {
        let cases = vec![
            (ExprError::lexical("x", 1, 2), ErrorKind::Lexical, Some((1, 2))),
            (ExprError::parser("x", 3, 4), ErrorKind::Parser, Some((3, 4))),
            (ExprError::evaluate("x"), ErrorKind::Evaluate, None),
        ];
        for (err, kind, position) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.position(), position);
        }
        assert_eq!(ErrorKind::Evaluate.to_string(), "Evaluate");
    }

    #[test]
    fn test_char_offset() {
        let source = "a &&\n (b || c)";
        assert_eq!(char_offset(source, 1, 1), 0);
        assert_eq!(char_offset(source, 1, 3), 2);
        assert_eq!(char_offset(source, 2, 2), 6);
        assert_eq!(char_offset(source, 2, 100), source.chars().count());
        assert_eq!(char_offset(source, 7, 1), source.chars().count());
    }
}
