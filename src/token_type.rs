/// Closed classification of a lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TokenType {
    LeftParen, RightParen, // ()
    BinaryOperator, // && || == !=
    Negation, // !
    Boolean, // true false
    Integer,
    Str, // 'text'
    Identifier,
    EOF,
}
