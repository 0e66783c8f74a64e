/// Identifier rules understood by the scanner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Grammar {
    /// Identifiers: a letter followed by letters, digits or '_'.
    #[default]
    Standard,
    /// As `Standard`, but identifiers may also continue with '.' and '-'.
    Extended,
}

impl Grammar {
    pub fn is_identifier_start(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    pub fn is_identifier_continue(&self, c: char) -> bool {
        match self {
            Grammar::Standard => c.is_ascii_alphanumeric() || c == '_',
            Grammar::Extended => c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'),
        }
    }
}

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// Knobs shared by the scanner and the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub grammar: Grammar,
    /// Deepest parenthesis nesting the parser accepts.
    pub max_depth: usize,
    /// Largest token sequence (end marker excluded) the parser accepts.
    pub max_tokens: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            grammar: Grammar::Standard,
            max_depth: DEFAULT_MAX_DEPTH,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Options {
    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
