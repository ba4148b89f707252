use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Markup could not be turned into nodes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unterminated comment at {pos}")]
    UnterminatedComment { pos: usize },

    #[error("Unterminated <{tag}> element at {pos}")]
    UnterminatedRawText { pos: usize, tag: String },

    #[error("Malformed tag at {pos}: {message}")]
    MalformedTag { pos: usize, message: String },

    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },
}

impl ParseError {
    pub fn malformed_tag(pos: usize, message: impl Into<String>) -> Self {
        Self::MalformedTag {
            pos,
            message: message.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }
}

/// A selector string could not be parsed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected {found} at {pos} in selector")]
    UnexpectedToken { pos: usize, found: String },

    #[error("Unexpected end of selector")]
    UnexpectedEnd,

    #[error("Unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),

    #[error("Invalid :nth-child argument '{0}'")]
    InvalidNth(String),

    #[error("Invalid character in selector at {pos}")]
    LexerError { pos: usize },
}

/// Structural edit against the tree failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Selector(#[from] SelectorError),

    #[error("Node is not an element")]
    NotAnElement,

    #[error("Node has no parent")]
    Detached,

    #[error("The document node cannot be modified")]
    DocumentNode,
}
