//! Error taxonomy for every subsystem, wired together by `#[from]` in a
//! `ReaderError -> LexerError -> ParserError -> ConstructionError` chain:
//! each layer wraps the one below it without discarding the original cause.

use crate::byte_source::Mark;

/// Reported by [`ByteSource`](crate::byte_source::ByteSource) implementations.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("{problem}")]
    Problem {
        problem: &'static str,
        offset: u64,
        value: i64,
    },
    #[error("input stream produced an invalid byte order marker")]
    InvalidBom,
    #[error("invalid UTF-8 byte at offset {offset:#x}: {value:#x}")]
    InvalidUtf8 { offset: u64, value: u8 },
    #[error("invalid UTF-16 unpaired surrogate at offset {offset:#x}: {value:#x}")]
    InvalidUtf16 { offset: u64, value: u16 },
    #[error("invalid UTF-32 code point at offset {offset:#x}: {value:#x}")]
    InvalidUtf32 { offset: u64, value: u32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A positioned error: line, column, the offending source line, and a message.
///
/// This is the shape every user-visible failure is expected to present:
/// line number, column (1-based), the complete source line, and an implied
/// caret at `mark.column`.
#[derive(Debug, thiserror::Error)]
#[error("{mark}: {problem}")]
pub struct Positioned {
    pub problem: String,
    pub mark: Mark,
    pub line_content: String,
}

impl Positioned {
    pub fn new(problem: impl Into<String>, mark: Mark, line_content: impl Into<String>) -> Self {
        Positioned {
            problem: problem.into(),
            mark,
            line_content: line_content.into(),
        }
    }

    /// Render the standard "line / caret" display used for user-visible
    /// failures: the message, the full source line, and a `^` under the
    /// offending column.
    pub fn report(&self) -> String {
        let caret_col = self.mark.column.saturating_sub(1) as usize;
        let caret = format!("{}^", " ".repeat(caret_col));
        format!(
            "{}\n{}\n{}",
            self,
            self.line_content.trim_end_matches(['\r', '\n']),
            caret
        )
    }
}

/// Lexer-level failures (illegal char, unterminated quoted/verbatim scalar,
/// invalid escape, tab used as indentation, mixed block-scalar indicators).
#[derive(Debug, thiserror::Error)]
pub enum LexerError {
    #[error(transparent)]
    Positioned(#[from] Positioned),
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

/// Parser-level failures (unexpected token, duplicate tag/anchor, unknown
/// anchor, mixed chomping/indent indicators, unexpected internal state).
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("no more tokens")]
    UnexpectedEof,
    #[error(transparent)]
    Positioned(#[from] Positioned),
    #[error(transparent)]
    Lexer(#[from] LexerError),
}

/// Raised by [`Presenter`](crate::presenter::Presenter) when the underlying
/// writer fails.
#[derive(Debug, thiserror::Error)]
pub enum PresenterOutputError {
    #[error("{0}")]
    Problem(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Raised by the presenter specifically when rendering in
/// [`Style::Json`](crate::presenter::Style::Json) and the event stream is not
/// JSON-representable (an alias, a non-finite scalar, a non-scalar key).
#[derive(Debug, thiserror::Error)]
pub enum PresenterJsonError {
    #[error("{0}")]
    Message(String),
}

/// Wraps any error escaping the producer behind an
/// [`EventStream`](crate::event_stream::EventStream), absorbing it into one
/// stable kind so callers do not need to match on the concrete producer.
#[derive(Debug, thiserror::Error)]
#[error("event stream error: {message}")]
pub struct StreamError {
    pub message: String,
    #[source]
    pub cause: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl StreamError {
    pub fn wrap<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StreamError {
            message: message.into(),
            cause: Box::new(cause),
        }
    }
}

impl From<ParserError> for StreamError {
    fn from(err: ParserError) -> Self {
        StreamError::wrap("parser failed", err)
    }
}

/// Raised by the DOM compose/serialize layer: construction-time failures not
/// already captured by a wrapped [`StreamError`] (duplicate keys in contexts
/// that forbid them, unresolved alias during serialize).
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Stream(#[from] StreamError),
}
