use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

/// Lexical class of a token. The punctuation and operator sets are fixed here
/// and nowhere else; the parser matches on the token text within a class.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")] // Newlines are separators, not whitespace
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    // One optional decimal point and one optional exponent marker, no sign.
    // The slice is checked with `f64::from_str` in `tokenize`.
    #[regex(r"(?:[0-9]+\.?[0-9]*|\.[0-9]*)(?:[eE][0-9]*)?")]
    Number,
    #[regex(r"[\p{L}_][\p{L}\p{Nd}_]*")]
    Identifier,
    #[token("(")]
    #[token(")")]
    #[token(",")]
    #[token("\n")]
    Punctuation,
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("=")]
    Operator,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number => write!(f, "number"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Punctuation => write!(f, "punctuation"),
            TokenKind::Operator => write!(f, "operator"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_punctuation(&self, text: &str) -> bool {
        self.is(TokenKind::Punctuation, text)
    }

    /// Statement separators: a comma or a line break.
    pub fn is_separator(&self) -> bool {
        self.is_punctuation(",") || self.is_punctuation("\n")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text.as_str() {
            "\n" => write!(f, "newline"),
            text => write!(f, "`{}`", text),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Error)]
pub enum LexerErrorKind {
    #[error("invalid number format `{0}`")]
    InvalidNumberFormat(String),
    #[error("invalid token `{0}`")]
    InvalidCharacter(char),
    #[default]
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerRangedResult<T> = Result<T, LexerError>;

/// Splits one input line into classified tokens, failing on the first
/// character that belongs to no class.
pub fn tokenize(input: &str) -> LexerRangedResult<Vec<Token>> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        let text = lexer.slice();
        let kind = result.map_err(|error| LexerError {
            error: match error {
                LexerErrorKind::InvalidToken => text
                    .chars()
                    .next()
                    .map_or(LexerErrorKind::InvalidToken, LexerErrorKind::InvalidCharacter),
                other => other,
            },
            span,
        })?;
        if kind == TokenKind::Number && text.parse::<f64>().is_err() {
            return Err(LexerError {
                error: LexerErrorKind::InvalidNumberFormat(text.to_string()),
                span,
            });
        }
        tokens.push(Token {
            kind,
            text: text.to_string(),
            span,
        });
    }
    Ok(tokens)
}
