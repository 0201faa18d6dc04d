use crate::environment::EnvError;
use crate::lexer::LexerError;
use crate::parser::ParseError;
use crate::source::Span;
use thiserror::Error;

/// Every way tokenizing, parsing or evaluating a line can fail.
///
/// Each failure aborts the rest of the line it occurred in. Side effects that
/// were committed before it (assignments, macro definitions) stay in effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error("cannot divide by 0")]
    DivisionByZero { span: Span },
    #[error("invalid divisor `{divisor}` for modulo operator, expected a positive integer")]
    InvalidModulus { divisor: f64, span: Span },
    #[error("`{name}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("`{function}` is not defined for {argument}")]
    Domain { function: String, argument: f64 },
    // Raised by a call node around whatever its callee failed with
    #[error("error in evaluation of `{callee}`: {source}")]
    Evaluation {
        callee: String,
        span: Span,
        source: Box<CalcError>,
    },
}

impl CalcError {
    /// The innermost failure, looking through nested `Evaluation` wrappers.
    pub fn root_cause(&self) -> &CalcError {
        match self {
            CalcError::Evaluation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Where in the input line the failure was detected, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            CalcError::Lexer(err) => Some(err.span),
            CalcError::Parse(err) => err.span(),
            CalcError::Env(err) => Some(err.span()),
            CalcError::DivisionByZero { span }
            | CalcError::InvalidModulus { span, .. }
            | CalcError::Evaluation { span, .. } => Some(*span),
            CalcError::ArityMismatch { .. } | CalcError::Domain { .. } => None,
        }
    }
}

// Result type alias for convenience
pub type CalcResult<T> = Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested_calls() {
        let err = CalcError::Evaluation {
            callee: "outer".to_string(),
            span: Span::new(0, 8),
            source: Box::new(CalcError::Evaluation {
                callee: "inner".to_string(),
                span: Span::new(2, 6),
                source: Box::new(CalcError::DivisionByZero {
                    span: Span::new(3, 4),
                }),
            }),
        };
        assert_eq!(
            err.root_cause(),
            &CalcError::DivisionByZero {
                span: Span::new(3, 4)
            }
        );
        assert_eq!(err.span(), Some(Span::new(0, 8)));
    }

    #[test]
    fn test_messages_name_the_callee_and_cause() {
        let err = CalcError::Evaluation {
            callee: "f".to_string(),
            span: Span::default(),
            source: Box::new(CalcError::ArityMismatch {
                name: "f".to_string(),
                expected: 2,
                found: 1,
            }),
        };
        assert_eq!(
            err.to_string(),
            "error in evaluation of `f`: `f` expects 2 argument(s), got 1"
        );
    }
}
