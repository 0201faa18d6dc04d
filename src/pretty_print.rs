use crate::CalcError;
use crate::environment::EnvError;
use crate::parser::ParseError;
use ariadne::{Label, Report, ReportKind, Source};
use std::ops::Range;

type ReplSpan = (&'static str, Range<usize>);

impl CalcError {
    /// Builds a diagnostic for this error against the line it came from.
    pub fn report(&self, input: &str) -> Report<'static, ReplSpan> {
        // Errors without a position point at the end of the line
        let range = self
            .span()
            .map(|span| span.to_range())
            .unwrap_or(input.len()..input.len());
        let label = Label::new(("REPL", range.clone()));
        let builder = Report::build(ReportKind::Error, ("REPL", range));
        let report = match self {
            CalcError::Lexer(lex_err) => builder
                .with_message("Tokenization error")
                .with_label(label.with_message(lex_err.error.to_string())),
            CalcError::Parse(ParseError::UnexpectedToken { found, expected }) => builder
                .with_message(format!("Unexpected token: {}", found))
                .with_label(label.with_message(format!("Expected {expected}"))),
            CalcError::Parse(ParseError::UnexpectedEof(expected)) => builder
                .with_message("Unexpected end of input")
                .with_label(label.with_message(format!("Expected {expected}"))),
            CalcError::Parse(parse_err) => builder
                .with_message("Parse error")
                .with_label(label.with_message(parse_err.to_string())),
            CalcError::Env(EnvError::UndefinedVariable(name, _)) => builder
                .with_message(format!("Unknown variable `{}`", name))
                .with_label(label.with_message("This variable has not been assigned")),
            CalcError::Env(EnvError::UndefinedFunction(name, _)) => builder
                .with_message(format!("Unknown function `{}`", name))
                .with_label(
                    label.with_message("Functions and macros must be defined before use"),
                ),
            CalcError::DivisionByZero { .. } => builder
                .with_message("Division by zero")
                .with_label(label.with_message("The right operand evaluates to 0")),
            CalcError::InvalidModulus { divisor, .. } => builder
                .with_message("Invalid modulus")
                .with_label(label.with_message(format!(
                    "The right operand is {}, expected a positive integer",
                    divisor
                ))),
            CalcError::Evaluation { callee, source, .. } => builder
                .with_message(format!("Error in evaluation of `{}`", callee))
                .with_label(label.with_message(source.root_cause().to_string())),
            CalcError::ArityMismatch { .. } | CalcError::Domain { .. } => builder
                .with_message("Evaluation error")
                .with_label(label.with_message(self.to_string())),
        };
        report.finish()
    }

    /// Prints the diagnostic to stderr.
    pub fn pretty_print(&self, input: &str) -> std::io::Result<()> {
        self.report(input).eprint(("REPL", Source::from(input)))
    }
}
