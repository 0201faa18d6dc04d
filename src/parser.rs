use crate::Span;
use crate::ast::{AddOp, MulOp, Node};
use crate::environment::Environment;
use crate::error::CalcResult;
use crate::function::{Function, Macro};
use crate::lexer::{Token, TokenKind};
use std::iter::Peekable;
use std::rc::Rc;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected}, got {found}")]
    UnexpectedToken { found: Token, expected: String },
    #[error("expected {0}, got end of input")]
    UnexpectedEof(String),
    #[error("duplicate parameter `{name}` in macro `{macro_name}`")]
    DuplicateParameter {
        macro_name: String,
        name: String,
        span: Span,
    },
    #[error("invalid number `{0}`")]
    InvalidNumber(String, Span),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { found, .. } => Some(found.span),
            ParseError::UnexpectedEof(_) => None,
            ParseError::DuplicateParameter { span, .. } | ParseError::InvalidNumber(_, span) => {
                Some(*span)
            }
        }
    }
}

/// Recursive-descent parser over one token stream.
///
/// Parsing is not side-effect free: assignments are evaluated and stored, and
/// macro definitions registered, in `env` as soon as they are recognised.
/// Variable references are resolved to their current value at the same time.
pub struct Parser<'env> {
    tokens: Peekable<IntoIter<Token>>,
    env: &'env mut Environment,
}

impl<'env> Parser<'env> {
    pub fn new(tokens: Vec<Token>, env: &'env mut Environment) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
            env,
        }
    }

    /// Parses the whole stream as a statement list.
    pub fn parse(mut self) -> CalcResult<Vec<Node>> {
        self.parse_statements(Self::at_end)
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    fn at_end(&mut self) -> bool {
        self.peek_token().is_none()
    }

    fn at_punctuation(&mut self, text: &str) -> bool {
        self.peek_token().is_some_and(|t| t.is_punctuation(text))
    }

    fn at_separator(&mut self) -> bool {
        self.peek_token().is_some_and(Token::is_separator)
    }

    fn unexpected(found: Option<Token>, expected: &str) -> ParseError {
        match found {
            Some(found) => ParseError::UnexpectedToken {
                found,
                expected: expected.to_string(),
            },
            None => ParseError::UnexpectedEof(expected.to_string()),
        }
    }

    fn expect_punctuation(&mut self, text: &str) -> CalcResult<Token> {
        match self.next_token() {
            Some(token) if token.is_punctuation(text) => Ok(token),
            other => Err(Self::unexpected(other, &format!("`{}`", text)).into()),
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> CalcResult<Token> {
        match self.next_token() {
            Some(token) if token.kind == TokenKind::Identifier => Ok(token),
            other => Err(Self::unexpected(other, expected).into()),
        }
    }

    /// `stmtList := expression ((',' | NEWLINE) expression)*`, stopping when
    /// `done` holds before a statement or right after one.
    fn parse_statements<F>(&mut self, done: F) -> CalcResult<Vec<Node>>
    where
        F: Fn(&mut Self) -> bool,
    {
        let mut statements = Vec::new();
        while !done(self) {
            statements.push(self.parse_expression()?);
            if done(self) {
                break;
            }
            match self.next_token() {
                Some(token) if token.is_separator() => {}
                other => return Err(Self::unexpected(other, "`,` or newline").into()),
            }
        }
        Ok(statements)
    }

    /// `expression := atom (('+'|'-') atom)*`
    fn parse_expression(&mut self) -> CalcResult<Node> {
        let mut left = self.parse_atom()?;
        while let Some(op) = self.peek_operator(AddOp::from_lexeme) {
            self.next_token();
            let right = self.parse_atom()?;
            left = Node::additive(left, op, right);
        }
        Ok(left)
    }

    /// `atom := unit (('*'|'/'|'%') unit)*`
    fn parse_atom(&mut self) -> CalcResult<Node> {
        let mut left = self.parse_unit()?;
        while let Some(op) = self.peek_operator(MulOp::from_lexeme) {
            self.next_token();
            let right = self.parse_unit()?;
            left = Node::multiplicative(left, op, right);
        }
        Ok(left)
    }

    fn peek_operator<T>(&mut self, classify: fn(&str) -> Option<T>) -> Option<T> {
        match self.peek_token() {
            Some(token) if token.kind == TokenKind::Operator => classify(&token.text),
            _ => None,
        }
    }

    fn parse_unit(&mut self) -> CalcResult<Node> {
        match self.next_token() {
            Some(token) if token.kind == TokenKind::Number => {
                let value = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber(token.text.clone(), token.span))?;
                Ok(Node::literal(value, token.span))
            }
            Some(token) if token.is(TokenKind::Identifier, "macro") => self.parse_macro(token.span),
            Some(token) if token.kind == TokenKind::Identifier => self.parse_name(token),
            Some(token) if token.is_punctuation("(") => {
                let inner = self.parse_expression()?;
                let close = self.expect_punctuation(")")?;
                Ok(Node::new(inner.kind, token.span.merge(close.span)))
            }
            other => Err(Self::unexpected(other, "an operand").into()),
        }
    }

    /// A unit that starts with an identifier: a call, an assignment or a
    /// variable reference.
    fn parse_name(&mut self, name: Token) -> CalcResult<Node> {
        if self.at_punctuation("(") {
            // Callees must already be registered; there are no forward references.
            let callee = self.env.get_function(&name.text, name.span)?;
            self.next_token();
            let args = self.parse_statements(|p| p.at_punctuation(")"))?;
            let close = self.expect_punctuation(")")?;
            return Ok(Node::call(callee, args, name.span.merge(close.span)));
        }

        if self
            .peek_token()
            .is_some_and(|t| t.is(TokenKind::Operator, "="))
        {
            self.next_token();
            let rhs = self.parse_expression()?;
            let value = rhs.evaluate()?;
            self.env.set(&name.text, value);
            return Ok(rhs);
        }

        let value = self.env.get(&name.text, name.span)?;
        Ok(Node::literal(value, name.span))
    }

    /// `'macro' NAME '(' paramList ')' '(' rawBody ')'`, with the `macro`
    /// keyword already consumed. Registers the macro and yields a zero literal.
    fn parse_macro(&mut self, keyword_span: Span) -> CalcResult<Node> {
        let name = self.expect_identifier("a macro name")?;
        self.expect_punctuation("(")?;

        let mut parameters: Vec<String> = Vec::new();
        while !self.at_punctuation(")") {
            let param = self.expect_identifier("a parameter name")?;
            if parameters.contains(&param.text) {
                return Err(ParseError::DuplicateParameter {
                    macro_name: name.text,
                    name: param.text,
                    span: param.span,
                }
                .into());
            }
            parameters.push(param.text);
            if self.at_punctuation(")") {
                break;
            }
            if self.at_separator() {
                self.next_token();
            } else {
                let found = self.next_token();
                return Err(Self::unexpected(found, "`)`, `,` or newline").into());
            }
        }
        self.expect_punctuation(")")?;

        let open = self.expect_punctuation("(")?;
        let (body, close) = self.take_balanced_body()?;

        let scope = self.env.extend();
        let definition = Macro::new(name.text.clone(), parameters, body, scope);
        self.env
            .set_function(&name.text, Function::Macro(Rc::new(definition)));

        Ok(Node::literal(
            0.0,
            keyword_span.merge(open.span).merge(close.span),
        ))
    }

    /// Copies tokens up to the `)` matching an already consumed `(`, without
    /// interpreting them. Returns the body and the closing token.
    fn take_balanced_body(&mut self) -> CalcResult<(Vec<Token>, Token)> {
        let mut body = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(token) = self.next_token() else {
                return Err(ParseError::UnexpectedEof("`)`".to_string()).into());
            };
            if token.is_punctuation("(") {
                depth += 1;
            } else if token.is_punctuation(")") {
                depth -= 1;
                if depth == 0 {
                    return Ok((body, token));
                }
            }
            body.push(token);
        }
    }
}

// Helper function to lex and parse a line against an environment (useful for tests and REPL)
pub fn parse_str(input: &str, env: &mut Environment) -> CalcResult<Vec<Node>> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens, env).parse()
}
