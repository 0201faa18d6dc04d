use crate::error::{CalcError, CalcResult};
use crate::function::Function;
use crate::source::Span;
use std::fmt;

/// `*`, `/` and `%`: the tighter-binding tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MulOp {
    Mul,
    Div,
    Mod,
}

/// `+` and `-`: the looser-binding tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddOp {
    Add,
    Sub,
}

impl MulOp {
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        match lexeme {
            "*" => Some(MulOp::Mul),
            "/" => Some(MulOp::Div),
            "%" => Some(MulOp::Mod),
            _ => None,
        }
    }
}

impl AddOp {
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        match lexeme {
            "+" => Some(AddOp::Add),
            "-" => Some(AddOp::Sub),
            _ => None,
        }
    }
}

impl fmt::Display for MulOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MulOp::Mul => write!(f, "*"),
            MulOp::Div => write!(f, "/"),
            MulOp::Mod => write!(f, "%"),
        }
    }
}

impl fmt::Display for AddOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddOp::Add => write!(f, "+"),
            AddOp::Sub => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Multiplicative {
        left: Box<Node>,
        op: MulOp,
        right: Box<Node>,
    },
    Additive {
        left: Box<Node>,
        op: AddOp,
        right: Box<Node>,
    },
    Call {
        callee: Function,
        args: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Expr,
    pub span: Span, // The source span it covers
}

impl Node {
    pub fn new(kind: Expr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn literal(value: f64, span: Span) -> Self {
        Node::new(Expr::Literal(value), span)
    }

    pub fn multiplicative(left: Node, op: MulOp, right: Node) -> Self {
        let span = left.span.merge(right.span);
        Node::new(
            Expr::Multiplicative {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn additive(left: Node, op: AddOp, right: Node) -> Self {
        let span = left.span.merge(right.span);
        Node::new(
            Expr::Additive {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn call(callee: Function, args: Vec<Node>, span: Span) -> Self {
        Node::new(Expr::Call { callee, args }, span)
    }

    /// Evaluates the node to a number. Nodes hold no environment: names were
    /// resolved while parsing, so evaluation only ever fails on arithmetic or
    /// inside a callee.
    pub fn evaluate(&self) -> CalcResult<f64> {
        match &self.kind {
            Expr::Literal(value) => Ok(*value),
            Expr::Multiplicative { left, op, right } => {
                let left = left.evaluate()?;
                let right = right.evaluate()?;
                apply_multiplicative(left, *op, right, self.span)
            }
            Expr::Additive { left, op, right } => {
                let left = left.evaluate()?;
                let right = right.evaluate()?;
                Ok(match op {
                    AddOp::Add => left + right,
                    AddOp::Sub => left - right,
                })
            }
            Expr::Call { callee, args } => {
                let mut evaluated_args = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated_args.push(arg.evaluate()?);
                }
                callee
                    .call(&evaluated_args)
                    .map_err(|err| CalcError::Evaluation {
                        callee: callee.name().to_string(),
                        span: self.span,
                        source: Box::new(err),
                    })
            }
        }
    }
}

fn apply_multiplicative(left: f64, op: MulOp, right: f64, span: Span) -> CalcResult<f64> {
    match op {
        MulOp::Mul => Ok(left * right),
        MulOp::Div => {
            if right == 0.0 {
                return Err(CalcError::DivisionByZero { span });
            }
            Ok(left / right)
        }
        MulOp::Mod => {
            // NaN fails the trunc comparison too; infinity passes it
            if !right.is_finite() || right.trunc() != right || right <= 0.0 {
                return Err(CalcError::InvalidModulus {
                    divisor: right,
                    span,
                });
            }
            Ok(left.rem_euclid(right))
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Multiplicative { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Additive { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee.name())?;
                let mut first = true;
                for arg in args {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                    first = false;
                }
                write!(f, ")")
            }
        }
    }
}
