use crate::environment::Environment;
use crate::error::{CalcError, CalcResult};
use crate::lexer::Token;
use crate::parser::Parser;
use std::fmt;
use std::rc::Rc;

pub type NativeFunc = dyn Fn(&[f64]) -> CalcResult<f64>;

/// Anything a call node can invoke.
#[derive(Clone)]
pub enum Function {
    Native(String, Rc<NativeFunc>), // The closure and its name (for display/errors)
    Macro(Rc<Macro>),
}

impl Function {
    pub fn native<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[f64]) -> CalcResult<f64> + 'static,
    {
        Function::Native(name.to_string(), Rc::new(func))
    }

    pub fn name(&self) -> &str {
        match self {
            Function::Native(name, _) => name,
            Function::Macro(m) => &m.name,
        }
    }

    pub fn call(&self, args: &[f64]) -> CalcResult<f64> {
        match self {
            Function::Native(_, func) => func(args),
            Function::Macro(m) => m.invoke(args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(name, _) => write!(f, "Native({})", name),
            Function::Macro(m) => write!(f, "Macro({}/{})", m.name, m.parameters.len()),
        }
    }
}

// Closures have no equality; two handles are equal when they share a target.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Native(n1, f1), Function::Native(n2, f2)) => {
                n1 == n2 && Rc::ptr_eq(f1, f2)
            }
            (Function::Macro(m1), Function::Macro(m2)) => Rc::ptr_eq(m1, m2),
            _ => false,
        }
    }
}

/// A user-defined template: `macro name(params)(body)`.
///
/// The body is kept as raw tokens and parsed again on every invocation, so it
/// sees the values bound at call time. `scope` is a snapshot of the defining
/// environment taken before the macro was registered, which means a macro
/// never sees itself or anything defined after it.
///
/// Each invocation clones `scope` into a fresh frame before binding the
/// parameters. Nested invocations of the same macro therefore cannot
/// overwrite each other's parameters, and nothing a body assigns or defines
/// survives past the call that did it.
///
/// Recursion is only reachable through native functions that call back into
/// a macro. It is not depth-limited: running out of stack aborts the process.
#[derive(Debug)]
pub struct Macro {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Token>,
    scope: Environment,
}

impl Macro {
    pub fn new(name: String, parameters: Vec<String>, body: Vec<Token>, scope: Environment) -> Self {
        Macro {
            name,
            parameters,
            body,
            scope,
        }
    }

    pub fn invoke(&self, args: &[f64]) -> CalcResult<f64> {
        if args.len() != self.parameters.len() {
            return Err(CalcError::ArityMismatch {
                name: self.name.clone(),
                expected: self.parameters.len(),
                found: args.len(),
            });
        }

        let mut frame = self.scope.extend();
        for (param, value) in self.parameters.iter().zip(args) {
            frame.set(param, *value);
        }

        let statements = Parser::new(self.body.clone(), &mut frame).parse()?;
        let mut result = 0.0;
        for statement in &statements {
            result = statement.evaluate()?;
        }
        Ok(result)
    }
}
