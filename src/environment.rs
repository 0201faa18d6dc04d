use crate::function::Function;
use crate::source::Span;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

// --- Environment Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("unknown variable `{0}`")]
    UndefinedVariable(String, Span), // Name, span where lookup happened
    #[error("unknown function `{0}`")]
    UndefinedFunction(String, Span),
}

impl EnvError {
    pub fn span(&self) -> Span {
        match self {
            EnvError::UndefinedVariable(_, span) | EnvError::UndefinedFunction(_, span) => *span,
        }
    }
}

// --- Environment Definition ---

/// A flat scope of numeric variables and callable functions.
///
/// There is no parent link: child scopes are made with [`Environment::extend`],
/// which copies both tables by value. After that the two environments evolve
/// independently. Function handles are shared (`Rc`), so copying a table never
/// duplicates a macro definition.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: HashMap<String, f64>,
    functions: HashMap<String, Function>,
}

impl Environment {
    /// Creates an empty environment with no built-ins.
    pub fn new() -> Self {
        Environment::default()
    }

    /// Creates a session environment with the built-in math functions bound.
    pub fn new_global_populated() -> Self {
        let mut env = Environment::new();
        crate::builtins::install(&mut env);
        env
    }

    /// Looks up a variable's value.
    /// `lookup_span` is the location where the variable was referenced, used for error reporting.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<f64, EnvError> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| EnvError::UndefinedVariable(name.to_string(), lookup_span))
    }

    /// Binds a variable, replacing any previous value.
    pub fn set(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get_function(&self, name: &str, lookup_span: Span) -> Result<Function, EnvError> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| EnvError::UndefinedFunction(name.to_string(), lookup_span))
    }

    /// Binds a function, replacing any previous one (built-ins included).
    pub fn set_function(&mut self, name: &str, function: Function) {
        self.functions.insert(name.to_string(), function);
    }

    /// Snapshot of this environment for use as a child scope.
    pub fn extend(&self) -> Environment {
        Environment {
            variables: self.variables.clone(),
            functions: self.functions.clone(),
        }
    }

    /// Gets all variable and function names bound in this environment
    pub fn identifiers(&self) -> HashSet<String> {
        self.variables
            .keys()
            .chain(self.functions.keys())
            .cloned()
            .collect()
    }
}
