use crate::ast::Node;
use crate::environment::Environment;
use crate::error::CalcResult;
use crate::parser::parse_str;

/// Evaluates parsed statements in order, stopping at the first failure.
pub fn evaluate_all(statements: &[Node]) -> CalcResult<Vec<f64>> {
    statements.iter().map(Node::evaluate).collect()
}

/// Tokenizes, parses and evaluates one input line against `env`.
///
/// Assignments and macro definitions take effect while the line is parsed;
/// the returned values come from evaluating each statement afterwards. A
/// failure leaves in place whatever the line had already committed.
pub fn evaluate_line(input: &str, env: &mut Environment) -> CalcResult<Vec<f64>> {
    let statements = parse_str(input, env)?;
    evaluate_all(&statements)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvError;
    use crate::error::CalcError;

    // Helper to evaluate a line and check the results
    fn assert_eval(input: &str, expected: &[f64], env: &mut Environment) {
        match evaluate_line(input, env) {
            Ok(values) => assert_eq!(values, expected, "Input: '{}'", input),
            Err(e) => panic!("Evaluation failed for input '{}': {}", input, e),
        }
    }

    // Helper to assert the root cause of a failing line
    fn assert_eval_error<F>(input: &str, env: &mut Environment, check: F)
    where
        F: Fn(&CalcError) -> bool,
    {
        match evaluate_line(input, env) {
            Ok(values) => panic!(
                "Expected evaluation to fail for input '{}', but got: {:?}",
                input, values
            ),
            Err(e) => assert!(check(e.root_cause()), "Input: '{}', got: {:?}", input, e),
        }
    }

    #[test]
    fn test_arithmetic() {
        let mut env = Environment::new_global_populated();
        assert_eval("1+2*3", &[7.0], &mut env);
        assert_eval("(1+2)*3", &[9.0], &mut env);
        assert_eval("10 - 4 - 3", &[3.0], &mut env);
        assert_eval("7 / 2", &[3.5], &mut env);
        assert_eval("5 % 2", &[1.0], &mut env);
        assert_eval("2.5e2", &[250.0], &mut env);
    }

    #[test]
    fn test_assignment_sequence() {
        let mut env = Environment::new_global_populated();
        assert_eval("x=5, x+1", &[5.0, 6.0], &mut env);
        assert_eval("x", &[5.0], &mut env);
    }

    #[test]
    fn test_assignment_statement_is_recomputed() {
        // `y = (x = x + 1)` stores 2 while parsing; evaluating the returned
        // node afterwards recomputes the right-hand side from literals
        let mut env = Environment::new();
        env.set("x", 1.0);
        assert_eval("y = (x = x + 1)", &[2.0], &mut env);
        assert_eq!(env.get("x", Default::default()), Ok(2.0));
        assert_eq!(env.get("y", Default::default()), Ok(2.0));
    }

    #[test]
    fn test_math_errors() {
        let mut env = Environment::new_global_populated();
        assert_eval_error("1/0", &mut env, |e| {
            matches!(e, CalcError::DivisionByZero { .. })
        });
        assert_eval_error("5%2.5", &mut env, |e| {
            matches!(e, CalcError::InvalidModulus { .. })
        });
        assert_eval_error("5%(0-1)", &mut env, |e| {
            matches!(e, CalcError::InvalidModulus { .. })
        });
        assert_eval_error("sqrt(0-4)", &mut env, |e| {
            matches!(e, CalcError::Domain { .. })
        });
    }

    #[test]
    fn test_macros() {
        let mut env = Environment::new_global_populated();
        assert_eval("macro f(a,b)(a+b)", &[0.0], &mut env);
        assert_eval("f(2,3)", &[5.0], &mut env);
        assert_eval("f(f(1,2), 10)", &[13.0], &mut env);
        assert_eval_error("f(1)", &mut env, |e| {
            matches!(e, CalcError::ArityMismatch { expected: 2, found: 1, .. })
        });
    }

    #[test]
    fn test_macro_sees_definition_time_snapshot() {
        let mut env = Environment::new_global_populated();
        assert_eval("k = 10, macro addk(a)(a + k)", &[10.0, 0.0], &mut env);
        assert_eval("k = 1000, addk(1)", &[1000.0, 11.0], &mut env);
    }

    #[test]
    fn test_macro_calls_earlier_macros_and_builtins() {
        let mut env = Environment::new_global_populated();
        assert_eval("macro sq(a)(a*a)", &[0.0], &mut env);
        assert_eval("macro hyp(a, b)(sqrt(sq(a) + sq(b)))", &[0.0], &mut env);
        assert_eval("hyp(3, 4)", &[5.0], &mut env);
    }

    #[test]
    fn test_macro_body_with_several_statements() {
        let mut env = Environment::new_global_populated();
        assert_eval("macro f(a)(b = a * 2, b + 1)", &[0.0], &mut env);
        assert_eval("f(4)", &[9.0], &mut env);
        // b was bound in the call frame only
        assert_eval_error("b", &mut env, |e| {
            matches!(e, CalcError::Env(EnvError::UndefinedVariable(..)))
        });
    }

    #[test]
    fn test_redefining_a_macro() {
        let mut env = Environment::new_global_populated();
        assert_eval("macro f(a)(a + 1)", &[0.0], &mut env);
        // the new f captures the old one
        assert_eval("macro f(a)(f(a) * 10)", &[0.0], &mut env);
        assert_eval("f(1)", &[20.0], &mut env);
    }

    #[test]
    fn test_shadowing_a_builtin() {
        let mut env = Environment::new_global_populated();
        assert_eval("macro sqrt(a)(a)", &[0.0], &mut env);
        assert_eval("sqrt(9)", &[9.0], &mut env);
    }

    #[test]
    fn test_failure_keeps_earlier_assignments() {
        let mut env = Environment::new_global_populated();
        assert_eval_error("a = 1, b = 2 / 0, c = 3", &mut env, |e| {
            matches!(e, CalcError::DivisionByZero { .. })
        });
        assert_eq!(env.get("a", Default::default()), Ok(1.0));
        assert!(env.get("b", Default::default()).is_err());
        assert!(env.get("c", Default::default()).is_err());
    }

    #[test]
    fn test_undefined_names() {
        let mut env = Environment::new_global_populated();
        assert_eval_error("y", &mut env, |e| {
            matches!(e, CalcError::Env(EnvError::UndefinedVariable(name, _)) if name == "y")
        });
        assert_eval_error("nope(1)", &mut env, |e| {
            matches!(e, CalcError::Env(EnvError::UndefinedFunction(name, _)) if name == "nope")
        });
    }
}
