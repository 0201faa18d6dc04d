use crate::environment::Environment;
use crate::error::{CalcError, CalcResult};
use crate::function::Function;

type UnaryFunc = fn(f64) -> f64;

const UNARY_BUILTINS: [(&str, UnaryFunc); 10] = [
    ("ln", f64::ln),
    ("sqrt", f64::sqrt),
    ("atan", f64::atan),
    ("asin", f64::asin),
    ("acos", f64::acos),
    ("cos", f64::cos),
    ("sin", f64::sin),
    ("tan", f64::tan),
    ("log10", f64::log10),
    ("exp", f64::exp),
];

/// Binds every built-in math function in `env`.
pub fn install(env: &mut Environment) {
    for (name, func) in UNARY_BUILTINS {
        let builtin = Function::native(name, move |args| apply_unary(name, func, args));
        env.set_function(name, builtin);
    }
}

// A finite argument with a NaN or infinite result is outside the function's
// domain (sqrt(-1), ln(0)) or overflows (exp(1000)).
fn apply_unary(name: &str, func: UnaryFunc, args: &[f64]) -> CalcResult<f64> {
    let [argument] = args else {
        return Err(CalcError::ArityMismatch {
            name: name.to_string(),
            expected: 1,
            found: args.len(),
        });
    };
    let result = func(*argument);
    if argument.is_finite() && !result.is_finite() {
        return Err(CalcError::Domain {
            function: name.to_string(),
            argument: *argument,
        });
    }
    Ok(result)
}
