use log::trace;
use crate::language::ast::{BinaryOp, Expr, UnaryOp};
use crate::language::error::{ErrorKind, EvaluationError, Result};
use crate::language::parser::{self, PREVIOUS_RESULT};
use crate::{division_by_zero, domain_error, unknown_identifier};

/// Context an expression is evaluated against. The evaluator reads it and
/// never writes it, so the same input and scope always give the same result.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scope {
    pub previous: Option<f64>,
}

impl Scope {
    pub fn with_previous(previous: f64) -> Self {
        Scope { previous: Some(previous) }
    }
}

pub struct Evaluator<'a> {
    scope: &'a Scope,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a Scope) -> Self {
        Evaluator { scope }
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<f64> {
        let value = match expr {
            Expr::Number(value) => *value,
            Expr::Constant(constant) => constant.value,
            Expr::PreviousResult => match self.scope.previous {
                Some(value) => value,
                None => return unknown_identifier!(format!("{} (no previous result)", PREVIOUS_RESULT)),
            },
            Expr::Unary { op: UnaryOp::Plus, operand } => self.evaluate(operand)?,
            Expr::Unary { op: UnaryOp::Minus, operand } => -self.evaluate(operand)?,
            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                trace!("Binary operation: {} {} {}", left, op.symbol(), right);
                self.evaluate_binary_op(left, *op, right)?
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<f64>>>()?;
                trace!("Calling {}({:?})", function.name, values);
                function.call(&values)?
            }
        };

        ensure_finite(value)
    }

    fn evaluate_binary_op(&self, left: f64, op: BinaryOp, right: f64) -> Result<f64> {
        match op {
            BinaryOp::Add => Ok(left + right),
            BinaryOp::Subtract => Ok(left - right),
            BinaryOp::Multiply => Ok(left * right),
            BinaryOp::Divide => {
                if right == 0.0 {
                    return division_by_zero!();
                }
                Ok(left / right)
            }
            BinaryOp::Modulo => {
                if right == 0.0 {
                    return division_by_zero!();
                }
                Ok(floored_rem(left, right))
            }
            BinaryOp::Power => {
                if left == 0.0 && right < 0.0 {
                    return division_by_zero!();
                }
                if left < 0.0 && right.fract() != 0.0 {
                    return domain_error!("negative base with a fractional exponent");
                }
                Ok(left.powf(right))
            }
        }
    }
}

/// Remainder taking the sign of the divisor: -7 % 3 == 2, 7 % -3 == -2.
fn floored_rem(left: f64, right: f64) -> f64 {
    let rem = left % right;
    if rem != 0.0 && (rem < 0.0) != (right < 0.0) {
        rem + right
    } else {
        rem
    }
}

fn ensure_finite(value: f64) -> Result<f64> {
    if value.is_nan() {
        return domain_error!("result is not a real number");
    }
    if value.is_infinite() {
        return Err(EvaluationError::new(ErrorKind::Overflow, "result is too large"));
    }
    Ok(value)
}

/// Evaluates `expression` with no previous result available.
pub fn evaluate(expression: &str) -> Result<f64> {
    evaluate_in(expression, &Scope::default())
}

/// Evaluates `expression`, resolving `_` from `scope`.
pub fn evaluate_in(expression: &str, scope: &Scope) -> Result<f64> {
    let expr = parser::parse(expression)?;
    Evaluator::new(scope).evaluate(&expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::{MAX_NESTING, MAX_TOKENS};

    fn eval(input: &str) -> f64 {
        evaluate(input).unwrap_or_else(|e| panic!("{input:?} failed: {e}"))
    }

    fn fails(input: &str) -> EvaluationError {
        evaluate(input).unwrap_err()
    }

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("2 * 3 % 4"), 2.0);
    }

    #[test]
    fn exponentiation() {
        assert_eq!(eval("2 ** 3 ** 2"), 512.0);
        assert_eq!(eval("-2 ** 2"), -4.0);
        assert_eq!(eval("(-2) ** 2"), 4.0);
        assert_eq!(eval("2 ** -1"), 0.5);
        assert_eq!(eval("(-8) ** 3"), -512.0);
    }

    #[test]
    fn unary_signs_stack() {
        assert_eq!(eval("--2"), 2.0);
        assert_eq!(eval("+-+3"), -3.0);
        assert_eq!(eval("4 - -1"), 5.0);
    }

    #[test]
    fn modulo_follows_the_divisor_sign() {
        assert_eq!(eval("7 % 3"), 1.0);
        assert_eq!(eval("-7 % 3"), 2.0);
        assert_eq!(eval("7 % -3"), -2.0);
        assert_eq!(eval("5.5 % 2"), 1.5);
        assert_eq!(eval("6 % 3"), 0.0);
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(eval("sqrt(9) + 2**3"), 11.0);
        assert!((eval("pi") - 3.141592653589793).abs() < 1e-15);
        assert!((eval("tau / 2") - eval("pi")).abs() < 1e-15);
        assert!((eval("ln(e)") - 1.0).abs() < 1e-15);
        assert!((eval("log10(1000)") - 3.0).abs() < 1e-12);
        assert!((eval("sin(pi / 2)") - 1.0).abs() < 1e-15);
        assert_eq!(eval("abs(-3) + floor(2.7) + ceil(2.1)"), 8.0);
        assert_eq!(eval("round(2.5)"), 2.0);
        assert_eq!(eval("round(3.14159, 2)"), 3.14);
        assert_eq!(eval("exp(0)"), 1.0);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(fails("10 / 0").kind, ErrorKind::DivisionByZero);
        assert_eq!(fails("10 % 0").to_string(), "division by zero");
        assert_eq!(fails("1 / (2 - 2)").kind, ErrorKind::DivisionByZero);
        assert_eq!(fails("0 ** -1").kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn domain_errors() {
        assert_eq!(fails("sqrt(-1)").kind, ErrorKind::Domain);
        assert_eq!(fails("log(0)").kind, ErrorKind::Domain);
        assert_eq!(fails("ln(-2)").kind, ErrorKind::Domain);
        assert_eq!(fails("log10(0)").kind, ErrorKind::Domain);
        assert_eq!(fails("asin(2)").kind, ErrorKind::Domain);
        assert_eq!(fails("(-8) ** (1/3)").kind, ErrorKind::Domain);
    }

    #[test]
    fn overflow() {
        assert_eq!(fails("exp(1000)").kind, ErrorKind::Overflow);
        assert_eq!(fails("10 ** 400").kind, ErrorKind::Overflow);
        assert_eq!(fails("1e308 * 10").kind, ErrorKind::Overflow);
    }

    #[test]
    fn previous_result_comes_from_the_scope() {
        let scope = Scope::with_previous(7.0);
        assert_eq!(evaluate_in("_ * 2", &scope).unwrap(), 14.0);
        assert_eq!(evaluate_in("2 ** _", &Scope::with_previous(-1.0)).unwrap(), 0.5);

        let err = fails("_ + 1");
        assert_eq!(err.kind, ErrorKind::UnknownIdentifier);
        assert_eq!(err.to_string(), "unknown identifier: _ (no previous result)");
    }

    // Tokio workers and test threads run with 2 MiB of stack.
    fn on_worker_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn deepest_accepted_expressions_fit_a_worker_stack() {
        on_worker_stack(|| {
            let chain = vec!["1"; MAX_NESTING + 1].join("+");
            assert_eq!(eval(&chain), (MAX_NESTING + 1) as f64);

            let calls = format!("{}1{}", "abs(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
            assert_eq!(eval(&calls), 1.0);

            let signs = format!("{}1", "-".repeat(MAX_NESTING));
            assert_eq!(eval(&signs), 1.0);

            // Longest stream the token limit lets through.
            let longest = vec!["1"; MAX_TOKENS / 2].join("+");
            assert_eq!(fails(&longest).kind, ErrorKind::Syntax);
        });
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let first = eval("sin(1) * 3 + sqrt(2)");
        for _ in 0..10 {
            assert_eq!(eval("sin(1) * 3 + sqrt(2)"), first);
        }
    }
}
