use std::io::{self, Write};
use calculator_core::{evaluate, format_number};
use log::debug;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_EVALUATION_ERROR: u8 = 2;

/// Evaluates a single expression given on the command line and returns the
/// process exit status.
pub fn evaluate_once<W: Write, E: Write>(expression: &str, out: &mut W, err: &mut E) -> io::Result<u8> {
    debug!("Evaluating command-line expression {:?}", expression);
    match evaluate(expression) {
        Ok(value) => {
            writeln!(out, "{}", format_number(value))?;
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            writeln!(err, "Error: {}", e)?;
            Ok(EXIT_EVALUATION_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(expression: &str) -> (u8, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = evaluate_once(expression, &mut out, &mut err).unwrap();
        (code, String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn prints_the_result() {
        assert_eq!(run("2 + 3 * 4"), (EXIT_SUCCESS, "14\n".to_string(), String::new()));
        assert_eq!(run("1 / 4"), (EXIT_SUCCESS, "0.25\n".to_string(), String::new()));
    }

    #[test]
    fn reports_errors_on_stderr() {
        assert_eq!(
            run("10 / 0"),
            (EXIT_EVALUATION_ERROR, String::new(), "Error: division by zero\n".to_string())
        );
    }
}
