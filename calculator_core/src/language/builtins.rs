//! Fixed registry of the functions and constants an expression may name.
//!
//! Identifiers are resolved against these tables once, while parsing. The
//! evaluator only ever sees the resolved descriptors.

use std::f64::consts;
use crate::domain_error;
use crate::language::error::Result;

pub struct Function {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    apply: fn(&[f64]) -> Result<f64>,
}

impl Function {
    pub fn accepts(&self, count: usize) -> bool {
        (self.min_args..=self.max_args).contains(&count)
    }

    pub fn arity(&self) -> String {
        match (self.min_args, self.max_args) {
            (1, 1) => "exactly 1 argument".to_string(),
            (min, max) if min == max => format!("exactly {} arguments", min),
            (min, max) => format!("{} to {} arguments", min, max),
        }
    }

    /// Applies the function. The parser has already checked the arity.
    pub fn call(&self, args: &[f64]) -> Result<f64> {
        (self.apply)(args)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}()", self.name)
    }
}

#[derive(Debug)]
pub struct Constant {
    pub name: &'static str,
    pub value: f64,
}

pub static CONSTANTS: &[Constant] = &[
    Constant { name: "pi", value: consts::PI },
    Constant { name: "e", value: consts::E },
    Constant { name: "tau", value: consts::TAU },
];

pub static FUNCTIONS: &[Function] = &[
    Function { name: "sqrt", min_args: 1, max_args: 1, apply: sqrt },
    Function { name: "sin", min_args: 1, max_args: 1, apply: |a| Ok(a[0].sin()) },
    Function { name: "cos", min_args: 1, max_args: 1, apply: |a| Ok(a[0].cos()) },
    Function { name: "tan", min_args: 1, max_args: 1, apply: |a| Ok(a[0].tan()) },
    Function { name: "asin", min_args: 1, max_args: 1, apply: asin },
    Function { name: "acos", min_args: 1, max_args: 1, apply: acos },
    Function { name: "atan", min_args: 1, max_args: 1, apply: |a| Ok(a[0].atan()) },
    Function { name: "log", min_args: 1, max_args: 2, apply: log },
    Function { name: "ln", min_args: 1, max_args: 1, apply: log },
    Function { name: "log10", min_args: 1, max_args: 1, apply: log10 },
    Function { name: "exp", min_args: 1, max_args: 1, apply: |a| Ok(a[0].exp()) },
    Function { name: "abs", min_args: 1, max_args: 1, apply: |a| Ok(a[0].abs()) },
    Function { name: "round", min_args: 1, max_args: 2, apply: round },
    Function { name: "floor", min_args: 1, max_args: 1, apply: |a| Ok(a[0].floor()) },
    Function { name: "ceil", min_args: 1, max_args: 1, apply: |a| Ok(a[0].ceil()) },
];

pub fn lookup_function(name: &str) -> Option<&'static Function> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

pub fn lookup_constant(name: &str) -> Option<&'static Constant> {
    CONSTANTS.iter().find(|c| c.name == name)
}

fn sqrt(args: &[f64]) -> Result<f64> {
    if args[0] < 0.0 {
        return domain_error!("sqrt of a negative number");
    }
    Ok(args[0].sqrt())
}

fn asin(args: &[f64]) -> Result<f64> {
    if !(-1.0..=1.0).contains(&args[0]) {
        return domain_error!("asin argument outside [-1, 1]");
    }
    Ok(args[0].asin())
}

fn acos(args: &[f64]) -> Result<f64> {
    if !(-1.0..=1.0).contains(&args[0]) {
        return domain_error!("acos argument outside [-1, 1]");
    }
    Ok(args[0].acos())
}

fn log(args: &[f64]) -> Result<f64> {
    let x = args[0];
    if x <= 0.0 {
        return domain_error!("log of a non-positive number");
    }
    match args.get(1) {
        None => Ok(x.ln()),
        Some(&base) if base <= 0.0 || base == 1.0 => {
            domain_error!("log base must be positive and different from 1")
        }
        Some(&base) => Ok(x.ln() / base.ln()),
    }
}

fn log10(args: &[f64]) -> Result<f64> {
    if args[0] <= 0.0 {
        return domain_error!("log10 of a non-positive number");
    }
    Ok(args[0].log10())
}

// Ties go to the even neighbour: round(2.5) == 2, round(3.5) == 4. With a
// precision the decimal expansion of the stored value decides, so
// round(2.675, 2) == 2.67 because 2.675 is held as 2.67499999...
fn round(args: &[f64]) -> Result<f64> {
    let x = args[0];
    let Some(&digits) = args.get(1) else {
        return Ok(x.round_ties_even());
    };
    if digits.fract() != 0.0 {
        return domain_error!("round precision must be an integer");
    }

    if digits < 0.0 {
        let factor = 10f64.powi(digits.abs().min(308.0) as i32);
        return Ok((x / factor).round_ties_even() * factor);
    }

    // Beyond this every finite f64 is already exact.
    let precision = digits.min(1100.0) as usize;
    match format!("{:.*}", precision, x).parse::<f64>() {
        Ok(rounded) => Ok(rounded),
        Err(_) => domain_error!("round could not represent the result"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::error::ErrorKind;

    #[test]
    fn every_name_is_unique() {
        let mut names: Vec<&str> = FUNCTIONS.iter().map(|f| f.name)
            .chain(CONSTANTS.iter().map(|c| c.name))
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn log_and_ln_agree() {
        let log = lookup_function("log").unwrap();
        let ln = lookup_function("ln").unwrap();
        assert_eq!(log.call(&[10.0]).unwrap(), ln.call(&[10.0]).unwrap());
    }

    #[test]
    fn log_with_base() {
        let log = lookup_function("log").unwrap();
        assert!((log.call(&[8.0, 2.0]).unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(log.call(&[8.0, 1.0]).unwrap_err().kind, ErrorKind::Domain);
    }

    #[test]
    fn round_is_half_to_even() {
        let round = lookup_function("round").unwrap();
        assert_eq!(round.call(&[2.5]).unwrap(), 2.0);
        assert_eq!(round.call(&[3.5]).unwrap(), 4.0);
        assert_eq!(round.call(&[-2.5]).unwrap(), -2.0);
        assert_eq!(round.call(&[3.14159, 2.0]).unwrap(), 3.14);
        assert_eq!(round.call(&[1234.0, -2.0]).unwrap(), 1200.0);
    }

    #[test]
    fn round_with_precision_uses_the_stored_value() {
        let round = lookup_function("round").unwrap();
        assert_eq!(round.call(&[2.675, 2.0]).unwrap(), 2.67);
        assert_eq!(round.call(&[1.005, 2.0]).unwrap(), 1.0);
        assert_eq!(round.call(&[-3.14159, 3.0]).unwrap(), -3.142);
        assert_eq!(round.call(&[0.1, 40.0]).unwrap(), 0.1);
        assert_eq!(round.call(&[1e300, 5.0]).unwrap(), 1e300);
    }

    #[test]
    fn round_rejects_fractional_precision() {
        let round = lookup_function("round").unwrap();
        assert_eq!(round.call(&[1.0, 0.5]).unwrap_err().kind, ErrorKind::Domain);
    }

    #[test]
    fn arity_descriptions() {
        assert_eq!(lookup_function("sqrt").unwrap().arity(), "exactly 1 argument");
        assert_eq!(lookup_function("log").unwrap().arity(), "1 to 2 arguments");
        assert!(lookup_function("round").unwrap().accepts(2));
        assert!(!lookup_function("floor").unwrap().accepts(2));
    }

    #[test]
    fn unknown_names_are_absent() {
        assert!(lookup_function("foo").is_none());
        assert!(lookup_constant("sqrt").is_none());
        assert!(lookup_constant("tau").is_some());
    }
}
