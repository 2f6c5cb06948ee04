use log::debug;
use crate::language::{evaluate_in, Result, Scope};

/// One interactive run. Owns the previous result and hands it to the
/// evaluator explicitly on every call.
#[derive(Debug, Default)]
pub struct Session {
    scope: Scope,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Evaluates `line`; on success the value becomes the new `_`. A failed
    /// evaluation leaves `_` untouched.
    pub fn evaluate(&mut self, line: &str) -> Result<f64> {
        let value = evaluate_in(line, &self.scope)?;
        debug!("Session result {} replaces {:?}", value, self.scope.previous);
        self.scope.previous = Some(value);
        Ok(value)
    }

    pub fn previous(&self) -> Option<f64> {
        self.scope.previous
    }

    pub fn clear(&mut self) {
        self.scope.previous = None;
    }
}
