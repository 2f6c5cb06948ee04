use log::{debug, trace};
use crate::language::ast::{BinaryOp, Expr, UnaryOp};
use crate::language::builtins::{lookup_constant, lookup_function};
use crate::language::error::{ErrorKind, EvaluationError, Result};
use crate::language::lexer::Lexer;
use crate::language::token::{Token, TokenType};
use crate::syntax_error;

/// Name that refers to the previous result of an interactive session.
pub const PREVIOUS_RESULT: &str = "_";

/// Longest accepted token stream, end marker included.
pub const MAX_TOKENS: usize = 4096;

/// Deepest accepted nesting. Parentheses, signs, powers, calls and every
/// chained binary operator each count one level, so the depth of the tree
/// the evaluator walks never exceeds it.
pub const MAX_NESTING: usize = 256;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    nesting: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            nesting: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Expr> {
        if self.is_at_end() {
            return syntax_error!("empty expression", self.peek().column);
        }
        if self.tokens.len() > MAX_TOKENS {
            return syntax_error!(
                format!("expression is longer than {} tokens", MAX_TOKENS),
                self.tokens[MAX_TOKENS].column
            );
        }

        let expr = self.expression()?;

        if !self.is_at_end() {
            return syntax_error!(format!("unexpected '{}'", self.peek()), self.peek().column);
        }

        Ok(expr)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) && !self.is_at_end() {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token_type: &TokenType, error_message: &str) -> Result<&Token> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            syntax_error!(
                format!("{}, found '{}'", error_message, self.peek()),
                self.peek().column
            )
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return syntax_error!("expression is nested too deeply", self.peek().column);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn expression(&mut self) -> Result<Expr> {
        self.additive()
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut expr = self.multiplicative()?;
        let mut folds = 0;

        loop {
            let op = if self.match_token(&TokenType::Plus) {
                BinaryOp::Add
            } else if self.match_token(&TokenType::Minus) {
                BinaryOp::Subtract
            } else {
                break;
            };

            // Each fold deepens the left spine of the tree by one.
            self.enter()?;
            folds += 1;
            let right = self.multiplicative()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        self.nesting -= folds;
        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;
        let mut folds = 0;

        loop {
            let op = if self.match_token(&TokenType::Star) {
                BinaryOp::Multiply
            } else if self.match_token(&TokenType::Slash) {
                BinaryOp::Divide
            } else if self.match_token(&TokenType::Percent) {
                BinaryOp::Modulo
            } else {
                break;
            };

            self.enter()?;
            folds += 1;
            let right = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        self.nesting -= folds;
        Ok(expr)
    }

    // Signs bind looser than `**` on their right: -2**2 == -(2**2).
    fn unary(&mut self) -> Result<Expr> {
        let op = if self.match_token(&TokenType::Minus) {
            UnaryOp::Minus
        } else if self.match_token(&TokenType::Plus) {
            UnaryOp::Plus
        } else {
            return self.power();
        };

        self.enter()?;
        let operand = self.unary()?;
        self.leave();

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    // Right-associative: 2**3**2 == 2**(3**2). The exponent may carry a sign.
    fn power(&mut self) -> Result<Expr> {
        let base = self.primary()?;

        if !self.match_token(&TokenType::DoubleStar) {
            return Ok(base);
        }

        self.enter()?;
        let exponent = self.unary()?;
        self.leave();

        Ok(Expr::Binary {
            left: Box::new(base),
            op: BinaryOp::Power,
            right: Box::new(exponent),
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();

        match &token.token_type {
            TokenType::Number { value, .. } => {
                self.advance();
                Ok(Expr::Number(*value))
            }
            TokenType::Identifier(name) => {
                self.advance();
                self.identifier(name, token.column)
            }
            TokenType::LParen => {
                self.advance();
                self.enter()?;
                let expr = self.expression()?;
                self.leave();
                self.consume(
                    &TokenType::RParen,
                    &format!("expected ')' to close '(' at column {}", token.column),
                )?;
                Ok(expr)
            }
            TokenType::Eof => syntax_error!("unexpected end of input", token.column),
            _ => syntax_error!(format!("unexpected '{}'", token), token.column),
        }
    }

    fn identifier(&mut self, name: &str, column: usize) -> Result<Expr> {
        if self.check(&TokenType::LParen) {
            let Some(function) = lookup_function(name) else {
                return Err(EvaluationError::new(ErrorKind::UnknownIdentifier, name).at(column));
            };

            self.advance();
            self.enter()?;
            let args = self.arguments()?;
            self.leave();

            if !function.accepts(args.len()) {
                return syntax_error!(
                    format!("{}() takes {} ({} given)", function.name, function.arity(), args.len()),
                    column
                );
            }

            trace!("Resolved call to {}() with {} argument(s)", function.name, args.len());
            return Ok(Expr::Call { function, args });
        }

        if name == PREVIOUS_RESULT {
            return Ok(Expr::PreviousResult);
        }

        if let Some(constant) = lookup_constant(name) {
            return Ok(Expr::Constant(constant));
        }

        if lookup_function(name).is_some() {
            return syntax_error!(
                format!("expected '(' after function '{}', found '{}'", name, self.peek()),
                self.peek().column
            );
        }

        Err(EvaluationError::new(ErrorKind::UnknownIdentifier, name).at(column))
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        if !self.check(&TokenType::RParen) {
            args.push(self.expression()?);

            while self.match_token(&TokenType::Comma) {
                args.push(self.expression()?);
            }
        }

        self.consume(&TokenType::RParen, "expected ')' after the argument list")?;

        Ok(args)
    }
}

pub fn parse(input: &str) -> Result<Expr> {
    let mut lexer = Lexer::new(input);
    let tokens = lexer.tokenize()?;
    debug!("Tokenized {:?} into {} tokens", input, tokens.len());

    let mut parser = Parser::new(tokens);
    let expr = parser.parse()?;
    debug!("Parsed {:?} as {}", input, expr);

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(input: &str) -> String {
        parse(input).unwrap().to_string()
    }

    fn syntax(input: &str) -> EvaluationError {
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax, "{input:?} gave {err}");
        err
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(shape("2 + 3 * 4"), "(2 + (3 * 4))");
    }

    #[test]
    fn additive_and_multiplicative_are_left_associative() {
        assert_eq!(shape("8 - 4 - 2"), "((8 - 4) - 2)");
        assert_eq!(shape("8 / 4 % 3"), "((8 / 4) % 3)");
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(shape("2 ** 3 ** 2"), "(2 ** (3 ** 2))");
    }

    #[test]
    fn negation_applies_after_power() {
        assert_eq!(shape("-2 ** 2"), "(-(2 ** 2))");
        assert_eq!(shape("2 ** -1"), "(2 ** (-1))");
        assert_eq!(shape("2 * -3"), "(2 * (-3))");
    }

    #[test]
    fn resolves_calls_constants_and_previous_result() {
        assert_eq!(shape("sqrt(pi) + _"), "(sqrt(pi) + _)");
        assert_eq!(shape("log(8, 2)"), "log(8, 2)");
    }

    #[test]
    fn unbalanced_parentheses() {
        let err = syntax("(1 + 2");
        assert_eq!(err.column, Some(7));
        assert!(err.message.contains("column 1"));
        syntax("1 + 2)");
        syntax("()");
    }

    #[test]
    fn dangling_operators() {
        assert_eq!(syntax("1 +").column, Some(4));
        syntax("* 2");
        syntax("2 3");
    }

    #[test]
    fn errors_quote_numbers_as_written() {
        assert_eq!(syntax("1.2.3").message, "unexpected '.3'");
        assert_eq!(syntax("2 1e3").message, "unexpected '1e3'");
        assert_eq!(syntax("1.50 (2)").message, "unexpected '('");
    }

    #[test]
    fn empty_input() {
        assert_eq!(syntax("   ").message, "empty expression");
    }

    #[test]
    fn unknown_identifiers() {
        let err = parse("foo(1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownIdentifier);
        assert_eq!(err.to_string(), "unknown identifier: foo");
        assert_eq!(parse("x + 1").unwrap_err().kind, ErrorKind::UnknownIdentifier);
    }

    #[test]
    fn wrong_arity() {
        let err = syntax("sqrt(1, 2)");
        assert_eq!(err.message, "sqrt() takes exactly 1 argument (2 given)");
        syntax("abs()");
    }

    #[test]
    fn bare_function_name() {
        let err = syntax("sqrt + 1");
        assert!(err.message.contains("expected '(' after function 'sqrt'"));
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(syntax(&deep).message.contains("nested too deeply"));

        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&shallow).is_ok());
    }

    #[test]
    fn chained_operators_count_toward_nesting() {
        let longest = vec!["1"; MAX_NESTING + 1].join(" + ");
        assert!(parse(&longest).is_ok());

        let too_long = vec!["1"; MAX_NESTING + 2].join(" * ");
        assert!(syntax(&too_long).message.contains("nested too deeply"));

        // Finished chains give their levels back.
        let grouped = vec![format!("({})", vec!["2"; 200].join(" * ")); 2].join(" + ");
        assert!(parse(&grouped).is_ok());
    }

    #[test]
    fn length_is_bounded() {
        let long = vec!["1"; MAX_TOKENS].join("+");
        assert!(syntax(&long).message.contains("longer than"));
    }
}
