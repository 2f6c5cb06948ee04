use log::trace;
use crate::language::token::{Token, TokenType};
use crate::language::error::{ErrorKind, EvaluationError, Result};
use crate::syntax_error;

pub struct Lexer {
    pub(crate) input: Vec<char>,
    pub(crate) position: usize,
    pub(crate) column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            column: 1,
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    pub fn consume(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.column += 1;
        Some(ch)
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.consume();
            } else {
                break;
            }
        }
    }

    pub fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.consume();
            } else {
                break;
            }
        }

        identifier
    }

    fn read_digits(&mut self, into: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                into.push(ch);
                self.consume();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<TokenType> {
        let column = self.column;
        let mut number = String::new();

        self.read_digits(&mut number);
        if self.peek() == Some('.') {
            number.push('.');
            self.consume();
            self.read_digits(&mut number);
        }

        // `2e` is the number 2 followed by the constant `e`, so the exponent
        // is only taken when digits follow it.
        if matches!(self.peek(), Some('e') | Some('E')) {
            let has_exponent = match self.peek_next() {
                Some(d) if d.is_ascii_digit() => true,
                Some('+') | Some('-') => self
                    .input
                    .get(self.position + 2)
                    .is_some_and(|d| d.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                if let Some(marker) = self.consume() {
                    number.push(marker);
                }
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    number.push(sign);
                    self.consume();
                }
                self.read_digits(&mut number);
            }
        }

        let value = number.parse::<f64>().map_err(|_| {
            EvaluationError::new(ErrorKind::Syntax, format!("invalid number '{}'", number)).at(column)
        })?;

        if value.is_infinite() {
            return Err(EvaluationError::new(
                ErrorKind::Overflow,
                format!("number literal '{}' is too large", number),
            ));
        }

        Ok(TokenType::Number { value, text: number })
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let column = self.column;

        let Some(ch) = self.peek() else {
            return Ok(Token { token_type: TokenType::Eof, column });
        };

        let token_type = match ch {
            '(' => {
                self.consume();
                TokenType::LParen
            },
            ')' => {
                self.consume();
                TokenType::RParen
            },
            ',' => {
                self.consume();
                TokenType::Comma
            },
            '+' => {
                self.consume();
                TokenType::Plus
            },
            '-' => {
                self.consume();
                TokenType::Minus
            },
            '*' => {
                self.consume();
                if self.peek() == Some('*') {
                    self.consume();
                    TokenType::DoubleStar
                } else {
                    TokenType::Star
                }
            },
            '/' => {
                self.consume();
                TokenType::Slash
            },
            '%' => {
                self.consume();
                TokenType::Percent
            },
            '0'..='9' => self.read_number()?,
            '.' if self.peek_next().is_some_and(|d| d.is_ascii_digit()) => self.read_number()?,
            '^' => return syntax_error!("unexpected character '^' (use ** for powers)", column),
            _ if ch.is_alphabetic() || ch == '_' => TokenType::Identifier(self.read_identifier()),
            _ => return syntax_error!(format!("unexpected character '{}'", ch), column),
        };

        Ok(Token { token_type, column })
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            trace!("Token {:?} at column {}", token.token_type, token.column);

            if token.token_type == TokenType::Eof {
                tokens.push(token);
                break;
            }

            tokens.push(token);
        }

        Ok(tokens)
    }
}
