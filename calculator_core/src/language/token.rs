use derive_more::Display;

#[derive(Debug, PartialEq, Clone, Display)]
pub enum TokenType {
    #[display("{text}")]
    Number { value: f64, text: String },    // 12, 3.5, .5, 1e3
    #[display("{_0}")]
    Identifier(String),     // sqrt, pi, _
    #[display("+")]
    Plus,
    #[display("-")]
    Minus,
    #[display("*")]
    Star,
    #[display("**")]
    DoubleStar,
    #[display("/")]
    Slash,
    #[display("%")]
    Percent,
    #[display("(")]
    LParen,
    #[display(")")]
    RParen,
    #[display(",")]
    Comma,
    #[display("end of input")]
    Eof,
}

#[derive(Debug, Clone, Display)]
#[display("{token_type}")]
pub struct Token {
    pub(crate) token_type: TokenType,
    pub(crate) column: usize,
}
