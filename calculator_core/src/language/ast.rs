use std::fmt;
use crate::language::builtins::{Constant, Function};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64),
    Constant(&'static Constant),
    PreviousResult,
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Call {
        function: &'static Function,
        args: Vec<Expr>,
    },
}

/// Fully parenthesised rendering, used in debug logs and parser tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Constant(c) => write!(f, "{}", c.name),
            Expr::PreviousResult => write!(f, "_"),
            Expr::Unary { op: UnaryOp::Plus, operand } => write!(f, "(+{})", operand),
            Expr::Unary { op: UnaryOp::Minus, operand } => write!(f, "(-{})", operand),
            Expr::Binary { left, op, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
