//! AST (abstract syntax tree) types for the Kaze language.
//!
//! Blocks are expressions: a brace-delimited statement sequence introduces a
//! new scope and evaluates to the value of its last executed construct. The
//! `Display` impls produce a fully parenthesized rendering used by the parser
//! tests and by runtime error messages.

use std::fmt;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Logical not, `!x`.
    Not,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixOp::Neg => "-",
            PrefixOp::Not => "!",
        })
    }
}

/// Binary infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    And,
    Or,
    Lt,
    Gt,
    Le,
    Ge,
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Le => "<=",
            InfixOp::Ge => ">=",
        })
    }
}

/// Statements (bindings, control flow, expression statements).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var {
        name: String,
        value: Expr,
    },
    Return(Option<Expr>),
    FunctionDef {
        name: String,
        params: Vec<String>,
        /// Always an `Expr::Block`.
        body: Expr,
    },
    While {
        cond: Expr,
        body: Expr,
    },
    Break,
    Continue,
    Expr(Expr),
}

/// Expressions (literals, operations, blocks, calls, containers).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Int(i64),
    Bool(bool),
    Str(String),
    Null,
    Prefix {
        op: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `target = value`; the target is an identifier or an index expression.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Block(Vec<Stmt>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    If {
        cond: Box<Expr>,
        consequence: Box<Expr>,
        alternative: Option<Box<Expr>>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    /// Key/value pairs in source order; later duplicates overwrite earlier
    /// ones at evaluation time.
    Hash(Vec<(Expr, Expr)>),
    Array(Vec<Expr>),
}

/// A parsed program: the top-level statement sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.statements {
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Var { name, value } => write!(f, "var {} = {};", name, value),
            Stmt::Return(None) => write!(f, "return;"),
            Stmt::Return(Some(value)) => write!(f, "return {};", value),
            Stmt::FunctionDef { name, params, body } => {
                write!(f, "fun {}({}) {{\n{}\n}}", name, params.join(", "), body)
            }
            Stmt::While { cond, body } => write!(f, "while {} {}", cond, body),
            Stmt::Break => write!(f, "break"),
            Stmt::Continue => write!(f, "continue"),
            Stmt::Expr(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Null => f.write_str("null"),
            Expr::Prefix { op, right } => write!(f, "({}{})", op, right),
            Expr::Infix { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Assign { target, value } => write!(f, "{} = {}", target, value),
            Expr::Block(stmts) => {
                for s in stmts {
                    write!(f, "{}", s)?;
                }
                Ok(())
            }
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {}", cond, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Expr::Index { left, index } => write!(f, "{}[{}]", left, index),
            Expr::Hash(pairs) => {
                f.write_str("#{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Expr::Array(elements) => {
                f.write_str("[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                f.write_str("]")
            }
        }
    }
}
