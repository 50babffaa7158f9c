//! Abstract syntax tree for the statement language.
//!
//! Nodes carry the 1-based line within their own statement; tracebacks
//! point into the statement that defined the running code, so function
//! bodies keep the numbering of their defining push.

use std::rc::Rc;

/// A parsed statement sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr`
    Assign {
        name: String,
        value: Expr,
        line: usize,
    },
    /// A bare expression; at the interactive top level its non-null
    /// value is echoed.
    Expr { value: Expr, line: usize },
    /// `return expr?`
    Return { value: Option<Expr>, line: usize },
    /// `fn name(params):` block
    FnDef(Rc<FnDef>),
    /// `if expr:` block, optional `else:` block
    If {
        cond: Expr,
        then: Vec<Stmt>,
        orelse: Vec<Stmt>,
        line: usize,
    },
    /// `while expr:` block
    While {
        cond: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
}

/// A function definition, shared between the AST and function values.
#[derive(Debug, PartialEq)]
pub struct FnDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null { line: usize },
    Bool { value: bool, line: usize },
    Num { value: f64, line: usize },
    Str { value: String, line: usize },
    Name { name: String, line: usize },
    List { items: Vec<Expr>, line: usize },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: usize,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        line: usize,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        line: usize,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Null { line }
            | Expr::Bool { line, .. }
            | Expr::Num { line, .. }
            | Expr::Str { line, .. }
            | Expr::Name { line, .. }
            | Expr::List { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Call { line, .. }
            | Expr::Index { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}
