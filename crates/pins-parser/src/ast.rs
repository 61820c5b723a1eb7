use std::fmt;

use pins_lexer::Span;

/// Stable identity of a definition or expression node.
///
/// Assigned by the parser in source order; later passes key their results
/// by it instead of by node address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Top-level program: a list of definitions
#[derive(Debug)]
pub struct Program {
    pub definitions: Vec<Definition>,
}

/// Definition types, shared by the global scope and `let` blocks
#[derive(Debug)]
pub enum Definition {
    Fun(FunDef),
    Var(VarDef),
}

impl Definition {
    pub fn id(&self) -> NodeId {
        match self {
            Definition::Fun(f) => f.id,
            Definition::Var(v) => v.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Definition::Fun(f) => &f.name,
            Definition::Var(v) => &v.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Definition::Fun(f) => f.span,
            Definition::Var(v) => v.span,
        }
    }
}

/// Function definition: fun name(params) [= statements]
///
/// An empty body marks a function supplied by the runtime.
#[derive(Debug)]
pub struct FunDef {
    pub id: NodeId,
    pub name: String,
    pub params: Vec<ParDef>,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// Function parameter
#[derive(Debug)]
pub struct ParDef {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// Variable definition: var name = initializers
#[derive(Debug)]
pub struct VarDef {
    pub id: NodeId,
    pub name: String,
    pub inits: Vec<Init>,
    pub span: Span,
}

/// One initializer: `[count *] value`
#[derive(Debug)]
pub struct Init {
    /// Repeat count; `None` means 1
    pub count: Option<Const>,
    pub value: Const,
    pub span: Span,
}

/// A literal as written in the source, quotes and escapes included
#[derive(Debug, Clone, PartialEq)]
pub struct Const {
    pub kind: ConstKind,
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    Int,
    Char,
    Str,
}

/// Statement types
#[derive(Debug)]
pub enum Statement {
    /// Expression evaluated for its effect
    Expr(Expr),
    Assign {
        dst: Expr,
        src: Expr,
        span: Span,
    },
    If {
        cond: Expr,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Vec<Statement>,
        span: Span,
    },
    Let {
        defs: Vec<Definition>,
        body: Vec<Statement>,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Expr(e) => e.span,
            Statement::Assign { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::Let { span, .. } => *span,
        }
    }
}

/// Expression node
#[derive(Debug)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum ExprKind {
    Const(Const),
    /// Variable or parameter reference
    Name(String),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Plus,
    Minus,
    /// Prefix `^`
    AddrOf,
    /// Postfix `^`
    Deref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        };
        f.write_str(s)
    }
}
