//! Instruction set of the stack machine.
//!
//! Every instruction has a fixed encoded size so the assembler can assign
//! addresses without encoding anything.

use std::fmt;
use std::rc::Rc;

use pins_lexer::Span;

use crate::memory::Frame;

/// Machine registers that can be pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    FP,
    SP,
}

/// Arithmetic, relational and logical operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oper {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Not,
    And,
    Or,
    Equ,
    Neq,
    Lth,
    Gth,
    Leq,
    Geq,
}

impl fmt::Display for Oper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Oper::Add => "ADD",
            Oper::Sub => "SUB",
            Oper::Mul => "MUL",
            Oper::Div => "DIV",
            Oper::Mod => "MOD",
            Oper::Neg => "NEG",
            Oper::Not => "NOT",
            Oper::And => "AND",
            Oper::Or => "OR",
            Oper::Equ => "EQU",
            Oper::Neq => "NEQ",
            Oper::Lth => "LTH",
            Oper::Gth => "GTH",
            Oper::Leq => "LEQ",
            Oper::Geq => "GEQ",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeKind {
    /// Label definition
    Label(String),
    /// Push a constant
    Push(i32),
    /// Pop as many bytes as the popped value says
    Popn,
    Regn(Reg),
    Load,
    Save,
    /// Initialize memory from an initializer-payload label
    Init,
    Oper(Oper),
    Ujmp,
    /// Pops false-target, true-target and the condition
    Cjmp,
    /// `None` calls a runtime primitive
    Call(Option<Rc<Frame>>),
    Retn(Rc<Frame>),
    /// Push the address of a label
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeInstr {
    pub kind: CodeKind,
    pub span: Option<Span>,
}

impl CodeInstr {
    pub fn new(kind: CodeKind, span: Span) -> Self {
        Self { kind, span: Some(span) }
    }

    /// Instruction without a source location (synthesized entry code)
    pub fn synthetic(kind: CodeKind) -> Self {
        Self { kind, span: None }
    }

    pub fn size(&self) -> u32 {
        match self.kind {
            CodeKind::Label(_) => 0,
            CodeKind::Push(_) | CodeKind::Name(_) => 5,
            _ => 1,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind, CodeKind::Label(_))
    }
}

impl fmt::Display for CodeInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CodeKind::Label(name) => write!(f, "{name}:"),
            CodeKind::Push(value) => write!(f, "PUSH {value}"),
            CodeKind::Popn => f.write_str("POPN"),
            CodeKind::Regn(reg) => write!(f, "REGN {reg:?}"),
            CodeKind::Load => f.write_str("LOAD"),
            CodeKind::Save => f.write_str("SAVE"),
            CodeKind::Init => f.write_str("INIT"),
            CodeKind::Oper(op) => write!(f, "OPER {op}"),
            CodeKind::Ujmp => f.write_str("UJMP"),
            CodeKind::Cjmp => f.write_str("CJMP"),
            CodeKind::Call(Some(frame)) => write!(f, "CALL {}", frame.name),
            CodeKind::Call(None) => f.write_str("CALL"),
            CodeKind::Retn(frame) => write!(f, "RETN {}", frame.name),
            CodeKind::Name(name) => write!(f, "NAME {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataKind {
    Label(String),
    /// Reserve this many bytes
    Size(u32),
    /// One literal word
    Data(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataInstr {
    pub kind: DataKind,
    pub span: Option<Span>,
}

impl DataInstr {
    pub fn new(kind: DataKind, span: Span) -> Self {
        Self { kind, span: Some(span) }
    }

    pub fn size(&self) -> u32 {
        match self.kind {
            DataKind::Label(_) => 0,
            DataKind::Size(n) => n,
            DataKind::Data(_) => 4,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind, DataKind::Label(_))
    }
}

impl fmt::Display for DataInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DataKind::Label(name) => write!(f, "{name}:"),
            DataKind::Size(n) => write!(f, "SIZE {n}"),
            DataKind::Data(v) => write!(f, "DATA {v}"),
        }
    }
}
