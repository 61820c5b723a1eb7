//! Segment assembly.
//!
//! Gathers the per-node instruction lists into one code segment and one
//! data segment. The code segment starts with global initialization,
//! followed by the entry sequence that calls `main` and then `exit`, then
//! every function body. Data addresses continue after the last code byte.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use pins_parser::{Definition, Expr, ExprKind, FunDef, Program, Statement};
use tracing::debug;

use crate::codegen::Generated;
use crate::error::{internal_err, CodegenError};
use crate::memory::Layout;
use crate::pdm::{CodeInstr, CodeKind, DataInstr, DataKind};

/// Name of the runtime primitive that terminates the program.
pub const EXIT: &str = "exit";

/// The assembled program
#[derive(Debug, Default)]
pub struct Segments {
    code: Vec<CodeInstr>,
    data: Vec<DataInstr>,
}

impl Segments {
    pub fn code(&self) -> &[CodeInstr] {
        &self.code
    }

    pub fn data(&self) -> &[DataInstr] {
        &self.data
    }

    pub fn code_size(&self) -> u32 {
        self.code.iter().map(CodeInstr::size).sum()
    }

    pub fn data_size(&self) -> u32 {
        self.data.iter().map(DataInstr::size).sum()
    }

    /// Address of every label, code labels first.
    pub fn labels(&self) -> IndexMap<String, u32> {
        let mut labels = IndexMap::new();
        let mut addr = 0;
        for instr in &self.code {
            if let CodeKind::Label(name) = &instr.kind {
                labels.insert(name.clone(), addr);
            }
            addr += instr.size();
        }
        for instr in &self.data {
            if let DataKind::Label(name) = &instr.kind {
                labels.insert(name.clone(), addr);
            }
            addr += instr.size();
        }
        labels
    }

    pub fn listing(&self) -> Listing<'_> {
        Listing { segments: self }
    }
}

/// Human-readable rendering of [`Segments`] with addresses and sizes
pub struct Listing<'a> {
    segments: &'a Segments,
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut addr = 0;
        writeln!(f, "CODE SEGMENT:")?;
        for instr in &self.segments.code {
            let size = instr.size();
            let indent = if instr.is_label() { "" } else { "  " };
            writeln!(f, "{addr:8} [{size}] {indent}{instr}")?;
            addr += size;
        }
        writeln!(f, "DATA SEGMENT:")?;
        for instr in &self.segments.data {
            let size = instr.size();
            let indent = if instr.is_label() { "" } else { "  " };
            if matches!(instr.kind, DataKind::Size(_)) {
                writeln!(f, "{addr:8} [ ] {indent}{instr}")?;
            } else {
                writeln!(f, "{addr:8} [{size}] {indent}{instr}")?;
            }
            addr += size;
        }
        Ok(())
    }
}

/// Lay out the final code and data segments of a compiled program.
pub fn assemble(
    program: &Program,
    layout: &Layout,
    generated: &Generated,
) -> Result<Segments, CodegenError> {
    let main = program
        .definitions
        .iter()
        .find_map(|def| match def {
            Definition::Fun(f) if f.name == "main" && !f.body.is_empty() => Some(f),
            _ => None,
        })
        .ok_or(CodegenError::MissingMain)?;
    let main_frame = layout
        .frame(main.id)
        .ok_or_else(|| internal_err("no frame for 'main'", main.span))?;

    let mut segments = Segments::default();

    // ── Code segment ──
    for def in &program.definitions {
        if let Definition::Var(var) = def {
            let code = generated.code(var.id).ok_or_else(|| {
                internal_err(format!("no initialization code for '{}'", var.name), var.span)
            })?;
            segments.code.extend_from_slice(code);
        }
    }
    segments.code.extend([
        CodeInstr::synthetic(CodeKind::Push(0)),
        CodeInstr::synthetic(CodeKind::Name(main_frame.name.clone())),
        CodeInstr::synthetic(CodeKind::Call(Some(Rc::clone(main_frame)))),
        CodeInstr::synthetic(CodeKind::Push(0)),
        CodeInstr::synthetic(CodeKind::Name(EXIT.to_string())),
        CodeInstr::synthetic(CodeKind::Call(None)),
    ]);
    let mut functions = Vec::new();
    collect_functions(&program.definitions, &mut functions);
    for fun in functions {
        if fun.body.is_empty() {
            continue;
        }
        let code = generated
            .code(fun.id)
            .ok_or_else(|| internal_err(format!("no code for function '{}'", fun.name), fun.span))?;
        segments.code.extend_from_slice(code);
    }

    // ── Data segment ──
    collect_data(&program.definitions, generated, &mut segments.data);

    debug!(
        code_size = segments.code_size(),
        data_size = segments.data_size(),
        instructions = segments.code.len(),
        "segments assembled"
    );
    Ok(segments)
}

/// Every function in `defs`, parents before the functions nested in them.
fn collect_functions<'p>(defs: &'p [Definition], out: &mut Vec<&'p FunDef>) {
    for def in defs {
        if let Definition::Fun(fun) = def {
            out.push(fun);
            functions_in_stmts(&fun.body, out);
        }
    }
}

fn functions_in_stmts<'p>(stmts: &'p [Statement], out: &mut Vec<&'p FunDef>) {
    for stmt in stmts {
        match stmt {
            Statement::Expr(_) | Statement::Assign { .. } => {}
            Statement::If {
                then_body,
                else_body,
                ..
            } => {
                functions_in_stmts(then_body, out);
                functions_in_stmts(else_body, out);
            }
            Statement::While { body, .. } => functions_in_stmts(body, out),
            Statement::Let { defs, body, .. } => {
                collect_functions(defs, out);
                functions_in_stmts(body, out);
            }
        }
    }
}

// Data of variables and string literals, in source order.

fn collect_data(defs: &[Definition], generated: &Generated, out: &mut Vec<DataInstr>) {
    for def in defs {
        match def {
            Definition::Var(var) => {
                if let Some(data) = generated.data(var.id) {
                    out.extend_from_slice(data);
                }
            }
            Definition::Fun(fun) => data_in_stmts(&fun.body, generated, out),
        }
    }
}

fn data_in_stmts(stmts: &[Statement], generated: &Generated, out: &mut Vec<DataInstr>) {
    for stmt in stmts {
        match stmt {
            Statement::Expr(expr) => data_in_expr(expr, generated, out),
            Statement::Assign { dst, src, .. } => {
                data_in_expr(dst, generated, out);
                data_in_expr(src, generated, out);
            }
            Statement::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                data_in_expr(cond, generated, out);
                data_in_stmts(then_body, generated, out);
                data_in_stmts(else_body, generated, out);
            }
            Statement::While { cond, body, .. } => {
                data_in_expr(cond, generated, out);
                data_in_stmts(body, generated, out);
            }
            Statement::Let { defs, body, .. } => {
                collect_data(defs, generated, out);
                data_in_stmts(body, generated, out);
            }
        }
    }
}

fn data_in_expr(expr: &Expr, generated: &Generated, out: &mut Vec<DataInstr>) {
    match &expr.kind {
        ExprKind::Const(_) => {
            if let Some(data) = generated.data(expr.id) {
                out.extend_from_slice(data);
            }
        }
        ExprKind::Name(_) => {}
        ExprKind::Call { args, .. } => {
            for arg in args {
                data_in_expr(arg, generated, out);
            }
        }
        ExprKind::Unary { operand, .. } => data_in_expr(operand, generated, out),
        ExprKind::Binary { left, right, .. } => {
            data_in_expr(left, generated, out);
            data_in_expr(right, generated, out);
        }
    }
}
