use std::rc::Rc;

use indexmap::IndexMap;
use pins_lexer::Span;
use pins_parser::{Definition, Expr, ExprKind, FunDef, NodeId, Program, Statement, UnaryOp, VarDef};
use pins_seman::{Bindings, Decl};
use tracing::debug;

use crate::decode::{decode_char, decode_int, decode_str};
use crate::error::{internal_err, lvalue_err, CodegenError};
use crate::memory::{Access, Frame, Layout, FRAME_HEADER, STATIC_LINK};
use crate::pdm::{CodeInstr, CodeKind, DataInstr, DataKind, Oper, Reg};

mod compile_expr;
mod compile_func;
mod compile_stmt;

/// Instructions produced for each node, keyed by node identity.
///
/// Code is recorded for function definitions (whole bodies) and variable
/// definitions (initialization). Data is recorded for variable definitions
/// and string constants.
#[derive(Debug, Default)]
pub struct Generated {
    code: IndexMap<NodeId, Vec<CodeInstr>>,
    data: IndexMap<NodeId, Vec<DataInstr>>,
}

impl Generated {
    pub fn code(&self, id: NodeId) -> Option<&[CodeInstr]> {
        self.code.get(&id).map(Vec::as_slice)
    }

    pub fn data(&self, id: NodeId) -> Option<&[DataInstr]> {
        self.data.get(&id).map(Vec::as_slice)
    }
}

/// Generate code and data for every node of `program`.
pub fn generate(
    program: &Program,
    bindings: &Bindings,
    layout: &Layout,
) -> Result<Generated, CodegenError> {
    let mut codegen = CodeGenerator::new(bindings, layout);
    for def in &program.definitions {
        match def {
            Definition::Fun(f) => codegen.compile_function(f)?,
            Definition::Var(v) => {
                codegen.compile_var(v, None)?;
            }
        }
    }
    Ok(codegen.out)
}

/// Source of anonymous label numbers for one emission pass.
#[derive(Debug, Default)]
struct LabelGen {
    next: u32,
}

impl LabelGen {
    fn next(&mut self) -> u32 {
        let n = self.next;
        self.next += 1;
        n
    }
}

/// Stack-machine code generator
struct CodeGenerator<'a> {
    bindings: &'a Bindings,
    layout: &'a Layout,
    labels: LabelGen,
    out: Generated,
}

impl<'a> CodeGenerator<'a> {
    fn new(bindings: &'a Bindings, layout: &'a Layout) -> Self {
        Self {
            bindings,
            layout,
            labels: LabelGen::default(),
            out: Generated::default(),
        }
    }

    // ── Lookups ──────────────────────────────────────────────

    fn frame_of(&self, fun: NodeId, span: Span) -> Result<&'a Rc<Frame>, CodegenError> {
        self.layout
            .frame(fun)
            .ok_or_else(|| internal_err(format!("no frame for function {fun}"), span))
    }

    fn access_of(&self, decl: NodeId, span: Span) -> Result<&'a Access, CodegenError> {
        self.layout
            .access(decl)
            .ok_or_else(|| internal_err(format!("no access for declaration {decl}"), span))
    }

    fn binding_of(&self, use_site: &Expr) -> Result<Decl, CodegenError> {
        self.bindings
            .get(use_site.id)
            .ok_or_else(|| internal_err(format!("unresolved name at {}", use_site.id), use_site.span))
    }

    // ── Recording ────────────────────────────────────────────

    fn record_code(&mut self, id: NodeId, code: Vec<CodeInstr>, span: Span) -> Result<(), CodegenError> {
        if self.out.code.insert(id, code).is_some() {
            return Err(internal_err(format!("code for {id} generated twice"), span));
        }
        Ok(())
    }

    fn record_data(&mut self, id: NodeId, data: Vec<DataInstr>, span: Span) -> Result<(), CodegenError> {
        if self.out.data.insert(id, data).is_some() {
            return Err(internal_err(format!("data for {id} generated twice"), span));
        }
        Ok(())
    }

    // ── Variable definitions ─────────────────────────────────

    /// Initialization code for a variable definition. `frame` is the
    /// enclosing function, `None` for globals.
    fn compile_var(
        &mut self,
        var: &VarDef,
        frame: Option<&Frame>,
    ) -> Result<Vec<CodeInstr>, CodegenError> {
        let span = var.span;
        let access = self.access_of(var.id, span)?;
        let inits = access
            .inits()
            .ok_or_else(|| internal_err(format!("variable '{}' has no initializer", var.name), span))?;
        let label = format!(":{}", self.labels.next());

        let mut code = Vec::new();
        let mut data = Vec::new();
        match (access, frame) {
            (Access::Abs(abs), None) => {
                code.push(CodeInstr::new(CodeKind::Name(abs.name.clone()), span));
                data.push(DataInstr::new(DataKind::Label(abs.name.clone()), span));
                data.push(DataInstr::new(DataKind::Size(abs.size), span));
            }
            (Access::Rel(rel), Some(frame)) if rel.depth == frame.depth => {
                code.push(CodeInstr::new(CodeKind::Regn(Reg::FP), span));
                code.push(CodeInstr::new(CodeKind::Push(rel.offset), span));
                code.push(CodeInstr::new(CodeKind::Oper(Oper::Add), span));
            }
            _ => {
                return Err(internal_err(
                    format!("access of '{}' does not match its scope", var.name),
                    span,
                ));
            }
        }
        code.push(CodeInstr::new(CodeKind::Name(label.clone()), span));
        code.push(CodeInstr::new(CodeKind::Init, span));

        data.push(DataInstr::new(DataKind::Label(label), span));
        data.extend(
            inits
                .words()
                .iter()
                .map(|&w| DataInstr::new(DataKind::Data(w), span)),
        );

        self.record_code(var.id, code.clone(), span)?;
        self.record_data(var.id, data, span)?;
        Ok(code)
    }

    // ── Addresses ────────────────────────────────────────────

    /// Code that leaves the address of a variable or parameter on the stack,
    /// as seen from code running in `frame`.
    fn access_address(
        &self,
        access: &Access,
        frame: &Frame,
        span: Span,
    ) -> Result<Vec<CodeInstr>, CodegenError> {
        match access {
            Access::Abs(abs) => Ok(vec![CodeInstr::new(CodeKind::Name(abs.name.clone()), span)]),
            Access::Rel(rel) => {
                let hops = frame.depth.checked_sub(rel.depth).ok_or_else(|| {
                    internal_err(
                        format!("'{}' at depth {} used from depth {}", rel.name, rel.depth, frame.depth),
                        span,
                    )
                })?;
                let mut code = static_chain(hops, span);
                code.push(CodeInstr::new(CodeKind::Push(rel.offset), span));
                code.push(CodeInstr::new(CodeKind::Oper(Oper::Add), span));
                Ok(code)
            }
        }
    }

    /// Address of an assignment destination: a variable or a dereference.
    fn lvalue_address(&mut self, dst: &Expr, frame: &Frame) -> Result<Vec<CodeInstr>, CodegenError> {
        match &dst.kind {
            ExprKind::Name(_) => {
                let access = self.variable_access(dst)?;
                self.access_address(access, frame, dst.span)
            }
            ExprKind::Unary { op: UnaryOp::Deref, operand } => self.compile_expr(operand, frame),
            _ => Err(lvalue_err("cannot assign to this expression", dst.span)),
        }
    }

    fn variable_access(&self, use_site: &Expr) -> Result<&'a Access, CodegenError> {
        match self.binding_of(use_site)? {
            Decl::Var(id) | Decl::Par(id) => self.access_of(id, use_site.span),
            Decl::Fun(_) => Err(internal_err("function used as a variable", use_site.span)),
        }
    }
}

/// Frame pointer of the function `hops` static links out from the current one.
fn static_chain(hops: u32, span: Span) -> Vec<CodeInstr> {
    let mut code = vec![CodeInstr::new(CodeKind::Regn(Reg::FP), span)];
    for _ in 0..hops {
        code.push(CodeInstr::new(CodeKind::Load, span));
    }
    code
}

/// Drop a trailing `PUSH 0; POPN` pair. Popping zero bytes has no effect.
fn strip_dead_discard(code: &mut Vec<CodeInstr>) {
    let n = code.len();
    if n < 2 {
        return;
    }
    if matches!(code[n - 2].kind, CodeKind::Push(0)) && matches!(code[n - 1].kind, CodeKind::Popn) {
        code.truncate(n - 2);
    }
}

#[cfg(test)]
mod tests;
