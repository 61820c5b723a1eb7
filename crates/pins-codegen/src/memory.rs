//! Frame layout.
//!
//! One depth-first walk assigns every function a [`Frame`] and every
//! variable and parameter an [`Access`]. Depth 0 is the global scope and
//! each function body is one level deeper than its lexical parent. `let`
//! blocks nest names only: their variables are carved from the enclosing
//! function's frame.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use pins_lexer::Span;
use pins_parser::{ConstKind, Definition, FunDef, Init, NodeId, ParDef, Program, Statement, VarDef};
use tracing::{debug, trace};

use crate::decode::{decode_char, decode_int, decode_str};
use crate::error::{constant_err, internal_err, CodegenError};

/// Bytes taken by the saved frame pointer and the return address.
pub const FRAME_HEADER: u32 = 8;
/// Bytes taken by the static link.
pub const STATIC_LINK: u32 = 4;
/// Bytes in one machine word.
pub const WORD: u32 = 4;

// ── Layout records ───────────────────────────────────────────

/// Call frame of one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Fully qualified and disambiguated name, also the entry label
    pub name: String,
    pub depth: u32,
    /// Static link plus one word per parameter
    pub pars_size: u32,
    /// Frame header plus all locals, including those of nested `let`s
    pub vars_size: u32,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} depth={} parsSize={} varsSize={}",
            self.name, self.depth, self.pars_size, self.vars_size
        )
    }
}

/// Flattened initializer: `count, (repeat, len, values...)*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inits(Vec<i32>);

impl Inits {
    /// A single zero word, used for variables written without initializers
    pub fn zero() -> Self {
        Inits(vec![1, 1, 1, 0])
    }

    /// The raw encoding, as emitted into the data segment
    pub fn words(&self) -> &[i32] {
        &self.0
    }

    /// The initial memory contents, repeats expanded
    pub fn values(&self) -> Vec<i32> {
        let mut out = Vec::new();
        let groups = self.0.first().copied().unwrap_or(0);
        let mut pos = 1;
        for _ in 0..groups {
            let (Some(&repeat), Some(&len)) = (self.0.get(pos), self.0.get(pos + 1)) else {
                break;
            };
            let start = pos + 2;
            let end = (start + len.max(0) as usize).min(self.0.len());
            for _ in 0..repeat.max(0) {
                out.extend_from_slice(&self.0[start..end]);
            }
            pos = end;
        }
        out
    }
}

impl fmt::Display for Inits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values();
        for (i, v) in values.iter().take(10).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{v}")?;
        }
        if values.len() > 10 {
            f.write_str("...")?;
        }
        Ok(())
    }
}

/// A global, addressed by its data-segment label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsAccess {
    pub name: String,
    pub size: u32,
    pub inits: Option<Inits>,
}

/// A local or parameter, addressed relative to the frame pointer of the
/// function at `depth`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelAccess {
    pub offset: i32,
    pub depth: u32,
    pub size: u32,
    pub inits: Option<Inits>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Abs(AbsAccess),
    Rel(RelAccess),
}

impl Access {
    pub fn size(&self) -> u32 {
        match self {
            Access::Abs(a) => a.size,
            Access::Rel(r) => r.size,
        }
    }

    pub fn inits(&self) -> Option<&Inits> {
        match self {
            Access::Abs(a) => a.inits.as_ref(),
            Access::Rel(r) => r.inits.as_ref(),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Abs(a) => write!(f, "size={}", a.size)?,
            Access::Rel(r) => write!(f, "offset={} size={} depth={}", r.offset, r.size, r.depth)?,
        }
        if let Some(inits) = self.inits() {
            write!(f, " inits={inits}")?;
        }
        Ok(())
    }
}

/// Frames and accesses of one compilation unit, in declaration order
#[derive(Debug, Default)]
pub struct Layout {
    frames: IndexMap<NodeId, Rc<Frame>>,
    accesses: IndexMap<NodeId, Access>,
}

impl Layout {
    pub fn frame(&self, fun: NodeId) -> Option<&Rc<Frame>> {
        self.frames.get(&fun)
    }

    pub fn access(&self, decl: NodeId) -> Option<&Access> {
        self.accesses.get(&decl)
    }

    pub fn frames(&self) -> impl Iterator<Item = (NodeId, &Rc<Frame>)> {
        self.frames.iter().map(|(id, f)| (*id, f))
    }

    pub fn accesses(&self) -> impl Iterator<Item = (NodeId, &Access)> {
        self.accesses.iter().map(|(id, a)| (*id, a))
    }

    fn insert_frame(&mut self, id: NodeId, frame: Frame, span: Span) -> Result<(), CodegenError> {
        if self.frames.insert(id, Rc::new(frame)).is_some() {
            return Err(internal_err(format!("frame for {id} computed twice"), span));
        }
        Ok(())
    }

    fn insert_access(&mut self, id: NodeId, access: Access, span: Span) -> Result<(), CodegenError> {
        if self.accesses.insert(id, access).is_some() {
            return Err(internal_err(format!("access for {id} computed twice"), span));
        }
        Ok(())
    }
}

// ── Builder ──────────────────────────────────────────────────

/// Compute the frame layout of a whole program.
pub fn organize(program: &Program) -> Result<Layout, CodegenError> {
    let mut builder = FrameBuilder::default();
    let global = Scope { depth: 0, path: None };
    for def in &program.definitions {
        builder.definition(def, &global, None)?;
    }
    Ok(builder.layout)
}

/// Where a definition sits: nesting depth and the full name of the
/// enclosing function. Rebuilt, never mutated, on function entry.
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    depth: u32,
    path: Option<&'a str>,
}

impl Scope<'_> {
    fn qualify(&self, name: &str) -> String {
        match self.path {
            Some(path) => format!("{path}.{name}"),
            None => name.to_string(),
        }
    }
}

/// Running size of the local block of the function being laid out.
#[derive(Debug)]
struct Locals {
    size: u32,
}

#[derive(Default)]
struct FrameBuilder {
    layout: Layout,
    /// Occurrences of each qualified name so far
    seen_names: HashMap<String, u32>,
}

impl FrameBuilder {
    fn definition(
        &mut self,
        def: &Definition,
        scope: &Scope<'_>,
        locals: Option<&mut Locals>,
    ) -> Result<(), CodegenError> {
        match def {
            Definition::Fun(f) => self.function(f, scope),
            Definition::Var(v) => self.variable(v, scope, locals),
        }
    }

    /// First occurrence keeps the plain name; the n-th repeat gets `:n`.
    fn disambiguate(&mut self, qualified: String) -> String {
        let seen = self.seen_names.entry(qualified.clone()).or_insert(0);
        let name = if *seen == 0 {
            qualified
        } else {
            format!("{qualified}:{seen}")
        };
        *seen += 1;
        name
    }

    fn function(&mut self, fun: &FunDef, scope: &Scope<'_>) -> Result<(), CodegenError> {
        let name = self.disambiguate(scope.qualify(&fun.name));
        let inner = Scope {
            depth: scope.depth + 1,
            path: Some(&name),
        };

        let mut pars_size = STATIC_LINK;
        for par in &fun.params {
            self.parameter(par, &inner, pars_size)?;
            pars_size += WORD;
        }

        let mut locals = Locals { size: FRAME_HEADER };
        self.statements(&fun.body, &inner, &mut locals)?;

        let frame = Frame {
            name: name.clone(),
            depth: inner.depth,
            pars_size,
            vars_size: locals.size,
        };
        debug!(%frame, "frame laid out");
        self.layout.insert_frame(fun.id, frame, fun.span)
    }

    fn parameter(&mut self, par: &ParDef, scope: &Scope<'_>, offset: u32) -> Result<(), CodegenError> {
        let access = Access::Rel(RelAccess {
            offset: to_offset(offset, par.span)?,
            depth: scope.depth,
            size: WORD,
            inits: None,
            name: par.name.clone(),
        });
        trace!(name = %par.name, %access, "parameter");
        self.layout.insert_access(par.id, access, par.span)
    }

    fn variable(
        &mut self,
        var: &VarDef,
        scope: &Scope<'_>,
        locals: Option<&mut Locals>,
    ) -> Result<(), CodegenError> {
        let (size, inits) = initializers(var)?;

        let access = match locals {
            Some(locals) if scope.depth > 0 => {
                locals.size = locals
                    .size
                    .checked_add(size)
                    .ok_or_else(|| constant_err("frame too large", var.span))?;
                Access::Rel(RelAccess {
                    offset: -to_offset(locals.size, var.span)?,
                    depth: scope.depth,
                    size,
                    inits: Some(inits),
                    name: var.name.clone(),
                })
            }
            None if scope.depth == 0 => Access::Abs(AbsAccess {
                name: var.name.clone(),
                size,
                inits: Some(inits),
            }),
            _ => {
                return Err(internal_err(
                    format!("variable '{}' outside any function at depth {}", var.name, scope.depth),
                    var.span,
                ));
            }
        };
        trace!(name = %var.name, %access, "variable");
        self.layout.insert_access(var.id, access, var.span)
    }

    fn statements(
        &mut self,
        stmts: &[Statement],
        scope: &Scope<'_>,
        locals: &mut Locals,
    ) -> Result<(), CodegenError> {
        for stmt in stmts {
            match stmt {
                Statement::Let { defs, body, .. } => {
                    for def in defs {
                        self.definition(def, scope, Some(&mut *locals))?;
                    }
                    self.statements(body, scope, locals)?;
                }
                Statement::If { then_body, else_body, .. } => {
                    self.statements(then_body, scope, locals)?;
                    self.statements(else_body, scope, locals)?;
                }
                Statement::While { body, .. } => self.statements(body, scope, locals)?,
                Statement::Expr(_) | Statement::Assign { .. } => {}
            }
        }
        Ok(())
    }
}

/// Storage size in bytes and the flattened initializer of a variable.
fn initializers(var: &VarDef) -> Result<(u32, Inits), CodegenError> {
    if var.inits.is_empty() {
        return Ok((WORD, Inits::zero()));
    }

    let mut words = vec![var.inits.len() as i32];
    let mut size: u32 = 0;
    for init in &var.inits {
        let repeat = repeat_count(init)?;
        let values = match init.value.kind {
            ConstKind::Int => vec![decode_int(&init.value)?],
            ConstKind::Char => vec![decode_char(&init.value)?],
            ConstKind::Str => decode_str(&init.value)?,
        };
        let bytes = (repeat as u32)
            .checked_mul(WORD)
            .and_then(|b| b.checked_mul(values.len() as u32))
            .and_then(|b| size.checked_add(b))
            .filter(|total| *total <= i32::MAX as u32)
            .ok_or_else(|| constant_err(format!("variable '{}' is too large", var.name), init.span))?;
        size = bytes;

        words.push(repeat);
        words.push(values.len() as i32);
        words.extend(values);
    }
    Ok((size, Inits(words)))
}

fn repeat_count(init: &Init) -> Result<i32, CodegenError> {
    let Some(count) = &init.count else {
        return Ok(1);
    };
    let repeat = decode_int(count)?;
    if repeat < 1 {
        return Err(constant_err(format!("repeat count {repeat} must be at least 1"), count.span));
    }
    Ok(repeat)
}

fn to_offset(bytes: u32, span: Span) -> Result<i32, CodegenError> {
    i32::try_from(bytes).map_err(|_| constant_err("frame too large", span))
}

/// One line per function, parameter and variable, indented by nesting.
pub fn report(program: &Program, layout: &Layout) -> String {
    let mut out = String::new();
    for def in &program.definitions {
        report_definition(def, layout, 0, &mut out);
    }
    out
}

fn report_definition(def: &Definition, layout: &Layout, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match def {
        Definition::Fun(f) => {
            match layout.frame(f.id) {
                Some(frame) => out.push_str(&format!("{pad}fun {frame}\n")),
                None => out.push_str(&format!("{pad}fun {} <no frame>\n", f.name)),
            }
            for par in &f.params {
                report_line("par", &par.name, layout.access(par.id), indent + 1, out);
            }
            report_statements(&f.body, layout, indent + 1, out);
        }
        Definition::Var(v) => report_line("var", &v.name, layout.access(v.id), indent, out),
    }
}

fn report_statements(stmts: &[Statement], layout: &Layout, indent: usize, out: &mut String) {
    for stmt in stmts {
        match stmt {
            Statement::Let { defs, body, .. } => {
                for def in defs {
                    report_definition(def, layout, indent, out);
                }
                report_statements(body, layout, indent, out);
            }
            Statement::If { then_body, else_body, .. } => {
                report_statements(then_body, layout, indent, out);
                report_statements(else_body, layout, indent, out);
            }
            Statement::While { body, .. } => report_statements(body, layout, indent, out),
            Statement::Expr(_) | Statement::Assign { .. } => {}
        }
    }
}

fn report_line(kind: &str, name: &str, access: Option<&Access>, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match access {
        Some(access) => out.push_str(&format!("{pad}{kind} {name} {access}\n")),
        None => out.push_str(&format!("{pad}{kind} {name} <no access>\n")),
    }
}

#[cfg(test)]
mod tests;
