use std::collections::HashMap;

use pins_lexer::Span;
use pins_parser::{Definition, Expr, ExprKind, FunDef, NodeId, Program, Statement};
use tracing::trace;

/// The declaration a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decl {
    Fun(NodeId),
    Par(NodeId),
    Var(NodeId),
}

impl Decl {
    pub fn id(self) -> NodeId {
        match self {
            Decl::Fun(id) | Decl::Par(id) | Decl::Var(id) => id,
        }
    }
}

/// Result of name resolution: every `Name` and `Call` expression mapped to
/// its declaration.
#[derive(Debug, Default)]
pub struct Bindings {
    uses: HashMap<NodeId, Decl>,
}

impl Bindings {
    pub fn get(&self, use_site: NodeId) -> Option<Decl> {
        self.uses.get(&use_site).copied()
    }

    pub fn len(&self) -> usize {
        self.uses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }
}

/// Bindings assembled by hand, e.g. for back-end tests of cases the
/// resolver never produces.
impl FromIterator<(NodeId, Decl)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (NodeId, Decl)>>(iter: I) -> Self {
        Bindings {
            uses: iter.into_iter().collect(),
        }
    }
}

/// Resolve every identifier use in `program`.
pub fn resolve(program: &Program) -> Result<Bindings, ResolveError> {
    let mut resolver = Resolver::default();
    resolver.push_scope();
    resolver.declare_all(&program.definitions)?;
    for def in &program.definitions {
        resolver.resolve_definition(def)?;
    }
    resolver.pop_scope();
    Ok(Bindings { uses: resolver.uses })
}

#[derive(Default)]
struct Resolver {
    scopes: Vec<HashMap<String, Decl>>,
    uses: HashMap<NodeId, Decl>,
}

impl Resolver {
    // ── Scopes ───────────────────────────────────────────────

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str, decl: Decl, span: Span) -> Result<(), ResolveError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(resolve_err(format!("'{name}' declared outside any scope"), span));
        };
        if scope.contains_key(name) {
            return Err(resolve_err(format!("'{name}' is already defined in this scope"), span));
        }
        scope.insert(name.to_string(), decl);
        Ok(())
    }

    /// Declare a whole group of sibling definitions before any body is
    /// resolved, so siblings may refer to each other in any order.
    fn declare_all(&mut self, defs: &[Definition]) -> Result<(), ResolveError> {
        for def in defs {
            let decl = match def {
                Definition::Fun(f) => Decl::Fun(f.id),
                Definition::Var(v) => Decl::Var(v.id),
            };
            self.declare(def.name(), decl, def.span())?;
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Decl> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    // ── Definitions ──────────────────────────────────────────

    fn resolve_definition(&mut self, def: &Definition) -> Result<(), ResolveError> {
        match def {
            Definition::Fun(f) => self.resolve_function(f),
            // Initializers are constants
            Definition::Var(_) => Ok(()),
        }
    }

    fn resolve_function(&mut self, fun: &FunDef) -> Result<(), ResolveError> {
        self.push_scope();
        for par in &fun.params {
            self.declare(&par.name, Decl::Par(par.id), par.span)?;
        }
        self.resolve_statements(&fun.body)?;
        self.pop_scope();
        Ok(())
    }

    // ── Statements ───────────────────────────────────────────

    fn resolve_statements(&mut self, stmts: &[Statement]) -> Result<(), ResolveError> {
        for stmt in stmts {
            self.resolve_statement(stmt)?;
        }
        Ok(())
    }

    fn resolve_statement(&mut self, stmt: &Statement) -> Result<(), ResolveError> {
        match stmt {
            Statement::Expr(e) => self.resolve_expr(e),
            Statement::Assign { dst, src, .. } => {
                self.resolve_expr(dst)?;
                self.resolve_expr(src)
            }
            Statement::If { cond, then_body, else_body, .. } => {
                self.resolve_expr(cond)?;
                self.resolve_statements(then_body)?;
                self.resolve_statements(else_body)
            }
            Statement::While { cond, body, .. } => {
                self.resolve_expr(cond)?;
                self.resolve_statements(body)
            }
            Statement::Let { defs, body, .. } => {
                self.push_scope();
                self.declare_all(defs)?;
                for def in defs {
                    self.resolve_definition(def)?;
                }
                self.resolve_statements(body)?;
                self.pop_scope();
                Ok(())
            }
        }
    }

    // ── Expressions ──────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        match &expr.kind {
            ExprKind::Const(_) => Ok(()),
            ExprKind::Name(name) => match self.lookup(name) {
                Some(Decl::Fun(_)) => Err(resolve_err(
                    format!("function '{name}' cannot be used as a value"),
                    expr.span,
                )),
                Some(decl) => {
                    self.bind(expr.id, decl, name);
                    Ok(())
                }
                None => Err(resolve_err(format!("undefined name '{name}'"), expr.span)),
            },
            ExprKind::Call { name, args } => {
                match self.lookup(name) {
                    Some(decl @ Decl::Fun(_)) => self.bind(expr.id, decl, name),
                    Some(_) => {
                        return Err(resolve_err(format!("'{name}' is not a function"), expr.span));
                    }
                    None => {
                        return Err(resolve_err(format!("undefined function '{name}'"), expr.span));
                    }
                }
                for arg in args {
                    self.resolve_expr(arg)?;
                }
                Ok(())
            }
            ExprKind::Unary { operand, .. } => self.resolve_expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }
        }
    }

    fn bind(&mut self, use_site: NodeId, decl: Decl, name: &str) {
        trace!(%use_site, name, decl = %decl.id(), "resolved");
        self.uses.insert(use_site, decl);
    }
}

fn resolve_err(message: impl Into<String>, span: Span) -> ResolveError {
    ResolveError::Error {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Name error at line {line}, column {column}: {message}")]
    Error {
        message: String,
        line: usize,
        column: usize,
    },
}
