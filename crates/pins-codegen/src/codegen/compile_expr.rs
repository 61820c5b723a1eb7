use pins_parser::{BinaryOp, ConstKind};
use tracing::trace;

use super::*;

impl CodeGenerator<'_> {
    /// Code that leaves the value of `expr` on top of the stack.
    pub(super) fn compile_expr(
        &mut self,
        expr: &Expr,
        frame: &Frame,
    ) -> Result<Vec<CodeInstr>, CodegenError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Const(c) => match c.kind {
                ConstKind::Int => Ok(vec![CodeInstr::new(CodeKind::Push(decode_int(c)?), span)]),
                ConstKind::Char => Ok(vec![CodeInstr::new(CodeKind::Push(decode_char(c)?), span)]),
                ConstKind::Str => {
                    let values = decode_str(c)?;
                    let label = format!(":str:{}", self.labels.next());
                    let mut data = vec![DataInstr::new(DataKind::Label(label.clone()), span)];
                    data.extend(values.into_iter().map(|v| DataInstr::new(DataKind::Data(v), span)));
                    self.record_data(expr.id, data, span)?;
                    Ok(vec![CodeInstr::new(CodeKind::Name(label), span)])
                }
            },

            ExprKind::Name(name) => {
                let access = self.variable_access(expr)?;
                trace!(name = %name, access = %access, depth = frame.depth, "variable read");
                let mut code = self.access_address(access, frame, span)?;
                code.push(CodeInstr::new(CodeKind::Load, span));
                Ok(code)
            }

            ExprKind::Call { name, args } => self.compile_call(expr, name, args, frame),

            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Plus => self.compile_expr(operand, frame),
                UnaryOp::Minus => self.unary_oper(operand, Oper::Neg, frame),
                UnaryOp::Not => self.unary_oper(operand, Oper::Not, frame),
                UnaryOp::AddrOf => match operand.kind {
                    ExprKind::Name(_) => {
                        let access = self.variable_access(operand)?;
                        self.access_address(access, frame, span)
                    }
                    _ => Err(lvalue_err("cannot take the address of this expression", span)),
                },
                UnaryOp::Deref => {
                    let mut code = self.compile_expr(operand, frame)?;
                    code.push(CodeInstr::new(CodeKind::Load, span));
                    Ok(code)
                }
            },

            ExprKind::Binary { op, left, right } => {
                let mut code = self.compile_expr(left, frame)?;
                code.extend(self.compile_expr(right, frame)?);
                code.push(CodeInstr::new(CodeKind::Oper(binary_oper(*op)), span));
                Ok(code)
            }
        }
    }

    fn unary_oper(
        &mut self,
        operand: &Expr,
        oper: Oper,
        frame: &Frame,
    ) -> Result<Vec<CodeInstr>, CodegenError> {
        let mut code = self.compile_expr(operand, frame)?;
        code.push(CodeInstr::new(CodeKind::Oper(oper), operand.span));
        Ok(code)
    }

    // ── Calls ────────────────────────────────────────────────

    /// Arguments right to left, then the static link, then the call.
    fn compile_call(
        &mut self,
        call: &Expr,
        name: &str,
        args: &[Expr],
        caller: &Frame,
    ) -> Result<Vec<CodeInstr>, CodegenError> {
        let span = call.span;
        let callee = match self.binding_of(call)? {
            Decl::Fun(id) => self.frame_of(id, span)?,
            _ => return Err(internal_err(format!("'{name}' called but is not a function"), span)),
        };

        // A callee is declared one level above its own frame; it is visible
        // from the caller's frame or any frame nested inside its scope.
        if callee.depth > caller.depth + 1 {
            return Err(CodegenError::NotVisible {
                name: callee.name.clone(),
                caller: caller.name.clone(),
                line: span.line,
                column: span.column,
            });
        }
        let hops = caller.depth + 1 - callee.depth;
        trace!(caller = %caller.name, callee = %callee.name, hops, "call");

        let mut code = Vec::new();
        for arg in args.iter().rev() {
            code.extend(self.compile_expr(arg, caller)?);
        }
        code.extend(static_chain(hops, span));
        code.push(CodeInstr::new(CodeKind::Name(callee.name.clone()), span));
        code.push(CodeInstr::new(CodeKind::Call(Some(Rc::clone(callee))), span));
        Ok(code)
    }
}

fn binary_oper(op: BinaryOp) -> Oper {
    match op {
        BinaryOp::Or => Oper::Or,
        BinaryOp::And => Oper::And,
        BinaryOp::Eq => Oper::Equ,
        BinaryOp::NotEq => Oper::Neq,
        BinaryOp::Lt => Oper::Lth,
        BinaryOp::Gt => Oper::Gth,
        BinaryOp::LtEq => Oper::Leq,
        BinaryOp::GtEq => Oper::Geq,
        BinaryOp::Add => Oper::Add,
        BinaryOp::Sub => Oper::Sub,
        BinaryOp::Mul => Oper::Mul,
        BinaryOp::Div => Oper::Div,
        BinaryOp::Mod => Oper::Mod,
    }
}
