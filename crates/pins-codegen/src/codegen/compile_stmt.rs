use super::*;

impl CodeGenerator<'_> {
    pub(super) fn compile_stmts(
        &mut self,
        stmts: &[Statement],
        frame: &Frame,
    ) -> Result<Vec<CodeInstr>, CodegenError> {
        let mut code = Vec::new();
        for stmt in stmts {
            code.extend(self.compile_stmt(stmt, frame)?);
        }
        Ok(code)
    }

    pub(super) fn compile_stmt(
        &mut self,
        stmt: &Statement,
        frame: &Frame,
    ) -> Result<Vec<CodeInstr>, CodegenError> {
        match stmt {
            // ── Expression statement ──
            Statement::Expr(expr) => {
                let mut code = self.compile_expr(expr, frame)?;
                code.push(CodeInstr::new(CodeKind::Push(4), expr.span));
                code.push(CodeInstr::new(CodeKind::Popn, expr.span));
                Ok(code)
            }

            // ── Assignment ──
            Statement::Assign { dst, src, span } => {
                let mut code = self.compile_expr(src, frame)?;
                code.extend(self.lvalue_address(dst, frame)?);
                code.push(CodeInstr::new(CodeKind::Save, *span));
                Ok(code)
            }

            // ── If ──
            Statement::If {
                cond,
                then_body,
                else_body,
                span,
            } => {
                let n = self.labels.next();
                let then_label = format!(":then:{n}");
                let else_label = format!(":else:{n}");
                let end_label = format!(":endif:{n}");
                let span = *span;

                let mut code = self.compile_expr(cond, frame)?;
                code.push(CodeInstr::new(CodeKind::Name(then_label.clone()), span));
                code.push(CodeInstr::new(CodeKind::Name(else_label.clone()), span));
                code.push(CodeInstr::new(CodeKind::Cjmp, span));
                code.push(CodeInstr::new(CodeKind::Label(then_label), span));
                code.extend(self.compile_stmts(then_body, frame)?);
                code.push(CodeInstr::new(CodeKind::Name(end_label.clone()), span));
                code.push(CodeInstr::new(CodeKind::Ujmp, span));
                code.push(CodeInstr::new(CodeKind::Label(else_label), span));
                code.extend(self.compile_stmts(else_body, frame)?);
                code.push(CodeInstr::new(CodeKind::Label(end_label), span));
                Ok(code)
            }

            // ── While ──
            Statement::While { cond, body, span } => {
                let n = self.labels.next();
                let cond_label = format!(":while:{n}");
                let body_label = format!(":do:{n}");
                let end_label = format!(":endwhile:{n}");
                let span = *span;

                let mut code = vec![CodeInstr::new(CodeKind::Label(cond_label.clone()), span)];
                code.extend(self.compile_expr(cond, frame)?);
                code.push(CodeInstr::new(CodeKind::Name(body_label.clone()), span));
                code.push(CodeInstr::new(CodeKind::Name(end_label.clone()), span));
                code.push(CodeInstr::new(CodeKind::Cjmp, span));
                code.push(CodeInstr::new(CodeKind::Label(body_label), span));
                code.extend(self.compile_stmts(body, frame)?);
                code.push(CodeInstr::new(CodeKind::Name(cond_label), span));
                code.push(CodeInstr::new(CodeKind::Ujmp, span));
                code.push(CodeInstr::new(CodeKind::Label(end_label), span));
                Ok(code)
            }

            // ── Let ──
            Statement::Let { defs, body, .. } => {
                let mut code = Vec::new();
                for def in defs {
                    match def {
                        Definition::Var(var) => code.extend(self.compile_var(var, Some(frame))?),
                        Definition::Fun(fun) => self.compile_function(fun)?,
                    }
                }
                code.extend(self.compile_stmts(body, frame)?);
                Ok(code)
            }
        }
    }
}
