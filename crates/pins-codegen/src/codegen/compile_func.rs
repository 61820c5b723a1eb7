use super::*;

impl CodeGenerator<'_> {
    /// Compile one function body into its own instruction list.
    ///
    /// Functions declared in the body's `let` blocks are compiled separately
    /// and recorded under their own ids.
    pub(super) fn compile_function(&mut self, fun: &FunDef) -> Result<(), CodegenError> {
        let span = fun.span;
        let frame = self.frame_of(fun.id, span)?;
        if fun.body.is_empty() {
            return Ok(());
        }

        let locals = frame.vars_size.checked_sub(FRAME_HEADER).ok_or_else(|| {
            internal_err(format!("frame of '{}' smaller than its header", frame.name), span)
        })?;
        let locals = i32::try_from(locals)
            .map_err(|_| internal_err(format!("frame of '{}' too large", frame.name), span))?;

        let mut code = vec![CodeInstr::new(CodeKind::Label(frame.name.clone()), span)];
        let mut prologue = vec![
            CodeInstr::new(CodeKind::Push(-locals), span),
            CodeInstr::new(CodeKind::Popn, span),
        ];
        strip_dead_discard(&mut prologue);
        code.extend(prologue);

        code.extend(self.compile_stmts(&fun.body, frame)?);

        let args = frame.pars_size.checked_sub(STATIC_LINK).ok_or_else(|| {
            internal_err(format!("parameters of '{}' smaller than a static link", frame.name), span)
        })?;
        let args = i32::try_from(args)
            .map_err(|_| internal_err(format!("parameters of '{}' too large", frame.name), span))?;
        code.push(CodeInstr::new(CodeKind::Push(args), span));
        code.push(CodeInstr::new(CodeKind::Retn(Rc::clone(frame)), span));

        debug!(function = %frame.name, instructions = code.len(), "function emitted");
        self.record_code(fun.id, code, span)
    }
}
