use super::*;

impl Parser {
    // ── Statements ───────────────────────────────────────────
    // statements -> statement { , statement }

    pub(super) fn statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut stmts = vec![self.statement()?];
        while self.peek_type() == TokenType::Comma {
            self.advance(); // consume ','
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_type() {
            TokenType::If => self.if_statement(),
            TokenType::While => self.while_statement(),
            TokenType::Let => self.let_statement(),
            _ => self.expr_statement(),
        }
    }

    // if expr then statements [ else statements ] end
    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.expect(TokenType::If)?.span;
        let cond = self.expression()?;
        self.expect(TokenType::Then)?;
        let then_body = self.statements()?;

        let else_body = if self.peek_type() == TokenType::Else {
            self.advance(); // consume 'else'
            self.statements()?
        } else {
            Vec::new()
        };

        self.expect(TokenType::End)?;
        Ok(Statement::If { cond, then_body, else_body, span })
    }

    // while expr do statements end
    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.expect(TokenType::While)?.span;
        let cond = self.expression()?;
        self.expect(TokenType::Do)?;
        let body = self.statements()?;
        self.expect(TokenType::End)?;
        Ok(Statement::While { cond, body, span })
    }

    // let definition { definition } in statements end
    fn let_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.expect(TokenType::Let)?.span;
        let mut defs = vec![self.definition()?];
        while matches!(self.peek_type(), TokenType::Var | TokenType::Fun) {
            defs.push(self.definition()?);
        }
        self.expect(TokenType::In)?;
        let body = self.statements()?;
        self.expect(TokenType::End)?;
        Ok(Statement::Let { defs, body, span })
    }

    // expr [ = expr ]
    fn expr_statement(&mut self) -> Result<Statement, ParseError> {
        let dst = self.expression()?;
        if self.peek_type() != TokenType::Assign {
            return Ok(Statement::Expr(dst));
        }
        let span = dst.span;
        self.advance(); // consume '='
        let src = self.expression()?;
        Ok(Statement::Assign { dst, src, span })
    }
}
