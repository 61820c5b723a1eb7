use super::*;

impl Parser {
    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr, span: Span) -> Expr {
        Expr {
            id: self.fresh_id(),
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: Expr, span: Span) -> Expr {
        Expr {
            id: self.fresh_id(),
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        }
    }

    // ── Logical ──────────────────────────────────────────────
    // Expression -> And (|| And)*

    pub(super) fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and_expression()?;

        while self.peek_type() == TokenType::Or {
            let span = self.current_span();
            self.advance(); // consume '||'
            let right = self.and_expression()?;
            left = self.binary(BinaryOp::Or, left, right, span);
        }

        Ok(left)
    }

    // And -> Comparison (&& Comparison)*

    fn and_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.comparison()?;

        while self.peek_type() == TokenType::And {
            let span = self.current_span();
            self.advance(); // consume '&&'
            let right = self.comparison()?;
            left = self.binary(BinaryOp::And, left, right, span);
        }

        Ok(left)
    }

    // ── Comparison ───────────────────────────────────────────
    // Comparison -> Additive [(==|!=|<|>|<=|>=) Additive]

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.additive()?;

        let Some(op) = comparison_op(self.peek_type()) else {
            return Ok(left);
        };
        let span = self.current_span();
        self.advance(); // consume operator
        let right = self.additive()?;

        if let Some(next) = comparison_op(self.peek_type()) {
            return Err(self.error_at(
                self.current_span(),
                format!("comparison operators cannot be chained ('{op}' followed by '{next}')"),
            ));
        }

        Ok(self.binary(op, left, right, span))
    }

    // ── Arithmetic ───────────────────────────────────────────
    // Additive -> Multiplicative ((+|-) Multiplicative)*

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;

        loop {
            let op = match self.peek_type() {
                TokenType::Add => BinaryOp::Add,
                TokenType::Sub => BinaryOp::Sub,
                _ => break,
            };
            let span = self.current_span();
            self.advance(); // consume + or -
            let right = self.multiplicative()?;
            left = self.binary(op, left, right, span);
        }

        Ok(left)
    }

    // Multiplicative -> Prefix ((*|/|%) Prefix)*

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.prefix()?;

        loop {
            let op = match self.peek_type() {
                TokenType::Mul => BinaryOp::Mul,
                TokenType::Div => BinaryOp::Div,
                TokenType::Mod => BinaryOp::Mod,
                _ => break,
            };
            let span = self.current_span();
            self.advance(); // consume operator
            let right = self.prefix()?;
            left = self.binary(op, left, right, span);
        }

        Ok(left)
    }

    // ── Unary ────────────────────────────────────────────────
    // Prefix -> (!|+|-|^) Prefix | Postfix

    fn prefix(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_type() {
            TokenType::Not => UnaryOp::Not,
            TokenType::Add => UnaryOp::Plus,
            TokenType::Sub => UnaryOp::Minus,
            TokenType::Ptr => UnaryOp::AddrOf,
            _ => return self.postfix(),
        };
        let span = self.current_span();
        self.advance(); // consume operator
        let operand = self.prefix()?;
        Ok(self.unary(op, operand, span))
    }

    // Postfix -> Primary ^*

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        while self.peek_type() == TokenType::Ptr {
            let span = self.current_span();
            self.advance(); // consume '^'
            expr = self.unary(UnaryOp::Deref, expr, span);
        }

        Ok(expr)
    }

    // ── Primary ──────────────────────────────────────────────
    // Primary -> const | ID [ ( args ) ] | ( Expression )

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        match tok.token_type {
            TokenType::IntConst | TokenType::CharConst | TokenType::StringConst => {
                let value = self.constant()?;
                Ok(Expr {
                    id: self.fresh_id(),
                    kind: ExprKind::Const(value),
                    span: tok.span,
                })
            }
            TokenType::Identifier => {
                self.advance(); // consume ID
                if self.peek_type() != TokenType::LParen {
                    return Ok(Expr {
                        id: self.fresh_id(),
                        kind: ExprKind::Name(tok.value),
                        span: tok.span,
                    });
                }
                self.advance(); // consume '('
                let args = self.arguments()?;
                self.expect(TokenType::RParen)?;
                Ok(Expr {
                    id: self.fresh_id(),
                    kind: ExprKind::Call { name: tok.value, args },
                    span: tok.span,
                })
            }
            TokenType::LParen => {
                self.advance(); // consume '('
                let expr = self.expression()?;
                self.expect(TokenType::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected(&tok, "an expression")),
        }
    }

    // args -> [ Expression { , Expression } ]
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.peek_type() == TokenType::RParen {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.peek_type() != TokenType::Comma {
                break;
            }
            self.advance(); // consume ','
        }
        Ok(args)
    }
}

fn comparison_op(token_type: TokenType) -> Option<BinaryOp> {
    match token_type {
        TokenType::Eq => Some(BinaryOp::Eq),
        TokenType::NotEq => Some(BinaryOp::NotEq),
        TokenType::Lt => Some(BinaryOp::Lt),
        TokenType::Gt => Some(BinaryOp::Gt),
        TokenType::LtEq => Some(BinaryOp::LtEq),
        TokenType::GtEq => Some(BinaryOp::GtEq),
        _ => None,
    }
}
