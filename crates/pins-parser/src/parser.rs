use pins_lexer::{Token, TokenType, Span};
use crate::ast::*;

mod exprs;
mod stmts;

/// Recursive-descent parser for PINS'24
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, next_id: 0 }
    }

    /// Parse all tokens into a Program AST
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut definitions = Vec::new();
        loop {
            definitions.push(self.definition()?);
            if self.is_at_end() {
                break;
            }
        }
        Ok(Program { definitions })
    }

    // ── Token navigation ─────────────────────────────────────

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_type(&self) -> TokenType {
        self.current().token_type
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: TokenType) -> Result<Token, ParseError> {
        let tok = self.advance().clone();
        if tok.token_type != expected {
            return Err(self.unexpected(&tok, expected.describe()));
        }
        Ok(tok)
    }

    fn peek_type(&self) -> TokenType {
        self.current_type()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.current_type() == TokenType::Eof
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn error_at(&self, span: Span, message: String) -> ParseError {
        ParseError::Error {
            line: span.line,
            column: span.column,
            message,
        }
    }

    fn unexpected(&self, tok: &Token, expected: &str) -> ParseError {
        let found = if tok.token_type == TokenType::Eof {
            "end of file".to_string()
        } else {
            format!("'{}'", tok.value)
        };
        self.error_at(tok.span, format!("expected {expected}, found {found}"))
    }

    // ── Definitions ──────────────────────────────────────────
    // definition -> var ID = initializers | fun ID ( params ) [= statements]

    fn definition(&mut self) -> Result<Definition, ParseError> {
        match self.peek_type() {
            TokenType::Var => Ok(Definition::Var(self.var_definition()?)),
            TokenType::Fun => Ok(Definition::Fun(self.fun_definition()?)),
            _ => {
                let tok = self.current().clone();
                Err(self.unexpected(&tok, "'var' or 'fun'"))
            }
        }
    }

    fn fun_definition(&mut self) -> Result<FunDef, ParseError> {
        let span = self.expect(TokenType::Fun)?.span;
        let id = self.fresh_id();
        let name = self.expect(TokenType::Identifier)?.value;
        self.expect(TokenType::LParen)?;
        let params = self.parameters()?;
        self.expect(TokenType::RParen)?;

        let body = if self.peek_type() == TokenType::Assign {
            self.advance(); // consume '='
            self.statements()?
        } else {
            Vec::new()
        };

        Ok(FunDef { id, name, params, body, span })
    }

    /// params -> [ ID { , ID } ]
    fn parameters(&mut self) -> Result<Vec<ParDef>, ParseError> {
        let mut params = Vec::new();
        if self.peek_type() != TokenType::Identifier {
            return Ok(params);
        }
        loop {
            let tok = self.expect(TokenType::Identifier)?;
            params.push(ParDef {
                id: self.fresh_id(),
                name: tok.value,
                span: tok.span,
            });
            if self.peek_type() != TokenType::Comma {
                break;
            }
            self.advance(); // consume ','
        }
        Ok(params)
    }

    fn var_definition(&mut self) -> Result<VarDef, ParseError> {
        let span = self.expect(TokenType::Var)?.span;
        let id = self.fresh_id();
        let name = self.expect(TokenType::Identifier)?.value;
        self.expect(TokenType::Assign)?;
        let inits = self.initializers()?;
        Ok(VarDef { id, name, inits, span })
    }

    /// initializers -> [ initializer { , initializer } ]
    fn initializers(&mut self) -> Result<Vec<Init>, ParseError> {
        let mut inits = Vec::new();
        if !is_constant(self.peek_type()) {
            return Ok(inits);
        }
        loop {
            inits.push(self.initializer()?);
            if self.peek_type() != TokenType::Comma {
                break;
            }
            self.advance(); // consume ','
        }
        Ok(inits)
    }

    /// initializer -> INTCONST [ * const ] | CHARCONST | STRINGCONST
    fn initializer(&mut self) -> Result<Init, ParseError> {
        let first = self.constant()?;
        let span = first.span;

        if first.kind == ConstKind::Int && self.peek_type() == TokenType::Mul {
            self.advance(); // consume '*'
            let value = self.constant()?;
            return Ok(Init { count: Some(first), value, span });
        }

        Ok(Init { count: None, value: first, span })
    }

    fn constant(&mut self) -> Result<Const, ParseError> {
        let tok = self.advance().clone();
        let kind = match tok.token_type {
            TokenType::IntConst => ConstKind::Int,
            TokenType::CharConst => ConstKind::Char,
            TokenType::StringConst => ConstKind::Str,
            _ => return Err(self.unexpected(&tok, "a constant")),
        };
        Ok(Const { kind, raw: tok.value, span: tok.span })
    }
}

fn is_constant(token_type: TokenType) -> bool {
    matches!(
        token_type,
        TokenType::IntConst | TokenType::CharConst | TokenType::StringConst
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Error {
        line: usize,
        column: usize,
        message: String,
    },
}
