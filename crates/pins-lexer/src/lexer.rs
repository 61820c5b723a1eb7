use crate::token::{Token, TokenType, Span};

/// Lexer for PINS'24 source code
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source and return the token list.
    ///
    /// Stops at the first lexical error.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        while let Some(ch) = self.current() {
            match ch {
                // Whitespace (skip)
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }

                // Comment runs to end of line
                '#' => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }

                '\'' => self.read_char()?,
                '"' => self.read_string()?,
                '0'..='9' => self.read_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.read_identifier_or_keyword(),

                '=' => self.read_pair('=', TokenType::Eq, TokenType::Assign),
                '!' => self.read_pair('=', TokenType::NotEq, TokenType::Not),
                '>' => self.read_pair('=', TokenType::GtEq, TokenType::Gt),
                '<' => self.read_pair('=', TokenType::LtEq, TokenType::Lt),
                '&' => self.read_doubled('&', TokenType::And)?,
                '|' => self.read_doubled('|', TokenType::Or)?,

                ',' => self.read_single(TokenType::Comma),
                '+' => self.read_single(TokenType::Add),
                '-' => self.read_single(TokenType::Sub),
                '*' => self.read_single(TokenType::Mul),
                '/' => self.read_single(TokenType::Div),
                '%' => self.read_single(TokenType::Mod),
                '^' => self.read_single(TokenType::Ptr),
                '(' => self.read_single(TokenType::LParen),
                ')' => self.read_single(TokenType::RParen),

                // Illegal character
                _ => {
                    return Err(self.error_here(format!("illegal character '{}'", ch.escape_default())));
                }
            }
        }

        // Append EOF
        let span = self.span();
        self.push_token(TokenType::Eof, String::new(), span);

        Ok(std::mem::take(&mut self.tokens))
    }

    // ── Helpers ──────────────────────────────────────────────

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += 1;
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            // Tab stops every 8 columns
            '\t' => self.column = (self.column + 7) / 8 * 8 + 1,
            _ => self.column += 1,
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span { line: self.line, column: self.column }
    }

    fn push_token(&mut self, token_type: TokenType, value: String, span: Span) {
        self.tokens.push(Token { token_type, value, span });
    }

    fn error_at(&self, span: Span, message: impl Into<String>) -> LexError {
        LexError::Error {
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> LexError {
        self.error_at(self.span(), message)
    }

    // ── Symbols ──────────────────────────────────────────────

    fn read_single(&mut self, token_type: TokenType) {
        let span = self.span();
        if let Some(ch) = self.advance() {
            self.push_token(token_type, ch.to_string(), span);
        }
    }

    /// `x` or `x` followed by `next`, e.g. `=` / `==`
    fn read_pair(&mut self, next: char, long: TokenType, short: TokenType) {
        let span = self.span();
        let Some(first) = self.advance() else { return };
        if self.current() == Some(next) {
            self.advance();
            self.push_token(long, format!("{first}{next}"), span);
        } else {
            self.push_token(short, first.to_string(), span);
        }
    }

    /// `&&` and `||` have no single-character form
    fn read_doubled(&mut self, ch: char, token_type: TokenType) -> Result<(), LexError> {
        let span = self.span();
        self.advance();
        if self.current() != Some(ch) {
            return Err(self.error_at(span, format!("unexpected '{ch}'. Did you mean '{ch}{ch}'?")));
        }
        self.advance();
        self.push_token(token_type, format!("{ch}{ch}"), span);
        Ok(())
    }

    // ── Number ───────────────────────────────────────────────

    fn read_number(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let mut value = String::new();

        while let Some(ch) = self.current() {
            if !ch.is_ascii_digit() {
                break;
            }
            value.push(ch);
            self.advance();
        }

        if let Some(ch) = self.current() {
            if !is_separator(ch) {
                return Err(self.error_here(format!("illegal character '{}' after number '{value}'", ch.escape_default())));
            }
        }

        self.push_token(TokenType::IntConst, value, span);
        Ok(())
    }

    // ── Character / String ───────────────────────────────────

    fn read_char(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let mut value = String::from('\'');
        self.advance();

        match self.current() {
            Some('\'') => return Err(self.error_at(span, "empty character constant")),
            Some('\\') => self.read_escape('\'', &mut value)?,
            Some(ch) if is_printable(ch) => {
                value.push(ch);
                self.advance();
            }
            Some(ch) => {
                return Err(self.error_here(format!("illegal character '{}' in character constant", ch.escape_default())));
            }
            None => return Err(self.error_at(span, "unclosed character constant")),
        }

        if self.current() != Some('\'') {
            return Err(self.error_at(span, "unclosed character constant"));
        }
        self.advance();
        value.push('\'');

        self.push_token(TokenType::CharConst, value, span);
        Ok(())
    }

    fn read_string(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let mut value = String::from('"');
        self.advance();

        loop {
            match self.current() {
                Some('"') => {
                    self.advance();
                    value.push('"');
                    break;
                }
                Some('\\') => self.read_escape('"', &mut value)?,
                Some(ch) if is_printable(ch) => {
                    value.push(ch);
                    self.advance();
                }
                Some('\n') | Some('\r') | None => {
                    return Err(self.error_at(span, "unclosed string constant"));
                }
                Some(ch) => {
                    return Err(self.error_here(format!("illegal character '{}' in string constant", ch.escape_default())));
                }
            }
        }

        self.push_token(TokenType::StringConst, value, span);
        Ok(())
    }

    /// Copies a backslash escape into `value` unchanged after validating it.
    /// `quote` is the delimiter that may be escaped in this literal kind.
    fn read_escape(&mut self, quote: char, value: &mut String) -> Result<(), LexError> {
        let span = self.span();
        self.advance(); // consume '\'
        value.push('\\');

        match self.current() {
            Some(ch) if ch == 'n' || ch == '\\' || ch == quote => {
                value.push(ch);
                self.advance();
                Ok(())
            }
            Some(hi) if hi.is_ascii_hexdigit() => {
                value.push(hi);
                self.advance();
                match self.current() {
                    Some(lo) if lo.is_ascii_hexdigit() => {
                        value.push(lo);
                        self.advance();
                        Ok(())
                    }
                    _ => Err(self.error_at(span, format!("incomplete hexadecimal escape '\\{hi}'"))),
                }
            }
            Some(ch) => Err(self.error_at(span, format!("invalid escape sequence '\\{}'", ch.escape_default()))),
            None => Err(self.error_at(span, "unfinished escape sequence")),
        }
    }

    // ── Identifier / Keyword ─────────────────────────────────

    fn read_identifier_or_keyword(&mut self) {
        let span = self.span();
        let mut word = String::new();

        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = match word.as_str() {
            "fun" => TokenType::Fun,
            "var" => TokenType::Var,
            "if" => TokenType::If,
            "then" => TokenType::Then,
            "else" => TokenType::Else,
            "while" => TokenType::While,
            "do" => TokenType::Do,
            "let" => TokenType::Let,
            "in" => TokenType::In,
            "end" => TokenType::End,
            _ => TokenType::Identifier,
        };

        self.push_token(token_type, word, span);
    }
}

/// Characters allowed inside character and string constants
fn is_printable(ch: char) -> bool {
    (' '..='~').contains(&ch)
}

/// Characters that may directly follow an integer constant
fn is_separator(ch: char) -> bool {
    matches!(
        ch,
        '=' | ',' | '&' | '|' | '!' | '>' | '<' | '+' | '-' | '*' | '/' | '%' | '^' | '(' | ')'
            | '#' | ' ' | '\n' | '\r' | '\t' | '\'' | '"'
    )
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Lex error at line {line}, column {column}: {message}")]
    Error {
        line: usize,
        column: usize,
        message: String,
    },
}
