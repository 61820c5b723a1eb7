use std::fmt;

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// All token types in PINS'24
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    IntConst,     // 42
    CharConst,    // 'a', '\n', '\41'
    StringConst,  // "hello"
    Identifier,   // names

    // Keywords
    Fun,
    Var,
    If,
    Then,
    Else,
    While,
    Do,
    Let,
    In,
    End,

    // Assignment & separators
    Assign,       // =
    Comma,        // ,

    // Logical
    And,          // &&
    Or,           // ||
    Not,          // !

    // Comparison
    Eq,           // ==
    NotEq,        // !=
    Gt,           // >
    Lt,           // <
    GtEq,         // >=
    LtEq,         // <=

    // Arithmetic
    Add,          // +
    Sub,          // -
    Mul,          // *
    Div,          // /
    Mod,          // %

    // Pointers
    Ptr,          // ^

    // Delimiters
    LParen,       // (
    RParen,       // )

    // Special
    Eof,          // end of file
}

impl TokenType {
    /// Short description used in parser diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenType::IntConst => "integer constant",
            TokenType::CharConst => "character constant",
            TokenType::StringConst => "string constant",
            TokenType::Identifier => "identifier",
            TokenType::Fun => "'fun'",
            TokenType::Var => "'var'",
            TokenType::If => "'if'",
            TokenType::Then => "'then'",
            TokenType::Else => "'else'",
            TokenType::While => "'while'",
            TokenType::Do => "'do'",
            TokenType::Let => "'let'",
            TokenType::In => "'in'",
            TokenType::End => "'end'",
            TokenType::Assign => "'='",
            TokenType::Comma => "','",
            TokenType::And => "'&&'",
            TokenType::Or => "'||'",
            TokenType::Not => "'!'",
            TokenType::Eq => "'=='",
            TokenType::NotEq => "'!='",
            TokenType::Gt => "'>'",
            TokenType::Lt => "'<'",
            TokenType::GtEq => "'>='",
            TokenType::LtEq => "'<='",
            TokenType::Add => "'+'",
            TokenType::Sub => "'-'",
            TokenType::Mul => "'*'",
            TokenType::Div => "'/'",
            TokenType::Mod => "'%'",
            TokenType::Ptr => "'^'",
            TokenType::LParen => "'('",
            TokenType::RParen => "')'",
            TokenType::Eof => "end of file",
        }
    }
}

/// A single token
///
/// `value` holds the raw lexeme. Character and string constants keep their
/// quotes and escapes; decoding happens in the back end.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub span: Span,
}
