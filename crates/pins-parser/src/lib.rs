pub mod ast;
mod parser;

pub use ast::*;
pub use parser::{Parser, ParseError};

/// Lex and parse a whole source text.
pub fn parse_source(source: &str) -> Result<Program, FrontendError> {
    let tokens = pins_lexer::Lexer::new(source).tokenize()?;
    Ok(Parser::new(tokens).parse()?)
}

/// Either front-end failure
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error(transparent)]
    Lex(#[from] pins_lexer::LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
