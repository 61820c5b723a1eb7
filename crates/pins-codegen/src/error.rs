use pins_lexer::Span;

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// An earlier phase left the tree in a state code generation cannot use
    #[error("Codegen error at line {line}, column {column}: internal error: {message}")]
    Internal {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Codegen error at line {line}, column {column}: function '{name}' is not visible from '{caller}'")]
    NotVisible {
        name: String,
        caller: String,
        line: usize,
        column: usize,
    },
    #[error("Codegen error at line {line}, column {column}: {message}")]
    MalformedLvalue {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Codegen error: no function 'main' with a body at global scope")]
    MissingMain,
    #[error("Codegen error at line {line}, column {column}: illegal constant: {message}")]
    IllegalConstant {
        message: String,
        line: usize,
        column: usize,
    },
}

pub(crate) fn internal_err(message: impl Into<String>, span: Span) -> CodegenError {
    CodegenError::Internal {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}

pub(crate) fn lvalue_err(message: impl Into<String>, span: Span) -> CodegenError {
    CodegenError::MalformedLvalue {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}

pub(crate) fn constant_err(message: impl Into<String>, span: Span) -> CodegenError {
    CodegenError::IllegalConstant {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}
