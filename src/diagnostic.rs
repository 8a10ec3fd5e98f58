//! Fatal error taxonomy and rendering.
//!
//! Every error here aborts the compilation; there is no recovery path and
//! no partial output. Semantic errors carry the source range they point at;
//! IR errors indicate an invariant an earlier pass failed to uphold.

use thiserror::Error;

use crate::ir::types::Type;
use crate::source_manager::{SourceManager, SourceRange, Symbol};

/// Errors detected while linking, resolving and evaluating the AST.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("use of undeclared identifier '{name}'")]
    UnresolvedIdentifier { name: Symbol, range: SourceRange },

    #[error("expression is not a compile-time constant")]
    NonConstantContext { range: SourceRange },

    #[error("division by zero in constant expression")]
    DivisionByZero { range: SourceRange },

    #[error("array dimension must be positive, got {value}")]
    InvalidArrayDimension { value: i32, range: SourceRange },

    #[error("redefinition of '{name}'")]
    Redefinition { name: Symbol, range: SourceRange },

    #[error("initializer does not match the declared array shape")]
    MalformedInitializer { range: SourceRange },
}

impl SemanticError {
    pub fn range(&self) -> SourceRange {
        match self {
            SemanticError::UnresolvedIdentifier { range, .. }
            | SemanticError::NonConstantContext { range }
            | SemanticError::DivisionByZero { range }
            | SemanticError::InvalidArrayDimension { range, .. }
            | SemanticError::Redefinition { range, .. }
            | SemanticError::MalformedInitializer { range } => *range,
        }
    }
}

/// Errors raised by IR construction and validation. These indicate a
/// compiler bug or an invariant violated by an earlier pass.
#[derive(Debug, Error)]
pub enum IrError {
    #[error("{inst}: operand type violates instruction contract, found {found}")]
    TypeMismatch { inst: &'static str, found: Type },

    #[error("malformed IR: {0}")]
    Malformed(String),
}

/// Top-level error of a compilation run.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Render a fatal error the way the driver prints it to stderr:
/// `file:range: error: message`.
pub fn render(err: &CompileError, src: &SourceManager) -> String {
    match err {
        CompileError::Semantic(e) => {
            format!("{}:{}: error: {}", src.file_name(), e.range(), e)
        }
        CompileError::Ir(e) => format!("{}: internal error: {}", src.file_name(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_errors_render_with_location() {
        let src = SourceManager::new("prog.sy");
        let err = CompileError::Semantic(SemanticError::UnresolvedIdentifier {
            name: Symbol::from("x"),
            range: SourceRange::new(3, 5, 3, 5),
        });
        let rendered = render(&err, &src);
        assert!(rendered.starts_with("prog.sy:3:5-3:5: error:"), "{rendered}");
        assert!(rendered.contains("undeclared identifier 'x'"));
    }
}
