//! The compilation pipeline.
//!
//! A run is four strictly sequential phases. The parser (an external
//! collaborator) populates the [`SourceManager`] and the [`Ast`]; this
//! driver runs the remaining three over them:
//! 1. scope linking (parents, identifier maps, built-ins),
//! 2. resolution, constant evaluation and initializer normalization,
//! 3. lowering to the linear IR, followed by structural validation.
//!
//! Any error aborts the run with no partial output; callers render it with
//! [`crate::diagnostic::render`] and exit non-zero.

use crate::ast::Ast;
use crate::ast_to_ir::AstToIrLowerer;
use crate::diagnostic::{CompileError, IrError};
use crate::ir::{Module, validation};
use crate::semantic;
use crate::source_manager::SourceManager;

/// Compile a parsed translation unit down to an IR module.
pub fn compile(src: &SourceManager, ast: &mut Ast) -> Result<Module, CompileError> {
    semantic::analyze(ast, src)?;
    let module = AstToIrLowerer::new(ast).run()?;
    validation::validate(&module).map_err(|errors| {
        let rendered = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        IrError::Malformed(rendered)
    })?;
    Ok(module)
}
