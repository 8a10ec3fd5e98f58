//! Semantic analysis over the parsed AST.
//!
//! Two passes run after the parser hands over the arena:
//! 1. [`scope_walker::link`] sets parent back-links, injects the runtime
//!    built-ins, and populates per-scope identifier maps;
//! 2. [`resolver::run`] walks bottom-up binding every name reference to
//!    its declaration, computing compile-time constants, and normalizing
//!    array initializers against their declared shape.
//!
//! Both passes mutate only annotation state; the tree the parser built is
//! never reshaped except for initializer-list rewrites.

pub mod builtins;
pub mod const_eval;
pub mod initializer;
pub mod resolver;
pub mod scope_walker;

use crate::ast::Ast;
use crate::diagnostic::SemanticError;
use crate::source_manager::SourceManager;

/// Run the whole semantic phase. After a successful return the AST is
/// fully linked, resolved, annotated and normalized, ready for lowering.
pub fn analyze(ast: &mut Ast, src: &SourceManager) -> Result<(), SemanticError> {
    scope_walker::link(ast)?;
    resolver::run(ast, src)?;
    Ok(())
}
