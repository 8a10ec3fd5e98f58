//! Scope linking pass.
//!
//! A single top-down traversal that gives every node its parent back-link
//! and fills the identifier maps of the scope-bearing nodes:
//! - the translation unit maps every top-level declaration (built-ins are
//!   injected first);
//! - a compound statement maps the variables its direct `DeclStmt`
//!   children declare, plus the parameters of the enclosing function when
//!   the compound is a function body.
//!
//! Declaring the same name twice in one scope is fatal. Shadowing across
//! scopes is legal; the resolver's predecessor rule sorts out which
//! declaration a reference sees.

use log::debug;

use crate::ast::{Ast, AstId, NodeKind};
use crate::diagnostic::SemanticError;
use crate::semantic::builtins;

/// Link the whole tree starting at the arena root.
pub fn link(ast: &mut Ast) -> Result<(), SemanticError> {
    let Some(root) = ast.root() else {
        return Ok(());
    };
    builtins::install(ast, root);
    walk(ast, root)
}

fn walk(ast: &mut Ast, id: AstId) -> Result<(), SemanticError> {
    let children = ast.children(id);
    for &child in &children {
        ast.get_node(child).set_parent(id);
    }

    populate_scope(ast, id)?;

    for child in children {
        walk(ast, child)?;
    }
    Ok(())
}

fn populate_scope(ast: &mut Ast, id: AstId) -> Result<(), SemanticError> {
    match ast.get_kind(id) {
        NodeKind::TranslationUnit(tu) => {
            let decls = tu.decls.clone();
            for decl in decls {
                insert(ast, id, decl)?;
            }
        }
        NodeKind::CompoundStmt(cs) => {
            let stmts = cs.stmts.clone();

            // A function body also scopes the function's parameters.
            if let Some(parent) = ast.get_node(id).parent() {
                if let NodeKind::FunctionDecl(fd) = ast.get_kind(parent) {
                    if fd.body == Some(id) {
                        for param in fd.params.clone() {
                            insert(ast, id, param)?;
                        }
                    }
                }
            }

            for stmt in stmts {
                if let NodeKind::DeclStmt(decls) = ast.get_kind(stmt) {
                    for decl in decls.clone() {
                        insert(ast, id, decl)?;
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn insert(ast: &mut Ast, scope: AstId, decl: AstId) -> Result<(), SemanticError> {
    let name = ast.decl_name(decl);
    debug!("scope {}: declaring '{}'", scope.get(), name);
    if ast.scope_insert(scope, name, decl).is_some() {
        return Err(SemanticError::Redefinition {
            name,
            range: ast.get_node(decl).range,
        });
    }
    Ok(())
}
