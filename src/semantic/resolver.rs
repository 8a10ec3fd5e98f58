//! Name resolution and constant annotation.
//!
//! One bottom-up traversal over the linked AST does three things per the
//! declaration-before-use semantics of SysY:
//! - binds every `DeclRefExpr` and `CallExpr` to a declaration by walking
//!   the chain of enclosing scopes, accepting a hit only if its declaring
//!   token precedes the reference's token;
//! - computes `(is_const, value)` for every compile-time-constant
//!   expression;
//! - checks and normalizes array declarations: dimensions must be positive
//!   constants, `const` and global initializers must be fully constant,
//!   and array initializers are rewritten to match the declared shape.
//!
//! The predecessor rule makes `int a = 7; { int b = a; int a = 1; }` bind
//! the inner `a` reference to the outer declaration: the inner `a`'s
//! declaring token does not precede the reference.

use log::debug;

use crate::ast::{Ast, AstId, BinaryOpKind, NodeKind, Symbol, VarDeclData};
use crate::diagnostic::SemanticError;
use crate::semantic::{const_eval, initializer};
use crate::source_manager::{SourceManager, TokenId};

pub fn run(ast: &mut Ast, src: &SourceManager) -> Result<(), SemanticError> {
    let Some(root) = ast.root() else {
        return Ok(());
    };
    let mut resolver = Resolver { ast, src };
    resolver.visit(root)
}

struct Resolver<'a> {
    ast: &'a mut Ast,
    src: &'a SourceManager,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, id: AstId) -> Result<(), SemanticError> {
        match self.ast.get_kind(id) {
            NodeKind::TranslationUnit(tu) => {
                let decls = tu.decls.clone();
                for decl in decls {
                    self.visit(decl)?;
                }
            }
            NodeKind::VarDecl(_) => self.visit_var_decl(id)?,
            NodeKind::ParamVarDecl(pd) => {
                let dims = pd.dims.to_vec();
                for dim in dims {
                    self.visit(dim)?;
                    self.check_dimension(dim)?;
                }
            }
            NodeKind::FunctionDecl(fd) => {
                let params = fd.params.to_vec();
                let body = fd.body;
                for param in params {
                    self.visit(param)?;
                }
                if let Some(body) = body {
                    self.visit(body)?;
                }
            }
            NodeKind::CompoundStmt(cs) => {
                let stmts = cs.stmts.clone();
                for stmt in stmts {
                    self.visit(stmt)?;
                }
            }
            NodeKind::DeclStmt(decls) => {
                let decls = decls.to_vec();
                for decl in decls {
                    self.visit(decl)?;
                }
            }
            NodeKind::If(s) => {
                let (cond, then_stmt, else_stmt) = (s.cond, s.then_stmt, s.else_stmt);
                self.visit(cond)?;
                self.visit(then_stmt)?;
                if let Some(else_stmt) = else_stmt {
                    self.visit(else_stmt)?;
                }
            }
            NodeKind::While(s) => {
                let (cond, body) = (s.cond, s.body);
                self.visit(cond)?;
                self.visit(body)?;
            }
            NodeKind::Return(expr) => {
                if let Some(expr) = *expr {
                    self.visit(expr)?;
                }
            }
            NodeKind::NullStmt | NodeKind::Continue | NodeKind::Break => {}

            NodeKind::IntegerLiteral(value) => {
                let value = *value;
                self.ast.get_node(id).set_const_value(value);
            }
            NodeKind::ParenExpr(sub) => {
                let sub = *sub;
                self.visit(sub)?;
                if let Some(value) = self.ast.get_node(sub).const_value() {
                    self.ast.get_node(id).set_const_value(value);
                }
            }
            NodeKind::UnaryOp(op, sub) => {
                let (op, sub) = (*op, *sub);
                self.visit(sub)?;
                if let Some(value) = self.ast.get_node(sub).const_value() {
                    self.ast
                        .get_node(id)
                        .set_const_value(const_eval::eval_unary(op, value));
                }
            }
            NodeKind::BinaryOp(op, lhs, rhs) => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                self.visit(lhs)?;
                self.visit(rhs)?;
                if op != BinaryOpKind::Assign {
                    let lv = self.ast.get_node(lhs).const_value();
                    let rv = self.ast.get_node(rhs).const_value();
                    if let (Some(lv), Some(rv)) = (lv, rv) {
                        match const_eval::eval_binary(op, lv, rv) {
                            Some(value) => self.ast.get_node(id).set_const_value(value),
                            None => {
                                return Err(SemanticError::DivisionByZero {
                                    range: self.ast.get_node(id).range,
                                });
                            }
                        }
                    }
                }
            }
            NodeKind::DeclRefExpr(data) => {
                let (name, ident, indices) = (data.name, data.ident, data.indices.to_vec());
                for &index in &indices {
                    self.visit(index)?;
                }
                let decl = self.resolve(id, name, ident)?;
                if let NodeKind::DeclRefExpr(data) = self.ast.get_kind(id) {
                    data.resolved.set(Some(decl));
                }
                self.annotate_const_ref(id, decl, &indices);
            }
            NodeKind::CallExpr(data) => {
                let (name, ident, args) = (data.name, data.ident, data.args.to_vec());
                for arg in args {
                    self.visit(arg)?;
                }
                let decl = self.resolve(id, name, ident)?;
                if let NodeKind::CallExpr(data) = self.ast.get_kind(id) {
                    data.resolved.set(Some(decl));
                }
            }
            NodeKind::InitListExpr(list) => {
                let elems = list.elems.to_vec();
                for elem in elems {
                    self.visit(elem)?;
                }
            }
        }
        Ok(())
    }

    fn visit_var_decl(&mut self, id: AstId) -> Result<(), SemanticError> {
        let NodeKind::VarDecl(data) = self.ast.get_kind(id) else {
            unreachable!("visit_var_decl on a non-variable node");
        };
        let VarDeclData {
            dims,
            is_const,
            init,
            ..
        } = data.clone();

        let mut shape = Vec::with_capacity(dims.len());
        for &dim in &dims {
            self.visit(dim)?;
            shape.push(self.check_dimension(dim)?);
        }

        if let Some(init) = init {
            self.visit(init)?;
        }

        let is_global = self
            .ast
            .get_node(id)
            .parent()
            .is_some_and(|p| matches!(self.ast.get_kind(p), NodeKind::TranslationUnit(_)));

        if is_const || is_global {
            match init {
                Some(init) => self.check_const_init(init)?,
                None if is_const => {
                    return Err(SemanticError::NonConstantContext {
                        range: self.ast.get_node(id).range,
                    });
                }
                None => {}
            }
        }

        if !dims.is_empty() {
            if let Some(init) = init {
                let root = initializer::normalize(self.ast, init, &shape);
                self.ast.get_node(root).set_parent(id);
                if let NodeKind::VarDecl(data) = &mut self.ast.get_node_mut(id).kind {
                    data.init = Some(root);
                }
            }
        }
        Ok(())
    }

    /// A declared dimension must be a positive compile-time constant.
    fn check_dimension(&self, dim: AstId) -> Result<i32, SemanticError> {
        let node = self.ast.get_node(dim);
        let value = node.const_value().ok_or(SemanticError::NonConstantContext {
            range: node.range,
        })?;
        if value <= 0 {
            return Err(SemanticError::InvalidArrayDimension {
                value,
                range: node.range,
            });
        }
        Ok(value)
    }

    /// Every leaf of a `const` or global initializer must be constant.
    fn check_const_init(&self, init: AstId) -> Result<(), SemanticError> {
        match self.ast.get_kind(init) {
            NodeKind::InitListExpr(list) => {
                for &elem in &list.elems {
                    self.check_const_init(elem)?;
                }
                Ok(())
            }
            _ => {
                let node = self.ast.get_node(init);
                if node.is_const() {
                    Ok(())
                } else {
                    Err(SemanticError::NonConstantContext { range: node.range })
                }
            }
        }
    }

    /// Walk the enclosing scope chain; accept the first declaration whose
    /// declaring token strictly precedes the reference's token.
    fn resolve(
        &self,
        from: AstId,
        name: Symbol,
        ident: TokenId,
    ) -> Result<AstId, SemanticError> {
        let mut cursor = self.ast.get_node(from).parent();
        while let Some(scope) = cursor {
            if let Some(map) = self.ast.scope_map(scope) {
                if let Some(&decl) = map.get(&name) {
                    if self.ast.decl_token_index(decl) < ident.get() {
                        debug!("'{}' resolved in scope {}", name, scope.get());
                        return Ok(decl);
                    }
                }
            }
            cursor = self.ast.get_node(scope).parent();
        }
        Err(SemanticError::UnresolvedIdentifier {
            name,
            range: self.src.token_range(ident),
        })
    }

    /// A reference is constant iff it fully indexes a `const` variable
    /// with constant indices; its value comes out of the normalized
    /// initializer.
    fn annotate_const_ref(&self, id: AstId, decl: AstId, indices: &[AstId]) {
        let NodeKind::VarDecl(vd) = self.ast.get_kind(decl) else {
            return;
        };
        if !vd.is_const || indices.len() != vd.dims.len() {
            return;
        }
        let Some(init) = vd.init else {
            return;
        };

        let mut index_values = Vec::with_capacity(indices.len());
        for (&index, &dim) in indices.iter().zip(vd.dims.iter()) {
            let Some(value) = self.ast.get_node(index).const_value() else {
                return;
            };
            let extent = self
                .ast
                .get_node(dim)
                .const_value()
                .expect("unchecked dimension on a resolved declaration");
            if value < 0 || value >= extent {
                return;
            }
            index_values.push(value);
        }

        let value = const_eval::const_ref_value(self.ast, init, &index_values);
        self.ast.get_node(id).set_const_value(value);
    }
}
