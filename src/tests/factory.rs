//! Test-only stand-in for the parser.
//!
//! Builds the token table and the arena programmatically. Tokens are
//! appended in call order, so building a program in source order gives
//! the same token ordering a real parse would. Declarations that must
//! precede their own initializer or body in token order (recursion,
//! self-reference) take a pre-allocated token via the `*_at` variants.

use crate::ast::{
    Ast, AstId, BinaryOpKind, CompoundStmtData, FunctionDeclData, IfStmtData, Node, NodeKind,
    ParamVarDeclData, RetType, Symbol, TranslationUnitData, UnaryOpKind, VarDeclData,
    WhileStmtData,
};
use crate::compiler;
use crate::diagnostic::{CompileError, SemanticError};
use crate::ir;
use crate::semantic;
use crate::source_manager::{SourceManager, SourceRange, TokenId};

pub struct AstFactory {
    pub src: SourceManager,
    pub ast: Ast,
    line: u32,
    col: u32,
}

impl AstFactory {
    pub fn new() -> Self {
        AstFactory {
            src: SourceManager::new("test.sy"),
            ast: Ast::new(),
            line: 1,
            col: 1,
        }
    }

    fn next_range(&mut self, len: u32) -> SourceRange {
        let range = SourceRange::new(self.line, self.col, self.line, self.col + len - 1);
        self.col += len + 1;
        if self.col > 72 {
            self.line += 1;
            self.col = 1;
        }
        range
    }

    pub fn tok(&mut self, text: &str) -> TokenId {
        let range = self.next_range(text.len().max(1) as u32);
        self.src.add_token(text, range)
    }

    /// Pre-allocate a declaring token, for declarations whose initializer
    /// or body must come later in token order.
    pub fn declare(&mut self, name: &str) -> TokenId {
        self.tok(name)
    }

    fn push(&mut self, kind: NodeKind) -> AstId {
        let range = self.next_range(1);
        self.ast.push_node(Node::new(kind, range))
    }

    // --- expressions ---

    pub fn int(&mut self, value: i32) -> AstId {
        self.tok(&value.to_string());
        self.push(NodeKind::IntegerLiteral(value))
    }

    pub fn paren(&mut self, sub: AstId) -> AstId {
        self.push(NodeKind::ParenExpr(sub))
    }

    pub fn bin(&mut self, op: BinaryOpKind, lhs: AstId, rhs: AstId) -> AstId {
        self.push(NodeKind::BinaryOp(op, lhs, rhs))
    }

    pub fn un(&mut self, op: UnaryOpKind, sub: AstId) -> AstId {
        self.push(NodeKind::UnaryOp(op, sub))
    }

    pub fn assign(&mut self, lhs: AstId, rhs: AstId) -> AstId {
        self.bin(BinaryOpKind::Assign, lhs, rhs)
    }

    pub fn var_ref(&mut self, name: &str) -> AstId {
        self.index_ref(name, vec![])
    }

    pub fn index_ref(&mut self, name: &str, indices: Vec<AstId>) -> AstId {
        let ident = self.tok(name);
        self.push(NodeKind::decl_ref(
            Symbol::from(name),
            ident,
            indices.into_iter().collect(),
        ))
    }

    pub fn call(&mut self, name: &str, args: Vec<AstId>) -> AstId {
        let ident = self.tok(name);
        self.push(NodeKind::call(
            Symbol::from(name),
            ident,
            args.into_iter().collect(),
        ))
    }

    pub fn init_list(&mut self, elems: Vec<AstId>) -> AstId {
        self.push(NodeKind::init_list(elems.into_iter().collect()))
    }

    // --- declarations ---

    pub fn var_decl(
        &mut self,
        name: &str,
        dims: Vec<AstId>,
        init: Option<AstId>,
        is_const: bool,
    ) -> AstId {
        let ident = self.declare(name);
        self.var_decl_at(ident, name, dims, init, is_const)
    }

    pub fn var_decl_at(
        &mut self,
        ident: TokenId,
        name: &str,
        dims: Vec<AstId>,
        init: Option<AstId>,
        is_const: bool,
    ) -> AstId {
        self.push(NodeKind::VarDecl(VarDeclData {
            name: Symbol::from(name),
            ident,
            dims: dims.into_iter().collect(),
            is_const,
            init,
        }))
    }

    pub fn param(&mut self, name: &str, is_pointer: bool, dims: Vec<AstId>) -> AstId {
        let ident = self.tok(name);
        self.push(NodeKind::ParamVarDecl(ParamVarDeclData {
            name: Symbol::from(name),
            ident: Some(ident),
            is_pointer,
            dims: dims.into_iter().collect(),
        }))
    }

    pub fn function(
        &mut self,
        name: &str,
        ret_type: RetType,
        params: Vec<AstId>,
        body: Option<AstId>,
    ) -> AstId {
        let ident = self.declare(name);
        self.function_at(ident, name, ret_type, params, body)
    }

    pub fn function_at(
        &mut self,
        ident: TokenId,
        name: &str,
        ret_type: RetType,
        params: Vec<AstId>,
        body: Option<AstId>,
    ) -> AstId {
        self.push(NodeKind::FunctionDecl(FunctionDeclData {
            name: Symbol::from(name),
            ident: Some(ident),
            ret_type,
            params: params.into_iter().collect(),
            body,
        }))
    }

    // --- statements ---

    pub fn compound(&mut self, stmts: Vec<AstId>) -> AstId {
        self.push(NodeKind::CompoundStmt(CompoundStmtData {
            stmts,
            scope: Default::default(),
        }))
    }

    pub fn decl_stmt(&mut self, decls: Vec<AstId>) -> AstId {
        self.push(NodeKind::DeclStmt(decls.into_iter().collect()))
    }

    pub fn if_stmt(&mut self, cond: AstId, then_stmt: AstId, else_stmt: Option<AstId>) -> AstId {
        self.push(NodeKind::If(IfStmtData {
            cond,
            then_stmt,
            else_stmt,
        }))
    }

    pub fn while_stmt(&mut self, cond: AstId, body: AstId) -> AstId {
        self.push(NodeKind::While(WhileStmtData { cond, body }))
    }

    pub fn ret(&mut self, expr: Option<AstId>) -> AstId {
        self.push(NodeKind::Return(expr))
    }

    pub fn brk(&mut self) -> AstId {
        self.push(NodeKind::Break)
    }

    pub fn cont(&mut self) -> AstId {
        self.push(NodeKind::Continue)
    }

    pub fn null_stmt(&mut self) -> AstId {
        self.push(NodeKind::NullStmt)
    }

    // --- unit & pipeline ---

    pub fn unit(&mut self, decls: Vec<AstId>) -> AstId {
        let root = self.push(NodeKind::TranslationUnit(TranslationUnitData {
            decls,
            builtins: Vec::new(),
            scope: Default::default(),
        }));
        self.ast.set_root(root);
        root
    }

    pub fn analyze(&mut self) -> Result<(), SemanticError> {
        semantic::analyze(&mut self.ast, &self.src)
    }

    pub fn compile(&mut self) -> Result<ir::Module, CompileError> {
        compiler::compile(&self.src, &mut self.ast)
    }
}

/// A `main`-only program around the given body statements.
pub fn main_program(f: &mut AstFactory, stmts: Vec<AstId>) -> AstId {
    let body = f.compound(stmts);
    let main = f.function("main", RetType::Int, vec![], Some(body));
    f.unit(vec![main])
}

pub fn get_func<'m>(module: &'m ir::Module, name: &str) -> &'m ir::FuncDef {
    module
        .get_func(name)
        .unwrap_or_else(|| panic!("no function definition named @{name}"))
}

pub fn block(func: &ir::FuncDef, index: usize) -> &ir::BasicBlock {
    &func.blocks[index]
}
