//! AST node kinds and their payloads.
//!
//! Every variant stores child links as [`AstId`] handles into the arena.
//! Scope-bearing nodes (translation unit, compound statement) additionally
//! carry the identifier map the scope walker populates. References carry a
//! `Cell` for the declaration the resolver binds them to.

use std::cell::Cell;

use hashbrown::HashMap;
use thin_vec::ThinVec;

use crate::ast::{AstId, Symbol};
use crate::source_manager::TokenId;

/// Per-scope identifier map: declared name to declaring node.
pub type IdentMap = HashMap<Symbol, AstId>;

#[derive(Debug, Clone)]
pub enum NodeKind {
    TranslationUnit(TranslationUnitData),

    // Declarations
    VarDecl(VarDeclData),
    ParamVarDecl(ParamVarDeclData),
    FunctionDecl(FunctionDeclData),

    // Statements
    CompoundStmt(CompoundStmtData),
    DeclStmt(ThinVec<AstId>),
    NullStmt,
    If(IfStmtData),
    While(WhileStmtData),
    Continue,
    Break,
    Return(Option<AstId>),

    // Expressions
    IntegerLiteral(i32),
    ParenExpr(AstId),
    DeclRefExpr(DeclRefData),
    CallExpr(CallData),
    BinaryOp(BinaryOpKind, AstId, AstId),
    UnaryOp(UnaryOpKind, AstId),
    InitListExpr(InitListData),
}

#[derive(Debug, Clone, Default)]
pub struct TranslationUnitData {
    /// User declarations in source order.
    pub decls: Vec<AstId>,
    /// Injected runtime declarations, in registration order.
    pub builtins: Vec<AstId>,
    pub scope: IdentMap,
}

#[derive(Debug, Clone)]
pub struct VarDeclData {
    pub name: Symbol,
    pub ident: TokenId,
    /// One compile-time-constant expression per declared dimension.
    pub dims: ThinVec<AstId>,
    pub is_const: bool,
    /// Scalar expression, or an `InitListExpr` for arrays. Rewritten in
    /// place by the initializer normalizer.
    pub init: Option<AstId>,
}

impl VarDeclData {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ParamVarDeclData {
    pub name: Symbol,
    /// `None` for parameters of injected built-ins.
    pub ident: Option<TokenId>,
    pub is_pointer: bool,
    /// Trailing fixed dimensions of an array pointer; the leading
    /// dimension is implicit.
    pub dims: ThinVec<AstId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetType {
    Void,
    Int,
}

#[derive(Debug, Clone)]
pub struct FunctionDeclData {
    pub name: Symbol,
    /// `None` for injected built-ins, which precede every user token.
    pub ident: Option<TokenId>,
    pub ret_type: RetType,
    pub params: ThinVec<AstId>,
    /// A `CompoundStmt`; absent for declarations without a definition.
    pub body: Option<AstId>,
}

impl FunctionDeclData {
    pub fn is_builtin(&self) -> bool {
        self.ident.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompoundStmtData {
    pub stmts: Vec<AstId>,
    pub scope: IdentMap,
}

#[derive(Debug, Clone)]
pub struct IfStmtData {
    pub cond: AstId,
    pub then_stmt: AstId,
    pub else_stmt: Option<AstId>,
}

#[derive(Debug, Clone)]
pub struct WhileStmtData {
    pub cond: AstId,
    pub body: AstId,
}

#[derive(Debug, Clone)]
pub struct DeclRefData {
    pub name: Symbol,
    pub ident: TokenId,
    /// Dimension index expressions, outermost first.
    pub indices: ThinVec<AstId>,
    pub resolved: Cell<Option<AstId>>,
}

#[derive(Debug, Clone)]
pub struct CallData {
    pub name: Symbol,
    pub ident: TokenId,
    pub args: ThinVec<AstId>,
    pub resolved: Cell<Option<AstId>>,
}

#[derive(Debug, Clone)]
pub struct InitListData {
    pub elems: ThinVec<AstId>,
    /// Declared shape this list covers; filled in by the normalizer.
    pub shape: ThinVec<i32>,
    /// A filler list stands for an all-zero sub-array and has no elements.
    pub is_filler: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    LogicOr,
    LogicAnd,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    Assign,
}

impl BinaryOpKind {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOpKind::LogicOr | BinaryOpKind::LogicAnd)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOpKind::Eq
                | BinaryOpKind::Ne
                | BinaryOpKind::Lt
                | BinaryOpKind::Le
                | BinaryOpKind::Gt
                | BinaryOpKind::Ge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Plus,
    Minus,
    Not,
}

impl NodeKind {
    pub fn decl_ref(name: Symbol, ident: TokenId, indices: ThinVec<AstId>) -> Self {
        NodeKind::DeclRefExpr(DeclRefData {
            name,
            ident,
            indices,
            resolved: Cell::new(None),
        })
    }

    pub fn call(name: Symbol, ident: TokenId, args: ThinVec<AstId>) -> Self {
        NodeKind::CallExpr(CallData {
            name,
            ident,
            args,
            resolved: Cell::new(None),
        })
    }

    pub fn init_list(elems: ThinVec<AstId>) -> Self {
        NodeKind::InitListExpr(InitListData {
            elems,
            shape: ThinVec::new(),
            is_filler: false,
        })
    }

    /// True for the node kinds that own an identifier map.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::TranslationUnit(_) | NodeKind::CompoundStmt(_)
        )
    }
}
