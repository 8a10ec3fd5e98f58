//! Flattened AST arena for SysY.
//!
//! All nodes live in one contiguous table owned by [`Ast`]; an [`AstId`] is
//! a node's 1-based index. The table only ever grows, so every handed-out
//! id stays live for the life of the arena. The parser creates the nodes;
//! the semantic phases afterwards only touch non-topological state: parent
//! back-links, resolved references, constant values, and initializer
//! rewrites.

use std::cell::Cell;
use std::num::NonZeroU32;

pub use crate::source_manager::Symbol;
use crate::source_manager::SourceRange;

pub mod nodes;
pub use nodes::*;

/// 1-based index of a node in the arena.
pub type AstId = NonZeroU32;

/// One AST node: its kind, the source range it spans, and the annotations
/// later passes fill in. Parent link and constant value use interior
/// mutability so the annotating passes can share the arena immutably.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub range: SourceRange,
    parent: Cell<Option<AstId>>,
    value: Cell<Option<i32>>,
}

impl Node {
    pub fn new(kind: NodeKind, range: SourceRange) -> Self {
        Node {
            kind,
            range,
            parent: Cell::new(None),
            value: Cell::new(None),
        }
    }

    pub fn parent(&self) -> Option<AstId> {
        self.parent.get()
    }

    pub fn set_parent(&self, parent: AstId) {
        self.parent.set(Some(parent));
    }

    /// Whether the constant evaluator proved this expression compile-time
    /// constant.
    pub fn is_const(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn const_value(&self) -> Option<i32> {
        self.value.get()
    }

    pub fn set_const_value(&self, value: i32) {
        self.value.set(Some(value));
    }
}

/// The arena. Append-only; nodes are addressed by [`AstId`].
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<AstId>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn push_node(&mut self, node: Node) -> AstId {
        self.nodes.push(node);
        AstId::new(self.nodes.len() as u32).expect("ast arena overflow")
    }

    pub fn get_node(&self, id: AstId) -> &Node {
        &self.nodes[(id.get() - 1) as usize]
    }

    pub fn get_node_mut(&mut self, id: AstId) -> &mut Node {
        &mut self.nodes[(id.get() - 1) as usize]
    }

    pub fn get_kind(&self, id: AstId) -> &NodeKind {
        &self.get_node(id).kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_root(&mut self, root: AstId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<AstId> {
        self.root
    }

    /// All ids currently in the arena, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = AstId> + '_ {
        (1..=self.nodes.len() as u32).map(|i| AstId::new(i).unwrap())
    }

    /// Direct children of a node, in syntactic order.
    pub fn children(&self, id: AstId) -> Vec<AstId> {
        match self.get_kind(id) {
            NodeKind::TranslationUnit(tu) => {
                let mut out = tu.builtins.clone();
                out.extend(tu.decls.iter().copied());
                out
            }
            NodeKind::VarDecl(vd) => {
                let mut out: Vec<AstId> = vd.dims.to_vec();
                out.extend(vd.init);
                out
            }
            NodeKind::ParamVarDecl(pd) => pd.dims.to_vec(),
            NodeKind::FunctionDecl(fd) => {
                let mut out: Vec<AstId> = fd.params.to_vec();
                out.extend(fd.body);
                out
            }
            NodeKind::CompoundStmt(cs) => cs.stmts.clone(),
            NodeKind::DeclStmt(decls) => decls.to_vec(),
            NodeKind::If(s) => {
                let mut out = vec![s.cond, s.then_stmt];
                out.extend(s.else_stmt);
                out
            }
            NodeKind::While(s) => vec![s.cond, s.body],
            NodeKind::Return(expr) => expr.iter().copied().collect(),
            NodeKind::ParenExpr(sub) => vec![*sub],
            NodeKind::DeclRefExpr(r) => r.indices.to_vec(),
            NodeKind::CallExpr(c) => c.args.to_vec(),
            NodeKind::BinaryOp(_, lhs, rhs) => vec![*lhs, *rhs],
            NodeKind::UnaryOp(_, sub) => vec![*sub],
            NodeKind::InitListExpr(list) => list.elems.to_vec(),
            NodeKind::NullStmt
            | NodeKind::Continue
            | NodeKind::Break
            | NodeKind::IntegerLiteral(_) => Vec::new(),
        }
    }

    /// The identifier map of a scope-bearing node, if it is one.
    pub fn scope_map(&self, id: AstId) -> Option<&IdentMap> {
        match self.get_kind(id) {
            NodeKind::TranslationUnit(tu) => Some(&tu.scope),
            NodeKind::CompoundStmt(cs) => Some(&cs.scope),
            _ => None,
        }
    }

    /// Insert a declaration into a scope's identifier map; returns the
    /// previous occupant on a duplicate.
    pub fn scope_insert(&mut self, scope: AstId, name: Symbol, decl: AstId) -> Option<AstId> {
        match &mut self.get_node_mut(scope).kind {
            NodeKind::TranslationUnit(tu) => tu.scope.insert(name, decl),
            NodeKind::CompoundStmt(cs) => cs.scope.insert(name, decl),
            _ => unreachable!("scope_insert on a non-scope node"),
        }
    }

    /// Name of a declaration node.
    pub fn decl_name(&self, id: AstId) -> Symbol {
        match self.get_kind(id) {
            NodeKind::VarDecl(vd) => vd.name,
            NodeKind::ParamVarDecl(pd) => pd.name,
            NodeKind::FunctionDecl(fd) => fd.name,
            _ => unreachable!("decl_name on a non-declaration node"),
        }
    }

    /// Position of a declaration's declaring token in the token table.
    /// Injected built-ins report 0, ordering before every user token.
    pub fn decl_token_index(&self, id: AstId) -> u32 {
        match self.get_kind(id) {
            NodeKind::VarDecl(vd) => vd.ident.get(),
            NodeKind::ParamVarDecl(pd) => pd.ident.map_or(0, |t| t.get()),
            NodeKind::FunctionDecl(fd) => fd.ident.map_or(0, |t| t.get()),
            _ => unreachable!("decl_token_index on a non-declaration node"),
        }
    }
}
