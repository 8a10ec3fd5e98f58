//! Linear IR: the target of AST lowering and the input of the machine
//! backend.
//!
//! A [`Module`] owns global variable definitions, external function
//! declarations, and function definitions. Each [`FuncDef`] owns its basic
//! blocks by value; a [`BlockId`] is an index into that function's block
//! list, with the entry block first. Blocks keep explicit predecessor and
//! successor lists that mirror their terminators.

use crate::source_manager::Symbol;

pub mod dumper;
pub mod inst;
pub mod types;
pub mod validation;
pub mod value;

pub use inst::{BinOpKind, IcmpKind, Inst};
pub use types::{Type, Width};
pub use value::Value;

/// Index of a basic block within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct BasicBlock {
    pub label: Symbol,
    pub insts: Vec<Inst>,
    pub preds: Vec<BlockId>,
    pub succs: Vec<BlockId>,
}

impl BasicBlock {
    pub fn new(label: Symbol) -> Self {
        BasicBlock {
            label,
            insts: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<&Inst> {
        self.insts.last()
    }

    /// Whether the block already ends in a terminator.
    pub fn is_terminated(&self) -> bool {
        self.last().is_some_and(Inst::is_terminator)
    }
}

/// A function with a body.
#[derive(Debug)]
pub struct FuncDef {
    pub name: Symbol,
    /// The function's `Func` type.
    pub ty: Type,
    /// Incoming parameter temps, numbered from zero.
    pub params: Vec<Value>,
    /// Entry block first.
    pub blocks: Vec<BasicBlock>,
}

impl FuncDef {
    pub fn new(name: Symbol, ty: Type, params: Vec<Value>) -> Self {
        FuncDef {
            name,
            ty,
            params,
            blocks: Vec::new(),
        }
    }

    pub fn add_block(&mut self, label: Symbol) -> BlockId {
        self.blocks.push(BasicBlock::new(label));
        BlockId(self.blocks.len() as u32 - 1)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn push_inst(&mut self, block: BlockId, inst: Inst) {
        self.block_mut(block).insts.push(inst);
    }

    /// Record a control-flow edge. Kept in sync with terminator creation
    /// and patching by the lowering engine.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.block_mut(from).succs.push(to);
        self.block_mut(to).preds.push(from);
    }

    /// Patch the true target of the pending branch ending `block`.
    pub fn patch_true_target(&mut self, block: BlockId, target: BlockId) {
        let inst = self
            .block_mut(block)
            .insts
            .last_mut()
            .expect("patching an empty block");
        inst.set_true_target(target);
        self.add_edge(block, target);
    }

    /// Patch the false target of the pending branch ending `block`.
    pub fn patch_false_target(&mut self, block: BlockId, target: BlockId) {
        let inst = self
            .block_mut(block)
            .insts
            .last_mut()
            .expect("patching an empty block");
        inst.set_false_target(target);
        self.add_edge(block, target);
    }

    pub fn entry(&self) -> &BasicBlock {
        &self.blocks[0]
    }

    pub fn ret_type(&self) -> &Type {
        self.ty.ret().expect("function value without function type")
    }
}

/// An external function declaration.
#[derive(Debug)]
pub struct FuncDecl {
    pub name: Symbol,
    pub ty: Type,
}

/// A global variable definition with its flattened initial words.
#[derive(Debug)]
pub struct GlobalVarDef {
    pub name: Symbol,
    pub ty: Type,
    pub is_const: bool,
    /// Row-major initial words; empty when `is_zero_init`.
    pub init: Vec<i32>,
    pub is_zero_init: bool,
}

#[derive(Debug, Default)]
pub struct Module {
    pub globals: Vec<GlobalVarDef>,
    pub func_decls: Vec<FuncDecl>,
    pub func_defs: Vec<FuncDef>,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    pub fn add_global(&mut self, global: GlobalVarDef) {
        self.globals.push(global);
    }

    pub fn add_func_decl(&mut self, decl: FuncDecl) {
        self.func_decls.push(decl);
    }

    pub fn add_func_def(&mut self, def: FuncDef) {
        self.func_defs.push(def);
    }

    pub fn get_func(&self, name: &str) -> Option<&FuncDef> {
        self.func_defs.iter().find(|f| f.name.as_str() == name)
    }

    pub fn get_global(&self, name: &str) -> Option<&GlobalVarDef> {
        self.globals.iter().find(|g| g.name.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_links_both_directions() {
        let mut f = FuncDef::new(
            Symbol::from("f"),
            Type::func(Type::Void, vec![]),
            vec![],
        );
        let a = f.add_block(Symbol::from("entry"));
        let b = f.add_block(Symbol::from("1"));
        f.add_edge(a, b);
        assert_eq!(f.block(a).succs, vec![b]);
        assert_eq!(f.block(b).preds, vec![a]);
    }

    #[test]
    fn patching_resolves_pending_branch() {
        let mut f = FuncDef::new(
            Symbol::from("f"),
            Type::func(Type::Void, vec![]),
            vec![],
        );
        let a = f.add_block(Symbol::from("entry"));
        let t = f.add_block(Symbol::from("1"));
        let e = f.add_block(Symbol::from("2"));
        let cond = Value::temp(0, Type::I1);
        f.push_inst(a, Inst::cond_br_pending(cond).unwrap());
        f.patch_true_target(a, t);
        f.patch_false_target(a, e);
        match f.block(a).last().unwrap() {
            Inst::CondBr {
                if_true, if_false, ..
            } => {
                assert_eq!(*if_true, Some(t));
                assert_eq!(*if_false, Some(e));
            }
            other => panic!("expected cond br, got {other:?}"),
        }
        assert_eq!(f.block(a).succs, vec![t, e]);
    }
}
