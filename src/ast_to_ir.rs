//! AST to IR lowering.
//!
//! Consumes the resolved, annotated AST and produces an [`ir::Module`].
//! Translation follows the source shape directly: one pass over the
//! top-level declarations, a fresh temp counter per function, and four
//! strictly nested stacks for the control-flow constructs (`break` and
//! `continue` targets for loops, true/false sinks for the short-circuit
//! condition protocol). Temps and block labels share the per-function
//! counter, so the emitted numbering matches what an LLVM-style printer
//! expects.

mod cond;
mod expr;
mod stmt;

use hashbrown::HashMap;
use log::debug;

use crate::ast::{
    Ast, AstId, FunctionDeclData, NodeKind, ParamVarDeclData, RetType, Symbol, VarDeclData,
};
use crate::diagnostic::{CompileError, IrError};
use crate::ir::{BlockId, FuncDecl, FuncDef, GlobalVarDef, Inst, Module, Type, Value};
use crate::semantic::initializer;

pub struct AstToIrLowerer<'a> {
    ast: &'a Ast,
    module: Module,
    /// Storage (or function) value for every bound declaration.
    node_map: HashMap<AstId, Value>,
    /// Per-function counter shared by temps and block labels.
    tmp_id: u32,
    break_stack: Vec<Vec<BlockId>>,
    continue_stack: Vec<Vec<BlockId>>,
    true_stack: Vec<Vec<BlockId>>,
    false_stack: Vec<Vec<BlockId>>,
}

impl<'a> AstToIrLowerer<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        AstToIrLowerer {
            ast,
            module: Module::new(),
            node_map: HashMap::new(),
            tmp_id: 0,
            break_stack: Vec::new(),
            continue_stack: Vec::new(),
            true_stack: Vec::new(),
            false_stack: Vec::new(),
        }
    }

    /// Lower the whole translation unit.
    pub fn run(mut self) -> Result<Module, CompileError> {
        let root = self
            .ast
            .root()
            .ok_or_else(|| IrError::Malformed("lowering without a translation unit".into()))?;
        let NodeKind::TranslationUnit(tu) = self.ast.get_kind(root) else {
            return Err(IrError::Malformed("root is not a translation unit".into()).into());
        };

        for &builtin in &tu.builtins {
            self.lower_function(builtin)?;
        }
        for &decl in &tu.decls {
            match self.ast.get_kind(decl) {
                NodeKind::VarDecl(_) => self.lower_global_var(decl)?,
                NodeKind::FunctionDecl(_) => self.lower_function(decl)?,
                _ => {
                    return Err(
                        IrError::Malformed("unexpected top-level declaration".into()).into()
                    );
                }
            }
        }
        Ok(self.module)
    }

    fn fresh_temp(&mut self, ty: Type) -> Value {
        let id = self.tmp_id;
        self.tmp_id += 1;
        Value::temp(id, ty)
    }

    fn fresh_label(&mut self) -> Symbol {
        let id = self.tmp_id;
        self.tmp_id += 1;
        Symbol::from(id.to_string().as_str())
    }

    /// The declared IR type of a variable.
    fn var_type(&self, data: &VarDeclData) -> Result<Type, CompileError> {
        if data.is_array() {
            Ok(Type::array(self.dim_values(&data.dims)?))
        } else {
            Ok(Type::I32)
        }
    }

    fn dim_values(&self, dims: &[AstId]) -> Result<Vec<i32>, CompileError> {
        dims.iter()
            .map(|&dim| {
                self.ast.get_node(dim).const_value().ok_or_else(|| {
                    IrError::Malformed("non-constant array dimension after analysis".into()).into()
                })
            })
            .collect()
    }

    fn lower_global_var(&mut self, decl: AstId) -> Result<(), CompileError> {
        let NodeKind::VarDecl(data) = self.ast.get_kind(decl) else {
            unreachable!("lower_global_var on a non-variable node");
        };
        let ty = self.var_type(data)?;
        debug!("lowering global @{} : {}", data.name, ty);

        self.node_map
            .insert(decl, Value::global(data.name, Type::ptr(ty.clone())));

        let (init, is_zero_init) = if data.is_array() {
            match data.init {
                None => (Vec::new(), true),
                Some(list) if self.is_filler(list) => (Vec::new(), true),
                Some(list) => {
                    let mut words = Vec::with_capacity(ty.word_count() as usize);
                    for slot in initializer::flatten(self.ast, list) {
                        let word = match slot {
                            None => 0,
                            Some(elem) => {
                                self.ast.get_node(elem).const_value().ok_or_else(|| {
                                    IrError::Malformed(
                                        "non-constant global initializer after analysis".into(),
                                    )
                                })?
                            }
                        };
                        words.push(word);
                    }
                    (words, false)
                }
            }
        } else {
            let word = match data.init {
                Some(init) => self.ast.get_node(init).const_value().ok_or_else(|| {
                    IrError::Malformed("non-constant global initializer after analysis".into())
                })?,
                None => 0,
            };
            (vec![word], false)
        };

        self.module.add_global(GlobalVarDef {
            name: data.name,
            ty,
            is_const: data.is_const,
            init,
            is_zero_init,
        });
        Ok(())
    }

    fn is_filler(&self, list: AstId) -> bool {
        matches!(
            self.ast.get_kind(list),
            NodeKind::InitListExpr(data) if data.is_filler
        )
    }

    /// IR type of a parameter: arrays decay to pointers at the call
    /// boundary, so an array pointer keeps only its trailing dimensions.
    fn param_type(&self, data: &ParamVarDeclData) -> Result<Type, CompileError> {
        if data.is_pointer && !data.dims.is_empty() {
            Ok(Type::ptr(Type::array(self.dim_values(&data.dims)?)))
        } else if data.is_pointer {
            Ok(Type::ptr(Type::I32))
        } else {
            Ok(Type::I32)
        }
    }

    fn lower_function(&mut self, decl: AstId) -> Result<(), CompileError> {
        let NodeKind::FunctionDecl(data) = self.ast.get_kind(decl) else {
            unreachable!("lower_function on a non-function node");
        };
        let FunctionDeclData {
            name,
            ret_type,
            params,
            body,
            ..
        } = data.clone();

        let ret = match ret_type {
            RetType::Void => Type::Void,
            RetType::Int => Type::I32,
        };

        self.tmp_id = 0;
        let mut param_types = Vec::with_capacity(params.len());
        let mut param_temps = Vec::with_capacity(params.len());
        for &param in &params {
            let NodeKind::ParamVarDecl(pd) = self.ast.get_kind(param) else {
                unreachable!("function parameter is not a ParamVarDecl");
            };
            let ty = self.param_type(pd)?;
            let temp = self.fresh_temp(ty.clone());
            self.node_map.insert(param, temp.clone());
            param_types.push(ty);
            param_temps.push(temp);
        }

        let func_ty = Type::func(ret.clone(), param_types);
        self.node_map
            .insert(decl, Value::global(name, func_ty.clone()));

        let Some(body) = body else {
            self.module.add_func_decl(FuncDecl { name, ty: func_ty });
            return Ok(());
        };

        debug!("lowering function @{}", name);
        let mut def = FuncDef::new(name, func_ty, param_temps.clone());
        let entry = def.add_block(Symbol::from("entry"));

        // Parameters live in stack slots; rebind each to its slot so body
        // references load through it like any other local.
        for (&param, temp) in params.iter().zip(&param_temps) {
            let slot = self.fresh_temp(Type::ptr(temp.ty()));
            def.push_inst(entry, Inst::alloca(slot.clone())?);
            def.push_inst(entry, Inst::store(temp.clone(), slot.clone())?);
            self.node_map.insert(param, slot);
        }

        let end = self.lower_stmt(&mut def, entry, body)?;
        if !def.block(end).is_terminated() {
            let ret_inst = match ret_type {
                RetType::Void => Inst::ret_void(),
                RetType::Int => Inst::ret(Value::imm(0))?,
            };
            def.push_inst(end, ret_inst);
        }

        self.module.add_func_def(def);
        Ok(())
    }
}
