//! Expression lowering.
//!
//! `lower_expr` returns `None` when the expression was compiled as a pure
//! short-circuit chain: its outcome is threaded through the sink stacks
//! rather than materialized as a value. Value contexts go through
//! `lower_operand`, which also short-cuts every constant-folded expression
//! to an immediate.

use crate::ast::{AstId, BinaryOpKind, NodeKind, UnaryOpKind};
use crate::diagnostic::{CompileError, IrError};
use crate::ir::{BinOpKind, BlockId, FuncDef, IcmpKind, Inst, Type, Value, Width};

use super::AstToIrLowerer;

impl<'a> AstToIrLowerer<'a> {
    /// Lower an expression in a value context. Constant expressions become
    /// immediates without emitting code.
    pub(super) fn lower_operand(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        expr: AstId,
    ) -> Result<Value, CompileError> {
        if let Some(value) = self.ast.get_node(expr).const_value() {
            return Ok(Value::imm(value));
        }
        self.lower_expr(def, bb, expr)?
            .ok_or_else(|| IrError::Malformed("condition used in a value context".into()).into())
    }

    pub(super) fn lower_expr(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        expr: AstId,
    ) -> Result<Option<Value>, CompileError> {
        if let Some(value) = self.ast.get_node(expr).const_value() {
            return Ok(Some(Value::imm(value)));
        }
        match self.ast.get_kind(expr) {
            NodeKind::ParenExpr(sub) => {
                let sub = *sub;
                self.lower_expr(def, bb, sub)
            }
            NodeKind::DeclRefExpr(_) => self.lower_decl_ref(def, bb, expr, true).map(Some),
            NodeKind::CallExpr(_) => self.lower_call(def, bb, expr, true),
            NodeKind::BinaryOp(op, lhs, rhs) if op.is_logical() => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                self.lower_cond_operator(def, bb, op, lhs, rhs)
            }
            NodeKind::BinaryOp(op, lhs, rhs) => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                self.lower_binary(def, bb, op, lhs, rhs).map(Some)
            }
            NodeKind::UnaryOp(op, sub) => {
                let (op, sub) = (*op, *sub);
                self.lower_unary(def, bb, op, sub).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Widen a value to `i32` if it is an `i1`.
    fn widen(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        value: Value,
    ) -> Result<Value, CompileError> {
        if !value.is_i1() {
            return Ok(value);
        }
        let widened = self.fresh_temp(Type::I32);
        def.push_inst(bb, Inst::zext(widened.clone(), value)?);
        Ok(widened)
    }

    fn lower_binary(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        op: BinaryOpKind,
        lhs: AstId,
        rhs: AstId,
    ) -> Result<Value, CompileError> {
        let lhs = self.lower_operand(def, bb, lhs)?;
        let rhs = self.lower_operand(def, bb, rhs)?;

        // Both arithmetic and comparison operate on i32 operands.
        let lhs = self.widen(def, bb, lhs)?;
        let rhs = self.widen(def, bb, rhs)?;

        let (inst, dest) = match op {
            BinaryOpKind::Add
            | BinaryOpKind::Sub
            | BinaryOpKind::Mul
            | BinaryOpKind::Div
            | BinaryOpKind::Rem => {
                let kind = match op {
                    BinaryOpKind::Add => BinOpKind::Add,
                    BinaryOpKind::Sub => BinOpKind::Sub,
                    BinaryOpKind::Mul => BinOpKind::Mul,
                    BinaryOpKind::Div => BinOpKind::SDiv,
                    _ => BinOpKind::SRem,
                };
                let dest = self.fresh_temp(Type::I32);
                (Inst::bin_op(kind, dest.clone(), lhs, rhs)?, dest)
            }
            op if op.is_comparison() => {
                let kind = match op {
                    BinaryOpKind::Eq => IcmpKind::Eq,
                    BinaryOpKind::Ne => IcmpKind::Ne,
                    BinaryOpKind::Lt => IcmpKind::Slt,
                    BinaryOpKind::Le => IcmpKind::Sle,
                    BinaryOpKind::Gt => IcmpKind::Sgt,
                    _ => IcmpKind::Sge,
                };
                let dest = self.fresh_temp(Type::I1);
                (Inst::icmp(kind, dest.clone(), lhs, rhs)?, dest)
            }
            _ => {
                return Err(
                    IrError::Malformed("assignment lowered as a value expression".into()).into(),
                );
            }
        };
        def.push_inst(bb, inst);
        Ok(dest)
    }

    fn lower_unary(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        op: UnaryOpKind,
        sub: AstId,
    ) -> Result<Value, CompileError> {
        let sub = self.lower_operand(def, bb, sub)?;
        match op {
            UnaryOpKind::Plus => Ok(sub),
            UnaryOpKind::Minus => {
                let sub = self.widen(def, bb, sub)?;
                let dest = self.fresh_temp(Type::I32);
                def.push_inst(
                    bb,
                    Inst::bin_op(BinOpKind::Sub, dest.clone(), Value::imm(0), sub)?,
                );
                Ok(dest)
            }
            UnaryOpKind::Not => {
                let zero = match sub.width() {
                    Some(Width::I1) => Value::imm_bool(false),
                    _ => Value::imm(0),
                };
                let dest = self.fresh_temp(Type::I1);
                def.push_inst(bb, Inst::icmp(IcmpKind::Eq, dest.clone(), sub, zero)?);
                Ok(dest)
            }
        }
    }

    /// Lower a reference to a declaration. `need_load` distinguishes value
    /// reads from assignment targets, which want the address. Partial
    /// indexing of an array yields the residual sub-array pointer and
    /// never loads.
    pub(super) fn lower_decl_ref(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        expr: AstId,
        need_load: bool,
    ) -> Result<Value, CompileError> {
        let NodeKind::DeclRefExpr(data) = self.ast.get_kind(expr) else {
            return Err(IrError::Malformed("assignment target is not a reference".into()).into());
        };
        let indices = data.indices.to_vec();
        let decl = data
            .resolved
            .get()
            .ok_or_else(|| IrError::Malformed("unresolved reference after analysis".into()))?;
        let base = self
            .node_map
            .get(&decl)
            .cloned()
            .ok_or_else(|| IrError::Malformed("reference to an unlowered declaration".into()))?;

        match self.ast.get_kind(decl) {
            NodeKind::VarDecl(vd) if vd.is_array() => {
                let base_ty = base.ty();
                let dims = base_ty
                    .pointee()
                    .and_then(Type::dims)
                    .ok_or_else(|| IrError::Malformed("array variable without array type".into()))?
                    .to_vec();
                self.lower_array_access(def, bb, base, &dims, &indices, need_load)
            }
            NodeKind::ParamVarDecl(pd) if pd.is_pointer => {
                // Parameter pointers are stored to the stack slot in the
                // prologue; read the incoming pointer back first.
                let base_ty = base.ty();
                let param_ty = base_ty
                    .pointee()
                    .ok_or_else(|| IrError::Malformed("parameter slot is not a pointer".into()))?;
                let loaded = self.fresh_temp(param_ty.clone());
                def.push_inst(bb, Inst::load(loaded.clone(), base)?);
                if indices.is_empty() {
                    return Ok(loaded);
                }
                let trailing = match param_ty.pointee().and_then(Type::dims) {
                    Some(dims) => dims.to_vec(),
                    None => Vec::new(),
                };
                self.lower_pointer_access(def, bb, loaded, &trailing, &indices, need_load)
            }
            // Scalars (variables and value parameters) live in slots.
            NodeKind::VarDecl(_) | NodeKind::ParamVarDecl(_) => {
                if need_load {
                    let dest = self.fresh_temp(Type::I32);
                    def.push_inst(bb, Inst::load(dest.clone(), base)?);
                    Ok(dest)
                } else {
                    Ok(base)
                }
            }
            _ => Err(IrError::Malformed("reference bound to a function".into()).into()),
        }
    }

    /// Address computation into a declared array: the index list opens
    /// with a constant 0 to step through the array pointer itself.
    fn lower_array_access(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        base: Value,
        dims: &[i32],
        indices: &[AstId],
        need_load: bool,
    ) -> Result<Value, CompileError> {
        let mut idx_list = Vec::with_capacity(indices.len() + 2);
        idx_list.push(Value::imm(0));
        for &index in indices {
            let value = self.lower_operand(def, bb, index)?;
            idx_list.push(value);
        }

        if indices.len() < dims.len() {
            // Partial indexing: the residual sub-array as a pointer.
            idx_list.push(Value::imm(0));
            let residual = &dims[indices.len() + 1..];
            let ty = if residual.is_empty() {
                Type::ptr(Type::I32)
            } else {
                Type::ptr(Type::array(residual.to_vec()))
            };
            let dest = self.fresh_temp(ty);
            def.push_inst(bb, Inst::gep(dest.clone(), base, idx_list)?);
            return Ok(dest);
        }

        let addr = self.fresh_temp(Type::ptr(Type::I32));
        def.push_inst(bb, Inst::gep(addr.clone(), base, idx_list)?);
        if need_load {
            let dest = self.fresh_temp(Type::I32);
            def.push_inst(bb, Inst::load(dest.clone(), addr)?);
            Ok(dest)
        } else {
            Ok(addr)
        }
    }

    /// Address computation through a pointer parameter: the first index
    /// steps the pointer, the trailing fixed dimensions follow; no leading
    /// 0 slot.
    fn lower_pointer_access(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        base: Value,
        trailing: &[i32],
        indices: &[AstId],
        need_load: bool,
    ) -> Result<Value, CompileError> {
        let total = 1 + trailing.len();
        let mut idx_list = Vec::with_capacity(indices.len() + 1);
        for &index in indices {
            let value = self.lower_operand(def, bb, index)?;
            idx_list.push(value);
        }

        if indices.len() < total {
            idx_list.push(Value::imm(0));
            let residual = &trailing[indices.len()..];
            let ty = if residual.is_empty() {
                Type::ptr(Type::I32)
            } else {
                Type::ptr(Type::array(residual.to_vec()))
            };
            let dest = self.fresh_temp(ty);
            def.push_inst(bb, Inst::gep(dest.clone(), base, idx_list)?);
            return Ok(dest);
        }

        let addr = self.fresh_temp(Type::ptr(Type::I32));
        def.push_inst(bb, Inst::gep(addr.clone(), base, idx_list)?);
        if need_load {
            let dest = self.fresh_temp(Type::I32);
            def.push_inst(bb, Inst::load(dest.clone(), addr)?);
            Ok(dest)
        } else {
            Ok(addr)
        }
    }

    pub(super) fn lower_call(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        expr: AstId,
        want_value: bool,
    ) -> Result<Option<Value>, CompileError> {
        let NodeKind::CallExpr(data) = self.ast.get_kind(expr) else {
            unreachable!("lower_call on a non-call node");
        };
        let args = data.args.to_vec();
        let decl = data
            .resolved
            .get()
            .ok_or_else(|| IrError::Malformed("unresolved call after analysis".into()))?;
        let func = self
            .node_map
            .get(&decl)
            .cloned()
            .ok_or_else(|| IrError::Malformed("call to an unlowered function".into()))?;
        let returns_int = matches!(
            self.ast.get_kind(decl),
            NodeKind::FunctionDecl(fd) if fd.ret_type == crate::ast::RetType::Int
        );

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.lower_operand(def, bb, arg)?);
        }

        if want_value && returns_int {
            let dest = self.fresh_temp(Type::I32);
            def.push_inst(bb, Inst::call(Some(dest.clone()), func, arg_values)?);
            return Ok(Some(dest));
        }

        // A discarded int result still consumes a temp number.
        if returns_int {
            self.tmp_id += 1;
        }
        def.push_inst(bb, Inst::call(None, func, arg_values)?);
        Ok(None)
    }
}
