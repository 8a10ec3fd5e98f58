//! Statement lowering: compounds, declarations, control flow.

use crate::ast::{AstId, BinaryOpKind, NodeKind, VarDeclData};
use crate::diagnostic::{CompileError, IrError};
use crate::ir::{BlockId, FuncDef, Inst, Type, Value};
use crate::semantic::initializer;

use super::AstToIrLowerer;

impl<'a> AstToIrLowerer<'a> {
    /// Lower one statement into the current block; returns the block
    /// subsequent statements continue in.
    pub(super) fn lower_stmt(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        stmt: AstId,
    ) -> Result<BlockId, CompileError> {
        match self.ast.get_kind(stmt) {
            NodeKind::CompoundStmt(data) => {
                let stmts = data.stmts.clone();
                self.lower_compound(def, bb, &stmts)
            }
            NodeKind::DeclStmt(decls) => {
                let decls = decls.to_vec();
                for decl in decls {
                    self.lower_local_var(def, bb, decl)?;
                }
                Ok(bb)
            }
            NodeKind::If(_) => self.lower_if(def, bb, stmt),
            NodeKind::While(_) => self.lower_while(def, bb, stmt),
            NodeKind::Continue => {
                // Placeholder terminator, replaced with a branch to the
                // check block when the enclosing loop finishes.
                def.push_inst(bb, Inst::ret_void());
                self.continue_stack
                    .last_mut()
                    .ok_or_else(|| IrError::Malformed("continue outside of a loop".into()))?
                    .push(bb);
                Ok(bb)
            }
            NodeKind::Break => {
                def.push_inst(bb, Inst::ret_void());
                self.break_stack
                    .last_mut()
                    .ok_or_else(|| IrError::Malformed("break outside of a loop".into()))?
                    .push(bb);
                Ok(bb)
            }
            NodeKind::Return(expr) => {
                let expr = *expr;
                self.lower_return(def, bb, expr)?;
                Ok(bb)
            }
            NodeKind::BinaryOp(BinaryOpKind::Assign, lhs, rhs) => {
                let (lhs, rhs) = (*lhs, *rhs);
                self.lower_assign(def, bb, lhs, rhs)?;
                Ok(bb)
            }
            NodeKind::CallExpr(_) => {
                self.lower_call(def, bb, stmt, false)?;
                Ok(bb)
            }
            // Remaining expression statements have no effect.
            _ => Ok(bb),
        }
    }

    fn lower_compound(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        stmts: &[AstId],
    ) -> Result<BlockId, CompileError> {
        let mut current = bb;
        for &stmt in stmts {
            // Anything after a terminator is unreachable.
            if def.block(current).is_terminated() {
                break;
            }
            current = self.lower_stmt(def, current, stmt)?;
        }
        Ok(current)
    }

    fn lower_local_var(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        decl: AstId,
    ) -> Result<(), CompileError> {
        let NodeKind::VarDecl(data) = self.ast.get_kind(decl) else {
            unreachable!("local declaration is not a VarDecl");
        };
        let VarDeclData { dims, init, .. } = data.clone();
        let ty = self.var_type(data)?;

        let slot = self.fresh_temp(Type::ptr(ty.clone()));
        def.push_inst(bb, Inst::alloca(slot.clone())?);
        self.node_map.insert(decl, slot.clone());

        let Some(init) = init else {
            return Ok(());
        };

        if dims.is_empty() {
            let value = self.lower_operand(def, bb, init)?;
            def.push_inst(bb, Inst::store(value, slot)?);
            return Ok(());
        }

        // Array initializer: view the slot as a flat word pointer, then
        // store every position of the normalized list in row-major order.
        let elem_base = self.fresh_temp(Type::ptr(Type::I32));
        def.push_inst(bb, Inst::bitcast(elem_base.clone(), slot)?);

        for (offset, slot_expr) in initializer::flatten(self.ast, init).into_iter().enumerate() {
            let value = match slot_expr {
                None => Value::imm(0),
                Some(expr) => self.lower_operand(def, bb, expr)?,
            };
            let addr = self.fresh_temp(Type::ptr(Type::I32));
            def.push_inst(
                bb,
                Inst::gep(
                    addr.clone(),
                    elem_base.clone(),
                    vec![Value::imm(offset as i32)],
                )?,
            );
            def.push_inst(bb, Inst::store(value, addr)?);
        }
        Ok(())
    }

    fn lower_return(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        expr: Option<AstId>,
    ) -> Result<(), CompileError> {
        let inst = match expr {
            Some(expr) => {
                let value = self.lower_operand(def, bb, expr)?;
                Inst::ret(value)?
            }
            None => Inst::ret_void(),
        };
        def.push_inst(bb, inst);
        Ok(())
    }

    fn lower_assign(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        lhs: AstId,
        rhs: AstId,
    ) -> Result<(), CompileError> {
        let value = self.lower_operand(def, bb, rhs)?;
        let addr = self.lower_decl_ref(def, bb, lhs, false)?;
        def.push_inst(bb, Inst::store(value, addr)?);
        Ok(())
    }

    fn lower_if(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        stmt: AstId,
    ) -> Result<BlockId, CompileError> {
        let NodeKind::If(data) = self.ast.get_kind(stmt) else {
            unreachable!("lower_if on a non-if node");
        };
        let (cond, then_stmt, else_stmt) = (data.cond, data.then_stmt, data.else_stmt);

        // A constant condition picks the surviving arm statically.
        if let Some(value) = self.ast.get_node(cond).const_value() {
            return if value != 0 {
                self.lower_stmt(def, bb, then_stmt)
            } else if let Some(else_stmt) = else_stmt {
                self.lower_stmt(def, bb, else_stmt)
            } else {
                Ok(bb)
            };
        }

        self.true_stack.push(Vec::new());
        self.false_stack.push(Vec::new());

        let cond_var = self.lower_condition(def, bb, cond)?;

        let label_then = self.fresh_label();
        let bb_then = def.add_block(label_then);
        let then_end = self.lower_stmt(def, bb_then, then_stmt)?;

        let bb_else = match else_stmt {
            Some(else_stmt) => {
                let label_else = self.fresh_label();
                let bb_else = def.add_block(label_else);
                let else_end = self.lower_stmt(def, bb_else, else_stmt)?;
                Some((bb_else, else_end))
            }
            None => None,
        };

        let label_end = self.fresh_label();
        let bb_end = def.add_block(label_end);

        if !def.block(then_end).is_terminated() {
            def.push_inst(then_end, Inst::br(bb_end));
            def.add_edge(then_end, bb_end);
        }
        if let Some((_, else_end)) = bb_else {
            if !def.block(else_end).is_terminated() {
                def.push_inst(else_end, Inst::br(bb_end));
                def.add_edge(else_end, bb_end);
            }
        }

        let false_target = match bb_else {
            Some((bb_else, _)) => bb_else,
            None => bb_end,
        };
        if let Some(cond_var) = cond_var {
            def.push_inst(bb, Inst::cond_br(cond_var, bb_then, false_target)?);
            def.add_edge(bb, bb_then);
            def.add_edge(bb, false_target);
        }

        self.resolve_true_sinks(def, bb_then);
        self.resolve_false_sinks(def, false_target);

        Ok(bb_end)
    }

    fn lower_while(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        stmt: AstId,
    ) -> Result<BlockId, CompileError> {
        let NodeKind::While(data) = self.ast.get_kind(stmt) else {
            unreachable!("lower_while on a non-while node");
        };
        let (cond, body) = (data.cond, data.body);

        let cond_const = self.ast.get_node(cond).const_value();
        if cond_const == Some(0) {
            return Ok(bb);
        }

        self.break_stack.push(Vec::new());
        self.continue_stack.push(Vec::new());
        self.true_stack.push(Vec::new());
        self.false_stack.push(Vec::new());

        let label_check = self.fresh_label();
        let bb_check = def.add_block(label_check);
        def.push_inst(bb, Inst::br(bb_check));
        def.add_edge(bb, bb_check);

        let cond_var = match cond_const {
            Some(_) => None,
            None => self.lower_condition(def, bb_check, cond)?,
        };

        let label_body = self.fresh_label();
        let bb_body = def.add_block(label_body);
        let body_end = self.lower_stmt(def, bb_body, body)?;
        if !def.block(body_end).is_terminated() {
            def.push_inst(body_end, Inst::br(bb_check));
            def.add_edge(body_end, bb_check);
        }

        let label_end = self.fresh_label();
        let bb_end = def.add_block(label_end);

        if cond_const.is_some() {
            // Provably-true condition: fall straight into the body.
            def.push_inst(bb_check, Inst::br(bb_body));
            def.add_edge(bb_check, bb_body);
        } else if let Some(cond_var) = cond_var {
            def.push_inst(bb_check, Inst::cond_br(cond_var, bb_body, bb_end)?);
            def.add_edge(bb_check, bb_body);
            def.add_edge(bb_check, bb_end);
        }

        for block in self.break_stack.pop().unwrap_or_default() {
            def.block_mut(block).insts.pop();
            def.push_inst(block, Inst::br(bb_end));
            def.add_edge(block, bb_end);
        }
        for block in self.continue_stack.pop().unwrap_or_default() {
            def.block_mut(block).insts.pop();
            def.push_inst(block, Inst::br(bb_check));
            def.add_edge(block, bb_check);
        }

        self.resolve_true_sinks(def, bb_body);
        self.resolve_false_sinks(def, bb_end);

        Ok(bb_end)
    }
}
