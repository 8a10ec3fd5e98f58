//! The short-circuit condition protocol.
//!
//! `&&`/`||` and the conditions of `if`/`while` compile to control flow,
//! not boolean values. While a chain is being lowered, blocks whose
//! trailing conditional branch does not yet know one of its targets are
//! parked on the `true_stack`/`false_stack`; the statement that owns the
//! condition resolves them once its own labels exist. A chain therefore
//! reports no value (`None`) to its consumer.
//!
//! Operands that fold to constants short-circuit at compile time: a
//! constant that decides the operator yields an immediate and the other
//! side is never emitted; a constant that cannot decide it just drops out
//! of the chain.

use crate::ast::{AstId, BinaryOpKind};
use crate::diagnostic::{CompileError, IrError};
use crate::ir::{BlockId, FuncDef, IcmpKind, Inst, Type, Value};

use super::AstToIrLowerer;

impl<'a> AstToIrLowerer<'a> {
    /// Lower an expression as a branch condition. A concrete `i32` result
    /// is compared against zero to produce the `i1` the branch needs;
    /// `None` means the condition ran as a sink-threaded chain.
    pub(super) fn lower_condition(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        cond: AstId,
    ) -> Result<Option<Value>, CompileError> {
        match self.lower_expr(def, bb, cond)? {
            Some(value) if value.ty().is_i32() => {
                let dest = self.fresh_temp(Type::I1);
                def.push_inst(
                    bb,
                    Inst::icmp(IcmpKind::Ne, dest.clone(), value, Value::imm(0))?,
                );
                Ok(Some(dest))
            }
            other => Ok(other),
        }
    }

    pub(super) fn lower_cond_operator(
        &mut self,
        def: &mut FuncDef,
        bb: BlockId,
        op: BinaryOpKind,
        lhs: AstId,
        rhs: AstId,
    ) -> Result<Option<Value>, CompileError> {
        let is_and = op == BinaryOpKind::LogicAnd;
        let lhs_const = self.ast.get_node(lhs).const_value();
        let rhs_const = self.ast.get_node(rhs).const_value();

        // A deciding constant settles the whole expression.
        if let Some(value) = lhs_const {
            if is_and && value == 0 {
                return Ok(Some(Value::imm_bool(false)));
            }
            if !is_and && value != 0 {
                return Ok(Some(Value::imm_bool(true)));
            }
        }
        if let Some(value) = rhs_const {
            if is_and && value == 0 {
                return Ok(Some(Value::imm_bool(false)));
            }
            if !is_and && value != 0 {
                return Ok(Some(Value::imm_bool(true)));
            }
        }
        // A non-deciding constant leaves the other side as the condition.
        if lhs_const.is_some() {
            return self.lower_expr(def, bb, rhs);
        }
        if rhs_const.is_some() {
            return self.lower_expr(def, bb, lhs);
        }

        // Left side, in its own block.
        self.true_stack.push(Vec::new());
        self.false_stack.push(Vec::new());
        let label_lhs = self.fresh_label();
        let bb_lhs = def.add_block(label_lhs);
        let cond_lhs = self.lower_condition(def, bb_lhs, lhs)?;
        let lhs_true = self.true_stack.pop().unwrap_or_default();
        let lhs_false = self.false_stack.pop().unwrap_or_default();

        // Right side, in its own block.
        self.true_stack.push(Vec::new());
        self.false_stack.push(Vec::new());
        let label_rhs = self.fresh_label();
        let bb_rhs = def.add_block(label_rhs);
        let cond_rhs = self.lower_condition(def, bb_rhs, rhs)?;
        let rhs_true = self.true_stack.pop().unwrap_or_default();
        let rhs_false = self.false_stack.pop().unwrap_or_default();

        // The current block falls into the chain.
        def.push_inst(bb, Inst::br(bb_lhs));
        def.add_edge(bb, bb_lhs);

        // Left outcome: one side continues into the right block, the other
        // becomes a sink of the enclosing construct.
        match cond_lhs {
            Some(cond) => {
                def.push_inst(bb_lhs, Inst::cond_br_pending(cond)?);
                if is_and {
                    def.patch_true_target(bb_lhs, bb_rhs);
                    self.push_false_sink(bb_lhs)?;
                } else {
                    def.patch_false_target(bb_lhs, bb_rhs);
                    self.push_true_sink(bb_lhs)?;
                }
            }
            None => {
                if is_and {
                    for sink in lhs_true {
                        def.patch_true_target(sink, bb_rhs);
                    }
                    for sink in lhs_false {
                        self.push_false_sink(sink)?;
                    }
                } else {
                    for sink in lhs_true {
                        self.push_true_sink(sink)?;
                    }
                    for sink in lhs_false {
                        def.patch_false_target(sink, bb_rhs);
                    }
                }
            }
        }

        // Right outcome decides the whole expression; both of its exits
        // belong to the enclosing construct.
        match cond_rhs {
            Some(cond) => {
                def.push_inst(bb_rhs, Inst::cond_br_pending(cond)?);
                self.push_true_sink(bb_rhs)?;
                self.push_false_sink(bb_rhs)?;
            }
            None => {
                for sink in rhs_true {
                    self.push_true_sink(sink)?;
                }
                for sink in rhs_false {
                    self.push_false_sink(sink)?;
                }
            }
        }

        Ok(None)
    }

    fn push_true_sink(&mut self, block: BlockId) -> Result<(), CompileError> {
        self.true_stack
            .last_mut()
            .ok_or_else(|| IrError::Malformed("short-circuit chain outside a condition".into()))?
            .push(block);
        Ok(())
    }

    fn push_false_sink(&mut self, block: BlockId) -> Result<(), CompileError> {
        self.false_stack
            .last_mut()
            .ok_or_else(|| IrError::Malformed("short-circuit chain outside a condition".into()))?
            .push(block);
        Ok(())
    }

    /// Point every outstanding true sink of the innermost condition frame
    /// at `target` and pop the frame.
    pub(super) fn resolve_true_sinks(&mut self, def: &mut FuncDef, target: BlockId) {
        for sink in self.true_stack.pop().unwrap_or_default() {
            def.patch_true_target(sink, target);
        }
    }

    /// Point every outstanding false sink of the innermost condition frame
    /// at `target` and pop the frame.
    pub(super) fn resolve_false_sinks(&mut self, def: &mut FuncDef, target: BlockId) {
        for sink in self.false_stack.pop().unwrap_or_default() {
            def.patch_false_target(sink, target);
        }
    }
}
