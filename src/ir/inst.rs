//! IR instructions.
//!
//! Every constructor checks the type contract of the instruction it builds
//! and refuses values that violate it; a refusal surfaces as
//! [`IrError::TypeMismatch`] naming the instruction and the offending type.
//! `Ret` and the two branch forms are the only terminators.

use crate::diagnostic::IrError;
use crate::ir::BlockId;
use crate::ir::types::{Type, Width};
use crate::ir::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
}

impl BinOpKind {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOpKind::Add => "add",
            BinOpKind::Sub => "sub",
            BinOpKind::Mul => "mul",
            BinOpKind::SDiv => "sdiv",
            BinOpKind::SRem => "srem",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpKind {
    Eq,
    Ne,
    Sgt,
    Sge,
    Slt,
    Sle,
}

impl IcmpKind {
    pub fn mnemonic(self) -> &'static str {
        match self {
            IcmpKind::Eq => "eq",
            IcmpKind::Ne => "ne",
            IcmpKind::Sgt => "sgt",
            IcmpKind::Sge => "sge",
            IcmpKind::Slt => "slt",
            IcmpKind::Sle => "sle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    Ret(Option<Value>),
    Br {
        dest: BlockId,
    },
    /// Conditional branch. Targets stay unresolved while the block sits on
    /// a short-circuit sink stack and are patched by the owning construct.
    CondBr {
        cond: Value,
        if_true: Option<BlockId>,
        if_false: Option<BlockId>,
    },
    BinOp {
        op: BinOpKind,
        dest: Value,
        lhs: Value,
        rhs: Value,
    },
    Alloca {
        dest: Value,
    },
    Load {
        dest: Value,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Gep {
        dest: Value,
        base: Value,
        indices: Vec<Value>,
    },
    Zext {
        dest: Value,
        src: Value,
    },
    Bitcast {
        dest: Value,
        src: Value,
    },
    Icmp {
        op: IcmpKind,
        dest: Value,
        lhs: Value,
        rhs: Value,
    },
    Phi {
        dest: Value,
        incoming: Vec<(Value, BlockId)>,
    },
    Call {
        dest: Option<Value>,
        func: Value,
        args: Vec<Value>,
    },
}

fn expect_width(inst: &'static str, value: &Value, width: Width) -> Result<(), IrError> {
    if value.ty() == Type::Int(width) {
        Ok(())
    } else {
        Err(IrError::TypeMismatch {
            inst,
            found: value.ty(),
        })
    }
}

fn expect_ptr(inst: &'static str, value: &Value) -> Result<(), IrError> {
    if value.ty().is_ptr() {
        Ok(())
    } else {
        Err(IrError::TypeMismatch {
            inst,
            found: value.ty(),
        })
    }
}

impl Inst {
    pub fn ret(value: Value) -> Result<Inst, IrError> {
        expect_width("ret", &value, Width::I32)?;
        Ok(Inst::Ret(Some(value)))
    }

    pub fn ret_void() -> Inst {
        Inst::Ret(None)
    }

    pub fn br(dest: BlockId) -> Inst {
        Inst::Br { dest }
    }

    pub fn cond_br(cond: Value, if_true: BlockId, if_false: BlockId) -> Result<Inst, IrError> {
        expect_width("br", &cond, Width::I1)?;
        Ok(Inst::CondBr {
            cond,
            if_true: Some(if_true),
            if_false: Some(if_false),
        })
    }

    /// A conditional branch whose targets a short-circuit chain has not yet
    /// identified; both get patched before the function is finished.
    pub fn cond_br_pending(cond: Value) -> Result<Inst, IrError> {
        expect_width("br", &cond, Width::I1)?;
        Ok(Inst::CondBr {
            cond,
            if_true: None,
            if_false: None,
        })
    }

    pub fn bin_op(op: BinOpKind, dest: Value, lhs: Value, rhs: Value) -> Result<Inst, IrError> {
        expect_width("binop", &dest, Width::I32)?;
        expect_width("binop", &lhs, Width::I32)?;
        expect_width("binop", &rhs, Width::I32)?;
        Ok(Inst::BinOp { op, dest, lhs, rhs })
    }

    pub fn alloca(dest: Value) -> Result<Inst, IrError> {
        expect_ptr("alloca", &dest)?;
        Ok(Inst::Alloca { dest })
    }

    pub fn load(dest: Value, ptr: Value) -> Result<Inst, IrError> {
        expect_ptr("load", &ptr)?;
        let pointee = ptr.ty();
        let pointee = pointee.pointee().unwrap();
        if dest.ty() != *pointee {
            return Err(IrError::TypeMismatch {
                inst: "load",
                found: dest.ty(),
            });
        }
        Ok(Inst::Load { dest, ptr })
    }

    pub fn store(value: Value, ptr: Value) -> Result<Inst, IrError> {
        expect_ptr("store", &ptr)?;
        let pointee = ptr.ty();
        let pointee = pointee.pointee().unwrap();
        if value.ty() != *pointee {
            return Err(IrError::TypeMismatch {
                inst: "store",
                found: value.ty(),
            });
        }
        Ok(Inst::Store { value, ptr })
    }

    pub fn gep(dest: Value, base: Value, indices: Vec<Value>) -> Result<Inst, IrError> {
        expect_ptr("getelementptr", &dest)?;
        expect_ptr("getelementptr", &base)?;
        for idx in &indices {
            expect_width("getelementptr", idx, Width::I32)?;
        }
        Ok(Inst::Gep {
            dest,
            base,
            indices,
        })
    }

    pub fn zext(dest: Value, src: Value) -> Result<Inst, IrError> {
        expect_width("zext", &src, Width::I1)?;
        expect_width("zext", &dest, Width::I32)?;
        Ok(Inst::Zext { dest, src })
    }

    pub fn bitcast(dest: Value, src: Value) -> Result<Inst, IrError> {
        expect_ptr("bitcast", &dest)?;
        expect_ptr("bitcast", &src)?;
        Ok(Inst::Bitcast { dest, src })
    }

    pub fn icmp(op: IcmpKind, dest: Value, lhs: Value, rhs: Value) -> Result<Inst, IrError> {
        expect_width("icmp", &dest, Width::I1)?;
        let (lw, rw) = (lhs.width(), rhs.width());
        if lw.is_none() || lw != rw {
            return Err(IrError::TypeMismatch {
                inst: "icmp",
                found: rhs.ty(),
            });
        }
        Ok(Inst::Icmp { op, dest, lhs, rhs })
    }

    pub fn phi(dest: Value, incoming: Vec<(Value, BlockId)>) -> Result<Inst, IrError> {
        for (value, _) in &incoming {
            if value.ty() != dest.ty() {
                return Err(IrError::TypeMismatch {
                    inst: "phi",
                    found: value.ty(),
                });
            }
        }
        Ok(Inst::Phi { dest, incoming })
    }

    pub fn call(dest: Option<Value>, func: Value, args: Vec<Value>) -> Result<Inst, IrError> {
        let func_ty = func.ty();
        let ret = match func_ty.ret() {
            Some(ret) => ret,
            None => {
                return Err(IrError::TypeMismatch {
                    inst: "call",
                    found: func_ty.clone(),
                });
            }
        };
        if let Some(dest) = &dest {
            if dest.ty() != *ret || *ret == Type::Void {
                return Err(IrError::TypeMismatch {
                    inst: "call",
                    found: dest.ty(),
                });
            }
        }
        Ok(Inst::Call { dest, func, args })
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Inst::Ret(_) | Inst::Br { .. } | Inst::CondBr { .. })
    }

    /// Patch the true target of a pending conditional branch.
    pub fn set_true_target(&mut self, target: BlockId) {
        match self {
            Inst::CondBr { if_true, .. } => *if_true = Some(target),
            _ => unreachable!("set_true_target on a non-conditional branch"),
        }
    }

    /// Patch the false target of a pending conditional branch.
    pub fn set_false_target(&mut self, target: BlockId) {
        match self {
            Inst::CondBr { if_false, .. } => *if_false = Some(target),
            _ => unreachable!("set_false_target on a non-conditional branch"),
        }
    }

    /// The temp this instruction defines, if any.
    pub fn dest(&self) -> Option<&Value> {
        match self {
            Inst::BinOp { dest, .. }
            | Inst::Alloca { dest }
            | Inst::Load { dest, .. }
            | Inst::Gep { dest, .. }
            | Inst::Zext { dest, .. }
            | Inst::Bitcast { dest, .. }
            | Inst::Icmp { dest, .. }
            | Inst::Phi { dest, .. } => Some(dest),
            Inst::Call { dest, .. } => dest.as_ref(),
            Inst::Ret(_) | Inst::Br { .. } | Inst::CondBr { .. } | Inst::Store { .. } => None,
        }
    }

    /// All values this instruction reads.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Inst::Ret(value) => value.iter().collect(),
            Inst::Br { .. } => Vec::new(),
            Inst::CondBr { cond, .. } => vec![cond],
            Inst::BinOp { lhs, rhs, .. } | Inst::Icmp { lhs, rhs, .. } => vec![lhs, rhs],
            Inst::Alloca { .. } => Vec::new(),
            Inst::Load { ptr, .. } => vec![ptr],
            Inst::Store { value, ptr } => vec![value, ptr],
            Inst::Gep { base, indices, .. } => {
                let mut out = vec![base];
                out.extend(indices);
                out
            }
            Inst::Zext { src, .. } | Inst::Bitcast { src, .. } => vec![src],
            Inst::Phi { incoming, .. } => incoming.iter().map(|(v, _)| v).collect(),
            Inst::Call { func, args, .. } => {
                let mut out = vec![func];
                out.extend(args);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_manager::Symbol;

    fn block(n: u32) -> BlockId {
        BlockId(n)
    }

    #[test]
    fn cond_br_requires_i1() {
        assert!(Inst::cond_br(Value::imm(1), block(0), block(1)).is_err());
        let t = Value::temp(0, Type::I1);
        assert!(Inst::cond_br(t, block(0), block(1)).is_ok());
    }

    #[test]
    fn load_dest_must_match_pointee() {
        let slot = Value::temp(0, Type::ptr(Type::I32));
        assert!(Inst::load(Value::temp(1, Type::I32), slot.clone()).is_ok());
        assert!(Inst::load(Value::temp(1, Type::I1), slot).is_err());
        assert!(Inst::load(Value::temp(1, Type::I32), Value::imm(0)).is_err());
    }

    #[test]
    fn zext_lifts_i1_to_i32_only() {
        let src = Value::temp(0, Type::I1);
        assert!(Inst::zext(Value::temp(1, Type::I32), src.clone()).is_ok());
        assert!(Inst::zext(Value::temp(1, Type::I1), src).is_err());
        assert!(Inst::zext(Value::temp(1, Type::I32), Value::imm(0)).is_err());
    }

    #[test]
    fn icmp_operand_widths_must_match() {
        let d = Value::temp(2, Type::I1);
        assert!(Inst::icmp(IcmpKind::Eq, d.clone(), Value::imm(1), Value::imm(2)).is_ok());
        assert!(
            Inst::icmp(
                IcmpKind::Eq,
                d,
                Value::temp(0, Type::I1),
                Value::imm(0)
            )
            .is_err()
        );
    }

    #[test]
    fn call_dest_must_match_return_type() {
        let f = Value::global(Symbol::from("getint"), Type::func(Type::I32, vec![]));
        assert!(Inst::call(Some(Value::temp(0, Type::I32)), f.clone(), vec![]).is_ok());
        assert!(Inst::call(Some(Value::temp(0, Type::I1)), f.clone(), vec![]).is_err());
        assert!(Inst::call(None, f, vec![]).is_ok());
        assert!(Inst::call(None, Value::imm(0), vec![]).is_err());
    }

    #[test]
    fn terminators_are_ret_and_branches() {
        assert!(Inst::ret_void().is_terminator());
        assert!(Inst::br(block(0)).is_terminator());
        assert!(!Inst::alloca(Value::temp(0, Type::ptr(Type::I32))).unwrap().is_terminator());
    }
}
