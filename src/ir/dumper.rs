//! Textual IR output.
//!
//! `Display` renders the module in an LLVM-flavored syntax: globals first,
//! then external declarations, then function definitions with labeled
//! blocks and one instruction per line. This is the debug-build success
//! output the driver writes to stdout.

use std::fmt;

use crate::ir::inst::Inst;
use crate::ir::{BasicBlock, BlockId, FuncDecl, FuncDef, GlobalVarDef, Module};

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            writeln!(f, "{global}")?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }
        for decl in &self.func_decls {
            writeln!(f, "{decl}")?;
        }
        if !self.func_decls.is_empty() {
            writeln!(f)?;
        }
        for (i, def) in self.func_defs.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{def}")?;
        }
        Ok(())
    }
}

impl fmt::Display for GlobalVarDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let linkage = if self.is_const { "constant" } else { "global" };
        write!(f, "@{} = {} {}", self.name, linkage, self.ty)?;
        if self.is_zero_init {
            write!(f, " zeroinitializer")
        } else if self.init.len() == 1 && self.ty.dims().is_none() {
            write!(f, " {}", self.init[0])
        } else {
            write!(f, " [")?;
            for (i, word) in self.init.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{word}")?;
            }
            write!(f, "]")
        }
    }
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ret = self.ty.ret().expect("declaration without function type");
        write!(f, "declare {} @{}(", ret, self.name)?;
        if let crate::ir::Type::Func { params, .. } = &self.ty {
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{p}")?;
            }
        }
        write!(f, ")")
    }
}

impl fmt::Display for FuncDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.ret_type(), self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", param.ty(), param)?;
        }
        writeln!(f, ") {{")?;
        for block in &self.blocks {
            self.write_block(f, block)?;
        }
        writeln!(f, "}}")
    }
}

impl FuncDef {
    fn label_of(&self, id: Option<BlockId>) -> &str {
        match id {
            Some(id) => self.block(id).label.as_str(),
            None => "?",
        }
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, block: &BasicBlock) -> fmt::Result {
        writeln!(f, "{}:", block.label)?;
        for inst in &block.insts {
            write!(f, "    ")?;
            self.write_inst(f, inst)?;
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_inst(&self, f: &mut fmt::Formatter<'_>, inst: &Inst) -> fmt::Result {
        match inst {
            Inst::Ret(None) => write!(f, "ret void"),
            Inst::Ret(Some(value)) => write!(f, "ret {} {}", value.ty(), value),
            Inst::Br { dest } => write!(f, "br label %{}", self.label_of(Some(*dest))),
            Inst::CondBr {
                cond,
                if_true,
                if_false,
            } => write!(
                f,
                "br i1 {}, label %{}, label %{}",
                cond,
                self.label_of(*if_true),
                self.label_of(*if_false)
            ),
            Inst::BinOp { op, dest, lhs, rhs } => {
                write!(f, "{dest} = {} i32 {lhs}, {rhs}", op.mnemonic())
            }
            Inst::Alloca { dest } => {
                let ty = dest.ty();
                let pointee = ty.pointee().expect("alloca of a non-pointer");
                write!(f, "{dest} = alloca {pointee}")
            }
            Inst::Load { dest, ptr } => {
                write!(f, "{dest} = load {}, {} {}", dest.ty(), ptr.ty(), ptr)
            }
            Inst::Store { value, ptr } => {
                write!(f, "store {} {}, {} {}", value.ty(), value, ptr.ty(), ptr)
            }
            Inst::Gep {
                dest,
                base,
                indices,
            } => {
                let base_ty = base.ty();
                let pointee = base_ty.pointee().expect("gep through a non-pointer");
                write!(f, "{dest} = getelementptr {pointee}, {base_ty} {base}")?;
                for idx in indices {
                    write!(f, ", i32 {idx}")?;
                }
                Ok(())
            }
            Inst::Zext { dest, src } => write!(f, "{dest} = zext i1 {src} to i32"),
            Inst::Bitcast { dest, src } => {
                write!(f, "{dest} = bitcast {} {} to {}", src.ty(), src, dest.ty())
            }
            Inst::Icmp { op, dest, lhs, rhs } => {
                write!(
                    f,
                    "{dest} = icmp {} {} {lhs}, {rhs}",
                    op.mnemonic(),
                    lhs.ty()
                )
            }
            Inst::Phi { dest, incoming } => {
                write!(f, "{dest} = phi {}", dest.ty())?;
                for (i, (value, block)) in incoming.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " [ {}, %{} ]", value, self.label_of(Some(*block)))?;
                }
                Ok(())
            }
            Inst::Call { dest, func, args } => {
                if let Some(dest) = dest {
                    write!(f, "{dest} = ")?;
                }
                let func_ty = func.ty();
                let ret = func_ty.ret().expect("call through a non-function");
                write!(f, "call {ret} {func}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", arg.ty(), arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Type, Value};
    use crate::source_manager::Symbol;

    #[test]
    fn globals_render_flattened_words() {
        let g = GlobalVarDef {
            name: Symbol::from("a"),
            ty: Type::array(vec![2, 3]),
            is_const: false,
            init: vec![1, 2, 3, 4, 5, 6],
            is_zero_init: false,
        };
        assert_eq!(
            g.to_string(),
            "@a = global [2 x [3 x i32]] [1, 2, 3, 4, 5, 6]"
        );
    }

    #[test]
    fn zero_initialized_global_renders_zeroinitializer() {
        let g = GlobalVarDef {
            name: Symbol::from("z"),
            ty: Type::array(vec![4]),
            is_const: true,
            init: vec![],
            is_zero_init: true,
        };
        assert_eq!(g.to_string(), "@z = constant [4 x i32] zeroinitializer");
    }

    #[test]
    fn function_definition_renders_blocks_and_insts() {
        let mut def = FuncDef::new(
            Symbol::from("main"),
            Type::func(Type::I32, vec![]),
            vec![],
        );
        let entry = def.add_block(Symbol::from("entry"));
        def.push_inst(entry, Inst::ret(Value::imm(7)).unwrap());
        let text = def.to_string();
        assert!(text.contains("define i32 @main() {"), "{text}");
        assert!(text.contains("entry:"), "{text}");
        assert!(text.contains("ret i32 7"), "{text}");
    }

    #[test]
    fn declarations_render_parameter_types() {
        let d = FuncDecl {
            name: Symbol::from("putarray"),
            ty: Type::func(Type::Void, vec![Type::I32, Type::ptr(Type::I32)]),
        };
        assert_eq!(d.to_string(), "declare void @putarray(i32, i32*)");
    }
}
