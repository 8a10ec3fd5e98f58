//! IR values: immediates, named storage, and SSA-style temporaries.

use std::fmt;

use crate::ir::types::{Type, Width};
use crate::source_manager::Symbol;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer immediate. Source literals are always `i32`; `i1`
    /// immediates only arise from compile-time-folded conditions.
    Imm(i32, Width),
    Global { name: Symbol, ty: Type },
    Local { name: Symbol, ty: Type },
    /// Function-local value numbered by the per-function counter.
    Temp { id: u32, ty: Type },
}

impl Value {
    pub fn imm(value: i32) -> Value {
        Value::Imm(value, Width::I32)
    }

    pub fn imm_bool(value: bool) -> Value {
        Value::Imm(value as i32, Width::I1)
    }

    pub fn global(name: Symbol, ty: Type) -> Value {
        Value::Global { name, ty }
    }

    pub fn local(name: Symbol, ty: Type) -> Value {
        Value::Local { name, ty }
    }

    pub fn temp(id: u32, ty: Type) -> Value {
        Value::Temp { id, ty }
    }

    pub fn ty(&self) -> Type {
        match self {
            Value::Imm(_, w) => Type::Int(*w),
            Value::Global { ty, .. } | Value::Local { ty, .. } | Value::Temp { ty, .. } => {
                ty.clone()
            }
        }
    }

    pub fn width(&self) -> Option<Width> {
        self.ty().width()
    }

    pub fn is_i1(&self) -> bool {
        self.ty().is_i1()
    }

    pub fn temp_id(&self) -> Option<u32> {
        match self {
            Value::Temp { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Imm(v, _) => write!(f, "{v}"),
            Value::Global { name, .. } => write!(f, "@{name}"),
            Value::Local { name, .. } => write!(f, "%{name}"),
            Value::Temp { id, .. } => write!(f, "%{id}"),
        }
    }
}
