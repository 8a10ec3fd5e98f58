//! IR validation pass.
//!
//! Run after lowering, before the module is handed to the backend. Checks
//! the structural invariants lowering is supposed to uphold:
//! - every block ends with exactly one terminator, and nothing follows it;
//! - every branch target is resolved and in range;
//! - predecessor/successor lists agree with the terminators;
//! - every temp is assigned exactly once and read only after its
//!   definition has been laid out.

use std::fmt;

use hashbrown::HashSet;

use crate::ir::inst::Inst;
use crate::ir::{BlockId, FuncDef, Module};
use crate::source_manager::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingTerminator { func: Symbol, block: Symbol },
    EarlyTerminator { func: Symbol, block: Symbol },
    UnresolvedBranchTarget { func: Symbol, block: Symbol },
    TargetOutOfRange { func: Symbol, block: Symbol },
    EdgeMismatch { func: Symbol, block: Symbol },
    TempRedefined { func: Symbol, id: u32 },
    TempUsedBeforeDef { func: Symbol, id: u32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingTerminator { func, block } => {
                write!(f, "block %{block} in @{func} has no terminator")
            }
            ValidationError::EarlyTerminator { func, block } => {
                write!(f, "block %{block} in @{func} has a terminator before its end")
            }
            ValidationError::UnresolvedBranchTarget { func, block } => {
                write!(f, "block %{block} in @{func} ends in an unresolved branch")
            }
            ValidationError::TargetOutOfRange { func, block } => {
                write!(f, "block %{block} in @{func} branches out of range")
            }
            ValidationError::EdgeMismatch { func, block } => {
                write!(f, "edges of block %{block} in @{func} disagree with its terminator")
            }
            ValidationError::TempRedefined { func, id } => {
                write!(f, "%{id} in @{func} is defined more than once")
            }
            ValidationError::TempUsedBeforeDef { func, id } => {
                write!(f, "%{id} in @{func} is read before its definition")
            }
        }
    }
}

pub fn validate(module: &Module) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    for def in &module.func_defs {
        validate_function(def, &mut errors);
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn terminator_targets(inst: &Inst) -> Option<Vec<Option<BlockId>>> {
    match inst {
        Inst::Ret(_) => Some(Vec::new()),
        Inst::Br { dest } => Some(vec![Some(*dest)]),
        Inst::CondBr {
            if_true, if_false, ..
        } => Some(vec![*if_true, *if_false]),
        _ => None,
    }
}

fn validate_function(def: &FuncDef, errors: &mut Vec<ValidationError>) {
    let block_count = def.blocks.len() as u32;

    for (index, block) in def.blocks.iter().enumerate() {
        let here = BlockId(index as u32);

        match block.last() {
            Some(last) if last.is_terminator() => {}
            _ => {
                errors.push(ValidationError::MissingTerminator {
                    func: def.name,
                    block: block.label,
                });
                continue;
            }
        }
        if block.insts[..block.insts.len() - 1]
            .iter()
            .any(Inst::is_terminator)
        {
            errors.push(ValidationError::EarlyTerminator {
                func: def.name,
                block: block.label,
            });
        }

        let targets = terminator_targets(block.last().unwrap()).unwrap();
        let mut resolved = Vec::new();
        for target in targets {
            match target {
                None => errors.push(ValidationError::UnresolvedBranchTarget {
                    func: def.name,
                    block: block.label,
                }),
                Some(t) if t.0 >= block_count => {
                    errors.push(ValidationError::TargetOutOfRange {
                        func: def.name,
                        block: block.label,
                    });
                }
                Some(t) => resolved.push(t),
            }
        }

        // Edges must match the terminator in both directions.
        let succs: HashSet<BlockId> = block.succs.iter().copied().collect();
        let targets: HashSet<BlockId> = resolved.iter().copied().collect();
        if succs != targets {
            errors.push(ValidationError::EdgeMismatch {
                func: def.name,
                block: block.label,
            });
        }
        for succ in &targets {
            if !def.block(*succ).preds.contains(&here) {
                errors.push(ValidationError::EdgeMismatch {
                    func: def.name,
                    block: def.block(*succ).label,
                });
            }
        }
    }

    validate_temps(def, errors);
}

/// Single-assignment and definition-before-use for temps. Blocks are laid
/// out in creation order, which for this lowering engine means every
/// definition precedes its uses in layout order.
fn validate_temps(def: &FuncDef, errors: &mut Vec<ValidationError>) {
    let mut defined: HashSet<u32> = HashSet::new();
    for param in &def.params {
        if let Some(id) = param.temp_id() {
            defined.insert(id);
        }
    }

    for block in &def.blocks {
        for inst in &block.insts {
            for operand in inst.operands() {
                if let Some(id) = operand.temp_id() {
                    if !defined.contains(&id) {
                        errors.push(ValidationError::TempUsedBeforeDef {
                            func: def.name,
                            id,
                        });
                    }
                }
            }
            if let Some(dest) = inst.dest() {
                if let Some(id) = dest.temp_id() {
                    if !defined.insert(id) {
                        errors.push(ValidationError::TempRedefined { func: def.name, id });
                    }
                }
            }
        }
    }
}
