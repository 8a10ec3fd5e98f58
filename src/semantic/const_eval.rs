//! Compile-time integer arithmetic.
//!
//! The resolver drives the traversal; this module holds the evaluation
//! rules. All arithmetic is 32-bit signed with wrapping overflow for
//! `+ - *` and truncated signed division for `/ %`. Division or remainder
//! by zero in a constant context has no value and is rejected by the
//! caller.

use crate::ast::{Ast, AstId, BinaryOpKind, InitListData, NodeKind, UnaryOpKind};

pub fn eval_unary(op: UnaryOpKind, value: i32) -> i32 {
    match op {
        UnaryOpKind::Plus => value,
        UnaryOpKind::Minus => value.wrapping_neg(),
        UnaryOpKind::Not => (value == 0) as i32,
    }
}

/// Evaluate a binary operator over two constants. `None` means division by
/// zero; assignment is never constant and must not reach here.
pub fn eval_binary(op: BinaryOpKind, lhs: i32, rhs: i32) -> Option<i32> {
    let value = match op {
        BinaryOpKind::Add => lhs.wrapping_add(rhs),
        BinaryOpKind::Sub => lhs.wrapping_sub(rhs),
        BinaryOpKind::Mul => lhs.wrapping_mul(rhs),
        BinaryOpKind::Div => {
            if rhs == 0 {
                return None;
            }
            lhs.wrapping_div(rhs)
        }
        BinaryOpKind::Rem => {
            if rhs == 0 {
                return None;
            }
            lhs.wrapping_rem(rhs)
        }
        BinaryOpKind::LogicAnd => ((lhs != 0) && (rhs != 0)) as i32,
        BinaryOpKind::LogicOr => ((lhs != 0) || (rhs != 0)) as i32,
        BinaryOpKind::Eq => (lhs == rhs) as i32,
        BinaryOpKind::Ne => (lhs != rhs) as i32,
        BinaryOpKind::Lt => (lhs < rhs) as i32,
        BinaryOpKind::Le => (lhs <= rhs) as i32,
        BinaryOpKind::Gt => (lhs > rhs) as i32,
        BinaryOpKind::Ge => (lhs >= rhs) as i32,
        BinaryOpKind::Assign => unreachable!("assignment in constant evaluation"),
    };
    Some(value)
}

/// Value of a fully-indexed element of a `const` declaration.
///
/// For scalars the value is the initializer's. For arrays the indices walk
/// the normalized initializer tree level by level; filler sub-lists are
/// all-zero by definition.
pub fn const_ref_value(ast: &Ast, init: AstId, indices: &[i32]) -> i32 {
    let mut cursor = init;
    for &index in indices {
        match ast.get_kind(cursor) {
            NodeKind::InitListExpr(InitListData {
                is_filler: true, ..
            }) => return 0,
            NodeKind::InitListExpr(list) => {
                cursor = list.elems[index as usize];
            }
            _ => break,
        }
    }
    ast.get_node(cursor)
        .const_value()
        .expect("const reference into a non-constant initializer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_wraps_like_the_target() {
        assert_eq!(eval_binary(BinaryOpKind::Add, i32::MAX, 1), Some(i32::MIN));
        assert_eq!(eval_binary(BinaryOpKind::Mul, 1 << 20, 1 << 20), Some(0));
        assert_eq!(eval_binary(BinaryOpKind::Div, i32::MIN, -1), Some(i32::MIN));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(eval_binary(BinaryOpKind::Div, -7, 2), Some(-3));
        assert_eq!(eval_binary(BinaryOpKind::Rem, -7, 2), Some(-1));
        assert_eq!(eval_binary(BinaryOpKind::Rem, 7, -2), Some(1));
    }

    #[test]
    fn division_by_zero_has_no_value() {
        assert_eq!(eval_binary(BinaryOpKind::Div, 1, 0), None);
        assert_eq!(eval_binary(BinaryOpKind::Rem, 1, 0), None);
    }

    #[test]
    fn comparisons_yield_zero_or_one() {
        assert_eq!(eval_binary(BinaryOpKind::Lt, 1, 2), Some(1));
        assert_eq!(eval_binary(BinaryOpKind::Ge, 1, 2), Some(0));
        assert_eq!(eval_binary(BinaryOpKind::LogicAnd, 3, 0), Some(0));
        assert_eq!(eval_binary(BinaryOpKind::LogicOr, 3, 0), Some(1));
    }

    #[test]
    fn unary_not_collapses_to_boolean() {
        assert_eq!(eval_unary(UnaryOpKind::Not, 0), 1);
        assert_eq!(eval_unary(UnaryOpKind::Not, 42), 0);
        assert_eq!(eval_unary(UnaryOpKind::Minus, i32::MIN), i32::MIN);
    }
}
