//! Initializer normalization: shapes, fillers, flattening.

use crate::ast::{AstId, NodeKind, RetType};
use crate::semantic::initializer;
use crate::tests::factory::AstFactory;

/// Build `int a<dims> = <init>; int main() { return 0; }`, run analysis,
/// and hand back the declaration's normalized initializer.
fn normalized(f: &mut AstFactory, decl: AstId) -> AstId {
    let zero = f.int(0);
    let ret = f.ret(Some(zero));
    let body = f.compound(vec![ret]);
    let main = f.function("main", RetType::Int, vec![], Some(body));
    f.unit(vec![decl, main]);
    f.analyze().unwrap();
    match f.ast.get_kind(decl) {
        NodeKind::VarDecl(data) => data.init.expect("declaration lost its initializer"),
        other => panic!("not a variable declaration: {other:?}"),
    }
}

/// Row-major words of a normalized initializer; filler slots read 0.
fn words(f: &AstFactory, init: AstId) -> Vec<i32> {
    initializer::flatten(&f.ast, init)
        .into_iter()
        .map(|slot| match slot {
            None => 0,
            Some(elem) => f.ast.get_node(elem).const_value().expect("non-const leaf"),
        })
        .collect()
}

/// Invariant 5: tree depth equals the dimension count and every level has
/// exactly the declared extent; filler lists carry the residual shape.
fn assert_shape(f: &AstFactory, node: AstId, shape: &[i32]) {
    match f.ast.get_kind(node) {
        NodeKind::InitListExpr(data) => {
            assert!(!shape.is_empty(), "list deeper than the declared shape");
            assert_eq!(&data.shape[..], shape, "stored shape disagrees");
            if data.is_filler {
                assert!(data.elems.is_empty(), "filler list with elements");
                return;
            }
            assert_eq!(
                data.elems.len(),
                shape[0] as usize,
                "level extent does not match the declaration"
            );
            for &elem in &data.elems {
                assert_shape(f, elem, &shape[1..]);
            }
        }
        _ => assert!(shape.is_empty(), "scalar leaf above the deepest level"),
    }
}

#[test]
fn nested_initializer_keeps_its_shape() {
    // int a[2][3] = {{1, 2, 3}, {4, 5, 6}};
    let mut f = AstFactory::new();
    let a_tok = f.declare("a");
    let d0 = f.int(2);
    let d1 = f.int(3);
    let e: Vec<AstId> = (1..=6).map(|v| f.int(v)).collect();
    let row0 = f.init_list(vec![e[0], e[1], e[2]]);
    let row1 = f.init_list(vec![e[3], e[4], e[5]]);
    let init = f.init_list(vec![row0, row1]);
    let a = f.var_decl_at(a_tok, "a", vec![d0, d1], Some(init), false);

    let root = normalized(&mut f, a);
    assert_shape(&f, root, &[2, 3]);
    assert_eq!(words(&f, root), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn ragged_initializer_from_the_manual() {
    // int a[2][2] = {1, {2, 3}, 4};  ->  {{1, 2}, {4, 0}}
    let mut f = AstFactory::new();
    let a_tok = f.declare("a");
    let d0 = f.int(2);
    let d1 = f.int(2);
    let one = f.int(1);
    let two = f.int(2);
    let three = f.int(3);
    let sub = f.init_list(vec![two, three]);
    let four = f.int(4);
    let init = f.init_list(vec![one, sub, four]);
    let a = f.var_decl_at(a_tok, "a", vec![d0, d1], Some(init), false);

    let root = normalized(&mut f, a);
    assert_shape(&f, root, &[2, 2]);
    assert_eq!(words(&f, root), vec![1, 2, 4, 0]);
}

#[test]
fn flat_scalars_fill_row_major() {
    // int a[2][3] = {1, 2, 3, 4};
    let mut f = AstFactory::new();
    let a_tok = f.declare("a");
    let d0 = f.int(2);
    let d1 = f.int(3);
    let e: Vec<AstId> = (1..=4).map(|v| f.int(v)).collect();
    let init = f.init_list(e);
    let a = f.var_decl_at(a_tok, "a", vec![d0, d1], Some(init), false);

    let root = normalized(&mut f, a);
    assert_shape(&f, root, &[2, 3]);
    assert_eq!(words(&f, root), vec![1, 2, 3, 4, 0, 0]);
}

#[test]
fn empty_list_normalizes_to_a_filler_root() {
    // int a[2][3] = {};
    let mut f = AstFactory::new();
    let a_tok = f.declare("a");
    let d0 = f.int(2);
    let d1 = f.int(3);
    let init = f.init_list(vec![]);
    let a = f.var_decl_at(a_tok, "a", vec![d0, d1], Some(init), false);

    let root = normalized(&mut f, a);
    match f.ast.get_kind(root) {
        NodeKind::InitListExpr(data) => {
            assert!(data.is_filler);
            assert_eq!(&data.shape[..], &[2, 3]);
        }
        other => panic!("expected a filler list, got {other:?}"),
    }
    assert_eq!(words(&f, root), vec![0; 6]);
}

#[test]
fn short_rows_pad_with_zero_literals() {
    // int a[2][2] = {{1}, {2}};
    let mut f = AstFactory::new();
    let a_tok = f.declare("a");
    let d0 = f.int(2);
    let d1 = f.int(2);
    let one = f.int(1);
    let row0 = f.init_list(vec![one]);
    let two = f.int(2);
    let row1 = f.init_list(vec![two]);
    let init = f.init_list(vec![row0, row1]);
    let a = f.var_decl_at(a_tok, "a", vec![d0, d1], Some(init), false);

    let root = normalized(&mut f, a);
    assert_shape(&f, root, &[2, 2]);
    assert_eq!(words(&f, root), vec![1, 0, 2, 0]);
}

#[test]
fn synthetic_nodes_carry_the_empty_range() {
    // int a[3] = {7};
    let mut f = AstFactory::new();
    let a_tok = f.declare("a");
    let d0 = f.int(3);
    let seven = f.int(7);
    let init = f.init_list(vec![seven]);
    let a = f.var_decl_at(a_tok, "a", vec![d0], Some(init), false);

    let root = normalized(&mut f, a);
    let slots = initializer::flatten(&f.ast, root);
    assert_eq!(slots.len(), 3);

    let first = slots[0].unwrap();
    assert!(!f.ast.get_node(first).range.is_empty(), "user node kept its range");
    for slot in &slots[1..] {
        let filler = slot.expect("scalar padding is materialized");
        let node = f.ast.get_node(filler);
        assert!(node.range.is_empty(), "filler must have no source range");
        assert_eq!(node.const_value(), Some(0));
    }
}

#[test]
fn deep_shapes_normalize_every_level() {
    // int a[2][2][2] = {1, 2, 3, {4}, {{5}, 6}};
    let mut f = AstFactory::new();
    let a_tok = f.declare("a");
    let dims: Vec<AstId> = (0..3).map(|_| f.int(2)).collect();
    let e1 = f.int(1);
    let e2 = f.int(2);
    let e3 = f.int(3);
    let e4 = f.int(4);
    let sub4 = f.init_list(vec![e4]);
    let e5 = f.int(5);
    let sub5 = f.init_list(vec![e5]);
    let e6 = f.int(6);
    let sub56 = f.init_list(vec![sub5, e6]);
    let init = f.init_list(vec![e1, e2, e3, sub4, sub56]);
    let a = f.var_decl_at(a_tok, "a", dims, Some(init), false);

    let root = normalized(&mut f, a);
    assert_shape(&f, root, &[2, 2, 2]);
    // The flat run {1,2,3,{4}} fills the first [2][2] block, with {4}
    // consumed at scalar depth; {{5},6} covers the second block.
    assert_eq!(words(&f, root), vec![1, 2, 3, 4, 5, 0, 6, 0]);
}
