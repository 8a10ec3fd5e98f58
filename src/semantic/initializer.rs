//! Array initializer normalization.
//!
//! Users write ragged initializers (`{1, {2, 3}, 4}` for `int[2][2]`, flat
//! scalar runs, or `{}` for zero). This pass rewrites each array
//! declaration's initializer into a tree whose shape matches the declared
//! dimension list exactly: every level has the declared extent, missing
//! scalars become zero literals, and missing sub-arrays become compact
//! filler lists standing for all-zero storage. Synthetic nodes carry the
//! empty source range and never show up in diagnostics.

use thin_vec::ThinVec;

use crate::ast::{Ast, AstId, InitListData, Node, NodeKind};
use crate::source_manager::SourceRange;

/// Normalize a user-written initializer list against `shape`. Returns the
/// root of the shape-matching tree; reused user expressions keep their
/// nodes, everything synthesized is fresh.
pub fn normalize(ast: &mut Ast, list: AstId, shape: &[i32]) -> AstId {
    let elems: Vec<AstId> = match ast.get_kind(list) {
        NodeKind::InitListExpr(data) => data.elems.to_vec(),
        _ => unreachable!("normalizing a non-list initializer"),
    };
    normalize_parts(ast, &elems, shape)
}

fn normalize_parts(ast: &mut Ast, elems: &[AstId], shape: &[i32]) -> AstId {
    if shape.is_empty() {
        // Scalar position: a braced scalar takes its first element.
        return match elems.first() {
            Some(&e) => e,
            None => zero_literal(ast),
        };
    }
    if elems.is_empty() {
        return filler_list(ast, shape);
    }

    let outer = shape[0] as usize;
    let inner = &shape[1..];
    let sub_size: usize = inner.iter().map(|&d| d as usize).product();

    let mut children = Vec::with_capacity(outer);
    let mut cursor = 0usize;
    for _ in 0..outer {
        if cursor >= elems.len() {
            children.push(filler_child(ast, inner));
            continue;
        }
        let elem = elems[cursor];
        if is_list(ast, elem) {
            // A braced sub-list covers one slot on its own.
            let sub_elems: Vec<AstId> = match ast.get_kind(elem) {
                NodeKind::InitListExpr(data) => data.elems.to_vec(),
                _ => unreachable!(),
            };
            cursor += 1;
            children.push(normalize_parts(ast, &sub_elems, inner));
        } else if inner.is_empty() {
            children.push(elem);
            cursor += 1;
        } else {
            // Flat run: the next sub_size elements fill one sub-array.
            let end = (cursor + sub_size).min(elems.len());
            let run = elems[cursor..end].to_vec();
            cursor = end;
            children.push(normalize_parts(ast, &run, inner));
        }
    }

    let node = ast.push_node(Node::new(
        NodeKind::InitListExpr(InitListData {
            elems: children.iter().copied().collect(),
            shape: shape.iter().copied().collect(),
            is_filler: false,
        }),
        SourceRange::empty(),
    ));
    for child in children {
        ast.get_node(child).set_parent(node);
    }
    node
}

fn filler_child(ast: &mut Ast, shape: &[i32]) -> AstId {
    if shape.is_empty() {
        zero_literal(ast)
    } else {
        filler_list(ast, shape)
    }
}

fn filler_list(ast: &mut Ast, shape: &[i32]) -> AstId {
    ast.push_node(Node::new(
        NodeKind::InitListExpr(InitListData {
            elems: ThinVec::new(),
            shape: shape.iter().copied().collect(),
            is_filler: true,
        }),
        SourceRange::empty(),
    ))
}

fn zero_literal(ast: &mut Ast) -> AstId {
    let id = ast.push_node(Node::new(
        NodeKind::IntegerLiteral(0),
        SourceRange::empty(),
    ));
    ast.get_node(id).set_const_value(0);
    id
}

fn is_list(ast: &Ast, id: AstId) -> bool {
    matches!(ast.get_kind(id), NodeKind::InitListExpr(_))
}

/// Row-major flattening of a normalized initializer tree. `None` slots are
/// the implied zeros of a filler sub-list.
pub fn flatten(ast: &Ast, node: AstId) -> Vec<Option<AstId>> {
    let mut out = Vec::new();
    collect(ast, node, &mut out);
    out
}

fn collect(ast: &Ast, node: AstId, out: &mut Vec<Option<AstId>>) {
    match ast.get_kind(node) {
        NodeKind::InitListExpr(data) if data.is_filler => {
            let count: i64 = data.shape.iter().map(|&d| d as i64).product();
            out.extend(std::iter::repeat_n(None, count as usize));
        }
        NodeKind::InitListExpr(data) => {
            for &elem in &data.elems {
                collect(ast, elem, out);
            }
        }
        _ => out.push(Some(node)),
    }
}
