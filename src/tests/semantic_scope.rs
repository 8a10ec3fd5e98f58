//! Scope linking: parent back-links, identifier maps, duplicate detection.

use crate::ast::{NodeKind, RetType};
use crate::diagnostic::SemanticError;
use crate::semantic::scope_walker;
use crate::tests::factory::{AstFactory, main_program};

#[test]
fn duplicate_names_in_one_scope_are_rejected() {
    // int main() { int a; int a; }
    let mut f = AstFactory::new();
    let first = f.var_decl("a", vec![], None, false);
    let second = f.var_decl("a", vec![], None, false);
    let decls = f.decl_stmt(vec![first, second]);
    main_program(&mut f, vec![decls]);

    match f.analyze() {
        Err(SemanticError::Redefinition { name, .. }) => assert_eq!(name.as_str(), "a"),
        other => panic!("expected a redefinition error, got {other:?}"),
    }
}

#[test]
fn parameter_and_local_share_the_body_scope() {
    // int f(int x) { int x; return 0; }
    let mut f = AstFactory::new();
    let param = f.param("x", false, vec![]);
    let local = f.var_decl("x", vec![], None, false);
    let decl = f.decl_stmt(vec![local]);
    let zero = f.int(0);
    let ret = f.ret(Some(zero));
    let body = f.compound(vec![decl, ret]);
    let func = f.function("f", RetType::Int, vec![param], Some(body));
    f.unit(vec![func]);

    assert!(matches!(
        f.analyze(),
        Err(SemanticError::Redefinition { .. })
    ));
}

#[test]
fn shadowing_across_scopes_is_legal() {
    // int a; int main() { int a; { int a; } return 0; }
    let mut f = AstFactory::new();
    let global = f.var_decl("a", vec![], None, false);
    let outer = f.var_decl("a", vec![], None, false);
    let outer_decl = f.decl_stmt(vec![outer]);
    let inner = f.var_decl("a", vec![], None, false);
    let inner_decl = f.decl_stmt(vec![inner]);
    let inner_block = f.compound(vec![inner_decl]);
    let zero = f.int(0);
    let ret = f.ret(Some(zero));
    let body = f.compound(vec![outer_decl, inner_block, ret]);
    let main = f.function("main", RetType::Int, vec![], Some(body));
    f.unit(vec![global, main]);

    assert!(f.analyze().is_ok());
}

#[test]
fn link_sets_parents_for_every_reachable_node() {
    let mut f = AstFactory::new();
    let five = f.int(5);
    let decl = f.var_decl("a", vec![], Some(five), false);
    let stmt = f.decl_stmt(vec![decl]);
    let a_ref = f.var_ref("a");
    let one = f.int(1);
    let add = f.bin(crate::ast::BinaryOpKind::Add, a_ref, one);
    let lhs = f.var_ref("a");
    let set = f.assign(lhs, add);
    let a_ret = f.var_ref("a");
    let ret = f.ret(Some(a_ret));
    let root = main_program(&mut f, vec![stmt, set, ret]);

    scope_walker::link(&mut f.ast).unwrap();

    // Parent round-trip: every non-root node is a child of its parent.
    for id in f.ast.ids().collect::<Vec<_>>() {
        if id == root {
            assert_eq!(f.ast.get_node(id).parent(), None);
            continue;
        }
        let parent = f
            .ast
            .get_node(id)
            .parent()
            .unwrap_or_else(|| panic!("node {id} has no parent after link"));
        assert!(
            f.ast.children(parent).contains(&id),
            "node {id} is not a child of its parent {parent}"
        );
    }
}

#[test]
fn translation_unit_scope_holds_builtins_and_user_decls() {
    let mut f = AstFactory::new();
    let zero = f.int(0);
    let ret = f.ret(Some(zero));
    let root = main_program(&mut f, vec![ret]);

    scope_walker::link(&mut f.ast).unwrap();

    let scope = f.ast.scope_map(root).unwrap();
    assert!(scope.contains_key(&crate::ast::Symbol::from("main")));
    assert!(scope.contains_key(&crate::ast::Symbol::from("getint")));

    let NodeKind::TranslationUnit(tu) = f.ast.get_kind(root) else {
        panic!("root is not a translation unit");
    };
    assert_eq!(tu.builtins.len(), 8);
}
