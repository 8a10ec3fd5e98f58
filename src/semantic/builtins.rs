//! Runtime built-in declarations.
//!
//! SysY programs link against a small runtime of I/O and timing helpers.
//! The scope walker injects these as body-less `FunctionDecl`s into the
//! translation-unit scope before the user declarations are processed, so
//! references resolve through the ordinary lookup path. Built-ins carry no
//! source token and order before every user token.

use thin_vec::ThinVec;

use crate::ast::{
    Ast, AstId, FunctionDeclData, Node, NodeKind, ParamVarDeclData, RetType, Symbol,
};
use crate::source_manager::SourceRange;

/// A built-in parameter: `int` scalar or `int*`.
#[derive(Debug, Clone, Copy)]
enum BuiltinParam {
    Int,
    IntPtr,
}

const BUILTINS: &[(&str, RetType, &[BuiltinParam])] = &[
    ("getint", RetType::Int, &[]),
    ("getch", RetType::Int, &[]),
    ("getarray", RetType::Int, &[BuiltinParam::IntPtr]),
    ("putint", RetType::Void, &[BuiltinParam::Int]),
    ("putch", RetType::Void, &[BuiltinParam::Int]),
    (
        "putarray",
        RetType::Void,
        &[BuiltinParam::Int, BuiltinParam::IntPtr],
    ),
    ("_sysy_starttime", RetType::Void, &[BuiltinParam::Int]),
    ("_sysy_stoptime", RetType::Void, &[BuiltinParam::Int]),
];

/// Inject the built-in declarations into `unit`'s scope and record them on
/// the translation unit, in registration order.
pub fn install(ast: &mut Ast, unit: AstId) {
    for &(name, ret_type, params) in BUILTINS {
        let mut param_ids = ThinVec::new();
        for (i, param) in params.iter().enumerate() {
            let data = ParamVarDeclData {
                name: Symbol::from(format!("p{i}").as_str()),
                ident: None,
                is_pointer: matches!(param, BuiltinParam::IntPtr),
                dims: ThinVec::new(),
            };
            param_ids.push(ast.push_node(Node::new(
                NodeKind::ParamVarDecl(data),
                SourceRange::empty(),
            )));
        }

        let name = Symbol::from(name);
        let decl = ast.push_node(Node::new(
            NodeKind::FunctionDecl(FunctionDeclData {
                name,
                ident: None,
                ret_type,
                params: param_ids.clone(),
                body: None,
            }),
            SourceRange::empty(),
        ));
        for param in param_ids {
            ast.get_node(param).set_parent(decl);
        }
        ast.get_node(decl).set_parent(unit);

        ast.scope_insert(unit, name, decl);
        if let NodeKind::TranslationUnit(tu) = &mut ast.get_node_mut(unit).kind {
            tu.builtins.push(decl);
        }
    }
}
