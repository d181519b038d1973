//! Whole-envelope round-trip laws: structural losslessness, the
//! encode/decode fixpoint, and the numeric and scope boundary cases.

use ast_js::ast::JsAst;
use ast_js::ast::SerializedAst;
use ast_js::binding::BIdentifier;
use ast_js::binding::Binding;
use ast_js::const_value::ConstValue;
use ast_js::expr::ENumber;
use ast_js::expr::Expr;
use ast_js::num::JsNumber;
use ast_js::part::Part;
use ast_js::scope::Scope;
use ast_js::scope::ScopeKind;
use ast_js::scope::TsNamespaceMember;
use ast_js::scope::TsNamespaceMemberData;
use ast_js::scope::TsNamespaceMembers;
use ast_js::scope::TsNamespaceScope;
use ast_js::stmt::Decl;
use ast_js::stmt::LocalKind;
use ast_js::stmt::SLocal;
use ast_js::stmt::Stmt;
use ast_js::symbol::Ref;
use ast_js::symbol::Symbol;
use ast_js::symbol::SymbolKind;
use diagnostics::Loc;
use std::sync::Arc;

fn number_stmt(loc: i32, ref_inner: u32, value: f64) -> Stmt {
  Stmt::new(Loc(loc), SLocal {
    decls: vec![Decl {
      binding: Binding::new(Loc(loc + 6), BIdentifier {
        ref_: Ref::new(1, ref_inner),
      }),
      value: Some(Expr::new(Loc(loc + 10), ENumber {
        value: JsNumber(value),
      })),
    }],
    kind: LocalKind::Const,
    is_export: false,
    was_ts_import_equals: false,
  })
}

fn ast_with_boundary_numbers() -> JsAst {
  let mut ast = JsAst::new();
  let mut char_freq = ast_js::symbol::CharFreq::default();
  char_freq.scan("nnnnn", 1);
  ast.char_freq = Some(Box::new(char_freq));
  let values = [
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::NAN,
    f64::MAX,
    5e-324, // smallest positive subnormal
  ];
  let mut part = Part::default();
  part.scopes.push(ast.module_scope);
  for (i, value) in values.into_iter().enumerate() {
    part.stmts.push(number_stmt(i as i32 * 20, i as u32, value));
    ast.symbols.push(Symbol::new(SymbolKind::Const, format!("n{i}")));
  }
  ast.parts.push(part);
  ast
}

fn encode(ast: &JsAst) -> Vec<u8> {
  serde_json::to_vec(&ast.to_serialized()).unwrap()
}

fn decode(bytes: &[u8]) -> JsAst {
  serde_json::from_slice::<SerializedAst>(bytes).unwrap().into_ast().unwrap()
}

#[test]
fn boundary_numbers_survive_a_round_trip() {
  let ast = ast_with_boundary_numbers();
  let back = decode(&encode(&ast));
  assert_eq!(back, ast);
}

#[test]
fn infinity_literal_round_trips() {
  // The AST for `const x = 1/0;` after constant folding.
  let mut ast = JsAst::new();
  ast.symbols.push(Symbol::new(SymbolKind::Const, "x"));
  let mut part = Part::default();
  part.stmts.push(number_stmt(0, 0, f64::INFINITY));
  ast.parts.push(part);
  ast.const_values.insert(Ref::new(1, 0), ConstValue::Number(JsNumber(f64::INFINITY)));

  let back = decode(&encode(&ast));
  match *back.const_values.get(&Ref::new(1, 0)).unwrap() {
    ConstValue::Number(n) => assert_eq!(n.0, f64::INFINITY),
    other => panic!("unexpected const value: {other:?}"),
  }
  assert_eq!(back, ast);
}

#[test]
fn encode_decode_reaches_a_fixpoint_after_one_cycle() {
  let ast = ast_with_boundary_numbers();
  let first = encode(&ast);
  let second = encode(&decode(&first));
  assert_eq!(first, second);

  // And encoding equal values is byte-deterministic.
  assert_eq!(encode(&ast), encode(&ast));
}

#[test]
fn deep_scope_tree_round_trips_inside_the_envelope() {
  let mut ast = JsAst::new();
  let mut current = ast.module_scope;
  for _ in 0..1200 {
    current = ast.scopes.alloc_child(current, Scope::new(ScopeKind::Block));
  }

  let back = decode(&encode(&ast));
  assert_eq!(back, ast);

  // Every parent back-edge is restored: parent(child(s, i)) == s.
  for id in back.scopes.preorder(back.module_scope) {
    for &child in &back.scopes.get(id).children {
      assert_eq!(back.scopes.get(child).parent, Some(id));
    }
  }
}

#[test]
fn namespace_reopens_round_trip() {
  let shared: Arc<TsNamespaceMembers> = Arc::new(
    [
      (
        "A".to_string(),
        TsNamespaceMember {
          loc: Loc(3),
          data: TsNamespaceMemberData::EnumNumber { value: JsNumber(0.0) },
        },
      ),
      (
        "B".to_string(),
        TsNamespaceMember {
          loc: Loc(9),
          data: TsNamespaceMemberData::EnumString {
            value: "b".encode_utf16().collect(),
          },
        },
      ),
    ]
    .into_iter()
    .collect(),
  );

  let mut ast = JsAst::new();
  for i in 0..2 {
    let body = ast.scopes.alloc_child(ast.module_scope, Scope::new(ScopeKind::Entry));
    ast.scopes.get_mut(body).ts_namespace = Some(TsNamespaceScope {
      exported_members: Arc::clone(&shared),
      arg_ref: Ref::new(1, i),
      is_enum_scope: false,
    });
  }

  let back = decode(&encode(&ast));
  assert_eq!(back, ast);
}
