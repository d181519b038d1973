use crate::binding::Binding;
use crate::class_or_func::Class;
use crate::class_or_func::Fn;
use crate::expr::Expr;
use crate::symbol::LocRef;
use crate::symbol::Ref;
use derive_more::derive::From;
use diagnostics::Loc;
use diagnostics::Range;
use serde::Deserialize;
use serde::Serialize;

/// A statement node. `data: None` is the "no statement" slot and must
/// survive a round trip.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Stmt {
  pub loc: Loc,
  pub data: Option<Box<S>>,
}

impl Stmt {
  pub fn new(loc: Loc, data: impl Into<S>) -> Stmt {
    Stmt {
      loc,
      data: Some(Box::new(data.into())),
    }
  }

  pub fn none(loc: Loc) -> Stmt {
    Stmt { loc, data: None }
  }
}

#[derive(Clone, PartialEq, Debug, From, Serialize, Deserialize)]
#[serde(tag = "$t")]
pub enum S {
  Block(SBlock),
  Comment(SComment),
  Debugger(SDebugger),
  Directive(SDirective),
  Empty(SEmpty),
  TypeScript(STypeScript),
  ExportClause(SExportClause),
  ExportFrom(SExportFrom),
  ExportDefault(SExportDefault),
  ExportStar(SExportStar),
  ExportEquals(SExportEquals),
  LazyExport(SLazyExport),
  Expr(SExpr),
  Enum(SEnum),
  Namespace(SNamespace),
  Function(SFunction),
  Class(SClass),
  Label(SLabel),
  If(SIf),
  For(SFor),
  ForIn(SForIn),
  ForOf(SForOf),
  DoWhile(SDoWhile),
  While(SWhile),
  With(SWith),
  Try(STry),
  Switch(SSwitch),
  Import(SImport),
  Return(SReturn),
  Throw(SThrow),
  Local(SLocal),
  Break(SBreak),
  Continue(SContinue),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SBlock {
  pub stmts: Vec<Stmt>,
  pub close_brace_loc: Loc,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct SEmpty {}

/// A stand-in for an erased TypeScript type declaration.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct STypeScript {
  pub was_declare_class: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SComment {
  pub text: String,
  pub is_legal_comment: bool,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct SDebugger {}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SDirective {
  pub value: Vec<u16>,
  pub legacy_octal_loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SExportClause {
  pub items: Vec<ClauseItem>,
  pub is_single_line: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SExportFrom {
  pub items: Vec<ClauseItem>,
  pub namespace_ref: Ref,
  pub import_record_index: u32,
  pub is_single_line: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SExportDefault {
  /// An expression statement, function declaration, or class declaration.
  pub value: Stmt,
  pub default_name: LocRef,
}

/// The preserved alias of an `export * as name` statement. The namespace
/// symbol may be renamed later; the original alias must not follow it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExportStarAlias {
  pub original_name: String,
  pub loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SExportStar {
  pub alias: Option<ExportStarAlias>,
  pub namespace_ref: Ref,
  pub import_record_index: u32,
}

/// A TypeScript `export = value;` statement.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SExportEquals {
  pub value: Expr,
}

/// Whether this exports as `module.exports` or `export default` is decided
/// at link time.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SLazyExport {
  pub value: Expr,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SExpr {
  pub value: Expr,

  /// Set on expressions generated by class/function lowering (field
  /// initializations, name-keeping calls) so tree shaking can still treat
  /// the construct as removable.
  pub is_from_class_or_fn_that_can_be_removed_if_unused: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EnumValue {
  pub value: Option<Expr>,
  pub name: Vec<u16>,
  pub ref_: Ref,
  pub loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SEnum {
  pub values: Vec<EnumValue>,
  pub name: LocRef,
  pub arg: Ref,
  pub is_export: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SNamespace {
  pub stmts: Vec<Stmt>,
  pub name: LocRef,
  pub arg: Ref,
  pub is_export: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SFunction {
  pub fn_: Fn,
  pub is_export: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SClass {
  pub class: Class,
  pub is_export: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SLabel {
  pub stmt: Stmt,
  pub name: LocRef,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SIf {
  pub test: Expr,
  pub yes: Stmt,
  pub no: Option<Stmt>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SFor {
  /// A local declaration or expression statement, when present.
  pub init: Option<Stmt>,
  pub test: Option<Expr>,
  pub update: Option<Expr>,
  pub body: Stmt,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SForIn {
  pub init: Stmt,
  pub value: Expr,
  pub body: Stmt,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SForOf {
  pub init: Stmt,
  pub value: Expr,
  pub body: Stmt,
  pub await_: Range,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SDoWhile {
  pub body: Stmt,
  pub test: Expr,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SWhile {
  pub test: Expr,
  pub body: Stmt,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SWith {
  pub value: Expr,
  pub body: Stmt,
  pub body_loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Catch {
  pub loc: Loc,
  pub block_loc: Loc,
  pub binding: Option<Binding>,
  pub block: SBlock,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Finally {
  pub loc: Loc,
  pub block: SBlock,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct STry {
  pub block_loc: Loc,
  pub block: SBlock,

  // At least one of these is present.
  pub catch: Option<Catch>,
  pub finally: Option<Finally>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Case {
  /// `None` means `default:`.
  pub value: Option<Expr>,
  pub body: Vec<Stmt>,
  pub loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SSwitch {
  pub test: Expr,
  pub cases: Vec<Case>,
  pub body_loc: Loc,
  pub close_brace_loc: Loc,
}

/// Any of the import statement forms. A clause and a star namespace are
/// mutually exclusive; everything else combines freely.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SImport {
  pub default_name: Option<LocRef>,
  pub items: Option<Vec<ClauseItem>>,
  pub star_name_loc: Option<Loc>,

  /// For star imports, the ref of the namespace symbol. Otherwise an
  /// auto-generated ref for the namespace that represents the imported
  /// file, used when converting the module to CommonJS.
  pub namespace_ref: Ref,

  pub import_record_index: u32,
  pub is_single_line: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SReturn {
  pub value: Option<Expr>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SThrow {
  pub value: Expr,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum LocalKind {
  Var,
  Let,
  Const,
  Using,
  AwaitUsing,
}

impl LocalKind {
  pub fn is_using(self) -> bool {
    self >= LocalKind::Using
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SLocal {
  pub decls: Vec<Decl>,
  pub kind: LocalKind,
  pub is_export: bool,

  /// `import foo = bar` statements with no uses generate no code.
  pub was_ts_import_equals: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SBreak {
  pub label: Option<LocRef>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SContinue {
  pub label: Option<LocRef>,
}

/// One name in an import or export clause. For re-exports such as
/// `export {foo as bar} from 'path'`, both the original name and the alias
/// must survive renaming.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ClauseItem {
  pub alias: String,
  pub original_name: String,
  pub alias_loc: Loc,
  pub name: LocRef,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Decl {
  pub binding: Binding,
  pub value: Option<Expr>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::binding::BIdentifier;
  use crate::expr::ENumber;
  use crate::num::JsNumber;

  fn export_const_x() -> Stmt {
    Stmt::new(Loc(0), SLocal {
      decls: vec![Decl {
        binding: Binding::new(Loc(13), BIdentifier { ref_: Ref::new(1, 0) }),
        value: Some(Expr::new(Loc(17), ENumber { value: JsNumber(1.0) })),
      }],
      kind: LocalKind::Const,
      is_export: true,
      was_ts_import_equals: false,
    })
  }

  #[test]
  fn local_declaration_round_trips() {
    let stmt = export_const_x();
    let json = serde_json::to_string(&stmt).unwrap();
    assert!(json.contains("\"$t\":\"Local\""));
    let back: Stmt = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stmt);
  }

  #[test]
  fn absent_statement_slot_round_trips() {
    let stmt = Stmt::new(Loc(0), SIf {
      test: Expr::new(Loc(4), ENumber { value: JsNumber(0.0) }),
      yes: Stmt::none(Loc(7)),
      no: None,
    });
    let json = serde_json::to_string(&stmt).unwrap();
    let back: Stmt = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stmt);
  }

  #[test]
  fn with_statement_round_trips() {
    let stmt = Stmt::new(Loc(0), SWith {
      value: Expr::new(Loc(5), ENumber { value: JsNumber(1.0) }),
      body: Stmt::new(Loc(8), SBlock {
        stmts: vec![Stmt::new(Loc(9), SDebugger {})],
        close_brace_loc: Loc(20),
      }),
      body_loc: Loc(8),
    });
    let json = serde_json::to_string(&stmt).unwrap();
    let back: Stmt = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stmt);
  }

  #[test]
  fn using_kinds() {
    assert!(!LocalKind::Const.is_using());
    assert!(LocalKind::Using.is_using());
    assert!(LocalKind::AwaitUsing.is_using());
  }
}
