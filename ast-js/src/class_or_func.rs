use crate::binding::Binding;
use crate::expr::Expr;
use crate::stmt::SBlock;
use crate::symbol::LocRef;
use crate::symbol::Ref;
use bitflags::bitflags;
use diagnostics::Loc;
use diagnostics::Range;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Decorator {
  pub value: Expr,
  pub at_loc: Loc,
  pub omit_newline_after: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PropertyKind {
  Normal,
  Get,
  Set,
  AutoAccessor,
  Spread,
  DeclareOrAbstract,
  ClassStaticBlock,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ClassStaticBlock {
  pub block: SBlock,
  pub loc: Loc,
}

bitflags! {
  #[derive(Clone, Copy, Default, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
  pub struct PropertyFlags: u8 {
    const IS_COMPUTED = 1 << 0;
    const IS_METHOD = 1 << 1;
    const IS_STATIC = 1 << 2;
    const WAS_SHORTHAND = 1 << 3;
    const PREFER_QUOTED_KEY = 1 << 4;
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Property {
  pub class_static_block: Option<ClassStaticBlock>,

  pub key: Expr,

  /// Omitted for class fields.
  pub value: Option<Expr>,

  /// The default in a destructuring pattern (`{a = 1} = {}`), or a class
  /// field initializer (`class Foo { a = 1 }`).
  pub initializer: Option<Expr>,

  pub decorators: Vec<Decorator>,

  pub loc: Loc,
  pub close_bracket_loc: Loc,
  pub kind: PropertyKind,
  pub flags: PropertyFlags,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PropertyBinding {
  pub key: Expr,
  pub value: Binding,
  pub default_value: Option<Expr>,
  pub loc: Loc,
  pub close_bracket_loc: Loc,
  pub is_computed: bool,
  pub is_spread: bool,
  pub prefer_quoted_key: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Arg {
  pub binding: Binding,
  pub default_value: Option<Expr>,
  pub decorators: Vec<Decorator>,

  /// `constructor(public x: boolean) {}`
  pub is_type_script_ctor_field: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Fn {
  pub name: Option<LocRef>,
  pub args: Vec<Arg>,
  pub body: FnBody,
  pub arguments_ref: Ref,
  pub open_paren_loc: Loc,

  pub is_async: bool,
  pub is_generator: bool,
  pub has_rest_arg: bool,
  pub has_if_scope: bool,

  /// A preceding `@__NO_SIDE_EFFECTS__` comment.
  pub has_no_side_effects_comment: bool,

  /// True for methods, whose parameter names may not repeat.
  pub is_unique_formal_parameters: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FnBody {
  pub block: SBlock,
  pub loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Class {
  pub decorators: Vec<Decorator>,
  pub name: Option<LocRef>,
  pub extends: Option<Expr>,
  pub properties: Vec<Property>,
  pub class_keyword: Range,
  pub body_loc: Loc,
  pub close_brace_loc: Loc,

  /// When false (TypeScript `useDefineForClassFields: false`), field
  /// initializers compile to assignments and may run setters, so they
  /// cannot be assumed side-effect free.
  pub use_define_for_class_fields: bool,
}
