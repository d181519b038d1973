use crate::class_or_func::Arg;
use crate::class_or_func::Class;
use crate::class_or_func::Fn;
use crate::class_or_func::FnBody;
use crate::class_or_func::Property;
use crate::num::JsNumber;
use crate::op::OpCode;
use crate::symbol::Ref;
use bitflags::bitflags;
use derive_more::derive::From;
use diagnostics::Loc;
use diagnostics::Range;
use serde::Deserialize;
use serde::Serialize;

/// An expression node. `data: None` is the "no expression" slot: it appears
/// for the elided children of preserved JSX (`<a>{}</a>`) and wherever an
/// optional expression was absent, and must survive a round trip.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Expr {
  pub loc: Loc,
  pub data: Option<Box<E>>,
}

impl Expr {
  pub fn new(loc: Loc, data: impl Into<E>) -> Expr {
    Expr {
      loc,
      data: Some(Box::new(data.into())),
    }
  }

  pub fn none(loc: Loc) -> Expr {
    Expr { loc, data: None }
  }
}

#[derive(Clone, PartialEq, Debug, From, Serialize, Deserialize)]
#[serde(tag = "$t")]
pub enum E {
  Array(EArray),
  Unary(EUnary),
  Binary(EBinary),
  Boolean(EBoolean),
  Super(ESuper),
  Null(ENull),
  Undefined(EUndefined),
  This(EThis),
  New(ENew),
  NewTarget(ENewTarget),
  ImportMeta(EImportMeta),
  Call(ECall),
  Dot(EDot),
  Index(EIndex),
  Arrow(EArrow),
  Function(EFunction),
  Class(EClass),
  Identifier(EIdentifier),
  ImportIdentifier(EImportIdentifier),
  PrivateIdentifier(EPrivateIdentifier),
  NameOfSymbol(ENameOfSymbol),
  JsxElement(EJsxElement),
  JsxText(EJsxText),
  Missing(EMissing),
  Number(ENumber),
  BigInt(EBigInt),
  Object(EObject),
  Spread(ESpread),
  String(EString),
  Template(ETemplate),
  RegExp(ERegExp),
  InlinedEnum(EInlinedEnum),
  Annotation(EAnnotation),
  Await(EAwait),
  Yield(EYield),
  If(EIf),
  RequireString(ERequireString),
  RequireResolveString(ERequireResolveString),
  ImportString(EImportString),
  ImportCall(EImportCall),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EArray {
  pub items: Vec<Expr>,
  pub comma_after_spread: Loc,
  pub close_bracket_loc: Loc,
  pub is_single_line: bool,
  pub is_parenthesized: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EUnary {
  pub value: Expr,
  pub op: OpCode,

  /// `typeof (0, x)` must not become `typeof x`: that could suppress a
  /// ReferenceError when `x` is unbound. When the operand was originally a
  /// bare identifier, the whole `typeof` is known side-effect free.
  pub was_originally_typeof_identifier: bool,

  /// `delete (0, x)` must not become `delete x` (invalid in strict mode,
  /// different return value). Tracks whether the operand was originally an
  /// identifier or property access, possibly parenthesized.
  pub was_originally_delete_of_identifier_or_property_access: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EBinary {
  pub left: Expr,
  pub right: Expr,
  pub op: OpCode,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EBoolean {
  pub value: bool,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EMissing {}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ESuper {}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ENull {}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EUndefined {}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EThis {}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ENewTarget {
  pub range: Range,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EImportMeta {
  pub range_len: i32,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ENew {
  pub target: Expr,
  pub args: Vec<Expr>,

  pub close_paren_loc: Loc,
  pub is_multi_line: bool,

  /// A preceding `@__PURE__` comment: the construction can be dropped when
  /// unused (the arguments stay if they have side effects).
  pub can_be_unwrapped_if_unused: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CallKind {
  Normal,
  DirectEval,
  TargetWasOriginallyPropertyAccess,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OptionalChain {
  /// `a.b`
  None,

  /// `a?.b`
  Start,

  /// The `.c` in `a?.b.c` (but not in `(a?.b).c`).
  Continue,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ECall {
  pub target: Expr,
  pub args: Vec<Expr>,
  pub close_paren_loc: Loc,
  pub optional_chain: OptionalChain,
  pub kind: CallKind,
  pub is_multi_line: bool,

  /// A preceding `@__PURE__` comment. The call can be removed when its
  /// result is unused; arguments with side effects must remain.
  pub can_be_unwrapped_if_unused: bool,
}

impl ECall {
  pub fn has_same_flags_as(&self, other: &ECall) -> bool {
    self.optional_chain == other.optional_chain
      && self.kind == other.kind
      && self.can_be_unwrapped_if_unused == other.can_be_unwrapped_if_unused
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EDot {
  pub target: Expr,
  pub name: String,
  pub name_loc: Loc,
  pub optional_chain: OptionalChain,

  /// The access is known free of side effects and can be dropped if unused.
  pub can_be_removed_if_unused: bool,

  /// The accessed value is a function whose calls can be unwrapped if the
  /// result is unused.
  pub call_can_be_unwrapped_if_unused: bool,

  /// Symbol values have no side effects as property names.
  pub is_symbol_instance: bool,
}

impl EDot {
  pub fn has_same_flags_as(&self, other: &EDot) -> bool {
    self.optional_chain == other.optional_chain
      && self.can_be_removed_if_unused == other.can_be_removed_if_unused
      && self.call_can_be_unwrapped_if_unused == other.call_can_be_unwrapped_if_unused
      && self.is_symbol_instance == other.is_symbol_instance
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EIndex {
  pub target: Expr,
  pub index: Expr,
  pub close_bracket_loc: Loc,
  pub optional_chain: OptionalChain,
  pub can_be_removed_if_unused: bool,
  pub call_can_be_unwrapped_if_unused: bool,
  pub is_symbol_instance: bool,
}

impl EIndex {
  pub fn has_same_flags_as(&self, other: &EIndex) -> bool {
    self.optional_chain == other.optional_chain
      && self.can_be_removed_if_unused == other.can_be_removed_if_unused
      && self.call_can_be_unwrapped_if_unused == other.call_can_be_unwrapped_if_unused
      && self.is_symbol_instance == other.is_symbol_instance
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EArrow {
  pub args: Vec<Arg>,
  pub body: FnBody,

  pub is_async: bool,
  pub has_rest_arg: bool,

  /// Use the expression shorthand when the body is a single return.
  pub prefer_expr: bool,

  pub has_no_side_effects_comment: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EFunction {
  pub fn_: Fn,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EClass {
  pub class: Class,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EIdentifier {
  pub ref_: Ref,

  /// Inside a `with` statement this may actually be a property access with
  /// getter/setter side effects, so it must be kept.
  pub must_keep_due_to_with_stmt: bool,

  /// Referencing is known not to throw, so an unused reference (e.g. a bare
  /// `Object`) can be removed.
  pub can_be_removed_if_unused: bool,

  pub call_can_be_unwrapped_if_unused: bool,
}

/// A reference to an ES6 import item. Kept as a distinct node kind so that
/// transforms must opt into treating it like a plain identifier: depending on
/// linking it may print as a property access off a namespace symbol.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EImportIdentifier {
  pub ref_: Ref,
  pub prefer_quoted_key: bool,

  /// True for an original identifier expression (`foo`); false when this
  /// may have been a member access off an imported namespace (`ns.foo`).
  pub was_originally_identifier: bool,
}

/// A class-private name (`#foo`); usable wherever computed properties are.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EPrivateIdentifier {
  pub ref_: Ref,
}

/// An internal property name that can be mangled; the ref points at a
/// `MangledProp` symbol.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ENameOfSymbol {
  pub ref_: Ref,

  /// A preceding `@__KEY__` comment.
  pub has_property_key_comment: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EJsxElement {
  pub tag: Option<Expr>,
  pub properties: Vec<Property>,

  /// Children of the element when JSX is preserved. An entry whose `data`
  /// is `None` is the `{}` child (`<a>{}</a>`), kept so comments placed
  /// there survive.
  pub nullable_children: Vec<Expr>,

  pub close_loc: Loc,
  pub is_tag_single_line: bool,
}

/// Raw JSX text, reproduced verbatim: there is no canonical interpretation
/// of JSX whitespace, so the original source is the only safe form.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EJsxText {
  pub raw: String,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ENumber {
  pub value: JsNumber,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EBigInt {
  pub value: String,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EObject {
  pub properties: Vec<Property>,
  pub comma_after_spread: Loc,
  pub close_brace_loc: Loc,
  pub is_single_line: bool,
  pub is_parenthesized: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ESpread {
  pub value: Expr,
}

/// A string literal or no-substitution template, as UTF-16 code units (JS
/// strings may contain unpaired surrogates).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EString {
  pub value: Vec<u16>,
  pub legacy_octal_loc: Loc,
  pub prefer_template: bool,
  pub has_property_key_comment: bool,
  pub contains_unique_key: bool,
}

impl EString {
  pub fn from_str_lossy(value: &str) -> EString {
    EString {
      value: value.encode_utf16().collect(),
      legacy_octal_loc: Loc(0),
      prefer_template: false,
      has_property_key_comment: false,
      contains_unique_key: false,
    }
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TemplatePart {
  pub value: Expr,

  /// Only meaningful for tagged templates.
  pub tail_raw: String,

  /// Only meaningful for untagged templates.
  pub tail_cooked: Vec<u16>,

  pub tail_loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ETemplate {
  pub tag: Option<Expr>,
  pub head_raw: String,
  pub head_cooked: Vec<u16>,
  pub parts: Vec<TemplatePart>,
  pub head_loc: Loc,
  pub legacy_octal_loc: Loc,

  /// `@__PURE__` on a tagged template: the call can be dropped when unused,
  /// but parts with side effects (including string conversions) remain.
  pub can_be_unwrapped_if_unused: bool,

  /// If the tag was a syntactic property access, `this` for the call is the
  /// accessed object; optimizations must preserve that with `(0, b.c)` form.
  pub tag_was_originally_property_access: bool,
}

/// The raw regex source, including delimiter slashes and flags.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ERegExp {
  pub value: String,
}

/// An inlined constant enum member; the comment preserves the member name.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EInlinedEnum {
  pub value: Expr,
  pub comment: String,
}

bitflags! {
  #[derive(Clone, Copy, Default, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
  pub struct AnnotationFlags: u8 {
    /// An inline `@__PURE__`-style annotation on the expression itself, for
    /// positions where a wrapping scope can't be introduced (e.g. `await`).
    const CAN_BE_REMOVED_IF_UNUSED = 1 << 0;
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EAnnotation {
  pub value: Expr,
  pub flags: AnnotationFlags,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EAwait {
  pub value: Expr,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EYield {
  pub value: Option<Expr>,
  pub is_star: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EIf {
  pub test: Expr,
  pub yes: Expr,
  pub no: Expr,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ERequireString {
  pub import_record_index: u32,
  pub close_paren_loc: Loc,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ERequireResolveString {
  pub import_record_index: u32,
  pub close_paren_loc: Loc,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EImportString {
  pub import_record_index: u32,
  pub close_paren_loc: Loc,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EImportCall {
  pub expr: Expr,
  pub options: Option<Expr>,
  pub close_paren_loc: Loc,
}
