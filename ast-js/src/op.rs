use serde::Deserialize;
use serde::Serialize;

/// Operator precedence levels, lowest binding first.
///
/// https://developer.mozilla.org/en-US/docs/Web/JavaScript/Reference/Operators/Operator_Precedence
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum L {
  Lowest,
  Comma,
  Spread,
  Yield,
  Assign,
  Conditional,
  NullishCoalescing,
  LogicalOr,
  LogicalAnd,
  BitwiseOr,
  BitwiseXor,
  BitwiseAnd,
  Equals,
  Compare,
  Shift,
  Add,
  Multiply,
  Exponentiation,
  Prefix,
  Postfix,
  New,
  Call,
  Member,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AssignTarget {
  None,
  Replace, // "a = b"
  Update,  // "a += b"
}

/// Every unary and binary operator. Declaration order is meaningful:
/// associativity and assignment classification are derived from it, so new
/// opcodes must be added to the matching group (and to `OP_TABLE`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum OpCode {
  // Prefix
  UnPos,
  UnNeg,
  UnCpl,
  UnNot,
  UnVoid,
  UnTypeof,
  UnDelete,

  // Prefix update
  UnPreDec,
  UnPreInc,

  // Postfix update
  UnPostDec,
  UnPostInc,

  // Left-associative
  BinAdd,
  BinSub,
  BinMul,
  BinDiv,
  BinRem,
  BinPow, // Right-associative
  BinLt,
  BinLe,
  BinGt,
  BinGe,
  BinIn,
  BinInstanceof,
  BinShl,
  BinShr,
  BinUShr,
  BinLooseEq,
  BinLooseNe,
  BinStrictEq,
  BinStrictNe,
  BinNullishCoalescing,
  BinLogicalOr,
  BinLogicalAnd,
  BinBitwiseOr,
  BinBitwiseAnd,
  BinBitwiseXor,

  // Non-associative
  BinComma,

  // Right-associative
  BinAssign,
  BinAddAssign,
  BinSubAssign,
  BinMulAssign,
  BinDivAssign,
  BinRemAssign,
  BinPowAssign,
  BinShlAssign,
  BinShrAssign,
  BinUShrAssign,
  BinBitwiseOrAssign,
  BinBitwiseAndAssign,
  BinBitwiseXorAssign,
  BinNullishCoalescingAssign,
  BinLogicalOrAssign,
  BinLogicalAndAssign,
}

impl OpCode {
  pub fn is_prefix(self) -> bool {
    self < OpCode::UnPostDec
  }

  pub fn unary_assign_target(self) -> AssignTarget {
    if self >= OpCode::UnPreDec && self <= OpCode::UnPostInc {
      AssignTarget::Update
    } else {
      AssignTarget::None
    }
  }

  pub fn is_left_associative(self) -> bool {
    self >= OpCode::BinAdd && self < OpCode::BinComma && self != OpCode::BinPow
  }

  pub fn is_right_associative(self) -> bool {
    self >= OpCode::BinAssign || self == OpCode::BinPow
  }

  pub fn binary_assign_target(self) -> AssignTarget {
    if self == OpCode::BinAssign {
      AssignTarget::Replace
    } else if self > OpCode::BinAssign {
      AssignTarget::Update
    } else {
      AssignTarget::None
    }
  }

  pub fn is_short_circuit(self) -> bool {
    matches!(
      self,
      OpCode::BinLogicalOr
        | OpCode::BinLogicalOrAssign
        | OpCode::BinLogicalAnd
        | OpCode::BinLogicalAndAssign
        | OpCode::BinNullishCoalescing
        | OpCode::BinNullishCoalescingAssign
    )
  }

  pub fn entry(self) -> &'static OpTableEntry {
    &OP_TABLE[self as usize]
  }

  pub fn text(self) -> &'static str {
    self.entry().text
  }

  pub fn level(self) -> L {
    self.entry().level
  }

  pub fn is_keyword(self) -> bool {
    self.entry().is_keyword
  }
}

pub struct OpTableEntry {
  pub text: &'static str,
  pub level: L,
  pub is_keyword: bool,
}

const fn op(text: &'static str, level: L, is_keyword: bool) -> OpTableEntry {
  OpTableEntry {
    text,
    level,
    is_keyword,
  }
}

/// One entry per opcode, in opcode declaration order.
#[rustfmt::skip]
pub static OP_TABLE: [OpTableEntry; 53] = [
  // Prefix
  op("+", L::Prefix, false),
  op("-", L::Prefix, false),
  op("~", L::Prefix, false),
  op("!", L::Prefix, false),
  op("void", L::Prefix, true),
  op("typeof", L::Prefix, true),
  op("delete", L::Prefix, true),

  // Prefix update
  op("--", L::Prefix, false),
  op("++", L::Prefix, false),

  // Postfix update
  op("--", L::Postfix, false),
  op("++", L::Postfix, false),

  // Left-associative
  op("+", L::Add, false),
  op("-", L::Add, false),
  op("*", L::Multiply, false),
  op("/", L::Multiply, false),
  op("%", L::Multiply, false),
  op("**", L::Exponentiation, false), // Right-associative
  op("<", L::Compare, false),
  op("<=", L::Compare, false),
  op(">", L::Compare, false),
  op(">=", L::Compare, false),
  op("in", L::Compare, true),
  op("instanceof", L::Compare, true),
  op("<<", L::Shift, false),
  op(">>", L::Shift, false),
  op(">>>", L::Shift, false),
  op("==", L::Equals, false),
  op("!=", L::Equals, false),
  op("===", L::Equals, false),
  op("!==", L::Equals, false),
  op("??", L::NullishCoalescing, false),
  op("||", L::LogicalOr, false),
  op("&&", L::LogicalAnd, false),
  op("|", L::BitwiseOr, false),
  op("&", L::BitwiseAnd, false),
  op("^", L::BitwiseXor, false),

  // Non-associative
  op(",", L::Comma, false),

  // Right-associative
  op("=", L::Assign, false),
  op("+=", L::Assign, false),
  op("-=", L::Assign, false),
  op("*=", L::Assign, false),
  op("/=", L::Assign, false),
  op("%=", L::Assign, false),
  op("**=", L::Assign, false),
  op("<<=", L::Assign, false),
  op(">>=", L::Assign, false),
  op(">>>=", L::Assign, false),
  op("|=", L::Assign, false),
  op("&=", L::Assign, false),
  op("^=", L::Assign, false),
  op("??=", L::Assign, false),
  op("||=", L::Assign, false),
  op("&&=", L::Assign, false),
];
