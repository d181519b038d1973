use crate::class_or_func::PropertyBinding;
use crate::expr::Expr;
use crate::symbol::Ref;
use derive_more::derive::From;
use diagnostics::Loc;
use serde::Deserialize;
use serde::Serialize;

/// A binding target node. `data: None` is the hole in a sparse pattern like
/// `[, x] = y` and must survive a round trip as-is.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Binding {
  pub loc: Loc,
  pub data: Option<Box<B>>,
}

impl Binding {
  pub fn new(loc: Loc, data: impl Into<B>) -> Binding {
    Binding {
      loc,
      data: Some(Box::new(data.into())),
    }
  }

  pub fn none(loc: Loc) -> Binding {
    Binding { loc, data: None }
  }
}

#[derive(Clone, PartialEq, Debug, From, Serialize, Deserialize)]
#[serde(tag = "$t")]
pub enum B {
  Missing(BMissing),
  Identifier(BIdentifier),
  Array(BArray),
  Object(BObject),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BMissing {}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BIdentifier {
  pub ref_: Ref,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BArray {
  pub items: Vec<ArrayBinding>,
  pub close_bracket_loc: Loc,
  pub has_spread: bool,
  pub is_single_line: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BObject {
  pub properties: Vec<PropertyBinding>,
  pub close_brace_loc: Loc,
  pub is_single_line: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ArrayBinding {
  pub binding: Binding,
  pub default_value: Option<Expr>,
  pub loc: Loc,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absent_binding_round_trips() {
    let hole = Binding::none(Loc(3));
    let json = serde_json::to_string(&hole).unwrap();
    let back: Binding = serde_json::from_str(&json).unwrap();
    assert_eq!(back, hole);
    assert!(back.data.is_none());
  }

  #[test]
  fn array_pattern_round_trips() {
    let pattern = Binding::new(Loc(0), BArray {
      items: vec![
        ArrayBinding {
          binding: Binding::none(Loc(1)),
          default_value: None,
          loc: Loc(1),
        },
        ArrayBinding {
          binding: Binding::new(Loc(3), BIdentifier { ref_: Ref::new(0, 2) }),
          default_value: None,
          loc: Loc(3),
        },
      ],
      close_bracket_loc: Loc(4),
      has_spread: false,
      is_single_line: true,
    });
    let json = serde_json::to_string(&pattern).unwrap();
    assert!(json.contains("\"$t\":\"Array\""));
    let back: Binding = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pattern);
  }
}
