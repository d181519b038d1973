use crate::expr::EBoolean;
use crate::expr::ENull;
use crate::expr::ENumber;
use crate::expr::EUndefined;
use crate::expr::Expr;
use crate::expr::E;
use crate::num::JsNumber;
use diagnostics::DecodeError;
use diagnostics::Loc;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

/// The value of a detected inlinable constant, used for cross-module
/// inlining of `const` declarations and enum members.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum ConstValue {
  #[default]
  None,
  Null,
  Undefined,
  True,
  False,
  Number(JsNumber),
}

impl Display for ConstValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      ConstValue::None => f.write_str("none"),
      ConstValue::Null => f.write_str("null"),
      ConstValue::Undefined => f.write_str("undefined"),
      ConstValue::True => f.write_str("true"),
      ConstValue::False => f.write_str("false"),
      ConstValue::Number(value) => write!(f, "num {value}"),
    }
  }
}

impl FromStr for ConstValue {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "none" => Ok(ConstValue::None),
      "null" => Ok(ConstValue::Null),
      "undefined" => Ok(ConstValue::Undefined),
      "true" => Ok(ConstValue::True),
      "false" => Ok(ConstValue::False),
      _ => {
        let value = s.strip_prefix("num ").ok_or_else(|| DecodeError::new("const value", s))?;
        Ok(ConstValue::Number(value.parse()?))
      }
    }
  }
}

/// Extract the inlinable constant from an initializer, if any.
///
/// Strings and bigints are deliberately not inlined (they can be arbitrarily
/// long), and neither are long real numbers (inlining would grow the
/// minified output).
pub fn expr_to_const_value(expr: &Expr) -> ConstValue {
  match expr.data.as_deref() {
    Some(E::Null(_)) => ConstValue::Null,
    Some(E::Undefined(_)) => ConstValue::Undefined,
    Some(E::Boolean(b)) => {
      if b.value {
        ConstValue::True
      } else {
        ConstValue::False
      }
    }
    Some(E::Number(n)) => {
      let value = n.value.0;
      let as_int = value as i64;
      if value == as_int as f64 || format!("{value}").len() <= 8 {
        ConstValue::Number(n.value)
      } else {
        ConstValue::None
      }
    }
    _ => ConstValue::None,
  }
}

/// Materialize a constant back into an expression at the given location.
/// Returns `None` for [`ConstValue::None`], which has no expression form.
pub fn const_value_to_expr(loc: Loc, value: ConstValue) -> Option<Expr> {
  Some(match value {
    ConstValue::None => return None,
    ConstValue::Null => Expr::new(loc, ENull {}),
    ConstValue::Undefined => Expr::new(loc, EUndefined {}),
    ConstValue::True => Expr::new(loc, EBoolean { value: true }),
    ConstValue::False => Expr::new(loc, EBoolean { value: false }),
    ConstValue::Number(value) => Expr::new(loc, ENumber { value }),
  })
}

/// The value of one TypeScript enum member: a string (UTF-16 units) when
/// `string` is present, a number otherwise.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TsEnumValue {
  pub string: Option<Vec<u16>>,
  pub number: JsNumber,
}

impl Display for TsEnumValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match &self.string {
      Some(units) => {
        f.write_str("str ")?;
        for (i, unit) in units.iter().enumerate() {
          if i > 0 {
            f.write_str(",")?;
          }
          write!(f, "{unit}")?;
        }
        Ok(())
      }
      None => write!(f, "num {}", self.number),
    }
  }
}

impl FromStr for TsEnumValue {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if let Some(rest) = s.strip_prefix("str ") {
      let string = rest
        .split(',')
        .filter(|unit| !unit.is_empty())
        .map(|unit| unit.parse::<u16>().map_err(|_| DecodeError::new("enum value", s)))
        .collect::<Result<Vec<_>, _>>()?;
      return Ok(TsEnumValue {
        string: Some(string),
        number: JsNumber(0.0),
      });
    }
    let number = s.strip_prefix("num ").ok_or_else(|| DecodeError::new("enum value", s))?;
    Ok(TsEnumValue {
      string: None,
      number: number.parse()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn const_value_codec_round_trips() {
    for value in [
      ConstValue::None,
      ConstValue::Null,
      ConstValue::Undefined,
      ConstValue::True,
      ConstValue::False,
      ConstValue::Number(JsNumber(42.0)),
      ConstValue::Number(JsNumber(f64::INFINITY)),
      ConstValue::Number(JsNumber(f64::NAN)),
    ] {
      let encoded = value.to_string();
      assert_eq!(encoded.parse::<ConstValue>().unwrap(), value, "encoded {encoded}");
    }
    assert!("maybe".parse::<ConstValue>().is_err());
  }

  #[test]
  fn extraction_inlines_small_numbers_only() {
    let small = Expr::new(Loc(0), ENumber { value: JsNumber(3.0) });
    assert_eq!(expr_to_const_value(&small), ConstValue::Number(JsNumber(3.0)));

    let long = Expr::new(Loc(0), ENumber {
      value: JsNumber(0.123456789123),
    });
    assert_eq!(expr_to_const_value(&long), ConstValue::None);

    let null = Expr::new(Loc(0), ENull {});
    assert_eq!(expr_to_const_value(&null), ConstValue::Null);

    let hole = Expr::none(Loc(0));
    assert_eq!(expr_to_const_value(&hole), ConstValue::None);
  }

  #[test]
  fn const_value_to_expr_inverts_extraction() {
    for value in [
      ConstValue::Null,
      ConstValue::Undefined,
      ConstValue::True,
      ConstValue::False,
      ConstValue::Number(JsNumber(7.0)),
    ] {
      let expr = const_value_to_expr(Loc(5), value).unwrap();
      assert_eq!(expr.loc, Loc(5));
      assert_eq!(expr_to_const_value(&expr), value);
    }
    assert!(const_value_to_expr(Loc(0), ConstValue::None).is_none());
  }

  #[test]
  fn enum_value_codec_round_trips() {
    let string = TsEnumValue {
      string: Some("Up".encode_utf16().collect()),
      number: JsNumber(0.0),
    };
    assert_eq!(string.to_string().parse::<TsEnumValue>().unwrap(), string);

    let empty = TsEnumValue {
      string: Some(Vec::new()),
      number: JsNumber(0.0),
    };
    assert_eq!(empty.to_string().parse::<TsEnumValue>().unwrap(), empty);

    let number = TsEnumValue {
      string: None,
      number: JsNumber(4.5),
    };
    assert_eq!(number.to_string().parse::<TsEnumValue>().unwrap(), number);
  }
}
