use crate::DecodeError;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

/// A byte offset into a single source file.
///
/// Transformations may synthesize nodes that have no position in the original
/// text; those carry a best-effort or zero offset. Offsets are signed so a
/// subtraction never wraps when computing relative positions.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Loc(pub i32);

impl Loc {
  pub const fn new(offset: i32) -> Loc {
    Loc(offset)
  }
}

impl Display for Loc {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for Loc {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.parse::<i32>()
      .map(Loc)
      .map_err(|_| DecodeError::new("loc", s))
  }
}

/// A contiguous byte range: a starting location plus a length.
///
/// Ranges exist instead of booleans for features like top-level await so that
/// a later diagnostic can point at the offending syntax; check `len > 0` to
/// test for presence.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Range {
  pub loc: Loc,
  pub len: i32,
}

impl Range {
  pub const fn new(loc: Loc, len: i32) -> Range {
    Range { loc, len }
  }

  pub fn end(&self) -> i32 {
    self.loc.0 + self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }
}

impl Display for Range {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}+{}", self.loc, self.len)
  }
}

impl FromStr for Range {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (loc, len) = s.split_once('+').ok_or_else(|| DecodeError::new("range", s))?;
    Ok(Range {
      loc: loc.parse()?,
      len: len.parse::<i32>().map_err(|_| DecodeError::new("range", s))?,
    })
  }
}

/// A range paired with the text it covers (e.g. a `//# sourceMappingURL=`
/// comment). The text is free-form and goes last in the encoded form so that
/// embedded spaces survive a round trip.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Span {
  pub text: String,
  pub range: Range,
}

impl Display for Span {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.range, self.text)
  }
}

impl FromStr for Span {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (range, text) = s.split_once(' ').ok_or_else(|| DecodeError::new("span", s))?;
    Ok(Span {
      range: range.parse()?,
      text: text.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn loc_round_trips() {
    let loc = Loc(42);
    assert_eq!(loc.to_string(), "42");
    assert_eq!("42".parse::<Loc>().unwrap(), loc);
    assert_eq!("-1".parse::<Loc>().unwrap(), Loc(-1));
    assert!("x".parse::<Loc>().is_err());
  }

  #[test]
  fn range_round_trips() {
    let range = Range::new(Loc(12), 6);
    assert_eq!(range.to_string(), "12+6");
    assert_eq!("12+6".parse::<Range>().unwrap(), range);
    assert_eq!(range.end(), 18);
    assert!("12".parse::<Range>().is_err());
  }

  #[test]
  fn span_preserves_free_text() {
    let span = Span {
      text: "sourceMappingURL=a b c.map".to_string(),
      range: Range::new(Loc(3), 30),
    };
    let encoded = span.to_string();
    assert_eq!(encoded.parse::<Span>().unwrap(), span);
  }

  #[test]
  fn empty_span_text_round_trips() {
    let span = Span::default();
    assert_eq!(span.to_string().parse::<Span>().unwrap(), span);
  }
}
