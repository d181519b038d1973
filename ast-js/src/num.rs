use core::hash::Hash;
use core::hash::Hasher;
use diagnostics::DecodeError;
use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

/// A JavaScript number value.
///
/// Equality and hashing treat `NaN` as equal to itself so that two parses of
/// the same file compare equal structurally, and so the value can key a map.
///
/// The serialized form carries an explicit tag for the non-finite values:
/// finite values encode as plain numbers (which JSON can hold), while the
/// others encode as the strings `"+inf"`, `"-inf"` and `"nan"`. Every finite
/// value, `f64::MAX` and the smallest positive subnormal included, is an
/// ordinary number on the wire.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsNumber(pub f64);

impl JsNumber {
  pub fn is_finite(self) -> bool {
    self.0.is_finite()
  }

  pub fn to_bits(self) -> u64 {
    self.0.to_bits()
  }
}

impl From<f64> for JsNumber {
  fn from(value: f64) -> JsNumber {
    JsNumber(value)
  }
}

impl PartialEq for JsNumber {
  fn eq(&self, other: &Self) -> bool {
    if self.0.is_nan() {
      return other.0.is_nan();
    };
    self.0.eq(&other.0)
  }
}

impl Eq for JsNumber {}

impl Ord for JsNumber {
  fn cmp(&self, other: &Self) -> Ordering {
    // Only NaNs cannot be compared, and we treat them as equal.
    self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
  }
}

impl PartialOrd for JsNumber {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Hash for JsNumber {
  fn hash<H: Hasher>(&self, state: &mut H) {
    if !self.0.is_nan() {
      self.0.to_bits().hash(state);
    };
  }
}

impl Display for JsNumber {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    if self.0.is_nan() {
      f.write_str("nan")
    } else if self.0 == f64::INFINITY {
      f.write_str("+inf")
    } else if self.0 == f64::NEG_INFINITY {
      f.write_str("-inf")
    } else {
      // Exponent form keeps extreme magnitudes compact and parses back to
      // the identical bit pattern.
      write!(f, "{:e}", self.0)
    }
  }
}

impl FromStr for JsNumber {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "nan" => Ok(JsNumber(f64::NAN)),
      "+inf" => Ok(JsNumber(f64::INFINITY)),
      "-inf" => Ok(JsNumber(f64::NEG_INFINITY)),
      _ => s
        .parse::<f64>()
        .map(JsNumber)
        .map_err(|_| DecodeError::new("number", s)),
    }
  }
}

impl Serialize for JsNumber {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    if self.0.is_nan() {
      serializer.serialize_str("nan")
    } else if self.0 == f64::INFINITY {
      serializer.serialize_str("+inf")
    } else if self.0 == f64::NEG_INFINITY {
      serializer.serialize_str("-inf")
    } else {
      serializer.serialize_f64(self.0)
    }
  }
}

struct JsNumberVisitor;

impl<'de> de::Visitor<'de> for JsNumberVisitor {
  type Value = JsNumber;

  fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str("a number or one of \"+inf\", \"-inf\", \"nan\"")
  }

  fn visit_f64<E: de::Error>(self, value: f64) -> Result<JsNumber, E> {
    Ok(JsNumber(value))
  }

  fn visit_i64<E: de::Error>(self, value: i64) -> Result<JsNumber, E> {
    Ok(JsNumber(value as f64))
  }

  fn visit_u64<E: de::Error>(self, value: u64) -> Result<JsNumber, E> {
    Ok(JsNumber(value as f64))
  }

  fn visit_str<E: de::Error>(self, value: &str) -> Result<JsNumber, E> {
    match value {
      "nan" => Ok(JsNumber(f64::NAN)),
      "+inf" => Ok(JsNumber(f64::INFINITY)),
      "-inf" => Ok(JsNumber(f64::NEG_INFINITY)),
      _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
    }
  }
}

impl<'de> Deserialize<'de> for JsNumber {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<JsNumber, D::Error> {
    deserializer.deserialize_any(JsNumberVisitor)
  }
}
