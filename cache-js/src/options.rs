use serde::Deserialize;
use serde::Serialize;

/// Parser options that affect the shape of the produced JS/TS tree. These
/// participate in the cache-hit equivalence by default: reusing a tree that
/// was parsed under different JSX or class-field semantics would be wrong.
///
/// The options are part of the on-disk record so the default equivalence
/// keeps working across restarts.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct JsParserOptions {
  pub ts: TsOptions,
  pub jsx: JsxOptions,
  pub decorators: bool,
}

#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TsOptions {
  pub parse: bool,

  /// Mirrors `useDefineForClassFields`; changes which class-field lowering
  /// the parser bakes into the tree.
  pub use_define_for_class_fields: bool,
}

#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct JsxOptions {
  pub parse: bool,
  pub preserve: bool,
  pub automatic_runtime: bool,
  pub factory: String,
  pub fragment: String,
}

#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CssParserOptions {
  pub css_modules: bool,
  pub minify_syntax: bool,
}

#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct JsonParserOptions {
  pub allow_comments: bool,
  pub allow_trailing_commas: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn options_equality_is_field_wise() {
    let mut a = JsParserOptions::default();
    let b = JsParserOptions::default();
    assert_eq!(a, b);
    a.jsx.automatic_runtime = true;
    assert_ne!(a, b);
  }

  #[test]
  fn options_serde_round_trips() {
    let mut options = JsParserOptions::default();
    options.ts.parse = true;
    options.jsx.factory = "h".to_string();
    let json = serde_json::to_string(&options).unwrap();
    let back: JsParserOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(back, options);
  }
}
