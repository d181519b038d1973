use diagnostics::Range;
use diagnostics::Source;
use serde::Deserialize;
use serde::Serialize;

/// What kind of exports a file has, as far as linking is concerned.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ExportsKind {
  /// No exports at all, so nothing can be said (e.g. an empty file).
  #[default]
  None,

  /// Exports live on `module` and/or `exports`; `require()` returns
  /// `module.exports` and any import is allowed but may be undefined.
  CommonJs,

  /// All export names are known; named imports are checked against them.
  Esm,

  /// Some names are known but others fall back to a run-time object, as
  /// with `export * from` a CommonJS or external module.
  EsmWithDynamicFallback,
}

impl ExportsKind {
  pub fn is_dynamic(self) -> bool {
    matches!(self, ExportsKind::CommonJs | ExportsKind::EsmWithDynamicFallback)
  }
}

/// How the module format was determined. Declaration order is meaningful:
/// the CommonJS sources and the ESM sources form contiguous runs.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum ModuleType {
  #[default]
  Unknown,

  // ".cjs" or ".cts" or "type: commonjs" in package.json
  CommonJsCjs,
  CommonJsCts,
  CommonJsPackageJson,

  // ".mjs" or ".mts" or "type: module" in package.json
  EsmMjs,
  EsmMts,
  EsmPackageJson,
}

impl ModuleType {
  pub fn is_common_js(self) -> bool {
    self >= ModuleType::CommonJsCjs && self <= ModuleType::CommonJsPackageJson
  }

  pub fn is_esm(self) -> bool {
    self >= ModuleType::EsmMjs && self <= ModuleType::EsmPackageJson
  }
}

/// The module format decision plus where it came from, so diagnostics can
/// point at the `"type"` field of the deciding `package.json`.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct ModuleTypeData {
  pub module_type: ModuleType,
  pub source: Option<Box<Source>>,
  pub range: Range,
}

#[cfg(test)]
mod tests {
  use super::*;
  use diagnostics::Loc;
  use diagnostics::Path;

  #[test]
  fn exports_kind_dynamism() {
    assert!(!ExportsKind::None.is_dynamic());
    assert!(ExportsKind::CommonJs.is_dynamic());
    assert!(!ExportsKind::Esm.is_dynamic());
    assert!(ExportsKind::EsmWithDynamicFallback.is_dynamic());
  }

  #[test]
  fn module_type_ranges() {
    assert!(!ModuleType::Unknown.is_common_js());
    assert!(ModuleType::CommonJsCts.is_common_js());
    assert!(!ModuleType::CommonJsCts.is_esm());
    assert!(ModuleType::EsmPackageJson.is_esm());
    assert!(!ModuleType::EsmPackageJson.is_common_js());
  }

  #[test]
  fn module_type_data_round_trips() {
    let data = ModuleTypeData {
      module_type: ModuleType::EsmPackageJson,
      source: Some(Box::new(Source::new(
        Path::file("/pkg/package.json"),
        "pkg/package.json",
        "{\"type\":\"module\"}",
        2,
      ))),
      range: Range::new(Loc(9), 8),
    };
    let json = serde_json::to_string(&data).unwrap();
    let back: ModuleTypeData = serde_json::from_str(&json).unwrap();
    assert_eq!(back, data);
  }
}
