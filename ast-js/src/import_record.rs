use crate::symbol::Index32;
use crate::symbol::Ref;
use bitflags::bitflags;
use diagnostics::DecodeError;
use diagnostics::Loc;
use diagnostics::Path;
use diagnostics::Range;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ImportKind {
  /// An entry point provided by the user.
  EntryPoint,

  /// An ES6 import or re-export statement.
  Stmt,

  /// A call to `require()`.
  Require,

  /// An `import()` expression with a string argument.
  Dynamic,

  /// A call to `require.resolve()`.
  RequireResolve,

  /// A CSS `@import` rule.
  At,

  /// A CSS `composes` declaration.
  ComposesFrom,

  /// A CSS `url(...)` token.
  Url,
}

impl ImportKind {
  pub fn string_for_metafile(self) -> &'static str {
    match self {
      ImportKind::EntryPoint => "entry-point",
      ImportKind::Stmt => "import-statement",
      ImportKind::Require => "require-call",
      ImportKind::Dynamic => "dynamic-import",
      ImportKind::RequireResolve => "require-resolve",
      ImportKind::At => "import-rule",
      ImportKind::ComposesFrom => "composes-from",
      ImportKind::Url => "url-token",
    }
  }

  pub fn is_from_css(self) -> bool {
    matches!(self, ImportKind::At | ImportKind::ComposesFrom | ImportKind::Url)
  }

  pub fn must_resolve_to_css(self) -> bool {
    matches!(self, ImportKind::At | ImportKind::ComposesFrom)
  }

  fn from_u8(value: u8) -> Option<ImportKind> {
    Some(match value {
      0 => ImportKind::EntryPoint,
      1 => ImportKind::Stmt,
      2 => ImportKind::Require,
      3 => ImportKind::Dynamic,
      4 => ImportKind::RequireResolve,
      5 => ImportKind::At,
      6 => ImportKind::ComposesFrom,
      7 => ImportKind::Url,
      _ => return None,
    })
  }
}

bitflags! {
  #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
  pub struct ImportRecordFlags: u16 {
    /// The parser created this record but decided it isn't needed (e.g. a
    /// TypeScript type-only import).
    const IS_UNUSED = 1 << 0;

    /// Contains `* as ns` syntax.
    const CONTAINS_IMPORT_STAR = 1 << 1;

    /// Imports the `default` alias, via either syntax form.
    const CONTAINS_DEFAULT_ALIAS = 1 << 2;

    /// Imports the `__esModule` alias.
    const CONTAINS_ES_MODULE_ALIAS = 1 << 3;

    /// This `export * from` is evaluated at run time via the re-export
    /// helper.
    const CALLS_RUN_TIME_RE_EXPORT_FN = 1 << 4;

    /// Wrap the `require()` call in `__toESM(...)`.
    const WRAP_WITH_TO_ESM = 1 << 5;

    /// Wrap the ESM exports object in `__toCJS(...)`.
    const WRAP_WITH_TO_CJS = 1 << 6;

    /// Use the runtime `__require()` instead of `require()`.
    const CALL_RUNTIME_REQUIRE = 1 << 7;

    /// The import sits in a position that handles failures (`try` around
    /// `require`, `import().catch(...)`), so unresolved paths are not
    /// errors.
    const HANDLES_IMPORT_ERRORS = 1 << 8;

    /// Originally a bare `import 'file'` statement.
    const WAS_ORIGINALLY_BARE_IMPORT = 1 << 9;

    /// External and side-effect free, so removable when unused.
    const IS_EXTERNAL_WITHOUT_SIDE_EFFECTS = 1 << 10;

    /// `assert { type: 'json' }` was present.
    const ASSERT_TYPE_JSON = 1 << 11;

    /// Do not mark as external in the metafile.
    const SHOULD_NOT_BE_EXTERNAL_IN_METAFILE = 1 << 12;

    /// A CSS `@import` of an empty file, removable.
    const WAS_LOADED_WITH_EMPTY_LOADER = 1 << 13;

    /// The path contains a generated unique key and must not be split.
    const CONTAINS_UNIQUE_KEY = 1 << 14;
  }
}

/// One import in a file, stored at the AST level so the whole list can be
/// processed without a tree traversal.
#[derive(Clone, PartialEq, Debug)]
pub struct ImportRecord {
  pub path: Path,
  pub range: Range,

  /// Where the error handler is, when `HANDLES_IMPORT_ERRORS` is set.
  pub error_handler_loc: Loc,

  /// The resolved source index for an internal import; invalid for an
  /// external one.
  pub source_index: Index32,

  /// Files imported via the copy loader use this instead of
  /// `source_index`; they behave like external imports.
  pub copy_source_index: Index32,

  pub flags: ImportRecordFlags,
  pub kind: ImportKind,
}

impl ImportRecord {
  pub fn new(kind: ImportKind, path: Path, range: Range) -> ImportRecord {
    ImportRecord {
      path,
      range,
      error_handler_loc: Loc(0),
      source_index: Index32::default(),
      copy_source_index: Index32::default(),
      flags: ImportRecordFlags::empty(),
      kind,
    }
  }
}

// Import records travel as single strings in the cache record. Fixed-width
// fields come first; the path text goes last so embedded spaces survive.
impl Display for ImportRecord {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} {} {} {} {} {}",
      self.kind as u8,
      self.flags.bits(),
      self.range,
      self.error_handler_loc,
      self.source_index.raw(),
      self.copy_source_index.raw(),
      self.path,
    )
  }
}

impl FromStr for ImportRecord {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut fields = s.splitn(7, ' ');
    let mut next = || fields.next().ok_or_else(|| DecodeError::new("import record", s));
    let kind = next()?
      .parse::<u8>()
      .ok()
      .and_then(ImportKind::from_u8)
      .ok_or_else(|| DecodeError::new("import kind", s))?;
    let flags = next()?
      .parse::<u16>()
      .ok()
      .and_then(ImportRecordFlags::from_bits)
      .ok_or_else(|| DecodeError::new("import record flags", s))?;
    let range = next()?.parse::<Range>()?;
    let error_handler_loc = next()?.parse::<Loc>()?;
    let source_index = next()?
      .parse::<u32>()
      .map(Index32::from_raw)
      .map_err(|_| DecodeError::new("import record", s))?;
    let copy_source_index = next()?
      .parse::<u32>()
      .map(Index32::from_raw)
      .map_err(|_| DecodeError::new("import record", s))?;
    let path = next()?.parse::<Path>()?;
    Ok(ImportRecord {
      path,
      range,
      error_handler_loc,
      source_index,
      copy_source_index,
      flags,
      kind,
    })
  }
}

/// One named import, keyed by the ref of its local symbol in the AST.
#[derive(Clone, PartialEq, Debug)]
pub struct NamedImport {
  pub alias: String,

  /// Parts within this file that use this import.
  pub local_parts_with_uses: Vec<u32>,

  pub alias_loc: Loc,
  pub namespace_ref: Ref,
  pub import_record_index: u32,

  /// The alias refers to the whole export namespace object. Not represented
  /// as an alias named `*` because arbitrary module namespace identifier
  /// names make `*` a legal alias.
  pub alias_is_star: bool,

  /// Exported imports in a TypeScript file can't be classified as type or
  /// value, so they are flagged.
  pub is_exported: bool,
}

fn parts_to_string(parts: &[u32]) -> String {
  if parts.is_empty() {
    return "-".to_string();
  }
  parts.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(",")
}

fn parts_from_string(s: &str) -> Result<Vec<u32>, DecodeError> {
  if s == "-" {
    return Ok(Vec::new());
  }
  s.split(',')
    .map(|part| part.parse::<u32>().map_err(|_| DecodeError::new("part list", s)))
    .collect()
}

impl Display for NamedImport {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} {} {} {} {} {}",
      parts_to_string(&self.local_parts_with_uses),
      self.alias_loc,
      self.namespace_ref,
      self.import_record_index,
      self.alias_is_star,
      self.is_exported,
      self.alias,
    )
  }
}

impl FromStr for NamedImport {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut fields = s.splitn(7, ' ');
    let mut next = || fields.next().ok_or_else(|| DecodeError::new("named import", s));
    let local_parts_with_uses = parts_from_string(next()?)?;
    let alias_loc = next()?.parse::<Loc>()?;
    let namespace_ref = next()?.parse::<Ref>()?;
    let import_record_index = next()?
      .parse::<u32>()
      .map_err(|_| DecodeError::new("named import", s))?;
    let alias_is_star = next()?
      .parse::<bool>()
      .map_err(|_| DecodeError::new("named import", s))?;
    let is_exported = next()?
      .parse::<bool>()
      .map_err(|_| DecodeError::new("named import", s))?;
    let alias = next()?.to_string();
    Ok(NamedImport {
      alias,
      local_parts_with_uses,
      alias_loc,
      namespace_ref,
      import_record_index,
      alias_is_star,
      is_exported,
    })
  }
}

/// One named export, keyed by alias in the AST.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NamedExport {
  pub ref_: Ref,
  pub alias_loc: Loc,
}

impl Display for NamedExport {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.ref_, self.alias_loc)
  }
}

impl FromStr for NamedExport {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (ref_, alias_loc) = s.split_once(' ').ok_or_else(|| DecodeError::new("named export", s))?;
    Ok(NamedExport {
      ref_: ref_.parse()?,
      alias_loc: alias_loc.parse()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_predicates() {
    assert!(ImportKind::At.is_from_css());
    assert!(ImportKind::Url.is_from_css());
    assert!(!ImportKind::Stmt.is_from_css());
    assert!(ImportKind::ComposesFrom.must_resolve_to_css());
    assert!(!ImportKind::Url.must_resolve_to_css());
    assert_eq!(ImportKind::Dynamic.string_for_metafile(), "dynamic-import");
  }

  #[test]
  fn import_record_codec_round_trips() {
    let mut record = ImportRecord::new(
      ImportKind::Stmt,
      Path::file("/node_modules/some pkg/index.js"),
      Range::new(Loc(7), 24),
    );
    record.flags = ImportRecordFlags::CONTAINS_IMPORT_STAR | ImportRecordFlags::HANDLES_IMPORT_ERRORS;
    record.error_handler_loc = Loc(40);
    record.source_index = Index32::new(5);

    let encoded = record.to_string();
    let back: ImportRecord = encoded.parse().unwrap();
    assert_eq!(back, record);
    assert_eq!(back.source_index.get(), 5);
    assert!(!back.copy_source_index.is_valid());
  }

  #[test]
  fn import_record_codec_rejects_garbage() {
    assert!("9 0 0+0 0 0 0 file:/x".parse::<ImportRecord>().is_err()); // bad kind
    assert!("0 0 0+0".parse::<ImportRecord>().is_err()); // truncated
  }

  #[test]
  fn named_import_codec_round_trips() {
    let named = NamedImport {
      alias: "default as thing".to_string(), // aliases may contain spaces
      local_parts_with_uses: vec![1, 4],
      alias_loc: Loc(12),
      namespace_ref: Ref::new(2, 7),
      import_record_index: 3,
      alias_is_star: false,
      is_exported: true,
    };
    assert_eq!(named.to_string().parse::<NamedImport>().unwrap(), named);
  }

  #[test]
  fn named_import_empty_alias_and_parts() {
    let named = NamedImport {
      alias: String::new(),
      local_parts_with_uses: Vec::new(),
      alias_loc: Loc(0),
      namespace_ref: Ref::new(0, 0),
      import_record_index: 0,
      alias_is_star: true,
      is_exported: false,
    };
    let encoded = named.to_string();
    assert!(encoded.starts_with("- "));
    assert_eq!(encoded.parse::<NamedImport>().unwrap(), named);
  }

  #[test]
  fn named_export_codec_round_trips() {
    let named = NamedExport {
      ref_: Ref::new(1, 9),
      alias_loc: Loc(33),
    };
    assert_eq!(named.to_string(), "1!~!9 33");
    assert_eq!("1!~!9 33".parse::<NamedExport>().unwrap(), named);
  }
}
