use crate::const_value::ConstValue;
use crate::const_value::TsEnumValue;
use crate::import_record::ImportRecord;
use crate::import_record::NamedExport;
use crate::import_record::NamedImport;
use crate::module_type::ExportsKind;
use crate::module_type::ModuleTypeData;
use crate::part::Part;
use crate::part::SerializedPart;
use crate::scope::flatten_scopes;
use crate::scope::rebuild_scopes;
use crate::scope::Scope;
use crate::scope::ScopeArena;
use crate::scope::ScopeId;
use crate::scope::ScopeKind;
use crate::scope::SerializedScope;
use crate::symbol::CharFreq;
use crate::symbol::Ref;
use crate::symbol::SlotCounts;
use crate::symbol::Symbol;
use crate::symbol::INVALID_REF;
use ahash::AHashMap;
use diagnostics::DecodeError;
use diagnostics::Loc;
use diagnostics::Range;
use diagnostics::Span;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// The parsed, symbol-resolved syntax tree of one JS/TS file.
///
/// Identifiers reference the symbol table through [`Ref`]s, and the table is
/// a top-level field so passes like renaming never need to walk the tree.
/// ASTs are shared between builds through the cache and must be treated as
/// immutable: a pass that wants to change one works on a shallow clone of
/// the parts it mutates.
#[derive(Clone, PartialEq, Debug)]
pub struct JsAst {
  pub module_type_data: ModuleTypeData,
  pub parts: Vec<Part>,
  pub symbols: Vec<Symbol>,
  pub expr_comments: AHashMap<Loc, Vec<String>>,

  pub scopes: ScopeArena,
  pub module_scope: ScopeId,

  /// Identifier character histogram for the minifier alphabet.
  pub char_freq: Option<Box<CharFreq>>,

  pub hashbang: String,
  pub directives: Vec<String>,
  pub url_for_css: String,

  /// Filled by the parser and immutable afterwards; the linker overlays its
  /// own data instead of mutating this.
  pub top_level_symbol_to_parts: AHashMap<Ref, Vec<u32>>,

  /// Top-level exported TypeScript enum constants, for cross-module
  /// inlining of constant enums.
  pub ts_enums: AHashMap<Ref, AHashMap<String, TsEnumValue>>,

  /// Values of detected inlinable constants.
  pub const_values: AHashMap<Ref, ConstValue>,

  /// Properties that may be renamed, as symbols so renaming applies.
  pub mangled_props: AHashMap<String, Ref>,

  /// Existing property names that mangled names must not collide with.
  pub reserved_props: AHashMap<String, bool>,

  pub import_records: Vec<ImportRecord>,

  pub named_imports: AHashMap<Ref, NamedImport>,
  pub named_exports: AHashMap<String, NamedExport>,
  pub export_star_import_records: Vec<u32>,

  pub source_map_comment: Span,

  // Ranges rather than booleans so a later message can point at the syntax;
  // test `len > 0` for presence.
  pub export_keyword: Range,
  pub top_level_await_keyword: Range,

  /// Excludes top-level await in dead branches.
  pub live_top_level_await_keyword: Range,

  pub exports_ref: Ref,
  pub module_ref: Ref,
  pub wrapper_ref: Ref,

  pub approximate_line_count: i32,
  pub nested_scope_slot_counts: SlotCounts,
  pub has_lazy_export: bool,

  /// CommonJS feature usage. A file using these can't be flat-bundled and
  /// is wrapped in its own closure.
  pub uses_exports_ref: bool,
  pub uses_module_ref: bool,
  pub exports_kind: ExportsKind,
}

impl JsAst {
  /// An empty module: one entry scope, no parts, no symbols.
  pub fn new() -> JsAst {
    let mut scopes = ScopeArena::new();
    let module_scope = scopes.alloc(Scope::new(ScopeKind::Entry));
    JsAst {
      module_type_data: ModuleTypeData::default(),
      parts: Vec::new(),
      symbols: Vec::new(),
      expr_comments: AHashMap::new(),
      scopes,
      module_scope,
      char_freq: None,
      hashbang: String::new(),
      directives: Vec::new(),
      url_for_css: String::new(),
      top_level_symbol_to_parts: AHashMap::new(),
      ts_enums: AHashMap::new(),
      const_values: AHashMap::new(),
      mangled_props: AHashMap::new(),
      reserved_props: AHashMap::new(),
      import_records: Vec::new(),
      named_imports: AHashMap::new(),
      named_exports: AHashMap::new(),
      export_star_import_records: Vec::new(),
      source_map_comment: Span::default(),
      export_keyword: Range::default(),
      top_level_await_keyword: Range::default(),
      live_top_level_await_keyword: Range::default(),
      exports_ref: INVALID_REF,
      module_ref: INVALID_REF,
      wrapper_ref: INVALID_REF,
      approximate_line_count: 0,
      nested_scope_slot_counts: SlotCounts::default(),
      has_lazy_export: false,
      uses_exports_ref: false,
      uses_module_ref: false,
      exports_kind: ExportsKind::None,
    }
  }

  /// Convert to the wire form. All maps become sorted string-keyed maps and
  /// all structured values become their text encodings, so encoding the
  /// result is deterministic.
  pub fn to_serialized(&self) -> SerializedAst {
    SerializedAst::from_ast(self)
  }
}

impl Default for JsAst {
  fn default() -> JsAst {
    JsAst::new()
  }
}

/// The wire form of a [`JsAst`]: one self-describing record per file.
///
/// `BTreeMap` keys make encoding order-stable, so encoding the same AST
/// twice yields identical bytes and `decode . encode` is a fixpoint.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SerializedAst {
  pub parts: Vec<SerializedPart>,
  pub module_scope: Vec<SerializedScope>,
  pub symbols: Vec<Symbol>,
  pub char_freq: Option<Box<CharFreq>>,
  pub expr_comments: BTreeMap<String, Vec<String>>,
  pub top_level_symbol_to_parts: BTreeMap<String, Vec<u32>>,
  pub ts_enums: BTreeMap<String, BTreeMap<String, String>>,
  pub const_values: BTreeMap<String, String>,
  pub module_type_data: ModuleTypeData,
  pub mangled_props: BTreeMap<String, String>,
  pub reserved_props: BTreeMap<String, bool>,
  pub import_records: Vec<String>,
  pub named_imports: BTreeMap<String, String>,
  pub named_exports: BTreeMap<String, String>,
  pub export_star_import_records: Vec<u32>,
  pub source_map_comment: String,
  pub export_keyword: String,
  pub top_level_await_keyword: String,
  pub live_top_level_await_keyword: String,
  pub exports_ref: String,
  pub module_ref: String,
  pub wrapper_ref: String,
  pub approximate_line_count: i32,
  pub nested_scope_slot_counts: SlotCounts,
  pub has_lazy_export: bool,
  pub uses_exports_ref: bool,
  pub uses_module_ref: bool,
  pub exports_kind: ExportsKind,
  pub hashbang: String,
  pub directives: Vec<String>,
  pub url_for_css: String,
}

impl SerializedAst {
  pub fn from_ast(ast: &JsAst) -> SerializedAst {
    SerializedAst {
      parts: ast.parts.iter().map(SerializedPart::from_part).collect(),
      module_scope: flatten_scopes(&ast.scopes, ast.module_scope),
      symbols: ast.symbols.clone(),
      char_freq: ast.char_freq.clone(),
      expr_comments: ast
        .expr_comments
        .iter()
        .map(|(loc, comments)| (loc.to_string(), comments.clone()))
        .collect(),
      top_level_symbol_to_parts: ast
        .top_level_symbol_to_parts
        .iter()
        .map(|(ref_, parts)| (ref_.to_string(), parts.clone()))
        .collect(),
      ts_enums: ast
        .ts_enums
        .iter()
        .map(|(ref_, members)| {
          (
            ref_.to_string(),
            members
              .iter()
              .map(|(name, value)| (name.clone(), value.to_string()))
              .collect(),
          )
        })
        .collect(),
      const_values: ast
        .const_values
        .iter()
        .map(|(ref_, value)| (ref_.to_string(), value.to_string()))
        .collect(),
      module_type_data: ast.module_type_data.clone(),
      mangled_props: ast
        .mangled_props
        .iter()
        .map(|(name, ref_)| (name.clone(), ref_.to_string()))
        .collect(),
      reserved_props: ast.reserved_props.iter().map(|(name, set)| (name.clone(), *set)).collect(),
      import_records: ast.import_records.iter().map(|record| record.to_string()).collect(),
      named_imports: ast
        .named_imports
        .iter()
        .map(|(ref_, named)| (ref_.to_string(), named.to_string()))
        .collect(),
      named_exports: ast
        .named_exports
        .iter()
        .map(|(alias, named)| (alias.clone(), named.to_string()))
        .collect(),
      export_star_import_records: ast.export_star_import_records.clone(),
      source_map_comment: ast.source_map_comment.to_string(),
      export_keyword: ast.export_keyword.to_string(),
      top_level_await_keyword: ast.top_level_await_keyword.to_string(),
      live_top_level_await_keyword: ast.live_top_level_await_keyword.to_string(),
      exports_ref: ast.exports_ref.to_string(),
      module_ref: ast.module_ref.to_string(),
      wrapper_ref: ast.wrapper_ref.to_string(),
      approximate_line_count: ast.approximate_line_count,
      nested_scope_slot_counts: ast.nested_scope_slot_counts,
      has_lazy_export: ast.has_lazy_export,
      uses_exports_ref: ast.uses_exports_ref,
      uses_module_ref: ast.uses_module_ref,
      exports_kind: ast.exports_kind,
      hashbang: ast.hashbang.clone(),
      directives: ast.directives.clone(),
      url_for_css: ast.url_for_css.clone(),
    }
  }

  /// Rebuild the in-memory AST. Fails on any malformed text encoding and on
  /// scope references that do not resolve.
  pub fn into_ast(self) -> Result<JsAst, DecodeError> {
    let (scopes, module_scope) = rebuild_scopes(&self.module_scope)?;

    let parts = self
      .parts
      .into_iter()
      .map(SerializedPart::into_part)
      .collect::<Result<Vec<_>, _>>()?;
    for part in &parts {
      for &scope in &part.scopes {
        if !scopes.contains(scope) {
          return Err(DecodeError::new("part scope", crate::scope::scope_name(scope)));
        }
      }
    }

    Ok(JsAst {
      module_type_data: self.module_type_data,
      parts,
      symbols: self.symbols,
      expr_comments: self
        .expr_comments
        .into_iter()
        .map(|(loc, comments)| Ok((loc.parse::<Loc>()?, comments)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      scopes,
      module_scope,
      char_freq: self.char_freq,
      hashbang: self.hashbang,
      directives: self.directives,
      url_for_css: self.url_for_css,
      top_level_symbol_to_parts: self
        .top_level_symbol_to_parts
        .into_iter()
        .map(|(ref_, parts)| Ok((ref_.parse::<Ref>()?, parts)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      ts_enums: self
        .ts_enums
        .into_iter()
        .map(|(ref_, members)| {
          let members = members
            .into_iter()
            .map(|(name, value)| Ok((name, value.parse::<TsEnumValue>()?)))
            .collect::<Result<AHashMap<_, _>, DecodeError>>()?;
          Ok((ref_.parse::<Ref>()?, members))
        })
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      const_values: self
        .const_values
        .into_iter()
        .map(|(ref_, value)| Ok((ref_.parse::<Ref>()?, value.parse::<ConstValue>()?)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      mangled_props: self
        .mangled_props
        .into_iter()
        .map(|(name, ref_)| Ok((name, ref_.parse::<Ref>()?)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      reserved_props: self.reserved_props.into_iter().collect(),
      import_records: self
        .import_records
        .iter()
        .map(|record| record.parse::<ImportRecord>())
        .collect::<Result<Vec<_>, _>>()?,
      named_imports: self
        .named_imports
        .into_iter()
        .map(|(ref_, named)| Ok((ref_.parse::<Ref>()?, named.parse::<NamedImport>()?)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      named_exports: self
        .named_exports
        .into_iter()
        .map(|(alias, named)| Ok((alias, named.parse::<NamedExport>()?)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      export_star_import_records: self.export_star_import_records,
      source_map_comment: self.source_map_comment.parse::<Span>()?,
      export_keyword: self.export_keyword.parse::<Range>()?,
      top_level_await_keyword: self.top_level_await_keyword.parse::<Range>()?,
      live_top_level_await_keyword: self.live_top_level_await_keyword.parse::<Range>()?,
      exports_ref: self.exports_ref.parse::<Ref>()?,
      module_ref: self.module_ref.parse::<Ref>()?,
      wrapper_ref: self.wrapper_ref.parse::<Ref>()?,
      approximate_line_count: self.approximate_line_count,
      nested_scope_slot_counts: self.nested_scope_slot_counts,
      has_lazy_export: self.has_lazy_export,
      uses_exports_ref: self.uses_exports_ref,
      uses_module_ref: self.uses_module_ref,
      exports_kind: self.exports_kind,
    })
  }
}
