use crate::scope::scope_id_from_name;
use crate::scope::scope_name;
use crate::scope::ScopeId;
use crate::stmt::Stmt;
use crate::symbol::Ref;
use ahash::AHashMap;
use diagnostics::DecodeError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// The index of the generated part holding the `__export(exports, ...)`
/// call. Every file has one, possibly empty.
pub const NS_EXPORT_PART_INDEX: u32 = 0;

/// Another part in this file that must be included whenever the owning part
/// is included.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Dependency {
  pub source_index: u32,
  pub part_index: u32,
}

/// A symbol declared by a part. A symbol with several declarations (e.g.
/// repeated `var`) appears in several parts; the list is not deduplicated.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DeclaredSymbol {
  pub ref_: Ref,
  pub is_top_level: bool,
}

/// An estimate of how often a part uses a symbol.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SymbolUse {
  pub count_estimate: u32,
}

/// An estimate of how often a part calls a symbol.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SymbolCallUse {
  pub call_count_estimate: u32,
  pub single_arg_non_spread_call_count_estimate: u32,
}

/// One unit of tree shaking and code splitting: a run of top-level
/// statements that is kept or dropped as a whole and can be assigned to a
/// chunk independently of the rest of its file.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Part {
  pub stmts: Vec<Stmt>,

  /// Scopes owned by this part's statements, as ids into the file's arena.
  pub scopes: Vec<ScopeId>,

  /// Indices into the file-level import record list.
  pub import_record_indices: Vec<u32>,

  pub declared_symbols: Vec<DeclaredSymbol>,

  pub symbol_uses: AHashMap<Ref, SymbolUse>,
  pub symbol_call_uses: AHashMap<Ref, SymbolCallUse>,

  /// Property accesses off imported symbols. Whether the access is an
  /// inlined enum value is only known at link time, so the dependency on
  /// the imported symbol is deferred until then.
  pub import_symbol_property_uses: AHashMap<Ref, AHashMap<String, SymbolUse>>,

  pub dependencies: Vec<Dependency>,

  /// The part can be dropped when none of its declared symbols are used.
  /// Parts without this flag are always included when their file is.
  pub can_be_removed_if_unused: bool,

  /// Generated parts opt into tree shaking even when global tree shaking is
  /// off.
  pub force_tree_shaking: bool,

  /// Marked live by the tree shaking pass.
  pub is_live: bool,
}

/// The wire form of a [`Part`]: ref-keyed maps become sorted string-keyed
/// maps, and scope ids become scope names.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct SerializedPart {
  pub stmts: Vec<Stmt>,
  pub scopes: Vec<String>,
  pub import_record_indices: Vec<u32>,
  pub declared_symbols: Vec<DeclaredSymbol>,
  pub symbol_uses: BTreeMap<String, SymbolUse>,
  pub symbol_call_uses: BTreeMap<String, SymbolCallUse>,
  pub import_symbol_property_uses: BTreeMap<String, BTreeMap<String, SymbolUse>>,
  pub dependencies: Vec<Dependency>,
  pub can_be_removed_if_unused: bool,
  pub force_tree_shaking: bool,
  pub is_live: bool,
}

impl SerializedPart {
  pub fn from_part(part: &Part) -> SerializedPart {
    SerializedPart {
      stmts: part.stmts.clone(),
      scopes: part.scopes.iter().copied().map(scope_name).collect(),
      import_record_indices: part.import_record_indices.clone(),
      declared_symbols: part.declared_symbols.clone(),
      symbol_uses: part
        .symbol_uses
        .iter()
        .map(|(ref_, use_)| (ref_.to_string(), *use_))
        .collect(),
      symbol_call_uses: part
        .symbol_call_uses
        .iter()
        .map(|(ref_, use_)| (ref_.to_string(), *use_))
        .collect(),
      import_symbol_property_uses: part
        .import_symbol_property_uses
        .iter()
        .map(|(ref_, names)| {
          (
            ref_.to_string(),
            names.iter().map(|(name, use_)| (name.clone(), *use_)).collect(),
          )
        })
        .collect(),
      dependencies: part.dependencies.clone(),
      can_be_removed_if_unused: part.can_be_removed_if_unused,
      force_tree_shaking: part.force_tree_shaking,
      is_live: part.is_live,
    }
  }

  pub fn into_part(self) -> Result<Part, DecodeError> {
    Ok(Part {
      stmts: self.stmts,
      scopes: self
        .scopes
        .iter()
        .map(|name| scope_id_from_name(name))
        .collect::<Result<Vec<_>, _>>()?,
      import_record_indices: self.import_record_indices,
      declared_symbols: self.declared_symbols,
      symbol_uses: self
        .symbol_uses
        .into_iter()
        .map(|(ref_, use_)| Ok((ref_.parse::<Ref>()?, use_)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      symbol_call_uses: self
        .symbol_call_uses
        .into_iter()
        .map(|(ref_, use_)| Ok((ref_.parse::<Ref>()?, use_)))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      import_symbol_property_uses: self
        .import_symbol_property_uses
        .into_iter()
        .map(|(ref_, names)| Ok((ref_.parse::<Ref>()?, names.into_iter().collect())))
        .collect::<Result<AHashMap<_, _>, DecodeError>>()?,
      dependencies: self.dependencies,
      can_be_removed_if_unused: self.can_be_removed_if_unused,
      force_tree_shaking: self.force_tree_shaking,
      is_live: self.is_live,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use diagnostics::Loc;

  fn sample_part() -> Part {
    let mut part = Part {
      stmts: vec![Stmt::none(Loc(0))],
      scopes: vec![ScopeId(0), ScopeId(2)],
      import_record_indices: vec![1],
      declared_symbols: vec![DeclaredSymbol {
        ref_: Ref::new(1, 0),
        is_top_level: true,
      }],
      dependencies: vec![Dependency {
        source_index: 1,
        part_index: 0,
      }],
      can_be_removed_if_unused: true,
      ..Part::default()
    };
    part.symbol_uses.insert(Ref::new(1, 0), SymbolUse { count_estimate: 2 });
    part.symbol_uses.insert(Ref::new(1, 4), SymbolUse { count_estimate: 1 });
    part.symbol_call_uses.insert(Ref::new(1, 4), SymbolCallUse {
      call_count_estimate: 1,
      single_arg_non_spread_call_count_estimate: 1,
    });
    let mut props = AHashMap::new();
    props.insert("prop".to_string(), SymbolUse { count_estimate: 3 });
    part.import_symbol_property_uses.insert(Ref::new(2, 0), props);
    part
  }

  #[test]
  fn part_round_trips_through_wire_form() {
    let part = sample_part();
    let serialized = SerializedPart::from_part(&part);
    assert_eq!(serialized.scopes, vec!["0".to_string(), "2".to_string()]);
    assert!(serialized.symbol_uses.contains_key("1!~!0"));
    let back = serialized.into_part().unwrap();
    assert_eq!(back, part);
  }

  #[test]
  fn wire_maps_are_sorted_by_key() {
    let serialized = SerializedPart::from_part(&sample_part());
    let keys: Vec<_> = serialized.symbol_uses.keys().cloned().collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
  }

  #[test]
  fn bad_ref_key_is_rejected() {
    let mut serialized = SerializedPart::from_part(&sample_part());
    serialized.symbol_uses.insert("not-a-ref".to_string(), SymbolUse::default());
    assert!(serialized.into_part().is_err());
  }
}
