use bitflags::bitflags;
use diagnostics::DecodeError;
use diagnostics::Loc;
use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

/// A reference into the global symbol table.
///
/// Files are parsed in parallel, so every parser hands out symbol ids scoped
/// by its own source index; the inner index increments per symbol within that
/// file. The global symbol map is then a two-level array that can be merged
/// across files without rewriting ids.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Ref {
  pub source_index: u32,
  pub inner_index: u32,
}

pub const INVALID_REF: Ref = Ref {
  source_index: u32::MAX,
  inner_index: u32::MAX,
};

impl Ref {
  pub const fn new(source_index: u32, inner_index: u32) -> Ref {
    Ref {
      source_index,
      inner_index,
    }
  }

  pub fn is_valid(self) -> bool {
    self != INVALID_REF
  }
}

impl Display for Ref {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}!~!{}", self.source_index, self.inner_index)
  }
}

impl FromStr for Ref {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (source, inner) = s.split_once("!~!").ok_or_else(|| DecodeError::new("ref", s))?;
    Ok(Ref {
      source_index: source.parse().map_err(|_| DecodeError::new("ref", s))?,
      inner_index: inner.parse().map_err(|_| DecodeError::new("ref", s))?,
    })
  }
}

// Refs serialize as their string form so maps keyed on them are plain
// string-keyed maps on the wire.
impl Serialize for Ref {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Ref {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Ref, D::Error> {
    struct RefVisitor;
    impl<'de> de::Visitor<'de> for RefVisitor {
      type Value = Ref;

      fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a \"<source>!~!<inner>\" symbol reference")
      }

      fn visit_str<E: de::Error>(self, value: &str) -> Result<Ref, E> {
        value.parse().map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
      }
    }
    deserializer.deserialize_str(RefVisitor)
  }
}

/// An optional 32-bit index stored inline. The zero value is the invalid
/// index; valid indices store their bitwise complement. The wire form is the
/// raw complemented bits so the sentinel round-trips unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index32 {
  flipped_bits: u32,
}

pub const INVALID_INDEX32: Index32 = Index32 { flipped_bits: 0 };

impl Index32 {
  pub const fn new(index: u32) -> Index32 {
    Index32 {
      flipped_bits: !index,
    }
  }

  pub fn is_valid(self) -> bool {
    self.flipped_bits != 0
  }

  pub fn get(self) -> u32 {
    !self.flipped_bits
  }

  pub const fn raw(self) -> u32 {
    self.flipped_bits
  }

  pub const fn from_raw(flipped_bits: u32) -> Index32 {
    Index32 { flipped_bits }
  }
}

impl Default for Index32 {
  fn default() -> Index32 {
    INVALID_INDEX32
  }
}

/// A ref together with the location it appeared at.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LocRef {
  pub loc: Loc,
  pub ref_: Ref,
}

impl LocRef {
  pub fn new(loc: Loc, ref_: Ref) -> LocRef {
    LocRef { loc, ref_ }
  }
}

impl Default for LocRef {
  fn default() -> LocRef {
    LocRef {
      loc: Loc(0),
      ref_: INVALID_REF,
    }
  }
}

impl Display for LocRef {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.loc, self.ref_)
  }
}

impl FromStr for LocRef {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (loc, ref_) = s.split_once(' ').ok_or_else(|| DecodeError::new("loc ref", s))?;
    Ok(LocRef {
      loc: loc.parse()?,
      ref_: ref_.parse()?,
    })
  }
}

/// Symbol classification. Declaration order is meaningful: the private kinds
/// form a contiguous run so `is_private` is a range check.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum SymbolKind {
  /// Not declared in the file it's referenced in (e.g. `window`).
  Unbound,

  /// Function arguments, function statements, and `var` declarations. These
  /// may be re-declared in the same scope and hoist to the closest function
  /// or module scope.
  Hoisted,
  HoistedFunction,

  /// A catch variable declared with a simple identifier blocks `var`
  /// hoisting instead of producing an error; this kind marks that case.
  CatchIdentifier,

  /// Generator and async functions are not hoisted but may still overwrite
  /// earlier functions with the same name.
  GeneratorOrAsyncFunction,

  /// The implicit `arguments` binding inside functions.
  Arguments,

  /// Classes can merge with TypeScript namespaces.
  Class,

  /// Class names referenced from computed property keys are an error.
  ClassInComputedPropertyKey,

  PrivateField,
  PrivateMethod,
  PrivateGet,
  PrivateSet,
  PrivateGetSetPair,
  PrivateStaticField,
  PrivateStaticMethod,
  PrivateStaticGet,
  PrivateStaticSet,
  PrivateStaticGetSetPair,

  /// Labels live in their own namespace.
  Label,

  /// TypeScript enums merge with namespaces and other enums.
  TsEnum,

  /// TypeScript namespaces merge with classes, functions, enums, and other
  /// namespaces.
  TsNamespace,

  /// TypeScript imports may silently collide with module-local symbols
  /// because they might be type-only.
  Import,

  /// Assigning to a `const` symbol throws at run time.
  Const,

  /// Injected symbols can be overridden by provided defines.
  Injected,

  /// A property slated for renaming to a shorter name.
  MangledProp,

  /// CSS identifiers that are never renamed.
  GlobalCss,

  /// CSS identifiers renamed to be unique to their file.
  LocalCss,

  Other,
}

impl SymbolKind {
  pub fn is_private(self) -> bool {
    self >= SymbolKind::PrivateField && self <= SymbolKind::PrivateStaticGetSetPair
  }

  pub fn is_hoisted(self) -> bool {
    matches!(self, SymbolKind::Hoisted | SymbolKind::HoistedFunction)
  }

  pub fn is_hoisted_or_function(self) -> bool {
    self.is_hoisted() || self == SymbolKind::GeneratorOrAsyncFunction
  }

  pub fn is_function(self) -> bool {
    matches!(self, SymbolKind::HoistedFunction | SymbolKind::GeneratorOrAsyncFunction)
  }

  pub fn is_unbound_or_injected(self) -> bool {
    matches!(self, SymbolKind::Unbound | SymbolKind::Injected)
  }
}

bitflags! {
  #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
  pub struct SymbolFlags: u16 {
    /// Renaming would be observable (e.g. `arguments`, or identifiers inside
    /// a `with` statement).
    const MUST_NOT_BE_RENAMED = 1 << 0;

    /// In preserved JSX, upper-case names are identifiers and lower-case
    /// names are strings, so a generated name must stay capitalized.
    const MUST_START_WITH_CAPITAL_LETTER_FOR_JSX = 1 << 1;

    /// Target of a `__name` helper call, which doesn't count as a use.
    const DID_KEEP_NAME = 1 << 2;

    /// Private symbols sometimes need lowering even when supported, e.g.
    /// static fields under `useDefineForClassFields: false`.
    const PRIVATE_SYMBOL_MUST_BE_LOWERED = 1 << 3;

    /// Drop all but the last re-declaration of a plain function.
    const REMOVE_OVERWRITTEN_FUNCTION_DECLARATION = 1 << 4;

    /// Only warn once about `module`/`exports` unbound symbols in ESM.
    const DID_WARN_ABOUT_COMMONJS_IN_ESM = 1 << 5;

    /// The symbol could be overwritten, so its initializer tells us nothing.
    const COULD_POTENTIALLY_BE_MUTATED = 1 << 6;

    /// Exported with the ES6 `export` keyword.
    const WAS_EXPORTED = 1 << 7;

    /// A plain function with no body statements.
    const IS_EMPTY_FUNCTION = 1 << 8;

    /// A plain function that returns its single argument.
    const IS_IDENTITY_FUNCTION = 1 << 9;

    /// Calls can be unwrapped (dropped except for argument side effects)
    /// when the result is unused.
    const CALL_CAN_BE_UNWRAPPED_IF_UNUSED = 1 << 10;
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ImportItemStatus {
  #[default]
  None,

  /// The linker doesn't report import/export mismatch errors.
  Generated,

  /// The printer will replace this import with `undefined`.
  Missing,
}

/// An alias for a symbol imported through a namespace import. Stored on the
/// symbol itself: after cross-file merging, a renamed symbol from another
/// file must still be able to tell that it prints as a property access.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NamespaceAlias {
  pub alias: String,
  pub namespace_ref: Ref,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Symbol {
  pub kind: SymbolKind,

  /// The name from the parser. Printed names may differ after renaming; do
  /// not print this.
  pub original_name: String,

  pub flags: SymbolFlags,

  /// Merged symbols form a linked list where the last link is the symbol to
  /// use; invalid means this is the last link. Use `SymbolMap::follow`.
  pub link: Ref,

  /// An estimate of uses; always non-zero when the symbol is used.
  pub use_count_estimate: u32,

  /// Cross-chunk import/export bookkeeping for code splitting.
  pub chunk_index: Index32,

  /// Minifier slot within the enclosing nested scope, per namespace.
  pub nested_scope_slot: Index32,

  pub namespace_alias: Option<NamespaceAlias>,

  pub import_item_status: ImportItemStatus,
}

impl Symbol {
  pub fn new(kind: SymbolKind, original_name: impl Into<String>) -> Symbol {
    Symbol {
      kind,
      original_name: original_name.into(),
      flags: SymbolFlags::empty(),
      link: INVALID_REF,
      use_count_estimate: 0,
      chunk_index: INVALID_INDEX32,
      nested_scope_slot: INVALID_INDEX32,
      namespace_alias: None,
      import_item_status: ImportItemStatus::None,
    }
  }

  /// Fold the contents of a merged-away symbol into this one. Callers go
  /// through [`SymbolMap::merge`].
  pub fn merge_contents_with(&mut self, old: &Symbol) {
    self.use_count_estimate += old.use_count_estimate;
    if old.flags.contains(SymbolFlags::MUST_NOT_BE_RENAMED)
      && !self.flags.contains(SymbolFlags::MUST_NOT_BE_RENAMED)
    {
      self.original_name = old.original_name.clone();
      self.flags |= SymbolFlags::MUST_NOT_BE_RENAMED;
    }
    if old.flags.contains(SymbolFlags::MUST_START_WITH_CAPITAL_LETTER_FOR_JSX) {
      self.flags |= SymbolFlags::MUST_START_WITH_CAPITAL_LETTER_FOR_JSX;
    }
  }

  pub fn slot_namespace(&self) -> SlotNamespace {
    if self.kind == SymbolKind::Unbound || self.flags.contains(SymbolFlags::MUST_NOT_BE_RENAMED) {
      return SlotNamespace::MustNotBeRenamed;
    }
    if self.kind.is_private() {
      return SlotNamespace::PrivateName;
    }
    if self.kind == SymbolKind::Label {
      return SlotNamespace::Label;
    }
    if self.kind == SymbolKind::MangledProp {
      return SlotNamespace::MangledProp;
    }
    SlotNamespace::Default
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlotNamespace {
  Default,
  Label,
  PrivateName,
  MangledProp,
  MustNotBeRenamed,
}

/// Per-namespace counts of minifier slots used by nested scopes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotCounts(pub [u32; 4]);

impl SlotCounts {
  pub fn union_max(&mut self, other: SlotCounts) {
    for (a, b) in self.0.iter_mut().zip(other.0) {
      if *a < b {
        *a = b;
      }
    }
  }
}

/// A histogram of identifier character frequencies, used to shuffle the
/// minifier alphabet so frequent characters get the shortest names.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CharFreq(pub [i32; 64]);

impl Default for CharFreq {
  fn default() -> CharFreq {
    CharFreq([0; 64])
  }
}

// 64-element arrays have no derived serde form; the histogram travels as a
// plain sequence.
impl Serialize for CharFreq {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.0.as_slice().serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for CharFreq {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<CharFreq, D::Error> {
    let values = Vec::<i32>::deserialize(deserializer)?;
    let len = values.len();
    let array: [i32; 64] = values
      .try_into()
      .map_err(|_| de::Error::invalid_length(len, &"a 64-element histogram"))?;
    Ok(CharFreq(array))
  }
}

impl CharFreq {
  pub fn scan(&mut self, text: &str, delta: i32) {
    if delta == 0 {
      return;
    }
    for c in text.bytes() {
      match c {
        b'a'..=b'z' => self.0[(c - b'a') as usize] += delta,
        b'A'..=b'Z' => self.0[(c - b'A' + 26) as usize] += delta,
        b'0'..=b'9' => self.0[(c - b'0' + 52) as usize] += delta,
        b'_' => self.0[62] += delta,
        b'$' => self.0[63] += delta,
        _ => {}
      }
    }
  }

  pub fn include(&mut self, other: &CharFreq) {
    for (a, b) in self.0.iter_mut().zip(other.0) {
      *a += b;
    }
  }
}

/// The global symbol table: a two-level array indexed by
/// `(source_index, inner_index)`. Each file fills exactly one inner array, so
/// merging the tables of all parsed files is a single outer-array join.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct SymbolMap {
  pub symbols_for_source: Vec<Vec<Symbol>>,
}

impl SymbolMap {
  pub fn new(source_count: usize) -> SymbolMap {
    SymbolMap {
      symbols_for_source: vec![Vec::new(); source_count],
    }
  }

  pub fn get(&self, ref_: Ref) -> &Symbol {
    &self.symbols_for_source[ref_.source_index as usize][ref_.inner_index as usize]
  }

  pub fn get_mut(&mut self, ref_: Ref) -> &mut Symbol {
    &mut self.symbols_for_source[ref_.source_index as usize][ref_.inner_index as usize]
  }

  /// Resolve a ref to the canonical ref for its symbol, compressing the link
  /// chain along the way so later lookups are O(1).
  pub fn follow(&mut self, ref_: Ref) -> Ref {
    let mut chain = Vec::new();
    let mut current = ref_;
    loop {
      let link = self.get(current).link;
      if link == INVALID_REF {
        break;
      }
      chain.push(current);
      current = link;
    }
    for visited in chain {
      let symbol = self.get_mut(visited);
      if symbol.link != current {
        symbol.link = current;
      }
    }
    current
  }

  /// Compress every link chain up front. Run this before readers resolve
  /// refs from multiple threads: afterwards `follow` performs no writes.
  pub fn follow_all(&mut self) {
    for source_index in 0..self.symbols_for_source.len() {
      for inner_index in 0..self.symbols_for_source[source_index].len() {
        self.follow(Ref::new(source_index as u32, inner_index as u32));
      }
    }
  }

  /// Make `old` point at `new` by joining their link chains, so `follow` on
  /// either ref yields the same canonical ref.
  pub fn merge(&mut self, old: Ref, new: Ref) -> Ref {
    if old == new {
      return new;
    }

    let old_link = self.get(old).link;
    if old_link != INVALID_REF {
      let merged = self.merge(old_link, new);
      self.get_mut(old).link = merged;
      return merged;
    }

    let new_link = self.get(new).link;
    if new_link != INVALID_REF {
      let merged = self.merge(old, new_link);
      self.get_mut(new).link = merged;
      return merged;
    }

    self.get_mut(old).link = new;
    let old_contents = self.get(old).clone();
    self.get_mut(new).merge_contents_with(&old_contents);
    new
  }
}
