use crate::num::JsNumber;
use crate::symbol::LocRef;
use crate::symbol::Ref;
use crate::symbol::INVALID_REF;
use diagnostics::DecodeError;
use diagnostics::Loc;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Index;
use std::ops::IndexMut;
use std::sync::Arc;

/// Lexical scope classification. Declaration order is meaningful: every kind
/// from `Entry` on stops hoisted variables from extending into parent scopes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ScopeKind {
  Block,
  With,
  Label,
  ClassName,
  ClassBody,
  CatchBinding,

  /// A module, TypeScript enum, or TypeScript namespace.
  Entry,
  FunctionArgs,
  FunctionBody,
  ClassStaticInit,
}

impl ScopeKind {
  pub fn stops_hoisting(self) -> bool {
    self >= ScopeKind::Entry
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum StrictModeKind {
  SloppyMode,
  ExplicitStrictMode,
  ImplicitStrictModeClass,
  ImplicitStrictModeEsm,
  ImplicitStrictModeTsAlwaysStrict,
  ImplicitStrictModeJsxAutomaticRuntime,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ScopeMember {
  pub ref_: Ref,
  pub loc: Loc,
}

pub type TsNamespaceMembers = BTreeMap<String, TsNamespaceMember>;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TsNamespaceMember {
  pub loc: Loc,
  pub data: TsNamespaceMemberData,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "$t")]
pub enum TsNamespaceMemberData {
  /// A non-constant exported member (cannot be inlined).
  Property {},

  /// A nested namespace or enum sharing its own exported member table.
  Namespace { exported_members: Arc<TsNamespaceMembers> },

  /// An exported enum member with a constant numeric value.
  EnumNumber { value: JsNumber },

  /// An exported enum member with a constant string value (UTF-16 units).
  EnumString { value: Vec<u16> },
}

/// Extra state for scopes that belong to a TypeScript `namespace` or `enum`
/// body. Re-opening a namespace produces multiple scopes that share one
/// exported-member table, which is why the table sits behind an `Arc`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TsNamespaceScope {
  pub exported_members: Arc<TsNamespaceMembers>,

  /// The symbol for the namespace argument of the wrapping closure. Each
  /// body scope gets its own argument symbol even when the namespace is
  /// re-opened.
  pub arg_ref: Ref,

  pub is_enum_scope: bool,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Scope {
  pub kind: ScopeKind,
  pub parent: Option<ScopeId>,
  pub children: Vec<ScopeId>,
  pub members: BTreeMap<String, ScopeMember>,
  pub replaced: Vec<ScopeMember>,
  pub generated: Vec<Ref>,

  /// The location of the `"use strict"` directive for explicit strict mode.
  pub use_strict_loc: Loc,

  /// The label symbol for `Label` scopes.
  pub label: LocRef,
  pub label_stmt_is_loop: bool,

  /// A direct `eval()` can reference anything in scope, so nothing in such a
  /// scope can be renamed.
  pub contains_direct_eval: bool,

  /// `arguments` is forbidden inside class body scopes.
  pub forbid_arguments: bool,

  /// A chain of `const` declarations at the start of a statement list can be
  /// constant-propagated without TDZ concerns.
  pub is_after_const_local_prefix: bool,

  pub strict_mode: StrictModeKind,
  pub ts_namespace: Option<TsNamespaceScope>,
}

impl Scope {
  pub fn new(kind: ScopeKind) -> Scope {
    Scope {
      kind,
      parent: None,
      children: Vec::new(),
      members: BTreeMap::new(),
      replaced: Vec::new(),
      generated: Vec::new(),
      use_strict_loc: Loc(0),
      label: LocRef::new(Loc(0), INVALID_REF),
      label_stmt_is_loop: false,
      contains_direct_eval: false,
      forbid_arguments: false,
      is_after_const_local_prefix: false,
      strict_mode: StrictModeKind::SloppyMode,
      ts_namespace: None,
    }
  }
}

/// A stable index into a [`ScopeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

/// All scopes of one file. The tree is cyclic (children hold parent
/// back-edges), so scopes live in an arena and edges are ids, not pointers.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ScopeArena {
  scopes: Vec<Scope>,
}

impl ScopeArena {
  pub fn new() -> ScopeArena {
    ScopeArena::default()
  }

  pub fn alloc(&mut self, scope: Scope) -> ScopeId {
    let id = ScopeId(self.scopes.len() as u32);
    self.scopes.push(scope);
    id
  }

  /// Allocate a scope and wire it under `parent` (both edges).
  pub fn alloc_child(&mut self, parent: ScopeId, scope: Scope) -> ScopeId {
    let id = self.alloc(scope);
    self.scopes[id.0 as usize].parent = Some(parent);
    self.scopes[parent.0 as usize].children.push(id);
    id
  }

  pub fn len(&self) -> usize {
    self.scopes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scopes.is_empty()
  }

  pub fn get(&self, id: ScopeId) -> &Scope {
    &self.scopes[id.0 as usize]
  }

  pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
    &mut self.scopes[id.0 as usize]
  }

  pub fn contains(&self, id: ScopeId) -> bool {
    (id.0 as usize) < self.scopes.len()
  }

  /// Pre-order depth-first traversal from `root`, visiting each scope at
  /// most once. Iterative so that deeply nested inputs cannot exhaust the
  /// thread stack.
  pub fn preorder(&self, root: ScopeId) -> Vec<ScopeId> {
    let mut visited = vec![false; self.scopes.len()];
    let mut order = Vec::with_capacity(self.scopes.len());
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
      let seen = &mut visited[id.0 as usize];
      if *seen {
        continue;
      }
      *seen = true;
      order.push(id);
      for &child in self.get(id).children.iter().rev() {
        stack.push(child);
      }
    }
    order
  }

  /// Put `root` and every transitive child that is still sloppy into the
  /// given strict mode.
  pub fn recursive_set_strict_mode(&mut self, root: ScopeId, kind: StrictModeKind) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
      let scope = self.get_mut(id);
      if scope.strict_mode == StrictModeKind::SloppyMode {
        scope.strict_mode = kind;
        stack.extend(scope.children.iter().copied());
      }
    }
  }
}

impl Index<ScopeId> for ScopeArena {
  type Output = Scope;

  fn index(&self, id: ScopeId) -> &Scope {
    self.get(id)
  }
}

impl IndexMut<ScopeId> for ScopeArena {
  fn index_mut(&mut self, id: ScopeId) -> &mut Scope {
    self.get_mut(id)
  }
}

/// The synthetic name a scope carries on the wire: the hex of its arena
/// index. Stable across encode/decode, so ids survive a round trip.
pub fn scope_name(id: ScopeId) -> String {
  format!("{:x}", id.0)
}

pub fn scope_id_from_name(name: &str) -> Result<ScopeId, DecodeError> {
  u32::from_str_radix(name, 16)
    .map(ScopeId)
    .map_err(|_| DecodeError::new("scope name", name))
}

/// One scope on the wire. The cyclic parent/child edges are broken into name
/// references; the root is the node whose parent is the empty string.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SerializedScope {
  pub name: String,
  pub parent: String,
  pub children: Vec<String>,
  pub kind: ScopeKind,
  pub members: BTreeMap<String, ScopeMember>,
  pub replaced: Vec<ScopeMember>,
  pub generated: Vec<Ref>,
  pub use_strict_loc: Loc,
  pub label: LocRef,
  pub label_stmt_is_loop: bool,
  pub contains_direct_eval: bool,
  pub forbid_arguments: bool,
  pub is_after_const_local_prefix: bool,
  pub strict_mode: StrictModeKind,
  pub ts_namespace: Option<TsNamespaceScope>,
}

/// Flatten the scope tree under `root` into a pre-order list of named nodes.
pub fn flatten_scopes(arena: &ScopeArena, root: ScopeId) -> Vec<SerializedScope> {
  arena
    .preorder(root)
    .into_iter()
    .map(|id| {
      let scope = arena.get(id);
      SerializedScope {
        name: scope_name(id),
        parent: scope.parent.map(scope_name).unwrap_or_default(),
        children: scope.children.iter().copied().map(scope_name).collect(),
        kind: scope.kind,
        members: scope.members.clone(),
        replaced: scope.replaced.clone(),
        generated: scope.generated.clone(),
        use_strict_loc: scope.use_strict_loc,
        label: scope.label,
        label_stmt_is_loop: scope.label_stmt_is_loop,
        contains_direct_eval: scope.contains_direct_eval,
        forbid_arguments: scope.forbid_arguments,
        is_after_const_local_prefix: scope.is_after_const_local_prefix,
        strict_mode: scope.strict_mode,
        ts_namespace: scope.ts_namespace.clone(),
      }
    })
    .collect()
}

/// Rebuild an arena from its flat wire form: materialize every node first,
/// then resolve parent/child names into ids. Names encode the original arena
/// indices, so ids (and anything that stored them) remain valid.
pub fn rebuild_scopes(flat: &[SerializedScope]) -> Result<(ScopeArena, ScopeId), DecodeError> {
  if flat.is_empty() {
    return Err(DecodeError::new("scope table", "empty"));
  }

  let mut slots: Vec<Option<Scope>> = Vec::new();
  let mut root = None;
  for serialized in flat {
    let id = scope_id_from_name(&serialized.name)?;
    let parent = if serialized.parent.is_empty() {
      if root.replace(id).is_some() {
        return Err(DecodeError::new("scope table", "multiple roots"));
      }
      None
    } else {
      Some(scope_id_from_name(&serialized.parent)?)
    };
    let children = serialized
      .children
      .iter()
      .map(|name| scope_id_from_name(name))
      .collect::<Result<Vec<_>, _>>()?;

    let scope = Scope {
      kind: serialized.kind,
      parent,
      children,
      members: serialized.members.clone(),
      replaced: serialized.replaced.clone(),
      generated: serialized.generated.clone(),
      use_strict_loc: serialized.use_strict_loc,
      label: serialized.label,
      label_stmt_is_loop: serialized.label_stmt_is_loop,
      contains_direct_eval: serialized.contains_direct_eval,
      forbid_arguments: serialized.forbid_arguments,
      is_after_const_local_prefix: serialized.is_after_const_local_prefix,
      strict_mode: serialized.strict_mode,
      ts_namespace: serialized.ts_namespace.clone(),
    };

    let index = id.0 as usize;
    if slots.len() <= index {
      slots.resize_with(index + 1, || None);
    }
    if slots[index].replace(scope).is_some() {
      return Err(DecodeError::new("scope table", serialized.name.clone()));
    }
  }

  let root = root.ok_or_else(|| DecodeError::new("scope table", "no root"))?;
  let scopes = slots
    .into_iter()
    .enumerate()
    .map(|(index, slot)| slot.ok_or_else(|| DecodeError::new("scope table", format!("missing entry {index:x}"))))
    .collect::<Result<Vec<_>, _>>()?;

  // Validate every child edge before walking anything, so a corrupt record
  // can neither index out of bounds nor hide an inconsistent back-edge.
  let arena = ScopeArena { scopes };
  for (index, scope) in arena.scopes.iter().enumerate() {
    let id = ScopeId(index as u32);
    for &child in &scope.children {
      if !arena.contains(child) || arena.get(child).parent != Some(id) {
        return Err(DecodeError::new("scope table", scope_name(child)));
      }
    }
  }

  // A tree reaches every node from the root exactly once; anything less
  // means the record smuggled in a disconnected or cyclic component.
  if arena.preorder(root).len() != arena.len() {
    return Err(DecodeError::new("scope table", "unreachable scopes"));
  }

  Ok((arena, root))
}
