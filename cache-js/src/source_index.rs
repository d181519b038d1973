use crate::disk::write_payload_guarded;
use crate::error::CacheError;
use ahash::AHashMap;
use diagnostics::DecodeError;
use diagnostics::Path;
use parking_lot::Mutex;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path as FsPath;
use std::str::FromStr;

/// The source index reserved for the injected runtime shim; real inputs
/// start above it.
pub const RUNTIME_SOURCE_INDEX: u32 = 0;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SourceIndexKind {
  Normal,

  /// The generated JS stub that stands in for a CSS file on the JS side of
  /// the build. It needs an index of its own, distinct from the CSS file's.
  JsStubForCss,
}

impl SourceIndexKind {
  fn from_u8(value: u8) -> Option<SourceIndexKind> {
    Some(match value {
      0 => SourceIndexKind::Normal,
      1 => SourceIndexKind::JsStubForCss,
      _ => return None,
    })
  }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SourceIndexKey {
  pub path: Path,
  pub kind: SourceIndexKind,
}

// The kind leads and the path goes last so embedded spaces in paths survive.
impl Display for SourceIndexKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind as u8, self.path)
  }
}

impl FromStr for SourceIndexKey {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (kind, path) = s.split_once(' ').ok_or_else(|| DecodeError::new("source index key", s))?;
    let kind = kind
      .parse::<u8>()
      .ok()
      .and_then(SourceIndexKind::from_u8)
      .ok_or_else(|| DecodeError::new("source index kind", s))?;
    Ok(SourceIndexKey {
      path: path.parse()?,
      kind,
    })
  }
}

#[derive(Debug)]
struct AllocatorState {
  entries: AHashMap<SourceIndexKey, u32>,
  glob_entries: AHashMap<u64, u32>,
  next_source_index: u32,
}

/// Assigns each `(path, kind)` pair a stable 32-bit source index.
///
/// Indices are handed out monotonically and never reused, which is what
/// makes persisted ASTs (whose symbol refs embed source indices) reusable
/// across builds: `next_source_index` is the source of truth and must be
/// restored via [`SourceIndexAllocator::load`] before the first `get`.
#[derive(Debug)]
pub struct SourceIndexAllocator {
  state: Mutex<AllocatorState>,
}

/// The persisted form of the allocator. One small file holds all three
/// fields; see [`SourceIndexAllocator::persist`].
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct SerializedSourceIndex {
  pub entries: BTreeMap<String, u32>,
  pub glob_entries: BTreeMap<u64, u32>,
  pub next_source_index: u32,
}

impl Default for SourceIndexAllocator {
  fn default() -> SourceIndexAllocator {
    SourceIndexAllocator::new()
  }
}

impl SourceIndexAllocator {
  pub fn new() -> SourceIndexAllocator {
    SourceIndexAllocator {
      state: Mutex::new(AllocatorState {
        entries: AHashMap::new(),
        glob_entries: AHashMap::new(),
        next_source_index: RUNTIME_SOURCE_INDEX + 1,
      }),
    }
  }

  /// The index for this `(path, kind)` pair, allocating the next free index
  /// on first sight. Idempotent.
  pub fn get(&self, path: Path, kind: SourceIndexKind) -> u32 {
    let key = SourceIndexKey { path, kind };
    let mut state = self.state.lock();
    if let Some(&index) = state.entries.get(&key) {
      return index;
    }
    let index = state.next_source_index;
    state.next_source_index += 1;
    state.entries.insert(key, index);
    index
  }

  /// The index for a glob expansion, keyed by the importing file's index
  /// and the position of the glob within it.
  pub fn get_glob(&self, parent_source_index: u32, glob_index: u32) -> u32 {
    let key = (u64::from(parent_source_index) << 32) | u64::from(glob_index);
    let mut state = self.state.lock();
    if let Some(&index) = state.glob_entries.get(&key) {
      return index;
    }
    let index = state.next_source_index;
    state.next_source_index += 1;
    state.glob_entries.insert(key, index);
    index
  }

  /// A capacity hint for per-source tables: the next index plus slack for a
  /// few new files, so a warm rebuild rarely reallocates.
  pub fn len_hint(&self) -> u32 {
    const SOME_EXTRA_ROOM: u32 = 16;
    self.state.lock().next_source_index + SOME_EXTRA_ROOM
  }

  pub fn serialized(&self) -> SerializedSourceIndex {
    let state = self.state.lock();
    SerializedSourceIndex {
      entries: state.entries.iter().map(|(key, &index)| (key.to_string(), index)).collect(),
      glob_entries: state.glob_entries.iter().map(|(&key, &index)| (key, index)).collect(),
      next_source_index: state.next_source_index,
    }
  }

  /// Replace the allocator state wholesale with a previously persisted one.
  pub fn restore(&self, serialized: SerializedSourceIndex) -> Result<(), CacheError> {
    let entries = serialized
      .entries
      .into_iter()
      .map(|(key, index)| {
        key
          .parse::<SourceIndexKey>()
          .map(|key| (key, index))
          .map_err(|reason| CacheError::SourceIndexDecode {
            reason: reason.to_string(),
          })
      })
      .collect::<Result<AHashMap<_, _>, _>>()?;

    let mut state = self.state.lock();
    state.entries = entries;
    state.glob_entries = serialized.glob_entries.into_iter().collect();
    state.next_source_index = serialized.next_source_index;
    Ok(())
  }

  /// Write the allocator state to one file. An empty serialization is
  /// refused rather than allowed to destroy the previous state.
  pub fn persist(&self, file: &FsPath) -> Result<(), CacheError> {
    let payload = serde_json::to_vec(&self.serialized()).map_err(|reason| CacheError::SourceIndexDecode {
      reason: reason.to_string(),
    })?;
    write_payload_guarded(file, &payload)
  }

  /// Read previously persisted state. Must complete before the first `get`
  /// so no index is ever handed out twice.
  pub fn load(&self, file: &FsPath) -> Result<(), CacheError> {
    let payload = std::fs::read(file).map_err(|source| CacheError::io(file, source))?;
    let serialized: SerializedSourceIndex =
      serde_json::from_slice(&payload).map_err(|reason| CacheError::SourceIndexDecode {
        reason: reason.to_string(),
      })?;
    self.restore(serialized)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn get_is_idempotent() {
    let allocator = SourceIndexAllocator::new();
    let a = allocator.get(Path::file("/a.js"), SourceIndexKind::Normal);
    let b = allocator.get(Path::file("/b.js"), SourceIndexKind::Normal);
    assert_eq!(a, 1);
    assert_eq!(b, 2);
    assert_eq!(allocator.get(Path::file("/a.js"), SourceIndexKind::Normal), a);
  }

  #[test]
  fn kinds_get_distinct_indices() {
    let allocator = SourceIndexAllocator::new();
    let css = allocator.get(Path::file("/styles.css"), SourceIndexKind::Normal);
    let stub = allocator.get(Path::file("/styles.css"), SourceIndexKind::JsStubForCss);
    assert_ne!(css, stub);
  }

  #[test]
  fn glob_keys_pack_both_halves() {
    let allocator = SourceIndexAllocator::new();
    let a = allocator.get_glob(1, 0);
    let b = allocator.get_glob(0, 1);
    assert_ne!(a, b);
    assert_eq!(allocator.get_glob(1, 0), a);
  }

  #[test]
  fn len_hint_leaves_room() {
    let allocator = SourceIndexAllocator::new();
    allocator.get(Path::file("/a.js"), SourceIndexKind::Normal);
    assert_eq!(allocator.len_hint(), 2 + 16);
  }

  #[test]
  fn key_codec_round_trips() {
    let key = SourceIndexKey {
      path: Path::file("/dir with space/a.js"),
      kind: SourceIndexKind::JsStubForCss,
    };
    assert_eq!(key.to_string().parse::<SourceIndexKey>().unwrap(), key);
    assert!("9 file:/a.js".parse::<SourceIndexKey>().is_err());
  }

  #[test]
  fn serialized_state_round_trips() {
    let allocator = SourceIndexAllocator::new();
    allocator.get(Path::file("/a.js"), SourceIndexKind::Normal);
    allocator.get_glob(1, 2);

    let serialized = allocator.serialized();
    assert_eq!(serialized.next_source_index, 3);

    let restored = SourceIndexAllocator::new();
    restored.restore(serialized.clone()).unwrap();
    assert_eq!(restored.serialized(), serialized);

    // A previously assigned index is stable after the restore, and new
    // paths continue above the high-water mark.
    assert_eq!(restored.get(Path::file("/a.js"), SourceIndexKind::Normal), 1);
    assert_eq!(restored.get(Path::file("/c.js"), SourceIndexKind::Normal), 3);
  }
}
