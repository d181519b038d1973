use crate::error::CacheError;
use crate::js::JsCacheEntry;
use crate::options::JsParserOptions;
use ast_js::ast::SerializedAst;
use diagnostics::Msg;
use diagnostics::Source;
use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::warn;

/// What to do when a record in the cache directory fails to decode at
/// startup.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum DiskErrorPolicy {
  /// The first undecodable record aborts the load.
  #[default]
  Strict,

  /// Log the record and continue with the rest of the directory.
  Skip,
}

#[derive(Clone, Debug)]
pub struct DiskConfig {
  /// Directory holding one record per cached JS/TS parse.
  pub cache_dir: PathBuf,

  /// Directory holding the source-index allocator state.
  pub index_dir: PathBuf,

  pub policy: DiskErrorPolicy,

  /// Write each new entry to disk in the background as it is inserted.
  pub write_through: bool,
}

impl DiskConfig {
  pub fn new(cache_dir: impl Into<PathBuf>, index_dir: impl Into<PathBuf>) -> DiskConfig {
    DiskConfig {
      cache_dir: cache_dir.into(),
      index_dir: index_dir.into(),
      policy: DiskErrorPolicy::Strict,
      write_through: true,
    }
  }

  pub fn policy(mut self, policy: DiskErrorPolicy) -> DiskConfig {
    self.policy = policy;
    self
  }

  pub fn write_through(mut self, write_through: bool) -> DiskConfig {
    self.write_through = write_through;
    self
  }
}

pub const SOURCE_INDEX_FILE: &str = "source_index_cache.json";

/// One cache record on disk: the serialized AST, the source it came from,
/// the parse outcome, the buffered messages, and the parser options the
/// entry was produced under.
#[derive(Serialize, Deserialize)]
struct CacheRecord {
  ast: SerializedAst,
  source: String,
  ok: bool,
  msgs: Vec<Msg>,
  options: Option<JsParserOptions>,
}

/// Reads and writes the cache directory. Records are content-addressed by
/// the digest of the source, so a changed file gets a fresh record instead
/// of overwriting the old one.
#[derive(Debug)]
pub struct DiskBackend {
  config: DiskConfig,
}

impl DiskBackend {
  pub fn new(config: DiskConfig) -> Result<DiskBackend, CacheError> {
    fs::create_dir_all(&config.cache_dir).map_err(|source| CacheError::io(&config.cache_dir, source))?;
    fs::create_dir_all(&config.index_dir).map_err(|source| CacheError::io(&config.index_dir, source))?;
    Ok(DiskBackend { config })
  }

  pub fn config(&self) -> &DiskConfig {
    &self.config
  }

  pub fn index_path(&self) -> PathBuf {
    self.config.index_dir.join(SOURCE_INDEX_FILE)
  }

  /// Where the record for this source lives. The identifier name is part of
  /// the digest so two sources with identical contents but different paths
  /// get distinct records.
  pub fn record_path(&self, source: &Source) -> PathBuf {
    let digest = content_digest(source);
    self.config.cache_dir.join(format!("{digest}.json"))
  }

  /// Serialize and write one entry. Empty payloads are refused.
  pub fn write_entry(&self, entry: &JsCacheEntry) -> Result<PathBuf, CacheError> {
    let path = self.record_path(&entry.source);
    let record = CacheRecord {
      ast: entry.ast.to_serialized(),
      source: entry.source.to_record_string(),
      ok: entry.ok,
      msgs: entry.msgs.clone(),
      options: entry.options.clone(),
    };
    let payload = serde_json::to_vec(&record).map_err(|reason| CacheError::record(&path, reason))?;
    write_payload_guarded(&path, &payload)?;
    Ok(path)
  }

  pub(crate) fn spawn_entry_write(self: &Arc<Self>, entry: Arc<JsCacheEntry>) {
    if !self.config.write_through {
      return;
    }
    let backend = Arc::clone(self);
    thread::spawn(move || {
      if let Err(error) = backend.write_entry(&entry) {
        warn!(%error, "background cache write failed");
      }
    });
  }

  pub fn decode_record(path: &Path, payload: &[u8]) -> Result<JsCacheEntry, CacheError> {
    let record: CacheRecord =
      serde_json::from_slice(payload).map_err(|reason| CacheError::record(path, reason))?;
    let ast = record.ast.into_ast().map_err(|reason| CacheError::record(path, reason))?;
    let source = Source::from_record_string(&record.source).map_err(|reason| CacheError::record(path, reason))?;
    Ok(JsCacheEntry {
      source,
      msgs: record.msgs,
      options: record.options,
      ast: Arc::new(ast),
      ok: record.ok,
    })
  }

  /// Decode every regular file in the cache directory, in parallel. Order
  /// is unspecified; insertion conflicts resolve last-writer-wins anyway.
  pub fn load_entries(&self) -> Result<Vec<JsCacheEntry>, CacheError> {
    let dir = &self.config.cache_dir;
    let mut files = Vec::new();
    let listing = fs::read_dir(dir).map_err(|source| CacheError::io(dir, source))?;
    for dirent in listing {
      let dirent = dirent.map_err(|source| CacheError::io(dir, source))?;
      let file_type = dirent.file_type().map_err(|source| CacheError::io(dir, source))?;
      if file_type.is_file() {
        files.push(dirent.path());
      }
    }

    let decoded: Vec<Result<JsCacheEntry, CacheError>> = files
      .par_iter()
      .map(|path| {
        let payload = fs::read(path).map_err(|source| CacheError::io(path, source))?;
        Self::decode_record(path, &payload)
      })
      .collect();

    let mut entries = Vec::with_capacity(decoded.len());
    for result in decoded {
      match result {
        Ok(entry) => entries.push(entry),
        Err(error) => match self.config.policy {
          DiskErrorPolicy::Strict => return Err(error),
          DiskErrorPolicy::Skip => warn!(%error, "skipping undecodable cache record"),
        },
      }
    }
    Ok(entries)
  }
}

/// Write a payload to a file, refusing to replace anything with zero bytes.
pub(crate) fn write_payload_guarded(path: &Path, payload: &[u8]) -> Result<(), CacheError> {
  if payload.is_empty() {
    return Err(CacheError::EmptyPayload { path: path.into() });
  }
  fs::write(path, payload).map_err(|source| CacheError::io(path, source))
}

fn content_digest(source: &Source) -> String {
  let mut hasher = Sha256::new();
  hasher.update(source.contents.as_bytes());
  hasher.update(source.identifier_name.as_bytes());
  let digest = hasher.finalize();
  let mut hex = String::with_capacity(digest.len() * 2);
  for byte in digest {
    hex.push_str(&format!("{byte:02x}"));
  }
  hex
}

#[cfg(test)]
mod tests {
  use super::*;
  use diagnostics::Path as SourcePath;

  #[test]
  fn empty_payload_is_refused_and_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("state.json");
    fs::write(&file, b"previous good state").unwrap();

    let result = write_payload_guarded(&file, b"");
    assert!(matches!(result, Err(CacheError::EmptyPayload { .. })));
    assert_eq!(fs::read(&file).unwrap(), b"previous good state");
  }

  #[test]
  fn record_names_depend_on_identifier_name() {
    let dir = tempfile::tempdir().unwrap();
    let backend = DiskBackend::new(DiskConfig::new(dir.path().join("cache"), dir.path().join("index"))).unwrap();

    let a = Source::new(SourcePath::file("/x/mod.js"), "x/mod.js", "same bytes", 1);
    let b = Source::new(SourcePath::file("/y/lib.js"), "y/lib.js", "same bytes", 2);
    assert_ne!(backend.record_path(&a), backend.record_path(&b));

    // Same contents and identifier stem collide on purpose: the record is
    // content-addressed.
    let c = Source::new(SourcePath::file("/z/mod.js"), "z/mod.js", "same bytes", 3);
    assert_eq!(backend.record_path(&a), backend.record_path(&c));
  }

  #[test]
  fn digest_is_stable_hex() {
    let source = Source::new(SourcePath::file("/a.js"), "a.js", "abc", 1);
    let digest = content_digest(&source);
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(digest, content_digest(&source));
  }
}
