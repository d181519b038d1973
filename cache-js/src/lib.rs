//! A cache of parsed file contents, reused between builds so that a rebuild
//! only re-parses what changed.
//!
//! Reuse is only sound under three rules, which every consumer must follow:
//!
//! - Cached ASTs are immutable. They are shared between builds; a pass that
//!   mutates must work on a shallow clone of the parts it changes.
//! - A cached entry must not depend on the contents of any *other* file.
//!   Invalidating an entry does not invalidate entries that depend on it, so
//!   baking in values imported from elsewhere would reuse stale data.
//! - An entry is only reusable under the parser options it was created
//!   with. Options checking is on by default;
//!   [`CacheSet::with_options_check`] turns it off for callers that never
//!   interleave incompatible options and want the cheaper probe.
//!
//! The parsers themselves are external: each `parse_*` method takes the
//! parse function as an argument and treats it as a deterministic pure
//! function of `(source, options)`. Two threads racing on the same key may
//! therefore both parse; the last insert wins and the entries are
//! interchangeable.
//!
//! ```
//! use cache_js::CacheSet;
//! use cache_js::options::JsParserOptions;
//! use ast_js::ast::JsAst;
//! use diagnostics::{DeferLog, Path, Source};
//!
//! let caches = CacheSet::new();
//! let source = Source::new(Path::file("/src/a.js"), "src/a.js", "let a = 1;", 1);
//! let mut log = DeferLog::new();
//! let (ast, ok) = caches.parse_js(&mut log, source, JsParserOptions::default(), |_, _, _| {
//!   (JsAst::new(), true) // a real caller passes the JS parser here
//! });
//! assert!(ok);
//! assert_eq!(ast.parts.len(), 0);
//! ```

pub mod css;
pub mod disk;
pub mod error;
pub mod js;
pub mod json;
pub mod options;
pub mod source_index;

pub use error::CacheError;

use crate::css::CssCache;
use crate::disk::DiskBackend;
use crate::disk::DiskConfig;
use crate::js::JsCache;
use crate::json::JsonCache;
use crate::options::CssParserOptions;
use crate::options::JsParserOptions;
use crate::options::JsonParserOptions;
use crate::source_index::SourceIndexAllocator;
use ast_js::ast::JsAst;
use ast_js::css::CssAst;
use ast_js::expr::Expr;
use diagnostics::DeferLog;
use diagnostics::Log;
use diagnostics::Source;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::sync::Arc;

/// One cache per language plus the shared source-index allocator.
pub struct CacheSet {
  pub js: JsCache,
  pub css: CssCache,
  pub json: JsonCache,
  pub source_index: SourceIndexAllocator,
  check_options: bool,
  disk: Mutex<Option<Arc<DiskBackend>>>,
}

impl Default for CacheSet {
  fn default() -> CacheSet {
    CacheSet::new()
  }
}

impl CacheSet {
  /// A memory-only cache set with options checking on.
  pub fn new() -> CacheSet {
    CacheSet {
      js: JsCache::new(),
      css: CssCache::new(),
      json: JsonCache::new(),
      source_index: SourceIndexAllocator::new(),
      check_options: true,
      disk: Mutex::new(None),
    }
  }

  /// Toggle JS options checking. Turning it off makes every probe cheaper
  /// but is only sound when all callers parse with equivalent options.
  pub fn with_options_check(mut self, check_options: bool) -> CacheSet {
    self.check_options = check_options;
    self
  }

  /// Wire up a disk backend without reading anything, for a cold cache
  /// directory that should be written as the build runs.
  pub fn attach_disk(&self, config: DiskConfig) -> Result<(), CacheError> {
    let backend = Arc::new(DiskBackend::new(config)?);
    *self.disk.lock() = Some(backend);
    Ok(())
  }

  /// Attach a disk backend and load everything it has: the allocator state
  /// first (so no source index is ever reissued), then every cache record.
  ///
  /// A missing allocator file means a cold cache and is not an error;
  /// undecodable records are handled per the configured
  /// [`disk::DiskErrorPolicy`].
  pub fn load_from_dir(&self, config: DiskConfig) -> Result<(), CacheError> {
    let disk = Arc::new(DiskBackend::new(config)?);
    *self.disk.lock() = Some(Arc::clone(&disk));

    match self.source_index.load(&disk.index_path()) {
      Ok(()) => {}
      Err(CacheError::Io { ref source, .. }) if source.kind() == ErrorKind::NotFound => {}
      Err(error) => return Err(error),
    }

    for entry in disk.load_entries()? {
      self.js.insert(Arc::new(entry));
    }
    Ok(())
  }

  /// Synchronously write every JS entry and the allocator state. Complements
  /// the per-entry background writes; useful at shutdown and in tests that
  /// need a deterministic disk state.
  pub fn persist(&self) -> Result<(), CacheError> {
    let Some(disk) = self.disk.lock().clone() else {
      return Ok(());
    };
    for entry in self.js.snapshot() {
      disk.write_entry(&entry)?;
    }
    self.source_index.persist(&disk.index_path())
  }

  /// Parse a JS/TS file through the cache. On a hit the buffered messages
  /// from the original parse are replayed into `log` in order; on a miss
  /// `parse` runs against a fresh deferred log and the entry is stored (and
  /// handed to the disk backend when one is attached). Parse failures are
  /// cached too, so a bad input is not re-parsed every build.
  pub fn parse_js(
    &self,
    log: &mut dyn Log,
    source: Source,
    options: JsParserOptions,
    parse: impl FnOnce(&mut DeferLog, &Source, &JsParserOptions) -> (JsAst, bool),
  ) -> (Arc<JsAst>, bool) {
    let disk = self.disk.lock().clone();
    self.js.parse(log, source, options, parse, self.check_options, disk.as_ref())
  }

  /// Parse a CSS file through the cache. CSS options always participate in
  /// the equivalence; entries stay in memory only.
  pub fn parse_css(
    &self,
    log: &mut dyn Log,
    source: Source,
    options: CssParserOptions,
    parse: impl FnOnce(&mut DeferLog, &Source, &CssParserOptions) -> CssAst,
  ) -> Arc<CssAst> {
    self.css.parse(log, source, options, parse)
  }

  /// Parse a JSON file through the cache.
  pub fn parse_json(
    &self,
    log: &mut dyn Log,
    source: Source,
    options: JsonParserOptions,
    parse: impl FnOnce(&mut DeferLog, &Source, &JsonParserOptions) -> (Expr, bool),
  ) -> (Expr, bool) {
    self.json.parse(log, source, options, parse)
  }
}
