use crate::disk::DiskBackend;
use crate::options::JsParserOptions;
use ahash::AHashMap;
use ast_js::ast::JsAst;
use diagnostics::DeferLog;
use diagnostics::Log;
use diagnostics::Msg;
use diagnostics::Path;
use diagnostics::Source;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// One cached JS/TS parse. Entries are created once and never mutated; the
/// AST inside is shared by reference with every consumer and must be treated
/// as read-only.
#[derive(Clone, Debug, PartialEq)]
pub struct JsCacheEntry {
  pub source: Source,
  pub msgs: Vec<Msg>,

  /// `None` for entries restored from records written before options were
  /// persisted; such entries only hit when options checking is off.
  pub options: Option<JsParserOptions>,

  pub ast: Arc<JsAst>,
  pub ok: bool,
}

/// The in-memory JS/TS entry store, keyed by canonical path.
#[derive(Default)]
pub struct JsCache {
  entries: Mutex<AHashMap<Path, Arc<JsCacheEntry>>>,
}

impl JsCache {
  pub fn new() -> JsCache {
    JsCache::default()
  }

  pub fn probe(&self, key: &Path) -> Option<Arc<JsCacheEntry>> {
    self.entries.lock().get(key).cloned()
  }

  /// Insert under the entry's canonical path; the last writer wins. Safe
  /// because parsing is deterministic, so two entries for the same key are
  /// interchangeable.
  pub fn insert(&self, entry: Arc<JsCacheEntry>) {
    self.entries.lock().insert(entry.source.key_path.clone(), entry);
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.lock().is_empty()
  }

  /// A point-in-time snapshot of every entry, for persistence.
  pub fn snapshot(&self) -> Vec<Arc<JsCacheEntry>> {
    self.entries.lock().values().cloned().collect()
  }

  pub(crate) fn parse(
    &self,
    log: &mut dyn Log,
    source: Source,
    options: JsParserOptions,
    parse: impl FnOnce(&mut DeferLog, &Source, &JsParserOptions) -> (JsAst, bool),
    check_options: bool,
    disk: Option<&Arc<DiskBackend>>,
  ) -> (Arc<JsAst>, bool) {
    if let Some(entry) = self.probe(&source.key_path) {
      // Warm contents are usually the same allocation, making the
      // byte-for-byte comparison a pointer check.
      let contents_equal = Arc::ptr_eq(&entry.source.contents, &source.contents)
        || entry.source.contents == source.contents;
      let options_equal = !check_options || entry.options.as_ref() == Some(&options);
      if entry.source.pretty_path == source.pretty_path && contents_equal && options_equal {
        debug!(path = %source.key_path, "js cache hit");
        for msg in &entry.msgs {
          log.add_msg(msg.clone());
        }
        return (Arc::clone(&entry.ast), entry.ok);
      }
    }

    debug!(path = %source.key_path, "js cache miss");
    let mut defer = DeferLog::new();
    let (ast, ok) = parse(&mut defer, &source, &options);
    let msgs = defer.done();
    for msg in &msgs {
      log.add_msg(msg.clone());
    }

    let entry = Arc::new(JsCacheEntry {
      source,
      msgs,
      options: Some(options),
      ast: Arc::new(ast),
      ok,
    });
    self.insert(Arc::clone(&entry));

    // The caller's result never depends on the background write.
    if let Some(disk) = disk {
      disk.spawn_entry_write(Arc::clone(&entry));
    }

    (Arc::clone(&entry.ast), entry.ok)
  }
}
