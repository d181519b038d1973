use crate::options::JsonParserOptions;
use ahash::AHashMap;
use ast_js::expr::Expr;
use diagnostics::DeferLog;
use diagnostics::Log;
use diagnostics::Msg;
use diagnostics::Path;
use diagnostics::Source;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct JsonCacheEntry {
  pub source: Source,
  pub msgs: Vec<Msg>,
  pub options: JsonParserOptions,
  pub expr: Expr,
  pub ok: bool,
}

/// The in-memory JSON entry store. JSON parses into a bare expression; the
/// entries are not persisted.
#[derive(Default)]
pub struct JsonCache {
  entries: Mutex<AHashMap<Path, Arc<JsonCacheEntry>>>,
}

impl JsonCache {
  pub fn new() -> JsonCache {
    JsonCache::default()
  }

  pub fn probe(&self, key: &Path) -> Option<Arc<JsonCacheEntry>> {
    self.entries.lock().get(key).cloned()
  }

  pub fn insert(&self, entry: Arc<JsonCacheEntry>) {
    self.entries.lock().insert(entry.source.key_path.clone(), entry);
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub(crate) fn parse(
    &self,
    log: &mut dyn Log,
    source: Source,
    options: JsonParserOptions,
    parse: impl FnOnce(&mut DeferLog, &Source, &JsonParserOptions) -> (Expr, bool),
  ) -> (Expr, bool) {
    if let Some(entry) = self.probe(&source.key_path) {
      let contents_equal = Arc::ptr_eq(&entry.source.contents, &source.contents)
        || entry.source.contents == source.contents;
      if entry.source.pretty_path == source.pretty_path && contents_equal && entry.options == options {
        debug!(path = %source.key_path, "json cache hit");
        for msg in &entry.msgs {
          log.add_msg(msg.clone());
        }
        return (entry.expr.clone(), entry.ok);
      }
    }

    debug!(path = %source.key_path, "json cache miss");
    let mut defer = DeferLog::new();
    let (expr, ok) = parse(&mut defer, &source, &options);
    let msgs = defer.done();
    for msg in &msgs {
      log.add_msg(msg.clone());
    }

    let entry = Arc::new(JsonCacheEntry {
      source,
      msgs,
      options,
      expr,
      ok,
    });
    self.insert(Arc::clone(&entry));
    (entry.expr.clone(), entry.ok)
  }
}
