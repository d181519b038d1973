use crate::options::CssParserOptions;
use ahash::AHashMap;
use ast_js::css::CssAst;
use diagnostics::DeferLog;
use diagnostics::Log;
use diagnostics::Msg;
use diagnostics::Path;
use diagnostics::Source;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct CssCacheEntry {
  pub source: Source,
  pub msgs: Vec<Msg>,
  pub options: CssParserOptions,
  pub ast: Arc<CssAst>,
}

/// The in-memory CSS entry store. CSS entries are not persisted.
#[derive(Default)]
pub struct CssCache {
  entries: Mutex<AHashMap<Path, Arc<CssCacheEntry>>>,
}

impl CssCache {
  pub fn new() -> CssCache {
    CssCache::default()
  }

  pub fn probe(&self, key: &Path) -> Option<Arc<CssCacheEntry>> {
    self.entries.lock().get(key).cloned()
  }

  pub fn insert(&self, entry: Arc<CssCacheEntry>) {
    self.entries.lock().insert(entry.source.key_path.clone(), entry);
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub(crate) fn parse(
    &self,
    log: &mut dyn Log,
    source: Source,
    options: CssParserOptions,
    parse: impl FnOnce(&mut DeferLog, &Source, &CssParserOptions) -> CssAst,
  ) -> Arc<CssAst> {
    if let Some(entry) = self.probe(&source.key_path) {
      let contents_equal = Arc::ptr_eq(&entry.source.contents, &source.contents)
        || entry.source.contents == source.contents;
      if entry.source.pretty_path == source.pretty_path && contents_equal && entry.options == options {
        debug!(path = %source.key_path, "css cache hit");
        for msg in &entry.msgs {
          log.add_msg(msg.clone());
        }
        return Arc::clone(&entry.ast);
      }
    }

    debug!(path = %source.key_path, "css cache miss");
    let mut defer = DeferLog::new();
    let ast = parse(&mut defer, &source, &options);
    let msgs = defer.done();
    for msg in &msgs {
      log.add_msg(msg.clone());
    }

    let entry = Arc::new(CssCacheEntry {
      source,
      msgs,
      options,
      ast: Arc::new(ast),
    });
    self.insert(Arc::clone(&entry));
    Arc::clone(&entry.ast)
  }
}
