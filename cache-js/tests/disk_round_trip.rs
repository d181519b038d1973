//! Disk-backed behavior: record round trips, startup loading policies, the
//! allocator's restart stability, and the non-finite number boundary case.

use ast_js::ast::JsAst;
use ast_js::binding::BIdentifier;
use ast_js::binding::Binding;
use ast_js::const_value::ConstValue;
use ast_js::expr::ENumber;
use ast_js::expr::Expr;
use ast_js::num::JsNumber;
use ast_js::part::Part;
use ast_js::stmt::Decl;
use ast_js::stmt::LocalKind;
use ast_js::stmt::SLocal;
use ast_js::stmt::Stmt;
use ast_js::symbol::Ref;
use ast_js::symbol::Symbol;
use ast_js::symbol::SymbolKind;
use cache_js::disk::DiskConfig;
use cache_js::disk::DiskErrorPolicy;
use cache_js::options::JsParserOptions;
use cache_js::CacheSet;
use diagnostics::DeferLog;
use diagnostics::Loc;
use diagnostics::Log;
use diagnostics::Msg;
use diagnostics::Path;
use diagnostics::Source;
use std::fs;
use std::path::Path as FsPath;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

fn config(root: &FsPath) -> DiskConfig {
  DiskConfig::new(root.join("cache_jsons"), root.join("index_cache")).write_through(false)
}

fn source(path: &str, contents: &str, index: u32) -> Source {
  Source::new(Path::file(path), path.trim_start_matches('/'), contents, index)
}

/// The AST a parser would produce for `const x = <value>;`.
fn const_ast(value: f64) -> JsAst {
  let mut ast = JsAst::new();
  ast.symbols.push(Symbol::new(SymbolKind::Const, "x"));
  ast.approximate_line_count = 1;
  let mut part = Part::default();
  part.scopes.push(ast.module_scope);
  part.stmts.push(Stmt::new(Loc(0), SLocal {
    decls: vec![Decl {
      binding: Binding::new(Loc(6), BIdentifier { ref_: Ref::new(1, 0) }),
      value: Some(Expr::new(Loc(10), ENumber { value: JsNumber(value) })),
    }],
    kind: LocalKind::Const,
    is_export: false,
    was_ts_import_equals: false,
  }));
  ast.parts.push(part);
  ast.const_values.insert(Ref::new(1, 0), ConstValue::Number(JsNumber(value)));
  ast
}

#[test]
fn warm_disk_cache_skips_the_parser() {
  let dir = tempfile::tempdir().unwrap();
  let input = source("/src/a.js", "const x = 2;", 1);

  // First process: miss, parse, persist.
  {
    let caches = CacheSet::new();
    caches.load_from_dir(config(dir.path())).unwrap();
    let mut log = DeferLog::new();
    caches.parse_js(&mut log, input.clone(), JsParserOptions::default(), |defer, _, _| {
      defer.add_msg(Msg::warning("unused variable x"));
      (const_ast(2.0), true)
    });
    caches.persist().unwrap();
  }
  assert_eq!(fs::read_dir(dir.path().join("cache_jsons")).unwrap().count(), 1);

  // Second process: the record satisfies the parse without the parser,
  // including the replayed diagnostics and the options check.
  let caches = CacheSet::new();
  caches.load_from_dir(config(dir.path())).unwrap();
  let mut log = DeferLog::new();
  let (ast, ok) = caches.parse_js(&mut log, input, JsParserOptions::default(), |_, _, _| {
    panic!("a warm disk cache must not re-parse");
  });
  assert!(ok);
  assert_eq!(ast.as_ref(), &const_ast(2.0));
  let msgs = log.done();
  assert_eq!(msgs.len(), 1);
  assert_eq!(msgs[0].text, "unused variable x");
}

#[test]
fn infinity_survives_the_disk_round_trip() {
  let dir = tempfile::tempdir().unwrap();
  let input = source("/src/inf.js", "const x = 1/0;", 1);

  {
    let caches = CacheSet::new();
    caches.load_from_dir(config(dir.path())).unwrap();
    let mut log = DeferLog::new();
    caches.parse_js(&mut log, input.clone(), JsParserOptions::default(), |_, _, _| {
      (const_ast(f64::INFINITY), true)
    });
    caches.persist().unwrap();
  }

  let caches = CacheSet::new();
  caches.load_from_dir(config(dir.path())).unwrap();
  let mut log = DeferLog::new();
  let (ast, _) = caches.parse_js(&mut log, input, JsParserOptions::default(), |_, _, _| {
    panic!("must load from disk");
  });
  match *ast.const_values.get(&Ref::new(1, 0)).unwrap() {
    ConstValue::Number(n) => assert_eq!(n.0, f64::INFINITY),
    other => panic!("unexpected const value: {other:?}"),
  }
}

#[test]
fn strict_policy_rejects_corrupt_records() {
  let dir = tempfile::tempdir().unwrap();

  {
    let caches = CacheSet::new();
    caches.load_from_dir(config(dir.path())).unwrap();
    let mut log = DeferLog::new();
    caches.parse_js(&mut log, source("/src/a.js", "const x = 1;", 1), JsParserOptions::default(), |_, _, _| {
      (const_ast(1.0), true)
    });
    caches.persist().unwrap();
  }
  fs::write(dir.path().join("cache_jsons").join("not-a-record.json"), b"{ nope").unwrap();

  let strict = CacheSet::new();
  assert!(strict.load_from_dir(config(dir.path())).is_err());

  // The tolerant policy loads everything else.
  let tolerant = CacheSet::new();
  tolerant
    .load_from_dir(config(dir.path()).policy(DiskErrorPolicy::Skip))
    .unwrap();
  assert_eq!(tolerant.js.len(), 1);
}

#[test]
fn allocator_indices_are_stable_across_restarts() {
  use cache_js::source_index::SourceIndexKind;

  let dir = tempfile::tempdir().unwrap();

  {
    let caches = CacheSet::new();
    caches.load_from_dir(config(dir.path())).unwrap();
    assert_eq!(caches.source_index.get(Path::file("/a.js"), SourceIndexKind::Normal), 1);
    assert_eq!(caches.source_index.get(Path::file("/b.js"), SourceIndexKind::Normal), 2);
    caches.persist().unwrap();
  }

  let caches = CacheSet::new();
  caches.load_from_dir(config(dir.path())).unwrap();
  assert_eq!(caches.source_index.get(Path::file("/b.js"), SourceIndexKind::Normal), 2);
  assert_eq!(caches.source_index.get(Path::file("/c.js"), SourceIndexKind::Normal), 3);
}

#[test]
fn entries_without_options_only_hit_in_fast_mode() {
  let dir = tempfile::tempdir().unwrap();

  // Simulate a record written before options were persisted by stripping
  // the field from the JSON.
  {
    let caches = CacheSet::new();
    caches.load_from_dir(config(dir.path())).unwrap();
    let mut log = DeferLog::new();
    caches.parse_js(&mut log, source("/src/a.js", "const x = 1;", 1), JsParserOptions::default(), |_, _, _| {
      (const_ast(1.0), true)
    });
    caches.persist().unwrap();
  }
  let cache_dir = dir.path().join("cache_jsons");
  let record_path = fs::read_dir(&cache_dir).unwrap().next().unwrap().unwrap().path();
  let mut record: serde_json::Value = serde_json::from_slice(&fs::read(&record_path).unwrap()).unwrap();
  record["options"] = serde_json::Value::Null;
  fs::write(&record_path, serde_json::to_vec(&record).unwrap()).unwrap();

  let calls = AtomicUsize::new(0);
  let strict = CacheSet::new();
  strict.load_from_dir(config(dir.path())).unwrap();
  let mut log = DeferLog::new();
  strict.parse_js(&mut log, source("/src/a.js", "const x = 1;", 1), JsParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (const_ast(1.0), true)
  });
  assert_eq!(calls.load(Ordering::SeqCst), 1, "optionless entries miss under the default check");

  let fast = CacheSet::new().with_options_check(false);
  fast.load_from_dir(config(dir.path())).unwrap();
  let mut log = DeferLog::new();
  fast.parse_js(&mut log, source("/src/a.js", "const x = 1;", 1), JsParserOptions::default(), |_, _, _| {
    panic!("fast mode must accept the optionless entry");
  });
}

#[test]
fn write_through_persists_in_the_background() {
  let dir = tempfile::tempdir().unwrap();
  let caches = CacheSet::new();
  caches
    .load_from_dir(DiskConfig::new(dir.path().join("cache_jsons"), dir.path().join("index_cache")))
    .unwrap();

  let mut log = DeferLog::new();
  caches.parse_js(&mut log, source("/src/bg.js", "const x = 9;", 1), JsParserOptions::default(), |_, _, _| {
    (const_ast(9.0), true)
  });

  // The result above never depends on the write; poll for its completion.
  let cache_dir = dir.path().join("cache_jsons");
  let deadline = Instant::now() + Duration::from_secs(10);
  loop {
    if fs::read_dir(&cache_dir).unwrap().count() == 1 {
      break;
    }
    assert!(Instant::now() < deadline, "background write never landed");
    std::thread::sleep(Duration::from_millis(10));
  }
}

#[test]
fn persist_without_disk_is_a_no_op() {
  let caches = CacheSet::new();
  let mut log = DeferLog::new();
  caches.parse_js(&mut log, source("/src/a.js", "const x = 1;", 1), JsParserOptions::default(), |_, _, _| {
    (const_ast(1.0), true)
  });
  caches.persist().unwrap();
}
