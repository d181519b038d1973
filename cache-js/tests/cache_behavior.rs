//! In-memory cache behavior: hit/miss decisions, diagnostics replay, options
//! equivalence, and parallel population.

use ast_js::ast::JsAst;
use ast_js::css::CssAst;
use ast_js::expr::ENumber;
use ast_js::expr::Expr;
use ast_js::num::JsNumber;
use ast_js::symbol::Symbol;
use ast_js::symbol::SymbolKind;
use cache_js::options::CssParserOptions;
use cache_js::options::JsParserOptions;
use cache_js::options::JsonParserOptions;
use cache_js::CacheSet;
use diagnostics::DeferLog;
use diagnostics::Loc;
use diagnostics::Log;
use diagnostics::Msg;
use diagnostics::Path;
use diagnostics::Range;
use diagnostics::Source;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

fn source(path: &str, contents: &str) -> Source {
  Source::new(Path::file(path), path.trim_start_matches('/'), contents, 1)
}

fn stub_ast() -> JsAst {
  let mut ast = JsAst::new();
  ast.symbols.push(Symbol::new(SymbolKind::Const, "x"));
  ast.approximate_line_count = 1;
  ast
}

#[test]
fn cold_miss_then_warm_hit() {
  let caches = CacheSet::new();
  let calls = AtomicUsize::new(0);
  let input = source("/src/a.js", "export const x = 1;");

  let mut log = DeferLog::new();
  let (first, ok) = caches.parse_js(&mut log, input.clone(), JsParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  assert!(ok);
  assert!(!log.has_errors());
  assert!(log.is_empty());
  assert_eq!(calls.load(Ordering::SeqCst), 1);

  // The second parse must not invoke the parser and must return the same
  // AST allocation.
  let mut log = DeferLog::new();
  let (second, ok) = caches.parse_js(&mut log, input, JsParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  assert!(ok);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn changed_contents_invalidate() {
  let caches = CacheSet::new();
  let calls = AtomicUsize::new(0);

  let mut log = DeferLog::new();
  caches.parse_js(&mut log, source("/src/a.js", "a"), JsParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  let (replacement, _) = caches.parse_js(&mut log, source("/src/a.js", "b"), JsParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  assert_eq!(calls.load(Ordering::SeqCst), 2);

  // The new entry replaced the old one under the same key.
  assert_eq!(caches.js.len(), 1);
  let entry = caches.js.probe(&Path::file("/src/a.js")).unwrap();
  assert_eq!(entry.source.contents.as_ref(), "b");
  assert!(Arc::ptr_eq(&entry.ast, &replacement));
}

#[test]
fn hit_replays_messages_in_captured_order() {
  let caches = CacheSet::new();
  let input = source("/src/warn.js", "with (a) {}");

  let mut first_log = DeferLog::new();
  caches.parse_js(&mut first_log, input.clone(), JsParserOptions::default(), |defer, src, _| {
    defer.add_msg(Msg::warning("first warning"));
    defer.add_msg(Msg::error_at(src.pretty_path.clone(), Range::new(Loc(0), 4), "strict mode forbids with"));
    defer.add_msg(Msg::warning("second warning"));
    (stub_ast(), false)
  });
  let first = first_log.done();
  assert_eq!(first.len(), 3);

  let mut second_log = DeferLog::new();
  let (_, ok) = caches.parse_js(&mut second_log, input, JsParserOptions::default(), |_, _, _| {
    panic!("cached failures must not re-parse");
  });
  assert!(!ok);
  assert_eq!(second_log.done(), first);
}

#[test]
fn options_participate_in_equivalence_by_default() {
  let caches = CacheSet::new();
  let calls = AtomicUsize::new(0);
  let input = source("/src/a.tsx", "let x = <a/>;");

  let mut log = DeferLog::new();
  let mut jsx = JsParserOptions::default();
  jsx.jsx.parse = true;
  caches.parse_js(&mut log, input.clone(), jsx.clone(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });

  let mut no_jsx = JsParserOptions::default();
  no_jsx.jsx.parse = false;
  caches.parse_js(&mut log, input.clone(), no_jsx, |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  assert_eq!(calls.load(Ordering::SeqCst), 2, "different options must re-parse");

  caches.parse_js(&mut log, input, jsx, |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  assert_eq!(calls.load(Ordering::SeqCst), 3, "last writer won the slot");
}

#[test]
fn fast_mode_ignores_options() {
  let caches = CacheSet::new().with_options_check(false);
  let calls = AtomicUsize::new(0);
  let input = source("/src/a.tsx", "let x = 1;");

  let mut log = DeferLog::new();
  let mut jsx = JsParserOptions::default();
  jsx.jsx.parse = true;
  caches.parse_js(&mut log, input.clone(), jsx, |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  caches.parse_js(&mut log, input, JsParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    (stub_ast(), true)
  });
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn parallel_parses_of_distinct_files() {
  let caches = Arc::new(CacheSet::new());
  let calls = AtomicUsize::new(0);

  thread::scope(|scope| {
    for i in 0..100 {
      let caches = Arc::clone(&caches);
      let calls = &calls;
      scope.spawn(move || {
        let path = format!("/src/file{i}.js");
        let input = source(&path, &format!("export const x{i} = {i};"));
        let mut log = DeferLog::new();
        caches.parse_js(&mut log, input.clone(), JsParserOptions::default(), |defer, _, _| {
          calls.fetch_add(1, Ordering::SeqCst);
          defer.add_msg(Msg::warning(format!("note for {path}")));
          (stub_ast(), true)
        });

        // Each caller sees exactly its own file's messages, exactly once.
        let msgs = log.done();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].text.contains(&format!("file{i}.js")));
      });
    }
  });

  assert_eq!(caches.js.len(), 100);
  assert_eq!(calls.load(Ordering::SeqCst), 100);
}

#[test]
fn css_cache_hits_on_same_source_and_options() {
  let caches = CacheSet::new();
  let calls = AtomicUsize::new(0);
  let input = source("/src/app.css", "body { margin: 0 }");

  let mut log = DeferLog::new();
  let first = caches.parse_css(&mut log, input.clone(), CssParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    CssAst::default()
  });
  let second = caches.parse_css(&mut log, input.clone(), CssParserOptions::default(), |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    CssAst::default()
  });
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert!(Arc::ptr_eq(&first, &second));

  let modules = CssParserOptions {
    css_modules: true,
    ..CssParserOptions::default()
  };
  caches.parse_css(&mut log, input, modules, |_, _, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    CssAst::default()
  });
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn json_cache_returns_cached_expression() {
  let caches = CacheSet::new();
  let calls = AtomicUsize::new(0);
  let input = source("/package.json", "{\"type\":\"module\"}");

  let parse = |calls: &AtomicUsize| {
    calls.fetch_add(1, Ordering::SeqCst);
    (Expr::new(Loc(0), ENumber { value: JsNumber(1.0) }), true)
  };

  let mut log = DeferLog::new();
  let (first, ok) = caches.parse_json(&mut log, input.clone(), JsonParserOptions::default(), |_, _, _| parse(&calls));
  assert!(ok);
  let (second, _) = caches.parse_json(&mut log, input, JsonParserOptions::default(), |_, _, _| parse(&calls));
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(first, second);
}
