//! Shared diagnostics, source, and location model for the parse cache.
//!
//! Everything here is deliberately small and deterministic: messages are
//! plain data that can be buffered, replayed in order, and persisted inside
//! cache records without pulling in any heavy dependencies.
//!
//! ```
//! use diagnostics::{DeferLog, Log, Msg, Severity};
//! use diagnostics::loc::{Loc, Range};
//!
//! let mut log = DeferLog::default();
//! log.add_msg(Msg::error_at("a.js", Range::new(Loc(4), 1), "unexpected token"));
//! log.add_msg(Msg::warning("import is never used"));
//! assert!(log.has_errors());
//!
//! let msgs = log.done();
//! assert_eq!(msgs.len(), 2);
//! assert_eq!(msgs[0].severity, Severity::Error);
//! ```

pub mod loc;
pub mod source;

pub use loc::Loc;
pub use loc::Range;
pub use loc::Span;
pub use source::Path;
pub use source::Source;

use serde::Deserialize;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::io;
use std::io::Write;

/// Failure to decode one of the compact text encodings used on the wire.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DecodeError {
  pub expected: &'static str,
  pub input: String,
}

impl DecodeError {
  pub fn new(expected: &'static str, input: impl Into<String>) -> DecodeError {
    DecodeError {
      expected,
      input: input.into(),
    }
  }
}

impl Display for DecodeError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "malformed {}: {:?}", self.expected, self.input)
  }
}

impl Error for DecodeError {}

/// Message severity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
  Error,
  Warning,
  Note,
  Debug,
}

impl Severity {
  pub const fn as_str(&self) -> &'static str {
    match self {
      Severity::Error => "error",
      Severity::Warning => "warning",
      Severity::Note => "note",
      Severity::Debug => "debug",
    }
  }
}

impl Display for Severity {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Where a message points. The file is the pretty path of the source the
/// message was produced for.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MsgLocation {
  pub file: String,
  pub range: Range,
}

/// One user-facing message. Messages are plain data so that a cache entry can
/// store the messages produced at parse time and replay them on every hit.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Msg {
  pub severity: Severity,
  pub text: String,
  pub location: Option<MsgLocation>,
}

impl Msg {
  pub fn new(severity: Severity, text: impl Into<String>) -> Msg {
    Msg {
      severity,
      text: text.into(),
      location: None,
    }
  }

  pub fn error(text: impl Into<String>) -> Msg {
    Msg::new(Severity::Error, text)
  }

  pub fn warning(text: impl Into<String>) -> Msg {
    Msg::new(Severity::Warning, text)
  }

  pub fn error_at(file: impl Into<String>, range: Range, text: impl Into<String>) -> Msg {
    Msg {
      severity: Severity::Error,
      text: text.into(),
      location: Some(MsgLocation {
        file: file.into(),
        range,
      }),
    }
  }

  pub fn with_location(mut self, file: impl Into<String>, range: Range) -> Msg {
    self.location = Some(MsgLocation {
      file: file.into(),
      range,
    });
    self
  }
}

/// A sink for messages. The cache takes `&mut dyn Log` so callers choose
/// whether messages are buffered, rendered, or dropped.
pub trait Log {
  fn add_msg(&mut self, msg: Msg);

  fn has_errors(&self) -> bool;
}

/// A log that buffers everything. Used to capture parser output on a cache
/// miss so the same messages can be replayed, in order, on later hits.
#[derive(Default, Debug)]
pub struct DeferLog {
  msgs: Vec<Msg>,
  errors: usize,
}

impl DeferLog {
  pub fn new() -> DeferLog {
    DeferLog::default()
  }

  /// Consume the log, yielding the buffered messages in insertion order.
  pub fn done(self) -> Vec<Msg> {
    self.msgs
  }

  pub fn is_empty(&self) -> bool {
    self.msgs.is_empty()
  }
}

impl Log for DeferLog {
  fn add_msg(&mut self, msg: Msg) {
    if msg.severity == Severity::Error {
      self.errors += 1;
    }
    self.msgs.push(msg);
  }

  fn has_errors(&self) -> bool {
    self.errors > 0
  }
}

/// A log that renders each message as one line to a writer. Rendering
/// failures are ignored; diagnostics must never take the build down.
pub struct WriterLog<W: Write> {
  out: W,
  errors: usize,
}

impl<W: Write> WriterLog<W> {
  pub fn new(out: W) -> WriterLog<W> {
    WriterLog { out, errors: 0 }
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}

impl WriterLog<io::Stderr> {
  pub fn stderr() -> WriterLog<io::Stderr> {
    WriterLog::new(io::stderr())
  }
}

impl<W: Write> Log for WriterLog<W> {
  fn add_msg(&mut self, msg: Msg) {
    if msg.severity == Severity::Error {
      self.errors += 1;
    }
    let _ = match &msg.location {
      Some(location) => writeln!(
        self.out,
        "{}: {}:{}: {}",
        msg.severity, location.file, location.range.loc, msg.text
      ),
      None => writeln!(self.out, "{}: {}", msg.severity, msg.text),
    };
  }

  fn has_errors(&self) -> bool {
    self.errors > 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defer_log_preserves_order() {
    let mut log = DeferLog::new();
    log.add_msg(Msg::warning("first"));
    log.add_msg(Msg::error("second"));
    log.add_msg(Msg::new(Severity::Note, "third"));
    assert!(log.has_errors());
    let texts: Vec<_> = log.done().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, ["first", "second", "third"]);
  }

  #[test]
  fn defer_log_without_errors() {
    let mut log = DeferLog::new();
    log.add_msg(Msg::warning("only a warning"));
    assert!(!log.has_errors());
  }

  #[test]
  fn writer_log_renders_lines() {
    let mut log = WriterLog::new(Vec::new());
    log.add_msg(Msg::error_at("src/a.js", Range::new(Loc(10), 2), "bad syntax"));
    log.add_msg(Msg::warning("something odd"));
    assert!(log.has_errors());
    let rendered = String::from_utf8(log.into_inner()).unwrap();
    assert_eq!(rendered, "error: src/a.js:10: bad syntax\nwarning: something odd\n");
  }

  #[test]
  fn msg_serde_round_trips() {
    let msg = Msg::error_at("a.ts", Range::new(Loc(3), 5), "boom");
    let json = serde_json::to_string(&msg).unwrap();
    let back: Msg = serde_json::from_str(&json).unwrap();
    assert_eq!(back, msg);
  }
}
