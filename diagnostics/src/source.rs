use crate::DecodeError;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;
use std::sync::Arc;

/// A canonical path to an input, qualified by the namespace that owns it.
///
/// The default namespace is `"file"` for paths on the real file system;
/// plugins may introduce their own namespaces for virtual modules. Two paths
/// are the same input iff both fields match.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
  pub text: String,
  pub namespace: String,
}

impl Path {
  pub fn file(text: impl Into<String>) -> Path {
    Path {
      text: text.into(),
      namespace: "file".to_string(),
    }
  }

  pub fn in_namespace(text: impl Into<String>, namespace: impl Into<String>) -> Path {
    Path {
      text: text.into(),
      namespace: namespace.into(),
    }
  }
}

impl Display for Path {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    // Namespaces are identifier-like; the path text goes last so embedded
    // colons and spaces survive a round trip.
    write!(f, "{}:{}", self.namespace, self.text)
  }
}

impl FromStr for Path {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (namespace, text) = s.split_once(':').ok_or_else(|| DecodeError::new("path", s))?;
    Ok(Path {
      text: text.to_string(),
      namespace: namespace.to_string(),
    })
  }
}

/// One parsed input: its canonical path, its display path, its contents, the
/// stem used for generated symbol names, and the source index assigned for
/// this build. Sources are immutable once constructed; the contents are
/// shared by reference between the cache and every consumer.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Source {
  pub key_path: Path,
  pub pretty_path: String,
  pub contents: Arc<str>,
  pub identifier_name: String,
  pub index: u32,
}

impl Source {
  pub fn new(key_path: Path, pretty_path: impl Into<String>, contents: impl Into<Arc<str>>, index: u32) -> Source {
    let pretty_path = pretty_path.into();
    let identifier_name = default_identifier_name(&key_path.text);
    Source {
      key_path,
      pretty_path,
      contents: contents.into(),
      identifier_name,
      index,
    }
  }

  /// Encode this source as a single string: a fixed header of one field per
  /// line, then the contents verbatim. The contents may contain anything,
  /// including newlines, because they come last.
  pub fn to_record_string(&self) -> String {
    format!(
      "{}\n{}\n{}\n{}\n{}",
      self.index, self.key_path, self.pretty_path, self.identifier_name, self.contents
    )
  }

  pub fn from_record_string(s: &str) -> Result<Source, DecodeError> {
    let mut fields = s.splitn(5, '\n');
    let mut next = || fields.next().ok_or_else(|| DecodeError::new("source record", s));
    let index = next()?
      .parse::<u32>()
      .map_err(|_| DecodeError::new("source index", s))?;
    let key_path = next()?.parse::<Path>()?;
    let pretty_path = next()?.to_string();
    let identifier_name = next()?.to_string();
    let contents = next()?;
    Ok(Source {
      key_path,
      pretty_path,
      contents: contents.into(),
      identifier_name,
      index,
    })
  }
}

/// Derive the stem for generated symbol names from a path. `require_react`
/// reads better than `require273`, so the base name of the file is used, with
/// `index` files falling back to their directory name (npm packages name
/// their entry `index.js` to trigger implicit resolution).
///
/// The result has no bearing on correctness; generated names still pass
/// through collision-avoiding renaming later.
pub fn default_identifier_name(path: &str) -> String {
  let (dir, base) = split_dir_base(path);
  let base = strip_extension(base);
  let base = if base == "index" {
    let (_, dir_base) = split_dir_base(dir);
    let dir_base = strip_extension(dir_base);
    if dir_base.is_empty() {
      base
    } else {
      dir_base
    }
  } else {
    base
  };
  ensure_valid_identifier(base)
}

fn split_dir_base(path: &str) -> (&str, &str) {
  match path.rfind(['/', '\\']) {
    Some(i) => (&path[..i], &path[i + 1..]),
    None => ("", path),
  }
}

fn strip_extension(base: &str) -> &str {
  match base.rfind('.') {
    Some(i) if i > 0 => &base[..i],
    _ => base,
  }
}

/// Coerce an arbitrary string into a plain ASCII identifier. Runs of skipped
/// characters collapse into a single `_` separator; digits may not lead.
pub fn ensure_valid_identifier(base: &str) -> String {
  let mut out = String::new();
  let mut needs_gap = false;
  for c in base.chars() {
    if c.is_ascii_alphabetic() || (!out.is_empty() && c.is_ascii_digit()) {
      if needs_gap {
        out.push('_');
        needs_gap = false;
      }
      out.push(c);
    } else if !out.is_empty() {
      needs_gap = true;
    }
  }
  if out.is_empty() {
    out.push('_');
  }
  out
}
