use std::path::PathBuf;
use thiserror::Error;

/// Errors from the disk-backed side of the cache. The in-memory fast path
/// never fails; everything here is about records and the allocator file.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache I/O error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to decode cache record {}: {reason}", path.display())]
  RecordDecode { path: PathBuf, reason: String },

  /// A serializer that produces zero bytes must never clobber a good
  /// record, so empty payloads are rejected before touching the file.
  #[error("refusing to write empty payload to {}", path.display())]
  EmptyPayload { path: PathBuf },

  #[error("source index state error: {reason}")]
  SourceIndexDecode { reason: String },
}

impl CacheError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> CacheError {
    CacheError::Io {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn record(path: impl Into<PathBuf>, reason: impl ToString) -> CacheError {
    CacheError::RecordDecode {
      path: path.into(),
      reason: reason.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_offending_path() {
    let err = CacheError::io(
      "/tmp/cache/abc.json",
      std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
    );
    assert!(err.to_string().contains("abc.json"));

    let err = CacheError::EmptyPayload {
      path: PathBuf::from("idx.json"),
    };
    assert!(err.to_string().contains("empty payload"));
  }
}
