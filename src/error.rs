use std::fmt;

/// Represents a failure to register a route.
///
/// Registration errors are programmer errors: they are reported when a
/// pattern is malformed or incompatible with the patterns registered before
/// it. A failed registration leaves the tree matching exactly what it
/// matched before the call.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InsertError {
  /// The pattern is empty or does not begin with `/`.
  EmptyPath {
    /// The rejected pattern.
    path: String,
  },
  /// A `:` or `*` marker is immediately followed by `/` or the end of the
  /// pattern.
  EmptyWildcardName {
    path: String,
    /// Byte offset of the wildcard marker.
    offset: usize,
  },
  /// A wildcard name contains a further `:` or `*`.
  MultipleWildcardChars {
    path: String,
    /// Byte offset of the wildcard the extra marker appears in.
    offset: usize,
  },
  /// A `*` wildcard does not own the entire final segment of the pattern.
  CatchAllNotTerminal {
    path: String,
  },
  /// The pattern's wildcard collides with routes registered earlier: an
  /// existing wildcard of a different name, existing static children, or an
  /// existing handle at the segment root.
  WildcardConflict {
    path: String,
    /// The existing prefix the wildcard collides with.
    with: String,
  },
  /// A static segment of the pattern is shadowed by a wildcard registered
  /// earlier at the same position.
  StaticConflict {
    path: String,
    /// The existing prefix, ending in the wildcard.
    with: String,
  },
  /// The exact pattern was registered before.
  DuplicateHandle {
    path: String,
  },
}

impl fmt::Display for InsertError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::EmptyPath { path } => {
        write!(f, "path must begin with '/' in path '{}'", path)
      }
      Self::EmptyWildcardName { path, offset } => write!(
        f,
        "wildcards must be named with a non-empty name at offset {} in path '{}'",
        offset, path
      ),
      Self::MultipleWildcardChars { path, offset } => write!(
        f,
        "only one wildcard per path segment is allowed, at offset {} in path '{}'",
        offset, path
      ),
      Self::CatchAllNotTerminal { path } => write!(
        f,
        "catch-all wildcards are only allowed as the final path segment in path '{}'",
        path
      ),
      Self::WildcardConflict { path, with } => write!(
        f,
        "wildcard in new path '{}' conflicts with existing prefix '{}'",
        path, with
      ),
      Self::StaticConflict { path, with } => write!(
        f,
        "new path '{}' conflicts with existing wildcard in prefix '{}'",
        path, with
      ),
      Self::DuplicateHandle { path } => {
        write!(f, "a handle is already registered for path '{}'", path)
      }
    }
  }
}

impl std::error::Error for InsertError {}
