use std::ops::Index;
use std::slice;

/// A single URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub key: String,
  pub value: String,
}

impl Param {
  pub fn new(key: &str, value: &str) -> Param {
    Param {
      key: key.to_string(),
      value: value.to_string(),
    }
  }
}

/// A list of URL parameters as returned by the router.
///
/// The list is ordered: the first wildcard of the matched pattern is also the
/// first entry. It is therefore safe to read values by index.
///
/// A `Params` doubles as a reusable buffer: the tree acquires one lazily on
/// the first capture, truncates it, and appends to it, so a caller can hand
/// the same allocation to any number of lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Param>);

impl Params {
  pub fn new() -> Params {
    Params(Vec::new())
  }

  /// Creates an empty buffer that can hold `capacity` parameters without
  /// reallocating. Callers typically pre-size to the largest parameter count
  /// among their registered patterns.
  pub fn with_capacity(capacity: usize) -> Params {
    Params(Vec::with_capacity(capacity))
  }

  /// Returns the value of the first parameter whose key matches `name`.
  pub fn by_name(&self, name: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|param| param.key == name)
      .map(|param| param.value.as_str())
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn push(&mut self, param: Param) {
    self.0.push(param);
  }

  /// Truncates to zero length, keeping the allocation.
  pub fn clear(&mut self) {
    self.0.clear();
  }

  pub fn iter(&self) -> slice::Iter<'_, Param> {
    self.0.iter()
  }
}

impl Index<usize> for Params {
  type Output = str;

  fn index(&self, i: usize) -> &Self::Output {
    &self.0[i].value
  }
}

impl<'a> IntoIterator for &'a Params {
  type Item = &'a Param;
  type IntoIter = slice::Iter<'a, Param>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn by_name() {
    let mut params = Params::new();
    params.push(Param::new("hello", "world"));
    params.push(Param::new("rust-is", "awesome"));

    assert_eq!(params.by_name("hello"), Some("world"));
    assert_eq!(params.by_name("rust-is"), Some("awesome"));
    assert_eq!(params.by_name("missing"), None);
  }

  #[test]
  fn by_index() {
    let mut params = Params::new();
    params.push(Param::new("tool", "test"));
    params.push(Param::new("sub", "3"));

    assert_eq!(&params[0], "test");
    assert_eq!(&params[1], "3");
  }

  #[test]
  fn reuse_keeps_capacity() {
    let mut params = Params::with_capacity(4);
    for i in 0..4 {
      params.push(Param::new("key", &i.to_string()));
    }
    let cap_before = params.0.capacity();

    params.clear();
    assert!(params.is_empty());
    assert_eq!(params.0.capacity(), cap_before);
  }

  #[test]
  fn iteration_order() {
    let mut params = Params::new();
    params.push(Param::new("a", "1"));
    params.push(Param::new("b", "2"));

    let keys: Vec<&str> = params.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "b"]);
  }
}
