use crate::error::InsertError;
use crate::params::{Param, Params};

use std::cmp::min;
use std::mem;
use std::str;

// Counts the wildcard markers in a pattern, saturating at u16::MAX.
pub(crate) fn count_params(path: &[u8]) -> u16 {
  let n = path
    .iter()
    .filter(|&&c| c == b':' || c == b'*')
    .count();
  min(n, u16::MAX as usize) as u16
}

// Searches for the first wildcard segment and checks the name for invalid
// characters. Returns the wildcard (marker included, up to the next '/' or
// the end), its byte offset, and whether the name is free of further
// markers.
fn find_wildcard(path: &[u8]) -> Option<(&[u8], usize, bool)> {
  for (start, &c) in path.iter().enumerate() {
    if c != b':' && c != b'*' {
      continue;
    }

    let mut valid = true;
    for (end, &c) in path[start + 1..].iter().enumerate() {
      match c {
        b'/' => return Some((&path[start..start + 1 + end], start, valid)),
        b':' | b'*' => valid = false,
        _ => {}
      }
    }
    return Some((&path[start..], start, valid));
  }
  None
}

// Validates every wildcard of a pattern up front, so a malformed pattern is
// rejected before the tree is touched.
fn check_wildcards(path: &[u8], full_path: &str) -> Result<(), InsertError> {
  let mut offset = 0;
  while let Some((wildcard, start, valid)) = find_wildcard(&path[offset..]) {
    let pos = offset + start;
    if !valid {
      return Err(InsertError::MultipleWildcardChars {
        path: full_path.to_string(),
        offset: pos,
      });
    }
    if wildcard.len() < 2 {
      return Err(InsertError::EmptyWildcardName {
        path: full_path.to_string(),
        offset: pos,
      });
    }
    // A catch-all must own the entire final segment
    if wildcard[0] == b'*' && (pos + wildcard.len() != path.len() || path[pos - 1] != b'/') {
      return Err(InsertError::CatchAllNotTerminal {
        path: full_path.to_string(),
      });
    }
    offset = pos + wildcard.len();
  }
  Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum NodeType {
  Static,
  Root,
  Param,
  CatchAll,
}

// A registered handle and the full pattern it was registered under.
#[derive(Debug)]
struct Route<T> {
  handle: T,
  full_path: String,
}

/// A node in a radix tree ordered by priority, where priority is the number
/// of handles registered in the subtree.
#[derive(Debug)]
pub struct Node<T> {
  path: Vec<u8>,
  wild_child: bool,
  node_type: NodeType,
  indices: Vec<u8>,
  children: Vec<Box<Node<T>>>,
  route: Option<Route<T>>,
  priority: u32,
}

impl<T> Default for Node<T> {
  fn default() -> Self {
    Node {
      path: Vec::new(),
      wild_child: false,
      node_type: NodeType::Static,
      indices: Vec::new(),
      children: Vec::new(),
      route: None,
      priority: 0,
    }
  }
}

impl<T> Node<T> {
  pub fn new() -> Self {
    Node::default()
  }

  // Increments the priority of the given child and reorders its siblings if
  // necessary. Returns the new position of the child.
  fn increment_child_prio(&mut self, pos: usize) -> usize {
    self.children[pos].priority += 1;
    let prio = self.children[pos].priority;

    // Move the child towards the front
    let mut new_pos = pos;
    while new_pos > 0 && self.children[new_pos - 1].priority < prio {
      self.children.swap(new_pos - 1, new_pos);
      self.indices.swap(new_pos - 1, new_pos);
      new_pos -= 1;
    }

    new_pos
  }

  /// Registers a handle under the given pattern.
  ///
  /// Patterns may contain named parameters (`:name`, matching one non-empty
  /// segment) and a terminal catch-all (`*name`, matching the non-empty
  /// remainder). A failed registration leaves the tree matching exactly what
  /// it matched before the call.
  pub fn add_route(&mut self, path: &str, handle: T) -> Result<(), InsertError> {
    if !path.starts_with('/') {
      return Err(InsertError::EmptyPath {
        path: path.to_string(),
      });
    }
    check_wildcards(path.as_bytes(), path)?;

    // Empty tree
    if self.path.is_empty() && self.children.is_empty() {
      self.insert_child(path.as_bytes(), path, handle)?;
      self.node_type = NodeType::Root;
    } else {
      self.walk_route(path.as_bytes(), path, handle)?;
    }
    self.priority += 1;
    Ok(())
  }

  fn walk_route(&mut self, mut path: &[u8], full_path: &str, handle: T) -> Result<(), InsertError> {
    // Find the longest common prefix.
    // This also implies that the common prefix contains no ':' or '*', since
    // an existing key can't contain those chars.
    let mut i = 0;
    let max = min(path.len(), self.path.len());
    while i < max && path[i] == self.path[i] {
      i += 1;
    }

    // Split edge
    if i < self.path.len() {
      let child = Node {
        path: self.path[i..].to_vec(),
        wild_child: self.wild_child,
        node_type: NodeType::Static,
        indices: mem::take(&mut self.indices),
        children: mem::take(&mut self.children),
        route: self.route.take(),
        priority: self.priority,
      };

      self.indices = vec![self.path[i]];
      self.children = vec![Box::new(child)];
      self.path.truncate(i);
      self.wild_child = false;
    }

    // Make the new route a child of this node
    if i < path.len() {
      path = &path[i..];

      if self.wild_child {
        return self.insert_at_wild_child(path, full_path, handle);
      }

      let idxc = path[0];

      // '/' after param
      if self.node_type == NodeType::Param && idxc == b'/' && self.children.len() == 1 {
        let child = &mut self.children[0];
        child.walk_route(path, full_path, handle)?;
        child.priority += 1;
        return Ok(());
      }

      // Check if a child with the next path byte exists
      if let Some(pos) = self.indices.iter().position(|&c| c == idxc) {
        self.children[pos].walk_route(path, full_path, handle)?;
        self.increment_child_prio(pos);
        return Ok(());
      }

      // Otherwise insert it
      if idxc != b':' && idxc != b'*' {
        self.indices.push(idxc);
        self.children.push(Box::new(Node::default()));
        let pos = self.children.len() - 1;
        self.children[pos].insert_child(path, full_path, handle)?;
        self.increment_child_prio(pos);
        return Ok(());
      }

      return self.insert_child(path, full_path, handle);
    }

    // The pattern ends at this node
    if let Some(route) = &self.route {
      return Err(InsertError::DuplicateHandle {
        path: route.full_path.clone(),
      });
    }
    self.route = Some(Route {
      handle,
      full_path: full_path.to_string(),
    });
    Ok(())
  }

  // The node already has a wildcard child; the new route must descend
  // through it or it is in conflict.
  fn insert_at_wild_child(
    &mut self,
    path: &[u8],
    full_path: &str,
    handle: T,
  ) -> Result<(), InsertError> {
    let child = &mut self.children[0];

    // Check if the wildcard matches
    if path.len() >= child.path.len()
      && child.path[..] == path[..child.path.len()]
      // Adding a child to a catch-all is not possible
      && child.node_type != NodeType::CatchAll
      // Check for a longer wildcard, e.g. :name and :names
      && (child.path.len() >= path.len() || path[child.path.len()] == b'/')
    {
      child.walk_route(path, full_path, handle)?;
      child.priority += 1;
      return Ok(());
    }

    // Wildcard conflict: rebuild the existing prefix for the diagnostic
    let mut prefix = full_path.as_bytes()[..full_path.len() - path.len()].to_vec();
    prefix.extend_from_slice(&child.path);
    let with = String::from_utf8_lossy(&prefix).into_owned();

    let seg = if path[0] == b'/' { &path[1..] } else { path };
    let new_is_wild = seg.first().map_or(false, |&c| c == b':' || c == b'*');
    Err(if new_is_wild {
      InsertError::WildcardConflict {
        path: full_path.to_string(),
        with,
      }
    } else {
      InsertError::StaticConflict {
        path: full_path.to_string(),
        with,
      }
    })
  }

  // Inserts the remainder of a pattern below this node, creating wildcard
  // nodes as needed. The pattern syntax was validated before the walk, so
  // only tree-state conflicts can fail here, and those are detected before
  // any mutation.
  fn insert_child(
    &mut self,
    mut path: &[u8],
    full_path: &str,
    handle: T,
  ) -> Result<(), InsertError> {
    let mut node = self;

    loop {
      // Find the prefix until the first wildcard
      let (wildcard, i) = match find_wildcard(path) {
        Some((wildcard, i, _)) => (wildcard, i),
        None => break,
      };

      // Existing children would be unreachable behind the wildcard
      if !node.children.is_empty() {
        let consumed = &full_path.as_bytes()[..full_path.len() - path.len() + i];
        return Err(InsertError::WildcardConflict {
          path: full_path.to_string(),
          with: String::from_utf8_lossy(consumed).into_owned(),
        });
      }

      if wildcard[0] == b':' {
        // Insert the prefix before the current wildcard
        if i > 0 {
          node.path = path[..i].to_vec();
          path = &path[i..];
        }

        let child = Node {
          node_type: NodeType::Param,
          path: wildcard.to_vec(),
          priority: 1,
          ..Node::default()
        };
        node.wild_child = true;
        node.children = vec![Box::new(child)];
        node = &mut *node.children[0];

        // If the pattern doesn't end with the wildcard, there will be
        // another subpath starting with '/'
        if wildcard.len() < path.len() {
          path = &path[wildcard.len()..];
          let child = Node {
            priority: 1,
            ..Node::default()
          };
          node.children = vec![Box::new(child)];
          node = &mut *node.children[0];
          continue;
        }

        // Otherwise we're done. Insert the handle in the new leaf
        node.route = Some(Route {
          handle,
          full_path: full_path.to_string(),
        });
        return Ok(());
      }

      // Catch-all. Terminality and the preceding '/' were validated up
      // front; the segment root must not carry a handle already.
      if !node.path.is_empty() && node.path[node.path.len() - 1] == b'/' {
        let consumed = &full_path.as_bytes()[..full_path.len() - path.len()];
        return Err(InsertError::WildcardConflict {
          path: full_path.to_string(),
          with: String::from_utf8_lossy(consumed).into_owned(),
        });
      }

      let slash = i - 1;
      node.path = path[..slash].to_vec();

      // First node: catch-all node with empty path
      let child = Node {
        node_type: NodeType::CatchAll,
        wild_child: true,
        priority: 1,
        ..Node::default()
      };
      node.indices = vec![b'/'];
      node.children = vec![Box::new(child)];
      node = &mut *node.children[0];

      // Second node: node holding the variable
      let child = Node {
        path: path[slash..].to_vec(),
        node_type: NodeType::CatchAll,
        priority: 1,
        route: Some(Route {
          handle,
          full_path: full_path.to_string(),
        }),
        ..Node::default()
      };
      node.children = vec![Box::new(child)];
      return Ok(());
    }

    // No wildcard was found, simply insert the path and handle
    node.path = path.to_vec();
    node.route = Some(Route {
      handle,
      full_path: full_path.to_string(),
    });
    Ok(())
  }

  /// Returns the handle registered for the given concrete path, the captured
  /// parameter values and a trailing-slash recommendation.
  ///
  /// Parameters are only collected when a `params_source` is supplied; the
  /// buffer it yields is acquired on the first capture, truncated to zero
  /// length and then appended to, so callers may serve a pooled allocation.
  /// When no handle matches, no parameters are returned; `tsr` is true when
  /// adding or removing a single trailing `/` would produce a match.
  pub fn get_value<'t>(
    &'t self,
    path: &str,
    mut params_source: Option<&mut dyn FnMut() -> Params>,
  ) -> (Option<&'t T>, Option<Params>, bool) {
    let full = path.as_bytes();
    let mut node = self;
    let mut cursor = 0;
    let mut params: Option<Params> = None;

    loop {
      let prefix = node.path.as_slice();
      let rest = &full[cursor..];

      if rest.len() > prefix.len() {
        if &rest[..prefix.len()] == prefix {
          cursor += prefix.len();
          let rest = &full[cursor..];

          // If this node has no wildcard child we can just look up the
          // next child node by its first byte and keep walking
          if !node.wild_child {
            let idxc = rest[0];
            if let Some(pos) = node.indices.iter().position(|&c| c == idxc) {
              node = &*node.children[pos];
              continue;
            }

            // Nothing found. Recommend redirecting to the same URL
            // without the trailing slash if a leaf exists for that path.
            let tsr = rest == [b'/'] && node.route.is_some();
            return (None, None, tsr);
          }

          // Handle the wildcard child
          node = &*node.children[0];
          match node.node_type {
            NodeType::Param => {
              // Find the param end ('/' or the path end)
              let mut end = cursor;
              while end < full.len() && full[end] != b'/' {
                end += 1;
              }

              // A named parameter never matches an empty segment
              if end == cursor {
                return (None, None, false);
              }

              if let Some(source) = params_source.as_mut() {
                let ps = params.get_or_insert_with(|| {
                  let mut ps = (**source)();
                  ps.clear();
                  ps
                });
                ps.push(Param::new(
                  str::from_utf8(&node.path[1..]).unwrap(),
                  &path[cursor..end],
                ));
              }

              if end < full.len() {
                // We need to go deeper!
                if !node.children.is_empty() {
                  cursor = end;
                  node = &*node.children[0];
                  continue;
                }

                // ... but we can't
                let tsr = full.len() == end + 1;
                return (None, None, tsr);
              }

              if node.route.is_some() {
                return (node.route.as_ref().map(|route| &route.handle), params, false);
              }
              if node.children.len() == 1 {
                // No handle found. Check if a handle for this path plus a
                // trailing slash exists for the recommendation
                let child = &node.children[0];
                let tsr = child.path == [b'/'] && child.route.is_some();
                return (None, None, tsr);
              }

              return (None, None, false);
            }
            NodeType::CatchAll => {
              if let Some(source) = params_source.as_mut() {
                let ps = params.get_or_insert_with(|| {
                  let mut ps = (**source)();
                  ps.clear();
                  ps
                });
                ps.push(Param::new(
                  str::from_utf8(&node.path[2..]).unwrap(),
                  &path[cursor..],
                ));
              }

              return (node.route.as_ref().map(|route| &route.handle), params, false);
            }
            _ => panic!("invalid node type"),
          }
        }
      } else if rest == prefix {
        // We should have reached the node containing the handle.
        if node.route.is_some() {
          return (node.route.as_ref().map(|route| &route.handle), params, false);
        }

        // If there is no handle for this route, but this route has a
        // wildcard child, there must be a handle for this path with an
        // additional trailing slash
        if rest == [b'/'] && node.wild_child && node.node_type != NodeType::Root {
          return (None, None, true);
        }

        // No handle found. Check if a handle for this path plus a trailing
        // slash exists for the recommendation
        if let Some(pos) = node.indices.iter().position(|&c| c == b'/') {
          let child = &node.children[pos];
          let tsr = (child.path.len() == 1 && child.route.is_some())
            || (child.node_type == NodeType::CatchAll && child.children[0].route.is_some());
          return (None, None, tsr);
        }

        return (None, None, false);
      }

      // Nothing found. Recommend redirecting to the same URL with an extra
      // trailing slash if a leaf exists for that path.
      let tsr = rest == [b'/']
        || (prefix.len() == rest.len() + 1
          && prefix[rest.len()] == b'/'
          && rest == &prefix[..prefix.len() - 1]
          && node.route.is_some());
      return (None, None, tsr);
    }
  }

  /// Makes a case-insensitive lookup of the given path, using the full
  /// Unicode case tables, and returns the case-corrected canonical path if a
  /// handle exists for it. If `fix_trailing_slash` is true, a trailing `/`
  /// may be added or removed to produce a match.
  ///
  /// Parameter and catch-all captures keep the caller's case; only static
  /// portions are corrected to their registered spelling.
  pub fn find_case_insensitive_path(&self, path: &str, fix_trailing_slash: bool) -> Option<String> {
    let mut out = Vec::with_capacity(path.len() + 1);
    if self.repair_walk(path.as_bytes(), 0, &mut out, fix_trailing_slash) {
      // The output is stitched from registered patterns and request slices,
      // both valid UTF-8
      Some(String::from_utf8(out).unwrap())
    } else {
      None
    }
  }

  // Recursive case-insensitive walk. `skip` is the number of leading bytes
  // of this node's path already consumed by a scalar that spanned the node
  // boundary. On failure the output buffer is restored to its entry state.
  fn repair_walk(
    &self,
    path: &[u8],
    skip: usize,
    out: &mut Vec<u8>,
    fix_trailing_slash: bool,
  ) -> bool {
    let stored = &self.path[skip..];
    let out_mark = out.len();
    let mut i = 0;
    let mut j = 0;

    // Compare the node's bytes scalar by scalar, each cursor advancing by
    // its own scalar's byte length
    while i < stored.len() {
      let rem = &stored[i..];

      if j >= path.len() {
        // Request exhausted inside this node
        if fix_trailing_slash {
          if path == [b'/'] {
            out.truncate(out_mark);
            return true;
          }
          if rem == [b'/'] && self.route.is_some() {
            out.push(b'/');
            return true;
          }
        }
        out.truncate(out_mark);
        return false;
      }

      let want = scalar_len(rem[0]);
      if want > rem.len() {
        // The stored scalar continues in a child node
        if let Some((qc, qlen)) = decode_scalar(&path[j..]) {
          if self.complete_scalar(rem, qc, &path[j + qlen..], out, fix_trailing_slash) {
            return true;
          }
        }
        out.truncate(out_mark);
        return false;
      }

      match (decode_scalar(rem), decode_scalar(&path[j..])) {
        (Some((sc, slen)), Some((qc, qlen))) if fold_eq(sc, qc) => {
          out.extend_from_slice(&rem[..slen]);
          i += slen;
          j += qlen;
        }
        _ => {
          if fix_trailing_slash && path == [b'/'] {
            out.truncate(out_mark);
            return true;
          }
          out.truncate(out_mark);
          return false;
        }
      }
    }

    let rest = &path[j..];

    if rest.is_empty() {
      // We should have reached the node containing the handle.
      if self.route.is_some() {
        return true;
      }

      // No handle found. Try to fix the path by adding a trailing slash
      if fix_trailing_slash {
        if let Some(pos) = self.indices.iter().position(|&c| c == b'/') {
          let child = &self.children[pos];
          if (child.path == [b'/'] && child.route.is_some())
            || (child.node_type == NodeType::CatchAll && child.children[0].route.is_some())
          {
            out.push(b'/');
            return true;
          }
        }
      }
      out.truncate(out_mark);
      return false;
    }

    if !self.wild_child {
      let qc = match decode_scalar(rest) {
        Some((qc, _)) => qc,
        None => {
          out.truncate(out_mark);
          return false;
        }
      };

      // Both case variants of the next scalar might exist as children, so
      // every candidate is tried recursively
      let first_bytes = [
        rest[0],
        first_utf8_byte(lower_first(qc)),
        first_utf8_byte(upper_first(qc)),
      ];
      for child in &self.children {
        let candidate = child.path.is_empty() || first_bytes.contains(&child.path[0]);
        if candidate && child.repair_walk(rest, 0, out, fix_trailing_slash) {
          return true;
        }
      }

      // Nothing found. Recommend redirecting to the same URL without the
      // trailing slash if a leaf exists for that path.
      if fix_trailing_slash && rest == [b'/'] && self.route.is_some() {
        return true;
      }
      out.truncate(out_mark);
      return false;
    }

    let child = &self.children[0];
    match child.node_type {
      NodeType::Param => {
        // Find the param end ('/' or the path end)
        let mut end = 0;
        while end < rest.len() && rest[end] != b'/' {
          end += 1;
        }
        if end == 0 {
          out.truncate(out_mark);
          return false;
        }

        // Param values keep the caller's case
        out.extend_from_slice(&rest[..end]);

        if end < rest.len() {
          if !child.children.is_empty() {
            if child.children[0].repair_walk(&rest[end..], 0, out, fix_trailing_slash) {
              return true;
            }
            out.truncate(out_mark);
            return false;
          }

          // ... but we can't
          if fix_trailing_slash && rest.len() == end + 1 {
            return true;
          }
          out.truncate(out_mark);
          return false;
        }

        if child.route.is_some() {
          return true;
        }
        if fix_trailing_slash && child.children.len() == 1 {
          // No handle found. Check if a handle for this path plus a
          // trailing slash exists
          let grandchild = &child.children[0];
          if grandchild.path == [b'/'] && grandchild.route.is_some() {
            out.push(b'/');
            return true;
          }
        }
        out.truncate(out_mark);
        false
      }
      NodeType::CatchAll => {
        out.extend_from_slice(rest);
        true
      }
      _ => panic!("invalid node type"),
    }
  }

  // Completes a scalar whose leading bytes sit at the tail of an ancestor's
  // stored path, taking the remaining bytes from this node's children, then
  // resumes the walk inside the child that supplied them.
  fn complete_scalar(
    &self,
    pending: &[u8],
    qc: char,
    rest: &[u8],
    out: &mut Vec<u8>,
    fix_trailing_slash: bool,
  ) -> bool {
    let want = scalar_len(pending[0]);
    let need = want - pending.len();

    for child in &self.children {
      if child.path.len() >= need {
        let mut scalar = [0u8; 4];
        scalar[..pending.len()].copy_from_slice(pending);
        scalar[pending.len()..want].copy_from_slice(&child.path[..need]);

        let sc = match decode_scalar(&scalar[..want]) {
          Some((sc, slen)) if slen == want => sc,
          _ => continue,
        };
        if !fold_eq(sc, qc) {
          continue;
        }

        let mark = out.len();
        out.extend_from_slice(pending);
        out.extend_from_slice(&child.path[..need]);
        if child.repair_walk(rest, need, out, fix_trailing_slash) {
          return true;
        }
        out.truncate(mark);
      } else {
        // The scalar spans yet another level
        let mut deeper = Vec::with_capacity(want);
        deeper.extend_from_slice(pending);
        deeper.extend_from_slice(&child.path);
        if child.complete_scalar(&deeper, qc, rest, out, fix_trailing_slash) {
          return true;
        }
      }
    }

    false
  }
}

// Expected byte length of a UTF-8 scalar from its lead byte.
fn scalar_len(lead: u8) -> usize {
  match lead {
    0x00..=0x7F => 1,
    0xC0..=0xDF => 2,
    0xE0..=0xEF => 3,
    0xF0..=0xF7 => 4,
    _ => 1,
  }
}

// Decodes one scalar from the front of `bytes`.
fn decode_scalar(bytes: &[u8]) -> Option<(char, usize)> {
  if bytes.is_empty() {
    return None;
  }
  let len = min(scalar_len(bytes[0]), bytes.len());
  let s = str::from_utf8(&bytes[..len]).ok()?;
  let c = s.chars().next()?;
  Some((c, c.len_utf8()))
}

// Case-insensitive comparison of two scalars over the full Unicode case
// tables. Lowercasing a scalar can yield several scalars, so the expansions
// are compared in full.
fn fold_eq(a: char, b: char) -> bool {
  a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn lower_first(c: char) -> char {
  c.to_lowercase().next().unwrap_or(c)
}

fn upper_first(c: char) -> char {
  c.to_uppercase().next().unwrap_or(c)
}

fn first_utf8_byte(c: char) -> u8 {
  let mut buf = [0u8; 4];
  c.encode_utf8(&mut buf);
  buf[0]
}
