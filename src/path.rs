// The output buffer of clean_path. Bytes are only copied once the cleaned
// path diverges from the original, so an already-clean path costs no
// allocation besides the final copy.
struct LazyBuf<'a> {
  src: &'a [u8],
  buf: Option<Vec<u8>>,
  w: usize,
}

impl<'a> LazyBuf<'a> {
  fn new(src: &'a [u8]) -> LazyBuf<'a> {
    LazyBuf {
      src,
      buf: None,
      w: 0,
    }
  }

  fn len(&self) -> usize {
    self.w
  }

  fn index(&self, i: usize) -> u8 {
    match &self.buf {
      Some(buf) => buf[i],
      None => self.src[i],
    }
  }

  fn append(&mut self, c: u8) {
    if self.buf.is_none() {
      if self.w < self.src.len() && self.src[self.w] == c {
        self.w += 1;
        return;
      }
      // The output can be one byte longer than the input when a leading
      // slash is prepended
      let mut buf = vec![0; self.src.len() + 1];
      buf[..self.w].copy_from_slice(&self.src[..self.w]);
      self.buf = Some(buf);
    }
    if let Some(buf) = &mut self.buf {
      buf[self.w] = c;
      self.w += 1;
    }
  }

  // Rewinds the write cursor to the previous '/'.
  fn backtrack(&mut self) {
    if self.w > 1 {
      self.w -= 1;
      while self.w > 1 && self.index(self.w) != b'/' {
        self.w -= 1;
      }
    }
  }

  fn into_string(self) -> String {
    let bytes = match self.buf {
      Some(buf) => buf[..self.w].to_vec(),
      None => self.src[..self.w].to_vec(),
    };
    // Element boundaries are ASCII, so the cut points are scalar-aligned
    String::from_utf8(bytes).unwrap()
  }
}

/// Returns the canonical URL path for `p`, eliminating `.` and `..`
/// elements.
///
/// The following rules are applied iteratively until no further processing
/// can be done:
///
/// 1. Replace multiple slashes with a single slash.
/// 2. Eliminate each `.` path name element (the current directory).
/// 3. Eliminate each inner `..` path name element (the parent directory)
///    along with the non-`..` element that precedes it.
/// 4. Eliminate `..` elements that begin a rooted path: that is, replace
///    `/..` by `/` at the beginning of a path.
///
/// A trailing slash is preserved. If the result of this process is empty,
/// `/` is returned.
pub fn clean_path(p: &str) -> String {
  if p.is_empty() {
    return "/".to_string();
  }

  let src = p.as_bytes();
  let n = src.len();
  let mut out = LazyBuf::new(src);
  let mut r = 0;

  // The path must start with '/'
  out.append(b'/');
  if src[0] == b'/' {
    r = 1;
  }
  let mut trailing = n > 1 && src[n - 1] == b'/';

  while r < n {
    if src[r] == b'/' {
      // empty path element
      r += 1;
    } else if src[r] == b'.' && r + 1 == n {
      trailing = true;
      r += 1;
    } else if src[r] == b'.' && src[r + 1] == b'/' {
      // . element
      r += 2;
    } else if src[r] == b'.' && src[r + 1] == b'.' && (r + 2 == n || src[r + 2] == b'/') {
      // .. element: remove to the last /
      r += 3;
      out.backtrack();
    } else {
      // Real path element; add a slash if needed
      if out.len() > 1 {
        out.append(b'/');
      }
      while r < n && src[r] != b'/' {
        out.append(src[r]);
        r += 1;
      }
    }
  }

  // Re-append the trailing slash
  if trailing && out.len() > 1 {
    out.append(b'/');
  }

  out.into_string()
}
