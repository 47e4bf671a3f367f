//! A lightweight high performance HTTP request router.
//!
//! The router keeps one radix tree per request method and dispatches by the
//! request path. Registered patterns can contain two types of parameters:
//!
//! ```text
//!  Syntax    Type
//!  :name     named parameter
//!  *name     catch-all parameter
//! ```
//!
//! A named parameter stands in for exactly one non-empty path segment, the
//! text between the surrounding slashes:
//!
//! ```text
//!  Pattern: /blog/:category/:post
//!
//!  /blog/rust/request-routers     match: category="rust", post="request-routers"
//!  /blog/rust/                    no match
//!  /blog/rust/request-routers/   no match, but a trailing-slash redirect is recommended
//! ```
//!
//! A catch-all swallows everything from its position to the end of the
//! request path, its leading `/` included, and is therefore only legal as
//! the final element of a pattern:
//!
//! ```text
//!  Pattern: /files/*filepath
//!
//!  /files/                          match: filepath="/"
//!  /files/LICENSE                   match: filepath="/LICENSE"
//!  /files/templates/article.html    match: filepath="/templates/article.html"
//!  /files                           no match, but a redirect is recommended
//! ```
//!
//! Handlers receive the captured values as a [`Params`] list of key/value
//! pairs, ordered the way the wildcards appear in the pattern.

use crate::error::InsertError;
use crate::params::Params;
use crate::tree::{count_params, Node};

use http::Method;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// The result of a successful manual lookup: the registered value and the
/// captured parameters.
#[derive(Debug)]
pub struct RouteLookup<'a, V> {
  pub value: &'a V,
  pub params: Option<Params>,
}

/// A container which dispatches requests to different values via
/// configurable routes.
///
/// Values are indexed by keys; an HTTP router uses [`http::Method`] as the
/// key, keeping one tree per method.
pub struct Router<K: Eq + Hash, V> {
  trees: HashMap<K, Node<V>>,

  // Largest parameter count among the registered patterns; used to pre-size
  // pooled parameter buffers.
  max_params: u16,
  params_pool: Mutex<Vec<Params>>,

  /// Turn near-misses that only differ by a terminal `/` into redirects
  /// instead of 404s: when a lookup fails but the same path with the slash
  /// added or removed has a handler, the client is sent there. `GET`
  /// requests are answered with 301; every other method gets 308 so that
  /// method and body survive the redirect.
  pub redirect_trailing_slash: bool,

  /// Attempt to repair a missed request path before giving up on it. The
  /// path is first normalized (`//`, `.` and `..` elements collapsed), then
  /// retried under Unicode case folding; if the repaired path has a
  /// handler, the client is redirected to its canonical spelling with the
  /// same 301/308 codes as above, so `/FOO` or `/..//Foo` lands on `/foo`.
  /// This runs whether or not `redirect_trailing_slash` is set.
  pub redirect_fixed_path: bool,

  /// Answer unroutable requests with `405 Method Not Allowed` whenever some
  /// other method has a handler for the requested path, rather than falling
  /// through to `not_found`. The methods that would have worked are listed
  /// in the `Allow` header.
  pub handle_method_not_allowed: bool,

  /// Reply to `OPTIONS` requests automatically, with an `Allow` header
  /// built from the registered methods. A route explicitly registered for
  /// `OPTIONS` on that path still wins over the automatic reply.
  pub handle_options: bool,

  /// Replaces the empty default response for automatic `OPTIONS` replies;
  /// the `Allow` header is already set by the time it runs.
  pub global_options: Option<V>,

  /// Invoked when nothing matched at all. Without one, a bare 404 is
  /// returned.
  pub not_found: Option<V>,

  /// Invoked in place of the default `405` response when
  /// `handle_method_not_allowed` applies; the `Allow` header is already
  /// set by the time it runs.
  pub method_not_allowed: Option<V>,
}

impl<K: Eq + Hash, V> Router<K, V> {
  pub fn new() -> Self {
    Router::default()
  }

  /// Registers a value for the given pattern and key.
  ///
  /// ```rust
  /// use routrie::Router;
  /// use http::Method;
  ///
  /// let mut router = Router::default();
  /// router.handle("/teapot", Method::GET, "I am a teapot").unwrap();
  /// ```
  pub fn handle(&mut self, path: &str, key: K, value: V) -> Result<(), InsertError> {
    // The key is only added to the map once the route is in. A tree that
    // rejects its first pattern would otherwise stay behind as an empty
    // entry and show up in `allowed`.
    match self.trees.get_mut(&key) {
      Some(tree) => tree.add_route(path, value)?,
      None => {
        let mut tree = Node::new();
        tree.add_route(path, value)?;
        self.trees.insert(key, tree);
      }
    }

    let params_count = count_params(path.as_bytes());
    if params_count > self.max_params {
      self.max_params = params_count;
    }
    Ok(())
  }

  /// Manual lookup of the value registered for a key and path. On a miss,
  /// `Err` carries the trailing-slash recommendation: `true` means the same
  /// path with (without) a trailing slash would have matched.
  ///
  /// ```rust
  /// use routrie::Router;
  /// use http::Method;
  ///
  /// let mut router = Router::default();
  /// router.get("/home", "Welcome!").unwrap();
  ///
  /// let res = router.lookup(&Method::GET, "/home").unwrap();
  /// assert_eq!(res.value, &"Welcome!");
  /// assert!(res.params.is_none());
  /// ```
  pub fn lookup(&self, key: &K, path: &str) -> Result<RouteLookup<'_, V>, bool> {
    let tree = match self.trees.get(key) {
      Some(tree) => tree,
      None => return Err(false),
    };

    let mut source = || self.get_params();
    let (value, params, tsr) = tree.get_value(path, Some(&mut source));
    match value {
      Some(value) => Ok(RouteLookup { value, params }),
      None => Err(tsr),
    }
  }

  /// Case-insensitive lookup of the canonical registered path, optionally
  /// fixing a trailing slash.
  pub fn find_case_insensitive_path(
    &self,
    key: &K,
    path: &str,
    fix_trailing_slash: bool,
  ) -> Option<String> {
    self
      .trees
      .get(key)
      .and_then(|tree| tree.find_case_insensitive_path(path, fix_trailing_slash))
  }

  /// Takes a parameter buffer from the pool, or creates one sized to the
  /// largest parameter count among the registered patterns.
  pub fn get_params(&self) -> Params {
    let mut pool = self
      .params_pool
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    pool
      .pop()
      .unwrap_or_else(|| Params::with_capacity(self.max_params as usize))
  }

  /// Returns a parameter buffer to the pool for reuse by later lookups.
  pub fn put_params(&self, params: Params) {
    let mut pool = self
      .params_pool
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    pool.push(params);
  }
}

impl<V> Router<Method, V> {
  /// Registers a handler for GET requests.
  pub fn get(&mut self, path: &str, handle: V) -> Result<(), InsertError> {
    self.handle(path, Method::GET, handle)
  }

  /// Registers a handler for HEAD requests.
  pub fn head(&mut self, path: &str, handle: V) -> Result<(), InsertError> {
    self.handle(path, Method::HEAD, handle)
  }

  /// Registers a handler for OPTIONS requests.
  pub fn options(&mut self, path: &str, handle: V) -> Result<(), InsertError> {
    self.handle(path, Method::OPTIONS, handle)
  }

  /// Registers a handler for POST requests.
  pub fn post(&mut self, path: &str, handle: V) -> Result<(), InsertError> {
    self.handle(path, Method::POST, handle)
  }

  /// Registers a handler for PUT requests.
  pub fn put(&mut self, path: &str, handle: V) -> Result<(), InsertError> {
    self.handle(path, Method::PUT, handle)
  }

  /// Registers a handler for PATCH requests.
  pub fn patch(&mut self, path: &str, handle: V) -> Result<(), InsertError> {
    self.handle(path, Method::PATCH, handle)
  }

  /// Registers a handler for DELETE requests.
  pub fn delete(&mut self, path: &str, handle: V) -> Result<(), InsertError> {
    self.handle(path, Method::DELETE, handle)
  }

  /// Returns the methods allowed for the given path, for use in an `Allow`
  /// header. Pass `"*"` for the server-wide list.
  ///
  /// ```rust
  /// use routrie::Router;
  ///
  /// let mut router = Router::default();
  /// router.get("/products", "all products").unwrap();
  /// router.post("/products", "product created").unwrap();
  ///
  /// let allowed = router.allowed("/products");
  /// assert!(allowed.contains(&"GET".to_string()));
  /// assert!(allowed.contains(&"POST".to_string()));
  /// ```
  pub fn allowed(&self, path: &str) -> Vec<String> {
    let mut allowed: Vec<String> = Vec::new();

    if path == "*" {
      // server-wide
      for method in self.trees.keys() {
        if *method != Method::OPTIONS {
          allowed.push(method.to_string());
        }
      }
    } else {
      // specific path
      for (method, tree) in &self.trees {
        if *method == Method::OPTIONS {
          continue;
        }
        let (handle, _, _) = tree.get_value(path, None);
        if handle.is_some() {
          allowed.push(method.to_string());
        }
      }
    }

    if !allowed.is_empty() {
      allowed.push(Method::OPTIONS.to_string());
      allowed.sort();
    }

    allowed
  }
}

impl<K: Eq + Hash, V> Default for Router<K, V> {
  fn default() -> Self {
    Self {
      trees: HashMap::new(),
      max_params: 0,
      params_pool: Mutex::new(Vec::new()),
      redirect_trailing_slash: true,
      redirect_fixed_path: true,
      handle_method_not_allowed: true,
      handle_options: true,
      global_options: None,
      not_found: None,
      method_not_allowed: None,
    }
  }
}

#[cfg(feature = "hyper-server")]
pub mod hyper {
  //! Hyper integration: serve a [`Router`] of boxed async handlers.
  //!
  //! ```rust,no_run
  //! use routrie::{Router, Params, Handler, BoxedHandler};
  //! use hyper::{Request, Response, Body};
  //!
  //! async fn index(_: Request<Body>) -> Result<Response<Body>, hyper::Error> {
  //!     Ok(Response::new("Hello, World!".into()))
  //! }
  //!
  //! async fn hello(req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
  //!     let params = req.extensions().get::<Params>().unwrap();
  //!     let user = params.by_name("user").unwrap();
  //!     Ok(Response::new(format!("Hello, {}", user).into()))
  //! }
  //!
  //! #[tokio::main]
  //! async fn main() {
  //!     let mut router: Router<_, BoxedHandler> = Router::default();
  //!     router.get("/", Handler::new(index)).unwrap();
  //!     router.get("/hello/:user", Handler::new(hello)).unwrap();
  //!
  //!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
  //!         .serve(router.into_service())
  //!         .await
  //!         .unwrap();
  //! }
  //! ```

  use crate::path::clean_path;
  use crate::Router;
  use futures::future::{ok, Future};
  use hyper::service::Service;
  use hyper::{header, Body, Method, Request, Response, StatusCode};
  use std::pin::Pin;
  use std::sync::Arc;
  use std::task::{Context, Poll};

  type HandlerResult = Result<Response<Body>, hyper::Error>;
  type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + Sync>>;

  /// An asynchronous function from a request to a response, usable as a
  /// route handler.
  pub trait Handler {
    fn new(handler: Self) -> Box<Self>
    where
      Self: Sized;

    fn handle(&self, req: Request<Body>) -> HandlerFuture;
  }

  impl<F, R> Handler for F
  where
    F: Fn(Request<Body>) -> R,
    R: Future<Output = HandlerResult> + Send + Sync + 'static,
  {
    fn new(handler: Self) -> Box<Self>
    where
      Self: Sized,
    {
      Box::new(handler)
    }

    fn handle(&self, req: Request<Body>) -> HandlerFuture {
      Box::pin(self(req))
    }
  }

  pub type BoxedHandler = Box<dyn Handler + Send + Sync>;

  /// The `MakeService` yielding a [`RouterService`] per connection.
  pub struct MakeRouterService(pub RouterService);

  impl<T> Service<T> for MakeRouterService {
    type Response = RouterService;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
      Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
      let service = self.0.clone();
      Box::pin(async move { Ok(service) })
    }
  }

  /// A cloneable hyper `Service` dispatching requests through a shared
  /// [`Router`].
  #[derive(Clone)]
  pub struct RouterService(pub Arc<Router<Method, BoxedHandler>>);

  impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = hyper::Error;
    type Future = HandlerFuture;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
      Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
      self.0.serve(req)
    }
  }

  impl Router<Method, BoxedHandler> {
    /// Converts the router into a hyper `MakeService`.
    ///
    /// ```rust,no_run
    /// # use routrie::Router;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let router = Router::default();
    /// let service = router.into_service();
    ///
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService {
      MakeRouterService(RouterService(Arc::new(self)))
    }

    fn serve(&self, mut req: Request<Body>) -> HandlerFuture {
      let path = req.uri().path().to_string();
      let method = req.method().clone();

      if let Some(root) = self.trees.get(&method) {
        let mut source = || self.get_params();
        let (handle, params, tsr) = root.get_value(&path, Some(&mut source));

        if let Some(handle) = handle {
          if let Some(params) = params {
            req.extensions_mut().insert(params);
          }
          return handle.handle(req);
        }

        if method != Method::CONNECT && path != "/" {
          // Moved Permanently for GET, Permanent Redirect otherwise
          let code = if method == Method::GET {
            StatusCode::MOVED_PERMANENTLY
          } else {
            StatusCode::PERMANENT_REDIRECT
          };

          if tsr && self.redirect_trailing_slash {
            let fixed = if path.len() > 1 && path.ends_with('/') {
              path[..path.len() - 1].to_string()
            } else {
              format!("{}/", path)
            };

            return Box::pin(ok(
              Response::builder()
                .header(header::LOCATION, fixed.as_str())
                .status(code)
                .body(Body::empty())
                .unwrap(),
            ));
          }

          // Try to fix the request path
          if self.redirect_fixed_path {
            if let Some(fixed) =
              root.find_case_insensitive_path(&clean_path(&path), self.redirect_trailing_slash)
            {
              return Box::pin(ok(
                Response::builder()
                  .header(header::LOCATION, fixed.as_str())
                  .status(code)
                  .body(Body::empty())
                  .unwrap(),
              ));
            }
          }
        }
      }

      if method == Method::OPTIONS && self.handle_options {
        // Handle OPTIONS requests
        let allow = self.allowed(&path).join(", ");
        if !allow.is_empty() {
          if let Some(handler) = &self.global_options {
            return handler.handle(req);
          }
          return Box::pin(ok(
            Response::builder()
              .header(header::ALLOW, allow)
              .body(Body::empty())
              .unwrap(),
          ));
        }
      } else if self.handle_method_not_allowed {
        // Handle 405
        let allow = self.allowed(&path).join(", ");
        if !allow.is_empty() {
          if let Some(handler) = &self.method_not_allowed {
            return handler.handle(req);
          }
          return Box::pin(ok(
            Response::builder()
              .header(header::ALLOW, allow)
              .status(StatusCode::METHOD_NOT_ALLOWED)
              .body(Body::empty())
              .unwrap(),
          ));
        }
      }

      // Handle 404
      match &self.not_found {
        Some(handler) => handler.handle(req),
        None => Box::pin(ok(
          Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .unwrap(),
        )),
      }
    }
  }
}
