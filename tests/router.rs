use http::Method;
use routrie::{InsertError, Params, Router};

#[test]
fn routes_per_method() {
  let mut router = Router::default();
  router.get("/products", "list").unwrap();
  router.post("/products", "create").unwrap();

  let res = router.lookup(&Method::GET, "/products").unwrap();
  assert_eq!(res.value, &"list");

  let res = router.lookup(&Method::POST, "/products").unwrap();
  assert_eq!(res.value, &"create");

  // No tree registered for this method at all
  assert_eq!(router.lookup(&Method::DELETE, "/products").unwrap_err(), false);
}

#[test]
fn lookup_reports_trailing_slash() {
  let mut router = Router::default();
  router.get("/home", "home").unwrap();

  assert_eq!(router.lookup(&Method::GET, "/home/").unwrap_err(), true);
  assert_eq!(router.lookup(&Method::GET, "/elsewhere").unwrap_err(), false);
}

#[test]
fn lookup_captures_params() {
  let mut router = Router::default();
  router.get("/user/:name/file/*path", "files").unwrap();

  let res = router.lookup(&Method::GET, "/user/gordon/file/a/b").unwrap();
  assert_eq!(res.value, &"files");

  let params = res.params.expect("params expected");
  assert_eq!(params.by_name("name"), Some("gordon"));
  assert_eq!(params.by_name("path"), Some("/a/b"));

  // Hand the buffer back for the next lookup
  router.put_params(params);
}

#[test]
fn params_pool_round_trip() {
  let mut router = Router::default();
  router.get("/a/:x/:y/:z", "abc").unwrap();

  // max_params is 3, so a fresh buffer holds all captures without growing
  let params = router.get_params();
  assert!(params.is_empty());
  router.put_params(params);

  let res = router.lookup(&Method::GET, "/a/1/2/3").unwrap();
  let params = res.params.expect("params expected");
  assert_eq!(params.len(), 3);
  router.put_params(params);

  // The recycled buffer comes back truncated on the next capture
  let res = router.lookup(&Method::GET, "/a/4/5/6").unwrap();
  let params = res.params.expect("params expected");
  assert_eq!(params.len(), 3);
  assert_eq!(params.by_name("x"), Some("4"));
}

#[test]
fn allowed_methods() {
  let mut router = Router::default();
  router.get("/products", "list").unwrap();
  router.post("/products", "create").unwrap();
  router.put("/elsewhere", "put").unwrap();

  let allowed = router.allowed("/products");
  assert_eq!(allowed, vec!["GET", "OPTIONS", "POST"]);

  let global = router.allowed("*");
  assert!(global.contains(&"GET".to_string()));
  assert!(global.contains(&"POST".to_string()));
  assert!(global.contains(&"PUT".to_string()));
  assert!(global.contains(&"OPTIONS".to_string()));

  assert!(router.allowed("/missing").is_empty());
}

#[test]
fn case_insensitive_path_per_method() {
  let mut router = Router::default();
  router.get("/HELLO/world", "hi").unwrap();

  assert_eq!(
    router
      .find_case_insensitive_path(&Method::GET, "/hello/WORLD", true)
      .as_deref(),
    Some("/HELLO/world")
  );
  assert_eq!(
    router.find_case_insensitive_path(&Method::POST, "/hello/WORLD", true),
    None
  );
}

#[test]
fn failed_first_registration_leaves_no_method_behind() {
  let mut router = Router::default();
  router.get("/ok", "ok").unwrap();

  // A rejected pattern for a method that has no tree yet must not create
  // one; otherwise the method leaks into the server-wide allowed list
  assert!(matches!(
    router.post("missing-slash", "nope"),
    Err(InsertError::EmptyPath { .. })
  ));
  assert!(matches!(
    router.delete("/src/*all/more", "nope"),
    Err(InsertError::CatchAllNotTerminal { .. })
  ));

  assert_eq!(router.allowed("*"), vec!["GET", "OPTIONS"]);
  assert_eq!(router.lookup(&Method::POST, "/ok").unwrap_err(), false);
}

#[test]
fn insert_errors_propagate() {
  let mut router = Router::default();
  router.get("/user/:name", "user").unwrap();

  assert!(matches!(
    router.get("/user/new", "new"),
    Err(InsertError::StaticConflict { .. })
  ));
  assert!(matches!(
    router.get("no-slash", "x"),
    Err(InsertError::EmptyPath { .. })
  ));
}

#[test]
fn custom_keys() {
  // Any hashable key works, not just methods
  let mut router: Router<&str, u32> = Router::default();
  router.handle("/ws", "UPGRADE", 7).unwrap();

  let res = router.lookup(&"UPGRADE", "/ws").unwrap();
  assert_eq!(res.value, &7);
}

#[test]
fn lookup_without_params_returns_none() {
  let mut router = Router::default();
  router.get("/static/route", "static").unwrap();

  let res = router.lookup(&Method::GET, "/static/route").unwrap();
  assert!(res.params.is_none());
}

#[test]
fn params_buffer_factory_is_shareable() {
  // The router's pool is behind a mutex, so concurrent read-only lookups
  // are safe once registration is done
  use std::sync::Arc;
  use std::thread;

  let mut router = Router::default();
  router.get("/user/:name", "user").unwrap();
  let router = Arc::new(router);

  let handles: Vec<_> = (0..4)
    .map(|i| {
      let router = Arc::clone(&router);
      thread::spawn(move || {
        let path = format!("/user/thread{}", i);
        let res = router.lookup(&Method::GET, &path).unwrap();
        let params: &Params = res.params.as_ref().unwrap();
        assert_eq!(params.by_name("name"), Some(format!("thread{}", i).as_str()));
      })
    })
    .collect();

  for handle in handles {
    handle.join().unwrap();
  }
}
