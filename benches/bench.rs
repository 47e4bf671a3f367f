use criterion::{black_box, criterion_group, criterion_main, Criterion};
use routrie::{Node, Params};

// A representative slice of the GitHub v3 API surface.
static ROUTES: &[&str] = &[
  "/authorizations",
  "/authorizations/:id",
  "/applications/:client_id/tokens/:access_token",
  "/events",
  "/repos/:owner/:repo/events",
  "/networks/:owner/:repo/events",
  "/orgs/:org/events",
  "/users/:user/received_events",
  "/users/:user/received_events/public",
  "/users/:user/events",
  "/users/:user/events/public",
  "/users/:user/events/orgs/:org",
  "/feeds",
  "/notifications",
  "/repos/:owner/:repo/notifications",
  "/notifications/threads/:id",
  "/notifications/threads/:id/subscription",
  "/repos/:owner/:repo/stargazers",
  "/users/:user/starred",
  "/user/starred",
  "/user/starred/:owner/:repo",
  "/repos/:owner/:repo/subscribers",
  "/users/:user/subscriptions",
  "/user/subscriptions",
  "/repos/:owner/:repo/subscription",
  "/user/subscriptions/:owner/:repo",
  "/users/:user/gists",
  "/gists",
  "/gists/:id",
  "/gists/:id/star",
  "/repos/:owner/:repo/git/blobs/:sha",
  "/repos/:owner/:repo/git/commits/:sha",
  "/repos/:owner/:repo/git/refs",
  "/repos/:owner/:repo/git/tags/:sha",
  "/repos/:owner/:repo/git/trees/:sha",
  "/issues",
  "/user/issues",
  "/orgs/:org/issues",
  "/repos/:owner/:repo/issues",
  "/repos/:owner/:repo/issues/:number",
  "/repos/:owner/:repo/assignees",
  "/repos/:owner/:repo/assignees/:assignee",
  "/repos/:owner/:repo/issues/:number/comments",
  "/repos/:owner/:repo/issues/:number/events",
  "/repos/:owner/:repo/labels",
  "/repos/:owner/:repo/labels/:name",
  "/repos/:owner/:repo/issues/:number/labels",
  "/repos/:owner/:repo/milestones/:number/labels",
  "/repos/:owner/:repo/milestones/",
  "/repos/:owner/:repo/milestones/:number",
  "/emojis",
  "/gitignore/templates",
  "/gitignore/templates/:name",
  "/meta",
  "/rate_limit",
  "/users/:user/orgs",
  "/user/orgs",
  "/orgs/:org",
  "/orgs/:org/members",
  "/orgs/:org/members/:user",
  "/orgs/:org/public_members",
  "/orgs/:org/public_members/:user",
  "/orgs/:org/teams",
  "/teams/:id",
  "/teams/:id/members",
  "/teams/:id/members/:user",
  "/teams/:id/repos",
  "/teams/:id/repos/:owner/:repo",
  "/user/teams",
  "/repos/:owner/:repo/pulls",
  "/repos/:owner/:repo/pulls/:number",
  "/repos/:owner/:repo/pulls/:number/commits",
  "/repos/:owner/:repo/pulls/:number/files",
  "/repos/:owner/:repo/pulls/:number/merge",
  "/repos/:owner/:repo/pulls/:number/comments",
  "/user/repos",
  "/users/:user/repos",
  "/orgs/:org/repos",
  "/repositories",
  "/repos/:owner/:repo",
  "/repos/:owner/:repo/contributors",
  "/repos/:owner/:repo/languages",
  "/repos/:owner/:repo/teams",
  "/repos/:owner/:repo/tags",
  "/repos/:owner/:repo/branches",
  "/repos/:owner/:repo/branches/:branch",
  "/repos/:owner/:repo/collaborators",
  "/repos/:owner/:repo/collaborators/:user",
  "/repos/:owner/:repo/comments",
  "/repos/:owner/:repo/commits/:sha/comments",
  "/repos/:owner/:repo/commits",
  "/repos/:owner/:repo/commits/:sha",
  "/repos/:owner/:repo/readme",
  "/repos/:owner/:repo/keys",
  "/repos/:owner/:repo/keys/:id",
  "/repos/:owner/:repo/downloads",
  "/repos/:owner/:repo/downloads/:id",
  "/repos/:owner/:repo/forks",
  "/repos/:owner/:repo/hooks",
  "/repos/:owner/:repo/hooks/:id",
  "/repos/:owner/:repo/releases",
  "/repos/:owner/:repo/releases/:id",
  "/repos/:owner/:repo/releases/:id/assets",
  "/repos/:owner/:repo/stats/contributors",
  "/repos/:owner/:repo/stats/commit_activity",
  "/repos/:owner/:repo/stats/code_frequency",
  "/repos/:owner/:repo/stats/participation",
  "/repos/:owner/:repo/stats/punch_card",
  "/repos/:owner/:repo/statuses/:ref",
  "/search/repositories",
  "/search/code",
  "/search/issues",
  "/search/users",
  "/legacy/issues/search/:owner/:repository/:state/:keyword",
  "/legacy/repos/search/:keyword",
  "/legacy/user/search/:keyword",
  "/legacy/user/email/:email",
  "/users/:user",
  "/user",
  "/users",
  "/user/emails",
  "/users/:user/followers",
  "/user/followers",
  "/users/:user/following",
  "/user/following",
  "/user/following/:user",
  "/users/:user/following/:target_user",
  "/users/:user/keys",
  "/user/keys",
  "/user/keys/:id",
];

fn build_tree() -> Node<bool> {
  let mut tree = Node::new();
  for route in ROUTES {
    tree.add_route(route, true).unwrap();
  }
  tree
}

fn bench_lookup(c: &mut Criterion) {
  let tree = build_tree();

  let requests = vec![
    "/user/repos",
    "/repos/rust-lang/rust/stargazers",
    "/orgs/rust-lang/public_members/nikomatsakis",
    "/legacy/issues/search/rust-lang/rust/open/routing",
  ];

  c.bench_function("lookup github routes", |b| {
    b.iter(|| {
      for path in black_box(&requests) {
        let mut source = Params::new;
        let (handle, _, _) = black_box(tree.get_value(path, Some(&mut source)));
        assert!(handle.is_some());
      }
    });
  });

  c.bench_function("lookup without params", |b| {
    b.iter(|| {
      for path in black_box(&requests) {
        let (handle, _, _) = black_box(tree.get_value(path, None));
        assert!(handle.is_some());
      }
    });
  });
}

fn bench_insert(c: &mut Criterion) {
  c.bench_function("build github route table", |b| {
    b.iter(|| black_box(build_tree()));
  });
}

fn bench_repair(c: &mut Criterion) {
  let tree = build_tree();

  c.bench_function("case-insensitive repair", |b| {
    b.iter(|| {
      let fixed = tree.find_case_insensitive_path(black_box("/USER/REPOS"), true);
      assert!(fixed.is_some());
    });
  });
}

criterion_group!(benches, bench_lookup, bench_insert, bench_repair);
criterion_main!(benches);
