#![deny(rust_2018_idioms)]

//! A lightweight high performance HTTP request router.
//!
//! ```rust
//! use routrie::Node;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tree = Node::new();
//! tree.add_route("/home", "Welcome!")?;
//! tree.add_route("/users/:id", "A User")?;
//!
//! let mut source = routrie::Params::new;
//! let (handle, params, _) = tree.get_value("/users/1", Some(&mut source));
//! assert_eq!(handle, Some(&"A User"));
//! assert_eq!(params.unwrap().by_name("id"), Some("1"));
//! # Ok(())
//! # }
//! ```
//!
//! Routing is backed by a [radix tree](https://en.wikipedia.org/wiki/Radix_tree):
//! patterns that share leading bytes share nodes, so matching a request
//! costs time proportional to the length of its path, independent of how
//! many routes are registered.
//!
//! ## Parameters
//!
//! Registered patterns can contain two types of parameters:
//!
//! ```text
//! Syntax    Type
//! :name     named parameter
//! *name     catch-all parameter
//! ```
//!
//! A named parameter stands in for a single path segment. It captures
//! whatever the request carries between the surrounding slashes, as long
//! as that is not empty:
//!
//! ```text
//! Pattern: /user/:user
//!
//!  /user/gordon              match
//!  /user/you                 match
//!  /user/gordon/profile      no match
//!  /user/                    no match
//! ```
//!
//! Matching is always unambiguous, which rules out a static segment and a
//! parameter competing for the same position: registering both `/user/new`
//! and `/user/:user` is rejected as a conflict.
//!
//! A catch-all swallows the whole rest of the request path, leading `/`
//! included, and can therefore only sit at the **end** of a pattern:
//!
//! ```text
//! Pattern: /src/*filepath
//!
//!  /src/                     match: filepath="/"
//!  /src/somefile.rs          match: filepath="/somefile.rs"
//!  /src/subdir/somefile.rs   match: filepath="/subdir/somefile.rs"
//! ```
//!
//! ## How does it work?
//!
//! All patterns of one method are compiled into a single compressed trie.
//! A node stores the run of bytes everything below it has in common, and a
//! branch only appears where two registered patterns actually diverge; a
//! lookup therefore visits each byte of the request path once, regardless
//! of the size of the route table. Here is the tree a small `GET` table
//! compiles to:
//!
//! ```text
//! Priority   Path             Handle
//! 9          \                *<1>
//! 3          ├s               None
//! 2          |├earch\         *<2>
//! 1          |└upport\        *<3>
//! 2          ├blog\           *<4>
//! 1          |    └:post      None
//! 1          |         └\     *<5>
//! 2          ├about-us\       *<6>
//! 1          |        └team\  *<7>
//! 1          └contact\        *<8>
//! ```
//!
//! Each `*<num>` marks a registered handler; reading the byte runs from
//! the root down to one of them reconstructs its pattern, e.g.
//! `/blog/:post`. Because the walk compares the pattern text itself rather
//! than a hash of it, wildcard nodes like `:post` fall out naturally: the
//! walk swallows one request segment at that point and records it as a
//! parameter.
//!
//! Route tables are deeply repetitive in practice, a handful of prefixes
//! shared by many endpoints, which keeps such a trie shallow and its nodes
//! few. Keeping one independent tree per request method compounds this:
//! method dispatch costs a single map probe up front and removes the
//! method from every node below.
//!
//! Within a node, children stay sorted by the number of handlers living
//! beneath them (their *priority*). Hot subtrees are probed first, and the
//! deepest walks, which have the most work left to do, start as early as
//! possible:
//!
//! ```text
//! ├------------
//! ├---------
//! ├-----
//! ├----
//! ├--
//! ├--
//! └-
//! ```

mod error;
mod params;
mod path;
mod router;
mod tree;

pub use error::InsertError;
pub use params::{Param, Params};
pub use path::clean_path;
pub use router::{RouteLookup, Router};
pub use tree::Node;

#[cfg(feature = "hyper-server")]
pub use router::hyper::{BoxedHandler, Handler, MakeRouterService, RouterService};
