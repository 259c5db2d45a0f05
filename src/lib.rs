//! # page-router
//!
//! In-page navigation router: path patterns with named parameters, gated
//! route handlers on one ordered middleware pipeline, and navigation shared
//! by a group of routers over a single history.
//!
//! ## Quick start
//!
//! ```
//! use page_router::{continuation_fn, recover_fn, sync_fn, Router, RouterError, RouterGroup};
//!
//! let group = RouterGroup::in_memory();
//! let router = Router::new(&group);
//!
//! router
//!     .on("/users/:id(\\d+)")
//!     .unwrap()
//!     .on_enter(sync_fn(|ctx| println!("user {}", ctx.param("id").unwrap())));
//!
//! router
//!     .on("/admin/*")
//!     .unwrap()
//!     .on_enter(continuation_fn(|_ctx, next| next.fail(RouterError::handler("forbidden"))))
//!     .on_enter(recover_fn(|err, ctx, next| {
//!         println!("{} blocked: {}", ctx.path(), err);
//!         next.advance();
//!     }));
//!
//! let nav = router.go("/users/7", None);
//! assert!(nav.is_settled());
//! assert!(nav.errors().is_empty());
//! ```
//!
//! ## Model
//!
//! - A [`Router`] owns one [`Pipeline`]. [`Router::on`] creates a [`Route`]
//!   and every handler registered on it is appended to that pipeline behind a
//!   gate that only lets matching paths through.
//! - [`Router::dispatch`] builds a [`Context`] and runs the whole pipeline
//!   against it, in registration order.
//! - Handlers come in three shapes ([`Middleware`]): synchronous,
//!   continuation ([`Next`]) and error recovery.
//! - Routers belong to a [`RouterGroup`]; [`Router::go`] writes the shared
//!   [`History`] and dispatches on every router of the group.
//!
//! Everything is single-threaded (`Rc` based).
//!
//! ## Features
//!
//! | Feature   | Default | Effect                                   |
//! |-----------|---------|------------------------------------------|
//! | `log`     | yes     | log through the `log` crate              |
//! | `tracing` | no      | log through `tracing` instead            |
//! | `cache`   | yes     | LRU cache of compiled patterns ([`MatcherCache`]) |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod logging;

#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod group;
pub mod history;
pub mod link;
pub mod matching;
pub mod middleware;
pub mod params;
pub mod route;
pub mod router;

#[cfg(feature = "cache")]
pub use cache::{CacheStats, MatcherCache};
pub use config::RouterConfig;
pub use context::Context;
pub use error::{DispatchOutcome, RouterError};
pub use group::{Navigation, RouterGroup};
pub use history::{History, HistoryEntry, HistoryState, MemoryHistory};
pub use link::{parse_href, routable, LinkActivation, LinkEvent, ParsedHref};
pub use matching::{ParamKey, PathMatcher};
pub use middleware::{
    continuation_fn, recover_fn, sync_fn, Completion, Middleware, MiddlewareKind, Next, Pipeline,
};
pub use params::{ParameterBag, QueryParams};
pub use route::Route;
pub use router::{Dispatch, Router};
