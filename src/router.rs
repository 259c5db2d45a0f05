//! The router.
//!
//! A [`Router`] owns one [`Pipeline`] and the [`Route`]s that feed it. Every
//! dispatch creates a [`Context`], links it to the previous one and runs the
//! whole pipeline against it; the route gates decide which handlers actually
//! do something.
//!
//! Routers always belong to a [`RouterGroup`]. Navigation ([`Router::go`])
//! goes through the group, so one navigation reaches every router in it,
//! e.g. one per independently rendered region of a page.
//!
//! # Example
//!
//! ```
//! use page_router::{continuation_fn, sync_fn, Router, RouterGroup};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let group = RouterGroup::in_memory();
//! let router = Router::new(&group);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = seen.clone();
//! router.on("/users/:id").unwrap().on_enter(continuation_fn(move |ctx, next| {
//!     log.borrow_mut().push(ctx.param("id").unwrap());
//!     next.advance();
//! }));
//!
//! router.go("/users/42", None);
//! assert_eq!(*seen.borrow(), vec!["42"]);
//! assert_eq!(group.current_path(), "/users/42");
//! ```
//!
//! # Overlapping dispatches
//!
//! Dispatches are not cancelled. If a continuation handler is still holding
//! its [`Next`](crate::Next) when another navigation starts, both runs go on
//! independently. Handlers that care can compare
//! [`Context::navigation_id`] with [`Router::is_navigation_current`].

#[cfg(feature = "cache")]
use crate::cache::MatcherCache;
use crate::config::RouterConfig;
use crate::context::Context;
use crate::error::{DispatchOutcome, RouterError};
use crate::group::{Navigation, RouterGroup};
use crate::history::HistoryState;
#[cfg(not(feature = "cache"))]
use crate::matching::PathMatcher;
use crate::middleware::{Completion, Pipeline};
use crate::route::Route;
use crate::{debug_log, info_log};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

// ============================================================================
// Dispatch
// ============================================================================

/// Handle to one dispatch: its context and its completion signal.
#[derive(Debug, Clone)]
pub struct Dispatch {
    context: Rc<Context>,
    completion: Completion,
}

impl Dispatch {
    /// The context the pipeline ran against.
    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    /// The completion signal of the run.
    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    /// Current state of the run.
    pub fn outcome(&self) -> DispatchOutcome {
        self.completion.outcome()
    }

    /// Check if some handler has not advanced yet
    pub fn is_pending(&self) -> bool {
        self.completion.is_pending()
    }

    /// The unhandled error, if the run failed.
    pub fn error(&self) -> Option<RouterError> {
        self.completion.error()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Link filter installed by [`Router::listen`].
#[derive(Debug)]
struct Listening {
    prefix: Option<String>,
}

pub(crate) struct RouterInner {
    group: RouterGroup,
    config: RouterConfig,
    pipeline: Rc<RefCell<Pipeline>>,
    routes: RefCell<Vec<Route>>,
    /// Retained contexts, current last.
    contexts: RefCell<VecDeque<Rc<Context>>>,
    navigation_id: Cell<u64>,
    listening: RefCell<Option<Listening>>,
    created_at: Instant,
    /// Per-router; not shared with the rest of the group.
    #[cfg(feature = "cache")]
    matchers: RefCell<MatcherCache>,
}

/// Maps paths to gated handler chains. Cloning shares the router.
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    /// Create a router with the default configuration and add it to `group`.
    pub fn new(group: &RouterGroup) -> Self {
        Self::with_config(group, RouterConfig::default())
    }

    /// Create a router with `config` and add it to `group`.
    pub fn with_config(group: &RouterGroup, config: RouterConfig) -> Self {
        let router = Self {
            inner: Rc::new(RouterInner {
                group: group.clone(),
                pipeline: Rc::new(RefCell::new(Pipeline::new())),
                routes: RefCell::new(Vec::new()),
                contexts: RefCell::new(VecDeque::with_capacity(config.retained_contexts())),
                navigation_id: Cell::new(0),
                listening: RefCell::new(None),
                created_at: Instant::now(),
                #[cfg(feature = "cache")]
                matchers: RefCell::new(MatcherCache::with_capacity(config.matcher_cache_capacity)),
                config,
            }),
        };
        group.join(&router);
        router
    }

    pub(crate) fn from_inner(inner: Rc<RouterInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<RouterInner> {
        &self.inner
    }

    /// Run `plugin` against this router right away.
    pub fn use_plugin<F>(&self, plugin: F) -> &Self
    where
        F: FnOnce(&Router),
    {
        plugin(self);
        self
    }

    /// Create a route for `pattern`. Attach handlers with
    /// [`Route::on_enter`].
    pub fn on(&self, pattern: &str) -> Result<Route, RouterError> {
        #[cfg(feature = "cache")]
        let matcher = self.inner.matchers.borrow_mut().get_or_compile(pattern)?;
        #[cfg(not(feature = "cache"))]
        let matcher = PathMatcher::compile(pattern)?;

        let route = Route::new(matcher, Rc::downgrade(&self.inner.pipeline));
        self.inner.routes.borrow_mut().push(route.clone());
        info_log!("Registered route '{}'", pattern);
        Ok(route)
    }

    /// Create the context for a dispatch of `path` and make it current.
    ///
    /// The new context links to the previous current one.
    pub fn context(&self, path: &str) -> Rc<Context> {
        let id = self.inner.navigation_id.get() + 1;
        self.inner.navigation_id.set(id);

        let mut contexts = self.inner.contexts.borrow_mut();
        let context = Rc::new(Context::chained(path, contexts.back(), id));
        contexts.push_back(Rc::clone(&context));
        while contexts.len() > self.inner.config.retained_contexts() {
            contexts.pop_front();
        }
        context
    }

    /// Run the pipeline for `path`.
    ///
    /// The returned [`Dispatch`] settles once every handler has advanced; an
    /// error no recovery handler cleared shows up as
    /// [`DispatchOutcome::Failed`].
    pub fn dispatch(&self, path: &str) -> Dispatch {
        let context = self.context(path);
        debug_log!(
            "Dispatching '{}' (navigation {})",
            path,
            context.navigation_id()
        );
        let entries = self.inner.pipeline.borrow().snapshot();
        let completion = Pipeline::run_entries(entries, Rc::clone(&context));
        Dispatch {
            context,
            completion,
        }
    }

    /// Push `path` to the history and dispatch it on every router of the
    /// group. An empty path does nothing.
    pub fn go(&self, path: &str, state: Option<HistoryState>) -> Navigation {
        self.inner.group.go(path, state)
    }

    /// Push `path` to the shared history without dispatching.
    pub fn push(&self, path: &str, state: Option<HistoryState>) -> &Self {
        self.inner.group.push(path, state);
        self
    }

    /// Replace the current history entry without dispatching.
    pub fn replace(&self, path: &str, state: Option<HistoryState>) -> &Self {
        self.inner.group.replace(path, state);
        self
    }

    /// Dispatch the history's current path on this router only.
    pub fn start(&self) -> Dispatch {
        let path = self.inner.group.current_path();
        self.dispatch(&path)
    }

    /// Start following history pops and link activations.
    ///
    /// Links are only handled when their path starts with `prefix` (any path
    /// without one). With `autostart` the current location is dispatched
    /// first and its [`Dispatch`] returned.
    pub fn listen(&self, prefix: Option<&str>, autostart: bool) -> Option<Dispatch> {
        let dispatch = autostart.then(|| self.start());
        *self.inner.listening.borrow_mut() = Some(Listening {
            prefix: prefix.map(str::to_string),
        });
        debug_log!("Router listening (prefix: {:?})", prefix);
        dispatch
    }

    /// Stop following history pops and link activations.
    pub fn unlisten(&self) {
        self.inner.listening.borrow_mut().take();
    }

    /// Whether [`listen`](Self::listen) is in effect.
    pub fn is_running(&self) -> bool {
        self.inner.listening.borrow().is_some()
    }

    /// The link prefix given to [`listen`](Self::listen), if listening.
    pub fn link_prefix(&self) -> Option<Option<String>> {
        self.inner
            .listening
            .borrow()
            .as_ref()
            .map(|listening| listening.prefix.clone())
    }

    /// Whether a pop event should reach this router now.
    pub(crate) fn accepts_pop(&self) -> bool {
        self.is_running()
            && self.inner.created_at.elapsed() >= self.inner.config.pop_bind_duration()
    }

    /// The most recently created context.
    pub fn current_context(&self) -> Option<Rc<Context>> {
        self.inner.contexts.borrow().back().cloned()
    }

    /// Check whether `id` belongs to the latest dispatch of this router.
    pub fn is_navigation_current(&self, id: u64) -> bool {
        self.inner.navigation_id.get() == id
    }

    /// Routes created with [`on`](Self::on), in creation order.
    pub fn routes(&self) -> Vec<Route> {
        self.inner.routes.borrow().clone()
    }

    /// Number of pipeline entries.
    pub fn pipeline_len(&self) -> usize {
        self.inner.pipeline.borrow().len()
    }

    /// The group this router belongs to.
    pub fn group(&self) -> &RouterGroup {
        &self.inner.group
    }

    /// This router's configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    /// Remove this router from its group. It no longer receives navigations,
    /// pops or links, but can still be dispatched directly.
    pub fn leave(&self) {
        self.inner.group.leave(self);
    }

    /// Check whether two handles refer to the same router.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.routes.borrow().len())
            .field("pipeline", &self.pipeline_len())
            .field("navigation_id", &self.inner.navigation_id.get())
            .field("listening", &self.inner.listening.borrow())
            .finish_non_exhaustive()
    }
}
