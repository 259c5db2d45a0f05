//! Router groups.
//!
//! A [`RouterGroup`] is the set of routers sharing one [`History`]. A
//! navigation started from any of them is pushed to the history once and then
//! dispatched on every member, in the order they joined.
//!
//! The group also turns host events into navigations:
//!
//! - [`RouterGroup::handle_pop`] for history pops (back/forward),
//! - [`RouterGroup::handle_link`] for anchor activations.
//!
//! Both only involve routers that called [`Router::listen`].
//!
//! Members are held weakly; dropping the last handle to a router removes it
//! from its group.

use crate::error::RouterError;
use crate::history::{History, HistoryState, MemoryHistory};
use crate::link::{is_routable, parse_href, LinkEvent};
use crate::router::{Dispatch, Router, RouterInner};
use crate::{debug_log, info_log, trace_log};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

// ============================================================================
// Navigation
// ============================================================================

/// Result of a group-wide navigation: one [`Dispatch`] per member reached.
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    path: String,
    dispatches: Vec<Dispatch>,
}

impl Navigation {
    fn skipped() -> Self {
        Self::default()
    }

    /// The navigated path. Empty when the navigation was a no-op.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The dispatches, in member order.
    pub fn dispatches(&self) -> &[Dispatch] {
        &self.dispatches
    }

    /// Number of routers reached.
    pub fn len(&self) -> usize {
        self.dispatches.len()
    }

    /// `true` when no router was reached.
    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty()
    }

    /// Whether every dispatch has settled.
    pub fn is_settled(&self) -> bool {
        self.dispatches.iter().all(|d| d.completion().is_settled())
    }

    /// Unhandled errors of the settled dispatches.
    pub fn errors(&self) -> Vec<RouterError> {
        self.dispatches.iter().filter_map(Dispatch::error).collect()
    }
}

// ============================================================================
// RouterGroup
// ============================================================================

struct GroupInner {
    history: Rc<dyn History>,
    members: RefCell<Vec<Weak<RouterInner>>>,
}

/// Routers sharing one history. Cloning shares the group.
#[derive(Clone)]
pub struct RouterGroup {
    inner: Rc<GroupInner>,
}

impl RouterGroup {
    /// Create an empty group over `history`.
    pub fn new(history: Rc<dyn History>) -> Self {
        Self {
            inner: Rc::new(GroupInner {
                history,
                members: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create an empty group over a fresh [`MemoryHistory`].
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryHistory::new()))
    }

    pub(crate) fn join(&self, router: &Router) {
        self.inner
            .members
            .borrow_mut()
            .push(Rc::downgrade(router.inner()));
        info_log!("Router joined group ({} members)", self.len());
    }

    /// Remove `router` from the group. Unknown routers are ignored.
    pub fn leave(&self, router: &Router) {
        let target = Rc::downgrade(router.inner());
        self.inner
            .members
            .borrow_mut()
            .retain(|member| member.strong_count() > 0 && !member.ptr_eq(&target));
        info_log!("Router left group ({} members)", self.len());
    }

    /// Live member routers, in join order. Dropped routers are pruned.
    pub fn members(&self) -> Vec<Router> {
        let mut members = self.inner.members.borrow_mut();
        members.retain(|member| member.strong_count() > 0);
        members
            .iter()
            .filter_map(Weak::upgrade)
            .map(Router::from_inner)
            .collect()
    }

    /// Number of live members.
    pub fn len(&self) -> usize {
        self.members().len()
    }

    /// `true` when no live router belongs to the group.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The shared history.
    pub fn history(&self) -> &Rc<dyn History> {
        &self.inner.history
    }

    /// Path of the current history entry.
    pub fn current_path(&self) -> String {
        self.inner.history.path()
    }

    /// Push `path` to the history without dispatching.
    pub fn push(&self, path: &str, state: Option<HistoryState>) {
        self.inner.history.push(path, state);
    }

    /// Replace the current history entry without dispatching.
    pub fn replace(&self, path: &str, state: Option<HistoryState>) {
        self.inner.history.replace(path, state);
    }

    /// Push `path` to the history, then dispatch it on every member.
    ///
    /// An empty path does nothing.
    pub fn go(&self, path: &str, state: Option<HistoryState>) -> Navigation {
        if path.is_empty() {
            return Navigation::skipped();
        }
        self.inner.history.push(path, state);
        let members = self.members();
        debug_log!("Navigating to '{}' on {} router(s)", path, members.len());
        self.dispatch_to(path, members)
    }

    /// React to a history pop: dispatch the current path on every listening
    /// member whose pop binding delay has elapsed.
    pub fn handle_pop(&self) -> Navigation {
        let path = self.current_path();
        let members: Vec<_> = self
            .members()
            .into_iter()
            .filter(Router::accepts_pop)
            .collect();
        debug_log!("History pop to '{}' ({} router(s))", path, members.len());
        self.dispatch_to(&path, members)
    }

    /// React to an anchor activation.
    ///
    /// Returns `Ok(None)` when the event has no href or no listening member
    /// routes it. Otherwise the default action is prevented, propagation is
    /// stopped and the href's path and query are navigated to once.
    ///
    /// Only the path is checked against the listening prefixes. The host is
    /// not compared, so a link to another origin whose path is routable is
    /// handled in-page; hosts that need a same-origin rule should filter on
    /// [`ParsedHref::host`](crate::ParsedHref::host) before calling this.
    pub fn handle_link(
        &self,
        event: &mut dyn LinkEvent,
    ) -> Result<Option<Navigation>, RouterError> {
        let Some(href) = event.href() else {
            return Ok(None);
        };
        let parsed = parse_href(href)?;

        let routed = self.members().iter().any(|router| {
            router
                .link_prefix()
                .is_some_and(|prefix| is_routable(&parsed, prefix.as_deref()))
        });
        if !routed {
            trace_log!("Ignoring link to '{}'", parsed.pathname);
            return Ok(None);
        }

        event.prevent_default();
        event.stop_propagation();
        Ok(Some(self.go(&parsed.path_and_query(), None)))
    }

    fn dispatch_to(&self, path: &str, members: Vec<Router>) -> Navigation {
        let dispatches = members
            .iter()
            .map(|router| router.dispatch(path))
            .collect();
        Navigation {
            path: path.to_string(),
            dispatches,
        }
    }
}

impl Default for RouterGroup {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for RouterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup")
            .field("members", &self.inner.members.borrow().len())
            .field("path", &self.current_path())
            .finish()
    }
}
