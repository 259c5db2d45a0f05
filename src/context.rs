//! Per-dispatch navigation context.
//!
//! A [`Context`] is created by [`Router::context`](crate::Router::context)
//! once per dispatch and handed to every pipeline entry. Its path never
//! changes. Its parameters are written by the route gates as the pipeline
//! reaches them: each gate that matches installs the values extracted by its
//! own pattern, so a handler always sees the parameters of the route it was
//! registered on.
//!
//! # Previous contexts
//!
//! Each context links to the one its router created before it. The link is
//! weak: the router keeps the last
//! [`context_depth`](crate::RouterConfig::context_depth) contexts alive, so
//! walking `previous()` stops after that many steps instead of pinning every
//! context ever created.

use crate::matching::strip_query;
use crate::params::{ParameterBag, QueryParams};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Snapshot of one dispatch.
pub struct Context {
    path: String,
    params: RefCell<ParameterBag>,
    previous: Option<Weak<Context>>,
    navigation_id: u64,
}

impl Context {
    /// Create a standalone context for `path` with no predecessor.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: RefCell::new(ParameterBag::new()),
            previous: None,
            navigation_id: 0,
        }
    }

    pub(crate) fn chained(
        path: impl Into<String>,
        previous: Option<&Rc<Context>>,
        navigation_id: u64,
    ) -> Self {
        Self {
            previous: previous.map(Rc::downgrade),
            navigation_id,
            ..Self::new(path)
        }
    }

    /// The dispatched path, including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The dispatched path without its query string.
    pub fn pathname(&self) -> &str {
        strip_query(&self.path)
    }

    /// The query string without its leading `?`, if any.
    pub fn querystring(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }

    /// Parsed query parameters.
    pub fn query(&self) -> QueryParams {
        QueryParams::from_path(&self.path)
    }

    /// Parameters captured by the most recent matching gate.
    ///
    /// Do not hold the returned guard across a call to `Next`.
    pub fn params(&self) -> Ref<'_, ParameterBag> {
        self.params.borrow()
    }

    /// Named parameter value, cloned out of the bag.
    pub fn param(&self, name: &str) -> Option<String> {
        self.params.borrow().get(name).map(str::to_string)
    }

    pub(crate) fn set_params(&self, params: ParameterBag) {
        *self.params.borrow_mut() = params;
    }

    /// The context created before this one by the same router, while it is
    /// still retained.
    pub fn previous(&self) -> Option<Rc<Context>> {
        self.previous.as_ref().and_then(Weak::upgrade)
    }

    /// Number that identifies the dispatch this context belongs to.
    ///
    /// Compare with [`Router::is_navigation_current`](crate::Router::is_navigation_current)
    /// to find out whether a newer dispatch has started since.
    pub fn navigation_id(&self) -> u64 {
        self.navigation_id
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.path)
            .field("params", &self.params.borrow())
            .field("navigation_id", &self.navigation_id)
            .finish_non_exhaustive()
    }
}
