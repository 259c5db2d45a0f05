//! Routes: pattern-gated entries in a router's shared pipeline.
//!
//! A [`Route`] does not own a pipeline. Every handler passed to
//! [`on_enter`](Route::on_enter) is wrapped in a gate of the same shape and
//! appended to the pipeline of the router that created the route. When a
//! dispatch reaches the gate it matches the context path against the route's
//! pattern:
//!
//! - match: the extracted parameters become the context's parameters and the
//!   real handler runs;
//! - no match: the pipeline advances right away (a recovery gate passes the
//!   in-flight error on untouched);
//! - undecodable capture: the pipeline advances with the
//!   [`RouterError::Decode`] error.
//!
//! Handlers of several routes therefore interleave in one global
//! registration order.
//!
//! # Exit handlers
//!
//! [`on_exit`](Route::on_exit) handlers are recorded and exposed through
//! [`outs`](Route::outs) but nothing fires them yet; dispatch has no notion
//! of "leaving" a route.

use crate::context::Context;
use crate::error::RouterError;
use crate::matching::PathMatcher;
use crate::middleware::{Middleware, Next, Pipeline};
use crate::params::ParameterBag;
use crate::{trace_log, warn_log};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

struct RouteInner {
    matcher: Rc<PathMatcher>,
    pipeline: Weak<RefCell<Pipeline>>,
    ins: RefCell<Vec<Middleware>>,
    outs: RefCell<Vec<Middleware>>,
}

/// A pattern bound to a router's pipeline.
///
/// Created by [`Router::on`](crate::Router::on). Cloning shares the route.
#[derive(Clone)]
pub struct Route {
    inner: Rc<RouteInner>,
}

impl Route {
    pub(crate) fn new(matcher: PathMatcher, pipeline: Weak<RefCell<Pipeline>>) -> Self {
        Self {
            inner: Rc::new(RouteInner {
                matcher: Rc::new(matcher),
                pipeline,
                ins: RefCell::new(Vec::new()),
                outs: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The pattern this route was created with.
    pub fn pattern(&self) -> &str {
        self.inner.matcher.pattern()
    }

    /// The compiled pattern.
    pub fn matcher(&self) -> &PathMatcher {
        &self.inner.matcher
    }

    /// Register a handler for paths matching this route.
    ///
    /// The handler keeps its shape; it is gated and appended to the router's
    /// pipeline immediately.
    pub fn on_enter(&self, middleware: Middleware) -> &Self {
        let gated = gate(Rc::clone(&self.inner.matcher), middleware.clone());
        match self.inner.pipeline.upgrade() {
            Some(pipeline) => pipeline.borrow_mut().push(gated),
            None => warn_log!(
                "Route '{}' outlived its router; handler recorded but never dispatched",
                self.pattern()
            ),
        }
        self.inner.ins.borrow_mut().push(middleware);
        self
    }

    /// Register several handlers, in iteration order.
    pub fn on_enter_all<I>(&self, handlers: I) -> &Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        for handler in handlers {
            self.on_enter(handler);
        }
        self
    }

    /// Record a handler for leaving this route. It is stored only.
    pub fn on_exit(&self, middleware: Middleware) -> &Self {
        self.inner.outs.borrow_mut().push(middleware);
        self
    }

    /// Record several exit handlers, in iteration order.
    pub fn on_exit_all<I>(&self, handlers: I) -> &Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.inner.outs.borrow_mut().extend(handlers);
        self
    }

    /// Handlers registered with [`on_enter`](Self::on_enter), ungated.
    pub fn ins(&self) -> Ref<'_, [Middleware]> {
        Ref::map(self.inner.ins.borrow(), Vec::as_slice)
    }

    /// Handlers registered with [`on_exit`](Self::on_exit).
    pub fn outs(&self) -> Ref<'_, [Middleware]> {
        Ref::map(self.inner.outs.borrow(), Vec::as_slice)
    }

    /// Match `path` against this route and append the captures to `params`.
    ///
    /// `params` is only written on `Ok(true)`.
    pub fn matches(&self, path: &str, params: &mut ParameterBag) -> Result<bool, RouterError> {
        self.inner.matcher.extract(path, params)
    }

    /// Check whether two handles refer to the same route.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern())
            .field("ins", &self.inner.ins.borrow().len())
            .field("outs", &self.inner.outs.borrow().len())
            .finish()
    }
}

/// Match the context against `matcher`; on success the captures replace the
/// context's parameters.
fn enter(matcher: &PathMatcher, ctx: &Context) -> Result<bool, RouterError> {
    let mut params = ParameterBag::new();
    if matcher.extract(ctx.path(), &mut params)? {
        trace_log!("Gate '{}' entered for '{}'", matcher.pattern(), ctx.path());
        ctx.set_params(params);
        Ok(true)
    } else {
        trace_log!("Gate '{}' skipped '{}'", matcher.pattern(), ctx.path());
        Ok(false)
    }
}

fn gate(matcher: Rc<PathMatcher>, middleware: Middleware) -> Middleware {
    match middleware {
        Middleware::Sync(handler) => Middleware::try_sync(move |ctx| {
            if enter(&matcher, ctx)? {
                handler(ctx)?;
            }
            Ok(())
        }),
        Middleware::Continuation(handler) => {
            Middleware::continuation(move |ctx, next: Next| match enter(&matcher, ctx) {
                Ok(true) => handler(ctx, next),
                Ok(false) => next.advance(),
                Err(err) => next.fail(err),
            })
        }
        Middleware::ErrorRecovery(handler) => {
            Middleware::recover(move |err, ctx, next: Next| match enter(&matcher, ctx) {
                Ok(true) => handler(err, ctx, next),
                Ok(false) => next.fail(err),
                Err(decode) => {
                    warn_log!(
                        "Recovery gate '{}' could not decode '{}': {}",
                        matcher.pattern(),
                        ctx.path(),
                        decode
                    );
                    next.fail(err);
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchOutcome;
    use crate::middleware::{continuation_fn, recover_fn, sync_fn};
    use std::cell::Cell;

    fn route(pattern: &str, pipeline: &Rc<RefCell<Pipeline>>) -> Route {
        Route::new(
            PathMatcher::compile(pattern).unwrap(),
            Rc::downgrade(pipeline),
        )
    }

    fn run(pipeline: &Rc<RefCell<Pipeline>>, path: &str) -> DispatchOutcome {
        pipeline
            .borrow()
            .run(Rc::new(Context::new(path)))
            .outcome()
    }

    #[test]
    fn test_on_enter_appends_to_pipeline() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        let users = route("/users", &pipeline);
        users
            .on_enter(sync_fn(|_| {}))
            .on_enter(continuation_fn(|_, next| next.advance()));

        assert_eq!(pipeline.borrow().len(), 2);
        assert_eq!(users.ins().len(), 2);
    }

    #[test]
    fn test_gate_skips_non_matching() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        let hits = Rc::new(Cell::new(0));

        let one = route("/one", &pipeline);
        let two = route("/two", &pipeline);
        let hits_one = hits.clone();
        one.on_enter(continuation_fn(move |_, _next| hits_one.set(100)));
        let hits_two = hits.clone();
        two.on_enter(sync_fn(move |_| hits_two.set(hits_two.get() + 1)));

        assert!(run(&pipeline, "/two").is_completed());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_gate_installs_route_params() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_user = seen.clone();
        route("/users/:id", &pipeline).on_enter(sync_fn(move |ctx| {
            seen_user.borrow_mut().push(ctx.params().clone());
        }));
        let seen_any = seen.clone();
        route("/*", &pipeline).on_enter(sync_fn(move |ctx| {
            seen_any.borrow_mut().push(ctx.params().clone());
        }));

        run(&pipeline, "/users/7");
        let seen = seen.borrow();
        assert_eq!(seen[0].get("id"), Some("7"));
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[1].at(0), Some("users/7"));
        assert_eq!(seen[1].get("id"), None);
    }

    #[test]
    fn test_gate_decode_failure_fails_run() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        route("/:name", &pipeline).on_enter(sync_fn(|_| panic!("must not run")));

        let outcome = run(&pipeline, "/%zz");
        assert!(outcome.error().unwrap().is_decode());
    }

    #[test]
    fn test_recovery_gate_forwards_error_when_not_matching() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        let recovered = Rc::new(Cell::new(false));

        route("/*", &pipeline).on_enter(Middleware::try_sync(|_| {
            Err(RouterError::handler("x"))
        }));
        route("/elsewhere", &pipeline).on_enter(recover_fn(|_, _, next| next.advance()));
        let recovered_clone = recovered.clone();
        route("/here", &pipeline).on_enter(recover_fn(move |err, _, next| {
            assert_eq!(err, RouterError::handler("x"));
            recovered_clone.set(true);
            next.advance();
        }));

        assert!(run(&pipeline, "/here").is_completed());
        assert!(recovered.get());
    }

    #[test]
    fn test_outs_are_stored_not_fired() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();

        let page = route("/page", &pipeline);
        page.on_exit(sync_fn(move |_| fired_clone.set(true)));

        assert_eq!(page.outs().len(), 1);
        assert!(pipeline.borrow().is_empty());
        run(&pipeline, "/page");
        run(&pipeline, "/other");
        assert!(!fired.get());
    }

    #[test]
    fn test_matches_appends() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        let r = route("/route/:param/*", &pipeline);
        let mut params = ParameterBag::new();

        assert!(!r.matches("/nope", &mut params).unwrap());
        assert!(params.is_empty());
        assert!(r.matches("/route/param/asterisk", &mut params).unwrap());
        assert_eq!(params.as_slice(), &["param".to_string(), "asterisk".to_string()]);
        assert_eq!(params.get("param"), Some("param"));
    }

    #[test]
    fn test_detached_route_still_records() {
        let pipeline = Rc::new(RefCell::new(Pipeline::new()));
        let r = route("/x", &pipeline);
        drop(pipeline);

        r.on_enter(sync_fn(|_| {}));
        assert_eq!(r.ins().len(), 1);
    }
}
