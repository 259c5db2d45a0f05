//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is a FIFO list of [`Middleware`] entries. Running it against
//! a [`Context`] walks the entries strictly in registration order.
//!
//! All of this is **single-threaded**: handlers are `Rc` closures and a run
//! only ever advances on the thread that drives it.
//!
//! # Handler shapes
//!
//! The shape is picked explicitly when the entry is created and never
//! re-evaluated:
//!
//! | Shape | Constructor | Advances |
//! |-------|-------------|----------|
//! | synchronous | [`sync_fn`], [`Middleware::try_sync`] | automatically after the call |
//! | continuation | [`continuation_fn`] | when the handler calls [`Next::advance`] or [`Next::fail`] |
//! | error recovery | [`recover_fn`] | same as continuation, only reached while an error is in flight |
//!
//! # Errors
//!
//! When an entry fails, every following synchronous and continuation entry is
//! skipped until the next error-recovery entry, which receives the error. It
//! can clear it with [`Next::advance`] or pass it on with [`Next::fail`]. An
//! error that reaches the end settles the run's [`Completion`] as
//! [`DispatchOutcome::Failed`].
//!
//! # Example
//!
//! ```
//! use page_router::{continuation_fn, recover_fn, sync_fn, Context, Pipeline, RouterError};
//! use std::rc::Rc;
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.push(sync_fn(|ctx| println!("visiting {}", ctx.path())));
//! pipeline.push(continuation_fn(|_ctx, next| next.fail(RouterError::handler("denied"))));
//! pipeline.push(sync_fn(|_ctx| unreachable!()));
//! pipeline.push(recover_fn(|err, _ctx, next| {
//!     println!("recovered from {err}");
//!     next.advance();
//! }));
//!
//! let completion = pipeline.run(Rc::new(Context::new("/home")));
//! assert!(completion.outcome().is_completed());
//! ```

use crate::context::Context;
use crate::error::{DispatchOutcome, RouterError};
use crate::{trace_log, warn_log};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type SyncHandler = dyn Fn(&Context) -> Result<(), RouterError>;
type ContinuationHandler = dyn Fn(&Context, Next);
type RecoveryHandler = dyn Fn(RouterError, &Context, Next);

// ============================================================================
// Middleware
// ============================================================================

/// One pipeline entry, tagged with its invocation shape.
#[derive(Clone)]
pub enum Middleware {
    /// Runs and lets the pipeline advance on its own. Returning `Err`
    /// advances with that error.
    Sync(Rc<SyncHandler>),
    /// Receives a [`Next`] it must use to advance.
    Continuation(Rc<ContinuationHandler>),
    /// Only reached while an error is in flight.
    ErrorRecovery(Rc<RecoveryHandler>),
}

/// Shape of a [`Middleware`] entry, without the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareKind {
    Sync,
    Continuation,
    ErrorRecovery,
}

impl Middleware {
    /// Synchronous entry that cannot fail.
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(&Context) + 'static,
    {
        Self::Sync(Rc::new(move |ctx: &Context| {
            handler(ctx);
            Ok(())
        }))
    }

    /// Synchronous entry whose `Err` is routed to error recovery.
    pub fn try_sync<F>(handler: F) -> Self
    where
        F: Fn(&Context) -> Result<(), RouterError> + 'static,
    {
        Self::Sync(Rc::new(handler))
    }

    /// Continuation-style entry.
    pub fn continuation<F>(handler: F) -> Self
    where
        F: Fn(&Context, Next) + 'static,
    {
        Self::Continuation(Rc::new(handler))
    }

    /// Error-recovery entry.
    pub fn recover<F>(handler: F) -> Self
    where
        F: Fn(RouterError, &Context, Next) + 'static,
    {
        Self::ErrorRecovery(Rc::new(handler))
    }

    /// The shape this entry was registered with.
    pub fn kind(&self) -> MiddlewareKind {
        match self {
            Self::Sync(_) => MiddlewareKind::Sync,
            Self::Continuation(_) => MiddlewareKind::Continuation,
            Self::ErrorRecovery(_) => MiddlewareKind::ErrorRecovery,
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.kind()).finish()
    }
}

/// Create a synchronous entry from a closure.
///
/// ```
/// use page_router::sync_fn;
///
/// let mw = sync_fn(|ctx| println!("at {}", ctx.path()));
/// ```
pub fn sync_fn<F>(handler: F) -> Middleware
where
    F: Fn(&Context) + 'static,
{
    Middleware::sync(handler)
}

/// Create a continuation-style entry from a closure.
pub fn continuation_fn<F>(handler: F) -> Middleware
where
    F: Fn(&Context, Next) + 'static,
{
    Middleware::continuation(handler)
}

/// Create an error-recovery entry from a closure.
pub fn recover_fn<F>(handler: F) -> Middleware
where
    F: Fn(RouterError, &Context, Next) + 'static,
{
    Middleware::recover(handler)
}

// ============================================================================
// Completion
// ============================================================================

type Waiter = Box<dyn FnOnce(&DispatchOutcome)>;

#[derive(Default)]
struct CompletionInner {
    outcome: RefCell<DispatchOutcome>,
    waiters: RefCell<Vec<Waiter>>,
}

/// Completion signal of one pipeline run.
///
/// Cloning shares the same signal.
#[derive(Clone, Default)]
pub struct Completion {
    inner: Rc<CompletionInner>,
}

impl Completion {
    /// Current state of the run.
    pub fn outcome(&self) -> DispatchOutcome {
        self.inner.outcome.borrow().clone()
    }

    /// Check if some handler has not advanced yet
    pub fn is_pending(&self) -> bool {
        self.inner.outcome.borrow().is_pending()
    }

    /// Check if the run finished, successfully or not
    pub fn is_settled(&self) -> bool {
        self.inner.outcome.borrow().is_settled()
    }

    /// The unhandled error, if the run failed.
    pub fn error(&self) -> Option<RouterError> {
        self.inner.outcome.borrow().error().cloned()
    }

    /// Call `callback` once the run settles, or right away if it already has.
    pub fn when_settled<F>(&self, callback: F)
    where
        F: FnOnce(&DispatchOutcome) + 'static,
    {
        if self.is_settled() {
            callback(&self.inner.outcome.borrow());
        } else {
            self.inner.waiters.borrow_mut().push(Box::new(callback));
        }
    }

    fn settle(&self, outcome: DispatchOutcome) {
        *self.inner.outcome.borrow_mut() = outcome;
        let waiters = std::mem::take(&mut *self.inner.waiters.borrow_mut());
        let outcome = self.outcome();
        for waiter in waiters {
            waiter(&outcome);
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("outcome", &self.inner.outcome.borrow())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Run state and Next
// ============================================================================

enum Step {
    Advance,
    Fail(RouterError),
}

/// Progress of one `run`. Independent of every other run.
struct Run {
    entries: Rc<[Middleware]>,
    context: Rc<Context>,
    cursor: Cell<usize>,
    driving: Cell<bool>,
    queued: RefCell<Option<Step>>,
    completion: Completion,
}

/// Resets the driving flag even if a handler panics.
struct DrivingGuard<'a>(&'a Cell<bool>);

impl Drop for DrivingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Run {
    /// Apply `step`, then keep going for as long as handlers advance
    /// synchronously. Advances made from inside a handler are queued and
    /// picked up by this loop instead of recursing.
    fn drive(run: &Rc<Self>, step: Step) {
        if run.driving.get() {
            *run.queued.borrow_mut() = Some(step);
            return;
        }

        run.driving.set(true);
        let _guard = DrivingGuard(&run.driving);
        let mut next_step = Some(step);
        while let Some(step) = next_step.take() {
            Self::step(run, step);
            next_step = run.queued.borrow_mut().take();
        }
    }

    fn step(run: &Rc<Self>, step: Step) {
        let mut error = match step {
            Step::Advance => None,
            Step::Fail(err) => Some(err),
        };

        loop {
            let index = run.cursor.get();
            let Some(entry) = run.entries.get(index) else {
                run.finish(error);
                return;
            };
            run.cursor.set(index + 1);

            match (entry, error.take()) {
                (Middleware::Sync(handler), None) => {
                    trace_log!("Entry {} (sync) for '{}'", index, run.context.path());
                    error = handler(&run.context).err();
                }
                (Middleware::Continuation(handler), None) => {
                    trace_log!("Entry {} (continuation) for '{}'", index, run.context.path());
                    handler(&run.context, Next::new(run));
                    return;
                }
                (Middleware::ErrorRecovery(_), None) => {}
                (Middleware::ErrorRecovery(handler), Some(err)) => {
                    trace_log!("Entry {} (recovery) for '{}': {}", index, run.context.path(), err);
                    handler(err, &run.context, Next::new(run));
                    return;
                }
                (_, Some(err)) => error = Some(err),
            }
        }
    }

    fn finish(&self, error: Option<RouterError>) {
        let outcome = match error {
            None => DispatchOutcome::Completed,
            Some(err) => {
                warn_log!(
                    "Dispatch of '{}' ended with an unhandled error: {}",
                    self.context.path(),
                    err
                );
                DispatchOutcome::Failed(err)
            }
        };
        self.completion.settle(outcome);
    }
}

/// Continuation handed to continuation-style and error-recovery handlers.
///
/// Using it consumes it, so a handler advances its run at most once. It may
/// be kept and used later; until then the run stays pending. Dropping it
/// without use leaves the run pending for good.
pub struct Next {
    run: Rc<Run>,
}

impl Next {
    fn new(run: &Rc<Run>) -> Self {
        Self {
            run: Rc::clone(run),
        }
    }

    /// Move on to the next entry. Inside a recovery handler this also clears
    /// the error.
    pub fn advance(self) {
        Run::drive(&self.run, Step::Advance);
    }

    /// Move on with `err`, skipping to the next error-recovery entry.
    pub fn fail(self, err: RouterError) {
        Run::drive(&self.run, Step::Fail(err));
    }

    /// [`advance`](Self::advance) on `Ok`, [`fail`](Self::fail) on `Err`.
    pub fn resolve(self, result: Result<(), RouterError>) {
        match result {
            Ok(()) => self.advance(),
            Err(err) => self.fail(err),
        }
    }

    /// Context of the run this continuation belongs to.
    pub fn context(&self) -> &Rc<Context> {
        &self.run.context
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("path", &self.run.context.path())
            .field("cursor", &self.run.cursor.get())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// FIFO list of middleware entries.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    entries: Vec<Middleware>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, middleware: Middleware) {
        self.entries.push(middleware);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shapes of the registered entries, in order.
    pub fn kinds(&self) -> impl Iterator<Item = MiddlewareKind> + '_ {
        self.entries.iter().map(Middleware::kind)
    }

    /// Run every entry against `context`.
    ///
    /// Entries registered after this call are not part of this run. The
    /// returned [`Completion`] settles once the last entry has advanced.
    pub fn run(&self, context: Rc<Context>) -> Completion {
        Self::run_entries(self.snapshot(), context)
    }

    pub(crate) fn snapshot(&self) -> Rc<[Middleware]> {
        Rc::from(self.entries.as_slice())
    }

    pub(crate) fn run_entries(entries: Rc<[Middleware]>, context: Rc<Context>) -> Completion {
        let run = Rc::new(Run {
            entries,
            context,
            cursor: Cell::new(0),
            driving: Cell::new(false),
            queued: RefCell::new(None),
            completion: Completion::default(),
        });
        let completion = run.completion.clone();
        Run::drive(&run, Step::Advance);
        completion
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Rc<Context> {
        Rc::new(Context::new("/test"))
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Middleware) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |label: &str| {
            let log = log_clone.clone();
            let label = label.to_string();
            sync_fn(move |_| log.borrow_mut().push(label.clone()))
        };
        (log, make)
    }

    #[test]
    fn test_runs_in_registration_order() {
        let (log, make) = recorder();
        let mut pipeline = Pipeline::new();
        pipeline.push(make("a"));
        pipeline.push(make("b"));
        pipeline.push(make("c"));

        let completion = pipeline.run(context());
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(completion.outcome(), DispatchOutcome::Completed);
    }

    #[test]
    fn test_empty_pipeline_completes() {
        let completion = Pipeline::new().run(context());
        assert!(completion.outcome().is_completed());
    }

    #[test]
    fn test_continuation_must_advance() {
        let (log, make) = recorder();
        let mut pipeline = Pipeline::new();
        pipeline.push(continuation_fn(|_, _next| {}));
        pipeline.push(make("after"));

        let completion = pipeline.run(context());
        assert!(log.borrow().is_empty());
        assert!(completion.is_pending());
    }

    #[test]
    fn test_deferred_continuation() {
        let (log, make) = recorder();
        let parked: Rc<RefCell<Option<Next>>> = Rc::new(RefCell::new(None));
        let parked_clone = parked.clone();

        let mut pipeline = Pipeline::new();
        pipeline.push(continuation_fn(move |_, next| {
            *parked_clone.borrow_mut() = Some(next);
        }));
        pipeline.push(make("after"));

        let completion = pipeline.run(context());
        assert!(completion.is_pending());

        let next = parked.borrow_mut().take().unwrap();
        next.advance();
        assert_eq!(*log.borrow(), vec!["after"]);
        assert!(completion.outcome().is_completed());
    }

    #[test]
    fn test_error_skips_to_recovery() {
        let (log, make) = recorder();
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();

        let mut pipeline = Pipeline::new();
        pipeline.push(continuation_fn(|_, next| next.fail(RouterError::handler("x"))));
        pipeline.push(make("skipped-sync"));
        pipeline.push(continuation_fn(|_, _| panic!("must be skipped")));
        pipeline.push(recover_fn(move |err, _, next| {
            *seen_clone.borrow_mut() = Some(err);
            next.advance();
        }));
        pipeline.push(make("resumed"));

        let completion = pipeline.run(context());
        assert_eq!(*seen.borrow(), Some(RouterError::handler("x")));
        assert_eq!(*log.borrow(), vec!["resumed"]);
        assert!(completion.outcome().is_completed());
    }

    #[test]
    fn test_recovery_skipped_without_error() {
        let (log, make) = recorder();
        let mut pipeline = Pipeline::new();
        pipeline.push(recover_fn(|_, _, _| panic!("no error in flight")));
        pipeline.push(make("a"));

        pipeline.run(context());
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_unhandled_error_fails_completion() {
        let mut pipeline = Pipeline::new();
        pipeline.push(Middleware::try_sync(|_| Err(RouterError::handler("boom"))));

        let completion = pipeline.run(context());
        assert_eq!(completion.error(), Some(RouterError::handler("boom")));
    }

    #[test]
    fn test_recovery_can_rethrow() {
        let mut pipeline = Pipeline::new();
        pipeline.push(Middleware::try_sync(|_| Err(RouterError::handler("first"))));
        pipeline.push(recover_fn(|_, _, next| next.fail(RouterError::handler("second"))));

        let completion = pipeline.run(context());
        assert_eq!(completion.error(), Some(RouterError::handler("second")));
    }

    #[test]
    fn test_runs_are_independent() {
        let parked: Rc<RefCell<Vec<Next>>> = Rc::new(RefCell::new(Vec::new()));
        let parked_clone = parked.clone();
        let (log, _) = recorder();
        let log_clone = log.clone();

        let mut pipeline = Pipeline::new();
        pipeline.push(continuation_fn(move |_, next| {
            parked_clone.borrow_mut().push(next);
        }));
        pipeline.push(sync_fn(move |ctx| {
            log_clone.borrow_mut().push(ctx.path().to_string());
        }));

        let first = pipeline.run(Rc::new(Context::new("/first")));
        let second = pipeline.run(Rc::new(Context::new("/second")));

        let mut nexts = std::mem::take(&mut *parked.borrow_mut());
        let first_next = nexts.remove(0);
        nexts.remove(0).advance();
        assert_eq!(*log.borrow(), vec!["/second"]);
        assert!(first.is_pending());
        assert!(second.outcome().is_completed());

        first_next.advance();
        assert_eq!(*log.borrow(), vec!["/second", "/first"]);
        assert!(first.outcome().is_completed());
    }

    #[test]
    fn test_long_synchronous_chains_do_not_recurse() {
        let count = Rc::new(Cell::new(0));
        let mut pipeline = Pipeline::new();
        for i in 0..20_000 {
            let count = count.clone();
            if i % 2 == 0 {
                pipeline.push(sync_fn(move |_| count.set(count.get() + 1)));
            } else {
                pipeline.push(continuation_fn(move |_, next| {
                    count.set(count.get() + 1);
                    next.advance();
                }));
            }
        }

        let completion = pipeline.run(context());
        assert_eq!(count.get(), 20_000);
        assert!(completion.outcome().is_completed());
    }

    #[test]
    fn test_when_settled() {
        let parked: Rc<RefCell<Option<Next>>> = Rc::new(RefCell::new(None));
        let parked_clone = parked.clone();
        let mut pipeline = Pipeline::new();
        pipeline.push(continuation_fn(move |_, next| {
            *parked_clone.borrow_mut() = Some(next);
        }));

        let completion = pipeline.run(context());
        let observed = Rc::new(RefCell::new(None));
        let observed_clone = observed.clone();
        completion.when_settled(move |outcome| *observed_clone.borrow_mut() = Some(outcome.clone()));
        assert!(observed.borrow().is_none());

        let next = parked.borrow_mut().take().unwrap();
        next.fail(RouterError::handler("late"));
        assert_eq!(
            *observed.borrow(),
            Some(DispatchOutcome::Failed(RouterError::handler("late")))
        );

        let immediate = Rc::new(Cell::new(false));
        let immediate_clone = immediate.clone();
        completion.when_settled(move |_| immediate_clone.set(true));
        assert!(immediate.get());
    }

    #[test]
    fn test_snapshot_excludes_later_entries() {
        let (log, make) = recorder();
        let parked: Rc<RefCell<Option<Next>>> = Rc::new(RefCell::new(None));
        let parked_clone = parked.clone();

        let mut pipeline = Pipeline::new();
        pipeline.push(continuation_fn(move |_, next| {
            *parked_clone.borrow_mut() = Some(next);
        }));
        let completion = pipeline.run(context());
        pipeline.push(make("late"));

        let next = parked.borrow_mut().take().unwrap();
        next.advance();
        assert!(log.borrow().is_empty());
        assert!(completion.outcome().is_completed());
    }

    #[test]
    fn test_kinds() {
        let mut pipeline = Pipeline::new();
        pipeline.push(sync_fn(|_| {}));
        pipeline.push(continuation_fn(|_, next| next.advance()));
        pipeline.push(recover_fn(|_, _, next| next.advance()));
        assert_eq!(
            pipeline.kinds().collect::<Vec<_>>(),
            vec![
                MiddlewareKind::Sync,
                MiddlewareKind::Continuation,
                MiddlewareKind::ErrorRecovery
            ]
        );
    }
}
