//! Test utilities for router integration tests
//!
//! Provides fixtures that record which handlers ran, in which order, and
//! with which parameters.

#![allow(dead_code)]

use page_router::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Route log output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Shared, append-only record of handler calls.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.calls.borrow_mut().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Synchronous handler recording `label`.
    pub fn sync(&self, label: &str) -> Middleware {
        let recorder = self.clone();
        let label = label.to_string();
        sync_fn(move |_| recorder.record(label.clone()))
    }

    /// Continuation handler recording `label` and advancing.
    pub fn step(&self, label: &str) -> Middleware {
        let recorder = self.clone();
        let label = label.to_string();
        continuation_fn(move |_, next| {
            recorder.record(label.clone());
            next.advance();
        })
    }

    /// Continuation handler recording `label=<value of param>`.
    pub fn param(&self, name: &str) -> Middleware {
        let recorder = self.clone();
        let name = name.to_string();
        continuation_fn(move |ctx, next| {
            let value = ctx.param(&name).unwrap_or_default();
            recorder.record(format!("{name}={value}"));
            next.advance();
        })
    }

    /// Continuation handler that keeps its `Next` in `slot` instead of advancing.
    pub fn hold(&self, label: &str, slot: &Rc<RefCell<Option<Next>>>) -> Middleware {
        let recorder = self.clone();
        let label = label.to_string();
        let slot = Rc::clone(slot);
        continuation_fn(move |_, next| {
            recorder.record(label.clone());
            *slot.borrow_mut() = Some(next);
        })
    }
}

/// Config that reacts to history pops immediately.
pub fn eager_config() -> RouterConfig {
    RouterConfig::default().pop_bind_delay(Duration::ZERO)
}

/// Group over an in-memory history plus a router that reacts to pops
/// immediately.
pub fn router_with_group() -> (RouterGroup, Router) {
    let group = RouterGroup::in_memory();
    let router = Router::with_config(&group, eager_config());
    (group, router)
}
