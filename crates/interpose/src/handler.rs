//! Interception handlers
//!
//! A handler receives every call made on a proxy and returns the normalized
//! asynchronous result. Three forms are accepted:
//!
//! - `Handler::new` for async closures
//! - `Handler::sync` for closures that compute a value directly; the value
//!   is wrapped in an already-completed future so synchronous methods never
//!   wait on an executor
//! - `Handler::from_fn` for closures that already return a `ValueFuture`

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, FutureExt};
use interpose_types::{InvocationError, Value, ValueFuture};

use crate::invocation::Invocation;

/// Handler function signature
pub type HandlerFn = Arc<dyn Fn(Invocation) -> ValueFuture + Send + Sync>;

/// Call interception logic shared by every call on a proxy instance
#[derive(Clone)]
pub struct Handler {
    inner: HandlerFn,
}

impl Handler {
    /// Handler from an async closure
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |invocation| f(invocation).boxed()),
        }
    }

    /// Handler from a closure producing its result synchronously
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Invocation) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(move |invocation| future::ready(f(invocation)).boxed()),
        }
    }

    /// Handler from a closure returning a normalized future
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Invocation) -> ValueFuture + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Handler that proceeds with every call unchanged
    pub fn passthrough() -> Self {
        Self::from_fn(|invocation| invocation.proceed())
    }

    /// Hand an invocation to the handler
    pub fn handle(&self, invocation: Invocation) -> ValueFuture {
        (self.inner)(invocation)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}
