//! Invocations: one intercepted call
//!
//! An `Invocation` carries the method identity, the arguments (which the
//! handler may rewrite before proceeding) and the delegate that performs
//! the original behavior. Whatever the method's return shape, proceeding
//! yields the same normalized future, so one handler signature serves void,
//! value, task and value-task methods alike.

use std::fmt;
use std::sync::{Arc, Weak};

use futures::future::{self, FutureExt};
use interpose_types::{
    wait_for, InvocationError, MethodKey, Object, Returned, Value, ValueFuture,
};

use crate::defaults::DefaultImplementation;
use crate::proxy::{MethodDescriptor, ProxyObject};
use crate::shape::ReturnShape;

/// Where proceeded calls end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A caller-supplied target object
    Explicit,
    /// The default-value stand-in (interface without target)
    Defaults,
    /// The proxied class's own implementation (class without target)
    Base,
}

/// The delegate a proxy instance is constructed with
pub(crate) enum Delegate {
    Target(Arc<dyn Object>),
    Defaults(Arc<DefaultImplementation>),
    /// Holds the proxy weakly; the proxy owns its delegate.
    Base(Weak<ProxyObject>),
}

impl Delegate {
    pub(crate) fn kind(&self) -> TargetKind {
        match self {
            Delegate::Target(_) => TargetKind::Explicit,
            Delegate::Defaults(_) => TargetKind::Defaults,
            Delegate::Base(_) => TargetKind::Base,
        }
    }

    /// Strong delegate for one call.
    ///
    /// The base delegate is upgraded here, while the proxy is still being
    /// called, so an invocation (and any future it returns) keeps the proxy
    /// alive until it is dropped.
    pub(crate) fn bind(&self, key: &MethodKey) -> Result<BoundDelegate, InvocationError> {
        Ok(match self {
            Delegate::Target(target) => BoundDelegate::Target(target.clone()),
            Delegate::Defaults(defaults) => BoundDelegate::Defaults(defaults.clone()),
            Delegate::Base(this) => BoundDelegate::Base(
                this.upgrade()
                    .ok_or_else(|| InvocationError::Detached(key.to_string()))?,
            ),
        })
    }
}

/// Per-call delegate held by an `Invocation`
pub(crate) enum BoundDelegate {
    Target(Arc<dyn Object>),
    Defaults(Arc<DefaultImplementation>),
    Base(Arc<ProxyObject>),
}

impl BoundDelegate {
    fn kind(&self) -> TargetKind {
        match self {
            BoundDelegate::Target(_) => TargetKind::Explicit,
            BoundDelegate::Defaults(_) => TargetKind::Defaults,
            BoundDelegate::Base(_) => TargetKind::Base,
        }
    }
}

/// A single intercepted call
pub struct Invocation {
    method: Arc<MethodDescriptor>,
    arguments: Vec<Value>,
    delegate: BoundDelegate,
}

impl Invocation {
    pub(crate) fn new(
        method: Arc<MethodDescriptor>,
        arguments: Vec<Value>,
        delegate: BoundDelegate,
    ) -> Self {
        Self {
            method,
            arguments,
            delegate,
        }
    }

    /// The intercepted method
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Method identity
    pub fn key(&self) -> &MethodKey {
        self.method.key()
    }

    /// Return shape of the intercepted method
    pub fn shape(&self) -> &ReturnShape {
        self.method.shape()
    }

    /// Current arguments
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Arguments, mutable; changes are seen by subsequent `proceed` calls
    pub fn arguments_mut(&mut self) -> &mut [Value] {
        &mut self.arguments
    }

    /// Replace one argument, returning the previous value
    pub fn replace_argument(&mut self, index: usize, value: Value) -> Option<Value> {
        self.arguments
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// What proceeding will call
    pub fn target_kind(&self) -> TargetKind {
        self.delegate.kind()
    }

    /// Run the original behavior with the current arguments.
    ///
    /// Synchronous implementations are already complete when this returns;
    /// task implementations resolve when their task does. Errors from the
    /// implementation come back through the future unchanged.
    pub fn proceed(&self) -> ValueFuture {
        match self.dispatch() {
            Ok(returned) => returned.into_future(),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    /// Proceed and block until the result is available.
    ///
    /// For synchronous handlers; see `wait_for` for the blocking caveats.
    pub fn proceed_blocking(&self) -> Result<Value, InvocationError> {
        wait_for(self.proceed())
    }

    fn dispatch(&self) -> Result<Returned, InvocationError> {
        let key = self.method.key();
        let args = self.arguments.clone();
        match &self.delegate {
            BoundDelegate::Target(target) => target.invoke(key, args),
            BoundDelegate::Defaults(defaults) => defaults.invoke(key, args),
            BoundDelegate::Base(this) => match &self.method.info().body {
                Some(body) => body(&**this, args),
                // Abstract with no target: nothing to run
                None => Ok(self.method.shape().default_returned()),
            },
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method.key().to_string())
            .field("shape", self.method.shape())
            .field("arguments", &self.arguments)
            .field("delegate", &self.delegate.kind())
            .finish()
    }
}
